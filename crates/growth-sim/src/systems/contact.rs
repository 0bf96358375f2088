//! Touch damage for targets overlapping the collision shape.

use log::trace;

use growth_core::constants::{TOUCH_COOLDOWN_TICKS, TOUCH_MARGIN};
use growth_core::definition::Definition;
use growth_core::enums::DamageCause;
use growth_core::events::EffectRequest;
use growth_core::state::MutableState;

use crate::host::TargetQuery;

/// Damage every affectable target touching the collision shape.
/// Returns the number of targets damaged.
pub fn tick(
    state: &mut MutableState,
    definition: &Definition,
    now: u64,
    targets: &dyn TargetQuery,
    effects: &mut Vec<EffectRequest>,
) -> usize {
    if !definition.collision_enabled || definition.touch_damage <= 0.0 {
        return 0;
    }
    let shape = state.collision_shape.inflate(TOUCH_MARGIN);
    if shape.is_empty() {
        return 0;
    }
    let reach = shape.size().max_element() * 0.5;

    let mut damaged = 0;
    for target in targets.living_targets_in_box(shape.center(), reach) {
        if !target.is_affectable() || !shape.contains(target.position) {
            continue;
        }
        if state
            .touch_cooldowns
            .get(&target.id)
            .is_some_and(|next| now < *next)
        {
            continue;
        }
        effects.push(EffectRequest::ApplyDamage {
            target: target.id,
            amount: definition.touch_damage,
            cause: DamageCause::Contact,
        });
        state
            .touch_cooldowns
            .insert(target.id, now + TOUCH_COOLDOWN_TICKS);
        damaged += 1;
    }
    if damaged > 0 {
        trace!("contact damaged {damaged} target(s)");
    }
    damaged
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use growth_core::types::{Shape, Target};

    fn spiky() -> (Definition, MutableState) {
        let def = Definition {
            collision_enabled: true,
            touch_damage: 3.0,
            ..Definition::inert()
        };
        let mut state = MutableState::baseline(&def);
        state.collision_shape = Shape::cube(DVec3::ZERO, 2.0);
        (def, state)
    }

    #[test]
    fn damages_touching_targets_once_per_cooldown() {
        let (def, mut state) = spiky();
        let targets = vec![
            Target::new(1, DVec3::new(0.5, 0.0, 0.0)),
            Target::new(2, DVec3::new(3.0, 0.0, 0.0)),
        ];
        let mut effects = Vec::new();
        assert_eq!(tick(&mut state, &def, 10, &targets, &mut effects), 1);
        assert_eq!(tick(&mut state, &def, 11, &targets, &mut effects), 0);
        assert_eq!(
            tick(&mut state, &def, 10 + TOUCH_COOLDOWN_TICKS, &targets, &mut effects),
            1
        );
        assert!(effects.iter().all(|e| matches!(
            e,
            EffectRequest::ApplyDamage { cause: DamageCause::Contact, amount, .. } if *amount == 3.0
        )));
    }

    #[test]
    fn margin_catches_targets_on_the_surface() {
        let (def, mut state) = spiky();
        let targets = vec![Target::new(1, DVec3::new(1.03, 0.0, 0.0))];
        let mut effects = Vec::new();
        assert_eq!(tick(&mut state, &def, 0, &targets, &mut effects), 1);
    }

    #[test]
    fn disabled_collision_does_nothing() {
        let (mut def, mut state) = spiky();
        def.collision_enabled = false;
        let targets = vec![Target::new(1, DVec3::ZERO)];
        let mut effects = Vec::new();
        assert_eq!(tick(&mut state, &def, 0, &targets, &mut effects), 0);
        assert!(state.touch_cooldowns.is_empty());
    }
}
