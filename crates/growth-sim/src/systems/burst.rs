//! Burst sequencer: the chain of delayed explosions after detonation.

use glam::DVec3;
use log::debug;

use growth_core::constants::INFINITE_DAMAGE_THRESHOLD;
use growth_core::definition::Definition;
use growth_core::enums::DamageCause;
use growth_core::events::{EffectRequest, SimEvent};
use growth_core::profiles::ExplosionProfile;
use growth_core::state::MutableState;

use crate::host::TargetQuery;

/// What the burst sequencer did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstOutcome {
    Inactive,
    /// Waiting out the delay between explosions.
    Waiting,
    /// Fired an explosion; more remain.
    Exploded,
    /// Fired the last explosion; charges remain.
    Completed,
    /// Fired the last explosion of the last charge. The instance must be removed.
    Exhausted,
}

/// Begin a burst from `explosion`. Block breaking is gated by the definition.
pub fn start(state: &mut MutableState, explosion: &ExplosionProfile, definition: &Definition) {
    // Profiles are sanitized to at least one explosion; loaded state may not be.
    state.burst_explosions_remaining = explosion.amount.max(1);
    state.burst_delay_interval = explosion.amount_delay;
    state.burst_delay_ticks = 0;
    state.burst_radius = explosion.radius;
    state.burst_causes_fire = explosion.causes_fire;
    state.burst_breaks_blocks = explosion.breaks_blocks && definition.destroys_blocks;
    // Stored finite so it survives JSON; the threshold already reads as unbounded.
    state.burst_max_damage = explosion.max_damage.min(INFINITE_DAMAGE_THRESHOLD);
    state.burst_damage_scaling = explosion.damage_scaling;
}

/// Damage at `distance` from an explosion of `radius`.
///
/// `max_damage * (1 - distance/radius)^scaling`, zero beyond the radius, and
/// unbounded when `max_damage` is configured as infinite.
pub fn falloff_damage(max_damage: f64, scaling: f64, radius: f64, distance: f64) -> f64 {
    if radius <= 0.0 || distance > radius {
        return 0.0;
    }
    if max_damage >= INFINITE_DAMAGE_THRESHOLD {
        return f64::INFINITY;
    }
    let normalized = (1.0 - distance / radius).clamp(0.0, 1.0);
    max_damage * normalized.powf(scaling)
}

fn explode(
    state: &MutableState,
    center: DVec3,
    targets: &dyn TargetQuery,
    effects: &mut Vec<EffectRequest>,
) {
    effects.push(EffectRequest::CreateExplosion {
        position: center,
        radius: state.burst_radius,
        causes_fire: state.burst_causes_fire,
        breaks_blocks: state.burst_breaks_blocks,
    });

    if state.burst_max_damage <= 0.0 {
        return;
    }
    for target in targets.living_targets_in_box(center, state.burst_radius) {
        if !target.is_affectable() {
            continue;
        }
        let distance = target.position.distance(center);
        let amount = falloff_damage(
            state.burst_max_damage,
            state.burst_damage_scaling,
            state.burst_radius,
            distance,
        );
        if amount > 0.0 {
            effects.push(EffectRequest::ApplyDamage {
                target: target.id,
                amount,
                cause: DamageCause::Explosion,
            });
        }
    }
}

/// Advance the burst by one tick.
pub fn tick(
    state: &mut MutableState,
    center: DVec3,
    targets: &dyn TargetQuery,
    effects: &mut Vec<EffectRequest>,
) -> BurstOutcome {
    if !state.is_burst_active() {
        return BurstOutcome::Inactive;
    }
    if state.burst_delay_ticks > 0 {
        state.burst_delay_ticks -= 1;
        return BurstOutcome::Waiting;
    }

    explode(state, center, targets, effects);
    state.burst_explosions_remaining -= 1;
    effects.push(EffectRequest::Broadcast(SimEvent::BurstExplosion {
        remaining: state.burst_explosions_remaining,
    }));

    if state.burst_explosions_remaining > 0 {
        state.burst_delay_ticks = state.burst_delay_interval;
        return BurstOutcome::Exploded;
    }

    state.clear_burst();
    state.remaining_charges = state.remaining_charges.saturating_sub(1);
    if state.remaining_charges == 0 {
        debug!("Burst finished with no charges left");
        BurstOutcome::Exhausted
    } else {
        debug!("Burst finished, {} charge(s) left", state.remaining_charges);
        BurstOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growth_core::types::Target;

    fn destructive() -> Definition {
        Definition {
            destroys_blocks: true,
            charges: 2,
            ..Definition::inert()
        }
    }

    #[test]
    fn falloff_is_zero_at_and_beyond_radius() {
        assert_eq!(falloff_damage(20.0, 1.0, 4.0, 4.0), 0.0);
        assert_eq!(falloff_damage(20.0, 1.0, 4.0, 5.0), 0.0);
        assert_eq!(falloff_damage(20.0, 1.0, 4.0, 0.0), 20.0);
        assert!((falloff_damage(20.0, 2.0, 4.0, 2.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn infinite_damage_saturates() {
        assert!(falloff_damage(f64::INFINITY, 1.0, 4.0, 3.9).is_infinite());
        assert!(falloff_damage(INFINITE_DAMAGE_THRESHOLD, 1.0, 4.0, 1.0).is_infinite());
        assert_eq!(falloff_damage(f64::INFINITY, 1.0, 4.0, 4.1), 0.0);
    }

    #[test]
    fn block_breaking_is_gated_by_definition() {
        let explosion = ExplosionProfile::default();
        let mut state = MutableState::baseline(&destructive());
        start(&mut state, &explosion, &destructive());
        assert!(state.burst_breaks_blocks);

        let tame = Definition::inert();
        let mut state = MutableState::baseline(&tame);
        start(&mut state, &explosion, &tame);
        assert!(!state.burst_breaks_blocks);
    }

    #[test]
    fn three_explosions_with_delay_then_charge_spent() {
        let def = destructive();
        let explosion = ExplosionProfile {
            amount: 3,
            amount_delay: 2,
            ..Default::default()
        };
        let mut state = MutableState::baseline(&def);
        let targets: Vec<Target> = Vec::new();
        let mut effects = Vec::new();
        start(&mut state, &explosion, &def);

        let mut outcomes = Vec::new();
        for _ in 0..7 {
            outcomes.push(tick(&mut state, DVec3::ZERO, &targets, &mut effects));
        }
        use BurstOutcome::*;
        assert_eq!(
            outcomes,
            vec![Exploded, Waiting, Waiting, Exploded, Waiting, Waiting, Completed]
        );
        assert_eq!(state.remaining_charges, 1);
        assert!(!state.is_burst_active());
        assert_eq!(tick(&mut state, DVec3::ZERO, &targets, &mut effects), Inactive);

        let explosions = effects
            .iter()
            .filter(|e| matches!(e, EffectRequest::CreateExplosion { .. }))
            .count();
        assert_eq!(explosions, 3);
    }

    #[test]
    fn last_charge_signals_exhaustion() {
        let def = Definition {
            charges: 1,
            ..destructive()
        };
        let mut state = MutableState::baseline(&def);
        let targets: Vec<Target> = Vec::new();
        let mut effects = Vec::new();
        start(&mut state, &ExplosionProfile::default(), &def);
        assert_eq!(
            tick(&mut state, DVec3::ZERO, &targets, &mut effects),
            BurstOutcome::Exhausted
        );
        assert_eq!(state.remaining_charges, 0);
    }

    #[test]
    fn explosion_damages_targets_in_radius() {
        let def = destructive();
        let mut state = MutableState::baseline(&def);
        let mut dead = Target::new(3, DVec3::new(1.0, 0.0, 0.0));
        dead.alive = false;
        let targets = vec![
            Target::new(1, DVec3::new(2.0, 0.0, 0.0)),
            Target::new(2, DVec3::new(3.9, 3.9, 0.0)),
            dead,
        ];
        let mut effects = Vec::new();
        start(&mut state, &ExplosionProfile::default(), &def);
        tick(&mut state, DVec3::ZERO, &targets, &mut effects);

        let damaged: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                EffectRequest::ApplyDamage { target, amount, .. } => Some((target.0, *amount)),
                _ => None,
            })
            .collect();
        assert_eq!(damaged.len(), 1);
        assert_eq!(damaged[0].0, 1);
        assert!((damaged[0].1 - 10.0).abs() < 1e-12);
    }

    #[test]
    fn unbounded_damage_is_stored_finite() {
        let def = destructive();
        let mut state = MutableState::baseline(&def);
        let explosion = ExplosionProfile {
            max_damage: f64::INFINITY,
            ..Default::default()
        };
        start(&mut state, &explosion, &def);
        assert_eq!(state.burst_max_damage, INFINITE_DAMAGE_THRESHOLD);

        let targets = vec![Target::new(1, DVec3::new(1.0, 0.0, 0.0))];
        let mut effects = Vec::new();
        tick(&mut state, DVec3::ZERO, &targets, &mut effects);
        assert!(effects.iter().any(|e| matches!(
            e,
            EffectRequest::ApplyDamage { amount, .. } if amount.is_infinite()
        )));
    }
}
