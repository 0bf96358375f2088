//! Fuse controller: arming, pulse effects, shell collapse and detonation.
//!
//! Disarmed -> Armed -> Detonated. Detonation hands over to the burst
//! sequencer; the fuse itself is cleared at that point.

use glam::DVec3;
use log::{debug, trace};

use growth_core::definition::Definition;
use growth_core::enums::{ArmCause, FuseTrigger};
use growth_core::events::{EffectRequest, SimEvent};
use growth_core::profiles::{ExplosionProfile, FuseProfile};
use growth_core::state::MutableState;
use growth_core::types::HeldItem;

use crate::systems::burst;

/// What the fuse did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuseOutcome {
    Idle,
    Armed,
    /// Counting down, nothing observable.
    Ticking,
    /// Counting down with a pulse. `target_lowered` if the collapse pulled the target down.
    Pulsed { target_lowered: bool },
    Detonated,
    Disarmed,
}

/// Why a manual arm request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmRejection {
    NoFuse,
    AlreadyArmed,
    BurstActive,
    NoCharges,
    WrongTrigger,
    ProgressTooLow,
    MissingItem,
    ItemNotAllowed(String),
    NotEnoughItems { required: u32, held: u32 },
}

/// Item usage to report once a manual arm is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemUse {
    pub consume: u32,
    pub damage: u32,
}

/// Scale the shell collapses to: the profile's value when present, otherwise
/// the definition's minimum.
pub fn collapse_target(fuse: &FuseProfile, definition: &Definition) -> f64 {
    match fuse.collapse_scale {
        Some(scale) => definition.clamp_scale(scale),
        None => definition.min_scale,
    }
}

fn arming_blocked(state: &MutableState) -> Option<ArmRejection> {
    if state.fuse_armed {
        Some(ArmRejection::AlreadyArmed)
    } else if state.is_burst_active() {
        Some(ArmRejection::BurstActive)
    } else if state.remaining_charges == 0 {
        Some(ArmRejection::NoCharges)
    } else {
        None
    }
}

pub fn should_auto_arm(state: &MutableState, definition: &Definition, fuse: &FuseProfile) -> bool {
    fuse.trigger == FuseTrigger::Auto
        && arming_blocked(state).is_none()
        && definition.growth_progress(state.current_scale) >= fuse.auto_progress
}

/// Check whether a manual arm request would be accepted, without side effects.
pub fn check_manual_arm(
    state: &MutableState,
    definition: &Definition,
    fuse: Option<&FuseProfile>,
    cause: ArmCause,
    held: Option<&HeldItem>,
) -> Result<ItemUse, ArmRejection> {
    let fuse = fuse.ok_or(ArmRejection::NoFuse)?;
    if let Some(blocked) = arming_blocked(state) {
        return Err(blocked);
    }
    if !fuse.trigger.accepts(cause) {
        return Err(ArmRejection::WrongTrigger);
    }
    if definition.growth_progress(state.current_scale) < fuse.manual_min_progress {
        return Err(ArmRejection::ProgressTooLow);
    }

    let Some(requirement) = &fuse.item else {
        return Ok(ItemUse::default());
    };
    let item = held
        .filter(|item| item.count > 0)
        .ok_or(ArmRejection::MissingItem)?;
    if !requirement.allows(&item.item_id) {
        return Err(ArmRejection::ItemNotAllowed(item.item_id.clone()));
    }
    if requirement.consume > item.count {
        return Err(ArmRejection::NotEnoughItems {
            required: requirement.consume,
            held: item.count,
        });
    }
    Ok(ItemUse {
        consume: requirement.consume,
        damage: requirement.damage,
    })
}

/// Arm the fuse unconditionally.
pub fn arm(
    state: &mut MutableState,
    definition: &Definition,
    fuse: &FuseProfile,
    center: DVec3,
    effects: &mut Vec<EffectRequest>,
) {
    state.fuse_armed = true;
    state.fuse_ticks_remaining = fuse.explosion_delay;
    state.collapse_duration = fuse.shell_collapse;
    state.collapse_ticks_remaining = fuse.shell_collapse;
    state.collapse_start_scale = state.current_scale;
    state.collapse_end_scale = collapse_target(fuse, definition);

    effects.push(EffectRequest::Broadcast(SimEvent::Armed {
        fuse_ticks: fuse.explosion_delay,
    }));
    if let Some(sound) = &fuse.armed_sound {
        effects.push(EffectRequest::PlaySound {
            sound: sound.clone(),
            position: center,
            volume: 1.0,
            pitch: 1.0,
        });
    }
    debug!(
        "Fuse armed: {} ticks, collapse {:.3} -> {:.3} over {} ticks",
        fuse.explosion_delay,
        state.collapse_start_scale,
        state.collapse_end_scale,
        fuse.shell_collapse
    );
}

/// Zero all fuse fields and drop any pending burst.
pub fn disarm(state: &mut MutableState, effects: &mut Vec<EffectRequest>) {
    let was_active = state.fuse_armed || state.is_burst_active();
    state.clear_fuse();
    state.clear_burst();
    if was_active {
        effects.push(EffectRequest::Broadcast(SimEvent::Disarmed));
    }
}

/// Current point on the collapse curve, or `None` without a configured collapse.
pub fn collapse_sample(state: &MutableState) -> Option<f64> {
    if state.collapse_duration == 0 {
        return None;
    }
    let remaining = state.collapse_ticks_remaining.min(state.collapse_duration) as f64;
    let progress = 1.0 - remaining / state.collapse_duration as f64;
    Some(
        state.collapse_start_scale
            + (state.collapse_end_scale - state.collapse_start_scale) * progress,
    )
}

/// Evaluate the fuse for one tick.
pub fn run(
    state: &mut MutableState,
    definition: &Definition,
    fuse: Option<&FuseProfile>,
    explosion: &ExplosionProfile,
    center: DVec3,
    effects: &mut Vec<EffectRequest>,
) -> FuseOutcome {
    let Some(fuse) = fuse else {
        if state.fuse_armed || state.is_burst_active() {
            disarm(state, effects);
            return FuseOutcome::Disarmed;
        }
        return FuseOutcome::Idle;
    };

    if !state.fuse_armed {
        if should_auto_arm(state, definition, fuse) {
            arm(state, definition, fuse, center, effects);
            return FuseOutcome::Armed;
        }
        return FuseOutcome::Idle;
    }

    state.fuse_ticks_remaining = state.fuse_ticks_remaining.saturating_sub(1);
    state.collapse_ticks_remaining = state.collapse_ticks_remaining.saturating_sub(1);

    if state.fuse_ticks_remaining == 0 {
        state.clear_fuse();
        burst::start(state, explosion, definition);
        effects.push(EffectRequest::Broadcast(SimEvent::Detonated {
            explosions: state.burst_explosions_remaining,
        }));
        debug!(
            "Fuse detonated: {} explosion(s) queued",
            state.burst_explosions_remaining
        );
        return FuseOutcome::Detonated;
    }

    let interval = fuse.pulse_interval.max(1);
    if state.fuse_ticks_remaining % interval != 0 {
        return FuseOutcome::Ticking;
    }

    effects.push(EffectRequest::Broadcast(SimEvent::Pulse {
        fuse_ticks_remaining: state.fuse_ticks_remaining,
    }));
    if let Some(particle) = &fuse.pulse_particle {
        effects.push(EffectRequest::SpawnParticles {
            effect: particle.clone(),
            position: center,
            count: fuse.pulse_particle_count,
            spread: state.current_scale * 0.5,
            speed: 0.05,
        });
    }
    if let Some(sound) = &fuse.pulse_sound {
        effects.push(EffectRequest::PlaySound {
            sound: sound.clone(),
            position: center,
            volume: 0.8,
            pitch: 1.0 + 0.5 * (1.0 - state.fuse_ticks_remaining as f64 / fuse.explosion_delay.max(1) as f64),
        });
    }

    let mut target_lowered = false;
    if let Some(sample) = collapse_sample(state) {
        let lowered = state.target_scale.min(definition.clamp_scale(sample));
        target_lowered = lowered < state.target_scale;
        state.target_scale = lowered;
    }
    trace!(
        "Fuse pulse at {} ticks remaining, target scale {:.3}",
        state.fuse_ticks_remaining,
        state.target_scale
    );
    FuseOutcome::Pulsed { target_lowered }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growth_core::enums::FusePhase;
    use growth_core::profiles::ItemRequirement;

    fn bloom() -> Definition {
        Definition {
            min_scale: 0.2,
            max_scale: 2.0,
            growth_enabled: true,
            fuse_profile: Some("fuse".into()),
            charges: 2,
            ..Definition::inert()
        }
    }

    fn auto_fuse() -> FuseProfile {
        FuseProfile {
            trigger: FuseTrigger::Auto,
            auto_progress: 0.8,
            explosion_delay: 40,
            pulse_interval: 10,
            ..Default::default()
        }
    }

    fn grown(def: &Definition, progress: f64) -> MutableState {
        let mut state = MutableState::baseline(def);
        state.current_scale = def.min_scale + (def.max_scale - def.min_scale) * progress;
        state
    }

    #[test]
    fn auto_arms_at_threshold_and_detonates_after_delay() {
        let def = bloom();
        let fuse = auto_fuse();
        let explosion = ExplosionProfile::default();
        let mut effects = Vec::new();

        let mut state = grown(&def, 0.79);
        let outcome = run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects);
        assert_eq!(outcome, FuseOutcome::Idle);

        state.current_scale = def.min_scale + (def.max_scale - def.min_scale) * 0.85;
        let outcome = run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects);
        assert_eq!(outcome, FuseOutcome::Armed);
        assert_eq!(state.fuse_ticks_remaining, 40);

        let mut last = state.fuse_ticks_remaining;
        for tick in 1..=40 {
            let outcome = run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects);
            if tick < 40 {
                assert!(state.fuse_ticks_remaining < last, "fuse must strictly decrease");
                last = state.fuse_ticks_remaining;
                assert_ne!(outcome, FuseOutcome::Detonated);
            } else {
                assert_eq!(outcome, FuseOutcome::Detonated);
            }
        }
        assert!(!state.fuse_armed);
        assert_eq!(state.fuse_phase(), FusePhase::Detonated);
        assert!(effects.contains(&EffectRequest::Broadcast(SimEvent::Armed { fuse_ticks: 40 })));
    }

    #[test]
    fn pulses_on_interval() {
        let def = bloom();
        let fuse = auto_fuse();
        let explosion = ExplosionProfile::default();
        let mut effects = Vec::new();
        let mut state = grown(&def, 1.0);
        run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects);

        let mut pulses = 0;
        for _ in 0..39 {
            if let FuseOutcome::Pulsed { .. } =
                run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects)
            {
                pulses += 1;
            }
        }
        // Pulses at 30, 20 and 10 ticks remaining.
        assert_eq!(pulses, 3);
    }

    #[test]
    fn collapse_only_lowers_target() {
        let def = bloom();
        let fuse = FuseProfile {
            shell_collapse: 20,
            collapse_scale: Some(0.5),
            pulse_interval: 1,
            ..auto_fuse()
        };
        let explosion = ExplosionProfile::default();
        let mut effects = Vec::new();
        let mut state = grown(&def, 1.0);
        run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects);
        assert_eq!(state.collapse_end_scale, 0.5);

        let mut last_target = state.target_scale;
        while state.fuse_armed {
            run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects);
            assert!(state.target_scale <= last_target);
            last_target = state.target_scale;
        }
        assert!((last_target - 0.5).abs() < 1e-9);
    }

    #[test]
    fn collapse_target_prefers_profile_value() {
        let def = bloom();
        let mut fuse = auto_fuse();
        assert_eq!(collapse_target(&fuse, &def), 0.2);
        fuse.collapse_scale = Some(1.2);
        assert_eq!(collapse_target(&fuse, &def), 1.2);
        fuse.collapse_scale = Some(9.0);
        assert_eq!(collapse_target(&fuse, &def), 2.0);
    }

    #[test]
    fn removing_fuse_profile_disarms_and_clears_burst() {
        let def = bloom();
        let fuse = auto_fuse();
        let explosion = ExplosionProfile::default();
        let mut effects = Vec::new();
        let mut state = grown(&def, 1.0);
        run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects);
        state.burst_explosions_remaining = 2;

        let outcome = run(&mut state, &def, None, &explosion, DVec3::ZERO, &mut effects);
        assert_eq!(outcome, FuseOutcome::Disarmed);
        assert!(!state.fuse_armed);
        assert_eq!(state.fuse_ticks_remaining, 0);
        assert!(!state.is_burst_active());
        assert_eq!(effects.last(), Some(&EffectRequest::Broadcast(SimEvent::Disarmed)));
    }

    #[test]
    fn removing_fuse_profile_mid_burst_drops_remaining_explosions() {
        let def = bloom();
        let explosion = ExplosionProfile {
            amount: 3,
            ..Default::default()
        };
        let mut effects = Vec::new();
        let mut state = grown(&def, 1.0);
        burst::start(&mut state, &explosion, &def);
        assert!(!state.fuse_armed);

        let outcome = run(&mut state, &def, None, &explosion, DVec3::ZERO, &mut effects);
        assert_eq!(outcome, FuseOutcome::Disarmed);
        assert!(!state.is_burst_active());
        assert_eq!(effects.last(), Some(&EffectRequest::Broadcast(SimEvent::Disarmed)));
    }

    #[test]
    fn zero_delay_detonates_on_next_tick() {
        let def = bloom();
        let fuse = FuseProfile {
            explosion_delay: 0,
            ..auto_fuse()
        };
        let explosion = ExplosionProfile::default();
        let mut effects = Vec::new();
        let mut state = grown(&def, 1.0);
        assert_eq!(
            run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects),
            FuseOutcome::Armed
        );
        assert_eq!(
            run(&mut state, &def, Some(&fuse), &explosion, DVec3::ZERO, &mut effects),
            FuseOutcome::Detonated
        );
    }

    #[test]
    fn manual_arm_checks_trigger_and_items() {
        let def = bloom();
        let fuse = FuseProfile {
            trigger: FuseTrigger::Interact,
            item: Some(ItemRequirement {
                allowed_items: vec!["flint".into()],
                consume: 1,
                damage: 0,
            }),
            ..auto_fuse()
        };
        let state = grown(&def, 0.1);
        let flint = HeldItem::new("flint", 3);
        let stick = HeldItem::new("stick", 1);

        assert_eq!(
            check_manual_arm(&state, &def, Some(&fuse), ArmCause::Attack, Some(&flint)),
            Err(ArmRejection::WrongTrigger)
        );
        assert_eq!(
            check_manual_arm(&state, &def, Some(&fuse), ArmCause::Interact, None),
            Err(ArmRejection::MissingItem)
        );
        assert_eq!(
            check_manual_arm(&state, &def, Some(&fuse), ArmCause::Interact, Some(&stick)),
            Err(ArmRejection::ItemNotAllowed("stick".into()))
        );
        assert_eq!(
            check_manual_arm(&state, &def, Some(&fuse), ArmCause::Interact, Some(&flint)),
            Ok(ItemUse { consume: 1, damage: 0 })
        );
        assert_eq!(
            check_manual_arm(&state, &def, None, ArmCause::Interact, Some(&flint)),
            Err(ArmRejection::NoFuse)
        );
    }

    #[test]
    fn manual_arm_blocked_without_charges_or_during_burst() {
        let def = bloom();
        let fuse = FuseProfile {
            trigger: FuseTrigger::Attack,
            ..auto_fuse()
        };
        let mut state = grown(&def, 0.5);
        state.burst_explosions_remaining = 1;
        assert_eq!(
            check_manual_arm(&state, &def, Some(&fuse), ArmCause::Attack, None),
            Err(ArmRejection::BurstActive)
        );
        state.burst_explosions_remaining = 0;
        state.remaining_charges = 0;
        assert_eq!(
            check_manual_arm(&state, &def, Some(&fuse), ArmCause::Attack, None),
            Err(ArmRejection::NoCharges)
        );
    }
}
