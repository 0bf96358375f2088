//! Radial push/pull field with optional ring-band shaping.

use std::collections::BTreeMap;

use glam::DVec3;
use log::trace;

use growth_core::constants::*;
use growth_core::enums::{DamageCause, ForceMode};
use growth_core::events::{EffectRequest, SimEvent};
use growth_core::profiles::{ForceProfile, RingBand, RingBehavior};
use growth_core::types::TargetId;

use crate::host::TargetQuery;
use crate::systems::cadence;

/// Per-target outcome of a ring band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RingDecision {
    /// No force on this target.
    Hold,
    /// Push with radial `direction` (+1 away from the center, -1 toward it),
    /// scaling the impulse by `multiplier`.
    Push { direction: f64, multiplier: f64 },
}

/// Where the field is evaluated from.
#[derive(Debug, Clone, Copy)]
pub struct FieldOrigin {
    pub center: DVec3,
    pub scale_factor: f64,
    pub now: u64,
}

/// Effective radius of a profile at the given scale.
pub fn base_radius(profile: &ForceProfile, scale_factor: f64) -> f64 {
    (profile.radius * scale_factor).max(MIN_FORCE_RADIUS)
}

/// Impulse magnitude at `distance`; zero at and beyond `base_radius`.
pub fn impulse(profile: &ForceProfile, base_radius: f64, distance: f64) -> f64 {
    let distance = distance.max(MIN_TARGET_DISTANCE);
    if distance >= base_radius {
        return 0.0;
    }
    let normalized = 1.0 - distance / base_radius;
    let edge = if profile.edge_falloff > 0.0 {
        ((base_radius - distance) / (base_radius * profile.edge_falloff)).min(1.0)
    } else {
        1.0
    };
    profile.strength * normalized.powf(profile.falloff) * edge
}

/// Band whose center line is closest to `distance`.
pub fn nearest_band(bands: &[RingBand], distance: f64) -> Option<&RingBand> {
    bands.iter().min_by(|a, b| {
        (distance - a.radius)
            .abs()
            .total_cmp(&(distance - b.radius).abs())
    })
}

pub fn ring_decision(behavior: &RingBehavior, band: &RingBand, distance: f64) -> RingDecision {
    match behavior {
        RingBehavior::KeepOnRing { min_correction } => {
            if band.contains(distance) {
                return RingDecision::Hold;
            }
            let width = band.width().max(MIN_TARGET_DISTANCE);
            let offset = (distance - band.radius).abs();
            let floor = min_correction.clamp(0.0, 1.0);
            RingDecision::Push {
                direction: if distance < band.inner_radius { 1.0 } else { -1.0 },
                multiplier: (offset / width).clamp(floor, 1.0),
            }
        }
        RingBehavior::KeepInside => {
            if distance < band.inner_radius {
                RingDecision::Push {
                    direction: 1.0,
                    multiplier: 1.0,
                }
            } else if distance > band.outer_radius {
                RingDecision::Push {
                    direction: -1.0,
                    multiplier: 1.0,
                }
            } else {
                RingDecision::Hold
            }
        }
        RingBehavior::KeepOutside => {
            if distance <= band.outer_radius {
                RingDecision::Push {
                    direction: 1.0,
                    multiplier: 1.0,
                }
            } else {
                RingDecision::Hold
            }
        }
        RingBehavior::None => RingDecision::Hold,
    }
}

/// Evaluate the field once. Returns the number of targets pushed.
pub fn evaluate(
    mode: ForceMode,
    profile: &ForceProfile,
    origin: FieldOrigin,
    targets: &dyn TargetQuery,
    damage_cooldowns: &mut BTreeMap<TargetId, u64>,
    effects: &mut Vec<EffectRequest>,
) -> usize {
    let center = origin.center;
    let radius = base_radius(profile, origin.scale_factor);
    let ring = profile.ring.as_ref().filter(|_| profile.has_ring_config());
    let bands = ring
        .map(|r| r.bands(origin.scale_factor))
        .unwrap_or_default();

    if let Some(particle) = &profile.particle {
        effects.push(EffectRequest::SpawnParticles {
            effect: particle.clone(),
            position: center,
            count: profile.particle_count,
            spread: radius * 0.5,
            speed: profile.strength * 0.1,
        });
    }
    if let Some(sound) = &profile.sound {
        effects.push(EffectRequest::PlaySound {
            sound: sound.clone(),
            position: center,
            volume: profile.volume,
            pitch: profile.pitch,
        });
    }
    if !bands.is_empty() {
        effects.push(EffectRequest::Broadcast(SimEvent::RingField {
            center,
            bands: bands.clone(),
        }));
    }

    let mut affected = 0;
    for target in targets.living_targets_in_box(center, radius) {
        if !target.is_affectable() {
            continue;
        }
        let offset = target.position - center;
        let distance = offset.length().max(MIN_TARGET_DISTANCE);
        if distance > radius {
            continue;
        }
        let magnitude = impulse(profile, radius, distance);
        if magnitude <= 0.0 {
            continue;
        }

        let (direction, multiplier) = match ring {
            Some(ring) => {
                let Some(band) = nearest_band(&bands, distance) else {
                    continue;
                };
                match ring_decision(&ring.behavior, band, distance) {
                    RingDecision::Hold => continue,
                    RingDecision::Push {
                        direction,
                        multiplier,
                    } => (direction, multiplier),
                }
            }
            None => (mode.sign(), 1.0),
        };

        let normalized = 1.0 - distance / radius;
        let radial = offset / distance;
        let delta = radial * direction * magnitude * multiplier
            + DVec3::Y * profile.vertical_boost * normalized.powf(VERTICAL_BOOST_EXPONENT);
        effects.push(EffectRequest::ApplyVelocity {
            target: target.id,
            delta,
        });

        if profile.impact_damage > 0.0 {
            let ready = damage_cooldowns
                .get(&target.id)
                .map_or(true, |next| origin.now >= *next);
            if ready {
                effects.push(EffectRequest::ApplyDamage {
                    target: target.id,
                    amount: profile.impact_damage.min(IMPACT_DAMAGE_CAP),
                    cause: DamageCause::Impact,
                });
                damage_cooldowns.insert(
                    target.id,
                    origin.now + u64::from(profile.impact_cooldown.max(1)),
                );
            }
        }

        if profile.guardian_beams {
            effects.push(EffectRequest::Broadcast(SimEvent::Beam {
                target: target.id,
                from: center,
                to: target.position,
            }));
        }
        affected += 1;
    }

    trace!("{mode:?} field r={radius:.2} affected {affected} target(s)");
    affected
}

/// Run one push or pull channel on its cadence, within the profile's progress window.
/// Returns the number of targets pushed when the field fired.
#[allow(clippy::too_many_arguments)]
pub fn run_channel(
    mode: ForceMode,
    profile: &ForceProfile,
    countdown: &mut u32,
    progress: f64,
    origin: FieldOrigin,
    targets: &dyn TargetQuery,
    damage_cooldowns: &mut BTreeMap<TargetId, u64>,
    effects: &mut Vec<EffectRequest>,
) -> Option<usize> {
    if !profile.progress_in_window(progress) {
        return None;
    }
    if !cadence(countdown, profile.interval_ticks) {
        return None;
    }
    Some(evaluate(
        mode,
        profile,
        origin,
        targets,
        damage_cooldowns,
        effects,
    ))
}
