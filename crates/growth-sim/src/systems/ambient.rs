//! Ambient particle and sound emission on independent cadences.

use glam::DVec3;

use growth_core::events::EffectRequest;
use growth_core::profiles::ParticleProfile;
use growth_core::state::MutableState;

use crate::systems::cadence;

/// Emission counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmbientEmission {
    pub particles: bool,
    pub sound: bool,
}

/// Tick both ambient channels. A missing profile or a disabled channel holds
/// its countdown at zero.
pub fn tick(
    state: &mut MutableState,
    profile: Option<&ParticleProfile>,
    center: DVec3,
    scale: f64,
    effects: &mut Vec<EffectRequest>,
) -> AmbientEmission {
    let mut emission = AmbientEmission::default();
    let Some(profile) = profile else {
        state.ambient_cooldown = 0;
        state.ambient_sound_cooldown = 0;
        return emission;
    };

    if profile.interval_ticks == 0 || profile.count == 0 {
        state.ambient_cooldown = 0;
    } else if cadence(&mut state.ambient_cooldown, profile.interval_ticks) {
        effects.push(EffectRequest::SpawnParticles {
            effect: profile.effect.clone(),
            position: center,
            count: profile.count,
            spread: profile.spread * scale.max(1.0),
            speed: profile.speed,
        });
        emission.particles = true;
    }

    match &profile.sound {
        Some(sound) if profile.sound_enabled() => {
            if cadence(&mut state.ambient_sound_cooldown, profile.sound_interval_ticks) {
                effects.push(EffectRequest::PlaySound {
                    sound: sound.clone(),
                    position: center,
                    volume: profile.volume,
                    pitch: profile.pitch,
                });
                emission.sound = true;
            }
        }
        _ => state.ambient_sound_cooldown = 0,
    }

    emission
}
