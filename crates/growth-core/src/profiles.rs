//! Immutable configuration profiles referenced by definitions.
//!
//! Profiles are plain data loaded from the host's registry. Every field has a
//! default so partially specified documents still resolve, and `sanitize`
//! repairs out-of-range values instead of rejecting the profile.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::FuseTrigger;

/// Clamp `value` into `[lo, hi]`, replacing non-finite input with `fallback`.
/// Returns true if the value changed.
fn clamp_field(value: &mut f64, lo: f64, hi: f64, fallback: f64) -> bool {
    let repaired = if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    };
    let changed = repaired != *value;
    *value = repaired;
    changed
}

// ---- Force ----

/// How ring bands shape the direction of the force field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RingBehavior {
    /// Hold targets on the ring; corrections scale with the distance off the band.
    KeepOnRing { min_correction: f64 },
    /// Hold targets between the inner and outer radius.
    KeepInside,
    /// Push anything at or inside the outer radius away.
    KeepOutside,
    /// Rings are visual only.
    None,
}

impl Default for RingBehavior {
    fn default() -> Self {
        RingBehavior::KeepOnRing {
            min_correction: RING_CORRECTION_FLOOR,
        }
    }
}

/// Ring configuration attached to a force profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Ring center-line radii at scale 1.0.
    pub radii: Vec<f64>,
    /// Band width at scale 1.0.
    pub width: f64,
    pub behavior: RingBehavior,
    /// Visual profile broadcast with the ring field.
    pub field_profile: Option<String>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            radii: Vec::new(),
            width: 1.0,
            behavior: RingBehavior::default(),
            field_profile: None,
        }
    }
}

/// One annular band derived from a [`RingConfig`] at the current scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingBand {
    pub radius: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub field_profile: Option<String>,
}

impl RingBand {
    pub fn width(&self) -> f64 {
        self.outer_radius - self.inner_radius
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.inner_radius && distance <= self.outer_radius
    }
}

impl RingConfig {
    /// Bands scaled by `scale_factor`, ordered by radius.
    pub fn bands(&self, scale_factor: f64) -> Vec<RingBand> {
        let half_width = (self.width * scale_factor).max(MIN_TARGET_DISTANCE) * 0.5;
        let mut bands: Vec<RingBand> = self
            .radii
            .iter()
            .filter(|r| r.is_finite() && **r > 0.0)
            .map(|r| {
                let radius = r * scale_factor;
                RingBand {
                    radius,
                    inner_radius: (radius - half_width).max(0.0),
                    outer_radius: radius + half_width,
                    field_profile: self.field_profile.clone(),
                }
            })
            .collect();
        bands.sort_by(|a, b| a.radius.total_cmp(&b.radius));
        bands
    }

    fn sanitize(&mut self) -> bool {
        let mut changed = clamp_field(&mut self.width, MIN_TARGET_DISTANCE, 1024.0, 1.0);
        let before = self.radii.len();
        self.radii.retain(|r| r.is_finite() && *r > 0.0);
        changed |= before != self.radii.len();
        if let RingBehavior::KeepOnRing { min_correction } = &mut self.behavior {
            changed |= clamp_field(min_correction, 0.0, 1.0, RING_CORRECTION_FLOOR);
        }
        changed
    }
}

/// Push/pull field parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceProfile {
    /// Field radius at scale 1.0.
    pub radius: f64,
    pub strength: f64,
    /// Exponent applied to the normalized distance.
    pub falloff: f64,
    /// Fraction of the radius over which the field fades out at its edge (0 = hard edge).
    pub edge_falloff: f64,
    pub vertical_boost: f64,
    /// Growth progress window in which the field is active.
    pub start_progress: f64,
    pub end_progress: f64,
    /// Ticks between evaluations.
    pub interval_ticks: u32,
    pub impact_damage: f64,
    pub impact_cooldown: u32,
    pub guardian_beams: bool,
    pub particle: Option<String>,
    pub particle_count: u32,
    pub sound: Option<String>,
    pub volume: f64,
    pub pitch: f64,
    pub ring: Option<RingConfig>,
}

impl Default for ForceProfile {
    fn default() -> Self {
        Self {
            radius: 6.0,
            strength: 0.35,
            falloff: 1.0,
            edge_falloff: 0.0,
            vertical_boost: 0.0,
            start_progress: 0.0,
            end_progress: 1.0,
            interval_ticks: 1,
            impact_damage: 0.0,
            impact_cooldown: 20,
            guardian_beams: false,
            particle: Some("field_swirl".to_string()),
            particle_count: 4,
            sound: None,
            volume: 0.5,
            pitch: 1.0,
            ring: None,
        }
    }
}

impl ForceProfile {
    pub fn has_ring_config(&self) -> bool {
        self.ring.as_ref().is_some_and(|r| !r.radii.is_empty())
    }

    pub fn progress_in_window(&self, progress: f64) -> bool {
        progress >= self.start_progress && progress <= self.end_progress
    }

    /// Repair out-of-range values. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = clamp_field(&mut self.radius, 0.0, 256.0, 6.0);
        changed |= clamp_field(&mut self.strength, 0.0, 64.0, 0.35);
        changed |= clamp_field(&mut self.falloff, 0.0, 16.0, 1.0);
        changed |= clamp_field(&mut self.edge_falloff, 0.0, 1.0, 0.0);
        changed |= clamp_field(&mut self.vertical_boost, -16.0, 16.0, 0.0);
        changed |= clamp_field(&mut self.start_progress, 0.0, 1.0, 0.0);
        changed |= clamp_field(&mut self.end_progress, 0.0, 1.0, 1.0);
        if self.end_progress < self.start_progress {
            std::mem::swap(&mut self.start_progress, &mut self.end_progress);
            changed = true;
        }
        changed |= clamp_field(&mut self.impact_damage, 0.0, f64::MAX, 0.0);
        changed |= clamp_field(&mut self.volume, 0.0, 10.0, 0.5);
        changed |= clamp_field(&mut self.pitch, 0.0, 4.0, 1.0);
        if let Some(ring) = &mut self.ring {
            changed |= ring.sanitize();
        }
        changed
    }
}

// ---- Fuse ----

/// Item gate for manual arming. Presence of the requirement means an item must be held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRequirement {
    /// Accepted item ids. Empty accepts any held item.
    pub allowed_items: Vec<String>,
    /// Items consumed from the stack per accepted arm.
    pub consume: u32,
    /// Durability damage applied to the item per accepted arm.
    pub damage: u32,
}

impl ItemRequirement {
    pub fn allows(&self, item_id: &str) -> bool {
        self.allowed_items.is_empty() || self.allowed_items.iter().any(|i| i == item_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuseProfile {
    pub trigger: FuseTrigger,
    /// Growth progress at which an `Auto` fuse arms itself.
    pub auto_progress: f64,
    /// Minimum growth progress for manual arming.
    pub manual_min_progress: f64,
    /// Ticks from arming to detonation.
    pub explosion_delay: u32,
    pub pulse_interval: u32,
    /// Ticks over which the shell collapses toward `collapse_scale`.
    pub shell_collapse: u32,
    /// Absolute scale the shell collapses to. Falls back to the definition minimum.
    pub collapse_scale: Option<f64>,
    pub item: Option<ItemRequirement>,
    pub armed_sound: Option<String>,
    pub pulse_sound: Option<String>,
    pub pulse_particle: Option<String>,
    pub pulse_particle_count: u32,
}

impl Default for FuseProfile {
    fn default() -> Self {
        Self {
            trigger: FuseTrigger::Auto,
            auto_progress: 1.0,
            manual_min_progress: 0.0,
            explosion_delay: 40,
            pulse_interval: 10,
            shell_collapse: 0,
            collapse_scale: None,
            item: None,
            armed_sound: Some("fuse_armed".to_string()),
            pulse_sound: Some("fuse_pulse".to_string()),
            pulse_particle: Some("fuse_smoke".to_string()),
            pulse_particle_count: 6,
        }
    }
}

impl FuseProfile {
    pub fn sanitize(&mut self) -> bool {
        let mut changed = clamp_field(&mut self.auto_progress, 0.0, 1.0, 1.0);
        changed |= clamp_field(&mut self.manual_min_progress, 0.0, 1.0, 0.0);
        if self.pulse_interval == 0 {
            self.pulse_interval = 1;
            changed = true;
        }
        if let Some(scale) = &mut self.collapse_scale {
            changed |= clamp_field(scale, MIN_SCALE_FLOOR, MAX_SCALE_CEILING, MIN_SCALE_FLOOR);
        }
        changed
    }
}

// ---- Explosion ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionProfile {
    pub radius: f64,
    pub causes_fire: bool,
    pub breaks_blocks: bool,
    /// Damage at the center. At or above `INFINITE_DAMAGE_THRESHOLD` it is unbounded.
    pub max_damage: f64,
    /// Falloff exponent over normalized distance.
    pub damage_scaling: f64,
    /// Explosions per burst.
    pub amount: u32,
    /// Ticks between explosions within one burst.
    pub amount_delay: u32,
}

impl Default for ExplosionProfile {
    fn default() -> Self {
        Self {
            radius: 4.0,
            causes_fire: false,
            breaks_blocks: true,
            max_damage: 20.0,
            damage_scaling: 1.0,
            amount: 1,
            amount_delay: 10,
        }
    }
}

impl ExplosionProfile {
    pub fn sanitize(&mut self) -> bool {
        let mut changed = clamp_field(&mut self.radius, MIN_TARGET_DISTANCE, 256.0, 4.0);
        // Infinity is a legal way to configure unbounded damage.
        if self.max_damage.is_nan() || self.max_damage < 0.0 {
            self.max_damage = 0.0;
            changed = true;
        }
        changed |= clamp_field(&mut self.damage_scaling, 0.0, 16.0, 1.0);
        if self.amount == 0 {
            self.amount = 1;
            changed = true;
        }
        changed
    }
}

// ---- Particle ----

/// Ambient emission cadence. An interval of 0 disables that channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleProfile {
    pub effect: String,
    pub count: u32,
    pub spread: f64,
    pub speed: f64,
    pub interval_ticks: u32,
    pub sound: Option<String>,
    pub sound_interval_ticks: u32,
    pub volume: f64,
    pub pitch: f64,
}

impl Default for ParticleProfile {
    fn default() -> Self {
        Self {
            effect: "ambient_spark".to_string(),
            count: 2,
            spread: 0.35,
            speed: 0.02,
            interval_ticks: 10,
            sound: None,
            sound_interval_ticks: 0,
            volume: 0.6,
            pitch: 1.0,
        }
    }
}

impl ParticleProfile {
    pub fn sound_enabled(&self) -> bool {
        self.sound.is_some() && self.sound_interval_ticks > 0
    }

    pub fn sanitize(&mut self) -> bool {
        let mut changed = clamp_field(&mut self.spread, 0.0, 64.0, 0.35);
        changed |= clamp_field(&mut self.speed, 0.0, 16.0, 0.02);
        changed |= clamp_field(&mut self.volume, 0.0, 10.0, 0.6);
        changed |= clamp_field(&mut self.pitch, 0.0, 4.0, 1.0);
        changed
    }
}
