//! Mutable per-instance simulation state.
//!
//! One `MutableState` is owned by exactly one instance. Systems mutate it in
//! tick order; derived shapes are recomputed from it, never edited directly.

use std::collections::BTreeMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::definition::Definition;
use crate::enums::FusePhase;
use crate::types::{Shape, TargetId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutableState {
    // --- Scale ---
    pub current_scale: f64,
    /// Scale at the start of the last step, for render interpolation.
    pub previous_scale: f64,
    pub target_scale: f64,

    // --- Cadence countdowns (ticks) ---
    pub scale_cooldown: u32,
    pub pull_cooldown: u32,
    pub push_cooldown: u32,
    pub ambient_cooldown: u32,
    pub ambient_sound_cooldown: u32,

    // --- Fuse ---
    pub fuse_armed: bool,
    pub fuse_ticks_remaining: u32,
    pub collapse_ticks_remaining: u32,
    pub collapse_duration: u32,
    pub collapse_start_scale: f64,
    pub collapse_end_scale: f64,

    // --- Burst ---
    pub remaining_charges: u32,
    pub burst_explosions_remaining: u32,
    pub burst_delay_ticks: u32,
    pub burst_delay_interval: u32,
    pub burst_radius: f64,
    pub burst_causes_fire: bool,
    pub burst_breaks_blocks: bool,
    pub burst_max_damage: f64,
    pub burst_damage_scaling: f64,

    pub wobble_offset: DVec3,

    /// Target -> first tick at which it may be damaged again.
    pub touch_cooldowns: BTreeMap<TargetId, u64>,
    pub force_damage_cooldowns: BTreeMap<TargetId, u64>,

    #[serde(skip)]
    pub outline_shape: Shape,
    #[serde(skip)]
    pub collision_shape: Shape,
}

impl Default for MutableState {
    fn default() -> Self {
        Self::baseline(&Definition::inert())
    }
}

impl MutableState {
    /// Fresh state for a newly spawned (or reset) instance.
    pub fn baseline(definition: &Definition) -> Self {
        let (current, target) = definition.baseline_scales();
        Self {
            current_scale: current,
            previous_scale: current,
            target_scale: target,
            scale_cooldown: 0,
            pull_cooldown: 0,
            push_cooldown: 0,
            ambient_cooldown: 0,
            ambient_sound_cooldown: 0,
            fuse_armed: false,
            fuse_ticks_remaining: 0,
            collapse_ticks_remaining: 0,
            collapse_duration: 0,
            collapse_start_scale: current,
            collapse_end_scale: current,
            remaining_charges: definition.charges,
            burst_explosions_remaining: 0,
            burst_delay_ticks: 0,
            burst_delay_interval: 0,
            burst_radius: 0.0,
            burst_causes_fire: false,
            burst_breaks_blocks: false,
            burst_max_damage: 0.0,
            burst_damage_scaling: 1.0,
            wobble_offset: DVec3::ZERO,
            touch_cooldowns: BTreeMap::new(),
            force_damage_cooldowns: BTreeMap::new(),
            outline_shape: Shape::EMPTY,
            collision_shape: Shape::EMPTY,
        }
    }

    pub fn is_burst_active(&self) -> bool {
        self.burst_explosions_remaining > 0
    }

    pub fn fuse_phase(&self) -> FusePhase {
        if self.fuse_armed {
            FusePhase::Armed
        } else if self.is_burst_active() {
            FusePhase::Detonated
        } else {
            FusePhase::Disarmed
        }
    }

    pub fn clear_fuse(&mut self) {
        self.fuse_armed = false;
        self.fuse_ticks_remaining = 0;
        self.collapse_ticks_remaining = 0;
        self.collapse_duration = 0;
        self.collapse_start_scale = self.current_scale;
        self.collapse_end_scale = self.current_scale;
    }

    pub fn clear_burst(&mut self) {
        self.burst_explosions_remaining = 0;
        self.burst_delay_ticks = 0;
        self.burst_delay_interval = 0;
        self.burst_radius = 0.0;
        self.burst_causes_fire = false;
        self.burst_breaks_blocks = false;
        self.burst_max_damage = 0.0;
        self.burst_damage_scaling = 1.0;
    }

    /// Drop cooldown entries that no longer block anything.
    /// Returns the number of entries removed.
    pub fn sweep_cooldowns(&mut self, now: u64) -> usize {
        let before = self.touch_cooldowns.len() + self.force_damage_cooldowns.len();
        self.touch_cooldowns.retain(|_, next| *next > now);
        self.force_damage_cooldowns.retain(|_, next| *next > now);
        before - self.touch_cooldowns.len() - self.force_damage_cooldowns.len()
    }

    /// Restore invariants after loading or a definition change.
    /// Returns true if anything had to be repaired.
    pub fn repair(&mut self, definition: &Definition) -> bool {
        let before = self.clone();
        self.current_scale = definition.clamp_scale(self.current_scale);
        self.previous_scale = definition.clamp_scale(self.previous_scale);
        self.target_scale = definition.clamp_scale(self.target_scale);
        self.collapse_start_scale = definition.clamp_scale(self.collapse_start_scale);
        self.collapse_end_scale = definition.clamp_scale(self.collapse_end_scale);
        if !self.fuse_armed {
            self.fuse_ticks_remaining = 0;
        }
        self.collapse_ticks_remaining = self.collapse_ticks_remaining.min(self.collapse_duration);
        if !self.burst_radius.is_finite() || self.burst_radius < 0.0 {
            self.burst_radius = 0.0;
        }
        if self.burst_max_damage.is_nan() || self.burst_max_damage < 0.0 {
            self.burst_max_damage = 0.0;
        }
        if !self.burst_damage_scaling.is_finite() || self.burst_damage_scaling < 0.0 {
            self.burst_damage_scaling = 1.0;
        }
        if !self.wobble_offset.is_finite() || !definition.wobble_enabled {
            self.wobble_offset = DVec3::ZERO;
        }
        *self != before
    }
}
