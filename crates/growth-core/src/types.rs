//! Fundamental geometric and simulation types.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Seconds per tick at the default tick rate.
    pub fn dt(&self) -> f64 {
        1.0 / crate::constants::TICK_RATE as f64
    }

    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_secs += self.dt();
    }
}

/// Host-assigned identity of a living target (player, mob, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// A living entity returned by the host's spatial query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub position: DVec3,
    pub alive: bool,
    pub spectator: bool,
}

impl Target {
    pub fn new(id: u64, position: DVec3) -> Self {
        Self {
            id: TargetId(id),
            position,
            alive: true,
            spectator: false,
        }
    }

    /// Whether the simulation may act on this target at all.
    pub fn is_affectable(&self) -> bool {
        self.alive && !self.spectator
    }
}

/// Item held by whoever requests a manual arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldItem {
    pub item_id: String,
    pub count: u32,
}

impl HeldItem {
    pub fn new(item_id: impl Into<String>, count: u32) -> Self {
        Self {
            item_id: item_id.into(),
            count,
        }
    }
}

/// Axis-aligned box used for both outline and collision geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub min: DVec3,
    pub max: DVec3,
}

impl Shape {
    pub const EMPTY: Shape = Shape {
        min: DVec3::ZERO,
        max: DVec3::ZERO,
    };

    /// Cube of side `size` centered on `center`.
    pub fn cube(center: DVec3, size: f64) -> Self {
        let half = DVec3::splat(size.max(0.0) * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpge(self.max).any()
    }

    pub fn size(&self) -> DVec3 {
        (self.max - self.min).max(DVec3::ZERO)
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn inflate(&self, amount: f64) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            min: self.min - DVec3::splat(amount),
            max: self.max + DVec3::splat(amount),
        }
    }

    pub fn contains(&self, point: DVec3) -> bool {
        !self.is_empty() && point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::EMPTY
    }
}
