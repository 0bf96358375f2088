//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// The kinds of profile the registry can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileKind {
    Force,
    Fuse,
    Explosion,
    Particle,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Force => "force",
            ProfileKind::Fuse => "fuse",
            ProfileKind::Explosion => "explosion",
            ProfileKind::Particle => "particle",
        }
    }
}

/// How a fuse may be armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuseTrigger {
    /// Arms itself once growth progress reaches the auto-arm threshold.
    #[default]
    Auto,
    /// Armed by a player interacting with the instance.
    Interact,
    /// Armed by a player attacking the instance.
    Attack,
}

/// The external action behind a manual arm request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmCause {
    Interact,
    Attack,
}

impl FuseTrigger {
    /// Whether a manual request with `cause` matches this trigger.
    pub fn accepts(&self, cause: ArmCause) -> bool {
        matches!(
            (self, cause),
            (FuseTrigger::Interact, ArmCause::Interact) | (FuseTrigger::Attack, ArmCause::Attack)
        )
    }
}

/// Observable phase of the fuse state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FusePhase {
    #[default]
    Disarmed,
    Armed,
    /// Fuse burned down; the burst sequence is running.
    Detonated,
}

/// Push or pull channel of the force field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceMode {
    Push,
    Pull,
}

impl ForceMode {
    /// Radial sign when no ring bands shape the field.
    pub fn sign(&self) -> f64 {
        match self {
            ForceMode::Push => 1.0,
            ForceMode::Pull => -1.0,
        }
    }
}

/// Which derived shape a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Outline,
    Collision,
}

/// Attribution for damage requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageCause {
    /// Force field impact.
    Impact,
    /// Touching the collision shape.
    Contact,
    /// Burst explosion falloff.
    Explosion,
}

/// Why an instance's observable state changed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirtyReason {
    Scale,
    TargetScale,
    Fuse,
    Burst,
    Charges,
    Definition,
    Reset,
}

impl DirtyReason {
    pub const ALL: [DirtyReason; 7] = [
        DirtyReason::Scale,
        DirtyReason::TargetScale,
        DirtyReason::Fuse,
        DirtyReason::Burst,
        DirtyReason::Charges,
        DirtyReason::Definition,
        DirtyReason::Reset,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Compact set of [`DirtyReason`]s collected over one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyReasons(u8);

impl DirtyReasons {
    pub fn insert(&mut self, reason: DirtyReason) {
        self.0 |= reason.bit();
    }

    pub fn contains(&self, reason: DirtyReason) -> bool {
        self.0 & reason.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn extend(&mut self, other: DirtyReasons) {
        self.0 |= other.0;
    }

    pub fn iter(&self) -> impl Iterator<Item = DirtyReason> + '_ {
        DirtyReason::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl From<DirtyReason> for DirtyReasons {
    fn from(reason: DirtyReason) -> Self {
        let mut set = DirtyReasons::default();
        set.insert(reason);
        set
    }
}
