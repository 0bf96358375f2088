//! Events and effect requests emitted by the simulation.
//!
//! Everything here is fire-and-forget: the host applies the request to its
//! world (or ignores it). Nothing in the simulation waits on a result.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::DamageCause;
use crate::profiles::RingBand;
use crate::types::TargetId;

/// Events broadcast to observers (renderers, network mirrors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// Fuse armed; detonation in `fuse_ticks` ticks.
    Armed { fuse_ticks: u32 },
    /// Periodic fuse pulse while armed.
    Pulse { fuse_ticks_remaining: u32 },
    /// Fuse burned down and the burst sequence started.
    Detonated { explosions: u32 },
    /// Fuse cleared without detonating.
    Disarmed,
    /// One explosion of the burst sequence fired.
    BurstExplosion { remaining: u32 },
    /// Guardian beam drawn from the instance to a target.
    Beam {
        target: TargetId,
        from: DVec3,
        to: DVec3,
    },
    /// Ring bands active this evaluation.
    RingField { center: DVec3, bands: Vec<RingBand> },
}

/// Requests the simulation hands to its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EffectRequest {
    SpawnParticles {
        effect: String,
        position: DVec3,
        count: u32,
        spread: f64,
        speed: f64,
    },
    PlaySound {
        sound: String,
        position: DVec3,
        volume: f64,
        pitch: f64,
    },
    ApplyDamage {
        target: TargetId,
        amount: f64,
        cause: DamageCause,
    },
    /// Add `delta` to the target's velocity.
    ApplyVelocity { target: TargetId, delta: DVec3 },
    CreateExplosion {
        position: DVec3,
        radius: f64,
        causes_fire: bool,
        breaks_blocks: bool,
    },
    /// Consume or wear down the item used for a manual arm.
    UseItem { consume: u32, damage: u32 },
    Broadcast(SimEvent),
}

impl EffectRequest {
    pub fn is_presentation(&self) -> bool {
        matches!(
            self,
            EffectRequest::SpawnParticles { .. }
                | EffectRequest::PlaySound { .. }
                | EffectRequest::Broadcast(_)
        )
    }
}
