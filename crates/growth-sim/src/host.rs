//! Interfaces the simulation consumes from its host.
//!
//! The simulation never touches host world state. It reads targets through
//! [`TargetQuery`] and hands every mutation back as an `EffectRequest`.

use glam::DVec3;

use growth_core::events::EffectRequest;
use growth_core::types::Target;

use crate::engine::{InstanceKey, RegionId};
use crate::persistence::StateBlob;

/// Read-only spatial query for living entities.
pub trait TargetQuery {
    /// Targets whose position lies in the axis-aligned box of half-size
    /// `radius` around `center`. May include dead or spectating targets;
    /// callers filter.
    fn living_targets_in_box(&self, center: DVec3, radius: f64) -> Vec<Target>;
}

impl TargetQuery for [Target] {
    fn living_targets_in_box(&self, center: DVec3, radius: f64) -> Vec<Target> {
        self.iter()
            .filter(|t| ((t.position - center).abs().cmple(DVec3::splat(radius))).all())
            .copied()
            .collect()
    }
}

impl TargetQuery for Vec<Target> {
    fn living_targets_in_box(&self, center: DVec3, radius: f64) -> Vec<Target> {
        self.as_slice().living_targets_in_box(center, radius)
    }
}

/// Everything the engine needs from the surrounding world.
pub trait SimHost {
    fn living_targets_in_box(&self, region: RegionId, center: DVec3, radius: f64) -> Vec<Target>;

    /// Fire-and-forget effect produced by an instance.
    fn submit(&mut self, key: InstanceKey, request: EffectRequest);

    /// Persist the instance's latest state.
    fn persist(&mut self, key: InstanceKey, blob: &StateBlob);

    /// Observable state changed; observers should refresh.
    fn request_sync(&mut self, key: InstanceKey);
}

/// [`TargetQuery`] view of one region of a [`SimHost`].
pub struct RegionScope<'a, H: SimHost + ?Sized> {
    pub host: &'a H,
    pub region: RegionId,
}

impl<H: SimHost + ?Sized> TargetQuery for RegionScope<'_, H> {
    fn living_targets_in_box(&self, center: DVec3, radius: f64) -> Vec<Target> {
        self.host.living_targets_in_box(self.region, center, radius)
    }
}
