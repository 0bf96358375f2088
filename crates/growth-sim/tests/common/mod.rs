//! Scripted host shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use glam::DVec3;

use growth_core::events::{EffectRequest, SimEvent};
use growth_core::types::Target;
use growth_sim::{InstanceKey, RegionId, SimHost, StateBlob, TargetQuery};

pub const REGION: RegionId = RegionId(0);

#[derive(Default)]
pub struct ScriptedHost {
    pub targets: Vec<Target>,
    pub effects: Vec<(InstanceKey, EffectRequest)>,
    pub persisted: HashMap<InstanceKey, StateBlob>,
    pub syncs: usize,
}

impl ScriptedHost {
    pub fn with_targets(targets: Vec<Target>) -> Self {
        Self {
            targets,
            ..Default::default()
        }
    }

    /// Drain and return the events broadcast since the last call.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        self.effects
            .drain(..)
            .filter_map(|(_, effect)| match effect {
                EffectRequest::Broadcast(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&EffectRequest) -> bool) -> usize {
        self.effects.iter().filter(|(_, e)| pred(e)).count()
    }
}

impl SimHost for ScriptedHost {
    fn living_targets_in_box(&self, _region: RegionId, center: DVec3, radius: f64) -> Vec<Target> {
        self.targets.living_targets_in_box(center, radius)
    }

    fn submit(&mut self, key: InstanceKey, request: EffectRequest) {
        self.effects.push((key, request));
    }

    fn persist(&mut self, key: InstanceKey, blob: &StateBlob) {
        self.persisted.insert(key, blob.clone());
    }

    fn request_sync(&mut self, _key: InstanceKey) {
        self.syncs += 1;
    }
}
