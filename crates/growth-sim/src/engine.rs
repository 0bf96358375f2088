//! Simulation engine: every growth instance the host knows about.
//!
//! `GrowthEngine` owns one hecs world per region, the profile registry and the
//! seeded RNG. Each tick it steps every instance, forwards effect requests to
//! the host, persists and syncs dirty instances, and despawns the ones that
//! spent their last charge. Completely headless, enabling deterministic testing.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use glam::DVec3;
use hecs::World;
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use growth_core::constants::COOLDOWN_SWEEP_INTERVAL;
use growth_core::definition::Overrides;
use growth_core::enums::ArmCause;
use growth_core::events::EffectRequest;
use growth_core::types::{HeldItem, SimTime};

use crate::host::{RegionScope, SimHost};
use crate::instance::{GrowthInstance, TickContext};
use crate::persistence::{self, StateBlob, StateStore};
use crate::registry::ProfileRegistry;

/// Configuration for starting a new engine.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same wobble phases.
    pub seed: u64,
    /// Ticks between sweeps of expired per-target cooldowns. 0 disables sweeping.
    pub cooldown_sweep_interval: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            cooldown_sweep_interval: COOLDOWN_SWEEP_INTERVAL,
        }
    }
}

/// Host world or dimension an instance lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Stable handle to one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub region: RegionId,
    pub entity: hecs::Entity,
}

/// What happened during one engine tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    pub instances: usize,
    pub effects: usize,
    /// Instances whose state was persisted and synced.
    pub saved: Vec<InstanceKey>,
    /// Instances despawned after their last charge.
    pub removed: Vec<InstanceKey>,
    pub reshaped: usize,
}

pub struct GrowthEngine {
    registry: ProfileRegistry,
    regions: BTreeMap<RegionId, World>,
    time: SimTime,
    rng: ChaCha8Rng,
    sweep_interval: u64,
    effects: Vec<EffectRequest>,
    despawn_buffer: Vec<InstanceKey>,
}

impl GrowthEngine {
    pub fn new(config: SimConfig, registry: ProfileRegistry) -> Self {
        Self {
            registry,
            regions: BTreeMap::new(),
            time: SimTime::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            sweep_interval: config.cooldown_sweep_interval,
            effects: Vec::new(),
            despawn_buffer: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Mutable registry access for hot reloads. Instances pick up changed
    /// definitions on their next tick.
    pub fn registry_mut(&mut self) -> &mut ProfileRegistry {
        &mut self.registry
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Spawn a fresh instance of `definition_id` at `anchor`.
    pub fn spawn(&mut self, region: RegionId, definition_id: &str, anchor: DVec3) -> InstanceKey {
        let phase = self.rng.gen_range(0.0..TAU);
        let instance = GrowthInstance::new(definition_id, anchor, phase, &self.registry);
        let entity = self.regions.entry(region).or_default().spawn((instance,));
        info!("Spawned '{definition_id}' in region {} at {anchor}", region.0);
        InstanceKey { region, entity }
    }

    /// Recreate a persisted instance.
    pub fn restore(&mut self, region: RegionId, store: &dyn StateStore) -> InstanceKey {
        let instance = persistence::load_instance(store, &self.registry);
        info!(
            "Restored '{}' in region {} (fuse armed: {})",
            instance.definition_id(),
            region.0,
            instance.is_fuse_armed()
        );
        let entity = self.regions.entry(region).or_default().spawn((instance,));
        InstanceKey { region, entity }
    }

    /// Remove an instance at the host's request.
    pub fn despawn(&mut self, key: InstanceKey) -> bool {
        let Some(world) = self.regions.get_mut(&key.region) else {
            return false;
        };
        world.despawn(key.entity).is_ok()
    }

    pub fn contains(&self, key: InstanceKey) -> bool {
        self.regions
            .get(&key.region)
            .is_some_and(|world| world.contains(key.entity))
    }

    pub fn instance_count(&self) -> usize {
        self.regions.values().map(|world| world.len() as usize).sum()
    }

    /// Keys of every instance in `region`.
    pub fn instance_keys(&self, region: RegionId) -> Vec<InstanceKey> {
        let Some(world) = self.regions.get(&region) else {
            return Vec::new();
        };
        world
            .iter()
            .map(|entity| InstanceKey {
                region,
                entity: entity.entity(),
            })
            .collect()
    }

    /// Read-only access to one instance.
    pub fn with_instance<R>(&self, key: InstanceKey, f: impl FnOnce(&GrowthInstance) -> R) -> Option<R> {
        let world = self.regions.get(&key.region)?;
        let instance = world.get::<&GrowthInstance>(key.entity).ok()?;
        Some(f(&instance))
    }

    fn with_instance_mut<R>(
        &mut self,
        key: InstanceKey,
        f: impl FnOnce(&mut GrowthInstance, &ProfileRegistry) -> R,
    ) -> Option<R> {
        let world = self.regions.get_mut(&key.region)?;
        let mut instance = world.get::<&mut GrowthInstance>(key.entity).ok()?;
        Some(f(&mut instance, &self.registry))
    }

    /// Persisted form of one instance.
    pub fn blob(&self, key: InstanceKey) -> Option<StateBlob> {
        self.with_instance(key, persistence::to_blob)
    }

    /// Advance every instance by one tick.
    pub fn tick(&mut self, host: &mut dyn SimHost) -> TickReport {
        let now = self.time.tick;
        let mut report = TickReport {
            tick: now,
            ..Default::default()
        };

        for (&region, world) in self.regions.iter_mut() {
            for (entity, instance) in world.query_mut::<&mut GrowthInstance>() {
                let key = InstanceKey { region, entity };
                let outcome = {
                    let scope = RegionScope {
                        host: &*host,
                        region,
                    };
                    let mut ctx = TickContext {
                        now,
                        sweep_interval: self.sweep_interval,
                        registry: &self.registry,
                        targets: &scope,
                        effects: &mut self.effects,
                    };
                    instance.tick(&mut ctx)
                };
                report.instances += 1;
                report.effects += self.effects.len();
                for request in self.effects.drain(..) {
                    host.submit(key, request);
                }

                if outcome.remove {
                    self.despawn_buffer.push(key);
                    continue;
                }
                if outcome.shape_dirty {
                    report.reshaped += 1;
                }
                if outcome.needs_save() {
                    host.persist(key, &persistence::to_blob(instance));
                    host.request_sync(key);
                    report.saved.push(key);
                }
            }
        }

        for key in self.despawn_buffer.drain(..) {
            if let Some(world) = self.regions.get_mut(&key.region) {
                let _ = world.despawn(key.entity);
            }
            info!("Removed instance {:?} in region {}: charges spent", key.entity, key.region.0);
            report.removed.push(key);
        }

        self.time.advance();
        report
    }

    /// Switch an instance to another definition, resetting its state.
    pub fn set_definition_id(&mut self, key: InstanceKey, id: &str, host: &mut dyn SimHost) -> bool {
        let changed = self
            .with_instance_mut(key, |instance, registry| {
                let changed = instance.set_definition_id(id, registry);
                changed.then(|| persistence::to_blob(instance))
            })
            .flatten();
        Self::flush(key, changed, host)
    }

    /// Merge an override patch into an instance. Resets its state when anything changed.
    pub fn apply_overrides(&mut self, key: InstanceKey, patch: &Overrides, host: &mut dyn SimHost) -> bool {
        let changed = self
            .with_instance_mut(key, |instance, registry| {
                let changed = instance.apply_overrides(patch, registry);
                changed.then(|| persistence::to_blob(instance))
            })
            .flatten();
        Self::flush(key, changed, host)
    }

    /// Try to arm an instance's fuse from a player interaction.
    pub fn handle_manual_arm_request(
        &mut self,
        key: InstanceKey,
        cause: ArmCause,
        held: Option<&HeldItem>,
        host: &mut dyn SimHost,
    ) -> bool {
        let mut effects = Vec::new();
        let changed = self
            .with_instance_mut(key, |instance, registry| {
                let accepted = instance.handle_manual_arm_request(cause, held, registry, &mut effects);
                accepted.then(|| persistence::to_blob(instance))
            })
            .flatten();
        for request in effects {
            host.submit(key, request);
        }
        Self::flush(key, changed, host)
    }

    pub fn can_arm_preview(&self, key: InstanceKey, cause: ArmCause, held: Option<&HeldItem>) -> bool {
        self.with_instance(key, |instance| {
            instance.can_arm_preview(cause, held, &self.registry)
        })
        .unwrap_or(false)
    }

    /// Disarm an instance's fuse and drop any pending burst.
    pub fn disarm(&mut self, key: InstanceKey, host: &mut dyn SimHost) -> bool {
        let mut effects = Vec::new();
        let changed = self
            .with_instance_mut(key, |instance, _| {
                instance
                    .disarm(&mut effects)
                    .then(|| persistence::to_blob(instance))
            })
            .flatten();
        for request in effects {
            host.submit(key, request);
        }
        Self::flush(key, changed, host)
    }

    fn flush(key: InstanceKey, blob: Option<StateBlob>, host: &mut dyn SimHost) -> bool {
        let Some(blob) = blob else {
            return false;
        };
        host.persist(key, &blob);
        host.request_sync(key);
        true
    }
}
