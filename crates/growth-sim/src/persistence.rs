//! Key/value persistence of instances.
//!
//! Every `MutableState` field is stored under its own key so a blob written
//! by an older build still loads: missing or malformed keys fall back to the
//! baseline value for that field and the rest of the instance loads normally.

use std::collections::BTreeMap;

use glam::DVec3;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use growth_core::definition::Overrides;
use growth_core::state::MutableState;
use growth_core::types::TargetId;

use crate::instance::GrowthInstance;
use crate::registry::ProfileRegistry;

/// Read/write access to a persisted key/value record.
pub trait StateStore {
    fn read(&self, key: &str) -> Option<&Value>;
    fn write(&mut self, key: &str, value: Value);
}

/// In-memory record handed to the host for storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateBlob(BTreeMap<String, Value>);

impl StateBlob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Failed to serialize state blob: {e}"))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse state blob: {e}"))
    }
}

impl StateStore for StateBlob {
    fn read(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn write(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }
}

const KEY_DEFINITION_ID: &str = "definition_id";
const KEY_OVERRIDES: &str = "overrides";
const KEY_ANCHOR: &str = "anchor";
const KEY_WOBBLE_PHASE: &str = "wobble_phase";
const KEY_TOUCH_COOLDOWNS: &str = "touch_cooldowns";
const KEY_FORCE_DAMAGE_COOLDOWNS: &str = "force_damage_cooldowns";

/// Invokes `$apply!` with every plain `MutableState` field name.
macro_rules! with_state_fields {
    ($apply:ident) => {
        $apply!(
            current_scale,
            previous_scale,
            target_scale,
            scale_cooldown,
            pull_cooldown,
            push_cooldown,
            ambient_cooldown,
            ambient_sound_cooldown,
            fuse_armed,
            fuse_ticks_remaining,
            collapse_ticks_remaining,
            collapse_duration,
            collapse_start_scale,
            collapse_end_scale,
            remaining_charges,
            burst_explosions_remaining,
            burst_delay_ticks,
            burst_delay_interval,
            burst_radius,
            burst_causes_fire,
            burst_breaks_blocks,
            burst_max_damage,
            burst_damage_scaling,
            wobble_offset,
        )
    };
}

fn put<T: Serialize + ?Sized>(store: &mut dyn StateStore, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(value) => store.write(key, value),
        Err(e) => debug!("Skipping unserializable state key '{key}': {e}"),
    }
}

fn get_or<T: DeserializeOwned>(store: &dyn StateStore, key: &str, default: T) -> T {
    let Some(value) = store.read(key) else {
        debug!("State key '{key}' missing, using default");
        return default;
    };
    match T::deserialize(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("State key '{key}' malformed ({e}), using default");
            default
        }
    }
}

// Cooldown maps go out as [target, tick] pairs; JSON object keys must be strings.
fn cooldown_pairs(map: &BTreeMap<TargetId, u64>) -> Vec<(u64, u64)> {
    map.iter().map(|(id, next)| (id.0, *next)).collect()
}

fn cooldown_map(pairs: Vec<(u64, u64)>) -> BTreeMap<TargetId, u64> {
    pairs.into_iter().map(|(id, next)| (TargetId(id), next)).collect()
}

/// Write every persisted field of `instance` into `store`.
pub fn save_instance(instance: &GrowthInstance, store: &mut dyn StateStore) {
    let state = instance.state();
    macro_rules! save {
        ($($field:ident),* $(,)?) => {
            $(put(store, stringify!($field), &state.$field);)*
        };
    }
    with_state_fields!(save);
    put(store, KEY_TOUCH_COOLDOWNS, &cooldown_pairs(&state.touch_cooldowns));
    put(
        store,
        KEY_FORCE_DAMAGE_COOLDOWNS,
        &cooldown_pairs(&state.force_damage_cooldowns),
    );
    put(store, KEY_DEFINITION_ID, instance.definition_id());
    put(store, KEY_OVERRIDES, instance.overrides());
    put(store, KEY_ANCHOR, &instance.anchor());
    put(store, KEY_WOBBLE_PHASE, &instance.wobble_phase());
}

/// Snapshot `instance` into a fresh blob.
pub fn to_blob(instance: &GrowthInstance) -> StateBlob {
    let mut blob = StateBlob::new();
    save_instance(instance, &mut blob);
    blob
}

/// Rebuild an instance from `store`. Never fails: anything unreadable falls
/// back to the baseline of the resolved definition.
pub fn load_instance(store: &dyn StateStore, registry: &ProfileRegistry) -> GrowthInstance {
    let definition_id: String = get_or(store, KEY_DEFINITION_ID, String::new());
    let overrides: Overrides = get_or(store, KEY_OVERRIDES, Overrides::default());
    let anchor: DVec3 = get_or(store, KEY_ANCHOR, DVec3::ZERO);
    let wobble_phase: f64 = get_or(store, KEY_WOBBLE_PHASE, 0.0);

    let effective = registry.definition(&definition_id).with_overrides(&overrides);
    let baseline = MutableState::baseline(&effective);
    let mut state = baseline.clone();
    macro_rules! load {
        ($($field:ident),* $(,)?) => {
            $(state.$field = get_or(store, stringify!($field), baseline.$field.clone());)*
        };
    }
    with_state_fields!(load);
    state.touch_cooldowns = cooldown_map(get_or(store, KEY_TOUCH_COOLDOWNS, Vec::new()));
    state.force_damage_cooldowns =
        cooldown_map(get_or(store, KEY_FORCE_DAMAGE_COOLDOWNS, Vec::new()));

    GrowthInstance::from_parts(definition_id, overrides, anchor, wobble_phase, state, registry)
}
