//! Profile and definition registry.
//!
//! Resolution never fails: an absent or unknown id resolves to the built-in
//! default of that kind. Values are sanitized once, on insertion, so the
//! tick path can trust whatever it gets back.

use std::collections::HashMap;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use growth_core::definition::Definition;
use growth_core::enums::ProfileKind;
use growth_core::profiles::{ExplosionProfile, ForceProfile, FuseProfile, ParticleProfile};

/// Profiles keyed by id plus the fallback returned for unknown ids.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable<P> {
    entries: HashMap<String, P>,
    fallback: P,
}

impl<P> ProfileTable<P> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

/// A profile kind the registry can store and resolve.
pub trait Profile: Clone + Default + DeserializeOwned {
    const KIND: ProfileKind;

    /// Repair out-of-range values. Returns true if anything changed.
    fn sanitize(&mut self) -> bool;

    fn table(registry: &ProfileRegistry) -> &ProfileTable<Self>;

    fn table_mut(registry: &mut ProfileRegistry) -> &mut ProfileTable<Self>;
}

macro_rules! impl_profile {
    ($ty:ty, $kind:expr, $field:ident) => {
        impl Profile for $ty {
            const KIND: ProfileKind = $kind;

            fn sanitize(&mut self) -> bool {
                <$ty>::sanitize(self)
            }

            fn table(registry: &ProfileRegistry) -> &ProfileTable<Self> {
                &registry.$field
            }

            fn table_mut(registry: &mut ProfileRegistry) -> &mut ProfileTable<Self> {
                &mut registry.$field
            }
        }
    };
}

impl_profile!(ForceProfile, ProfileKind::Force, force);
impl_profile!(FuseProfile, ProfileKind::Fuse, fuse);
impl_profile!(ExplosionProfile, ProfileKind::Explosion, explosion);
impl_profile!(ParticleProfile, ProfileKind::Particle, particle);

/// Snapshot of every definition and profile known to the host.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    definitions: HashMap<String, Definition>,
    fallback_definition: Definition,
    force: ProfileTable<ForceProfile>,
    fuse: ProfileTable<FuseProfile>,
    explosion: ProfileTable<ExplosionProfile>,
    particle: ProfileTable<ParticleProfile>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk shape of a registry document. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegistryDocument {
    definitions: HashMap<String, Definition>,
    force: HashMap<String, ForceProfile>,
    fuse: HashMap<String, FuseProfile>,
    explosion: HashMap<String, ExplosionProfile>,
    particle: HashMap<String, ParticleProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
            fallback_definition: Definition::inert(),
            force: ProfileTable::default(),
            fuse: ProfileTable::default(),
            explosion: ProfileTable::default(),
            particle: ProfileTable::default(),
        }
    }

    /// Parse a JSON registry document.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let doc: RegistryDocument =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse registry: {e}"))?;
        let mut registry = Self::new();
        // Sorted so sanitize logs come out in a stable order.
        let mut definitions: Vec<_> = doc.definitions.into_iter().collect();
        definitions.sort_by(|a, b| a.0.cmp(&b.0));
        for (id, mut definition) in definitions {
            definition.id = id;
            registry.insert_definition(definition);
        }
        registry.insert_all(doc.force);
        registry.insert_all(doc.fuse);
        registry.insert_all(doc.explosion);
        registry.insert_all(doc.particle);
        Ok(registry)
    }

    fn insert_all<P: Profile>(&mut self, profiles: HashMap<String, P>) {
        let mut profiles: Vec<_> = profiles.into_iter().collect();
        profiles.sort_by(|a, b| a.0.cmp(&b.0));
        for (id, profile) in profiles {
            self.insert(id, profile);
        }
    }

    /// Resolve a profile of kind `P`. Absent or unknown ids yield the default.
    pub fn resolve<P: Profile>(&self, id: Option<&str>) -> &P {
        let table = P::table(self);
        match id {
            Some(id) => match table.entries.get(id) {
                Some(profile) => profile,
                None => {
                    debug!(
                        "Unknown {} profile '{id}', using default",
                        P::KIND.as_str()
                    );
                    &table.fallback
                }
            },
            None => &table.fallback,
        }
    }

    /// Like [`resolve`](Self::resolve) but keeps "no profile referenced" distinct.
    pub fn resolve_optional<P: Profile>(&self, id: Option<&str>) -> Option<&P> {
        id.map(|id| self.resolve::<P>(Some(id)))
    }

    pub fn insert<P: Profile>(&mut self, id: impl Into<String>, mut profile: P) {
        let id = id.into();
        if profile.sanitize() {
            debug!("Clamped out-of-range values in {} profile '{id}'", P::KIND.as_str());
        }
        P::table_mut(self).entries.insert(id, profile);
    }

    pub fn remove<P: Profile>(&mut self, id: &str) -> Option<P> {
        P::table_mut(self).entries.remove(id)
    }

    pub fn contains(&self, kind: ProfileKind, id: &str) -> bool {
        match kind {
            ProfileKind::Force => self.force.contains(id),
            ProfileKind::Fuse => self.fuse.contains(id),
            ProfileKind::Explosion => self.explosion.contains(id),
            ProfileKind::Particle => self.particle.contains(id),
        }
    }

    pub fn table<P: Profile>(&self) -> &ProfileTable<P> {
        P::table(self)
    }

    /// Resolve a definition by id, falling back to the inert definition.
    pub fn definition(&self, id: &str) -> &Definition {
        match self.definitions.get(id) {
            Some(definition) => definition,
            None => {
                debug!("Unknown definition '{id}', using inert fallback");
                &self.fallback_definition
            }
        }
    }

    pub fn insert_definition(&mut self, mut definition: Definition) {
        if definition.sanitize() {
            debug!("Repaired out-of-range values in definition '{}'", definition.id);
        }
        self.definitions.insert(definition.id.clone(), definition);
    }

    pub fn remove_definition(&mut self, id: &str) -> Option<Definition> {
        self.definitions.remove(id)
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }
}
