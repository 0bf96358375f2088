//! Simulation engine for growth entities.
//!
//! Resolves profiles, advances each instance's scale, fuse, burst, force
//! field and ambient emission once per tick, and reports dirty state and
//! effect requests to the host. Completely headless, so every behavior can
//! be driven deterministically from tests.

pub mod engine;
pub mod host;
pub mod instance;
pub mod persistence;
pub mod registry;
pub mod systems;

pub use engine::{GrowthEngine, InstanceKey, RegionId, SimConfig, TickReport};
pub use growth_core as core;
pub use host::{SimHost, TargetQuery};
pub use instance::{GrowthInstance, TickContext, TickOutcome};
pub use persistence::{StateBlob, StateStore};
pub use registry::{Profile, ProfileRegistry};
