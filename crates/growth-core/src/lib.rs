//! Core types and definitions for the growth-entity simulation.
//!
//! This crate defines the vocabulary shared by the simulation and its hosts:
//! definitions, overrides, profiles, per-instance mutable state, events,
//! and tuning constants. It contains no tick logic.

pub mod constants;
pub mod definition;
pub mod enums;
pub mod events;
pub mod profiles;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
