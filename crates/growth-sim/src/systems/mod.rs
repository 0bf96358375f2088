//! Per-instance systems, run in a fixed order each tick.
//!
//! Systems are pure functions over an instance's `MutableState` plus the
//! resolved profiles. They do not own state and never call into the host;
//! side effects are pushed onto an effect buffer.

pub mod ambient;
pub mod burst;
pub mod contact;
pub mod force_field;
pub mod fuse;
pub mod scale;
pub mod shape;

/// Shared countdown cadence: counts down and fires when it reaches zero,
/// then restarts at `interval` (at least one tick).
pub(crate) fn cadence(countdown: &mut u32, interval: u32) -> bool {
    if *countdown > 0 {
        *countdown -= 1;
    }
    if *countdown > 0 {
        return false;
    }
    *countdown = interval.max(1);
    true
}
