//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 20;

// --- Scale ---

/// Distance below which current and target scale are considered equal.
pub const SCALE_EPSILON: f64 = 1e-4;

/// Largest per-tick scale step at a rate scale of 1.0.
pub const BASE_SCALE_STEP: f64 = 0.05;

/// Growth rate that corresponds to a rate scale of 1.0.
pub const REFERENCE_GROWTH_RATE: f64 = 0.05;

/// Upper bound on the rate scale derived from a definition's growth rate.
pub const MAX_RATE_SCALE: f64 = 20.0;

/// Smallest span used when normalizing growth progress.
pub const MIN_SCALE_SPAN: f64 = 1e-3;

/// Smallest scale any definition may resolve to.
pub const MIN_SCALE_FLOOR: f64 = 0.01;

/// Largest scale any definition may resolve to.
pub const MAX_SCALE_CEILING: f64 = 64.0;

// --- Force field ---

/// Minimum effective field radius, regardless of scale.
pub const MIN_FORCE_RADIUS: f64 = 0.5;

/// Distance floor to keep the radial direction finite.
pub const MIN_TARGET_DISTANCE: f64 = 0.001;

/// Exponent applied to the normalized distance for the vertical boost.
pub const VERTICAL_BOOST_EXPONENT: f64 = 0.65;

/// Lower clamp of the keep-on-ring correction factor.
pub const RING_CORRECTION_FLOOR: f64 = 0.25;

/// Hard cap on a single impact damage application.
pub const IMPACT_DAMAGE_CAP: f64 = 40.0;

// --- Contact ---

/// Ticks between two contact damage applications to the same target.
pub const TOUCH_COOLDOWN_TICKS: u64 = 10;

/// Extra margin around the collision shape used for contact checks.
pub const TOUCH_MARGIN: f64 = 0.05;

// --- Burst ---

/// Configured max damage at or above this is treated as unbounded.
pub const INFINITE_DAMAGE_THRESHOLD: f64 = 1.0e6;

/// Pause before an instance regrows after a completed burst (ticks).
pub const REGROW_DELAY_TICKS: u32 = 20;

// --- Wobble ---

/// Wobble amplitude (blocks) at scale 0.
pub const WOBBLE_AMPLITUDE: f64 = 0.06;

/// Wobble angular frequency (radians per tick).
pub const WOBBLE_FREQUENCY: f64 = 0.15;

// --- Geometry ---

/// Outline is drawn slightly larger than the collision box.
pub const OUTLINE_MARGIN: f64 = 0.002;

// --- Bookkeeping ---

/// Default cadence of the per-target cooldown sweep (ticks).
pub const COOLDOWN_SWEEP_INTERVAL: u64 = 200;
