//! Scale controller: bounded per-tick interpolation toward the target scale.

use growth_core::constants::{BASE_SCALE_STEP, SCALE_EPSILON};
use growth_core::definition::Definition;
use growth_core::state::MutableState;

/// Result of one scale step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleStep {
    Unchanged,
    Moved,
}

/// Advance `current_scale` one step toward `target_scale`.
///
/// The step never overshoots the target and the result is always clamped to
/// the definition's range.
pub fn step(state: &mut MutableState, definition: &Definition) -> ScaleStep {
    state.previous_scale = state.current_scale;

    if state.scale_cooldown > 0 {
        state.scale_cooldown -= 1;
        return ScaleStep::Unchanged;
    }

    let diff = state.target_scale - state.current_scale;
    if diff.abs() < SCALE_EPSILON {
        let snapped = definition.clamp_scale(state.current_scale);
        if snapped != state.current_scale {
            state.current_scale = snapped;
            return ScaleStep::Moved;
        }
        return ScaleStep::Unchanged;
    }

    let max_step = BASE_SCALE_STEP * definition.rate_scale();
    let delta = diff.abs().min(max_step) * diff.signum();
    let next = definition.clamp_scale(state.current_scale + delta);
    if next == state.current_scale {
        return ScaleStep::Unchanged;
    }
    state.current_scale = next;
    ScaleStep::Moved
}

/// Growth progress of the current scale, in [0, 1].
pub fn growth_progress(state: &MutableState, definition: &Definition) -> f64 {
    definition.growth_progress(state.current_scale)
}

/// Interpolated scale for rendering between the previous and current tick.
pub fn render_scale(state: &MutableState, interpolation: f64) -> f64 {
    let t = if interpolation.is_finite() {
        interpolation.clamp(0.0, 1.0)
    } else {
        1.0
    };
    state.previous_scale + (state.current_scale - state.previous_scale) * t
}
