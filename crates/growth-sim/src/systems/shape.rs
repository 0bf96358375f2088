//! Wobble and derived collision/outline shapes.

use glam::DVec3;

use growth_core::constants::{OUTLINE_MARGIN, WOBBLE_AMPLITUDE, WOBBLE_FREQUENCY};
use growth_core::definition::Definition;
use growth_core::enums::ShapeKind;
use growth_core::state::MutableState;
use growth_core::types::Shape;

/// Deterministic wobble displacement. Larger instances wobble less.
pub fn wobble_offset(now: u64, phase: f64, scale: f64) -> DVec3 {
    let amplitude = WOBBLE_AMPLITUDE / (1.0 + scale.max(0.0));
    let t = now as f64 * WOBBLE_FREQUENCY + phase;
    DVec3::new(
        t.sin() * amplitude,
        (t * 0.7 + 1.3).sin() * amplitude * 0.5,
        (t * 1.3).cos() * amplitude,
    )
}

/// Update the wobble offset. Returns true if it moved.
pub fn tick_wobble(state: &mut MutableState, definition: &Definition, now: u64, phase: f64) -> bool {
    let next = if definition.wobble_enabled {
        wobble_offset(now, phase, state.current_scale)
    } else {
        DVec3::ZERO
    };
    let moved = next != state.wobble_offset;
    state.wobble_offset = next;
    moved
}

/// Recompute both derived shapes from scale, anchor and wobble.
pub fn recompute(state: &mut MutableState, anchor: DVec3, definition: &Definition) {
    let body = Shape::cube(anchor + state.wobble_offset, state.current_scale);
    state.outline_shape = body.inflate(OUTLINE_MARGIN);
    state.collision_shape = if definition.collision_enabled {
        body
    } else {
        Shape::EMPTY
    };
}

pub fn shape(state: &MutableState, kind: ShapeKind) -> Shape {
    match kind {
        ShapeKind::Outline => state.outline_shape,
        ShapeKind::Collision => state.collision_shape,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wobble_is_deterministic_and_bounded() {
        let a = wobble_offset(120, 0.4, 1.0);
        let b = wobble_offset(120, 0.4, 1.0);
        assert_eq!(a, b);
        for tick in 0..200 {
            let w = wobble_offset(tick, 1.1, 3.0);
            assert!(w.abs().max_element() <= WOBBLE_AMPLITUDE / 4.0 + 1e-12);
        }
    }

    #[test]
    fn wobble_disabled_is_zero() {
        let def = Definition::inert();
        let mut state = MutableState::baseline(&def);
        state.wobble_offset = DVec3::X;
        assert!(tick_wobble(&mut state, &def, 5, 0.0));
        assert_eq!(state.wobble_offset, DVec3::ZERO);
        assert!(!tick_wobble(&mut state, &def, 6, 0.0));
    }

    #[test]
    fn collision_shape_follows_flag() {
        let mut def = Definition {
            min_scale: 2.0,
            max_scale: 2.0,
            ..Definition::inert()
        };
        let mut state = MutableState::baseline(&def);
        let anchor = DVec3::new(10.0, 0.0, 0.0);

        recompute(&mut state, anchor, &def);
        assert!(shape(&state, ShapeKind::Collision).is_empty());
        let outline = shape(&state, ShapeKind::Outline);
        assert!((outline.size().x - (2.0 + 2.0 * OUTLINE_MARGIN)).abs() < 1e-12);
        assert_eq!(outline.center(), anchor);

        def.collision_enabled = true;
        recompute(&mut state, anchor, &def);
        let collision = shape(&state, ShapeKind::Collision);
        assert_eq!(collision.size(), DVec3::splat(2.0));
        assert!(collision.contains(anchor + DVec3::splat(0.9)));
    }
}
