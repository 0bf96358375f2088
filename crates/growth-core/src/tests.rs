#[cfg(test)]
mod tests {
    use glam::DVec3;

    use crate::definition::{Definition, Overrides};
    use crate::enums::*;
    use crate::events::{EffectRequest, SimEvent};
    use crate::state::MutableState;
    use crate::types::{Shape, SimTime, Target, TargetId};

    #[test]
    fn test_sim_time_advance() {
        let mut time = SimTime::default();
        for _ in 0..20 {
            time.advance();
        }
        assert_eq!(time.tick, 20);
        assert!((time.elapsed_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dirty_reasons_set() {
        let mut set = DirtyReasons::default();
        assert!(set.is_empty());
        set.insert(DirtyReason::Fuse);
        set.insert(DirtyReason::Charges);
        set.insert(DirtyReason::Fuse);
        assert!(set.contains(DirtyReason::Fuse));
        assert!(!set.contains(DirtyReason::Scale));
        let reasons: Vec<_> = set.iter().collect();
        assert_eq!(reasons, vec![DirtyReason::Fuse, DirtyReason::Charges]);

        let mut other = DirtyReasons::from(DirtyReason::Scale);
        other.extend(set);
        assert_eq!(other.iter().count(), 3);
    }

    #[test]
    fn test_trigger_matching() {
        assert!(FuseTrigger::Interact.accepts(ArmCause::Interact));
        assert!(!FuseTrigger::Interact.accepts(ArmCause::Attack));
        assert!(FuseTrigger::Attack.accepts(ArmCause::Attack));
        assert!(!FuseTrigger::Auto.accepts(ArmCause::Interact));
    }

    #[test]
    fn test_shape_geometry() {
        let shape = Shape::cube(DVec3::new(1.0, 2.0, 3.0), 2.0);
        assert_eq!(shape.min, DVec3::new(0.0, 1.0, 2.0));
        assert_eq!(shape.size(), DVec3::splat(2.0));
        assert!(shape.contains(DVec3::new(1.5, 2.5, 3.5)));
        assert!(!shape.contains(DVec3::new(2.5, 2.0, 3.0)));
        assert!(Shape::EMPTY.is_empty());
        assert!(!Shape::EMPTY.contains(DVec3::ZERO));
        assert_eq!(Shape::EMPTY.inflate(1.0), Shape::EMPTY);
    }

    #[test]
    fn test_target_affectable() {
        let mut target = Target::new(7, DVec3::ZERO);
        assert!(target.is_affectable());
        target.spectator = true;
        assert!(!target.is_affectable());
        assert_eq!(target.id.to_string(), "T7");
    }

    #[test]
    fn test_effect_request_json_shape() {
        let request = EffectRequest::Broadcast(SimEvent::Armed { fuse_ticks: 40 });
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["kind"], "Broadcast");
        assert_eq!(json["type"], "Armed");
        assert!(request.is_presentation());

        let damage = EffectRequest::ApplyDamage {
            target: TargetId(3),
            amount: 2.0,
            cause: DamageCause::Impact,
        };
        assert!(!damage.is_presentation());
    }

    #[test]
    fn test_state_json_skips_shapes() {
        let mut state = MutableState::default();
        state.outline_shape = Shape::cube(DVec3::ZERO, 1.0);
        state.touch_cooldowns.insert(TargetId(4), 99);
        let json = serde_json::to_string(&state).unwrap();
        let back: MutableState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.outline_shape, Shape::EMPTY);
        assert_eq!(back.touch_cooldowns.get(&TargetId(4)), Some(&99));
    }

    #[test]
    fn test_overrides_partial_json() {
        let overrides: Overrides =
            serde_json::from_str(r#"{"max_scale": 4.0, "fuse_profile": "quick"}"#).unwrap();
        assert_eq!(overrides.max_scale, Some(4.0));
        assert_eq!(overrides.fuse_profile, Some(Some("quick".to_string())));
        let def = Definition::inert().with_overrides(&overrides);
        assert_eq!(def.max_scale, 4.0);
    }

    #[test]
    fn test_overrides_detached_profile_json() {
        let detached = Overrides {
            fuse_profile: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_string(&detached).unwrap();
        assert!(json.contains(r#""fuse_profile":null"#), "{json}");
        assert!(!json.contains("pull_profile"), "unset keys are omitted: {json}");

        let back: Overrides = serde_json::from_str(&json).unwrap();
        assert_eq!(back, detached);
        assert_eq!(back.pull_profile, None);

        let def = Definition {
            fuse_profile: Some("quick".into()),
            ..Definition::inert()
        };
        assert_eq!(def.with_overrides(&back).fuse_profile, None);
    }
}
