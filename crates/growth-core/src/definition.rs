//! Instance definitions and their sparse per-instance overrides.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::*;

/// Shared, immutable description of a growable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Definition {
    pub id: String,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale units per tick at full rate.
    pub growth_rate: f64,
    pub growth_enabled: bool,
    pub push_enabled: bool,
    pub pull_enabled: bool,
    pub wobble_enabled: bool,
    pub collision_enabled: bool,
    /// Gates block breaking for burst explosions.
    pub destroys_blocks: bool,
    pub push_profile: Option<String>,
    pub pull_profile: Option<String>,
    pub fuse_profile: Option<String>,
    pub explosion_profile: Option<String>,
    pub particle_profile: Option<String>,
    pub touch_damage: f64,
    /// Detonation cycles before the instance is removed.
    pub charges: u32,
}

impl Default for Definition {
    fn default() -> Self {
        Self::inert()
    }
}

impl Definition {
    /// Built-in fallback: fixed scale 1.0, every subsystem off.
    pub fn inert() -> Self {
        Self {
            id: "inert".to_string(),
            min_scale: 1.0,
            max_scale: 1.0,
            growth_rate: REFERENCE_GROWTH_RATE,
            growth_enabled: false,
            push_enabled: false,
            pull_enabled: false,
            wobble_enabled: false,
            collision_enabled: false,
            destroys_blocks: false,
            push_profile: None,
            pull_profile: None,
            fuse_profile: None,
            explosion_profile: None,
            particle_profile: None,
            touch_damage: 0.0,
            charges: 1,
        }
    }

    /// Rate multiplier applied to `BASE_SCALE_STEP`.
    pub fn rate_scale(&self) -> f64 {
        (self.growth_rate / REFERENCE_GROWTH_RATE).clamp(0.0, MAX_RATE_SCALE)
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            self.min_scale
        }
    }

    /// Normalized position of `scale` between min and max, in [0, 1].
    pub fn growth_progress(&self, scale: f64) -> f64 {
        let span = (self.max_scale - self.min_scale).max(MIN_SCALE_SPAN);
        ((scale - self.min_scale) / span).clamp(0.0, 1.0)
    }

    /// Scale an instance starts at and the target it grows toward.
    pub fn baseline_scales(&self) -> (f64, f64) {
        let target = if self.growth_enabled {
            self.max_scale
        } else {
            self.min_scale
        };
        (self.min_scale, target)
    }

    /// Repair out-of-range values. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = self.clone();
        if !self.min_scale.is_finite() {
            self.min_scale = 1.0;
        }
        if !self.max_scale.is_finite() {
            self.max_scale = self.min_scale;
        }
        if self.min_scale > self.max_scale {
            std::mem::swap(&mut self.min_scale, &mut self.max_scale);
        }
        self.min_scale = self.min_scale.clamp(MIN_SCALE_FLOOR, MAX_SCALE_CEILING);
        self.max_scale = self.max_scale.clamp(self.min_scale, MAX_SCALE_CEILING);
        if !self.growth_rate.is_finite() || self.growth_rate < 0.0 {
            self.growth_rate = 0.0;
        }
        if !self.touch_damage.is_finite() || self.touch_damage < 0.0 {
            self.touch_damage = 0.0;
        }
        *self != before
    }

    /// Merge `overrides` onto this definition. The id is never overridden.
    pub fn with_overrides(&self, overrides: &Overrides) -> Definition {
        let mut effective = self.clone();
        let o = overrides;
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &o.$field { effective.$field = v.clone(); })*
            };
        }
        apply!(
            min_scale,
            max_scale,
            growth_rate,
            growth_enabled,
            push_enabled,
            pull_enabled,
            wobble_enabled,
            collision_enabled,
            destroys_blocks,
            push_profile,
            pull_profile,
            fuse_profile,
            explosion_profile,
            particle_profile,
            touch_damage,
            charges,
        );
        effective.sanitize();
        effective
    }
}

/// Present-but-null reads as `Some(None)`; a missing key stays `None` via `#[serde(default)]`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Sparse patch merged onto a [`Definition`].
///
/// Profile references are doubly optional: `None` keeps the definition's
/// value, `Some(None)` detaches the profile, `Some(Some(id))` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,
    pub growth_rate: Option<f64>,
    pub growth_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
    pub pull_enabled: Option<bool>,
    pub wobble_enabled: Option<bool>,
    pub collision_enabled: Option<bool>,
    pub destroys_blocks: Option<bool>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub push_profile: Option<Option<String>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub pull_profile: Option<Option<String>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub fuse_profile: Option<Option<String>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub explosion_profile: Option<Option<String>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub particle_profile: Option<Option<String>>,
    pub touch_damage: Option<f64>,
    pub charges: Option<u32>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        *self == Overrides::default()
    }

    /// Layer `patch` on top of these overrides. Returns true if anything changed.
    pub fn merge(&mut self, patch: &Overrides) -> bool {
        let before = self.clone();
        macro_rules! layer {
            ($($field:ident),* $(,)?) => {
                $(if patch.$field.is_some() { self.$field = patch.$field.clone(); })*
            };
        }
        layer!(
            min_scale,
            max_scale,
            growth_rate,
            growth_enabled,
            push_enabled,
            pull_enabled,
            wobble_enabled,
            collision_enabled,
            destroys_blocks,
            push_profile,
            pull_profile,
            fuse_profile,
            explosion_profile,
            particle_profile,
            touch_damage,
            charges,
        );
        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn growing() -> Definition {
        Definition {
            id: "bloom".into(),
            min_scale: 0.2,
            max_scale: 2.0,
            growth_enabled: true,
            fuse_profile: Some("slow".into()),
            ..Definition::inert()
        }
    }

    #[test]
    fn progress_is_normalized_and_clamped() {
        let def = growing();
        assert_eq!(def.growth_progress(0.2), 0.0);
        assert!((def.growth_progress(1.1) - 0.5).abs() < 1e-12);
        assert_eq!(def.growth_progress(5.0), 1.0);
        assert_eq!(def.growth_progress(-1.0), 0.0);
    }

    #[test]
    fn progress_of_degenerate_span_is_finite() {
        let def = Definition::inert();
        assert_eq!(def.growth_progress(1.0), 0.0);
    }

    #[test]
    fn overrides_keep_identity() {
        let def = growing();
        let overrides = Overrides {
            max_scale: Some(3.0),
            fuse_profile: Some(None),
            ..Default::default()
        };
        let effective = def.with_overrides(&overrides);
        assert_eq!(effective.id, "bloom");
        assert_eq!(effective.max_scale, 3.0);
        assert_eq!(effective.fuse_profile, None);
        assert_eq!(effective.min_scale, 0.2);
    }

    #[test]
    fn sanitize_swaps_inverted_range() {
        let mut def = Definition {
            min_scale: 4.0,
            max_scale: 1.0,
            ..Definition::inert()
        };
        assert!(def.sanitize());
        assert_eq!((def.min_scale, def.max_scale), (1.0, 4.0));
    }

    #[test]
    fn merge_reports_changes_only() {
        let mut overrides = Overrides::default();
        let patch = Overrides {
            charges: Some(3),
            ..Default::default()
        };
        assert!(overrides.merge(&patch));
        assert!(!overrides.merge(&patch));
        assert!(!overrides.merge(&Overrides::default()));
        assert_eq!(overrides.charges, Some(3));
    }

    #[test]
    fn rate_scale_follows_growth_rate() {
        let mut def = growing();
        def.growth_rate = 0.05;
        assert!((def.rate_scale() - 1.0).abs() < 1e-12);
        def.growth_rate = 10.0;
        assert_eq!(def.rate_scale(), MAX_RATE_SCALE);
    }
}
