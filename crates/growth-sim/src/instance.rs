//! One growth instance and its per-tick orchestration.
//!
//! `GrowthInstance` owns its `MutableState` exclusively. Each tick it
//! resolves the effective definition, runs the systems in a fixed order
//! (scale, fuse, burst, force field, contact, ambient, wobble) and reports
//! what changed as a set of dirty reasons.

use glam::DVec3;
use log::{debug, trace};

use growth_core::constants::REGROW_DELAY_TICKS;
use growth_core::definition::{Definition, Overrides};
use growth_core::enums::{ArmCause, DirtyReason, DirtyReasons, ForceMode, ShapeKind};
use growth_core::events::EffectRequest;
use growth_core::profiles::{ExplosionProfile, ForceProfile, FuseProfile, ParticleProfile};
use growth_core::state::MutableState;
use growth_core::types::{HeldItem, Shape};

use crate::host::TargetQuery;
use crate::registry::ProfileRegistry;
use crate::systems::burst::{self, BurstOutcome};
use crate::systems::force_field::{self, FieldOrigin};
use crate::systems::fuse::{self, ArmRejection};
use crate::systems::scale::{self, ScaleStep};
use crate::systems::{ambient, contact, shape};

/// Everything an instance reads from the outside during one tick.
pub struct TickContext<'a> {
    pub now: u64,
    /// Cooldown maps are swept when `now` is a multiple of this. 0 disables sweeping.
    pub sweep_interval: u64,
    pub registry: &'a ProfileRegistry,
    pub targets: &'a dyn TargetQuery,
    pub effects: &'a mut Vec<EffectRequest>,
}

/// What one tick changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Persisted fields that changed.
    pub dirty: DirtyReasons,
    /// Derived shapes were recomputed.
    pub shape_dirty: bool,
    /// Last charge spent; the host should remove the instance.
    pub remove: bool,
}

impl TickOutcome {
    pub fn needs_save(&self) -> bool {
        !self.dirty.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GrowthInstance {
    definition_id: String,
    overrides: Overrides,
    anchor: DVec3,
    wobble_phase: f64,
    state: MutableState,
    /// Definition with overrides applied, as of the last tick.
    effective: Definition,
}

impl GrowthInstance {
    /// A fresh instance at its definition's baseline.
    pub fn new(
        definition_id: impl Into<String>,
        anchor: DVec3,
        wobble_phase: f64,
        registry: &ProfileRegistry,
    ) -> Self {
        let definition_id = definition_id.into();
        let overrides = Overrides::default();
        let effective = registry.definition(&definition_id).with_overrides(&overrides);
        let state = MutableState::baseline(&effective);
        let mut instance = Self {
            definition_id,
            overrides,
            anchor,
            wobble_phase,
            state,
            effective,
        };
        instance.refresh_shapes();
        instance
    }

    /// Rebuild an instance from previously persisted parts, repairing any
    /// state that no longer fits the current definition.
    pub fn from_parts(
        definition_id: impl Into<String>,
        overrides: Overrides,
        anchor: DVec3,
        wobble_phase: f64,
        mut state: MutableState,
        registry: &ProfileRegistry,
    ) -> Self {
        let definition_id = definition_id.into();
        let effective = registry.definition(&definition_id).with_overrides(&overrides);
        if state.repair(&effective) {
            debug!("Repaired loaded state for definition '{definition_id}'");
        }
        let mut instance = Self {
            definition_id,
            overrides,
            anchor,
            wobble_phase,
            state,
            effective,
        };
        instance.refresh_shapes();
        instance
    }

    /// Advance the instance by one tick.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let registry = ctx.registry;

        let effective = registry
            .definition(&self.definition_id)
            .with_overrides(&self.overrides);
        if effective != self.effective {
            self.adopt_definition(effective);
            outcome.dirty.insert(DirtyReason::Definition);
            outcome.shape_dirty = true;
        }

        let before = self.state.clone();
        let Self {
            state,
            effective: def,
            anchor,
            wobble_phase,
            ..
        } = self;
        let center = *anchor;

        let fuse_profile = registry.resolve_optional::<FuseProfile>(def.fuse_profile.as_deref());
        let explosion = registry.resolve::<ExplosionProfile>(def.explosion_profile.as_deref());
        let particle = registry.resolve_optional::<ParticleProfile>(def.particle_profile.as_deref());
        let pull = def
            .pull_enabled
            .then(|| registry.resolve::<ForceProfile>(def.pull_profile.as_deref()));
        let push = def
            .push_enabled
            .then(|| registry.resolve::<ForceProfile>(def.push_profile.as_deref()));

        if scale::step(state, def) == ScaleStep::Moved {
            outcome.shape_dirty = true;
        }

        fuse::run(state, def, fuse_profile, explosion, center, ctx.effects);

        match burst::tick(state, center, ctx.targets, ctx.effects) {
            BurstOutcome::Completed => {
                let (floor, target) = def.baseline_scales();
                state.current_scale = floor;
                state.previous_scale = floor;
                state.target_scale = target;
                state.scale_cooldown = REGROW_DELAY_TICKS;
                outcome.shape_dirty = true;
                debug!("Regrowing '{}' from {floor:.3}", def.id);
            }
            BurstOutcome::Exhausted => outcome.remove = true,
            _ => {}
        }

        if !outcome.remove {
            let progress = def.growth_progress(state.current_scale);
            let origin = FieldOrigin {
                center,
                scale_factor: state.current_scale,
                now: ctx.now,
            };
            let channels = [
                (ForceMode::Pull, pull, &mut state.pull_cooldown),
                (ForceMode::Push, push, &mut state.push_cooldown),
            ];
            for (mode, profile, countdown) in channels {
                match profile {
                    Some(profile) => {
                        force_field::run_channel(
                            mode,
                            profile,
                            countdown,
                            progress,
                            origin,
                            ctx.targets,
                            &mut state.force_damage_cooldowns,
                            ctx.effects,
                        );
                    }
                    None => *countdown = 0,
                }
            }

            contact::tick(state, def, ctx.now, ctx.targets, ctx.effects);

            let scale_now = state.current_scale;
            ambient::tick(state, particle, center, scale_now, ctx.effects);

            if shape::tick_wobble(state, def, ctx.now, *wobble_phase) {
                outcome.shape_dirty = true;
            }
        }

        if ctx.sweep_interval > 0 && ctx.now % ctx.sweep_interval == 0 {
            let swept = state.sweep_cooldowns(ctx.now);
            if swept > 0 {
                trace!("Swept {swept} expired cooldown entries");
            }
        }

        outcome.dirty.extend(diff(&before, state));
        if outcome.shape_dirty {
            shape::recompute(state, center, def);
        }
        outcome
    }

    /// Switch to another definition. Resets state to the new baseline.
    /// Returns false if the id is unchanged.
    pub fn set_definition_id(&mut self, id: &str, registry: &ProfileRegistry) -> bool {
        if self.definition_id == id {
            return false;
        }
        debug!("Definition '{}' -> '{id}', resetting state", self.definition_id);
        self.definition_id = id.to_string();
        self.reset(registry);
        true
    }

    /// Merge `patch` into the instance's overrides. Resets state when anything
    /// changed; returns whether it did.
    pub fn apply_overrides(&mut self, patch: &Overrides, registry: &ProfileRegistry) -> bool {
        if !self.overrides.merge(patch) {
            return false;
        }
        debug!("Overrides changed for '{}', resetting state", self.definition_id);
        self.reset(registry);
        true
    }

    /// Replace the overrides wholesale. Resets state when they differ.
    pub fn replace_overrides(&mut self, overrides: Overrides, registry: &ProfileRegistry) -> bool {
        if self.overrides == overrides {
            return false;
        }
        self.overrides = overrides;
        self.reset(registry);
        true
    }

    /// Try to arm the fuse from an external interaction.
    pub fn handle_manual_arm_request(
        &mut self,
        cause: ArmCause,
        held: Option<&HeldItem>,
        registry: &ProfileRegistry,
        effects: &mut Vec<EffectRequest>,
    ) -> bool {
        let fuse_profile =
            registry.resolve_optional::<FuseProfile>(self.effective.fuse_profile.as_deref());
        match fuse::check_manual_arm(&self.state, &self.effective, fuse_profile, cause, held) {
            Ok(item_use) => {
                // check_manual_arm only succeeds with a fuse profile present.
                if let Some(fuse_profile) = fuse_profile {
                    fuse::arm(
                        &mut self.state,
                        &self.effective,
                        fuse_profile,
                        self.anchor,
                        effects,
                    );
                }
                if item_use.consume > 0 || item_use.damage > 0 {
                    effects.push(EffectRequest::UseItem {
                        consume: item_use.consume,
                        damage: item_use.damage,
                    });
                }
                true
            }
            Err(rejection) => {
                debug!("Manual arm ({cause:?}) rejected: {rejection:?}");
                false
            }
        }
    }

    /// Whether a manual arm request would be accepted right now.
    pub fn can_arm_preview(
        &self,
        cause: ArmCause,
        held: Option<&HeldItem>,
        registry: &ProfileRegistry,
    ) -> bool {
        self.arm_check(cause, held, registry).is_ok()
    }

    /// Like [`can_arm_preview`](Self::can_arm_preview) but says why not.
    pub fn arm_check(
        &self,
        cause: ArmCause,
        held: Option<&HeldItem>,
        registry: &ProfileRegistry,
    ) -> Result<(), ArmRejection> {
        let fuse_profile =
            registry.resolve_optional::<FuseProfile>(self.effective.fuse_profile.as_deref());
        fuse::check_manual_arm(&self.state, &self.effective, fuse_profile, cause, held).map(|_| ())
    }

    /// Disarm the fuse and drop any pending burst.
    pub fn disarm(&mut self, effects: &mut Vec<EffectRequest>) -> bool {
        let was_active = self.state.fuse_armed || self.state.is_burst_active();
        fuse::disarm(&mut self.state, effects);
        was_active
    }

    pub fn current_shape(&self, kind: ShapeKind) -> Shape {
        shape::shape(&self.state, kind)
    }

    pub fn render_scale(&self, interpolation: f64) -> f64 {
        scale::render_scale(&self.state, interpolation)
    }

    pub fn is_fuse_armed(&self) -> bool {
        self.state.fuse_armed
    }

    pub fn fuse_ticks_remaining(&self) -> u32 {
        self.state.fuse_ticks_remaining
    }

    pub fn growth_progress(&self) -> f64 {
        scale::growth_progress(&self.state, &self.effective)
    }

    pub fn state(&self) -> &MutableState {
        &self.state
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn effective_definition(&self) -> &Definition {
        &self.effective
    }

    pub fn anchor(&self) -> DVec3 {
        self.anchor
    }

    pub fn wobble_phase(&self) -> f64 {
        self.wobble_phase
    }

    fn reset(&mut self, registry: &ProfileRegistry) {
        self.effective = registry
            .definition(&self.definition_id)
            .with_overrides(&self.overrides);
        self.state = MutableState::baseline(&self.effective);
        self.refresh_shapes();
    }

    /// The effective definition changed underneath the instance (registry
    /// reload). Keep progress, but pull state back inside the new bounds.
    fn adopt_definition(&mut self, effective: Definition) {
        debug!(
            "Effective definition for '{}' changed, re-clamping state",
            self.definition_id
        );
        self.effective = effective;
        self.state.repair(&self.effective);
        if !self.state.fuse_armed && !self.state.is_burst_active() {
            let (_, target) = self.effective.baseline_scales();
            self.state.target_scale = if self.effective.growth_enabled {
                target
            } else {
                self.effective.clamp_scale(self.state.target_scale)
            };
        }
    }

    fn refresh_shapes(&mut self) {
        shape::recompute(&mut self.state, self.anchor, &self.effective);
    }
}

/// Persisted fields that differ between two snapshots of the same instance.
/// Countdown churn and wobble never mark the state dirty.
fn diff(before: &MutableState, after: &MutableState) -> DirtyReasons {
    let mut dirty = DirtyReasons::default();
    if before.current_scale != after.current_scale {
        dirty.insert(DirtyReason::Scale);
    }
    if before.target_scale != after.target_scale {
        dirty.insert(DirtyReason::TargetScale);
    }
    if before.fuse_armed != after.fuse_armed
        || before.collapse_duration != after.collapse_duration
        || before.collapse_end_scale != after.collapse_end_scale
    {
        dirty.insert(DirtyReason::Fuse);
    }
    if before.burst_explosions_remaining != after.burst_explosions_remaining {
        dirty.insert(DirtyReason::Burst);
    }
    if before.remaining_charges != after.remaining_charges {
        dirty.insert(DirtyReason::Charges);
    }
    dirty
}
