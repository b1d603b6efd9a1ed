//! Animated element binding: trigger state + variant -> motion to render.
//!
//! A binding resolves its variant once, at bind time. Stagger offsets are also
//! fixed at bind time (the child's index under its container), so resolving
//! again never reshuffles delays.

use serde::{Deserialize, Serialize};

use crate::trigger::{TriggerConfig, TriggerState};
use crate::variants::{MotionDescriptor, VariantDefinition, VariantRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionState {
    Hidden,
    Visible,
}

impl MotionState {
    pub fn name(&self) -> &'static str {
        match self {
            MotionState::Hidden => "hidden",
            MotionState::Visible => "visible",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BindOptions {
    pub variant: String,
    pub delay_seconds: f32,
    pub trigger: TriggerConfig,
    /// Forwarded to the renderer untouched.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            variant: crate::variants::DEFAULT_VARIANT.to_string(),
            delay_seconds: 0.0,
            trigger: TriggerConfig::default(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Child delay schedule of a staggering container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaggerPlan {
    pub stagger_children: f32,
    pub delay_children: f32,
}

impl StaggerPlan {
    /// None when the variant doesn't stagger its children.
    pub fn from_variant(variant: &VariantDefinition) -> Option<StaggerPlan> {
        variant.stagger_children.map(|stagger| StaggerPlan {
            stagger_children: stagger,
            delay_children: variant.delay_children.unwrap_or(0.0),
        })
    }

    #[inline]
    pub fn child_delay(&self, index: u32) -> f32 {
        self.delay_children + index as f32 * self.stagger_children
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMotion {
    pub state: MotionState,
    pub descriptor: MotionDescriptor,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug)]
pub struct AnimatedBinding {
    pub variant: VariantDefinition,
    pub trigger_state: TriggerState,
    pub fire_once: bool,
    /// Caller delay plus any stagger offset.
    pub extra_delay: f32,
    pub child_index: Option<u32>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnimatedBinding {
    pub fn bind(registry: &VariantRegistry, options: &BindOptions) -> AnimatedBinding {
        if !registry.contains(&options.variant) {
            log::warn!(
                "unknown variant '{}'; falling back to '{}'",
                options.variant,
                crate::variants::DEFAULT_VARIANT
            );
        }
        let delay = if options.delay_seconds.is_finite() {
            options.delay_seconds.max(0.0)
        } else {
            0.0
        };
        AnimatedBinding {
            variant: registry.resolve(&options.variant).clone(),
            trigger_state: TriggerState::default(),
            fire_once: options.trigger.fire_once,
            extra_delay: delay,
            child_index: None,
            extra: options.extra.clone(),
        }
    }

    /// Bind as the `index`-th child of a container with `plan`.
    pub fn bind_child(
        registry: &VariantRegistry,
        options: &BindOptions,
        plan: Option<StaggerPlan>,
        index: u32,
    ) -> AnimatedBinding {
        let mut binding = Self::bind(registry, options);
        binding.child_index = Some(index);
        if let Some(plan) = plan {
            binding.extra_delay += plan.child_delay(index);
        }
        binding
    }

    pub fn stagger_plan(&self) -> Option<StaggerPlan> {
        StaggerPlan::from_variant(&self.variant)
    }

    #[inline]
    pub fn state(&self) -> MotionState {
        if self.trigger_state.is_triggered(self.fire_once) {
            MotionState::Visible
        } else {
            MotionState::Hidden
        }
    }

    /// Descriptor for the current state. The visible descriptor's transition
    /// delay is the variant's own delay plus `extra_delay`.
    pub fn resolve(&self) -> ResolvedMotion {
        let state = self.state();
        let descriptor = match state {
            MotionState::Hidden => self.variant.hidden.clone(),
            MotionState::Visible => {
                let mut d = self.variant.visible.clone();
                if self.extra_delay > 0.0 {
                    let t = d.transition.get_or_insert_with(Default::default);
                    t.delay = Some(t.delay.unwrap_or(0.0) + self.extra_delay);
                }
                d
            }
        };
        ResolvedMotion {
            state,
            descriptor,
            extra: self.extra.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::next_state;
    use crate::variants::builtin_registry;

    fn opts(variant: &str, delay: f32) -> BindOptions {
        BindOptions {
            variant: variant.into(),
            delay_seconds: delay,
            ..Default::default()
        }
    }

    #[test]
    fn hidden_until_triggered_then_visible_with_delay() {
        let reg = builtin_registry();
        let mut b = AnimatedBinding::bind(&reg, &opts("fadeInUp", 0.3));
        let hidden = b.resolve();
        assert_eq!(hidden.state, MotionState::Hidden);
        assert_eq!(hidden.descriptor, reg.resolve("fadeInUp").hidden);

        b.trigger_state = next_state(b.trigger_state, true, b.fire_once);
        let shown = b.resolve();
        assert_eq!(shown.state, MotionState::Visible);
        let t = shown.descriptor.transition.unwrap();
        assert_eq!(t.delay, Some(0.3));
        assert_eq!(t.duration, Some(0.6));
    }

    #[test]
    fn delay_is_added_when_variant_has_no_transition() {
        let reg = builtin_registry();
        let mut b = AnimatedBinding::bind(&reg, &opts("staggerContainer", 0.5));
        b.trigger_state.has_fired = true;
        let t = b.resolve().descriptor.transition.unwrap();
        assert_eq!(t.delay, Some(0.5));
    }

    #[test]
    fn unknown_variant_binds_fallback() {
        let reg = builtin_registry();
        let b = AnimatedBinding::bind(&reg, &opts("nope", 0.0));
        assert_eq!(b.variant.name, "fadeInUp");
    }

    #[test]
    fn children_get_stable_stagger_offsets() {
        let reg = builtin_registry();
        let container = AnimatedBinding::bind(&reg, &opts("staggerContainer", 0.0));
        let plan = container.stagger_plan();
        let delays: Vec<f32> = (0..3)
            .map(|i| AnimatedBinding::bind_child(&reg, &opts("fadeInUp", 0.0), plan, i).extra_delay)
            .collect();
        for (got, want) in delays.iter().zip([0.2f32, 0.3, 0.4]) {
            assert!((got - want).abs() < 1e-6, "got {got} want {want}");
        }

        let mut child = AnimatedBinding::bind_child(&reg, &opts("fadeInUp", 0.0), plan, 2);
        child.trigger_state.has_fired = true;
        let first = child.resolve();
        let again = child.resolve();
        assert_eq!(first, again);
    }

    #[test]
    fn non_staggering_parent_adds_nothing() {
        let reg = builtin_registry();
        let parent = AnimatedBinding::bind(&reg, &opts("fadeInUp", 0.0));
        let child =
            AnimatedBinding::bind_child(&reg, &opts("fadeInUp", 0.1), parent.stagger_plan(), 4);
        assert_eq!(child.extra_delay, 0.1);
        assert_eq!(child.child_index, Some(4));
    }
}
