//! Variant registry: named pairs of hidden/visible motion descriptors.
//!
//! Descriptors are opaque to the engine; they are resolved and forwarded to
//! the renderer unchanged (apart from transition delays, see binding.rs).
//! Registries are built once at startup and shared read-only afterwards.

use std::sync::Arc;

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::MotionError;

/// Variant used for unknown names.
pub const DEFAULT_VARIANT: &str = "fadeInUp";

const SMOOTH_OUT: Easing = Easing::CubicBezier([0.22, 1.0, 0.36, 1.0]);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
    #[default]
    Tween,
    Spring,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    #[serde(default, rename = "type")]
    pub kind: TransitionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stiffness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<Easing>,
}

/// Presentation parameters for one motion state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDefinition {
    pub name: String,
    pub hidden: MotionDescriptor,
    pub visible: MotionDescriptor,
    /// Per-child delay increment for children bound under this variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger_children: Option<f32>,
    /// Delay before the first child starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_children: Option<f32>,
}

impl VariantDefinition {
    #[inline]
    pub fn staggers(&self) -> bool {
        self.stagger_children.is_some()
    }

    fn validate(&self) -> Result<(), MotionError> {
        for (field, v) in [
            ("staggerChildren", self.stagger_children),
            ("delayChildren", self.delay_children),
        ] {
            if let Some(v) = v {
                if !v.is_finite() || v < 0.0 {
                    return Err(MotionError::InvalidCatalog(format!(
                        "variant '{}': {field} must be a finite non-negative number",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct VariantRegistry {
    variants: HashMap<String, VariantDefinition>,
    fallback: VariantDefinition,
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

static BUILTIN: Lazy<Arc<VariantRegistry>> =
    Lazy::new(|| Arc::new(VariantRegistry::with_builtins()));

/// The process-wide built-in catalog.
pub fn builtin_registry() -> Arc<VariantRegistry> {
    Arc::clone(&BUILTIN)
}

impl VariantRegistry {
    /// A registry seeded with the built-in catalog.
    pub fn with_builtins() -> Self {
        let fallback = fade_in("fadeInUp", None, Some(60.0));
        let mut reg = Self {
            variants: HashMap::new(),
            fallback: fallback.clone(),
        };
        for def in builtin_catalog(fallback) {
            reg.register(def);
        }
        reg
    }

    /// Add or replace a definition. Registries are frozen once handed to an
    /// engine (it only keeps an `Arc`), so this is a startup-time operation.
    pub fn register(&mut self, definition: VariantDefinition) {
        if definition.name == DEFAULT_VARIANT {
            self.fallback = definition.clone();
        }
        self.variants.insert(definition.name.clone(), definition);
    }

    /// Register every definition from a JSON array. Nothing is registered if
    /// any entry is invalid.
    pub fn extend_from_json(&mut self, json: &str) -> Result<(), MotionError> {
        let defs: Vec<VariantDefinition> =
            serde_json::from_str(json).map_err(|e| MotionError::InvalidCatalog(e.to_string()))?;
        for def in &defs {
            def.validate()?;
        }
        for def in defs {
            self.register(def);
        }
        Ok(())
    }

    /// Total lookup: unknown names resolve to [`DEFAULT_VARIANT`].
    pub fn resolve(&self, name: &str) -> &VariantDefinition {
        self.variants.get(name).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variants.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn tween(duration: f32, ease: Easing) -> Option<Transition> {
    Some(Transition {
        duration: Some(duration),
        ease: Some(ease),
        ..Default::default()
    })
}

fn variant(name: &str, hidden: MotionDescriptor, visible: MotionDescriptor) -> VariantDefinition {
    VariantDefinition {
        name: name.to_string(),
        hidden,
        visible,
        stagger_children: None,
        delay_children: None,
    }
}

fn fade_in(name: &str, x: Option<f32>, y: Option<f32>) -> VariantDefinition {
    variant(
        name,
        MotionDescriptor {
            opacity: Some(0.0),
            x,
            y,
            ..Default::default()
        },
        MotionDescriptor {
            opacity: Some(1.0),
            x: x.map(|_| 0.0),
            y: y.map(|_| 0.0),
            transition: tween(0.6, SMOOTH_OUT),
            ..Default::default()
        },
    )
}

fn slide_in(name: &str, x: Option<f32>, y: Option<f32>) -> VariantDefinition {
    let mut def = fade_in(name, x, y);
    def.visible.transition = tween(0.8, SMOOTH_OUT);
    def
}

fn grow_in(name: &str, from_scale: f32, duration: f32) -> VariantDefinition {
    variant(
        name,
        MotionDescriptor {
            opacity: Some(0.0),
            scale: Some(from_scale),
            ..Default::default()
        },
        MotionDescriptor {
            opacity: Some(1.0),
            scale: Some(1.0),
            transition: tween(duration, Easing::EaseOut),
            ..Default::default()
        },
    )
}

fn builtin_catalog(fade_in_up: VariantDefinition) -> Vec<VariantDefinition> {
    let mut bounce = grow_in("bounceIn", 0.3, 0.6);
    if let Some(t) = bounce.visible.transition.as_mut() {
        t.kind = TransitionKind::Spring;
        t.stiffness = Some(260.0);
        t.damping = Some(20.0);
        t.duration = None;
        t.ease = None;
    }

    let mut stagger = variant(
        "staggerContainer",
        MotionDescriptor {
            opacity: Some(0.0),
            ..Default::default()
        },
        MotionDescriptor {
            opacity: Some(1.0),
            ..Default::default()
        },
    );
    stagger.stagger_children = Some(0.1);
    stagger.delay_children = Some(0.2);

    vec![
        fade_in_up,
        fade_in("fadeInDown", None, Some(-60.0)),
        fade_in("fadeInLeft", Some(-60.0), None),
        fade_in("fadeInRight", Some(60.0), None),
        grow_in("scaleIn", 0.8, 0.5),
        slide_in("slideInUp", None, Some(100.0)),
        slide_in("slideInDown", None, Some(-100.0)),
        slide_in("slideInLeft", Some(-100.0), None),
        slide_in("slideInRight", Some(100.0), None),
        grow_in("zoomIn", 0.5, 0.6),
        variant(
            "rotateIn",
            MotionDescriptor {
                opacity: Some(0.0),
                rotate: Some(-180.0),
                scale: Some(0.5),
                ..Default::default()
            },
            MotionDescriptor {
                opacity: Some(1.0),
                rotate: Some(0.0),
                scale: Some(1.0),
                transition: tween(0.8, SMOOTH_OUT),
                ..Default::default()
            },
        ),
        variant(
            "flipIn",
            MotionDescriptor {
                opacity: Some(0.0),
                rotate_x: Some(90.0),
                ..Default::default()
            },
            MotionDescriptor {
                opacity: Some(1.0),
                rotate_x: Some(0.0),
                transition: tween(0.8, SMOOTH_OUT),
                ..Default::default()
            },
        ),
        bounce,
        stagger,
    ]
}
