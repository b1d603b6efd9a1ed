//! Reveal Core (engine-agnostic)
//!
//! Scroll-reveal animation orchestration: a visibility observer feeds a trigger
//! policy, the trigger selects a state of a named motion variant, and the same
//! trigger can gate numeric counter tweens driven by a shared frame clock.
//!
//! Hosts (wasm, native previews, tests) own the platform side: they implement
//! [`VisibilityPlatform`], push [`IntersectionEntry`] values through [`Inputs`]
//! and call [`Engine::update`] once per frame.

pub mod binding;
pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod format;
pub mod geometry;
pub mod ids;
pub mod inputs;
pub mod observer;
pub mod outputs;
pub mod scheduler;
pub mod trigger;
pub mod tween;
pub mod variants;

// Re-exports for consumers (adapters)
pub use binding::{AnimatedBinding, BindOptions, MotionState, ResolvedMotion, StaggerPlan};
pub use config::{Config, CounterDefaults, TriggerDefaults};
pub use easing::Easing;
pub use engine::{CounterCfg, CounterGate, ElementCfg, Engine};
pub use error::MotionError;
pub use format::group_thousands;
pub use geometry::{Rect, RootMargin};
pub use ids::{CounterId, ElementId, ObservationId};
pub use inputs::{CounterCommand, Inputs};
pub use observer::{
    HeadlessPlatform, IntersectionEntry, Observation, ObserveOptions, ObserverSet,
    ViewportPlatform, VisibilityPlatform,
};
pub use outputs::{CoreEvent, CounterChange, MotionChange, Outputs};
pub use scheduler::{FrameScheduler, FrameTicket};
pub use trigger::{next_state, TriggerConfig, TriggerOverrides, TriggerPhase, TriggerState};
pub use tween::{CounterSpec, TweenCounter, TweenState};
pub use variants::{
    builtin_registry, MotionDescriptor, Transition, TransitionKind, VariantDefinition,
    VariantRegistry, DEFAULT_VARIANT,
};
