//! Output contracts from the core engine.
//!
//! Outputs carry only what changed this frame: element motion states,
//! counter displays, and a separate list of semantic events. Adapters apply
//! changes to the host renderer and forward events.

use serde::{Deserialize, Serialize};

use crate::binding::{MotionState, ResolvedMotion};
use crate::ids::{CounterId, ElementId};

/// New motion state for one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionChange {
    pub element: ElementId,
    pub target: String, // TargetHandle
    pub motion: ResolvedMotion,
}

/// New display for one counter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterChange {
    pub counter: CounterId,
    pub display: String,
    pub value: f64,
}

/// Discrete semantic signals emitted during stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    Triggered {
        element: ElementId,
    },
    /// A repeatable element scrolled back out.
    HiddenAgain {
        element: ElementId,
    },
    StateChanged {
        element: ElementId,
        state: MotionState,
    },
    CounterStarted {
        counter: CounterId,
        generation: u64,
    },
    CounterCompleted {
        counter: CounterId,
        value: f64,
    },
    CounterCancelled {
        counter: CounterId,
    },
}

/// Outputs returned by Engine::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub motions: Vec<MotionChange>,
    #[serde(default)]
    pub counters: Vec<CounterChange>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.motions.clear();
        self.counters.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_motion(&mut self, change: MotionChange) {
        self.motions.push(change);
    }

    #[inline]
    pub fn push_counter(&mut self, change: CounterChange) {
        self.counters.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.motions.is_empty() && self.counters.is_empty() && self.events.is_empty()
    }

    /// Latest change for `element` this frame, if any.
    pub fn motion_for(&self, element: ElementId) -> Option<&MotionChange> {
        self.motions.iter().rev().find(|m| m.element == element)
    }

    /// Latest change for `counter` this frame, if any.
    pub fn counter_for(&self, counter: CounterId) -> Option<&CounterChange> {
        self.counters.iter().rev().find(|c| c.counter == counter)
    }
}
