//! Counter tween: animates a displayed number from 0 to a target once its gate
//! opens.
//!
//! Every run has a generation. Changing the spec or re-opening the gate starts
//! a new generation from 0; frames carrying an older generation are dropped,
//! so a cancelled run can never write into the one that replaced it.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::format::counter_display;

/// Progress within this (relative) distance of the end completes the run, so
/// accumulated frame deltas land exactly on the last frame.
const COMPLETION_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSpec {
    pub end_value: f64,
    pub duration_seconds: f64,
    pub easing: Easing,
    pub prefix: String,
    pub suffix: String,
}

impl CounterSpec {
    /// Run identity. Non-finite numbers all resolve the same way, so they
    /// compare equal to each other.
    pub fn same_run(&self, other: &CounterSpec) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (!a.is_finite() && !b.is_finite())
        }
        same(self.end_value, other.end_value)
            && same(self.duration_seconds, other.duration_seconds)
            && self.easing == other.easing
            && self.prefix == other.prefix
            && self.suffix == other.suffix
    }
}

impl Default for CounterSpec {
    fn default() -> Self {
        Self {
            end_value: 0.0,
            duration_seconds: 2.0,
            easing: Easing::EaseOut,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TweenState {
    pub start_value: f64,
    pub end_value: f64,
    pub elapsed_seconds: f64,
    pub duration_seconds: f64,
    pub easing: Easing,
    pub current_value: f64,
    pub running: bool,
}

impl TweenState {
    fn new(spec: &CounterSpec) -> Self {
        Self {
            start_value: 0.0,
            end_value: spec.end_value,
            elapsed_seconds: 0.0,
            duration_seconds: spec.duration_seconds,
            easing: spec.easing,
            current_value: 0.0,
            running: true,
        }
    }

    /// Advance by `dt`. Returns true when this frame completed the run.
    fn step(&mut self, dt: f64) -> bool {
        if !self.running {
            return false;
        }
        let duration = self.duration_seconds;
        if !duration.is_finite() || duration <= 0.0 {
            self.finish();
            return true;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed_seconds = (self.elapsed_seconds + dt).min(duration);
        let t = (self.elapsed_seconds / duration).clamp(0.0, 1.0);
        if t >= 1.0 - COMPLETION_EPSILON {
            self.finish();
            return true;
        }
        let eased = self.easing.apply(t);
        self.current_value =
            (self.start_value + (self.end_value - self.start_value) * eased).round();
        false
    }

    fn finish(&mut self) {
        if self.duration_seconds.is_finite() && self.duration_seconds > 0.0 {
            self.elapsed_seconds = self.duration_seconds;
        }
        self.current_value = self.end_value;
        self.running = false;
    }
}

#[derive(Clone, Debug)]
pub struct TweenCounter {
    spec: CounterSpec,
    gate: bool,
    separator: char,
    generation: u64,
    run: Option<TweenState>,
    display: String,
}

impl TweenCounter {
    pub fn new(spec: CounterSpec, gate: bool, separator: char) -> Self {
        let display = counter_display(&spec.prefix, 0.0, &spec.suffix, separator);
        let mut counter = Self {
            spec,
            gate: false,
            separator,
            generation: 0,
            run: None,
            display,
        };
        counter.set_gate(gate);
        counter
    }

    pub fn spec(&self) -> &CounterSpec {
        &self.spec
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> Option<&TweenState> {
        self.run.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().map(|r| r.running).unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.run.as_ref().map(|r| !r.running).unwrap_or(false)
    }

    pub fn current_value(&self) -> f64 {
        self.run.as_ref().map(|r| r.current_value).unwrap_or(0.0)
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// The pre-animation display, `prefix + "0" + suffix`.
    pub fn formatted_start(&self) -> String {
        counter_display(&self.spec.prefix, 0.0, &self.spec.suffix, self.separator)
    }

    /// Open or close the gate. Opening starts a fresh run; closing cancels
    /// the current one and shows the start value again.
    pub fn set_gate(&mut self, open: bool) {
        if open == self.gate {
            return;
        }
        self.gate = open;
        if open {
            self.restart();
        } else {
            self.cancel();
        }
    }

    /// Replace the spec. An identical spec is ignored; a different one
    /// restarts from 0 when the gate is open.
    pub fn set_spec(&mut self, spec: CounterSpec) {
        if spec.same_run(&self.spec) {
            return;
        }
        self.spec = spec;
        if self.gate {
            self.restart();
        } else {
            self.display = self.formatted_start();
        }
    }

    /// Drop the current run without starting another.
    pub fn cancel(&mut self) {
        if self.run.take().is_some() {
            self.generation += 1;
        }
        self.display = self.formatted_start();
    }

    fn restart(&mut self) {
        self.generation += 1;
        if !self.spec.end_value.is_finite() {
            log::warn!(
                "counter target {} is not finite; showing 0",
                self.spec.end_value
            );
            self.run = None;
        } else {
            self.run = Some(TweenState::new(&self.spec));
        }
        self.display = self.formatted_start();
    }

    /// Advance the current run by one frame.
    pub fn advance(&mut self, dt: f64) -> bool {
        self.advance_frame(self.generation, dt)
    }

    /// Advance by one frame scheduled for `generation`. Frames for an older
    /// generation are discarded. Returns true when the display changed.
    pub fn advance_frame(&mut self, generation: u64, dt: f64) -> bool {
        if generation != self.generation {
            log::debug!(
                "discarding stale counter frame (generation {generation}, current {})",
                self.generation
            );
            return false;
        }
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        if !run.running {
            return false;
        }
        run.step(dt);
        let next = counter_display(
            &self.spec.prefix,
            run.current_value,
            &self.spec.suffix,
            self.separator,
        );
        if next == self.display {
            return false;
        }
        self.display = next;
        true
    }
}
