//! Engine: owns observations, bindings, and counters; steps them per frame.
//!
//! Methods:
//! - new / with_registry, attach_element, attach_counter, detach_element,
//!   detach_counter, update (commands -> intersections -> propagate -> tick -> emit)

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::binding::{AnimatedBinding, BindOptions, MotionState, ResolvedMotion, StaggerPlan};
use crate::config::Config;
use crate::easing::Easing;
use crate::ids::{CounterId, ElementId, IdAllocator, ObservationId};
use crate::inputs::{CounterCommand, Inputs};
use crate::observer::{ObserverSet, VisibilityPlatform};
use crate::outputs::{CoreEvent, CounterChange, MotionChange, Outputs};
use crate::scheduler::FrameScheduler;
use crate::trigger::{next_state, TriggerOverrides, TriggerPhase, TriggerState};
use crate::tween::{CounterSpec, TweenCounter};
use crate::variants::{builtin_registry, VariantRegistry, DEFAULT_VARIANT};

/// Configuration for attaching an element.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementCfg {
    pub target: String,
    pub variant: String,
    pub delay_seconds: f32,
    /// Unset fields use the engine's trigger defaults. Ignored for children,
    /// which follow their container.
    pub trigger: TriggerOverrides,
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Container this element is bound under (stagger orchestration).
    pub parent: Option<ElementId>,
}

impl Default for ElementCfg {
    fn default() -> Self {
        Self {
            target: String::new(),
            variant: DEFAULT_VARIANT.to_string(),
            delay_seconds: 0.0,
            trigger: TriggerOverrides::default(),
            extra: serde_json::Map::new(),
            parent: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterGate {
    /// Gate driven by CounterCommand::SetGate.
    Explicit(bool),
    /// Gate follows an element's trigger.
    Element(ElementId),
}

impl Default for CounterGate {
    fn default() -> Self {
        CounterGate::Explicit(true)
    }
}

/// Configuration for attaching a counter. Unset fields use the engine's
/// counter defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterCfg {
    pub end_value: f64,
    pub duration_seconds: Option<f64>,
    pub easing: Option<Easing>,
    pub prefix: String,
    pub suffix: String,
    pub gate: CounterGate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TriggerSource {
    Own(ObservationId),
    Inherit(ElementId),
}

#[derive(Debug)]
struct Element {
    id: ElementId,
    target: String,
    binding: AnimatedBinding,
    source: TriggerSource,
    stagger: Option<StaggerPlan>,
    next_child: u32,
    last_state: Option<MotionState>,
    last_phase: TriggerPhase,
}

#[derive(Debug)]
struct Counter {
    id: CounterId,
    tween: TweenCounter,
    gate: CounterGate,
    last_display: Option<String>,
}

/// Snapshot used to turn counter mutations into events and scheduling.
#[derive(Clone, Copy)]
struct RunMark {
    generation: u64,
    running: bool,
}

impl RunMark {
    fn of(tween: &TweenCounter) -> Self {
        Self {
            generation: tween.generation(),
            running: tween.is_running(),
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    // Owned data
    cfg: Config,
    ids: IdAllocator,
    registry: Arc<VariantRegistry>,
    elements: Vec<Element>,
    counters: Vec<Counter>,

    // Systems
    observers: ObserverSet,
    by_observation: HashMap<ObservationId, ElementId>,
    scheduler: FrameScheduler,

    // Events raised between frames, flushed by the next update
    deferred: Vec<CoreEvent>,

    // Per-tick outputs
    outputs: Outputs,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Emit events for a counter whose run may have changed since `before`, and
/// keep its frame subscription in step.
fn sync_run(
    scheduler: &mut FrameScheduler,
    events: &mut Vec<CoreEvent>,
    counter: &Counter,
    before: RunMark,
) {
    let after = RunMark::of(&counter.tween);
    if after.generation == before.generation {
        return;
    }
    if before.running {
        events.push(CoreEvent::CounterCancelled {
            counter: counter.id,
        });
    }
    if after.running {
        scheduler.schedule(counter.id, after.generation);
        events.push(CoreEvent::CounterStarted {
            counter: counter.id,
            generation: after.generation,
        });
    } else {
        scheduler.cancel(counter.id);
    }
}

impl Engine {
    /// Create a new engine over the built-in variant catalog.
    pub fn new(cfg: Config) -> Self {
        Self::with_registry(cfg, builtin_registry())
    }

    /// Create an engine over a custom (startup-built) registry.
    pub fn with_registry(cfg: Config, registry: Arc<VariantRegistry>) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            registry,
            elements: Vec::new(),
            counters: Vec::new(),
            observers: ObserverSet::new(),
            by_observation: HashMap::new(),
            scheduler: FrameScheduler::new(),
            deferred: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn counter(&self, id: CounterId) -> Option<&Counter> {
        self.counters.iter().find(|c| c.id == id)
    }

    /// Attach an element: observe it (or inherit its container's trigger) and
    /// bind its variant. Its initial state is emitted by the next update.
    pub fn attach_element(
        &mut self,
        cfg: ElementCfg,
        platform: &mut dyn VisibilityPlatform,
    ) -> ElementId {
        let id = self.ids.alloc_element();
        let trigger = cfg
            .trigger
            .over(&self.cfg.trigger)
            .lenient(&self.cfg.trigger);
        let options = BindOptions {
            variant: cfg.variant,
            delay_seconds: cfg.delay_seconds,
            trigger,
            extra: cfg.extra,
        };

        let parent = match cfg.parent {
            Some(pid) => {
                let found = self.elements.iter_mut().find(|e| e.id == pid);
                if found.is_none() {
                    log::warn!(
                        "parent {pid:?} of '{}' is not attached; binding standalone",
                        cfg.target
                    );
                }
                found
            }
            None => None,
        };

        let (binding, source) = match parent {
            Some(parent) => {
                let index = parent.next_child;
                parent.next_child += 1;
                let mut binding =
                    AnimatedBinding::bind_child(&self.registry, &options, parent.stagger, index);
                binding.fire_once = parent.binding.fire_once;
                binding.trigger_state = parent.binding.trigger_state;
                (binding, TriggerSource::Inherit(parent.id))
            }
            None => {
                let mut binding = AnimatedBinding::bind(&self.registry, &options);
                let obs = self
                    .observers
                    .attach(&cfg.target, (&options.trigger).into(), platform);
                binding.trigger_state =
                    next_state(binding.trigger_state, obs.is_intersecting, binding.fire_once);
                self.by_observation.insert(obs.id, id);
                (binding, TriggerSource::Own(obs.id))
            }
        };

        log::debug!(
            "attached {id:?} '{}' variant '{}'",
            cfg.target,
            binding.variant.name
        );
        self.elements.push(Element {
            id,
            target: cfg.target,
            stagger: binding.stagger_plan(),
            binding,
            source,
            next_child: 0,
            last_state: None,
            last_phase: TriggerPhase::NeverTriggered,
        });
        id
    }

    /// Attach a counter. Counters gated on a missing element start open, so
    /// their value is never hidden for good.
    pub fn attach_counter(&mut self, cfg: CounterCfg) -> CounterId {
        let id = self.ids.alloc_counter();
        let gate = match cfg.gate {
            CounterGate::Element(eid) if self.element(eid).is_none() => {
                log::warn!("counter gated on unknown element {eid:?}; opening gate");
                CounterGate::Explicit(true)
            }
            g => g,
        };
        let open = match gate {
            CounterGate::Explicit(open) => open,
            CounterGate::Element(eid) => self.is_triggered(eid).unwrap_or(true),
        };
        let spec = CounterSpec {
            end_value: cfg.end_value,
            duration_seconds: cfg
                .duration_seconds
                .unwrap_or(self.cfg.counter.duration_seconds),
            easing: cfg.easing.unwrap_or(self.cfg.counter.easing),
            prefix: cfg.prefix,
            suffix: cfg.suffix,
        };

        let idle = TweenCounter::new(spec, false, self.cfg.grouping_separator);
        let before = RunMark::of(&idle);
        let mut counter = Counter {
            id,
            tween: idle,
            gate,
            last_display: None,
        };
        counter.tween.set_gate(open);
        sync_run(&mut self.scheduler, &mut self.deferred, &counter, before);
        self.counters.push(counter);
        id
    }

    /// Detach an element, its inheriting children, and the counters gated on
    /// any of them. Observation updates stop before this returns. Unknown ids
    /// are ignored.
    pub fn detach_element(&mut self, id: ElementId, platform: &mut dyn VisibilityPlatform) {
        if self.element(id).is_none() {
            log::debug!("detach of unknown element {id:?} ignored");
            return;
        }
        // Children always come after their container, so one forward pass
        // collects the whole subtree.
        let mut doomed = vec![id];
        for e in &self.elements {
            if let TriggerSource::Inherit(parent) = e.source {
                if doomed.contains(&parent) {
                    doomed.push(e.id);
                }
            }
        }

        for e in self.elements.iter().filter(|e| doomed.contains(&e.id)) {
            if let TriggerSource::Own(obs) = e.source {
                self.observers.detach(obs, platform);
                self.by_observation.remove(&obs);
            }
        }
        self.elements.retain(|e| !doomed.contains(&e.id));

        let scheduler = &mut self.scheduler;
        let deferred = &mut self.deferred;
        self.counters.retain_mut(|c| match c.gate {
            CounterGate::Element(eid) if doomed.contains(&eid) => {
                let before = RunMark::of(&c.tween);
                c.tween.cancel();
                sync_run(scheduler, deferred, c, before);
                false
            }
            _ => true,
        });
    }

    /// Remove a counter and its frame subscription. Unknown ids are ignored.
    pub fn detach_counter(&mut self, id: CounterId) {
        if let Some(pos) = self.counters.iter().position(|c| c.id == id) {
            let mut c = self.counters.remove(pos);
            let before = RunMark::of(&c.tween);
            c.tween.cancel();
            sync_run(&mut self.scheduler, &mut self.deferred, &c, before);
        }
        self.scheduler.cancel(id);
    }

    /// Whether the element's trigger has resolved to visible.
    pub fn is_triggered(&self, id: ElementId) -> Option<bool> {
        self.element(id)
            .map(|e| e.binding.trigger_state.is_triggered(e.binding.fire_once))
    }

    pub fn trigger_state(&self, id: ElementId) -> Option<TriggerState> {
        self.element(id).map(|e| e.binding.trigger_state)
    }

    pub fn element_state(&self, id: ElementId) -> Option<MotionState> {
        self.element(id).map(|e| e.binding.state())
    }

    pub fn resolve_element(&self, id: ElementId) -> Option<ResolvedMotion> {
        self.element(id).map(|e| e.binding.resolve())
    }

    /// Index under its container, for children.
    pub fn child_index(&self, id: ElementId) -> Option<u32> {
        self.element(id).and_then(|e| e.binding.child_index)
    }

    /// Observation backing the element, for adapters mapping platform
    /// callbacks. None for children, which have no observation of their own.
    pub fn observation_of(&self, id: ElementId) -> Option<ObservationId> {
        self.element(id).and_then(|e| match e.source {
            TriggerSource::Own(obs) => Some(obs),
            TriggerSource::Inherit(_) => None,
        })
    }

    pub fn counter_display(&self, id: CounterId) -> Option<&str> {
        self.counter(id).map(|c| c.tween.display())
    }

    pub fn counter_state(&self, id: CounterId) -> Option<&TweenCounter> {
        self.counter(id).map(|c| &c.tween)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn counter_count(&self) -> usize {
        self.counters.len()
    }

    pub fn observation_count(&self) -> usize {
        self.observers.len()
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduler.len()
    }

    fn apply_counter_cmds(&mut self, cmds: Vec<CounterCommand>) {
        for cmd in cmds {
            let id = match &cmd {
                CounterCommand::SetGate { counter, .. } | CounterCommand::SetSpec { counter, .. } => {
                    *counter
                }
            };
            let Some(counter) = self.counters.iter_mut().find(|c| c.id == id) else {
                log::debug!("command for unknown counter {id:?} ignored");
                continue;
            };
            let before = RunMark::of(&counter.tween);
            match cmd {
                CounterCommand::SetGate { open, .. } => match counter.gate {
                    CounterGate::Explicit(_) => {
                        counter.gate = CounterGate::Explicit(open);
                        counter.tween.set_gate(open);
                    }
                    CounterGate::Element(eid) => {
                        log::warn!("counter {id:?} follows element {eid:?}; SetGate ignored");
                    }
                },
                CounterCommand::SetSpec { spec, .. } => counter.tween.set_spec(spec),
            }
            sync_run(&mut self.scheduler, &mut self.outputs.events, counter, before);
        }
    }

    fn apply_intersections(&mut self, inputs: &Inputs) {
        for entry in &inputs.intersections {
            let Some(visible) = self.observers.apply(*entry) else {
                continue;
            };
            let Some(eid) = self.by_observation.get(&entry.observation).copied() else {
                continue;
            };
            if let Some(e) = self.elements.iter_mut().find(|e| e.id == eid) {
                e.binding.trigger_state =
                    next_state(e.binding.trigger_state, visible, e.binding.fire_once);
            }
        }
    }

    /// Push container triggers down to children, then element triggers into
    /// gated counters.
    fn propagate(&mut self) {
        for i in 0..self.elements.len() {
            if let TriggerSource::Inherit(parent) = self.elements[i].source {
                let inherited = self.elements[..i]
                    .iter()
                    .find(|e| e.id == parent)
                    .map(|p| p.binding.trigger_state);
                if let Some(state) = inherited {
                    self.elements[i].binding.trigger_state = state;
                }
            }
        }

        for counter in &mut self.counters {
            let CounterGate::Element(eid) = counter.gate else {
                continue;
            };
            let Some(open) = self
                .elements
                .iter()
                .find(|e| e.id == eid)
                .map(|e| e.binding.trigger_state.is_triggered(e.binding.fire_once))
            else {
                continue;
            };
            let before = RunMark::of(&counter.tween);
            counter.tween.set_gate(open);
            sync_run(&mut self.scheduler, &mut self.outputs.events, counter, before);
        }
    }

    fn tick_counters(&mut self, dt: f64) {
        for ticket in self.scheduler.due() {
            let Some(counter) = self.counters.iter_mut().find(|c| c.id == ticket.counter) else {
                self.scheduler.cancel(ticket.counter);
                continue;
            };
            counter.tween.advance_frame(ticket.generation, dt);
            if counter.tween.generation() == ticket.generation && counter.tween.is_complete() {
                self.scheduler.cancel(counter.id);
                self.outputs.push_event(CoreEvent::CounterCompleted {
                    counter: counter.id,
                    value: counter.tween.current_value(),
                });
            }
        }
    }

    fn emit_changes(&mut self) {
        for e in &mut self.elements {
            let fire_once = e.binding.fire_once;
            let phase = e.binding.trigger_state.phase(fire_once);
            if phase != e.last_phase {
                match phase {
                    TriggerPhase::Visible => {
                        self.outputs.push_event(CoreEvent::Triggered { element: e.id })
                    }
                    TriggerPhase::HiddenAgain => {
                        self.outputs.push_event(CoreEvent::HiddenAgain { element: e.id })
                    }
                    TriggerPhase::NeverTriggered => {}
                }
                e.last_phase = phase;
            }

            let state = e.binding.state();
            if e.last_state != Some(state) {
                e.last_state = Some(state);
                self.outputs.push_motion(MotionChange {
                    element: e.id,
                    target: e.target.clone(),
                    motion: e.binding.resolve(),
                });
                self.outputs.push_event(CoreEvent::StateChanged {
                    element: e.id,
                    state,
                });
            }
        }

        for c in &mut self.counters {
            let display = c.tween.display();
            if c.last_display.as_deref() != Some(display) {
                c.last_display = Some(display.to_string());
                self.outputs.push_counter(CounterChange {
                    counter: c.id,
                    display: display.to_string(),
                    value: c.tween.current_value(),
                });
            }
        }
    }

    /// Step one frame of `dt` seconds with the given inputs.
    pub fn update(&mut self, dt: f32, inputs: Inputs) -> &Outputs {
        self.outputs.clear();
        self.scheduler.begin_frame();
        self.outputs.events.append(&mut self.deferred);

        // 1) Counter commands
        let mut inputs = inputs;
        let cmds = std::mem::take(&mut inputs.counter_cmds);
        self.apply_counter_cmds(cmds);

        // 2) Visibility -> trigger policy
        self.apply_intersections(&inputs);

        // 3) Containers -> children -> gated counters
        self.propagate();

        // 4) Frame clock
        self.tick_counters(dt as f64);

        // 5) Changes and events
        self.emit_changes();

        let cap = self.cfg.max_events_per_tick;
        if self.outputs.events.len() > cap {
            log::warn!(
                "dropping {} events over the per-tick cap of {cap}",
                self.outputs.events.len() - cap
            );
            self.outputs.events.truncate(cap);
        }

        &self.outputs
    }
}
