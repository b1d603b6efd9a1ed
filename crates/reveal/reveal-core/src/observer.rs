//! Visibility observer: one platform observation per tracked element.
//!
//! The platform side is push based. Hosts implement [`VisibilityPlatform`]
//! (a browser IntersectionObserver in the wasm adapter, [`ViewportPlatform`]
//! for native hosts and tests) and feed the [`IntersectionEntry`] values it
//! produces back into the engine. A platform with no visibility primitive
//! degrades every observation to "always visible".

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{meets_threshold, Rect, RootMargin};
use crate::ids::{IdAllocator, ObservationId};
use crate::trigger::TriggerConfig;

/// Opaque target handle (small string key, e.g. a DOM id).
pub type TargetHandle = String;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObserveOptions {
    pub threshold: f32,
    pub root_margin: RootMargin,
}

impl From<&TriggerConfig> for ObserveOptions {
    fn from(cfg: &TriggerConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            root_margin: cfg.margin(),
        }
    }
}

/// One "entered/left the viewport" notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionEntry {
    pub observation: ObservationId,
    pub is_intersecting: bool,
}

/// Adapters implement this over their native intersection primitive.
pub trait VisibilityPlatform {
    /// Start observing `target`. Return false when the platform cannot observe
    /// visibility at all; the observation then reports intersecting at once.
    fn observe(&mut self, observation: ObservationId, target: &str, options: &ObserveOptions)
        -> bool;

    /// Stop observing and release platform resources.
    fn unobserve(&mut self, observation: ObservationId);
}

/// Platform without a visibility primitive (server rendering, headless runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessPlatform;

impl VisibilityPlatform for HeadlessPlatform {
    fn observe(&mut self, _: ObservationId, _: &str, _: &ObserveOptions) -> bool {
        false
    }

    fn unobserve(&mut self, _: ObservationId) {}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub id: ObservationId,
    pub target: TargetHandle,
    pub options: ObserveOptions,
    pub is_intersecting: bool,
    /// True when the platform could not observe and the observation was
    /// forced visible.
    pub degraded: bool,
}

/// Owns every live observation. Observations are independent even when they
/// share a target.
#[derive(Debug, Default)]
pub struct ObserverSet {
    ids: IdAllocator,
    live: HashMap<ObservationId, Observation>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(
        &mut self,
        target: &str,
        options: ObserveOptions,
        platform: &mut dyn VisibilityPlatform,
    ) -> &Observation {
        let id = self.ids.alloc_observation();
        let supported = platform.observe(id, target, &options);
        if !supported {
            log::debug!("no visibility primitive for '{target}'; treating it as visible");
        }
        self.live.entry(id).or_insert(Observation {
            id,
            target: target.to_string(),
            options,
            is_intersecting: !supported,
            degraded: !supported,
        })
    }

    /// Stop updates for `id`. Detaching twice is a no-op.
    pub fn detach(&mut self, id: ObservationId, platform: &mut dyn VisibilityPlatform) {
        if let Some(obs) = self.live.remove(&id) {
            if !obs.degraded {
                platform.unobserve(id);
            }
        }
    }

    /// Fold one platform entry in. Returns the new value, or None when the
    /// observation is gone (late callbacks after detach are discarded).
    pub fn apply(&mut self, entry: IntersectionEntry) -> Option<bool> {
        match self.live.get_mut(&entry.observation) {
            Some(obs) => {
                obs.is_intersecting = entry.is_intersecting;
                Some(obs.is_intersecting)
            }
            None => {
                log::debug!(
                    "discarding entry for detached observation {:?}",
                    entry.observation
                );
                None
            }
        }
    }

    pub fn get(&self, id: ObservationId) -> Option<&Observation> {
        self.live.get(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[derive(Debug)]
struct Watch {
    observation: ObservationId,
    target: TargetHandle,
    options: ObserveOptions,
    last: Option<bool>,
}

/// Geometric stand-in for a browser intersection primitive: a scrollable
/// viewport over element rectangles in document coordinates. Like the
/// browser, it reports once on observe and then on every threshold crossing.
#[derive(Debug)]
pub struct ViewportPlatform {
    viewport: Rect,
    targets: HashMap<TargetHandle, Rect>,
    watches: Vec<Watch>,
}

impl ViewportPlatform {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Rect::new(0.0, 0.0, width, height),
            targets: HashMap::new(),
            watches: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_target_rect(&mut self, target: &str, rect: Rect) {
        self.targets.insert(target.to_string(), rect);
    }

    pub fn remove_target(&mut self, target: &str) {
        self.targets.remove(target);
    }

    pub fn scroll_to(&mut self, x: f32, y: f32) {
        self.viewport.x = x;
        self.viewport.y = y;
    }

    pub fn scroll_by(&mut self, dy: f32) {
        self.viewport.y += dy;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    fn intersects(&self, target: &str, options: &ObserveOptions) -> bool {
        let root = options.root_margin.apply(&self.viewport);
        self.targets
            .get(target)
            .map(|rect| meets_threshold(rect, &root, options.threshold))
            .unwrap_or(false)
    }

    /// Entries for every observation whose state changed since the last call
    /// (or that has never reported).
    pub fn take_entries(&mut self) -> Vec<IntersectionEntry> {
        let mut entries = Vec::new();
        for i in 0..self.watches.len() {
            let now = self.intersects(&self.watches[i].target, &self.watches[i].options);
            let watch = &mut self.watches[i];
            if watch.last != Some(now) {
                watch.last = Some(now);
                entries.push(IntersectionEntry {
                    observation: watch.observation,
                    is_intersecting: now,
                });
            }
        }
        entries
    }
}

impl VisibilityPlatform for ViewportPlatform {
    fn observe(&mut self, observation: ObservationId, target: &str, options: &ObserveOptions) -> bool {
        self.watches.push(Watch {
            observation,
            target: target.to_string(),
            options: options.clone(),
            last: None,
        });
        true
    }

    fn unobserve(&mut self, observation: ObservationId) {
        self.watches.retain(|w| w.observation != observation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(threshold: f32, margin: &str) -> ObserveOptions {
        ObserveOptions {
            threshold,
            root_margin: RootMargin::parse(margin).unwrap(),
        }
    }

    #[test]
    fn headless_degrades_to_visible() {
        let mut set = ObserverSet::new();
        let obs = set.attach("hero", opts(0.1, "0px"), &mut HeadlessPlatform);
        assert!(obs.is_intersecting);
        assert!(obs.degraded);
    }

    #[test]
    fn viewport_reports_initial_and_crossings_only() {
        let mut vp = ViewportPlatform::new(100.0, 100.0);
        vp.set_target_rect("card", Rect::new(0.0, 200.0, 100.0, 100.0));
        let mut set = ObserverSet::new();
        let id = set.attach("card", opts(0.1, "0px"), &mut vp).id;

        assert_eq!(
            vp.take_entries(),
            vec![IntersectionEntry {
                observation: id,
                is_intersecting: false
            }]
        );
        // Still outside: nothing new.
        vp.scroll_by(50.0);
        assert!(vp.take_entries().is_empty());

        // 50% visible crosses the 10% threshold.
        vp.scroll_by(100.0);
        let entries = vp.take_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_intersecting);
        assert_eq!(set.apply(entries[0]), Some(true));
    }

    #[test]
    fn negative_margin_delays_intersection() {
        let mut vp = ViewportPlatform::new(100.0, 100.0);
        vp.set_target_rect("card", Rect::new(0.0, 90.0, 100.0, 100.0));
        let mut set = ObserverSet::new();
        set.attach("card", opts(0.0, "0px"), &mut vp);
        set.attach("card", opts(0.0, "-20px 0px"), &mut vp);
        let entries = vp.take_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_intersecting);
        assert!(!entries[1].is_intersecting);
    }

    #[test]
    fn detach_stops_updates_and_discards_late_entries() {
        let mut vp = ViewportPlatform::new(100.0, 100.0);
        vp.set_target_rect("card", Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut set = ObserverSet::new();
        let id = set.attach("card", opts(0.1, "0px"), &mut vp).id;
        set.detach(id, &mut vp);
        assert!(vp.take_entries().is_empty());
        assert!(set.is_empty());
        let late = IntersectionEntry {
            observation: id,
            is_intersecting: true,
        };
        assert_eq!(set.apply(late), None);
        // Second detach is harmless.
        set.detach(id, &mut vp);
    }
}
