//! Trigger policy: raw visibility -> stable triggered flag.
//!
//! [`next_state`] is the only state machine in the core. With fire-once the
//! first intersection latches; without it the state follows the latest
//! observation.

use serde::{Deserialize, Serialize};

use crate::config::TriggerDefaults;
use crate::error::MotionError;
use crate::geometry::RootMargin;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Visible fraction of the element required to count as intersecting.
    pub threshold: f32,
    /// CSS-like margin applied to the viewport, e.g. "-100px 0px".
    pub root_margin: String,
    pub fire_once: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        TriggerDefaults::default().into()
    }
}

impl From<TriggerDefaults> for TriggerConfig {
    fn from(d: TriggerDefaults) -> Self {
        Self {
            threshold: d.threshold,
            root_margin: d.root_margin,
            fire_once: d.fire_once,
        }
    }
}

impl TriggerConfig {
    /// Strict constructor: rejects thresholds outside [0, 1] and unparseable margins.
    pub fn new(threshold: f32, root_margin: &str, fire_once: bool) -> Result<Self, MotionError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(MotionError::InvalidThreshold(threshold as f64));
        }
        RootMargin::parse(root_margin)?;
        Ok(Self {
            threshold,
            root_margin: root_margin.to_string(),
            fire_once,
        })
    }

    /// Lenient constructor used by the engine: bad values fall back to the
    /// given defaults with a warning.
    pub fn lenient(self, defaults: &TriggerDefaults) -> Self {
        let threshold = if self.threshold.is_finite() {
            self.threshold.clamp(0.0, 1.0)
        } else {
            log::warn!(
                "trigger threshold {} is not finite; using {}",
                self.threshold,
                defaults.threshold
            );
            defaults.threshold
        };
        let root_margin = match RootMargin::parse(&self.root_margin) {
            Ok(_) => self.root_margin,
            Err(e) => {
                log::warn!("{e}; using '{}'", defaults.root_margin);
                defaults.root_margin.clone()
            }
        };
        Self {
            threshold,
            root_margin,
            fire_once: self.fire_once,
        }
    }

    /// Parsed margin; malformed strings resolve to a zero margin.
    pub fn margin(&self) -> RootMargin {
        RootMargin::parse(&self.root_margin).unwrap_or_default()
    }
}

/// Per-element trigger settings. Unset fields come from the engine's
/// configured [`TriggerDefaults`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_margin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fire_once: Option<bool>,
}

impl TriggerOverrides {
    /// Fill unset fields from `defaults`.
    pub fn over(self, defaults: &TriggerDefaults) -> TriggerConfig {
        TriggerConfig {
            threshold: self.threshold.unwrap_or(defaults.threshold),
            root_margin: self
                .root_margin
                .unwrap_or_else(|| defaults.root_margin.clone()),
            fire_once: self.fire_once.unwrap_or(defaults.fire_once),
        }
    }
}

impl From<TriggerConfig> for TriggerOverrides {
    fn from(cfg: TriggerConfig) -> Self {
        Self {
            threshold: Some(cfg.threshold),
            root_margin: Some(cfg.root_margin),
            fire_once: Some(cfg.fire_once),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerState {
    pub has_fired: bool,
    pub currently_visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerPhase {
    NeverTriggered,
    Visible,
    /// Only reachable when the trigger is repeatable.
    HiddenAgain,
}

impl TriggerState {
    /// Resolved trigger: fired-once latches, repeatable follows visibility.
    #[inline]
    pub fn is_triggered(&self, fire_once: bool) -> bool {
        if fire_once {
            self.has_fired
        } else {
            self.currently_visible
        }
    }

    pub fn phase(&self, fire_once: bool) -> TriggerPhase {
        if !self.has_fired {
            TriggerPhase::NeverTriggered
        } else if fire_once || self.currently_visible {
            TriggerPhase::Visible
        } else {
            TriggerPhase::HiddenAgain
        }
    }
}

/// Fold one observation into the trigger state.
pub fn next_state(prev: TriggerState, is_intersecting: bool, fire_once: bool) -> TriggerState {
    if fire_once && prev.has_fired {
        return prev;
    }
    TriggerState {
        has_fired: prev.has_fired || is_intersecting,
        currently_visible: is_intersecting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_once_latches_and_ignores_later_updates() {
        let mut s = TriggerState::default();
        s = next_state(s, true, true);
        assert!(s.has_fired && s.currently_visible);
        let after = next_state(s, false, true);
        assert_eq!(after, s);
        assert_eq!(after.phase(true), TriggerPhase::Visible);
    }

    #[test]
    fn repeatable_walks_all_phases() {
        let mut s = TriggerState::default();
        assert_eq!(s.phase(false), TriggerPhase::NeverTriggered);
        s = next_state(s, true, false);
        assert_eq!(s.phase(false), TriggerPhase::Visible);
        s = next_state(s, false, false);
        assert_eq!(s.phase(false), TriggerPhase::HiddenAgain);
        assert!(!s.is_triggered(false));
        s = next_state(s, true, false);
        assert_eq!(s.phase(false), TriggerPhase::Visible);
    }

    #[test]
    fn never_visible_stays_untriggered() {
        let mut s = TriggerState::default();
        for _ in 0..5 {
            s = next_state(s, false, true);
        }
        assert_eq!(s.phase(true), TriggerPhase::NeverTriggered);
        assert!(!s.is_triggered(true));
    }

    #[test]
    fn strict_constructor_validates() {
        assert!(TriggerConfig::new(0.1, "0px", true).is_ok());
        assert_eq!(
            TriggerConfig::new(1.5, "0px", true),
            Err(MotionError::InvalidThreshold(1.5))
        );
        assert!(matches!(
            TriggerConfig::new(0.1, "ten", true),
            Err(MotionError::InvalidRootMargin { .. })
        ));
    }

    #[test]
    fn lenient_clamps_and_falls_back() {
        let defaults = TriggerDefaults::default();
        let cfg = TriggerConfig {
            threshold: 3.0,
            root_margin: "nope".into(),
            fire_once: false,
        }
        .lenient(&defaults);
        assert_eq!(cfg.threshold, 1.0);
        assert_eq!(cfg.root_margin, "0px");
        assert!(!cfg.fire_once);

        let nan = TriggerConfig {
            threshold: f32::NAN,
            ..TriggerConfig::default()
        }
        .lenient(&defaults);
        assert_eq!(nan.threshold, 0.1);
    }

    #[test]
    fn overrides_fill_from_configured_defaults() {
        let defaults = TriggerDefaults {
            threshold: 0.5,
            root_margin: "-50px".into(),
            fire_once: true,
        };
        let partial: TriggerOverrides = serde_json::from_str(r#"{ "fire_once": false }"#).unwrap();
        assert_eq!(
            partial.over(&defaults),
            TriggerConfig {
                threshold: 0.5,
                root_margin: "-50px".into(),
                fire_once: false,
            }
        );
        assert_eq!(
            TriggerOverrides::default().over(&defaults),
            TriggerConfig::from(defaults.clone())
        );
    }
}
