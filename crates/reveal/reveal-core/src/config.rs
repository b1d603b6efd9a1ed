//! Core configuration for reveal-core.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::MotionError;

/// Engine-wide defaults and limits. Every field has a default, so hosts can
/// pass a partial JSON object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for elements that don't override their trigger.
    pub trigger: TriggerDefaults,
    /// Defaults for counters.
    pub counter: CounterDefaults,
    /// Thousands separator used in counter displays.
    pub grouping_separator: char,
    /// Maximum events to retain per tick; extra events are dropped.
    pub max_events_per_tick: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerDefaults {
    pub threshold: f32,
    pub root_margin: String,
    pub fire_once: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterDefaults {
    pub duration_seconds: f64,
    pub easing: Easing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trigger: TriggerDefaults::default(),
            counter: CounterDefaults::default(),
            grouping_separator: ',',
            max_events_per_tick: 1024,
        }
    }
}

impl Default for TriggerDefaults {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "0px".to_string(),
            fire_once: true,
        }
    }
}

impl Default for CounterDefaults {
    fn default() -> Self {
        Self {
            duration_seconds: 2.0,
            easing: Easing::EaseOut,
        }
    }
}

impl Config {
    pub fn from_json(s: &str) -> Result<Config, MotionError> {
        serde_json::from_str(s).map_err(|e| MotionError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = Config::from_json(r#"{ "trigger": { "fire_once": false } }"#).unwrap();
        assert!(!cfg.trigger.fire_once);
        assert_eq!(cfg.trigger.threshold, 0.1);
        assert_eq!(cfg.trigger.root_margin, "0px");
        assert_eq!(cfg.counter.duration_seconds, 2.0);
        assert_eq!(cfg.grouping_separator, ',');
    }

    #[test]
    fn bad_json_is_config_error() {
        assert!(matches!(
            Config::from_json("{ trigger: 1 }"),
            Err(MotionError::InvalidConfig(_))
        ));
    }
}
