//! Input contracts for the core engine.
//!
//! Adapters collect platform intersection entries and counter commands during
//! a frame and pass them into Engine::update() once per frame.

use serde::{Deserialize, Serialize};

use crate::ids::CounterId;
use crate::observer::IntersectionEntry;
use crate::tween::CounterSpec;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Inputs {
    /// Visibility changes reported by the platform since the last frame.
    #[serde(default)]
    pub intersections: Vec<IntersectionEntry>,
    /// Counter commands applied before intersections.
    #[serde(default)]
    pub counter_cmds: Vec<CounterCommand>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterCommand {
    /// Only valid for counters with an explicit gate; element-gated counters
    /// follow their element.
    SetGate { counter: CounterId, open: bool },
    SetSpec { counter: CounterId, spec: CounterSpec },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_commands_use_camel_case_tags() {
        let inputs: Inputs = serde_json::from_str(
            r#"{ "counter_cmds": [
                { "setGate": { "counter": 0, "open": true } },
                { "setSpec": { "counter": 1, "spec": { "end_value": 50.0 } } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(
            inputs.counter_cmds[0],
            CounterCommand::SetGate {
                counter: CounterId(0),
                open: true
            }
        );
        assert!(matches!(
            &inputs.counter_cmds[1],
            CounterCommand::SetSpec { counter, spec } if *counter == CounterId(1) && spec.end_value == 50.0
        ));
        let json = serde_json::to_value(&inputs.counter_cmds[0]).unwrap();
        assert!(json.get("setGate").is_some());
    }
}
