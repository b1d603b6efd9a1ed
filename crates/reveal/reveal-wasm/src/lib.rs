use js_sys::{Function, JSON};
use serde::Serialize;
use serde_wasm_bindgen as swb;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

use reveal_core::{
    Config, CounterCfg, CounterId, ElementCfg, ElementId, Engine, Inputs, ObservationId,
    ObserveOptions, Outputs, VariantRegistry, VisibilityPlatform,
};

#[wasm_bindgen]
pub struct RevealEngine {
    core: Engine,
    platform: JsPlatform,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Outputs carry forwarded JSON maps; serialize them as plain objects.
fn to_js<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("{what} error: {e}")))
}

/// Visibility platform backed by JS callbacks, typically wrapping an
/// IntersectionObserver:
///   observe(observationId, target, { threshold, rootMargin }) -> boolean
///   unobserve(observationId)
/// A missing or throwing observe, or any result other than `true`, degrades
/// the element to always visible.
/// What `observe` receives: the margin in four-value CSS form, ready for
/// `new IntersectionObserver(cb, { threshold, rootMargin })`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsObserveOptions {
    threshold: f32,
    root_margin: String,
}

impl From<&ObserveOptions> for JsObserveOptions {
    fn from(options: &ObserveOptions) -> Self {
        Self {
            threshold: options.threshold,
            root_margin: options.root_margin.to_string(),
        }
    }
}

#[derive(Default)]
struct JsPlatform {
    observe: Option<Function>,
    unobserve: Option<Function>,
}

impl VisibilityPlatform for JsPlatform {
    fn observe(&mut self, observation: ObservationId, target: &str, options: &ObserveOptions) -> bool {
        let Some(f) = &self.observe else {
            return false;
        };
        let Ok(opts) = to_js(&JsObserveOptions::from(options), "observe options") else {
            return false;
        };
        match f.call3(
            &JsValue::UNDEFINED,
            &JsValue::from(observation.0),
            &JsValue::from_str(target),
            &opts,
        ) {
            Ok(val) => val.as_bool() == Some(true),
            Err(_) => false,
        }
    }

    fn unobserve(&mut self, observation: ObservationId) {
        if let Some(f) = &self.unobserve {
            // Nothing useful to do if the host fails to release its observer.
            let _ = f.call1(&JsValue::UNDEFINED, &JsValue::from(observation.0));
        }
    }
}

fn parse_config(config: JsValue) -> Result<Config, JsError> {
    if jsvalue_is_undefined_or_null(&config) {
        Ok(Config::default())
    } else {
        swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))
    }
}

#[wasm_bindgen]
impl RevealEngine {
    /// Create a new engine over the built-in variants. Pass a config object or
    /// undefined/null for defaults.
    /// Example:
    ///   new RevealEngine({ trigger: { threshold: 0.2 }, grouping_separator: "." })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<RevealEngine, JsError> {
        console_error_panic_hook::set_once();
        Ok(RevealEngine {
            core: Engine::new(parse_config(config)?),
            platform: JsPlatform::default(),
        })
    }

    /// Create an engine whose registry is the built-ins plus `catalog`, an
    /// array of variant definitions. The registry is fixed afterwards.
    #[wasm_bindgen(js_name = with_catalog)]
    pub fn with_catalog(config: JsValue, catalog: JsValue) -> Result<RevealEngine, JsError> {
        console_error_panic_hook::set_once();
        let cfg = parse_config(config)?;
        let mut registry = VariantRegistry::with_builtins();
        if !jsvalue_is_undefined_or_null(&catalog) {
            let s = JSON::stringify(&catalog)
                .map_err(|e| JsError::new(&format!("catalog stringify error: {:?}", e)))?
                .as_string()
                .ok_or_else(|| JsError::new("catalog: stringify produced non-string"))?;
            registry.extend_from_json(&s)?;
        }
        Ok(RevealEngine {
            core: Engine::with_registry(cfg, Arc::new(registry)),
            platform: JsPlatform::default(),
        })
    }

    /// Install the visibility callbacks used by later `attach` calls. Either
    /// may be undefined.
    #[wasm_bindgen(js_name = set_platform)]
    pub fn set_platform(&mut self, observe: Option<Function>, unobserve: Option<Function>) {
        self.platform = JsPlatform { observe, unobserve };
    }

    /// Attach an element. `cfg` matches ElementCfg (target, variant,
    /// delay_seconds, trigger, extra, parent). Returns an ElementId (u32).
    #[wasm_bindgen]
    pub fn attach(&mut self, cfg: JsValue) -> Result<u32, JsError> {
        let cfg: ElementCfg = if jsvalue_is_undefined_or_null(&cfg) {
            ElementCfg::default()
        } else {
            swb::from_value(cfg).map_err(|e| JsError::new(&format!("element cfg error: {e}")))?
        };
        Ok(self.core.attach_element(cfg, &mut self.platform).0)
    }

    #[wasm_bindgen]
    pub fn detach(&mut self, id: u32) {
        self.core.detach_element(ElementId(id), &mut self.platform);
    }

    /// Attach a counter. `cfg` matches CounterCfg. Returns a CounterId (u32).
    #[wasm_bindgen(js_name = attach_counter)]
    pub fn attach_counter(&mut self, cfg: JsValue) -> Result<u32, JsError> {
        let cfg: CounterCfg = if jsvalue_is_undefined_or_null(&cfg) {
            CounterCfg::default()
        } else {
            swb::from_value(cfg).map_err(|e| JsError::new(&format!("counter cfg error: {e}")))?
        };
        Ok(self.core.attach_counter(cfg).0)
    }

    #[wasm_bindgen(js_name = detach_counter)]
    pub fn detach_counter(&mut self, id: u32) {
        self.core.detach_counter(CounterId(id));
    }

    /// Observation id passed to `observe` for this element, if it has one.
    #[wasm_bindgen(js_name = observation_of)]
    pub fn observation_of(&self, id: u32) -> Option<u32> {
        self.core.observation_of(ElementId(id)).map(|o| o.0)
    }

    /// Step one frame of dt seconds with inputs JSON
    /// ({ intersections: [{ observation, is_intersecting }],
    ///   counter_cmds: [{ setGate: { counter, open } }] }).
    /// Returns Outputs JSON.
    #[wasm_bindgen]
    pub fn update(&mut self, dt: f32, inputs_json: JsValue) -> Result<JsValue, JsError> {
        let inputs: Inputs = if jsvalue_is_undefined_or_null(&inputs_json) {
            Inputs::default()
        } else {
            swb::from_value(inputs_json).map_err(|e| JsError::new(&format!("inputs error: {e}")))?
        };
        let out: &Outputs = self.core.update(dt, inputs);
        to_js(out, "outputs")
    }

    /// The definition `name` resolves to (unknown names give fadeInUp).
    #[wasm_bindgen(js_name = resolve_variant)]
    pub fn resolve_variant(&self, name: &str) -> Result<JsValue, JsError> {
        to_js(self.core.registry().resolve(name), "variant")
    }

    #[wasm_bindgen(js_name = variant_names)]
    pub fn variant_names(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.registry().names(), "variant names")
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
