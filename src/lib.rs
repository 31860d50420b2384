// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Scale-Up Suite

pub mod types;
pub mod expand;
pub mod estimate;
pub mod calibration;
pub mod scenario;
pub mod collab;
pub mod controller;

pub use types::*;
pub use expand::{duplicate, interpolate, ExpandError, ExpansionFactor, ExpansionPolicy};
pub use estimate::{estimate, PeriodTimers, RunEstimate};
pub use controller::ScaleUpApp;

use calibration::{CalibrationLimits, CalibrationMonitor};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(s: &str);
}

fn console(s: &str) {
    #[cfg(target_arch = "wasm32")]
    console_log(s);
    #[cfg(not(target_arch = "wasm32"))]
    log::info!("{}", s);
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
}

/// Plain objects rather than ES `Map`s, so documents stay JSON-shaped in JS.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn js_error<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Repeat each unit of `curve` `factor` times.
#[wasm_bindgen(js_name = duplicate)]
pub fn js_duplicate(curve: Vec<f64>, factor: f64) -> Result<Vec<f64>, JsValue> {
    let factor = ExpansionFactor::try_from(factor).map_err(js_error)?;
    Ok(duplicate(&curve, factor))
}

/// Linearly fill `factor` points per unit of `curve`.
#[wasm_bindgen(js_name = interpolate)]
pub fn js_interpolate(curve: Vec<f64>, factor: f64) -> Result<Vec<f64>, JsValue> {
    let factor = ExpansionFactor::try_from(factor).map_err(js_error)?;
    interpolate(&curve, factor).map_err(js_error)
}

/// Scale a whole scenario object. `policy` is "duplicate" or "interpolate".
#[wasm_bindgen(js_name = expandScenario)]
pub fn js_expand_scenario(scenario: JsValue, policy: &str, factor: f64) -> Result<JsValue, JsValue> {
    let study: Scenario = serde_wasm_bindgen::from_value(scenario)?;
    let policy: ExpansionPolicy = policy.parse().map_err(|e: String| JsValue::from_str(&e))?;
    let factor = ExpansionFactor::try_from(factor).map_err(js_error)?;
    let expanded = scenario::expand_scenario(&study, policy, factor).map_err(js_error)?;
    to_js(&expanded)
}

/// Check that a restored document has scenario shape; returns it normalized.
#[wasm_bindgen(js_name = validateScenario)]
pub fn js_validate_scenario(doc: JsValue) -> Result<JsValue, JsValue> {
    let doc: serde_json::Value = serde_wasm_bindgen::from_value(doc)?;
    match scenario::validate_restored(&doc) {
        Ok(s) => to_js(&s),
        Err(e) => {
            console(&format!("trashed item is not a valid scenario: {}", e));
            Err(js_error(e))
        }
    }
}

/// Common-merged, book-adjusted configurations ready for the simulator.
#[wasm_bindgen(js_name = runnableConfigurations)]
pub fn js_runnable_configurations(scenario: JsValue) -> Result<JsValue, JsValue> {
    let study: Scenario = serde_wasm_bindgen::from_value(scenario)?;
    let configs = scenario::runnable_configurations(&study);
    to_js(&configs)
}

/// Projected milliseconds, or `undefined` when no estimate is possible.
/// `timers` may contain holes (`undefined`/`null`).
#[wasm_bindgen(js_name = estimateTime)]
pub fn js_estimate_time(timers: JsValue, requested_periods: f64, configurations: Option<u32>) -> Option<f64> {
    let samples: Vec<Option<f64>> = serde_wasm_bindgen::from_value(timers).unwrap_or_default();
    let periods = if requested_periods.is_finite() && requested_periods > 0.0 {
        requested_periods.floor() as u64
    } else {
        0
    };
    estimate(&PeriodTimers::from(samples), periods, configurations.unwrap_or(1)).millis()
}

/// "~Nmin", "~Nsec" or "?".
#[wasm_bindgen(js_name = formatEstimate)]
pub fn js_format_estimate(ms: Option<f64>) -> String {
    ms.map_or(RunEstimate::Unknown, RunEstimate::Millis).to_string()
}

#[wasm_bindgen(js_name = progressText)]
pub fn js_progress_text(period: u32, periods: u32) -> String {
    scenario::progress_text(period as u64, periods as u64)
}

/// "small", "medium" or "large".
#[wasm_bindgen(js_name = visualSize)]
pub fn js_visual_size(periods: u32) -> String {
    match scenario::VisualThresholds::default().classify(periods as u64) {
        VisualSize::Small => "small",
        VisualSize::Medium => "medium",
        VisualSize::Large => "large",
    }
    .to_string()
}

// ─── Calibration from a JS update callback ───────────────────────────────────

/// Wraps `CalibrationMonitor` for a simulator running in JS: call `mark` from
/// the per-period update callback and set the simulation's period target to
/// zero when it returns true.
#[wasm_bindgen]
pub struct CalibrationTimer {
    monitor: CalibrationMonitor,
}

#[wasm_bindgen]
impl CalibrationTimer {
    #[wasm_bindgen(constructor)]
    pub fn new(max_elapsed_ms: Option<f64>, max_periods: Option<u32>) -> Self {
        install_panic_hook();
        let defaults = CalibrationLimits::default();
        Self {
            monitor: CalibrationMonitor::new(CalibrationLimits {
                max_elapsed_ms: max_elapsed_ms.unwrap_or(defaults.max_elapsed_ms),
                max_periods: max_periods.map_or(defaults.max_periods, u64::from),
            }),
        }
    }

    /// Period count the trial run should be configured with.
    #[wasm_bindgen(getter, js_name = maxPeriods)]
    pub fn max_periods(&self) -> u32 {
        self.monitor.limits().max_periods.min(u32::MAX as u64) as u32
    }

    pub fn mark(&mut self, period: u32, elapsed_ms: f64) -> bool {
        self.monitor.mark(period as u64, elapsed_ms).should_stop()
    }

    pub fn reset(&mut self) {
        self.monitor.reset();
    }

    pub fn timers(&self) -> JsValue {
        to_js(&self.monitor.timers().samples()).unwrap_or(JsValue::NULL)
    }

    /// Projected milliseconds for `requested_periods`, `undefined` if unknown.
    pub fn estimate(&self, requested_periods: u32, configurations: Option<u32>) -> Option<f64> {
        let estimate = estimate(
            self.monitor.timers(),
            requested_periods as u64,
            configurations.unwrap_or(1),
        );
        console(&format!("estimated running time {}", estimate));
        estimate.millis()
    }
}
