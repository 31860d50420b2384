#![cfg(target_arch = "wasm32")]

use serde::Serialize;
use serde_json::json;
use smrs_scaleup::{js_duplicate, js_estimate_time, js_expand_scenario, js_format_estimate, js_interpolate, CalibrationTimer};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn duplicate_from_js() {
    assert_eq!(js_duplicate(vec![10.0, 8.0, 5.0], 3.0).unwrap(), vec![10.0, 10.0, 10.0, 8.0, 8.0, 8.0, 5.0, 5.0, 5.0]);
    assert!(js_duplicate(vec![1.0], 0.5).is_err());
}

#[wasm_bindgen_test]
fn interpolate_from_js() {
    assert_eq!(js_interpolate(vec![10.0, 4.0], 2.0).unwrap(), vec![10.0, 7.0, 4.0, 4.0]);
    assert!(js_interpolate(vec![], 2.0).is_err());
}

#[wasm_bindgen_test]
fn estimate_accepts_holes() {
    let timers = js_sys_array(&[None, Some(500.0), Some(900.0), Some(1300.0)]);
    assert_eq!(js_estimate_time(timers, 50.0, None), Some(20_500.0));
    assert_eq!(js_format_estimate(Some(20_500.0)), "~21sec");
    assert_eq!(js_format_estimate(None), "?");
}

#[wasm_bindgen_test]
fn calibration_timer_stops_runs() {
    let mut timer = CalibrationTimer::new(None, None);
    assert_eq!(timer.max_periods(), 5);
    assert!(!timer.mark(1, 600.0));
    assert!(timer.mark(2, 5200.0));
    assert_eq!(timer.estimate(10, None), Some(10.0 * (5200.0 - 600.0) + 600.0));
}

#[wasm_bindgen_test]
fn expand_scenario_keeps_plain_objects() {
    let doc = json!({
        "title": "t",
        "common": {"periods": 10},
        "configurations": [{"buyerValues": [3, 1], "numberOfBuyers": 2, "numberOfSellers": 2, "L": 1}]
    });
    let value = doc.serialize(&serde_wasm_bindgen::Serializer::json_compatible()).unwrap();
    let out = js_expand_scenario(value, "interpolate", 2.0).unwrap();
    let back: serde_json::Value = serde_wasm_bindgen::from_value(out).unwrap();
    assert_eq!(back["title"], "t x2");
    let values: Vec<f64> = back["configurations"][0]["buyerValues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(serde_json::Value::as_f64)
        .collect();
    assert_eq!(values, vec![3.0, 2.0, 1.0, 1.0]);
    assert_eq!(back["configurations"][0]["L"].as_f64(), Some(1.0));
}

fn js_sys_array(values: &[Option<f64>]) -> JsValue {
    serde_wasm_bindgen::to_value(values).unwrap()
}
