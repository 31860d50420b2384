// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Scale-Up Suite - Type Definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── SimConfig ───────────────────────────────────────────────────────────────

/// One market configuration as understood by the external simulator.
///
/// Only the fields this crate reads or rewrites are typed; everything else the
/// simulator accepts is carried through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_values: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_costs: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_buyers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_sellers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods: Option<u64>,
    #[serde(default, rename = "bookfixed", skip_serializing_if = "Option::is_none")]
    pub book_fixed: Option<u32>,
    #[serde(default, rename = "booklimit", skip_serializing_if = "Option::is_none")]
    pub book_limit: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SimConfig {
    /// Numeric value of an untyped simulator field, if present and a number.
    pub fn number_field(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(Value::as_f64)
    }

    /// Overlay `common` onto this configuration; fields set in `common` win.
    pub fn overlay(&self, common: &SimConfig) -> SimConfig {
        let mut extra = self.extra.clone();
        for (k, v) in &common.extra {
            extra.insert(k.clone(), v.clone());
        }
        SimConfig {
            buyer_values: common.buyer_values.clone().or_else(|| self.buyer_values.clone()),
            seller_costs: common.seller_costs.clone().or_else(|| self.seller_costs.clone()),
            number_of_buyers: common.number_of_buyers.or(self.number_of_buyers),
            number_of_sellers: common.number_of_sellers.or(self.number_of_sellers),
            periods: common.periods.or(self.periods),
            book_fixed: common.book_fixed.or(self.book_fixed),
            book_limit: common.book_limit.or(self.book_limit),
            extra,
        }
    }
}

// ─── Scenario ────────────────────────────────────────────────────────────────

/// A titled study: shared `common` settings plus one or more configurations
/// that are run side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub title: String,
    #[serde(default)]
    pub common: SimConfig,
    #[serde(default)]
    pub configurations: Vec<SimConfig>,
}

impl Scenario {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Requested period count from the common settings.
    pub fn periods(&self) -> Option<u64> {
        self.common.periods
    }
}

// ─── PopulationRow ───────────────────────────────────────────────────────────

/// One row of the scale-up population table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRow {
    pub index: usize,
    pub number_of_buyers: Option<u32>,
    pub number_of_sellers: Option<u32>,
}

// ─── VisualSize ──────────────────────────────────────────────────────────────

/// Visual set chosen by run length; long runs get coarser plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualSize {
    Small,
    Medium,
    Large,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
