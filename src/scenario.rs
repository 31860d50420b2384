// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Scale-Up Suite - Scenario Operations
//
// Pure transformations on scenario documents: resolving the shared settings,
// fixing the order book size before a run, scaling a whole study up by an
// integer factor, and checking documents restored from the trash.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expand::{expand_curve, scale_population, ExpandError, ExpansionFactor, ExpansionPolicy};
use crate::types::{PopulationRow, Scenario, SimConfig, VisualSize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Book limit used when no improvement rule or explicit limit is numeric.
pub const DEFAULT_BOOK_LIMIT: f64 = 10.0;

/// Fields that may bound the order book size.
const BOOK_LIMIT_FIELDS: [&str; 3] = ["buySellBookLimit", "buyerImprovementRule", "sellerImprovementRule"];

/// Runs longer than this many periods drop their per-order logs.
pub const ORDER_LOG_PERIOD_LIMIT: u64 = 500;

/// Logs dropped from long runs.
pub const PRUNED_LOGS: [&str; 2] = ["buyorder", "sellorder"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario is not a JSON object")]
    NotAnObject,
    #[error("scenario title must be a string")]
    MissingTitle,
    #[error("scenario common settings must be an object")]
    MissingCommon,
    #[error("scenario configurations must be an array")]
    MissingConfigurations,
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Expand(#[from] ExpandError),
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Every configuration with the scenario's common settings laid over it.
pub fn resolve_configurations(scenario: &Scenario) -> Vec<SimConfig> {
    scenario
        .configurations
        .iter()
        .map(|c| c.overlay(&scenario.common))
        .collect()
}

/// Pin the order book size ahead of a run.
///
/// The limit is the largest numeric value among the book limit and the two
/// improvement rules; if none is numeric, or the largest is zero, the
/// default of 10 applies.
pub fn adjust_book(config: &mut SimConfig) {
    config.book_fixed = Some(1);
    let limit = BOOK_LIMIT_FIELDS
        .iter()
        .filter_map(|k| config.number_field(k))
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
    config.book_limit = match limit {
        Some(v) if v != 0.0 && !v.is_nan() => Some(v),
        _ => Some(DEFAULT_BOOK_LIMIT),
    };
}

/// Resolved, book-adjusted configurations ready to hand to the simulator.
pub fn runnable_configurations(scenario: &Scenario) -> Vec<SimConfig> {
    let mut configs = resolve_configurations(scenario);
    configs.iter_mut().for_each(adjust_book);
    configs
}

// ---------------------------------------------------------------------------
// Scale-up
// ---------------------------------------------------------------------------

/// Scale every configuration of `scenario` by `factor`.
///
/// Curves are resampled with `policy`, trader counts above one are
/// multiplied, and the title gains an ` x{factor}` suffix.
pub fn expand_scenario(
    scenario: &Scenario,
    policy: ExpansionPolicy,
    factor: ExpansionFactor,
) -> Result<Scenario, ScenarioError> {
    let mut out = scenario.clone();
    out.title = format!("{} x{}", scenario.title, factor);
    for config in out.configurations.iter_mut() {
        expand_config(config, policy, factor)?;
    }
    info!(
        "expanded '{}' by {} ({}) across {} configuration(s)",
        scenario.title,
        factor,
        policy.name(),
        out.configurations.len()
    );
    Ok(out)
}

fn expand_config(
    config: &mut SimConfig,
    policy: ExpansionPolicy,
    factor: ExpansionFactor,
) -> Result<(), ExpandError> {
    let buyer_values = match &config.buyer_values {
        Some(values) => Some(expand_curve(values, policy, factor)?),
        None => None,
    };
    let seller_costs = match &config.seller_costs {
        Some(costs) => Some(expand_curve(costs, policy, factor)?),
        None => None,
    };
    config.buyer_values = buyer_values;
    config.seller_costs = seller_costs;
    config.number_of_buyers = config.number_of_buyers.map(|n| scale_population(n, factor));
    config.number_of_sellers = config.number_of_sellers.map(|n| scale_population(n, factor));
    Ok(())
}

/// Buyer and seller counts per configuration, after the common overlay.
pub fn population_table(scenario: &Scenario) -> Vec<PopulationRow> {
    resolve_configurations(scenario)
        .into_iter()
        .enumerate()
        .map(|(index, c)| PopulationRow {
            index,
            number_of_buyers: c.number_of_buyers,
            number_of_sellers: c.number_of_sellers,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Restored documents
// ---------------------------------------------------------------------------

/// Accept a document pulled out of the trash only if it has the scenario
/// shape: a string title, an object of common settings and an array of
/// configurations.
pub fn validate_restored(doc: &Value) -> Result<Scenario, ScenarioError> {
    let obj = doc.as_object().ok_or(ScenarioError::NotAnObject)?;
    if !obj.get("title").map_or(false, Value::is_string) {
        return Err(ScenarioError::MissingTitle);
    }
    if !obj.get("common").map_or(false, Value::is_object) {
        return Err(ScenarioError::MissingCommon);
    }
    if !obj.get("configurations").map_or(false, Value::is_array) {
        return Err(ScenarioError::MissingConfigurations);
    }
    Ok(Scenario::deserialize(doc)?)
}

/// Parse a scenario from JSON text, applying the same shape checks as
/// `validate_restored`.
pub fn parse_scenario(text: &str) -> Result<Scenario, ScenarioError> {
    let doc: Value = serde_json::from_str(text)?;
    validate_restored(&doc).map_err(|e| {
        warn!("rejected scenario document: {}", e);
        e
    })
}

// ---------------------------------------------------------------------------
// Presentation policy
// ---------------------------------------------------------------------------

/// Period thresholds separating the visual sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualThresholds {
    pub small_max_periods: u64,
    pub medium_max_periods: u64,
}

impl Default for VisualThresholds {
    fn default() -> Self {
        Self {
            small_max_periods: 50,
            medium_max_periods: 500,
        }
    }
}

impl VisualThresholds {
    pub fn classify(&self, periods: u64) -> VisualSize {
        if periods <= self.small_max_periods {
            VisualSize::Small
        } else if periods <= self.medium_max_periods {
            VisualSize::Medium
        } else {
            VisualSize::Large
        }
    }
}

/// Wrap a selected visual index into a set of `count` visuals.
pub fn visual_slot(selected: usize, count: usize) -> Option<usize> {
    if count == 0 {
        None
    } else {
        Some(selected % count)
    }
}

/// Progress banner shown while a run is in flight; empty once complete.
pub fn progress_text(period: u64, periods: u64) -> String {
    if period < periods {
        let pct = (100.0 * period as f64 / periods as f64).round();
        format!("{}% complete", pct)
    } else {
        String::new()
    }
}

/// Whether a run of `periods` keeps its per-order logs.
pub fn retains_order_logs(periods: u64) -> bool {
    periods <= ORDER_LOG_PERIOD_LIMIT
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
