// Scale-Up Report Types
// Structured output written alongside expanded scenarios

use serde::Serialize;
use smrs_scaleup::{PopulationRow, VisualSize};

// ─── Curve Summary ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CurveSummary {
    pub units: usize,
    pub first: Option<f64>,
    pub last: Option<f64>,
    pub non_increasing: bool,
    pub non_decreasing: bool,
}

impl CurveSummary {
    pub fn from_curve(curve: &[f64]) -> Self {
        Self {
            units: curve.len(),
            first: curve.first().copied(),
            last: curve.last().copied(),
            non_increasing: curve.windows(2).all(|w| w[1] <= w[0]),
            non_decreasing: curve.windows(2).all(|w| w[1] >= w[0]),
        }
    }
}

// ─── Per-Configuration Entry ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationReport {
    pub population: PopulationRow,
    pub buyer_values: Option<CurveSummary>,
    pub seller_costs: Option<CurveSummary>,
    pub book_limit: Option<f64>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ScaleUpReport {
    pub title: String,
    pub policy: Option<&'static str>,
    pub factor: Option<usize>,
    pub periods: Option<u64>,
    pub visual_size: Option<VisualSize>,
    pub configurations: Vec<ConfigurationReport>,
}
