// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Scale-Up Suite - Run-Time Estimator
//
// Projects the wall-clock cost of a full run from the per-period timings of a
// short calibration run. The first recorded sample carries simulator warm-up
// and is used as a fixed offset; the remaining samples give the steady-state
// per-period rate.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PeriodTimers
// ---------------------------------------------------------------------------

/// Cumulative elapsed milliseconds indexed by period number.
///
/// Index 0 is normally empty because the simulator reports periods from 1.
/// Gaps are kept as `None` so `len()` matches the highest recorded period + 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTimers {
    samples: Vec<Option<f64>>,
}

impl PeriodTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the cumulative elapsed time observed at the end of `period`.
    pub fn record(&mut self, period: usize, elapsed_ms: f64) {
        if self.samples.len() <= period {
            self.samples.resize(period + 1, None);
        }
        self.samples[period] = Some(elapsed_ms);
    }

    /// Drop every sample ahead of a new calibration run.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, period: usize) -> Option<f64> {
        self.samples.get(period).copied().flatten()
    }

    pub fn samples(&self) -> &[Option<f64>] {
        &self.samples
    }
}

impl From<Vec<Option<f64>>> for PeriodTimers {
    fn from(samples: Vec<Option<f64>>) -> Self {
        Self { samples }
    }
}

impl FromIterator<Option<f64>> for PeriodTimers {
    fn from_iter<I: IntoIterator<Item = Option<f64>>>(iter: I) -> Self {
        Self { samples: iter.into_iter().collect() }
    }
}

// ---------------------------------------------------------------------------
// RunEstimate
// ---------------------------------------------------------------------------

/// Projected run time, or `Unknown` when the samples cannot support a guess.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ms", rename_all = "lowercase")]
pub enum RunEstimate {
    Unknown,
    Millis(f64),
}

impl RunEstimate {
    pub fn millis(&self) -> Option<f64> {
        match *self {
            Self::Millis(ms) => Some(ms),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whole seconds, rounded.
    pub fn seconds(&self) -> Option<f64> {
        self.millis().map(|ms| (ms / 1000.0).round())
    }

    /// Whole minutes, rounded up from the rounded seconds.
    pub fn minutes(&self) -> Option<f64> {
        self.seconds().map(|s| (s / 60.0).ceil())
    }
}

/// `~Nmin` above one minute, `~Nsec` otherwise, `?` when unknown.
impl fmt::Display for RunEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.seconds(), self.minutes()) {
            (Some(_), Some(minutes)) if minutes > 1.0 => write!(f, "~{}min", minutes),
            (Some(seconds), _) => write!(f, "~{}sec", seconds),
            _ => write!(f, "?"),
        }
    }
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Linear projection of total run time in milliseconds.
///
/// With more than two slots: `periods * configurations * rate + timers[1]`
/// where `rate = (timers[l-1] - timers[1]) / (l - 2)`. With exactly two slots
/// the single sample is used as the rate. Anything else, zero requested
/// periods, or missing anchor samples yields `Unknown`.
pub fn estimate(timers: &PeriodTimers, requested_periods: u64, configurations: u32) -> RunEstimate {
    if requested_periods == 0 || configurations == 0 {
        return RunEstimate::Unknown;
    }
    let scale = requested_periods as f64 * configurations as f64;
    let l = timers.len();
    let guess = if l > 2 {
        match (timers.get(1), timers.get(l - 1)) {
            (Some(first), Some(last)) => {
                let rate = (last - first) / (l - 2) as f64;
                scale * rate + first
            }
            _ => return RunEstimate::Unknown,
        }
    } else if l == 2 {
        match timers.get(1) {
            Some(first) => scale * first,
            None => return RunEstimate::Unknown,
        }
    } else {
        return RunEstimate::Unknown;
    };

    if guess.is_finite() {
        RunEstimate::Millis(guess)
    } else {
        RunEstimate::Unknown
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
