// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Scale-Up Suite - Calibration Run
//
// Times a short trial of a scenario so the estimator has samples to work
// from. The trial is bounded twice: the period count is capped up front, and
// any simulation still running once the wall-clock ceiling is passed has its
// target lowered to zero so the engine stops at the next period boundary.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::collab::{Simulation, SimulationEngine};
use crate::estimate::PeriodTimers;
use crate::scenario::runnable_configurations;
use crate::types::Scenario;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationLimits {
    /// Stop once this much wall-clock time has elapsed.
    pub max_elapsed_ms: f64,
    /// Period count the trial is run for.
    pub max_periods: u64,
}

impl Default for CalibrationLimits {
    fn default() -> Self {
        Self {
            max_elapsed_ms: 5000.0,
            max_periods: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Millisecond clock. Only differences between readings are used.
pub trait PeriodClock {
    fn now_ms(&self) -> f64;
}

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Date, js_name = now)]
    fn date_now() -> f64;
}

/// `Date.now()` in the browser, a monotonic `Instant` natively.
#[derive(Debug, Clone)]
pub struct SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodClock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        date_now()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// What the monitor asks of the simulation after a period completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodVerdict {
    Continue,
    /// The wall-clock ceiling was passed.
    TimeLimit,
    /// The period ceiling was reached.
    PeriodLimit,
}

impl PeriodVerdict {
    pub fn should_stop(self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Per-period hook for a calibration run driven from outside, e.g. by a
/// simulator's update callback.
#[derive(Debug, Clone, Default)]
pub struct CalibrationMonitor {
    limits: CalibrationLimits,
    timers: PeriodTimers,
}

impl CalibrationMonitor {
    pub fn new(limits: CalibrationLimits) -> Self {
        Self {
            limits,
            timers: PeriodTimers::new(),
        }
    }

    pub fn limits(&self) -> &CalibrationLimits {
        &self.limits
    }

    /// Record that `period` finished `elapsed_ms` after the run started.
    pub fn mark(&mut self, period: u64, elapsed_ms: f64) -> PeriodVerdict {
        self.timers.record(period as usize, elapsed_ms);
        if elapsed_ms > self.limits.max_elapsed_ms {
            PeriodVerdict::TimeLimit
        } else if period >= self.limits.max_periods {
            PeriodVerdict::PeriodLimit
        } else {
            PeriodVerdict::Continue
        }
    }

    pub fn timers(&self) -> &PeriodTimers {
        &self.timers
    }

    pub fn reset(&mut self) {
        self.timers.reset();
    }

    pub fn into_timers(self) -> PeriodTimers {
        self.timers
    }
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub timers: PeriodTimers,
    pub configurations: usize,
    /// True when the wall-clock ceiling cut the trial short.
    pub stopped_early: bool,
}

/// Run every configuration of `scenario` for at most `limits.max_periods`
/// periods, recording cumulative elapsed time per period into `timers`.
///
/// Simulations are advanced round-robin, one period each, so the samples
/// reflect all configurations running side by side. The scenario itself is
/// not modified.
pub fn calibrate(
    engine: &dyn SimulationEngine,
    scenario: &Scenario,
    clock: &dyn PeriodClock,
    limits: &CalibrationLimits,
    timers: &mut PeriodTimers,
) -> CalibrationReport {
    let mut trial = scenario.clone();
    trial.common.periods = Some(limits.max_periods);

    let mut sims: Vec<Box<dyn Simulation>> = runnable_configurations(&trial)
        .iter()
        .map(|c| engine.create(c))
        .collect();
    let configurations = sims.len();

    let mut monitor = CalibrationMonitor::new(*limits);
    let t0 = clock.now_ms();
    let mut stopped_early = false;
    let mut active: Vec<bool> = vec![true; sims.len()];

    while active.iter().any(|&a| a) {
        for (sim, running) in sims.iter_mut().zip(active.iter_mut()) {
            if !*running {
                continue;
            }
            let before = sim.period();
            *running = sim.step();
            // a step that completes no period must not overwrite its sample
            if sim.period() <= before {
                continue;
            }
            let verdict = monitor.mark(sim.period(), clock.now_ms() - t0);
            if verdict.should_stop() && sim.periods() != 0 {
                stopped_early |= verdict == PeriodVerdict::TimeLimit;
                sim.set_periods(0);
            }
        }
    }

    *timers = monitor.into_timers();
    debug!("simulation period timers {:?}", timers.samples());
    CalibrationReport {
        timers: timers.clone(),
        configurations,
        stopped_early,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SimConfig;
    use std::cell::Cell;

    /// Advances a fixed amount on every reading.
    struct StepClock {
        now: Cell<f64>,
        step: f64,
    }

    impl PeriodClock for StepClock {
        fn now_ms(&self) -> f64 {
            let t = self.now.get();
            self.now.set(t + self.step);
            t
        }
    }

    struct CountingSim {
        period: u64,
        periods: u64,
    }

    impl Simulation for CountingSim {
        fn period(&self) -> u64 {
            self.period
        }
        fn periods(&self) -> u64 {
            self.periods
        }
        fn set_periods(&mut self, periods: u64) {
            self.periods = periods;
        }
        fn step(&mut self) -> bool {
            if self.period >= self.periods {
                return false;
            }
            self.period += 1;
            self.period < self.periods
        }
        fn drop_logs(&mut self, _names: &[&str]) {}
        fn logs(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    struct CountingEngine;

    impl SimulationEngine for CountingEngine {
        fn create(&self, config: &SimConfig) -> Box<dyn Simulation> {
            Box::new(CountingSim {
                period: 0,
                periods: config.periods.unwrap_or(0),
            })
        }
    }

    fn scenario(n: usize) -> Scenario {
        let mut s = Scenario::new("trial");
        s.common.periods = Some(1000);
        s.configurations = vec![SimConfig::default(); n];
        s
    }

    #[test]
    fn test_period_cap_applies() {
        let clock = StepClock { now: Cell::new(0.0), step: 10.0 };
        let mut timers = PeriodTimers::new();
        let report = calibrate(&CountingEngine, &scenario(1), &clock, &CalibrationLimits::default(), &mut timers);
        assert_eq!(timers.len(), 6);
        assert_eq!(timers.get(0), None);
        assert!(timers.get(5).is_some());
        assert!(!report.stopped_early);
        assert_eq!(report.configurations, 1);
    }

    #[test]
    fn test_time_ceiling_stops_early() {
        let clock = StepClock { now: Cell::new(0.0), step: 3000.0 };
        let mut timers = PeriodTimers::new();
        let report = calibrate(&CountingEngine, &scenario(1), &clock, &CalibrationLimits::default(), &mut timers);
        assert!(report.stopped_early);
        assert!(timers.len() < 6);
    }

    #[test]
    fn test_stopped_sims_keep_their_samples() {
        // reads: start 0, A p1 3000, B p1 6000 (stop B), A p2 9000 (stop A)
        let clock = StepClock { now: Cell::new(0.0), step: 3000.0 };
        let mut timers = PeriodTimers::new();
        let report = calibrate(&CountingEngine, &scenario(2), &clock, &CalibrationLimits::default(), &mut timers);
        assert!(report.stopped_early);
        assert_eq!(timers.samples(), &[None, Some(6000.0), Some(9000.0)]);
    }

    #[test]
    fn test_timers_reset_between_runs() {
        let clock = StepClock { now: Cell::new(0.0), step: 1.0 };
        let mut timers = PeriodTimers::from(vec![None; 40]);
        calibrate(&CountingEngine, &scenario(2), &clock, &CalibrationLimits::default(), &mut timers);
        assert_eq!(timers.len(), 6);
    }

    #[test]
    fn test_scenario_not_modified() {
        let clock = StepClock { now: Cell::new(0.0), step: 1.0 };
        let s = scenario(1);
        let mut timers = PeriodTimers::new();
        calibrate(&CountingEngine, &s, &clock, &CalibrationLimits::default(), &mut timers);
        assert_eq!(s.common.periods, Some(1000));
    }

    #[test]
    fn test_monitor_verdicts() {
        let mut monitor = CalibrationMonitor::new(CalibrationLimits { max_elapsed_ms: 2000.0, max_periods: 5 });
        assert_eq!(monitor.mark(1, 400.0), PeriodVerdict::Continue);
        assert_eq!(monitor.mark(2, 2500.0), PeriodVerdict::TimeLimit);
        assert_eq!(monitor.mark(5, 100.0), PeriodVerdict::PeriodLimit);
        assert_eq!(monitor.timers().get(2), Some(2500.0));
        monitor.reset();
        assert!(monitor.timers().is_empty());
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
