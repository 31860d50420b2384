// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Scale-Up Suite - Application Controller
//
// Holds the state of one scale-up session (saved studies, the study being
// edited, the latest calibration timings, the selected visual) and sequences
// the calls into the simulator and the store.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::calibration::{calibrate, CalibrationLimits, CalibrationReport, PeriodClock};
use crate::collab::{
    Archiver, ChartRenderer, CompletedRun, ScenarioStore, SimulationEngine, StorageError, TitleEdit, VisualCatalog,
};
use crate::estimate::{estimate, PeriodTimers, RunEstimate};
use crate::expand::{ExpandError, ExpansionFactor, ExpansionPolicy};
use crate::scenario::{
    expand_scenario, population_table, progress_text, retains_order_logs, runnable_configurations,
    validate_restored, visual_slot, ScenarioError, VisualThresholds, PRUNED_LOGS,
};
use crate::types::{PopulationRow, Scenario, SimConfig, VisualSize};

/// Number of trashed items offered for restore.
pub const TRASH_PAGE: usize = 20;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("no scenario is loaded in the editor")]
    NoScenario,
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ---------------------------------------------------------------------------
// Options and state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppOptions {
    pub save_list: String,
    pub trash_list: String,
    #[serde(default)]
    pub limits: CalibrationLimits,
    #[serde(default)]
    pub thresholds: VisualThresholds,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            save_list: "saved".to_string(),
            trash_list: "trash".to_string(),
            limits: CalibrationLimits::default(),
            thresholds: VisualThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub saved: Vec<Scenario>,
    pub chosen: usize,
    /// Current contents of the form editor.
    pub editor: Option<Scenario>,
    pub timers: PeriodTimers,
    pub visual: usize,
}

/// Outcome of one full run, per configuration slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub slot: usize,
    pub periods: u64,
    pub keeps_order_logs: bool,
}

// ---------------------------------------------------------------------------
// ScaleUpApp
// ---------------------------------------------------------------------------

pub struct ScaleUpApp {
    engine: Box<dyn SimulationEngine>,
    store: Box<dyn ScenarioStore>,
    clock: Box<dyn PeriodClock>,
    visuals: Option<Box<dyn VisualCatalog>>,
    options: AppOptions,
    state: AppState,
    /// Simulations from the latest full run, one per configuration slot.
    runs: Vec<CompletedRun>,
}

impl ScaleUpApp {
    pub fn new(
        engine: Box<dyn SimulationEngine>,
        store: Box<dyn ScenarioStore>,
        clock: Box<dyn PeriodClock>,
        options: AppOptions,
    ) -> Self {
        Self {
            engine,
            store,
            clock,
            visuals: None,
            options,
            state: AppState::default(),
            runs: Vec::new(),
        }
    }

    /// Plot finished runs with `visuals`. Without a catalog runs are kept but not drawn.
    pub fn with_visuals(mut self, visuals: Box<dyn VisualCatalog>) -> Self {
        self.visuals = Some(visuals);
        self
    }

    pub fn runs(&self) -> &[CompletedRun] {
        &self.runs
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn editor(&self) -> Option<&Scenario> {
        self.state.editor.as_ref()
    }

    /// Replace the editor contents, as the form editor does on change.
    pub fn set_editor(&mut self, scenario: Scenario) {
        self.state.editor = Some(scenario);
    }

    /// Load the saved list and choose the first study. Returns how many were found.
    pub fn init(&mut self) -> Result<usize, ControllerError> {
        self.state.saved = self.store.list(&self.options.save_list)?;
        if !self.state.saved.is_empty() {
            self.choose(0.0);
        }
        Ok(self.state.saved.len())
    }

    /// Load saved study `n` (clamped into range) into the editor and time it.
    pub fn choose(&mut self, n: f64) {
        let last = self.state.saved.len().saturating_sub(1) as f64;
        let index = if n.is_finite() { n.floor().clamp(0.0, last) } else { 0.0 };
        self.state.chosen = index as usize;
        if let Some(choice) = self.state.saved.get(self.state.chosen).cloned() {
            self.state.editor = Some(choice);
            self.calibrate();
        }
    }

    /// Discard editor changes by reloading the chosen study.
    pub fn undo(&mut self) {
        self.choose(self.state.chosen as f64);
    }

    /// Time a short trial of the editor contents.
    pub fn calibrate(&mut self) -> Option<CalibrationReport> {
        let scenario = self.state.editor.as_ref()?;
        let report = calibrate(
            self.engine.as_ref(),
            scenario,
            self.clock.as_ref(),
            &self.options.limits,
            &mut self.state.timers,
        );
        Some(report)
    }

    /// Projected time for a full run of the editor contents.
    ///
    /// Calibration runs every configuration side by side, so its samples
    /// already cover them all and the configuration multiplier is one.
    pub fn guess_time(&self) -> RunEstimate {
        let periods = self.editor().and_then(Scenario::periods).unwrap_or(0);
        estimate(&self.state.timers, periods, 1)
    }

    pub fn estimated_running_time(&self) -> String {
        self.guess_time().to_string()
    }

    /// Set the requested period count (floored) in the common settings.
    pub fn set_periods(&mut self, n: f64) -> Result<(), ControllerError> {
        let editor = self.state.editor.as_mut().ok_or(ControllerError::NoScenario)?;
        editor.common.periods = Some(n.floor().max(0.0) as u64);
        Ok(())
    }

    /// Scale the editor contents up by `factor` and re-time them.
    pub fn expand(&mut self, policy: ExpansionPolicy, factor: f64) -> Result<(), ControllerError> {
        let factor = ExpansionFactor::try_from(factor)?;
        let current = self.state.editor.as_ref().ok_or(ControllerError::NoScenario)?;
        let expanded = expand_scenario(current, policy, factor)?;
        self.state.editor = Some(expanded);
        self.calibrate();
        Ok(())
    }

    pub fn interpolate(&mut self, factor: f64) -> Result<(), ControllerError> {
        self.expand(ExpansionPolicy::Interpolate, factor)
    }

    pub fn duplicate(&mut self, factor: f64) -> Result<(), ControllerError> {
        self.expand(ExpansionPolicy::Duplicate, factor)
    }

    pub fn population_table(&self) -> Vec<PopulationRow> {
        self.editor().map(population_table).unwrap_or_default()
    }

    /// Visual set size for the editor contents.
    pub fn visual_size(&self) -> Option<VisualSize> {
        self.editor()
            .and_then(Scenario::periods)
            .map(|p| self.options.thresholds.classify(p))
    }

    fn run_size(&self, run: &CompletedRun) -> VisualSize {
        let periods = run.config.periods.unwrap_or_else(|| run.sim.periods());
        self.options.thresholds.classify(periods)
    }

    /// Select visual `n` and redraw every kept run with it.
    pub fn set_visual(&mut self, n: usize, renderer: &mut dyn ChartRenderer) -> usize {
        self.state.visual = n;
        let mut drawn = 0;
        for run in &self.runs {
            if self.show_run(run, renderer) {
                drawn += 1;
            }
        }
        drawn
    }

    /// Index into a visual set of `count` entries for the current selection.
    pub fn visual_slot(&self, count: usize) -> Option<usize> {
        visual_slot(self.state.visual, count)
    }

    /// Titles offered in the visual selector, taken from the latest run.
    pub fn visual_choices(&self) -> Vec<String> {
        match (&self.visuals, self.runs.last()) {
            (Some(catalog), Some(run)) => catalog.titles(self.run_size(run)),
            _ => Vec::new(),
        }
    }

    /// Draw the selected visual of a finished run into `resultPlot{slot}`,
    /// with the run's title edits applied. Returns whether anything was drawn.
    fn show_run(&self, run: &CompletedRun, renderer: &mut dyn ChartRenderer) -> bool {
        let Some(catalog) = self.visuals.as_deref() else {
            return false;
        };
        let size = self.run_size(run);
        let Some(index) = self.visual_slot(catalog.titles(size).len()) else {
            warn!("no {:?} visuals for slot {}", size, run.slot);
            return false;
        };
        let plot = catalog.plot(size, index, run);
        renderer.render(&format!("resultPlot{}", run.slot), &plot, &TitleEdit::for_config(&run.config));
        true
    }

    /// Draw the buyer value and seller cost schedules of each configuration
    /// into `paramPlot{slot}`, plus the first one into `paramPlotScaleUp`.
    pub fn plot_parameters(&self, renderer: &mut dyn ChartRenderer) -> Result<usize, ControllerError> {
        let scenario = self.state.editor.as_ref().ok_or(ControllerError::NoScenario)?;
        let configs = runnable_configurations(scenario);
        for (slot, config) in configs.iter().enumerate() {
            renderer.clear(&format!("paramPlot{}", slot));
            renderer.render(&format!("paramPlot{}", slot), &parameter_plot(config), &[]);
        }
        if let Some(first) = configs.first() {
            let title = TitleEdit::Append(format!(" ({})", scenario.title));
            renderer.render("paramPlotScaleUp", &parameter_plot(first), &[title]);
        }
        Ok(configs.len())
    }

    /// Run every configuration to completion, reporting progress per slot.
    ///
    /// Each slot gets its parameter plot before the run and the selected
    /// visual once finished. Runs longer than the order log limit drop
    /// their order logs up front. Finished simulations replace the ones
    /// kept from the previous run.
    pub fn run<F>(&mut self, renderer: &mut dyn ChartRenderer, mut on_progress: F) -> Result<Vec<RunSummary>, ControllerError>
    where
        F: FnMut(usize, String),
    {
        let configs = runnable_configurations(self.state.editor.as_ref().ok_or(ControllerError::NoScenario)?);
        self.runs.clear();
        let mut summaries = Vec::with_capacity(configs.len());
        for (slot, config) in configs.into_iter().enumerate() {
            renderer.clear(&format!("paramPlot{}", slot));
            renderer.clear(&format!("resultPlot{}", slot));
            renderer.render(&format!("paramPlot{}", slot), &parameter_plot(&config), &[]);

            let mut sim = self.engine.create(&config);
            let keeps_order_logs = retains_order_logs(sim.periods());
            if !keeps_order_logs {
                debug!("slot {}: dropping {:?} for a {} period run", slot, PRUNED_LOGS, sim.periods());
                sim.drop_logs(&PRUNED_LOGS);
            }
            while sim.step() {
                on_progress(slot, progress_text(sim.period(), sim.periods()));
            }
            on_progress(slot, String::new());
            summaries.push(RunSummary {
                slot,
                periods: sim.period(),
                keeps_order_logs,
            });
            self.runs.push(CompletedRun { slot, config, sim });
        }
        for run in &self.runs {
            self.show_run(run, renderer);
        }
        Ok(summaries)
    }

    /// Store the editor contents, replacing the chosen study when the title
    /// is unchanged, then reload the saved list.
    pub fn save(&mut self) -> Result<usize, ControllerError> {
        let current = self.state.editor.clone().ok_or(ControllerError::NoScenario)?;
        if let Some(chosen) = self.state.saved.get(self.state.chosen) {
            if chosen.title == current.title {
                self.store.remove(chosen, &self.options.save_list)?;
            }
        }
        self.store.save(&current, &self.options.save_list)?;
        info!("saved scenario '{}'", current.title);
        self.init()
    }

    /// Move the chosen study to the trash list and choose the first remaining one.
    pub fn move_to_trash(&mut self) -> Result<(), ControllerError> {
        let chosen = self.state.chosen;
        let Some(item) = self.state.saved.get(chosen).cloned() else {
            return Ok(());
        };
        if let Err(e) = self
            .store
            .move_item(&item, &self.options.save_list, &self.options.trash_list)
        {
            warn!("could not move '{}' to trash: {}", item.title, e);
            return Err(e.into());
        }
        self.state.saved.remove(chosen);
        self.choose(0.0);
        Ok(())
    }

    /// The most recently trashed studies offered for restore.
    pub fn trash(&self) -> Result<Vec<Scenario>, ControllerError> {
        Ok(self.store.list_range(&self.options.trash_list, 0, TRASH_PAGE)?)
    }

    /// Package the editor contents and the kept runs for the user to download.
    pub fn download_data(&self, archiver: &mut dyn Archiver) -> Result<Vec<u8>, ControllerError> {
        let scenario = self.state.editor.as_ref().ok_or(ControllerError::NoScenario)?;
        Ok(archiver.package(scenario, &self.runs, true)?)
    }

    /// Package the editor contents and the kept runs and send the archive to
    /// the store. Returns the archive size in bytes.
    pub fn upload_data(&mut self, archiver: &mut dyn Archiver) -> Result<usize, ControllerError> {
        let scenario = self.state.editor.as_ref().ok_or(ControllerError::NoScenario)?;
        let archive = archiver.package(scenario, &self.runs, false)?;
        if let Err(e) = self.store.upload(&archive) {
            warn!("upload of '{}' failed: {}", scenario.title, e);
            return Err(e.into());
        }
        info!("uploaded '{}' with {} runs ({} bytes)", scenario.title, self.runs.len(), archive.len());
        Ok(archive.len())
    }

    /// Send a trashed document back to the editor if it has scenario shape.
    pub fn restore(&mut self, doc: &Value) -> Result<(), ControllerError> {
        match validate_restored(doc) {
            Ok(scenario) => {
                self.state.editor = Some(scenario);
                Ok(())
            }
            Err(e) => {
                warn!("trashed item is not a valid scenario: {}", e);
                Err(e.into())
            }
        }
    }
}

/// Step plot of the unit schedules; unit index on x, value or cost on y.
fn parameter_plot(config: &SimConfig) -> Value {
    let trace = |name: &str, curve: &Option<Vec<f64>>| {
        let y = curve.clone().unwrap_or_default();
        let x: Vec<usize> = (1..=y.len()).collect();
        json!({"name": name, "x": x, "y": y, "mode": "lines", "line": {"shape": "hv"}})
    };
    json!({
        "data": [trace("unit value", &config.buyer_values), trace("unit cost", &config.seller_costs)],
        "layout": {"title": "Unit value and cost", "xaxis": {"title": "unit"}},
        "options": {"displayModeBar": false}
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
