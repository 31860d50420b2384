// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Scale-Up Suite - External Collaborators
//
// The market simulator, the configuration store, the plotting layer and the
// archive packager are external. The controller only talks to them through
// these traits.

use crate::types::{Scenario, SimConfig, VisualSize};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Simulation engine
// ---------------------------------------------------------------------------

/// A simulation that has been constructed and can be advanced period by period.
pub trait Simulation {
    /// Periods completed so far.
    fn period(&self) -> u64;
    /// Target number of periods. The engine stops once `period() >= periods()`.
    fn periods(&self) -> u64;
    /// Change the target mid-run; lowering it to 0 requests early termination.
    fn set_periods(&mut self, periods: u64);
    /// Run one period. Returns `false` once the run is finished.
    fn step(&mut self) -> bool;
    /// Stop keeping the named logs and discard what they hold.
    fn drop_logs(&mut self, names: &[&str]);
    /// Recorded logs keyed by name, for plotting and archiving.
    fn logs(&self) -> Value;
}

pub trait SimulationEngine {
    fn create(&self, config: &SimConfig) -> Box<dyn Simulation>;
}

/// A finished simulation kept for re-plotting and export.
pub struct CompletedRun {
    pub slot: usize,
    /// Configuration the run was created from, common settings applied.
    pub config: SimConfig,
    pub sim: Box<dyn Simulation>,
}

impl std::fmt::Debug for CompletedRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletedRun")
            .field("slot", &self.slot)
            .field("period", &self.sim.period())
            .field("periods", &self.sim.periods())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Configuration storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("unknown list: {0}")]
    UnknownList(String),
    #[error("item not found in {list}: {title}")]
    NotFound { list: String, title: String },
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Named lists of scenario documents (saved scenarios, trash, ...).
pub trait ScenarioStore {
    fn list(&self, list: &str) -> Result<Vec<Scenario>, StorageError>;
    fn list_range(&self, list: &str, start: usize, end: usize) -> Result<Vec<Scenario>, StorageError> {
        let items = self.list(list)?;
        let end = end.min(items.len());
        let start = start.min(end);
        Ok(items[start..end].to_vec())
    }
    fn save(&mut self, item: &Scenario, list: &str) -> Result<(), StorageError>;
    fn remove(&mut self, item: &Scenario, list: &str) -> Result<(), StorageError>;
    fn move_item(&mut self, item: &Scenario, from: &str, to: &str) -> Result<(), StorageError> {
        self.remove(item, from)?;
        self.save(item, to)
    }
    /// Send a packaged archive of a scenario and its runs to the backend.
    fn upload(&mut self, archive: &[u8]) -> Result<(), StorageError>;
}

/// In-memory store keyed by list name. Items are matched by title.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    lists: HashMap<String, Vec<Scenario>>,
    uploads: Vec<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, name: &str, items: Vec<Scenario>) -> Self {
        self.lists.insert(name.to_string(), items);
        self
    }

    pub fn uploads(&self) -> &[Vec<u8>] {
        &self.uploads
    }
}

impl ScenarioStore for MemoryStore {
    fn list(&self, list: &str) -> Result<Vec<Scenario>, StorageError> {
        Ok(self.lists.get(list).cloned().unwrap_or_default())
    }

    fn save(&mut self, item: &Scenario, list: &str) -> Result<(), StorageError> {
        self.lists.entry(list.to_string()).or_default().push(item.clone());
        Ok(())
    }

    fn remove(&mut self, item: &Scenario, list: &str) -> Result<(), StorageError> {
        let items = self
            .lists
            .get_mut(list)
            .ok_or_else(|| StorageError::UnknownList(list.to_string()))?;
        let pos = items
            .iter()
            .position(|s| s.title == item.title)
            .ok_or_else(|| StorageError::NotFound {
                list: list.to_string(),
                title: item.title.clone(),
            })?;
        items.remove(pos);
        Ok(())
    }

    fn upload(&mut self, archive: &[u8]) -> Result<(), StorageError> {
        if archive.is_empty() {
            return Err(StorageError::Backend("refusing empty archive".to_string()));
        }
        self.uploads.push(archive.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Chart rendering
// ---------------------------------------------------------------------------

/// How a plot title is modified before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "text", rename_all = "lowercase")]
pub enum TitleEdit {
    Prepend(String),
    Append(String),
    Replace(String),
}

impl TitleEdit {
    pub fn apply(&self, title: &str) -> String {
        match self {
            Self::Prepend(text) => format!("{}{}", text, title),
            Self::Append(text) => format!("{}{}", title, text),
            Self::Replace(text) => text.clone(),
        }
    }

    /// Edits requested by a configuration's `titleReplace`, `titlePrepend`
    /// and `titleAppend` fields, in the order they apply. Empty strings are
    /// ignored.
    pub fn for_config(config: &SimConfig) -> Vec<TitleEdit> {
        let text = |key: &str| {
            config
                .extra
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let mut edits = Vec::new();
        if let Some(t) = text("titleReplace") {
            edits.push(Self::Replace(t));
        }
        if let Some(t) = text("titlePrepend") {
            edits.push(Self::Prepend(t));
        }
        if let Some(t) = text("titleAppend") {
            edits.push(Self::Append(t));
        }
        edits
    }
}

/// Apply `edits` in order. Prepend and append only touch a title that exists.
pub fn edit_title(title: Option<&str>, edits: &[TitleEdit]) -> Option<String> {
    edits.iter().fold(title.map(str::to_string), |current, edit| match (edit, current) {
        (TitleEdit::Replace(_), _) => Some(edit.apply("")),
        (_, Some(t)) => Some(edit.apply(&t)),
        (_, None) => None,
    })
}

pub trait ChartRenderer {
    /// Draw `plot` (trace data, layout and options as JSON) into `region`,
    /// with `titles` applied to the layout title.
    fn render(&mut self, region: &str, plot: &Value, titles: &[TitleEdit]);
    fn clear(&mut self, region: &str);
}

// ---------------------------------------------------------------------------
// Result visuals
// ---------------------------------------------------------------------------

/// Plots offered for a finished run, grouped by run length.
pub trait VisualCatalog {
    /// Titles of the visuals in the set for `size`, in selection order.
    fn titles(&self, size: VisualSize) -> Vec<String>;
    /// Plot visual `index` of the `size` set for a finished run.
    fn plot(&self, size: VisualSize, index: usize, run: &CompletedRun) -> Value;
}

// ---------------------------------------------------------------------------
// Archives
// ---------------------------------------------------------------------------

/// Packs a scenario and its completed runs into a single archive.
pub trait Archiver {
    /// When `download` is set the packager also hands the archive to the user.
    fn package(&mut self, scenario: &Scenario, runs: &[CompletedRun], download: bool) -> Result<Vec<u8>, StorageError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
