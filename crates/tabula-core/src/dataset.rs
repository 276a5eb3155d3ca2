//! Dataset collaborator interface.
//!
//! The core only reads dataset identity and shape through
//! [`DatasetContextProvider`]; it never mutates the dataset. Loading and
//! parsing files is the caller's job. [`InMemoryDatasets`] is a ready-made
//! implementation that callers fill with whatever their loader produced.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Coarse column classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    /// Every cell is missing.
    Empty,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Empty => "empty",
        }
    }
}

/// Shape and column metadata of one dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub columns: Vec<String>,
    pub rows: usize,
    pub cols: usize,
    /// Missing-cell count per column, parallel to `columns`.
    #[serde(default)]
    pub null_counts: Vec<usize>,
    /// Classification per column, parallel to `columns`.
    #[serde(default)]
    pub kinds: Vec<ColumnKind>,
}

impl DatasetSchema {
    /// Schema with column names and row count only.
    pub fn new(columns: Vec<String>, rows: usize) -> Self {
        let cols = columns.len();
        Self {
            columns,
            rows,
            cols,
            null_counts: Vec::new(),
            kinds: Vec::new(),
        }
    }

    pub fn total_missing(&self) -> usize {
        self.null_counts.iter().sum()
    }

    pub fn count_kind(&self, kind: ColumnKind) -> usize {
        self.kinds.iter().filter(|k| **k == kind).count()
    }

    /// Human-readable summary shown after a file is loaded.
    pub fn summary(&self, identity: &str) -> String {
        const SHOWN_COLUMNS: usize = 10;

        let mut parts = vec![
            format!("File Loaded: {identity}"),
            format!("Dimensions: {} rows x {} columns", self.rows, self.cols),
            String::new(),
            "Column Headers:".to_string(),
        ];
        for (i, col) in self.columns.iter().take(SHOWN_COLUMNS).enumerate() {
            parts.push(format!("  {}. {col}", i + 1));
        }
        if self.columns.len() > SHOWN_COLUMNS {
            parts.push(format!(
                "  ... and {} more columns",
                self.columns.len() - SHOWN_COLUMNS
            ));
        }

        parts.push(String::new());
        parts.push("Quick Stats:".to_string());
        let numeric = self.count_kind(ColumnKind::Numeric);
        if numeric > 0 {
            parts.push(format!("  - Numeric columns: {numeric}"));
        }
        let text = self.count_kind(ColumnKind::Text);
        if text > 0 {
            parts.push(format!("  - Text columns: {text}"));
        }
        let missing = self.total_missing();
        if missing > 0 {
            parts.push(format!("  - Missing values: {missing}"));
        }
        parts.push(String::new());
        parts.push("Ask me anything about this data!".to_string());
        parts.join("\n")
    }
}

/// Snapshot of the dataset state handed to the prompt composer.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetContext {
    pub loaded_files: Vec<String>,
    pub active: Option<String>,
    /// Schema of the active dataset.
    pub schema: Option<DatasetSchema>,
}

/// Read-only view of the currently loaded datasets.
pub trait DatasetContextProvider: Send + Sync {
    /// Identities of every loaded dataset, in load order.
    fn loaded_files(&self) -> Result<Vec<String>, DatasetError>;

    /// Identity of the active dataset.
    fn current_identity(&self) -> Result<Option<String>, DatasetError>;

    /// Schema of the active dataset.
    fn schema(&self) -> Result<Option<DatasetSchema>, DatasetError>;

    fn is_loaded(&self) -> Result<bool, DatasetError> {
        Ok(!self.loaded_files()?.is_empty())
    }

    /// Everything the composer needs, or `None` when nothing is loaded.
    fn context(&self) -> Result<Option<DatasetContext>, DatasetError> {
        let loaded_files = self.loaded_files()?;
        if loaded_files.is_empty() {
            return Ok(None);
        }
        Ok(Some(DatasetContext {
            loaded_files,
            active: self.current_identity()?,
            schema: self.schema()?,
        }))
    }
}

#[derive(Debug, Default)]
struct Registered {
    entries: Vec<(String, DatasetSchema)>,
    active: Option<String>,
}

/// Thread-safe in-memory dataset registry.
#[derive(Debug, Default)]
pub struct InMemoryDatasets {
    state: RwLock<Registered>,
}

impl InMemoryDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a dataset and make it active.
    pub fn insert(
        &self,
        identity: impl Into<String>,
        schema: DatasetSchema,
    ) -> Result<(), DatasetError> {
        let identity = identity.into();
        let mut state = self.write()?;
        match state.entries.iter_mut().find(|(id, _)| *id == identity) {
            Some(entry) => entry.1 = schema,
            None => state.entries.push((identity.clone(), schema)),
        }
        state.active = Some(identity);
        Ok(())
    }

    /// Make an already registered dataset active.
    pub fn activate(&self, identity: &str) -> Result<(), DatasetError> {
        let mut state = self.write()?;
        if !state.entries.iter().any(|(id, _)| id == identity) {
            return Err(DatasetError::NotFound(identity.to_string()));
        }
        state.active = Some(identity.to_string());
        Ok(())
    }

    /// Schema of any registered dataset.
    pub fn get(&self, identity: &str) -> Result<Option<DatasetSchema>, DatasetError> {
        Ok(self
            .read()?
            .entries
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, s)| s.clone()))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Registered>, DatasetError> {
        self.state
            .read()
            .map_err(|_| DatasetError::Unavailable("dataset registry lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Registered>, DatasetError> {
        self.state
            .write()
            .map_err(|_| DatasetError::Unavailable("dataset registry lock poisoned".into()))
    }
}

impl DatasetContextProvider for InMemoryDatasets {
    fn loaded_files(&self) -> Result<Vec<String>, DatasetError> {
        Ok(self.read()?.entries.iter().map(|(id, _)| id.clone()).collect())
    }

    fn current_identity(&self) -> Result<Option<String>, DatasetError> {
        Ok(self.read()?.active.clone())
    }

    fn schema(&self) -> Result<Option<DatasetSchema>, DatasetError> {
        let state = self.read()?;
        let Some(active) = state.active.as_deref() else {
            return Ok(None);
        };
        Ok(state
            .entries
            .iter()
            .find(|(id, _)| id == active)
            .map(|(_, s)| s.clone()))
    }
}
