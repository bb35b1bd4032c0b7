//! In-memory result model handed to the writer.
//!
//! The writer only borrows a [`ResultModel`].  How the model gets populated
//! (solver output, a parsed deck, a test fixture) is the caller's business;
//! the one built-in loader is [`ModelManifest`], a JSON description made of
//! [`RecordedResult`]s used by the CLI.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::result::{RecordedResult, TableResult};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid model manifest: {0}")]
    Json(#[from] serde_json::Error),
}

// ── ResultModel ──────────────────────────────────────────────────────────────

/// A named group of results, e.g. `"displacements"` or `"cquad4_stress"`.
pub struct ResultCategory {
    pub name:    String,
    pub results: Vec<Box<dyn TableResult>>,
}

pub struct ResultModel {
    pub title:      String,
    /// Session date passed to every encoder.
    pub date:       NaiveDate,
    /// Selects the NX version tag in the POST,-1 preamble.
    pub is_nx:      bool,
    categories:     Vec<ResultCategory>,
}

impl ResultModel {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            title:      String::new(),
            date,
            is_nx:      false,
            categories: Vec::new(),
        }
    }

    /// Append `result` to the category `category`, creating it on first use.
    /// Category order is first-insertion order.
    pub fn add_result(&mut self, category: &str, result: Box<dyn TableResult>) {
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(c) => c.results.push(result),
            None    => self.categories.push(ResultCategory {
                name:    category.to_string(),
                results: vec![result],
            }),
        }
    }

    pub fn categories(&self) -> &[ResultCategory] { &self.categories }

    /// Every result across all categories, in iteration order.
    pub fn results(&self) -> impl Iterator<Item = &(dyn TableResult + 'static)> {
        self.categories
            .iter()
            .flat_map(|c| c.results.iter().map(|r| r.as_ref()))
    }

    pub fn result_count(&self) -> usize {
        self.categories.iter().map(|c| c.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool { self.result_count() == 0 }

    /// Drop every result, keeping title, date and variant.
    pub fn clear(&mut self) { self.categories.clear(); }
}

// ── ModelManifest ────────────────────────────────────────────────────────────

/// One manifest entry: a category name plus a flattened [`RecordedResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub category: String,
    #[serde(flatten)]
    pub result:   RecordedResult,
}

/// JSON form of a [`ResultModel`] built only from recorded results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    #[serde(default)]
    pub title:   String,
    pub date:    NaiveDate,
    #[serde(default)]
    pub is_nx:   bool,
    #[serde(default)]
    pub results: Vec<ManifestEntry>,
}

impl ModelManifest {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let f = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(f))?)
    }

    pub fn into_model(self) -> ResultModel {
        let mut model = ResultModel::new(self.date);
        model.title = self.title;
        model.is_nx = self.is_nx;
        for entry in self.results {
            model.add_result(&entry.category, Box::new(entry.result));
        }
        model
    }
}
