//! Read-only people dataset shared by the query engine and the tool dispatcher.

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::person::Person;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not read dataset file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse dataset file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
}

/// Ordered, immutable sequence of people loaded once per process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Person>,
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    data: Vec<Person>,
}

impl Dataset {
    pub fn new(records: Vec<Person>) -> Self {
        Self { records }
    }

    /// Loads a `{ "data": [...] }` document from disk.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| DatasetError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json(&raw).map_err(|source| DatasetError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let file: DatasetFile = serde_json::from_str(raw)?;
        Ok(Self::new(file.data))
    }
}

impl Deref for Dataset {
    type Target = [Person];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl From<Vec<Person>> for Dataset {
    fn from(records: Vec<Person>) -> Self {
        Self::new(records)
    }
}
