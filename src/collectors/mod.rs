//! Artifact collectors.
//!
//! Every collector reads one kind of CI artifact and produces a
//! [`CheckReport`]: whether the check failed, a structured summary and the
//! rendered HTML fragment. Collectors never decide whether a missing input
//! is fatal; they report [`CollectError::Absent`] and the pipeline applies
//! the artifact's [`crate::error::AbsencePolicy`].

pub mod functional;
pub mod futurize;
pub mod pycodestyle;
pub mod pylint;
pub mod pylint3k;
pub mod unittests;

use crate::error::{CollectError, CollectResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Output of one collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport<S> {
    pub failed: bool,
    pub summary: S,
    #[serde(skip)]
    pub html: String,
}

/// Read a whole text artifact.
pub(crate) fn read_text(path: &Path) -> CollectResult<String> {
    let bytes = std::fs::read(path).map_err(|e| CollectError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read and deserialize a JSON artifact.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> CollectResult<T> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|source| CollectError::Json {
        path: path.to_path_buf(),
        source,
    })
}
