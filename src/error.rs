//! Collector error types and the absence policy of each artifact.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("report not found: {}", .0.display())]
    Absent(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid xunit XML in {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl CollectError {
    /// Wrap an I/O error, mapping "not found" to [`CollectError::Absent`].
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            CollectError::Absent(path.to_path_buf())
        } else {
            CollectError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CollectError::Absent(_))
    }
}

pub type CollectResult<T> = std::result::Result<T, CollectError>;

/// How a collector's failure to produce a report is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsencePolicy {
    /// The artifact must exist; every error propagates.
    Required,
    /// A missing input is an empty report; an unreadable one means "no report".
    AbsentIsEmpty,
    /// A missing input means "no report"; other errors propagate.
    Optional,
    /// Any error at all means "no report".
    Lenient,
}

impl AbsencePolicy {
    /// Apply the policy: `Ok(None)` for a tolerated absence, `Err` for a hard failure.
    pub fn resolve<T>(self, what: &str, result: CollectResult<T>) -> CollectResult<Option<T>> {
        match (self, result) {
            (_, Ok(value)) => Ok(Some(value)),
            (AbsencePolicy::Required, Err(e)) => Err(e),
            (AbsencePolicy::AbsentIsEmpty | AbsencePolicy::Optional, Err(e)) if e.is_absent() => {
                info!("No {} report: {}", what, e);
                Ok(None)
            }
            (AbsencePolicy::AbsentIsEmpty, Err(e @ CollectError::Io { .. })) => {
                warn!("Was not able to read {} report: {}", what, e);
                Ok(None)
            }
            (AbsencePolicy::Lenient, Err(e)) => {
                warn!("Was not able to open or parse {} report: {}", what, e);
                Ok(None)
            }
            (_, Err(e)) => Err(e),
        }
    }

    /// Like [`resolve`](Self::resolve), but an `AbsentIsEmpty` absence
    /// yields `empty()` instead of `None`.
    pub fn resolve_or<T>(
        self,
        what: &str,
        result: CollectResult<T>,
        empty: impl FnOnce() -> T,
    ) -> CollectResult<Option<T>> {
        match (self, result) {
            (AbsencePolicy::AbsentIsEmpty, Err(e)) if e.is_absent() => {
                info!("No {} input, reporting no changes: {}", what, e);
                Ok(Some(empty()))
            }
            (policy, result) => policy.resolve(what, result),
        }
    }
}
