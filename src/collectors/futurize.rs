//! Future-compatibility (futurize) collector.
//!
//! The futurize stage leaves up to three files behind:
//! - `added.message`: imports futurize had to add; fails the check
//! - `test.patch`: stage 1/2 conversion patch; fails the check
//! - `idioms.patch`: suggested modern idioms; informational only
//!
//! Missing or empty files are tolerated and leave no entry in the
//! summary. Any other read error is propagated.

use super::{read_text, CheckReport};
use crate::error::{AbsencePolicy, CollectResult};
use crate::models::FutureSummary;
use crate::report::generate_future_report;
use std::path::Path;
use tracing::info;

pub const ADDED_MESSAGE: &str = "added.message";
pub const TEST_PATCH: &str = "test.patch";
pub const IDIOMS_PATCH: &str = "idioms.patch";

pub fn collect(dir: &Path) -> CollectResult<CheckReport<FutureSummary>> {
    info!("Evaluating futurize reports");

    let mut summary = FutureSummary::new();
    let mut failed = false;

    if let Some(content) = read_optional(dir, ADDED_MESSAGE)? {
        summary.insert(ADDED_MESSAGE.to_string(), clean_message(&content));
        failed = true;
    }

    if let Some(content) = read_optional(dir, TEST_PATCH)? {
        summary.insert(TEST_PATCH.to_string(), capture_lines(&content));
        failed = true;
    }

    if let Some(content) = read_optional(dir, IDIOMS_PATCH)? {
        summary.insert(IDIOMS_PATCH.to_string(), capture_lines(&content));
    }

    let html = if summary.is_empty() {
        String::new()
    } else {
        generate_future_report(&summary)
    };

    Ok(CheckReport {
        failed,
        summary,
        html,
    })
}

/// Read `dir/name`, returning `None` when it is missing or empty.
fn read_optional(dir: &Path, name: &str) -> CollectResult<Option<String>> {
    let path = dir.join(name);
    let content = AbsencePolicy::Optional.resolve(name, read_text(&path))?;
    Ok(content.filter(|content| !content.is_empty()))
}

/// Non-blank lines of `added.message`, trimmed and without `*` bullets.
pub fn clean_message(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| l.replace('*', ""))
        .collect()
}

/// Patch lines kept verbatim, line terminators included.
pub fn capture_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(String::from).collect()
}
