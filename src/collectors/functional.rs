//! CRABClient functional test log collector.
//!
//! Each log under `CRABSubmitResults/*/*` is a sequence of blocks that
//! start with a `TEST_COMMAND:` line. Inside a block every `TEST_<KEY>:`
//! token introduces one field. A block mentioning `[FAILED]` fails the
//! whole check.

use super::{read_text, CheckReport};
use crate::error::CollectResult;
use crate::models::FunctionalTestBlock;
use crate::report::generate_functional_report;
use crate::scanner::{ArtifactScanner, ScanConfig};
use std::path::Path;
use tracing::{debug, info};

const BLOCK_MARKER: &str = "TEST_COMMAND:";
const FIELD_PREFIX: &str = "TEST_";
const FAILED_MARKER: &str = "[FAILED]";

/// Collect every functional test log below `dir`.
///
/// A missing directory is reported as absent.
pub fn collect(dir: &Path) -> CollectResult<CheckReport<Vec<FunctionalTestBlock>>> {
    info!("Evaluating functional test logs in {}", dir.display());

    let files = ArtifactScanner::new(dir, ScanConfig::any_file()).scan()?;
    let mut blocks = Vec::new();

    for file in files {
        debug!("Reading functional test log {}", file.display());
        let content = read_text(&file)?;
        blocks.extend(split_blocks(content.lines()).iter().map(|b| parse_block(b)));
    }

    let failed = blocks.iter().any(|b| b.failed);

    Ok(CheckReport {
        failed,
        html: generate_functional_report(&blocks),
        summary: blocks,
    })
}

/// Group log lines into blocks.
///
/// Lines are joined with a single space. A line containing `TEST_COMMAND:`
/// starts a new block unless nothing has been accumulated yet. Blank
/// blocks are dropped.
pub fn split_blocks<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut blocks = Vec::new();
    let mut block = String::new();

    for line in lines {
        let line = line.as_ref();
        if line.contains(BLOCK_MARKER) && !block.is_empty() {
            blocks.push(std::mem::take(&mut block));
        }
        block.push_str(line);
        block.push(' ');
    }
    blocks.push(block);

    blocks.retain(|b| !b.trim().is_empty());
    blocks
}

/// Split a block into `TEST_<KEY>` fields.
///
/// A field starts at every `TEST_` that begins the block or follows
/// whitespace, and its key ends at the first colon. Text without a colon
/// is appended to the previous field's value.
pub fn parse_block(block: &str) -> FunctionalTestBlock {
    let mut fields: Vec<(String, String)> = Vec::new();

    for segment in field_segments(block) {
        match segment.split_once(':') {
            Some((key, value)) => fields.push((key.trim().to_string(), value.trim().to_string())),
            None => {
                if let Some((_, value)) = fields.last_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(segment.trim());
                }
            }
        }
    }

    FunctionalTestBlock {
        fields,
        failed: block.contains(FAILED_MARKER),
    }
}

fn field_segments(block: &str) -> Vec<&str> {
    let mut starts = vec![0];
    for (idx, _) in block.match_indices(FIELD_PREFIX) {
        if idx == 0 {
            continue;
        }
        let preceded_by_space = block[..idx]
            .chars()
            .next_back()
            .map(char::is_whitespace)
            .unwrap_or(false);
        if preceded_by_space {
            starts.push(idx);
        }
    }

    let mut segments = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(block.len());
        let segment = &block[start..end];
        if !segment.trim().is_empty() {
            segments.push(segment);
        }
    }
    segments
}
