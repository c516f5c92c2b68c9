//! Pycodestyle (pep8) collector.
//!
//! Style comments are informational: this check never fails the build.

use super::{read_text, CheckReport};
use crate::error::{CollectError, CollectResult};
use crate::models::{StyleFinding, StyleSummary};
use crate::report::generate_pycodestyle_report;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub type StyleFindings = BTreeMap<String, Vec<StyleFinding>>;

pub fn collect(path: &Path) -> CollectResult<CheckReport<StyleSummary>> {
    info!("Evaluating pep8 style report for file: {}", path.display());

    let content = read_text(path)?;
    let findings = parse_report(&content).map_err(|(line, reason)| CollectError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    })?;

    let summary = StyleSummary {
        comments: findings.values().map(Vec::len).sum(),
    };

    Ok(CheckReport {
        failed: false,
        summary,
        html: generate_pycodestyle_report(&findings),
    })
}

/// Parse the whole report, grouping findings by file. Errors carry the
/// 1-based line number.
pub fn parse_report(content: &str) -> Result<StyleFindings, (usize, String)> {
    let mut findings = StyleFindings::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (file, finding) = parse_line(line).map_err(|reason| (idx + 1, reason))?;
        findings.entry(file).or_default().push(finding);
    }

    Ok(findings)
}

/// Parse one `file:line:[code] message` line.
pub fn parse_line(line: &str) -> Result<(String, StyleFinding), String> {
    let mut parts = line.splitn(3, ':');
    let (Some(file), Some(lineno), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected 'file:line:[code] message', got {:?}", line));
    };

    let rest = rest.trim_start().trim_start_matches('[');
    let Some((code, message)) = rest.split_once("] ") else {
        return Err(format!("missing '[code]' in {:?}", line));
    };

    Ok((
        file.to_string(),
        StyleFinding {
            line: lineno.to_string(),
            code: code.to_string(),
            message: message.trim_end().to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbsencePolicy;

    #[test]
    fn test_parse_line() {
        let (file, finding) =
            parse_line("src/WMCore/Foo.py:12:[E501] line too long (130 > 120 characters)")
                .unwrap();
        assert_eq!(file, "src/WMCore/Foo.py");
        assert_eq!(finding.line, "12");
        assert_eq!(finding.code, "E501");
        assert_eq!(finding.message, "line too long (130 > 120 characters)");
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(parse_line("no colons here").is_err());
        assert!(parse_line("a.py:1:E501 no brackets").is_err());
    }

    #[test]
    fn test_groups_by_file_and_never_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pep8.txt");
        std::fs::write(
            &path,
            "a.py:1:[E302] expected 2 blank lines\nb.py:3:[W291] trailing whitespace\na.py:9:[E501] line too long\n",
        )
        .unwrap();

        let report = collect(&path).unwrap();
        assert!(!report.failed);
        assert_eq!(report.summary.comments, 3);
        assert!(report.html.contains("expected 2 blank lines"));
    }

    #[test]
    fn test_parse_failure_is_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pep8.txt");
        std::fs::write(&path, "a.py:1:[E302] fine\nthis is not a finding\n").unwrap();

        let err = collect(&path).unwrap_err();
        assert!(matches!(err, CollectError::Parse { line: 2, .. }));
        assert!(matches!(
            AbsencePolicy::Lenient.resolve("pycodestyle", collect(&path)),
            Ok(None)
        ));
    }
}
