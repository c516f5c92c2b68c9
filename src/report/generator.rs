//! HTML report generation.
//!
//! Each check renders one fragment headed by a named anchor so commit
//! statuses can deep link into the published report. The fragments are
//! concatenated into a single document by [`generate_html_document`].

use crate::models::{
    FunctionalTestBlock, FutureSummary, LintReport, LintSummary, Py3kReport, Py3kSummary,
    StyleFinding, TestChange, TestStatus, UnitTestChanges,
};
use std::collections::BTreeMap;

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn section_header(anchor: &str, title: &str) -> String {
    format!("<h2><a name=\"{}\" id=\"{}\"></a>{}</h2>\n", anchor, anchor, escape(title))
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "-".to_string())
}

/// Wrap the given fragments in a minimal HTML document.
pub fn generate_html_document<'a>(fragments: impl IntoIterator<Item = &'a str>) -> String {
    let mut doc = String::new();

    doc.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    doc.push_str("<meta charset=\"utf-8\">\n");
    doc.push_str("<title>Pull Request Report</title>\n");
    doc.push_str("</head>\n<body>\n");

    for fragment in fragments {
        doc.push_str(fragment);
    }

    doc.push_str("</body>\n</html>\n");
    doc
}

/// Per-file score table of the pylint pass.
pub fn generate_pylint_summary(report: &LintReport, summary: &LintSummary) -> String {
    let mut section = section_header("pylint", "Pylint");

    section.push_str(&format!(
        "<p>{} warnings and errors that must be fixed, {} warnings, {} comments</p>\n",
        summary.failures, summary.warnings, summary.comments
    ));

    section.push_str("<table>\n<tr><th>File</th><th>Base score</th><th>New score</th><th>Events</th></tr>\n");
    for (filename, file) in report {
        let events = file.test.as_ref().map(|t| t.events.len()).unwrap_or(0);
        section.push_str(&format!(
            "<tr><td><a href=\"#{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&file_anchor(filename)),
            escape(filename),
            format_score(file.base_score()),
            format_score(file.test_score()),
            events
        ));
    }
    section.push_str("</table>\n");

    section
}

/// Event listing of every file with pylint events.
pub fn generate_pylint_details(report: &LintReport, ok_warnings: &[String]) -> String {
    let mut section = String::new();

    section.push_str("<h3>Pylint details</h3>\n");

    for (filename, file) in report {
        let Some(ref test) = file.test else {
            continue;
        };
        if test.events.is_empty() {
            continue;
        }

        section.push_str(&format!(
            "<h4><a name=\"{0}\" id=\"{0}\"></a>{1}</h4>\n<ul>\n",
            escape(&file_anchor(filename)),
            escape(filename)
        ));

        for event in &test.events {
            let must_fix =
                event.is_warning_or_error() && !ok_warnings.iter().any(|c| c == event.code());
            let (open, close) = if must_fix {
                ("<li><b>", "</b></li>")
            } else {
                ("<li>", "</li>")
            };
            section.push_str(&format!(
                "{}Line {}: {}{} {}{}\n",
                open,
                escape(&event.line().to_string()),
                escape(event.severity()),
                escape(event.code()),
                escape(event.message()),
                close
            ));
        }

        section.push_str("</ul>\n");
    }

    section
}

fn file_anchor(filename: &str) -> String {
    format!("pylint-{}", filename.replace(['/', '.', ' '], "-"))
}

/// Counts of the py3k pylint pass.
pub fn generate_pylint3k_report(report: &Py3kReport, summary: &Py3kSummary) -> String {
    let mut section = section_header("pylint3k", "Pylint py3k");

    section.push_str(&format!(
        "<p>{} errors, {} warnings, {} comments</p>\n",
        summary.errors, summary.warnings, summary.comments
    ));

    let flagged: Vec<_> = report
        .iter()
        .filter(|(_, file)| file.test.total() > 0)
        .collect();

    if flagged.is_empty() {
        section.push_str("<p>No python 3 compatibility issues found.</p>\n");
        return section;
    }

    section.push_str("<table>\n<tr><th>File</th><th>Errors</th><th>Warnings</th><th>Comments</th></tr>\n");
    for (filename, file) in flagged {
        section.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(filename),
            file.test.errors,
            file.test.warnings,
            file.test.comments
        ));
    }
    section.push_str("</table>\n");

    section
}

/// Pycodestyle findings grouped by file.
pub fn generate_pycodestyle_report(findings: &BTreeMap<String, Vec<StyleFinding>>) -> String {
    let mut section = section_header("pycodestyle", "Pycodestyle");

    if findings.is_empty() {
        section.push_str("<p>No style comments.</p>\n");
        return section;
    }

    for (filename, entries) in findings {
        section.push_str(&format!("<h4>{}</h4>\n<ul>\n", escape(filename)));
        for finding in entries {
            section.push_str(&format!(
                "<li>Line {}: [{}] {}</li>\n",
                escape(&finding.line),
                escape(&finding.code),
                escape(&finding.message)
            ));
        }
        section.push_str("</ul>\n");
    }

    section
}

fn status_cell(status: Option<TestStatus>) -> String {
    match status {
        Some(s) if s.is_failing() => format!("<b>{}</b>", s),
        Some(s) => s.to_string(),
        None => "-".to_string(),
    }
}

fn generate_change_table(title: &str, changes: &[TestChange]) -> String {
    if changes.is_empty() {
        return String::new();
    }

    let mut table = format!("<h3>{} ({})</h3>\n", escape(title), changes.len());
    table.push_str("<table>\n<tr><th>Test</th><th>Old status</th><th>New status</th></tr>\n");
    for change in changes {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&change.name),
            status_cell(change.old),
            status_cell(change.new)
        ));
    }
    table.push_str("</table>\n");
    table
}

/// Unit test differences between the baseline and the pull request.
pub fn generate_unit_test_report(changes: &UnitTestChanges) -> String {
    let mut section = section_header("unittests", "Unit tests");

    let tables = [
        ("New failures", &changes.new_failures),
        ("Tests added", &changes.added),
        ("Tests deleted", &changes.deleted),
        ("Tests no longer failing", &changes.ok_changes),
        ("Changes in unstable tests", &changes.unstable_changes),
    ];

    let mut any = false;
    for (title, list) in tables {
        if !list.is_empty() {
            any = true;
            section.push_str(&generate_change_table(title, list));
        }
    }

    if !any {
        section.push_str("<p>No changes in unit test results.</p>\n");
    }

    section
}

/// Futurize patches and messages.
pub fn generate_future_report(summary: &FutureSummary) -> String {
    let mut section = section_header("pyfuture", "Python3 compatibility");

    for (filename, lines) in summary {
        section.push_str(&format!("<h4>{}</h4>\n", escape(filename)));
        if filename == "added.message" {
            section.push_str("<ul>\n");
            for line in lines {
                section.push_str(&format!("<li>{}</li>\n", escape(line)));
            }
            section.push_str("</ul>\n");
        } else {
            section.push_str("<pre>\n");
            for line in lines {
                section.push_str(&escape(line));
            }
            section.push_str("</pre>\n");
        }
    }

    section
}

/// Functional test blocks, one table row per `TEST_*` field.
pub fn generate_functional_report(blocks: &[FunctionalTestBlock]) -> String {
    let mut section = section_header("CRABClientTests", "CRABClient functional tests");

    if blocks.is_empty() {
        section.push_str("<p>No functional test results.</p>\n");
        return section;
    }

    for block in blocks {
        let style = if block.failed { " style=\"color:red\"" } else { "" };
        section.push_str(&format!("<table{}>\n", style));
        if let Some(command) = block.get("TEST_COMMAND") {
            section.push_str(&format!("<caption>{}</caption>\n", escape(command)));
        }
        for (key, value) in &block.fields {
            section.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>\n",
                escape(key),
                escape(value)
            ));
        }
        section.push_str("</table>\n<hr>\n");
    }

    section
}
