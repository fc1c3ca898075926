use crate::report::report_model::{PipelineReport, StageStatus, SubjectReport};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a pipeline report for terminal output.
///
/// Produces output like:
/// ```text
/// === Subject: login (https://example.com/login) ===
///
/// ✓ DONE  extraction   generated/locators/login_locators.json
/// ✓ DONE  accessors    generated/pages/login_page.ts
/// - SKIP  scenarios    user-supplied feature file
/// ✗ FAIL  test_code    Oracle returned an empty response
///
/// === Results: 0 succeeded, 1 failed (1 total) ===
/// ```
pub fn format_console_report(report: &PipelineReport) -> String {
    let mut out = String::new();

    for subject in &report.subjects {
        out.push_str(&format_subject(subject));
        out.push('\n');
    }

    out.push_str(&format!(
        "=== Results: {} succeeded, {} failed ({} total) ===\n",
        report.succeeded(),
        report.failed(),
        report.subjects.len()
    ));

    out
}

pub fn format_subject(subject: &SubjectReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Subject: {} ({}) ===\n\n",
        subject.subject, subject.url
    ));

    for result in &subject.stages {
        let marker = match result.status {
            StageStatus::Succeeded => "\u{2713} DONE",
            StageStatus::Skipped => "- SKIP",
            StageStatus::Failed => "\u{2717} FAIL",
        };

        let detail = match (&result.artifact, &result.message) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(message)) => message.clone(),
            (None, None) => String::new(),
        };

        out.push_str(&format!(
            "{}  {:<12} {}\n",
            marker,
            result.stage.label(),
            detail
        ));
    }

    if let Some(ref execution) = subject.execution {
        let verdict = if execution.passed { "passed" } else { "failed" };
        out.push_str(&format!(
            "\nTests {} (report: {})\n",
            verdict,
            execution.report_dir.display()
        ));
        if !execution.suggestions.is_empty() {
            out.push_str("Suggestions for resolution:\n");
            for suggestion in &execution.suggestions {
                out.push_str(&format!("  - {}\n", suggestion));
            }
        }
    }

    out
}
