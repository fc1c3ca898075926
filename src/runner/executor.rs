use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::pipeline::error::{PipelineError, Result};
use crate::trace::logger::RunLog;
use crate::trace::trace::{Outcome, Stage, StageEvent};

pub const DEFAULT_PROGRAM: &str = "npx";
pub const DEFAULT_RETRIES: u32 = 2;

/// How generated tests are run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Launcher for the Playwright CLI (`npx` unless configured otherwise).
    pub program: String,
    /// Retries per failing test.
    pub retries: u32,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            retries: DEFAULT_RETRIES,
        }
    }
}

/// Outcome of one test run. A failing suite is still a report, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub spec: PathBuf,
    pub report_dir: PathBuf,
    pub passed: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub suggestions: Vec<String>,
}

/// The `playwright test` invocation for one spec file. The HTML report is
/// written into `report_dir` and never opened.
pub fn build_command(spec: &Path, report_dir: &Path, settings: &ExecutionSettings) -> Command {
    let mut cmd = Command::new(&settings.program);
    cmd.arg("playwright")
        .arg("test")
        .arg(spec)
        .arg(format!("--retries={}", settings.retries))
        .arg("--reporter=list,html")
        .env("PLAYWRIGHT_HTML_REPORT", report_dir)
        .env("PW_TEST_HTML_REPORT_OPEN", "never");
    cmd
}

/// Run the generated tests for `subject` and collect the outcome.
///
/// Only a launcher that cannot be started is an error. Failing tests come
/// back as a report with `passed == false` and remediation hints.
pub fn execute_tests(
    spec: &Path,
    report_dir: &Path,
    url: &str,
    subject: &str,
    settings: &ExecutionSettings,
    log: &RunLog,
) -> Result<ExecutionReport> {
    log.stage(subject, Stage::Execution, || {
        std::fs::create_dir_all(report_dir)
            .map_err(|e| PipelineError::persistence(report_dir, e))?;

        tracing::info!(spec = %spec.display(), retries = settings.retries, "Running generated tests");

        let output = build_command(spec, report_dir, settings)
            .output()
            .map_err(|e| {
                PipelineError::Execution(format!("failed to spawn {}: {}", settings.program, e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let passed = output.status.success();

        let suggestions = if passed {
            Vec::new()
        } else {
            diagnose_failure(&format!("{}\n{}", stdout, stderr), url, spec)
        };

        for suggestion in &suggestions {
            tracing::info!(subject, "Suggestion: {}", suggestion);
        }

        let event = if passed {
            StageEvent::now(subject, Stage::Execution, Outcome::Succeeded)
                .with_detail("tests passed")
        } else {
            StageEvent::now(subject, Stage::Execution, Outcome::Failed).with_detail(format!(
                "tests failed (exit code {})",
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".into())
            ))
        };
        log.record(event);

        Ok(ExecutionReport {
            spec: spec.to_path_buf(),
            report_dir: report_dir.to_path_buf(),
            passed,
            exit_code: output.status.code(),
            stdout,
            stderr,
            suggestions,
        })
    })
}

/// Remediation hints from keywords in the test runner's output.
pub fn diagnose_failure(output: &str, url: &str, spec: &Path) -> Vec<String> {
    let mut suggestions = Vec::new();

    if output.contains("TimeoutError") || output.contains("waiting for locator") {
        suggestions.push("Verify the locators in the generated page object".to_string());
        suggestions.push(format!(
            "Check that the elements are present on {} using the browser developer tools",
            url
        ));
    }

    if output.contains("net::ERR") || output.contains("page.goto") {
        suggestions.push(format!("Verify {} is reachable with 'curl -k {}'", url, url));
    }

    if output.contains("SyntaxError") || output.contains("error TS") {
        suggestions.push("Check the generated test file for syntax errors".to_string());
        suggestions.push(format!("Run 'npx tsc --noEmit {}' to validate", spec.display()));
    }

    if output.contains("Cannot find module") {
        suggestions.push(
            "Install Playwright in the output directory with 'npm i -D @playwright/test'"
                .to_string(),
        );
    }

    suggestions
}
