use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::trace::trace::Stage;

// ============================================================================
// Pipeline report: what happened to every subject in one run
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,

    /// Artifact the stage wrote, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,

    /// Error message for a failed stage, reason for a skipped one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Summary of a test execution, kept small enough for the console report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub passed: bool,
    pub report_dir: PathBuf,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectReport {
    pub subject: String,
    pub url: String,
    pub stages: Vec<StageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionSummary>,
}

impl SubjectReport {
    pub fn new(subject: &str, url: &str) -> Self {
        Self {
            subject: subject.to_string(),
            url: url.to_string(),
            stages: Vec::new(),
            execution: None,
        }
    }

    pub fn succeeded(&mut self, stage: Stage, artifact: Option<PathBuf>) {
        self.stages.push(StageResult {
            stage,
            status: StageStatus::Succeeded,
            artifact,
            message: None,
        });
    }

    pub fn skipped(&mut self, stage: Stage, reason: impl Into<String>) {
        self.stages.push(StageResult {
            stage,
            status: StageStatus::Skipped,
            artifact: None,
            message: Some(reason.into()),
        });
    }

    pub fn failed(&mut self, stage: Stage, message: impl Into<String>) {
        self.stages.push(StageResult {
            stage,
            status: StageStatus::Failed,
            artifact: None,
            message: Some(message.into()),
        });
    }

    pub fn status_of(&self, stage: Stage) -> Option<StageStatus> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.status)
    }

    pub fn artifact_of(&self, stage: Stage) -> Option<&PathBuf> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .and_then(|r| r.artifact.as_ref())
    }

    /// First failed stage, if any.
    pub fn failed_stage(&self) -> Option<&StageResult> {
        self.stages
            .iter()
            .find(|r| r.status == StageStatus::Failed)
    }

    /// No stage failed and, if tests were run, they passed.
    pub fn is_success(&self) -> bool {
        self.failed_stage().is_none() && self.execution.as_ref().is_none_or(|e| e.passed)
    }
}

/// Aggregated report for every subject of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub subjects: Vec<SubjectReport>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> usize {
        self.subjects.iter().filter(|s| s.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.subjects.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}
