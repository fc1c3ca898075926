use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pipeline::error::PipelineError;

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Loading the live page and reading its markup.
    Navigation,
    Extraction,
    Accessors,
    Scenarios,
    TestCode,
    Execution,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Navigation => "navigation",
            Stage::Extraction => "extraction",
            Stage::Accessors => "accessors",
            Stage::Scenarios => "scenarios",
            Stage::TestCode => "test_code",
            Stage::Execution => "execution",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Started,
    Succeeded,
    Skipped,
    Failed,
}

/// One line of the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub timestamp_ms: i64,
    pub subject: String,
    pub stage: Stage,
    pub outcome: Outcome,

    pub detail: Option<String>,
    pub artifact: Option<String>,
    pub fingerprint: Option<String>,
    pub error_kind: Option<String>,
}

impl StageEvent {
    pub fn now(subject: &str, stage: Stage, outcome: Outcome) -> Self {
        Self {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            subject: subject.to_string(),
            stage,
            outcome,
            detail: None,
            artifact: None,
            fingerprint: None,
            error_kind: None,
        }
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// Attach the persisted artifact and a sha1 of what was written.
    pub fn with_artifact(mut self, path: &std::path::Path, contents: &str) -> Self {
        self.artifact = Some(path.display().to_string());
        self.fingerprint = Some(fingerprint(contents));
        self
    }

    pub fn with_error(mut self, error: &PipelineError) -> Self {
        self.error_kind = Some(error.kind().to_string());
        self.detail = Some(error.to_string());
        self
    }
}

pub fn fingerprint(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
