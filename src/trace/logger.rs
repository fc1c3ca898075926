use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::pipeline::error::PipelineError;
use crate::trace::trace::{Outcome, Stage, StageEvent};

/// Log of a single pipeline run.
///
/// Created once per run and handed by reference to every stage. Events are
/// kept in memory and, when a file could be opened, appended to it as JSON
/// lines. Every event is mirrored to `tracing`. Logging never fails the run.
pub struct RunLog {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
    events: Mutex<Vec<StageEvent>>,
}

impl RunLog {
    /// Open `<dir>/<YYYY-MM-DD>.jsonl` for appending.
    pub fn open(dir: &Path) -> Self {
        let name = format!("{}.jsonl", chrono::Local::now().format("%Y-%m-%d"));
        Self::at(&dir.join(name))
    }

    pub fn at(path: &Path) -> Self {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("could not create run log directory '{}': {}", parent.display(), e);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
                path: Some(path.to_path_buf()),
                events: Mutex::new(Vec::new()),
            },
            Err(e) => {
                tracing::warn!("could not open run log '{}': {}", path.display(), e);
                Self::in_memory()
            }
        }
    }

    /// A log that only keeps events in memory.
    pub fn in_memory() -> Self {
        Self {
            file: None,
            path: None,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, event: StageEvent) {
        mirror(&event);
        self.append(&event);

        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(e) => tracing::warn!("run log lock poisoned: {}", e),
        }
    }

    /// Run one stage body, recording its start and, on error, its failure.
    /// Success events are the body's responsibility since only it knows the
    /// artifact it wrote.
    pub fn stage<T>(
        &self,
        subject: &str,
        stage: Stage,
        body: impl FnOnce() -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        self.record(StageEvent::now(subject, stage, Outcome::Started));
        let result = body();
        if let Err(e) = &result {
            self.record(StageEvent::now(subject, stage, Outcome::Failed).with_error(e));
        }
        result
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<StageEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(_) => Vec::new(),
        }
    }

    fn append(&self, event: &StageEvent) {
        let file_mutex = match &self.file {
            Some(f) => f,
            None => return,
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("failed to serialize run log event: {}", e);
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("run log file lock poisoned: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            tracing::warn!("failed to write run log event: {}", e);
        }
    }
}

fn mirror(event: &StageEvent) {
    let detail = event.detail.as_deref().unwrap_or("");
    match event.outcome {
        Outcome::Failed => tracing::error!(
            subject = %event.subject,
            stage = %event.stage,
            error_kind = event.error_kind.as_deref().unwrap_or("unknown"),
            "{}",
            detail
        ),
        Outcome::Skipped => tracing::warn!(
            subject = %event.subject,
            stage = %event.stage,
            "skipped: {}",
            detail
        ),
        Outcome::Started => tracing::debug!(
            subject = %event.subject,
            stage = %event.stage,
            "started"
        ),
        Outcome::Succeeded => tracing::info!(
            subject = %event.subject,
            stage = %event.stage,
            artifact = event.artifact.as_deref().unwrap_or("-"),
            "{}",
            detail
        ),
    }
}
