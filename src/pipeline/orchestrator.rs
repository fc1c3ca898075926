use std::path::{Path, PathBuf};

use crate::browser::session::PageSession;
use crate::codegen::accessor::BuilderRegistry;
use crate::codegen::page_object::{generate_page_object, generate_page_object_from_records};
use crate::locator::extractor::{ExtractionSettings, extract_locators};
use crate::naming::subject_from_url;
use crate::oracle::ollama::TextInference;
use crate::pipeline::artifacts::ArtifactStore;
use crate::pipeline::error::{PipelineError, Result};
use crate::report::report_model::{ExecutionSummary, PipelineReport, SubjectReport};
use crate::runner::executor::{ExecutionSettings, execute_tests};
use crate::scenario::generator::{GeneratedScenarios, generate_scenarios};
use crate::scenario::mapping::StepLocatorMapping;
use crate::testgen::test_generator::generate_tests;
use crate::trace::logger::RunLog;
use crate::trace::trace::{Outcome, Stage, StageEvent};

#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub extraction: ExtractionSettings,
    /// Build the page object from the extracted records instead of issuing a
    /// second locator request.
    pub reuse_locators_for_accessors: bool,
    /// Run the generated tests when set.
    pub execute: Option<ExecutionSettings>,
}

/// Runs every stage for one subject at a time, strictly in order.
///
/// A failed stage ends the run for its subject; artifacts of earlier stages
/// stay on disk and the next subject starts from scratch.
pub struct Pipeline<'a> {
    oracle: &'a dyn TextInference,
    store: &'a ArtifactStore,
    registry: &'a BuilderRegistry,
    settings: &'a PipelineSettings,
    log: &'a RunLog,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        oracle: &'a dyn TextInference,
        store: &'a ArtifactStore,
        registry: &'a BuilderRegistry,
        settings: &'a PipelineSettings,
        log: &'a RunLog,
    ) -> Self {
        Self {
            oracle,
            store,
            registry,
            settings,
            log,
        }
    }

    /// Run the pipeline for each URL in turn. `feature`, when given, replaces
    /// scenario generation for every subject.
    pub fn run(
        &self,
        urls: &[String],
        feature: Option<&Path>,
        session: &mut dyn PageSession,
    ) -> PipelineReport {
        let mut report = PipelineReport::default();
        for url in urls {
            report.subjects.push(self.run_subject(url, feature, session));
        }
        report
    }

    pub fn run_subject(
        &self,
        url: &str,
        feature: Option<&Path>,
        session: &mut dyn PageSession,
    ) -> SubjectReport {
        let subject = subject_from_url(url);
        let mut report = SubjectReport::new(&subject, url);
        tracing::info!(subject = %subject, url, "Processing page");

        if let Err(e) = self.run_stages(url, &subject, feature, session, &mut report) {
            tracing::error!(subject = %subject, "Pipeline stopped: {}", e);
        }
        report
    }

    fn run_stages(
        &self,
        url: &str,
        subject: &str,
        feature: Option<&Path>,
        session: &mut dyn PageSession,
        report: &mut SubjectReport,
    ) -> Result<()> {
        let markup = track(report, Stage::Navigation, |_| None, || {
            self.log.stage(subject, Stage::Navigation, || {
                session.navigate(url)?;
                let markup = session.page_source()?;
                self.log.record(
                    StageEvent::now(subject, Stage::Navigation, Outcome::Succeeded)
                        .with_detail(format!("{} bytes of markup", markup.len())),
                );
                Ok(markup)
            })
        })?;

        let records = track(
            report,
            Stage::Extraction,
            |_| Some(self.store.locators_path(subject)),
            || {
                extract_locators(
                    self.oracle,
                    &markup,
                    subject,
                    self.store,
                    &self.settings.extraction,
                    self.log,
                )
            },
        )?;

        track(report, Stage::Accessors, |p: &PathBuf| Some(p.clone()), || {
            if self.settings.reuse_locators_for_accessors {
                generate_page_object_from_records(
                    &records,
                    subject,
                    self.store,
                    self.registry,
                    self.log,
                )
            } else {
                generate_page_object(
                    self.oracle,
                    &markup,
                    subject,
                    self.store,
                    &self.settings.extraction,
                    self.registry,
                    self.log,
                )
            }
        })?;

        let (document, mapping): (String, Option<StepLocatorMapping>) = match feature {
            Some(path) => {
                let document = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(e) => {
                        let err = PipelineError::Read {
                            path: path.to_path_buf(),
                            source: e,
                        };
                        self.log.record(
                            StageEvent::now(subject, Stage::Scenarios, Outcome::Failed)
                                .with_error(&err),
                        );
                        report.failed(Stage::Scenarios, err.to_string());
                        return Err(err);
                    }
                };
                let reason = format!("using feature file {}", path.display());
                self.log.record(
                    StageEvent::now(subject, Stage::Scenarios, Outcome::Skipped)
                        .with_detail(&reason),
                );
                report.skipped(Stage::Scenarios, reason);
                (document, None)
            }
            None => {
                let generated = track(
                    report,
                    Stage::Scenarios,
                    |g: &GeneratedScenarios| Some(g.path.clone()),
                    || generate_scenarios(self.oracle, subject, &records, self.store, self.log),
                )?;
                (generated.document, Some(generated.mapping))
            }
        };

        let spec = track(report, Stage::TestCode, |p: &PathBuf| Some(p.clone()), || {
            generate_tests(
                self.oracle,
                &document,
                subject,
                url,
                mapping,
                session,
                self.store,
                self.log,
            )
        })?;

        if let Some(execute) = &self.settings.execute {
            let report_dir = self.store.report_dir(subject);
            let outcome = execute_tests(&spec, &report_dir, url, subject, execute, self.log);
            match outcome {
                Ok(run) => {
                    if run.passed {
                        report.succeeded(Stage::Execution, Some(run.report_dir.clone()));
                    } else {
                        report.failed(Stage::Execution, "generated tests failed");
                    }
                    report.execution = Some(ExecutionSummary {
                        passed: run.passed,
                        report_dir: run.report_dir,
                        suggestions: run.suggestions,
                    });
                }
                Err(e) => {
                    report.failed(Stage::Execution, e.to_string());
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

/// Run one stage and record its status in the subject report.
fn track<T>(
    report: &mut SubjectReport,
    stage: Stage,
    artifact: impl FnOnce(&T) -> Option<PathBuf>,
    body: impl FnOnce() -> Result<T>,
) -> Result<T> {
    match body() {
        Ok(value) => {
            report.succeeded(stage, artifact(&value));
            Ok(value)
        }
        Err(e) => {
            report.failed(stage, e.to_string());
            Err(e)
        }
    }
}
