use std::path::PathBuf;

use crate::locator::locator_model::LocatorRecord;
use crate::naming::pascal_case;
use crate::oracle::ollama::TextInference;
use crate::oracle::response::generate_text;
use crate::pipeline::artifacts::ArtifactStore;
use crate::pipeline::error::{PipelineError, Result};
use crate::scenario::mapping::StepLocatorMapping;
use crate::trace::logger::RunLog;
use crate::trace::trace::{Outcome, Stage, StageEvent};

/// Output of the scenario generation stage.
#[derive(Debug, Clone)]
pub struct GeneratedScenarios {
    pub path: PathBuf,
    pub document: String,
    pub mapping: StepLocatorMapping,
}

pub fn feature_name(subject: &str) -> String {
    format!("{} Feature", pascal_case(subject))
}

pub fn build_scenario_prompt(subject: &str, records: &[LocatorRecord]) -> Result<String> {
    let locators_json =
        serde_json::to_string_pretty(records).map_err(|e| PipelineError::Serialize {
            context: "locators for scenario prompt".into(),
            source: e,
        })?;

    Ok(format!(
        r#"You are an expert test automation engineer. Write a Gherkin feature file for a web page, based on the interactable elements extracted from it.

Process:
1. Analyze the locators: use each element's `identifier` and `category` to infer what a user can do on the page.
2. Decide what kind of page it is (data entry form, dashboard, content page, ...).
3. Write a mix of scenarios:
   a. Positive scenarios: the happy path and successful submissions.
   b. Negative scenarios: validation errors caused by invalid data (bad email format, letters in a phone number, ...).
   c. Boundary scenarios: empty submissions, boundary values, unusually long input.
   For a data entry form, use 'Scenario Outline' with an 'Examples' table to cover several data variations in one scenario.

Use only the step keywords Given, When, And, Then, one step per line.
Refer to elements by their identifiers in the steps.
Return only the Gherkin text, without markdown or commentary.

Locators:
{locators_json}

Feature name: {feature}"#,
        feature = feature_name(subject),
    ))
}

/// Scenario generation stage.
///
/// Asks the oracle for a feature file covering the page's elements, builds
/// the step/locator mapping from it and persists the document verbatim. An
/// empty response fails the stage and nothing is written.
pub fn generate_scenarios(
    oracle: &dyn TextInference,
    subject: &str,
    records: &[LocatorRecord],
    store: &ArtifactStore,
    log: &RunLog,
) -> Result<GeneratedScenarios> {
    log.stage(subject, Stage::Scenarios, || {
        let prompt = build_scenario_prompt(subject, records)?;
        let document = generate_text(oracle, &prompt)?;
        let mapping = StepLocatorMapping::from_document(&document, records);

        let path = store.write_text(&store.feature_path(subject), &document)?;
        log.record(
            StageEvent::now(subject, Stage::Scenarios, Outcome::Succeeded)
                .with_detail(format!("{} steps mapped to locators", mapping.len()))
                .with_artifact(&path, &document),
        );

        Ok(GeneratedScenarios {
            path,
            document,
            mapping,
        })
    })
}
