use std::path::PathBuf;

use crate::browser::session::PageSession;
use crate::naming::page_class_name;
use crate::oracle::ollama::TextInference;
use crate::oracle::response::{generate_text, strip_code_fence};
use crate::pipeline::artifacts::ArtifactStore;
use crate::pipeline::error::{PipelineError, Result};
use crate::scenario::mapping::StepLocatorMapping;
use crate::scenario::scenario_model::ScenarioDocument;
use crate::testgen::default_mapping::build_default_mapping;
use crate::trace::logger::RunLog;
use crate::trace::trace::{Outcome, Stage, StageEvent};

/// Everything the test prompt is built from.
pub struct TestPromptInput<'a> {
    pub subject: &'a str,
    pub url: &'a str,
    pub import_path: &'a str,
    pub document_text: &'a str,
    pub document: &'a ScenarioDocument,
    pub mapping: &'a StepLocatorMapping,
}

pub fn build_test_prompt(input: &TestPromptInput) -> Result<String> {
    let class_name = page_class_name(input.subject);
    let mapping_json = input
        .mapping
        .to_json_pretty()
        .map_err(|e| PipelineError::Serialize {
            context: "step locator mapping".into(),
            source: e,
        })?;

    let test_names: Vec<String> = input
        .document
        .runnable_scenarios()
        .map(|s| format!("- {} ({})", s.test_name, s.title))
        .collect();

    Ok(format!(
        r#"You are an expert in web automation with Playwright Test and TypeScript. Given a Gherkin feature and a locator map, write a Playwright test file.

Rules:
- Import `test` and `expect` from '@playwright/test' and the page object with `import {{ {class_name} }} from '{import_path}';`.
- Navigate to the URL in a `test.beforeEach` hook: `await page.goto('{url}');`.
- Write exactly one `test(...)` per scenario, named after the scenario.
- Drive the page only through the page object's accessors (enter_*, click_*, check_*, select_*, select_option_from_*).
- Turn every 'Then' step into an `expect` assertion on the page state (visibility, text content, value).
- Use the xpath values from the locator map when an assertion needs an element the page object does not expose.
- Return only TypeScript code, without markdown or commentary.

Example:
import {{ test, expect }} from '@playwright/test';
import {{ ExamplePage }} from '../pages/example_page';

test.beforeEach(async ({{ page }}) => {{
  await page.goto('http://example.com');
}});

test('successful login', async ({{ page }}) => {{
  const example = new ExamplePage(page);
  await example.enter_username('test_user');
  await example.click_submit();
  await expect(page.locator('xpath=//div[contains(text(), "Welcome")]')).toBeVisible();
}});

Scenarios:
{test_names}

Gherkin content:
{document}

Locator map:
{mapping_json}

URL: {url}
Page object class: {class_name}"#,
        import_path = input.import_path,
        url = input.url,
        test_names = test_names.join("\n"),
        document = input.document_text,
    ))
}

/// Test generation stage.
///
/// Parses the scenario document, falls back to the default locator table
/// when no mapping is given, asks the oracle for a test file and persists it
/// with any surrounding code fence removed.
#[allow(clippy::too_many_arguments)]
pub fn generate_tests(
    oracle: &dyn TextInference,
    document_text: &str,
    subject: &str,
    url: &str,
    mapping: Option<StepLocatorMapping>,
    session: &mut dyn PageSession,
    store: &ArtifactStore,
    log: &RunLog,
) -> Result<PathBuf> {
    log.stage(subject, Stage::TestCode, || {
        let document = ScenarioDocument::parse(document_text);
        if document.step_count() == 0 {
            return Err(PipelineError::validation(
                "test_code",
                "no Gherkin steps found in scenario document",
            ));
        }
        tracing::debug!(
            scenarios = document.scenarios.len(),
            steps = document.step_count(),
            "Parsed scenario document"
        );

        let mapping = match mapping {
            Some(m) => m,
            None => {
                tracing::info!(subject, "No step mapping supplied, using default locators");
                build_default_mapping(&document, url, session)?
            }
        };

        let import_path = store.page_object_import(subject);
        let prompt = build_test_prompt(&TestPromptInput {
            subject,
            url,
            import_path: &import_path,
            document_text,
            document: &document,
            mapping: &mapping,
        })?;

        let response = generate_text(oracle, &prompt)?;
        let code = strip_code_fence(&response);

        let path = store.write_text(&store.spec_path(subject), &code)?;
        log.record(
            StageEvent::now(subject, Stage::TestCode, Outcome::Succeeded)
                .with_detail(format!(
                    "{} scenarios, {} mapped steps",
                    document.runnable_scenarios().count(),
                    mapping.len()
                ))
                .with_artifact(&path, &code),
        );
        Ok(path)
    })
}
