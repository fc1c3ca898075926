use crate::locator::locator_model::{LocatorRecord, LocatorSet};
use crate::oracle::ollama::TextInference;
use crate::oracle::response::{DEFAULT_JSON_ATTEMPTS, generate_json};
use crate::pipeline::artifacts::ArtifactStore;
use crate::pipeline::error::{PipelineError, Result};
use crate::trace::logger::RunLog;
use crate::trace::trace::{Outcome, Stage, StageEvent};

/// Markup prefix sent to the oracle when nothing else is configured.
pub const DEFAULT_MAX_MARKUP_CHARS: usize = 2000;

/// Knobs shared by every locator request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSettings {
    /// Upper bound on normalized markup characters embedded in the prompt.
    pub max_markup_chars: usize,
    pub json_attempts: u32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_markup_chars: DEFAULT_MAX_MARKUP_CHARS,
            json_attempts: DEFAULT_JSON_ATTEMPTS,
        }
    }
}

// ============================================================================
// Markup preparation
// ============================================================================

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_markup(markup: &str) -> String {
    markup.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_chars` characters, cutting on a char boundary.
pub fn bound_markup(markup: &str, max_chars: usize) -> &str {
    match markup.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &markup[..byte_index],
        None => markup,
    }
}

pub fn build_locator_prompt(markup: &str) -> String {
    format!(
        r#"You are an expert in web automation. Given the HTML content of a webpage, identify all interactable elements (input fields, buttons, checkboxes, radio buttons, dropdowns) and describe each one in JSON.
Focus only on elements a user can interact with (<input>, <button>, <select>, <textarea>, clickable links). Ignore static <div>, <span> and text.

Return a JSON array of objects with exactly these fields:
- identifier: a meaningful, unique name for the element (e.g. "username", "submit_button"). Prefer id, name, placeholder or label text.
- category: one of "input_field", "button", "checkbox", "radio", "dropdown".
- xpath: a precise XPath that matches only this element.
- css_selector: a precise CSS selector that matches only this element.

Example output:
[
  {{
    "identifier": "username",
    "category": "input_field",
    "xpath": "//input[@id='username' or @name='username']",
    "css_selector": "input#username"
  }},
  {{
    "identifier": "submit_button",
    "category": "button",
    "xpath": "//button[@type='submit']",
    "css_selector": "button[type='submit']"
  }}
]

Return ONLY the JSON array, without any additional text or markdown.

HTML content:
{markup}"#
    )
}

// ============================================================================
// Locator request
// ============================================================================

/// Ask the oracle for the page's locators and keep the usable ones.
///
/// The markup is normalized and bounded before it is embedded. Fails when the
/// oracle gives no JSON list, an empty list, or a list with nothing usable.
pub fn request_locators(
    oracle: &dyn TextInference,
    markup: &str,
    settings: &ExtractionSettings,
) -> Result<Vec<LocatorRecord>> {
    let normalized = normalize_markup(markup);
    let bounded = bound_markup(&normalized, settings.max_markup_chars);
    if bounded.len() < normalized.len() {
        tracing::debug!(
            total_chars = normalized.chars().count(),
            kept_chars = settings.max_markup_chars,
            "Truncated markup for locator prompt"
        );
    }

    let prompt = build_locator_prompt(bounded);
    let value = generate_json(oracle, &prompt, settings.json_attempts)?;

    let entries = value.as_array().ok_or_else(|| {
        PipelineError::validation("extraction", "oracle response is not a JSON list")
    })?;
    if entries.is_empty() {
        return Err(PipelineError::validation(
            "extraction",
            "oracle returned an empty locator list",
        ));
    }

    let set = LocatorSet::from_values(entries);
    tracing::debug!(
        accepted = set.len(),
        rejected = set.rejected().len(),
        "Validated locator candidates"
    );

    if set.is_empty() {
        return Err(PipelineError::validation(
            "extraction",
            format!("none of {} locator candidates were usable", entries.len()),
        ));
    }

    Ok(set.into_records())
}

// ============================================================================
// Element extraction stage
// ============================================================================

/// Extract, validate and persist the locators of one page.
///
/// The accepted list is written to the subject's locator artifact before it
/// is returned, whatever later stages do with it.
pub fn extract_locators(
    oracle: &dyn TextInference,
    markup: &str,
    subject: &str,
    store: &ArtifactStore,
    settings: &ExtractionSettings,
    log: &RunLog,
) -> Result<Vec<LocatorRecord>> {
    log.stage(subject, Stage::Extraction, || {
        let records = request_locators(oracle, markup, settings)?;
        let path = store.locators_path(subject);
        let json = store.write_json(&path, &records)?;
        log.record(
            StageEvent::now(subject, Stage::Extraction, Outcome::Succeeded)
                .with_detail(format!("extracted {} locators", records.len()))
                .with_artifact(&path, &json),
        );
        Ok(records)
    })
}
