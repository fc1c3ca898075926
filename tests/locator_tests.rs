use page_scribe::locator::extractor::{
    ExtractionSettings, bound_markup, extract_locators, normalize_markup, request_locators,
};
use page_scribe::locator::locator_model::{
    Category, LocatorRecord, LocatorRejection, LocatorSet,
};
use page_scribe::oracle::mock::{MockTextInference, ScriptedTextInference};
use page_scribe::oracle::error::OracleError;
use page_scribe::pipeline::error::PipelineError;
use page_scribe::trace::logger::RunLog;
use page_scribe::trace::trace::{Outcome, Stage};
use serde_json::json;

use crate::common::utils::{LOGIN_LOCATORS, temp_store};

mod common;

// ============================================================================
// Record validation
// ============================================================================

#[test]
fn duplicate_identifier_keeps_first_occurrence() {
    let entries = vec![
        json!({"identifier": "x", "xpath": "//a"}),
        json!({"identifier": "x", "xpath": "//b"}),
    ];
    let set = LocatorSet::from_values(&entries);

    assert_eq!(set.len(), 1);
    assert_eq!(set.records()[0].xpath(), "//a");
    assert_eq!(
        set.rejected(),
        &[LocatorRejection::DuplicateIdentifier("x".into())]
    );
}

#[test]
fn record_without_any_locator_is_dropped() {
    let entries = vec![
        json!({"identifier": "y", "category": "button", "xpath": "", "css_selector": ""}),
        json!({"identifier": "z", "category": "button", "xpath": "   "}),
        json!({"identifier": "w", "category": "button", "css_selector": "button.w"}),
    ];
    let set = LocatorSet::from_values(&entries);

    let ids: Vec<&str> = set.records().iter().map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["w"]);
}

#[test]
fn rejected_duplicate_does_not_block_later_valid_record() {
    // An unusable first occurrence never reserves its identifier.
    let entries = vec![
        json!({"identifier": "x", "xpath": ""}),
        json!({"identifier": "x", "xpath": "//b"}),
    ];
    let set = LocatorSet::from_values(&entries);

    assert_eq!(set.len(), 1);
    assert_eq!(set.records()[0].xpath(), "//b");
}

#[test]
fn non_objects_and_empty_identifiers_are_dropped() {
    let entries = vec![
        json!("just a string"),
        json!(42),
        json!({"identifier": "", "xpath": "//a"}),
        json!({"xpath": "//a"}),
        json!({"identifier": 7, "category": "button", "xpath": "//button[7]"}),
    ];
    let set = LocatorSet::from_values(&entries);

    assert_eq!(set.len(), 1);
    assert_eq!(set.records()[0].identifier(), "7");
    assert_eq!(set.rejected().len(), 4);
}

#[test]
fn category_is_an_open_enumeration() {
    assert_eq!(Category::parse("Input_Field"), Category::InputField);
    assert_eq!(Category::parse("dropdown"), Category::Dropdown);
    assert_eq!(Category::parse("link"), Category::Other("link".into()));
    assert_eq!(Category::parse("link").as_str(), "link");
}

#[test]
fn records_deserialize_through_validation() {
    let ok: LocatorRecord = serde_json::from_value(json!({
        "identifier": "email",
        "category": "input_field",
        "xpath": "//input[@id='email']",
        "css_selector": "input#email"
    }))
    .unwrap();
    assert_eq!(ok.category(), &Category::InputField);
    assert_eq!(ok.human_identifier(), "email");

    let bad = serde_json::from_value::<LocatorRecord>(json!({"identifier": "email"}));
    assert!(bad.is_err());
}

#[test]
fn human_identifier_reads_underscores_as_spaces() {
    let record = LocatorRecord::new("first_name", Category::InputField, "//input", "").unwrap();
    assert_eq!(record.human_identifier(), "first name");
}

// ============================================================================
// Markup preparation
// ============================================================================

#[test]
fn markup_is_normalized_and_bounded() {
    let markup = "<form>\n   <input id='a'>\t\t<button>Go</button>\n</form>";
    let normalized = normalize_markup(markup);
    assert_eq!(normalized, "<form> <input id='a'> <button>Go</button> </form>");
    assert_eq!(bound_markup(&normalized, 6), "<form>");
    assert_eq!(bound_markup(&normalized, 10_000), normalized);
}

#[test]
fn bounding_respects_char_boundaries() {
    assert_eq!(bound_markup("héllo", 2), "hé");
}

#[test]
fn prompt_embeds_only_bounded_markup() {
    let oracle = ScriptedTextInference::new().then_respond(LOGIN_LOCATORS);
    let markup = format!("<div>{}</div>", "x".repeat(5000));
    let settings = ExtractionSettings {
        max_markup_chars: 100,
        ..ExtractionSettings::default()
    };

    request_locators(&oracle, &markup, &settings).unwrap();

    let prompt = &oracle.prompts()[0];
    assert!(prompt.contains(&"x".repeat(95)));
    assert!(!prompt.contains(&"x".repeat(101)));
}

// ============================================================================
// Element extraction stage
// ============================================================================

#[test]
fn extraction_persists_usable_records() {
    let (_dir, store) = temp_store();
    let oracle = MockTextInference::new(LOGIN_LOCATORS);
    let log = RunLog::in_memory();

    let records = extract_locators(
        &oracle,
        "<form></form>",
        "login",
        &store,
        &ExtractionSettings::default(),
        &log,
    )
    .unwrap();

    assert_eq!(records.len(), 2);
    let written = std::fs::read_to_string(store.locators_path("login")).unwrap();
    let parsed: Vec<LocatorRecord> = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed, records);
    assert!(written.contains("\n  "), "locators are written indented");

    let outcomes: Vec<Outcome> = log.events().iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Started, Outcome::Succeeded]);
    assert!(log.events()[1].fingerprint.is_some());
}

#[test]
fn extraction_accepts_fenced_json() {
    let (_dir, store) = temp_store();
    let fenced = format!("```json\n{}\n```", LOGIN_LOCATORS);
    let oracle = MockTextInference::new(&fenced);

    let records = extract_locators(
        &oracle,
        "<form></form>",
        "login",
        &store,
        &ExtractionSettings::default(),
        &RunLog::in_memory(),
    )
    .unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn extraction_with_nothing_usable_fails_and_persists_nothing() {
    let (_dir, store) = temp_store();
    let oracle = MockTextInference::new(r#"[{"identifier": "y", "xpath": "", "css_selector": ""}]"#);
    let log = RunLog::in_memory();

    let err = extract_locators(
        &oracle,
        "<form></form>",
        "login",
        &store,
        &ExtractionSettings::default(),
        &log,
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Validation { stage: "extraction", .. }));
    assert!(!store.locators_path("login").exists());

    let last = log.events().pop().unwrap();
    assert_eq!(last.stage, Stage::Extraction);
    assert_eq!(last.outcome, Outcome::Failed);
    assert_eq!(last.error_kind.as_deref(), Some("validation"));
}

#[test]
fn extraction_rejects_empty_list_and_non_list() {
    let (_dir, store) = temp_store();
    for response in ["[]", r#"{"identifier": "x", "xpath": "//a"}"#] {
        let err = extract_locators(
            &MockTextInference::new(response),
            "<form></form>",
            "login",
            &store,
            &ExtractionSettings::default(),
            &RunLog::in_memory(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }), "{}", response);
    }
}

#[test]
fn extraction_surfaces_oracle_failure() {
    let (_dir, store) = temp_store();
    let oracle = ScriptedTextInference::new().then_fail(OracleError::Timeout { secs: 120 });

    let err = extract_locators(
        &oracle,
        "<form></form>",
        "login",
        &store,
        &ExtractionSettings::default(),
        &RunLog::in_memory(),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Oracle(OracleError::Timeout { secs: 120 })));
    assert_eq!(oracle.calls(), 1);
}
