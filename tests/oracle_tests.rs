use std::time::Duration;

use page_scribe::oracle::error::OracleError;
use page_scribe::oracle::mock::{MockTextInference, ScriptedTextInference};
use page_scribe::oracle::ollama::{OllamaBackend, TextInference};
use page_scribe::oracle::response::{
    JSON_RETRY_DIRECTIVE, generate_json, generate_text, parse_json_response, strip_code_fence,
};
use serde_json::json;

// ============================================================================
// generate_text
// ============================================================================

#[test]
fn blank_response_is_a_failure() {
    for blank in ["", "   ", "\n\t\n"] {
        let err = generate_text(&MockTextInference::new(blank), "prompt").unwrap_err();
        assert!(matches!(err, OracleError::EmptyResponse), "{:?}", blank);
    }
}

#[test]
fn text_is_returned_verbatim() {
    let text = generate_text(&MockTextInference::new("  Feature: x\n"), "prompt").unwrap();
    assert_eq!(text, "  Feature: x\n");
}

// ============================================================================
// generate_json
// ============================================================================

#[test]
fn json_retry_appends_directive_each_time() {
    let oracle = ScriptedTextInference::new()
        .then_respond("Sure! Here are the locators:")
        .then_respond("still not json")
        .then_respond(r#"[{"identifier": "a"}]"#);

    let value = generate_json(&oracle, "base prompt", 3).unwrap();
    assert_eq!(value, json!([{"identifier": "a"}]));

    let prompts = oracle.prompts();
    assert_eq!(prompts.len(), 3);
    assert_eq!(prompts[0], "base prompt");
    assert_eq!(prompts[1], format!("base prompt{}", JSON_RETRY_DIRECTIVE));
    assert_eq!(
        prompts[2],
        format!("base prompt{}{}", JSON_RETRY_DIRECTIVE, JSON_RETRY_DIRECTIVE)
    );
}

#[test]
fn json_gives_up_after_attempt_budget() {
    let oracle = ScriptedTextInference::new()
        .then_respond("nope")
        .then_respond("nope")
        .then_respond("nope")
        .then_respond("[]");

    let err = generate_json(&oracle, "p", 3).unwrap_err();
    assert!(matches!(err, OracleError::InvalidJson { attempts: 3, .. }));
    assert_eq!(oracle.calls(), 3);
}

#[test]
fn transport_failure_is_not_retried() {
    let oracle = ScriptedTextInference::new()
        .then_fail(OracleError::Transport("connection refused".into()))
        .then_respond("[]");

    let err = generate_json(&oracle, "p", 3).unwrap_err();
    assert!(matches!(err, OracleError::Transport(_)));
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn timeout_is_not_retried() {
    let oracle = ScriptedTextInference::new()
        .then_fail(OracleError::Timeout { secs: 120 })
        .then_respond("[]");

    assert!(matches!(
        generate_json(&oracle, "p", 3),
        Err(OracleError::Timeout { secs: 120 })
    ));
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn blank_json_response_is_not_retried() {
    let oracle = ScriptedTextInference::new().then_respond("  ").then_respond("[]");

    assert!(matches!(
        generate_json(&oracle, "p", 3),
        Err(OracleError::EmptyResponse)
    ));
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn fenced_json_parses() {
    let value = parse_json_response("```json\n[1, 2]\n```").unwrap();
    assert_eq!(value, json!([1, 2]));
}

// ============================================================================
// strip_code_fence
// ============================================================================

#[test]
fn fence_markers_are_removed() {
    let response = "```typescript\nimport { test } from '@playwright/test';\n\ntest('a', async () => {});\n```";
    assert_eq!(
        strip_code_fence(response),
        "import { test } from '@playwright/test';\n\ntest('a', async () => {});"
    );
}

#[test]
fn trailing_chatter_after_fence_is_dropped() {
    let response = "```ts\nconst a = 1;\n```\nLet me know if you need anything else!";
    assert_eq!(strip_code_fence(response), "const a = 1;");
}

#[test]
fn unfenced_response_is_unchanged() {
    let response = "import { test } from '@playwright/test';\n";
    assert_eq!(strip_code_fence(response), response);
}

#[test]
fn unterminated_fence_passes_through() {
    assert_eq!(strip_code_fence("```ts"), "```ts");
}

// ============================================================================
// OllamaBackend
// ============================================================================

#[test]
fn backend_defaults() {
    let backend = OllamaBackend::default();
    assert_eq!(backend.endpoint, "http://localhost:11434/api/generate");
    assert_eq!(backend.timeout, Duration::from_secs(120));
}

#[test]
fn unreachable_endpoint_is_a_transport_failure() {
    let backend = OllamaBackend::new("http://127.0.0.1:9/api/generate", "any")
        .with_timeout(Duration::from_secs(5));

    let err = backend.infer_text("hello").unwrap_err();
    assert!(
        matches!(err, OracleError::Transport(_) | OracleError::Timeout { .. }),
        "{:?}",
        err
    );
}
