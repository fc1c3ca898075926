use serde_json::Value;

use crate::oracle::error::OracleError;
use crate::oracle::ollama::TextInference;

pub const DEFAULT_JSON_ATTEMPTS: u32 = 3;

/// Appended to the prompt after each response that failed to parse.
pub const JSON_RETRY_DIRECTIVE: &str = "\n\nCRITICAL: The output MUST be a valid JSON array. \
Do not include any text, explanations, or markdown syntax before or after the JSON content.";

/// One oracle round-trip. A blank response counts as a failure.
pub fn generate_text(oracle: &dyn TextInference, prompt: &str) -> Result<String, OracleError> {
    let response = oracle.infer_text(prompt)?;
    if response.trim().is_empty() {
        tracing::warn!("Oracle returned a successful status but empty content");
        return Err(OracleError::EmptyResponse);
    }
    Ok(response)
}

/// Request JSON from the oracle.
///
/// Retries up to `attempts` times while the response does not parse, each
/// time appending [`JSON_RETRY_DIRECTIVE`] to the prompt. Transport failures,
/// timeouts and blank responses end the loop immediately.
pub fn generate_json(
    oracle: &dyn TextInference,
    prompt: &str,
    attempts: u32,
) -> Result<Value, OracleError> {
    let attempts = attempts.max(1);
    let mut prompt = prompt.to_string();
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        let response = generate_text(oracle, &prompt)?;
        match parse_json_response(&response) {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to parse JSON from oracle");
                last_error = e.to_string();
                if attempt < attempts {
                    prompt.push_str(JSON_RETRY_DIRECTIVE);
                }
            }
        }
    }

    Err(OracleError::InvalidJson {
        attempts,
        last_error,
    })
}

/// Parse a JSON response, tolerating a surrounding code fence.
pub fn parse_json_response(response: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_code_fence(response).trim())
}

/// Remove a Markdown code fence wrapped around a response.
///
/// Only text that opens with a fence is touched: everything up to the end of
/// the opening fence line and from the last closing fence onward is dropped.
/// When the closing fence cannot be found the text is returned unchanged.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("```") {
        return text.to_string();
    }

    let body_start = match trimmed.find('\n') {
        Some(i) => i + 1,
        None => {
            tracing::warn!("Code fence has no body; keeping raw response");
            return text.to_string();
        }
    };

    match trimmed.rfind("```") {
        Some(end) if end >= body_start => trimmed[body_start..end].trim().to_string(),
        _ => {
            tracing::warn!("Could not locate closing code fence; keeping raw response");
            text.to_string()
        }
    }
}
