use thiserror::Error;

/// Failure of a round-trip to the text generation service.
#[derive(Error, Debug)]
pub enum OracleError {
    /// Connection refused, DNS failure, broken body, ...
    #[error("Oracle transport error: {0}")]
    Transport(String),

    #[error("Oracle request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but the response text was empty or whitespace.
    #[error("Oracle returned an empty response")]
    EmptyResponse,

    /// The response envelope itself could not be decoded.
    #[error("Malformed oracle envelope: {0}")]
    Envelope(String),

    /// Every attempt of a JSON-shaped request produced unparseable text.
    #[error("Oracle produced no valid JSON after {attempts} attempts: {last_error}")]
    InvalidJson { attempts: u32, last_error: String },
}
