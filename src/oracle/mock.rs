use std::cell::RefCell;
use std::collections::VecDeque;

use crate::oracle::error::OracleError;
use crate::oracle::ollama::TextInference;

// ============================================================================
// Mock backends (for running the pipeline without Ollama)
// ============================================================================

/// Always answers with the same canned response.
pub struct MockTextInference {
    pub response: String,
}

impl MockTextInference {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl TextInference for MockTextInference {
    fn infer_text(&self, _prompt: &str) -> Result<String, OracleError> {
        Ok(self.response.clone())
    }
}

/// Plays back a queue of outcomes, one per call, and records every prompt it
/// receives. An exhausted script fails like an unreachable service.
#[derive(Default)]
pub struct ScriptedTextInference {
    outcomes: RefCell<VecDeque<Result<String, OracleError>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedTextInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_respond(self, response: &str) -> Self {
        self.outcomes
            .borrow_mut()
            .push_back(Ok(response.to_string()));
        self
    }

    pub fn then_fail(self, error: OracleError) -> Self {
        self.outcomes.borrow_mut().push_back(Err(error));
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl TextInference for ScriptedTextInference {
    fn infer_text(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("script exhausted".into())))
    }
}
