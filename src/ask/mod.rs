//! Direct-prompt flow: one question in, one answer string out.
//!
//! Failures never escape [`ask`]. Each kind of failure becomes a distinct,
//! human-readable string so the caller can print whatever comes back.


use tracing::{debug, warn};

use crate::ollama::{OllamaClient, OllamaError};

/// Returned when the server answers 200 but the body has no `response` field
pub const NO_RESPONSE_MESSAGE: &str = "Error: the model did not return a response.";

/// Question asked when none is given on the command line
pub const DEFAULT_QUESTION: &str = "What is the capital of Brazil?";

/// Send `question` to `model` through `/api/generate` and return the answer,
/// or a descriptive error message. The request is made exactly once.
#[inline]
pub fn ask(client: &OllamaClient, model: &str, question: &str) -> String {
    debug!("Asking {} a direct question", model);

    let client = client.clone().with_retry_attempts(1);
    match client.generate(model, question) {
        Ok(answer) => answer,
        Err(error) => {
            warn!("Direct prompt failed: {}", error);
            describe_failure(&error, model)
        }
    }
}

fn describe_failure(error: &OllamaError, model: &str) -> String {
    match error {
        OllamaError::MissingField(_) => NO_RESPONSE_MESSAGE.to_string(),
        OllamaError::Status(status) => format!(
            "Request failed with status code {}. Check that Ollama is running.",
            status
        ),
        OllamaError::Connection(_) => format!(
            "Connection error: make sure Ollama is running and the model '{}' has been downloaded.",
            model
        ),
        OllamaError::Timeout(_) => format!(
            "Request timed out waiting for model '{}'. Ollama is reachable but did not answer in time.",
            model
        ),
        other => format!("An error occurred: {}", other),
    }
}
