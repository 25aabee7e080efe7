
pub mod errors;

pub use errors::OllamaError;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::OllamaConfig;

const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Blocking client for the Ollama HTTP API
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self, OllamaError> {
        let base_url = config
            .ollama_url()
            .map_err(|e| OllamaError::Url(e.to_string()))?;

        Ok(Self {
            base_url,
            agent: Self::build_agent(Some(config.timeout())),
            retry_attempts: config.retry_attempts.clamp(1, MAX_RETRY_ATTEMPTS),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = Self::build_agent(Some(timeout));
        self
    }

    /// Wait for responses however long the model takes
    #[inline]
    pub fn without_timeout(mut self) -> Self {
        self.agent = Self::build_agent(None);
        self
    }

    /// Total attempts per request, clamped to 1..=10
    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.clamp(1, MAX_RETRY_ATTEMPTS);
        self
    }

    fn build_agent(timeout: Option<Duration>) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build()
            .into()
    }

    /// Test connection to the Ollama server and verify model availability
    #[inline]
    pub fn health_check(&self, model: &str) -> Result<(), OllamaError> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        self.ping()?;
        self.validate_model(model)?;

        info!(
            "Health check passed for Ollama server at {} with model {}",
            self.base_url, model
        );
        Ok(())
    }

    /// Ping the Ollama server to check if it's responsive
    #[inline]
    pub fn ping(&self) -> Result<(), OllamaError> {
        debug!("Pinging Ollama server at {}", self.base_url);
        self.get("/api/tags")?;
        debug!("Server ping successful");
        Ok(())
    }

    /// Validate that `model` has been pulled. A bare name matches its
    /// `:latest` tag.
    #[inline]
    pub fn validate_model(&self, model: &str) -> Result<(), OllamaError> {
        debug!("Validating model: {}", model);

        let models = self.list_models()?;

        if models.iter().any(|m| model_names_match(&m.name, model)) {
            debug!("Model {} is available", model);
            Ok(())
        } else {
            let available: Vec<String> = models.into_iter().map(|m| m.name).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                model, available
            );
            Err(OllamaError::ModelNotFound {
                model: model.to_string(),
                available,
            })
        }
    }

    /// List all locally available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>, OllamaError> {
        let response_text = self.get("/api/tags")?;

        let models_response: ModelsResponse = serde_json::from_str(&response_text)
            .map_err(|e| OllamaError::InvalidResponse(e.to_string()))?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// Send a single non-streaming prompt to `/api/generate` and return the
    /// `response` text.
    #[inline]
    pub fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError> {
        debug!(
            "Generating with model {} (prompt length: {})",
            model,
            prompt.len()
        );

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response_text = self.post_json("/api/generate", &request)?;
        let response: GenerateResponse = serde_json::from_str(&response_text)
            .map_err(|e| OllamaError::InvalidResponse(e.to_string()))?;

        response.response.ok_or(OllamaError::MissingField("response"))
    }

    /// Send a chat exchange to `/api/chat` and return the assistant message
    /// content.
    #[inline]
    pub fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, OllamaError> {
        debug!(
            "Chatting with model {} ({} messages, temperature {})",
            model,
            messages.len(),
            temperature
        );

        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: ChatOptions { temperature },
        };

        let response_text = self.post_json("/api/chat", &request)?;
        let response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| OllamaError::InvalidResponse(e.to_string()))?;

        response
            .message
            .map(|message| message.content)
            .ok_or(OllamaError::MissingField("message"))
    }

    /// Embed every input with `/api/embed`. The result has one vector per
    /// input, in input order.
    #[inline]
    pub fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, OllamaError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", inputs.len());

        let request = EmbedRequest {
            model,
            input: inputs,
        };

        let response_text = self.post_json("/api/embed", &request)?;
        let response: EmbedResponse = serde_json::from_str(&response_text)
            .map_err(|e| OllamaError::InvalidResponse(e.to_string()))?;

        if response.embeddings.len() != inputs.len() {
            return Err(OllamaError::InvalidResponse(format!(
                "Mismatch between request and response counts: {} vs {}",
                inputs.len(),
                response.embeddings.len()
            )));
        }

        debug!(
            "Generated {} embeddings with {} dimensions",
            response.embeddings.len(),
            response.embeddings.first().map_or(0, Vec::len)
        );
        Ok(response.embeddings)
    }

    fn endpoint(&self, path: &str) -> Result<Url, OllamaError> {
        self.base_url
            .join(path)
            .map_err(|e| OllamaError::Url(e.to_string()))
    }

    fn get(&self, path: &str) -> Result<String, OllamaError> {
        let url = self.endpoint(path)?;
        self.make_request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<String, OllamaError> {
        let url = self.endpoint(path)?;
        let request_json = serde_json::to_string(body)
            .map_err(|e| OllamaError::Request(format!("Failed to serialize request: {}", e)))?;

        self.make_request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String, OllamaError>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut attempt = 1;

        loop {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            let error = match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => OllamaError::from(error),
            };

            if !error.is_retryable() {
                warn!("Non-retryable error: {}", error);
                return Err(error);
            }

            if attempt >= self.retry_attempts {
                error!(
                    "All {} attempts failed for request to {}: {}",
                    self.retry_attempts, self.base_url, error
                );
                return Err(error);
            }

            warn!(
                "Request failed: {}, attempt {}/{}",
                error, attempt, self.retry_attempts
            );

            let delay = Duration::from_millis(
                EXPONENTIAL_BACKOFF_BASE
                    .saturating_pow(attempt - 1)
                    .saturating_mul(1000),
            );
            debug!("Waiting {:?} before retry", delay);
            std::thread::sleep(delay);
            attempt += 1;
        }
    }
}

fn model_names_match(available: &str, requested: &str) -> bool {
    available == requested
        || (!requested.contains(':') && available.strip_suffix(":latest") == Some(requested))
}
