//! Answer generation backends
//!
//! A [`Generator`] turns a fully assembled prompt into an answer string.
//! [`OllamaGenerator`] talks to a local Ollama server over HTTP;
//! [`StubGenerator`] is the deterministic in-process double used in tests,
//! demos, and anywhere a model server is unavailable.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Fallback answer produced when generation fails
pub const GENERATION_ERROR_ANSWER: &str = "Error generating answer.";

/// Default cap on newly generated tokens
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 200;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default Ollama server URL
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Options governing one generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum number of newly generated tokens
    pub max_new_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Trait for answer generation from a fully built prompt
pub trait Generator: Send + Sync {
    /// Generate an answer for `prompt`
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Model identifier
    fn model_id(&self) -> &str;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        (**self).generate(prompt, options)
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Strip an echoed prompt from a completion and trim surrounding whitespace.
///
/// Chat model pipelines often return the prompt concatenated with the
/// completion; backends that return only the completion pass through
/// unchanged apart from trimming.
#[must_use]
pub fn strip_prompt_prefix(completion: &str, prompt: &str) -> String {
    completion
        .strip_prefix(prompt)
        .unwrap_or(completion)
        .trim()
        .to_string()
}

// ============================================================
// Ollama backend
// ============================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateRequestOptions,
}

#[derive(Debug, Serialize)]
struct GenerateRequestOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Answer generator backed by a local Ollama server.
///
/// Requests are single-shot with a global timeout and no retries: a failed
/// or hung generation surfaces as an error and the caller degrades to
/// [`GENERATION_ERROR_ANSWER`] rather than waiting on a second attempt.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    agent: ureq::Agent,
}

impl OllamaGenerator {
    /// Create a generator for `model` served at `base_url`.
    ///
    /// Construction is infallible; reachability is checked separately via
    /// [`OllamaGenerator::health_check`].
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            agent: build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
        }
    }

    /// Set the global request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    /// The server URL this generator talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server is reachable and serves the configured model.
    ///
    /// Run once at startup; a failure here means generation cannot work at
    /// all, as opposed to the per-request failures tolerated later.
    pub fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let body = self
            .agent
            .get(&url)
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| {
                Error::ModelLoad(format!(
                    "Ollama server unreachable at {}: {e}",
                    self.base_url
                ))
            })?;

        let tags: TagsResponse = serde_json::from_str(&body)
            .map_err(|e| Error::ModelLoad(format!("invalid Ollama tags response: {e}")))?;

        let available = tags.models.iter().any(|m| {
            m.name == self.model || m.name.split(':').next() == Some(self.model.as_str())
        });
        if !available {
            return Err(Error::ModelLoad(format!(
                "model {} not available on Ollama server at {}",
                self.model, self.base_url
            )));
        }

        info!(model = %self.model, url = %self.base_url, "Ollama model available");
        Ok(())
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateRequestOptions {
                num_predict: options.max_new_tokens,
                temperature: options.temperature,
            },
        };
        let request_json = serde_json::to_string(&request)?;

        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "requesting generation");

        let body = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| Error::Generation(format!("Ollama request failed: {e}")))?;

        let response: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Generation(format!("invalid Ollama response: {e}")))?;

        Ok(strip_prompt_prefix(&response.response, prompt))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================
// Stub backend
// ============================================================

/// Deterministic in-process generator.
///
/// Echoes the prompt ahead of a canned completion the way chat model
/// pipelines return their input, so prompt stripping is exercised on every
/// call. [`StubGenerator::failing`] builds a stub whose calls always error,
/// for driving the degraded-answer path.
#[derive(Debug, Clone)]
pub struct StubGenerator {
    completion: String,
    fail: bool,
}

impl StubGenerator {
    /// Create a stub that completes every prompt with `completion`
    #[must_use]
    pub fn new(completion: impl Into<String>) -> Self {
        Self {
            completion: completion.into(),
            fail: false,
        }
    }

    /// Create a stub whose every call fails
    #[must_use]
    pub fn failing() -> Self {
        Self {
            completion: String::new(),
            fail: true,
        }
    }
}

impl Generator for StubGenerator {
    fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        if self.fail {
            return Err(Error::Generation(
                "stub generator configured to fail".to_string(),
            ));
        }
        let raw = format!("{prompt} {}", self.completion);
        Ok(strip_prompt_prefix(&raw, prompt))
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}
