//! LLM backends behind the planning oracle.
//!
//! Uses enum dispatch: [`EngineOracle`] is either the fixed-answer stub or
//! an HTTP backend, and [`LlmBackend`] picks between an OpenAI-compatible
//! chat completions API and the Anthropic Messages API. All HTTP traffic
//! goes through `reqwest` with the configured request timeout; the tick
//! cycle applies its own per-call deadline on top.
//!
//! The oracle does not care which model answers -- it sends the rendered
//! prompt and returns whatever text comes back.

use std::time::Duration;

use swarm_core::config::LlmConfig;
use swarm_core::oracle::{InferenceOracle, OracleError, StubOracle};

use crate::error::EngineError;

/// System instruction sent with every planning prompt.
const SYSTEM_PROMPT: &str = "You steer one agent of an exploration swarm. \
Reply with a direction word (up, down, left, or right) and nothing else.";

/// The oracle the engine runs with.
pub enum EngineOracle {
    /// Fixed answer from `llm.stub_response`.
    Stub(StubOracle),
    /// An HTTP LLM backend.
    Llm(LlmBackend),
}

impl EngineOracle {
    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Stub(_) => "stub",
            Self::Llm(backend) => backend.name(),
        }
    }
}

impl InferenceOracle for EngineOracle {
    async fn infer(&self, prompt: &str) -> Result<String, OracleError> {
        match self {
            Self::Stub(stub) => stub.infer(prompt).await,
            Self::Llm(backend) => backend.complete(prompt).await,
        }
    }
}

/// An HTTP LLM backend.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Send a prompt to the LLM and return the response text.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt).await,
            Self::Anthropic(backend) => backend.complete(prompt).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

/// Connection settings shared by both HTTP backends.
struct Endpoint {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl Endpoint {
    fn new(config: &LlmConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

/// Read a JSON body, turning HTTP failures into backend errors.
async fn read_json(
    response: Result<reqwest::Response, reqwest::Error>,
    backend: &str,
) -> Result<serde_json::Value, OracleError> {
    let response = response.map_err(|e| backend_error(format!("{backend} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_e| "unable to read error body".to_owned());
        return Err(backend_error(format!(
            "{backend} returned {status}: {error_body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| backend_error(format!("{backend} response parse failed: {e}")))
}

const fn backend_error(message: String) -> OracleError {
    OracleError::Backend { message }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with `OpenAI`, `DeepSeek`, and Ollama endpoints.
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    endpoint: Endpoint,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, EngineError> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let endpoint = &self.endpoint;
        let url = format!("{}/chat/completions", endpoint.api_url);

        let body = serde_json::json!({
            "model": endpoint.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.2,
            "max_tokens": endpoint.max_tokens
        });

        let response = endpoint
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", endpoint.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        let json = read_json(response, "OpenAI").await?;
        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            backend_error("OpenAI response missing choices[0].message.content".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic uses a different request format from `OpenAI`:
/// - Uses `x-api-key` header instead of `Authorization: Bearer`
/// - System text is a top-level field, not a message
/// - Response structure differs: `content[0].text`
pub struct AnthropicBackend {
    endpoint: Endpoint,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, EngineError> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let endpoint = &self.endpoint;
        let url = format!("{}/messages", endpoint.api_url);

        let body = serde_json::json!({
            "model": endpoint.model,
            "max_tokens": endpoint.max_tokens,
            "system": SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let response = endpoint
            .client
            .post(&url)
            .header("x-api-key", &endpoint.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        let json = read_json(response, "Anthropic").await?;
        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| backend_error("Anthropic response missing content[0].text".to_owned()))
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create the engine oracle named by `llm.backend`.
///
/// `openai`, `deepseek`, and `ollama` share the OpenAI-compatible wire
/// format; `anthropic` uses the Messages API; `stub` answers
/// `llm.stub_response` without any network traffic.
///
/// # Errors
///
/// Returns [`EngineError::UnknownBackend`] for any other name and
/// [`EngineError::Http`] if the HTTP client cannot be built.
pub fn create_oracle(config: &LlmConfig) -> Result<EngineOracle, EngineError> {
    match config.backend.to_ascii_lowercase().as_str() {
        "stub" => Ok(EngineOracle::Stub(StubOracle::respond(&config.stub_response))),
        "openai" | "deepseek" | "ollama" => Ok(EngineOracle::Llm(LlmBackend::OpenAi(
            OpenAiBackend::new(config)?,
        ))),
        "anthropic" => Ok(EngineOracle::Llm(LlmBackend::Anthropic(
            AnthropicBackend::new(config)?,
        ))),
        _ => Err(EngineError::UnknownBackend {
            name: config.backend.clone(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(backend: &str) -> LlmConfig {
        LlmConfig {
            backend: backend.to_owned(),
            api_key: "test".to_owned(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "Head right, toward the quiet region."
                }
            }]
        });
        let result = extract_openai_content(&json);
        assert!(result.unwrap().contains("right"));
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        let result = extract_openai_content(&json);
        assert!(matches!(result, Err(OracleError::Backend { .. })));
    }

    #[test]
    fn extract_anthropic_content_valid() {
        let json = serde_json::json!({
            "content": [{
                "type": "text",
                "text": "up"
            }]
        });
        assert_eq!(extract_anthropic_content(&json).unwrap(), "up");
    }

    #[test]
    fn extract_anthropic_content_missing() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_content(&json).is_err());
    }

    #[test]
    fn create_oracle_dispatches_correctly() {
        assert_eq!(create_oracle(&config("stub")).unwrap().name(), "stub");
        assert_eq!(
            create_oracle(&config("OpenAI")).unwrap().name(),
            "openai-compatible"
        );
        assert_eq!(
            create_oracle(&config("ollama")).unwrap().name(),
            "openai-compatible"
        );
        assert_eq!(
            create_oracle(&config("anthropic")).unwrap().name(),
            "anthropic"
        );
        assert!(matches!(
            create_oracle(&config("carrier-pigeon")),
            Err(EngineError::UnknownBackend { .. })
        ));
    }

    #[tokio::test]
    async fn stub_backend_answers_configured_text() {
        let mut cfg = config("stub");
        cfg.stub_response = "left".to_owned();
        let oracle = create_oracle(&cfg).unwrap();
        assert_eq!(oracle.infer("anything").await.unwrap(), "left");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_backend_error() {
        let mut cfg = config("openai");
        cfg.api_url = "http://127.0.0.1:9".to_owned();
        cfg.request_timeout_ms = 500;
        let oracle = create_oracle(&cfg).unwrap();
        let err = oracle.infer("which way?").await.unwrap_err();
        assert!(matches!(err, OracleError::Backend { .. }));
    }
}
