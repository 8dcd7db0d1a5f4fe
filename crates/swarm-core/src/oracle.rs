//! Inference oracle trait and in-process implementations.
//!
//! During the plan phase of the tick cycle, every agent with fresh knowledge
//! renders a prompt and asks an [`InferenceOracle`] for a movement answer.
//! The trait abstracts the mechanism -- an LLM backend, a scripted stub, or a
//! closure in a test.
//!
//! The oracle is shared by reference across all agents of a tick and called
//! concurrently, so implementations must be `Sync`. The core applies its own
//! deadline around each call and does not retry.

use std::future::Future;

/// Errors an oracle call can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The call did not finish before the deadline.
    #[error("oracle timed out (deadline: {deadline_ms}ms)")]
    Timeout {
        /// The deadline in milliseconds.
        deadline_ms: u64,
    },

    /// The backend failed or returned an unusable answer.
    #[error("oracle backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

/// A source of natural-language planning answers.
pub trait InferenceOracle: Send + Sync {
    /// Answer `prompt` with free text.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if the answer cannot be produced.
    fn infer(&self, prompt: &str) -> impl Future<Output = Result<String, OracleError>> + Send;
}

/// An oracle that gives the same answer, or the same failure, every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubOracle {
    /// Always answer with this text.
    Respond(String),
    /// Always fail with this message.
    Fail(String),
}

impl StubOracle {
    /// An oracle that always answers `text`.
    pub fn respond(text: &str) -> Self {
        Self::Respond(text.to_owned())
    }

    /// An oracle that always fails with `message`.
    pub fn fail(message: &str) -> Self {
        Self::Fail(message.to_owned())
    }
}

impl InferenceOracle for StubOracle {
    async fn infer(&self, _prompt: &str) -> Result<String, OracleError> {
        match self {
            Self::Respond(text) => Ok(text.clone()),
            Self::Fail(message) => Err(OracleError::Backend {
                message: message.clone(),
            }),
        }
    }
}

/// An oracle driven by a synchronous closure over the prompt.
///
/// Useful for answers that depend on the asking agent, which the closure
/// can read from the prompt text.
pub struct FnOracle<F> {
    answer: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&str) -> Result<String, OracleError> + Send + Sync,
{
    /// Wrap `answer`.
    pub const fn new(answer: F) -> Self {
        Self { answer }
    }
}

impl<F> InferenceOracle for FnOracle<F>
where
    F: Fn(&str) -> Result<String, OracleError> + Send + Sync,
{
    async fn infer(&self, prompt: &str) -> Result<String, OracleError> {
        (self.answer)(prompt)
    }
}

impl<F> std::fmt::Debug for FnOracle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOracle").finish_non_exhaustive()
    }
}
