//! # LLM Client Module
//!
//! This module exposes the language model as a capability: given a preamble
//! and a prompt, return a completion or fail. Everything upstream depends on
//! the `CompletionService` trait, never on a provider directly.
//!
//! ## Key Components
//!
//! - `CompletionService`: the seam used by the summarizer
//! - `CompletionCall`: one request (preamble, prompt, temperature)
//! - `Client`: `rig`-backed implementation that builds an agent per call
//! - `RateLimitedCompletionModel`: `governor` quota wrapper for any rig model
//! - `mock_model`: test doubles at both the rig and the service level
//!
//! Credentials are passed in once at construction; nothing here reads the
//! environment.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use ratelimited_completion::RateLimitedCompletionModel;
use rig::{
    agent::AgentBuilder,
    completion::{CompletionModel, Prompt},
    providers::gemini,
};
use thiserror::Error;
use tracing::{debug, instrument};

pub mod mock_model;
pub mod ratelimited_completion;

/// Default Gemini model used for all calls
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Error type for completion calls
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// The call did not finish within its timeout
    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    /// The provider rejected or failed the call (quota, auth, transport)
    #[error("Completion failed: {0}")]
    Completion(String),
}

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCall {
    /// System instructions for the call
    pub preamble: String,

    /// The user prompt
    pub prompt: String,

    /// Sampling temperature
    pub temperature: f64,
}

impl CompletionCall {
    pub fn new(preamble: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            prompt: prompt.into(),
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Something that turns a prompt into free text
pub trait CompletionService: Send + Sync {
    fn complete(
        &self,
        call: CompletionCall,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Completion client backed by a rig model
#[derive(Debug, Clone)]
pub struct Client<C>
where
    C: CompletionModel,
{
    completion_model: C,
}

impl Client<RateLimitedCompletionModel<gemini::completion::CompletionModel>> {
    /// Create a rate-limited Gemini client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Gemini API key
    /// * `model` - Model name, e.g. `gemini-2.0-flash`
    /// * `requests_per_minute` - Quota enforced before each call
    pub fn new_gemini(api_key: &str, model: &str, requests_per_minute: NonZeroU32) -> Self {
        let gemini_client = gemini::Client::new(api_key);
        let limiter = RateLimiter::direct(Quota::per_minute(requests_per_minute));
        let completion_model =
            RateLimitedCompletionModel::new(gemini_client.completion_model(model), limiter);
        Self { completion_model }
    }
}

impl<C> Client<C>
where
    C: CompletionModel,
{
    /// Wrap any rig completion model
    pub fn new(completion_model: C) -> Self {
        Self { completion_model }
    }

    pub fn completion(&self) -> &C {
        &self.completion_model
    }
}

impl<C> CompletionService for Client<C>
where
    C: CompletionModel + 'static,
{
    #[instrument(name = "completion", skip_all, fields(prompt_len = call.prompt.len()))]
    async fn complete(&self, call: CompletionCall) -> Result<String, LlmError> {
        let agent = AgentBuilder::new(self.completion_model.clone())
            .preamble(&call.preamble)
            .temperature(call.temperature)
            .build();

        debug!("Sending completion");
        agent
            .prompt(call.prompt)
            .await
            .map_err(|e| LlmError::Completion(e.to_string()))
    }
}
