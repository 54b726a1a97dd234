//! # Mock Completion Models for Testing
//!
//! Two doubles live here:
//!
//! - `MockCompletionModel` implements rig's `CompletionModel` and returns a
//!   preset response or error, for exercising `Client` without a provider.
//! - `ScriptedCompletion` implements `CompletionService` directly with a
//!   responder closure, so pipeline tests can answer per prompt (fail some
//!   chunks, refuse to shrink, return malformed JSON).

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{CompletionCall, CompletionService, LlmError};

/// A mock rig completion model that returns a predefined response or error.
#[derive(Debug, Clone)]
pub struct MockCompletionModel {
    response: Arc<Mutex<Result<String, String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    /// Creates a mock model that returns an empty text response.
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(Ok(String::new()))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return `text` from subsequent calls.
    pub async fn set_text_response(&self, text: &str) {
        *self.response.lock().await = Ok(text.to_string());
    }

    /// Fail subsequent calls with a provider error.
    pub async fn set_error(&self, message: &str) {
        *self.response.lock().await = Err(message.to_string());
    }

    /// Number of completion requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.lock().await.clone();
        match response {
            Ok(text) => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text(&text)),
                raw_response: text,
            }),
            Err(message) => Err(CompletionError::ProviderError(message)),
        }
    }
}

type Responder = dyn Fn(&CompletionCall) -> Result<String, LlmError> + Send + Sync;

/// A `CompletionService` that answers every call with a closure.
#[derive(Clone)]
pub struct ScriptedCompletion {
    responder: Arc<Responder>,
    calls: Arc<std::sync::Mutex<Vec<CompletionCall>>>,
    latency: Option<Duration>,
}

impl ScriptedCompletion {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CompletionCall) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(std::sync::Mutex::new(Vec::new())),
            latency: None,
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }
}

impl std::fmt::Debug for ScriptedCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedCompletion")
            .field("calls", &self.call_count())
            .finish()
    }
}

impl CompletionService for ScriptedCompletion {
    async fn complete(&self, call: CompletionCall) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        (self.responder)(&call)
    }
}
