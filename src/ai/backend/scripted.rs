//! Scripted backend for tests: replays canned steps and records prompts.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::{Completion, CompletionRequest, HealthStatus, ModelBackend};
use crate::types::{DocForgeError, Result};

pub(crate) const SCRIPTED_ENDPOINT: &str = "http://scripted.test";
pub(crate) const SCRIPTED_MODEL: &str = "scripted-model";

pub(crate) enum Step {
    Reply(String),
    ConnectionFailure,
    ModelFailure(String),
    /// Never completes
    Hang,
    /// Waits for the notify, then replies
    Gated(Arc<Notify>, String),
}

pub(crate) struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    fallback: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with the same text on every call
    pub(crate) fn always(text: impl Into<String>) -> Self {
        let mut backend = Self::new(Vec::new());
        backend.fallback = Some(text.into());
        backend
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.clone());

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(Completion::text_only(text)),
            Some(Step::ConnectionFailure) => Err(DocForgeError::connection(
                SCRIPTED_ENDPOINT,
                "connection refused",
            )),
            Some(Step::ModelFailure(message)) => Err(DocForgeError::model(SCRIPTED_MODEL, message)),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Gated(gate, text)) => {
                gate.notified().await;
                Ok(Completion::text_only(text))
            }
            None => match &self.fallback {
                Some(text) => Ok(Completion::text_only(text.clone())),
                None => Err(DocForgeError::model(SCRIPTED_MODEL, "script exhausted")),
            },
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        SCRIPTED_MODEL
    }

    fn endpoint(&self) -> &str {
        SCRIPTED_ENDPOINT
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        Ok(HealthStatus {
            provider: "scripted".to_string(),
            endpoint: SCRIPTED_ENDPOINT.to_string(),
            model: SCRIPTED_MODEL.to_string(),
            reachable: true,
            model_available: true,
            detail: "scripted".to_string(),
        })
    }
}
