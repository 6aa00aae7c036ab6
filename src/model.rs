//! Chat model abstraction.
//!
//! The advisor chain treats the model-calling collaborator as an opaque
//! capability: one blocking call in, one response out. Provider adapters map
//! their transport errors into [`AdvisorError::Model`]; the chain never
//! retries transport failures itself.
//!
//! For testing and demos, [`ScriptedModel`] returns a fixed sequence of
//! responses and counts how often it was called, so loop invariants can be
//! asserted without a network.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{stream, Stream};

use crate::error::{AdvisorError, Result};
use crate::items::{ChatRequest, ChatResponse};

/// A stream of incremental chat responses.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<ChatResponse>> + Send>>;

/// Capability trait for a chat model collaborator.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Issue a single blocking call and return the materialized response.
    async fn call(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Issue a streaming call. Models that only support materialized calls
    /// keep this default.
    async fn stream(&self, request: ChatRequest) -> Result<ResponseStream> {
        let _ = request;
        Err(AdvisorError::unsupported_mode(
            "this model does not support streaming",
        ))
    }
}

/// A model that replays a fixed script of responses, in order.
///
/// Each `call` pops the next scripted response; running past the end of the
/// script is a model error. `calls()` reports how many calls were made.
#[derive(Clone)]
pub struct ScriptedModel {
    script: Arc<Mutex<VecDeque<ChatResponse>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of calls made so far (streaming calls included).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn pop(&self) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self
            .script
            .lock()
            .map_err(|_| AdvisorError::model("scripted model lock poisoned"))?;
        script
            .pop_front()
            .ok_or_else(|| AdvisorError::model("scripted model ran out of responses"))
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn call(&self, _request: ChatRequest) -> Result<ChatResponse> {
        self.pop()
    }

    async fn stream(&self, _request: ChatRequest) -> Result<ResponseStream> {
        let response = self.pop()?;
        let s: ResponseStream = Box::pin(stream::iter(vec![Ok(response)]));
        Ok(s)
    }
}
