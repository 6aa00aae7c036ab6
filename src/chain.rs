//! The advisor chain: an explicit ordered list of advisors plus a
//! cursor-based invoker.
//!
//! Advisors are sorted ascending by order at construction. Each invocation
//! walks the list through a [`ChainCursor`]; past the last advisor, the
//! cursor calls the terminal model. The cursor is a cheap copyable view, so
//! an advisor that needs to re-drive the rest of the chain (the evaluation
//! loop does, once per attempt) just calls `next` again.
//!
//! The assembled chain also implements `tower::Service<ChatRequest>` so it
//! composes with Tower stacks.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;

use crate::advisor::Advisor;
use crate::error::Result;
use crate::items::{ChatRequest, ChatResponse};
use crate::model::{ChatModel, ResponseStream};

/// An immutable, ordered pipeline of advisors terminated by a chat model.
#[derive(Clone)]
pub struct AdvisorChain {
    advisors: Arc<[Arc<dyn Advisor>]>,
    model: Arc<dyn ChatModel>,
}

impl AdvisorChain {
    /// Build a chain over `advisors` and a terminal `model`. Advisors are
    /// invoked in ascending order; ties keep insertion order.
    pub fn new(mut advisors: Vec<Arc<dyn Advisor>>, model: Arc<dyn ChatModel>) -> Self {
        advisors.sort_by_key(|a| a.order());
        Self {
            advisors: advisors.into(),
            model,
        }
    }

    fn cursor(&self) -> ChainCursor<'_> {
        ChainCursor {
            advisors: &self.advisors,
            model: &*self.model,
            index: 0,
        }
    }

    /// Run a materialized call through the full chain.
    pub async fn call(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.cursor().next(request).await
    }

    /// Run a streaming call through the full chain.
    pub async fn stream(&self, request: ChatRequest) -> Result<ResponseStream> {
        self.cursor().next_stream(request).await
    }

    /// Names of the advisors in invocation order.
    pub fn advisor_names(&self) -> Vec<&str> {
        self.advisors.iter().map(|a| a.name()).collect()
    }
}

/// A view over the remaining advisors of a chain.
///
/// `Copy`, so advisors can call `next` as many times as they need; every call
/// re-enters the chain at the same position.
#[derive(Clone, Copy)]
pub struct ChainCursor<'a> {
    advisors: &'a [Arc<dyn Advisor>],
    model: &'a dyn ChatModel,
    index: usize,
}

impl<'a> ChainCursor<'a> {
    /// Invoke the next advisor, or the terminal model past the end.
    pub async fn next(&self, request: ChatRequest) -> Result<ChatResponse> {
        match self.advisors.get(self.index) {
            Some(advisor) => {
                let rest = ChainCursor {
                    index: self.index + 1,
                    ..*self
                };
                advisor.advise_call(request, rest).await
            }
            None => self.model.call(request).await,
        }
    }

    /// Streaming counterpart of [`ChainCursor::next`].
    pub async fn next_stream(&self, request: ChatRequest) -> Result<ResponseStream> {
        match self.advisors.get(self.index) {
            Some(advisor) => {
                let rest = ChainCursor {
                    index: self.index + 1,
                    ..*self
                };
                advisor.advise_stream(request, rest).await
            }
            None => self.model.stream(request).await,
        }
    }
}

impl tower::Service<ChatRequest> for AdvisorChain {
    type Response = ChatResponse;
    type Error = crate::error::AdvisorError;
    type Future = BoxFuture<'static, Result<ChatResponse>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ChatRequest) -> Self::Future {
        let chain = self.clone();
        Box::pin(async move { chain.call(request).await })
    }
}
