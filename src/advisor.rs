//! The advisor interface: ordered interception points around model calls.
//!
//! Advisors are the middleware of the chat pipeline. Each advisor carries an
//! integer order; the chain invokes advisors in ascending order and hands
//! each one a cursor over the rest of the chain.

use async_trait::async_trait;

use crate::chain::ChainCursor;
use crate::error::Result;
use crate::items::{ChatRequest, ChatResponse};
use crate::model::ResponseStream;

/// Smallest order value; runs first.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Largest order value; runs last.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// An ordered interception point in the request/response pipeline.
///
/// `advise_call` may inspect, rewrite, or short-circuit the request before
/// delegating to `chain.next(..)`, and may do the same with the response on
/// the way back. `advise_stream` defaults to pure passthrough; advisors that
/// cannot operate on incremental output override it to fail.
#[async_trait]
pub trait Advisor: Send + Sync {
    fn name(&self) -> &str;

    fn order(&self) -> i32 {
        0
    }

    async fn advise_call(
        &self,
        request: ChatRequest,
        chain: ChainCursor<'_>,
    ) -> Result<ChatResponse>;

    async fn advise_stream(
        &self,
        request: ChatRequest,
        chain: ChainCursor<'_>,
    ) -> Result<ResponseStream> {
        chain.next_stream(request).await
    }
}
