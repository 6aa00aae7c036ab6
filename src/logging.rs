//! Passthrough logging advisor.
//!
//! Logs the serialized conversation before delegating and the serialized
//! response on the way back, without touching either. Supports both call and
//! stream modes; streamed items are logged as they pass through.

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::advisor::Advisor;
use crate::chain::ChainCursor;
use crate::error::Result;
use crate::items::{ChatRequest, ChatResponse};
use crate::model::ResponseStream;

/// A middleware that logs requests and responses at `DEBUG` level.
pub struct LoggingAdvisor {
    order: i32,
}

impl LoggingAdvisor {
    pub fn new(order: i32) -> Self {
        Self { order }
    }
}

#[async_trait]
impl Advisor for LoggingAdvisor {
    fn name(&self) -> &str {
        "logging"
    }

    fn order(&self) -> i32 {
        self.order
    }

    async fn advise_call(
        &self,
        request: ChatRequest,
        chain: ChainCursor<'_>,
    ) -> Result<ChatResponse> {
        let rendered = serde_json::to_string(request.messages())?;
        debug!(request = %rendered, "chat request");
        let response = chain.next(request).await?;
        let rendered = serde_json::to_string(&response)?;
        debug!(response = %rendered, "chat response");
        Ok(response)
    }

    async fn advise_stream(
        &self,
        request: ChatRequest,
        chain: ChainCursor<'_>,
    ) -> Result<ResponseStream> {
        let rendered = serde_json::to_string(request.messages())?;
        debug!(request = %rendered, "chat stream request");
        let stream = chain.next_stream(request).await?;
        let logged: ResponseStream = Box::pin(stream.inspect(|item| match item {
            Ok(response) => debug!(answer = %response.answer_text(), "chat stream item"),
            Err(error) => debug!(%error, "chat stream error"),
        }));
        Ok(logged)
    }
}
