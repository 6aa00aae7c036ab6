//! # self-refine
//!
//! A self-refine evaluation loop for LLM chat pipelines, packaged as an
//! ordered advisor (middleware) chain.
//!
//! The core component is [`RefineAdvisor`]: it wraps the rest of the chain,
//! scores each response through a secondary "judge" model, and retries with
//! the judge's feedback injected into the prompt until the rating meets a
//! threshold or the retry budget runs out. Responses that are not scoreable
//! (no output, pending tool calls) bypass evaluation via a pluggable skip
//! predicate.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use self_refine::{
//!     AdvisorChain, ChatRequest, ChatResponse, LoggingAdvisor, RefineAdvisor, ScriptedModel,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> self_refine::Result<()> {
//! // Scripted stand-ins; real deployments plug in provider-backed models.
//! let primary = ScriptedModel::new(vec![
//!     ChatResponse::message("Paris."),
//!     ChatResponse::message("Paris, the capital of France."),
//! ]);
//! let judge = ScriptedModel::new(vec![
//!     ChatResponse::message("Total rating: 2\nFeedback: name the country"),
//!     ChatResponse::message("Total rating: 4\nFeedback: none"),
//! ]);
//!
//! let refine = RefineAdvisor::builder()
//!     .judge_model(Arc::new(judge))
//!     .success_rating(4)
//!     .max_repeat_attempts(2)
//!     .order(0)
//!     .build()?;
//!
//! let chain = AdvisorChain::new(
//!     vec![Arc::new(refine), Arc::new(LoggingAdvisor::new(2))],
//!     Arc::new(primary),
//! );
//!
//! let response = chain
//!     .call(ChatRequest::simple("You are a helpful assistant.", "Capital of France?"))
//!     .await?;
//! assert_eq!(response.answer_text(), "Paris, the capital of France.");
//! # Ok(())
//! # }
//! ```

pub mod advisor;
pub mod chain;
pub mod error;
pub mod feedback;
pub mod items;
pub mod judge;
pub mod logging;
pub mod model;
pub mod refine;

pub use advisor::{Advisor, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE};
pub use chain::{AdvisorChain, ChainCursor};
pub use error::{AdvisorError, Result};
pub use feedback::inject_feedback;
pub use items::{ChatRequest, ChatResponse, Message, ModelOutput, Role, ToolCall};
pub use judge::{Evaluation, JudgeClient, DEFAULT_EVALUATION_PROMPT};
pub use logging::LoggingAdvisor;
pub use model::{ChatModel, ResponseStream, ScriptedModel};
pub use refine::{
    default_skip_predicate, RefineAdvisor, RefineAdvisorBuilder, SkipPredicate,
    DEFAULT_MAX_REPEAT_ATTEMPTS, DEFAULT_REFINE_ORDER, DEFAULT_SUCCESS_RATING,
};

// Re-export Tower traits callers need to use the chain as a service.
pub use tower::{Service, ServiceExt};
