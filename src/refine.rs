//! Self-refine evaluation advisor: the core quality loop.
//!
//! Wraps the rest of the chain in a critique-then-retry loop. Each attempt
//! drives the chain to produce a response, scores it through a judge model,
//! and either accepts it, retries with the judge's feedback injected into the
//! original request, or gives up after the retry budget and returns the last
//! response as is. Low quality is never an error; judge parse failures and
//! upstream model failures are, and abort the whole invocation.
//!
//! Streaming is unsupported: scoring needs a complete, materialized answer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::advisor::{Advisor, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE};
use crate::chain::ChainCursor;
use crate::error::{AdvisorError, Result};
use crate::feedback::inject_feedback;
use crate::items::{ChatRequest, ChatResponse, Role};
use crate::judge::{JudgeClient, DEFAULT_EVALUATION_PROMPT};
use crate::model::{ChatModel, ResponseStream};

/// Gate deciding whether evaluation applies to a `(request, response)` pair.
pub type SkipPredicate = Arc<dyn Fn(&ChatRequest, &ChatResponse) -> bool + Send + Sync>;

/// Minimum rating accepted without retry, unless overridden.
pub const DEFAULT_SUCCESS_RATING: i32 = 3;

/// Retry budget on top of the first attempt, unless overridden.
pub const DEFAULT_MAX_REPEAT_ATTEMPTS: u32 = 3;

/// Default chain position: near the end, but with room for advisors after.
pub const DEFAULT_REFINE_ORDER: i32 = LOWEST_PRECEDENCE - 2000;

/// The self-refine evaluation advisor. Immutable after construction and
/// stateless across invocations; a single instance serves concurrent calls.
pub struct RefineAdvisor {
    judge: JudgeClient,
    success_rating: i32,
    max_repeat_attempts: u32,
    order: i32,
    skip_evaluation: SkipPredicate,
}

impl RefineAdvisor {
    pub fn builder() -> RefineAdvisorBuilder {
        RefineAdvisorBuilder::new()
    }
}

impl std::fmt::Debug for RefineAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefineAdvisor")
            .field("success_rating", &self.success_rating)
            .field("max_repeat_attempts", &self.max_repeat_attempts)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Build the evaluated "question": the type-tagged system message followed by
/// every USER/ASSISTANT message in original order, one per line. TOOL
/// messages are excluded.
fn prompt_question(request: &ChatRequest) -> String {
    let mut question = format!(
        "{}:{}",
        request.system().role,
        request.system().content
    );
    for message in request.messages() {
        if matches!(message.role, Role::User | Role::Assistant) {
            question.push('\n');
            question.push_str(&format!("{}:{}", message.role, message.content));
        }
    }
    question
}

#[async_trait]
impl Advisor for RefineAdvisor {
    fn name(&self) -> &str {
        "self-refine-evaluation"
    }

    fn order(&self) -> i32 {
        self.order
    }

    async fn advise_call(
        &self,
        request: ChatRequest,
        chain: ChainCursor<'_>,
    ) -> Result<ChatResponse> {
        // The question is extracted from the pristine original, not from
        // rebuilt retry requests.
        let question = prompt_question(&request);
        let mut current = request.clone();
        let mut attempt: u32 = 1;

        loop {
            let response = chain.next(current).await?;

            if (self.skip_evaluation)(&request, &response) {
                debug!(attempt, "skipping evaluation; predicate returned true");
                return Ok(response);
            }

            let evaluation = self
                .judge
                .evaluate(&question, response.answer_text())
                .await?;

            if evaluation.rating >= self.success_rating {
                info!(
                    attempt,
                    rating = evaluation.rating,
                    "evaluation passed, accepting response"
                );
                return Ok(response);
            }

            if attempt > self.max_repeat_attempts {
                warn!(
                    max_repeat_attempts = self.max_repeat_attempts,
                    feedback = %evaluation.feedback,
                    "retry budget exhausted, returning last response despite failed evaluation"
                );
                return Ok(response);
            }

            warn!(
                attempt,
                rating = evaluation.rating,
                feedback = %evaluation.feedback,
                "evaluation failed, retrying with injected feedback"
            );
            current = inject_feedback(&request, &evaluation.feedback);
            attempt += 1;
        }
    }

    async fn advise_stream(
        &self,
        _request: ChatRequest,
        _chain: ChainCursor<'_>,
    ) -> Result<ResponseStream> {
        Err(AdvisorError::unsupported_mode(
            "the self-refine evaluation advisor does not support streaming",
        ))
    }
}

/// Validating builder for [`RefineAdvisor`]. All constraints are checked at
/// `build()`; an invalid configuration never reaches the loop.
pub struct RefineAdvisorBuilder {
    success_rating: i32,
    order: i32,
    max_repeat_attempts: u32,
    prompt_template: String,
    judge_model: Option<Arc<dyn ChatModel>>,
    skip_evaluation: SkipPredicate,
}

impl Default for RefineAdvisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RefineAdvisorBuilder {
    pub fn new() -> Self {
        Self {
            success_rating: DEFAULT_SUCCESS_RATING,
            order: DEFAULT_REFINE_ORDER,
            max_repeat_attempts: DEFAULT_MAX_REPEAT_ATTEMPTS,
            prompt_template: DEFAULT_EVALUATION_PROMPT.to_string(),
            judge_model: None,
            skip_evaluation: default_skip_predicate(),
        }
    }

    /// Minimum rating (1-4) the judge must award for acceptance.
    pub fn success_rating(mut self, rating: i32) -> Self {
        self.success_rating = rating;
        self
    }

    /// Position of this advisor in the chain; must lie strictly between
    /// `HIGHEST_PRECEDENCE` and `LOWEST_PRECEDENCE`.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Retry budget on top of the first attempt; at least 1.
    pub fn max_repeat_attempts(mut self, attempts: u32) -> Self {
        self.max_repeat_attempts = attempts;
        self
    }

    /// Evaluation prompt template; must contain `{question}` and `{answer}`.
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    /// The judge model. Mandatory.
    pub fn judge_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.judge_model = Some(model);
        self
    }

    /// Strategy deciding whether evaluation should run at all for a given
    /// response. Defaults to skipping responses without output or with
    /// pending tool calls.
    pub fn skip_evaluation_predicate(mut self, predicate: SkipPredicate) -> Self {
        self.skip_evaluation = predicate;
        self
    }

    pub fn build(self) -> Result<RefineAdvisor> {
        if !(1..=4).contains(&self.success_rating) {
            return Err(AdvisorError::configuration(format!(
                "success_rating must be between 1 and 4, got {}",
                self.success_rating
            )));
        }
        if self.max_repeat_attempts < 1 {
            return Err(AdvisorError::configuration(
                "max_repeat_attempts must be at least 1",
            ));
        }
        if self.order <= HIGHEST_PRECEDENCE || self.order >= LOWEST_PRECEDENCE {
            return Err(AdvisorError::configuration(format!(
                "order must lie strictly between HIGHEST_PRECEDENCE and LOWEST_PRECEDENCE, got {}",
                self.order
            )));
        }
        let model = self
            .judge_model
            .ok_or_else(|| AdvisorError::configuration("a judge model is required"))?;
        let judge = JudgeClient::with_template(model, self.prompt_template)?;

        Ok(RefineAdvisor {
            judge,
            success_rating: self.success_rating,
            max_repeat_attempts: self.max_repeat_attempts,
            order: self.order,
            skip_evaluation: self.skip_evaluation,
        })
    }
}

/// Default gate: skip when there is no output or when the response delegates
/// to tool calls, since neither carries a scoreable answer.
pub fn default_skip_predicate() -> SkipPredicate {
    Arc::new(|_request, response| response.output.is_none() || response.has_tool_calls())
}
