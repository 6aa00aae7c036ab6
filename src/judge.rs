//! Judge client: renders the evaluation prompt, calls the judge model, and
//! parses the textual verdict into a structured [`Evaluation`].
//!
//! Parsing is marker based. The judge's raw output must carry a literal
//! `Total rating:` line; `Evaluation:` and `Feedback:` sections are optional
//! and default to empty. A missing, malformed, or out-of-range rating is a
//! hard [`AdvisorError::JudgeParse`] failure — it is not caught or retried
//! here, and it aborts the whole loop invocation upstream.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AdvisorError, Result};
use crate::items::ChatRequest;
use crate::model::ChatModel;

/// Placeholder for the extracted conversation in the prompt template.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Placeholder for the answer under evaluation in the prompt template.
pub const ANSWER_PLACEHOLDER: &str = "{answer}";

const RATING_MARKER: &str = "Total rating:";
const EVALUATION_MARKER: &str = "Evaluation:";
const FEEDBACK_MARKER: &str = "Feedback:";

/// Default evaluation prompt: a 1-4 scale over a question/answer pair, with
/// the three literal markers the parser requires.
pub const DEFAULT_EVALUATION_PROMPT: &str = "\
You will be given a user_question and assistant_answer couple.
Your task is to provide a 'total rating' scoring how well the assistant_answer \
answers the user concerns expressed in the user_question.
Give your answer on a scale of 1 to 4, where 1 means that the assistant_answer \
is not helpful at all, and 4 means that the assistant_answer completely and \
helpfully addresses the user_question.

Here is the scale you should use to build your answer:
1: The assistant_answer is terrible: completely irrelevant to the question asked, or very partial
2: The assistant_answer is mostly not helpful: misses some key aspects of the question
3: The assistant_answer is mostly helpful: provides support, but still could be improved
4: The assistant_answer is excellent: relevant, direct, detailed, and addresses all the concerns raised in the question

Provide your feedback as follows:

Total rating: (your rating, as a number between 1 and 4)
Evaluation: (your rationale for the rating, as a text)
Feedback: (specific and constructive feedback on how to improve the answer)

You MUST provide a value for 'Total rating:' in your answer.

Now here are the question and answer.

Question: {question}
Answer: {answer}

Provide your feedback.
";

/// The structured verdict of one evaluation attempt. Never mutated after
/// parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Rating on the 1-4 scale.
    pub rating: i32,
    /// The judge's rationale for the rating.
    pub evaluation: String,
    /// Constructive feedback fed back into retry requests.
    pub feedback: String,
}

/// A client over the judge model. Stateless across invocations; safe to share
/// between concurrent top-level calls.
#[derive(Clone)]
pub struct JudgeClient {
    model: Arc<dyn ChatModel>,
    template: String,
}

impl std::fmt::Debug for JudgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeClient")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl JudgeClient {
    /// A judge over `model` using the default evaluation prompt.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            template: DEFAULT_EVALUATION_PROMPT.to_string(),
        }
    }

    /// A judge with a custom prompt template. The template must contain both
    /// the `{question}` and `{answer}` placeholders.
    pub fn with_template(model: Arc<dyn ChatModel>, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [QUESTION_PLACEHOLDER, ANSWER_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(AdvisorError::configuration(format!(
                    "evaluation prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { model, template })
    }

    fn render(&self, question: &str, answer: &str) -> String {
        self.template
            .replace(QUESTION_PLACEHOLDER, question)
            .replace(ANSWER_PLACEHOLDER, answer)
    }

    /// Score one question/answer pair with a single judge-model call.
    pub async fn evaluate(&self, question: &str, answer: &str) -> Result<Evaluation> {
        let prompt = self.render(question, answer);
        let response = self.model.call(ChatRequest::simple("", prompt)).await?;
        let evaluation = parse_evaluation(response.answer_text())?;
        debug!(rating = evaluation.rating, "judge verdict parsed");
        Ok(evaluation)
    }
}

/// Extract the section following `marker`, cut at the next marker if any.
fn section<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    let start = raw.find(marker)? + marker.len();
    let rest = &raw[start..];
    let end = [RATING_MARKER, EVALUATION_MARKER, FEEDBACK_MARKER]
        .iter()
        .filter_map(|m| rest.find(m))
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Parse a judge's raw text output into a structured [`Evaluation`].
pub fn parse_evaluation(raw: &str) -> Result<Evaluation> {
    let rating_text = section(raw, RATING_MARKER).ok_or_else(|| {
        AdvisorError::judge_parse(format!("missing '{RATING_MARKER}' marker in judge output"))
    })?;

    let digits: String = rating_text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let rating: i32 = digits.parse().map_err(|_| {
        AdvisorError::judge_parse(format!("no numeric rating after '{RATING_MARKER}'"))
    })?;
    if !(1..=4).contains(&rating) {
        return Err(AdvisorError::judge_parse(format!(
            "rating {rating} is outside the 1-4 scale"
        )));
    }

    Ok(Evaluation {
        rating,
        evaluation: section(raw, EVALUATION_MARKER).unwrap_or("").to_string(),
        feedback: section(raw, FEEDBACK_MARKER).unwrap_or("").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ChatResponse;
    use crate::model::ScriptedModel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_verdict() {
        let raw = "Total rating: 3\nEvaluation: mostly helpful\nFeedback: add an example";
        let evaluation = parse_evaluation(raw).unwrap();
        assert_eq!(
            evaluation,
            Evaluation {
                rating: 3,
                evaluation: "mostly helpful".to_string(),
                feedback: "add an example".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_tolerates_surrounding_prose_and_parentheses() {
        let raw = "Sure! Here is my verdict.\nTotal rating: (4)\nFeedback: none needed\nThanks!";
        let evaluation = parse_evaluation(raw).unwrap();
        assert_eq!(evaluation.rating, 4);
        assert_eq!(evaluation.evaluation, "");
        assert_eq!(evaluation.feedback, "none needed\nThanks!");
    }

    #[test]
    fn test_parse_missing_rating_marker_fails() {
        let err = parse_evaluation("Evaluation: fine\nFeedback: none").unwrap_err();
        assert!(matches!(err, AdvisorError::JudgeParse { .. }));
    }

    #[test]
    fn test_parse_non_numeric_rating_fails() {
        let err = parse_evaluation("Total rating: excellent").unwrap_err();
        assert!(matches!(err, AdvisorError::JudgeParse { .. }));
    }

    #[test]
    fn test_parse_out_of_range_rating_fails() {
        let err = parse_evaluation("Total rating: 7\nFeedback: n/a").unwrap_err();
        assert!(matches!(err, AdvisorError::JudgeParse { .. }));
    }

    #[test]
    fn test_template_requires_placeholders() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let err = JudgeClient::with_template(model, "rate this: {answer}").unwrap_err();
        assert!(matches!(err, AdvisorError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_evaluate_renders_and_parses() {
        let model = ScriptedModel::new(vec![ChatResponse::message(
            "Total rating: 2\nEvaluation: partial\nFeedback: cover the second question",
        )]);
        let judge = JudgeClient::new(Arc::new(model.clone()));

        let evaluation = judge.evaluate("USER:hi", "hello").await.unwrap();
        assert_eq!(evaluation.rating, 2);
        assert_eq!(evaluation.feedback, "cover the second question");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_evaluate_propagates_model_failure() {
        let judge = JudgeClient::new(Arc::new(ScriptedModel::new(vec![])));
        let err = judge.evaluate("q", "a").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Model { .. }));
    }
}
