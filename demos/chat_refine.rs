//! Assembles a full advisor chain over scripted models and runs one
//! self-refined call, printing each accepted answer.
//!
//! Run with: `cargo run --example chat_refine`

use std::sync::Arc;

use self_refine::{
    AdvisorChain, ChatRequest, ChatResponse, LoggingAdvisor, RefineAdvisor, ScriptedModel,
};

#[tokio::main]
async fn main() -> self_refine::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "self_refine=debug".into()),
        )
        .init();

    // A primary model that improves across attempts, and a judge that only
    // accepts the third draft.
    let primary = ScriptedModel::new(vec![
        ChatResponse::message("It is sunny."),
        ChatResponse::message("It is sunny, around 24 degrees."),
        ChatResponse::message(
            "Tokyo is sunny today, around 24 degrees with light wind; no rain expected.",
        ),
    ]);
    let judge = ScriptedModel::new(vec![
        ChatResponse::message(
            "Total rating: 2\nEvaluation: too vague\nFeedback: mention the city and conditions",
        ),
        ChatResponse::message(
            "Total rating: 3\nEvaluation: better\nFeedback: add wind and rain outlook",
        ),
        ChatResponse::message("Total rating: 4\nEvaluation: complete\nFeedback: none"),
    ]);

    let refine = RefineAdvisor::builder()
        .judge_model(Arc::new(judge))
        .success_rating(4)
        .max_repeat_attempts(2)
        .order(0)
        .build()?;

    let chain = AdvisorChain::new(
        vec![Arc::new(refine), Arc::new(LoggingAdvisor::new(2))],
        Arc::new(primary.clone()),
    );

    let request = ChatRequest::simple(
        "You are a professional weather assistant.",
        "What is the weather in Tokyo today?",
    );
    let response = chain.call(request).await?;

    println!("final answer: {}", response.answer_text());
    println!("primary model calls: {}", primary.calls());
    Ok(())
}
