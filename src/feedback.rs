//! Feedback injection for retry requests.
//!
//! Produces a structurally new request whose last user message carries the
//! judge's critique as a distinct paragraph, with the original text preserved
//! as a prefix. The caller's request is never modified; the evaluation loop
//! keeps the pristine original for question extraction on later attempts.

use crate::items::{ChatRequest, Message};

/// Append `feedback` to the last user message of `request`, returning a new
/// request. A request without any user message gains one holding just the
/// feedback block.
pub fn inject_feedback(request: &ChatRequest, feedback: &str) -> ChatRequest {
    request.map_last_user(|user| {
        Message::user(format!(
            "{}\n\nPrevious response evaluation failed with feedback: {}\nPlease repeat until the evaluation passes!",
            user.content, feedback
        ))
    })
}
