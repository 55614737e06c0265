//! Grading collaborator interface.
//!
//! Graders are external (typically an LLM behind an HTTP API) and are driven
//! by the [`SubmissionRunner`](crate::runner::SubmissionRunner); the engine
//! itself never awaits one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grader trait
// ---------------------------------------------------------------------------

/// Trait for backends that score a free-text answer.
#[async_trait]
pub trait Grader: Send + Sync {
    /// Human-readable grader name (e.g. "mock").
    fn name(&self) -> &str;

    /// Score an answer. The returned score is not trusted to be in range.
    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<Grade>;
}

/// An answer to be graded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRequest {
    pub question_id: String,
    /// The question as shown to the student.
    pub question_text: String,
    pub unit: String,
    pub topic: String,
    pub answer_text: String,
}

/// A grader's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// Raw score; clamped into 0–10 before ingestion.
    pub score: i32,
    pub feedback: String,
}

/// Feedback recorded when a grader reply carries none.
pub const DEFAULT_FEEDBACK: &str = "no feedback";

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

/// Parse a free-text grader reply into a [`Grade`].
///
/// Lines mentioning `score` (any case) or `分數` supply the score: all digits
/// on the line are concatenated and parsed. The first other non-empty line is
/// the feedback. A reply without a parsable score line scores 0.
pub fn parse_grade_reply(reply: &str) -> Grade {
    let mut score = 0;
    let mut feedback: Option<String> = None;

    for line in reply.lines() {
        let lowered = line.to_lowercase();
        if lowered.contains("score") || line.contains("分數") {
            let digits: String = line.chars().filter(char::is_ascii_digit).collect();
            if let Ok(parsed) = digits.parse::<i32>() {
                score = parsed;
            }
        } else if feedback.is_none() && !line.trim().is_empty() {
            feedback = Some(line.trim().to_string());
        }
    }

    Grade {
        score,
        feedback: feedback.unwrap_or_else(|| DEFAULT_FEEDBACK.to_string()),
    }
}
