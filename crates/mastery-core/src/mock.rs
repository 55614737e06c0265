//! Mock grader for testing the submission runner without a real backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::traits::{Grade, GradeRequest, Grader};

/// A grader that returns configured grades keyed by answer substring.
pub struct MockGrader {
    /// Answer substring → grade.
    responses: HashMap<String, Grade>,
    /// Grade when no substring matches.
    default_grade: Grade,
    /// Remaining calls that fail before the grader starts answering.
    failures_remaining: AtomicU32,
    call_count: AtomicU32,
    last_request: Mutex<Option<GradeRequest>>,
}

impl MockGrader {
    pub fn new(responses: HashMap<String, Grade>) -> Self {
        Self {
            responses,
            default_grade: Grade {
                score: 5,
                feedback: "mock feedback".to_string(),
            },
            failures_remaining: AtomicU32::new(0),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A grader that always returns `score` with `feedback`.
    pub fn with_fixed_score(score: i32, feedback: &str) -> Self {
        let mut grader = Self::new(HashMap::new());
        grader.default_grade = Grade {
            score,
            feedback: feedback.to_string(),
        };
        grader
    }

    /// Fail the first `n` calls with a transient error.
    pub fn failing_first(self, n: u32) -> Self {
        self.failures_remaining.store(n, Ordering::Relaxed);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GradeRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Grader for MockGrader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<Grade> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        let failing = self
            .failures_remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("mock grader unavailable");
        }

        let grade = self
            .responses
            .iter()
            .find(|(needle, _)| request.answer_text.contains(needle.as_str()))
            .map(|(_, grade)| grade.clone())
            .unwrap_or_else(|| self.default_grade.clone());
        Ok(grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(answer: &str) -> GradeRequest {
        GradeRequest {
            question_id: "Q1".into(),
            question_text: "What is a heap?".into(),
            unit: "U1".into(),
            topic: "Heaps".into(),
            answer_text: answer.into(),
        }
    }

    #[tokio::test]
    async fn matches_by_substring() {
        let mut responses = HashMap::new();
        responses.insert(
            "complete binary tree".to_string(),
            Grade {
                score: 9,
                feedback: "precise".into(),
            },
        );
        let grader = MockGrader::new(responses);

        let grade = grader
            .grade(&request("a complete binary tree with the heap property"))
            .await
            .unwrap();
        assert_eq!(grade.score, 9);

        let grade = grader.grade(&request("no idea")).await.unwrap();
        assert_eq!(grade.score, 5);
        assert_eq!(grader.call_count(), 2);
        assert_eq!(grader.last_request().unwrap().answer_text, "no idea");
    }

    #[tokio::test]
    async fn scripted_failures_then_success() {
        let grader = MockGrader::with_fixed_score(7, "ok").failing_first(2);
        assert!(grader.grade(&request("a")).await.is_err());
        assert!(grader.grade(&request("a")).await.is_err());
        assert_eq!(grader.grade(&request("a")).await.unwrap().score, 7);
        assert_eq!(grader.call_count(), 3);
    }
}
