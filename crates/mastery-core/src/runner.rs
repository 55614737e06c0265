//! Batch grading and ingestion of ungraded submissions.
//!
//! Each submission goes through the copy heuristic, then the grader (with
//! retries), then the engine. Submissions run with bounded parallelism and in
//! no particular order; callers that need per-student ordering must batch
//! accordingly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::engine::ProgressEngine;
use crate::integrity::{detect_suspected_copy, CopyDetection};
use crate::model::GradedAnswer;
use crate::pipeline::IngestOutcome;
use crate::statistics::MAX_SCORE;
use crate::traits::{Grade, GradeRequest, Grader};

/// Feedback recorded for answers flagged by the copy heuristic.
pub const SUSPECTED_COPY_FEEDBACK: &str = "suspected copy-paste; this answer is not scored";

/// An answer as typed by a student, before grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub question_id: String,
    pub student_id: String,
    pub answer_text: String,
    /// Time spent typing the answer.
    #[serde(default)]
    pub typing_seconds: f64,
    /// Time from seeing the question to submitting.
    #[serde(default)]
    pub elapsed_seconds: f64,
}

/// Configuration for the submission runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum concurrent submissions.
    pub parallelism: usize,
    /// Retries on grader errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    pub copy_detection: CopyDetection,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            copy_detection: CopyDetection::default(),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_submission_start(&self, question_id: &str, student_id: &str);
    fn on_submission_complete(&self, outcome: &SubmissionOutcome);
    fn on_submission_error(&self, question_id: &str, student_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_submission_start(&self, _: &str, _: &str) {}
    fn on_submission_complete(&self, _: &SubmissionOutcome) {}
    fn on_submission_error(&self, _: &str, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// A submission that was graded and ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub question_id: String,
    pub student_id: String,
    /// Score as ingested, 0–10.
    pub score: u8,
    pub feedback: String,
    pub suspected_copy: bool,
    pub chars_per_second: f64,
    /// Grader calls made, including failed ones. 0 for suspected answers.
    pub grader_calls: u32,
    pub ingest: IngestOutcome,
}

/// A submission that could not be graded or ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionFailure {
    pub question_id: String,
    pub student_id: String,
    pub error: String,
}

/// Result of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<SubmissionOutcome>,
    pub failures: Vec<SubmissionFailure>,
    pub duration_ms: u64,
}

impl BatchSummary {
    pub fn suspected_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.suspected_copy).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }
}

/// Grades submissions and feeds them to a shared engine.
pub struct SubmissionRunner {
    engine: Arc<ProgressEngine>,
    grader: Arc<dyn Grader>,
    config: RunnerConfig,
}

impl SubmissionRunner {
    pub fn new(engine: Arc<ProgressEngine>, grader: Arc<dyn Grader>, config: RunnerConfig) -> Self {
        Self {
            engine,
            grader,
            config,
        }
    }

    /// Grade and ingest every submission.
    pub async fn run(
        &self,
        submissions: Vec<Submission>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchSummary> {
        let start = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        tracing::info!(
            "batch {run_id}: {} submissions via grader '{}'",
            submissions.len(),
            self.grader.name()
        );

        let mut futures = FuturesUnordered::new();
        for submission in submissions {
            let engine = Arc::clone(&self.engine);
            let grader = Arc::clone(&self.grader);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();

            futures.push(async move {
                let question_id = submission.question_id.clone();
                let student_id = submission.student_id.clone();
                let result = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    process_submission(&engine, grader.as_ref(), &config, submission).await
                }
                .await;
                (question_id, student_id, result)
            });
        }

        let total = futures.len();
        let mut outcomes = Vec::new();
        let mut failures = Vec::new();

        while let Some((question_id, student_id, result)) = futures.next().await {
            match result {
                Ok(outcome) => {
                    progress.on_submission_complete(&outcome);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    tracing::error!("submission {student_id}/{question_id} failed: {e:#}");
                    progress.on_submission_error(&question_id, &student_id, &format!("{e:#}"));
                    failures.push(SubmissionFailure {
                        question_id,
                        student_id,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, outcomes.len(), failures.len(), elapsed);

        Ok(BatchSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
            failures,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

async fn process_submission(
    engine: &ProgressEngine,
    grader: &dyn Grader,
    config: &RunnerConfig,
    submission: Submission,
) -> Result<SubmissionOutcome> {
    let verdict = detect_suspected_copy(
        &submission.answer_text,
        submission.typing_seconds,
        &config.copy_detection,
    );

    let (score, feedback, grader_calls) = if verdict.suspected {
        tracing::warn!(
            "submission {}/{} suspected copy ({:.1} chars/s)",
            submission.student_id,
            submission.question_id,
            verdict.chars_per_second
        );
        (0, SUSPECTED_COPY_FEEDBACK.to_string(), 0)
    } else {
        let question = engine.question(&submission.question_id)?;
        let request = GradeRequest {
            question_id: question.id,
            question_text: question.text,
            unit: question.unit,
            topic: question.topic,
            answer_text: submission.answer_text.clone(),
        };
        let (grade, calls) = grade_with_retry(grader, &request, config).await?;
        (clamp_score(grade.score), grade.feedback, calls)
    };

    let answer = GradedAnswer {
        question_id: submission.question_id.clone(),
        student_id: submission.student_id.clone(),
        char_count: u32::try_from(submission.answer_text.chars().count()).unwrap_or(u32::MAX),
        answer_text: submission.answer_text,
        elapsed_seconds: submission.elapsed_seconds,
        suspected_copy: verdict.suspected,
        correct: !verdict.suspected,
        score: Some(score),
        feedback: Some(feedback.clone()),
    };
    let ingest = engine.ingest_graded_answer(answer)?;

    Ok(SubmissionOutcome {
        question_id: submission.question_id,
        student_id: submission.student_id,
        score,
        feedback,
        suspected_copy: verdict.suspected,
        chars_per_second: verdict.chars_per_second,
        grader_calls,
        ingest,
    })
}

/// Call the grader, retrying errors with exponential backoff.
///
/// Returns the grade and the number of calls made.
async fn grade_with_retry(
    grader: &dyn Grader,
    request: &GradeRequest,
    config: &RunnerConfig,
) -> Result<(Grade, u32)> {
    let mut last_error = None;
    let mut retry_delay = config.retry_delay;

    for retry in 0..=config.max_retries {
        if retry > 0 {
            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
        }
        match grader.grade(request).await {
            Ok(grade) => return Ok((grade, retry + 1)),
            Err(e) => {
                tracing::warn!(
                    "grader '{}' failed on {} (attempt {}): {e}",
                    grader.name(),
                    request.question_id,
                    retry + 1
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown grader error")))
}

/// Clamp a raw grader score into 0–10.
pub fn clamp_score(raw: i32) -> u8 {
    let clamped = raw.clamp(0, i32::from(MAX_SCORE));
    if clamped != raw {
        tracing::warn!("grader score {raw} clamped to {clamped}");
    }
    u8::try_from(clamped).unwrap_or(0)
}
