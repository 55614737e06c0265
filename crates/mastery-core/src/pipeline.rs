//! Step-by-step ingestion of one graded answer.
//!
//! An [`IngestSaga`] applies the six ingestion steps in order against the
//! engine's stores and records which ones have committed. Steps are not
//! rolled back: if a step fails, the saga keeps the failed step and the
//! committed ones, and a later `run` resumes at the failed step without
//! re-applying anything that already committed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::ProgressEngine;
use crate::error::MasteryError;
use crate::model::{GradedAnswer, TopicProgress};

/// One step of the ingestion protocol, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStep {
    /// Resolve the question's unit and topic.
    LookupQuestion,
    /// Append the attempt to the question's log and update its statistics.
    AppendAnswer,
    /// Update the subtopic aggregate.
    RecordSubtopicAttempt,
    /// Update the student's attempts and average on the topic.
    RecordTopicAttempt,
    /// Apply the promotion rule to the topic.
    EvaluateTopicCompletion,
    /// Recompute the unit percentage and evaluate unit completion.
    UpdateUnitProgress,
}

impl IngestStep {
    pub const ORDER: [IngestStep; 6] = [
        IngestStep::LookupQuestion,
        IngestStep::AppendAnswer,
        IngestStep::RecordSubtopicAttempt,
        IngestStep::RecordTopicAttempt,
        IngestStep::EvaluateTopicCompletion,
        IngestStep::UpdateUnitProgress,
    ];
}

impl fmt::Display for IngestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStep::LookupQuestion => "lookup-question",
            IngestStep::AppendAnswer => "append-answer",
            IngestStep::RecordSubtopicAttempt => "record-subtopic-attempt",
            IngestStep::RecordTopicAttempt => "record-topic-attempt",
            IngestStep::EvaluateTopicCompletion => "evaluate-topic-completion",
            IngestStep::UpdateUnitProgress => "update-unit-progress",
        };
        write!(f, "{name}")
    }
}

/// State written by a fully applied ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub question_id: String,
    pub student_id: String,
    pub unit: String,
    pub topic: String,
    /// Question attempt count after this answer.
    pub question_attempts: u64,
    /// Question accuracy (0–100) after this answer.
    pub question_accuracy: f64,
    /// Subtopic aggregate attempt count after this answer.
    pub subtopic_attempts: u64,
    /// Subtopic aggregate accuracy (0–100) after this answer.
    pub subtopic_accuracy: f64,
    /// The student's progress on the topic after this answer.
    pub topic_progress: TopicProgress,
    /// The topic entered the completed set during this ingestion.
    pub topic_completed: bool,
    /// The unit's completion percentage after this answer.
    pub unit_progress: f64,
    /// The unit entered the completed set during this ingestion.
    pub unit_completed: bool,
}

/// Resumable ingestion of a single graded answer.
#[derive(Debug, Clone)]
pub struct IngestSaga {
    answer: GradedAnswer,
    submitted_at: DateTime<Utc>,
    completed: Vec<IngestStep>,
    failure: Option<(IngestStep, MasteryError)>,
    outcome: IngestOutcome,
}

impl IngestSaga {
    pub fn new(answer: GradedAnswer) -> Self {
        let outcome = IngestOutcome {
            question_id: answer.question_id.clone(),
            student_id: answer.student_id.clone(),
            ..IngestOutcome::default()
        };
        Self {
            answer,
            submitted_at: Utc::now(),
            completed: Vec::new(),
            failure: None,
            outcome,
        }
    }

    pub fn answer(&self) -> &GradedAnswer {
        &self.answer
    }

    /// Steps that have committed, in order.
    pub fn completed_steps(&self) -> &[IngestStep] {
        &self.completed
    }

    /// The step the next `run` starts from, or `None` when finished.
    pub fn next_step(&self) -> Option<IngestStep> {
        IngestStep::ORDER.get(self.completed.len()).copied()
    }

    /// The step that failed on the last `run`, with its error.
    pub fn failure(&self) -> Option<(IngestStep, &MasteryError)> {
        self.failure.as_ref().map(|(step, err)| (*step, err))
    }

    pub fn is_complete(&self) -> bool {
        self.next_step().is_none()
    }

    /// Apply every remaining step against `engine`.
    ///
    /// Inputs are validated before the first step; a rejected answer touches
    /// no store.
    pub fn run(&mut self, engine: &ProgressEngine) -> Result<IngestOutcome, MasteryError> {
        if self.completed.is_empty() {
            self.answer.validate()?;
        }

        while let Some(step) = self.next_step() {
            tracing::debug!(
                "ingest {}/{}: {step}",
                self.answer.student_id,
                self.answer.question_id
            );
            if let Err(e) = self.execute(step, engine) {
                tracing::warn!(
                    "ingest {}/{} stopped at {step}: {e}",
                    self.answer.student_id,
                    self.answer.question_id
                );
                self.failure = Some((step, e.clone()));
                return Err(e);
            }
            self.completed.push(step);
            self.failure = None;
        }

        Ok(self.outcome.clone())
    }

    fn execute(&mut self, step: IngestStep, engine: &ProgressEngine) -> Result<(), MasteryError> {
        let answer = &self.answer;
        let out = &mut self.outcome;
        let policy = engine.config().accuracy;

        match step {
            IngestStep::LookupQuestion => {
                let (_, topic) = engine.questions().placement(&answer.question_id)?;
                // The live catalog decides the unit; the record may predate a reload.
                out.unit = engine.catalog().unit_of(&topic)?.to_string();
                out.topic = topic;
            }
            IngestStep::AppendAnswer => {
                let contribution = policy.question.contribution(answer.correct, answer.score);
                let appended = engine.questions().append_answer(
                    &answer.question_id,
                    answer.to_attempt(self.submitted_at),
                    contribution,
                )?;
                out.question_attempts = appended.attempt_count;
                out.question_accuracy = appended.accuracy;
            }
            IngestStep::RecordSubtopicAttempt => {
                let contribution = policy.subtopic.contribution(answer.correct, answer.score);
                let aggregate = engine.aggregates().record_attempt(&out.topic, contribution)?;
                out.subtopic_attempts = aggregate.attempt_count;
                out.subtopic_accuracy = aggregate.accuracy;
            }
            IngestStep::RecordTopicAttempt => {
                if engine.config().auto_enroll && engine.students().ensure_exists(&answer.student_id)
                {
                    tracing::info!("enrolled student {} on first answer", answer.student_id);
                }
                out.topic_progress = engine.students().record_topic_attempt(
                    &answer.student_id,
                    &out.topic,
                    answer.effective_score(),
                )?;
            }
            IngestStep::EvaluateTopicCompletion => {
                out.topic_completed = engine.students().evaluate_topic_completion(
                    &answer.student_id,
                    &out.topic,
                    &out.unit,
                    &engine.config().promotion,
                )?;
            }
            IngestStep::UpdateUnitProgress => {
                let catalog = engine.catalog();
                let subtopics = catalog.subtopics_of(&out.unit)?;
                out.unit_progress = engine.students().recompute_unit_progress(
                    &answer.student_id,
                    &out.unit,
                    subtopics,
                )?;
                out.unit_completed = engine
                    .students()
                    .evaluate_unit_completion(&answer.student_id, &out.unit)?;
            }
        }

        Ok(())
    }
}
