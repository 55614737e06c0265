//! Core data model types for mastery.
//!
//! Typed records for questions, answer attempts, subtopic aggregates, and
//! per-student progress, plus the events exchanged with the grading and
//! question-authoring collaborators.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MasteryError;
use crate::statistics::{completion_percent, fold_running_mean, PromotionRule, MAX_SCORE};

/// The seven recognized question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QaType {
    /// Multiple choice with a justification.
    Choice,
    /// State a definition and give an example.
    Definition,
    /// Compute a value (complexity, tree height, collision probability...).
    Calculation,
    /// Short conceptual answer with explanation or comparison.
    ShortAnswer,
    /// Reason about what happens in a given situation.
    Situational,
    /// Free-form answer, more than one acceptable response.
    OpenEnded,
    /// Combine two or more concepts.
    Comprehensive,
}

impl QaType {
    pub const ALL: [QaType; 7] = [
        QaType::Choice,
        QaType::Definition,
        QaType::Calculation,
        QaType::ShortAnswer,
        QaType::Situational,
        QaType::OpenEnded,
        QaType::Comprehensive,
    ];

    /// The category label used by the source curriculum's question texts.
    pub fn native_label(self) -> &'static str {
        match self {
            QaType::Choice => "選擇題",
            QaType::Definition => "定義題",
            QaType::Calculation => "計算題",
            QaType::ShortAnswer => "簡答題",
            QaType::Situational => "情境題",
            QaType::OpenEnded => "開放式問題",
            QaType::Comprehensive => "綜合思考題",
        }
    }

    /// Infer the category from a `【label】` prefix on the question text.
    pub fn from_question_text(text: &str) -> Option<QaType> {
        let rest = text.trim_start().strip_prefix('【')?;
        let (label, _) = rest.split_once('】')?;
        label.trim().parse().ok()
    }
}

impl fmt::Display for QaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QaType::Choice => write!(f, "choice"),
            QaType::Definition => write!(f, "definition"),
            QaType::Calculation => write!(f, "calculation"),
            QaType::ShortAnswer => write!(f, "short-answer"),
            QaType::Situational => write!(f, "situational"),
            QaType::OpenEnded => write!(f, "open-ended"),
            QaType::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

impl FromStr for QaType {
    type Err = MasteryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(t) = QaType::ALL.iter().find(|t| t.native_label() == trimmed) {
            return Ok(*t);
        }
        match trimmed.to_lowercase().replace(['_', ' '], "-").as_str() {
            "choice" | "multiple-choice" => Ok(QaType::Choice),
            "definition" => Ok(QaType::Definition),
            "calculation" => Ok(QaType::Calculation),
            "short-answer" | "shortanswer" => Ok(QaType::ShortAnswer),
            "situational" => Ok(QaType::Situational),
            "open-ended" | "openended" => Ok(QaType::OpenEnded),
            "comprehensive" => Ok(QaType::Comprehensive),
            _ => Err(MasteryError::InvalidType(trimmed.to_string())),
        }
    }
}

/// One graded submission recorded against a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerAttempt {
    pub student_id: String,
    pub answer_text: String,
    pub char_count: u32,
    pub elapsed_seconds: f64,
    pub suspected_copy: bool,
    pub correct: bool,
    /// Score on the 0–10 scale; `None` when the grader produced none.
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// A question in the shared bank together with its answer log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub author_student_id: Option<String>,
    pub unit: String,
    pub topic: String,
    #[serde(default)]
    pub attempt_count: u64,
    /// Running accuracy on the 0–100 scale.
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub qa_type: Option<QaType>,
    #[serde(default)]
    pub responses: Vec<AnswerAttempt>,
}

impl QuestionRecord {
    pub fn new(question: NewQuestion) -> Self {
        Self {
            id: question.id,
            text: question.text,
            source: question.source,
            author_student_id: question.author_student_id,
            unit: question.unit,
            topic: question.topic,
            attempt_count: 0,
            accuracy: 0.0,
            qa_type: None,
            responses: Vec::new(),
        }
    }

    /// Append an attempt and fold `contribution` (0–100) into the accuracy.
    ///
    /// The attempt count always increases; the accuracy only moves when a
    /// contribution is supplied.
    pub fn record_attempt(&mut self, attempt: AnswerAttempt, contribution: Option<f64>) {
        self.responses.push(attempt);
        self.attempt_count += 1;
        if let Some(value) = contribution {
            self.accuracy = fold_running_mean(self.accuracy, self.attempt_count, value);
        }
    }
}

/// Running statistics for one subtopic across all students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtopicAggregate {
    pub topic: String,
    pub unit: String,
    #[serde(default)]
    pub attempt_count: u64,
    /// Running accuracy on the 0–100 scale.
    #[serde(default)]
    pub accuracy: f64,
}

impl SubtopicAggregate {
    pub fn new(topic: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            unit: unit.into(),
            attempt_count: 0,
            accuracy: 0.0,
        }
    }

    pub fn record_attempt(&mut self, contribution: Option<f64>) -> f64 {
        self.attempt_count += 1;
        if let Some(value) = contribution {
            self.accuracy = fold_running_mean(self.accuracy, self.attempt_count, value);
        }
        self.accuracy
    }
}

/// A student's attempts and average score on one topic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TopicProgress {
    pub attempts: u32,
    /// Average score on the 0–10 scale.
    pub average_score: f64,
}

/// Everything tracked about one student's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgress {
    pub student_id: String,
    #[serde(default)]
    pub topic_progress: BTreeMap<String, TopicProgress>,
    #[serde(default)]
    pub completed_topics: BTreeSet<String>,
    /// Completion percentage per unit, 0–100.
    #[serde(default)]
    pub unit_progress: BTreeMap<String, f64>,
    #[serde(default)]
    pub completed_units: BTreeSet<String>,
}

impl StudentProgress {
    pub fn new(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            topic_progress: BTreeMap::new(),
            completed_topics: BTreeSet::new(),
            unit_progress: BTreeMap::new(),
            completed_units: BTreeSet::new(),
        }
    }

    /// Count one more attempt at `topic` and fold `score` (0–10) into its average.
    pub fn record_topic_attempt(&mut self, topic: &str, score: u8) -> TopicProgress {
        let entry = self.topic_progress.entry(topic.to_string()).or_default();
        entry.attempts += 1;
        entry.average_score =
            fold_running_mean(entry.average_score, u64::from(entry.attempts), f64::from(score));
        *entry
    }

    /// Mark `topic` completed if it meets `rule`. Returns whether it was newly added.
    pub fn evaluate_topic_completion(&mut self, topic: &str, rule: &PromotionRule) -> bool {
        if self.completed_topics.contains(topic) {
            return false;
        }
        let Some(progress) = self.topic_progress.get(topic) else {
            return false;
        };
        if !rule.is_met(progress.attempts, progress.average_score) {
            return false;
        }
        self.completed_topics.insert(topic.to_string())
    }

    /// Recompute `unit`'s completion percentage from the completed-topic set.
    pub fn recompute_unit_progress(&mut self, unit: &str, subtopics: &[String]) -> f64 {
        let done = subtopics
            .iter()
            .filter(|t| self.completed_topics.contains(t.as_str()))
            .count();
        let percent = completion_percent(done, subtopics.len());
        self.unit_progress.insert(unit.to_string(), percent);
        percent
    }

    /// Mark `unit` completed if its progress is 100. Returns whether it was newly added.
    pub fn evaluate_unit_completion(&mut self, unit: &str) -> bool {
        if self.completed_units.contains(unit) {
            return false;
        }
        match self.unit_progress.get(unit) {
            Some(percent) if *percent >= 100.0 => self.completed_units.insert(unit.to_string()),
            _ => false,
        }
    }

    /// Start tracking `topic` at `(0, 0)` if it is not tracked yet.
    pub fn seed_topic(&mut self, topic: &str) -> bool {
        if self.topic_progress.contains_key(topic) {
            return false;
        }
        self.topic_progress
            .insert(topic.to_string(), TopicProgress::default());
        true
    }
}

/// A question submitted by the question-authoring collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub author_student_id: Option<String>,
    pub unit: String,
    pub topic: String,
}

/// A category assignment for an existing question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionTypeAssignment {
    pub id: String,
    pub qa_type: String,
}

/// A scored answer produced by the grading collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: String,
    pub student_id: String,
    #[serde(default)]
    pub answer_text: String,
    #[serde(default)]
    pub elapsed_seconds: f64,
    #[serde(default)]
    pub char_count: u32,
    #[serde(default)]
    pub suspected_copy: bool,
    pub correct: bool,
    /// Score on the 0–10 scale, or `None` if the grader produced none.
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl GradedAnswer {
    /// Reject malformed inputs before any store is touched.
    pub fn validate(&self) -> Result<(), MasteryError> {
        if self.question_id.trim().is_empty() {
            return Err(MasteryError::InvalidInput("question id is empty".into()));
        }
        if self.student_id.trim().is_empty() {
            return Err(MasteryError::InvalidInput("student id is empty".into()));
        }
        if let Some(score) = self.score {
            if score > MAX_SCORE {
                return Err(MasteryError::InvalidInput(format!(
                    "score {score} is outside 0-{MAX_SCORE}"
                )));
            }
        }
        if !self.elapsed_seconds.is_finite() || self.elapsed_seconds < 0.0 {
            return Err(MasteryError::InvalidInput(format!(
                "elapsed time {} is not a non-negative number of seconds",
                self.elapsed_seconds
            )));
        }
        Ok(())
    }

    /// Score used for the student's running average; a missing score counts as 0.
    pub fn effective_score(&self) -> u8 {
        self.score.unwrap_or(0)
    }

    pub(crate) fn to_attempt(&self, submitted_at: DateTime<Utc>) -> AnswerAttempt {
        AnswerAttempt {
            student_id: self.student_id.clone(),
            answer_text: self.answer_text.clone(),
            char_count: self.char_count,
            elapsed_seconds: self.elapsed_seconds,
            suspected_copy: self.suspected_copy,
            correct: self.correct,
            score: self.score,
            feedback: self.feedback.clone(),
            submitted_at,
        }
    }
}
