//! Central progress engine.
//!
//! Owns the catalog and the three keyed stores, and exposes the ingestion,
//! advancement, read and administrative operations over them. The engine is
//! `Sync`; share it behind an `Arc` and call it from as many threads or tasks
//! as needed.

use std::sync::{Arc, PoisonError, RwLock};

use crate::aggregate_store::{AggregateStore, SyncSummary};
use crate::catalog::Catalog;
use crate::error::MasteryError;
use crate::model::{
    GradedAnswer, NewQuestion, QaType, QuestionRecord, QuestionTypeAssignment, StudentProgress,
    SubtopicAggregate,
};
use crate::pipeline::{IngestOutcome, IngestSaga};
use crate::progress_store::ProgressStore;
use crate::question_store::QuestionStore;
use crate::snapshot::{StateSnapshot, SNAPSHOT_FORMAT_VERSION};
use crate::statistics::{AccuracyPolicy, PromotionRule};

/// Configuration for the progress engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Rule gating topic completion and advancement.
    pub promotion: PromotionRule,
    /// Which attempts feed question and subtopic accuracy.
    pub accuracy: AccuracyPolicy,
    /// Create unknown students on their first answer instead of failing.
    pub auto_enroll: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            promotion: PromotionRule::default(),
            accuracy: AccuracyPolicy::default(),
            auto_enroll: true,
        }
    }
}

/// The progress-and-consistency engine.
#[derive(Debug)]
pub struct ProgressEngine {
    catalog: RwLock<Arc<Catalog>>,
    questions: QuestionStore,
    aggregates: AggregateStore,
    students: ProgressStore,
    config: EngineConfig,
}

impl ProgressEngine {
    /// A fresh engine with zeroed aggregates for every catalog subtopic.
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        let aggregates = AggregateStore::from_catalog(&catalog);
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            questions: QuestionStore::new(),
            aggregates,
            students: ProgressStore::new(),
            config,
        }
    }

    /// Rebuild an engine from a snapshot, aligning aggregates with `catalog`.
    pub fn restore(catalog: Catalog, config: EngineConfig, snapshot: StateSnapshot) -> Self {
        let aggregates = AggregateStore::from_records(snapshot.aggregates);
        let summary = aggregates.sync(&catalog);
        if summary.added > 0 || summary.removed > 0 {
            tracing::info!(
                "restored aggregates synced to catalog: {} added, {} removed",
                summary.added,
                summary.removed
            );
        }

        let questions = QuestionStore::from_records(snapshot.questions);
        let moved = questions.rehome(&catalog);
        if moved > 0 {
            tracing::info!("restored {moved} questions under their new units");
        }

        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            questions,
            aggregates,
            students: ProgressStore::from_records(snapshot.students),
            config,
        }
    }

    /// Capture every store.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            saved_at: chrono::Utc::now(),
            questions: self.questions.records(),
            aggregates: self.aggregates.records(),
            students: self.students.records(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current catalog.
    pub fn catalog(&self) -> Arc<Catalog> {
        let guard = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub(crate) fn questions(&self) -> &QuestionStore {
        &self.questions
    }

    pub(crate) fn aggregates(&self) -> &AggregateStore {
        &self.aggregates
    }

    pub(crate) fn students(&self) -> &ProgressStore {
        &self.students
    }

    // --- question authoring ---

    /// Add a question to the bank.
    ///
    /// The topic must exist in the catalog and belong to the given unit.
    pub fn create_question(&self, question: NewQuestion) -> Result<(), MasteryError> {
        if question.id.trim().is_empty() {
            return Err(MasteryError::InvalidInput("question id is empty".into()));
        }
        {
            let catalog = self.catalog();
            let unit = catalog.unit_of(&question.topic)?;
            if unit != question.unit {
                return Err(MasteryError::InvalidInput(format!(
                    "topic '{}' belongs to unit '{unit}', not '{}'",
                    question.topic, question.unit
                )));
            }
        }
        self.questions.create(question)
    }

    /// Set a question's category from its label.
    pub fn assign_type(&self, assignment: &QuestionTypeAssignment) -> Result<QaType, MasteryError> {
        self.questions.set_type(&assignment.id, &assignment.qa_type)
    }

    // --- students ---

    /// Create an empty progress record unless one exists. Returns `true` if created.
    pub fn ensure_student(&self, student_id: &str) -> bool {
        self.students.ensure_exists(student_id)
    }

    /// Create records for every id in the roster. Returns how many were new.
    pub fn enroll_roster<'a>(&self, student_ids: impl IntoIterator<Item = &'a str>) -> usize {
        let created = self.students.enroll_roster(student_ids);
        tracing::info!("enrolled {created} new students");
        created
    }

    // --- ingestion ---

    /// Apply a graded answer to all three stores.
    ///
    /// To inspect or resume a partially applied answer, drive an
    /// [`IngestSaga`] directly instead.
    pub fn ingest_graded_answer(&self, answer: GradedAnswer) -> Result<IngestOutcome, MasteryError> {
        IngestSaga::new(answer).run(self)
    }

    /// Seed tracking of the subtopic after `topic` if the student has met the
    /// promotion rule on it. Returns the seeded subtopic, if any.
    pub fn advance_if_ready(
        &self,
        student_id: &str,
        topic: &str,
    ) -> Result<Option<String>, MasteryError> {
        let catalog = self.catalog();
        let seeded =
            self.students
                .advance_if_ready(student_id, topic, &catalog, &self.config.promotion)?;
        if let Some(next) = &seeded {
            tracing::debug!("student {student_id} advanced from '{topic}' to '{next}'");
        }
        Ok(seeded)
    }

    // --- reads ---

    pub fn student_progress(&self, student_id: &str) -> Result<StudentProgress, MasteryError> {
        self.students
            .get(student_id)
            .ok_or_else(|| MasteryError::student_not_found(student_id))
    }

    /// Every enrolled student id, sorted.
    pub fn student_ids(&self) -> Vec<String> {
        self.students
            .records()
            .into_iter()
            .map(|s| s.student_id)
            .collect()
    }

    pub fn subtopic_aggregate(&self, topic: &str) -> Result<SubtopicAggregate, MasteryError> {
        self.aggregates
            .get(topic)
            .ok_or_else(|| MasteryError::topic_not_found(topic))
    }

    /// Aggregates for every catalog subtopic, in curriculum order.
    pub fn subtopic_aggregates(&self) -> Vec<SubtopicAggregate> {
        let catalog = self.catalog();
        catalog
            .topics()
            .map(|(topic, unit)| {
                self.aggregates
                    .get(topic)
                    .unwrap_or_else(|| SubtopicAggregate::new(topic, unit))
            })
            .collect()
    }

    pub fn question(&self, id: &str) -> Result<QuestionRecord, MasteryError> {
        self.questions
            .get(id)
            .ok_or_else(|| MasteryError::question_not_found(id))
    }

    /// All questions, ordered by id.
    pub fn questions_snapshot(&self) -> Vec<QuestionRecord> {
        self.questions.records()
    }

    /// The first subtopic of `unit` the student has not completed, or `None`
    /// once the whole unit is complete.
    pub fn current_topic(
        &self,
        student_id: &str,
        unit: &str,
    ) -> Result<Option<String>, MasteryError> {
        let catalog = self.catalog();
        let subtopics = catalog.subtopics_of(unit)?;
        let progress = self.student_progress(student_id)?;
        Ok(subtopics
            .iter()
            .find(|t| !progress.completed_topics.contains(t.as_str()))
            .cloned())
    }

    // --- administration ---

    /// Swap in a new catalog.
    ///
    /// Surviving subtopics keep their aggregate counters, new ones start at
    /// zero, and aggregates for removed subtopics are dropped. Questions on
    /// a subtopic that moved follow it to its new unit. Student records are
    /// left untouched.
    pub fn reload_catalog(&self, catalog: Catalog) -> SyncSummary {
        let mut guard = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let summary = self.aggregates.sync(&catalog);
        let moved = self.questions.rehome(&catalog);
        *guard = Arc::new(catalog);
        tracing::info!(
            "catalog reloaded: {} subtopics added, {} removed, {moved} questions moved",
            summary.added,
            summary.removed
        );
        summary
    }

    /// Remove every student record. Returns how many were removed.
    pub fn reset_students(&self) -> usize {
        let removed = self.students.len();
        self.students.clear();
        tracing::info!("reset {removed} student records");
        removed
    }

    /// Remove every question. Returns how many were removed.
    pub fn reset_question_bank(&self) -> usize {
        let removed = self.questions.len();
        self.questions.clear();
        tracing::info!("reset question bank ({removed} questions)");
        removed
    }
}
