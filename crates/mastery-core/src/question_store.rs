//! Question bank with per-question answer logs.
//!
//! Records are keyed by question id in a sharded map; every mutation of a
//! record happens under that key's write guard, so the append, the count
//! increment and the accuracy fold are observed together or not at all.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::catalog::Catalog;
use crate::error::MasteryError;
use crate::model::{AnswerAttempt, NewQuestion, QaType, QuestionRecord};

/// Result of appending an answer to a question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppendOutcome {
    /// Attempt count after the append.
    pub attempt_count: u64,
    /// Accuracy after the append (0–100).
    pub accuracy: f64,
    /// Whether this attempt was folded into the accuracy.
    pub accuracy_updated: bool,
}

/// Thread-safe question bank.
#[derive(Debug, Default)]
pub struct QuestionStore {
    questions: DashMap<String, QuestionRecord>,
}

impl QuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted records.
    pub fn from_records(records: impl IntoIterator<Item = QuestionRecord>) -> Self {
        let questions = records.into_iter().map(|q| (q.id.clone(), q)).collect();
        Self { questions }
    }

    /// Add a question. Fails with `Conflict` if the id is taken.
    pub fn create(&self, question: NewQuestion) -> Result<(), MasteryError> {
        match self.questions.entry(question.id.clone()) {
            Entry::Occupied(_) => Err(MasteryError::Conflict(question.id)),
            Entry::Vacant(slot) => {
                tracing::debug!("question {} created under {}", question.id, question.topic);
                slot.insert(QuestionRecord::new(question));
                Ok(())
            }
        }
    }

    /// Append `attempt` and fold `contribution` (0–100) into the question's accuracy.
    ///
    /// The attempt is always logged and always counted; `None` leaves the
    /// accuracy untouched.
    pub fn append_answer(
        &self,
        id: &str,
        attempt: AnswerAttempt,
        contribution: Option<f64>,
    ) -> Result<AppendOutcome, MasteryError> {
        let mut record = self
            .questions
            .get_mut(id)
            .ok_or_else(|| MasteryError::question_not_found(id))?;

        record.record_attempt(attempt, contribution);

        Ok(AppendOutcome {
            attempt_count: record.attempt_count,
            accuracy: record.accuracy,
            accuracy_updated: contribution.is_some(),
        })
    }

    /// Assign a category from its label. Unknown ids are reported before bad labels.
    pub fn set_type(&self, id: &str, qa_type: &str) -> Result<QaType, MasteryError> {
        let mut record = self
            .questions
            .get_mut(id)
            .ok_or_else(|| MasteryError::question_not_found(id))?;

        let parsed: QaType = qa_type.parse()?;
        record.qa_type = Some(parsed);
        Ok(parsed)
    }

    /// The `(unit, topic)` a question belongs to.
    pub fn placement(&self, id: &str) -> Result<(String, String), MasteryError> {
        self.questions
            .get(id)
            .map(|q| (q.unit.clone(), q.topic.clone()))
            .ok_or_else(|| MasteryError::question_not_found(id))
    }

    /// Move questions whose topic now lives in a different unit of `catalog`.
    ///
    /// Questions on topics the catalog no longer has are left as they are.
    /// Returns how many records changed.
    pub fn rehome(&self, catalog: &Catalog) -> usize {
        let mut moved = 0;
        for mut record in self.questions.iter_mut() {
            let Ok(unit) = catalog.unit_of(&record.topic) else {
                continue;
            };
            if record.unit != unit {
                record.unit = unit.to_string();
                moved += 1;
            }
        }
        moved
    }

    pub fn get(&self, id: &str) -> Option<QuestionRecord> {
        self.questions.get(id).map(|q| q.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.questions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Remove every question.
    pub fn clear(&self) {
        self.questions.clear();
    }

    /// All records, ordered by id.
    pub fn records(&self) -> Vec<QuestionRecord> {
        let mut records: Vec<QuestionRecord> =
            self.questions.iter().map(|q| q.value().clone()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}
