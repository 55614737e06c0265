//! Per-student progress records.
//!
//! Each operation is one read-modify-write under the student's write guard.
//! Completed-topic and completed-unit sets only grow here; removal happens
//! through [`ProgressStore::clear`] alone.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::catalog::Catalog;
use crate::error::MasteryError;
use crate::model::{StudentProgress, TopicProgress};
use crate::statistics::PromotionRule;

/// Thread-safe student progress store, keyed by student id.
#[derive(Debug, Default)]
pub struct ProgressStore {
    students: DashMap<String, StudentProgress>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = StudentProgress>) -> Self {
        let students = records
            .into_iter()
            .map(|s| (s.student_id.clone(), s))
            .collect();
        Self { students }
    }

    /// Create an empty record for `student_id` unless one exists.
    ///
    /// Returns `true` if a record was created.
    pub fn ensure_exists(&self, student_id: &str) -> bool {
        match self.students.entry(student_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(StudentProgress::new(student_id));
                true
            }
        }
    }

    /// Ensure a record for every id. Returns how many were created.
    pub fn enroll_roster<'a>(&self, student_ids: impl IntoIterator<Item = &'a str>) -> usize {
        student_ids
            .into_iter()
            .filter(|id| self.ensure_exists(id))
            .count()
    }

    fn with_student<R>(
        &self,
        student_id: &str,
        f: impl FnOnce(&mut StudentProgress) -> R,
    ) -> Result<R, MasteryError> {
        let mut record = self
            .students
            .get_mut(student_id)
            .ok_or_else(|| MasteryError::student_not_found(student_id))?;
        Ok(f(&mut record))
    }

    /// Count an attempt at `topic` and fold `score` (0–10) into its average.
    pub fn record_topic_attempt(
        &self,
        student_id: &str,
        topic: &str,
        score: u8,
    ) -> Result<TopicProgress, MasteryError> {
        self.with_student(student_id, |s| s.record_topic_attempt(topic, score))
    }

    /// Apply the promotion rule to `topic`. Returns whether it was newly completed.
    pub fn evaluate_topic_completion(
        &self,
        student_id: &str,
        topic: &str,
        unit: &str,
        rule: &PromotionRule,
    ) -> Result<bool, MasteryError> {
        let changed =
            self.with_student(student_id, |s| s.evaluate_topic_completion(topic, rule))?;
        if changed {
            tracing::info!("student {student_id} completed topic '{topic}' in '{unit}'");
        }
        Ok(changed)
    }

    /// Recompute `unit`'s completion percentage from scratch.
    pub fn recompute_unit_progress(
        &self,
        student_id: &str,
        unit: &str,
        subtopics: &[String],
    ) -> Result<f64, MasteryError> {
        self.with_student(student_id, |s| s.recompute_unit_progress(unit, subtopics))
    }

    /// Mark `unit` completed if it is at 100%. Returns whether it was newly completed.
    pub fn evaluate_unit_completion(
        &self,
        student_id: &str,
        unit: &str,
    ) -> Result<bool, MasteryError> {
        let changed = self.with_student(student_id, |s| s.evaluate_unit_completion(unit))?;
        if changed {
            tracing::info!("student {student_id} completed unit '{unit}'");
        }
        Ok(changed)
    }

    /// Start tracking the subtopic after `topic` once `topic` meets `rule`.
    ///
    /// Returns the newly tracked subtopic, or `None` when `topic` is last in
    /// its unit, is below the threshold, or the next subtopic is already tracked.
    pub fn advance_if_ready(
        &self,
        student_id: &str,
        topic: &str,
        catalog: &Catalog,
        rule: &PromotionRule,
    ) -> Result<Option<String>, MasteryError> {
        let unit = catalog.unit_of(topic)?;
        let next = catalog.next_subtopic(unit, topic)?;

        self.with_student(student_id, |s| {
            let Some(next) = next else {
                return None;
            };
            let ready = s
                .topic_progress
                .get(topic)
                .is_some_and(|p| rule.is_met(p.attempts, p.average_score));
            if ready && s.seed_topic(next) {
                Some(next.to_string())
            } else {
                None
            }
        })
    }

    pub fn get(&self, student_id: &str) -> Option<StudentProgress> {
        self.students.get(student_id).map(|s| s.clone())
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.students.contains_key(student_id)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Remove every student record.
    pub fn clear(&self) {
        self.students.clear();
    }

    /// All records, ordered by student id.
    pub fn records(&self) -> Vec<StudentProgress> {
        let mut records: Vec<StudentProgress> =
            self.students.iter().map(|s| s.value().clone()).collect();
        records.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        records
    }
}
