//! Per-subtopic running statistics across all students.

use dashmap::DashMap;

use crate::catalog::Catalog;
use crate::error::MasteryError;
use crate::model::SubtopicAggregate;

/// What [`AggregateStore::sync`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub added: usize,
    pub removed: usize,
}

/// Thread-safe subtopic aggregate store, keyed by topic.
#[derive(Debug, Default)]
pub struct AggregateStore {
    aggregates: DashMap<String, SubtopicAggregate>,
}

impl AggregateStore {
    /// Zeroed aggregates for every subtopic in `catalog`.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let store = Self::default();
        store.sync(catalog);
        store
    }

    pub fn from_records(records: impl IntoIterator<Item = SubtopicAggregate>) -> Self {
        let aggregates = records.into_iter().map(|a| (a.topic.clone(), a)).collect();
        Self { aggregates }
    }

    /// Count one attempt on `topic` and fold `contribution` (0–100) into its accuracy.
    ///
    /// Returns the aggregate as written.
    pub fn record_attempt(
        &self,
        topic: &str,
        contribution: Option<f64>,
    ) -> Result<SubtopicAggregate, MasteryError> {
        let mut aggregate = self
            .aggregates
            .get_mut(topic)
            .ok_or_else(|| MasteryError::topic_not_found(topic))?;
        aggregate.record_attempt(contribution);
        Ok(aggregate.clone())
    }

    /// Align the store with `catalog`.
    ///
    /// Surviving topics keep their counters (and follow a unit rename), new
    /// topics start at zero, and topics no longer in the catalog are dropped.
    pub fn sync(&self, catalog: &Catalog) -> SyncSummary {
        let before = self.aggregates.len();
        self.aggregates
            .retain(|topic, _| catalog.contains_topic(topic));
        let removed = before - self.aggregates.len();

        let mut added = 0;
        for (topic, unit) in catalog.topics() {
            let mut created = false;
            self.aggregates
                .entry(topic.to_string())
                .and_modify(|a| {
                    if a.unit != unit {
                        a.unit = unit.to_string();
                    }
                })
                .or_insert_with(|| {
                    created = true;
                    SubtopicAggregate::new(topic, unit)
                });
            if created {
                added += 1;
            }
        }

        SyncSummary { added, removed }
    }

    pub fn get(&self, topic: &str) -> Option<SubtopicAggregate> {
        self.aggregates.get(topic).map(|a| a.clone())
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// All aggregates, ordered by topic name.
    pub fn records(&self) -> Vec<SubtopicAggregate> {
        let mut records: Vec<SubtopicAggregate> =
            self.aggregates.iter().map(|a| a.value().clone()).collect();
        records.sort_by(|a, b| a.topic.cmp(&b.topic));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Unit;

    fn catalog(units: &[(&str, &[&str])]) -> Catalog {
        Catalog::from_units(
            units
                .iter()
                .map(|(name, topics)| Unit {
                    name: name.to_string(),
                    subtopics: topics.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn starts_zeroed_for_every_topic() {
        let store = AggregateStore::from_catalog(&catalog(&[("U1", &["T1", "T2"])]));
        assert_eq!(store.len(), 2);
        let t1 = store.get("T1").unwrap();
        assert_eq!(t1.attempt_count, 0);
        assert_eq!(t1.accuracy, 0.0);
        assert_eq!(t1.unit, "U1");
    }

    #[test]
    fn record_attempt_keeps_exact_mean() {
        let store = AggregateStore::from_catalog(&catalog(&[("U1", &["T1"])]));
        for score in [80.0, 60.0, 100.0] {
            store.record_attempt("T1", Some(score)).unwrap();
        }
        let t1 = store.get("T1").unwrap();
        assert_eq!(t1.attempt_count, 3);
        assert!((t1.accuracy - 80.0).abs() < 1e-9);
    }

    #[test]
    fn gated_attempt_counts_without_moving_accuracy() {
        let store = AggregateStore::from_catalog(&catalog(&[("U1", &["T1"])]));
        store.record_attempt("T1", Some(50.0)).unwrap();
        let after = store.record_attempt("T1", None).unwrap();
        assert_eq!(after.attempt_count, 2);
        assert_eq!(after.accuracy, 50.0);
    }

    #[test]
    fn unknown_topic_is_not_found() {
        let store = AggregateStore::from_catalog(&catalog(&[("U1", &["T1"])]));
        assert!(store.record_attempt("T9", Some(10.0)).unwrap_err().is_not_found());
    }

    #[test]
    fn sync_preserves_survivors() {
        let store = AggregateStore::from_catalog(&catalog(&[("U1", &["T1", "T2"])]));
        store.record_attempt("T1", Some(70.0)).unwrap();

        let summary = store.sync(&catalog(&[("U1", &["T1"]), ("U2", &["T3"])]));
        assert_eq!(summary, SyncSummary { added: 1, removed: 1 });
        assert_eq!(store.get("T1").unwrap().attempt_count, 1);
        assert!(store.get("T2").is_none());
        assert_eq!(store.get("T3").unwrap().unit, "U2");
    }
}
