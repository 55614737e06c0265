//! Student progress reports with JSON persistence and markdown output.
//!
//! Reports are a presentation view: values are rounded to two decimals here
//! and nowhere else.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::model::{StudentProgress, SubtopicAggregate};
use crate::statistics::round2;

/// A student's progress across the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub student_id: String,
    /// Units in curriculum order.
    pub units: Vec<UnitSummary>,
    pub completed_units: usize,
    pub total_units: usize,
}

/// One unit of a [`StudentReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub unit: String,
    /// Completion percentage, 0–100.
    pub progress: f64,
    pub completed: bool,
    /// First subtopic not yet completed.
    pub current_topic: Option<String>,
    /// Subtopics in promotion order.
    pub topics: Vec<TopicSummary>,
}

/// One subtopic of a [`UnitSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: String,
    /// Whether the student has a progress entry for this subtopic.
    pub tracked: bool,
    pub attempts: u32,
    /// Average score, 0–10.
    pub average_score: f64,
    pub completed: bool,
}

impl StudentReport {
    /// Build a report for `progress` laid out by `catalog`.
    ///
    /// Progress entries for subtopics no longer in the catalog are omitted.
    pub fn build(catalog: &Catalog, progress: &StudentProgress) -> Self {
        let units: Vec<UnitSummary> = catalog
            .units()
            .iter()
            .map(|unit| {
                let topics: Vec<TopicSummary> = unit
                    .subtopics
                    .iter()
                    .map(|topic| {
                        let entry = progress.topic_progress.get(topic);
                        TopicSummary {
                            topic: topic.clone(),
                            tracked: entry.is_some(),
                            attempts: entry.map_or(0, |p| p.attempts),
                            average_score: round2(entry.map_or(0.0, |p| p.average_score)),
                            completed: progress.completed_topics.contains(topic),
                        }
                    })
                    .collect();
                let current_topic = topics
                    .iter()
                    .find(|t| !t.completed)
                    .map(|t| t.topic.clone());

                UnitSummary {
                    unit: unit.name.clone(),
                    progress: round2(
                        progress
                            .unit_progress
                            .get(&unit.name)
                            .copied()
                            .unwrap_or(0.0),
                    ),
                    completed: progress.completed_units.contains(&unit.name),
                    current_topic,
                    topics,
                }
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            student_id: progress.student_id.clone(),
            completed_units: units.iter().filter(|u| u.completed).count(),
            total_units: units.len(),
            units,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: StudentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## Progress for {}\n\n", self.student_id));
        md.push_str(&format!(
            "**Summary:** {}/{} units completed\n\n",
            self.completed_units, self.total_units
        ));

        for unit in &self.units {
            let status = if unit.completed { " (completed)" } else { "" };
            md.push_str(&format!(
                "### {} ({:.2}%){status}\n\n",
                unit.unit, unit.progress
            ));
            if let Some(current) = &unit.current_topic {
                md.push_str(&format!("Current topic: {current}\n\n"));
            }
            md.push_str("| Topic | Attempts | Average | Completed |\n");
            md.push_str("|-------|----------|---------|-----------|\n");
            for t in &unit.topics {
                md.push_str(&format!(
                    "| {} | {} | {:.2} | {} |\n",
                    t.topic,
                    t.attempts,
                    t.average_score,
                    if t.completed { "yes" } else { "no" }
                ));
            }
            md.push('\n');
        }

        md
    }
}

/// Format subtopic aggregates as a markdown table.
pub fn aggregates_to_markdown(aggregates: &[SubtopicAggregate]) -> String {
    let mut md = String::new();
    md.push_str("| Unit | Topic | Attempts | Accuracy |\n");
    md.push_str("|------|-------|----------|----------|\n");
    for a in aggregates {
        md.push_str(&format!(
            "| {} | {} | {} | {:.2}% |\n",
            a.unit,
            a.topic,
            a.attempt_count,
            round2(a.accuracy)
        ));
    }
    md
}
