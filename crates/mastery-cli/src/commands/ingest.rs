//! The `mastery ingest` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use mastery_core::model::GradedAnswer;

use crate::workspace::Workspace;

pub fn execute(file: PathBuf, config_path: Option<&Path>) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read answers: {}", file.display()))?;
    let workspace = Workspace::open(config_path)?;

    let mut applied = 0usize;
    let mut failed = 0usize;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;

        let answer: GradedAnswer = match serde_json::from_str(line) {
            Ok(answer) => answer,
            Err(e) => {
                eprintln!("  line {line_no}: invalid answer: {e}");
                failed += 1;
                continue;
            }
        };

        match workspace.engine.ingest_graded_answer(answer) {
            Ok(outcome) => {
                applied += 1;
                if outcome.topic_completed {
                    println!(
                        "{} completed topic '{}' ({} attempts, average {:.2})",
                        outcome.student_id,
                        outcome.topic,
                        outcome.topic_progress.attempts,
                        outcome.topic_progress.average_score
                    );
                }
                if outcome.unit_completed {
                    println!("{} completed unit '{}'", outcome.student_id, outcome.unit);
                }
            }
            Err(e) => {
                eprintln!("  line {line_no}: {e}");
                failed += 1;
            }
        }
    }

    workspace.save()?;

    println!("Ingested {applied} answer(s), {failed} failed.");
    Ok(())
}
