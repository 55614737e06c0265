//! The `mastery questions` command.

use std::path::Path;

use anyhow::Result;

use mastery_core::statistics::round2;

use crate::workspace::Workspace;

pub fn execute(format: String, config_path: Option<&Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let questions = workspace.engine.questions_snapshot();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&questions)?),
        "text" => {
            use comfy_table::{Cell, Table};

            let mut table = Table::new();
            table.set_header(vec!["Id", "Unit", "Topic", "Type", "Attempts", "Accuracy"]);
            for q in &questions {
                let qa_type = q
                    .qa_type
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![
                    Cell::new(&q.id),
                    Cell::new(&q.unit),
                    Cell::new(&q.topic),
                    Cell::new(qa_type),
                    Cell::new(q.attempt_count),
                    Cell::new(format!("{:.2}%", round2(q.accuracy))),
                ]);
            }
            println!("{table}");
            println!("{} question(s)", questions.len());
        }
        other => anyhow::bail!("unknown format: {other} (expected text, json)"),
    }

    Ok(())
}
