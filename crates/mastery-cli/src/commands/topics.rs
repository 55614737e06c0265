//! The `mastery topics` command.

use std::path::Path;

use anyhow::Result;

use mastery_core::report::aggregates_to_markdown;
use mastery_core::statistics::round2;

use crate::workspace::Workspace;

pub fn execute(format: String, config_path: Option<&Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let aggregates = workspace.engine.subtopic_aggregates();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&aggregates)?),
        "markdown" | "md" => println!("{}", aggregates_to_markdown(&aggregates)),
        "text" => {
            use comfy_table::{Cell, Table};

            let mut table = Table::new();
            table.set_header(vec!["Unit", "Topic", "Attempts", "Accuracy"]);
            for a in &aggregates {
                table.add_row(vec![
                    Cell::new(&a.unit),
                    Cell::new(&a.topic),
                    Cell::new(a.attempt_count),
                    Cell::new(format!("{:.2}%", round2(a.accuracy))),
                ]);
            }
            println!("{table}");
        }
        other => anyhow::bail!("unknown format: {other} (expected text, json, markdown)"),
    }

    Ok(())
}
