//! The `mastery progress` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use mastery_core::report::StudentReport;
use mastery_report::html::write_html_report;

use crate::workspace::Workspace;

pub fn execute(
    student: String,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let progress = workspace.engine.student_progress(&student)?;
    let report = StudentReport::build(&workspace.engine.catalog(), &progress);

    match format.as_str() {
        "json" => match output {
            Some(path) => {
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            None => println!("{}", serde_json::to_string_pretty(&report)?),
        },
        "markdown" | "md" => emit(report.to_markdown(), output)?,
        "html" => {
            let path = output.unwrap_or_else(|| {
                let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
                PathBuf::from(format!("progress-{student}-{timestamp}.html"))
            });
            write_html_report(&report, &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        "text" => emit(render_text(&report), output)?,
        other => anyhow::bail!("unknown format: {other} (expected text, json, markdown, html)"),
    }

    Ok(())
}

fn emit(content: String, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Report saved to: {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn render_text(report: &StudentReport) -> String {
    use comfy_table::{Cell, Table};

    let mut out = format!(
        "Student {}: {}/{} units completed\n",
        report.student_id, report.completed_units, report.total_units
    );

    for unit in &report.units {
        let mut table = Table::new();
        table.set_header(vec!["Topic", "Attempts", "Average", "Completed"]);
        for t in &unit.topics {
            let attempts = if t.tracked {
                t.attempts.to_string()
            } else {
                "-".to_string()
            };
            table.add_row(vec![
                Cell::new(&t.topic),
                Cell::new(attempts),
                Cell::new(format!("{:.2}", t.average_score)),
                Cell::new(if t.completed { "yes" } else { "no" }),
            ]);
        }

        let current = unit
            .current_topic
            .as_deref()
            .map(|t| format!(", current: {t}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "\n{} ({:.2}%{current})\n{table}\n",
            unit.unit, unit.progress
        ));
    }

    out
}
