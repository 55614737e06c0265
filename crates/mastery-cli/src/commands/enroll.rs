//! The `mastery enroll` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::workspace::Workspace;

pub fn execute(
    mut students: Vec<String>,
    roster: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    if let Some(path) = roster {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read roster: {}", path.display()))?;
        students.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }
    anyhow::ensure!(
        !students.is_empty(),
        "no student ids given; pass ids or --file"
    );
    if let Some(blank) = students.iter().find(|s| s.trim().is_empty()) {
        anyhow::bail!("student id {blank:?} is blank");
    }

    let workspace = Workspace::open(config_path)?;
    let created = workspace
        .engine
        .enroll_roster(students.iter().map(String::as_str));
    workspace.save()?;

    println!(
        "Enrolled {created} new student(s) ({} total).",
        workspace.engine.student_ids().len()
    );
    Ok(())
}
