//! The `mastery advance` command.

use std::path::Path;

use anyhow::Result;

use crate::workspace::Workspace;

pub fn execute(student: String, topic: String, config_path: Option<&Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;

    match workspace.engine.advance_if_ready(&student, &topic)? {
        Some(next) => {
            workspace.save()?;
            println!("{student} advanced from '{topic}' to '{next}'.");
        }
        None => println!("{student} stays on '{topic}'."),
    }
    Ok(())
}
