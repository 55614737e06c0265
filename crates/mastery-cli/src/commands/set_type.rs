//! The `mastery set-type` command.

use std::path::Path;

use anyhow::Result;

use mastery_core::model::QuestionTypeAssignment;

use crate::workspace::Workspace;

pub fn execute(id: String, qa_type: String, config_path: Option<&Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let assigned = workspace
        .engine
        .assign_type(&QuestionTypeAssignment { id: id.clone(), qa_type })?;
    workspace.save()?;

    println!("{id}: {assigned} ({})", assigned.native_label());
    Ok(())
}
