//! The `mastery reset` command.

use std::path::Path;

use anyhow::Result;

use crate::workspace::Workspace;

pub fn execute(students: bool, questions: bool, config_path: Option<&Path>) -> Result<()> {
    anyhow::ensure!(
        students || questions,
        "nothing to reset; pass --students and/or --questions"
    );

    let workspace = Workspace::open(config_path)?;
    if students {
        let removed = workspace.engine.reset_students();
        println!("Removed {removed} student record(s).");
    }
    if questions {
        let removed = workspace.engine.reset_question_bank();
        println!("Removed {removed} question(s).");
    }
    workspace.save()?;

    Ok(())
}
