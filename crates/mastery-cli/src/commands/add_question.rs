//! The `mastery add-question` command.

use std::path::Path;

use anyhow::Result;

use mastery_core::model::{NewQuestion, QaType, QuestionTypeAssignment};

use crate::workspace::Workspace;

pub fn execute(
    id: String,
    text: String,
    topic: String,
    unit: Option<String>,
    source: String,
    author: Option<String>,
    config_path: Option<&Path>,
) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let unit = match unit {
        Some(unit) => unit,
        None => workspace.engine.catalog().unit_of(&topic)?.to_string(),
    };
    let inferred = QaType::from_question_text(&text);

    workspace.engine.create_question(NewQuestion {
        id: id.clone(),
        text,
        source,
        author_student_id: author,
        unit: unit.clone(),
        topic: topic.clone(),
    })?;
    if let Some(qa_type) = inferred {
        workspace.engine.assign_type(&QuestionTypeAssignment {
            id: id.clone(),
            qa_type: qa_type.to_string(),
        })?;
    }
    workspace.save()?;

    match inferred {
        Some(qa_type) => println!("Added question {id} ({unit} / {topic}, {qa_type})"),
        None => println!("Added question {id} ({unit} / {topic})"),
    }
    Ok(())
}
