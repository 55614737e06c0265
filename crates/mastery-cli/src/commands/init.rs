//! The `mastery init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create mastery.toml
    if std::path::Path::new("mastery.toml").exists() {
        println!("mastery.toml already exists, skipping.");
    } else {
        std::fs::write("mastery.toml", SAMPLE_CONFIG)?;
        println!("Created mastery.toml");
    }

    // Create sample curriculum
    let curriculum_path = std::path::Path::new("curriculum.json");
    if curriculum_path.exists() {
        println!("curriculum.json already exists, skipping.");
    } else {
        std::fs::write(curriculum_path, SAMPLE_CURRICULUM)?;
        println!("Created curriculum.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit curriculum.json with your units and subtopics");
    println!("  2. Run: mastery validate");
    println!("  3. Run: mastery enroll <student-id>...");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mastery configuration

catalog_path = "curriculum.json"
state_dir = "./mastery-state"
auto_enroll = true

[promotion]
min_attempts = 3
min_average = 7.0

[accuracy]
question = "correct-only"
subtopic = "every-attempt"

[integrity]
min_chars = 30
max_chars_per_second = 3.0
min_suspect_chars = 50

[grading]
parallelism = 4
max_retries = 3
retry_delay_ms = 1000
"#;

const SAMPLE_CURRICULUM: &str = r#"[
  {
    "name": "Unit 1 Trees",
    "children": [
      { "name": "Binary trees" },
      { "name": "Heaps" },
      { "name": "AVL trees" }
    ]
  },
  {
    "name": "Unit 2 Hashing",
    "children": [
      { "name": "Hash functions" },
      { "name": "Collision resolution" }
    ]
  }
]
"#;
