//! The `mastery validate` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use mastery_core::catalog::{validate_catalog, Catalog};
use mastery_core::config::load_config_from;

pub fn execute(catalog_path: Option<PathBuf>, config_path: Option<&Path>) -> Result<()> {
    let path = match catalog_path {
        Some(path) => path,
        None => load_config_from(config_path)?.catalog_path,
    };
    let catalog = Catalog::load(&path)?;

    println!(
        "Catalog: {} ({} units, {} subtopics)",
        path.display(),
        catalog.units().len(),
        catalog.topic_count()
    );
    for unit in catalog.units() {
        println!(
            "  {} ({} subtopics, starts at '{}')",
            unit.name,
            unit.subtopics.len(),
            catalog.first_subtopic(&unit.name)?
        );
    }

    let warnings = validate_catalog(&catalog);
    for w in &warnings {
        println!("  [{}] WARNING: {}", w.unit, w.message);
    }

    if warnings.is_empty() {
        println!("Catalog valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
