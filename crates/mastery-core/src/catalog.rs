//! Curriculum catalog: units and their ordered subtopics.
//!
//! Loads a curriculum from a JSON course tree or a TOML file, rejects
//! malformed definitions, and answers the unit/subtopic lookups the engine
//! needs. A `Catalog` is immutable; reloading means building a new one.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::MasteryError;

/// A top-level curriculum division with its subtopics in promotion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub subtopics: Vec<String>,
}

/// Intermediate JSON structure: `[{ "name": ..., "children": [{ "name": ... }] }]`.
#[derive(Debug, Deserialize)]
struct CourseTreeNode {
    name: String,
    #[serde(default)]
    children: Vec<CourseTreeNode>,
}

/// Intermediate TOML structure for `[[units]]` tables.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    #[serde(default)]
    units: Vec<Unit>,
}

/// Validated, read-only curriculum lookup tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    units: Vec<Unit>,
    unit_index: HashMap<String, usize>,
    topic_unit: HashMap<String, String>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate or blank names and empty units.
    pub fn from_units(units: Vec<Unit>) -> Result<Self, MasteryError> {
        let mut unit_index = HashMap::new();
        let mut topic_unit: HashMap<String, String> = HashMap::new();

        for (i, unit) in units.iter().enumerate() {
            if unit.name.trim().is_empty() {
                return Err(MasteryError::Catalog(format!(
                    "unit #{} has a blank name",
                    i + 1
                )));
            }
            if unit_index.insert(unit.name.clone(), i).is_some() {
                return Err(MasteryError::Catalog(format!(
                    "duplicate unit name: {}",
                    unit.name
                )));
            }
            if unit.subtopics.is_empty() {
                return Err(MasteryError::Catalog(format!(
                    "unit '{}' has no subtopics and could never be completed",
                    unit.name
                )));
            }
            for topic in &unit.subtopics {
                if topic.trim().is_empty() {
                    return Err(MasteryError::Catalog(format!(
                        "unit '{}' has a blank subtopic name",
                        unit.name
                    )));
                }
                if let Some(owner) = topic_unit.insert(topic.clone(), unit.name.clone()) {
                    let message = if owner == unit.name {
                        format!("subtopic '{topic}' appears twice in unit '{owner}'")
                    } else {
                        format!(
                            "subtopic '{topic}' appears in both '{owner}' and '{}'",
                            unit.name
                        )
                    };
                    return Err(MasteryError::Catalog(message));
                }
            }
        }

        Ok(Self {
            units,
            unit_index,
            topic_unit,
        })
    }

    /// Load a catalog file, choosing the format by extension (`.json` or `.toml`).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => parse_catalog_toml(&content, path),
            _ => parse_course_tree_json(&content, path),
        }
    }

    /// Units in curriculum order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }

    /// Every `(topic, unit)` pair in curriculum order.
    pub fn topics(&self) -> impl Iterator<Item = (&str, &str)> {
        self.units.iter().flat_map(|u| {
            u.subtopics
                .iter()
                .map(move |t| (t.as_str(), u.name.as_str()))
        })
    }

    pub fn topic_count(&self) -> usize {
        self.topic_unit.len()
    }

    pub fn contains_topic(&self, topic: &str) -> bool {
        self.topic_unit.contains_key(topic)
    }

    pub fn unit_of(&self, topic: &str) -> Result<&str, MasteryError> {
        self.topic_unit
            .get(topic)
            .map(String::as_str)
            .ok_or_else(|| MasteryError::topic_not_found(topic))
    }

    pub fn subtopics_of(&self, unit: &str) -> Result<&[String], MasteryError> {
        self.unit_index
            .get(unit)
            .map(|&i| self.units[i].subtopics.as_slice())
            .ok_or_else(|| MasteryError::unit_not_found(unit))
    }

    pub fn first_subtopic(&self, unit: &str) -> Result<&str, MasteryError> {
        let subtopics = self.subtopics_of(unit)?;
        subtopics
            .first()
            .map(String::as_str)
            .ok_or_else(|| MasteryError::Catalog(format!("unit '{unit}' has no subtopics")))
    }

    /// The subtopic after `topic` in `unit`, or `None` if `topic` is last.
    pub fn next_subtopic(&self, unit: &str, topic: &str) -> Result<Option<&str>, MasteryError> {
        let subtopics = self.subtopics_of(unit)?;
        let position = subtopics
            .iter()
            .position(|t| t == topic)
            .ok_or_else(|| MasteryError::topic_not_found(topic))?;
        Ok(subtopics.get(position + 1).map(String::as_str))
    }
}

/// Parse a JSON course tree into a catalog.
pub fn parse_course_tree_json(content: &str, source_path: &Path) -> Result<Catalog> {
    let nodes: Vec<CourseTreeNode> = serde_json::from_str(content)
        .with_context(|| format!("failed to parse course tree: {}", source_path.display()))?;

    let units = nodes
        .into_iter()
        .map(|node| Unit {
            name: node.name,
            subtopics: node.children.into_iter().map(|c| c.name).collect(),
        })
        .collect();

    Catalog::from_units(units)
        .with_context(|| format!("invalid catalog: {}", source_path.display()))
}

/// Parse a TOML catalog (`[[units]]` with `name` and `subtopics`).
pub fn parse_catalog_toml(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Catalog::from_units(parsed.units)
        .with_context(|| format!("invalid catalog: {}", source_path.display()))
}

/// A non-fatal observation about a catalog.
#[derive(Debug, Clone)]
pub struct CatalogWarning {
    /// The unit concerned.
    pub unit: String,
    /// Warning message.
    pub message: String,
}

/// Check a catalog for definitions that load but are probably mistakes.
pub fn validate_catalog(catalog: &Catalog) -> Vec<CatalogWarning> {
    let mut warnings = Vec::new();

    for unit in catalog.units() {
        if unit.subtopics.len() == 1 {
            warnings.push(CatalogWarning {
                unit: unit.name.clone(),
                message: "unit has a single subtopic; completing it completes the unit".into(),
            });
        }

        let padded: HashSet<&str> = unit
            .subtopics
            .iter()
            .filter(|t| t.trim() != t.as_str())
            .map(String::as_str)
            .collect();
        for topic in padded {
            warnings.push(CatalogWarning {
                unit: unit.name.clone(),
                message: format!("subtopic '{topic}' has leading or trailing whitespace"),
            });
        }
    }

    warnings
}
