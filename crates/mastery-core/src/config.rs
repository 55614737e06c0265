//! Configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::integrity::CopyDetection;
use crate::runner::RunnerConfig;
use crate::statistics::{AccuracyPolicy, PromotionRule};

/// Top-level mastery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryConfig {
    /// Curriculum file (`.json` course tree or `.toml`).
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Directory holding the state snapshot.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Create unknown students on their first answer.
    #[serde(default = "default_auto_enroll")]
    pub auto_enroll: bool,
    #[serde(default)]
    pub promotion: PromotionRule,
    #[serde(default)]
    pub accuracy: AccuracyPolicy,
    #[serde(default)]
    pub integrity: CopyDetection,
    #[serde(default)]
    pub grading: GradingConfig,
}

/// Settings for driving an external grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Max concurrent submissions.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Max retries on grader errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("curriculum.json")
}
fn default_state_dir() -> PathBuf {
    PathBuf::from("./mastery-state")
}
fn default_auto_enroll() -> bool {
    true
}
fn default_parallelism() -> usize {
    4
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            state_dir: default_state_dir(),
            auto_enroll: default_auto_enroll(),
            promotion: PromotionRule::default(),
            accuracy: AccuracyPolicy::default(),
            integrity: CopyDetection::default(),
            grading: GradingConfig::default(),
        }
    }
}

impl MasteryConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            promotion: self.promotion,
            accuracy: self.accuracy,
            auto_enroll: self.auto_enroll,
        }
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            parallelism: self.grading.parallelism,
            max_retries: self.grading.max_retries,
            retry_delay: Duration::from_millis(self.grading.retry_delay_ms),
            copy_detection: self.integrity,
        }
    }

    /// Path of the state snapshot inside `state_dir`.
    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join(SNAPSHOT_FILE_NAME)
    }
}

/// File name of the snapshot inside the state directory.
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + len]).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration.
///
/// Search order:
/// 1. `path`, when given (it must exist)
/// 2. `mastery.toml` in the current directory
/// 3. `~/.config/mastery/config.toml`
/// 4. built-in defaults
///
/// `${VAR}` references in path values are expanded first; paths that are
/// still relative are taken relative to the config file's directory.
/// Environment variable overrides: `MASTERY_CATALOG`, `MASTERY_STATE_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<MasteryConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("mastery.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let mut parsed = toml::from_str::<MasteryConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            parsed.catalog_path = resolve_path(&parsed.catalog_path);
            parsed.state_dir = resolve_path(&parsed.state_dir);
            // Paths still relative after expansion are relative to the config file.
            if let Some(base) = path.parent().filter(|b| !b.as_os_str().is_empty()) {
                if parsed.catalog_path.is_relative() {
                    parsed.catalog_path = base.join(&parsed.catalog_path);
                }
                if parsed.state_dir.is_relative() {
                    parsed.state_dir = base.join(&parsed.state_dir);
                }
            }
            parsed
        }
        None => MasteryConfig::default(),
    };

    // Apply env var overrides
    if let Ok(catalog) = std::env::var("MASTERY_CATALOG") {
        config.catalog_path = resolve_path(Path::new(&catalog));
    }
    if let Ok(state_dir) = std::env::var("MASTERY_STATE_DIR") {
        config.state_dir = resolve_path(Path::new(&state_dir));
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("mastery"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::AccuracyGate;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_MASTERY_TEST_VAR", "term-1");
        assert_eq!(resolve_env_vars("${_MASTERY_TEST_VAR}"), "term-1");
        assert_eq!(
            resolve_env_vars("state/${_MASTERY_TEST_VAR}/data"),
            "state/term-1/data"
        );
        assert_eq!(resolve_env_vars("unterminated ${oops"), "unterminated ${oops");
        std::env::remove_var("_MASTERY_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = MasteryConfig::default();
        assert!(config.auto_enroll);
        assert_eq!(config.promotion.min_attempts, 3);
        assert_eq!(config.grading.parallelism, 4);
        assert_eq!(config.accuracy.question, AccuracyGate::CorrectOnly);
        assert_eq!(config.snapshot_path(), PathBuf::from("./mastery-state/snapshot.json"));
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
catalog_path = "course.toml"
auto_enroll = false

[promotion]
min_attempts = 4
min_average = 8.5

[accuracy]
subtopic = "correct-only"

[integrity]
max_chars_per_second = 5.0

[grading]
retry_delay_ms = 250
"#;
        let config: MasteryConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.auto_enroll);
        assert_eq!(config.promotion.min_attempts, 4);
        assert_eq!(config.accuracy.question, AccuracyGate::CorrectOnly);
        assert_eq!(config.accuracy.subtopic, AccuracyGate::CorrectOnly);
        assert_eq!(config.integrity.min_chars, 30);
        assert_eq!(config.integrity.max_chars_per_second, 5.0);
        assert_eq!(
            config.runner_config().retry_delay,
            Duration::from_millis(250)
        );
        assert!(!config.engine_config().auto_enroll);
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn env_references_expand_before_relative_resolution() {
        std::env::set_var("_MASTERY_TEST_COURSE_ROOT", "/srv/course");
        std::env::set_var("_MASTERY_TEST_TERM", "term-2");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mastery.toml");
        std::fs::write(
            &path,
            "catalog_path = \"${_MASTERY_TEST_COURSE_ROOT}/tree.json\"\n\
             state_dir = \"${_MASTERY_TEST_TERM}/state\"\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        std::env::remove_var("_MASTERY_TEST_COURSE_ROOT");
        std::env::remove_var("_MASTERY_TEST_TERM");

        if std::env::var("MASTERY_CATALOG").is_err() {
            assert_eq!(config.catalog_path, PathBuf::from("/srv/course/tree.json"));
        }
        if std::env::var("MASTERY_STATE_DIR").is_err() {
            assert_eq!(config.state_dir, dir.path().join("term-2/state"));
        }
    }

    #[test]
    fn explicit_path_resolves_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mastery.toml");
        std::fs::write(&path, "catalog_path = \"tree.json\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        if std::env::var("MASTERY_CATALOG").is_err() {
            assert_eq!(config.catalog_path, dir.path().join("tree.json"));
        }
    }
}
