//! Copy-paste detection from typing speed.

use serde::{Deserialize, Serialize};

/// Thresholds for the typing-speed heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CopyDetection {
    /// Answers shorter than this (trimmed, in chars) are never suspected.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    /// Typing faster than this many chars per second is suspicious.
    #[serde(default = "default_max_chars_per_second")]
    pub max_chars_per_second: f64,
    /// A fast answer is only flagged at or above this length.
    #[serde(default = "default_min_suspect_chars")]
    pub min_suspect_chars: usize,
}

fn default_min_chars() -> usize {
    30
}

fn default_max_chars_per_second() -> f64 {
    3.0
}

fn default_min_suspect_chars() -> usize {
    50
}

impl Default for CopyDetection {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            max_chars_per_second: default_max_chars_per_second(),
            min_suspect_chars: default_min_suspect_chars(),
        }
    }
}

/// Result of the heuristic for one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CopyVerdict {
    pub suspected: bool,
    /// Measured typing speed; 0 for answers below `min_chars`, infinite for
    /// a zero or negative typing time.
    pub chars_per_second: f64,
}

/// Flag answers that were produced faster than a person types.
pub fn detect_suspected_copy(
    answer_text: &str,
    typing_seconds: f64,
    thresholds: &CopyDetection,
) -> CopyVerdict {
    let chars = answer_text.trim().chars().count();
    if chars < thresholds.min_chars {
        return CopyVerdict {
            suspected: false,
            chars_per_second: 0.0,
        };
    }

    let chars_per_second = if typing_seconds > 0.0 {
        chars as f64 / typing_seconds
    } else {
        f64::INFINITY
    };

    CopyVerdict {
        suspected: chars_per_second > thresholds.max_chars_per_second
            && chars >= thresholds.min_suspect_chars,
        chars_per_second,
    }
}
