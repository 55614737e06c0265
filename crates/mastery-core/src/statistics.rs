//! Running-mean arithmetic and the promotion rule.
//!
//! Question and subtopic accuracy live on a 0–100 scale; a student's per-topic
//! average lives on the 0–10 score scale. Keep the two apart: only
//! [`score_to_percent`] converts between them.

use serde::{Deserialize, Serialize};

/// Highest score a grader may award.
pub const MAX_SCORE: u8 = 10;

/// Fold one more observation into a running mean.
///
/// `count` is the number of observations *including* `value`, i.e. the
/// post-increment count. The result is `((mean * (count - 1)) + value) / count`.
/// A `count` of zero leaves the mean unchanged.
pub fn fold_running_mean(mean: f64, count: u64, value: f64) -> f64 {
    if count == 0 {
        return mean;
    }
    let n = count as f64;
    (mean * (n - 1.0) + value) / n
}

/// Convert a 0–10 score to its 0–100 accuracy contribution.
pub fn score_to_percent(score: u8) -> f64 {
    f64::from(score) / f64::from(MAX_SCORE) * 100.0
}

/// Percentage of `completed` out of `total`, in 0–100.
///
/// An empty denominator yields 0; catalogs reject empty units, so this only
/// guards against callers passing an unfiltered list.
pub fn completion_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * completed as f64 / total as f64
}

/// Round to two decimal places for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Promotion predicate: enough attempts with a high enough average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromotionRule {
    /// Minimum number of attempts on the topic.
    #[serde(default = "default_min_attempts")]
    pub min_attempts: u32,
    /// Minimum average score on the 0–10 scale.
    #[serde(default = "default_min_average")]
    pub min_average: f64,
}

fn default_min_attempts() -> u32 {
    3
}

fn default_min_average() -> f64 {
    7.0
}

impl Default for PromotionRule {
    fn default() -> Self {
        Self {
            min_attempts: default_min_attempts(),
            min_average: default_min_average(),
        }
    }
}

impl PromotionRule {
    pub fn is_met(&self, attempts: u32, average: f64) -> bool {
        attempts >= self.min_attempts && average >= self.min_average
    }
}

/// Which attempts contribute to a running accuracy.
///
/// Attempt counts always increase; the gate only decides whether the score
/// of an attempt is folded into the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyGate {
    /// Only attempts graded correct with a score present contribute.
    CorrectOnly,
    /// Every attempt contributes; a missing score counts as zero.
    EveryAttempt,
}

impl AccuracyGate {
    /// The 0–100 contribution of an attempt under this gate, if any.
    pub fn contribution(self, correct: bool, score: Option<u8>) -> Option<f64> {
        match self {
            AccuracyGate::CorrectOnly => {
                if correct {
                    score.map(score_to_percent)
                } else {
                    None
                }
            }
            AccuracyGate::EveryAttempt => Some(score_to_percent(score.unwrap_or(0))),
        }
    }
}

/// Gates for the two independent accuracy computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyPolicy {
    /// Gate for per-question accuracy.
    #[serde(default = "default_question_gate")]
    pub question: AccuracyGate,
    /// Gate for per-subtopic aggregate accuracy.
    #[serde(default = "default_subtopic_gate")]
    pub subtopic: AccuracyGate,
}

fn default_question_gate() -> AccuracyGate {
    AccuracyGate::CorrectOnly
}

fn default_subtopic_gate() -> AccuracyGate {
    AccuracyGate::EveryAttempt
}

impl Default for AccuracyPolicy {
    fn default() -> Self {
        Self {
            question: default_question_gate(),
            subtopic: default_subtopic_gate(),
        }
    }
}
