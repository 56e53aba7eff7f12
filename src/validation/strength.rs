//! Password strength scoring.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Password strength tiers, ordered weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStrength {
    Weak,
    Moderate,
    Strong,
}

/// Pluggable strength evaluation, delegated to by password validation.
pub trait StrengthEvaluator: Send + Sync {
    fn evaluate(&self, password: &str) -> PassStrength;
}

pub type SharedStrength = Arc<dyn StrengthEvaluator>;

const SYMBOLS: &str = "!@#$%&_";

/// Additive scoring evaluator: one point each for being non-empty, meeting
/// the minimum length, reaching ten characters, and containing an
/// uppercase letter, a lowercase letter, a digit, and a symbol.
pub struct ScoreStrengthEvaluator {
    pub minimum_length: usize,
}

impl ScoreStrengthEvaluator {
    pub fn new() -> Self {
        Self { minimum_length: 8 }
    }

    pub fn with_minimum_length(minimum_length: usize) -> Self {
        Self { minimum_length }
    }
}

impl Default for ScoreStrengthEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl StrengthEvaluator for ScoreStrengthEvaluator {
    fn evaluate(&self, password: &str) -> PassStrength {
        let length = password.chars().count();
        let mut score = 0;

        if length > 0 {
            score += 1;
        }
        if length >= self.minimum_length {
            score += 1;
        }
        if length >= 10 {
            score += 1;
        }
        if password.chars().any(|c| c.is_ascii_uppercase()) {
            score += 1;
        }
        if password.chars().any(|c| c.is_ascii_lowercase()) {
            score += 1;
        }
        if password.chars().any(|c| c.is_ascii_digit()) {
            score += 1;
        }
        if password.chars().any(|c| SYMBOLS.contains(c)) {
            score += 1;
        }

        match score {
            0..=3 => PassStrength::Weak,
            4..=5 => PassStrength::Moderate,
            _ => PassStrength::Strong,
        }
    }
}
