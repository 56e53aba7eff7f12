//! Ordered, fail-fast field validation.

pub mod fields;
pub mod engine;
pub mod strength;

pub use engine::{FieldCheck, ValidationEngine};
pub use fields::FieldSpec;
pub use strength::{PassStrength, ScoreStrengthEvaluator, SharedStrength, StrengthEvaluator};
