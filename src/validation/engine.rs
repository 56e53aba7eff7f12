//! Fail-fast field validation.
//!
//! Each validator runs its checks in a fixed order so failure messages are
//! deterministic: missing value, required, length bounds, numeric bounds,
//! pattern, and (for passwords) strength. Record validation runs field
//! checks in declared order and reports only the first failure.

use std::sync::Arc;

use crate::error::ValidationError;

use super::fields::FieldSpec;
use super::strength::{ScoreStrengthEvaluator, SharedStrength};

/// One (value, spec) pair in a record validation.
pub enum FieldCheck<'a> {
    Text(Option<&'a str>, &'a FieldSpec),
    Number(Option<&'a str>, &'a FieldSpec),
    Password(Option<&'a str>, &'a FieldSpec),
}

pub struct ValidationEngine {
    strength: SharedStrength,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self {
            strength: Arc::new(ScoreStrengthEvaluator::new()),
        }
    }

    pub fn with_strength(strength: SharedStrength) -> Self {
        Self { strength }
    }

    pub fn validate_text(
        &self,
        value: Option<&str>,
        spec: &FieldSpec,
    ) -> Result<(), ValidationError> {
        let value = match value {
            Some(value) => value,
            None => {
                return Err(ValidationError::NoValue {
                    field: spec.name.clone(),
                })
            }
        };
        if spec.required && value.is_empty() {
            return Err(ValidationError::Required {
                field: spec.name.clone(),
            });
        }
        let length = value.chars().count();
        if let Some(min) = spec.min_length {
            if length < min {
                return Err(ValidationError::TooShort {
                    field: spec.name.clone(),
                });
            }
        }
        if let Some(max) = spec.max_length {
            if length > max {
                return Err(ValidationError::TooLong {
                    field: spec.name.clone(),
                });
            }
        }
        if let Some(pattern) = &spec.pattern {
            if !pattern.is_match(value) {
                return Err(ValidationError::Invalid {
                    field: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Numeric validation over a textual value; an unparseable or missing
    /// value reads as missing.
    pub fn validate_number(
        &self,
        value: Option<&str>,
        spec: &FieldSpec,
    ) -> Result<(), ValidationError> {
        let number: i64 = match value.and_then(|value| value.parse().ok()) {
            Some(number) => number,
            None => {
                return Err(ValidationError::NoValue {
                    field: spec.name.clone(),
                })
            }
        };
        if let Some(minimum) = spec.minimum {
            if number < minimum {
                return Err(ValidationError::TooLow {
                    field: spec.name.clone(),
                });
            }
        }
        if let Some(maximum) = spec.maximum {
            if number > maximum {
                return Err(ValidationError::TooHigh {
                    field: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Text validation followed by delegation to the strength evaluator.
    pub fn validate_password(
        &self,
        value: Option<&str>,
        spec: &FieldSpec,
    ) -> Result<(), ValidationError> {
        self.validate_text(value, spec)?;
        if let (Some(minimum), Some(password)) = (spec.strength, value) {
            if self.strength.evaluate(password) < minimum {
                return Err(ValidationError::TooWeak {
                    field: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run `checks` in declared order, returning the first failure only.
    pub fn validate_record(&self, checks: &[FieldCheck<'_>]) -> Result<(), ValidationError> {
        for check in checks {
            match check {
                FieldCheck::Text(value, spec) => self.validate_text(*value, spec)?,
                FieldCheck::Number(value, spec) => self.validate_number(*value, spec)?,
                FieldCheck::Password(value, spec) => self.validate_password(*value, spec)?,
            }
        }
        Ok(())
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::strength::PassStrength;
    use regex::Regex;

    fn engine() -> ValidationEngine {
        ValidationEngine::new()
    }

    #[test]
    fn missing_value_reported_before_required() {
        let spec = FieldSpec::new("email").required();
        assert_eq!(
            engine().validate_text(None, &spec),
            Err(ValidationError::NoValue {
                field: "email".to_string()
            })
        );
        assert_eq!(
            engine().validate_text(Some(""), &spec),
            Err(ValidationError::Required {
                field: "email".to_string()
            })
        );
    }

    #[test]
    fn length_bounds_are_checked_in_order() {
        let spec = FieldSpec::new("handle").length(3, 5);
        assert_eq!(
            engine().validate_text(Some("ab"), &spec),
            Err(ValidationError::TooShort {
                field: "handle".to_string()
            })
        );
        assert_eq!(
            engine().validate_text(Some("abcdef"), &spec),
            Err(ValidationError::TooLong {
                field: "handle".to_string()
            })
        );
        assert_eq!(engine().validate_text(Some("abcd"), &spec), Ok(()));
    }

    #[test]
    fn pattern_runs_after_length() {
        let spec = FieldSpec::new("state")
            .length(2, 2)
            .pattern(Regex::new("^[A-Z]{2}$").expect("regex"));
        assert_eq!(
            engine().validate_text(Some("t"), &spec),
            Err(ValidationError::TooShort {
                field: "state".to_string()
            })
        );
        assert_eq!(
            engine().validate_text(Some("tx"), &spec),
            Err(ValidationError::Invalid {
                field: "state".to_string()
            })
        );
        assert_eq!(engine().validate_text(Some("TX"), &spec), Ok(()));
    }

    #[test]
    fn unparseable_number_is_missing() {
        let spec = FieldSpec::new("age").range(13, 120);
        assert_eq!(
            engine().validate_number(Some("not a number"), &spec),
            Err(ValidationError::NoValue {
                field: "age".to_string()
            })
        );
    }

    #[test]
    fn numeric_bounds() {
        let spec = FieldSpec::new("age").range(13, 120);
        assert_eq!(
            engine().validate_number(Some("12"), &spec),
            Err(ValidationError::TooLow {
                field: "age".to_string()
            })
        );
        assert_eq!(
            engine().validate_number(Some("121"), &spec),
            Err(ValidationError::TooHigh {
                field: "age".to_string()
            })
        );
        assert_eq!(engine().validate_number(Some("42"), &spec), Ok(()));
    }

    #[test]
    fn weak_password_fails_strength_gate() {
        let spec = FieldSpec::new("password")
            .required()
            .min_length(8)
            .strength(PassStrength::Moderate);
        assert_eq!(
            engine().validate_password(Some("password"), &spec),
            Err(ValidationError::TooWeak {
                field: "password".to_string()
            })
        );
        assert_eq!(engine().validate_password(Some("Password1"), &spec), Ok(()));
    }

    #[test]
    fn record_reports_only_first_failure() {
        let street = FieldSpec::new("street").required();
        let city = FieldSpec::new("city").required();
        let engine = engine();
        let result = engine.validate_record(&[
            FieldCheck::Text(Some(""), &street),
            FieldCheck::Text(Some(""), &city),
        ]);
        assert_eq!(
            result,
            Err(ValidationError::Required {
                field: "street".to_string()
            })
        );
    }

    #[test]
    fn record_passes_when_every_field_passes() {
        let street = FieldSpec::new("street").required();
        let zip = FieldSpec::new("zip").range(501, 99950);
        let engine = engine();
        let result = engine.validate_record(&[
            FieldCheck::Text(Some("100 Main St"), &street),
            FieldCheck::Number(Some("75067"), &zip),
        ]);
        assert_eq!(result, Ok(()));
    }
}
