//! Post-parse validation.

use std::sync::Arc;

use regex::Regex;

use crate::assign::ParsedArgument;
use crate::error::ValidationError;
use crate::priority::{Priority, PriorityList};

/// Checks a resolved value. The error string becomes the user-facing reason.
pub trait Validator: Send + Sync {
    fn priority(&self) -> Priority {
        Priority::NORMAL
    }

    fn validate(&self, argument: &ParsedArgument) -> Result<(), String>;
}

/// Validators of one argument, run in priority order until the first failure.
#[derive(Clone, Default)]
pub struct ValidatorChain {
    validators: PriorityList<Arc<dyn Validator>>,
}

impl ValidatorChain {
    pub fn push(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator.priority(), validator);
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn run(&self, argument: &ParsedArgument) -> Result<(), ValidationError> {
        for validator in self.validators.iter() {
            validator
                .validate(argument)
                .map_err(|reason| ValidationError {
                    argument: argument.name.clone(),
                    reason,
                })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ValidatorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValidatorChain({})", self.validators.len())
    }
}

/// Numeric bounds, inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeValidator {
    min: Option<f64>,
    max: Option<f64>,
}

impl RangeValidator {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }
}

impl Validator for RangeValidator {
    fn priority(&self) -> Priority {
        Priority::HIGH
    }

    fn validate(&self, argument: &ParsedArgument) -> Result<(), String> {
        let Some(n) = argument.value.as_ref().and_then(|v| v.as_f64()) else {
            return Ok(());
        };
        match (self.min, self.max) {
            (Some(min), Some(max)) if n < min || n > max => {
                Err(format!("must be within {}-{}", min, max))
            }
            (Some(min), None) if n < min => Err(format!("must be at least {}", min)),
            (None, Some(max)) if n > max => Err(format!("must be at most {}", max)),
            _ => Ok(()),
        }
    }
}

/// Text must match a regular expression.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    pattern: Regex,
    message: Option<String>,
}

impl PatternValidator {
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator for PatternValidator {
    fn validate(&self, argument: &ParsedArgument) -> Result<(), String> {
        let Some(text) = argument.value.as_ref().and_then(|v| v.as_str()) else {
            return Ok(());
        };
        if self.pattern.is_match(text) {
            Ok(())
        } else {
            Err(self
                .message
                .clone()
                .unwrap_or_else(|| format!("must match {}", self.pattern.as_str())))
        }
    }
}

/// Closure-backed validator.
pub struct FnValidator<F> {
    priority: Priority,
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&ParsedArgument) -> Result<(), String> + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self {
            priority: Priority::NORMAL,
            check,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&ParsedArgument) -> Result<(), String> + Send + Sync,
{
    fn priority(&self) -> Priority {
        self.priority
    }

    fn validate(&self, argument: &ParsedArgument) -> Result<(), String> {
        (self.check)(argument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::RawSpan;
    use crate::types::Value;

    fn parsed(value: Value) -> ParsedArgument {
        ParsedArgument {
            name: "amount".into(),
            index: 2,
            owner: "give".into(),
            span: RawSpan::new(3, 4),
            raw: value.to_string(),
            value: Some(value),
            defaulted: false,
        }
    }

    #[test]
    fn test_range_messages() {
        let range = RangeValidator::between(1.0, 64.0);
        assert!(range.validate(&parsed(Value::Integer(64))).is_ok());
        assert_eq!(
            range.validate(&parsed(Value::Integer(0))),
            Err("must be within 1-64".to_string())
        );
        assert_eq!(
            RangeValidator::at_least(1.0).validate(&parsed(Value::Integer(-3))),
            Err("must be at least 1".to_string())
        );
        assert!(range.validate(&parsed(Value::from("text"))).is_ok());
    }

    #[test]
    fn test_chain_runs_in_priority_order() {
        let mut chain = ValidatorChain::default();
        chain.push(Arc::new(FnValidator::new(|_: &ParsedArgument| {
            Err("low priority ran first".to_string())
        })));
        chain.push(Arc::new(RangeValidator::at_most(10.0)));
        let err = chain.run(&parsed(Value::Integer(20))).unwrap_err();
        assert_eq!(err.argument, "amount");
        assert_eq!(err.reason, "must be at most 10");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_pattern_validator() {
        let names = PatternValidator::new(Regex::new(r"^[A-Za-z0-9_]{3,16}$").unwrap())
            .with_message("not a valid player name");
        let mut ok = parsed(Value::from("Steve"));
        ok.name = "player".into();
        assert!(names.validate(&ok).is_ok());
        assert_eq!(
            names.validate(&parsed(Value::from("x!"))),
            Err("not a valid player name".to_string())
        );
    }
}
