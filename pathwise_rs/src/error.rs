//! Error types for registration, matching and value resolution.
//!
//! Registration errors are fatal and returned from the builders. Structural
//! dispatch failures are *classifications* ([`MatchFailure`]) handed back as
//! plain values so help rendering and suggestion fallbacks can consume them
//! without unwinding. Parse and validation errors only happen after a
//! structural winner has been chosen, so they carry the token, the expected
//! type and the raw position for a user-facing message.

use serde::Serialize;
use thiserror::Error;

/// Raised while building a command tree.
///
/// Registration is all-or-nothing: when any of these is returned the tree is
/// left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("pathway '{candidate}' is ambiguous with '{existing}' in command '{command}'")]
    AmbiguousPathway {
        command: String,
        existing: String,
        candidate: String,
    },

    #[error("greedy argument '{argument}' must be the last positional of '{usage}'")]
    GreedyNotLast { argument: String, usage: String },

    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("flag alias '{alias}' is declared twice in '{usage}'")]
    DuplicateFlag { alias: String, usage: String },

    #[error("{0} name must not be empty")]
    EmptyName(&'static str),

    #[error("unknown argument type '{0}'")]
    UnknownType(String),
}

/// Why no pathway accepted the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    /// Input ran out before any terminal node was reached.
    Incomplete,
    /// A terminal was reached but raw tokens were left over.
    TrailingInput,
    /// No child of the deepest node accepted the token.
    Unrecognized,
}

/// A compact flag token contained characters no registered alias covers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flag(s) '{unknown}' in '{token}'")]
pub struct UnknownFlagError {
    pub token: String,
    /// Unmatched characters, comma separated.
    pub unknown: String,
    /// How many registered flags *were* recognised in the same token.
    pub recognised: usize,
}

/// Dispatch-time failure classification.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchFailure {
    #[error("unknown command '{label}'{}", did_you_mean(.suggestion))]
    UnknownCommand {
        label: String,
        suggestion: Option<String>,
    },

    #[error("unknown flag(s) '{unknown}' in '{token}'")]
    UnknownFlag {
        token: String,
        unknown: String,
        position: usize,
    },

    #[error("flag '{flag}' expects a value after '{token}'")]
    MissingFlagValue {
        flag: String,
        token: String,
        position: usize,
    },

    #[error("compact flag '{token}' mixes valued flags of different input types")]
    MixedFlagInputs { token: String, position: usize },

    #[error("{}", describe_no_match(.reason, .token, .suggestion, .closest))]
    NoMatchingPathway {
        reason: NoMatchReason,
        position: usize,
        token: Option<String>,
        suggestion: Option<String>,
        closest: Vec<String>,
    },
}

impl MatchFailure {
    pub(crate) fn unknown_flag(error: UnknownFlagError, position: usize) -> Self {
        MatchFailure::UnknownFlag {
            token: error.token,
            unknown: error.unknown,
            position,
        }
    }

    /// Raw token index the failure refers to (0 for unknown commands).
    pub fn position(&self) -> usize {
        match self {
            MatchFailure::UnknownCommand { .. } => 0,
            MatchFailure::UnknownFlag { position, .. }
            | MatchFailure::MissingFlagValue { position, .. }
            | MatchFailure::MixedFlagInputs { position, .. }
            | MatchFailure::NoMatchingPathway { position, .. } => *position,
        }
    }

    /// Usages closest to what was typed, if the failure carries any.
    pub fn closest_usages(&self) -> &[String] {
        match self {
            MatchFailure::NoMatchingPathway { closest, .. } => closest,
            _ => &[],
        }
    }

    pub fn is_flag_failure(&self) -> bool {
        matches!(
            self,
            MatchFailure::UnknownFlag { .. }
                | MatchFailure::MissingFlagValue { .. }
                | MatchFailure::MixedFlagInputs { .. }
        )
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_deref()
        .map(|s| format!(" (did you mean '{}'?)", s))
        .unwrap_or_default()
}

fn describe_no_match(
    reason: &NoMatchReason,
    token: &Option<String>,
    suggestion: &Option<String>,
    closest: &[String],
) -> String {
    let mut message = match (reason, token.as_deref()) {
        (NoMatchReason::Incomplete, _) => "incomplete command".to_string(),
        (NoMatchReason::TrailingInput, Some(t)) => format!("unexpected trailing input '{}'", t),
        (NoMatchReason::TrailingInput, None) => "unexpected trailing input".to_string(),
        (NoMatchReason::Unrecognized, Some(t)) => format!("unrecognized argument '{}'", t),
        (NoMatchReason::Unrecognized, None) => "unrecognized argument".to_string(),
    };
    message.push_str(&did_you_mean(suggestion));
    if let Some(first) = closest.first() {
        message.push_str(&format!("; closest usage: {}", first));
    }
    message
}

/// A type parser rejected the token bound to its argument.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("invalid {expected} '{token}' at position {position}: {reason}")]
pub struct ArgumentParseError {
    pub token: String,
    pub expected: String,
    pub position: usize,
    pub reason: String,
}

impl ArgumentParseError {
    pub fn new(
        token: impl Into<String>,
        expected: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            expected: expected.into(),
            position: 0,
            reason: reason.into(),
        }
    }

    /// Attach the raw token index the parser was positioned at.
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }
}

/// A validator rejected a bound or defaulted value.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("argument '{argument}' rejected: {reason}")]
pub struct ValidationError {
    pub argument: String,
    pub reason: String,
}

/// Everything `Dispatcher::dispatch` can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "stage", content = "error", rename_all = "snake_case")]
pub enum DispatchError {
    #[error(transparent)]
    Match(#[from] MatchFailure),

    #[error(transparent)]
    Parse(#[from] ArgumentParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_message_includes_closest_usage() {
        let failure = MatchFailure::NoMatchingPathway {
            reason: NoMatchReason::Unrecognized,
            position: 1,
            token: Some("gvie".into()),
            suggestion: Some("give".into()),
            closest: vec!["shop give <item>".into()],
        };
        let text = failure.to_string();
        assert!(text.contains("unrecognized argument 'gvie'"));
        assert!(text.contains("did you mean 'give'?"));
        assert!(text.contains("closest usage: shop give <item>"));
    }

    #[test]
    fn test_flag_failures_are_classified() {
        let unknown = MatchFailure::unknown_flag(
            UnknownFlagError {
                token: "-fx".into(),
                unknown: "x".into(),
                recognised: 1,
            },
            2,
        );
        assert!(unknown.is_flag_failure());
        assert_eq!(unknown.position(), 2);
        assert!(unknown.closest_usages().is_empty());
    }

    #[test]
    fn test_parse_error_position() {
        let err = ArgumentParseError::new("abc", "integer", "not a whole number").at(3);
        assert_eq!(err.position, 3);
        assert_eq!(
            err.to_string(),
            "invalid integer 'abc' at position 3: not a whole number"
        );
    }

    #[test]
    fn test_dispatch_error_from_validation() {
        let err: DispatchError = ValidationError {
            argument: "amount".into(),
            reason: "must be at least 1".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "argument 'amount' rejected: must be at least 1"
        );
    }
}
