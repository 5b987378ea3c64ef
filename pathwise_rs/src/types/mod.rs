//! Argument types.
//!
//! A type answers three questions for the tree: can this token *look* like
//! me ([`ArgumentType::matches_input`]), how sure is that answer
//! ([`Classifier`] plus [`Priority`]), and how many raw tokens do I occupy
//! ([`ArgumentType::arity`]). Actual conversion to a [`Value`] only happens in
//! the value assigner, after matching is done.

mod builtin;
mod registry;
mod value;

use std::fmt;
use std::sync::Arc;

pub use builtin::{
    BooleanType, ChoiceType, DecimalType, DurationType, IntegerType, RecordType, StringType,
};
pub use registry::TypeRegistry;
pub use value::Value;

use crate::cursor::Cursor;
use crate::error::ArgumentParseError;
use crate::priority::Priority;
use crate::source::Source;

/// How confidently a type's matcher recognises input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classifier {
    /// Only a constrained token shape matches (numbers, booleans, choices).
    Specific,
    /// Matches any token. Tried after every specific sibling.
    Fallback,
}

/// Output of a parser: the value and how many raw tokens produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub value: Value,
    pub consumed: usize,
}

impl Parsed {
    pub fn single(value: Value) -> Self {
        Self { value, consumed: 1 }
    }
}

/// What a parser may know about the invocation besides the tokens.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub argument: &'a str,
    pub source: &'a dyn Source,
}

impl fmt::Debug for ParseContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("argument", &self.argument)
            .field("source", &self.source.name())
            .finish()
    }
}

/// A named value type.
pub trait ArgumentType: Send + Sync + fmt::Debug {
    /// Type identifier, e.g. `integer`.
    fn name(&self) -> &str;

    /// Key deciding whether two arguments of this type may share a tree
    /// node. Types carrying data (choices, fields) fold it in.
    fn identity(&self) -> String {
        self.name().to_string()
    }

    /// Cheap shape check against the first raw token of the span.
    fn matches_input(&self, token: &str) -> bool {
        !token.is_empty()
    }

    fn classifier(&self) -> Classifier {
        Classifier::Specific
    }

    fn priority(&self) -> Priority {
        Priority::NORMAL
    }

    /// Raw tokens occupied by one value. Ignored for greedy types.
    fn arity(&self) -> usize {
        1
    }

    /// Greedy types absorb every remaining raw token.
    fn is_greedy(&self) -> bool {
        false
    }

    /// Convert tokens starting at the cursor's raw position.
    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        context: &ParseContext<'_>,
    ) -> Result<Parsed, ArgumentParseError>;

    /// Static completion candidates.
    fn suggestions(&self) -> Vec<String> {
        Vec::new()
    }
}

pub type SharedType = Arc<dyn ArgumentType>;

/// Pop the token under the cursor or report that the value is missing.
pub(crate) fn take_token(
    cursor: &mut Cursor<'_>,
    expected: &str,
) -> Result<String, ArgumentParseError> {
    cursor
        .pop_raw()
        .map(str::to_string)
        .ok_or_else(|| ArgumentParseError::new("", expected, "missing value"))
}
