//! Pluggable default values and completion candidates.

use std::sync::Arc;

use crate::argument::Argument;
use crate::source::Source;

/// Supplies the raw text of a default for an optional argument or flag.
///
/// The string is parsed through the argument's own type, so a default behaves
/// exactly as if the user had typed it.
pub trait DefaultValueProvider: Send + Sync {
    fn supply(&self, source: &dyn Source, argument: &Argument) -> Option<String>;
}

/// A fixed default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDefault(pub String);

impl DefaultValueProvider for StaticDefault {
    fn supply(&self, _source: &dyn Source, _argument: &Argument) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<F> DefaultValueProvider for F
where
    F: Fn(&dyn Source, &Argument) -> Option<String> + Send + Sync,
{
    fn supply(&self, source: &dyn Source, argument: &Argument) -> Option<String> {
        self(source, argument)
    }
}

/// What a suggestion provider can see about the line being completed.
pub struct SuggestionContext<'a> {
    pub source: &'a dyn Source,
    pub command: &'a str,
    /// Tokens before the one being completed, label included.
    pub preceding: &'a [String],
    /// The partial token being completed; empty after a trailing space.
    pub partial: &'a str,
}

/// Produces completion candidates for one argument or flag value.
///
/// Candidates do not need to be prefix-filtered; the engine filters them
/// against the partial token.
pub trait SuggestionProvider: Send + Sync {
    fn provide(&self, context: &SuggestionContext<'_>) -> Vec<String>;
}

/// Candidates of several providers, in order. Built when pathways sharing a
/// tree node each bring their own provider.
pub(crate) struct ChainedSuggestions(pub(crate) Vec<Arc<dyn SuggestionProvider>>);

impl SuggestionProvider for ChainedSuggestions {
    fn provide(&self, context: &SuggestionContext<'_>) -> Vec<String> {
        self.0.iter().flat_map(|p| p.provide(context)).collect()
    }
}

/// A fixed candidate list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSuggestions(pub Vec<String>);

impl StaticSuggestions {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(items.into_iter().map(Into::into).collect())
    }
}

impl SuggestionProvider for StaticSuggestions {
    fn provide(&self, _context: &SuggestionContext<'_>) -> Vec<String> {
        self.0.clone()
    }
}

impl<F> SuggestionProvider for F
where
    F: Fn(&SuggestionContext<'_>) -> Vec<String> + Send + Sync,
{
    fn provide(&self, context: &SuggestionContext<'_>) -> Vec<String> {
        self(context)
    }
}
