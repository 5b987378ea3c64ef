//! Positional argument and flag descriptors.

use std::fmt;
use std::sync::Arc;

use crate::provider::{ChainedSuggestions, DefaultValueProvider, StaticDefault, SuggestionProvider};
use crate::types::SharedType;
use crate::validate::{Validator, ValidatorChain};

/// Literal keyword or typed value.
#[derive(Clone)]
pub enum ArgumentKind {
    Literal { aliases: Vec<String> },
    Value { ty: SharedType },
}

/// One positional slot of a pathway.
#[derive(Clone)]
pub struct Argument {
    name: String,
    kind: ArgumentKind,
    optional: bool,
    greedy: bool,
    default: Option<Arc<dyn DefaultValueProvider>>,
    permission: Option<String>,
    validators: ValidatorChain,
    suggestions: Option<Arc<dyn SuggestionProvider>>,
    description: Option<String>,
}

impl Argument {
    fn with_kind(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            greedy: false,
            default: None,
            permission: None,
            validators: ValidatorChain::default(),
            suggestions: None,
            description: None,
        }
    }

    /// A keyword that must be typed as-is (or as one of its aliases).
    pub fn literal(name: impl Into<String>) -> Self {
        Self::with_kind(name, ArgumentKind::Literal { aliases: Vec::new() })
    }

    pub fn value(name: impl Into<String>, ty: SharedType) -> Self {
        Self::with_kind(name, ArgumentKind::Value { ty })
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        if let ArgumentKind::Literal { aliases } = &mut self.kind {
            aliases.push(alias.into());
        }
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Absorb every remaining raw token. Only valid as the last positional.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Marks the argument optional with a fixed default.
    pub fn default_value(self, raw: impl Into<String>) -> Self {
        self.default_with(Arc::new(StaticDefault(raw.into())))
    }

    pub fn default_with(mut self, provider: Arc<dyn DefaultValueProvider>) -> Self {
        self.optional = true;
        self.default = Some(provider);
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn suggest_with(mut self, provider: Arc<dyn SuggestionProvider>) -> Self {
        self.suggestions = Some(provider);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Fold another pathway's view of the same node into this one. Literal
    /// aliases and suggestion providers are unioned; a permission survives
    /// only when both views agree on it.
    pub(crate) fn merge_shared(&mut self, other: &Argument) {
        if let (ArgumentKind::Literal { aliases }, ArgumentKind::Literal { aliases: extra }) =
            (&mut self.kind, &other.kind)
        {
            for alias in extra {
                if !aliases.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
                    aliases.push(alias.clone());
                }
            }
        }
        self.suggestions = match (self.suggestions.take(), &other.suggestions) {
            (Some(mine), Some(theirs)) if !Arc::ptr_eq(&mine, theirs) => {
                Some(Arc::new(ChainedSuggestions(vec![mine, theirs.clone()])))
            }
            (Some(mine), _) => Some(mine),
            (None, theirs) => theirs.clone(),
        };
        if self.permission != other.permission {
            self.permission = None;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ArgumentKind {
        &self.kind
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ArgumentKind::Literal { .. })
    }

    pub fn value_type(&self) -> Option<&SharedType> {
        match &self.kind {
            ArgumentKind::Value { ty } => Some(ty),
            ArgumentKind::Literal { .. } => None,
        }
    }

    /// `literal` for keywords, the type name otherwise.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            ArgumentKind::Literal { .. } => "literal",
            ArgumentKind::Value { ty } => ty.name(),
        }
    }

    pub(crate) fn type_identity(&self) -> String {
        match &self.kind {
            ArgumentKind::Literal { .. } => "literal".to_string(),
            ArgumentKind::Value { ty } => ty.identity(),
        }
    }

    pub fn aliases(&self) -> &[String] {
        match &self.kind {
            ArgumentKind::Literal { aliases } => aliases,
            ArgumentKind::Value { .. } => &[],
        }
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy || self.value_type().is_some_and(|ty| ty.is_greedy())
    }

    /// Raw tokens one value occupies, before greedy expansion.
    pub fn arity(&self) -> usize {
        self.value_type().map(|ty| ty.arity().max(1)).unwrap_or(1)
    }

    pub fn default_provider(&self) -> Option<&Arc<dyn DefaultValueProvider>> {
        self.default.as_ref()
    }

    pub fn required_permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn validators(&self) -> &ValidatorChain {
        &self.validators
    }

    pub fn suggestion_provider(&self) -> Option<&Arc<dyn SuggestionProvider>> {
        self.suggestions.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Literal name or one of its aliases.
    pub fn matches_literal(&self, token: &str, case_sensitive: bool) -> bool {
        let eq = |candidate: &str| {
            if case_sensitive {
                candidate == token
            } else {
                candidate.eq_ignore_ascii_case(token)
            }
        };
        self.is_literal() && (eq(&self.name) || self.aliases().iter().any(|a| eq(a)))
    }

    /// Two arguments share a tree node when this key matches.
    pub(crate) fn identity(&self) -> (bool, String, String, bool, bool) {
        (
            self.is_literal(),
            self.name.to_ascii_lowercase(),
            self.type_identity(),
            self.optional,
            self.is_greedy(),
        )
    }

    /// Usage fragment: `name`, `<name>`, `[name]` or `<name...>`.
    pub fn format(&self) -> String {
        if self.is_literal() {
            return self.name.clone();
        }
        let inner = if self.is_greedy() {
            format!("{}...", self.name)
        } else {
            self.name.clone()
        };
        if self.optional {
            format!("[{}]", inner)
        } else {
            format!("<{}>", inner)
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("type", &self.type_name())
            .field("optional", &self.optional)
            .field("greedy", &self.is_greedy())
            .finish()
    }
}

/// A named flag. Switches take no value; valued flags take the next token.
#[derive(Clone)]
pub struct FlagData {
    name: String,
    aliases: Vec<String>,
    input: Option<SharedType>,
    default: Option<Arc<dyn DefaultValueProvider>>,
    permission: Option<String>,
    suggestions: Option<Arc<dyn SuggestionProvider>>,
    description: Option<String>,
}

impl FlagData {
    pub fn switch(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            input: None,
            default: None,
            permission: None,
            suggestions: None,
            description: None,
        }
    }

    pub fn valued(name: impl Into<String>, ty: SharedType) -> Self {
        Self {
            input: Some(ty),
            ..Self::switch(name)
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn default_value(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(Arc::new(StaticDefault(raw.into())));
        self
    }

    pub fn default_with(mut self, provider: Arc<dyn DefaultValueProvider>) -> Self {
        self.default = Some(provider);
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn suggest_with(mut self, provider: Arc<dyn SuggestionProvider>) -> Self {
        self.suggestions = Some(provider);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Name first, then aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn is_switch(&self) -> bool {
        self.input.is_none()
    }

    pub fn input_type(&self) -> Option<&SharedType> {
        self.input.as_ref()
    }

    pub fn default_provider(&self) -> Option<&Arc<dyn DefaultValueProvider>> {
        self.default.as_ref()
    }

    pub fn required_permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn suggestion_provider(&self) -> Option<&Arc<dyn SuggestionProvider>> {
        self.suggestions.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Every spelling a user may type: `--name`, `-name`, and `-a` per alias.
    pub fn spellings(&self) -> Vec<String> {
        let mut out = vec![format!("--{}", self.name)];
        out.extend(self.aliases.iter().map(|a| format!("-{}", a)));
        out
    }

    /// An `Argument` view used when parsing the flag's value or default.
    pub(crate) fn as_argument(&self) -> Argument {
        match &self.input {
            Some(ty) => Argument::value(self.name.clone(), ty.clone()).optional(),
            None => Argument::literal(self.name.clone()).optional(),
        }
    }

    pub fn format(&self) -> String {
        match &self.input {
            Some(ty) => format!("[--{} <{}>]", self.name, ty.name()),
            None => format!("[--{}]", self.name),
        }
    }
}

impl fmt::Debug for FlagData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagData")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("input", &self.input.as_ref().map(|t| t.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntegerType, StringType};

    #[test]
    fn test_format_variants() {
        let word: SharedType = Arc::new(StringType::word());
        assert_eq!(Argument::literal("give").format(), "give");
        assert_eq!(Argument::value("player", word.clone()).format(), "<player>");
        assert_eq!(
            Argument::value("amount", Arc::new(IntegerType)).default_value("1").format(),
            "[amount]"
        );
        assert_eq!(
            Argument::value("reason", word).greedy().format(),
            "<reason...>"
        );
        assert_eq!(
            Argument::value("reason", Arc::new(StringType::greedy())).format(),
            "<reason...>"
        );
    }

    #[test]
    fn test_literal_matching_respects_case_setting() {
        let give = Argument::literal("give").alias("g");
        assert!(give.matches_literal("GIVE", false));
        assert!(!give.matches_literal("GIVE", true));
        assert!(give.matches_literal("g", true));
        assert!(!Argument::value("x", Arc::new(IntegerType)).matches_literal("x", false));
    }

    #[test]
    fn test_default_implies_optional() {
        let amount = Argument::value("amount", Arc::new(IntegerType)).default_value("1");
        assert!(amount.is_optional());
        assert!(amount.default_provider().is_some());
    }

    #[test]
    fn test_flag_spellings_and_format() {
        let time = FlagData::valued("time", Arc::new(IntegerType)).alias("t");
        assert_eq!(time.spellings(), vec!["--time", "-t"]);
        assert_eq!(time.format(), "[--time <integer>]");
        assert!(!time.is_switch());
        let force = FlagData::switch("force").alias("f");
        assert_eq!(force.names().collect::<Vec<_>>(), vec!["force", "f"]);
        assert_eq!(force.format(), "[--force]");
    }
}
