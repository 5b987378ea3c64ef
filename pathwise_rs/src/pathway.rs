//! One complete usage of a command.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::argument::{Argument, FlagData};
use crate::error::RegistrationError;
use crate::flags::FlagExtractor;

/// Opaque identifier of the code that runs when a pathway wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerRef(pub String);

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered positional arguments plus the flags accepted alongside them.
#[derive(Debug, Clone)]
pub struct Pathway {
    arguments: Vec<Argument>,
    extractor: FlagExtractor,
    permission: Option<String>,
    cooldown: Option<Duration>,
    description: Option<String>,
    handler: Option<HandlerRef>,
    examples: Vec<String>,
}

impl Pathway {
    pub fn builder() -> PathwayBuilder {
        PathwayBuilder::default()
    }

    /// The no-argument pathway.
    pub fn empty() -> Self {
        Self {
            arguments: Vec::new(),
            extractor: FlagExtractor::default(),
            permission: None,
            cooldown: None,
            description: None,
            handler: None,
            examples: Vec::new(),
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn argument(&self, index: usize) -> Option<&Argument> {
        self.arguments.get(index)
    }

    pub fn flags(&self) -> &[FlagData] {
        self.extractor.flags()
    }

    pub fn flag_extractor(&self) -> &FlagExtractor {
        &self.extractor
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn cooldown(&self) -> Option<Duration> {
        self.cooldown
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn handler(&self) -> Option<&HandlerRef> {
        self.handler.as_ref()
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn required_count(&self) -> usize {
        self.arguments.iter().filter(|a| a.is_required()).count()
    }

    /// Required positionals reduced to what decides matching: literal names
    /// (lower-cased) and value type identities.
    pub fn required_signature(&self) -> Vec<String> {
        self.arguments
            .iter()
            .filter(|a| a.is_required())
            .map(|a| {
                if a.is_literal() {
                    format!("literal:{}", a.name().to_ascii_lowercase())
                } else {
                    format!("{}{}", a.type_identity(), if a.is_greedy() { "..." } else { "" })
                }
            })
            .collect()
    }

    /// `label arg1 arg2 [--flag]`.
    pub fn format(&self, label: &str) -> String {
        let mut parts = vec![label.to_string()];
        parts.extend(self.arguments.iter().map(Argument::format));
        parts.extend(self.flags().iter().map(FlagData::format));
        parts.join(" ")
    }
}

#[derive(Default)]
pub struct PathwayBuilder {
    arguments: Vec<Argument>,
    flags: Vec<FlagData>,
    permission: Option<String>,
    cooldown: Option<Duration>,
    description: Option<String>,
    handler: Option<HandlerRef>,
    examples: Vec<String>,
}

impl PathwayBuilder {
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn arguments<I>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = Argument>,
    {
        self.arguments.extend(arguments);
        self
    }

    pub fn flag(mut self, flag: FlagData) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(HandlerRef(handler.into()));
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Fails on empty argument names or clashing flag aliases.
    pub fn build(self) -> Result<Pathway, RegistrationError> {
        if self.arguments.iter().any(|a| a.name().trim().is_empty()) {
            return Err(RegistrationError::EmptyName("argument"));
        }
        let usage = self
            .arguments
            .iter()
            .map(Argument::format)
            .collect::<Vec<_>>()
            .join(" ");
        let extractor = FlagExtractor::new(self.flags, &usage)?;
        Ok(Pathway {
            arguments: self.arguments,
            extractor,
            permission: self.permission,
            cooldown: self.cooldown,
            description: self.description,
            handler: self.handler,
            examples: self.examples,
        })
    }
}
