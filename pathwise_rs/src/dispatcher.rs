//! Entry point tying the pieces together.
//!
//! A [`Dispatcher`] owns the registered commands, the [`TypeRegistry`] used by
//! front-ends to resolve type names, and the [`DispatchConfig`]. It looks the
//! label up, runs the [`MatchEngine`] and the [`ValueAssigner`], and answers
//! completion requests. It never executes anything: the caller receives a
//! [`Resolution`] naming the winning pathway and its values.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::assign::{ResolvedArguments, ValueAssigner};
use crate::command::Command;
use crate::config::DispatchConfig;
use crate::error::{DispatchError, MatchFailure, RegistrationError};
use crate::input::ArgumentInput;
use crate::similar::suggest_similar;
use crate::source::Source;
use crate::tree::{MatchEngine, PathSearch, PathSearchSummary, SuggestionEngine};
use crate::types::TypeRegistry;

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub command: String,
    pub summary: PathSearchSummary,
    pub arguments: ResolvedArguments,
    #[serde(skip)]
    pub search: PathSearch,
}

impl Resolution {
    pub fn usage(&self) -> &str {
        &self.summary.usage
    }

    pub fn handler(&self) -> Option<&str> {
        self.summary.handler.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    commands: Vec<Command>,
    labels: HashMap<String, usize>,
    types: TypeRegistry,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    fn key(&self, label: &str) -> String {
        if self.config.case_sensitive_literals {
            label.to_string()
        } else {
            label.to_ascii_lowercase()
        }
    }

    /// Register a command under its name and aliases.
    pub fn register(&mut self, command: Command) -> Result<(), RegistrationError> {
        for label in command.labels() {
            if self.labels.contains_key(&self.key(label)) {
                return Err(RegistrationError::DuplicateCommand(label.to_string()));
            }
        }
        let index = self.commands.len();
        let keys: Vec<String> = command.labels().map(|l| self.key(l)).collect();
        for key in keys {
            self.labels.insert(key, index);
        }
        debug!(command = %command.name(), pathways = command.tree().pathways().len(), "registered command");
        self.commands.push(command);
        Ok(())
    }

    pub fn command(&self, label: &str) -> Option<&Command> {
        self.labels.get(&self.key(label)).map(|&i| &self.commands[i])
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn lookup(&self, input: &ArgumentInput) -> Result<&Command, MatchFailure> {
        let label = input.get(0).unwrap_or_default();
        self.command(label).ok_or_else(|| {
            let labels = self.commands.iter().flat_map(Command::labels);
            MatchFailure::UnknownCommand {
                label: label.to_string(),
                suggestion: suggest_similar(label, labels, self.config.typo_distance)
                    .map(str::to_string),
            }
        })
    }

    /// Structural match only.
    pub fn context_match(&self, input: &ArgumentInput) -> Result<(&Command, PathSearch), MatchFailure> {
        let command = self.lookup(input)?;
        let search = MatchEngine::context_match(command, input, &self.config)?;
        Ok((command, search))
    }

    /// Match, then parse, default and validate every value.
    pub fn dispatch(&self, source: &dyn Source, input: &ArgumentInput) -> Result<Resolution, DispatchError> {
        let (command, search) = self.context_match(input)?;
        let arguments = ValueAssigner::new(command.tree(), input, source).assign(&search)?;
        Ok(Resolution {
            command: command.name().to_string(),
            summary: search.summarize(command.tree(), input),
            arguments,
            search,
        })
    }

    /// Completion candidates for the token being typed.
    pub fn suggest(&self, source: &dyn Source, input: &ArgumentInput) -> Vec<String> {
        let completing_label = input.len() == 0 || (input.len() == 1 && !input.ends_with_space());
        if completing_label {
            let partial = input.get(0).unwrap_or_default().to_ascii_lowercase();
            let mut out: Vec<String> = self
                .commands
                .iter()
                .filter(|c| {
                    c.ignores_completion_permissions()
                        || c.permission().is_none_or(|p| source.has_permission(p))
                })
                .flat_map(Command::labels)
                .filter(|l| l.to_ascii_lowercase().starts_with(&partial))
                .map(str::to_string)
                .collect();
            if self.config.max_suggestions > 0 {
                out.truncate(self.config.max_suggestions);
            }
            return out;
        }
        match self.command(input.get(0).unwrap_or_default()) {
            Some(command) => SuggestionEngine::new(command, &self.config, source).suggest(input),
            None => Vec::new(),
        }
    }
}
