//! TOML command manifest.
//!
//! ```toml
//! [choices]
//! gamemode = ["survival", "creative"]
//!
//! [[record]]
//! name = "location"
//! delimiter = ";"
//! fields = [{ name = "world" }, { name = "x", type = "integer" }]
//!
//! [[command]]
//! name = "give"
//! aliases = ["g"]
//!
//! [[command.pathway]]
//! handler = "give_item"
//! args = [
//!     { name = "player" },
//!     { name = "amount", type = "integer", default = "1", min = 1, max = 64 },
//! ]
//! flags = [{ name = "silent", aliases = ["s"] }]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pathwise::{
    Argument, Command, DispatchConfig, Dispatcher, FlagData, PatternValidator, Pathway,
    RangeValidator, RecordType, RegistrationError, SharedType, StaticSuggestions, TypeRegistry,
};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("command '{command}': {reason}")]
    Invalid { command: String, reason: String },

    #[error("command '{command}': {source}")]
    Registration {
        command: String,
        #[source]
        source: RegistrationError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub choices: std::collections::BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "record")]
    pub records: Vec<RecordSpec>,
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordSpec {
    pub name: String,
    /// Single-token form when set, one token per field otherwise.
    pub delimiter: Option<char>,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub ty: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub permission: Option<String>,
    #[serde(default)]
    pub ignore_completion_permissions: bool,
    #[serde(default, rename = "pathway")]
    pub pathways: Vec<PathwaySpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathwaySpec {
    #[serde(default)]
    pub args: Vec<ArgumentSpec>,
    #[serde(default)]
    pub flags: Vec<FlagSpec>,
    pub handler: Option<String>,
    pub description: Option<String>,
    pub permission: Option<String>,
    pub cooldown_secs: Option<u64>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// One positional. `literal` and `name` are mutually exclusive.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentSpec {
    pub literal: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub greedy: bool,
    pub default: Option<String>,
    pub permission: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub suggest: Vec<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Valued flag when set, switch otherwise.
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub default: Option<String>,
    pub permission: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub suggest: Vec<String>,
}

fn default_type() -> String {
    "string".to_string()
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Register every declared type and command into a fresh dispatcher.
    pub fn into_dispatcher(self, config: DispatchConfig) -> Result<Dispatcher, ManifestError> {
        let mut dispatcher = Dispatcher::new(config);
        let types = dispatcher.types_mut();
        for (name, choices) in &self.choices {
            types.choice(name, choices.iter().cloned());
        }
        for record in &self.records {
            let ty = build_record(record, types)?;
            types.register(record.name.clone(), ty);
        }

        for spec in self.commands {
            let command = build_command(&spec, dispatcher.types())?;
            dispatcher
                .register(command)
                .map_err(|source| ManifestError::Registration {
                    command: spec.name.clone(),
                    source,
                })?;
        }
        tracing::debug!(commands = dispatcher.commands().len(), "manifest loaded");
        Ok(dispatcher)
    }
}

fn build_record(record: &RecordSpec, types: &TypeRegistry) -> Result<SharedType, ManifestError> {
    let fields = record
        .fields
        .iter()
        .map(|field| Ok((field.name.clone(), resolve(types, &field.ty, &record.name)?)))
        .collect::<Result<Vec<_>, ManifestError>>()?;
    let ty: SharedType = match record.delimiter {
        Some(delimiter) => Arc::new(RecordType::delimited(&record.name, delimiter, fields)),
        None => Arc::new(RecordType::spread(&record.name, fields)),
    };
    Ok(ty)
}

fn build_command(spec: &CommandSpec, types: &TypeRegistry) -> Result<Command, ManifestError> {
    let mut builder = Command::builder(&spec.name);
    for alias in &spec.aliases {
        builder = builder.alias(alias);
    }
    if let Some(description) = &spec.description {
        builder = builder.describe(description);
    }
    if let Some(permission) = &spec.permission {
        builder = builder.permission(permission);
    }
    if spec.ignore_completion_permissions {
        builder = builder.ignore_completion_permissions();
    }
    for pathway in &spec.pathways {
        builder = builder.pathway(build_pathway(pathway, types, &spec.name)?);
    }
    builder.build().map_err(|source| ManifestError::Registration {
        command: spec.name.clone(),
        source,
    })
}

fn build_pathway(
    spec: &PathwaySpec,
    types: &TypeRegistry,
    command: &str,
) -> Result<Pathway, ManifestError> {
    let mut builder = Pathway::builder();
    for argument in &spec.args {
        builder = builder.argument(build_argument(argument, types, command)?);
    }
    for flag in &spec.flags {
        builder = builder.flag(build_flag(flag, types, command)?);
    }
    if let Some(handler) = &spec.handler {
        builder = builder.handler(handler);
    }
    if let Some(description) = &spec.description {
        builder = builder.describe(description);
    }
    if let Some(permission) = &spec.permission {
        builder = builder.permission(permission);
    }
    if let Some(secs) = spec.cooldown_secs {
        builder = builder.cooldown(Duration::from_secs(secs));
    }
    for example in &spec.examples {
        builder = builder.example(example);
    }
    builder.build().map_err(|source| ManifestError::Registration {
        command: command.to_string(),
        source,
    })
}

fn build_argument(
    spec: &ArgumentSpec,
    types: &TypeRegistry,
    command: &str,
) -> Result<Argument, ManifestError> {
    let mut argument = match (&spec.literal, &spec.name) {
        (Some(literal), None) => Argument::literal(literal),
        (None, Some(name)) => {
            let ty = resolve(types, spec.ty.as_deref().unwrap_or("string"), command)?;
            Argument::value(name, ty)
        }
        _ => {
            return Err(invalid(command, "each argument needs exactly one of `literal` or `name`"));
        }
    };
    for alias in &spec.aliases {
        argument = argument.alias(alias);
    }
    if spec.optional {
        argument = argument.optional();
    }
    if spec.greedy {
        argument = argument.greedy();
    }
    if let Some(default) = &spec.default {
        argument = argument.default_value(default);
    }
    if let Some(permission) = &spec.permission {
        argument = argument.permission(permission);
    }
    if let Some(description) = &spec.description {
        argument = argument.describe(description);
    }
    if !spec.suggest.is_empty() {
        argument = argument.suggest_with(Arc::new(StaticSuggestions::new(spec.suggest.iter().cloned())));
    }
    if spec.min.is_some() || spec.max.is_some() {
        argument = argument.validator(Arc::new(RangeValidator::new(spec.min, spec.max)));
    }
    if let Some(pattern) = &spec.pattern {
        let regex = Regex::new(pattern)
            .map_err(|e| invalid(command, &format!("bad pattern '{}': {}", pattern, e)))?;
        argument = argument.validator(Arc::new(PatternValidator::new(regex)));
    }
    Ok(argument)
}

fn build_flag(spec: &FlagSpec, types: &TypeRegistry, command: &str) -> Result<FlagData, ManifestError> {
    let mut flag = match &spec.ty {
        Some(ty) => FlagData::valued(&spec.name, resolve(types, ty, command)?),
        None => FlagData::switch(&spec.name),
    };
    for alias in &spec.aliases {
        flag = flag.alias(alias);
    }
    if let Some(default) = &spec.default {
        flag = flag.default_value(default);
    }
    if let Some(permission) = &spec.permission {
        flag = flag.permission(permission);
    }
    if let Some(description) = &spec.description {
        flag = flag.describe(description);
    }
    if !spec.suggest.is_empty() {
        flag = flag.suggest_with(Arc::new(StaticSuggestions::new(spec.suggest.iter().cloned())));
    }
    Ok(flag)
}

fn resolve(types: &TypeRegistry, name: &str, command: &str) -> Result<SharedType, ManifestError> {
    types.resolve(name).map_err(|source| ManifestError::Registration {
        command: command.to_string(),
        source,
    })
}

fn invalid(command: &str, reason: &str) -> ManifestError {
    ManifestError::Invalid {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}
