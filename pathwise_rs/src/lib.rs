//! # pathwise
//!
//! **Command pathway matching** - resolve a tokenized command line against a
//! set of declared usages ("pathways"), bind typed values, and offer
//! completions for partially typed input.
//!
//! Every command owns a tree: one node per positional slot, shared by all
//! pathways passing through it. Matching is a depth-first search with
//! backtracking, so a pathway that looks right early but fails later still
//! lets a sibling win.
//!
//! ## Features
//!
//! - **Conflict detection** - two pathways with the same required shape are rejected at registration
//! - **Backtracking** - literal, then specific typed, then fallback, then greedy nodes
//! - **Optional skipping** - `[amount]` can be skipped when its token belongs further down
//! - **Interleaved flags** - `-sv`, `--force`, `--radius 10` anywhere in the line
//! - **Typed values** - integers, decimals, booleans, choices, durations, records
//! - **Completion** - per-position suggestions filtered by permissions
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use pathwise::{
//!     Argument, ArgumentInput, Command, ConsoleSource, Dispatcher, IntegerType, Pathway,
//!     StringType, Value,
//! };
//!
//! let mut dispatcher = Dispatcher::default();
//! dispatcher
//!     .register(
//!         Command::builder("give")
//!             .pathway(
//!                 Pathway::builder()
//!                     .argument(Argument::value("player", Arc::new(StringType::word())))
//!                     .argument(Argument::value("amount", Arc::new(IntegerType)).default_value("1"))
//!                     .build()?,
//!             )
//!             .build()?,
//!     )?;
//!
//! let resolution = dispatcher
//!     .dispatch(&ConsoleSource, &ArgumentInput::split("give Steve"))?;
//! assert_eq!(resolution.arguments.value("amount"), Some(&Value::Integer(1)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## CLI Usage
//!
//! The `pathwise` binary loads commands from a TOML manifest:
//!
//! ```bash
//! pathwise --manifest commands.toml resolve give Steve 5
//! pathwise --manifest commands.toml suggest "give Steve "
//! pathwise --manifest commands.toml tree give
//! ```

// ============================================================================
// Declarations
// ============================================================================

/// Positional arguments and flags as declared by the caller.
pub mod argument;
/// A command: label, aliases and its pathway tree.
pub mod command;
/// A single usage line of a command.
pub mod pathway;
/// Named values attached to pathways, independent of position.
pub mod flags;
/// Argument types and the registry that names them.
pub mod types;

// ============================================================================
// Matching
// ============================================================================

/// Tokenized input with byte spans.
pub mod input;
/// Dual-axis (token / character) reader over [`input::ArgumentInput`].
pub mod cursor;
/// Command tree, match engine and suggestion engine.
pub mod tree;
/// Binding matched tokens to parsed values.
pub mod assign;
/// Registration, dispatch and completion front door.
pub mod dispatcher;

// ============================================================================
// Support
// ============================================================================

pub mod config;
pub mod error;
pub mod priority;
pub mod provider;
pub mod source;
pub mod validate;

mod similar;

// ============================================================================
// Re-exports
// ============================================================================

pub use argument::{Argument, ArgumentKind, FlagData};
pub use assign::{OwnerGroup, ParsedArgument, ResolvedArguments, ResolvedFlag, ValueAssigner};
pub use command::{Command, CommandBuilder};
pub use config::DispatchConfig;
pub use cursor::{Cursor, StreamPosition};
pub use dispatcher::{Dispatcher, Resolution};
pub use error::{
    ArgumentParseError, DispatchError, MatchFailure, NoMatchReason, RegistrationError,
    ValidationError,
};
pub use flags::FlagExtractor;
pub use input::ArgumentInput;
pub use pathway::{HandlerRef, Pathway, PathwayBuilder};
pub use priority::{Priority, PriorityList};
pub use provider::{
    DefaultValueProvider, StaticDefault, StaticSuggestions, SuggestionContext, SuggestionProvider,
};
pub use source::{ConsoleSource, PermissionedSource, Source};
pub use tree::{CommandTree, MatchEngine, NodeId, PathSearch, PathSearchSummary, SuggestionEngine};
pub use types::{
    ArgumentType, BooleanType, ChoiceType, Classifier, DecimalType, DurationType, IntegerType,
    Parsed, ParseContext, RecordType, SharedType, StringType, TypeRegistry, Value,
};
pub use validate::{FnValidator, PatternValidator, RangeValidator, Validator, ValidatorChain};
