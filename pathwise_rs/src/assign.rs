//! Value resolution for a structural match.
//!
//! The [`ValueAssigner`] turns a [`PathSearch`] into typed values: every bound
//! span is handed to its argument's type parser through a cursor positioned
//! at the span, unbound optionals get their default (parsed through the same
//! type), validators run on whatever value resulted, and the pathway's flags
//! are resolved the same way.

use serde::Serialize;

use crate::argument::{Argument, FlagData};
use crate::cursor::{Cursor, StreamPosition};
use crate::error::{ArgumentParseError, DispatchError};
use crate::input::ArgumentInput;
use crate::source::Source;
use crate::tree::{CommandTree, PathSearch, RawSpan};
use crate::types::{ParseContext, Value};

/// A positional bound (or defaulted) to a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedArgument {
    pub name: String,
    /// Index into the pathway's arguments.
    pub index: usize,
    /// Nearest preceding literal, or the command label.
    pub owner: String,
    pub span: RawSpan,
    /// Tokens of the span joined by spaces; the default text when defaulted.
    pub raw: String,
    pub value: Option<Value>,
    pub defaulted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFlag {
    pub name: String,
    /// Whether the flag appeared in the input.
    pub present: bool,
    pub value: Option<Value>,
}

/// Arguments grouped under one owning command or subcommand literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerGroup {
    pub owner: String,
    /// Indices into the flat view.
    pub arguments: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedArguments {
    flat: Vec<ParsedArgument>,
    owners: Vec<OwnerGroup>,
    flags: Vec<ResolvedFlag>,
}

impl ResolvedArguments {
    pub fn iter(&self) -> impl Iterator<Item = &ParsedArgument> {
        self.flat.iter()
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ParsedArgument> {
        self.flat.iter().find(|a| a.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(|a| a.value.as_ref())
    }

    /// Arguments owned by a command or subcommand literal, in order.
    pub fn for_owner(&self, owner: &str) -> Vec<&ParsedArgument> {
        self.owners
            .iter()
            .filter(|g| g.owner.eq_ignore_ascii_case(owner))
            .flat_map(|g| g.arguments.iter().map(|&i| &self.flat[i]))
            .collect()
    }

    pub fn owners(&self) -> &[OwnerGroup] {
        &self.owners
    }

    pub fn flags(&self) -> &[ResolvedFlag] {
        &self.flags
    }

    pub fn flag(&self, name: &str) -> Option<&ResolvedFlag> {
        self.flags.iter().find(|f| f.name == name)
    }

    /// True when a switch was given. Valued flags count when present.
    pub fn switch(&self, name: &str) -> bool {
        self.flag(name).is_some_and(|f| f.present)
    }

    pub fn flag_value(&self, name: &str) -> Option<&Value> {
        self.flag(name).and_then(|f| f.value.as_ref())
    }

    fn push(&mut self, argument: ParsedArgument) {
        let index = self.flat.len();
        match self.owners.last_mut() {
            Some(group) if group.owner == argument.owner => group.arguments.push(index),
            _ => self.owners.push(OwnerGroup {
                owner: argument.owner.clone(),
                arguments: vec![index],
            }),
        }
        self.flat.push(argument);
    }
}

pub struct ValueAssigner<'a> {
    tree: &'a CommandTree,
    input: &'a ArgumentInput,
    source: &'a dyn Source,
}

impl<'a> ValueAssigner<'a> {
    pub fn new(tree: &'a CommandTree, input: &'a ArgumentInput, source: &'a dyn Source) -> Self {
        Self {
            tree,
            input,
            source,
        }
    }

    pub fn assign(&self, search: &PathSearch) -> Result<ResolvedArguments, DispatchError> {
        let pathway = self.tree.pathway(search.pathway());
        let mut resolved = ResolvedArguments::default();
        let mut owner = self.tree.label().to_string();

        // Flags sit ahead of the positionals on the parameter axis and are
        // exempted once resolved, leaving the positionals in declared order.
        let flag_views: Vec<Argument> = pathway.flags().iter().map(FlagData::as_argument).collect();
        let mut walker = Cursor::new(self.input)
            .with_parameters(flag_views.iter().chain(pathway.arguments()));
        for flag in pathway.flags() {
            resolved.flags.push(self.resolve_flag(flag, search)?);
            walker.exempt(flag.name());
        }

        let mut index = 0;
        while let Some(argument) = walker.current_parameter() {
            if argument.is_literal() {
                owner = argument.name().to_string();
            } else {
                let parsed = match search.binding(index) {
                    Some(binding) => self.parse_bound(&walker, index, argument, binding.span, &owner)?,
                    None => self.parse_default(index, argument, search, &owner)?,
                };
                if parsed.value.is_some() {
                    argument.validators().run(&parsed)?;
                }
                resolved.push(parsed);
            }
            walker.skip_parameter();
            index += 1;
        }

        tracing::debug!(
            command = %self.tree.label(),
            arguments = resolved.len(),
            flags = resolved.flags.len(),
            "resolved values"
        );
        Ok(resolved)
    }

    fn parse_bound(
        &self,
        walker: &Cursor<'_>,
        index: usize,
        argument: &Argument,
        span: RawSpan,
        owner: &str,
    ) -> Result<ParsedArgument, ArgumentParseError> {
        let raw = self.input.join(span.start..span.end);
        // A greedy modifier on a single-token type keeps the whole span as text.
        let value = match argument.value_type() {
            Some(ty) if argument.is_greedy() && !ty.is_greedy() => Value::Text(raw.clone()),
            _ => {
                let mut cursor = walker.clone();
                cursor.set_position(StreamPosition::new(span.start, walker.position().parameter));
                self.parse_at(&mut cursor, argument, span)?
            }
        };
        Ok(ParsedArgument {
            name: argument.name().to_string(),
            index,
            owner: owner.to_string(),
            span,
            raw,
            value: Some(value),
            defaulted: false,
        })
    }

    fn parse_default(
        &self,
        index: usize,
        argument: &Argument,
        search: &PathSearch,
        owner: &str,
    ) -> Result<ParsedArgument, ArgumentParseError> {
        let at = search
            .bindings()
            .iter()
            .take_while(|b| b.argument < index)
            .last()
            .map(|b| b.span.end)
            .unwrap_or(1);
        let raw = argument
            .default_provider()
            .and_then(|p| p.supply(self.source, argument));
        let value = match &raw {
            Some(text) => Some(self.parse_detached(argument, text).map_err(|e| e.at(at))?),
            None => None,
        };
        Ok(ParsedArgument {
            name: argument.name().to_string(),
            index,
            owner: owner.to_string(),
            span: RawSpan::empty(at),
            defaulted: value.is_some(),
            raw: raw.unwrap_or_default(),
            value,
        })
    }

    fn resolve_flag(&self, flag: &FlagData, search: &PathSearch) -> Result<ResolvedFlag, ArgumentParseError> {
        let found = search.flags().iter().rev().find(|f| f.flag == flag.name());
        let argument = flag.as_argument();
        let value = match (found, flag.input_type()) {
            (Some(_), None) => Some(Value::Boolean(true)),
            (None, None) => Some(Value::Boolean(false)),
            (Some(binding), Some(_)) => {
                let at = binding.value.unwrap_or(binding.token + 1);
                let mut cursor = Cursor::new(self.input);
                cursor.set_position(StreamPosition::new(at, 0));
                Some(self.parse_at(&mut cursor, &argument, RawSpan::new(at, at + 1))?)
            }
            (None, Some(_)) => match flag
                .default_provider()
                .and_then(|p| p.supply(self.source, &argument))
            {
                Some(text) => Some(self.parse_detached(&argument, &text)?),
                None => None,
            },
        };
        Ok(ResolvedFlag {
            name: flag.name().to_string(),
            present: found.is_some(),
            value,
        })
    }

    /// Run the argument's type over `span`; the parser must consume at least
    /// one token and no more than the span holds.
    fn parse_at(
        &self,
        cursor: &mut Cursor<'_>,
        argument: &Argument,
        span: RawSpan,
    ) -> Result<Value, ArgumentParseError> {
        let token = self.input.join(span.start..span.end);
        let Some(ty) = argument.value_type() else {
            return Ok(Value::Text(token));
        };
        let context = ParseContext {
            argument: argument.name(),
            source: self.source,
        };
        let parsed = ty
            .parse(cursor, &context)
            .map_err(|e| e.at(span.start))?;
        if parsed.consumed == 0 || parsed.consumed > span.len() {
            return Err(ArgumentParseError::new(token, ty.name(), "unexpected token count").at(span.start));
        }
        if parsed.consumed < span.len() {
            let rest = self.input.join(span.start + parsed.consumed..span.end);
            return Err(ArgumentParseError::new(rest, ty.name(), "unconsumed input").at(span.start + parsed.consumed));
        }
        Ok(parsed.value)
    }

    fn parse_detached(&self, argument: &Argument, text: &str) -> Result<Value, ArgumentParseError> {
        let Some(ty) = argument.value_type() else {
            return Ok(Value::Text(text.to_string()));
        };
        let context = ParseContext {
            argument: argument.name(),
            source: self.source,
        };
        let mut cursor = Cursor::single(text);
        ty.parse(&mut cursor, &context).map(|parsed| parsed.value)
    }
}
