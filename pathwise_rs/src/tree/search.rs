use serde::Serialize;

use super::{CommandTree, NodeId, PathwayId};
use crate::input::ArgumentInput;

/// Half-open range of raw token indices. Empty for defaulted arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RawSpan {
    pub start: usize,
    pub end: usize,
}

impl RawSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A positional of the winning pathway bound to raw tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Index into the pathway's arguments.
    pub argument: usize,
    pub node: NodeId,
    pub span: RawSpan,
}

/// A flag of the winning pathway found in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagBinding {
    /// Canonical flag name.
    pub flag: String,
    /// Raw index of the flag token itself.
    pub token: usize,
    /// Raw index of the value token for valued flags.
    pub value: Option<usize>,
}

/// Structural result of matching: which pathway won and which raw tokens
/// feed which argument. Values are not parsed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSearch {
    pub(crate) pathway: PathwayId,
    pub(crate) terminal: NodeId,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) flags: Vec<FlagBinding>,
}

impl PathSearch {
    pub fn pathway(&self) -> PathwayId {
        self.pathway
    }

    pub fn terminal(&self) -> NodeId {
        self.terminal
    }

    /// Bindings in positional order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, argument: usize) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.argument == argument)
    }

    pub fn flags(&self) -> &[FlagBinding] {
        &self.flags
    }

    /// The winning usage line and the raw text bound to each argument name.
    pub fn summarize(&self, tree: &CommandTree, input: &ArgumentInput) -> PathSearchSummary {
        let pathway = tree.pathway(self.pathway);
        let bindings = self
            .bindings
            .iter()
            .filter_map(|b| {
                pathway.argument(b.argument).map(|argument| BoundText {
                    argument: argument.name().to_string(),
                    raw: input.join(b.span.start..b.span.end),
                })
            })
            .collect();
        let flags = self
            .flags
            .iter()
            .map(|f| BoundText {
                argument: f.flag.clone(),
                raw: f
                    .value
                    .and_then(|v| input.get(v))
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();
        PathSearchSummary {
            usage: pathway.format(tree.label()),
            handler: pathway.handler().map(|h| h.0.clone()),
            bindings,
            flags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundText {
    pub argument: String,
    pub raw: String,
}

/// Serializable view of a [`PathSearch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSearchSummary {
    pub usage: String,
    pub handler: Option<String>,
    pub bindings: Vec<BoundText>,
    pub flags: Vec<BoundText>,
}
