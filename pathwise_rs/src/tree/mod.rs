//! Command tree: one node per distinct positional slot, shared by every
//! pathway that passes through it.
//!
//! Nodes live in an arena (`Vec<ParameterNode>`) addressed by [`NodeId`].
//! Children are kept in dispatch order at insertion time, so the match engine
//! and the suggestion engine just iterate them:
//!
//! 1. literals
//! 2. typed nodes whose type is [`Classifier::Specific`], highest priority first
//! 3. typed fallback nodes
//! 4. the greedy catch-all
//!
//! Ties keep registration order. Registration is transactional: a pathway is
//! installed into a clone of the tree and the clone replaces the original only
//! when every check passed.

mod matcher;
mod render;
mod search;
mod suggest;

use std::cmp::Reverse;

use tracing::debug;

pub use matcher::MatchEngine;
pub use search::{Binding, BoundText, FlagBinding, PathSearch, PathSearchSummary, RawSpan};
pub use suggest::SuggestionEngine;

use crate::argument::Argument;
use crate::error::RegistrationError;
use crate::pathway::Pathway;
use crate::priority::Priority;
use crate::types::Classifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct PathwayId(usize);

impl PathwayId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Literal,
    Typed(Classifier),
    Greedy,
}

impl NodeKind {
    fn of(argument: &Argument) -> Self {
        if argument.is_literal() {
            NodeKind::Literal
        } else if argument.is_greedy() {
            NodeKind::Greedy
        } else {
            let classifier = argument
                .value_type()
                .map(|ty| ty.classifier())
                .unwrap_or(Classifier::Fallback);
            NodeKind::Typed(classifier)
        }
    }

    fn category(self) -> u8 {
        match self {
            NodeKind::Literal => 0,
            NodeKind::Typed(Classifier::Specific) => 1,
            NodeKind::Typed(Classifier::Fallback) => 2,
            NodeKind::Greedy => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterNode {
    id: NodeId,
    kind: NodeKind,
    argument: Argument,
    depth: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    terminal: Option<PathwayId>,
    scope: Vec<PathwayId>,
    order: usize,
}

impl ParameterNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    /// Root is depth 0; a node at depth `d` is positional `d - 1` of every
    /// pathway passing through it.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn terminal(&self) -> Option<PathwayId> {
        self.terminal
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Pathways passing through this node, in registration order.
    pub fn scope(&self) -> &[PathwayId] {
        &self.scope
    }

    pub fn is_literal(&self) -> bool {
        self.kind == NodeKind::Literal
    }

    pub fn is_greedy(&self) -> bool {
        self.kind == NodeKind::Greedy
    }

    pub fn is_optional(&self) -> bool {
        self.argument.is_optional()
    }

    pub fn priority(&self) -> Priority {
        self.argument
            .value_type()
            .map(|ty| ty.priority())
            .unwrap_or(Priority::MAXIMUM)
    }

    /// Shape check of the first raw token this node would bind.
    pub fn accepts(&self, token: &str, case_sensitive: bool) -> bool {
        match self.kind {
            NodeKind::Literal => self.argument.matches_literal(token, case_sensitive),
            NodeKind::Greedy => true,
            NodeKind::Typed(_) => self
                .argument
                .value_type()
                .is_some_and(|ty| ty.matches_input(token)),
        }
    }

    fn sort_key(&self) -> (u8, Reverse<Priority>, usize) {
        let priority = match self.kind {
            NodeKind::Typed(Classifier::Specific) => self.priority(),
            _ => Priority::LOW,
        };
        (self.kind.category(), Reverse(priority), self.order)
    }

    /// `name`, `<name:type>`, `[name:type]` or `<name...>`.
    pub fn label(&self) -> String {
        let argument = &self.argument;
        match self.kind {
            NodeKind::Literal => argument.name().to_string(),
            NodeKind::Greedy if argument.is_optional() => format!("[{}...]", argument.name()),
            NodeKind::Greedy => format!("<{}...>", argument.name()),
            NodeKind::Typed(_) if argument.is_optional() => {
                format!("[{}:{}]", argument.name(), argument.type_name())
            }
            NodeKind::Typed(_) => format!("<{}:{}>", argument.name(), argument.type_name()),
        }
    }
}

/// The pathways of one root command, merged into a prefix tree.
#[derive(Debug, Clone)]
pub struct CommandTree {
    nodes: Vec<ParameterNode>,
    pathways: Vec<Pathway>,
}

impl CommandTree {
    /// A tree holding only the root literal (the command label).
    pub fn new(root: Argument) -> Self {
        let node = ParameterNode {
            id: NodeId(0),
            kind: NodeKind::Literal,
            argument: root,
            depth: 0,
            parent: None,
            children: Vec::new(),
            terminal: None,
            scope: Vec::new(),
            order: 0,
        };
        Self {
            nodes: vec![node],
            pathways: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn label(&self) -> &str {
        self.nodes[0].argument.name()
    }

    pub fn node(&self, id: NodeId) -> &ParameterNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[ParameterNode] {
        &self.nodes
    }

    /// Number of nodes below the root.
    pub fn size(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn pathways(&self) -> &[Pathway] {
        &self.pathways
    }

    pub fn pathway(&self, id: PathwayId) -> &Pathway {
        &self.pathways[id.0]
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ParameterNode> {
        self.nodes[id.0].children.iter().map(|c| &self.nodes[c.0])
    }

    /// Install a pathway. On error the tree is unchanged.
    pub fn register_pathway(&mut self, pathway: Pathway) -> Result<PathwayId, RegistrationError> {
        let usage = pathway.format(self.label());
        self.check_shape(&pathway, &usage)?;

        let signature = pathway.required_signature();
        if let Some(existing) = self
            .pathways
            .iter()
            .find(|p| p.required_signature() == signature)
        {
            return Err(RegistrationError::AmbiguousPathway {
                command: self.label().to_string(),
                existing: existing.format(self.label()),
                candidate: usage,
            });
        }

        let mut staged = self.clone();
        let id = staged.install(pathway, &usage)?;
        *self = staged;
        debug!(command = %self.label(), usage = %usage, nodes = self.size(), "registered pathway");
        Ok(id)
    }

    fn check_shape(&self, pathway: &Pathway, usage: &str) -> Result<(), RegistrationError> {
        let last = pathway.arguments().len().saturating_sub(1);
        for (index, argument) in pathway.arguments().iter().enumerate() {
            if argument.is_greedy() && index != last {
                return Err(RegistrationError::GreedyNotLast {
                    argument: argument.name().to_string(),
                    usage: usage.to_string(),
                });
            }
        }
        Ok(())
    }

    fn install(&mut self, pathway: Pathway, usage: &str) -> Result<PathwayId, RegistrationError> {
        let id = PathwayId(self.pathways.len());
        let mut path = vec![self.root()];
        let mut current = self.root();

        for argument in pathway.arguments() {
            current = match self.find_child(current, argument) {
                Some(child) => {
                    self.nodes[child.0].argument.merge_shared(argument);
                    child
                }
                None => self.add_child(current, argument.clone()),
            };
            path.push(current);
        }
        for node in &path {
            self.nodes[node.0].scope.push(id);
        }

        // Terminal at the last required positional and at every trailing
        // optional one after it.
        let first_terminal = pathway
            .arguments()
            .iter()
            .rposition(Argument::is_required)
            .map(|i| i + 1)
            .unwrap_or(0);
        let required = pathway.required_count();
        for &node in &path[first_terminal..] {
            match self.nodes[node.0].terminal {
                None => self.nodes[node.0].terminal = Some(id),
                Some(existing) => {
                    let held = self.pathways[existing.0].required_count();
                    if held == required {
                        return Err(RegistrationError::AmbiguousPathway {
                            command: self.label().to_string(),
                            existing: self.pathways[existing.0].format(self.label()),
                            candidate: usage.to_string(),
                        });
                    }
                    if required > held {
                        self.nodes[node.0].terminal = Some(id);
                    }
                }
            }
        }

        self.pathways.push(pathway);
        Ok(id)
    }

    fn find_child(&self, parent: NodeId, argument: &Argument) -> Option<NodeId> {
        let identity = argument.identity();
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].argument.identity() == identity)
    }

    fn add_child(&mut self, parent: NodeId, argument: Argument) -> NodeId {
        let id = NodeId(self.nodes.len());
        let node = ParameterNode {
            id,
            kind: NodeKind::of(&argument),
            argument,
            depth: self.nodes[parent.0].depth + 1,
            parent: Some(parent),
            children: Vec::new(),
            terminal: None,
            scope: Vec::new(),
            order: id.0,
        };
        self.nodes.push(node);

        let mut children = std::mem::take(&mut self.nodes[parent.0].children);
        children.push(id);
        children.sort_by_key(|c| self.nodes[c.0].sort_key());
        self.nodes[parent.0].children = children;
        id
    }

    /// Usages of every pathway passing through `node`.
    pub fn usages_through(&self, node: NodeId) -> Vec<String> {
        self.nodes[node.0]
            .scope
            .iter()
            .map(|p| self.pathway(*p).format(self.label()))
            .collect()
    }
}
