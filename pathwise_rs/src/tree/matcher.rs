//! Depth-first matching with backtracking.
//!
//! Starting at the root, the engine tries each child of the current node in
//! dispatch order. A child that accepts the token under the cursor gets a
//! cloned cursor advanced past the tokens it binds, and the walk recurses.
//! When a subtree fails the engine falls back to the next sibling; optional
//! children may also be skipped without consuming anything. Flag tokens are
//! taken off the raw axis before positional matching at every node, using the
//! flag scopes of the pathways passing through that node.
//!
//! Every failed `(node, raw position, flags consumed)` state is memoised, so a
//! node is explored at most once per cursor position.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::{Binding, CommandTree, FlagBinding, NodeId, PathSearch, PathwayId, RawSpan};
use crate::argument::FlagData;
use crate::command::Command;
use crate::config::DispatchConfig;
use crate::cursor::Cursor;
use crate::error::{MatchFailure, NoMatchReason, UnknownFlagError};
use crate::flags::looks_like_flag;
use crate::input::ArgumentInput;
use crate::similar::suggest_similar;

/// Flag token consumed before the winning pathway is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PendingFlag {
    token: usize,
    /// 1 for switches, 2 when a value token follows.
    width: usize,
}

#[derive(Debug, Clone)]
struct Walk<'a> {
    cursor: Cursor<'a>,
    bindings: Vec<(NodeId, RawSpan)>,
    flags: Vec<PendingFlag>,
}

impl Walk<'_> {
    fn raw(&self) -> usize {
        self.cursor.position().raw
    }

    fn bind(&mut self, node: NodeId, span: RawSpan) {
        self.bindings.push((node, span));
        self.cursor.skip_raw(span.len());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    node: NodeId,
    raw: usize,
    flags: Vec<usize>,
}

#[derive(Debug, Clone)]
enum Miss {
    Flag(MatchFailure),
    Structural {
        reason: NoMatchReason,
        node: NodeId,
        position: usize,
    },
}

impl Miss {
    fn structural(reason: NoMatchReason, node: NodeId, position: usize) -> Self {
        Miss::Structural {
            reason,
            node,
            position,
        }
    }

    /// Flag failures outrank structural ones; deeper outranks shallower.
    fn rank(&self) -> (u8, usize) {
        match self {
            Miss::Flag(failure) => (1, failure.position()),
            Miss::Structural { position, .. } => (0, *position),
        }
    }
}

fn most_specific(current: Option<Miss>, next: Miss) -> Miss {
    match current {
        Some(current) if current.rank() >= next.rank() => current,
        _ => next,
    }
}

pub struct MatchEngine<'a> {
    tree: &'a CommandTree,
    input: &'a ArgumentInput,
    config: &'a DispatchConfig,
    failed: HashMap<MemoKey, Miss>,
    visits: usize,
}

impl<'a> MatchEngine<'a> {
    pub fn new(tree: &'a CommandTree, input: &'a ArgumentInput, config: &'a DispatchConfig) -> Self {
        Self {
            tree,
            input,
            config,
            failed: HashMap::new(),
            visits: 0,
        }
    }

    /// Match `input` (label at token 0) against the command's pathways.
    pub fn context_match(
        command: &'a Command,
        input: &'a ArgumentInput,
        config: &'a DispatchConfig,
    ) -> Result<PathSearch, MatchFailure> {
        MatchEngine::new(command.tree(), input, config).run()
    }

    /// Node visits made so far, memo hits included.
    pub fn visits(&self) -> usize {
        self.visits
    }

    pub fn run(&mut self) -> Result<PathSearch, MatchFailure> {
        let tree = self.tree;
        let root = tree.node(tree.root());
        let label = self.input.get(0).unwrap_or_default();
        if !root.accepts(label, self.config.case_sensitive_literals) {
            let labels = std::iter::once(root.argument().name())
                .chain(root.argument().aliases().iter().map(String::as_str));
            return Err(MatchFailure::UnknownCommand {
                label: label.to_string(),
                suggestion: suggest_similar(label, labels, self.config.typo_distance)
                    .map(str::to_string),
            });
        }

        let mut cursor = Cursor::new(self.input);
        cursor.skip_raw(1);
        let walk = Walk {
            cursor,
            bindings: Vec::new(),
            flags: Vec::new(),
        };

        match self.visit(tree.root(), walk) {
            Ok(search) => {
                debug!(
                    command = %tree.label(),
                    usage = %tree.pathway(search.pathway).format(tree.label()),
                    visits = self.visits,
                    "matched pathway"
                );
                Ok(search)
            }
            Err(miss) => {
                let failure = self.describe(miss);
                debug!(command = %tree.label(), visits = self.visits, %failure, "no pathway matched");
                Err(failure)
            }
        }
    }

    fn visit(&mut self, id: NodeId, mut walk: Walk<'a>) -> Result<PathSearch, Miss> {
        self.visits += 1;
        self.absorb_flags(id, &mut walk)?;

        let key = MemoKey {
            node: id,
            raw: walk.raw(),
            flags: walk.flags.iter().map(|f| f.token).collect(),
        };
        if let Some(miss) = self.failed.get(&key) {
            trace!(node = id.index(), raw = key.raw, "memoised failure");
            return Err(miss.clone());
        }

        let outcome = self.explore(id, walk);
        if let Err(miss) = &outcome {
            self.failed.insert(key, miss.clone());
        }
        outcome
    }

    fn explore(&mut self, id: NodeId, walk: Walk<'a>) -> Result<PathSearch, Miss> {
        let tree = self.tree;
        let node = tree.node(id);
        let position = walk.raw();

        let Some(token) = walk.cursor.current_raw().map(str::to_string) else {
            return match node.terminal() {
                Some(pathway) => self.finish(id, pathway, walk),
                None => Err(Miss::structural(NoMatchReason::Incomplete, id, position)),
            };
        };

        let mut failure: Option<Miss> = None;
        let mut accepted = false;

        for child in tree.children(id) {
            if !child.accepts(&token, self.config.case_sensitive_literals) {
                continue;
            }
            accepted = true;
            let width = if child.is_greedy() {
                self.input.len() - position
            } else {
                child.argument().arity()
            };
            if position + width > self.input.len() {
                failure = Some(most_specific(
                    failure,
                    Miss::structural(NoMatchReason::Incomplete, child.id(), self.input.len()),
                ));
                continue;
            }
            trace!(node = %child.label(), token = %token, width, "descending");
            let mut next = walk.clone();
            next.bind(child.id(), RawSpan::new(position, position + width));
            match self.visit(child.id(), next) {
                Ok(search) => return Ok(search),
                Err(miss) => failure = Some(most_specific(failure, miss)),
            }
        }

        if self.config.optional_skipping {
            for child in tree.children(id).filter(|c| c.is_optional()) {
                trace!(node = %child.label(), token = %token, "skipping optional");
                match self.visit(child.id(), walk.clone()) {
                    Ok(search) => return Ok(search),
                    Err(miss) => failure = Some(most_specific(failure, miss)),
                }
            }
        }

        let reason = if node.is_terminal() && !accepted {
            NoMatchReason::TrailingInput
        } else {
            NoMatchReason::Unrecognized
        };
        Err(most_specific(failure, Miss::structural(reason, id, position)))
    }

    /// Take flag tokens off the raw axis. A token counts as a flag when some
    /// pathway in this node's scope names it exactly or decomposes it
    /// completely.
    fn absorb_flags(&self, id: NodeId, walk: &mut Walk<'a>) -> Result<(), Miss> {
        let node = self.tree.node(id);
        loop {
            let position = walk.raw();
            let Some(token) = walk.cursor.current_raw() else {
                return Ok(());
            };
            if !looks_like_flag(token) {
                return Ok(());
            }
            let token = token.to_string();

            // An exact name anywhere in scope beats a compact decomposition.
            let mut recognised: Option<Vec<&FlagData>> = node
                .scope()
                .iter()
                .find_map(|&p| self.tree.pathway(p).flag_extractor().classify(&token))
                .map(|flag| vec![flag]);
            let mut partial: Option<UnknownFlagError> = None;
            for &pathway in node.scope() {
                if recognised.is_some() {
                    break;
                }
                let extractor = self.tree.pathway(pathway).flag_extractor();
                if extractor.is_empty() {
                    continue;
                }
                match extractor.extract(&token) {
                    Ok(flags) => {
                        recognised = Some(flags);
                        break;
                    }
                    Err(err) => {
                        if partial.as_ref().is_none_or(|p| err.recognised > p.recognised) {
                            partial = Some(err);
                        }
                    }
                }
            }

            let Some(flags) = recognised else {
                // Nothing recognised at all: leave it for positional matching.
                return match partial {
                    Some(err) if err.recognised > 0 => {
                        Err(Miss::Flag(MatchFailure::unknown_flag(err, position)))
                    }
                    _ => Ok(()),
                };
            };

            let valued: Vec<&FlagData> = flags.into_iter().filter(|f| !f.is_switch()).collect();
            let width = match valued.first() {
                None => 1,
                Some(first) => {
                    let input_type = first.input_type().map(|t| t.name().to_string());
                    if valued
                        .iter()
                        .any(|f| f.input_type().map(|t| t.name().to_string()) != input_type)
                    {
                        return Err(Miss::Flag(MatchFailure::MixedFlagInputs { token, position }));
                    }
                    if position + 1 >= self.input.len() {
                        return Err(Miss::Flag(MatchFailure::MissingFlagValue {
                            flag: first.name().to_string(),
                            token,
                            position,
                        }));
                    }
                    2
                }
            };
            trace!(token = %token, width, "flag");
            walk.flags.push(PendingFlag {
                token: position,
                width,
            });
            walk.cursor.skip_raw(width);
        }
    }

    /// Terminal reached with the input consumed. The winner must declare
    /// every flag that was absorbed on the way.
    fn finish(&self, terminal: NodeId, pathway: PathwayId, walk: Walk<'a>) -> Result<PathSearch, Miss> {
        let extractor = self.tree.pathway(pathway).flag_extractor();
        let mut flags = Vec::new();
        for pending in &walk.flags {
            let token = self.input.get(pending.token).unwrap_or_default();
            let resolved = match extractor.classify(token) {
                Some(flag) => vec![flag],
                None => extractor
                    .extract(token)
                    .map_err(|err| Miss::Flag(MatchFailure::unknown_flag(err, pending.token)))?,
            };
            let valued = resolved.iter().any(|f| !f.is_switch());
            if usize::from(valued) + 1 != pending.width {
                return Err(Miss::structural(
                    NoMatchReason::Unrecognized,
                    terminal,
                    pending.token,
                ));
            }
            for flag in resolved {
                flags.push(FlagBinding {
                    flag: flag.name().to_string(),
                    token: pending.token,
                    value: (!flag.is_switch()).then_some(pending.token + 1),
                });
            }
        }

        let bindings = walk
            .bindings
            .iter()
            .map(|(node, span)| Binding {
                argument: self.tree.node(*node).depth() - 1,
                node: *node,
                span: *span,
            })
            .collect();

        Ok(PathSearch {
            pathway,
            terminal,
            bindings,
            flags,
        })
    }

    fn describe(&self, miss: Miss) -> MatchFailure {
        match miss {
            Miss::Flag(failure) => failure,
            Miss::Structural {
                reason,
                node,
                position,
            } => {
                let token = match reason {
                    NoMatchReason::Incomplete => None,
                    _ => self.input.get(position).map(str::to_string),
                };
                let suggestion = token.as_deref().and_then(|t| {
                    let literals = self
                        .tree
                        .children(node)
                        .filter(|c| c.is_literal())
                        .flat_map(|c| {
                            std::iter::once(c.argument().name())
                                .chain(c.argument().aliases().iter().map(String::as_str))
                        });
                    suggest_similar(t, literals, self.config.typo_distance).map(str::to_string)
                });
                MatchFailure::NoMatchingPathway {
                    reason,
                    position,
                    token,
                    suggestion,
                    closest: self.tree.usages_through(node),
                }
            }
        }
    }
}
