//! Tab completion.
//!
//! The engine walks the tree with the tokens *before* the one being typed,
//! the same way matching does but without committing to a single branch:
//! every structurally reachable node contributes. At the position being
//! completed each child offers its candidates (literal spellings, provider
//! output, or the type's static list), optionally followed by flag names.
//! Completion never fails; malformed input just yields fewer candidates.

use std::collections::HashSet;

use super::{NodeId, ParameterNode};
use crate::argument::{Argument, FlagData};
use crate::command::Command;
use crate::config::DispatchConfig;
use crate::flags::looks_like_flag;
use crate::input::ArgumentInput;
use crate::provider::SuggestionContext;
use crate::source::{Source, permits};

pub struct SuggestionEngine<'a> {
    command: &'a Command,
    config: &'a DispatchConfig,
    source: &'a dyn Source,
}

struct Completion<'t> {
    tokens: &'t [String],
    /// Index of the token being completed.
    last: usize,
    partial: &'t str,
}

impl<'a> SuggestionEngine<'a> {
    pub fn new(command: &'a Command, config: &'a DispatchConfig, source: &'a dyn Source) -> Self {
        Self {
            command,
            config,
            source,
        }
    }

    /// Candidates for the last token of `input` (or a new token after a
    /// trailing space). Token 0 is the command label.
    pub fn suggest(&self, input: &ArgumentInput) -> Vec<String> {
        let tokens = input.tokens();
        if tokens.is_empty() {
            return Vec::new();
        }
        let (last, partial) = if input.ends_with_space() {
            (tokens.len(), "")
        } else {
            (tokens.len() - 1, tokens[tokens.len() - 1].as_str())
        };
        if !self.command.ignores_completion_permissions()
            && !permits(self.source, self.command.permission())
        {
            return Vec::new();
        }

        let completion = Completion {
            tokens,
            last,
            partial,
        };
        let mut raw = Vec::new();
        if last == 0 {
            raw.extend(self.command.labels().map(str::to_string));
        } else {
            let mut seen = HashSet::new();
            self.walk(self.command.tree().root(), 1, &completion, &mut seen, &mut raw);
        }
        let out = self.finalize(raw, partial);
        tracing::trace!(command = %self.command.name(), partial, count = out.len(), "suggestions");
        out
    }

    fn walk(
        &self,
        id: NodeId,
        index: usize,
        completion: &Completion<'_>,
        seen: &mut HashSet<(NodeId, usize)>,
        out: &mut Vec<String>,
    ) {
        if index > completion.last || !seen.insert((id, index)) {
            return;
        }
        if index == completion.last {
            self.collect(id, completion, out);
            return;
        }

        let tree = self.command.tree();
        let token = completion.tokens[index].as_str();

        if looks_like_flag(token)
            && let Some(flags) = self.flags_in_scope(id, token)
        {
            match flags.iter().find(|f| !f.is_switch()) {
                Some(valued) if index + 1 == completion.last => {
                    self.flag_value_candidates(valued, completion, out);
                }
                Some(_) => self.walk(id, index + 2, completion, seen, out),
                None => self.walk(id, index + 1, completion, seen, out),
            }
            return;
        }

        let case_sensitive = self.config.case_sensitive_literals;
        for child in tree.children(id) {
            if !self.permitted(child) {
                continue;
            }
            if child.is_greedy() {
                // The greedy value is still being typed.
                self.argument_candidates(child.argument(), completion, out);
                continue;
            }
            if child.accepts(token, case_sensitive) {
                self.walk(child.id(), index + child.argument().arity(), completion, seen, out);
            }
        }
        if self.config.optional_skipping {
            for child in tree.children(id).filter(|c| c.is_optional() && !c.is_greedy()) {
                self.walk(child.id(), index, completion, seen, out);
            }
        }
    }

    fn collect(&self, id: NodeId, completion: &Completion<'_>, out: &mut Vec<String>) {
        let tree = self.command.tree();
        for child in tree.children(id) {
            if !self.permitted(child) {
                continue;
            }
            self.argument_candidates(child.argument(), completion, out);
            if self.config.overlapping_optional_suggestions && child.is_optional() {
                self.collect_overlap(child, completion, out);
            }
        }

        let partial = completion.partial;
        if self.config.suggest_flags && (partial.is_empty() || partial.starts_with('-')) {
            for &pathway in tree.node(id).scope() {
                for flag in tree.pathway(pathway).flags() {
                    if self.command.ignores_completion_permissions()
                        || permits(self.source, flag.required_permission())
                    {
                        out.extend(flag.spellings());
                    }
                }
            }
        }
    }

    /// Optional positions right after an optional one, as long as the type
    /// changes; the user may be skipping ahead.
    fn collect_overlap(
        &self,
        start: &ParameterNode,
        completion: &Completion<'_>,
        out: &mut Vec<String>,
    ) {
        let tree = self.command.tree();
        let mut frontier = vec![start];
        while let Some(node) = frontier.pop() {
            for next in tree.children(node.id()) {
                if next.is_optional()
                    && next.argument().type_name() != node.argument().type_name()
                    && self.permitted(next)
                {
                    self.argument_candidates(next.argument(), completion, out);
                    frontier.push(next);
                }
            }
        }
    }

    fn flags_in_scope(&self, id: NodeId, token: &str) -> Option<Vec<&'a FlagData>> {
        let tree = self.command.tree();
        tree.node(id)
            .scope()
            .iter()
            .find_map(|&p| tree.pathway(p).flag_extractor().extract(token).ok())
    }

    fn flag_value_candidates(
        &self,
        flag: &FlagData,
        completion: &Completion<'_>,
        out: &mut Vec<String>,
    ) {
        let context = self.context(completion);
        match (flag.suggestion_provider(), flag.input_type()) {
            (Some(provider), _) => out.extend(provider.provide(&context)),
            (None, Some(ty)) => out.extend(ty.suggestions()),
            (None, None) => {}
        }
    }

    fn argument_candidates(
        &self,
        argument: &Argument,
        completion: &Completion<'_>,
        out: &mut Vec<String>,
    ) {
        if argument.is_literal() {
            out.push(argument.name().to_string());
            out.extend(argument.aliases().iter().cloned());
            return;
        }
        match (argument.suggestion_provider(), argument.value_type()) {
            (Some(provider), _) => out.extend(provider.provide(&self.context(completion))),
            (None, Some(ty)) => out.extend(ty.suggestions()),
            (None, None) => {}
        }
    }

    fn context<'c>(&'c self, completion: &'c Completion<'_>) -> SuggestionContext<'c> {
        SuggestionContext {
            source: self.source,
            command: self.command.name(),
            preceding: &completion.tokens[..completion.last.min(completion.tokens.len())],
            partial: completion.partial,
        }
    }

    fn permitted(&self, node: &ParameterNode) -> bool {
        self.command.ignores_completion_permissions()
            || permits(self.source, node.argument().required_permission())
    }

    /// Prefix filter (ASCII case-insensitive), de-duplicate, cap.
    fn finalize(&self, candidates: Vec<String>, partial: &str) -> Vec<String> {
        let prefix = partial.to_lowercase();
        let mut seen = HashSet::new();
        let mut out: Vec<String> = candidates
            .into_iter()
            .filter(|c| c.to_lowercase().starts_with(&prefix))
            .filter(|c| seen.insert(c.clone()))
            .collect();
        if self.config.max_suggestions > 0 {
            out.truncate(self.config.max_suggestions);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pathway::Pathway;
    use crate::provider::StaticSuggestions;
    use crate::source::{ConsoleSource, PermissionedSource};
    use crate::types::{BooleanType, DurationType, IntegerType, SharedType, StringType};

    fn word() -> SharedType {
        Arc::new(StringType::word())
    }

    fn give() -> Command {
        Command::builder("give")
            .pathway(
                Pathway::builder()
                    .argument(
                        Argument::value("player", word())
                            .suggest_with(Arc::new(StaticSuggestions::new(["Steve", "Alex"]))),
                    )
                    .argument(Argument::value("item", word()).suggest_with(Arc::new(
                        StaticSuggestions::new(["diamond", "dirt", "stone"]),
                    )))
                    .argument(Argument::value("amount", Arc::new(IntegerType)).default_value("1"))
                    .flag(FlagData::switch("silent").alias("s"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn suggest(command: &Command, config: &DispatchConfig, line: &str) -> Vec<String> {
        SuggestionEngine::new(command, config, &ConsoleSource).suggest(&ArgumentInput::split(line))
    }

    #[test]
    fn test_completes_current_position_only() {
        let cmd = give();
        let config = DispatchConfig::default();
        assert_eq!(suggest(&cmd, &config, "give Steve dia"), vec!["diamond"]);
        assert_eq!(suggest(&cmd, &config, "give Steve di"), vec!["diamond", "dirt"]);
        assert_eq!(suggest(&cmd, &config, "give a"), vec!["Alex"]);
    }

    #[test]
    fn test_trailing_space_offers_next_position_and_flags() {
        let cmd = give();
        let config = DispatchConfig::default();
        assert_eq!(
            suggest(&cmd, &config, "give Steve "),
            vec!["diamond", "dirt", "stone", "--silent", "-s"]
        );
        let no_flags = DispatchConfig {
            suggest_flags: false,
            ..DispatchConfig::default()
        };
        assert_eq!(suggest(&cmd, &no_flags, "give Steve -").len(), 0);
        assert_eq!(suggest(&cmd, &config, "give Steve --s"), vec!["--silent"]);
    }

    #[test]
    fn test_flags_are_stepped_over() {
        let cmd = give();
        let config = DispatchConfig::default();
        assert_eq!(suggest(&cmd, &config, "give -s Steve st"), vec!["stone"]);
    }

    #[test]
    fn test_valued_flag_offers_its_values() {
        let cmd = Command::builder("mute")
            .pathway(
                Pathway::builder()
                    .argument(Argument::value("player", word()))
                    .flag(FlagData::valued("time", Arc::new(DurationType)).alias("t"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let config = DispatchConfig::default();
        assert_eq!(suggest(&cmd, &config, "mute Steve -t 1"), vec!["1h", "1d"]);
    }

    #[test]
    fn test_malformed_input_never_fails() {
        let cmd = give();
        let config = DispatchConfig::default();
        assert_eq!(suggest(&cmd, &config, "give -zz dia"), vec!["diamond"]);
        assert!(suggest(&cmd, &config, "give a b c d e f").is_empty());
    }

    #[test]
    fn test_permissions_filter_unless_ignored() {
        let build = |ignore: bool| {
            let mut builder = Command::builder("admin");
            if ignore {
                builder = builder.ignore_completion_permissions();
            }
            builder
                .pathway(
                    Pathway::builder()
                        .argument(Argument::literal("stop").permission("admin.stop"))
                        .build()
                        .unwrap(),
                )
                .pathway(
                    Pathway::builder()
                        .argument(Argument::literal("status"))
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap()
        };
        let guest = PermissionedSource::new("guest");
        let config = DispatchConfig::default();
        let input = ArgumentInput::split("admin st");
        let strict = build(false);
        assert_eq!(
            SuggestionEngine::new(&strict, &config, &guest).suggest(&input),
            vec!["status"]
        );
        let open = build(true);
        assert_eq!(
            SuggestionEngine::new(&open, &config, &guest).suggest(&input),
            vec!["stop", "status"]
        );
    }

    #[test]
    fn test_overlapping_optional_suggestions() {
        let cmd = Command::builder("config")
            .pathway(
                Pathway::builder()
                    .argument(Argument::value("enabled", Arc::new(BooleanType::strict())).optional())
                    .argument(Argument::value("delay", Arc::new(DurationType)).optional())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let plain = DispatchConfig {
            suggest_flags: false,
            ..DispatchConfig::default()
        };
        assert_eq!(suggest(&cmd, &plain, "config "), vec!["true", "false"]);
        let overlapping = DispatchConfig {
            overlapping_optional_suggestions: true,
            ..plain
        };
        assert_eq!(
            suggest(&cmd, &overlapping, "config "),
            vec!["true", "false", "30s", "5m", "1h", "1d"]
        );
    }

    #[test]
    fn test_max_suggestions_truncates() {
        let cmd = give();
        let config = DispatchConfig {
            max_suggestions: 2,
            ..DispatchConfig::default()
        };
        assert_eq!(suggest(&cmd, &config, "give Steve ").len(), 2);
    }
}
