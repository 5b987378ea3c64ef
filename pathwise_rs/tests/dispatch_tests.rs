//! Dispatch behaviour through the public API: registration, matching,
//! value assignment.

use std::sync::Arc;
use std::time::Duration;

use pathwise::{
    Argument, ArgumentInput, Command, ConsoleSource, DispatchConfig, DispatchError, Dispatcher,
    FlagData, IntegerType, MatchEngine, MatchFailure, NoMatchReason, Pathway, RangeValidator,
    RecordType, RegistrationError, Resolution, SharedType, StringType, TypeRegistry, Value,
};
use pretty_assertions::assert_eq;

fn word() -> SharedType {
    Arc::new(StringType::word())
}

fn int() -> SharedType {
    Arc::new(IntegerType)
}

fn types() -> TypeRegistry {
    TypeRegistry::new()
}

fn single(name: &str, pathway: Pathway) -> Dispatcher {
    let mut dispatcher = Dispatcher::default();
    dispatcher
        .register(Command::builder(name).pathway(pathway).build().unwrap())
        .unwrap();
    dispatcher
}

fn dispatch(dispatcher: &Dispatcher, line: &str) -> Result<Resolution, DispatchError> {
    dispatcher.dispatch(&ConsoleSource, &ArgumentInput::split(line))
}

// ============================================
// Registration
// ============================================

mod registration {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_required_signatures_are_ambiguous() {
        let first = Pathway::builder()
            .argument(Argument::value("player", word()))
            .argument(Argument::value("amount", int()))
            .build()
            .unwrap();
        let second = Pathway::builder()
            .argument(Argument::value("target", word()))
            .argument(Argument::value("count", int()))
            .argument(Argument::value("note", word()).optional())
            .build()
            .unwrap();
        let err = Command::builder("give")
            .pathway(first)
            .pathway(second)
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::AmbiguousPathway { .. }), "{err:?}");
    }

    #[test]
    fn greedy_not_last_leaves_tree_unchanged() {
        let mut command = Command::builder("say")
            .pathway(
                Pathway::builder()
                    .argument(Argument::value("message", types().resolve("text").unwrap()))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let before = command.tree().size();
        let usages = command.usages();

        let err = command
            .register_pathway(
                Pathway::builder()
                    .argument(Argument::literal("to"))
                    .argument(Argument::value("message", word()).greedy())
                    .argument(Argument::value("target", word()))
                    .build()
                    .unwrap(),
            )
            .unwrap_err();

        assert!(matches!(err, RegistrationError::GreedyNotLast { .. }), "{err:?}");
        assert_eq!(command.tree().size(), before);
        assert_eq!(command.usages(), usages);
    }

    #[test]
    fn unknown_type_name_is_reported() {
        assert_eq!(
            types().resolve("block").unwrap_err(),
            RegistrationError::UnknownType("block".into())
        );
    }
}

// ============================================
// Matching and binding
// ============================================

mod binding {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn binds_every_positional_in_order() {
        let dispatcher = single(
            "give",
            Pathway::builder()
                .argument(Argument::value("player", word()))
                .argument(Argument::value("item", word()))
                .argument(Argument::value("amount", int()))
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "give Steve diamond 5").unwrap();
        assert_eq!(res.arguments.value("player"), Some(&Value::from("Steve")));
        assert_eq!(res.arguments.value("item"), Some(&Value::from("diamond")));
        assert_eq!(res.arguments.value("amount"), Some(&Value::Integer(5)));
        let names: Vec<&str> = res.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["player", "item", "amount"]);
    }

    #[test]
    fn missing_optional_takes_its_default() {
        let dispatcher = single(
            "tp",
            Pathway::builder()
                .argument(Argument::value("player", word()))
                .argument(Argument::value("world", word()).default_value("current"))
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "tp Steve").unwrap();
        let world = res.arguments.get("world").unwrap();
        assert!(world.span.is_empty());
        assert!(world.defaulted);
        assert_eq!(world.value, Some(Value::from("current")));
    }

    #[test]
    fn typed_default_is_parsed() {
        let dispatcher = single(
            "give",
            Pathway::builder()
                .argument(Argument::value("player", word()))
                .argument(Argument::value("item", word()))
                .argument(Argument::value("amount", int()).default_value("1"))
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "give Steve diamond").unwrap();
        let amount = res.arguments.get("amount").unwrap();
        assert_eq!(amount.value, Some(Value::Integer(1)));
        assert!(amount.span.is_empty());
    }

    #[test]
    fn greedy_binds_the_rest_as_one_value() {
        let dispatcher = single(
            "say",
            Pathway::builder()
                .argument(Argument::value("message", types().resolve("text").unwrap()))
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "say hello there friend").unwrap();
        assert_eq!(
            res.arguments.value("message"),
            Some(&Value::from("hello there friend"))
        );
        assert_eq!(res.arguments.len(), 1);
    }

    #[test]
    fn greedy_modifier_on_word_type_binds_the_rest() {
        let dispatcher = single(
            "say",
            Pathway::builder()
                .argument(Argument::value("message", word()).greedy())
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "say hello there friend").unwrap();
        let message = res.arguments.get("message").unwrap();
        assert_eq!(message.value, Some(Value::from("hello there friend")));
        assert_eq!((message.span.start, message.span.end), (1, 4));
    }

    #[test]
    fn middle_optional_is_skipped_when_type_does_not_fit() {
        let dispatcher = single(
            "ban",
            Pathway::builder()
                .argument(Argument::value("player", word()))
                .argument(Argument::value("duration", types().resolve("duration").unwrap()).optional())
                .argument(Argument::value("reason", types().resolve("text").unwrap()))
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "ban Steve griefing again").unwrap();
        assert_eq!(res.arguments.value("duration"), None);
        assert_eq!(res.arguments.value("reason"), Some(&Value::from("griefing again")));

        let res = dispatch(&dispatcher, "ban Steve 2d griefing").unwrap();
        assert_eq!(
            res.arguments.value("duration"),
            Some(&Value::Duration(Duration::from_secs(2 * 86_400)))
        );
    }

    #[test]
    fn specific_type_wins_the_tie_break() {
        let mut command = Command::builder("pick").build().unwrap();
        command
            .register_pathway(
                Pathway::builder()
                    .argument(Argument::value("name", word()))
                    .handler("by_name")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        command
            .register_pathway(
                Pathway::builder()
                    .argument(Argument::value("count", int()))
                    .handler("by_count")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let mut dispatcher = Dispatcher::default();
        dispatcher.register(command).unwrap();

        assert_eq!(dispatch(&dispatcher, "pick 7").unwrap().handler(), Some("by_count"));
        assert_eq!(dispatch(&dispatcher, "pick seven").unwrap().handler(), Some("by_name"));
    }

    #[test]
    fn delimited_record_walks_characters() {
        let location: SharedType = Arc::new(RecordType::delimited(
            "location",
            ';',
            vec![
                ("world".to_string(), word()),
                ("x".to_string(), int()),
                ("y".to_string(), int()),
                ("z".to_string(), int()),
            ],
        ));
        let dispatcher = single(
            "warp",
            Pathway::builder()
                .argument(Argument::value("target", location))
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "warp world;12;64;12").unwrap();
        let target = res.arguments.value("target").unwrap();
        assert_eq!(target.field("world"), Some(&Value::from("world")));
        assert_eq!(target.field("y"), Some(&Value::Integer(64)));
    }

    #[test]
    fn arguments_are_grouped_by_owning_literal() {
        let dispatcher = single(
            "team",
            Pathway::builder()
                .argument(Argument::value("name", word()))
                .argument(Argument::literal("add"))
                .argument(Argument::value("player", word()))
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "team red add Steve").unwrap();
        let owners: Vec<&str> = res.arguments.owners().iter().map(|g| g.owner.as_str()).collect();
        assert_eq!(owners, vec!["team", "add"]);
        assert_eq!(res.arguments.for_owner("add")[0].name, "player");
    }
}

// ============================================
// Flags
// ============================================

mod flags {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ban() -> Dispatcher {
        single(
            "ban",
            Pathway::builder()
                .argument(Argument::value("player", word()))
                .flag(FlagData::switch("force").alias("f"))
                .flag(FlagData::valued("time", types().resolve("duration").unwrap()).alias("t"))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn compact_token_expands_switch_and_valued_flag() {
        let res = dispatch(&ban(), "ban Steve -ft 10m").unwrap();
        assert!(res.arguments.switch("force"));
        assert_eq!(
            res.arguments.flag_value("time"),
            Some(&Value::Duration(Duration::from_secs(600)))
        );
        assert_eq!(res.arguments.value("player"), Some(&Value::from("Steve")));
    }

    #[test]
    fn flags_may_precede_positionals() {
        let res = dispatch(&ban(), "ban --force Steve").unwrap();
        assert!(res.arguments.switch("force"));
        assert_eq!(res.arguments.flag_value("time"), None);
    }

    #[test]
    fn unknown_alias_in_compact_token_fails() {
        let err = dispatch(&ban(), "ban Steve -fx").unwrap_err();
        match err {
            DispatchError::Match(MatchFailure::UnknownFlag { token, .. }) => assert_eq!(token, "-fx"),
            other => panic!("expected unknown flag, got {other:?}"),
        }
    }

    #[test]
    fn valued_flag_without_value_fails() {
        let err = dispatch(&ban(), "ban Steve -t").unwrap_err();
        assert!(
            matches!(err, DispatchError::Match(MatchFailure::MissingFlagValue { .. })),
            "{err:?}"
        );
    }

    #[test]
    fn negative_numbers_are_positional() {
        let dispatcher = single(
            "shift",
            Pathway::builder()
                .argument(Argument::value("offset", int()))
                .flag(FlagData::switch("relative").alias("r"))
                .build()
                .unwrap(),
        );
        let res = dispatch(&dispatcher, "shift -5 -r").unwrap();
        assert_eq!(res.arguments.value("offset"), Some(&Value::Integer(-5)));
        assert!(res.arguments.switch("relative"));
    }
}

// ============================================
// Failures
// ============================================

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    fn give() -> Dispatcher {
        single(
            "give",
            Pathway::builder()
                .argument(Argument::value("player", word()))
                .argument(
                    Argument::value("amount", int()).validator(Arc::new(RangeValidator::between(1.0, 64.0))),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn validation_failure_names_the_argument() {
        match dispatch(&give(), "give Steve 65").unwrap_err() {
            DispatchError::Validation(err) => {
                assert_eq!(err.argument, "amount");
                assert!(err.to_string().contains("amount"), "{err}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_failure_names_token_and_type() {
        match dispatch(&give(), "give Steve 99999999999999999999").unwrap_err() {
            DispatchError::Parse(err) => {
                assert_eq!(err.token, "99999999999999999999");
                assert_eq!(err.expected, "integer");
                assert_eq!(err.position, 2);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn incomplete_input_lists_usages() {
        match dispatch(&give(), "give Steve").unwrap_err() {
            DispatchError::Match(MatchFailure::NoMatchingPathway { reason, closest, .. }) => {
                assert_eq!(reason, NoMatchReason::Incomplete);
                assert_eq!(closest, vec!["give <player> <amount>".to_string()]);
            }
            other => panic!("expected no matching pathway, got {other:?}"),
        }
    }

    #[test]
    fn trailing_input_is_rejected() {
        match dispatch(&give(), "give Steve 5 extra").unwrap_err() {
            DispatchError::Match(failure) => {
                assert!(matches!(
                    failure,
                    MatchFailure::NoMatchingPathway {
                        reason: NoMatchReason::TrailingInput,
                        ..
                    }
                ));
                assert_eq!(failure.position(), 3);
            }
            other => panic!("expected trailing input, got {other:?}"),
        }
    }
}

// ============================================
// Engine properties
// ============================================

mod engine {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layered() -> Command {
        let mut command = Command::builder("route").build().unwrap();
        for depth in 1..=6 {
            let mut builder = Pathway::builder();
            for i in 0..depth {
                builder = builder.argument(Argument::value(format!("w{i}"), word()).optional());
            }
            let pathway = builder
                .argument(Argument::literal(format!("stop{depth}")))
                .build()
                .unwrap();
            command.register_pathway(pathway).unwrap();
        }
        command
    }

    #[test]
    fn context_match_is_idempotent() {
        let command = layered();
        let config = DispatchConfig::default();
        let input = ArgumentInput::split("route a b stop2");
        let first = MatchEngine::context_match(&command, &input, &config);
        let second = MatchEngine::context_match(&command, &input, &config);
        assert!(first.is_ok());
        assert_eq!(first, second);
    }

    #[test]
    fn failing_search_stays_bounded() {
        let command = layered();
        let config = DispatchConfig::default();
        let line = format!("route {} nowhere", vec!["x"; 20].join(" "));
        let input = ArgumentInput::split(&line);
        let mut engine = MatchEngine::new(command.tree(), &input, &config);
        assert!(engine.run().is_err());
        let states = (command.tree().size() + 1) * (input.len() + 1);
        assert!(engine.visits() <= states * 3, "visits {}", engine.visits());
    }
}
