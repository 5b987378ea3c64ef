//! Flag token recognition.
//!
//! Each pathway owns a [`FlagExtractor`]: a character trie over every flag
//! name and alias. A token such as `-fs` is decomposed by repeatedly taking
//! the longest alias that matches at the current offset, so `--force`,
//! `-f` and the compact `-fs` all resolve through the same structure.

use std::collections::BTreeMap;

use crate::argument::FlagData;
use crate::error::{RegistrationError, UnknownFlagError};

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    flag: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct FlagExtractor {
    flags: Vec<FlagData>,
    root: TrieNode,
}

impl FlagExtractor {
    /// Index every name and alias. `usage` only feeds the error message.
    pub fn new(flags: Vec<FlagData>, usage: &str) -> Result<Self, RegistrationError> {
        let mut root = TrieNode::default();
        for (index, flag) in flags.iter().enumerate() {
            for spelling in flag.names() {
                if spelling.is_empty() {
                    return Err(RegistrationError::EmptyName("flag"));
                }
                let mut node = &mut root;
                for c in spelling.chars() {
                    node = node.children.entry(c).or_default();
                }
                if node.flag.is_some() {
                    return Err(RegistrationError::DuplicateFlag {
                        alias: spelling.to_string(),
                        usage: usage.to_string(),
                    });
                }
                node.flag = Some(index);
            }
        }
        Ok(Self { flags, root })
    }

    pub fn flags(&self) -> &[FlagData] {
        &self.flags
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flag by canonical name.
    pub fn find(&self, name: &str) -> Option<&FlagData> {
        self.flags.iter().find(|f| f.name() == name)
    }

    /// Exact lookup of a single `-x` / `--name` token.
    pub fn classify(&self, token: &str) -> Option<&FlagData> {
        if !looks_like_flag(token) {
            return None;
        }
        let mut node = &self.root;
        for c in strip_flag_prefix(token).chars() {
            node = node.children.get(&c)?;
        }
        node.flag.map(|i| &self.flags[i])
    }

    /// Decompose a flag token into the flags it names, longest match first.
    ///
    /// Repeated flags are reported once, in first-seen order. Any character
    /// not covered by a name or alias makes the whole token fail.
    pub fn extract(&self, token: &str) -> Result<Vec<&FlagData>, UnknownFlagError> {
        let body: Vec<char> = strip_flag_prefix(token).chars().collect();
        let mut found: Vec<usize> = Vec::new();
        let mut unknown: Vec<String> = Vec::new();
        let mut i = 0;

        while i < body.len() {
            let mut node = &self.root;
            let mut best: Option<(usize, usize)> = None;
            for (offset, c) in body[i..].iter().enumerate() {
                match node.children.get(c) {
                    Some(next) => {
                        node = next;
                        if let Some(flag) = node.flag {
                            best = Some((flag, offset + 1));
                        }
                    }
                    None => break,
                }
            }
            match best {
                Some((flag, len)) => {
                    if !found.contains(&flag) {
                        found.push(flag);
                    }
                    i += len;
                }
                None => {
                    unknown.push(body[i].to_string());
                    i += 1;
                }
            }
        }

        if !unknown.is_empty() || found.is_empty() {
            return Err(UnknownFlagError {
                token: token.to_string(),
                unknown: if unknown.is_empty() {
                    token.to_string()
                } else {
                    unknown.join(", ")
                },
                recognised: found.len(),
            });
        }
        Ok(found.into_iter().map(|i| &self.flags[i]).collect())
    }
}

/// `-x`, `--name`, `-abc`. Negative numbers and bare dashes are not flags.
pub fn looks_like_flag(token: &str) -> bool {
    token.starts_with('-')
        && strip_flag_prefix(token)
            .chars()
            .next()
            .is_some_and(char::is_alphabetic)
}

pub fn strip_flag_prefix(token: &str) -> &str {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::DurationType;

    fn ban_flags() -> FlagExtractor {
        FlagExtractor::new(
            vec![
                FlagData::switch("force").alias("f"),
                FlagData::switch("silent").alias("s"),
                FlagData::valued("time", Arc::new(DurationType)).alias("t"),
            ],
            "ban <player>",
        )
        .unwrap()
    }

    fn names(flags: Vec<&FlagData>) -> Vec<&str> {
        flags.into_iter().map(FlagData::name).collect()
    }

    #[test]
    fn test_single_and_long_forms() {
        let ex = ban_flags();
        assert_eq!(names(ex.extract("-f").unwrap()), vec!["force"]);
        assert_eq!(names(ex.extract("--force").unwrap()), vec!["force"]);
        assert_eq!(ex.classify("-t").map(FlagData::name), Some("time"));
        assert!(ex.classify("-fs").is_none());
    }

    #[test]
    fn test_compact_token_decomposes() {
        let ex = ban_flags();
        assert_eq!(names(ex.extract("-fs").unwrap()), vec!["force", "silent"]);
        assert_eq!(names(ex.extract("-ff").unwrap()), vec!["force"]);
    }

    #[test]
    fn test_unknown_characters_fail_the_token() {
        let ex = ban_flags();
        let err = ex.extract("-fx").unwrap_err();
        assert_eq!(err.unknown, "x");
        assert_eq!(err.recognised, 1);
        let err = ex.extract("-zq").unwrap_err();
        assert_eq!(err.unknown, "z, q");
        assert_eq!(err.recognised, 0);
    }

    #[test]
    fn test_longest_match_wins() {
        let ex = FlagExtractor::new(
            vec![
                FlagData::switch("all").alias("a"),
                FlagData::switch("allow-empty").alias("ae"),
            ],
            "commit",
        )
        .unwrap();
        assert_eq!(names(ex.extract("-ae").unwrap()), vec!["allow-empty"]);
        assert_eq!(names(ex.extract("--all").unwrap()), vec!["all"]);
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let err = FlagExtractor::new(
            vec![
                FlagData::switch("force").alias("f"),
                FlagData::switch("fast").alias("f"),
            ],
            "run",
        )
        .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateFlag {
                alias: "f".into(),
                usage: "run".into()
            }
        );
    }

    #[test]
    fn test_flag_shape() {
        assert!(looks_like_flag("-f"));
        assert!(looks_like_flag("--force"));
        assert!(!looks_like_flag("-5"));
        assert!(!looks_like_flag("-.5"));
        assert!(!looks_like_flag("--"));
        assert!(!looks_like_flag("-"));
        assert!(!looks_like_flag("force"));
    }
}
