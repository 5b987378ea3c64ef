//! Dual-axis cursor over raw tokens and declared parameters.
//!
//! The raw axis walks the tokens the user typed; the parameter axis walks the
//! arguments a pathway declares. The two move independently because flags
//! and multi-token types break the one-token-one-parameter correspondence.
//! A third, character axis reads inside the current raw token using byte
//! offsets into the original line.
//!
//! Cloning a cursor is a deep copy: positions and per-token character offsets
//! are owned, so a clone can be advanced without disturbing the original.
//! Matching relies on this to explore sibling branches.

use std::borrow::Cow;

use serde::Serialize;

use crate::argument::Argument;
use crate::input::ArgumentInput;

/// Position on both axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct StreamPosition {
    pub raw: usize,
    pub parameter: usize,
}

impl StreamPosition {
    pub fn new(raw: usize, parameter: usize) -> Self {
        Self { raw, parameter }
    }
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: Cow<'a, ArgumentInput>,
    parameters: Vec<&'a Argument>,
    position: StreamPosition,
    /// Next unread byte in the line, one per raw token.
    offsets: Vec<usize>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a ArgumentInput) -> Self {
        Self::over(Cow::Borrowed(input))
    }

    /// A cursor over one token. Used to parse default values and the
    /// components of composite types.
    pub fn single(token: &str) -> Cursor<'static> {
        Cursor::over(Cow::Owned(ArgumentInput::from_tokens([token])))
    }

    fn over(input: Cow<'a, ArgumentInput>) -> Self {
        let offsets = (0..input.len())
            .map(|i| input.span(i).map(|s| s.start).unwrap_or_default())
            .collect();
        Self {
            input,
            parameters: Vec::new(),
            position: StreamPosition::default(),
            offsets,
        }
    }

    pub fn with_parameters<I>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = &'a Argument>,
    {
        self.parameters = parameters.into_iter().collect();
        self
    }

    pub fn input(&self) -> &ArgumentInput {
        &self.input
    }

    pub fn position(&self) -> StreamPosition {
        self.position
    }

    pub fn set_position(&mut self, position: StreamPosition) {
        self.position = StreamPosition {
            raw: position.raw.min(self.input.len()),
            parameter: position.parameter.min(self.parameters.len()),
        };
    }

    /// Advance both axes by one.
    pub fn skip(&mut self) {
        self.skip_raw(1);
        self.skip_parameter();
    }

    // ------------------------------------------------------------------
    // Raw axis
    // ------------------------------------------------------------------

    pub fn raw_len(&self) -> usize {
        self.input.len()
    }

    pub fn has_raw(&self) -> bool {
        self.position.raw < self.input.len()
    }

    pub fn current_raw(&self) -> Option<&str> {
        self.input.get(self.position.raw)
    }

    pub fn peek_raw(&self) -> Option<&str> {
        self.input.get(self.position.raw + 1)
    }

    pub fn prev_raw(&self) -> Option<&str> {
        self.position
            .raw
            .checked_sub(1)
            .and_then(|i| self.input.get(i))
    }

    pub fn pop_raw(&mut self) -> Option<&str> {
        let index = self.position.raw;
        if index >= self.input.len() {
            return None;
        }
        self.position.raw += 1;
        self.input.get(index)
    }

    pub fn skip_raw(&mut self, count: usize) {
        self.position.raw = (self.position.raw + count).min(self.input.len());
    }

    /// Tokens from the current raw position to the end.
    pub fn remaining_raw(&self) -> &[String] {
        let tokens = self.input.tokens();
        &tokens[self.position.raw.min(tokens.len())..]
    }

    /// Join the remaining tokens with single spaces and move to the end.
    pub fn collect_remaining_raw(&mut self) -> String {
        let text = self.remaining_raw().join(" ");
        self.position.raw = self.input.len();
        text
    }

    // ------------------------------------------------------------------
    // Parameter axis
    // ------------------------------------------------------------------

    pub fn parameters_len(&self) -> usize {
        self.parameters.len()
    }

    pub fn current_parameter(&self) -> Option<&'a Argument> {
        self.parameters.get(self.position.parameter).copied()
    }

    pub fn peek_parameter(&self) -> Option<&'a Argument> {
        self.parameters.get(self.position.parameter + 1).copied()
    }

    pub fn prev_parameter(&self) -> Option<&'a Argument> {
        self.position
            .parameter
            .checked_sub(1)
            .and_then(|i| self.parameters.get(i).copied())
    }

    pub fn pop_parameter(&mut self) -> Option<&'a Argument> {
        let current = self.current_parameter()?;
        self.position.parameter += 1;
        Some(current)
    }

    pub fn skip_parameter(&mut self) {
        self.position.parameter = (self.position.parameter + 1).min(self.parameters.len());
    }

    /// Drop a parameter from this cursor's view, keeping the position on the
    /// same logical parameter. Returns false when no parameter has that name.
    pub fn exempt(&mut self, name: &str) -> bool {
        let Some(index) = self.parameters.iter().position(|p| p.name() == name) else {
            return false;
        };
        self.parameters.remove(index);
        if index < self.position.parameter {
            self.position.parameter -= 1;
        }
        true
    }

    // ------------------------------------------------------------------
    // Character axis (inside the current raw token)
    // ------------------------------------------------------------------

    fn char_bounds(&self) -> Option<(usize, usize)> {
        let raw = self.position.raw;
        let span = self.input.span(raw)?;
        Some((self.offsets[raw], span.end))
    }

    pub fn current_char(&self) -> Option<char> {
        let (at, end) = self.char_bounds()?;
        self.input.line()[at..end].chars().next()
    }

    pub fn peek_char(&self) -> Option<char> {
        let (at, end) = self.char_bounds()?;
        self.input.line()[at..end].chars().nth(1)
    }

    pub fn prev_char(&self) -> Option<char> {
        let span = self.input.span(self.position.raw)?;
        let at = self.offsets[self.position.raw];
        self.input.line()[span.start..at].chars().next_back()
    }

    pub fn pop_char(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.offsets[self.position.raw] += c.len_utf8();
        Some(c)
    }

    /// Unread characters of the current token.
    pub fn remaining_in_token(&self) -> &str {
        match self.char_bounds() {
            Some((at, end)) => &self.input.line()[at..end],
            None => "",
        }
    }

    pub fn token_exhausted(&self) -> bool {
        self.remaining_in_token().is_empty()
    }

    /// Move past the next `ch` in the current token. False when absent, in
    /// which case the token is left exhausted.
    pub fn skip_till(&mut self, ch: char) -> bool {
        while let Some(c) = self.pop_char() {
            if c == ch {
                return true;
            }
        }
        false
    }

    /// Characters up to (not including) the next `ch`, consuming the
    /// delimiter. Returns the rest of the token when `ch` does not occur.
    pub fn collect_before_first(&mut self, ch: char) -> String {
        let mut collected = String::new();
        while let Some(c) = self.pop_char() {
            if c == ch {
                break;
            }
            collected.push(c);
        }
        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Argument;

    #[test]
    fn test_raw_axis_navigation() {
        let input = ArgumentInput::from_tokens(["give", "Steve", "diamond"]);
        let mut cursor = Cursor::new(&input);
        assert_eq!(cursor.current_raw(), Some("give"));
        assert_eq!(cursor.peek_raw(), Some("Steve"));
        assert_eq!(cursor.prev_raw(), None);
        assert_eq!(cursor.pop_raw(), Some("give"));
        assert_eq!(cursor.prev_raw(), Some("give"));
        assert_eq!(cursor.remaining_raw(), &["Steve", "diamond"]);
        assert_eq!(cursor.collect_remaining_raw(), "Steve diamond");
        assert!(!cursor.has_raw());
        assert_eq!(cursor.pop_raw(), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let input = ArgumentInput::from_tokens(["a", "bc"]);
        let mut original = Cursor::new(&input);
        original.skip_raw(1);
        let mut copy = original.clone();
        assert_eq!(copy.pop_char(), Some('b'));
        copy.skip_raw(1);
        assert_eq!(original.position(), StreamPosition::new(1, 0));
        assert_eq!(original.current_char(), Some('b'));
        assert_eq!(copy.position().raw, 2);
    }

    #[test]
    fn test_character_axis_reads_from_line() {
        let input = ArgumentInput::split("tp \"world;12;64\"");
        let mut cursor = Cursor::new(&input);
        cursor.skip_raw(1);
        assert_eq!(cursor.current_char(), Some('w'));
        assert_eq!(cursor.collect_before_first(';'), "world");
        assert_eq!(cursor.prev_char(), Some(';'));
        assert_eq!(cursor.peek_char(), Some('2'));
        assert!(cursor.skip_till(';'));
        assert_eq!(cursor.remaining_in_token(), "64");
        assert_eq!(cursor.collect_before_first(';'), "64");
        assert!(cursor.token_exhausted());
        assert!(!cursor.skip_till(';'));
    }

    #[test]
    fn test_parameter_axis_and_exempt() {
        let args = [
            Argument::value("player", std::sync::Arc::new(crate::types::StringType::word())),
            Argument::value("item", std::sync::Arc::new(crate::types::StringType::word())),
            Argument::value("amount", std::sync::Arc::new(crate::types::IntegerType)),
        ];
        let input = ArgumentInput::from_tokens(["give"]);
        let mut cursor = Cursor::new(&input).with_parameters(args.iter());
        assert_eq!(cursor.pop_parameter().map(Argument::name), Some("player"));
        cursor.skip_parameter();
        assert_eq!(cursor.current_parameter().map(Argument::name), Some("amount"));
        assert!(cursor.exempt("player"));
        assert_eq!(cursor.current_parameter().map(Argument::name), Some("amount"));
        assert_eq!(cursor.prev_parameter().map(Argument::name), Some("item"));
        assert!(!cursor.exempt("missing"));
        assert_eq!(cursor.parameters_len(), 2);
    }

    #[test]
    fn test_single_and_skip_both_axes() {
        let mut cursor = Cursor::single("5");
        assert_eq!(cursor.current_raw(), Some("5"));
        cursor.skip();
        assert!(!cursor.has_raw());
        cursor.set_position(StreamPosition::new(9, 9));
        assert_eq!(cursor.position(), StreamPosition::new(1, 0));
    }
}
