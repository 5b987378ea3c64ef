//! Tokenised command input.
//!
//! An [`ArgumentInput`] keeps the original line next to its raw tokens and the
//! byte span each token occupies in that line, so the character axis of the
//! [`Cursor`](crate::cursor::Cursor) can read straight from the line.

use std::ops::Range;

/// Raw tokens of one invocation plus their spans in the original line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentInput {
    line: String,
    tokens: Vec<String>,
    spans: Vec<Range<usize>>,
    trailing_space: bool,
}

impl ArgumentInput {
    /// Wrap an already split line.
    ///
    /// Span offsets are computed by walking the line: whitespace is skipped,
    /// a quoted token starts after its opening quote and ends at the matching
    /// close. When the tokens cannot be located in `line` the input falls back
    /// to a line rebuilt from the tokens.
    pub fn new(line: impl Into<String>, tokens: Vec<String>) -> Self {
        let line = line.into();
        match locate_spans(&line, &tokens) {
            Some(spans) => Self {
                trailing_space: ends_with_whitespace(&line),
                line,
                tokens,
                spans,
            },
            None => {
                tracing::debug!(line = %line, "tokens do not match input line, rebuilding");
                let mut rebuilt = Self::from_tokens(tokens);
                rebuilt.trailing_space = ends_with_whitespace(&line);
                rebuilt
            }
        }
    }

    /// Build an input whose line is the tokens joined by single spaces.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let mut line = String::new();
        let mut spans = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            let start = line.len();
            line.push_str(token);
            spans.push(start..line.len());
        }
        Self {
            line,
            tokens,
            spans,
            trailing_space: false,
        }
    }

    /// Split a line on whitespace. Single or double quotes group a token and
    /// are not part of it; an unterminated quote runs to the end of the line.
    pub fn split(line: &str) -> Self {
        let mut tokens = Vec::new();
        let mut spans = Vec::new();
        let mut chars = line.char_indices().peekable();

        while let Some(&(start, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }
            if c == '"' || c == '\'' {
                chars.next();
                let open = start + c.len_utf8();
                let mut close = line.len();
                for (i, next) in chars.by_ref() {
                    if next == c {
                        close = i;
                        break;
                    }
                }
                tokens.push(line[open..close].to_string());
                spans.push(open..close);
                continue;
            }
            let mut end = line.len();
            while let Some(&(i, next)) = chars.peek() {
                if next.is_whitespace() {
                    end = i;
                    break;
                }
                chars.next();
            }
            tokens.push(line[start..end].to_string());
            spans.push(start..end);
        }

        Self {
            line: line.to_string(),
            tokens,
            spans,
            trailing_space: ends_with_whitespace(line),
        }
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Byte range of token `index` inside [`line`](Self::line).
    pub fn span(&self, index: usize) -> Option<Range<usize>> {
        self.spans.get(index).cloned()
    }

    /// True when the line ends in whitespace, i.e. the user started a new token.
    pub fn ends_with_space(&self) -> bool {
        self.trailing_space
    }

    /// Tokens in `range` joined by single spaces.
    pub fn join(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.tokens.len());
        let start = range.start.min(end);
        self.tokens[start..end].join(" ")
    }
}

fn ends_with_whitespace(line: &str) -> bool {
    line.chars().last().is_some_and(char::is_whitespace)
}

fn locate_spans(line: &str, tokens: &[String]) -> Option<Vec<Range<usize>>> {
    let bytes = line.as_bytes();
    let mut pos = 0;
    let mut spans = Vec::with_capacity(tokens.len());
    for token in tokens {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let quote = bytes.get(pos).copied().filter(|b| *b == b'"' || *b == b'\'');
        let range = match quote {
            Some(q) if !token.starts_with(q as char) => {
                let open = pos + 1;
                let close = line[open..]
                    .find(q as char)
                    .map(|i| open + i)
                    .unwrap_or(line.len());
                pos = (close + 1).min(line.len());
                open..close
            }
            _ => {
                let start = pos;
                pos += token.len();
                start..pos
            }
        };
        if line.get(range.clone()) != Some(token.as_str()) {
            return None;
        }
        spans.push(range);
    }
    Some(spans)
}
