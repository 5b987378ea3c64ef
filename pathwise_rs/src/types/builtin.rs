use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ArgumentType, Classifier, ParseContext, Parsed, SharedType, Value, take_token};
use crate::cursor::Cursor;
use crate::error::ArgumentParseError;
use crate::priority::Priority;

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern"));
static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("decimal pattern")
});
static DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+[smhdw])+$").expect("duration pattern"));
static DURATION_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)([smhdw])").expect("duration part pattern"));

/// Free text. The single-token form is the fallback type; the greedy form
/// swallows the rest of the line.
#[derive(Debug, Clone, Default)]
pub struct StringType {
    greedy: bool,
}

impl StringType {
    pub fn word() -> Self {
        Self { greedy: false }
    }

    pub fn greedy() -> Self {
        Self { greedy: true }
    }
}

impl ArgumentType for StringType {
    fn name(&self) -> &str {
        if self.greedy { "text" } else { "string" }
    }

    fn classifier(&self) -> Classifier {
        Classifier::Fallback
    }

    fn priority(&self) -> Priority {
        Priority::LOW
    }

    fn is_greedy(&self) -> bool {
        self.greedy
    }

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        _context: &ParseContext<'_>,
    ) -> Result<Parsed, ArgumentParseError> {
        if !self.greedy {
            return take_token(cursor, self.name()).map(|t| Parsed::single(Value::Text(t)));
        }
        let rest = cursor.remaining_raw();
        if rest.is_empty() {
            return Err(ArgumentParseError::new("", self.name(), "missing value"));
        }
        let consumed = rest.len();
        let text = rest.join(" ");
        cursor.skip_raw(consumed);
        Ok(Parsed {
            value: Value::Text(text),
            consumed,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegerType;

impl ArgumentType for IntegerType {
    fn name(&self) -> &str {
        "integer"
    }

    fn matches_input(&self, token: &str) -> bool {
        INTEGER.is_match(token)
    }

    fn priority(&self) -> Priority {
        Priority::HIGH
    }

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        _context: &ParseContext<'_>,
    ) -> Result<Parsed, ArgumentParseError> {
        let token = take_token(cursor, self.name())?;
        if !INTEGER.is_match(&token) {
            return Err(ArgumentParseError::new(token, self.name(), "not a whole number"));
        }
        token
            .parse::<i64>()
            .map(|n| Parsed::single(Value::Integer(n)))
            .map_err(|_| ArgumentParseError::new(token.clone(), self.name(), "out of range"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecimalType;

impl ArgumentType for DecimalType {
    fn name(&self) -> &str {
        "decimal"
    }

    fn matches_input(&self, token: &str) -> bool {
        DECIMAL.is_match(token)
    }

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        _context: &ParseContext<'_>,
    ) -> Result<Parsed, ArgumentParseError> {
        let token = take_token(cursor, self.name())?;
        match token.parse::<f64>() {
            Ok(n) if n.is_finite() && DECIMAL.is_match(&token) => {
                Ok(Parsed::single(Value::Decimal(n)))
            }
            _ => Err(ArgumentParseError::new(token, self.name(), "not a number")),
        }
    }
}

/// `true`/`false`, optionally accepting yes/no style variants.
#[derive(Debug, Clone, Default)]
pub struct BooleanType {
    variants: bool,
}

impl BooleanType {
    pub fn strict() -> Self {
        Self { variants: false }
    }

    pub fn with_variants() -> Self {
        Self { variants: true }
    }

    fn interpret(&self, token: &str) -> Option<bool> {
        match token.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            "yes" | "y" | "on" | "t" | "enabled" if self.variants => Some(true),
            "no" | "n" | "off" | "f" | "disabled" if self.variants => Some(false),
            _ => None,
        }
    }
}

impl ArgumentType for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn identity(&self) -> String {
        if self.variants {
            "boolean+variants".to_string()
        } else {
            "boolean".to_string()
        }
    }

    fn matches_input(&self, token: &str) -> bool {
        self.interpret(token).is_some()
    }

    fn priority(&self) -> Priority {
        Priority::HIGH
    }

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        _context: &ParseContext<'_>,
    ) -> Result<Parsed, ArgumentParseError> {
        let token = take_token(cursor, self.name())?;
        self.interpret(&token)
            .map(|b| Parsed::single(Value::Boolean(b)))
            .ok_or_else(|| ArgumentParseError::new(token, self.name(), "expected true or false"))
    }

    fn suggestions(&self) -> Vec<String> {
        let mut out = vec!["true".to_string(), "false".to_string()];
        if self.variants {
            out.extend(["yes", "no", "on", "off"].map(String::from));
        }
        out
    }
}

/// One of a fixed, case-insensitive set of words.
#[derive(Debug, Clone)]
pub struct ChoiceType {
    name: String,
    choices: Vec<String>,
}

impl ChoiceType {
    pub fn new<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    fn canonical(&self, token: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(token))
            .map(String::as_str)
    }
}

impl ArgumentType for ChoiceType {
    fn name(&self) -> &str {
        &self.name
    }

    fn identity(&self) -> String {
        let mut choices: Vec<String> = self.choices.iter().map(|c| c.to_ascii_lowercase()).collect();
        choices.sort();
        format!("{}({})", self.name, choices.join("|"))
    }

    fn matches_input(&self, token: &str) -> bool {
        self.canonical(token).is_some()
    }

    fn priority(&self) -> Priority {
        Priority::HIGH
    }

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        _context: &ParseContext<'_>,
    ) -> Result<Parsed, ArgumentParseError> {
        let token = take_token(cursor, &self.name)?;
        match self.canonical(&token) {
            Some(choice) => Ok(Parsed::single(Value::Text(choice.to_string()))),
            None => Err(ArgumentParseError::new(
                token,
                self.name.clone(),
                format!("expected one of {}", self.choices.join(", ")),
            )),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        self.choices.clone()
    }
}

/// Compact durations such as `30s`, `1h30m` or `2d`.
#[derive(Debug, Clone, Default)]
pub struct DurationType;

impl ArgumentType for DurationType {
    fn name(&self) -> &str {
        "duration"
    }

    fn matches_input(&self, token: &str) -> bool {
        DURATION.is_match(token)
    }

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        _context: &ParseContext<'_>,
    ) -> Result<Parsed, ArgumentParseError> {
        let token = take_token(cursor, self.name())?;
        if !DURATION.is_match(&token) {
            return Err(ArgumentParseError::new(
                token,
                self.name(),
                "expected a duration like 30s, 5m or 1h30m",
            ));
        }
        let mut secs: u64 = 0;
        for part in DURATION_PART.captures_iter(&token) {
            let amount: u64 = part[1]
                .parse()
                .map_err(|_| ArgumentParseError::new(token.clone(), "duration", "out of range"))?;
            let unit = match part[2].to_ascii_lowercase().as_str() {
                "s" => 1,
                "m" => 60,
                "h" => 3_600,
                "d" => 86_400,
                _ => 604_800,
            };
            secs = amount
                .checked_mul(unit)
                .and_then(|s| secs.checked_add(s))
                .ok_or_else(|| ArgumentParseError::new(token.clone(), "duration", "out of range"))?;
        }
        Ok(Parsed::single(Value::Duration(Duration::from_secs(secs))))
    }

    fn suggestions(&self) -> Vec<String> {
        ["30s", "5m", "1h", "1d"].map(String::from).to_vec()
    }
}

/// A composite of named components.
///
/// The delimited form packs every component into one raw token
/// (`world;12;64;12`) and walks it with the cursor's character axis. The
/// spread form takes one raw token per component.
#[derive(Debug, Clone)]
pub struct RecordType {
    name: String,
    delimiter: Option<char>,
    fields: Vec<(String, SharedType)>,
}

impl RecordType {
    pub fn delimited(
        name: impl Into<String>,
        delimiter: char,
        fields: Vec<(String, SharedType)>,
    ) -> Self {
        Self {
            name: name.into(),
            delimiter: Some(delimiter),
            fields,
        }
    }

    pub fn spread(name: impl Into<String>, fields: Vec<(String, SharedType)>) -> Self {
        Self {
            name: name.into(),
            delimiter: None,
            fields,
        }
    }

    fn parse_component(
        &self,
        index: usize,
        piece: &str,
        context: &ParseContext<'_>,
    ) -> Result<Value, ArgumentParseError> {
        let (field, ty) = &self.fields[index];
        let mut single = Cursor::single(piece);
        let inner = ParseContext {
            argument: field,
            ..*context
        };
        ty.parse(&mut single, &inner)
            .map(|parsed| parsed.value)
            .map_err(|err| {
                ArgumentParseError::new(piece, self.name.clone(), format!("{}: {}", field, err.reason))
            })
    }
}

impl ArgumentType for RecordType {
    fn name(&self) -> &str {
        &self.name
    }

    fn identity(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(field, ty)| format!("{}:{}", field, ty.identity()))
            .collect();
        let delimiter = self.delimiter.map(String::from).unwrap_or_default();
        format!("{}{{{}|{}}}", self.name, delimiter, fields.join(","))
    }

    fn matches_input(&self, token: &str) -> bool {
        match self.delimiter {
            Some(d) => {
                let pieces: Vec<&str> = token.split(d).collect();
                pieces.len() == self.fields.len()
                    && pieces
                        .iter()
                        .zip(&self.fields)
                        .all(|(piece, (_, ty))| ty.matches_input(piece))
            }
            None => self
                .fields
                .first()
                .is_some_and(|(_, ty)| ty.matches_input(token)),
        }
    }

    fn arity(&self) -> usize {
        match self.delimiter {
            Some(_) => 1,
            None => self.fields.len().max(1),
        }
    }

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        context: &ParseContext<'_>,
    ) -> Result<Parsed, ArgumentParseError> {
        let mut values = Vec::with_capacity(self.fields.len());
        match self.delimiter {
            Some(d) => {
                let token = cursor.current_raw().unwrap_or_default().to_string();
                for index in 0..self.fields.len() {
                    if cursor.token_exhausted() {
                        return Err(ArgumentParseError::new(
                            token,
                            self.name.clone(),
                            format!("expected {} components", self.fields.len()),
                        ));
                    }
                    let piece = cursor.collect_before_first(d);
                    values.push((self.fields[index].0.clone(), self.parse_component(index, &piece, context)?));
                }
                if !cursor.token_exhausted() {
                    return Err(ArgumentParseError::new(
                        token,
                        self.name.clone(),
                        format!("expected {} components", self.fields.len()),
                    ));
                }
                cursor.skip_raw(1);
                Ok(Parsed::single(Value::Record(values)))
            }
            None => {
                for index in 0..self.fields.len() {
                    let piece = take_token(cursor, &self.name)?;
                    values.push((self.fields[index].0.clone(), self.parse_component(index, &piece, context)?));
                }
                Ok(Parsed {
                    value: Value::Record(values),
                    consumed: self.fields.len(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::input::ArgumentInput;
    use crate::source::ConsoleSource;

    fn parse_with(ty: &dyn ArgumentType, tokens: &[&str]) -> Result<Parsed, ArgumentParseError> {
        let input = ArgumentInput::from_tokens(tokens.iter().copied());
        let mut cursor = Cursor::new(&input);
        let source = ConsoleSource;
        let context = ParseContext {
            argument: "arg",
            source: &source,
        };
        ty.parse(&mut cursor, &context)
    }

    #[test]
    fn test_integer_shape_and_parse() {
        assert!(IntegerType.matches_input("-42"));
        assert!(!IntegerType.matches_input("4.2"));
        assert!(!IntegerType.matches_input("diamond"));
        let parsed = parse_with(&IntegerType, &["17"]).unwrap();
        assert_eq!(parsed, Parsed::single(Value::Integer(17)));
        let overflow = parse_with(&IntegerType, &["99999999999999999999"]).unwrap_err();
        assert_eq!(overflow.reason, "out of range");
    }

    #[test]
    fn test_decimal_accepts_integers_and_fractions() {
        assert!(DecimalType.matches_input("12"));
        assert!(DecimalType.matches_input("-.5"));
        assert!(!DecimalType.matches_input("nan"));
        let parsed = parse_with(&DecimalType, &["2.5"]).unwrap();
        assert_eq!(parsed.value, Value::Decimal(2.5));
    }

    #[test]
    fn test_boolean_variants() {
        let strict = BooleanType::strict();
        assert!(!strict.matches_input("yes"));
        let loose = BooleanType::with_variants();
        assert!(loose.matches_input("YES"));
        let parsed = parse_with(&loose, &["off"]).unwrap();
        assert_eq!(parsed.value, Value::Boolean(false));
    }

    #[test]
    fn test_choice_is_case_insensitive_and_canonical() {
        let mode = ChoiceType::new("gamemode", ["survival", "creative"]);
        assert!(mode.matches_input("CREATIVE"));
        let parsed = parse_with(&mode, &["Creative"]).unwrap();
        assert_eq!(parsed.value, Value::from("creative"));
        let err = parse_with(&mode, &["spectator"]).unwrap_err();
        assert!(err.reason.contains("survival, creative"));
    }

    #[test]
    fn test_duration_sums_units() {
        assert!(DurationType.matches_input("1h30m"));
        assert!(!DurationType.matches_input("griefing"));
        let parsed = parse_with(&DurationType, &["1h30m"]).unwrap();
        assert_eq!(parsed.value, Value::Duration(Duration::from_secs(5_400)));
    }

    #[test]
    fn test_greedy_string_consumes_rest() {
        let parsed = parse_with(&StringType::greedy(), &["for", "being", "rude"]).unwrap();
        assert_eq!(parsed.consumed, 3);
        assert_eq!(parsed.value, Value::from("for being rude"));
    }

    #[test]
    fn test_delimited_record_reads_characters() {
        let location = RecordType::delimited(
            "location",
            ';',
            vec![
                ("world".to_string(), Arc::new(StringType::word()) as SharedType),
                ("x".to_string(), Arc::new(DecimalType) as SharedType),
                ("y".to_string(), Arc::new(DecimalType) as SharedType),
                ("z".to_string(), Arc::new(DecimalType) as SharedType),
            ],
        );
        assert!(location.matches_input("world;12;64;12"));
        assert!(!location.matches_input("world;12;64"));
        let parsed = parse_with(&location, &["world;12;64;12"]).unwrap();
        assert_eq!(parsed.consumed, 1);
        assert_eq!(parsed.value.field("world"), Some(&Value::from("world")));
        assert_eq!(parsed.value.field("y"), Some(&Value::Decimal(64.0)));
    }

    #[test]
    fn test_spread_record_consumes_one_token_per_field() {
        let point = RecordType::spread(
            "point",
            vec![
                ("x".to_string(), Arc::new(IntegerType) as SharedType),
                ("y".to_string(), Arc::new(IntegerType) as SharedType),
            ],
        );
        assert_eq!(point.arity(), 2);
        let parsed = parse_with(&point, &["3", "4"]).unwrap();
        assert_eq!(parsed.consumed, 2);
        let err = parse_with(&point, &["3", "four"]).unwrap_err();
        assert!(err.reason.starts_with("y:"));
    }
}
