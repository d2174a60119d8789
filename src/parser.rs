use std::mem;

use csvline_core::FieldMachine;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::Record;

/// The delimiter used when none is configured.
pub const DEFAULT_DELIMITER: char = ',';

/// The configuration of a [`FieldParser`](struct.FieldParser.html).
///
/// With the `serde` feature enabled, this can be loaded from an
/// application's own configuration file. Missing keys take their default
/// values.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParserConfig {
    /// The field delimiter. Defaults to `,`.
    pub delimiter: char,
    /// Treat quote characters as ordinary characters. Defaults to `false`.
    pub ignore_quotes: bool,
    /// Trim leading and trailing whitespace and control characters from
    /// every field. Defaults to `false`.
    pub trim: bool,
    /// Drop null fields from the result. Defaults to `false`.
    pub filter_empty: bool,
    /// The number of columns every line must have, if known. Defaults to
    /// `None`.
    pub columns: Option<usize>,
    /// Pad short lines with empty strings instead of failing. Defaults to
    /// `false`.
    pub tolerate_missing_columns: bool,
}

impl Default for ParserConfig {
    fn default() -> ParserConfig {
        ParserConfig {
            delimiter: DEFAULT_DELIMITER,
            ignore_quotes: false,
            trim: false,
            filter_empty: false,
            columns: None,
            tolerate_missing_columns: false,
        }
    }
}

/// Builds a field parser with various configuration knobs.
///
/// Once a `FieldParser` is built, its configuration cannot be changed.
#[derive(Clone, Debug, Default)]
pub struct FieldParserBuilder {
    config: ParserConfig,
}

impl FieldParserBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> FieldParserBuilder {
        FieldParserBuilder::default()
    }

    /// Create a new builder starting from an existing configuration.
    pub fn from_config(config: ParserConfig) -> FieldParserBuilder {
        FieldParserBuilder { config }
    }

    /// Build a field parser from this configuration.
    pub fn build(&self) -> FieldParser {
        FieldParser { config: self.config.clone() }
    }

    /// The field delimiter.
    ///
    /// The default is `,`.
    pub fn delimiter(&mut self, delimiter: char) -> &mut FieldParserBuilder {
        self.config.delimiter = delimiter;
        self
    }

    /// Set the delimiter from its textual form: either a single character or
    /// a `\uXXXX` escape.
    ///
    /// ```
    /// use csvline::FieldParserBuilder;
    ///
    /// let parser = FieldParserBuilder::new()
    ///     .delimiter_str("\\u0009")
    ///     .unwrap()
    ///     .build();
    /// assert_eq!(parser.config().delimiter, '\t');
    /// ```
    pub fn delimiter_str(
        &mut self,
        delimiter: &str,
    ) -> Result<&mut FieldParserBuilder> {
        self.config.delimiter = parse_delimiter(delimiter)?;
        Ok(self)
    }

    /// Treat quote characters as ordinary characters.
    pub fn ignore_quotes(&mut self, yes: bool) -> &mut FieldParserBuilder {
        self.config.ignore_quotes = yes;
        self
    }

    /// Trim every field.
    ///
    /// Trimming removes every leading and trailing character that is a space
    /// or an ASCII control character. It is disabled by default. Trimming
    /// happens before empty fields are normalized to null, so a field made
    /// only of spaces becomes null.
    pub fn trim(&mut self, yes: bool) -> &mut FieldParserBuilder {
        self.config.trim = yes;
        self
    }

    /// Drop null fields from the result.
    pub fn filter_empty(&mut self, yes: bool) -> &mut FieldParserBuilder {
        self.config.filter_empty = yes;
        self
    }

    /// The number of columns every line must have.
    ///
    /// When set, a line with a different number of fields is an error,
    /// unless `tolerate_missing_columns` is enabled.
    pub fn columns(&mut self, columns: Option<usize>) -> &mut FieldParserBuilder {
        self.config.columns = columns;
        self
    }

    /// Pad lines with fewer fields than `columns` with empty strings.
    ///
    /// Lines with more fields are returned as is. This has no effect unless
    /// `columns` is set.
    pub fn tolerate_missing_columns(
        &mut self,
        yes: bool,
    ) -> &mut FieldParserBuilder {
        self.config.tolerate_missing_columns = yes;
        self
    }
}

/// Splits one logical line into fields.
///
/// A field parser has no state between lines, so a single parser can be used
/// for any number of lines and shared freely between threads.
///
/// # Example
///
/// ```
/// use csvline::FieldParserBuilder;
///
/// let parser = FieldParserBuilder::new().columns(Some(3)).build();
/// let record = parser.parse_line(r#"a,"b,c","""quoted""""#).unwrap().unwrap();
/// assert_eq!(record.get(0), Some("a"));
/// assert_eq!(record.get(1), Some("b,c"));
/// assert_eq!(record.get(2), Some("\"quoted\""));
///
/// let err = parser.parse_line("a,b").unwrap_err();
/// assert_eq!(err.to_string(), "expected 3 columns but found 2");
/// ```
#[derive(Clone, Debug, Default)]
pub struct FieldParser {
    config: ParserConfig,
}

impl FieldParser {
    /// Create a new field parser with the default configuration.
    pub fn new() -> FieldParser {
        FieldParserBuilder::new().build()
    }

    /// Create a new field parser with the default configuration and the
    /// given delimiter.
    pub fn with_delimiter(delimiter: char) -> FieldParser {
        FieldParserBuilder::new().delimiter(delimiter).build()
    }

    /// Create a field parser from a configuration value.
    pub fn from_config(config: ParserConfig) -> FieldParser {
        FieldParser { config }
    }

    /// Returns this parser's configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a single logical line into fields.
    ///
    /// Empty fields become `None`. An empty line has no data and returns
    /// `None`, as does a line whose fields are all dropped by
    /// `filter_empty`. A line made of a single delimiter still yields two
    /// null fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::MismatchedQuotes` if the line ends inside a quoted
    /// field, and `Error::ColumnCount` if the number of fields does not match
    /// the configured column count and missing columns are not tolerated.
    pub fn parse_line(&self, line: &str) -> Result<Option<Record>> {
        if line.is_empty() {
            return Ok(None);
        }
        let mut machine = FieldMachine::new(self.config.delimiter)
            .ignore_quotes(self.config.ignore_quotes);
        let mut fields = vec![];
        let mut field = String::new();
        for c in line.chars() {
            let step = machine.feed(c);
            if let Some(ch) = step.char() {
                field.push(ch);
            }
            if step.is_field_end() {
                self.push_field(&mut fields, mem::replace(&mut field, String::new()));
            }
        }
        machine.finish()?;
        self.push_field(&mut fields, field);

        if let Some(expected) = self.config.columns {
            if self.config.tolerate_missing_columns {
                if fields.len() < expected {
                    fields.resize(expected, Some(String::new()));
                }
            } else if fields.len() != expected {
                return Err(Error::ColumnCount { expected, found: fields.len() });
            }
        }
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(Record::from(fields)))
    }

    fn push_field(&self, fields: &mut Vec<Option<String>>, field: String) {
        let field = if self.config.trim { trim(field) } else { field };
        if field.is_empty() {
            if !self.config.filter_empty {
                fields.push(None);
            }
        } else {
            fields.push(Some(field));
        }
    }
}

fn trim(field: String) -> String {
    let trimmed = field.trim_matches(|c: char| c <= ' ');
    if trimmed.len() == field.len() {
        field
    } else {
        trimmed.to_string()
    }
}

/// Parse a delimiter from its textual form.
///
/// The text must be either a single character or a `\u` escape followed by
/// exactly four hex digits.
///
/// ```
/// use csvline::parse_delimiter;
///
/// assert_eq!(parse_delimiter("|").unwrap(), '|');
/// assert_eq!(parse_delimiter("\\u00A6").unwrap(), '\u{00A6}');
/// assert!(parse_delimiter("||").is_err());
/// ```
pub fn parse_delimiter(delimiter: &str) -> Result<char> {
    let mut chars = delimiter.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(c);
    }
    let invalid = || Error::Delimiter(delimiter.to_string());
    if !delimiter.starts_with("\\u") {
        return Err(invalid());
    }
    let hex = &delimiter[2..];
    if hex.len() != 4 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(std::char::from_u32)
        .ok_or_else(invalid)
}

/// The outcome of a lenient parse.
///
/// A lenient parse never fails. When something goes wrong, `fields` is empty
/// and `error` says why.
#[derive(Debug, Default)]
pub struct Lenient {
    /// The parsed fields, or nothing if parsing failed.
    pub fields: Vec<Option<String>>,
    /// The error that was swallowed, if any.
    pub error: Option<Error>,
}

impl Lenient {
    /// Returns true if the parse succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Discard the diagnostics and return only the fields.
    pub fn into_fields(self) -> Vec<Option<String>> {
        self.fields
    }
}

/// Parse a single line without ever failing.
///
/// This is a convenience for callers that treat delimited text as a loose
/// list of values, such as a comma separated attribute. The delimiter is
/// given in textual form (see [`parse_delimiter`](fn.parse_delimiter.html)),
/// values are always trimmed and null values are dropped when
/// `filter_empty` is set.
///
/// Any failure, including an invalid delimiter or mismatched quotes, is
/// logged as a warning and yields an empty list. The error is kept in the
/// returned value for callers that want it. Use
/// [`FieldParser::parse_line`](struct.FieldParser.html#method.parse_line)
/// for strict parsing.
///
/// ```
/// use csvline::parse_line_lenient;
///
/// let parsed = parse_line_lenient(",", " a, b ,,c ", true);
/// assert_eq!(
///     parsed.fields,
///     vec![Some("a".to_string()), Some("b".to_string()), Some("c".to_string())],
/// );
///
/// let parsed = parse_line_lenient(",", "a,\"b", true);
/// assert!(parsed.fields.is_empty());
/// assert!(!parsed.is_ok());
/// ```
pub fn parse_line_lenient(
    delimiter: &str,
    src: &str,
    filter_empty: bool,
) -> Lenient {
    let parsed = parse_delimiter(delimiter).and_then(|delimiter| {
        FieldParserBuilder::new()
            .delimiter(delimiter)
            .trim(true)
            .filter_empty(filter_empty)
            .build()
            .parse_line(src)
    });
    match parsed {
        Ok(Some(record)) => {
            Lenient { fields: record.into_inner(), error: None }
        }
        Ok(None) => Lenient::default(),
        Err(err) => {
            warn!(
                error = %err,
                delimiter,
                "lenient parse failed, returning no values"
            );
            Lenient { fields: vec![], error: Some(err) }
        }
    }
}
