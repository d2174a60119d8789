use std::borrow::Cow;

use csvline_core::{
    is_formula, needs_quotes, FORMULA_ESCAPE, FORMULA_TRIGGERS, QUOTE,
};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{Error, Result};
use crate::parser::DEFAULT_DELIMITER;
#[cfg(feature = "serde")]
use crate::serializer::serialize;

/// The record terminator written between records.
pub const CRLF: &str = "\r\n";

/// The text written for a null value.
const NULL: &str = "null";

/// Escape a value that a spreadsheet application would evaluate as a
/// formula.
///
/// Values starting with `=`, `@`, `+` or `-` get a leading `'`. Every other
/// value is returned unchanged.
///
/// ```
/// use csvline::escape_formula_injection;
///
/// assert_eq!(escape_formula_injection("=SUM(A1:A2)"), "'=SUM(A1:A2)");
/// assert_eq!(escape_formula_injection("plain"), "plain");
/// ```
pub fn escape_formula_injection(value: &str) -> Cow<str> {
    if is_formula(value) {
        let mut escaped = String::with_capacity(value.len() + 1);
        escaped.push(FORMULA_ESCAPE);
        escaped.push_str(value);
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(value)
    }
}

/// Undo [`escape_formula_injection`](fn.escape_formula_injection.html).
///
/// Exactly one leading `'` is removed, and only when it is followed by one of
/// the formula trigger characters. This is meant for showing values read
/// back from a file this crate wrote.
///
/// ```
/// use csvline::unescape_formula_injection;
///
/// assert_eq!(unescape_formula_injection("'=SUM(A1:A2)"), "=SUM(A1:A2)");
/// assert_eq!(unescape_formula_injection("'quoted'"), "'quoted'");
/// ```
pub fn unescape_formula_injection(value: &str) -> &str {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(FORMULA_ESCAPE), Some(c)) if FORMULA_TRIGGERS.contains(&c) => {
            &value[FORMULA_ESCAPE.len_utf8()..]
        }
        _ => value,
    }
}

/// Accumulates values into records and renders them as RFC 4180 text.
///
/// Records are separated by `\r\n`. Values are quoted only when necessary,
/// and values that a spreadsheet would evaluate as formulas are escaped.
///
/// RFC 4180 requires every record to have the same number of values. The
/// first record ended on a builder fixes that number, and every later record
/// must match it. A mismatch is reported as `Error::RecordLength` as soon as
/// it is detected: when a value is added past the limit or when a short
/// record is ended.
///
/// # Null values
///
/// A `None` value is written as the literal text `null`. Parsing that text
/// back yields the string `"null"`, not a null field, so null values do not
/// survive a round trip.
///
/// # Example
///
/// ```
/// use csvline::RecordBuilder;
///
/// # fn main() -> csvline::Result<()> {
/// let mut builder = RecordBuilder::new();
/// builder.add_value("name")?.add_value("notes")?.end_current_record()?;
/// builder.add_value("Alice")?.add_value("says \"hi\", often")?;
/// builder.end_current_record()?;
/// builder.add_value("Bob")?.add_value("=1+1")?;
///
/// assert_eq!(
///     builder.build()?,
///     "name,notes\r\nAlice,\"says \"\"hi\"\", often\"\r\nBob,'=1+1",
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RecordBuilder {
    delimiter: char,
    quote_line_feed: bool,
    /// Finished records, each already joined with the delimiter.
    records: Vec<String>,
    /// Escaped values of the record in progress.
    current: Vec<String>,
    /// The number of values per record, fixed by the first ended record.
    expected: Option<usize>,
}

impl Default for RecordBuilder {
    fn default() -> RecordBuilder {
        RecordBuilder {
            delimiter: DEFAULT_DELIMITER,
            quote_line_feed: false,
            records: vec![],
            current: vec![],
            expected: None,
        }
    }
}

impl RecordBuilder {
    /// Create a new builder that separates values with a comma.
    pub fn new() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// The delimiter written between values.
    ///
    /// The default is `,`. This should be set before any value is added.
    pub fn delimiter(&mut self, delimiter: char) -> &mut RecordBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Quote values containing a bare `\r` or `\n`.
    ///
    /// By default, only values containing a `\r\n` pair are quoted for line
    /// breaks. Enable this when the output may be read by a reader that
    /// ends lines on a bare `\n` or `\r`.
    pub fn quote_line_feed(&mut self, yes: bool) -> &mut RecordBuilder {
        self.quote_line_feed = yes;
        self
    }

    /// Add a value to the record in progress.
    ///
    /// Accepts either a `&str` or an `Option<&str>`.
    pub fn add_value<'v, V: Into<Option<&'v str>>>(
        &mut self,
        value: V,
    ) -> Result<&mut RecordBuilder> {
        if let Some(expected) = self.expected {
            if self.current.len() >= expected {
                return Err(Error::RecordLength {
                    expected,
                    found: self.current.len() + 1,
                });
            }
        }
        let escaped = self.escape(value.into().unwrap_or(NULL));
        self.current.push(escaped);
        Ok(self)
    }

    /// End the record in progress.
    ///
    /// The first record ended on this builder fixes the number of values per
    /// record. Ending a record to which no value was added does nothing,
    /// even once that count is fixed: no empty record is ever written.
    pub fn end_current_record(&mut self) -> Result<&mut RecordBuilder> {
        if self.current.is_empty() {
            return Ok(self);
        }
        match self.expected {
            Some(expected) if expected != self.current.len() => {
                return Err(Error::RecordLength {
                    expected,
                    found: self.current.len(),
                });
            }
            Some(_) => {}
            None => self.expected = Some(self.current.len()),
        }
        let delimiter = self.delimiter.to_string();
        self.records.push(self.current.join(&delimiter));
        self.current.clear();
        Ok(self)
    }

    /// Serialize a single record and end it.
    ///
    /// The value must be a struct, tuple or sequence of scalars. Integers and
    /// floats are written in their shortest form, `None` and unit values as
    /// empty fields, and byte strings are decoded as lossy UTF-8.
    ///
    /// ```
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Row<'a> {
    ///     name: &'a str,
    ///     score: f64,
    ///     rank: Option<u32>,
    /// }
    ///
    /// # fn main() -> csvline::Result<()> {
    /// let mut builder = csvline::RecordBuilder::new();
    /// builder.serialize(Row { name: "Alice", score: 1.5, rank: Some(1) })?;
    /// builder.serialize(Row { name: "Bob", score: -2.0, rank: None })?;
    /// assert_eq!(builder.build()?, "Alice,1.5,1\r\nBob,'-2.0,");
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "serde")]
    pub fn serialize<S: Serialize>(
        &mut self,
        record: S,
    ) -> Result<&mut RecordBuilder> {
        serialize(self, &record)?;
        self.end_current_record()
    }

    /// Render every record, without a trailing terminator.
    ///
    /// This is equivalent to `build_with(true)`.
    pub fn build(&mut self) -> Result<String> {
        self.build_with(true)
    }

    /// Render every record.
    ///
    /// A record in progress is ended first, which fails if it does not
    /// have the established number of values. Records are joined with
    /// `\r\n`, and the final `\r\n` is dropped if
    /// `trim_trailing_terminator` is true.
    ///
    /// The builder keeps its records, so calling this again renders the same
    /// text plus anything added since.
    pub fn build_with(&mut self, trim_trailing_terminator: bool) -> Result<String> {
        self.end_current_record()?;
        let mut out = String::new();
        for record in &self.records {
            out.push_str(record);
            out.push_str(CRLF);
        }
        if trim_trailing_terminator && out.ends_with(CRLF) {
            out.truncate(out.len() - CRLF.len());
        }
        Ok(out)
    }

    /// Discard every record and the established number of values, so the
    /// builder can be reused for unrelated output.
    pub fn flush(&mut self) {
        self.records.clear();
        self.current.clear();
        self.expected = None;
    }

    /// Returns the number of ended records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns the number of values per record, once established.
    pub fn expected_values(&self) -> Option<usize> {
        self.expected
    }

    fn escape(&self, value: &str) -> String {
        let value = escape_formula_injection(value);
        if !needs_quotes(&value, self.delimiter, self.quote_line_feed) {
            return value.into_owned();
        }
        let mut quoted = String::with_capacity(value.len() + 2);
        quoted.push(QUOTE);
        for c in value.chars() {
            if c == QUOTE {
                quoted.push(QUOTE);
            }
            quoted.push(c);
        }
        quoted.push(QUOTE);
        quoted
    }
}

/// Render a list of values as a single RFC 4180 record.
///
/// Null values are written as `null`, like
/// [`RecordBuilder::add_value`](struct.RecordBuilder.html#method.add_value).
///
/// ```
/// use csvline::list_to_csv;
///
/// let csv = list_to_csv(vec![Some("a"), None, Some("b,c")]).unwrap();
/// assert_eq!(csv, "a,null,\"b,c\"");
/// ```
pub fn list_to_csv<'v, I, V>(values: I) -> Result<String>
where
    I: IntoIterator<Item = V>,
    V: Into<Option<&'v str>>,
{
    let mut builder = RecordBuilder::new();
    for value in values {
        builder.add_value(value)?;
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::{
        escape_formula_injection, unescape_formula_injection, RecordBuilder,
    };
    use crate::error::Error;

    macro_rules! builds_to {
        ($name:ident, $records:expr, $expected:expr) => {
            builds_to!($name, $records, $expected, |_: &mut RecordBuilder| ());
        };
        ($name:ident, $records:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = RecordBuilder::new();
                $config(&mut builder);
                let records: Vec<Vec<Option<&str>>> = $records;
                for record in records {
                    for value in record {
                        builder.add_value(value).unwrap();
                    }
                    builder.end_current_record().unwrap();
                }
                assert_eq!(builder.build().unwrap(), $expected);
            }
        };
    }

    builds_to!(nothing, vec![], "");
    builds_to!(one_value, vec![vec![Some("a")]], "a");
    builds_to!(
        two_records,
        vec![vec![Some("x"), Some("y")], vec![Some("p"), Some("q")]],
        "x,y\r\np,q"
    );
    builds_to!(null_is_literal, vec![vec![None, Some("a")]], "null,a");
    builds_to!(empty_value, vec![vec![Some(""), Some("")]], ",");
    builds_to!(quotes_delimiter, vec![vec![Some("a,b")]], "\"a,b\"");
    builds_to!(doubles_quotes, vec![vec![Some("a\"b")]], "\"a\"\"b\"");
    builds_to!(quotes_crlf, vec![vec![Some("a\r\nb")]], "\"a\r\nb\"");
    builds_to!(bare_lf_unquoted, vec![vec![Some("a\nb")]], "a\nb");
    builds_to!(
        bare_lf_quoted,
        vec![vec![Some("a\nb"), Some("c\rd")]],
        "\"a\nb\",\"c\rd\"",
        |b: &mut RecordBuilder| {
            b.quote_line_feed(true);
        }
    );
    builds_to!(formula, vec![vec![Some("=SUM(A1:A2)")]], "'=SUM(A1:A2)");
    builds_to!(
        formula_triggers,
        vec![vec![Some("@a"), Some("+b"), Some("-c"), Some("d=")]],
        "'@a,'+b,'-c,d="
    );
    builds_to!(
        formula_then_quoted,
        vec![vec![Some("=a,b")]],
        "\"'=a,b\""
    );
    builds_to!(
        tab_delimited,
        vec![vec![Some("a,b"), Some("c\td")]],
        "a,b\t\"c\td\"",
        |b: &mut RecordBuilder| {
            b.delimiter('\t');
        }
    );

    #[test]
    fn trailing_terminator() {
        let mut builder = RecordBuilder::new();
        builder.add_value("x").unwrap().add_value("y").unwrap();
        builder.end_current_record().unwrap();
        builder.add_value("p").unwrap().add_value("q").unwrap();
        builder.end_current_record().unwrap();
        assert_eq!(builder.build_with(true).unwrap(), "x,y\r\np,q");
        assert_eq!(builder.build_with(false).unwrap(), "x,y\r\np,q\r\n");
    }

    #[test]
    fn dangling_record_is_ended() {
        let mut builder = RecordBuilder::new();
        builder.add_value("a").unwrap().add_value("b").unwrap();
        assert_eq!(builder.build().unwrap(), "a,b");
        assert_eq!(builder.record_count(), 1);
        assert_eq!(builder.expected_values(), Some(2));
    }

    #[test]
    fn too_many_values() {
        let mut builder = RecordBuilder::new();
        builder.add_value("a").unwrap().end_current_record().unwrap();
        builder.add_value("b").unwrap();
        match builder.add_value("c") {
            Err(Error::RecordLength { expected, found }) => {
                assert_eq!(expected, 1);
                assert_eq!(found, 2);
            }
            res => panic!("expected record length error, got {:?}", res),
        }
    }

    #[test]
    fn too_few_values() {
        let mut builder = RecordBuilder::new();
        builder.add_value("a").unwrap().add_value("b").unwrap();
        builder.end_current_record().unwrap();
        builder.add_value("c").unwrap();
        match builder.end_current_record() {
            Err(Error::RecordLength { expected, found }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            res => panic!("expected record length error, got {:?}", res),
        }
        assert!(builder.build().is_err());
    }

    #[test]
    fn every_record_is_checked() {
        let mut builder = RecordBuilder::new();
        for _ in 0..3 {
            builder.add_value("a").unwrap().add_value("b").unwrap();
            builder.end_current_record().unwrap();
        }
        builder.add_value("a").unwrap();
        assert!(builder.end_current_record().is_err());
    }

    #[test]
    fn empty_end_is_a_no_op() {
        let mut builder = RecordBuilder::new();
        builder.end_current_record().unwrap();
        assert_eq!(builder.expected_values(), None);
        builder.add_value("a").unwrap().add_value("b").unwrap();
        builder.end_current_record().unwrap().end_current_record().unwrap();
        assert_eq!(builder.build().unwrap(), "a,b");
    }

    #[test]
    fn empty_end_after_count_is_fixed() {
        let mut builder = RecordBuilder::new();
        builder.add_value("a").unwrap().add_value("b").unwrap();
        builder.end_current_record().unwrap();
        assert_eq!(builder.expected_values(), Some(2));

        builder.end_current_record().unwrap();
        assert_eq!(builder.record_count(), 1);
        builder.add_value("c").unwrap().add_value("d").unwrap();
        builder.end_current_record().unwrap();
        assert_eq!(builder.build().unwrap(), "a,b\r\nc,d");
    }

    #[test]
    fn flush_resets_contract() {
        let mut builder = RecordBuilder::new();
        builder.add_value("a").unwrap().add_value("b").unwrap();
        builder.end_current_record().unwrap();
        builder.flush();
        assert_eq!(builder.build().unwrap(), "");
        builder.add_value("only").unwrap();
        assert_eq!(builder.build().unwrap(), "only");
    }

    #[test]
    fn formula_escape_round_trip() {
        for value in &["=1", "@x", "+1", "-1", "plain", ""] {
            let escaped = escape_formula_injection(value);
            assert_eq!(unescape_formula_injection(&escaped), *value);
        }
        assert_eq!(escape_formula_injection("'=1"), "'=1");
        assert_eq!(unescape_formula_injection("'=1"), "=1");
        assert_eq!(unescape_formula_injection("'"), "'");
        assert_eq!(unescape_formula_injection("'abc"), "'abc");
    }
}
