use core::fmt;

use crate::QUOTE;

/// The error returned when a line ends inside a quoted section.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MismatchedQuotes;

impl fmt::Display for MismatchedQuotes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "mismatched quotes")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MismatchedQuotes {}

/// The result of feeding one character to a [`FieldMachine`].
///
/// [`FieldMachine`]: struct.FieldMachine.html
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldStep {
    ch: Option<char>,
    end: bool,
}

impl FieldStep {
    const NONE: FieldStep = FieldStep { ch: None, end: false };
    const END: FieldStep = FieldStep { ch: None, end: true };

    fn one(c: char) -> FieldStep {
        FieldStep { ch: Some(c), end: false }
    }

    /// The decoded character to append to the current field, if any.
    pub fn char(&self) -> Option<char> {
        self.ch
    }

    /// Whether the current field ended with this step.
    pub fn is_field_end(&self) -> bool {
        self.end
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FieldState {
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// A state machine that splits one logical line into fields.
///
/// The rules are:
///
/// * A quote toggles a quoted section and is not part of the field. Quotes
///   may appear anywhere in a field, so `a"b,c"d` is the single field
///   `ab,cd`.
/// * Inside a quoted section, a doubled quote decodes to one literal quote.
/// * A delimiter inside a quoted section is literal; outside it ends the
///   field.
/// * Everything else is copied verbatim, including line terminators.
///
/// The machine does not know where the line ends. Callers must call
/// [`finish`](#method.finish) after the last character, which reports a
/// line that ended inside quotes and resets the machine.
#[derive(Clone, Debug)]
pub struct FieldMachine {
    state: FieldState,
    delimiter: char,
    ignore_quotes: bool,
}

impl FieldMachine {
    /// Create a machine that separates fields with `delimiter`.
    pub fn new(delimiter: char) -> FieldMachine {
        FieldMachine {
            state: FieldState::Unquoted,
            delimiter,
            ignore_quotes: false,
        }
    }

    /// When enabled, quote characters are copied like any other character
    /// and never start a quoted section.
    pub fn ignore_quotes(mut self, yes: bool) -> FieldMachine {
        self.ignore_quotes = yes;
        self
    }

    /// The delimiter this machine splits on.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Feed the next character of the line.
    pub fn feed(&mut self, c: char) -> FieldStep {
        match self.state {
            FieldState::Unquoted => self.feed_unquoted(c),
            FieldState::Quoted => {
                if c == QUOTE {
                    self.state = FieldState::QuoteInQuoted;
                    FieldStep::NONE
                } else {
                    FieldStep::one(c)
                }
            }
            FieldState::QuoteInQuoted => {
                if c == QUOTE {
                    self.state = FieldState::Quoted;
                    FieldStep::one(QUOTE)
                } else {
                    self.state = FieldState::Unquoted;
                    self.feed_unquoted(c)
                }
            }
        }
    }

    /// Signal the end of the line.
    ///
    /// Returns an error if the line ended inside a quoted section. In either
    /// case the machine is reset and may be reused for the next line.
    pub fn finish(&mut self) -> Result<(), MismatchedQuotes> {
        let state = self.state;
        self.state = FieldState::Unquoted;
        match state {
            FieldState::Quoted => Err(MismatchedQuotes),
            FieldState::Unquoted | FieldState::QuoteInQuoted => Ok(()),
        }
    }

    fn feed_unquoted(&mut self, c: char) -> FieldStep {
        if c == QUOTE && !self.ignore_quotes {
            self.state = FieldState::Quoted;
            FieldStep::NONE
        } else if c == self.delimiter {
            FieldStep::END
        } else {
            FieldStep::one(c)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldMachine, MismatchedQuotes};

    fn split(
        machine: &mut FieldMachine,
        line: &str,
    ) -> Result<Vec<String>, MismatchedQuotes> {
        let mut fields = vec![String::new()];
        for c in line.chars() {
            let step = machine.feed(c);
            if let Some(ch) = step.char() {
                fields.last_mut().unwrap().push(ch);
            }
            if step.is_field_end() {
                fields.push(String::new());
            }
        }
        machine.finish()?;
        Ok(fields)
    }

    macro_rules! parses_to {
        ($name:ident, $line:expr, $expected:expr) => {
            parses_to!($name, $line, $expected, ',', false);
        };
        ($name:ident, $line:expr, $expected:expr, $delim:expr, $ignore:expr) => {
            #[test]
            fn $name() {
                let mut machine =
                    FieldMachine::new($delim).ignore_quotes($ignore);
                let got = split(&mut machine, $line).unwrap();
                let expected: Vec<&str> = $expected;
                assert_eq!(expected, got);
            }
        };
    }

    parses_to!(empty, "", vec![""]);
    parses_to!(one, "a", vec!["a"]);
    parses_to!(three, "a,b,c", vec!["a", "b", "c"]);
    parses_to!(empties, ",,", vec!["", "", ""]);
    parses_to!(quoted_delim, r#"a,"b,c",d"#, vec!["a", "b,c", "d"]);
    parses_to!(
        doubled_quotes,
        r#""he said ""hi""""#,
        vec![r#"he said "hi""#]
    );
    parses_to!(quoted_empty, r#""","""#, vec!["", ""]);
    parses_to!(quote_mid_field, r#"a"b,c"d"#, vec!["ab,cd"]);
    parses_to!(quoted_newline, "\"a\r\nb\",c", vec!["a\r\nb", "c"]);
    parses_to!(closing_then_text, r#""ab"c,d"#, vec!["abc", "d"]);
    parses_to!(semicolon, r#"a;"b;c";d"#, vec!["a", "b;c", "d"], ';', false);
    parses_to!(unicode_delim, "a\u{00A6}b", vec!["a", "b"], '\u{00A6}', false);
    parses_to!(
        ignored_quotes,
        r#""a,b""#,
        vec!["\"a", "b\""],
        ',',
        true
    );

    #[test]
    fn unterminated() {
        let mut machine = FieldMachine::new(',');
        assert_eq!(Err(MismatchedQuotes), split(&mut machine, r#"a,"b"#));
        // The machine is usable again after an error.
        assert_eq!(vec!["x"], split(&mut machine, "x").unwrap());
    }

    #[test]
    fn unterminated_after_escape() {
        let mut machine = FieldMachine::new(',');
        assert_eq!(Err(MismatchedQuotes), split(&mut machine, r#""a"""#));
    }
}
