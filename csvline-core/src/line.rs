use crate::{is_terminator, QUOTE};

/// The result of feeding one character to a [`LineMachine`].
///
/// A step carries zero, one or two characters that belong to the current
/// logical line, and a flag indicating whether the line ended. Characters
/// are always appended *before* the line is ended.
///
/// [`LineMachine`]: struct.LineMachine.html
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LineStep {
    chars: [char; 2],
    len: u8,
    end: bool,
}

impl LineStep {
    fn none() -> LineStep {
        LineStep { chars: ['\0'; 2], len: 0, end: false }
    }

    fn one(c: char) -> LineStep {
        LineStep { chars: [c, '\0'], len: 1, end: false }
    }

    fn two(c1: char, c2: char) -> LineStep {
        LineStep { chars: [c1, c2], len: 2, end: false }
    }

    fn end() -> LineStep {
        LineStep { chars: ['\0'; 2], len: 0, end: true }
    }

    /// Prepend a character to this step. Only valid on steps holding at
    /// most one character.
    fn prepend(self, c: char) -> LineStep {
        debug_assert!(self.len < 2);
        LineStep {
            chars: [c, self.chars[0]],
            len: self.len + 1,
            end: self.end,
        }
    }

    /// The characters to append to the current logical line.
    pub fn chars(&self) -> &[char] {
        &self.chars[..self.len as usize]
    }

    /// Whether the current logical line ended with this step.
    pub fn is_end(&self) -> bool {
        self.end
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LineState {
    Unquoted,
    Quoted,
    /// A quote was seen inside a quoted section. Whether it closes the
    /// section or is the first half of an escaped quote depends on the
    /// next character.
    QuoteInQuoted,
}

/// A state machine that finds the boundaries of logical lines.
///
/// Quote characters toggle a quoted section. Line terminators (`\r`, `\n`
/// or `\r\n`) inside a quoted section are part of the line; outside they
/// end it. Quote characters are never removed from the output: the machine
/// only finds boundaries, and leaves decoding to a
/// [`FieldMachine`](struct.FieldMachine.html).
///
/// A `\r` ends a line immediately. If the very next character fed is `\n`,
/// it is swallowed, even if it arrives in the next call for a new line.
#[derive(Clone, Debug)]
pub struct LineMachine {
    state: LineState,
    skip_lf: bool,
    ignore_quotes: bool,
}

impl Default for LineMachine {
    fn default() -> LineMachine {
        LineMachine::new()
    }
}

impl LineMachine {
    /// Create a new machine positioned at the start of a line.
    pub fn new() -> LineMachine {
        LineMachine {
            state: LineState::Unquoted,
            skip_lf: false,
            ignore_quotes: false,
        }
    }

    /// When enabled, quote characters are ordinary characters and every
    /// line terminator ends the line.
    ///
    /// Changing this in the middle of a line resets the quote state.
    pub fn set_ignore_quotes(&mut self, yes: bool) {
        self.ignore_quotes = yes;
        self.state = LineState::Unquoted;
    }

    /// Returns true if quote characters are treated as ordinary characters.
    pub fn ignores_quotes(&self) -> bool {
        self.ignore_quotes
    }

    /// Returns true if the machine is inside a quoted section.
    pub fn in_quotes(&self) -> bool {
        self.state != LineState::Unquoted
    }

    /// Forget everything about the line in progress.
    pub fn reset(&mut self) {
        self.state = LineState::Unquoted;
        self.skip_lf = false;
    }

    /// Feed the next character of input.
    pub fn feed(&mut self, c: char) -> LineStep {
        if self.skip_lf {
            self.skip_lf = false;
            if c == '\n' {
                return LineStep::none();
            }
        }
        match self.state {
            LineState::Unquoted => self.feed_unquoted(c),
            LineState::Quoted => {
                if c == QUOTE {
                    self.state = LineState::QuoteInQuoted;
                    LineStep::none()
                } else {
                    LineStep::one(c)
                }
            }
            LineState::QuoteInQuoted => {
                if c == QUOTE {
                    self.state = LineState::Quoted;
                    LineStep::two(QUOTE, QUOTE)
                } else {
                    self.state = LineState::Unquoted;
                    self.feed_unquoted(c).prepend(QUOTE)
                }
            }
        }
    }

    /// Signal the end of input. Any pending quote is released.
    ///
    /// The machine is reset and may be reused afterwards.
    pub fn finish(&mut self) -> LineStep {
        let step = match self.state {
            LineState::QuoteInQuoted => LineStep::one(QUOTE),
            LineState::Unquoted | LineState::Quoted => LineStep::none(),
        };
        self.reset();
        step
    }

    fn feed_unquoted(&mut self, c: char) -> LineStep {
        if c == QUOTE && !self.ignore_quotes {
            self.state = LineState::Quoted;
            LineStep::one(c)
        } else if is_terminator(c) {
            self.skip_lf = c == '\r';
            LineStep::end()
        } else {
            LineStep::one(c)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LineMachine;

    fn split(machine: &mut LineMachine, data: &str) -> Vec<String> {
        let mut lines = vec![];
        let mut line = String::new();
        for c in data.chars() {
            let step = machine.feed(c);
            line.extend(step.chars());
            if step.is_end() {
                lines.push(std::mem::replace(&mut line, String::new()));
            }
        }
        line.extend(machine.finish().chars());
        if !line.is_empty() {
            lines.push(line);
        }
        lines
    }

    macro_rules! lines_to {
        ($name:ident, $data:expr, $expected:expr) => {
            lines_to!($name, $data, $expected, |_: &mut LineMachine| ());
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut machine = LineMachine::new();
                $config(&mut machine);
                let got = split(&mut machine, $data);
                let expected: Vec<&str> = $expected;
                assert_eq!(expected, got);
            }
        };
    }

    lines_to!(empty, "", vec![]);
    lines_to!(one, "a,b", vec!["a,b"]);
    lines_to!(lf, "a\nb", vec!["a", "b"]);
    lines_to!(crlf, "a\r\nb\r\n", vec!["a", "b"]);
    lines_to!(bare_cr, "a\rb\r", vec!["a", "b"]);
    lines_to!(blank_lines, "a\n\nb", vec!["a", "", "b"]);
    lines_to!(cr_cr, "a\r\rb", vec!["a", "", "b"]);
    lines_to!(quoted_lf, "\"a\nb\",c\nd", vec!["\"a\nb\",c", "d"]);
    lines_to!(quoted_crlf, "x,\"a\r\nb\"\r\ny", vec!["x,\"a\r\nb\"", "y"]);
    lines_to!(doubled_quote, "\"a\"\"\nb\"\nc", vec!["\"a\"\"\nb\"", "c"]);
    lines_to!(closing_quote_then_lf, "\"a\"\nb", vec!["\"a\"", "b"]);
    lines_to!(closing_quote_then_cr, "\"a\"\r\nb", vec!["\"a\"", "b"]);
    lines_to!(closing_quote_at_end, "\"a\"", vec!["\"a\""]);
    lines_to!(empty_quoted, "\"\",x\ny", vec!["\"\",x", "y"]);
    lines_to!(unterminated_quote, "\"a\nb", vec!["\"a\nb"]);
    lines_to!(
        ignore_quotes,
        "\"a\nb\"",
        vec!["\"a", "b\""],
        |m: &mut LineMachine| m.set_ignore_quotes(true)
    );

    #[test]
    fn lf_swallowed_across_lines() {
        let mut machine = LineMachine::new();
        assert!(machine.feed('\r').is_end());
        let step = machine.feed('\n');
        assert!(step.chars().is_empty());
        assert!(!step.is_end());
        assert!(machine.feed('\n').is_end());
    }

    #[test]
    fn reset_forgets_quotes() {
        let mut machine = LineMachine::new();
        machine.feed('"');
        assert!(machine.in_quotes());
        machine.reset();
        assert!(!machine.in_quotes());
        assert!(machine.feed('\n').is_end());
    }
}
