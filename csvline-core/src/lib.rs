/*!
`csvline-core` provides the character level state machines behind quote aware
delimited text handling. It does no I/O and never allocates.

There are two machines and a handful of write-side predicates:

* [`LineMachine`](struct.LineMachine.html) decides where one *logical line*
  ends. A logical line may contain line terminators, as long as they appear
  inside a quoted field.
* [`FieldMachine`](struct.FieldMachine.html) splits one logical line into
  fields, decoding quotes as it goes.
* [`needs_quotes`](fn.needs_quotes.html) and
  [`is_formula`](fn.is_formula.html) decide how a single value must be
  written so that it survives a trip through a spreadsheet application.

Both machines are fed one `char` at a time and never need to look ahead.
Whenever a decision depends on the next character (is this quote doubled?
is this `\r` followed by `\n`?) the machine enters a pending state and
resolves it on the next call.

# Example

Splitting a line into fields by hand:

```
use csvline_core::FieldMachine;

let mut machine = FieldMachine::new(',');
let mut fields = vec![String::new()];
for c in r#"a,"b,""c""",d"#.chars() {
    let step = machine.feed(c);
    if let Some(ch) = step.char() {
        fields.last_mut().unwrap().push(ch);
    }
    if step.is_field_end() {
        fields.push(String::new());
    }
}
machine.finish().unwrap();
assert_eq!(fields, vec!["a", "b,\"c\"", "d"]);
```
*/

#![deny(missing_docs)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub use crate::field::{FieldMachine, FieldStep, MismatchedQuotes};
pub use crate::line::{LineMachine, LineStep};
pub use crate::writer::{
    is_formula, needs_quotes, FORMULA_ESCAPE, FORMULA_TRIGGERS,
};

mod field;
mod line;
mod writer;

/// The quote character recognized by both machines.
pub const QUOTE: char = '"';

/// The UTF-8 byte order mark, as a decoded character.
pub const BOM: char = '\u{FEFF}';

/// Returns true if and only if `c` terminates a line when it appears outside
/// of quotes.
///
/// `\r`, `\n` and the pair `\r\n` are all treated as a single terminator.
/// Strict RFC 4180 only specifies `\r\n`; accepting a bare `\r` is
/// intentional and callers may rely on it.
#[inline]
pub fn is_terminator(c: char) -> bool {
    c == '\r' || c == '\n'
}
