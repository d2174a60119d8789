use memchr::{memchr, memchr2, memmem};

use crate::QUOTE;

/// Leading characters that make a spreadsheet application evaluate a cell as
/// a formula.
pub const FORMULA_TRIGGERS: [char; 4] = ['=', '@', '+', '-'];

/// The character prepended to a value that would otherwise be evaluated as a
/// formula.
pub const FORMULA_ESCAPE: char = '\'';

/// Returns true if and only if `value` starts with one of the
/// [`FORMULA_TRIGGERS`](constant.FORMULA_TRIGGERS.html).
#[inline]
pub fn is_formula(value: &str) -> bool {
    match value.chars().next() {
        Some(c) => FORMULA_TRIGGERS.contains(&c),
        None => false,
    }
}

/// Returns true if and only if `value` must be wrapped in quotes to be
/// written as a single field.
///
/// A value needs quotes when it contains the delimiter, a quote or a `\r\n`
/// pair. When `quote_line_feeds` is enabled, a bare `\r` or `\n` is enough.
///
/// Without `quote_line_feeds`, a bare line feed is written as is, and a
/// reader that ends lines on a bare `\n` will split the record there.
pub fn needs_quotes(value: &str, delimiter: char, quote_line_feeds: bool) -> bool {
    let bytes = value.as_bytes();
    if memchr(QUOTE as u8, bytes).is_some() {
        return true;
    }
    if contains_char(value, delimiter) {
        return true;
    }
    if quote_line_feeds {
        memchr2(b'\r', b'\n', bytes).is_some()
    } else {
        memmem::find(bytes, b"\r\n").is_some()
    }
}

fn contains_char(value: &str, c: char) -> bool {
    if c.is_ascii() {
        memchr(c as u8, value.as_bytes()).is_some()
    } else {
        value.contains(c)
    }
}

#[cfg(test)]
mod tests {
    use super::{is_formula, needs_quotes};

    #[test]
    fn formulas() {
        assert!(is_formula("=SUM(A1:A2)"));
        assert!(is_formula("@foo"));
        assert!(is_formula("+1"));
        assert!(is_formula("-1"));
        assert!(!is_formula(""));
        assert!(!is_formula("a=b"));
        assert!(!is_formula("'=x"));
    }

    #[test]
    fn plain_values_are_bare() {
        assert!(!needs_quotes("", ',', false));
        assert!(!needs_quotes("abc", ',', false));
        assert!(!needs_quotes("a;b", ',', false));
    }

    #[test]
    fn delimiter_and_quote() {
        assert!(needs_quotes("a,b", ',', false));
        assert!(needs_quotes("a;b", ';', false));
        assert!(needs_quotes("a\u{00A6}b", '\u{00A6}', false));
        assert!(needs_quotes("say \"hi\"", ',', false));
    }

    #[test]
    fn line_feeds() {
        assert!(needs_quotes("a\r\nb", ',', false));
        assert!(!needs_quotes("a\nb", ',', false));
        assert!(!needs_quotes("a\rb", ',', false));
        assert!(needs_quotes("a\nb", ',', true));
        assert!(needs_quotes("a\rb", ',', true));
    }
}
