use std::io;

use csvline_core::{LineMachine, BOM};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// The default maximum length of a logical line, in characters.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1 << 20;

/// The number of characters of an overlong line that are kept for the error.
const PREFIX_LEN: usize = 100;

const BUF_SIZE: usize = 8 * (1 << 10);

/// The widest UTF-8 encoding of a single `char`.
const MAX_UTF8_LEN: usize = 4;

/// Builds a line reader with various configuration knobs.
///
/// Once a `LineReader` is built, its quote handling can still be toggled
/// with `set_ignore_quotes`, but its maximum line length is fixed.
#[derive(Clone, Debug)]
pub struct LineReaderBuilder {
    ignore_quotes: bool,
    max_line_length: usize,
}

impl Default for LineReaderBuilder {
    fn default() -> LineReaderBuilder {
        LineReaderBuilder {
            ignore_quotes: false,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl LineReaderBuilder {
    /// Create a new builder.
    pub fn new() -> LineReaderBuilder {
        LineReaderBuilder::default()
    }

    /// Build a line reader that reads from `rdr`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> LineReader<R> {
        let mut machine = LineMachine::new();
        machine.set_ignore_quotes(self.ignore_quotes);
        LineReader {
            rdr: Some(rdr),
            buf: vec![0; BUF_SIZE],
            pos: 0,
            end: 0,
            eof: false,
            peeked: None,
            bom_checked: false,
            machine,
            max_line_length: self.max_line_length,
            lines: 0,
        }
    }

    /// Treat quote characters as ordinary characters.
    ///
    /// This is only safe for sources known to never quote a line terminator.
    /// It is disabled by default.
    pub fn ignore_quotes(&mut self, yes: bool) -> &mut LineReaderBuilder {
        self.ignore_quotes = yes;
        self
    }

    /// The maximum number of characters in a single logical line.
    ///
    /// Reading a longer line fails with `Error::LineTooLong`. The default
    /// is `DEFAULT_MAX_LINE_LENGTH`.
    pub fn max_line_length(&mut self, max: usize) -> &mut LineReaderBuilder {
        self.max_line_length = max;
        self
    }
}

/// Reads logical lines from a character stream.
///
/// A logical line ends at an unquoted `\r`, `\n` or `\r\n`. Line terminators
/// that appear inside a quoted field are kept in the line, so a single
/// logical line is exactly one record. Quote characters are left in place
/// for a `FieldParser` to decode.
///
/// The source is decoded as UTF-8. Invalid sequences are replaced with
/// `U+FFFD`. A leading byte order mark is skipped.
///
/// The reader owns its source and drops it exactly once: either when
/// `close` is called or when the end of the stream is reached.
///
/// # Example
///
/// ```
/// use csvline::LineReader;
///
/// let data = "name,notes\r\nAlice,\"line one\r\nline two\"\r\nBob,none\r\n";
/// let mut rdr = LineReader::from_reader(data.as_bytes());
///
/// assert_eq!(rdr.read_line().unwrap().unwrap(), "name,notes");
/// assert_eq!(
///     rdr.read_line().unwrap().unwrap(),
///     "Alice,\"line one\r\nline two\"",
/// );
/// assert_eq!(rdr.read_line().unwrap().unwrap(), "Bob,none");
/// assert_eq!(rdr.read_line().unwrap(), None);
/// assert!(rdr.is_closed());
/// ```
#[derive(Debug)]
pub struct LineReader<R> {
    rdr: Option<R>,
    buf: Vec<u8>,
    pos: usize,
    end: usize,
    eof: bool,
    /// A character that was read but not consumed.
    peeked: Option<char>,
    bom_checked: bool,
    machine: LineMachine,
    max_line_length: usize,
    lines: u64,
}

impl<R: io::Read> LineReader<R> {
    /// Create a new line reader with a default configuration.
    ///
    /// The source is buffered for you automatically.
    pub fn from_reader(rdr: R) -> LineReader<R> {
        LineReaderBuilder::new().from_reader(rdr)
    }

    /// Read the next logical line, without its terminator.
    ///
    /// Returns `None` once the stream is exhausted. The source is closed the
    /// first time `None` is returned, and every later call returns `None`.
    ///
    /// If the stream ends without a trailing terminator, the pending text is
    /// returned as the final line.
    ///
    /// # Errors
    ///
    /// An I/O error or a line longer than the configured maximum aborts
    /// reading: the source is closed before the error is returned, and
    /// every later call returns `None`.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.next_line() {
            Ok(line) => Ok(line),
            Err(err) => {
                debug!(line = self.lines + 1, error = %err, "aborting read");
                self.close();
                Err(err)
            }
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if self.rdr.is_none() {
            return Ok(None);
        }
        self.check_bom()?;

        let mut line = String::new();
        let mut len = 0;
        loop {
            let c = match self.next_char()? {
                Some(c) => c,
                None => {
                    line.extend(self.machine.finish().chars());
                    if line.is_empty() {
                        self.close();
                        return Ok(None);
                    }
                    self.lines += 1;
                    return Ok(Some(line));
                }
            };
            let step = self.machine.feed(c);
            for &ch in step.chars() {
                line.push(ch);
                len += 1;
            }
            if len > self.max_line_length {
                return Err(Error::LineTooLong {
                    line: self.lines + 1,
                    max: self.max_line_length,
                    prefix: line.chars().take(PREFIX_LEN).collect(),
                });
            }
            if step.is_end() {
                self.lines += 1;
                return Ok(Some(line));
            }
        }
    }

    /// Returns a borrowed iterator over all remaining logical lines.
    pub fn lines(&mut self) -> Lines<R> {
        Lines { rdr: self }
    }

    /// Looks at the first character once, and throws it away if it is a
    /// byte order mark.
    fn check_bom(&mut self) -> Result<()> {
        if self.bom_checked {
            return Ok(());
        }
        self.bom_checked = true;
        match self.next_char()? {
            Some(BOM) => trace!("skipped byte order mark"),
            Some(c) => self.peeked = Some(c),
            None => {}
        }
        Ok(())
    }

    fn next_char(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.peeked.take() {
            return Ok(Some(c));
        }
        if self.end - self.pos < MAX_UTF8_LEN && !self.eof {
            self.fill_buf()?;
        }
        if self.pos == self.end {
            return Ok(None);
        }
        let (c, size) = bstr::decode_utf8(&self.buf[self.pos..self.end]);
        self.pos += size;
        Ok(Some(c.unwrap_or('\u{FFFD}')))
    }

    /// Shift unconsumed bytes to the front of the buffer and read until at
    /// least one complete character is available or the stream ends.
    fn fill_buf(&mut self) -> Result<()> {
        self.buf.copy_within(self.pos..self.end, 0);
        self.end -= self.pos;
        self.pos = 0;
        let rdr = match self.rdr.as_mut() {
            Some(rdr) => rdr,
            None => {
                self.eof = true;
                return Ok(());
            }
        };
        while self.end < MAX_UTF8_LEN {
            match rdr.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => self.end += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(Error::Io(err)),
            }
        }
        Ok(())
    }
}

impl<R> LineReader<R> {
    /// When enabled, quote characters are treated as ordinary characters and
    /// every line terminator ends a line.
    pub fn set_ignore_quotes(&mut self, yes: bool) {
        self.machine.set_ignore_quotes(yes);
    }

    /// Returns the number of logical lines returned so far.
    pub fn lines_read(&self) -> u64 {
        self.lines
    }

    /// Returns true if the underlying source has been released.
    pub fn is_closed(&self) -> bool {
        self.rdr.is_none()
    }

    /// Release the underlying source.
    ///
    /// This is idempotent. Any buffered but unread input is discarded, and
    /// every later `read_line` returns `None`.
    pub fn close(&mut self) {
        if self.rdr.take().is_some() {
            debug!(lines = self.lines, "line reader closed");
        }
        self.eof = true;
        self.pos = 0;
        self.end = 0;
        self.peeked = None;
        self.machine.reset();
    }
}

/// A borrowed iterator over logical lines.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying
/// line reader.
pub struct Lines<'r, R: 'r> {
    rdr: &'r mut LineReader<R>,
}

impl<'r, R: io::Read> Iterator for Lines<'r, R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        match self.rdr.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
