use std::fs::File;
use std::io;
#[cfg(feature = "serde")]
use std::marker::PhantomData;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::Result;
use crate::line_reader::{LineReader, LineReaderBuilder};
use crate::parser::{FieldParser, FieldParserBuilder, ParserConfig};
use crate::record::Record;

/// Builds a record reader with various configuration knobs.
///
/// This combines the options of a `LineReaderBuilder` and a
/// `FieldParserBuilder`, and adds comment skipping and header handling.
///
/// # Example
///
/// ```
/// use csvline::ReaderBuilder;
///
/// # fn main() -> csvline::Result<()> {
/// let data = "\
/// #exported by the nightly job
/// city;pop
/// Boston;4628910
/// ";
/// let mut rdr = ReaderBuilder::new()
///     .delimiter(';')
///     .comment(Some('#'))
///     .has_headers(true)
///     .from_reader(data.as_bytes());
///
/// assert_eq!(rdr.headers()?.unwrap().get(1), Some("pop"));
/// let rec = rdr.read_record()?.unwrap();
/// assert_eq!(rec.get(0), Some("Boston"));
/// assert!(rdr.read_record()?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReaderBuilder {
    lines: LineReaderBuilder,
    parser: FieldParserBuilder,
    comment: Option<char>,
    has_headers: bool,
}

impl ReaderBuilder {
    /// Create a new builder.
    ///
    /// By default there is no comment character and the first record is
    /// data, not headers.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a reader over any `io::Read`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<R> {
        let parser = self.parser.build();
        let mut lines = self.lines.clone();
        lines.ignore_quotes(parser.config().ignore_quotes);
        Reader {
            lines: lines.from_reader(rdr),
            parser,
            comment: self.comment,
            has_headers: self.has_headers,
            headers_done: false,
            headers: None,
        }
    }

    /// Build a reader over the file at the given path.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        Ok(self.from_reader(File::open(path)?))
    }

    /// Replace every parsing option with the given configuration.
    pub fn config(&mut self, config: ParserConfig) -> &mut ReaderBuilder {
        self.parser = FieldParserBuilder::from_config(config);
        self
    }

    /// The field delimiter. The default is `,`.
    pub fn delimiter(&mut self, delimiter: char) -> &mut ReaderBuilder {
        self.parser.delimiter(delimiter);
        self
    }

    /// Set the delimiter from its textual form, either a single character
    /// or a `\uXXXX` escape.
    pub fn delimiter_str(&mut self, delimiter: &str) -> Result<&mut ReaderBuilder> {
        self.parser.delimiter_str(delimiter)?;
        Ok(self)
    }

    /// Treat quotes as ordinary characters, both when finding line ends and
    /// when splitting fields.
    pub fn ignore_quotes(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.parser.ignore_quotes(yes);
        self
    }

    /// Trim whitespace and control characters around every field.
    /// Disabled by default.
    pub fn trim(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.parser.trim(yes);
        self
    }

    /// Drop empty fields instead of keeping them as nulls.
    pub fn filter_empty(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.parser.filter_empty(yes);
        self
    }

    /// The number of columns every record must have.
    pub fn columns(&mut self, columns: Option<usize>) -> &mut ReaderBuilder {
        self.parser.columns(columns);
        self
    }

    /// Pad short records instead of failing. Only meaningful together with
    /// `columns`.
    pub fn tolerate_missing_columns(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.parser.tolerate_missing_columns(yes);
        self
    }

    /// The maximum length of a logical line, in characters.
    pub fn max_line_length(&mut self, max: usize) -> &mut ReaderBuilder {
        self.lines.max_line_length(max);
        self
    }

    /// Skip lines that start with this character.
    ///
    /// The check is made on the raw line, before any trimming, so an
    /// indented comment character starts a data line.
    pub fn comment(&mut self, comment: Option<char>) -> &mut ReaderBuilder {
        self.comment = comment;
        self
    }

    /// Treat the first record as a header record.
    ///
    /// Headers are exposed through `Reader::headers` and are used to match
    /// columns to struct fields when deserializing.
    pub fn has_headers(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.has_headers = yes;
        self
    }
}

/// Reads records from a character stream.
///
/// Empty lines, comment lines and lines that parse to no fields are skipped.
pub struct Reader<R> {
    lines: LineReader<R>,
    parser: FieldParser,
    comment: Option<char>,
    has_headers: bool,
    headers_done: bool,
    headers: Option<Record>,
}

impl<R: io::Read> Reader<R> {
    /// Create a reader with the default configuration.
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// Returns the header record, reading it first if necessary.
    ///
    /// `None` is returned if the reader was not configured with headers or
    /// if the input has no records at all.
    pub fn headers(&mut self) -> Result<Option<&Record>> {
        self.read_headers()?;
        Ok(self.headers.as_ref())
    }

    /// Read the next data record.
    ///
    /// `None` is returned once the input is exhausted, after which the
    /// underlying source has been released.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        self.read_headers()?;
        self.read_parsed()
    }

    /// Returns a borrowed iterator over all data records.
    pub fn records(&mut self) -> Records<R> {
        Records { rdr: self }
    }

    /// Returns a borrowed iterator deserializing every data record.
    ///
    /// Structs are matched by header name if the reader has headers and by
    /// position otherwise.
    ///
    /// ```
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Stock {
    ///     symbol: String,
    ///     price: f64,
    /// }
    ///
    /// # fn main() -> csvline::Result<()> {
    /// let data = "price,symbol\n12.5,ACME\n3,INIT\n";
    /// let mut rdr = csvline::ReaderBuilder::new()
    ///     .has_headers(true)
    ///     .from_reader(data.as_bytes());
    /// let mut total = 0.0;
    /// for stock in rdr.deserialize::<Stock>() {
    ///     total += stock?.price;
    /// }
    /// assert_eq!(total, 15.5);
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "serde")]
    pub fn deserialize<D: DeserializeOwned>(&mut self) -> DeserializeRecords<R, D> {
        DeserializeRecords { rdr: self, _priv: PhantomData }
    }

    fn read_headers(&mut self) -> Result<()> {
        if self.has_headers && !self.headers_done {
            self.headers_done = true;
            self.headers = self.read_parsed()?;
        }
        Ok(())
    }

    fn read_parsed(&mut self) -> Result<Option<Record>> {
        while let Some(line) = self.lines.read_line()? {
            if line.is_empty() {
                continue;
            }
            if self.comment.map_or(false, |c| line.starts_with(c)) {
                trace!(line = self.lines.lines_read(), "skipping comment line");
                continue;
            }
            if let Some(record) = self.parser.parse_line(&line)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

impl<R> Reader<R> {
    /// Returns the number of logical lines read so far, including skipped
    /// and header lines.
    pub fn lines_read(&self) -> u64 {
        self.lines.lines_read()
    }

    /// Returns the field parser used by this reader.
    pub fn parser(&self) -> &FieldParser {
        &self.parser
    }

    /// Release the underlying source early.
    pub fn close(&mut self) {
        self.lines.close();
    }
}

/// A borrowed iterator over the data records of a reader.
pub struct Records<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: io::Read> Iterator for Records<'r, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        self.rdr.read_record().transpose()
    }
}

/// A borrowed iterator that deserializes the data records of a reader.
#[cfg(feature = "serde")]
pub struct DeserializeRecords<'r, R: 'r, D> {
    rdr: &'r mut Reader<R>,
    _priv: PhantomData<D>,
}

#[cfg(feature = "serde")]
impl<'r, R: io::Read, D: DeserializeOwned> Iterator
    for DeserializeRecords<'r, R, D>
{
    type Item = Result<D>;

    fn next(&mut self) -> Option<Result<D>> {
        let record = match self.rdr.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => return Some(Err(err)),
        };
        Some(record.deserialize(self.rdr.headers.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Reader, ReaderBuilder};
    use crate::error::Error;
    use crate::record::Record;

    fn s(x: &str) -> Option<String> {
        Some(x.to_string())
    }

    fn collect(rdr: &mut Reader<&[u8]>) -> Vec<Vec<Option<String>>> {
        rdr.records().map(|r| r.unwrap().into_inner()).collect()
    }

    #[test]
    fn plain_records() {
        let mut rdr = Reader::from_reader(&b"a,\"b,c\",d\n1,2,3"[..]);
        assert!(rdr.headers().unwrap().is_none());
        assert_eq!(
            collect(&mut rdr),
            vec![vec![s("a"), s("b,c"), s("d")], vec![s("1"), s("2"), s("3")]]
        );
        assert_eq!(rdr.lines_read(), 2);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let data = "#one\n\na,b\n  #not a comment\n#two\r\nc,d\n";
        let mut rdr = ReaderBuilder::new()
            .comment(Some('#'))
            .trim(true)
            .from_reader(data.as_bytes());
        assert_eq!(
            collect(&mut rdr),
            vec![
                vec![s("a"), s("b")],
                vec![s("#not a comment")],
                vec![s("c"), s("d")],
            ]
        );
    }

    #[test]
    fn headers_are_not_data() {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(&b"h1,h2\nx,y\n"[..]);
        let first = rdr.read_record().unwrap().unwrap();
        assert_eq!(first.get(0), Some("x"));
        let headers: Record = vec![Some("h1"), Some("h2")].into_iter().collect();
        assert_eq!(rdr.headers().unwrap(), Some(&headers));
        assert!(rdr.read_record().unwrap().is_none());
    }

    #[test]
    fn headers_of_empty_input() {
        let mut rdr =
            ReaderBuilder::new().has_headers(true).from_reader(&b""[..]);
        assert!(rdr.headers().unwrap().is_none());
        assert!(rdr.read_record().unwrap().is_none());
    }

    #[test]
    fn filtered_lines_are_skipped() {
        let mut rdr = ReaderBuilder::new()
            .trim(true)
            .filter_empty(true)
            .from_reader(&b" , \na\n"[..]);
        assert_eq!(collect(&mut rdr), vec![vec![s("a")]]);
    }

    #[test]
    fn column_count_is_enforced() {
        let mut rdr = ReaderBuilder::new()
            .columns(Some(2))
            .from_reader(&b"a,b\nc\n"[..]);
        assert!(rdr.read_record().unwrap().is_some());
        match rdr.read_record() {
            Err(Error::ColumnCount { expected: 2, found: 1 }) => {}
            res => panic!("expected column count error, got {:?}", res),
        }
    }

    #[test]
    fn ignore_quotes_reaches_lines() {
        let mut rdr = ReaderBuilder::new()
            .ignore_quotes(true)
            .from_reader(&b"a\"b\nc\n"[..]);
        assert_eq!(
            collect(&mut rdr),
            vec![vec![s("a\"b")], vec![s("c")]]
        );
    }

    #[test]
    fn close_ends_reading() {
        let mut rdr = Reader::from_reader(&b"a\nb\n"[..]);
        assert!(rdr.read_record().unwrap().is_some());
        rdr.close();
        assert!(rdr.read_record().unwrap().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_with_headers() {
        use serde::Deserialize;

        #[derive(Debug, Deserialize, PartialEq)]
        struct Row {
            id: u32,
            label: Option<String>,
        }

        let data = "label,id\nfirst,1\n,2\n";
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_bytes());
        let rows: Vec<Row> =
            rdr.deserialize::<Row>().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            rows,
            vec![
                Row { id: 1, label: Some("first".into()) },
                Row { id: 2, label: None },
            ]
        );
    }
}
