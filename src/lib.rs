/*!
The `csvline` crate reads and writes RFC 4180 delimited text one logical
line at a time.

Reading happens in two stages. A [`LineReader`](struct.LineReader.html)
splits a character stream into logical lines, keeping line breaks that
appear inside quoted fields. A [`FieldParser`](struct.FieldParser.html)
then splits a single line into nullable fields. The
[`Reader`](struct.Reader.html) type combines both and adds comment skipping
and header handling.

Writing goes through a [`RecordBuilder`](struct.RecordBuilder.html), which
quotes values only when needed and escapes values that spreadsheet
applications would evaluate as formulas.

# Example

```
use csvline::{FieldParser, LineReader, RecordBuilder};

# fn main() -> csvline::Result<()> {
let data = "name,notes\nAlice,\"line one\nline two\"\n";
let mut lines = LineReader::from_reader(data.as_bytes());
let parser = FieldParser::new();

let mut builder = RecordBuilder::new();
while let Some(line) = lines.read_line()? {
    if let Some(record) = parser.parse_line(&line)? {
        for field in &record {
            builder.add_value(field.unwrap_or(""))?;
        }
        builder.end_current_record()?;
    }
}
assert_eq!(
    builder.build()?,
    "name,notes\r\nAlice,line one\nline two",
);
# Ok(())
# }
```

# Nulls

Empty fields parse to `None`. A `None` value given to a `RecordBuilder` is
written as the text `null`, so nulls do not survive a write and read
round trip. Serializing a `None` with serde writes an empty field instead.

# Crate features

* `serde` (enabled by default) adds `Record::deserialize`,
  `Reader::deserialize` and `RecordBuilder::serialize`, and lets
  `ParserConfig` be loaded from configuration files.
*/

#![deny(missing_docs)]

pub use csvline_core::{is_formula, FORMULA_ESCAPE, FORMULA_TRIGGERS};

pub use crate::builder::{
    escape_formula_injection, list_to_csv, unescape_formula_injection,
    RecordBuilder, CRLF,
};
pub use crate::error::{Error, Result};
pub use crate::line_reader::{
    LineReader, LineReaderBuilder, Lines, DEFAULT_MAX_LINE_LENGTH,
};
pub use crate::parser::{
    parse_delimiter, parse_line_lenient, FieldParser, FieldParserBuilder,
    Lenient, ParserConfig, DEFAULT_DELIMITER,
};
#[cfg(feature = "serde")]
pub use crate::reader::DeserializeRecords;
pub use crate::reader::{Reader, ReaderBuilder, Records};
pub use crate::record::{Record, RecordIter};

mod builder;
#[cfg(feature = "serde")]
mod deserializer;
mod error;
mod line_reader;
mod parser;
mod reader;
mod record;
#[cfg(feature = "serde")]
mod serializer;
