#![no_main]

use csvline::{FieldParser, LineReaderBuilder, RecordBuilder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut lines = LineReaderBuilder::new()
        .max_line_length(1 << 12)
        .from_reader(data);
    let parser = FieldParser::new();
    while let Ok(Some(line)) = lines.read_line() {
        let record = match parser.parse_line(&line) {
            Ok(Some(record)) => record,
            Ok(None) | Err(_) => continue,
        };
        let mut builder = RecordBuilder::new();
        for field in &record {
            builder.add_value(field).expect("fresh builder takes any value");
        }
        builder.build().expect("a single record always builds");
    }
});
