use quickcheck::{quickcheck, TestResult};

use csvline::{
    escape_formula_injection, is_formula, FieldParser, FieldParserBuilder,
    LineReader, RecordBuilder,
};

fn read_lines(data: &str) -> Vec<String> {
    let mut rdr = LineReader::from_reader(data.as_bytes());
    rdr.lines().map(|line| line.unwrap()).collect()
}

/// Splits on `\r\n`, `\n` and `\r`, dropping the empty tail a trailing
/// terminator leaves behind.
fn naive_lines(data: &str) -> Vec<String> {
    let mut lines: Vec<String> = data
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(|s| s.to_string())
        .collect();
    if lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[test]
fn unquoted_lines_split_naively() {
    fn prop(data: String) -> TestResult {
        if data.contains('"') || data.starts_with('\u{FEFF}') {
            return TestResult::discard();
        }
        TestResult::from_bool(read_lines(&data) == naive_lines(&data))
    }
    quickcheck(prop as fn(String) -> TestResult);
}

#[test]
fn quoted_crlf_is_not_a_line_break() {
    fn prop(a: String, b: String) -> TestResult {
        if a.contains('"') || b.contains('"') {
            return TestResult::discard();
        }
        let quoted = format!("x,\"{}\r\n{}\"", a, b);
        let data = format!("{}\r\nnext", quoted);
        TestResult::from_bool(read_lines(&data) == vec![quoted, "next".to_string()])
    }
    quickcheck(prop as fn(String, String) -> TestResult);
}

#[test]
fn written_values_parse_back() {
    fn prop(a: String, b: String) -> TestResult {
        let acceptable = |s: &str| !s.is_empty() && !is_formula(s) && s != "null";
        if !acceptable(a.as_str()) || !acceptable(b.as_str()) {
            return TestResult::discard();
        }
        let mut builder = RecordBuilder::new();
        builder.quote_line_feed(true);
        builder.add_value(a.as_str()).unwrap().add_value(b.as_str()).unwrap();
        builder.end_current_record().unwrap();
        let text = builder.build().unwrap();

        let parser = FieldParserBuilder::new().trim(false).build();
        let record = parser.parse_line(&text).unwrap().unwrap();
        TestResult::from_bool(
            record.into_inner() == vec![Some(a), Some(b)],
        )
    }
    quickcheck(prop as fn(String, String) -> TestResult);
}

#[test]
fn written_rows_read_back() {
    fn prop(rows: Vec<(String, String)>) -> TestResult {
        let acceptable = |s: &str| {
            !s.is_empty() && !is_formula(s) && !s.starts_with('\u{FEFF}')
        };
        if rows.iter().any(|(a, b)| !acceptable(a.as_str()) || !acceptable(b.as_str())) {
            return TestResult::discard();
        }
        let mut builder = RecordBuilder::new();
        builder.quote_line_feed(true);
        for (a, b) in &rows {
            builder.add_value(a.as_str()).unwrap();
            builder.add_value(b.as_str()).unwrap();
            builder.end_current_record().unwrap();
        }
        let text = builder.build_with(false).unwrap();

        let parser = FieldParserBuilder::new().trim(false).build();
        let mut got = vec![];
        for line in read_lines(&text) {
            let fields = parser.parse_line(&line).unwrap().unwrap().into_inner();
            got.push((fields[0].clone().unwrap(), fields[1].clone().unwrap()));
        }
        TestResult::from_bool(got == rows)
    }
    quickcheck(prop as fn(Vec<(String, String)>) -> TestResult);
}

#[test]
fn parsing_is_idempotent() {
    fn prop(line: String) -> bool {
        let parser = FieldParser::new();
        match (parser.parse_line(&line), parser.parse_line(&line)) {
            (Ok(x), Ok(y)) => x == y,
            (Err(x), Err(y)) => x.to_string() == y.to_string(),
            _ => false,
        }
    }
    quickcheck(prop as fn(String) -> bool);
}

#[test]
fn formula_escape_is_idempotent() {
    fn prop(value: String) -> bool {
        let once = escape_formula_injection(&value).into_owned();
        escape_formula_injection(&once) == once
    }
    quickcheck(prop as fn(String) -> bool);
}
