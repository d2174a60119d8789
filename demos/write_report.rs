// To run this example:
//
//   $ cargo run --example write-report
use std::error::Error;
use std::process;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct Row {
    sku: &'static str,
    description: &'static str,
    quantity: u32,
    unit_price: f64,
    adjustment: Option<i64>,
}

fn example() -> Result<(), Box<dyn Error>> {
    let mut builder = csvline::RecordBuilder::new();
    for header in &["sku", "description", "quantity", "unit_price", "adjustment"] {
        builder.add_value(*header)?;
    }
    builder.end_current_record()?;

    // The negative adjustment and the formula-looking description are
    // written with a leading `'` so spreadsheets show them as text.
    builder.serialize(Row {
        sku: "A-100",
        description: "Widget, large",
        quantity: 4,
        unit_price: 12.5,
        adjustment: None,
    })?;
    builder.serialize(Row {
        sku: "B-200",
        description: "=HYPERLINK(\"http://example.com\")",
        quantity: 1,
        unit_price: 0.99,
        adjustment: Some(-3),
    })?;
    println!("{}", builder.build_with(false)?);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    if let Err(err) = example() {
        println!("error running example: {}", err);
        process::exit(1);
    }
}
