// To run this example:
//
//   $ RUST_LOG=csvline=trace cargo run --example read-records < demos/data/inventory.csv
use std::error::Error;
use std::io;
use std::process;

use tracing_subscriber::EnvFilter;

fn example() -> Result<(), Box<dyn Error>> {
    // Lines starting with `#` are skipped, and the first record names the
    // columns.
    let mut rdr = csvline::ReaderBuilder::new()
        .comment(Some('#'))
        .has_headers(true)
        .from_reader(io::stdin());
    if let Some(headers) = rdr.headers()? {
        println!("{:?}", headers);
    }
    for result in rdr.records() {
        let record = result?;
        println!("{:?}", record);
    }
    eprintln!("read {} lines", rdr.lines_read());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    if let Err(err) = example() {
        println!("error running example: {}", err);
        process::exit(1);
    }
}
