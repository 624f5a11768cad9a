use clap::Parser;
use miette::Result;
use skolemium::{
    cli,
    qdimacs::{ExtendedParseError, QdimacsParser},
    spec::Spec,
};
use std::path::PathBuf;

/// Parses a QDIMACS file and prints the canonical 2QBF view back out.
#[derive(Debug, Parser)]
#[command(about = "QDIMACS round-trip and inspection tool")]
struct Args {
    /// Path to the QDIMACS input; reads from stdin when omitted
    spec_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let contents = cli::read_input(args.spec_file.as_deref())?;

    let spec: Spec = match QdimacsParser::new(&contents).parse() {
        Ok(spec) => spec,
        Err(err) => Err(ExtendedParseError { source_code: contents, related: vec![err] })?,
    };

    print!("{spec}");
    Ok(())
}
