use clap::Parser;
use miette::Result;
use skolemium::{
    cli::{self, Args},
    qdimacs::{ExtendedParseError, QdimacsParser},
    spec::Spec,
    synth::Synthesizer,
    SynthesisResult,
};

fn main() -> Result<SynthesisResult> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let contents = cli::read_input(args.spec_file.as_deref())?;

    let spec: Spec = match QdimacsParser::new(&contents).parse() {
        Ok(spec) => spec,
        Err(err) => Err(ExtendedParseError { source_code: contents, related: vec![err] })?,
    };
    spec.validate()?;

    let mut synthesizer = Synthesizer::new(spec, args.options());
    let result = synthesizer.synthesize()?;
    println!("result status: {result}");

    Ok(result)
}
