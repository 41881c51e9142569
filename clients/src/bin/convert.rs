//! `aas-convert`: Converts AAS documents and fragments between JSON and XML.
//!
//! Formats are inferred from the file extensions unless given; `-` reads
//! stdin or writes stdout and then needs an explicit format.
//!
//! **Usage:**
//! ```text
//! aas-convert [--from <fmt>] [--to <fmt>] [--strict] [--stripped] [--compact] <input> <output>
//! aas-convert --fragment Submodel model.json submodel.xml
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use aas_clients::{init_logging, ModeArgs};
use aas_codec::{Decoder, Format, Selector, Severity};
use anyhow::{anyhow, Context, Result};
use clap::Parser;

/// Convert AAS documents between JSON and XML.
#[derive(Parser)]
#[command(name = "aas-convert", about = "Convert AAS documents between JSON and XML")]
struct Args {
    /// Input file, or `-` for stdin.
    input: PathBuf,

    /// Output file, or `-` for stdout.
    output: PathBuf,

    /// Input format (default: from the input extension).
    #[arg(long)]
    from: Option<Format>,

    /// Output format (default: from the output extension).
    #[arg(long)]
    to: Option<Format>,

    /// Convert a single fragment of this kind instead of a whole environment.
    #[arg(long)]
    fragment: Option<Selector>,

    #[command(flatten)]
    mode: ModeArgs,

    /// Log decoding decisions.
    #[arg(short, long)]
    verbose: bool,
}

fn format_of(path: &Path, given: Option<Format>, flag: &str) -> Result<Format> {
    given
        .or_else(|| Format::from_path(path))
        .ok_or_else(|| anyhow!("cannot infer the format of {}; pass {flag}", path.display()))
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let from = format_of(&args.input, args.from, "--from")?;
    let to = format_of(&args.output, args.to, "--to")?;
    let decoder = Decoder::new(args.mode.decode_options());
    let encode = args.mode.encode_options();
    tracing::debug!(%from, %to, mode = ?args.mode, "converting");
    let input = open_input(&args.input)?;
    let mut output = open_output(&args.output)?;

    if let Some(selector) = args.fragment {
        let fragment = decoder
            .decode_fragment(from, input, selector)
            .with_context(|| format!("cannot decode {selector} from {}", args.input.display()))?;
        aas_codec::encode_fragment(to, &fragment, &mut output, &encode)
            .with_context(|| format!("cannot write {}", args.output.display()))?;
        output.flush()?;
        eprintln!("Converted {selector} from {from} to {to}.");
        return Ok(());
    }

    let env = decoder
        .decode_document(from, input)
        .with_context(|| format!("cannot decode {}", args.input.display()))?;
    aas_codec::encode_document(to, &env, &mut output, &encode)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    output.flush()?;

    let dropped = env
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    eprintln!(
        "Converted {} identifiable(s) from {from} to {to}: {} warning(s), {dropped} fragment(s) dropped.",
        env.len(),
        env.diagnostics.len() - dropped
    );
    Ok(())
}
