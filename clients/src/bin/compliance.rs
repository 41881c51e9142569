//! `aas-compliance`: Checks AAS JSON and XML files for compliance.
//!
//! Runs the compliance steps over files or directory trees:
//! - syntax (well-formed JSON or XML)
//! - strict decoding of every entity
//! - lossless re-encoding
//!
//! **Usage:**
//! ```text
//! aas-compliance check [--format <fmt>] <path>...
//! aas-compliance equal <left> <right>
//! ```
//!
//! Exits non-zero if any step fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use aas_clients::init_logging;
use aas_codec::Format;
use aas_compliance::{check_all, files_equal, ComplianceReport};
use anyhow::Result;
use clap::{Parser, Subcommand};

/// Check AAS serializations for compliance.
#[derive(Parser)]
#[command(name = "aas-compliance", about = "Check AAS JSON and XML files for compliance")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log every step.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check files; directories are searched for .json and .xml files.
    Check {
        /// Files or directories to check.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Read every file as this format instead of inferring it.
        #[arg(long)]
        format: Option<Format>,
    },
    /// Check that two files hold the same content, across formats.
    Equal {
        /// First file.
        left: PathBuf,
        /// Second file.
        right: PathBuf,
    },
}

fn print(report: &ComplianceReport) {
    println!("AAS Compliance Report");
    println!("=====================");
    println!();
    for result in &report.results {
        println!("{result}");
    }
    let summary = report.summary();
    println!();
    println!(
        "Summary: {} passed, {} warnings, {} failed, {} not executed",
        summary.passed, summary.warned, summary.failed, summary.skipped
    );
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let report = match args.command {
        Command::Check { paths, format } => check_all(&paths, format)?,
        Command::Equal { left, right } => files_equal(&left, &right),
    };
    print(&report);

    let failed = report.failure_count();
    if failed > 0 {
        eprintln!("Compliance FAILED: {failed} step(s) did not pass.");
        process::exit(1);
    }

    println!("Compliance PASSED.");
    Ok(())
}
