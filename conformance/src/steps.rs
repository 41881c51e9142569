//! Per-file compliance steps.
//!
//! A file runs through [`OPEN`], [`SYNTAX`], [`DECODE`] and then either
//! [`ROUND_TRIP`] (single-file check) or [`COMPARE`] (two-file check). Once a
//! step fails, every later step is reported as not executed.

use std::path::Path;

use aas_codec::{Decoder, DecodeOptions, EncodeOptions, Environment, Format};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::compare::differences;
use crate::report::{ComplianceReport, TestResult};

/// Reading the file and choosing its format.
pub const OPEN: &str = "Open file";
/// Checking that the file is well-formed JSON or XML.
pub const SYNTAX: &str = "Parse syntax";
/// Decoding the document in strict mode.
pub const DECODE: &str = "Decode strictly";
/// Re-encoding the document and decoding it again.
pub const ROUND_TRIP: &str = "Round trip";
/// Comparing two decoded documents.
pub const COMPARE: &str = "Compare";

const LOAD_STEPS: [&str; 3] = [OPEN, SYNTAX, DECODE];

/// Runs every single-file step on `path`. The format is taken from the
/// file extension unless given.
pub fn check_file(path: &Path, format: Option<Format>) -> ComplianceReport {
    let mut report = ComplianceReport::new();
    match load(path, format, &mut report) {
        Some((format, env)) => report.push(round_trip(path, format, &env)),
        None => report.push(TestResult::not_executed(path, ROUND_TRIP)),
    }
    report
}

/// Loads two files, possibly of different formats, and checks that they
/// hold the same content.
pub fn files_equal(left: &Path, right: &Path) -> ComplianceReport {
    let mut report = ComplianceReport::new();
    let left_env = load(left, None, &mut report);
    let right_env = load(right, None, &mut report);
    let (Some((_, left_env)), Some((_, right_env))) = (left_env, right_env) else {
        report.push(TestResult::not_executed(left, COMPARE));
        return report;
    };
    let found = differences(&left_env, &right_env);
    report.push(if found.is_empty() {
        TestResult::pass(left, COMPARE, format!("same content as {}", right.display()))
    } else {
        TestResult::fail(left, COMPARE, format!("{} difference(s) to {}", found.len(), right.display()))
            .with_details(found)
    });
    report
}

/// Runs the load steps, marking those after a failure as not executed.
fn load(path: &Path, format: Option<Format>, report: &mut ComplianceReport) -> Option<(Format, Environment)> {
    let before = report.results.len();
    let loaded = try_load(path, format, report);
    let ran = report.results.len() - before;
    for step in LOAD_STEPS.iter().skip(ran) {
        report.push(TestResult::not_executed(path, step));
    }
    loaded
}

fn try_load(path: &Path, format: Option<Format>, report: &mut ComplianceReport) -> Option<(Format, Environment)> {
    let (format, bytes) = open(path, format, report)?;
    syntax(path, format, &bytes, report)?;
    let env = decode(path, format, &bytes, report)?;
    Some((format, env))
}

fn open(path: &Path, format: Option<Format>, report: &mut ComplianceReport) -> Option<(Format, Vec<u8>)> {
    let Some(format) = format.or_else(|| Format::from_path(path)) else {
        report.push(TestResult::fail(path, OPEN, "unknown file extension, expected .json or .xml"));
        return None;
    };
    match std::fs::read(path) {
        Ok(bytes) => {
            report.push(TestResult::pass(path, OPEN, format!("read {} bytes as {format}", bytes.len())));
            Some((format, bytes))
        }
        Err(err) => {
            report.push(TestResult::fail(path, OPEN, format!("cannot read file: {err}")));
            None
        }
    }
}

fn syntax(path: &Path, format: Format, bytes: &[u8], report: &mut ComplianceReport) -> Option<()> {
    let checked = match format {
        Format::Json => serde_json::from_slice::<serde_json::Value>(bytes)
            .map(drop)
            .map_err(|err| err.to_string()),
        Format::Xml => well_formed_xml(bytes),
    };
    match checked {
        Ok(()) => {
            report.push(TestResult::pass(path, SYNTAX, format!("well-formed {format}")));
            Some(())
        }
        Err(message) => {
            report.push(TestResult::fail(path, SYNTAX, message));
            None
        }
    }
}

fn well_formed_xml(bytes: &[u8]) -> Result<(), String> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut roots = 0usize;
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| format!("{err} at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(_) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Event::Empty(_) if depth == 0 => roots += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    match (roots, depth) {
        (0, _) => Err("document has no root element".to_owned()),
        (_, open) if open > 0 => Err(format!("unexpected end of input with {open} open element(s)")),
        (1, _) => Ok(()),
        (n, _) => Err(format!("document has {n} root elements")),
    }
}

fn decode(path: &Path, format: Format, bytes: &[u8], report: &mut ComplianceReport) -> Option<Environment> {
    tracing::debug!(file = %path.display(), %format, "decoding");
    match Decoder::new(DecodeOptions::strict()).decode_document(format, bytes) {
        Ok(env) if env.diagnostics.is_empty() => {
            report.push(TestResult::pass(path, DECODE, format!("{} identifiable(s)", env.len())));
            Some(env)
        }
        Ok(env) => {
            let details = env
                .diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.kind.as_str(), d.message))
                .collect();
            report.push(
                TestResult::warn(
                    path,
                    DECODE,
                    format!("{} identifiable(s), {} diagnostic(s)", env.len(), env.diagnostics.len()),
                )
                .with_details(details),
            );
            Some(env)
        }
        Err(err) => {
            let details = err.frames().iter().map(|frame| format!("-> {frame}")).collect();
            report.push(
                TestResult::fail(path, DECODE, format!("{}: {}", err.kind().as_str(), err.message()))
                    .with_details(details),
            );
            None
        }
    }
}

fn round_trip(path: &Path, format: Format, env: &Environment) -> TestResult {
    let mut bytes = Vec::new();
    if let Err(err) = aas_codec::encode_document(format, env, &mut bytes, &EncodeOptions::new()) {
        return TestResult::fail(path, ROUND_TRIP, format!("cannot encode: {err}"));
    }
    match Decoder::new(DecodeOptions::strict()).decode_document(format, bytes.as_slice()) {
        Ok(back) => {
            let found = differences(env, &back);
            if found.is_empty() {
                TestResult::pass(path, ROUND_TRIP, format!("re-encoded {} bytes without loss", bytes.len()))
            } else {
                TestResult::fail(path, ROUND_TRIP, "re-encoded document differs").with_details(found)
            }
        }
        Err(err) => TestResult::fail(path, ROUND_TRIP, format!("cannot decode re-encoded document: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_well_formedness() {
        assert!(well_formed_xml(b"<a><b/></a>").is_ok());
        assert_eq!(well_formed_xml(b"").err().as_deref(), Some("document has no root element"));
        assert!(well_formed_xml(b"<a><b>").is_err());
        assert_eq!(well_formed_xml(b"<a/><b/>").err().as_deref(), Some("document has 2 root elements"));
        assert!(well_formed_xml(b"<a></b>").is_err());
    }
}
