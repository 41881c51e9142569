//! AAS 3.0 serialization compliance checker.
//!
//! Runs a fixed sequence of steps over JSON and XML files and reports each
//! outcome. A file is compliant when it reads, parses, decodes in strict mode
//! and survives a re-encode without loss.
//!
//! # Steps
//!
//! | Step | Checks |
//! |------|--------|
//! | Open file | the file is readable and its extension names a format |
//! | Parse syntax | well-formed JSON or XML |
//! | Decode strictly | every entity constructs; diagnostics become warnings |
//! | Round trip | re-encoding and decoding yields the same content |
//! | Compare | two files, possibly of different formats, hold the same content |
//!
//! # Entry Point
//!
//! ```no_run
//! use aas_compliance::check_all;
//! use std::path::PathBuf;
//!
//! let report = check_all(&[PathBuf::from("models")], None).expect("Failed to walk models/");
//! assert!(report.all_passed());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod compare;
pub mod report;
pub mod steps;

use std::path::PathBuf;

use aas_codec::Format;
use walkdir::WalkDir;

pub use report::{ComplianceReport, Severity, Summary, TestResult};
pub use steps::{check_file, files_equal};

/// Expands directories into the JSON and XML files below them, sorted by
/// name. Other paths are kept as given.
///
/// # Errors
///
/// Returns an error if a directory cannot be traversed.
pub fn collect_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && Format::from_path(entry.path()).is_some() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Checks every file below `paths` and returns the aggregated report.
///
/// # Errors
///
/// Returns an error only if a directory cannot be traversed; unreadable
/// files are reported as failed steps.
pub fn check_all(paths: &[PathBuf], format: Option<Format>) -> anyhow::Result<ComplianceReport> {
    let mut report = ComplianceReport::new();
    for file in collect_files(paths)? {
        tracing::debug!(file = %file.display(), "checking");
        report.extend(check_file(&file, format));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const VALID: &str = r#"{"submodels":[{"modelType":"Submodel","id":"urn:example:sm","idShort":"Data",
        "submodelElements":[{"modelType":"Property","idShort":"Temperature","valueType":"xs:double","value":"23.5"}]}]}"#;

    const VALID_XML: &str = r#"<aas:environment xmlns:aas="https://admin-shell.io/aas/3/0"><aas:submodels>
        <aas:submodel><aas:idShort>Data</aas:idShort><aas:id>urn:example:sm</aas:id><aas:submodelElements>
        <aas:property><aas:idShort>Temperature</aas:idShort><aas:valueType>xs:double</aas:valueType><aas:value>23.5</aas:value></aas:property>
        </aas:submodelElements></aas:submodel></aas:submodels></aas:environment>"#;

    const MISSING_ID: &str = r#"<aas:environment xmlns:aas="https://admin-shell.io/aas/3/0"><aas:submodels>
        <aas:submodel><aas:idShort>Data</aas:idShort></aas:submodel></aas:submodels></aas:environment>"#;

    struct Scratch(PathBuf);

    impl Scratch {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("aas-compliance-{}-{name}", std::process::id()));
            let _ = std::fs::remove_dir_all(&dir);
            assert!(std::fs::create_dir_all(&dir).is_ok());
            Self(dir)
        }

        fn file(&self, name: &str, content: &str) -> PathBuf {
            let path = self.0.join(name);
            assert!(std::fs::write(&path, content).is_ok());
            path
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn severities(report: &ComplianceReport) -> Vec<(String, Severity)> {
        report
            .results
            .iter()
            .map(|r| (r.step.clone(), r.severity))
            .collect()
    }

    fn expected(list: &[(&str, Severity)]) -> Vec<(String, Severity)> {
        list.iter().map(|(s, v)| ((*s).to_owned(), *v)).collect()
    }

    #[test]
    fn valid_files_pass_every_step() {
        let scratch = Scratch::new("valid");
        for file in [scratch.file("env.json", VALID), scratch.file("env.xml", VALID_XML)] {
            let report = check_file(&file, None);
            assert_eq!(
                severities(&report),
                expected(&[
                    (steps::OPEN, Severity::Pass),
                    (steps::SYNTAX, Severity::Pass),
                    (steps::DECODE, Severity::Pass),
                    (steps::ROUND_TRIP, Severity::Pass),
                ]),
                "{report:?}"
            );
        }
    }

    #[test]
    fn decode_failure_skips_the_round_trip() {
        let scratch = Scratch::new("missing-id");
        let report = check_file(&scratch.file("env.xml", MISSING_ID), None);
        assert_eq!(
            severities(&report),
            expected(&[
                (steps::OPEN, Severity::Pass),
                (steps::SYNTAX, Severity::Pass),
                (steps::DECODE, Severity::Failure),
                (steps::ROUND_TRIP, Severity::NotExecuted),
            ])
        );
        let decode = &report.results[2];
        assert_eq!(decode.message, "MissingRequiredChild: aas:submodel on line 2 has no child aas:id!");
        assert_eq!(decode.details.len(), 1);
    }

    #[test]
    fn syntax_failure_skips_the_rest() {
        let scratch = Scratch::new("syntax");
        let report = check_file(&scratch.file("env.json", "{\"submodels\": ["), None);
        assert_eq!(
            severities(&report),
            expected(&[
                (steps::OPEN, Severity::Pass),
                (steps::SYNTAX, Severity::Failure),
                (steps::DECODE, Severity::NotExecuted),
                (steps::ROUND_TRIP, Severity::NotExecuted),
            ])
        );
    }

    #[test]
    fn unknown_extension_fails_to_open() {
        let report = check_file(Path::new("model.aasx"), None);
        assert_eq!(report.results[0].severity, Severity::Failure);
        assert_eq!(report.summary().skipped, 3);
    }

    #[test]
    fn equal_across_formats() {
        let scratch = Scratch::new("equal");
        let json = scratch.file("env.json", VALID);
        let xml = scratch.file("env.xml", VALID_XML);
        let report = files_equal(&json, &xml);
        assert!(report.all_passed(), "{report:?}");
        assert_eq!(report.results.last().map(|r| r.step.as_str()), Some(steps::COMPARE));

        let other = scratch.file("other.json", &VALID.replace("23.5", "24"));
        let report = files_equal(&json, &other);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(
            report.results.last().map(|r| r.details.clone()),
            Some(vec!["submodels: urn:example:sm differs".to_owned()])
        );
    }

    #[test]
    fn directories_are_walked() {
        let scratch = Scratch::new("walk");
        scratch.file("b.xml", VALID_XML);
        scratch.file("a.json", VALID);
        scratch.file("notes.txt", "not a model");
        let files = collect_files(&[scratch.0.clone()]).unwrap_or_default();
        let names: Vec<_> = files
            .iter()
            .filter_map(|f| f.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.json", "b.xml"]);

        let report = check_all(&[scratch.0.clone()], None);
        assert_eq!(report.map(|r| r.results.len()).ok(), Some(8));
    }
}
