//! Compliance report types: step results, severity levels, and report aggregation.

use std::fmt;
use std::path::{Path, PathBuf};

/// Severity level of a compliance step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The step passed.
    Pass,
    /// The step passed with findings (non-blocking).
    Warning,
    /// The step failed (blocks compliance).
    Failure,
    /// The step was skipped because an earlier one failed.
    NotExecuted,
}

impl Severity {
    /// Four-letter tag used in printed reports.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warning => "WARN",
            Self::Failure => "FAIL",
            Self::NotExecuted => "SKIP",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The outcome of one step for one file.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// The file the step ran on.
    pub file: PathBuf,
    /// Name of the step.
    pub step: String,
    /// Human-readable message describing the outcome.
    pub message: String,
    /// Severity of the result.
    pub severity: Severity,
    /// Additional detail lines: error frames, diagnostics, differences.
    pub details: Vec<String>,
}

impl TestResult {
    fn new(file: &Path, step: &str, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            file: file.to_path_buf(),
            step: step.to_owned(),
            message: message.into(),
            severity,
            details: Vec::new(),
        }
    }

    /// Creates a passing result.
    pub fn pass(file: &Path, step: &str, message: impl Into<String>) -> Self {
        Self::new(file, step, message, Severity::Pass)
    }

    /// Creates a failure result.
    pub fn fail(file: &Path, step: &str, message: impl Into<String>) -> Self {
        Self::new(file, step, message, Severity::Failure)
    }

    /// Creates a warning result.
    pub fn warn(file: &Path, step: &str, message: impl Into<String>) -> Self {
        Self::new(file, step, message, Severity::Warning)
    }

    /// Creates a result for a step that did not run.
    pub fn not_executed(file: &Path, step: &str) -> Self {
        Self::new(file, step, "not executed", Severity::NotExecuted)
    }

    /// Attaches detail lines.
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Returns true if this result represents a failure.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}: {}", self.severity, self.file.display(), self.step, self.message)?;
        for detail in &self.details {
            write!(f, "\n       {detail}")?;
        }
        Ok(())
    }
}

/// Counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Passed steps.
    pub passed: usize,
    /// Steps with warnings.
    pub warned: usize,
    /// Failed steps.
    pub failed: usize,
    /// Skipped steps.
    pub skipped: usize,
}

/// Aggregated compliance report over all checked files.
#[derive(Debug, Default)]
pub struct ComplianceReport {
    /// All step results in the order they ran.
    pub results: Vec<TestResult>,
}

impl ComplianceReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result to this report.
    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Extends this report with results from another report.
    pub fn extend(&mut self, other: ComplianceReport) {
        self.results.extend(other.results);
    }

    /// Returns the count of failed steps.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Returns true if no step failed.
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }

    /// Tallies the results by severity.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for result in &self.results {
            match result.severity {
                Severity::Pass => summary.passed += 1,
                Severity::Warning => summary.warned += 1,
                Severity::Failure => summary.failed += 1,
                Severity::NotExecuted => summary.skipped += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_every_severity() {
        let file = Path::new("env.json");
        let mut report = ComplianceReport::new();
        report.push(TestResult::pass(file, "Open file", "ok"));
        report.push(TestResult::warn(file, "Decode", "2 diagnostics"));
        report.push(TestResult::fail(file, "Round trip", "differs"));
        report.push(TestResult::not_executed(file, "Compare"));
        let summary = report.summary();
        assert_eq!(
            summary,
            Summary {
                passed: 1,
                warned: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert!(!report.all_passed());
    }

    #[test]
    fn display_lists_details() {
        let result = TestResult::fail(Path::new("a.xml"), "Decode", "missing child")
            .with_details(vec!["-> Failed to construct aas:submodel".to_owned()]);
        assert_eq!(
            result.to_string(),
            "[FAIL] a.xml: Decode: missing child\n       -> Failed to construct aas:submodel"
        );
    }
}
