//! Test results and their text rendering

use crate::error::TestError;
use std::fmt::Write;

/// Outcome of one test case
#[derive(Debug)]
pub struct TestResult {
    /// Test function name
    pub name: String,
    /// Failure, if any
    pub error: Option<TestError>,
}

impl TestResult {
    /// Passing result
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: None,
        }
    }

    /// True when the case passed
    pub fn is_pass(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of a suite, in execution order
pub type Results = Vec<TestResult>;

/// Render a suite's results
///
/// ```text
/// Test results: "tests/foo_test.tes"
/// - PASS: testA
/// - FAIL: testB
///         <error>
/// ```
pub fn pretty_print_results(results: &[TestResult], script_path: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Test results: {script_path:?}");
    for result in results {
        out.push_str(&pretty_print_result(&result.name, result.error.as_ref()));
        out.push('\n');
    }
    out
}

/// Render one case
pub fn pretty_print_result(name: &str, error: Option<&TestError>) -> String {
    match error {
        None => format!("- PASS: {name}"),
        Some(err) => {
            let message = err.to_string().replace('\n', "\n\t\t\t");
            format!("- FAIL: {name}\n\t\t{message}")
        }
    }
}
