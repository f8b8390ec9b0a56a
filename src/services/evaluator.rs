//! Contest submission evaluator.
//!
//! Runs every test case in the given order, compares trimmed stdout with the
//! trimmed expected output and never lets a hidden case's expected output
//! reach the caller.

use tracing::debug;

use crate::models::contest::{TestCase, TestCaseResult};
use crate::models::execution::ExecutionResult;
use crate::services::judge0::{CodeExecutor, ExecutionError};

const REDACTED: &str = "[hidden]";

/// Outcome of evaluating a submission.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// True iff every case passed; vacuously true for no cases
    pub solved: bool,
    pub results: Vec<TestCaseResult>,
}

/// Evaluate `code` against `cases`. Collaborator failures fail the case and
/// evaluation moves on to the next one.
pub async fn evaluate(
    executor: &dyn CodeExecutor,
    language: &str,
    code: &str,
    cases: &[TestCase],
) -> Evaluation {
    let mut results = Vec::with_capacity(cases.len());

    for (index, case) in cases.iter().enumerate() {
        let outcome = executor.execute(language, code, &case.input).await;
        let result = judge_case(index, case, outcome);
        debug!(index, passed = result.passed, hidden = case.is_hidden, "Test case evaluated");
        results.push(result);
    }

    Evaluation {
        solved: results.iter().all(|r| r.passed),
        results,
    }
}

/// Judge one case from the collaborator's outcome.
///
/// A hidden case's message is only its positional label and verdict, plus
/// masked detail on errors. The label's number counts cases and is not
/// derived from the expected output, so a short expected value such as `1`
/// may coincide with it.
pub fn judge_case(
    index: usize,
    case: &TestCase,
    outcome: Result<ExecutionResult, ExecutionError>,
) -> TestCaseResult {
    let label = if case.is_hidden {
        format!("Hidden Test Case {}", index + 1)
    } else {
        format!("Test Case {}", index + 1)
    };
    let expected = case.expected_output.trim();

    let (passed, message) = match outcome {
        Ok(result) if result.is_accepted() => {
            let actual = result.stdout.as_deref().unwrap_or("").trim();
            let passed = actual == expected;
            let verdict = if passed { "Passed" } else { "Failed" };
            let message = if case.is_hidden {
                format!("{}: {}", label, verdict)
            } else {
                format!(
                    "{}: {}\nInput: {}\nExpected: {}\nGot: {}",
                    label, verdict, case.input, expected, actual
                )
            };
            (passed, message)
        }
        Ok(result) => (false, error_message(&label, case, failure_text(&result))),
        Err(err) => (false, error_message(&label, case, &format!("Execution failed: {}", err))),
    };

    TestCaseResult {
        index,
        passed,
        hidden: case.is_hidden,
        message,
    }
}

/// Error message for a case; a hidden case's expected output is masked in the detail.
fn error_message(label: &str, case: &TestCase, detail: &str) -> String {
    let expected = case.expected_output.trim();
    if case.is_hidden && !expected.is_empty() {
        format!("{}: Error\n{}", label, detail.replace(expected, REDACTED))
    } else {
        format!("{}: Error\n{}", label, detail)
    }
}

/// First non-empty of stderr, compile output and status description.
fn failure_text(result: &ExecutionResult) -> &str {
    [
        result.stderr.as_deref(),
        result.compile_output.as_deref(),
        Some(result.status.description.as_str()),
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.trim().is_empty())
    .unwrap_or("Execution error")
}
