//! Output verification
//!
//! Comparison is whole-batch: every sample's expected output is joined into
//! one blob and compared against everything the solution printed.

use crate::samples::SampleSet;

/// Leading whitespace and trailing line breaks are insignificant; trailing
/// spaces on the last line are not.
fn normalize(s: &str) -> &str {
    s.trim_start().trim_end_matches(['\n', '\r'])
}

/// Compare actual against expected output after normalization
pub fn compare(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}

/// Verify a solution's full output against all samples at once
pub fn verify(samples: &SampleSet, actual: &str) -> bool {
    compare(actual, &samples.joined_output())
}
