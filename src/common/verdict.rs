use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    CompileError,
    RuntimeError,
    TimedOut,
    /// Custom-input run, nothing to compare against
    Executed,
}

impl Outcome {
    /// Whether the CLI should exit successfully for this outcome
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Passed | Outcome::Executed)
    }

    /// Whether the run produced an error diagnostic instead of comparable output
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Outcome::CompileError | Outcome::RuntimeError | Outcome::TimedOut
        )
    }

    /// Short label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed => "FAILED",
            Outcome::CompileError => "COMPILE ERROR",
            Outcome::RuntimeError => "RUNTIME ERROR",
            Outcome::TimedOut => "TIMED OUT",
            Outcome::Executed => "EXECUTED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::CompileError => "compile_error",
            Outcome::RuntimeError => "runtime_error",
            Outcome::TimedOut => "timed_out",
            Outcome::Executed => "executed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Passed.to_string(), "passed");
        assert_eq!(Outcome::CompileError.to_string(), "compile_error");
        assert_eq!(Outcome::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn test_outcome_success() {
        assert!(Outcome::Passed.is_success());
        assert!(Outcome::Executed.is_success());
        assert!(!Outcome::Failed.is_success());
        assert!(Outcome::TimedOut.is_error());
        assert!(!Outcome::Failed.is_error());
    }

    #[test]
    fn test_outcome_serde() {
        let json = serde_json::to_string(&Outcome::RuntimeError).unwrap();
        assert_eq!(json, "\"runtime_error\"");
    }
}
