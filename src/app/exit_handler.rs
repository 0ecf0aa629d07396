//! Exit code logic for the socialctl process.
//!
//! Single responsibility: map success/failure counts to the process exit outcome.

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every account (or decode target) succeeded.
    Success,
    /// Some succeeded, some failed.
    Partial,
    /// Nothing succeeded, or the command could not run.
    Failure,
}

impl ProcessExit {
    /// Numeric process exit code.
    pub(crate) fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
        }
    }
}

/// Determines the exit outcome from succeeded and failed counts.
pub(crate) fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::{ProcessExit, determine_exit_outcome};

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        assert_eq!(determine_exit_outcome(3, 0), ProcessExit::Success);
        assert_eq!(ProcessExit::Success.code(), 0);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        assert_eq!(determine_exit_outcome(2, 1), ProcessExit::Partial);
        assert_eq!(ProcessExit::Partial.code(), 2);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        assert_eq!(determine_exit_outcome(0, 2), ProcessExit::Failure);
        assert_eq!(ProcessExit::Failure.code(), 1);
    }
}
