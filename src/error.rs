use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

/// Unified error type for the semantic core.
///
/// Ordinary type errors are reported as diagnostics and recovered from
/// locally; `Error` is reserved for conditions that abort the current
/// compilation unit.
#[derive(Debug)]
pub enum Error {
    Fatal(FatalError),
    Internal {
        message: String,
        backtrace: Option<Backtrace>,
    },
}

/// Conditions that terminate checking of the current unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// The typer exceeded its recursion budget.
    RecursionLimitExceeded { depth: usize },
    /// Implicit search nested deeper than the configured cap.
    SearchDepthExceeded { depth: usize },
}

/// Convenience result alias used across the semantic core.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Construct a new internal invariant violation.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: capture_backtrace(),
        }
    }

    /// Return the captured backtrace, if any.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            Error::Internal { backtrace, .. } => backtrace.as_ref(),
            Error::Fatal(_) => None,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal(_))
    }
}

fn capture_backtrace() -> Option<Backtrace> {
    if cfg!(debug_assertions) {
        Some(Backtrace::force_capture())
    } else {
        None
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::RecursionLimitExceeded { depth } => {
                write!(f, "recursion limit exceeded while typing (depth {depth})")
            }
            FatalError::SearchDepthExceeded { depth } => {
                write!(f, "implicit search nested too deeply (depth {depth})")
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Fatal(err) => write!(f, "fatal error: {err}"),
            Error::Internal { message, .. } => write!(f, "internal error: {message}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        None
    }
}

impl From<FatalError> for Error {
    fn from(error: FatalError) -> Self {
        Error::Fatal(error)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::internal(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_variants() {
        let fatal = Error::from(FatalError::RecursionLimitExceeded { depth: 512 });
        assert_eq!(
            fatal.to_string(),
            "fatal error: recursion limit exceeded while typing (depth 512)"
        );

        let search = Error::from(FatalError::SearchDepthExceeded { depth: 64 });
        assert_eq!(
            search.to_string(),
            "fatal error: implicit search nested too deeply (depth 64)"
        );

        let internal = Error::internal("denotation missing");
        assert_eq!(internal.to_string(), "internal error: denotation missing");
    }

    #[test]
    fn fatal_errors_have_no_backtrace() {
        let fatal = Error::from(FatalError::RecursionLimitExceeded { depth: 1 });
        assert!(fatal.backtrace().is_none());
        assert!(fatal.is_fatal());
    }

    #[test]
    fn debug_builds_capture_backtrace() {
        if cfg!(debug_assertions) {
            let err = Error::internal("capture");
            assert!(err.backtrace().is_some());
        }
    }
}
