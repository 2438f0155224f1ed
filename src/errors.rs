use std::io;
use thiserror::Error;

/// An error from grill.
///
/// Errors scoped to a single test suite abort that suite only; the
/// caller logs them and moves on to the next suite. Failures while
/// assembling the shared execution environment are fatal for the whole
/// invocation.
#[derive(Debug, Error)]
pub enum GrillError {
    /// The parser could not interpret a line of a test file. Carries
    /// the 1-based line number within the file.
    #[error("syntax error parsing line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A test file could not be opened or read.
    #[error("couldn't read test file: {source}")]
    ReadTest { source: io::Error },

    /// A `.err` artifact or diff could not be written.
    #[error("couldn't write {path}: {source}")]
    WriteErr { path: String, source: io::Error },

    /// The child shell could not be started.
    #[error("couldn't run command: {source}")]
    SpawnShell { source: io::Error },

    /// The child shell broke the per-test output contract: it exited
    /// abnormally, or its output could not be attributed back to the
    /// tests that produced it.
    #[error("{0}")]
    Shell(String),

    /// Any other I/O failure (work-root setup, progress sink, pipes).
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl GrillError {
    pub(crate) fn syntax(line: usize, message: &str) -> GrillError {
        GrillError::Syntax {
            line,
            message: message.to_string(),
        }
    }
}
