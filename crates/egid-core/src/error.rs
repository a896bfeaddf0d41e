//! Error types for the egid-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the egid library.
#[derive(Error, Debug)]
pub enum EgidError {
    /// Rejected image reference.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// OCR process execution error.
    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    /// OCR output parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Result store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to validating the image reference.
#[derive(Error, Debug)]
pub enum InputError {
    /// The reference is not a well-formed URL.
    #[error("invalid image URL: {0}")]
    InvalidUrl(String),

    /// The URL host is not in the configured allow-list.
    #[error("domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// The local image file does not exist.
    #[error("image file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The local image file exists but could not be inspected.
    #[error("cannot read image file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local image file exceeds the configured size limit.
    #[error("image file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },
}

/// Errors related to running the external OCR program.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The process could not be started.
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The process exited with a non-zero status.
    #[error("command execution failed (exit code {}): {output}", exit_code(.code))]
    Failure { code: Option<i32>, output: String },

    /// The process did not finish in time and was killed.
    #[error("process timed out after {secs}s")]
    Timeout { secs: u64 },
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

/// Errors related to parsing the OCR program's output.
#[derive(Error, Debug)]
pub enum ParseError {
    /// No line of the output starts with `{`.
    #[error("no JSON found in output: {0}")]
    NoStructuredOutput(String),

    /// The structured line could not be decoded as a JSON object.
    #[error("failed to parse JSON ({reason}): {line}")]
    MalformedOutput { line: String, reason: String },
}

/// Errors related to the result store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No store handle was configured.
    #[error("no result store configured")]
    NotConfigured,

    /// Underlying SQLite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Database file or directory could not be created.
    #[error("database I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema migration failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// A stored row could not be decoded.
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

/// Coarse failure category, used for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ProcessFailure,
    Timeout,
    NoStructuredOutput,
    MalformedOutput,
    PersistenceFailure,
    Configuration,
}

impl EgidError {
    /// Get the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EgidError::Input(_) => ErrorKind::InvalidInput,
            EgidError::Process(ProcessError::Timeout { .. }) => ErrorKind::Timeout,
            EgidError::Process(_) => ErrorKind::ProcessFailure,
            EgidError::Parse(ParseError::NoStructuredOutput(_)) => ErrorKind::NoStructuredOutput,
            EgidError::Parse(ParseError::MalformedOutput { .. }) => ErrorKind::MalformedOutput,
            EgidError::Store(_) => ErrorKind::PersistenceFailure,
            EgidError::Io(_) => ErrorKind::ProcessFailure,
            EgidError::Config(_) => ErrorKind::Configuration,
        }
    }
}

/// Result type for the egid library.
pub type Result<T> = std::result::Result<T, EgidError>;
