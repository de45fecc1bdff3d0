use thiserror::Error;

/// Main error type for the Rusty Merge crate.
/// Aggregates errors from the standard library, dependencies and the internal modules.
#[derive(Error, Debug)]
pub enum RustyMergeError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    // Loader errors
    #[error("{0}")]
    FormatError(#[from] crate::loader::FormatError),

    #[error("{0}")]
    ParseError(#[from] crate::loader::ParseError),

    // Table, join and selection errors
    #[error("{0}")]
    ValidationError(#[from] crate::table::ValidationError),

    // Settings and merge configuration errors
    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

/// User-facing error categories reported at each workflow step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unsupported file type
    Format,
    /// Malformed file content
    Parse,
    /// Missing or mismatched columns and other input checks
    Validation,
    /// Settings or saved merge configuration problems
    Config,
    /// Reading or writing bytes failed
    Io,
}

impl RustyMergeError {
    /// Returns the category this error is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FormatError(_) => ErrorKind::Format,
            Self::ParseError(_) => ErrorKind::Parse,
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::ConfigError(_) | Self::JsonError(_) => ErrorKind::Config,
            Self::WithContextError(_)
            | Self::IoError(_)
            | Self::CsvError(_)
            | Self::ZipError(_)
            | Self::XmlError(_) => ErrorKind::Io,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Format => "Format error",
            ErrorKind::Parse => "Parse error",
            ErrorKind::Validation => "Validation error",
            ErrorKind::Config => "Configuration error",
            ErrorKind::Io => "I/O error",
        };
        write!(f, "{}", label)
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, RustyMergeError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| RustyMergeError::WithContextError(format!("{}: {}", message, e)))
    }
}
