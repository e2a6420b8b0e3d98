use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for core data-model operations.
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A version label or constraint expression could not be parsed.
    #[error("Parse error: {message}")]
    #[diagnostic(help("Supported constraint forms: `*`, `@token`, `=1.5`, `>=1.0 <2.0`"))]
    Parse { message: String },

    /// A timeline violated its structural invariants.
    #[error("Timeline error: {message}")]
    Timeline { message: String },

    /// Invalid or malformed configuration file.
    #[error("Config error: {message}")]
    #[diagnostic(help("Check the engine config TOML for syntax errors"))]
    Config { message: String },
}
