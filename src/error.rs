use std::path::PathBuf;
use thiserror::Error;

/// Every failure is terminal for the `convert` call that produced it.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported file type: {path} (expected a .pdf file)")]
    UnsupportedFileType { path: PathBuf },

    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Either the identification command reported no pages or the
    /// selected page index is out of range.
    #[error("invalid page number: {detail}")]
    InvalidPageCount { detail: String },

    #[error("invalid input file path: the document handle has no filesystem path")]
    InvalidInputPath,

    #[error("cannot write output file {path}: {detail}")]
    WriteFailed { path: PathBuf, detail: String },

    #[error("zero sized output image detected: {path}")]
    EmptyOutput { path: PathBuf },

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read input {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Stable kind name, used in event payloads and the CLI summary.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::UnsupportedFileType { .. } => "unsupported_file_type",
            ConvertError::InputNotFound { .. } => "input_not_found",
            ConvertError::InvalidPageCount { .. } => "invalid_page_count",
            ConvertError::InvalidInputPath => "invalid_input_path",
            ConvertError::WriteFailed { .. } => "write_failed",
            ConvertError::EmptyOutput { .. } => "empty_output",
            ConvertError::ToolFailed { .. } => "tool_failed",
            ConvertError::OutputDir { .. } => "output_dir",
            ConvertError::Io { .. } => "io",
        }
    }
}
