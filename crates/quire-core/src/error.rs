// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quire.
//
// `QuireError` covers everything that can go wrong once a tool run has
// started.  Admission problems are not errors: the validation gate reports
// them as a `Rejection` inside its outcome.

use thiserror::Error;

/// Top-level error type for all Quire operations.
#[derive(Debug, Error)]
pub enum QuireError {
    // -- Transport --
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("server returned status {status}{}", status_suffix(.message))]
    Status { status: u16, message: Option<String> },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // -- Remote jobs --
    #[error("remote job failed: {0}")]
    Remote(String),

    #[error("upload of '{file}' failed: {detail}")]
    Upload { file: String, detail: String },

    #[error("file '{0}' has no server filename")]
    MissingServerFilename(String),

    #[error("remote job still running after {attempts} status checks")]
    PollingExhausted { attempts: u32 },

    #[error("no result is available for download")]
    NoResult,

    // -- Pre-flight --
    #[error("invalid page range: {0}")]
    InvalidPageRange(String),

    #[error("{0}")]
    Preflight(String),

    #[error("no files selected")]
    NoFiles,

    #[error("this tool needs exactly {expected} files, got {actual}")]
    WrongFileCount { expected: usize, actual: usize },

    #[error("parameters for '{given}' cannot be used with the '{tool}' tool")]
    ParamsMismatch { tool: String, given: String },

    // -- Documents --
    #[error("PDF inspection failed: {0}")]
    Pdf(String),

    #[error("unknown file: {0}")]
    UnknownFile(String),

    // -- Configuration / local --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuireError>;

fn status_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

/// Why the validation gate refused a batch of candidate files.
///
/// The gate short-circuits, so a batch carries exactly one reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Neither the MIME type nor the extension is accepted by the tool.
    InvalidType { names: Vec<String> },
    /// Admitting the batch would exceed the tool's file-count limit.
    TooManyFiles { limit: usize, attempted: usize },
    /// Admitting the batch would exceed the tool's aggregate size limit.
    /// Both figures are megabytes rounded to two decimals.
    TooLarge { total_mb: f64, limit_mb: f64 },
    /// The file claims to be a PDF but has no `%PDF-` header.
    NotPdf { names: Vec<String> },
    /// The tool needs password-protected input but these files are open.
    NotProtected { names: Vec<String> },
    /// The tool needs open input but these files are password-protected.
    Protected { names: Vec<String> },
}

impl Rejection {
    /// File names the rejection applies to (empty for batch-level limits).
    pub fn names(&self) -> &[String] {
        match self {
            Self::InvalidType { names }
            | Self::NotPdf { names }
            | Self::NotProtected { names }
            | Self::Protected { names } => names,
            Self::TooManyFiles { .. } | Self::TooLarge { .. } => &[],
        }
    }

    /// Whether the rejection should prompt the user to upgrade their plan.
    pub fn is_upgrade_prompt(&self) -> bool {
        matches!(self, Self::TooManyFiles { .. } | Self::TooLarge { .. })
    }
}
