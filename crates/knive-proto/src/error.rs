//! Error types shared by the backend client and the pipeline tree.

use thiserror::Error;

use crate::pipeline::OutletKind;

/// Failures talking to the knive backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Backend unreachable, timed out, or answered with a 5xx.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Parse(String),

    /// Backend refused the request (4xx).
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Input rejected before any request was made.
    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl BackendError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Local validation failures on a show's pipeline tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Each outlet kind may appear once per show.
    #[error("Outlet {0} already exists")]
    DuplicateOutlet(OutletKind),

    #[error("No outlet named '{0}'")]
    NotFound(String),

    /// `segment` is the first path component that matched no child.
    #[error("Invalid path '{path}': no child named '{segment}'")]
    InvalidPath { path: String, segment: String },

    #[error("Unknown outlet kind '{0}'")]
    UnknownOutletKind(String),

    #[error("Malformed pipeline tree: {0}")]
    Malformed(String),
}
