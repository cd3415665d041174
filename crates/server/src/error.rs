//! Errors raised by the host side of the server.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// No open window has this id.
    #[error("UNKNOWN_WINDOW: {0}")]
    UnknownWindow(String),

    /// A window URL that is not absolute.
    #[error("INVALID_WINDOW_URL: {0}")]
    InvalidWindowUrl(String),
}

impl From<HostError> for tether_core::Error {
    fn from(err: HostError) -> Self {
        tether_core::Error::InvalidInput(err.to_string())
    }
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        McpError { code: ErrorCode(-32602), message: err.to_string().into(), data: None }
    }
}
