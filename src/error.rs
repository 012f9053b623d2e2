//! Error types.
//!
//! Two families:
//!
//! - [`Error`] surfaces infrastructure failures: binding to a port or
//!   accepting a connection. The engine never produces one while serving.
//! - [`FunctionError`] is what user code raises. The engine renders it as a
//!   `{"code": …, "error": …}` body and ends the request.
//!
//! Application-level outcomes (401, 404, a hook that refused a save) are
//! expressed as [`Response`](crate::Response) values, not as `Error`s.

use std::net::AddrParseError;

/// The error type returned by the server's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bind address: {0}")]
    Addr(#[from] AddrParseError),
}

/// An error raised by a registered function or hook.
///
/// `code` travels to the client verbatim. The HTTP status is derived from it
/// by [`FunctionError::status`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct FunctionError {
    pub message: String,
    pub code: i64,
}

impl FunctionError {
    /// An error with the generic code `1`, rendered as `400 Bad Request`.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), code: 1 }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    /// Raised when the registry has nothing under the requested key.
    pub fn not_found() -> Self {
        Self::new("Cloud function not found.").with_code(404)
    }

    /// HTTP status for this error: codes in `400..=599` are used as-is,
    /// everything else (platform codes such as `142`) maps to `400`.
    pub fn status(&self) -> u16 {
        match u16::try_from(self.code) {
            Ok(code @ 400..=599) => code,
            _ => 400,
        }
    }
}
