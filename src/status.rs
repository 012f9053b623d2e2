//! The HTTP statuses the gateway itself decides on.
//!
//! Handler errors carry their own numeric status (see
//! [`FunctionError::status`](crate::FunctionError::status)), so everything that
//! takes a status accepts `impl Into<u16>`: a [`Status`] or a bare number.
//!
//! ```rust
//! use engine_gate::{Response, Status};
//!
//! Response::status(Status::MethodNotAllowed);
//! Response::builder().status(418u16).no_body();
//! ```

/// Statuses produced by the gateway pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,               // 200
    BadRequest,       // 400
    Unauthorized,     // 401
    NotFound,         // 404
    MethodNotAllowed, // 405
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok               => 200,
            Status::BadRequest       => 400,
            Status::Unauthorized     => 401,
            Status::NotFound         => 404,
            Status::MethodNotAllowed => 405,
        }
    }
}
