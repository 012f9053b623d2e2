//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Every terminal outcome of the pipeline is a [`Response`]: a result body,
//! an error body, or an empty preflight answer. Producing one ends the
//! request; the engine never writes two.

use bytes::Bytes;
use http_body_util::Full;
use serde_json::{Value, json};
use tracing::error;

use crate::error::FunctionError;
use crate::status::Status;

/// Content type of every JSON body the gateway renders.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use engine_gate::{Response, Status};
/// use serde_json::json;
///
/// Response::json(&json!({"result": "ok"}));
/// Response::error(Status::Unauthorized, 401, "Unauthorized");
/// Response::builder()
///     .status(Status::Ok)
///     .header("access-control-max-age", "86400")
///     .no_body();
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200 OK` with `value` serialised as the body.
    pub fn json(value: &Value) -> Self {
        Self::builder().json(value)
    }

    /// `{"code": code, "error": message}` with the given status.
    pub fn error(status: impl Into<u16>, code: i64, message: &str) -> Self {
        Self::builder()
            .status(status)
            .json(&json!({ "code": code, "error": message }))
    }

    /// Response with no body.
    pub fn status(code: impl Into<u16>) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code.into() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok.into() }
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body parsed as JSON; `None` for empty or non-JSON bodies.
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Sets `name`, replacing any previous value.
    pub(crate) fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|e| {
                error!("unrenderable response: {e}");
                let mut fallback = http::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: impl Into<u16>) -> Self {
        self.status = code.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body.
    pub fn json(self, value: &Value) -> Response {
        let mut headers = vec![("content-type".to_owned(), JSON_CONTENT_TYPE.to_owned())];
        headers.extend(self.headers);
        Response { body: value.to_string().into_bytes(), headers, status: self.status }
    }

    /// Terminate with no body (e.g. a CORS preflight).
    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

/// Handler failures render as `{"code", "error"}` with the derived status.
impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        Response::error(self.status(), self.code, &self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_shape() {
        let res = Response::error(Status::Unauthorized, 401, "Unauthorized");
        assert_eq!(res.status_code(), 401);
        assert_eq!(res.header("Content-Type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(res.body_json(), Some(json!({"code": 401, "error": "Unauthorized"})));
    }

    #[test]
    fn function_error_keeps_its_code() {
        let res = FunctionError::new("bad input").with_code(142).into_response();
        assert_eq!(res.status_code(), 400);
        assert_eq!(res.body_json(), Some(json!({"code": 142, "error": "bad input"})));
    }

    #[test]
    fn set_header_replaces() {
        let mut res = Response::builder().header("X-A", "1").no_body();
        res.set_header("x-a", "2");
        assert_eq!(res.header("X-A"), Some("2"));
        assert_eq!(res.headers.len(), 1);
    }

    #[test]
    fn converts_to_http() {
        let http = Response::json(&json!({"result": 1})).into_http();
        assert_eq!(http.status(), http::StatusCode::OK);
        assert_eq!(http.headers()["content-type"], JSON_CONTENT_TYPE);
    }
}
