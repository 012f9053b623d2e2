//! CORS negotiation for the function endpoints.
//!
//! Every response on a function path echoes the caller's origin. An
//! `OPTIONS` request is answered here and goes no further.

use crate::response::Response;
use crate::status::Status;

/// Request headers a browser may send cross-origin: every credential dialect
/// plus the handful of standard ones clients set.
pub const ALLOWED_HEADERS: &[&str] = &[
    "X-LC-Id",
    "X-LC-Key",
    "X-LC-Session",
    "X-LC-Sign",
    "X-LC-Prod",
    "X-Uluru-Application-Key",
    "X-Uluru-Application-Id",
    "X-Uluru-Application-Production",
    "X-Uluru-Client-Version",
    "X-Uluru-Master-Key",
    "X-Uluru-Session-Token",
    "X-AVOSCloud-Application-Key",
    "X-AVOSCloud-Application-Id",
    "X-AVOSCloud-Application-Production",
    "X-AVOSCloud-Client-Version",
    "X-AVOSCloud-Master-Key",
    "X-AVOSCloud-Super-Key",
    "X-AVOSCloud-Session-Token",
    "X-AVOSCloud-Request-sign",
    "X-Requested-With",
    "Content-Type",
];

pub const ALLOWED_METHODS: &str = "PUT, GET, POST, DELETE, OPTIONS";

/// Preflight results may be cached for a day.
pub const MAX_AGE_SECS: u32 = 86_400;

/// The request origin, or `*` when the request named none.
pub fn allow_origin(origin: Option<&str>) -> &str {
    origin.unwrap_or("*")
}

/// Stamps `Access-Control-Allow-Origin` on an outgoing response.
pub fn apply(res: &mut Response, origin: Option<&str>) {
    res.set_header("access-control-allow-origin", allow_origin(origin));
}

/// Complete answer to an `OPTIONS` request: `200` with an empty body.
pub fn preflight(origin: Option<&str>) -> Response {
    Response::builder()
        .status(Status::Ok)
        .header("access-control-allow-origin", allow_origin(origin))
        .header("access-control-max-age", &MAX_AGE_SECS.to_string())
        .header("access-control-allow-methods", ALLOWED_METHODS)
        .header("access-control-allow-headers", &ALLOWED_HEADERS.join(", "))
        .header("content-length", "0")
        .no_body()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn preflight_echoes_origin() {
        let res = preflight(Some("https://x.test"));
        assert_eq!(res.status_code(), 200);
        assert!(res.body().is_empty());
        assert_eq!(res.header("Access-Control-Allow-Origin"), Some("https://x.test"));
        assert_eq!(res.header("Access-Control-Max-Age"), Some("86400"));
        assert_eq!(res.header("Content-Length"), Some("0"));

        let allowed = res.header("Access-Control-Allow-Headers").unwrap();
        for name in ["X-LC-Id", "X-AVOSCloud-Session-Token", "X-Uluru-Application-Id", "Content-Type"] {
            assert!(allowed.contains(name), "{name} missing from {allowed}");
        }
    }

    #[test]
    fn wildcard_without_origin() {
        let res = preflight(None);
        assert_eq!(res.header("access-control-allow-origin"), Some("*"));

        let mut res = Response::json(&json!({}));
        apply(&mut res, None);
        apply(&mut res, Some("https://y.test"));
        assert_eq!(res.header("access-control-allow-origin"), Some("https://y.test"));
    }
}
