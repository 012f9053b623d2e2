//! Header dialect resolution.
//!
//! Three generations of client libraries send the same credential under
//! different names. Each logical header is a chain of physical names, most
//! current first; the first one carrying a non-empty value wins.

use crate::request::Request;

pub const APP_ID: &[&str] = &[
    "X-LC-Id",
    "X-AVOSCloud-Application-Id",
    "X-Uluru-Application-Id",
];

pub const APP_KEY: &[&str] = &[
    "X-LC-Key",
    "X-AVOSCloud-Application-Key",
    "X-Uluru-Application-Key",
];

/// There is no current-generation master key header; current clients send
/// `"<masterKey>,master"` through [`APP_KEY`] instead.
pub const MASTER_KEY: &[&str] = &[
    "X-AVOSCloud-Master-Key",
    "X-Uluru-Master-Key",
];

pub const SESSION_TOKEN: &[&str] = &[
    "X-LC-Session",
    "X-AVOSCloud-Session-Token",
    "X-Uluru-Session-Token",
];

pub const SIGNATURE: &[&str] = &[
    "X-LC-Sign",
    "X-AVOSCloud-Request-Sign",
];

pub const PRODUCTION: &[&str] = &[
    "X-LC-Prod",
    "X-AVOSCloud-Application-Production",
    "X-Uluru-Application-Production",
];

pub const ORIGIN: &[&str] = &["Origin"];

pub const CONTENT_TYPE: &[&str] = &["Content-Type"];

/// Proxy headers naming the client, nearest-to-client first. The TCP peer
/// address is consulted only when none is present.
pub const REMOTE_ADDRESS: &[&str] = &["X-Real-IP", "X-Forwarded-For"];

/// Value of the first header in `candidates` that is present and non-empty.
///
/// Name comparison is case-insensitive, so it does not matter how the
/// transport normalised header names.
pub fn resolve<'a>(req: &'a Request, candidates: &[&str]) -> Option<&'a str> {
    candidates.iter()
        .filter_map(|name| req.header(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    fn req() -> Request {
        Request::new(Method::Post, "/1.1/functions/hello")
    }

    #[test]
    fn current_dialect_wins() {
        let req = req()
            .with_header("X-Uluru-Application-Id", "legacy-b")
            .with_header("X-LC-Id", "current")
            .with_header("X-AVOSCloud-Application-Id", "legacy-a");
        assert_eq!(resolve(&req, APP_ID), Some("current"));
    }

    #[test]
    fn falls_back_through_legacy_names() {
        let req = req().with_header("x-uluru-application-id", "legacy-b");
        assert_eq!(resolve(&req, APP_ID), Some("legacy-b"));

        let req = req
            .with_header("X-AVOSCloud-Application-Id", "legacy-a");
        assert_eq!(resolve(&req, APP_ID), Some("legacy-a"));
    }

    #[test]
    fn empty_values_are_skipped() {
        let req = req()
            .with_header("X-LC-Session", "")
            .with_header("X-AVOSCloud-Session-Token", "  ")
            .with_header("X-Uluru-Session-Token", "tok");
        assert_eq!(resolve(&req, SESSION_TOKEN), Some("tok"));
    }

    #[test]
    fn absent_everywhere() {
        assert_eq!(resolve(&req(), MASTER_KEY), None);
    }
}
