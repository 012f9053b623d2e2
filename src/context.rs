//! Per-request normalised context.
//!
//! Built once from the headers, optionally overwritten by credentials found
//! in a plain-text body, then handed to the authenticator. Never shared
//! between requests and never persisted.

use crate::headers::{self, resolve};
use crate::object::InvocationMeta;
use crate::request::Request;

/// Normalised view of who is calling and how.
///
/// `use_master` is private: only a successful master-tier authentication can
/// raise it (see [`crate::auth::authenticate`]). No client-supplied flag maps
/// onto it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub origin: Option<String>,
    pub content_type: Option<String>,
    pub remote_address: Option<String>,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub master_key: Option<String>,
    pub session_token: Option<String>,
    pub signature: Option<String>,
    pub use_production: bool,
    use_master: bool,
}

impl RequestContext {
    pub fn from_request(req: &Request) -> Self {
        let owned = |chain: &[&str]| resolve(req, chain).map(str::to_owned);

        let remote_address = resolve(req, headers::REMOTE_ADDRESS)
            .map(first_forwarded)
            .or_else(|| req.peer().map(|peer| peer.ip().to_string()));

        Self {
            origin: owned(headers::ORIGIN),
            content_type: owned(headers::CONTENT_TYPE),
            remote_address,
            app_id: owned(headers::APP_ID),
            app_key: owned(headers::APP_KEY),
            master_key: owned(headers::MASTER_KEY),
            session_token: owned(headers::SESSION_TOKEN),
            signature: owned(headers::SIGNATURE),
            use_production: resolve(req, headers::PRODUCTION).is_none_or(production_flag),
            use_master: false,
        }
    }

    pub fn use_master(&self) -> bool {
        self.use_master
    }

    pub(crate) fn grant_master(&mut self) {
        self.use_master = true;
    }

    /// Whether the body is `text/plain`, the CORS-safe encoding that carries
    /// credentials inside the body instead of in headers.
    pub fn is_plain_text(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/plain"))
    }

    pub fn meta(&self) -> InvocationMeta {
        InvocationMeta { remote_address: self.remote_address.clone() }
    }
}

/// Production is on unless the flag is literally `0` or `false`.
pub(crate) fn production_flag(value: &str) -> bool {
    let value = value.trim();
    !(value == "0" || value.eq_ignore_ascii_case("false"))
}

/// `X-Forwarded-For` may list the whole proxy chain; the client is first.
fn first_forwarded(value: &str) -> String {
    value.split(',').next().unwrap_or(value).trim().to_owned()
}
