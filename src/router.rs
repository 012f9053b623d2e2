//! Path classification.
//!
//! The engine serves one family of paths, `/{1,1.1}/{functions,call}/…`,
//! plus a health ping. A radix tree matches the fixed prefixes; the
//! remainder is split on `/` and its shape picks the handler category.

use matchit::Router as MatchitRouter;

use crate::method::Method;

/// Health ping prefix. Answered before any header is read.
pub const PING_PREFIX: &str = "/__engine/1/ping";

/// What a request is asking for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Route {
    Ping,
    Preflight,
    MetadataQuery,
    /// `decode_objects` is set on the `call` endpoint, whose parameters and
    /// result travel as fully typed JSON.
    FunctionCall { name: String, decode_objects: bool },
    /// Email or SMS verification completed; `kind` is `sms` or `email`.
    OnVerifiedHook { kind: String },
    OnLoginHook,
    OnInsightHook,
    ClassHook { class_name: String, hook_name: String },
    /// Under a function prefix, but no handler takes this remainder.
    UnknownShape,
    NoMatch,
}

/// The two endpoint spellings. They differ only in argument decoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Endpoint {
    Functions,
    Call,
}

/// Classifies `(method, path)` pairs. Build once; share freely.
pub struct Router {
    tree: MatchitRouter<Endpoint>,
}

impl Router {
    pub fn new() -> Self {
        let mut tree = MatchitRouter::new();
        for version in ["1", "1.1"] {
            for (name, endpoint) in [("functions", Endpoint::Functions), ("call", Endpoint::Call)] {
                for pattern in [format!("/{version}/{name}"), format!("/{version}/{name}/{{*rest}}")] {
                    tree.insert(pattern.as_str(), endpoint)
                        .unwrap_or_else(|e| panic!("invalid route `{pattern}`: {e}"));
                }
            }
        }
        Self { tree }
    }

    /// Trailing slashes are ignored. `OPTIONS` on any function path is a
    /// preflight, whatever the remainder looks like.
    pub fn classify(&self, method: Method, path: &str) -> Route {
        let path = path.trim_end_matches('/');
        if path.starts_with(PING_PREFIX) {
            return Route::Ping;
        }

        let Ok(matched) = self.tree.at(path) else {
            return Route::NoMatch;
        };
        if method == Method::Options {
            return Route::Preflight;
        }

        let rest = matched.params.get("rest").unwrap_or("");
        classify_rest(*matched.value, rest)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn classify_rest(endpoint: Endpoint, rest: &str) -> Route {
    if rest.starts_with("_ops/metadatas") {
        return Route::MetadataQuery;
    }

    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        [name] if !name.is_empty() => Route::FunctionCall {
            name: (*name).to_owned(),
            decode_objects: endpoint == Endpoint::Call,
        },
        ["onVerified", kind, ..] if !kind.is_empty() => Route::OnVerifiedHook {
            kind: (*kind).to_owned(),
        },
        ["_User", "onLogin", ..] => Route::OnLoginHook,
        ["BigQuery" | "Insight", ..] => Route::OnInsightHook,
        [class_name, hook_name] if !class_name.is_empty() && !hook_name.is_empty() => Route::ClassHook {
            class_name: (*class_name).to_owned(),
            hook_name: (*hook_name).to_owned(),
        },
        _ => Route::UnknownShape,
    }
}
