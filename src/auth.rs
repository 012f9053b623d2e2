//! Authentication and session binding.
//!
//! Three credential tiers are tried in a fixed order; the first that
//! verifies wins. Master access comes from a credential string that names
//! itself master, or from the legacy master-key header, and from nothing else.

use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::object::CloudObject;
use crate::response::{IntoResponse, Response};
use crate::services::{KeyVerifier, SessionService};
use crate::status::Status;

/// The credential tier that authenticated a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tier {
    Signature,
    AppKey,
    MasterKey,
}

/// Verifies `ctx` and grants master access where earned.
///
/// On failure returns the terminal `401 {"code": 401, "error": "Unauthorized"}`.
pub async fn authenticate(
    ctx: &mut RequestContext,
    verifier: &dyn KeyVerifier,
) -> Result<Tier, Response> {
    let app_id = ctx.app_id.clone();
    let app_id = app_id.as_deref();

    if let Some(sign) = ctx.signature.clone() {
        if verifier.verify_sign(app_id, &sign).await {
            if sign.contains("master") {
                ctx.grant_master();
            }
            debug!(tier = ?Tier::Signature, master = ctx.use_master(), "authenticated");
            return Ok(Tier::Signature);
        }
    }

    if let Some(key) = ctx.app_key.clone() {
        if verifier.verify_key(app_id, &key).await {
            if key.contains("master") {
                ctx.grant_master();
            }
            debug!(tier = ?Tier::AppKey, master = ctx.use_master(), "authenticated");
            return Ok(Tier::AppKey);
        }
    }

    if let Some(master_key) = ctx.master_key.clone() {
        if verifier.verify_key(app_id, &format!("{master_key}, master")).await {
            ctx.grant_master();
            debug!(tier = ?Tier::MasterKey, "authenticated");
            return Ok(Tier::MasterKey);
        }
    }

    warn!(app_id = app_id.unwrap_or("-"), "no credential tier verified");
    Err(Response::error(Status::Unauthorized, 401, "Unauthorized"))
}

/// Resolves the acting user when the request carries a session token.
///
/// No token means anonymous. A session-service failure ends the request
/// with the error it raised.
pub async fn bind_session(
    ctx: &RequestContext,
    sessions: &dyn SessionService,
) -> Result<Option<CloudObject>, Response> {
    let Some(token) = ctx.session_token.as_deref() else {
        return Ok(None);
    };
    sessions.resolve(token).await.map_err(|err| {
        warn!(code = err.code, "session lookup failed: {}", err.message);
        err.into_response()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{FunctionError, Method, Request};

    /// Accepts exactly the listed credentials and records every check.
    #[derive(Default)]
    struct Verifier {
        signs: Vec<&'static str>,
        keys: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl KeyVerifier for Verifier {
        async fn verify_sign(&self, _app_id: Option<&str>, sign: &str) -> bool {
            self.calls.lock().unwrap().push(format!("sign:{sign}"));
            self.signs.contains(&sign)
        }

        async fn verify_key(&self, _app_id: Option<&str>, key: &str) -> bool {
            self.calls.lock().unwrap().push(format!("key:{key}"));
            self.keys.contains(&key)
        }
    }

    fn ctx(headers: &[(&str, &str)]) -> RequestContext {
        let req = headers.iter().fold(
            Request::new(Method::Post, "/1.1/functions/f").with_header("X-LC-Id", "app"),
            |req, (k, v)| req.with_header(*k, *v),
        );
        RequestContext::from_request(&req)
    }

    #[tokio::test]
    async fn signature_tier_wins_over_bad_app_key() {
        let verifier = Verifier { signs: vec!["good-sig"], ..Default::default() };
        let mut ctx = ctx(&[("X-LC-Sign", "good-sig"), ("X-LC-Key", "bad-key")]);

        assert_eq!(authenticate(&mut ctx, &verifier).await, Ok(Tier::Signature));
        assert!(!ctx.use_master());
        assert_eq!(*verifier.calls.lock().unwrap(), vec!["sign:good-sig"]);
    }

    #[tokio::test]
    async fn tiers_are_tried_in_order() {
        let verifier = Verifier { keys: vec!["mk, master"], ..Default::default() };
        let mut ctx = ctx(&[
            ("X-LC-Sign", "sig"),
            ("X-LC-Key", "key"),
            ("X-AVOSCloud-Master-Key", "mk"),
        ]);

        assert_eq!(authenticate(&mut ctx, &verifier).await, Ok(Tier::MasterKey));
        assert!(ctx.use_master());
        assert_eq!(*verifier.calls.lock().unwrap(), vec!["sign:sig", "key:key", "key:mk, master"]);
    }

    #[tokio::test]
    async fn master_suffix_on_app_key_grants_master() {
        let verifier = Verifier { keys: vec!["mk,master", "plain"], ..Default::default() };

        let mut master = ctx(&[("X-LC-Key", "mk,master")]);
        assert_eq!(authenticate(&mut master, &verifier).await, Ok(Tier::AppKey));
        assert!(master.use_master());

        let mut plain = ctx(&[("X-LC-Key", "plain")]);
        assert_eq!(authenticate(&mut plain, &verifier).await, Ok(Tier::AppKey));
        assert!(!plain.use_master());
    }

    #[tokio::test]
    async fn master_signature_grants_master() {
        let verifier = Verifier { signs: vec!["abc,123,master"], ..Default::default() };
        let mut ctx = ctx(&[("X-LC-Sign", "abc,123,master")]);
        assert_eq!(authenticate(&mut ctx, &verifier).await, Ok(Tier::Signature));
        assert!(ctx.use_master());
    }

    #[tokio::test]
    async fn unverified_master_string_grants_nothing() {
        let verifier = Verifier::default();
        let mut ctx = ctx(&[("X-LC-Key", "guess,master")]);
        let res = authenticate(&mut ctx, &verifier).await.unwrap_err();
        assert_eq!(res.status_code(), 401);
        assert_eq!(res.body_json(), Some(json!({"code": 401, "error": "Unauthorized"})));
        assert!(!ctx.use_master());
    }

    #[tokio::test]
    async fn no_credentials_is_unauthorized() {
        let verifier = Verifier::default();
        let mut ctx = ctx(&[]);
        assert!(authenticate(&mut ctx, &verifier).await.is_err());
        assert!(verifier.calls.lock().unwrap().is_empty());
    }

    struct Sessions(Result<Option<CloudObject>, FunctionError>);

    #[async_trait]
    impl SessionService for Sessions {
        async fn resolve(&self, token: &str) -> Result<Option<CloudObject>, FunctionError> {
            assert_eq!(token, "tok");
            self.0.clone()
        }

        async fn save_current_user(&self, _user: &CloudObject) -> Result<(), FunctionError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn session_bound_only_with_token() {
        let user = CloudObject::new("_User");
        let sessions = Sessions(Ok(Some(user.clone())));

        assert_eq!(bind_session(&ctx(&[]), &sessions).await.unwrap(), None);
        assert_eq!(bind_session(&ctx(&[("X-LC-Session", "tok")]), &sessions).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn session_failure_renders_error() {
        let sessions = Sessions(Err(FunctionError::new("Invalid session token.").with_code(211)));
        let res = bind_session(&ctx(&[("X-LC-Session", "tok")]), &sessions).await.unwrap_err();
        assert_eq!(res.status_code(), 400);
        assert_eq!(res.body_json(), Some(json!({"code": 211, "error": "Invalid session token."})));
    }
}
