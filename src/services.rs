//! Collaborators the engine calls out to.
//!
//! Key verification, session lookup and the function/hook table all live
//! outside the gateway. Each is a narrow trait; the engine holds them as
//! `Arc<dyn …>` built once at startup and only ever read afterwards.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::FunctionError;
use crate::object::{CloudObject, InvocationMeta};

/// Checks credentials against the application's keys.
#[async_trait]
pub trait KeyVerifier: Send + Sync + 'static {
    /// Whether `sign` is a valid request signature for `app_id`.
    async fn verify_sign(&self, app_id: Option<&str>, sign: &str) -> bool;

    /// Whether `key` is a valid key for `app_id`. A master key arrives as
    /// `"<masterKey>,master"`.
    async fn verify_key(&self, app_id: Option<&str>, key: &str) -> bool;
}

/// Resolves session tokens to users.
#[async_trait]
pub trait SessionService: Send + Sync + 'static {
    /// The user owning `token`, or `None` to proceed anonymously.
    async fn resolve(&self, token: &str) -> Result<Option<CloudObject>, FunctionError>;

    /// Records `user` as the acting user (after a verification callback).
    async fn save_current_user(&self, user: &CloudObject) -> Result<(), FunctionError>;
}

/// The table of registered functions and hooks.
///
/// Every runner raises [`FunctionError`] when the user code fails or when
/// nothing is registered under the requested name.
#[async_trait]
pub trait Registry: Send + Sync + 'static {
    /// Names of everything registered, as exposed by the metadata endpoint.
    fn keys(&self) -> Vec<String>;

    async fn run(
        &self,
        name: &str,
        params: Value,
        user: Option<CloudObject>,
        meta: InvocationMeta,
    ) -> Result<Value, FunctionError>;

    /// Runs a class hook; `before*` hooks return the (possibly modified)
    /// object to store.
    async fn run_hook(
        &self,
        class_name: &str,
        hook_name: &str,
        object: CloudObject,
        user: Option<CloudObject>,
        meta: InvocationMeta,
    ) -> Result<CloudObject, FunctionError>;

    async fn run_on_verified(
        &self,
        kind: &str,
        user: CloudObject,
        meta: InvocationMeta,
    ) -> Result<(), FunctionError>;

    async fn run_on_login(&self, user: CloudObject, meta: InvocationMeta) -> Result<(), FunctionError>;

    async fn run_on_insight(&self, body: Value, meta: InvocationMeta) -> Result<(), FunctionError>;
}

// ── StaticKeyVerifier ─────────────────────────────────────────────────────────

/// Verifies keys against one application's configured credentials.
///
/// Signatures are always rejected: computing them belongs to the platform's
/// key service, so deployments that accept signed requests plug in their own
/// [`KeyVerifier`].
#[derive(Clone, Debug)]
pub struct StaticKeyVerifier {
    app_id: String,
    app_key: String,
    master_key: String,
}

impl StaticKeyVerifier {
    pub fn new(
        app_id: impl Into<String>,
        app_key: impl Into<String>,
        master_key: impl Into<String>,
    ) -> Self {
        Self { app_id: app_id.into(), app_key: app_key.into(), master_key: master_key.into() }
    }

    /// Reads `LEANCLOUD_APP_ID`, `LEANCLOUD_APP_KEY` and
    /// `LEANCLOUD_APP_MASTER_KEY`. `None` if any is unset or empty.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self::new(
            var("LEANCLOUD_APP_ID")?,
            var("LEANCLOUD_APP_KEY")?,
            var("LEANCLOUD_APP_MASTER_KEY")?,
        ))
    }

    fn is_master_key(&self, key: &str) -> bool {
        match key.split_once(',') {
            Some((secret, suffix)) => secret.trim() == self.master_key && suffix.trim() == "master",
            None => false,
        }
    }
}

#[async_trait]
impl KeyVerifier for StaticKeyVerifier {
    async fn verify_sign(&self, _app_id: Option<&str>, _sign: &str) -> bool {
        debug!("request signatures are not supported by the static verifier");
        false
    }

    async fn verify_key(&self, app_id: Option<&str>, key: &str) -> bool {
        if app_id != Some(self.app_id.as_str()) {
            return false;
        }
        key == self.app_key || self.is_master_key(key)
    }
}

// ── AnonymousSessions ─────────────────────────────────────────────────────────

/// Session service for deployments without user sessions: every token
/// resolves to no user.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnonymousSessions;

#[async_trait]
impl SessionService for AnonymousSessions {
    async fn resolve(&self, _token: &str) -> Result<Option<CloudObject>, FunctionError> {
        Ok(None)
    }

    async fn save_current_user(&self, _user: &CloudObject) -> Result<(), FunctionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> StaticKeyVerifier {
        StaticKeyVerifier::new("app", "key", "master-secret")
    }

    #[tokio::test]
    async fn accepts_app_key_for_matching_app() {
        assert!(verifier().verify_key(Some("app"), "key").await);
        assert!(!verifier().verify_key(Some("other"), "key").await);
        assert!(!verifier().verify_key(None, "key").await);
        assert!(!verifier().verify_key(Some("app"), "wrong").await);
    }

    #[tokio::test]
    async fn accepts_master_key_forms() {
        assert!(verifier().verify_key(Some("app"), "master-secret,master").await);
        assert!(verifier().verify_key(Some("app"), "master-secret, master").await);
        assert!(!verifier().verify_key(Some("app"), "master-secret").await);
        assert!(!verifier().verify_key(Some("app"), "key, master").await);
    }

    #[tokio::test]
    async fn rejects_signatures() {
        assert!(!verifier().verify_sign(Some("app"), "abc,123").await);
    }

    #[tokio::test]
    async fn anonymous_sessions_resolve_to_nobody() {
        assert_eq!(AnonymousSessions.resolve("tok").await, Ok(None));
    }
}
