//! In-process table of cloud functions and hooks.
//!
//! Build it once at startup, then hand it to the [`Engine`](crate::Engine):
//!
//! ```rust
//! use engine_gate::{Cloud, FunctionError, FunctionRequest, HookRequest, CloudObject};
//! use serde_json::{Value, json};
//!
//! async fn hello(req: FunctionRequest) -> Result<Value, FunctionError> {
//!     let name = req.params["name"].as_str().unwrap_or("world").to_owned();
//!     Ok(json!(format!("hello, {name}")))
//! }
//!
//! async fn stamp(req: HookRequest) -> Result<CloudObject, FunctionError> {
//!     let mut todo = req.object;
//!     todo.set("checked", true);
//!     Ok(todo)
//! }
//!
//! let cloud = Cloud::new()
//!     .define("hello", hello)
//!     .before_save("Todo", stamp);
//! ```
//!
//! Entries are keyed the way the platform names them (`hello`,
//! `__before_save_for_Todo`, `__on_login__User`, …); those keys are what the
//! metadata endpoint reports.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::FunctionError;
use crate::handler::{BoxedHandler, Handler};
use crate::object::{CloudObject, InvocationMeta};
use crate::services::Registry;

const LOGIN_KEY: &str = "__on_login__User";
const INSIGHT_KEY: &str = "__on_complete_bigquery_job";

/// Arguments of a cloud function.
#[derive(Clone, Debug)]
pub struct FunctionRequest {
    pub params: Value,
    pub user: Option<CloudObject>,
    pub meta: InvocationMeta,
}

/// Arguments of a class hook.
#[derive(Clone, Debug)]
pub struct HookRequest {
    pub object: CloudObject,
    pub user: Option<CloudObject>,
    pub meta: InvocationMeta,
}

/// Arguments of the login and verification hooks.
#[derive(Clone, Debug)]
pub struct UserEvent {
    pub user: CloudObject,
    pub meta: InvocationMeta,
}

/// Arguments of the analytics-job completion hook.
#[derive(Clone, Debug)]
pub struct InsightEvent {
    pub body: Value,
    pub meta: InvocationMeta,
}

/// Registered functions and hooks. Immutable once handed to the engine.
#[derive(Default)]
pub struct Cloud {
    functions: HashMap<String, BoxedHandler<FunctionRequest, Value>>,
    hooks: HashMap<String, BoxedHandler<HookRequest, CloudObject>>,
    user_events: HashMap<String, BoxedHandler<UserEvent, ()>>,
    insight: Option<BoxedHandler<InsightEvent, ()>>,
}

impl Cloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cloud function. A later registration under the same name
    /// replaces the earlier one.
    pub fn define(mut self, name: &str, handler: impl Handler<FunctionRequest, Value>) -> Self {
        self.functions.insert(name.to_owned(), handler.into_boxed_handler());
        self
    }

    pub fn before_save(self, class_name: &str, handler: impl Handler<HookRequest, CloudObject>) -> Self {
        self.hook(class_name, "beforeSave", handler)
    }

    pub fn after_save(self, class_name: &str, handler: impl Handler<HookRequest, CloudObject>) -> Self {
        self.hook(class_name, "afterSave", handler)
    }

    pub fn before_update(self, class_name: &str, handler: impl Handler<HookRequest, CloudObject>) -> Self {
        self.hook(class_name, "beforeUpdate", handler)
    }

    pub fn after_update(self, class_name: &str, handler: impl Handler<HookRequest, CloudObject>) -> Self {
        self.hook(class_name, "afterUpdate", handler)
    }

    pub fn before_delete(self, class_name: &str, handler: impl Handler<HookRequest, CloudObject>) -> Self {
        self.hook(class_name, "beforeDelete", handler)
    }

    pub fn after_delete(self, class_name: &str, handler: impl Handler<HookRequest, CloudObject>) -> Self {
        self.hook(class_name, "afterDelete", handler)
    }

    /// Runs after a user verified their `kind` (`"sms"` or `"email"`).
    pub fn on_verified(mut self, kind: &str, handler: impl Handler<UserEvent, ()>) -> Self {
        self.user_events.insert(verified_key(kind), handler.into_boxed_handler());
        self
    }

    pub fn on_login(mut self, handler: impl Handler<UserEvent, ()>) -> Self {
        self.user_events.insert(LOGIN_KEY.to_owned(), handler.into_boxed_handler());
        self
    }

    pub fn on_insight(mut self, handler: impl Handler<InsightEvent, ()>) -> Self {
        self.insight = Some(handler.into_boxed_handler());
        self
    }

    fn hook(mut self, class_name: &str, hook_name: &str, handler: impl Handler<HookRequest, CloudObject>) -> Self {
        self.hooks.insert(hook_key(class_name, hook_name), handler.into_boxed_handler());
        self
    }

    async fn run_user_event(&self, key: &str, user: CloudObject, meta: InvocationMeta) -> Result<(), FunctionError> {
        let handler = self.user_events.get(key).ok_or_else(FunctionError::not_found)?;
        debug!(key, "running user hook");
        handler.call(UserEvent { user, meta }).await
    }
}

#[async_trait]
impl Registry for Cloud {
    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.functions.keys()
            .chain(self.hooks.keys())
            .chain(self.user_events.keys())
            .cloned()
            .collect();
        if self.insight.is_some() {
            keys.push(INSIGHT_KEY.to_owned());
        }
        keys.sort();
        keys
    }

    async fn run(
        &self,
        name: &str,
        params: Value,
        user: Option<CloudObject>,
        meta: InvocationMeta,
    ) -> Result<Value, FunctionError> {
        let handler = self.functions.get(name).ok_or_else(FunctionError::not_found)?;
        debug!(name, "running function");
        handler.call(FunctionRequest { params, user, meta }).await
    }

    async fn run_hook(
        &self,
        class_name: &str,
        hook_name: &str,
        object: CloudObject,
        user: Option<CloudObject>,
        meta: InvocationMeta,
    ) -> Result<CloudObject, FunctionError> {
        let key = hook_key(class_name, hook_name);
        let handler = self.hooks.get(&key).ok_or_else(FunctionError::not_found)?;
        debug!(key = %key, "running class hook");
        handler.call(HookRequest { object, user, meta }).await
    }

    async fn run_on_verified(&self, kind: &str, user: CloudObject, meta: InvocationMeta) -> Result<(), FunctionError> {
        self.run_user_event(&verified_key(kind), user, meta).await
    }

    async fn run_on_login(&self, user: CloudObject, meta: InvocationMeta) -> Result<(), FunctionError> {
        self.run_user_event(LOGIN_KEY, user, meta).await
    }

    async fn run_on_insight(&self, body: Value, meta: InvocationMeta) -> Result<(), FunctionError> {
        let handler = self.insight.as_ref().ok_or_else(FunctionError::not_found)?;
        handler.call(InsightEvent { body, meta }).await
    }
}

/// `("Todo", "beforeSave")` → `__before_save_for_Todo`.
fn hook_key(class_name: &str, hook_name: &str) -> String {
    let mut snake = String::with_capacity(hook_name.len() + 4);
    for c in hook_name.chars() {
        if c.is_ascii_uppercase() {
            snake.push('_');
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
    }
    format!("__{snake}_for_{class_name}")
}

fn verified_key(kind: &str) -> String {
    format!("__on_verified_{kind}")
}
