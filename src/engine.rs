//! The request pipeline and per-route dispatch.
//!
//! ```text
//! classify ─┬─ Ping         → ping payload
//!           ├─ NoMatch      → 404
//!           ├─ Preflight    → CORS answer
//!           ├─ UnknownShape → 404 with CORS
//!           └─ context → body → authenticate → bind session → handler
//! ```
//!
//! Every stage returns `Result<_, Response>`: `Err` carries the terminal
//! response and `?` ends the request there. [`Engine::handle`] therefore
//! produces exactly one response and runs at most one handler.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::auth::{authenticate, bind_session};
use crate::body::parse_body;
use crate::config::EngineConfig;
use crate::context::RequestContext;
use crate::cors;
use crate::error::FunctionError;
use crate::headers::{self, resolve};
use crate::object::{CloudObject, EncodeMode, HookMarker, InvocationMeta, ObjectCodec, TypedJsonCodec};
use crate::ping;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::{Route, Router};
use crate::services::{AnonymousSessions, KeyVerifier, Registry, SessionService};
use crate::status::Status;

/// The gateway: one instance per process, shared by every connection.
///
/// All collaborators are read-only after construction, so concurrent
/// requests need no locking.
pub struct Engine {
    router: Router,
    registry: Arc<dyn Registry>,
    verifier: Arc<dyn KeyVerifier>,
    sessions: Arc<dyn SessionService>,
    codec: Arc<dyn ObjectCodec>,
    config: EngineConfig,
}

/// What an authenticated request carries into its handler.
struct Admitted {
    body: Value,
    user: Option<CloudObject>,
    meta: InvocationMeta,
    master: bool,
}

impl Engine {
    /// An engine without user sessions, using [`TypedJsonCodec`] and the
    /// default configuration.
    pub fn new(registry: impl Registry, verifier: impl KeyVerifier) -> Self {
        Self {
            router: Router::new(),
            registry: Arc::new(registry),
            verifier: Arc::new(verifier),
            sessions: Arc::new(AnonymousSessions),
            codec: Arc::new(TypedJsonCodec),
            config: EngineConfig::default(),
        }
    }

    pub fn with_sessions(mut self, sessions: impl SessionService) -> Self {
        self.sessions = Arc::new(sessions);
        self
    }

    pub fn with_codec(mut self, codec: impl ObjectCodec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs one request through the pipeline.
    pub async fn handle(&self, req: Request) -> Response {
        let route = self.router.classify(req.method(), req.path());
        debug!(?route, "classified");

        let outcome = match route {
            Route::Ping => return ping::respond(&self.config),
            Route::NoMatch => return not_found(),
            Route::Preflight => return cors::preflight(resolve(&req, headers::ORIGIN)),
            Route::UnknownShape => Err(not_found()),
            Route::MetadataQuery => self.metadata(&req).await,
            Route::FunctionCall { name, decode_objects } => {
                self.call_function(&req, &name, decode_objects).await
            }
            Route::ClassHook { class_name, hook_name } => {
                self.call_class_hook(&req, &class_name, &hook_name).await
            }
            Route::OnVerifiedHook { kind } => self.call_on_verified(&req, &kind).await,
            Route::OnLoginHook => self.call_on_login(&req).await,
            Route::OnInsightHook => self.call_on_insight(&req).await,
        };

        let mut res = outcome.unwrap_or_else(|res| res);
        cors::apply(&mut res, resolve(&req, headers::ORIGIN));
        res
    }

    // ── Shared stages ─────────────────────────────────────────────────────────

    /// Context, body, credentials, session: everything before a handler runs.
    async fn admit(&self, req: &Request) -> Result<Admitted, Response> {
        let mut ctx = RequestContext::from_request(req);
        let body = parse_body(&mut ctx, req.body());
        authenticate(&mut ctx, self.verifier.as_ref()).await?;
        let user = bind_session(&ctx, self.sessions.as_ref()).await?;
        Ok(Admitted { body, user, meta: ctx.meta(), master: ctx.use_master() })
    }

    /// Decodes `body.object` as an object of `class_name`. A missing or
    /// non-object `object` decodes as an empty one.
    fn decode_object(&self, body: Value, class_name: &str) -> (CloudObject, Map<String, Value>) {
        let mut json = match body {
            Value::Object(mut fields) => match fields.remove("object") {
                Some(Value::Object(object)) => object,
                _ => Map::new(),
            },
            _ => Map::new(),
        };

        let mut bookkeeping = Map::new();
        for key in HookMarker::ALL.map(HookMarker::key).into_iter().chain(["_updatedKeys"]) {
            if let Some(value) = json.remove(key) {
                bookkeeping.insert(key.to_owned(), value);
            }
        }

        json.insert("__type".to_owned(), Value::from("Object"));
        json.insert("className".to_owned(), Value::from(class_name));
        let object = CloudObject::from_value(self.codec.decode(Value::Object(json)));
        (object, bookkeeping)
    }

    // ── Route handlers ────────────────────────────────────────────────────────

    async fn metadata(&self, req: &Request) -> Result<Response, Response> {
        if !self.admit(req).await?.master {
            warn!("metadata requested without master access");
            return Err(Response::error(Status::Unauthorized, 401, "Unauthorized."));
        }
        Ok(Response::json(&json!(self.registry.keys())))
    }

    async fn call_function(
        &self,
        req: &Request,
        name: &str,
        decode_objects: bool,
    ) -> Result<Response, Response> {
        let Admitted { body, user, meta, .. } = self.admit(req).await?;

        let (params, mode) = if decode_objects {
            (self.codec.decode(body), EncodeMode::FullyTyped)
        } else {
            (body, EncodeMode::Plain)
        };
        let result = self.registry.run(name, params, user, meta).await.map_err(handler_failure)?;

        Ok(Response::json(&json!({ "result": self.codec.encode(result, mode) })))
    }

    async fn call_class_hook(
        &self,
        req: &Request,
        class_name: &str,
        hook_name: &str,
    ) -> Result<Response, Response> {
        let Admitted { body, user, meta, .. } = self.admit(req).await?;

        let (mut object, bookkeeping) = self.decode_object(body, class_name);
        for marker in HookMarker::ALL {
            if let Some(value) = bookkeeping.get(marker.key()) {
                object.set_hook_marker(marker, value.clone());
            }
        }
        if let Some(Value::Array(keys)) = bookkeeping.get("_updatedKeys") {
            object.set_updated_keys(keys.iter().filter_map(Value::as_str).map(str::to_owned).collect());
        }

        let result = self.registry
            .run_hook(class_name, hook_name, object, user, meta)
            .await
            .map_err(handler_failure)?;

        if hook_name == "beforeDelete" {
            Ok(Response::json(&json!({})))
        } else if hook_name.starts_with("after") {
            Ok(ok())
        } else {
            Ok(Response::json(&self.codec.encode(result.to_value(), EncodeMode::Plain)))
        }
    }

    async fn call_on_verified(&self, req: &Request, kind: &str) -> Result<Response, Response> {
        let Admitted { body, meta, .. } = self.admit(req).await?;
        let (user, _) = self.decode_object(body, "_User");

        self.sessions.save_current_user(&user).await.map_err(handler_failure)?;
        self.registry.run_on_verified(kind, user, meta).await.map_err(handler_failure)?;
        Ok(ok())
    }

    async fn call_on_login(&self, req: &Request) -> Result<Response, Response> {
        let Admitted { body, meta, .. } = self.admit(req).await?;
        let (user, _) = self.decode_object(body, "_User");

        self.registry.run_on_login(user, meta).await.map_err(handler_failure)?;
        Ok(ok())
    }

    async fn call_on_insight(&self, req: &Request) -> Result<Response, Response> {
        let Admitted { body, meta, .. } = self.admit(req).await?;

        self.registry.run_on_insight(body, meta).await.map_err(handler_failure)?;
        Ok(ok())
    }
}

fn ok() -> Response {
    Response::json(&json!({ "result": "ok" }))
}

fn not_found() -> Response {
    Response::error(Status::NotFound, 404, "Not Found")
}

fn handler_failure(err: FunctionError) -> Response {
    info!(code = err.code, "handler raised: {}", err.message);
    err.into_response()
}
