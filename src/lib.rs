//! # engine-gate
//!
//! The request gateway of a cloud-function engine. It sits between the
//! network and user code: it normalises three generations of credential
//! headers, authenticates the caller, and dispatches to the registered
//! function or hook with the response encoding that route expects.
//!
//! ## The contract
//!
//! A reverse proxy in front terminates TLS and enforces body-size limits,
//! rate limits and timeouts. The gateway does not.
//!
//! What's left for the gateway:
//!
//! - Header dialects: `X-LC-*`, `X-AVOSCloud-*`, `X-Uluru-*`, and
//!   credentials embedded in `text/plain` bodies
//! - Tiered authentication: signature, then app key, then master key
//! - CORS for browser callers
//! - Routing `/{1,1.1}/{functions,call}/…` to functions, class hooks,
//!   login/verification hooks and the analytics-job hook
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use engine_gate::{Cloud, Engine, EngineConfig, FunctionError, FunctionRequest, Server, StaticKeyVerifier};
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), engine_gate::Error> {
//!     let config = EngineConfig::from_env();
//!     let cloud = Cloud::new().define("hello", hello);
//!     let verifier = StaticKeyVerifier::new("app-id", "app-key", "master-key");
//!
//!     Server::bind(&config.addr)
//!         .await?
//!         .serve(Engine::new(cloud, verifier).with_config(config))
//!         .await
//! }
//!
//! async fn hello(_req: FunctionRequest) -> Result<Value, FunctionError> {
//!     Ok(json!("hello"))
//! }
//! ```

mod cloud;
mod config;
mod context;
mod engine;
mod error;
mod handler;
mod method;
mod object;
mod request;
mod response;
mod router;
mod server;
mod services;
mod status;

pub mod auth;
pub mod body;
pub mod cors;
pub mod headers;
pub mod ping;

pub use cloud::{Cloud, FunctionRequest, HookRequest, InsightEvent, UserEvent};
pub use config::EngineConfig;
pub use context::RequestContext;
pub use engine::Engine;
pub use error::{Error, FunctionError};
pub use handler::Handler;
pub use method::Method;
pub use object::{CloudObject, EncodeMode, HookMarker, InvocationMeta, ObjectCodec, TypedJsonCodec};
pub use request::Request;
pub use response::{IntoResponse, JSON_CONTENT_TYPE, Response, ResponseBuilder};
pub use router::{PING_PREFIX, Route, Router};
pub use server::Server;
pub use services::{AnonymousSessions, KeyVerifier, Registry, SessionService, StaticKeyVerifier};
pub use status::Status;
