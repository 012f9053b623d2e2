//! Minimal engine: one function, a pair of class hooks, a login hook.
//!
//! Run with:
//!   LEANCLOUD_APP_ID=app LEANCLOUD_APP_KEY=key LEANCLOUD_APP_MASTER_KEY=master \
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/__engine/1/ping
//!   curl -X POST http://localhost:3000/1.1/functions/hello \
//!        -H 'X-LC-Id: app' -H 'X-LC-Key: key' \
//!        -H 'content-type: application/json' -d '{"name":"alice"}'
//!   curl -X POST http://localhost:3000/1.1/functions/Todo/beforeSave \
//!        -H 'X-LC-Id: app' -H 'X-LC-Key: master,master' \
//!        -d '{"object":{"title":"x"}}'
//!   curl http://localhost:3000/1.1/functions/_ops/metadatas \
//!        -H 'X-LC-Id: app' -H 'X-AVOSCloud-Master-Key: master'

use engine_gate::{
    Cloud, CloudObject, Engine, EngineConfig, FunctionError, FunctionRequest, HookRequest, Server,
    StaticKeyVerifier, UserEvent,
};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EngineConfig::from_env();
    let verifier = StaticKeyVerifier::from_env()
        .unwrap_or_else(|| StaticKeyVerifier::new("app", "key", "master"));

    let cloud = Cloud::new()
        .define("hello", hello)
        .before_save("Todo", check_title)
        .after_save("Todo", log_saved)
        .on_login(reject_banned);

    Server::bind(&config.addr)
        .await
        .expect("bind failed")
        .serve(Engine::new(cloud, verifier).with_config(config))
        .await
        .expect("server error");
}

// POST /1.1/functions/hello
async fn hello(req: FunctionRequest) -> Result<Value, FunctionError> {
    let name = req.params.get("name").and_then(Value::as_str).unwrap_or("world");
    Ok(json!(format!("hello, {name}")))
}

// POST /1.1/functions/Todo/beforeSave: the returned object is what gets stored.
async fn check_title(req: HookRequest) -> Result<CloudObject, FunctionError> {
    let mut todo = req.object;
    let title = todo.get("title").and_then(Value::as_str).unwrap_or_default();
    if title.is_empty() {
        return Err(FunctionError::new("title is required").with_code(142));
    }
    if title.len() > 140 {
        let short: String = title.chars().take(137).collect();
        todo.set("title", format!("{short}..."));
    }
    Ok(todo)
}

// POST /1.1/functions/Todo/afterSave: the response is always {"result":"ok"}.
async fn log_saved(req: HookRequest) -> Result<CloudObject, FunctionError> {
    info!(id = req.object.id().unwrap_or("-"), ip = req.meta.remote_address.as_deref().unwrap_or("-"), "todo saved");
    Ok(req.object)
}

// POST /1.1/functions/_User/onLogin
async fn reject_banned(event: UserEvent) -> Result<(), FunctionError> {
    if event.user.get("banned") == Some(&Value::Bool(true)) {
        return Err(FunctionError::new("banned").with_code(403));
    }
    Ok(())
}
