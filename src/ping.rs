//! Built-in health ping.
//!
//! The platform's health checker polls `/__engine/1/ping` and reads which
//! runtime is answering. No headers are inspected and no credentials are
//! checked: if the process can answer at all, it answers this.

use serde_json::{Value, json};

use crate::config::EngineConfig;
use crate::response::Response;

/// `{"runtime": …, "version": …}`.
pub fn payload(config: &EngineConfig) -> Value {
    json!({ "runtime": config.runtime, "version": config.version })
}

/// Always `200 OK`.
pub fn respond(config: &EngineConfig) -> Response {
    Response::json(&payload(config))
}
