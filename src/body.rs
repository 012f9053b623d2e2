//! Request body decoding.
//!
//! Browsers cannot attach custom headers to a cross-origin "simple" request,
//! so some clients post `text/plain` bodies with the credentials embedded as
//! underscore-prefixed fields. Those are lifted into the [`RequestContext`]
//! and stripped before the body reaches user code.

use serde_json::{Map, Value};

use crate::context::{RequestContext, production_flag};

/// Decodes the body, pulling embedded credentials out of plain-text bodies.
///
/// Empty or undecodable bodies become `Value::Null`.
pub fn parse_body(ctx: &mut RequestContext, raw: &[u8]) -> Value {
    if ctx.is_plain_text() {
        if let Some(body) = extract_credentials(ctx, raw) {
            return body;
        }
    }
    serde_json::from_slice(raw).unwrap_or(Value::Null)
}

/// Moves `_ApplicationId`, `_ApplicationKey`, `_MasterKey`, `_SessionToken`
/// and `_ApplicationProduction` from `raw` into `ctx` and returns the body
/// without any underscore-prefixed field.
///
/// Returns `None`, leaving `ctx` untouched, unless `raw` is a non-empty JSON
/// object or array. Otherwise the body credentials replace the header ones
/// wholesale and the signature is cleared: a body-embedded request is never
/// signed. An array carries no credential fields, so it clears them all and
/// comes back unchanged.
pub fn extract_credentials(ctx: &mut RequestContext, raw: &[u8]) -> Option<Value> {
    let (mut fields, items) = match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(fields)) if !fields.is_empty() => (fields, None),
        Ok(Value::Array(items)) if !items.is_empty() => (Map::new(), Some(items)),
        _ => return None,
    };

    ctx.app_id = string_field(&fields, "_ApplicationId");
    ctx.app_key = string_field(&fields, "_ApplicationKey");
    ctx.master_key = string_field(&fields, "_MasterKey");
    ctx.session_token = string_field(&fields, "_SessionToken");
    ctx.signature = None;
    ctx.use_production = fields.get("_ApplicationProduction").is_none_or(production_value);

    if let Some(items) = items {
        return Some(Value::Array(items));
    }
    fields.retain(|key, _| !key.starts_with('_'));
    Some(Value::Object(fields))
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// `false`, `0`, `"0"` and `"false"` switch production off; anything else,
/// including `null` and `""`, leaves it on.
fn production_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => production_flag(s),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Method, Request};

    fn plain_ctx() -> RequestContext {
        let req = Request::new(Method::Post, "/1.1/functions/hello")
            .with_header("Content-Type", "text/plain")
            .with_header("X-LC-Id", "header-app")
            .with_header("X-LC-Key", "header-key")
            .with_header("X-LC-Sign", "sig");
        RequestContext::from_request(&req)
    }

    #[test]
    fn lifts_credentials_and_strips_internal_fields() {
        let mut ctx = plain_ctx();
        let raw = br#"{"_ApplicationId": "A", "_ApplicationKey": "K", "foo": 1}"#;

        let body = parse_body(&mut ctx, raw);

        assert_eq!(body, json!({"foo": 1}));
        assert_eq!(ctx.app_id.as_deref(), Some("A"));
        assert_eq!(ctx.app_key.as_deref(), Some("K"));
        assert_eq!(ctx.master_key, None);
        assert_eq!(ctx.signature, None);
        assert!(ctx.use_production);
        assert!(!ctx.use_master());
    }

    #[test]
    fn every_underscore_field_is_removed() {
        let mut ctx = plain_ctx();
        let raw = br#"{"_SessionToken": "t", "_ClientVersion": "js1", "_other": true, "a": "b"}"#;
        let body = parse_body(&mut ctx, raw);
        assert_eq!(body, json!({"a": "b"}));
        assert_eq!(ctx.session_token.as_deref(), Some("t"));
    }

    #[test]
    fn empty_or_invalid_body_leaves_context_alone() {
        let before = plain_ctx();

        let mut ctx = before.clone();
        assert_eq!(parse_body(&mut ctx, b"{}"), json!({}));
        assert_eq!(ctx, before);

        let mut ctx = before.clone();
        assert_eq!(parse_body(&mut ctx, b"not json"), Value::Null);
        assert_eq!(ctx, before);

        let mut ctx = before.clone();
        assert_eq!(parse_body(&mut ctx, b"[]"), json!([]));
        assert_eq!(ctx, before);
    }

    #[test]
    fn master_key_travels_in_body() {
        let mut ctx = plain_ctx();
        let body = parse_body(&mut ctx, br#"{"_ApplicationId": "A", "_MasterKey": "MK", "n": 2}"#);

        assert_eq!(body, json!({"n": 2}));
        assert_eq!(ctx.master_key.as_deref(), Some("MK"));
        assert_eq!(ctx.app_key, None);
        assert!(!ctx.use_master());
    }

    #[test]
    fn array_body_clears_header_credentials() {
        let mut ctx = plain_ctx();
        assert_eq!(parse_body(&mut ctx, b"[1, 2]"), json!([1, 2]));
        assert_eq!(ctx.app_id, None);
        assert_eq!(ctx.app_key, None);
        assert_eq!(ctx.signature, None);
        assert!(ctx.use_production);
    }

    #[test]
    fn production_switch_in_body() {
        for (flag, expected) in [
            (json!(false), false),
            (json!(0), false),
            (json!("0"), false),
            (json!("false"), false),
            (json!(""), true),
            (json!(true), true),
            (json!(1), true),
            (Value::Null, true),
        ] {
            let mut ctx = plain_ctx();
            let raw = json!({"_ApplicationId": "A", "_ApplicationProduction": flag.clone()}).to_string();
            extract_credentials(&mut ctx, raw.as_bytes());
            assert_eq!(ctx.use_production, expected, "_ApplicationProduction: {flag}");
        }
    }

    #[test]
    fn json_bodies_keep_underscore_fields() {
        let req = Request::new(Method::Post, "/1.1/functions/hello")
            .with_header("Content-Type", "application/json")
            .with_header("X-LC-Id", "header-app");
        let mut ctx = RequestContext::from_request(&req);
        let body = parse_body(&mut ctx, br#"{"_ApplicationId": "A", "x": 1}"#);
        assert_eq!(body, json!({"_ApplicationId": "A", "x": 1}));
        assert_eq!(ctx.app_id.as_deref(), Some("header-app"));
    }
}
