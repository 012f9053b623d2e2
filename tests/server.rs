//! The engine over a real socket.

use engine_gate::{Cloud, Engine, FunctionError, FunctionRequest, Server, StaticKeyVerifier};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

async fn hello(req: FunctionRequest) -> Result<Value, FunctionError> {
    Ok(json!({"hello": req.params["name"]}))
}

async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn serves_and_shuts_down() {
    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    let engine = Engine::new(
        Cloud::new().define("hello", hello),
        StaticKeyVerifier::new("app", "key", "mk"),
    );

    let (stop, stopped) = oneshot::channel::<()>();
    let serving = tokio::spawn(server.serve_with_shutdown(engine, async {
        let _ = stopped.await;
    }));

    let ping = roundtrip(addr, "GET /__engine/1/ping HTTP/1.1\r\nHost: t\r\nConnection: close\r\n\r\n").await;
    assert!(ping.starts_with("HTTP/1.1 200"), "{ping}");
    assert!(ping.contains(r#""runtime":"rust""#), "{ping}");

    let body = r#"{"name":"alice"}"#;
    let call = roundtrip(addr, &format!(
        "POST /1.1/functions/hello HTTP/1.1\r\nHost: t\r\nConnection: close\r\n\
         X-LC-Id: app\r\nX-LC-Key: key\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len(),
    )).await;
    assert!(call.starts_with("HTTP/1.1 200"), "{call}");
    assert!(call.contains(r#"{"result":{"hello":"alice"}}"#), "{call}");
    assert!(call.to_ascii_lowercase().contains("access-control-allow-origin: *"), "{call}");

    let denied = roundtrip(addr, "POST /1.1/functions/hello HTTP/1.1\r\nHost: t\r\nConnection: close\r\nContent-Length: 0\r\n\r\n").await;
    assert!(denied.starts_with("HTTP/1.1 401"), "{denied}");

    let unknown = roundtrip(addr, "PROPFIND /1.1/functions/hello HTTP/1.1\r\nHost: t\r\nConnection: close\r\n\r\n").await;
    assert!(unknown.starts_with("HTTP/1.1 405"), "{unknown}");

    stop.send(()).unwrap();
    serving.await.unwrap().unwrap();
}
