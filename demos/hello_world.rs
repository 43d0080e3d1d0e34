//! Minimal routekit server using closure handlers.
//!
//! Run with:
//! ```sh
//! cargo run --example hello_world
//! curl http://127.0.0.1:8080/hello
//! curl http://127.0.0.1:8080/greet/world
//! curl "http://127.0.0.1:8080/calc/divide?a=10&b=4"
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use routekit::{Fault, Server, StatusCode};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut server = Server::new("127.0.0.1:8080");

    server.routes().get("/hello", |_ctx, _res| {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Ok(Some(json!({
            "message": "Hello, World!",
            "timestamp": timestamp,
        })))
    })?;

    server.routes().get("/greet/{name}", |ctx, _res| {
        let name = ctx
            .param("name")
            .ok_or_else(|| Fault::bad_input("missing name"))?;
        Ok(Some(json!({ "message": format!("Hello, {name}!") })))
    })?;

    server.routes().get("/calc/divide", |ctx, _res| {
        let a: f64 = ctx
            .query_param("a")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Fault::bad_input("query parameter 'a' must be a number"))?;
        let b: f64 = ctx
            .query_param("b")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Fault::bad_input("query parameter 'b' must be a number"))?;
        if b == 0.0 {
            return Err(Fault::bad_input("division by zero"));
        }
        Ok(Some(json!({ "result": a / b })))
    })?;

    server.routes().get("/page", |_ctx, res| {
        res.html(
            StatusCode::Ok,
            "<html><body><h1>routekit</h1><p>served as HTML</p></body></html>",
        )?;
        Ok(None)
    })?;

    server.serve().await?;
    Ok(())
}
