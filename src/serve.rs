//! HTTP endpoint for the GraphQL schema.
//!
//! A small blocking server built on `tiny_http`:
//!
//! | Request | Response |
//! |---------|----------|
//! | `POST <path>` with a JSON body | GraphQL response |
//! | `GET <path>?query=...` | GraphQL response |
//! | `GET <path>` | GraphiQL IDE (when enabled) |
//! | anything else | 404 |
//!
//! ```text
//! ┌─────────────────┐  block_on   ┌──────────────────┐
//! │   Main Thread   │ ──────────► │  tokio runtime   │
//! │  (HTTP Server)  │ ◄────────── │ (schema execute) │
//! └─────────────────┘   Response  └──────────────────┘
//! ```
//!
//! Requests are handled one at a time. Ctrl+C unblocks the accept loop.

use crate::config::BotConfig;
use anyhow::{Context, Result};
use async_graphql::{Request as GraphQlRequest, Variables, http::GraphiQLSource};
use contentbot::{Contentbot, log};
use std::{
    io::Cursor,
    net::SocketAddr,
    sync::Arc,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::runtime::Runtime;

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve `bot` until Ctrl+C is received.
pub fn serve_bot(config: &BotConfig, runtime: &Runtime, bot: &Contentbot) -> Result<()> {
    let interface: std::net::IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface `{}`", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}{}", addr, config.serve.path);

    let endpoint = Endpoint {
        path: &config.serve.path,
        graphiql: config.serve.graphiql,
    };
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &endpoint, runtime, bot) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Routing
// ============================================================================

struct Endpoint<'a> {
    path: &'a str,
    graphiql: bool,
}

/// What to do with an incoming request.
#[derive(Debug)]
enum Route {
    Execute(Box<GraphQlRequest>),
    GraphiQl,
    BadRequest(String),
    NotFound,
}

/// Resolve a request to a [`Route`]. `body` is only read for POST requests.
fn route(method: &Method, url: &str, body: impl FnOnce() -> std::io::Result<String>, endpoint: &Endpoint) -> Route {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    if path.trim_end_matches('/') != endpoint.path.trim_end_matches('/') {
        return Route::NotFound;
    }

    match method {
        Method::Post => match body() {
            Ok(body) => match serde_json::from_str::<GraphQlRequest>(&body) {
                Ok(request) => Route::Execute(Box::new(request)),
                Err(e) => Route::BadRequest(format!("invalid GraphQL request body: {e}")),
            },
            Err(e) => Route::BadRequest(format!("failed to read request body: {e}")),
        },
        Method::Get => match parse_query_string(query) {
            Ok(Some(request)) => Route::Execute(Box::new(request)),
            Ok(None) if endpoint.graphiql => Route::GraphiQl,
            Ok(None) => Route::BadRequest("missing `query` parameter".into()),
            Err(message) => Route::BadRequest(message),
        },
        _ => Route::NotFound,
    }
}

/// Build a request from `query`, `variables` and `operationName` parameters.
fn parse_query_string(query: &str) -> std::result::Result<Option<GraphQlRequest>, String> {
    let mut operation = None;
    let mut variables = None;
    let mut operation_name = None;

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        // `+` encodes a space in form-style query strings
        let value = urlencoding::decode(&value.replace('+', " "))
            .map_err(|e| format!("invalid `{key}` parameter: {e}"))?
            .into_owned();
        match key {
            "query" => operation = Some(value),
            "variables" => variables = Some(value),
            "operationName" => operation_name = Some(value),
            _ => {}
        }
    }

    let Some(operation) = operation else {
        return Ok(None);
    };
    let mut request = GraphQlRequest::new(operation);
    if let Some(variables) = variables.filter(|v| !v.is_empty()) {
        let variables: serde_json::Value = serde_json::from_str(&variables)
            .map_err(|e| format!("invalid `variables` parameter: {e}"))?;
        request = request.variables(Variables::from_json(variables));
    }
    if let Some(name) = operation_name.filter(|n| !n.is_empty()) {
        request = request.operation_name(name);
    }
    Ok(Some(request))
}

// ============================================================================
// Request Handling
// ============================================================================

fn handle_request(
    mut request: Request,
    endpoint: &Endpoint,
    runtime: &Runtime,
    bot: &Contentbot,
) -> Result<()> {
    let method = request.method().clone();
    let url = request.url().to_owned();

    let route = route(
        &method,
        &url,
        || {
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body)?;
            Ok(body)
        },
        endpoint,
    );

    match route {
        Route::Execute(graphql) => {
            let response = runtime.block_on(bot.execute(*graphql));
            let body = serde_json::to_vec(&response)?;
            respond(request, 200, "application/json", body)
        }
        Route::GraphiQl => {
            let html = GraphiQLSource::build().endpoint(endpoint.path).finish();
            respond(request, 200, "text/html; charset=utf-8", html.into_bytes())
        }
        Route::BadRequest(message) => {
            log!("serve"; "{method} {url}: {message}");
            let body = serde_json::to_vec(&serde_json::json!({
                "errors": [{ "message": message }]
            }))?;
            respond(request, 400, "application/json", body)
        }
        Route::NotFound => respond(request, 404, "text/plain", b"404 Not Found".to_vec()),
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn respond(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let content_type = Header::from_bytes("Content-Type", content_type)
        .map_err(|_| anyhow::anyhow!("invalid content type `{content_type}`"))?;
    let length = body.len();
    let response = Response::new(
        StatusCode(status),
        vec![content_type],
        Cursor::new(body),
        Some(length),
        None,
    );
    request.respond(response)?;
    Ok(())
}
