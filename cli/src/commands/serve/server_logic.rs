//! # Concierge HTTP Server Implementation
//!
//! File: cli/src/commands/serve/server_logic.rs
//!
//! ## Overview
//!
//! This module runs the HTTP service for `concierge serve`:
//! - Port availability checking with optional fallback to the next ports
//! - The `/chat` route and its middleware (request tracing, CORS)
//! - Graceful shutdown on Ctrl+C or SIGTERM
//!
//! ## Architecture
//!
//! The server uses Axum and follows these steps:
//! 1. Bind a listener (strict by default, `port_attempts` widens the search)
//! 2. Build the router with the shared `AppState`
//! 3. Print connection information
//! 4. Serve until a shutdown signal arrives
//!
//! ## Examples
//!
//! ```rust
//! let config = config::load_and_merge_config(&args, &file_config).await?;
//! let responder = Responder::new(screening, Arc::new(generator));
//! server_logic::run_server(config, responder).await?;
//! ```
//!
use super::config::ServerConfig;
use super::handlers::{chat_handler, AppState};
use crate::common::reply::Responder;
use crate::core::error::Result;
use anyhow::Context;
use axum::{routing::post, Router};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

/// # Run HTTP Server (`run_server`)
///
/// Binds the configured address and serves `POST /chat` until shutdown.
///
/// ## Process:
/// 1. Binds the listener with `bind_available_port`.
/// 2. Creates the router with `create_app`, sharing `responder` between requests.
/// 3. Prints server information to the console.
/// 4. Serves with graceful shutdown handling via `shutdown_signal`.
///
/// ## Errors
///
/// This function can return errors if:
/// - No port can be bound within `config.port_attempts` attempts.
/// - The Axum server encounters a fatal error during operation.
pub async fn run_server(config: ServerConfig, responder: Responder) -> Result<()> {
    let listener = bind_available_port(config.host, config.port, config.port_attempts).await?;
    // Port 0 asks the OS for a port, so report what was actually bound.
    let addr = listener
        .local_addr()
        .context("Failed to read the bound address")?;

    let state = Arc::new(AppState { responder });
    let app = create_app(&config, state);

    println!("\n=================================================================");
    println!("🤖 Model directory:    {}", config.model_dir.display());
    println!("🌐 Chat endpoint:      http://localhost:{}/chat", addr.port());
    println!("⚙️  Binding to address: {}", addr);
    println!("🧠 Device:             {:?}", config.device);
    println!(
        "🎲 Sampling:           max_new_tokens={} temperature={} top_p={}",
        config.generation.max_new_tokens, config.generation.temperature, config.generation.top_p
    );
    println!("🔒 CORS enabled:       {}", config.enable_cors);
    println!("=================================================================\n");

    info!("Starting chat server on {}", addr);
    println!("Server starting! Press Ctrl+C to stop.");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    println!("\nServer shutdown complete.");
    Ok(())
}

/// # Handle Shutdown Signal (`shutdown_signal`)
///
/// Resolves when Ctrl+C or (on Unix) SIGTERM is received, letting `axum::serve`
/// finish in-flight requests before exiting.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!(
                    "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                    e
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// # Bind Available Port (`bind_available_port`)
///
/// Tries `start_port` and then the following ports, `max_attempts` ports in
/// total. With `max_attempts == 1` only the requested port is tried. The
/// listener is returned still bound, so the port cannot be taken in between.
///
/// ## Errors
///
/// Returns an `Err` if no port in the range could be bound.
async fn bind_available_port(
    req_host: IpAddr,
    start_port: u16,
    max_attempts: u8,
) -> Result<TcpListener> {
    let mut current_port = start_port;

    for attempt in 0..max_attempts {
        let addr = SocketAddr::new(req_host, current_port);

        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if attempt > 0 {
                    info!(
                        "Port {} was unavailable, successfully bound to available port {}.",
                        start_port, current_port
                    );
                }
                return Ok(listener);
            }
            Err(e) => {
                warn!(
                    "Attempt {}: Port {} on host {} is unavailable (Error: {}).",
                    attempt + 1,
                    current_port,
                    req_host,
                    e
                );
                match current_port.checked_add(1) {
                    Some(next) => current_port = next,
                    None => break,
                }
            }
        }
    }

    anyhow::bail!(
        "Could not find an available port on host {} starting from port {} after trying {} port(s).",
        req_host,
        start_port,
        max_attempts
    )
}

/// # Create Axum Application (`create_app`)
///
/// Builds the router: `POST /chat` plus tracing and CORS middleware.
fn create_app(config: &ServerConfig, state: Arc<AppState>) -> Router {
    // Disabled CORS means no layer at all; an empty `CorsLayer` still adds `Vary`.
    let cors_layer = if config.enable_cors {
        info!("CORS middleware enabled (permissive).");
        Some(CorsLayer::permissive())
    } else {
        info!("CORS middleware disabled.");
        None
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .option_layer(cors_layer),
        )
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::model::{DeviceKind, GenerationParams, TextGenerator};
    use crate::common::reply::tests::{FailingGenerator, ScriptedGenerator};
    use crate::common::screening::Screening;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::net::Ipv4Addr;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    fn test_config(enable_cors: bool) -> ServerConfig {
        ServerConfig {
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            enable_cors,
            port_attempts: 1,
            model_dir: PathBuf::from("/unused"),
            device: DeviceKind::Cpu,
            generation: GenerationParams::default(),
        }
    }

    fn app_with(generator: Arc<dyn TextGenerator>, enable_cors: bool) -> Router {
        let responder = Responder::new(Screening::default(), generator);
        create_app(&test_config(enable_cors), Arc::new(AppState { responder }))
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_empty_query_returns_400() {
        let generator = Arc::new(ScriptedGenerator::new(" unused"));
        for body in [r#"{"query": ""}"#, r#"{"query": "   "}"#, "{}", r#"{"query": null}"#] {
            let (status, json_body) = send(app_with(generator.clone(), true), chat_request(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json_body, json!({"error": "Query is required"}));
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_json_returns_400() {
        let generator = Arc::new(ScriptedGenerator::new(" unused"));
        let (status, json_body) = send(app_with(generator, true), chat_request("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body, json!({"error": "Query is required"}));
    }

    #[tokio::test]
    async fn test_greeting_reply() {
        let generator = Arc::new(ScriptedGenerator::new(" unused"));
        let (status, json_body) =
            send(app_with(generator.clone(), true), chat_request(r#"{"query": "Good Morning"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body,
            json!({"response": "Hello! How can I assist you today?", "escalated": false})
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sensitive_query_is_escalated() {
        let generator = Arc::new(ScriptedGenerator::new(" unused"));
        let (status, json_body) = send(
            app_with(generator.clone(), true),
            chat_request(r#"{"query": "Has there been a DATA BREACH?"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body,
            json!({
                "response": " I can't provide a response. I will connect you to a human agent.",
                "escalated": true,
                "category": "Security & Data Breach"
            })
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generated_reply() {
        let generator = Arc::new(ScriptedGenerator::new(" We open at nine.\nQuestion: and?"));
        let (status, json_body) = send(
            app_with(generator.clone(), true),
            chat_request(r#"{"query": "When do you open?"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body, json!({"response": "We open at nine.", "escalated": false}));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_returns_500() {
        let (status, json_body) = send(
            app_with(Arc::new(FailingGenerator), true),
            chat_request(r#"{"query": "When do you open?"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body, json!({"error": "Failed to generate a response"}));
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let with_origin = || {
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::from(r#"{"query": "hi"}"#))
                .unwrap()
        };

        let generator = Arc::new(ScriptedGenerator::new(" unused"));
        let response = app_with(generator.clone(), true)
            .oneshot(with_origin())
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );

        let response = app_with(generator, false).oneshot(with_origin()).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_disabled_cors_adds_no_headers() {
        let generator = Arc::new(ScriptedGenerator::new(" unused"));
        let response = app_with(generator, false)
            .oneshot(chat_request(r#"{"query": "hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::VARY).is_none());
        assert!(!response
            .headers()
            .keys()
            .any(|name| name.as_str().starts_with("access-control-")));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let generator = Arc::new(ScriptedGenerator::new(" unused"));
        let response = app_with(generator, true)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bind_available_port_start_is_free() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 50000;

        let listener = bind_available_port(host, start_port, 5).await?;
        let addr = listener.local_addr()?;
        assert_eq!(addr.port(), start_port);
        assert_eq!(addr.ip(), host);
        Ok(())
    }

    #[tokio::test]
    async fn test_bind_available_port_holds_the_port() -> Result<()> {
        let host: IpAddr = Ipv4Addr::LOCALHOST.into();
        let start_port = 53000;

        let listener = bind_available_port(host, start_port, 1).await?;
        assert!(TcpListener::bind(SocketAddr::new(host, start_port)).await.is_err());
        drop(listener);
        Ok(())
    }

    #[tokio::test]
    async fn test_bind_available_port_zero_reports_assigned_port() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();

        let listener = bind_available_port(host, 0, 1).await?;
        assert_ne!(listener.local_addr()?.port(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_bind_available_port_start_occupied() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 51000;
        let _listener = TcpListener::bind(SocketAddr::new(host, start_port)).await?;

        let addr = bind_available_port(host, start_port, 5).await?.local_addr()?;
        assert!(addr.port() > start_port);
        assert!(addr.port() < start_port + 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_bind_available_port_strict_fails_when_occupied() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 52000;
        let _listener = TcpListener::bind(SocketAddr::new(host, start_port)).await?;

        let result = bind_available_port(host, start_port, 1).await;
        assert!(result.is_err());
        Ok(())
    }
}
