//! Local preview server for web builds.
//!
//! Serves a build directory over loopback HTTP until interrupted. Port
//! selection probes a bounded window of candidates up front; the probe does
//! not reserve the port, so the real bind can still fail and does so as an
//! ordinary error. Shutdown is driven by a small state machine: the signal
//! handler only requests the transition, the server loop tears the socket
//! down.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::TcpListener as StdTcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

const PORT_SEARCH_WINDOW: u16 = 10;

/// Preview server lifecycle; transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Idle,
    Serving,
    ShuttingDown,
    Stopped,
}

#[derive(Clone)]
struct AppState {
    dir: PathBuf,
    entry: String,
}

fn port_is_free(port: u16) -> bool {
    StdTcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// Pick the lowest free port at or above `requested` within the search
/// window. With the window exhausted, fall back to the requested port with
/// a warning so the real bind fails loudly instead of silently.
pub fn pick_port(requested: u16) -> u16 {
    for offset in 0..PORT_SEARCH_WINDOW {
        let Some(candidate) = requested.checked_add(offset) else {
            break;
        };
        if port_is_free(candidate) {
            if offset > 0 {
                println!("⚠ Port {requested} is busy, using {candidate} instead");
            }
            return candidate;
        }
    }
    println!("⚠ No free port found near {requested}; trying {requested} anyway");
    requested
}

/// Serve `dir` on loopback until Ctrl+C or SIGTERM, opening the browser at
/// the entry file once the server has had a moment to start.
pub async fn serve(dir: &Path, entry: &str, requested_port: u16) -> Result<()> {
    let (state_tx, state_rx) = tokio::sync::watch::channel(ServerState::Idle);

    let port = pick_port(requested_port);
    let addr = format!("127.0.0.1:{port}");
    // The probe above released the port again; a racing process can still
    // take it before this bind.
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    let app = Router::new()
        .route("/", get(serve_entry))
        .route("/{*path}", get(serve_file))
        .with_state(AppState {
            dir: dir.to_path_buf(),
            entry: entry.to_string(),
        });

    let url = format!("http://localhost:{port}/{entry}");
    println!("\n🔥 Serving at {url}");
    println!("   Press Ctrl+C to stop\n");

    state_tx.send_replace(ServerState::Serving);
    tracing::debug!("Preview server serving {}", dir.display());

    // Best-effort browser launch; failure must not abort the serve loop.
    tokio::spawn({
        let url = url.clone();
        async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if let Err(err) = open::that(&url) {
                tracing::warn!("Could not open browser: {}", err);
            }
        }
    });

    // The signal handler only requests the transition; the serve loop
    // observes it through the receiver and performs the actual teardown.
    tokio::spawn({
        let state_tx = state_tx.clone();
        async move {
            shutdown_signal().await;
            println!("\nStopping preview server...");
            state_tx.send_replace(ServerState::ShuttingDown);
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_state(state_rx, ServerState::ShuttingDown))
        .await
        .context("Preview server error")?;

    state_tx.send_replace(ServerState::Stopped);
    tracing::debug!("Preview server stopped");
    Ok(())
}

/// Resolve once the lifecycle reaches `target` (or the sender is gone).
async fn wait_for_state(
    mut rx: tokio::sync::watch::Receiver<ServerState>,
    target: ServerState,
) {
    while *rx.borrow() != target {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!("Could not install SIGTERM handler: {}", err);
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

/// Serve the build's entry file at the root path.
async fn serve_entry(State(state): State<AppState>) -> Response {
    respond_with_file(&state.dir, &state.entry).await
}

/// Serve any other file from the build directory.
async fn serve_file(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    respond_with_file(&state.dir, path).await
}

async fn respond_with_file(dir: &Path, rel: &str) -> Response {
    // Keep requests inside the build directory.
    if rel.split('/').any(|part| part == "..") {
        return (StatusCode::NOT_FOUND, "404 Not Found").into_response();
    }

    let file_path = dir.join(rel);
    match fs::read(&file_path).await {
        Ok(content) => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", content_type_for_path(rel))
            .body(Body::from(content))
            .unwrap(),
        Err(_) => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

fn content_type_for_path(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn free_port_is_kept() {
        // Ask the OS for a port, release it, then expect pick_port to take
        // it (or a busier-moment neighbor within the window).
        let probe = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);

        let picked = pick_port(port);
        assert!(picked >= port);
        assert!(picked < port.saturating_add(PORT_SEARCH_WINDOW));
    }

    #[test]
    fn occupied_port_falls_through_to_next() {
        let holder = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = holder.local_addr().unwrap().port();

        let picked = pick_port(port);
        assert_ne!(picked, port);
        assert!(picked > port);
        assert!(picked < port.saturating_add(PORT_SEARCH_WINDOW));
    }

    #[test]
    fn exhausted_window_falls_back_to_requested() {
        // Find and hold a fully occupied window of consecutive ports.
        'bases: for base in (41000..60000).step_by(17) {
            let mut holders = Vec::new();
            for offset in 0..PORT_SEARCH_WINDOW {
                match TcpListener::bind(("127.0.0.1", base + offset)) {
                    Ok(listener) => holders.push(listener),
                    Err(_) => continue 'bases,
                }
            }
            assert_eq!(pick_port(base), base);
            return;
        }
        panic!("could not occupy a contiguous port window");
    }

    #[test]
    fn content_types_cover_web_build_outputs() {
        assert_eq!(content_type_for_path("main.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for_path("main.wasm"), "application/wasm");
        assert_eq!(
            content_type_for_path("main.js"),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(content_type_for_path("main.data"), "application/octet-stream");
    }

    #[tokio::test]
    async fn teardown_waits_for_the_shutting_down_transition() {
        let (tx, rx) = tokio::sync::watch::channel(ServerState::Idle);
        let mut teardown = std::pin::pin!(wait_for_state(rx, ServerState::ShuttingDown));

        // Entering Serving must not release the teardown future.
        tx.send_replace(ServerState::Serving);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), &mut teardown)
                .await
                .is_err()
        );

        tx.send_replace(ServerState::ShuttingDown);
        tokio::time::timeout(Duration::from_millis(50), teardown)
            .await
            .expect("teardown should resolve once ShuttingDown is requested");
    }

    #[tokio::test]
    async fn dropped_lifecycle_sender_releases_teardown() {
        let (tx, rx) = tokio::sync::watch::channel(ServerState::Serving);
        drop(tx);
        tokio::time::timeout(
            Duration::from_millis(50),
            wait_for_state(rx, ServerState::ShuttingDown),
        )
        .await
        .expect("teardown should resolve when the sender is gone");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let tmp = tempfile::tempdir().unwrap();
        let response = respond_with_file(tmp.path(), "absent.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn parent_traversal_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("ok.html"), "<html></html>").unwrap();

        let ok = respond_with_file(tmp.path(), "ok.html").await;
        assert_eq!(ok.status(), StatusCode::OK);

        let escape = respond_with_file(&tmp.path().join("sub"), "../ok.html").await;
        assert_eq!(escape.status(), StatusCode::NOT_FOUND);
    }
}
