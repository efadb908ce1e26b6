use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use folio_core::Site;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use super::build::build_into;

#[derive(Clone)]
struct AppState {
    reload_tx: broadcast::Sender<()>,
}

/// Start preview server with hot reload for local development.
///
/// This command:
/// - Loads folio.toml and the content directory
/// - Builds the site into a temporary directory and serves it
/// - Watches the site for changes, rebuilds, and triggers a browser reload
///
/// # Arguments
///
/// * `path` - Path to site directory containing folio.toml
/// * `port` - Port to serve on (default: 8080)
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("📝 Starting preview server...");
    println!("   Site: {}", path.display());

    if !path.exists() {
        anyhow::bail!(
            "Site directory does not exist: {}\nRun 'folio init {}' first",
            path.display(),
            path.display()
        );
    }

    let site = Site::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    println!("   ✓ Loaded: {}", site.config.site.title);
    println!("   ✓ Documents: {}", site.store.all_documents().len());

    let out_dir = tempfile::tempdir().context("Failed to create preview directory")?;
    build_into(&site, out_dir.path(), true)?;

    // Create broadcast channel for reload events
    let (reload_tx, _) = broadcast::channel::<()>(100);

    let state = AppState {
        reload_tx: reload_tx.clone(),
    };

    let app = Router::new()
        .route("/_reload", get(sse_handler))
        .fallback_service(ServeDir::new(out_dir.path()))
        .with_state(state);

    let watcher_path = path.clone();
    let watcher_out = out_dir.path().to_path_buf();
    let watcher_tx = reload_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_files(watcher_path, watcher_out, watcher_tx).await {
            eprintln!("File watcher error: {}", e);
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}/post/", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Watch for file changes, rebuild, and trigger reload
async fn watch_files(
    path: PathBuf,
    out_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&path, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        if !is_relevant(&event) {
            continue;
        }
        // Editors emit bursts of events for one save
        while rx.try_recv().is_ok() {}

        println!("   📝 File changed, rebuilding...");
        let site_path = path.clone();
        let out = out_dir.clone();
        let result = tokio::task::spawn_blocking(move || rebuild(&site_path, &out)).await?;

        match result {
            Ok(()) => {
                let _ = reload_tx.send(());
            }
            Err(e) => {
                warn!(error = %e, "rebuild failed");
                eprintln!("   ✗ Rebuild failed: {:#}", e);
            }
        }
    }

    Ok(())
}

fn rebuild(path: &Path, out_dir: &Path) -> Result<()> {
    let site = Site::load(path)?;
    build_into(&site, out_dir, true)?;
    Ok(())
}

/// Content and config changes; hidden and editor temp files are ignored
fn is_relevant(event: &NotifyEvent) -> bool {
    match event.kind {
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
            event.paths.iter().any(|p| {
                let filename = p.file_name().unwrap_or_default().to_string_lossy();
                !filename.starts_with('.') && !filename.ends_with('~')
            })
        }
        _ => {
            debug!(kind = ?event.kind, "ignored watch event");
            false
        }
    }
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
