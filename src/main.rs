use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use reelshelf::api::router::{self, AppState};
use reelshelf::catalog::VideoAggregator;
use reelshelf::core::auth::AdminAuth;
use reelshelf::core::config::AppConfig;
use reelshelf::core::shutdown::{ShutdownCoordinator, SHUTDOWN_TIMEOUT_SECS};
use reelshelf::interactions::memory::{InMemoryCommentStore, InMemoryLikeStore};
use reelshelf::metadata::MetadataStore;
use reelshelf::observability::metrics as obs_metrics;
use reelshelf::storage::memory::InMemoryObjectStore;
use reelshelf::storage::s3::S3ObjectStore;
use reelshelf::storage::ObjectStore;

#[tokio::main]
async fn main() -> ExitCode {
    // Install Prometheus metrics recorder.
    // Must be installed before any metrics are recorded.
    let metrics_handle = obs_metrics::install_prometheus_recorder();

    // Install panic hook: log panics with full backtrace and increment counter.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        obs_metrics::inc_panic_total();
        let backtrace = std::backtrace::Backtrace::force_capture();
        eprintln!("PANIC: {info}\nBacktrace:\n{backtrace}");
        default_hook(info);
    }));

    // Load configuration (layered: default.toml → {env}.toml → env vars)
    let config = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing / logging
    init_tracing(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    info!(version = env!("CARGO_PKG_VERSION"), "reelshelf starting");

    obs_metrics::describe_all_metrics();

    // Select the storage backend.
    let store: Arc<dyn ObjectStore> = match config.storage.backend.as_str() {
        "s3" => {
            info!(
                endpoint = %config.storage.endpoint,
                bucket = %config.storage.bucket,
                "using S3-compatible storage backend"
            );
            Arc::new(S3ObjectStore::new(&config.storage))
        }
        "memory" => {
            warn!("using in-memory storage backend; objects are lost on restart");
            Arc::new(InMemoryObjectStore::new())
        }
        other => {
            error!(backend = %other, "unknown storage backend (expected \"s3\" or \"memory\")");
            return ExitCode::FAILURE;
        }
    };

    // Shared components.
    let shutdown = ShutdownCoordinator::new();
    let metadata = Arc::new(MetadataStore::new(store.clone(), &config.metadata_cache));
    let aggregator = Arc::new(VideoAggregator::new(store.clone(), metadata.clone()));
    let auth = Arc::new(AdminAuth::new(&config.admin));

    if config.admin.password.is_empty() {
        warn!("no admin password configured; admin endpoints cannot be used");
    }

    // Build the HTTP router.
    let start_time = std::time::Instant::now();
    let app_state = AppState {
        store: store.clone(),
        metadata: metadata.clone(),
        aggregator,
        likes: Arc::new(InMemoryLikeStore::new()),
        comments: Arc::new(InMemoryCommentStore::new()),
        auth: auth.clone(),
        config: config.clone(),
        start_time,
        metrics_handle,
    };
    let app = router::build_router(app_state);

    // Start uptime gauge task.
    let uptime_cancel = shutdown.token();
    tokio::spawn(async move {
        obs_metrics::run_uptime_task(start_time, uptime_cancel).await;
    });

    // Start session/brute-force sweep task.
    let sweep_auth = auth.clone();
    let sweep_cancel = shutdown.token();
    tokio::spawn(async move {
        run_auth_sweep_task(sweep_auth, sweep_cancel).await;
    });

    // Start SIGHUP config reload task (admin password rotation).
    let reload_auth = auth.clone();
    let reload_cancel = shutdown.token();
    tokio::spawn(async move {
        run_config_reload_task(reload_auth, reload_cancel).await;
    });

    // Start HTTP server.
    let http_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("invalid HTTP bind address");

    let listener = match tokio::net::TcpListener::bind(http_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%http_addr, error = %e, "failed to bind HTTP listener");
            return ExitCode::FAILURE;
        }
    };

    info!(%http_addr, "HTTP server listening");

    let shutdown_token = shutdown.token();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
            })
            .await
    });

    // Wait for shutdown signal, then drain in-flight requests.
    shutdown.wait_for_signal_and_shutdown().await;

    match tokio::time::timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("graceful shutdown completed");
            ExitCode::SUCCESS
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "HTTP server error during shutdown");
            ExitCode::FAILURE
        }
        Ok(Err(e)) => {
            error!(error = %e, "HTTP server task panicked");
            ExitCode::FAILURE
        }
        Err(_) => {
            error!("shutdown timed out after {}s, forcing exit", SHUTDOWN_TIMEOUT_SECS);
            ExitCode::FAILURE
        }
    }
}

/// Periodic cleanup of expired admin sessions and stale brute-force entries.
async fn run_auth_sweep_task(auth: Arc<AdminAuth>, cancel: tokio_util::sync::CancellationToken) {
    let interval = Duration::from_secs(60);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {
                auth.cleanup_expired_sessions();
                auth.cleanup_brute_force_tracker();
            }
        }
    }
}

/// SIGHUP config reload task.
///
/// On SIGHUP the configuration is reloaded from disk and the admin password
/// hash is swapped in place, enabling zero-downtime password rotation.
/// Existing sessions stay valid until their TTL runs out.
async fn run_config_reload_task(
    auth: Arc<AdminAuth>,
    cancel: tokio_util::sync::CancellationToken,
) {
    let mut sighup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to install SIGHUP handler, config reload disabled");
            return;
        }
    };

    info!("SIGHUP config reload task started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("config reload task shutting down");
                return;
            }
            _ = sighup.recv() => {
                info!("received SIGHUP, reloading configuration");
                match AppConfig::load() {
                    Ok(new_config) => {
                        auth.update_password(&new_config.admin.password);
                        info!(
                            new_log_level = %new_config.observability.log_level,
                            "configuration reloaded (admin password applied; other changes take effect on restart)"
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "failed to reload configuration on SIGHUP, keeping current config");
                    }
                }
            }
        }
    }
}

fn init_tracing(log_level: &str, log_format: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match log_format {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
