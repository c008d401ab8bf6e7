//! Attendance API - student registration and daily attendance over HTTP.
//!
//! This binary opens the store, wires optional spreadsheet sync and starts
//! the HTTP server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attendance_api::{
    config::Config,
    server::{create_router, AppState, RouterConfig},
    AttendanceService, GoogleSheetsSync, SqliteDatabase, SyncDispatcher,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Attendance API v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");

    let state = match config.database {
        Some(ref path) => match SqliteDatabase::open(path) {
            Ok(db) => {
                info!("  Database: {}", path.display());
                AppState::new(AttendanceService::new(db))
            }
            Err(e) => {
                error!("Failed to open database '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            warn!("  Database: NOT BOUND - every API request will fail");
            warn!("            Set --database or ATTENDANCE_DATABASE");
            AppState::unbound()
        }
    };

    let state = match config.sheets_credentials() {
        Some((id, token)) => {
            match GoogleSheetsSync::with_endpoint(&config.sheets_endpoint, id, token) {
                Ok(sync) => {
                    info!("  Sheets sync: enabled (spreadsheet {})", sync.spreadsheet_id());
                    state.with_sync(SyncDispatcher::new(sync))
                }
                Err(e) => {
                    error!("Configuration error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => {
            info!("  Sheets sync: disabled");
            state
        }
    };

    let router_config = build_router_config(&config);
    match router_config.static_dir {
        Some(ref dir) => info!("  Static files: {}", dir.display()),
        None => info!("  Static files: none"),
    }

    let router = create_router(state, router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/api/student_attendance", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "attendance_api=debug,tower_http=debug"
    } else {
        "attendance_api=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the CLI configuration.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_tracing(!config.no_tracing);
    if let Some(ref dir) = config.static_dir {
        router_config = router_config.with_static_dir(dir.clone());
    }
    router_config
}
