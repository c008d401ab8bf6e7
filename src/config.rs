//! Configuration management for the attendance API.
//!
//! Settings come from command-line arguments or environment variables, with
//! defaults for everything optional.
//!
//! # Environment Variables
//!
//! - `ATTENDANCE_HOST` - Server bind address (default: 0.0.0.0)
//! - `ATTENDANCE_PORT` - Server port (default: 8787)
//! - `ATTENDANCE_DATABASE` - SQLite database path, or `:memory:`
//! - `ATTENDANCE_STATIC_DIR` - Front-end directory served for non-API paths
//! - `GOOGLE_SHEETS_ID` - Spreadsheet to append registrations and marks to
//! - `GOOGLE_SHEETS_TOKEN` - OAuth access token for the Sheets API
//! - `ATTENDANCE_SHEETS_ENDPOINT` - Sheets API base URL override
//!
//! Without a database the server still starts, but every `/api/` request
//! answers `Database not bound`.

use std::path::PathBuf;

use clap::Parser;

use crate::sync::DEFAULT_SHEETS_ENDPOINT;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8787;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Attendance API - student registration and daily attendance over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "attendance-api")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "ATTENDANCE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "ATTENDANCE_PORT")]
    pub port: u16,

    /// Directory of static front-end assets served for non-API paths.
    #[arg(long, env = "ATTENDANCE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    // =========================================================================
    // Store Configuration
    // =========================================================================
    /// SQLite database file (created if missing). Use `:memory:` for a
    /// throwaway database.
    #[arg(short, long, env = "ATTENDANCE_DATABASE")]
    pub database: Option<PathBuf>,

    // =========================================================================
    // Spreadsheet Sync Configuration
    // =========================================================================
    /// Google spreadsheet id for the best-effort row sync.
    #[arg(long, env = "GOOGLE_SHEETS_ID")]
    pub sheets_id: Option<String>,

    /// OAuth access token used for the Sheets API.
    #[arg(long, env = "GOOGLE_SHEETS_TOKEN", hide_env_values = true)]
    pub sheets_token: Option<String>,

    /// Sheets API base URL.
    #[arg(long, default_value = DEFAULT_SHEETS_ENDPOINT, env = "ATTENDANCE_SHEETS_ENDPOINT")]
    pub sheets_endpoint: String,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }

        if let Some(ref path) = self.database {
            if path.as_os_str().is_empty() {
                return Err(
                    "database path is empty. Set --database or ATTENDANCE_DATABASE".to_string(),
                );
            }
        }

        if let Some(ref dir) = self.static_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "static directory '{}' does not exist",
                    dir.display()
                ));
            }
        }

        match (&self.sheets_id, &self.sheets_token) {
            (Some(_), None) => {
                return Err(
                    "GOOGLE_SHEETS_ID is set but no access token provided. \
                     Set --sheets-token or GOOGLE_SHEETS_TOKEN"
                        .to_string(),
                )
            }
            (None, Some(_)) => {
                return Err(
                    "GOOGLE_SHEETS_TOKEN is set but no spreadsheet id provided. \
                     Set --sheets-id or GOOGLE_SHEETS_ID"
                        .to_string(),
                )
            }
            _ => {}
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Spreadsheet id and token, when sync is fully configured.
    pub fn sheets_credentials(&self) -> Option<(&str, &str)> {
        match (&self.sheets_id, &self.sheets_token) {
            (Some(id), Some(token)) => Some((id.as_str(), token.as_str())),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
