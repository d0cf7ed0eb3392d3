mod config;
pub mod database;
pub mod legacy;
pub mod migrations;
mod session;

pub use config::{Config, NotificationsConfig, ScheduleConfig};
pub use database::Database;
pub use legacy::import_legacy_csv;
pub use session::{MemorySessionStore, SessionRecord, SessionStore, DATE_FORMAT, TIME_FORMAT};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory.
///
/// `POMOCYCLE_DATA_DIR` wins when set. Otherwise `~/.config/pomocycle[-dev]/`,
/// with POMOCYCLE_ENV=dev selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOCYCLE_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOCYCLE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomocycle-dev")
            } else {
                base_dir.join("pomocycle")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
