//! Settings persistence
//!
//! Settings are stored as key-value pairs with JSON-serialized values. The
//! library settings record lives under a single key; `load` falls back to
//! defaults when nothing has been persisted yet.
//!
//! # Example
//!
//! ```rust,no_run
//! use tonearm_storage::settings;
//! use tonearm_core::LibrarySettings;
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! let mut current = settings::load(pool).await?;
//! current.watch_for_changes = false;
//! settings::save(pool, &current).await?;
//! # Ok(())
//! # }
//! ```

use crate::{Result, StorageError};
use sqlx::{Row, SqlitePool};
use tonearm_core::LibrarySettings;

/// Key under which the library settings record is stored
pub const KEY_LIBRARY_SETTINGS: &str = "library.settings";

/// Load the persisted library settings, or defaults when absent
pub async fn load(pool: &SqlitePool) -> Result<LibrarySettings> {
    match get_value(pool, KEY_LIBRARY_SETTINGS).await? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| StorageError::Serialization(e.to_string())),
        None => Ok(LibrarySettings::default()),
    }
}

/// Persist the library settings record
pub async fn save(pool: &SqlitePool, settings: &LibrarySettings) -> Result<()> {
    let value = serde_json::to_value(settings)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    set_value(pool, KEY_LIBRARY_SETTINGS, &value).await
}

/// Get a raw setting value by key
pub async fn get_value(pool: &SqlitePool, key: &str) -> Result<Option<serde_json::Value>> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let raw: String = row.get("value");
            let value = serde_json::from_str(&raw)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Set a raw setting value by key
pub async fn set_value(pool: &SqlitePool, key: &str, value: &serde_json::Value) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(raw)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}
