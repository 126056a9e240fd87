//! JSON records in the key-value store, read fail-soft.

use serde::Serialize;
use serde::de::DeserializeOwned;
use storage::repository::KeyValueStore;

pub(crate) const PROGRESS_KEY: &str = "progress";
pub(crate) const SESSIONS_KEY: &str = "sessions";

/// Reads and decodes `key`.
///
/// Missing, unreadable and malformed records all come back as `None`; only
/// the last two are logged.
pub(crate) async fn read_json<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match kv.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(key, error = %err, "storage read failed, falling back to defaults");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding malformed record");
            None
        }
    }
}

/// Reads a JSON array under `key`, keeping every element that decodes.
///
/// A bad entry is logged and skipped instead of discarding its neighbours.
pub(crate) async fn read_json_list<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let Some(entries) = read_json::<Vec<serde_json::Value>>(kv, key).await else {
        return Vec::new();
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, index, error = %err, "skipping malformed entry");
                None
            }
        })
        .collect()
}

/// Encodes and stores `value` under `key`. Returns whether the write landed.
pub(crate) async fn write_json<T: Serialize>(
    kv: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(key, error = %err, "could not encode record");
            return false;
        }
    };

    match kv.set(key, &raw).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(key, error = %err, "storage write failed, change not persisted");
            false
        }
    }
}
