//! Per-user cart/favorites/history store, persisted to one JSON file.
//!
//! Items are loosely-schemaed JSON objects produced by the judge and
//! round-tripped through clients; no schema is enforced beyond best-effort
//! key access with defaults. The whole multi-user map lives behind one
//! mutex and is rewritten to disk (write-temp-then-rename) after every
//! mutation. Persistence failures are logged and swallowed; the store
//! keeps serving from memory.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// History keeps the 50 most recent evaluations, oldest evicted first.
pub const HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub cart: Vec<Value>,
    #[serde(default)]
    pub favorites: Vec<Value>,
    #[serde(default)]
    pub history: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub cart_items: usize,
    pub favorite_items: usize,
    pub total_evaluations: usize,
    pub average_cart_score: f64,
}

/// `food_id` of an item, when present.
pub fn item_food_id(item: &Value) -> Option<&str> {
    item.get("food_id").and_then(Value::as_str)
}

/// `overall_score` of an item, defaulting to 0.
pub fn item_score(item: &Value) -> f64 {
    item.get("overall_score")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// `overall_rating` of an item. Missing ratings count as POOR, matching the
/// summary distribution semantics.
pub fn item_rating(item: &Value) -> &str {
    item.get("overall_rating")
        .and_then(Value::as_str)
        .unwrap_or("POOR")
}

fn merge_into(existing: &mut Value, incoming: &Value) {
    match (existing.as_object_mut(), incoming.as_object()) {
        (Some(dst), Some(src)) => {
            for (key, value) in src {
                dst.insert(key.clone(), value.clone());
            }
        }
        _ => *existing = incoming.clone(),
    }
}

fn shares_food_id(a: &Value, b: &Value) -> bool {
    match (item_food_id(a), item_food_id(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

pub struct Store {
    users: Mutex<HashMap<String, UserRecord>>,
    data_file: PathBuf,
}

impl Store {
    /// Open the store, loading `data_file` if it exists. A missing file is
    /// an empty store; an unreadable or unparsable one is logged and
    /// treated the same.
    pub async fn open(data_file: &Path) -> Self {
        let users = match tokio::fs::read_to_string(data_file).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(users) => users,
                Err(e) => {
                    tracing::warn!(
                        path = %data_file.display(),
                        "store file unparsable, starting empty: {e}"
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => {
                let err = StoreError::Read {
                    path: data_file.display().to_string(),
                    source,
                };
                tracing::warn!("starting empty: {err}");
                HashMap::new()
            }
        };

        Self {
            users: Mutex::new(users),
            data_file: data_file.to_path_buf(),
        }
    }

    /// Add to cart; an existing entry with the same `food_id` is merged
    /// field-wise (new values win) instead of duplicated.
    pub async fn add_to_cart(&self, user_id: &str, item: Value) {
        {
            let mut users = self.users.lock().await;
            let record = users.entry(user_id.to_string()).or_default();
            match record
                .cart
                .iter_mut()
                .find(|existing| shares_food_id(existing, &item))
            {
                Some(existing) => merge_into(existing, &item),
                None => record.cart.push(item),
            }
        }
        self.persist().await;
    }

    pub async fn get_cart(&self, user_id: &str) -> Vec<Value> {
        let mut users = self.users.lock().await;
        users.entry(user_id.to_string()).or_default().cart.clone()
    }

    pub async fn remove_from_cart(&self, user_id: &str, food_id: &str) {
        {
            let mut users = self.users.lock().await;
            let record = users.entry(user_id.to_string()).or_default();
            record.cart.retain(|item| item_food_id(item) != Some(food_id));
        }
        self.persist().await;
    }

    pub async fn clear_cart(&self, user_id: &str) {
        {
            let mut users = self.users.lock().await;
            users.entry(user_id.to_string()).or_default().cart.clear();
        }
        self.persist().await;
    }

    /// Add to favorites unless an entry with the same `food_id` is already
    /// present. Idempotent per `food_id`.
    pub async fn add_to_favorites(&self, user_id: &str, item: Value) {
        let changed = {
            let mut users = self.users.lock().await;
            let record = users.entry(user_id.to_string()).or_default();
            if record
                .favorites
                .iter()
                .any(|existing| shares_food_id(existing, &item))
            {
                false
            } else {
                record.favorites.push(item);
                true
            }
        };
        if changed {
            self.persist().await;
        }
    }

    pub async fn get_favorites(&self, user_id: &str) -> Vec<Value> {
        let mut users = self.users.lock().await;
        users
            .entry(user_id.to_string())
            .or_default()
            .favorites
            .clone()
    }

    pub async fn remove_from_favorites(&self, user_id: &str, food_id: &str) {
        {
            let mut users = self.users.lock().await;
            let record = users.entry(user_id.to_string()).or_default();
            record
                .favorites
                .retain(|item| item_food_id(item) != Some(food_id));
        }
        self.persist().await;
    }

    pub async fn add_to_history(&self, user_id: &str, item: Value) {
        {
            let mut users = self.users.lock().await;
            let record = users.entry(user_id.to_string()).or_default();
            record.history.push(item);
            if record.history.len() > HISTORY_CAP {
                record.history.remove(0);
            }
        }
        self.persist().await;
    }

    pub async fn get_history(&self, user_id: &str) -> Vec<Value> {
        let mut users = self.users.lock().await;
        users
            .entry(user_id.to_string())
            .or_default()
            .history
            .clone()
    }

    /// Cart + favorites count, used for assigning the next `food_id`.
    pub async fn food_count(&self, user_id: &str) -> usize {
        let mut users = self.users.lock().await;
        let record = users.entry(user_id.to_string()).or_default();
        record.cart.len() + record.favorites.len()
    }

    pub async fn get_user_stats(&self, user_id: &str) -> UserStats {
        let mut users = self.users.lock().await;
        let record = users.entry(user_id.to_string()).or_default();
        let average_cart_score = if record.cart.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let len = record.cart.len() as f64;
            record.cart.iter().map(item_score).sum::<f64>() / len
        };
        UserStats {
            cart_items: record.cart.len(),
            favorite_items: record.favorites.len(),
            total_evaluations: record.history.len(),
            average_cart_score,
        }
    }

    async fn persist(&self) {
        let payload = {
            let users = self.users.lock().await;
            match serde_json::to_string_pretty(&*users).map_err(StoreError::from) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!("could not save store: {e}");
                    return;
                }
            }
        };

        if let Err(e) = write_atomic(&self.data_file, &payload).await {
            tracing::warn!("could not save store: {e}");
        }
    }
}

/// Write `content` to `<path>.tmp`, then rename over `path`. Readers never
/// observe a partially-written store file.
async fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
    let display = path.display().to_string();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Write {
                path: display.clone(),
                source,
            })?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|source| StoreError::Write {
            path: temp_path.display().to_string(),
            source,
        })?;

    if let Err(source) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StoreError::Write {
            path: display,
            source,
        });
    }

    Ok(())
}
