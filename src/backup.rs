use crate::constants::{ACCOUNTS_KEY, ANALYTICS_KEY, CATALOG_KEY, INBOX_KEY};
use crate::error::Result;
use crate::storage::JsonStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// Point-in-time copy of the shared collections, as stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub exported_at: DateTime<Utc>,
    pub catalog: Value,
    pub accounts: Value,
    pub analytics: Value,
    pub inbox: Value,
    /// SHA-256 hex of the four collections serialized in the order above.
    pub checksum: String,
}

impl BackupSnapshot {
    pub fn verify(&self) -> Result<bool> {
        Ok(checksum(&[&self.catalog, &self.accounts, &self.analytics, &self.inbox])? == self.checksum)
    }
}

fn checksum(values: &[&Value]) -> Result<String> {
    let mut hasher = Sha256::new();
    for value in values {
        hasher.update(serde_json::to_vec(value)?);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn raw_value(store: &JsonStore, key: &str) -> Result<Value> {
    let Some(raw) = store.raw(key)? else {
        return Ok(Value::Null);
    };
    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("Exporting '{}' as text, it is not valid JSON: {}", key, e);
        Value::String(raw)
    }))
}

pub fn export_snapshot(store: &JsonStore) -> Result<BackupSnapshot> {
    let catalog = raw_value(store, CATALOG_KEY)?;
    let accounts = raw_value(store, ACCOUNTS_KEY)?;
    let analytics = raw_value(store, ANALYTICS_KEY)?;
    let inbox = raw_value(store, INBOX_KEY)?;
    let checksum = checksum(&[&catalog, &accounts, &analytics, &inbox])?;
    info!("Exported backup snapshot {}", &checksum[..12]);
    Ok(BackupSnapshot {
        exported_at: Utc::now(),
        catalog,
        accounts,
        analytics,
        inbox,
        checksum,
    })
}
