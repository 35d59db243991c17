use crate::constants::ANALYTICS_KEY;
use crate::domain::{LogEntry, LogKind};
use crate::error::Result;
use crate::metrics::CatalogMetrics;
use crate::storage::JsonStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// The analytics record: view counters and the activity log share one key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    #[serde(default)]
    pub views: HashMap<String, u64>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl AnalyticsRecord {
    /// Prepends `entry`, keeping at most `retention` entries.
    pub(crate) fn push_log(&mut self, entry: LogEntry, retention: usize) {
        self.logs.insert(0, entry);
        self.logs.truncate(retention);
    }
}

/// Append-only activity log, most recent first.
pub struct ActivityLedger {
    store: Arc<JsonStore>,
    retention: usize,
}

impl ActivityLedger {
    pub fn new(store: Arc<JsonStore>, retention: usize) -> Self {
        Self {
            store,
            retention: retention.max(1),
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub(crate) fn entry(kind: LogKind, details: impl Into<String>, actor_email: Option<&str>) -> LogEntry {
        LogEntry {
            id: Uuid::new_v4().to_string(),
            kind,
            details: details.into(),
            user_email: actor_email.map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    pub fn append(
        &self,
        kind: LogKind,
        details: impl Into<String>,
        actor_email: Option<&str>,
    ) -> Result<LogEntry> {
        let entry = Self::entry(kind, details, actor_email);
        let retention = self.retention;
        let size = self
            .store
            .update_default(ANALYTICS_KEY, |record: &mut AnalyticsRecord| {
                record.push_log(entry.clone(), retention);
                record.logs.len()
            })?;
        CatalogMetrics::record_ledger_size(size);
        debug!("Ledger {:?}: {}", entry.kind, entry.details);
        Ok(entry)
    }

    pub fn list(&self) -> Result<Vec<LogEntry>> {
        let record: AnalyticsRecord = self.store.read_or_default(ANALYTICS_KEY)?;
        Ok(record.logs)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut logs = self.list()?;
        logs.truncate(limit);
        Ok(logs)
    }

    /// Empties the log. View counters are kept.
    pub fn clear(&self) -> Result<()> {
        self.store
            .update_default(ANALYTICS_KEY, |record: &mut AnalyticsRecord| {
                record.logs.clear();
            })?;
        CatalogMetrics::record_ledger_size(0);
        info!("Activity ledger cleared");
        Ok(())
    }
}
