use crate::catalog::{CatalogRepository, Viewer};
use crate::constants::{ANALYTICS_KEY, TRENDING_BOOST};
use crate::domain::{Brand, CatalogItem, LogKind};
use crate::error::Result;
use crate::ledger::{ActivityLedger, AnalyticsRecord};
use crate::metrics::CatalogMetrics;
use crate::session::touch_continue_watching;
use crate::storage::JsonStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Published after every recorded view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEvent {
    pub item_id: String,
    pub count: u64,
    pub actor_email: Option<String>,
}

/// Tracks per-item view counts and ranks items for the Top-10 row.
///
/// Subscribers get a [`broadcast::Receiver`]; events sent before a receiver
/// exists are not replayed to it, and a lagging receiver drops the oldest events.
pub struct RankingEngine {
    store: Arc<JsonStore>,
    catalog: Arc<CatalogRepository>,
    ledger: Arc<ActivityLedger>,
    events: broadcast::Sender<ViewEvent>,
    top_limit: usize,
}

impl RankingEngine {
    pub fn new(
        store: Arc<JsonStore>,
        catalog: Arc<CatalogRepository>,
        ledger: Arc<ActivityLedger>,
        channel_capacity: usize,
        top_limit: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            store,
            catalog,
            ledger,
            events,
            top_limit,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    /// Counts one view of `item_id` and returns the new total.
    ///
    /// The counter bump and its `VIEW` ledger entry land in a single write.
    /// Ids that are not in the catalog are counted like any other.
    pub fn record_view(&self, item_id: &str, actor_email: Option<&str>) -> Result<u64> {
        let label = self
            .catalog
            .get(item_id)?
            .map(|item| item.name)
            .unwrap_or_else(|| item_id.to_string());
        let actor_email = actor_email.map(str::trim).filter(|e| !e.is_empty());
        let entry = ActivityLedger::entry(
            LogKind::View,
            format!("Viewed movie: {}", label),
            actor_email,
        );
        let retention = self.ledger.retention();

        let count = self
            .store
            .update_default(ANALYTICS_KEY, |record: &mut AnalyticsRecord| {
                let count = record.views.entry(item_id.to_string()).or_insert(0);
                *count += 1;
                let count = *count;
                record.push_log(entry, retention);
                count
            })?;

        if let Some(email) = actor_email {
            touch_continue_watching(&self.store, email, item_id)?;
        }

        CatalogMetrics::record_view();
        debug!("View #{} for {}", count, item_id);

        let event = ViewEvent {
            item_id: item_id.to_string(),
            count,
            actor_email: actor_email.map(str::to_string),
        };
        // No receivers is fine: nobody is showing a Top-10 row right now.
        let _ = self.events.send(event);
        Ok(count)
    }

    pub fn get_counts(&self) -> Result<HashMap<String, u64>> {
        let record: AnalyticsRecord = self.store.read_or_default(ANALYTICS_KEY)?;
        Ok(record.views)
    }

    /// Visible items of `brand`, ranked with the current counts.
    pub fn top_for(&self, viewer: Viewer, brand: Brand, limit: Option<usize>) -> Result<Vec<CatalogItem>> {
        let items: Vec<CatalogItem> = self
            .catalog
            .list_for(viewer)?
            .into_iter()
            .filter(|i| i.brand == brand)
            .collect();
        let counts = self.get_counts()?;
        let top = compute_top(&items, &counts, limit.unwrap_or(self.top_limit));
        info!("Top {} for {} computed from {} items", top.len(), brand.as_str(), items.len());
        Ok(top)
    }
}

/// Ranking score: organic views plus the trending boost.
pub fn effective_score(item: &CatalogItem, counts: &HashMap<String, u64>) -> u64 {
    let views = counts.get(&item.id).copied().unwrap_or(0);
    if item.is_trending {
        views.saturating_add(TRENDING_BOOST)
    } else {
        views
    }
}

/// Sorts by descending [`effective_score`], keeping input order on ties.
pub fn compute_top(
    items: &[CatalogItem],
    counts: &HashMap<String, u64>,
    limit: usize,
) -> Vec<CatalogItem> {
    let mut ranked: Vec<&CatalogItem> = items.iter().collect();
    ranked.sort_by(|a, b| effective_score(b, counts).cmp(&effective_score(a, counts)));
    ranked.into_iter().take(limit).cloned().collect()
}
