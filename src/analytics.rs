use crate::catalog::CatalogRepository;
use crate::constants::{ANALYTICS_KEY, UNKNOWN_ASSET};
use crate::domain::{Brand, LogEntry, Session};
use crate::error::Result;
use crate::latency::Latency;
use crate::ledger::AnalyticsRecord;
use crate::session::SessionStore;
use crate::storage::JsonStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

const TOP_ASSETS: usize = 10;
const NEW_USERS: usize = 10;
const RECENT_ACTIVITY: usize = 20;
const ENGAGEMENT_PER_VIEW: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopAsset {
    pub id: String,
    pub name: String,
    /// `None` when the item has since been deleted.
    pub brand: Option<Brand>,
    pub views: u64,
    pub rating: f64,
    /// 0..=100
    pub engagement: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BrandStats {
    pub views: u64,
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceReport {
    pub top_assets: Vec<TopAsset>,
    pub total_views: u64,
    pub new_users: Vec<Session>,
    pub recent_activity: Vec<LogEntry>,
    pub brand_stats: BTreeMap<Brand, BrandStats>,
}

/// Aggregates for the admin dashboard.
pub struct AnalyticsReporter {
    store: Arc<JsonStore>,
    catalog: Arc<CatalogRepository>,
    sessions: Arc<SessionStore>,
    latency: Latency,
}

impl AnalyticsReporter {
    pub fn new(
        store: Arc<JsonStore>,
        catalog: Arc<CatalogRepository>,
        sessions: Arc<SessionStore>,
        latency: Latency,
    ) -> Self {
        Self {
            store,
            catalog,
            sessions,
            latency,
        }
    }

    pub async fn intelligence_report(&self) -> Result<IntelligenceReport> {
        self.latency.wait().await;
        let record: AnalyticsRecord = self.store.read_or_default(ANALYTICS_KEY)?;
        let items = self.catalog.list_all()?;

        let mut top_assets: Vec<TopAsset> = record
            .views
            .iter()
            .map(|(id, &views)| {
                let item = items.iter().find(|i| &i.id == id);
                TopAsset {
                    id: id.clone(),
                    name: item.map_or_else(|| UNKNOWN_ASSET.to_string(), |i| i.name.clone()),
                    brand: item.map(|i| i.brand),
                    views,
                    rating: item
                        .and_then(|i| i.rating.trim().parse::<f64>().ok())
                        .unwrap_or(0.0),
                    engagement: views.saturating_mul(ENGAGEMENT_PER_VIEW).min(100) as u8,
                }
            })
            .collect();
        // Counts live in a map; break ties on id so the report is deterministic.
        top_assets.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.id.cmp(&b.id)));
        top_assets.truncate(TOP_ASSETS);

        let mut brand_stats: BTreeMap<Brand, BrandStats> = Brand::ALL
            .into_iter()
            .map(|b| {
                let count = items.iter().filter(|i| i.brand == b).count();
                (b, BrandStats { views: 0, items: count })
            })
            .collect();
        for (id, views) in &record.views {
            if let Some(item) = items.iter().find(|i| &i.id == id) {
                if let Some(stats) = brand_stats.get_mut(&item.brand) {
                    stats.views += views;
                }
            }
        }

        let accounts = self.sessions.list_accounts()?;
        let new_users = accounts[accounts.len().saturating_sub(NEW_USERS)..].to_vec();

        let mut recent_activity = record.logs;
        recent_activity.truncate(RECENT_ACTIVITY);

        let total_views = record.views.values().sum();
        info!(
            "Built intelligence report: {} total views across {} items",
            total_views,
            record.views.len()
        );
        Ok(IntelligenceReport {
            top_assets,
            total_views,
            new_users,
            recent_activity,
            brand_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ActivityLedger;
    use crate::ranking::RankingEngine;
    use crate::session::RootIdentity;

    #[tokio::test]
    async fn report_aggregates_views_and_brands() {
        let store = Arc::new(JsonStore::in_memory());
        let ledger = Arc::new(ActivityLedger::new(store.clone(), 100));
        let catalog = Arc::new(CatalogRepository::new(store.clone(), ledger.clone()));
        let sessions = Arc::new(SessionStore::new(
            store.clone(),
            ledger.clone(),
            RootIdentity::disabled(),
            Latency::none(),
        ));
        let ranking = RankingEngine::new(store.clone(), catalog.clone(), ledger, 8, 10);
        let reporter = AnalyticsReporter::new(store, catalog, sessions.clone(), Latency::none());

        for i in 0..12 {
            sessions
                .register(&format!("user{}", i), &format!("u{}@x.com", i), "pw")
                .unwrap();
        }
        for _ in 0..25 {
            ranking.record_view("m1", None).unwrap();
        }
        ranking.record_view("m4", None).unwrap();
        ranking.record_view("gone", None).unwrap();

        let report = reporter.intelligence_report().await.unwrap();
        assert_eq!(report.total_views, 27);

        let top = &report.top_assets[0];
        assert_eq!(top.id, "m1");
        assert_eq!(top.name, "Umurage");
        assert_eq!(top.engagement, 100);
        assert!((top.rating - 8.4).abs() < f64::EPSILON);

        let unknown = report.top_assets.iter().find(|a| a.id == "gone").unwrap();
        assert_eq!(unknown.name, UNKNOWN_ASSET);
        assert_eq!(unknown.brand, None);
        assert_eq!(unknown.engagement, 5);

        assert_eq!(report.brand_stats[&Brand::Aimefilms], BrandStats { views: 25, items: 3 });
        assert_eq!(report.brand_stats[&Brand::Tntfilms].views, 1);
        assert_eq!(report.brand_stats[&Brand::Princefilms].views, 0);

        assert_eq!(report.new_users.len(), 10);
        assert_eq!(report.new_users[9].email, "u11@x.com");
        assert_eq!(report.recent_activity.len(), 20);
    }
}
