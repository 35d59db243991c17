use crate::analytics::AnalyticsReporter;
use crate::assistant::Concierge;
use crate::catalog::CatalogRepository;
use crate::comments::CommentStore;
use crate::config::Config;
use crate::error::Result;
use crate::inbox::InboxStore;
use crate::latency::Latency;
use crate::ledger::ActivityLedger;
use crate::ranking::RankingEngine;
use crate::session::{RootIdentity, SessionStore};
use crate::storage::{self, JsonStore};
use std::sync::Arc;
use tracing::info;

/// Every component wired to one shared store. Built once at startup.
pub struct StreamingCatalog {
    pub store: Arc<JsonStore>,
    pub catalog: Arc<CatalogRepository>,
    pub sessions: Arc<SessionStore>,
    pub ledger: Arc<ActivityLedger>,
    pub ranking: Arc<RankingEngine>,
    pub inbox: Arc<InboxStore>,
    pub comments: Arc<CommentStore>,
    pub analytics: Arc<AnalyticsReporter>,
    pub concierge: Arc<Concierge>,
}

impl StreamingCatalog {
    pub fn new(store: Arc<JsonStore>, config: &Config) -> Self {
        let latency = Latency::from_millis(config.latency.simulated_ms);
        let root = RootIdentity::from(&config.root_identity);
        let admin_email = root.email().to_string();

        let ledger = Arc::new(ActivityLedger::new(store.clone(), config.ledger.retention));
        let catalog = Arc::new(CatalogRepository::new(store.clone(), ledger.clone()));
        let sessions = Arc::new(SessionStore::new(store.clone(), ledger.clone(), root, latency));
        let ranking = Arc::new(RankingEngine::new(
            store.clone(),
            catalog.clone(),
            ledger.clone(),
            config.ranking.channel_capacity,
            config.ranking.top_limit,
        ));
        let inbox = Arc::new(InboxStore::new(store.clone(), ledger.clone(), admin_email, latency));
        let comments = Arc::new(CommentStore::new(store.clone()));
        let analytics = Arc::new(AnalyticsReporter::new(
            store.clone(),
            catalog.clone(),
            sessions.clone(),
            latency,
        ));
        let concierge = Arc::new(Concierge::new(catalog.clone(), sessions.clone()));

        Self {
            store,
            catalog,
            sessions,
            ledger,
            ranking,
            inbox,
            comments,
            analytics,
            concierge,
        }
    }

    /// Opens the configured backend and wires everything to it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = storage::open_backend(&config.storage)?;
        info!(
            "Opened {:?} store (latency {}ms, ledger retention {})",
            config.storage.backend, config.latency.simulated_ms, config.ledger.retention
        );
        Ok(Self::new(Arc::new(JsonStore::new(backend)), config))
    }
}
