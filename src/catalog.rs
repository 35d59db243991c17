use crate::constants::CATALOG_KEY;
use crate::domain::{CatalogItem, CatalogItemPatch, LogKind, Session};
use crate::error::{CatalogError, Result};
use crate::ledger::ActivityLedger;
use crate::metrics::CatalogMetrics;
use crate::storage::JsonStore;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEFAULT_CATALOG: &str = include_str!("../data/default_catalog.json");

/// The built-in catalog written on first access.
pub fn default_catalog() -> Vec<CatalogItem> {
    serde_json::from_str(DEFAULT_CATALOG).unwrap_or_else(|e| {
        warn!("Built-in catalog is unreadable, starting empty: {}", e);
        Vec::new()
    })
}

/// Who is looking at the catalog. Hidden items are only ever shown to admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Guest,
    Member,
    Admin,
}

impl Viewer {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(s) if s.is_admin() => Viewer::Admin,
            Some(_) => Viewer::Member,
            None => Viewer::Guest,
        }
    }

    pub fn can_see(&self, item: &CatalogItem) -> bool {
        *self == Viewer::Admin || !item.is_hidden
    }

    pub fn filter(&self, items: Vec<CatalogItem>) -> Vec<CatalogItem> {
        items.into_iter().filter(|i| self.can_see(i)).collect()
    }
}

/// Owns the catalog collection. Returns items unfiltered; use the
/// `*_for(viewer)` helpers for anything shown to end users.
pub struct CatalogRepository {
    store: Arc<JsonStore>,
    ledger: Arc<ActivityLedger>,
}

impl CatalogRepository {
    pub fn new(store: Arc<JsonStore>, ledger: Arc<ActivityLedger>) -> Self {
        Self { store, ledger }
    }

    /// Every item, most recently added first. Seeds the default catalog when empty.
    pub fn list_all(&self) -> Result<Vec<CatalogItem>> {
        if let Some(items) = self.store.read::<Vec<CatalogItem>>(CATALOG_KEY)? {
            return Ok(items);
        }
        let items = self
            .store
            .update(CATALOG_KEY, default_catalog, |items: &mut Vec<CatalogItem>| {
                items.clone()
            })?;
        info!("Seeded catalog with {} default items", items.len());
        Ok(items)
    }

    pub fn list_for(&self, viewer: Viewer) -> Result<Vec<CatalogItem>> {
        Ok(viewer.filter(self.list_all()?))
    }

    pub fn get(&self, id: &str) -> Result<Option<CatalogItem>> {
        Ok(self.list_all()?.into_iter().find(|i| i.id == id))
    }

    /// Adds `item` under a freshly generated id, ignoring any id it carried.
    pub fn add(&self, mut item: CatalogItem) -> Result<CatalogItem> {
        if item.name.trim().is_empty() {
            return Err(CatalogError::ValidationFailure(
                "item name is required".to_string(),
            ));
        }
        // Make sure the seed is in place so the first upload does not replace it.
        self.list_all()?;

        item.id = Uuid::new_v4().to_string();
        let stored = item.clone();
        self.store
            .update(CATALOG_KEY, default_catalog, |items: &mut Vec<CatalogItem>| {
                items.insert(0, stored);
            })?;

        CatalogMetrics::record_item_write("add");
        debug!("Created item: {} with id {}", item.name, item.id);
        self.ledger
            .append(LogKind::Upload, format!("Uploaded movie: {}", item.name), None)?;
        Ok(item)
    }

    /// Merges `patch` into the item. Returns `false` when the id is unknown.
    pub fn update(&self, id: &str, patch: CatalogItemPatch) -> Result<bool> {
        if matches!(patch.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(CatalogError::ValidationFailure(
                "item name cannot be empty".to_string(),
            ));
        }
        let updated = self
            .store
            .update(CATALOG_KEY, default_catalog, |items: &mut Vec<CatalogItem>| {
                items.iter_mut().find(|i| i.id == id).map(|item| {
                    patch.apply_to(item);
                    item.name.clone()
                })
            })?;

        match updated {
            Some(name) => {
                CatalogMetrics::record_item_write("update");
                debug!("Updated item: {} with id {}", name, id);
                self.ledger
                    .append(LogKind::Upload, format!("Updated movie: {}", name), None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_hidden(&self, id: &str, hidden: bool) -> Result<bool> {
        self.update(id, CatalogItemPatch::hidden(hidden))
    }

    /// Flips the hidden flag, returning the new value, or `None` for an unknown id.
    pub fn toggle_hidden(&self, id: &str) -> Result<Option<bool>> {
        let Some(item) = self.get(id)? else {
            return Ok(None);
        };
        let hidden = !item.is_hidden;
        self.set_hidden(id, hidden)?;
        Ok(Some(hidden))
    }

    /// Deletes by id. Unknown ids are not an error; returns whether anything was removed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let removed = self
            .store
            .update(CATALOG_KEY, default_catalog, |items: &mut Vec<CatalogItem>| {
                let idx = items.iter().position(|i| i.id == id)?;
                Some(items.remove(idx))
            })?;

        match removed {
            Some(item) => {
                CatalogMetrics::record_item_write("remove");
                debug!("Deleted item: {} with id {}", item.name, id);
                self.ledger
                    .append(LogKind::Delete, format!("Deleted movie: {}", item.name), None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Case-insensitive substring match on the item name.
    pub fn search(&self, query: &str) -> Result<Vec<CatalogItem>> {
        let query_lower = query.trim().to_lowercase();
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|i| i.name.to_lowercase().contains(&query_lower))
            .collect())
    }

    pub fn search_for(&self, viewer: Viewer, query: &str) -> Result<Vec<CatalogItem>> {
        Ok(viewer.filter(self.search(query)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Brand, Section};

    fn repo() -> (CatalogRepository, Arc<ActivityLedger>) {
        let store = Arc::new(JsonStore::in_memory());
        let ledger = Arc::new(ActivityLedger::new(store.clone(), 100));
        (CatalogRepository::new(store, ledger.clone()), ledger)
    }

    #[test]
    fn first_access_seeds_default_catalog() {
        let (repo, _) = repo();
        let items = repo.list_all().unwrap();
        assert_eq!(items.len(), default_catalog().len());
        assert!(!items.is_empty());
    }

    #[test]
    fn add_prepends_with_fresh_id_and_logs_upload() {
        let (repo, ledger) = repo();
        let mut draft = CatalogItem::new("New Arrival", Brand::Tntfilms, Section::English);
        draft.id = "m1".into();

        let added = repo.add(draft).unwrap();
        assert_ne!(added.id, "m1");
        let items = repo.list_all().unwrap();
        assert_eq!(items[0].id, added.id);
        assert_eq!(items.len(), default_catalog().len() + 1);

        let logs = ledger.list().unwrap();
        assert_eq!(logs[0].kind, LogKind::Upload);
        assert_eq!(logs[0].details, "Uploaded movie: New Arrival");
    }

    #[test]
    fn add_requires_a_name() {
        let (repo, _) = repo();
        let err = repo
            .add(CatalogItem::new("  ", Brand::Aimefilms, Section::Rwanda))
            .unwrap_err();
        assert!(matches!(err, CatalogError::ValidationFailure(_)));
    }

    #[test]
    fn update_unknown_id_returns_false_without_logging() {
        let (repo, ledger) = repo();
        let changed = repo.update("nope", CatalogItemPatch::hidden(true)).unwrap();
        assert!(!changed);
        assert!(ledger.list().unwrap().is_empty());
    }

    #[test]
    fn toggling_hidden_twice_restores_visibility() {
        let (repo, _) = repo();
        let before = repo.get("m2").unwrap().unwrap().is_hidden;
        assert_eq!(repo.toggle_hidden("m2").unwrap(), Some(!before));
        assert_eq!(repo.toggle_hidden("m2").unwrap(), Some(before));
        assert_eq!(repo.get("m2").unwrap().unwrap().is_hidden, before);
    }

    #[test]
    fn hidden_items_only_reach_admins() {
        let (repo, _) = repo();
        repo.set_hidden("m3", true).unwrap();

        assert!(repo.list_all().unwrap().iter().any(|i| i.id == "m3"));
        assert!(repo.list_for(Viewer::Admin).unwrap().iter().any(|i| i.id == "m3"));
        assert!(!repo.list_for(Viewer::Member).unwrap().iter().any(|i| i.id == "m3"));
        assert!(repo.search_for(Viewer::Guest, "night").unwrap().is_empty());
    }

    #[test]
    fn remove_is_idempotent_and_logs_former_name() {
        let (repo, ledger) = repo();
        assert!(repo.remove("m5").unwrap());
        assert!(!repo.remove("m5").unwrap());

        let logs = ledger.list().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].kind, LogKind::Delete);
        assert_eq!(logs[0].details, "Deleted movie: The Long Rain");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let (repo, _) = repo();
        let hits = repo.search("KIGALI").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "m7");
        assert!(repo.search("zzz-no-match").unwrap().is_empty());
    }
}
