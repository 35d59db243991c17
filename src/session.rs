//! Accounts, authentication and account-scoped collections.
//!
//! # Security note
//!
//! Nothing here is a security boundary. Secrets are stored as SHA-256 digests
//! salted only with the account email, and the quick-login cache may hold a
//! plain secret. The root identity is a fixed credential checked before any
//! stored account. The root
//! branch lives in [`RootIdentity`] so it can be rotated or disabled in config
//! without touching user records.

use crate::config::RootIdentityConfig;
use crate::constants::{
    self, ACCOUNTS_KEY, CURRENT_SESSION_KEY, KNOWN_ACCOUNTS_CAP, KNOWN_ACCOUNTS_KEY,
    PREFERRED_BRAND_KEY,
};
use crate::domain::{Brand, LogKind, ProfileUpdate, Role, Session, StoredAccount};
use crate::error::{CatalogError, Result};
use crate::latency::Latency;
use crate::ledger::ActivityLedger;
use crate::metrics::CatalogMetrics;
use crate::storage::JsonStore;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// 2024-01-01T00:00:00Z, the join date reported for the root identity.
const ROOT_JOINED_TS: i64 = 1_704_067_200;

fn hash_secret(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// The fixed privileged login, checked before stored accounts.
#[derive(Debug, Clone)]
pub struct RootIdentity {
    enabled: bool,
    name: String,
    email: String,
    password: String,
}

impl RootIdentity {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            name: String::new(),
            email: String::new(),
            password: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    fn owns_email(&self, email_lower: &str) -> bool {
        self.enabled && self.email.to_lowercase() == email_lower
    }

    fn matches(&self, identifier_lower: &str, password: &str) -> bool {
        self.enabled
            && (identifier_lower == self.email.to_lowercase()
                || identifier_lower == self.name.to_lowercase())
            && password == self.password
    }

    fn session(&self) -> Session {
        Session {
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: None,
            role: Role::Admin,
            is_verified: true,
            is_blocked: false,
            joined_at: DateTime::<Utc>::from_timestamp(ROOT_JOINED_TS, 0).unwrap_or_else(Utc::now),
        }
    }
}

impl From<&RootIdentityConfig> for RootIdentity {
    fn from(config: &RootIdentityConfig) -> Self {
        Self {
            enabled: config.enabled,
            name: config.name.trim().to_string(),
            email: config.email.trim().to_string(),
            password: config.password.clone(),
        }
    }
}

/// Entry of the quick-login cache. A UX shortcut only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownAccount {
    #[serde(flatten)]
    pub session: Session,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuickLogin {
    Authenticated(Session),
    /// No usable cached secret; the caller must prompt for credentials.
    CredentialsRequired { email: String },
}

pub struct SessionStore {
    store: Arc<JsonStore>,
    ledger: Arc<ActivityLedger>,
    root: RootIdentity,
    latency: Latency,
}

impl SessionStore {
    pub fn new(
        store: Arc<JsonStore>,
        ledger: Arc<ActivityLedger>,
        root: RootIdentity,
        latency: Latency,
    ) -> Self {
        Self {
            store,
            ledger,
            root,
            latency,
        }
    }

    pub fn root_identity(&self) -> &RootIdentity {
        &self.root
    }

    fn accounts(&self) -> Result<Vec<StoredAccount>> {
        self.store.read_or_default(ACCOUNTS_KEY)
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let name = name.trim();
        let email = email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(CatalogError::ValidationFailure(
                "name, email and password are required".to_string(),
            ));
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(CatalogError::ValidationFailure(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        if self.root.owns_email(&email) {
            return Err(CatalogError::DuplicateAccount(email));
        }

        let account = StoredAccount {
            name: name.to_string(),
            email: email.clone(),
            avatar: None,
            role: Role::User,
            is_verified: true,
            is_blocked: false,
            joined_at: Utc::now(),
            secret: hash_secret(&email, password),
        };
        let session = account.to_session();

        self.store
            .update_default(ACCOUNTS_KEY, |accounts: &mut Vec<StoredAccount>| {
                if accounts.iter().any(|a| a.email.to_lowercase() == email) {
                    return Err(CatalogError::DuplicateAccount(email.clone()));
                }
                accounts.push(account);
                Ok(())
            })??;

        CatalogMetrics::record_registration();
        info!("Registered account {}", session.email);
        self.ledger.append(
            LogKind::Register,
            format!("New user registered: {}", session.email),
            Some(&session.email),
        )?;
        Ok(session)
    }

    /// Checks `identifier` (email or display name) and `password`.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<Session> {
        self.latency.wait().await;
        let identifier_lower = identifier.trim().to_lowercase();

        if self.root.matches(&identifier_lower, password) {
            return self.issue_root_session();
        }

        let account = self.accounts()?.into_iter().find(|a| {
            a.email.to_lowercase() == identifier_lower || a.name.to_lowercase() == identifier_lower
        });
        let account = match account {
            Some(a) if a.secret == hash_secret(&a.email, password) => a,
            _ => {
                CatalogMetrics::record_login("failure");
                debug!("Rejected login for {}", identifier_lower);
                return Err(CatalogError::InvalidCredentials);
            }
        };

        CatalogMetrics::record_login("success");
        info!("User {} logged in", account.email);
        self.ledger
            .append(LogKind::Login, "User logged in", Some(&account.email))?;
        Ok(account.to_session())
    }

    /// Issues the root session without a password check. Used when another
    /// collaborator has already vouched for the root identity.
    pub fn root_session(&self) -> Result<Session> {
        if !self.root.is_enabled() {
            return Err(CatalogError::NotFound("root identity is disabled".to_string()));
        }
        self.issue_root_session()
    }

    fn issue_root_session(&self) -> Result<Session> {
        let session = self.root.session();
        CatalogMetrics::record_login("success");
        warn!("Root identity {} logged in", session.email);
        self.ledger
            .append(LogKind::Login, "Admin logged in", Some(&session.email))?;
        Ok(session)
    }

    /// Authenticates, makes the account the current session and records it in
    /// the quick-login cache, keeping the secret only when `remember` is set.
    pub async fn login(&self, identifier: &str, password: &str, remember: bool) -> Result<Session> {
        let session = self.authenticate(identifier, password).await?;
        self.set_current_session(&session)?;
        self.remember(&session, remember.then_some(password))?;
        Ok(session)
    }

    // Current session

    /// The session left signed in on this store, if any.
    pub fn current_session(&self) -> Result<Option<Session>> {
        self.store.read(CURRENT_SESSION_KEY)
    }

    pub fn set_current_session(&self, session: &Session) -> Result<()> {
        self.store.write(CURRENT_SESSION_KEY, session)
    }

    /// Clears the current session. The quick-login cache is kept.
    pub fn logout(&self) -> Result<Option<Session>> {
        let previous = self.current_session()?;
        self.store.remove(CURRENT_SESSION_KEY)?;
        if let Some(session) = &previous {
            info!("User {} logged out", session.email);
        }
        Ok(previous)
    }

    pub fn preferred_brand(&self) -> Result<Option<Brand>> {
        self.store.read(PREFERRED_BRAND_KEY)
    }

    /// `None` clears the choice so the brand picker shows again.
    pub fn set_preferred_brand(&self, brand: Option<Brand>) -> Result<()> {
        match brand {
            Some(brand) => self.store.write(PREFERRED_BRAND_KEY, &brand),
            None => self.store.remove(PREFERRED_BRAND_KEY),
        }
    }

    /// Flips the blocked flag and returns the new value.
    pub fn toggle_block(&self, email: &str) -> Result<bool> {
        let email_lower = email.trim().to_lowercase();
        let blocked = self
            .store
            .update_default(ACCOUNTS_KEY, |accounts: &mut Vec<StoredAccount>| {
                accounts
                    .iter_mut()
                    .find(|a| a.email.to_lowercase() == email_lower)
                    .map(|a| {
                        a.is_blocked = !a.is_blocked;
                        a.is_blocked
                    })
            })?
            .ok_or_else(|| CatalogError::NotFound(format!("account {}", email_lower)))?;

        let verb = if blocked { "Blocked" } else { "Unblocked" };
        info!("{} account {}", verb, email_lower);
        self.ledger
            .append(LogKind::Block, format!("{} user: {}", verb, email_lower), None)?;
        Ok(blocked)
    }

    pub async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<Session> {
        self.latency.wait().await;
        if matches!(update.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(CatalogError::ValidationFailure(
                "display name cannot be empty".to_string(),
            ));
        }
        let email_lower = email.trim().to_lowercase();
        let session = self
            .store
            .update_default(ACCOUNTS_KEY, |accounts: &mut Vec<StoredAccount>| {
                accounts
                    .iter_mut()
                    .find(|a| a.email.to_lowercase() == email_lower)
                    .map(|a| {
                        if let Some(name) = update.name {
                            a.name = name.trim().to_string();
                        }
                        if let Some(avatar) = update.avatar {
                            a.avatar = Some(avatar);
                        }
                        a.to_session()
                    })
            })?
            .ok_or_else(|| CatalogError::NotFound(format!("account {}", email_lower)))?;
        debug!("Updated profile for {}", email_lower);

        let signed_in = self.current_session()?;
        if matches!(signed_in, Some(current) if current.email.eq_ignore_ascii_case(&session.email)) {
            self.set_current_session(&session)?;
        }
        Ok(session)
    }

    /// All stored accounts in registration order, without secrets.
    pub fn list_accounts(&self) -> Result<Vec<Session>> {
        Ok(self.accounts()?.iter().map(StoredAccount::to_session).collect())
    }

    pub fn find_account(&self, email: &str) -> Result<Option<Session>> {
        let email_lower = email.trim().to_lowercase();
        Ok(self
            .accounts()?
            .iter()
            .find(|a| a.email.to_lowercase() == email_lower)
            .map(StoredAccount::to_session))
    }

    // Watchlist

    pub fn get_watchlist(&self, email: &str) -> Result<Vec<String>> {
        if email.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.store.read_or_default(&constants::watchlist_key(email))
    }

    /// Replaces the watchlist. Duplicate ids collapse to their first occurrence.
    pub fn set_watchlist(&self, email: &str, ids: &[String]) -> Result<Vec<String>> {
        require_email(email)?;
        let mut deduped: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !deduped.contains(id) {
                deduped.push(id.clone());
            }
        }
        self.store.write(&constants::watchlist_key(email), &deduped)?;
        Ok(deduped)
    }

    /// Adds or removes `item_id`; returns true when it is now on the list.
    pub fn toggle_watchlist(&self, email: &str, item_id: &str) -> Result<bool> {
        require_email(email)?;
        self.store
            .update_default(&constants::watchlist_key(email), |ids: &mut Vec<String>| {
                if let Some(idx) = ids.iter().position(|id| id == item_id) {
                    ids.remove(idx);
                    false
                } else {
                    ids.push(item_id.to_string());
                    true
                }
            })
    }

    /// Read-only; the list is written by the view-tracking flow.
    pub fn get_continue_watching(&self, email: &str) -> Result<Vec<String>> {
        if email.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.store.read_or_default(&constants::continue_key(email))
    }

    // Quick-login cache

    pub fn known_accounts(&self) -> Result<Vec<KnownAccount>> {
        self.store.read_or_default(KNOWN_ACCOUNTS_KEY)
    }

    pub fn remember(&self, session: &Session, secret: Option<&str>) -> Result<()> {
        let entry = KnownAccount {
            session: session.clone(),
            saved_secret: secret.map(str::to_string),
        };
        self.store
            .update_default(KNOWN_ACCOUNTS_KEY, |accounts: &mut Vec<KnownAccount>| {
                accounts.retain(|a| !a.session.email.eq_ignore_ascii_case(&entry.session.email));
                accounts.insert(0, entry);
                accounts.truncate(KNOWN_ACCOUNTS_CAP);
            })
    }

    pub fn forget(&self, email: &str) -> Result<()> {
        let email = email.trim();
        self.store
            .update_default(KNOWN_ACCOUNTS_KEY, |accounts: &mut Vec<KnownAccount>| {
                accounts.retain(|a| !a.session.email.eq_ignore_ascii_case(email));
            })
    }

    /// Signs in from the cache. A stale secret is dropped and the caller is
    /// asked for fresh credentials instead of failing silently.
    pub async fn quick_login(&self, email: &str) -> Result<QuickLogin> {
        let email = email.trim().to_string();
        let cached = self
            .known_accounts()?
            .into_iter()
            .find(|a| a.session.email.eq_ignore_ascii_case(&email));
        let Some(secret) = cached.and_then(|a| a.saved_secret) else {
            return Ok(QuickLogin::CredentialsRequired { email });
        };

        match self.authenticate(&email, &secret).await {
            Ok(session) => {
                self.set_current_session(&session)?;
                self.remember(&session, Some(&secret))?;
                Ok(QuickLogin::Authenticated(session))
            }
            Err(CatalogError::InvalidCredentials) => {
                debug!("Cached secret for {} no longer valid", email);
                self.store
                    .update_default(KNOWN_ACCOUNTS_KEY, |accounts: &mut Vec<KnownAccount>| {
                        for a in accounts
                            .iter_mut()
                            .filter(|a| a.session.email.eq_ignore_ascii_case(&email))
                        {
                            a.saved_secret = None;
                        }
                    })?;
                Ok(QuickLogin::CredentialsRequired { email })
            }
            Err(e) => Err(e),
        }
    }
}

fn require_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(CatalogError::ValidationFailure("email is required".to_string()));
    }
    Ok(())
}

/// Moves `item_id` to the front of the account's continue-watching list.
pub(crate) fn touch_continue_watching(
    store: &JsonStore,
    email: &str,
    item_id: &str,
) -> Result<Vec<String>> {
    store.update_default(&constants::continue_key(email), |ids: &mut Vec<String>| {
        ids.retain(|id| id != item_id);
        ids.insert(0, item_id.to_string());
        ids.truncate(constants::CONTINUE_WATCHING_CAP);
        ids.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootIdentityConfig;

    fn sessions() -> (SessionStore, Arc<ActivityLedger>, Arc<JsonStore>) {
        let store = Arc::new(JsonStore::in_memory());
        let ledger = Arc::new(ActivityLedger::new(store.clone(), 100));
        let root = RootIdentity::from(&RootIdentityConfig::default());
        (
            SessionStore::new(store.clone(), ledger.clone(), root, Latency::none()),
            ledger,
            store,
        )
    }

    #[tokio::test]
    async fn register_then_authenticate_with_any_case() {
        let (sessions, ledger, _) = sessions();
        sessions.register("Ann", "ann@x.com", "secret1").unwrap();

        let session = sessions.authenticate("ANN@X.COM", "secret1").await.unwrap();
        assert_eq!(session.email, "ann@x.com");
        assert_eq!(session.role, Role::User);
        assert!(session.is_verified);

        let by_name = sessions.authenticate(" ann ", "secret1").await.unwrap();
        assert_eq!(by_name.email, "ann@x.com");

        let kinds: Vec<LogKind> = ledger.list().unwrap().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![LogKind::Login, LogKind::Login, LogKind::Register]);
    }

    #[tokio::test]
    async fn duplicate_register_keeps_original_secret() {
        let (sessions, _, _) = sessions();
        sessions.register("Ann", "ann@x.com", "secret1").unwrap();
        let err = sessions.register("Other", "Ann@X.com", "secret2").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateAccount(_)));

        assert!(sessions.authenticate("ann@x.com", "secret1").await.is_ok());
        assert!(matches!(
            sessions.authenticate("ann@x.com", "secret2").await,
            Err(CatalogError::InvalidCredentials)
        ));
    }

    #[test]
    fn register_validates_input() {
        let (sessions, _, _) = sessions();
        assert!(matches!(
            sessions.register("", "a@x.com", "pw"),
            Err(CatalogError::ValidationFailure(_))
        ));
        assert!(matches!(
            sessions.register("A", "not-an-email", "pw"),
            Err(CatalogError::ValidationFailure(_))
        ));
        assert!(matches!(
            sessions.register("A", constants::ROOT_EMAIL, "pw"),
            Err(CatalogError::DuplicateAccount(_))
        ));
    }

    #[tokio::test]
    async fn wrong_secret_mutates_nothing() {
        let (sessions, ledger, store) = sessions();
        sessions.register("Ann", "ann@x.com", "secret1").unwrap();
        let accounts_before = store.raw(ACCOUNTS_KEY).unwrap();
        let logs_before = ledger.list().unwrap();

        let err = sessions.authenticate("ann@x.com", "nope").await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCredentials));
        assert!(matches!(
            sessions.authenticate("ghost@x.com", "secret1").await,
            Err(CatalogError::InvalidCredentials)
        ));

        assert_eq!(store.raw(ACCOUNTS_KEY).unwrap(), accounts_before);
        assert_eq!(ledger.list().unwrap(), logs_before);
    }

    #[tokio::test]
    async fn root_identity_is_admin_without_stored_account() {
        let (sessions, _, _) = sessions();
        let session = sessions
            .authenticate(constants::ROOT_NAME, constants::ROOT_PASSWORD)
            .await
            .unwrap();
        assert_eq!(session.role, Role::Admin);
        assert!(sessions.list_accounts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_root_identity_cannot_log_in() {
        let store = Arc::new(JsonStore::in_memory());
        let ledger = Arc::new(ActivityLedger::new(store.clone(), 100));
        let sessions = SessionStore::new(store, ledger, RootIdentity::disabled(), Latency::none());

        assert!(matches!(
            sessions
                .authenticate(constants::ROOT_EMAIL, constants::ROOT_PASSWORD)
                .await,
            Err(CatalogError::InvalidCredentials)
        ));
        assert!(matches!(sessions.root_session(), Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn toggle_block_and_profile_updates() {
        let (sessions, ledger, _) = sessions();
        sessions.register("Ann", "ann@x.com", "secret1").unwrap();

        assert!(sessions.toggle_block("ANN@x.com").unwrap());
        assert_eq!(ledger.list().unwrap()[0].details, "Blocked user: ann@x.com");
        assert!(!sessions.toggle_block("ann@x.com").unwrap());
        assert!(matches!(
            sessions.toggle_block("ghost@x.com"),
            Err(CatalogError::NotFound(_))
        ));

        let updated = sessions
            .update_profile(
                "ann@x.com",
                ProfileUpdate {
                    name: Some("Annie".into()),
                    avatar: Some("https://img.example.com/a.png".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Annie");
        assert!(matches!(
            sessions.update_profile("ghost@x.com", ProfileUpdate::default()).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn watchlist_has_set_semantics_per_account() {
        let (sessions, _, _) = sessions();
        let ids = vec!["m1".to_string(), "m2".to_string(), "m1".to_string()];
        assert_eq!(sessions.set_watchlist("Ann@x.com", &ids).unwrap(), vec!["m1", "m2"]);
        assert_eq!(sessions.get_watchlist("ann@X.COM").unwrap(), vec!["m1", "m2"]);
        assert!(sessions.get_watchlist("bob@x.com").unwrap().is_empty());

        assert!(!sessions.toggle_watchlist("ann@x.com", "m1").unwrap());
        assert!(sessions.toggle_watchlist("ann@x.com", "m3").unwrap());
        assert_eq!(sessions.get_watchlist("ann@x.com").unwrap(), vec!["m2", "m3"]);
    }

    #[test]
    fn continue_watching_is_capped_and_deduplicated() {
        let (sessions, _, store) = sessions();
        for i in 0..12 {
            touch_continue_watching(&store, "ann@x.com", &format!("m{}", i)).unwrap();
        }
        touch_continue_watching(&store, "ANN@x.com", "m5").unwrap();

        let list = sessions.get_continue_watching("ann@x.com").unwrap();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0], "m5");
        assert_eq!(list.iter().filter(|id| *id == "m5").count(), 1);
        assert_eq!(list[1], "m11");
    }

    #[tokio::test]
    async fn known_accounts_are_bounded_and_most_recent_first() {
        let (sessions, _, _) = sessions();
        for (i, email) in ["a@x.com", "b@x.com", "c@x.com", "d@x.com"].iter().enumerate() {
            sessions.register(&format!("user{}", i), email, "pw").unwrap();
            sessions.login(email, "pw", i % 2 == 0).await.unwrap();
        }
        sessions.login("b@x.com", "pw", true).await.unwrap();

        let known = sessions.known_accounts().unwrap();
        let emails: Vec<&str> = known.iter().map(|k| k.session.email.as_str()).collect();
        assert_eq!(emails, vec!["b@x.com", "d@x.com", "c@x.com"]);
        assert_eq!(known[0].saved_secret.as_deref(), Some("pw"));
        assert_eq!(known[1].saved_secret, None);
    }

    #[tokio::test]
    async fn stale_cached_secret_requires_fresh_credentials() {
        let (sessions, _, store) = sessions();
        sessions.register("Ann", "ann@x.com", "secret1").unwrap();
        sessions.login("ann@x.com", "secret1", true).await.unwrap();

        assert!(matches!(
            sessions.quick_login("ann@x.com").await.unwrap(),
            QuickLogin::Authenticated(_)
        ));

        // Simulate the password changing behind the cache.
        store
            .update_default(ACCOUNTS_KEY, |accounts: &mut Vec<StoredAccount>| {
                accounts[0].secret = hash_secret("ann@x.com", "rotated");
            })
            .unwrap();

        assert_eq!(
            sessions.quick_login("ann@x.com").await.unwrap(),
            QuickLogin::CredentialsRequired {
                email: "ann@x.com".into()
            }
        );
        assert_eq!(sessions.known_accounts().unwrap()[0].saved_secret, None);
    }

    #[tokio::test]
    async fn login_profile_edit_and_logout_track_current_session() {
        let (sessions, _, _) = sessions();
        sessions.register("Ann", "ann@x.com", "secret1").unwrap();
        sessions.register("Bob", "bob@x.com", "secret2").unwrap();
        assert_eq!(sessions.current_session().unwrap(), None);

        let session = sessions.login("ann@x.com", "secret1", false).await.unwrap();
        assert_eq!(sessions.current_session().unwrap(), Some(session));

        sessions
            .update_profile(
                "ann@x.com",
                ProfileUpdate {
                    name: Some("Annie".into()),
                    avatar: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(sessions.current_session().unwrap().unwrap().name, "Annie");

        // Editing someone else leaves the signed-in session alone.
        sessions
            .update_profile(
                "bob@x.com",
                ProfileUpdate {
                    name: Some("Robert".into()),
                    avatar: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(sessions.current_session().unwrap().unwrap().email, "ann@x.com");

        let previous = sessions.logout().unwrap();
        assert_eq!(previous.map(|s| s.name), Some("Annie".to_string()));
        assert_eq!(sessions.current_session().unwrap(), None);
        assert_eq!(sessions.known_accounts().unwrap().len(), 1);
        assert_eq!(sessions.logout().unwrap(), None);
    }

    #[tokio::test]
    async fn quick_login_sets_current_session() {
        let (sessions, _, _) = sessions();
        sessions.register("Ann", "ann@x.com", "secret1").unwrap();
        sessions.login("ann@x.com", "secret1", true).await.unwrap();
        sessions.logout().unwrap();

        assert!(matches!(
            sessions.quick_login("ann@x.com").await.unwrap(),
            QuickLogin::Authenticated(_)
        ));
        assert_eq!(sessions.current_session().unwrap().unwrap().email, "ann@x.com");
    }

    #[test]
    fn forget_drops_only_that_account() {
        let (sessions, _, store) = sessions();
        sessions.register("Ann", "ann@x.com", "pw").unwrap();
        sessions.register("Bob", "bob@x.com", "pw").unwrap();
        for account in store.read_or_default::<Vec<StoredAccount>>(ACCOUNTS_KEY).unwrap() {
            sessions.remember(&account.to_session(), Some("pw")).unwrap();
        }

        sessions.forget("ANN@x.com").unwrap();
        let emails: Vec<String> = sessions
            .known_accounts()
            .unwrap()
            .into_iter()
            .map(|k| k.session.email)
            .collect();
        assert_eq!(emails, vec!["bob@x.com"]);
        sessions.forget("nobody@x.com").unwrap();
        assert_eq!(sessions.known_accounts().unwrap().len(), 1);
    }

    #[test]
    fn preferred_brand_can_be_set_and_cleared() {
        let (sessions, _, _) = sessions();
        assert_eq!(sessions.preferred_brand().unwrap(), None);
        sessions.set_preferred_brand(Some(Brand::Tntfilms)).unwrap();
        assert_eq!(sessions.preferred_brand().unwrap(), Some(Brand::Tntfilms));
        sessions.set_preferred_brand(None).unwrap();
        assert_eq!(sessions.preferred_brand().unwrap(), None);
    }
}
