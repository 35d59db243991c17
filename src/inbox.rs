use crate::constants::INBOX_KEY;
use crate::domain::{InboxMessage, LogKind};
use crate::error::{CatalogError, Result};
use crate::latency::Latency;
use crate::ledger::ActivityLedger;
use crate::metrics::CatalogMetrics;
use crate::storage::JsonStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Admin-to-user and user-to-admin messages, newest first.
pub struct InboxStore {
    store: Arc<JsonStore>,
    ledger: Arc<ActivityLedger>,
    admin_email: String,
    latency: Latency,
}

impl InboxStore {
    /// `admin_email` is where [`contact_admin`](Self::contact_admin) delivers.
    pub fn new(
        store: Arc<JsonStore>,
        ledger: Arc<ActivityLedger>,
        admin_email: impl Into<String>,
        latency: Latency,
    ) -> Self {
        Self {
            store,
            ledger,
            admin_email: admin_email.into(),
            latency,
        }
    }

    pub async fn send(
        &self,
        to_email: &str,
        from_name: &str,
        subject: &str,
        body: &str,
    ) -> Result<InboxMessage> {
        self.latency.wait().await;
        let to_email = to_email.trim().to_lowercase();
        if to_email.is_empty() || subject.trim().is_empty() || body.trim().is_empty() {
            return Err(CatalogError::ValidationFailure(
                "recipient, subject and body are required".to_string(),
            ));
        }

        let message = InboxMessage {
            id: Uuid::new_v4().to_string(),
            to_email: to_email.clone(),
            from_name: from_name.trim().to_string(),
            subject: subject.trim().to_string(),
            body: body.to_string(),
            timestamp: Utc::now(),
            is_read: false,
        };
        let stored = message.clone();
        self.store
            .update_default(INBOX_KEY, |messages: &mut Vec<InboxMessage>| {
                messages.insert(0, stored);
            })?;

        CatalogMetrics::record_message_sent();
        debug!("Queued message {} for {}", message.id, to_email);
        self.ledger.append(
            LogKind::Message,
            format!("Message sent to {}: {}", to_email, message.subject),
            None,
        )?;
        Ok(message)
    }

    /// Messages addressed to `email`, any case.
    pub async fn list_for(&self, email: &str) -> Result<Vec<InboxMessage>> {
        self.latency.wait().await;
        let email_lower = email.trim().to_lowercase();
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|m| m.to_email.to_lowercase() == email_lower)
            .collect())
    }

    pub fn list_all(&self) -> Result<Vec<InboxMessage>> {
        self.store.read_or_default(INBOX_KEY)
    }

    pub fn unread_count(&self, email: &str) -> Result<usize> {
        let email_lower = email.trim().to_lowercase();
        Ok(self
            .list_all()?
            .iter()
            .filter(|m| !m.is_read && m.to_email.to_lowercase() == email_lower)
            .count())
    }

    pub fn mark_read(&self, id: &str) -> Result<()> {
        let found = self
            .store
            .update_default(INBOX_KEY, |messages: &mut Vec<InboxMessage>| {
                messages
                    .iter_mut()
                    .find(|m| m.id == id)
                    .map(|m| m.is_read = true)
                    .is_some()
            })?;
        if !found {
            return Err(CatalogError::NotFound(format!("message {}", id)));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let removed = self
            .store
            .update_default(INBOX_KEY, |messages: &mut Vec<InboxMessage>| {
                let before = messages.len();
                messages.retain(|m| m.id != id);
                messages.len() != before
            })?;
        if !removed {
            return Err(CatalogError::NotFound(format!("message {}", id)));
        }
        debug!("Deleted message {}", id);
        Ok(())
    }

    /// Sends a support message to the admin inbox. Anonymous senders show as "Guest".
    pub async fn contact_admin(
        &self,
        from_email: Option<&str>,
        category: &str,
        subject: &str,
        body: &str,
    ) -> Result<InboxMessage> {
        let from = from_email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or("Guest");
        if subject.trim().is_empty() {
            return Err(CatalogError::ValidationFailure("subject is required".to_string()));
        }
        let subject = match category.trim() {
            "" => subject.trim().to_string(),
            c => format!("[{}] {}", c, subject.trim()),
        };
        info!("Support request from {}", from);
        let admin_email = self.admin_email.clone();
        self.send(&admin_email, from, &subject, body).await
    }
}
