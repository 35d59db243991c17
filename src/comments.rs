use crate::constants::comments_key;
use crate::domain::Comment;
use crate::error::{CatalogError, Result};
use crate::storage::JsonStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const ANONYMOUS: &str = "Anonymous";

/// Per-item reviews, newest first.
pub struct CommentStore {
    store: Arc<JsonStore>,
}

impl CommentStore {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    /// `rating` is clamped to 1..=5.
    pub fn add(&self, item_id: &str, author: &str, text: &str, rating: u8) -> Result<Comment> {
        if text.trim().is_empty() {
            return Err(CatalogError::ValidationFailure(
                "comment text is required".to_string(),
            ));
        }
        let author = match author.trim() {
            "" => ANONYMOUS.to_string(),
            a => a.to_string(),
        };
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            author,
            text: text.trim().to_string(),
            rating: rating.clamp(1, 5),
            timestamp: Utc::now(),
        };
        let stored = comment.clone();
        self.store
            .update_default(&comments_key(item_id), |comments: &mut Vec<Comment>| {
                comments.insert(0, stored);
            })?;
        debug!("Comment {} added to {}", comment.id, item_id);
        Ok(comment)
    }

    pub fn list(&self, item_id: &str) -> Result<Vec<Comment>> {
        self.store.read_or_default(&comments_key(item_id))
    }
}
