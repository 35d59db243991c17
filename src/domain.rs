//! Records persisted by the store. Field names serialize in camelCase so the
//! stored JSON keeps the layout the front end already reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Aimefilms,
    Tntfilms,
    Princefilms,
}

impl Brand {
    pub const ALL: [Brand; 3] = [Brand::Aimefilms, Brand::Tntfilms, Brand::Princefilms];

    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Aimefilms => "aimefilms",
            Brand::Tntfilms => "tntfilms",
            Brand::Princefilms => "princefilms",
        }
    }

    pub fn parse(value: &str) -> Option<Brand> {
        Brand::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl Default for Brand {
    fn default() -> Self {
        Brand::Aimefilms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Kinyarwanda,
    Rwanda,
    English,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Kinyarwanda => "kinyarwanda",
            Section::Rwanda => "rwanda",
            Section::English => "english",
        }
    }
}

impl Default for Section {
    fn default() -> Self {
        Section::English
    }
}

/// One streaming-content record (movie or series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub brand: Brand,
    pub category: String,
    pub section: Section,
    pub is_hidden: bool,
    pub description: String,
    pub highlights: Vec<String>,
    pub pros: Vec<String>,
    pub image_url: String,
    pub logo_url: String,
    pub link: String,
    pub video_url: String,
    pub full_movie_url: String,
    pub rating: String,
    pub year: String,
    pub duration: String,
    pub cast: Vec<String>,
    pub synopsis: String,
    pub is_trending: bool,
    pub is_new: bool,
    pub genre: Vec<String>,
    pub match_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

impl CatalogItem {
    /// A draft item; the repository assigns the id when it is added.
    pub fn new(name: impl Into<String>, brand: Brand, section: Section) -> Self {
        Self {
            name: name.into(),
            brand,
            section,
            ..Default::default()
        }
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genre.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

/// Partial update for a catalog item; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemPatch {
    pub name: Option<String>,
    pub brand: Option<Brand>,
    pub category: Option<String>,
    pub section: Option<Section>,
    pub is_hidden: Option<bool>,
    pub description: Option<String>,
    pub highlights: Option<Vec<String>>,
    pub pros: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
    pub link: Option<String>,
    pub video_url: Option<String>,
    pub full_movie_url: Option<String>,
    pub rating: Option<String>,
    pub year: Option<String>,
    pub duration: Option<String>,
    pub cast: Option<Vec<String>>,
    pub synopsis: Option<String>,
    pub is_trending: Option<bool>,
    pub is_new: Option<bool>,
    pub genre: Option<Vec<String>>,
    pub match_score: Option<u8>,
    pub price: Option<String>,
}

impl CatalogItemPatch {
    pub fn hidden(is_hidden: bool) -> Self {
        Self {
            is_hidden: Some(is_hidden),
            ..Default::default()
        }
    }

    pub fn apply_to(self, item: &mut CatalogItem) {
        macro_rules! merge {
            ($src:expr, $dst:expr; $($field:ident),* $(,)?) => {
                $(if let Some(value) = $src.$field { $dst.$field = value; })*
            };
        }
        merge!(
            self, item;
            name,
            brand,
            category,
            section,
            is_hidden,
            description,
            highlights,
            pros,
            image_url,
            logo_url,
            link,
            video_url,
            full_movie_url,
            rating,
            year,
            duration,
            cast,
            synopsis,
            is_trending,
            is_new,
            genre,
            match_score,
        );
        if self.price.is_some() {
            item.price = self.price;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Account record as persisted, including the credential digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_blocked: bool,
    pub joined_at: DateTime<Utc>,
    pub secret: String,
}

impl StoredAccount {
    pub fn to_session(&self) -> Session {
        Session {
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            role: self.role,
            is_verified: self.is_verified,
            is_blocked: self.is_blocked,
            joined_at: self.joined_at,
        }
    }
}

/// What callers get back after authentication. Carries no credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_blocked: bool,
    pub joined_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogKind {
    View,
    Login,
    Register,
    Upload,
    Delete,
    Block,
    Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessage {
    pub id: String,
    pub to_email: String,
    pub from_name: String,
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub item_id: String,
    pub author: String,
    pub text: String,
    pub rating: u8,
    pub timestamp: DateTime<Utc>,
}
