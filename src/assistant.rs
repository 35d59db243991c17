//! Boundary to the conversational assistant.
//!
//! The model call itself lives outside this crate behind [`AssistantPort`].
//! This module builds the request from catalog data, parses the reply into a
//! typed instruction, and maps instructions onto store operations.

use crate::browse;
use crate::catalog::{CatalogRepository, Viewer};
use crate::domain::{Brand, CatalogItem, Role, Section, Session};
use crate::error::Result;
use crate::session::SessionStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

const SYNOPSIS_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    #[default]
    En,
    Rw,
    Fr,
    Sw,
    Zh,
}

impl Language {
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Rw => "Kinyarwanda",
            Language::Fr => "French",
            Language::Sw => "Swahili",
            Language::Zh => "Chinese",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// What the assistant is allowed to know about one visible item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSnapshotEntry {
    pub id: String,
    pub name: String,
    pub year: String,
    pub synopsis: String,
    pub brand: Brand,
    pub section: Section,
}

/// Builds the snapshot from items already filtered for the viewer.
pub fn catalog_snapshot(items: &[CatalogItem]) -> Vec<CatalogSnapshotEntry> {
    items
        .iter()
        .map(|i| CatalogSnapshotEntry {
            id: i.id.clone(),
            name: i.name.clone(),
            year: i.year.clone(),
            synopsis: i.synopsis.chars().take(SYNOPSIS_PREVIEW_CHARS).collect(),
            brand: i.brand,
            section: i.section,
        })
        .collect()
}

pub fn snapshot_context(entries: &[CatalogSnapshotEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "- {} ({}): {}... [Brand: {}, Section: {}]",
                e.name,
                e.year,
                e.synopsis,
                e.brand.as_str(),
                e.section.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantRequest {
    pub prompt: String,
    pub language: Language,
    pub authenticated: bool,
    pub role: Option<Role>,
    pub current_title: Option<String>,
    pub catalog: Vec<CatalogSnapshotEntry>,
    pub history: Vec<ChatTurn>,
}

impl AssistantRequest {
    pub fn catalog_context(&self) -> String {
        snapshot_context(&self.catalog)
    }
}

/// Implemented by the shell that talks to the hosted model.
#[async_trait]
pub trait AssistantPort: Send + Sync {
    /// Returns the model's raw reply text.
    async fn complete(&self, request: &AssistantRequest) -> std::result::Result<String, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstructionKind {
    Filter,
    Search,
    AdminAuthSuccess,
    AdminViewUsers,
    #[default]
    None,
}

impl InstructionKind {
    /// Unknown tags, including ones this crate does not act on, map to `None`.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "FILTER" => InstructionKind::Filter,
            "SEARCH" => InstructionKind::Search,
            "ADMIN_AUTH_SUCCESS" => InstructionKind::AdminAuthSuccess,
            "ADMIN_VIEW_USERS" => InstructionKind::AdminViewUsers,
            _ => InstructionKind::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub narrative: String,
    pub instruction: Instruction,
}

#[derive(Deserialize)]
struct WireReply {
    narrative: String,
    #[serde(default)]
    action: Option<WireAction>,
}

#[derive(Deserialize)]
struct WireAction {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    value: Option<String>,
}

impl AssistantReply {
    /// Shown when the assistant cannot be reached or answers garbage.
    pub fn fallback(language: Language) -> Self {
        Self {
            narrative: format!("Communication interrupted ({}).", language.display_name()),
            instruction: Instruction::default(),
        }
    }

    /// Parses `{narrative, action: {type, value}}`. Anything else degrades to
    /// [`fallback`](Self::fallback) in `language`.
    pub fn parse(raw: &str, language: Language) -> Self {
        match serde_json::from_str::<WireReply>(raw.trim()) {
            Ok(reply) => {
                let instruction = reply
                    .action
                    .map(|a| Instruction {
                        kind: InstructionKind::parse(&a.kind),
                        value: a.value.unwrap_or_default(),
                    })
                    .unwrap_or_default();
                Self {
                    narrative: reply.narrative,
                    instruction,
                }
            }
            Err(e) => {
                warn!("Unreadable assistant reply: {}", e);
                Self::fallback(language)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConciergeOutcome {
    Items(Vec<CatalogItem>),
    SignedIn(Session),
    Accounts(Vec<Session>),
    Nothing,
}

/// Runs assistant turns and applies their instructions.
pub struct Concierge {
    catalog: Arc<CatalogRepository>,
    sessions: Arc<SessionStore>,
}

impl Concierge {
    pub fn new(catalog: Arc<CatalogRepository>, sessions: Arc<SessionStore>) -> Self {
        Self { catalog, sessions }
    }

    pub fn build_request(
        &self,
        prompt: &str,
        language: Language,
        session: Option<&Session>,
        current_title: Option<&str>,
        history: Vec<ChatTurn>,
    ) -> Result<AssistantRequest> {
        let items = self.catalog.list_for(Viewer::from_session(session))?;
        Ok(AssistantRequest {
            prompt: prompt.to_string(),
            language,
            authenticated: session.is_some(),
            role: session.map(|s| s.role),
            current_title: current_title.map(str::to_string),
            catalog: catalog_snapshot(&items),
            history,
        })
    }

    /// Never fails; transport errors become the fallback reply.
    pub async fn ask(&self, port: &dyn AssistantPort, request: &AssistantRequest) -> AssistantReply {
        match port.complete(request).await {
            Ok(raw) => {
                let reply = AssistantReply::parse(&raw, request.language);
                debug!("Assistant replied with {:?}", reply.instruction.kind);
                reply
            }
            Err(e) => {
                warn!("Assistant call failed: {}", e);
                AssistantReply::fallback(request.language)
            }
        }
    }

    /// Maps an instruction onto store reads.
    ///
    /// `AdminAuthSuccess` trusts the model's claim that the root identity was
    /// verified in conversation. Disable the root identity in config to close
    /// this path.
    pub fn apply(&self, instruction: &Instruction, session: Option<&Session>) -> Result<ConciergeOutcome> {
        let viewer = Viewer::from_session(session);
        match instruction.kind {
            InstructionKind::Filter => {
                let items = self.catalog.list_for(viewer)?;
                Ok(ConciergeOutcome::Items(browse::filter_by_category(
                    &items,
                    &instruction.value,
                )))
            }
            InstructionKind::Search => Ok(ConciergeOutcome::Items(
                self.catalog.search_for(viewer, &instruction.value)?,
            )),
            InstructionKind::AdminAuthSuccess => {
                info!("Assistant granted root session");
                Ok(ConciergeOutcome::SignedIn(self.sessions.root_session()?))
            }
            InstructionKind::AdminViewUsers => match session {
                Some(s) if s.is_admin() => Ok(ConciergeOutcome::Accounts(self.sessions.list_accounts()?)),
                _ => {
                    warn!("Account list requested without an admin session");
                    Ok(ConciergeOutcome::Nothing)
                }
            },
            InstructionKind::None => Ok(ConciergeOutcome::Nothing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latency::Latency;
    use crate::ledger::ActivityLedger;
    use crate::session::RootIdentity;
    use crate::storage::JsonStore;

    struct CannedPort(std::result::Result<String, String>);

    #[async_trait]
    impl AssistantPort for CannedPort {
        async fn complete(&self, _request: &AssistantRequest) -> std::result::Result<String, String> {
            self.0.clone()
        }
    }

    fn concierge(root: RootIdentity) -> (Concierge, Arc<SessionStore>, Arc<CatalogRepository>) {
        let store = Arc::new(JsonStore::in_memory());
        let ledger = Arc::new(ActivityLedger::new(store.clone(), 50));
        let catalog = Arc::new(CatalogRepository::new(store.clone(), ledger.clone()));
        let sessions = Arc::new(SessionStore::new(store, ledger, root, Latency::none()));
        (
            Concierge::new(catalog.clone(), sessions.clone()),
            sessions,
            catalog,
        )
    }

    #[test]
    fn reply_parsing() {
        let reply = AssistantReply::parse(
            r#"{"narrative":"Here you go","action":{"type":"SEARCH","value":"heat"}}"#,
            Language::En,
        );
        assert_eq!(reply.narrative, "Here you go");
        assert_eq!(reply.instruction.kind, InstructionKind::Search);
        assert_eq!(reply.instruction.value, "heat");

        let unknown = AssistantReply::parse(
            r#"{"narrative":"ok","action":{"type":"PASSWORD_RECOVERY"}}"#,
            Language::En,
        );
        assert_eq!(unknown.instruction.kind, InstructionKind::None);

        assert_eq!(
            AssistantReply::parse(r#"{"narrative":"plain"}"#, Language::En).instruction,
            Instruction::default()
        );
        let broken = AssistantReply::parse("not json", Language::Fr);
        assert_eq!(broken, AssistantReply::fallback(Language::Fr));
        assert_eq!(broken.narrative, "Communication interrupted (French).");
    }

    #[test]
    fn snapshot_truncates_synopsis() {
        let mut item = CatalogItem::new("Long", Brand::Tntfilms, Section::Rwanda);
        item.year = "2020".into();
        item.synopsis = "x".repeat(250);
        let entries = catalog_snapshot(&[item]);
        assert_eq!(entries[0].synopsis.chars().count(), 100);
        let context = snapshot_context(&entries);
        assert!(context.starts_with("- Long (2020): xxx"));
        assert!(context.ends_with("... [Brand: tntfilms, Section: rwanda]"));
    }

    #[tokio::test]
    async fn transport_error_degrades_to_fallback() {
        let (concierge, _, _) = concierge(RootIdentity::disabled());
        let request = concierge
            .build_request("hi", Language::Rw, None, None, Vec::new())
            .unwrap();
        assert!(!request.authenticated);
        assert_eq!(request.catalog.len(), 7);

        let reply = concierge
            .ask(&CannedPort(Err("timeout".into())), &request)
            .await;
        assert_eq!(reply.narrative, "Communication interrupted (Kinyarwanda).");
        assert!(request
            .catalog_context()
            .lines()
            .any(|line| line.starts_with("- Umurage (2023): ")));
        assert_eq!(reply.instruction.kind, InstructionKind::None);
    }

    #[test]
    fn instructions_respect_visibility_and_role() {
        let (concierge, sessions, catalog) =
            concierge(RootIdentity::from(&crate::config::RootIdentityConfig::default()));
        catalog.set_hidden("m7", true).unwrap();

        let search = Instruction {
            kind: InstructionKind::Search,
            value: "kigali".into(),
        };
        assert_eq!(concierge.apply(&search, None).unwrap(), ConciergeOutcome::Items(vec![]));

        let view_users = Instruction {
            kind: InstructionKind::AdminViewUsers,
            value: String::new(),
        };
        assert_eq!(concierge.apply(&view_users, None).unwrap(), ConciergeOutcome::Nothing);

        let root = sessions.root_session().unwrap();
        assert_eq!(
            concierge.apply(&view_users, Some(&root)).unwrap(),
            ConciergeOutcome::Accounts(vec![])
        );

        let filter = Instruction {
            kind: InstructionKind::Filter,
            value: "Series".into(),
        };
        match concierge.apply(&filter, Some(&root)).unwrap() {
            ConciergeOutcome::Items(items) => assert_eq!(items.len(), 1),
            other => panic!("unexpected outcome {:?}", other),
        }

        // "all" resets the filter; the hidden item still only reaches admins.
        let reset = Instruction {
            kind: InstructionKind::Filter,
            value: "all".into(),
        };
        match concierge.apply(&reset, None).unwrap() {
            ConciergeOutcome::Items(items) => assert_eq!(items.len(), 6),
            other => panic!("unexpected outcome {:?}", other),
        }
        match concierge.apply(&reset, Some(&root)).unwrap() {
            ConciergeOutcome::Items(items) => assert_eq!(items.len(), 7),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
