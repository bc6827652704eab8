//! Inbound snapshot model.
//!
//! # Responsibility
//! - Decode the core's untyped reply objects into typed domain slots.
//! - Preserve unknown todo fields so held state matches what the core sent.
//!
//! # Invariants
//! - Every slot is optional; any subset may be populated.
//! - Missing and `null` slots both decode to `None`.

use crate::model::command::Domain;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Debug, Formatter};

/// One wholesale reply from the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo: Option<Vec<Todo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<Secret>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DomainError>,
}

impl Snapshot {
    /// Decodes one reply payload.
    pub fn from_value(payload: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload)
    }

    /// Domains whose slot is populated in this snapshot.
    pub fn populated_domains(&self) -> Vec<Domain> {
        let mut domains = Vec::with_capacity(3);
        if self.todo.is_some() {
            domains.push(Domain::Todo);
        }
        if self.secrets.is_some() {
            domains.push(Domain::Secrets);
        }
        if self.budget.is_some() {
            domains.push(Domain::Budget);
        }
        domains
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Todo entry; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Some core builds send the text under `content` instead of `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Todo {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: Some(message.into()),
            content: None,
            extra: Map::new(),
        }
    }

    /// Display text, preferring `message` over `content`.
    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.content.as_deref())
            .unwrap_or_default()
    }
}

/// Stored secret; identity is `hash`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub hash: String,
    pub user: String,
    pub raw: String,
}

impl Secret {
    /// Key handed to the identicon renderer.
    pub fn identicon_key(&self) -> &str {
        &self.hash
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("hash", &self.hash)
            .field("user", &self.user)
            .field("raw", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Signed balance in cents.
    pub total_cent: i64,
    #[serde(default)]
    pub spendings: Vec<Spending>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spending {
    pub id: String,
    pub reference: String,
    pub cent: i64,
    /// Unix epoch milliseconds.
    pub last_updated: i64,
}

/// Failure reported by the core inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainError {
    pub error_type: String,
}

impl DomainError {
    /// Display-ready text for toast/alert presentation.
    pub fn display_message(&self) -> String {
        self.error_type.clone()
    }
}
