//! Outbound command model.
//!
//! # Responsibility
//! - Define the closed `Domain` and `Action` enums used on the wire.
//! - Carry one immutable, fire-and-forget command toward the core.
//!
//! # Invariants
//! - `id` and `content` are always serialized, as `null` when absent.
//! - `amount` is serialized only when present.
//! - There is no correlation id; the core never answers a specific command.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Entity family addressed by a command, serialized as the wire `page` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Todo,
    Secrets,
    Budget,
}

impl Domain {
    /// All domains in stable display order.
    pub const ALL: [Domain; 3] = [Domain::Todo, Domain::Secrets, Domain::Budget];

    /// Wire literal for this domain.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Secrets => "secrets",
            Self::Budget => "budget",
        }
    }

    /// Whether `amount` is meaningful for commands on this domain.
    pub fn carries_amount(self) -> bool {
        matches!(self, Self::Budget)
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "secrets" | "secret" => Ok(Self::Secrets),
            "budget" => Ok(Self::Budget),
            other => Err(format!(
                "unsupported page `{other}`; expected todo|secrets|budget"
            )),
        }
    }
}

/// Operation requested from the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Insert,
    Update,
    Delete,
    /// Asks the core to re-emit the domain's current state.
    Sync,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Insert, Action::Update, Action::Delete, Action::Sync];

    /// Wire literal for this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Sync => "sync",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "sync" => Ok(Self::Sync),
            other => Err(format!(
                "unsupported action `{other}`; expected insert|update|delete|sync"
            )),
        }
    }
}

/// One outbound command in core wire shape.
///
/// Constructed through `crate::command`; fields are read-only afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "page")]
    domain: Domain,
    action: Action,
    id: Option<String>,
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amount: Option<i64>,
}

impl Command {
    pub(crate) fn from_parts(
        domain: Domain,
        action: Action,
        id: Option<String>,
        content: Option<String>,
        amount: Option<i64>,
    ) -> Self {
        Self {
            domain,
            action,
            id,
            content,
            amount,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Payload text. For `secrets` this is the raw secret value.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Cent amount. Only ever set for `budget` commands.
    pub fn amount(&self) -> Option<i64> {
        self.amount
    }

    /// Encodes this command as the JSON object the core expects.
    pub fn to_wire(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Debug for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let content = match (&self.content, self.domain) {
            (None, _) => None,
            (Some(_), Domain::Secrets) => Some("<redacted>"),
            (Some(value), _) => Some(value.as_str()),
        };
        f.debug_struct("Command")
            .field("domain", &self.domain)
            .field("action", &self.action)
            .field("id", &self.id)
            .field("content", &content)
            .field("amount", &self.amount)
            .finish()
    }
}
