//! Command builder: typed user intent to wire command.
//!
//! # Responsibility
//! - Map each intent onto the exact `id`/`content`/`amount` layout the core
//!   expects.
//! - Stay pure: no I/O, no logging, no business validation.
//!
//! # Invariants
//! - `insert` never carries an `id`.
//! - `sync` never carries `id` or `content`.
//! - `amount` is kept only for `budget`.
//! - Secrets delete keys off `content` (the raw value), never `id`; todo and
//!   budget delete key off `id`, never `content`.

use crate::model::command::{Action, Command, Domain};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Builds an `insert` command.
pub fn insert(domain: Domain, content: impl Into<String>, amount: Option<i64>) -> Command {
    Command::from_parts(
        domain,
        Action::Insert,
        None,
        Some(content.into()),
        amount_for(domain, amount),
    )
}

/// Builds an `update` command. The core rejects unknown ids.
pub fn update(
    domain: Domain,
    id: impl Into<String>,
    content: impl Into<String>,
    amount: Option<i64>,
) -> Command {
    Command::from_parts(
        domain,
        Action::Update,
        Some(id.into()),
        Some(content.into()),
        amount_for(domain, amount),
    )
}

/// Builds a `delete` command.
///
/// `key` is the entity id for todo and budget, and the raw secret value for
/// secrets.
pub fn delete(domain: Domain, key: impl Into<String>) -> Command {
    let key = key.into();
    match domain {
        Domain::Secrets => Command::from_parts(domain, Action::Delete, None, Some(key), None),
        Domain::Todo | Domain::Budget => {
            Command::from_parts(domain, Action::Delete, Some(key), None, None)
        }
    }
}

/// Builds a `sync` command asking the core to re-emit the domain state.
pub fn sync(domain: Domain) -> Command {
    Command::from_parts(domain, Action::Sync, None, None, None)
}

pub fn insert_todo(content: impl Into<String>) -> Command {
    insert(Domain::Todo, content, None)
}

pub fn update_todo(id: impl Into<String>, content: impl Into<String>) -> Command {
    update(Domain::Todo, id, content, None)
}

pub fn delete_todo(id: impl Into<String>) -> Command {
    delete(Domain::Todo, id)
}

pub fn sync_todo() -> Command {
    sync(Domain::Todo)
}

pub fn insert_secret(raw: impl Into<String>) -> Command {
    insert(Domain::Secrets, raw, None)
}

pub fn delete_secret(raw: impl Into<String>) -> Command {
    delete(Domain::Secrets, raw)
}

pub fn sync_secrets() -> Command {
    sync(Domain::Secrets)
}

pub fn insert_budget(reference: impl Into<String>, cent_amount: i64) -> Command {
    insert(Domain::Budget, reference, Some(cent_amount))
}

pub fn update_budget(
    id: impl Into<String>,
    cent_amount: i64,
    reference: impl Into<String>,
) -> Command {
    update(Domain::Budget, id, reference, Some(cent_amount))
}

pub fn delete_budget(id: impl Into<String>) -> Command {
    delete(Domain::Budget, id)
}

pub fn sync_budget() -> Command {
    sync(Domain::Budget)
}

/// Loosely typed intent, as collected from a form or command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    pub id: Option<String>,
    pub content: Option<String>,
    pub amount: Option<i64>,
}

/// Shape errors raised when an intent lacks a field its action requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    MissingId { domain: Domain, action: Action },
    MissingContent { domain: Domain, action: Action },
}

impl Display for IntentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId { domain, action } => {
                write!(f, "`{action}` on `{domain}` requires an id")
            }
            Self::MissingContent { domain, action } => {
                write!(f, "`{action}` on `{domain}` requires content")
            }
        }
    }
}

impl Error for IntentError {}

/// Builds a command from a loosely typed intent.
///
/// Fields the action does not use are dropped. Fields it needs must be
/// present; their values are not inspected.
pub fn build(domain: Domain, action: Action, intent: Intent) -> Result<Command, IntentError> {
    let Intent {
        id,
        content,
        amount,
    } = intent;
    match action {
        Action::Insert => {
            let content = content.ok_or(IntentError::MissingContent { domain, action })?;
            Ok(insert(domain, content, amount))
        }
        Action::Update => {
            let id = id.ok_or(IntentError::MissingId { domain, action })?;
            let content = content.ok_or(IntentError::MissingContent { domain, action })?;
            Ok(update(domain, id, content, amount))
        }
        Action::Delete => match domain {
            Domain::Secrets => {
                let raw = content.ok_or(IntentError::MissingContent { domain, action })?;
                Ok(delete(domain, raw))
            }
            Domain::Todo | Domain::Budget => {
                let id = id.ok_or(IntentError::MissingId { domain, action })?;
                Ok(delete(domain, id))
            }
        },
        Action::Sync => Ok(sync(domain)),
    }
}

fn amount_for(domain: Domain, amount: Option<i64>) -> Option<i64> {
    if domain.carries_amount() {
        amount
    } else {
        None
    }
}
