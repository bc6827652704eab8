//! Reply-file replay against a scripted core.

use dtt_bridge::testing::ScriptedCore;
use dtt_bridge::{BudgetView, DomainUpdate, DttSession, Secret, Todo};
use log::warn;
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::rc::Rc;

/// Held state after a replay, plus delivery counters.
#[derive(Debug)]
pub struct ReplayReport {
    pub username: String,
    pub accepted: usize,
    pub dropped: usize,
    pub errors: Vec<String>,
    pub todo: Option<Vec<Todo>>,
    pub secrets: Option<Vec<Secret>>,
    pub budget: Option<BudgetView>,
}

/// Logs in as `user`, requests every domain, then feeds each non-blank line
/// of `path` to the bridge as one reply.
pub fn run_replay(path: &Path, user: &str) -> Result<ReplayReport, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;

    let core = ScriptedCore::new();
    let session = DttSession::login(&core, user).map_err(|err| err.to_string())?;

    // Errors reach every domain; collecting from one avoids duplicates.
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let _errors_view = session.todo().subscribe(move |update| {
        if let DomainUpdate::Failed(message) = update {
            sink.borrow_mut().push(message.clone());
        }
    });

    session.sync_todo();
    session.sync_secrets();
    session.sync_budget();

    let mut accepted = 0;
    let mut dropped = 0;
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match core.emit_json(line) {
            Ok(()) => accepted += 1,
            Err(err) => {
                dropped += 1;
                warn!(
                    "event=replay_line module=cli status=dropped line={} reason={}",
                    index + 1,
                    err
                );
            }
        }
    }

    let report = ReplayReport {
        username: session.username().to_string(),
        accepted,
        dropped,
        errors: errors.borrow().clone(),
        todo: session.todo().held().map(|todos| (*todos).clone()),
        secrets: session.secrets().held().map(|secrets| (*secrets).clone()),
        budget: session.budget().view(),
    };
    session.logout();
    Ok(report)
}

impl Display for ReplayReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "user={} replies={} dropped={}",
            self.username, self.accepted, self.dropped
        )?;

        match &self.todo {
            Some(todos) => {
                writeln!(f, "todo: {} entries", todos.len())?;
                for todo in todos {
                    writeln!(f, "  - [{}] {}", todo.id, todo.text())?;
                }
            }
            None => writeln!(f, "todo: empty")?,
        }

        match &self.secrets {
            Some(secrets) => {
                writeln!(f, "secrets: {} entries", secrets.len())?;
                for secret in secrets {
                    writeln!(f, "  - hash={} user={}", secret.hash, secret.user)?;
                }
            }
            None => writeln!(f, "secrets: empty")?,
        }

        match &self.budget {
            Some(view) => {
                writeln!(
                    f,
                    "budget: total_cent={} minus={} plus={} balance={}",
                    view.total_cent,
                    view.summary.minus,
                    view.summary.plus,
                    view.summary.display_balance
                )?;
                for entry in &view.spendings {
                    writeln!(
                        f,
                        "  - [{}] {} cent={} date={}",
                        entry.spending.id,
                        entry.spending.reference,
                        entry.spending.cent,
                        entry.date_label
                    )?;
                }
            }
            None => writeln!(f, "budget: empty")?,
        }

        if self.errors.is_empty() {
            write!(f, "errors: none")
        } else {
            write!(f, "errors: {}", self.errors.join(", "))
        }
    }
}
