//! Logged-in session facade for the rendering layer.
//!
//! # Responsibility
//! - Open the channel and wire one reconciler per domain to its stream.
//! - Expose imperative intent methods that build and send commands.
//! - Terminate send failures here: log them, never re-throw.
//!
//! # Invariants
//! - A `DttSession` exists only after a successful channel open.
//! - Intent methods never touch held state; only snapshots do.
//! - Secret values, todo text, and usernames are never logged.

use crate::channel::{
    ChannelHandle, Clock, CoreRuntime, InitError, SeedSource, SystemClock, ThreadRngSeed,
};
use crate::command;
use crate::model::command::{Action, Command, Domain};
use crate::reconcile::{BudgetDomain, Reconciler, SecretsDomain, TodoDomain};
use crate::stream::ReplyStream;
use log::{info, warn};

/// One user session against the application core.
pub struct DttSession {
    todo: Reconciler<TodoDomain>,
    secrets: Reconciler<SecretsDomain>,
    budget: Reconciler<BudgetDomain>,
    channel: ChannelHandle,
}

impl DttSession {
    /// Logs in with a fresh random seed and the system clock.
    ///
    /// # Errors
    /// Returns `InitError` when the core cannot be started; callers must not
    /// enter the main views in that case.
    pub fn login<R>(runtime: &R, username: &str) -> Result<Self, InitError>
    where
        R: CoreRuntime + ?Sized,
    {
        Self::login_with(runtime, username, &mut ThreadRngSeed, &SystemClock)
    }

    /// Logs in with caller-provided seed and clock.
    pub fn login_with<R>(
        runtime: &R,
        username: &str,
        seed: &mut dyn SeedSource,
        clock: &dyn Clock,
    ) -> Result<Self, InitError>
    where
        R: CoreRuntime + ?Sized,
    {
        let channel = ChannelHandle::open(runtime, username, seed, clock).map_err(|err| {
            warn!("event=login module=service status=error reason={err}");
            err
        })?;

        let events = channel.events();
        let session = Self {
            todo: Reconciler::attach(&events),
            secrets: Reconciler::attach(&events),
            budget: Reconciler::attach(&events),
            channel,
        };
        info!("event=login module=service status=ok");
        Ok(session)
    }

    pub fn username(&self) -> &str {
        self.channel.session().username()
    }

    pub fn is_logged_in(&self) -> bool {
        self.channel.is_open()
    }

    /// Shared snapshot stream, for observers that need every domain.
    pub fn events(&self) -> ReplyStream {
        self.channel.events()
    }

    pub fn todo(&self) -> &Reconciler<TodoDomain> {
        &self.todo
    }

    pub fn secrets(&self) -> &Reconciler<SecretsDomain> {
        &self.secrets
    }

    pub fn budget(&self) -> &Reconciler<BudgetDomain> {
        &self.budget
    }

    /// Sends one command. Failures are logged and reported as `false`.
    ///
    /// A `sync` marks its domain pending before sending, so a reply delivered
    /// synchronously by the core still clears it.
    pub fn dispatch(&self, command: &Command) -> bool {
        let is_sync = command.action() == Action::Sync;
        if is_sync {
            self.set_sync_pending(command.domain(), true);
        }
        match self.channel.send(command) {
            Ok(()) => true,
            Err(err) => {
                if is_sync {
                    self.set_sync_pending(command.domain(), false);
                }
                warn!(
                    "event=command_send module=service status=error page={} action={} reason={err}",
                    command.domain(),
                    command.action()
                );
                false
            }
        }
    }

    pub fn insert_todo(&self, content: &str) {
        self.dispatch(&command::insert_todo(content));
    }

    pub fn update_todo(&self, id: &str, content: &str) {
        self.dispatch(&command::update_todo(id, content));
    }

    pub fn delete_todo(&self, id: &str) {
        self.dispatch(&command::delete_todo(id));
    }

    pub fn sync_todo(&self) {
        self.dispatch(&command::sync_todo());
    }

    pub fn insert_secret(&self, raw: &str) {
        self.dispatch(&command::insert_secret(raw));
    }

    /// Deletes by raw secret value, as the core identifies secrets on delete.
    pub fn delete_secret(&self, raw: &str) {
        self.dispatch(&command::delete_secret(raw));
    }

    pub fn sync_secrets(&self) {
        self.dispatch(&command::sync_secrets());
    }

    pub fn insert_budget(&self, reference: &str, cent_amount: i64) {
        self.dispatch(&command::insert_budget(reference, cent_amount));
    }

    pub fn update_budget(&self, id: &str, cent_amount: i64, reference: &str) {
        self.dispatch(&command::update_budget(id, cent_amount, reference));
    }

    pub fn delete_budget(&self, id: &str) {
        self.dispatch(&command::delete_budget(id));
    }

    pub fn sync_budget(&self) {
        self.dispatch(&command::sync_budget());
    }

    /// Ends the session and shuts the core down.
    pub fn logout(self) {
        self.channel.close();
        info!("event=logout module=service status=ok");
    }

    fn set_sync_pending(&self, domain: Domain, pending: bool) {
        match (domain, pending) {
            (Domain::Todo, true) => self.todo.mark_sync_pending(),
            (Domain::Todo, false) => self.todo.clear_sync_pending(),
            (Domain::Secrets, true) => self.secrets.mark_sync_pending(),
            (Domain::Secrets, false) => self.secrets.clear_sync_pending(),
            (Domain::Budget, true) => self.budget.mark_sync_pending(),
            (Domain::Budget, false) => self.budget.clear_sync_pending(),
        }
    }
}
