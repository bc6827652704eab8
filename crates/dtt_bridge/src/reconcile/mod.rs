//! Per-domain reconciliation of the shared snapshot stream.
//!
//! # Responsibility
//! - Decide, per snapshot, whether a domain's held state changes.
//! - Surface core-reported errors to the domain's observers as display text.
//!
//! # Invariants
//! - A snapshot carrying `error` never changes held state of any domain.
//! - A populated slot replaces held state wholesale; there is no field merge.
//! - An absent slot leaves held state untouched and notifies nobody.
//! - Held state moves `Empty -> Populated -> Populated ...`; it never returns
//!   to `Empty` within a session.

mod budget;
mod secrets;
mod todo;

pub use budget::{
    format_spending_date, format_spending_date_in, BudgetDomain, BudgetSummary, BudgetView,
    SpendingView,
};
pub use secrets::{render_identicons, IdenticonRenderer, SecretsDomain, IDENTICON_SIZE};
pub use todo::TodoDomain;

use crate::model::command::Domain;
use crate::model::snapshot::Snapshot;
use crate::stream::{Broadcaster, ReplyStream, Subscription};
use log::{debug, info};
use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::rc::Rc;

/// Binds a reconciler to one snapshot slot.
pub trait DomainSlot: 'static {
    type State: Clone + PartialEq + Debug + 'static;

    const DOMAIN: Domain;

    /// Returns this domain's slot when the snapshot populates it.
    fn extract(snapshot: &Snapshot) -> Option<&Self::State>;
}

/// Notification delivered to a domain's observers.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainUpdate<S> {
    /// Held state was replaced with this value.
    Replaced(Rc<S>),
    /// The core reported an error; held state is unchanged.
    Failed(String),
}

/// What one snapshot did to a reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Replaced,
    Failed,
    Ignored,
}

struct ReconcilerState<S> {
    held: RefCell<Option<Rc<S>>>,
    pending_sync: Cell<bool>,
    updates: Broadcaster<DomainUpdate<S>>,
}

impl<S: Clone + PartialEq + Debug + 'static> ReconcilerState<S> {
    fn apply<D: DomainSlot<State = S>>(&self, snapshot: &Snapshot) -> Outcome {
        if let Some(error) = &snapshot.error {
            self.pending_sync.set(false);
            info!(
                "event=domain_error module=reconcile status=error domain={}",
                D::DOMAIN
            );
            self.updates
                .publish(DomainUpdate::Failed(error.display_message()));
            return Outcome::Failed;
        }

        let Some(slot) = D::extract(snapshot) else {
            return Outcome::Ignored;
        };
        let next = Rc::new(slot.clone());
        *self.held.borrow_mut() = Some(Rc::clone(&next));
        self.pending_sync.set(false);
        debug!(
            "event=domain_replaced module=reconcile status=ok domain={}",
            D::DOMAIN
        );
        self.updates.publish(DomainUpdate::Replaced(next));
        Outcome::Replaced
    }
}

/// Held state for one domain, fed by the shared reply stream.
///
/// Dropping the reconciler detaches it from the stream.
pub struct Reconciler<D: DomainSlot> {
    state: Rc<ReconcilerState<D::State>>,
    upstream: Option<Subscription>,
    _domain: PhantomData<D>,
}

impl<D: DomainSlot> Default for Reconciler<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DomainSlot> Reconciler<D> {
    /// Creates a detached reconciler in the `Empty` state.
    pub fn new() -> Self {
        Self {
            state: Rc::new(ReconcilerState {
                held: RefCell::new(None),
                pending_sync: Cell::new(false),
                updates: Broadcaster::new(),
            }),
            upstream: None,
            _domain: PhantomData,
        }
    }

    /// Creates a reconciler attached to `stream`.
    ///
    /// The latest snapshot, if any, is applied immediately.
    pub fn attach(stream: &ReplyStream) -> Self {
        let mut reconciler = Self::new();
        let state = Rc::clone(&reconciler.state);
        reconciler.upstream = Some(stream.subscribe(move |snapshot: &Rc<Snapshot>| {
            state.apply::<D>(snapshot);
        }));
        reconciler
    }

    pub fn domain(&self) -> Domain {
        D::DOMAIN
    }

    /// Applies one snapshot.
    pub fn on_snapshot(&self, snapshot: &Snapshot) -> Outcome {
        self.state.apply::<D>(snapshot)
    }

    /// Current held state; `None` while `Empty`.
    pub fn held(&self) -> Option<Rc<D::State>> {
        self.state.held.borrow().clone()
    }

    /// Observes replacements and errors from now on.
    ///
    /// Held state is not replayed; read `held()` for the current value.
    pub fn subscribe(
        &self,
        observer: impl FnMut(&DomainUpdate<D::State>) + 'static,
    ) -> Subscription {
        self.state.updates.subscribe(observer)
    }

    /// Marks a `sync` for this domain as in flight.
    pub fn mark_sync_pending(&self) {
        self.state.pending_sync.set(true);
    }

    /// Drops the in-flight marker without a snapshot, e.g. after a failed send.
    pub fn clear_sync_pending(&self) {
        self.state.pending_sync.set(false);
    }

    /// Whether a `sync` is still waiting for a relevant snapshot or error.
    pub fn is_sync_pending(&self) -> bool {
        self.state.pending_sync.get()
    }

    pub fn is_attached(&self) -> bool {
        self.upstream
            .as_ref()
            .is_some_and(|subscription| subscription.is_active())
    }

    /// Stops receiving snapshots. Held state is kept.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.upstream.take() {
            subscription.unsubscribe();
        }
    }
}
