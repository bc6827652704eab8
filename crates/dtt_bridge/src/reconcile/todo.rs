//! Todo domain binding.

use crate::model::command::Domain;
use crate::model::snapshot::{Snapshot, Todo};
use crate::reconcile::DomainSlot;

/// Ordered todo list as last reported by the core.
pub struct TodoDomain;

impl DomainSlot for TodoDomain {
    type State = Vec<Todo>;

    const DOMAIN: Domain = Domain::Todo;

    fn extract(snapshot: &Snapshot) -> Option<&Self::State> {
        snapshot.todo.as_ref()
    }
}
