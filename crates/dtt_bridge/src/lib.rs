//! Synchronization bridge between UI views and the DTT application core.
//!
//! Views call intent methods on a `DttSession`; the bridge turns them into
//! fire-and-forget commands, and turns the core's reply stream back into
//! per-domain held state that any number of views can observe.

pub mod channel;
pub mod command;
pub mod config;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod service;
pub mod stream;
pub mod testing;

pub use channel::{
    ChannelHandle, Clock, CorePort, CoreRuntime, CoreStartError, InitError, InitFlags, PortError,
    ReplyDecodeError, ReplySink, SeedSource, SendError, SessionState,
};
pub use config::BridgeConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::command::{Action, Command, Domain};
pub use model::snapshot::{Budget, DomainError, Secret, Snapshot, Spending, Todo};
pub use reconcile::{
    BudgetDomain, BudgetSummary, BudgetView, DomainSlot, DomainUpdate, Outcome, Reconciler,
    SecretsDomain, TodoDomain,
};
pub use service::session::DttSession;
pub use stream::{Broadcaster, ReplyStream, Subscription};

/// Returns the bridge crate version.
pub fn bridge_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
