//! Message channel between the bridge and the application core.
//!
//! # Responsibility
//! - Start the core with a one-time initialization payload.
//! - Push outbound commands through the core port, unacknowledged.
//! - Feed inbound replies into one shared `ReplyStream`.
//!
//! # Invariants
//! - One upstream registration per handle; `events()` never re-registers.
//! - Session state lives on the handle, not in process-wide statics.
//! - Reply payloads and secret values are never logged.

mod flags;
mod handle;
mod port;

pub use flags::{Clock, FixedClock, FixedSeed, InitFlags, SeedSource, SystemClock, ThreadRngSeed};
pub use handle::{ChannelHandle, InitError, SendError, SessionState};
pub use port::{CorePort, CoreRuntime, CoreStartError, PortError, ReplyDecodeError, ReplySink};
