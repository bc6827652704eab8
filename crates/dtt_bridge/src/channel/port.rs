//! Seams to the opaque application core.

use crate::channel::flags::InitFlags;
use crate::channel::handle::SessionState;
use crate::model::snapshot::Snapshot;
use crate::stream::ReplyStream;
use log::{debug, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Starts the application core for one session.
///
/// Implementations keep `replies` and push every reply object through it.
pub trait CoreRuntime {
    fn start(
        &self,
        flags: &InitFlags,
        replies: ReplySink,
    ) -> Result<Box<dyn CorePort>, CoreStartError>;
}

/// Outbound half of a started core.
pub trait CorePort {
    /// Hands one encoded command to the core. No reply is implied.
    fn send(&self, command: Value) -> Result<(), PortError>;

    /// Releases the core at session end.
    fn shutdown(&self) {}
}

/// The core could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStartError {
    message: String,
}

impl CoreStartError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for CoreStartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "core failed to start: {}", self.message)
    }
}

impl Error for CoreStartError {}

/// The core port refused or failed to take a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortError {
    message: String,
}

impl PortError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for PortError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "core port rejected command: {}", self.message)
    }
}

impl Error for PortError {}

/// An inbound payload was dropped.
#[derive(Debug)]
pub enum ReplyDecodeError {
    /// Payload is not a snapshot object.
    Malformed(serde_json::Error),
    /// Session already ended.
    SessionClosed,
}

impl Display for ReplyDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "reply is not a valid snapshot: {err}"),
            Self::SessionClosed => write!(f, "reply arrived after session end"),
        }
    }
}

impl Error for ReplyDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::SessionClosed => None,
        }
    }
}

/// Inbound entry point the core pushes replies into.
///
/// Every accepted reply becomes the new current snapshot of the session's
/// `ReplyStream`.
#[derive(Clone)]
pub struct ReplySink {
    stream: ReplyStream,
    session: Rc<SessionState>,
}

impl ReplySink {
    pub(crate) fn new(stream: ReplyStream, session: Rc<SessionState>) -> Self {
        Self { stream, session }
    }

    /// Decodes and publishes one reply object.
    ///
    /// Malformed payloads are logged by category only and dropped.
    pub fn deliver(&self, payload: Value) -> Result<(), ReplyDecodeError> {
        if !self.session.is_open() {
            debug!("event=reply_dropped module=channel status=session_closed");
            return Err(ReplyDecodeError::SessionClosed);
        }
        let snapshot = Snapshot::from_value(payload).map_err(|err| {
            // serde messages may quote the offending value; log position only.
            warn!(
                "event=reply_dropped module=channel status=malformed category={:?} line={} column={}",
                err.classify(),
                err.line(),
                err.column()
            );
            ReplyDecodeError::Malformed(err)
        })?;
        debug!(
            "event=reply_received module=channel status=ok domains={:?} has_error={}",
            snapshot.populated_domains(),
            snapshot.has_error()
        );
        self.stream.publish(Rc::new(snapshot));
        Ok(())
    }

    /// Parses JSON text, then behaves as `deliver`.
    pub fn deliver_json(&self, text: &str) -> Result<(), ReplyDecodeError> {
        let payload = serde_json::from_str::<Value>(text).map_err(|err| {
            warn!(
                "event=reply_dropped module=channel status=unparsable category={:?} line={} column={}",
                err.classify(),
                err.line(),
                err.column()
            );
            ReplyDecodeError::Malformed(err)
        })?;
        self.deliver(payload)
    }
}
