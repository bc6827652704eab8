//! Channel handle and session lifecycle.

use crate::channel::flags::{Clock, InitFlags, SeedSource};
use crate::channel::port::{CorePort, CoreRuntime, CoreStartError, PortError, ReplySink};
use crate::model::command::Command;
use crate::stream::ReplyStream;
use log::{debug, error, info};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Opening the channel failed; the session must not proceed.
#[derive(Debug, Clone, PartialEq)]
pub enum InitError {
    MalformedFlags(String),
    CoreStart(CoreStartError),
}

impl Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedFlags(reason) => write!(f, "malformed init flags: {reason}"),
            Self::CoreStart(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedFlags(_) => None,
            Self::CoreStart(err) => Some(err),
        }
    }
}

impl From<CoreStartError> for InitError {
    fn from(value: CoreStartError) -> Self {
        Self::CoreStart(value)
    }
}

/// One command failed to reach the core. Never retried.
#[derive(Debug)]
pub enum SendError {
    SessionClosed,
    Encode(serde_json::Error),
    Port(PortError),
}

impl Display for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionClosed => write!(f, "session is closed"),
            Self::Encode(err) => write!(f, "command encoding failed: {err}"),
            Self::Port(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SessionClosed => None,
            Self::Encode(err) => Some(err),
            Self::Port(err) => Some(err),
        }
    }
}

impl From<PortError> for SendError {
    fn from(value: PortError) -> Self {
        Self::Port(value)
    }
}

/// Logged-in state of one channel handle.
#[derive(Debug)]
pub struct SessionState {
    username: String,
    started_at_ms: i64,
    open: Cell<bool>,
}

impl SessionState {
    fn new(username: String, started_at_ms: i64) -> Self {
        Self {
            username,
            started_at_ms,
            open: Cell::new(true),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }
}

/// Open channel to one running core instance.
///
/// Dropping the handle closes the session.
pub struct ChannelHandle {
    session: Rc<SessionState>,
    port: Box<dyn CorePort>,
    events: ReplyStream,
}

impl ChannelHandle {
    /// Starts the core and registers the single inbound stream.
    ///
    /// # Errors
    /// - `InitError::MalformedFlags` when the seed is not in `[0, 1)`.
    /// - `InitError::CoreStart` when the runtime fails to start the core.
    pub fn open<R>(
        runtime: &R,
        username: &str,
        seed: &mut dyn SeedSource,
        clock: &dyn Clock,
    ) -> Result<Self, InitError>
    where
        R: CoreRuntime + ?Sized,
    {
        let flags = InitFlags {
            user: username.to_string(),
            current_time: clock.now_epoch_ms(),
            initial_seed: seed.next_seed(),
        };
        if let Some(reason) = flags.malformed_reason() {
            error!("event=channel_open module=channel status=error reason=malformed_flags");
            return Err(InitError::MalformedFlags(reason));
        }

        let session = Rc::new(SessionState::new(flags.user.clone(), flags.current_time));
        let events = ReplyStream::replay_latest();
        let sink = ReplySink::new(events.clone(), Rc::clone(&session));

        let port = runtime.start(&flags, sink).map_err(|err| {
            session.open.set(false);
            error!("event=channel_open module=channel status=error reason=core_start");
            InitError::from(err)
        })?;

        info!(
            "event=channel_open module=channel status=ok started_at_ms={}",
            flags.current_time
        );
        Ok(Self {
            session,
            port,
            events,
        })
    }

    /// Sends one command, best-effort and unacknowledged.
    pub fn send(&self, command: &Command) -> Result<(), SendError> {
        if !self.session.is_open() {
            return Err(SendError::SessionClosed);
        }
        let payload = command.to_wire().map_err(SendError::Encode)?;
        self.port.send(payload)?;
        debug!(
            "event=command_sent module=channel status=ok page={} action={} has_id={} has_content={} has_amount={}",
            command.domain(),
            command.action(),
            command.id().is_some(),
            command.content().is_some(),
            command.amount().is_some()
        );
        Ok(())
    }

    /// Shared inbound stream. Repeated calls return the same stream.
    pub fn events(&self) -> ReplyStream {
        self.events.clone()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Ends the session and shuts the core port down. Idempotent.
    pub fn close(&self) {
        if !self.session.open.replace(false) {
            return;
        }
        self.port.shutdown();
        info!("event=channel_close module=channel status=ok");
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelHandle, InitError, SendError};
    use crate::channel::flags::{FixedClock, FixedSeed};
    use crate::command;
    use crate::testing::ScriptedCore;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn open_passes_init_payload_to_core() {
        let core = ScriptedCore::new();
        let handle = ChannelHandle::open(
            &core,
            "lucas",
            &mut FixedSeed(0.5),
            &FixedClock(1_700_000_000_000),
        )
        .expect("open");

        let flags = core.init_flags();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].user, "lucas");
        assert_eq!(flags[0].current_time, 1_700_000_000_000);
        assert_eq!(flags[0].initial_seed, 0.5);
        assert_eq!(handle.session().username(), "lucas");
        assert!(handle.is_open());
    }

    #[test]
    fn open_rejects_out_of_range_seed_without_starting_core() {
        let core = ScriptedCore::new();
        let result = ChannelHandle::open(&core, "lucas", &mut FixedSeed(1.5), &FixedClock(0));
        assert!(matches!(result, Err(InitError::MalformedFlags(_))));
        assert!(core.init_flags().is_empty());
    }

    #[test]
    fn open_surfaces_core_start_failure() {
        let core = ScriptedCore::failing_start("runtime missing");
        let err = ChannelHandle::open(&core, "lucas", &mut FixedSeed(0.1), &FixedClock(0))
            .err()
            .expect("start failure must surface");
        assert!(matches!(err, InitError::CoreStart(_)));
        assert!(err.to_string().contains("runtime missing"));
    }

    #[test]
    fn events_share_one_upstream_stream() {
        let core = ScriptedCore::new();
        let handle =
            ChannelHandle::open(&core, "lucas", &mut FixedSeed(0.1), &FixedClock(0)).expect("open");

        let seen = Rc::new(RefCell::new(0));
        let first_seen = Rc::clone(&seen);
        let _first = handle.events().subscribe(move |_| *first_seen.borrow_mut() += 1);
        let second_seen = Rc::clone(&seen);
        let _second = handle.events().subscribe(move |_| *second_seen.borrow_mut() += 1);

        core.emit(json!({"todo": []})).expect("emit");
        assert_eq!(*seen.borrow(), 2);
        assert_eq!(handle.events().subscriber_count(), 2);
        assert_eq!(core.start_count(), 1);
    }

    #[test]
    fn send_after_close_fails_and_core_is_shut_down_once() {
        let core = ScriptedCore::new();
        let handle =
            ChannelHandle::open(&core, "lucas", &mut FixedSeed(0.1), &FixedClock(0)).expect("open");

        handle.close();
        handle.close();
        let err = handle
            .send(&command::sync_todo())
            .expect_err("closed session must reject sends");
        assert!(matches!(err, SendError::SessionClosed));
        assert_eq!(core.shutdown_count(), 1);
        assert!(core.sent().is_empty());
    }

    #[test]
    fn port_failure_maps_to_send_error() {
        let core = ScriptedCore::new();
        let handle =
            ChannelHandle::open(&core, "lucas", &mut FixedSeed(0.1), &FixedClock(0)).expect("open");
        core.set_fail_sends(true);

        let err = handle
            .send(&command::sync_budget())
            .expect_err("port failure must surface");
        assert!(matches!(err, SendError::Port(_)));
    }
}
