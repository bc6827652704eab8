//! Scripted core for driving the bridge without a real application core.
//!
//! `ScriptedCore` implements `CoreRuntime`. It records the init payload and
//! every command it receives, and pushes replies only when told to, so tests
//! decide exactly when and in which order snapshots arrive.
//!
//! ```
//! use dtt_bridge::testing::ScriptedCore;
//! use dtt_bridge::DttSession;
//! use serde_json::json;
//!
//! let core = ScriptedCore::new();
//! let session = DttSession::login(&core, "lucas").expect("login");
//! session.sync_todo();
//! core.emit(json!({"todo": [{"id": "1", "message": "buy milk"}]})).expect("emit");
//! assert_eq!(session.todo().held().map(|todos| todos.len()), Some(1));
//! ```

use crate::channel::{
    CorePort, CoreRuntime, CoreStartError, InitFlags, PortError, ReplyDecodeError, ReplySink,
};
use crate::model::command::Command;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct ScriptedState {
    fail_start: Option<String>,
    fail_sends: Cell<bool>,
    flags: RefCell<Vec<InitFlags>>,
    sent: RefCell<Vec<Value>>,
    sink: RefCell<Option<ReplySink>>,
    shutdowns: Cell<u32>,
}

/// In-process core double. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedCore {
    state: Rc<ScriptedState>,
}

impl ScriptedCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A core whose start always fails with `message`.
    pub fn failing_start(message: impl Into<String>) -> Self {
        Self {
            state: Rc::new(ScriptedState {
                fail_start: Some(message.into()),
                ..ScriptedState::default()
            }),
        }
    }

    /// Makes every later `send` fail at the port.
    pub fn set_fail_sends(&self, fail: bool) {
        self.state.fail_sends.set(fail);
    }

    /// Pushes one reply into the bridge.
    ///
    /// Does nothing when the core has not been started or was shut down.
    pub fn emit(&self, payload: Value) -> Result<(), ReplyDecodeError> {
        let sink = self.state.sink.borrow().clone();
        match sink {
            Some(sink) => sink.deliver(payload),
            None => Ok(()),
        }
    }

    /// Pushes one reply given as JSON text.
    pub fn emit_json(&self, text: &str) -> Result<(), ReplyDecodeError> {
        let sink = self.state.sink.borrow().clone();
        match sink {
            Some(sink) => sink.deliver_json(text),
            None => Ok(()),
        }
    }

    pub fn init_flags(&self) -> Vec<InitFlags> {
        self.state.flags.borrow().clone()
    }

    pub fn start_count(&self) -> usize {
        self.state.flags.borrow().len()
    }

    /// Raw wire objects received, in send order.
    pub fn sent(&self) -> Vec<Value> {
        self.state.sent.borrow().clone()
    }

    /// Received commands decoded back into `Command`.
    pub fn sent_commands(&self) -> Vec<Command> {
        self.state
            .sent
            .borrow()
            .iter()
            .filter_map(|value| serde_json::from_value(value.clone()).ok())
            .collect()
    }

    pub fn last_sent(&self) -> Option<Value> {
        self.state.sent.borrow().last().cloned()
    }

    pub fn shutdown_count(&self) -> u32 {
        self.state.shutdowns.get()
    }
}

impl CoreRuntime for ScriptedCore {
    fn start(
        &self,
        flags: &InitFlags,
        replies: ReplySink,
    ) -> Result<Box<dyn CorePort>, CoreStartError> {
        if let Some(message) = &self.state.fail_start {
            return Err(CoreStartError::new(message.clone()));
        }
        self.state.flags.borrow_mut().push(flags.clone());
        *self.state.sink.borrow_mut() = Some(replies);
        Ok(Box::new(ScriptedPort {
            state: Rc::clone(&self.state),
        }))
    }
}

struct ScriptedPort {
    state: Rc<ScriptedState>,
}

impl CorePort for ScriptedPort {
    fn send(&self, command: Value) -> Result<(), PortError> {
        if self.state.fail_sends.get() {
            return Err(PortError::new("scripted send failure"));
        }
        self.state.sent.borrow_mut().push(command);
        Ok(())
    }

    fn shutdown(&self) {
        self.state.shutdowns.set(self.state.shutdowns.get() + 1);
        self.state.sink.borrow_mut().take();
    }
}
