//! Single-threaded fan-out with optional replay of the latest value.
//!
//! # Responsibility
//! - Turn one inbound event source into N independent subscriptions.
//! - Keep a single-slot cache so late subscribers start from the latest value.
//!
//! # Invariants
//! - Every subscriber observes values in publish order; all active
//!   subscribers see value N before any subscriber sees value N+1.
//! - Values published from inside an observer callback are queued and
//!   delivered after the current value reaches every subscriber.
//! - Only the latest value is retained; there is no history buffer.
//! - Dropping a `Subscription` detaches exactly one observer.

use crate::model::snapshot::Snapshot;
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Shared, replaying stream of core snapshots.
pub type ReplyStream = Broadcaster<Rc<Snapshot>>;

type Observer<T> = Box<dyn FnMut(&T)>;

struct Slot<T> {
    id: u64,
    active: Rc<Cell<bool>>,
    observer: RefCell<Observer<T>>,
}

struct Inner<T> {
    replay: bool,
    latest: RefCell<Option<T>>,
    slots: RefCell<Vec<Rc<Slot<T>>>>,
    pending: RefCell<VecDeque<T>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
    delivered: Cell<u64>,
}

/// Multicast publisher for one value type.
///
/// Cloning yields another handle to the same subscriber list and cache.
pub struct Broadcaster<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Broadcaster<T> {
    /// Creates a broadcaster that forwards values without replaying them.
    pub fn new() -> Self {
        Self::with_replay(false)
    }

    /// Creates a broadcaster that hands the latest value to new subscribers.
    pub fn replay_latest() -> Self {
        Self::with_replay(true)
    }

    fn with_replay(replay: bool) -> Self {
        Self {
            inner: Rc::new(Inner {
                replay,
                latest: RefCell::new(None),
                slots: RefCell::new(Vec::new()),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                next_id: Cell::new(0),
                delivered: Cell::new(0),
            }),
        }
    }

    /// Attaches an observer.
    ///
    /// With replay enabled the observer is called with the latest value
    /// before this returns, then with every later value.
    pub fn subscribe(&self, observer: impl FnMut(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let active = Rc::new(Cell::new(true));
        let slot = Rc::new(Slot {
            id,
            active: Rc::clone(&active),
            observer: RefCell::new(Box::new(observer)),
        });
        self.inner.slots.borrow_mut().push(Rc::clone(&slot));

        if self.inner.replay {
            let latest = self.inner.latest.borrow().clone();
            if let Some(value) = latest {
                if self.inner.dispatching.get() {
                    // The outer dispatch drains anything this publishes.
                    deliver(&slot, &value);
                } else {
                    let _guard = DispatchGuard::enter(&self.inner.dispatching);
                    deliver(&slot, &value);
                    self.drain_pending();
                }
            }
        }

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        let flag = Rc::clone(&active);
        Subscription {
            id,
            active,
            detach: Some(Box::new(move || {
                flag.set(false);
                if let Some(inner) = weak.upgrade() {
                    inner.slots.borrow_mut().retain(|slot| slot.id != id);
                }
            })),
        }
    }

    /// Publishes one value to every active subscriber.
    pub fn publish(&self, value: T) {
        self.inner.pending.borrow_mut().push_back(value);
        if self.inner.dispatching.get() {
            return;
        }

        let _guard = DispatchGuard::enter(&self.inner.dispatching);
        self.drain_pending();
    }

    /// Delivers queued values in order. Callers hold the dispatch guard.
    fn drain_pending(&self) {
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(value) = next else {
                break;
            };

            if self.inner.replay {
                *self.inner.latest.borrow_mut() = Some(value.clone());
            }
            self.inner.delivered.set(self.inner.delivered.get() + 1);

            let slots = self.inner.slots.borrow().clone();
            for slot in &slots {
                deliver(slot, &value);
            }
        }
    }

    /// Latest delivered value, when replay is enabled.
    pub fn latest(&self) -> Option<T> {
        self.inner.latest.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    /// Number of values delivered since creation.
    pub fn delivered_count(&self) -> u64 {
        self.inner.delivered.get()
    }
}

fn deliver<T>(slot: &Slot<T>, value: &T) {
    if !slot.active.get() {
        return;
    }
    match slot.observer.try_borrow_mut() {
        Ok(mut observer) => (*observer)(value),
        Err(_) => debug!(
            "event=deliver_skipped module=stream status=busy subscriber={}",
            slot.id
        ),
    }
}

struct DispatchGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Attachment of one observer to a `Broadcaster`.
///
/// Dropping it detaches the observer. Use `keep_alive` to leave the observer
/// attached for the broadcaster's lifetime.
#[must_use = "dropping a Subscription detaches its observer"]
pub struct Subscription {
    id: u64,
    active: Rc<Cell<bool>>,
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Detaches the observer; it receives nothing further, even mid-dispatch.
    pub fn unsubscribe(mut self) {
        self.run_detach();
    }

    /// Leaves the observer attached without holding a handle.
    pub fn keep_alive(mut self) {
        self.detach = None;
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

#[cfg(test)]
mod tests {
    use super::Broadcaster;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn FnMut(&u32)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &str| -> Box<dyn FnMut(&u32)> {
            let sink = Rc::clone(&sink);
            let name = name.to_string();
            Box::new(move |value: &u32| sink.borrow_mut().push(format!("{name}:{value}")))
        };
        (log, make)
    }

    #[test]
    fn fans_out_in_publish_order_across_subscribers() {
        let stream = Broadcaster::<u32>::replay_latest();
        let (log, make) = recorder();
        let _a = stream.subscribe(make("a"));
        let _b = stream.subscribe(make("b"));

        stream.publish(1);
        stream.publish(2);

        assert_eq!(*log.borrow(), vec!["a:1", "b:1", "a:2", "b:2"]);
    }

    #[test]
    fn late_subscriber_gets_only_latest_value() {
        let stream = Broadcaster::<u32>::replay_latest();
        stream.publish(1);
        stream.publish(2);

        let (log, make) = recorder();
        let _late = stream.subscribe(make("late"));
        assert_eq!(*log.borrow(), vec!["late:2"]);

        stream.publish(3);
        assert_eq!(*log.borrow(), vec!["late:2", "late:3"]);
    }

    #[test]
    fn non_replaying_broadcaster_skips_history() {
        let stream = Broadcaster::<u32>::new();
        stream.publish(1);

        let (log, make) = recorder();
        let _sub = stream.subscribe(make("x"));
        assert!(log.borrow().is_empty());
        assert_eq!(stream.latest(), None);
    }

    #[test]
    fn unsubscribe_detaches_only_one_observer() {
        let stream = Broadcaster::<u32>::replay_latest();
        let (log, make) = recorder();
        let a = stream.subscribe(make("a"));
        let _b = stream.subscribe(make("b"));
        assert_eq!(stream.subscriber_count(), 2);

        a.unsubscribe();
        stream.publish(5);

        assert_eq!(stream.subscriber_count(), 1);
        assert_eq!(*log.borrow(), vec!["b:5"]);
    }

    #[test]
    fn reentrant_publish_is_queued_behind_current_value() {
        let stream = Broadcaster::<u32>::replay_latest();
        let log = Rc::new(RefCell::new(Vec::new()));

        let echo = stream.clone();
        let first_log = Rc::clone(&log);
        let _first = stream.subscribe(move |value: &u32| {
            first_log.borrow_mut().push(format!("first:{value}"));
            if *value == 1 {
                echo.publish(2);
            }
        });
        let second_log = Rc::clone(&log);
        let _second = stream.subscribe(move |value: &u32| {
            second_log.borrow_mut().push(format!("second:{value}"));
        });

        stream.publish(1);

        assert_eq!(
            *log.borrow(),
            vec!["first:1", "second:1", "first:2", "second:2"]
        );
        assert_eq!(stream.delivered_count(), 2);
    }

    #[test]
    fn publish_from_replay_callback_reaches_the_new_subscriber() {
        let stream = Broadcaster::<u32>::replay_latest();
        stream.publish(1);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let echo = stream.clone();
        let _late = stream.subscribe(move |value: &u32| {
            sink.borrow_mut().push(*value);
            if *value == 1 {
                echo.publish(2);
            }
        });

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(stream.latest(), Some(2));

        stream.publish(3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn subscribe_inside_dispatch_replays_current_value_once() {
        let stream = Broadcaster::<u32>::replay_latest();
        let (log, make) = recorder();
        let inner: Rc<RefCell<Vec<super::Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let mounter = stream.clone();
        let mounted = Rc::clone(&inner);
        let _outer = stream.subscribe(move |value: &u32| {
            if *value == 1 {
                mounted.borrow_mut().push(mounter.subscribe(make("inner")));
                mounter.publish(2);
            }
        });

        stream.publish(1);
        assert_eq!(*log.borrow(), vec!["inner:1", "inner:2"]);
    }

    #[test]
    fn observer_detached_mid_dispatch_receives_nothing_further() {
        let stream = Broadcaster::<u32>::replay_latest();
        let log = Rc::new(RefCell::new(Vec::new()));
        let victim_slot: Rc<RefCell<Option<super::Subscription>>> = Rc::new(RefCell::new(None));

        let killer_slot = Rc::clone(&victim_slot);
        let _killer = stream.subscribe(move |_value: &u32| {
            if let Some(sub) = killer_slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        let victim_log = Rc::clone(&log);
        let victim = stream.subscribe(move |value: &u32| {
            victim_log.borrow_mut().push(*value);
        });
        *victim_slot.borrow_mut() = Some(victim);

        stream.publish(9);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn keep_alive_leaves_observer_attached() {
        let stream = Broadcaster::<u32>::new();
        let (log, make) = recorder();
        stream.subscribe(make("kept")).keep_alive();

        stream.publish(4);
        assert_eq!(*log.borrow(), vec!["kept:4"]);
    }
}
