// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Named pub/sub gate with fire-once replay for late subscribers.
//
// Each channel remembers whether it has fired and with what arguments, so a
// one-shot subscriber arriving after the fact is invoked immediately with
// the replayed arguments instead of waiting for a fire that already
// happened. `join` builds on that replay to wait for a whole set of
// channels at once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// Identifier returned by subscribe operations, used to unsubscribe.
/// Unique within its channel only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(pub u64);

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct HandlerEntry {
    handler: Box<dyn FnMut(&[Value]) -> bool + Send>,
    /// Auto-unsubscribe after the first invocation.
    once: bool,
}

struct ChannelState {
    name: String,
    /// Ordered so a fire pass visits handlers in registration order.
    handlers: BTreeMap<HandlerId, Arc<Mutex<HandlerEntry>>>,
    next_id: u64,
    fired: bool,
    /// Most recent fire arguments, retained for late-subscribe replay.
    fire_args: Vec<Value>,
    fired_at: Option<DateTime<Utc>>,
    enabled: bool,
}

/// Named pub/sub gate. Cheaply clonable; all clones share one state.
///
/// Subscriber callbacks receive the fire arguments and report failure by
/// returning `false`, which `fire` aggregates into its own return value
/// without stopping the remaining handlers.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Mutex<ChannelState>>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelState {
                name: name.into(),
                handlers: BTreeMap::new(),
                next_id: 0,
                fired: false,
                fire_args: Vec::new(),
                fired_at: None,
                enabled: true,
            })),
        }
    }

    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    /// Register a persistent handler; returns the id to unsubscribe with.
    pub fn subscribe(&self, handler: impl FnMut(&[Value]) -> bool + Send + 'static) -> HandlerId {
        let mut state = self.lock();
        let id = HandlerId(state.next_id);
        state.next_id += 1;
        state.handlers.insert(
            id,
            Arc::new(Mutex::new(HandlerEntry {
                handler: Box::new(handler),
                once: false,
            })),
        );
        id
    }

    /// Register (or replace) a persistent handler under a caller-chosen id,
    /// so one logical observer can be re-registered and later unsubscribed
    /// consistently across multiple subscribe calls.
    pub fn subscribe_with_id(
        &self,
        id: HandlerId,
        handler: impl FnMut(&[Value]) -> bool + Send + 'static,
    ) -> HandlerId {
        let mut state = self.lock();
        // Keep the automatic allocator ahead of explicit ids.
        if id.0 >= state.next_id {
            state.next_id = id.0 + 1;
        }
        state.handlers.insert(
            id,
            Arc::new(Mutex::new(HandlerEntry {
                handler: Box::new(handler),
                once: false,
            })),
        );
        id
    }

    /// Register a handler that runs at most once.
    ///
    /// If the channel has already fired, the handler runs synchronously
    /// right now with the replayed last-fire arguments and nothing is
    /// registered (`None`: there is nothing to unsubscribe).
    pub fn subscribe_once(
        &self,
        mut handler: impl FnMut(&[Value]) -> bool + Send + 'static,
    ) -> Option<HandlerId> {
        let mut state = self.lock();
        if state.fired {
            let args = state.fire_args.clone();
            drop(state);
            handler(&args);
            return None;
        }
        let id = HandlerId(state.next_id);
        state.next_id += 1;
        state.handlers.insert(
            id,
            Arc::new(Mutex::new(HandlerEntry {
                handler: Box::new(handler),
                once: true,
            })),
        );
        Some(id)
    }

    /// Persistent subscribe that additionally replays the last fire
    /// immediately when the channel has already fired (resume-event
    /// semantics: a late listener hears the event it missed, then keeps
    /// listening).
    pub fn subscribe_replay(
        &self,
        handler: impl FnMut(&[Value]) -> bool + Send + 'static,
    ) -> HandlerId {
        let (id, entry, replay_args) = {
            let mut state = self.lock();
            let id = HandlerId(state.next_id);
            state.next_id += 1;
            let entry = Arc::new(Mutex::new(HandlerEntry {
                handler: Box::new(handler),
                once: false,
            }));
            state.handlers.insert(id, entry.clone());
            let args = state.fired.then(|| state.fire_args.clone());
            (id, entry, args)
        };
        if let Some(args) = replay_args {
            if let Ok(mut entry) = entry.lock() {
                (entry.handler)(&args);
            }
        }
        id
    }

    /// Remove a handler. Unknown ids are a silent no-op.
    pub fn unsubscribe(&self, id: HandlerId) {
        self.lock().handlers.remove(&id);
    }

    /// Invoke every currently registered handler with `args`.
    ///
    /// Returns `true` unless some handler reported failure by returning
    /// `false`; a disabled channel reports success without invoking anyone.
    /// All handlers run even when one fails. The pass works on a snapshot
    /// of the handler set: handlers unsubscribed by an earlier handler in
    /// the same pass are skipped, handlers added during the pass wait for
    /// the next fire.
    pub fn fire(&self, args: &[Value]) -> bool {
        let snapshot: Vec<(HandlerId, Arc<Mutex<HandlerEntry>>)> = {
            let state = self.lock();
            if !state.enabled {
                debug!(channel = %state.name, "fire on disabled channel skipped");
                return true;
            }
            state
                .handlers
                .iter()
                .map(|(id, entry)| (*id, entry.clone()))
                .collect()
        };

        let mut failed = false;
        for (id, entry) in snapshot {
            if !self.lock().handlers.contains_key(&id) {
                // Removed by an earlier handler in this pass.
                continue;
            }
            // A reentrant fire finds the running handler's entry locked and
            // skips it rather than deadlocking.
            let Ok(mut entry) = entry.try_lock() else {
                debug!(handler = %id, "handler busy in reentrant fire, skipped");
                continue;
            };
            let ok = (entry.handler)(args);
            failed = failed || !ok;
            if entry.once {
                self.lock().handlers.remove(&id);
            }
        }

        let mut state = self.lock();
        state.fired = true;
        state.fire_args = args.to_vec();
        state.fired_at = Some(Utc::now());
        !failed
    }

    /// Disable or re-enable the channel. While disabled, `fire` is a no-op
    /// that reports success.
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn is_fired(&self) -> bool {
        self.lock().fired
    }

    /// When the channel last fired, for diagnostics.
    pub fn fired_at(&self) -> Option<DateTime<Utc>> {
        self.lock().fired_at
    }

    pub fn handler_count(&self) -> usize {
        self.lock().handlers.len()
    }

    /// Run `continuation` exactly once, after every channel in `channels`
    /// has fired at least once.
    ///
    /// Channels that have already fired count immediately through the
    /// `subscribe_once` replay path, so if nothing is outstanding (or the
    /// set is empty) the continuation runs synchronously before `join`
    /// returns. Joins may be nested.
    pub fn join(channels: &[Channel], continuation: impl FnOnce() + Send + 'static) {
        let continuation: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>> =
            Arc::new(Mutex::new(Some(Box::new(continuation))));
        if channels.is_empty() {
            run_once(&continuation);
            return;
        }

        let remaining = Arc::new(AtomicUsize::new(channels.len()));
        for channel in channels {
            let remaining = remaining.clone();
            let continuation = continuation.clone();
            // An already-fired channel replays synchronously and counts down
            // right here; nothing is registered for it.
            let _ = channel.subscribe_once(move |_| {
                if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                    run_once(&continuation);
                }
                true
            });
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.inner.lock().expect("channel lock poisoned")
    }
}

/// Take and invoke a join continuation, outside its own lock so nested
/// joins can register freely.
fn run_once(continuation: &Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>) {
    let taken = continuation
        .lock()
        .expect("join continuation lock poisoned")
        .take();
    if let Some(continuation) = taken {
        continuation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    fn counter() -> (Arc<AtomicU32>, impl Fn() -> u32) {
        let count = Arc::new(AtomicU32::new(0));
        let read = {
            let count = count.clone();
            move || count.load(Ordering::SeqCst)
        };
        (count, read)
    }

    #[test]
    fn fire_invokes_all_handlers() {
        let channel = Channel::new("test");
        let (count, read) = counter();
        for _ in 0..3 {
            let count = count.clone();
            channel.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            });
        }
        assert!(channel.fire(&[]));
        assert_eq!(read(), 3);
    }

    #[test]
    fn disabled_fire_invokes_no_handlers_and_reports_success() {
        let channel = Channel::new("test");
        let (count, read) = counter();
        {
            let count = count.clone();
            channel.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                false
            });
        }
        channel.set_enabled(false);
        assert!(channel.fire(&[]));
        assert_eq!(read(), 0);
        assert!(!channel.is_fired());
    }

    #[test]
    fn fire_aggregates_handler_failures_but_runs_everyone() {
        let channel = Channel::new("test");
        let (count, read) = counter();
        {
            let count = count.clone();
            channel.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                false
            });
        }
        {
            let count = count.clone();
            channel.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            });
        }
        assert!(!channel.fire(&[]));
        assert_eq!(read(), 2);
    }

    #[test]
    fn subscribe_once_after_fire_replays_synchronously() {
        let channel = Channel::new("test");
        channel.fire(&[json!("payload")]);

        let (count, read) = counter();
        let seen = Arc::new(Mutex::new(Value::Null));
        let id = {
            let count = count.clone();
            let seen = seen.clone();
            channel.subscribe_once(move |args| {
                count.fetch_add(1, Ordering::SeqCst);
                *seen.lock().expect("seen") = args[0].clone();
                true
            })
        };
        assert!(id.is_none());
        assert_eq!(read(), 1);
        assert_eq!(*seen.lock().expect("seen"), json!("payload"));
        // Nothing was registered persistently.
        assert_eq!(channel.handler_count(), 0);
    }

    #[test]
    fn subscribe_once_before_fire_runs_once_only() {
        let channel = Channel::new("test");
        let (count, read) = counter();
        {
            let count = count.clone();
            let _ = channel.subscribe_once(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            });
        }
        channel.fire(&[]);
        channel.fire(&[]);
        assert_eq!(read(), 1);
        assert_eq!(channel.handler_count(), 0);
    }

    #[test]
    fn replay_uses_most_recent_fire_args() {
        let channel = Channel::new("test");
        channel.fire(&[json!(1)]);
        channel.fire(&[json!(2)]);

        let seen = Arc::new(Mutex::new(Value::Null));
        {
            let seen = seen.clone();
            let _ = channel.subscribe_once(move |args| {
                *seen.lock().expect("seen") = args[0].clone();
                true
            });
        }
        assert_eq!(*seen.lock().expect("seen"), json!(2));
    }

    #[test]
    fn subscribe_replay_invokes_immediately_and_stays_registered() {
        let channel = Channel::new("test");
        channel.fire(&[json!("first")]);

        let (count, read) = counter();
        {
            let count = count.clone();
            channel.subscribe_replay(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            });
        }
        assert_eq!(read(), 1);
        channel.fire(&[json!("second")]);
        assert_eq!(read(), 2);
    }

    #[test]
    fn subscribe_replay_without_prior_fire_waits() {
        let channel = Channel::new("test");
        let (count, read) = counter();
        {
            let count = count.clone();
            channel.subscribe_replay(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            });
        }
        assert_eq!(read(), 0);
        channel.fire(&[]);
        assert_eq!(read(), 1);
    }

    #[test]
    fn unsubscribe_unknown_id_is_silent() {
        let channel = Channel::new("test");
        channel.unsubscribe(HandlerId(999));
    }

    #[test]
    fn unsubscribe_stops_invocations() {
        let channel = Channel::new("test");
        let (count, read) = counter();
        let id = {
            let count = count.clone();
            channel.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            })
        };
        channel.fire(&[]);
        channel.unsubscribe(id);
        channel.fire(&[]);
        assert_eq!(read(), 1);
    }

    #[test]
    fn handler_removed_mid_pass_is_skipped() {
        let channel = Channel::new("test");
        let (count, read) = counter();

        // First handler unsubscribes the second before it runs.
        let victim_id = Arc::new(Mutex::new(None));
        {
            let channel = channel.clone();
            let victim_id = victim_id.clone();
            channel.clone().subscribe(move |_| {
                if let Some(id) = *victim_id.lock().expect("victim id") {
                    channel.unsubscribe(id);
                }
                true
            });
        }
        let id = {
            let count = count.clone();
            channel.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            })
        };
        *victim_id.lock().expect("victim id") = Some(id);

        channel.fire(&[]);
        assert_eq!(read(), 0);
    }

    #[test]
    fn subscribe_with_id_replaces_prior_registration() {
        let channel = Channel::new("test");
        let (count, read) = counter();
        let stable = HandlerId(7);
        {
            let count = count.clone();
            channel.subscribe_with_id(stable, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            });
        }
        {
            let count = count.clone();
            channel.subscribe_with_id(stable, move |_| {
                count.fetch_add(10, Ordering::SeqCst);
                true
            });
        }
        channel.fire(&[]);
        assert_eq!(read(), 10);
        assert_eq!(channel.handler_count(), 1);

        // Auto-allocated ids stay clear of the explicit one.
        let auto = channel.subscribe(|_| true);
        assert!(auto.0 > stable.0);
    }

    #[test]
    fn join_waits_for_every_channel_in_any_order() {
        let a = Channel::new("a");
        let b = Channel::new("b");
        let (count, read) = counter();
        {
            let count = count.clone();
            Channel::join(&[a.clone(), b.clone()], move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        b.fire(&[]);
        assert_eq!(read(), 0);
        a.fire(&[]);
        assert_eq!(read(), 1);
        // Further fires do not re-run the continuation.
        a.fire(&[]);
        b.fire(&[]);
        assert_eq!(read(), 1);
    }

    #[test]
    fn join_counts_prefired_channels_immediately() {
        let a = Channel::new("a");
        let b = Channel::new("b");
        a.fire(&[]);

        let (count, read) = counter();
        {
            let count = count.clone();
            Channel::join(&[a.clone(), b.clone()], move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(read(), 0);
        b.fire(&[]);
        assert_eq!(read(), 1);
    }

    #[test]
    fn join_over_fired_set_runs_synchronously() {
        let a = Channel::new("a");
        a.fire(&[]);
        let (count, read) = counter();
        {
            let count = count.clone();
            Channel::join(&[a], move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(read(), 1);
    }

    #[test]
    fn join_over_empty_set_runs_synchronously() {
        let (count, read) = counter();
        {
            let count = count.clone();
            Channel::join(&[], move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(read(), 1);
    }

    #[test]
    fn joins_nest() {
        let a = Channel::new("a");
        let b = Channel::new("b");
        let (count, read) = counter();
        {
            let b = b.clone();
            let count = count.clone();
            Channel::join(&[a.clone()], move || {
                let count = count.clone();
                Channel::join(&[b.clone()], move || {
                    count.fetch_add(1, Ordering::SeqCst);
                });
            });
        }
        a.fire(&[]);
        assert_eq!(read(), 0);
        b.fire(&[]);
        assert_eq!(read(), 1);
    }

    #[test]
    fn fired_at_is_recorded() {
        let channel = Channel::new("test");
        assert!(channel.fired_at().is_none());
        channel.fire(&[]);
        assert!(channel.fired_at().is_some());
    }
}
