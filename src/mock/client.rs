//! The fake IRC client.
//!
//! [`MockClient`] exposes the callable surface the service expects from the
//! real client library ([`IrcClient`]), plus test-facing triggers that
//! complete the service's asynchronous calls.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::Mutex;

use super::history::CallLog;
use super::options::ClientOptions;
use crate::bus::{Outbound, OutboundEvent, WeakEventBus};
use crate::harness::Harness;
use crate::rendezvous::{Arrival, Callback, Completion, SlotState, SlotTable};

/// Slot key used by `connect`, which has no identifying argument.
pub const CONNECT_KEY: &str = "_";

/// Listener for a named inbound event. Receives the event's arguments.
pub type Listener = Arc<dyn Fn(&[String]) + Send + Sync + 'static>;

/// Wraps a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&[String]) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The asynchronous operations a client performs through a rendezvous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Connect to the server. Keyed by [`CONNECT_KEY`].
    Connect,
    /// Join a channel. Keyed by channel name.
    Join,
    /// Look up a user. Keyed by the looked-up nickname.
    Whois,
}

impl Operation {
    /// Operation name as used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Join => "join",
            Self::Whois => "whois",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result delivered to a `whois` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoisInfo {
    /// The nickname that was looked up.
    pub nick: String,
    /// The registered user behind the nickname, if any.
    pub user: Option<String>,
}

impl WhoisInfo {
    /// Build the reply for `nick`; `user` is set to the nickname when the
    /// identity is present.
    pub fn new(nick: impl Into<String>, identity_present: bool) -> Self {
        let nick = nick.into();
        let user = identity_present.then(|| nick.clone());
        Self { nick, user }
    }

    /// Whether the looked-up user is registered.
    #[must_use]
    pub fn identity_present(&self) -> bool {
        self.user.is_some()
    }
}

/// The client surface consumed by the service under test.
///
/// Asynchronous operations take a trailing completion callback (`None` when
/// the caller does not care); outbound actions return nothing.
pub trait IrcClient: Send + Sync {
    /// Connect to the server.
    fn connect(&self, callback: Option<Callback<()>>);

    /// Join `channel`.
    fn join(&self, channel: &str, callback: Option<Callback<()>>);

    /// Look up `nickname`.
    fn whois(&self, nickname: &str, callback: Option<Callback<WhoisInfo>>);

    /// Send a raw command.
    fn send(&self, command: &str, args: &[&str]);

    /// Send a `/me` action to `channel`.
    fn action(&self, channel: &str, text: &str);

    /// Send a CTCP message of `kind` to `channel`.
    fn ctcp(&self, channel: &str, kind: &str, text: &str);

    /// Send a message to `channel`.
    fn say(&self, channel: &str, text: &str);

    /// Register a listener for inbound `event`s.
    fn add_listener(&self, event: &str, listener: Listener);
}

/// Call history of every service-facing method of one client.
///
/// All logs share one sequence counter, so calls can be ordered across
/// methods.
#[derive(Debug)]
pub struct ClientCalls {
    /// `connect()` calls.
    pub connect: CallLog<()>,
    /// `join(channel)` calls.
    pub join: CallLog<String>,
    /// `whois(nickname)` calls.
    pub whois: CallLog<String>,
    /// `send(command, args)` calls; the command comes first.
    pub send: CallLog<Vec<String>>,
    /// `action(channel, text)` calls.
    pub action: CallLog<(String, String)>,
    /// `ctcp(channel, kind, text)` calls.
    pub ctcp: CallLog<(String, String, String)>,
    /// `say(channel, text)` calls.
    pub say: CallLog<(String, String)>,
    /// `add_listener(event)` calls.
    pub add_listener: CallLog<String>,
}

impl ClientCalls {
    fn new() -> Self {
        let seq = Arc::new(AtomicU64::new(0));
        Self {
            connect: CallLog::with_sequence(Arc::clone(&seq)),
            join: CallLog::with_sequence(Arc::clone(&seq)),
            whois: CallLog::with_sequence(Arc::clone(&seq)),
            send: CallLog::with_sequence(Arc::clone(&seq)),
            action: CallLog::with_sequence(Arc::clone(&seq)),
            ctcp: CallLog::with_sequence(Arc::clone(&seq)),
            say: CallLog::with_sequence(Arc::clone(&seq)),
            add_listener: CallLog::with_sequence(seq),
        }
    }
}

struct ClientInner {
    address: String,
    nickname: String,
    options: ClientOptions,
    connects: SlotTable<(), MockClient>,
    joins: SlotTable<(), MockClient>,
    whoises: SlotTable<WhoisInfo, MockClient>,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    calls: ClientCalls,
    bus: WeakEventBus,
}

/// A fake client for one `(address, nickname)` identity.
///
/// Cloning yields another handle to the same client; equality is identity.
///
/// # Example
///
/// ```rust
/// use ircmock::prelude::*;
/// use ircmock::assertions::poll_once;
///
/// let harness = Harness::new();
/// let client = MockClient::new(&harness, "irc.example", "bot", ClientOptions::default());
///
/// // The test triggers first...
/// let mut joined = client.trigger_join_for("#rust");
/// assert!(poll_once(&mut joined).is_pending());
///
/// // ...and the service's join completes it.
/// client.join("#rust", None);
/// assert!(poll_once(&mut joined).is_ready());
/// ```
#[derive(Clone)]
pub struct MockClient {
    inner: Arc<ClientInner>,
}

impl MockClient {
    /// Construct a client and register it with the harness.
    ///
    /// Registration replaces any earlier client with the same identity and
    /// settles every pending asynchronous lookup for it.
    pub fn new(
        harness: &Harness,
        address: impl Into<String>,
        nickname: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Self {
            inner: Arc::new(ClientInner {
                address: address.into(),
                nickname: nickname.into(),
                options,
                connects: SlotTable::new(Operation::Connect.as_str()),
                joins: SlotTable::new(Operation::Join.as_str()),
                whoises: SlotTable::new(Operation::Whois.as_str()),
                listeners: Mutex::new(HashMap::new()),
                calls: ClientCalls::new(),
                bus: harness.bus().downgrade(),
            }),
        };
        tracing::debug!(
            address = %client.address(),
            nickname = %client.nickname(),
            "mock client created"
        );
        harness.registry().register(&client);
        client
    }

    /// Server address this client was created for.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.inner.address
    }

    /// Nickname this client was created with.
    #[must_use]
    pub fn nickname(&self) -> &str {
        &self.inner.nickname
    }

    /// Options the client was created with.
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Call history of the service-facing methods.
    #[must_use]
    pub fn calls(&self) -> &ClientCalls {
        &self.inner.calls
    }

    /// Whether two handles refer to the same client.
    #[must_use]
    pub fn same_client(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Complete the service's `connect` call.
    ///
    /// Settles immediately if `connect` was already called, otherwise when
    /// it is.
    pub fn trigger_connect(&self) -> Completion<MockClient> {
        self.inner.connects.trigger(CONNECT_KEY, (), self)
    }

    /// Complete the service's `join` call for `channel`.
    pub fn trigger_join_for(&self, channel: &str) -> Completion<MockClient> {
        self.inner.joins.trigger(channel, (), self)
    }

    /// Complete the service's `whois` lookup of `nickname`.
    ///
    /// `exists` decides whether the reply carries a registered user; an
    /// absent user is a normal reply, not an error.
    pub fn trigger_whois(&self, nickname: &str, exists: bool) -> Completion<MockClient> {
        self.inner
            .whoises
            .trigger(nickname, WhoisInfo::new(nickname, exists), self)
    }

    /// Deliver an inbound `event` to every listener registered for it, in
    /// registration order. Returns the number of listeners invoked.
    pub fn emit(&self, event: &str, args: &[&str]) -> usize {
        let listeners = self
            .inner
            .listeners
            .lock()
            .get(event)
            .cloned()
            .unwrap_or_default();
        let args: Vec<String> = args.iter().map(|a| (*a).to_owned()).collect();
        tracing::trace!(
            nickname = %self.nickname(),
            event,
            listeners = listeners.len(),
            "emitting inbound event"
        );
        for listener in &listeners {
            listener(&args);
        }
        listeners.len()
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Rendezvous state of `operation` for `key`.
    ///
    /// `key` is ignored for [`Operation::Connect`].
    #[must_use]
    pub fn slot_state(&self, operation: Operation, key: &str) -> SlotState {
        match operation {
            Operation::Connect => self.inner.connects.state(CONNECT_KEY),
            Operation::Join => self.inner.joins.state(key),
            Operation::Whois => self.inner.whoises.state(key),
        }
    }

    fn publish(&self, action: Outbound) {
        let Some(bus) = self.inner.bus.upgrade() else {
            tracing::trace!(
                nickname = %self.nickname(),
                kind = %action.kind(),
                "harness dropped, outbound action not published"
            );
            return;
        };
        bus.publish(OutboundEvent {
            client: self.clone(),
            action,
        });
    }

    fn log_arrival(&self, operation: Operation, key: &str, arrival: Arrival) {
        tracing::debug!(
            address = %self.address(),
            nickname = %self.nickname(),
            %operation,
            key,
            ?arrival,
            "service call"
        );
    }
}

impl IrcClient for MockClient {
    fn connect(&self, callback: Option<Callback<()>>) {
        self.inner.calls.connect.record(());
        let arrival = self.inner.connects.arrive(CONNECT_KEY, callback, self);
        self.log_arrival(Operation::Connect, CONNECT_KEY, arrival);
    }

    fn join(&self, channel: &str, callback: Option<Callback<()>>) {
        self.inner.calls.join.record(channel.to_owned());
        let arrival = self.inner.joins.arrive(channel, callback, self);
        self.log_arrival(Operation::Join, channel, arrival);
    }

    fn whois(&self, nickname: &str, callback: Option<Callback<WhoisInfo>>) {
        self.inner.calls.whois.record(nickname.to_owned());
        let arrival = self.inner.whoises.arrive(nickname, callback, self);
        self.log_arrival(Operation::Whois, nickname, arrival);
    }

    fn send(&self, command: &str, args: &[&str]) {
        let args: Vec<String> = args.iter().map(|a| (*a).to_owned()).collect();
        let mut recorded = Vec::with_capacity(args.len() + 1);
        recorded.push(command.to_owned());
        recorded.extend(args.iter().cloned());
        self.inner.calls.send.record(recorded);
        self.publish(Outbound::Send {
            command: command.to_owned(),
            args,
        });
    }

    fn action(&self, channel: &str, text: &str) {
        self.inner
            .calls
            .action
            .record((channel.to_owned(), text.to_owned()));
        self.publish(Outbound::Action {
            channel: channel.to_owned(),
            text: text.to_owned(),
        });
    }

    fn ctcp(&self, channel: &str, kind: &str, text: &str) {
        self.inner
            .calls
            .ctcp
            .record((channel.to_owned(), kind.to_owned(), text.to_owned()));
        self.publish(Outbound::Ctcp {
            channel: channel.to_owned(),
            kind: kind.to_owned(),
            text: text.to_owned(),
        });
    }

    fn say(&self, channel: &str, text: &str) {
        self.inner
            .calls
            .say
            .record((channel.to_owned(), text.to_owned()));
        self.publish(Outbound::Say {
            channel: channel.to_owned(),
            text: text.to_owned(),
        });
    }

    fn add_listener(&self, event: &str, listener: Listener) {
        self.inner.calls.add_listener.record(event.to_owned());
        self.inner
            .listeners
            .lock()
            .entry(event.to_owned())
            .or_default()
            .push(listener);
    }
}

impl PartialEq for MockClient {
    fn eq(&self, other: &Self) -> bool {
        self.same_client(other)
    }
}

impl Eq for MockClient {}

impl fmt::Debug for MockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockClient")
            .field("address", &self.inner.address)
            .field("nickname", &self.inner.nickname)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::poll_once;
    use crate::bus::OutboundKind;
    use crate::rendezvous::callback;
    use std::task::Poll;

    fn client(harness: &Harness, nick: &str) -> MockClient {
        MockClient::new(harness, "irc.example", nick, ClientOptions::default())
    }

    #[test]
    fn test_identity_and_options() {
        let harness = Harness::new();
        let opts = ClientOptions::default().with_port(7000);
        let c = MockClient::new(&harness, "irc.example", "bot", opts.clone());

        assert_eq!(c.address(), "irc.example");
        assert_eq!(c.nickname(), "bot");
        assert_eq!(c.options(), &opts);
    }

    #[test]
    fn test_connect_then_trigger() {
        let harness = Harness::new();
        let c = client(&harness, "bot");
        let connected = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&connected);

        c.connect(callback(move |()| *flag.lock() = true));
        assert!(!*connected.lock());
        assert_eq!(
            c.slot_state(Operation::Connect, ""),
            SlotState::WaitingForTrigger(1)
        );

        let mut done = c.trigger_connect();
        assert!(*connected.lock());
        assert_eq!(poll_once(&mut done), Poll::Ready(c.clone()));
    }

    #[test]
    fn test_whois_trigger_first() {
        let harness = Harness::new();
        let c = client(&harness, "bot");
        let reply = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&reply);

        let mut done = c.trigger_whois("bob", true);
        assert!(poll_once(&mut done).is_pending());

        c.whois(
            "bob",
            callback(move |info: WhoisInfo| *sink.lock() = Some(info)),
        );

        let info = reply.lock().clone().unwrap();
        assert_eq!(info.nick, "bob");
        assert!(info.identity_present());
        assert_eq!(info.user.as_deref(), Some("bob"));
        assert_eq!(poll_once(&mut done), Poll::Ready(c.clone()));
    }

    #[test]
    fn test_whois_absent_identity() {
        let info = WhoisInfo::new("ghost", false);
        assert_eq!(info.nick, "ghost");
        assert!(info.user.is_none());
        assert!(!info.identity_present());
    }

    #[test]
    fn test_join_keys_by_channel() {
        let harness = Harness::new();
        let c = client(&harness, "bot");

        c.join("#a", None);
        let mut other = c.trigger_join_for("#b");

        assert!(poll_once(&mut other).is_pending());
        assert_eq!(
            c.slot_state(Operation::Join, "#a"),
            SlotState::WaitingForTrigger(1)
        );
        assert_eq!(c.slot_state(Operation::Join, "#b"), SlotState::WaitingForCall);
        assert!(c.calls().join.was_called_with(&"#a".to_string()));
    }

    #[test]
    fn test_say_publishes_without_slot() {
        let harness = Harness::new();
        let c = client(&harness, "bot");

        c.say("#room", "hi");

        let events = harness.bus().history();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), OutboundKind::Say);
        assert_eq!(events[0].client, c);
        assert_eq!(events[0].args(), vec!["#room", "hi"]);
        assert_eq!(c.slot_state(Operation::Join, "#room"), SlotState::Empty);
        assert_eq!(
            c.calls().say.last_args(),
            Some(("#room".to_string(), "hi".to_string()))
        );
    }

    #[test]
    fn test_send_records_command_first() {
        let harness = Harness::new();
        let c = client(&harness, "bot");

        c.send("MODE", &["#room", "+o", "alice"]);

        assert_eq!(
            c.calls().send.last_args().unwrap(),
            vec!["MODE", "#room", "+o", "alice"]
        );
        let events = harness.bus().history();
        assert_eq!(events[0].args(), vec!["MODE", "#room", "+o", "alice"]);
    }

    #[test]
    fn test_listeners_receive_emitted_events() {
        let harness = Harness::new();
        let c = client(&harness, "bot");
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["one", "two"] {
            let seen = Arc::clone(&seen);
            c.add_listener(
                "message",
                listener(move |args| seen.lock().push(format!("{tag}:{}", args.join(" ")))),
            );
        }

        assert_eq!(c.emit("message", &["alice", "#room", "hello"]), 2);
        assert_eq!(c.emit("names", &["#room"]), 0);
        assert_eq!(
            *seen.lock(),
            vec!["one:alice #room hello", "two:alice #room hello"]
        );
        assert_eq!(c.listener_count("message"), 2);
        assert!(c.calls().add_listener.was_called_times(2));
    }

    #[test]
    fn test_calls_ordered_across_methods() {
        let harness = Harness::new();
        let c = client(&harness, "bot");

        c.connect(None);
        c.join("#a", None);
        c.action("#a", "waves");

        let connect = c.calls().connect.nth_call(0).unwrap().seq;
        let join = c.calls().join.nth_call(0).unwrap().seq;
        let action = c.calls().action.nth_call(0).unwrap().seq;
        assert!(connect < join && join < action);
    }

    #[test]
    fn test_equality_is_identity() {
        let harness = Harness::new();
        let a = client(&harness, "bot");
        let b = client(&harness, "bot");

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug() {
        let harness = Harness::new();
        let c = client(&harness, "bot");

        let debug = format!("{c:?}");
        assert!(debug.contains("MockClient"));
        assert!(debug.contains("bot"));
    }

    #[test]
    fn test_client_freed_with_harness() {
        let harness = Harness::new();
        let c = client(&harness, "bot");
        c.say("#a", "hi");
        c.connect(None);
        let weak = Arc::downgrade(&c.inner);

        drop(c);
        drop(harness);

        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_publish_after_harness_dropped() {
        let harness = Harness::new();
        let c = client(&harness, "bot");
        drop(harness);

        c.say("#a", "nobody listening");

        assert!(c.calls().say.was_called_with(&("#a".to_string(), "nobody listening".to_string())));
    }
}
