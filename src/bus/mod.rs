//! Broadcast of outbound client actions.
//!
//! Every `send`, `action`, `ctcp` and `say` performed by any [`MockClient`]
//! is published on the harness's [`EventBus`] before the call returns.
//! Tests observe them in three ways:
//!
//! - [`EventBus::history`] - everything published since the last reset
//! - [`EventBus::subscribe`] - a [`Subscription`] stream of later events
//! - [`EventBus::on`] - a handler invoked synchronously on publish
//!
//! # Example
//!
//! ```rust
//! use ircmock::prelude::*;
//!
//! let harness = Harness::new();
//! let mut sub = harness.bus().subscribe();
//! let client = harness.create_client("irc.example", "bot", ClientOptions::default());
//!
//! client.say("#rust", "hello");
//!
//! let event = sub.try_recv().unwrap();
//! assert_eq!(event.kind(), OutboundKind::Say);
//! assert_eq!(event.args(), vec!["#rust", "hello"]);
//! ```
//!
//! Events from a single client arrive in publish order; nothing is promised
//! about the interleaving of different clients beyond the order in which
//! their calls happened.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use futures_core::Stream;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::mock::MockClient;

/// The kinds of outbound action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundKind {
    /// Raw command.
    Send,
    /// `/me` action.
    Action,
    /// CTCP message.
    Ctcp,
    /// Channel or private message.
    Say,
}

impl OutboundKind {
    /// Action name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Action => "action",
            Self::Ctcp => "ctcp",
            Self::Say => "say",
        }
    }
}

impl fmt::Display for OutboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound action and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// `send(command, args...)`
    Send {
        /// Command name.
        command: String,
        /// Command arguments.
        args: Vec<String>,
    },
    /// `action(channel, text)`
    Action {
        /// Target channel.
        channel: String,
        /// Action text.
        text: String,
    },
    /// `ctcp(channel, kind, text)`
    Ctcp {
        /// Target channel.
        channel: String,
        /// CTCP type, e.g. `privmsg`.
        kind: String,
        /// Message text.
        text: String,
    },
    /// `say(channel, text)`
    Say {
        /// Target channel.
        channel: String,
        /// Message text.
        text: String,
    },
}

impl Outbound {
    /// The kind of this action.
    #[must_use]
    pub fn kind(&self) -> OutboundKind {
        match self {
            Self::Send { .. } => OutboundKind::Send,
            Self::Action { .. } => OutboundKind::Action,
            Self::Ctcp { .. } => OutboundKind::Ctcp,
            Self::Say { .. } => OutboundKind::Say,
        }
    }

    /// Positional arguments, in the order the client method took them.
    #[must_use]
    pub fn args(&self) -> Vec<&str> {
        match self {
            Self::Send { command, args } => std::iter::once(command.as_str())
                .chain(args.iter().map(String::as_str))
                .collect(),
            Self::Action { channel, text } | Self::Say { channel, text } => {
                vec![channel.as_str(), text.as_str()]
            }
            Self::Ctcp {
                channel,
                kind,
                text,
            } => vec![channel.as_str(), kind.as_str(), text.as_str()],
        }
    }
}

/// A published action together with the client that performed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEvent {
    /// The client that performed the action.
    pub client: MockClient,
    /// The action.
    pub action: Outbound,
}

impl OutboundEvent {
    /// The kind of the action.
    #[must_use]
    pub fn kind(&self) -> OutboundKind {
        self.action.kind()
    }

    /// Positional arguments of the action.
    #[must_use]
    pub fn args(&self) -> Vec<&str> {
        self.action.args()
    }
}

type Handler = Arc<dyn Fn(&OutboundEvent) + Send + Sync + 'static>;

struct BusInner {
    history: Option<Vec<OutboundEvent>>,
    subscribers: Vec<UnboundedSender<OutboundEvent>>,
    handlers: Vec<(Option<OutboundKind>, Handler)>,
}

/// Shared broadcast point for outbound actions.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    /// Create a bus that keeps a history of published events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history(true)
    }

    /// Create a bus, choosing whether to keep a history.
    #[must_use]
    pub fn with_history(keep_history: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                history: keep_history.then(Vec::new),
                subscribers: Vec::new(),
                handlers: Vec::new(),
            })),
        }
    }

    /// A handle that does not keep the bus alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Publish `event` to every subscriber and handler.
    ///
    /// Handlers run synchronously, after the bus lock is released, in
    /// registration order.
    pub fn publish(&self, event: OutboundEvent) {
        let handlers: Vec<Handler> = {
            let mut inner = self.inner.lock();
            if let Some(history) = inner.history.as_mut() {
                history.push(event.clone());
            }
            inner
                .subscribers
                .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
            inner
                .handlers
                .iter()
                .filter(|(kind, _)| kind.map_or(true, |k| k == event.kind()))
                .map(|(_, handler)| Arc::clone(handler))
                .collect()
        };
        tracing::debug!(
            action = %event.kind(),
            address = %event.client.address(),
            nickname = %event.client.nickname(),
            args = ?event.args(),
            "outbound action published"
        );
        for handler in handlers {
            handler(&event);
        }
    }

    /// Subscribe to every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = unbounded();
        self.inner.lock().subscribers.push(tx);
        Subscription { rx, kind: None }
    }

    /// Subscribe to events of one kind published from now on.
    #[must_use]
    pub fn subscribe_to(&self, kind: OutboundKind) -> Subscription {
        let mut sub = self.subscribe();
        sub.kind = Some(kind);
        sub
    }

    /// Invoke `handler` for every later event of `kind` (or of any kind
    /// when `None`).
    pub fn on<F>(&self, kind: Option<OutboundKind>, handler: F)
    where
        F: Fn(&OutboundEvent) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.inner.lock().handlers.push((kind, handler));
    }

    /// Everything published since creation or the last reset. Empty when
    /// the bus keeps no history.
    #[must_use]
    pub fn history(&self) -> Vec<OutboundEvent> {
        self.inner.lock().history.clone().unwrap_or_default()
    }

    /// Published events of one kind.
    #[must_use]
    pub fn published(&self, kind: OutboundKind) -> Vec<OutboundEvent> {
        self.history()
            .into_iter()
            .filter(|event| event.kind() == kind)
            .collect()
    }

    /// Check that `client` published a `kind` action with exactly `args`.
    pub fn expect_published(
        &self,
        kind: OutboundKind,
        client: &MockClient,
        args: &[&str],
    ) -> Result<()> {
        let published = self.published(kind);
        if published
            .iter()
            .any(|event| event.client == *client && event.args() == args)
        {
            return Ok(());
        }
        let seen: Vec<Vec<&str>> = published
            .iter()
            .filter(|event| event.client == *client)
            .map(OutboundEvent::args)
            .collect();
        Err(Error::assertion_failed(format!(
            "expected {}@{} to publish {kind} {args:?}, saw {seen:?}",
            client.nickname(),
            client.address(),
        )))
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    /// Drop all history, subscriptions and handlers. Open subscriptions end
    /// once they have drained what was already delivered to them.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        if let Some(history) = inner.history.as_mut() {
            history.clear();
        }
        inner.subscribers.clear();
        inner.handlers.clear();
    }
}

/// A handle to an [`EventBus`] that does not keep it alive.
///
/// Clients hold one of these so that events in the bus history, which
/// point back at their client, do not form a reference cycle.
#[derive(Clone)]
pub struct WeakEventBus {
    inner: Weak<Mutex<BusInner>>,
}

impl WeakEventBus {
    /// The bus, if any strong handle to it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<EventBus> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

impl fmt::Debug for WeakEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEventBus")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("EventBus")
            .field("history", &inner.history.as_ref().map(Vec::len))
            .field("subscribers", &inner.subscribers.len())
            .field("handlers", &inner.handlers.len())
            .finish()
    }
}

/// A stream of events published after subscribing.
#[must_use = "subscriptions do nothing unless read"]
pub struct Subscription {
    rx: UnboundedReceiver<OutboundEvent>,
    kind: Option<OutboundKind>,
}

impl Subscription {
    /// Wait for the next matching event.
    ///
    /// Fails with [`Error::Closed`] once the bus has been reset and every
    /// delivered event has been read.
    pub async fn recv(&mut self) -> Result<OutboundEvent> {
        self.next().await.ok_or(Error::Closed)
    }

    /// Take the next matching event if one was already delivered.
    pub fn try_recv(&mut self) -> Option<OutboundEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Take every matching event already delivered.
    pub fn drain(&mut self) -> Vec<OutboundEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    fn matches(&self, event: &OutboundEvent) -> bool {
        self.kind.map_or(true, |kind| kind == event.kind())
    }
}

impl Stream for Subscription {
    type Item = OutboundEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.rx.poll_next_unpin(cx) {
                Poll::Ready(Some(event)) if self.matches(&event) => {
                    return Poll::Ready(Some(event));
                }
                Poll::Ready(Some(_)) => continue,
                other => return other,
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
