//! Identity-keyed registry of mock clients.
//!
//! Clients register themselves on construction under `(address, nickname)`.
//! Tests look them up synchronously with [`Registry::find`], or wait for a
//! client the service has not created yet with [`Registry::find_async`].

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::mock::MockClient;
use crate::rendezvous::{completion, Completer, Completion};

type Identity = (String, String);

#[derive(Default)]
struct RegistryInner {
    clients: HashMap<String, HashMap<String, MockClient>>,
    pending: HashMap<Identity, Vec<Completer<MockClient>>>,
}

/// Mapping from `(address, nickname)` to the client created for it.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The client registered for `(address, nickname)`, if any.
    #[must_use]
    pub fn find(&self, address: &str, nickname: &str) -> Option<MockClient> {
        self.inner
            .lock()
            .clients
            .get(address)
            .and_then(|nicks| nicks.get(nickname))
            .cloned()
    }

    /// A completion for the client registered for `(address, nickname)`.
    ///
    /// Settled already if the client exists; otherwise it settles when the
    /// client is constructed, and not before.
    pub fn find_async(&self, address: &str, nickname: &str) -> Completion<MockClient> {
        let mut inner = self.inner.lock();
        if let Some(client) = inner
            .clients
            .get(address)
            .and_then(|nicks| nicks.get(nickname))
        {
            return Completion::ready(client.clone());
        }
        let (completer, done) = completion();
        let waiters = inner
            .pending
            .entry((address.to_owned(), nickname.to_owned()))
            .or_default();
        waiters.push(completer);
        tracing::trace!(address, nickname, waiters = waiters.len(), "lookup pending");
        done
    }

    /// Register `client` under its identity, replacing any earlier client,
    /// and settle every lookup waiting for that identity.
    pub(crate) fn register(&self, client: &MockClient) {
        let waiters = {
            let mut inner = self.inner.lock();
            let replaced = inner
                .clients
                .entry(client.address().to_owned())
                .or_default()
                .insert(client.nickname().to_owned(), client.clone());
            if replaced.is_some() {
                tracing::debug!(
                    address = %client.address(),
                    nickname = %client.nickname(),
                    "replacing registered client"
                );
            }
            inner
                .pending
                .remove(&(client.address().to_owned(), client.nickname().to_owned()))
                .unwrap_or_default()
        };
        if !waiters.is_empty() {
            tracing::debug!(
                address = %client.address(),
                nickname = %client.nickname(),
                waiters = waiters.len(),
                "settling pending lookups"
            );
        }
        for waiter in waiters {
            waiter.resolve(client.clone());
        }
    }

    /// Clients registered under `address`, sorted by nickname.
    #[must_use]
    pub fn clients(&self, address: &str) -> Vec<MockClient> {
        let mut clients: Vec<MockClient> = self
            .inner
            .lock()
            .clients
            .get(address)
            .map(|nicks| nicks.values().cloned().collect())
            .unwrap_or_default();
        clients.sort_by(|a, b| a.nickname().cmp(b.nickname()));
        clients
    }

    /// Number of lookups waiting for `(address, nickname)`.
    #[must_use]
    pub fn pending_lookups(&self, address: &str, nickname: &str) -> usize {
        self.inner
            .lock()
            .pending
            .get(&(address.to_owned(), nickname.to_owned()))
            .map_or(0, Vec::len)
    }

    /// Total number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().clients.values().map(HashMap::len).sum()
    }

    /// Whether no client is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every client and pending lookup. Pending lookups never settle.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.clients.clear();
        inner.pending.clear();
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Registry")
            .field("addresses", &inner.clients.len())
            .field("pending", &inner.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::assertions::poll_once;
    use crate::harness::Harness;
    use crate::mock::ClientOptions;
    use std::task::Poll;

    #[test]
    fn test_find_missing() {
        let harness = Harness::new();
        assert!(harness.registry().find("host1", "alice").is_none());
        assert!(harness.registry().is_empty());
    }

    #[test]
    fn test_find_after_create() {
        let harness = Harness::new();
        let alice = harness.create_client("host1", "alice", ClientOptions::default());

        assert_eq!(harness.registry().find("host1", "alice"), Some(alice));
        assert!(harness.registry().find("host1", "bob").is_none());
        assert!(harness.registry().find("host2", "alice").is_none());
    }

    #[test]
    fn test_latest_client_wins() {
        let harness = Harness::new();
        let first = harness.create_client("host1", "alice", ClientOptions::default());
        let second = harness.create_client("host1", "alice", ClientOptions::default());

        let found = harness.registry().find("host1", "alice").unwrap();
        assert_eq!(found, second);
        assert_ne!(found, first);
        assert_eq!(harness.registry().len(), 1);
    }

    #[test]
    fn test_find_async_existing_is_ready() {
        let harness = Harness::new();
        let alice = harness.create_client("host1", "alice", ClientOptions::default());

        let mut found = harness.registry().find_async("host1", "alice");
        assert_eq!(poll_once(&mut found), Poll::Ready(alice));
    }

    #[test]
    fn test_find_async_settles_on_create() {
        let harness = Harness::new();
        let mut first = harness.registry().find_async("host1", "alice");
        let mut second = harness.registry().find_async("host1", "alice");
        assert_eq!(harness.registry().pending_lookups("host1", "alice"), 2);

        harness.create_client("host1", "bob", ClientOptions::default());
        assert!(poll_once(&mut first).is_pending());

        let alice = harness.create_client("host1", "alice", ClientOptions::default());
        assert_eq!(poll_once(&mut first), Poll::Ready(alice.clone()));
        assert_eq!(poll_once(&mut second), Poll::Ready(alice));
        assert_eq!(harness.registry().pending_lookups("host1", "alice"), 0);
    }

    #[test]
    fn test_clients_sorted() {
        let harness = Harness::new();
        harness.create_client("host1", "zed", ClientOptions::default());
        harness.create_client("host1", "amy", ClientOptions::default());
        harness.create_client("host2", "bob", ClientOptions::default());

        let nicks: Vec<String> = harness
            .registry()
            .clients("host1")
            .iter()
            .map(|c| c.nickname().to_owned())
            .collect();
        assert_eq!(nicks, vec!["amy", "zed"]);
        assert!(harness.registry().clients("nowhere").is_empty());
    }

    #[test]
    fn test_reset_forgets_everything() {
        let harness = Harness::new();
        harness.create_client("host1", "alice", ClientOptions::default());
        let mut waiting = harness.registry().find_async("host1", "bob");

        harness.registry().reset();
        assert!(harness.registry().is_empty());
        assert_eq!(harness.registry().pending_lookups("host1", "bob"), 0);

        harness.create_client("host1", "bob", ClientOptions::default());
        assert!(poll_once(&mut waiting).is_pending());
    }
}
