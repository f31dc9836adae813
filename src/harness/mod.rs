//! The shared test context.
//!
//! A [`Harness`] owns the client [`Registry`] and the [`EventBus`] for one
//! test scenario. Create one per test (the `#[ircmock::test]` macro injects
//! a fresh one) or call [`Harness::reset`] between scenarios so clients,
//! pending lookups and bus listeners never leak from one to the next.
//!
//! The service under test should obtain its clients through a
//! [`ClientFactory`], which the harness implements.

mod scenario;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::bus::EventBus;
use crate::error::{Error, Result};
use crate::mock::{ClientOptions, IrcClient, MockClient};
use crate::registry::Registry;
use crate::rendezvous::Completion;

pub use scenario::{let_nick_connect, let_nick_join_channel};

/// Harness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Keep an inspectable history of published outbound actions.
    pub history: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self { history: true }
    }
}

/// Builder for [`Harness`].
#[derive(Debug, Default)]
pub struct HarnessBuilder {
    config: HarnessConfig,
}

impl HarnessBuilder {
    /// Keep (or not) a history of published events.
    #[must_use]
    pub fn history(mut self, enabled: bool) -> Self {
        self.config.history = enabled;
        self
    }

    /// Build the harness.
    #[must_use]
    pub fn build(self) -> Harness {
        Harness::with_config(self.config)
    }
}

/// Creates clients for the service under test.
///
/// Production code receives the real library's factory; tests pass a
/// [`Harness`].
pub trait ClientFactory {
    /// The client type produced.
    type Client: IrcClient;

    /// Create a client for `nickname` on the server at `address`.
    fn create_client(&self, address: &str, nickname: &str, options: ClientOptions) -> Self::Client;
}

struct HarnessInner {
    config: HarnessConfig,
    registry: Registry,
    bus: EventBus,
}

/// Registry, event bus and scenario helpers for one test scenario.
///
/// Cloning yields another handle to the same state.
///
/// # Example
///
/// ```rust
/// use ircmock::prelude::*;
/// use ircmock::assertions::poll_once;
///
/// let harness = Harness::new();
/// let mut lookup = harness.find_client_async("irc.example", "bot");
/// assert!(poll_once(&mut lookup).is_pending());
///
/// // The service creates its client...
/// let client = harness.create_client("irc.example", "bot", ClientOptions::default());
///
/// // ...which settles the lookup.
/// assert_eq!(poll_once(&mut lookup), std::task::Poll::Ready(client));
/// ```
#[derive(Clone)]
pub struct Harness {
    inner: Arc<HarnessInner>,
}

impl Harness {
    /// Create a harness with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HarnessConfig::default())
    }

    /// Start building a harness.
    #[must_use]
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Create a harness with `config`.
    #[must_use]
    pub fn with_config(config: HarnessConfig) -> Self {
        let bus = EventBus::with_history(config.history);
        Self {
            inner: Arc::new(HarnessInner {
                config,
                registry: Registry::new(),
                bus,
            }),
        }
    }

    /// The configuration this harness was built with.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.inner.config
    }

    /// The client registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// The outbound event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Construct and register a client.
    pub fn create_client(
        &self,
        address: impl Into<String>,
        nickname: impl Into<String>,
        options: ClientOptions,
    ) -> MockClient {
        MockClient::new(self, address, nickname, options)
    }

    /// The client registered for `(address, nickname)`, if any.
    #[must_use]
    pub fn find_client(&self, address: &str, nickname: &str) -> Option<MockClient> {
        self.registry().find(address, nickname)
    }

    /// Like [`find_client`](Self::find_client), failing with
    /// [`Error::UnknownClient`] when absent.
    pub fn expect_client(&self, address: &str, nickname: &str) -> Result<MockClient> {
        self.find_client(address, nickname)
            .ok_or_else(|| Error::unknown_client(address, nickname))
    }

    /// A completion for the client for `(address, nickname)`, settling
    /// when it is created if it does not exist yet.
    pub fn find_client_async(&self, address: &str, nickname: &str) -> Completion<MockClient> {
        self.registry().find_async(address, nickname)
    }

    /// See [`let_nick_connect`].
    pub fn let_nick_connect(
        &self,
        address: &str,
        nickname: &str,
    ) -> impl Future<Output = MockClient> + Send + 'static {
        let_nick_connect(self, address, nickname)
    }

    /// See [`let_nick_join_channel`].
    pub fn let_nick_join_channel(
        &self,
        address: &str,
        nickname: &str,
        channel: &str,
    ) -> impl Future<Output = MockClient> + Send + 'static {
        let_nick_join_channel(self, address, nickname, channel)
    }

    /// Discard every client, pending lookup, bus subscription and handler.
    pub fn reset(&self) {
        tracing::debug!("resetting harness");
        self.registry().reset();
        self.bus().reset();
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory for Harness {
    type Client = MockClient;

    fn create_client(&self, address: &str, nickname: &str, options: ClientOptions) -> MockClient {
        Harness::create_client(self, address, nickname, options)
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .field("bus", &self.inner.bus)
            .finish()
    }
}
