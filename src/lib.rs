//! # ircmock
//!
//! > Deterministic mock IRC client for testing callback-driven services
//!
//! **ircmock** stands in for an IRC client library whose asynchronous
//! operations (`connect`, `join`, `whois`) report completion through
//! callbacks. Tests *trigger* those completions instead of sleeping or
//! polling, and the call and the trigger meet no matter which arrives first.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ircmock::prelude::*;
//!
//! #[ircmock::test]
//! async fn bridge_joins_its_channel(harness: Harness) {
//!     let joined = harness.let_nick_join_channel("irc.example", "bridge", "#general");
//!
//!     start_bridge(&harness); // service code: creates, connects, joins
//!
//!     let client = joined.await;
//!     assert_published!(harness.bus(), OutboundKind::Say, &client, "#general", "hello");
//! }
//! ```
//!
//! ## Features
//!
//! - **Rendezvous** - order-independent call/trigger completion
//! - **Registry** - look up clients, or wait for ones not created yet
//! - **Event bus** - observe every outbound `send`/`action`/`ctcp`/`say`
//! - **Call history** - every service-facing call is recorded
//! - **Scenario helpers** - "let nick join channel" in one line
//!
//! Nothing in this crate times out. A rendezvous that never happens leaves
//! its future pending; bound waits with your test runner or
//! `tokio::time::timeout`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assertions;
pub mod bus;
pub mod error;
pub mod harness;
pub mod mock;
pub mod registry;
pub mod rendezvous;

/// Prelude for convenient imports
///
/// ```rust
/// use ircmock::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bus::{EventBus, Outbound, OutboundEvent, OutboundKind, Subscription};
    pub use crate::error::{Error, Result};
    pub use crate::harness::{ClientFactory, Harness, HarnessConfig};
    pub use crate::mock::{
        listener, ClientOptions, IrcClient, Listener, MockClient, Operation, WhoisInfo,
    };
    pub use crate::rendezvous::{callback, Callback, Completion, SlotState};
    pub use crate::{assert_pending, assert_published, assert_ready};
}

// Re-exports
pub use error::{Error, Result};
pub use harness::Harness;
pub use mock::MockClient;

// Re-export the test macro when macros feature is enabled
#[cfg(feature = "macros")]
pub use ircmock_macros::test;

/// Support code for the `#[ircmock::test]` expansion.
#[cfg(feature = "macros")]
#[doc(hidden)]
pub mod __private {
    /// Install a fmt subscriber writing through the test harness, honouring
    /// `RUST_LOG` (default `ircmock=debug`). Later calls are no-ops.
    pub fn init_tracing() {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ircmock=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}
