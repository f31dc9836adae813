//! Assertions for rendezvous-driven tests.
//!
//! Completions settle as a side effect of calls into the mock, never on a
//! timer, so "has this settled yet?" can be checked by polling once instead
//! of sleeping:
//!
//! - [`poll_once`] - poll a future a single time with a no-op waker
//! - [`assert_ready!`] - assert a future is ready now, yielding its value
//! - [`assert_pending!`] - assert a future is not ready yet
//! - [`assert_published!`] - assert a client published an outbound action
//!
//! # Example
//!
//! ```rust
//! use ircmock::prelude::*;
//! use ircmock::{assert_pending, assert_ready};
//!
//! let harness = Harness::new();
//! let client = harness.create_client("irc.example", "bot", ClientOptions::default());
//!
//! let mut connected = client.trigger_connect();
//! assert_pending!(&mut connected);
//!
//! client.connect(None);
//! let same = assert_ready!(&mut connected);
//! assert_eq!(same, client);
//! ```

use std::future::Future;
use std::task::{Context, Poll};

/// Poll `future` a single time with a no-op waker.
///
/// Rendezvous completions settle synchronously inside the call or trigger
/// that completes them, so one poll tells whether a step has happened.
/// Pass `&mut completion` (or a pinned reference) to poll it again later.
///
/// # Example
///
/// ```rust
/// use ircmock::assertions::poll_once;
/// use ircmock::prelude::*;
///
/// let harness = Harness::new();
/// let client = harness.create_client("irc.example", "bot", ClientOptions::default());
///
/// let mut joined = client.trigger_join_for("#rust");
/// assert!(poll_once(&mut joined).is_pending());
///
/// client.join("#rust", None);
/// assert_eq!(poll_once(&mut joined), std::task::Poll::Ready(client));
/// ```
pub fn poll_once<F: Future>(future: F) -> Poll<F::Output> {
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);
    let mut pinned = std::pin::pin!(future);
    pinned.as_mut().poll(&mut cx)
}

/// Panic raised by [`assert_ready!`].
#[doc(hidden)]
pub fn unsettled(context: std::fmt::Arguments<'_>) -> ! {
    panic!("step has not completed yet{context}")
}

/// Panic raised by [`assert_pending!`].
#[doc(hidden)]
pub fn settled_early(output: &dyn std::fmt::Debug, context: std::fmt::Arguments<'_>) -> ! {
    panic!("step completed too early with {output:?}{context}")
}

/// Assert that a rendezvous step has already completed, yielding its output.
///
/// An optional format string is appended to the panic message.
///
/// # Panics
///
/// Panics if one poll leaves the future pending.
///
/// # Example
///
/// ```rust
/// use ircmock::prelude::*;
/// use ircmock::assert_ready;
///
/// let harness = Harness::new();
/// let client = harness.create_client("irc.example", "bot", ClientOptions::default());
/// client.whois("alice", None);
///
/// let same = assert_ready!(client.trigger_whois("alice", true), "whois of alice");
/// assert_eq!(same, client);
/// ```
#[macro_export]
macro_rules! assert_ready {
    ($future:expr $(,)?) => {
        $crate::assert_ready!($future, "")
    };
    ($future:expr, $($arg:tt)+) => {
        match $crate::assertions::poll_once($future) {
            ::std::task::Poll::Ready(output) => output,
            ::std::task::Poll::Pending => {
                let context = ::std::format!($($arg)+);
                let context = if context.is_empty() { context } else { ::std::format!(": {context}") };
                $crate::assertions::unsettled(::std::format_args!("{}", context))
            }
        }
    };
}

/// Assert that a rendezvous step is still waiting for its counterpart.
///
/// An optional format string is appended to the panic message.
///
/// # Panics
///
/// Panics if one poll completes the future.
///
/// # Example
///
/// ```rust
/// use ircmock::prelude::*;
/// use ircmock::assert_pending;
///
/// let harness = Harness::new();
/// let client = harness.create_client("irc.example", "bot", ClientOptions::default());
///
/// let mut connected = client.trigger_connect();
/// assert_pending!(&mut connected, "service has not connected");
/// ```
#[macro_export]
macro_rules! assert_pending {
    ($future:expr $(,)?) => {
        $crate::assert_pending!($future, "")
    };
    ($future:expr, $($arg:tt)+) => {
        match $crate::assertions::poll_once($future) {
            ::std::task::Poll::Pending => {}
            ::std::task::Poll::Ready(output) => {
                let context = ::std::format!($($arg)+);
                let context = if context.is_empty() { context } else { ::std::format!(": {context}") };
                $crate::assertions::settled_early(&output, ::std::format_args!("{}", context))
            }
        }
    };
}

/// Assert that `client` published an outbound action of `kind` with
/// exactly the given arguments on `bus`.
///
/// # Panics
///
/// Panics with the actions the client did publish when no match exists.
///
/// # Example
///
/// ```rust
/// use ircmock::prelude::*;
/// use ircmock::assert_published;
///
/// let harness = Harness::new();
/// let client = harness.create_client("irc.example", "bot", ClientOptions::default());
/// client.ctcp("#rust", "privmsg", "VERSION");
///
/// assert_published!(harness.bus(), OutboundKind::Ctcp, &client, "#rust", "privmsg", "VERSION");
/// ```
#[macro_export]
macro_rules! assert_published {
    ($bus:expr, $kind:expr, $client:expr, $($arg:expr),+ $(,)?) => {{
        if let ::std::result::Result::Err(err) =
            $bus.expect_published($kind, $client, &[$($arg),+])
        {
            panic!("{}", err);
        }
    }};
}
