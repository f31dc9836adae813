//! The fake client and its bookkeeping.
//!
//! - [`MockClient`] - one fake client per `(address, nickname)` identity
//! - [`IrcClient`] - the client surface the service under test calls
//! - [`ClientOptions`] - options the service passes when creating a client
//! - [`CallLog`] - per-method call history for assertions
//!
//! # Driving a client
//!
//! ```rust
//! use ircmock::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let harness = Harness::new();
//! let client = harness.create_client("irc.example", "bot", ClientOptions::default());
//!
//! // The service looks somebody up...
//! let reply = Arc::new(Mutex::new(None));
//! let sink = Arc::clone(&reply);
//! client.whois("bob", callback(move |info: WhoisInfo| {
//!     *sink.lock().unwrap() = Some(info.identity_present());
//! }));
//!
//! // ...and the test answers.
//! let _ = client.trigger_whois("bob", false);
//! assert_eq!(*reply.lock().unwrap(), Some(false));
//! assert!(client.calls().whois.was_called_with(&"bob".to_string()));
//! ```

mod client;
mod history;
mod options;

pub use client::{
    listener, ClientCalls, IrcClient, Listener, MockClient, Operation, WhoisInfo, CONNECT_KEY,
};
pub use history::{CallLog, Invocation};
pub use options::ClientOptions;
