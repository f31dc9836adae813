//! Call/trigger rendezvous.
//!
//! The service under test calls an asynchronous operation with a completion
//! callback; the test triggers the result. Either can happen first:
//!
//! - call, then trigger: the callback is queued and runs inside the trigger,
//!   which returns an already-settled [`Completion`].
//! - trigger, then call: the payload is armed and the callback runs inside
//!   the call, which also settles the completion the trigger returned.
//!
//! ```rust
//! use ircmock::rendezvous::{callback, SlotTable};
//! use ircmock::assertions::poll_once;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! let table = SlotTable::<(), &str>::new("connect");
//! let mut done = table.trigger("_", (), &"client");
//! assert!(poll_once(&mut done).is_pending());
//!
//! let called = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&called);
//! table.arrive("_", callback(move |()| flag.store(true, Ordering::SeqCst)), &"client");
//!
//! assert!(called.load(Ordering::SeqCst));
//! assert!(poll_once(&mut done).is_ready());
//! ```
//!
//! Nothing here times out. Callers that may wait on a rendezvous that never
//! happens should bound the wait themselves, e.g. with `tokio::time::timeout`.

mod completion;
mod slot;

pub use completion::{completion, Completer, Completion};
pub use slot::{callback, Arrival, Callback, Slot, SlotState, SlotTable};
