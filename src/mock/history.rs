// Allow must_use_candidate since history accessors are mostly used in asserts
#![allow(clippy::must_use_candidate)]

//! Call history for mocked methods.
//!
//! [`CallLog`] records the arguments of every invocation of a mocked
//! method, in call order, so tests can assert on what the service did.
//!
//! # Example
//!
//! ```rust
//! use ircmock::mock::CallLog;
//!
//! let log = CallLog::new();
//! log.record(("#rust".to_string(), "hi".to_string()));
//!
//! assert!(log.was_called());
//! assert_eq!(log.last_args().unwrap().0, "#rust");
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<A> {
    /// The arguments passed to the call.
    pub args: A,
    /// Position of this call among all calls sharing the same sequence
    /// counter (one counter per mock client).
    pub seq: u64,
}

/// Records the arguments of each call to one method.
pub struct CallLog<A> {
    calls: Mutex<Vec<Invocation<A>>>,
    sequence: Arc<AtomicU64>,
}

impl<A: Clone> CallLog<A> {
    /// Create a log with its own sequence counter.
    pub fn new() -> Self {
        Self::with_sequence(Arc::new(AtomicU64::new(0)))
    }

    /// Create a log that draws sequence numbers from a shared counter, so
    /// calls to different methods of one client can be ordered.
    pub fn with_sequence(sequence: Arc<AtomicU64>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sequence,
        }
    }

    /// Record a call with the given arguments.
    pub fn record(&self, args: A) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(Invocation { args, seq });
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<Invocation<A>> {
        self.calls.lock().clone()
    }

    /// Arguments of all recorded calls, oldest first.
    pub fn all_args(&self) -> Vec<A> {
        self.calls.lock().iter().map(|c| c.args.clone()).collect()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Check if any call was recorded.
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Check if called exactly N times.
    pub fn was_called_times(&self, n: usize) -> bool {
        self.call_count() == n
    }

    /// The Nth recorded call (0-indexed).
    pub fn nth_call(&self, n: usize) -> Option<Invocation<A>> {
        self.calls.lock().get(n).cloned()
    }

    /// Arguments of the most recent call.
    pub fn last_args(&self) -> Option<A> {
        self.calls.lock().last().map(|c| c.args.clone())
    }

    /// Check if any call had exactly these arguments.
    pub fn was_called_with(&self, expected: &A) -> bool
    where
        A: PartialEq,
    {
        self.calls.lock().iter().any(|c| &c.args == expected)
    }

    /// Forget all recorded calls.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

impl<A: Clone> Default for CallLog<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Debug> Debug for CallLog<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let calls = self.calls.lock();
        f.debug_struct("CallLog")
            .field("call_count", &calls.len())
            .field("calls", &*calls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log() {
        let log = CallLog::<String>::new();

        assert!(!log.was_called());
        assert!(log.was_called_times(0));
        assert!(log.last_args().is_none());
        assert!(log.nth_call(0).is_none());
    }

    #[test]
    fn test_records_in_order() {
        let log = CallLog::new();
        log.record("a");
        log.record("b");
        log.record("c");

        assert_eq!(log.call_count(), 3);
        assert_eq!(log.all_args(), vec!["a", "b", "c"]);
        assert_eq!(log.nth_call(1).unwrap().args, "b");
        assert_eq!(log.last_args(), Some("c"));
        assert!(log.was_called_with(&"a"));
        assert!(!log.was_called_with(&"z"));
    }

    #[test]
    fn test_shared_sequence_orders_logs() {
        let seq = Arc::new(AtomicU64::new(0));
        let joins = CallLog::with_sequence(Arc::clone(&seq));
        let says = CallLog::with_sequence(seq);

        joins.record("#a");
        says.record("hello");
        joins.record("#b");

        assert_eq!(joins.nth_call(0).unwrap().seq, 0);
        assert_eq!(says.nth_call(0).unwrap().seq, 1);
        assert_eq!(joins.nth_call(1).unwrap().seq, 2);
    }

    #[test]
    fn test_reset() {
        let log = CallLog::new();
        log.record(1);
        log.reset();

        assert!(!log.was_called());
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_debug() {
        let log = CallLog::new();
        log.record(42);

        let debug = format!("{log:?}");
        assert!(debug.contains("CallLog"));
        assert!(debug.contains("call_count"));
    }
}
