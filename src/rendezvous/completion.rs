//! One-shot completions.
//!
//! A [`Completion`] is the future handed back to test code by triggers and
//! asynchronous lookups. It settles when the paired [`Completer`] is
//! resolved, which only ever happens as a side effect of some later call
//! into the mock. There is no timeout and no cancellation: a completer that
//! is dropped without resolving leaves its completion pending forever.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

struct Shared<T> {
    value: Option<T>,
    waker: Option<Waker>,
}

/// Creates a linked completer/completion pair.
///
/// # Example
///
/// ```rust
/// use ircmock::rendezvous::completion;
/// use ircmock::assertions::poll_once;
/// use std::task::Poll;
///
/// let (completer, mut done) = completion::<u32>();
/// assert!(poll_once(&mut done).is_pending());
///
/// completer.resolve(7);
/// assert_eq!(poll_once(&mut done), Poll::Ready(7));
/// ```
pub fn completion<T>() -> (Completer<T>, Completion<T>) {
    let shared = Arc::new(Mutex::new(Shared {
        value: None,
        waker: None,
    }));
    (
        Completer {
            shared: Arc::clone(&shared),
        },
        Completion { shared },
    )
}

/// The resolving half of a [`completion`] pair.
pub struct Completer<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Completer<T> {
    /// Settles the paired completion with `value` and wakes its task.
    pub fn resolve(self, value: T) {
        let waker = {
            let mut shared = self.shared.lock();
            shared.value = Some(value);
            shared.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Whether the completion side is still held by someone.
    #[must_use]
    pub fn is_awaited(&self) -> bool {
        Arc::strong_count(&self.shared) > 1
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("awaited", &self.is_awaited())
            .finish()
    }
}

/// A future that settles exactly once, when its [`Completer`] resolves.
#[must_use = "completions do nothing unless awaited or polled"]
pub struct Completion<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Completion<T> {
    /// An already-settled completion.
    pub fn ready(value: T) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                value: Some(value),
                waker: None,
            })),
        }
    }

    /// Whether the value has been delivered (and not yet taken by a poll).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.shared.lock().value.is_some()
    }
}

impl<T> Future for Completion<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut shared = self.shared.lock();
        match shared.value.take() {
            Some(value) => Poll::Ready(value),
            None => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("settled", &self.is_settled())
            .finish()
    }
}
