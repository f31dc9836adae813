//! Keyed call/trigger rendezvous.
//!
//! A [`SlotTable`] holds one [`Slot`] per key. Each slot pairs the arrival of
//! a callback-style call (the service invoked the operation) with the arrival
//! of a trigger (the test supplied the result), whichever comes first.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use super::completion::{completion, Completer, Completion};

/// A completion callback handed to an asynchronous operation.
pub type Callback<P> = Box<dyn FnOnce(P) + Send + 'static>;

/// Boxes a closure as a [`Callback`].
pub fn callback<P, F>(f: F) -> Option<Callback<P>>
where
    F: FnOnce(P) + Send + 'static,
{
    Some(Box::new(f))
}

/// State of a single rendezvous cycle.
///
/// The two waiting states are mutually exclusive: whichever side arrives
/// second consumes the other's state and the slot returns to [`Slot::Empty`].
/// A [`SlotTable`] drops settled slots instead of keeping them empty.
pub enum Slot<P, O> {
    /// Nothing pending.
    Empty,
    /// The operation was called; callbacks wait for a trigger. `None`
    /// entries are calls made without a callback.
    WaitingForTrigger(Vec<Option<Callback<P>>>),
    /// A trigger arrived first; its payload waits for a call.
    WaitingForCall {
        /// Payload to hand to the next callback.
        payload: P,
        /// Settles the trigger's completion with the owner.
        completer: Completer<O>,
    },
}

impl<P, O> Default for Slot<P, O> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Observable summary of a slot, for assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No pending call or trigger.
    Empty,
    /// Calls are queued; the value is the number of queued calls.
    WaitingForTrigger(usize),
    /// A trigger is armed and waits for a call.
    WaitingForCall,
}

impl<P, O> Slot<P, O> {
    fn state(&self) -> SlotState {
        match self {
            Self::Empty => SlotState::Empty,
            Self::WaitingForTrigger(queue) => SlotState::WaitingForTrigger(queue.len()),
            Self::WaitingForCall { .. } => SlotState::WaitingForCall,
        }
    }
}

/// What happened when a call arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// A trigger was waiting; the callback ran and the trigger settled.
    Settled,
    /// No trigger yet; the call is queued behind `n` calls in total.
    Queued(usize),
}

/// A family of rendezvous slots for one operation, keyed by an
/// operation-specific key.
///
/// `P` is the payload delivered to callbacks, `O` the owner value a
/// trigger's completion resolves with.
pub struct SlotTable<P, O> {
    operation: &'static str,
    slots: Mutex<HashMap<String, Slot<P, O>>>,
}

impl<P, O> SlotTable<P, O>
where
    P: Clone,
    O: Clone,
{
    /// Creates an empty table labelled with the operation name.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Records that the operation was called for `key`.
    ///
    /// If a trigger is waiting, `callback` runs immediately with the armed
    /// payload and the trigger's completion resolves with `owner`, in that
    /// order. Otherwise the callback is queued.
    pub fn arrive(&self, key: &str, callback: Option<Callback<P>>, owner: &O) -> Arrival {
        let armed = {
            let mut slots = self.slots.lock();
            match slots.remove(key).unwrap_or_default() {
                Slot::WaitingForCall { payload, completer } => {
                    Ok((payload, completer, callback))
                }
                Slot::WaitingForTrigger(mut queue) => {
                    queue.push(callback);
                    let queued = queue.len();
                    slots.insert(key.to_owned(), Slot::WaitingForTrigger(queue));
                    Err(queued)
                }
                Slot::Empty => {
                    slots.insert(key.to_owned(), Slot::WaitingForTrigger(vec![callback]));
                    Err(1)
                }
            }
        };

        match armed {
            Ok((payload, completer, callback)) => {
                tracing::debug!(operation = self.operation, key, "call met armed trigger");
                if let Some(callback) = callback {
                    callback(payload);
                }
                completer.resolve(owner.clone());
                Arrival::Settled
            }
            Err(queued) => {
                tracing::trace!(operation = self.operation, key, queued, "call queued");
                Arrival::Queued(queued)
            }
        }
    }

    /// Forces completion of the operation for `key` with `payload`.
    ///
    /// Queued callbacks run in call order and an already-settled completion
    /// is returned. With nothing queued, the payload is armed and the
    /// returned completion settles on the next call. Re-arming a slot that
    /// is already waiting for a call replaces the earlier payload; the
    /// earlier completion then never settles.
    pub fn trigger(&self, key: &str, payload: P, owner: &O) -> Completion<O> {
        let queued = {
            let mut slots = self.slots.lock();
            match slots.remove(key).unwrap_or_default() {
                Slot::WaitingForTrigger(queue) => Ok((queue, payload)),
                previous => {
                    if matches!(previous, Slot::WaitingForCall { .. }) {
                        tracing::debug!(
                            operation = self.operation,
                            key,
                            "trigger re-armed, replacing pending payload"
                        );
                    }
                    let (completer, done) = completion();
                    slots.insert(
                        key.to_owned(),
                        Slot::WaitingForCall {
                            payload,
                            completer,
                        },
                    );
                    Err(done)
                }
            }
        };

        match queued {
            Ok((queue, payload)) => {
                tracing::debug!(
                    operation = self.operation,
                    key,
                    callbacks = queue.len(),
                    "trigger met queued calls"
                );
                for callback in queue.into_iter().flatten() {
                    callback(payload.clone());
                }
                Completion::ready(owner.clone())
            }
            Err(done) => {
                tracing::trace!(operation = self.operation, key, "trigger armed");
                done
            }
        }
    }

    /// Current state of the slot for `key`.
    pub fn state(&self, key: &str) -> SlotState {
        self.slots
            .lock()
            .get(key)
            .map_or(SlotState::Empty, Slot::state)
    }

    /// Keys with a non-empty slot, sorted.
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| !matches!(slot, Slot::Empty))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Name of the operation this table serves.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl<P, O> fmt::Debug for SlotTable<P, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock();
        let states: HashMap<&str, SlotState> = slots
            .iter()
            .map(|(key, slot)| (key.as_str(), slot.state()))
            .collect();
        f.debug_struct("SlotTable")
            .field("operation", &self.operation)
            .field("slots", &states)
            .finish()
    }
}
