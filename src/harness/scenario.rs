//! Scenario helpers built from lookups and triggers.
//!
//! Each helper issues its first step eagerly (the registry lookup is
//! registered before the helper returns) and chains the remaining triggers
//! when awaited. Every step waits for its counterpart in the service; if the
//! service never creates the client or never makes the call, the returned
//! future never settles. Bound it with the test's own timeout.

use std::future::Future;

use super::Harness;
use crate::mock::MockClient;

/// Wait for the client `(address, nickname)` to exist, then complete its
/// `connect` call. Resolves with the client.
pub fn let_nick_connect(
    harness: &Harness,
    address: &str,
    nickname: &str,
) -> impl Future<Output = MockClient> + Send + 'static {
    let lookup = harness.find_client_async(address, nickname);
    async move {
        let client = lookup.await;
        client.trigger_connect().await
    }
}

/// Wait for the client `(address, nickname)` to exist, complete its
/// `connect` call, then complete its `join` of `channel`. Resolves with the
/// client once all three steps happened, in that order.
///
/// # Example
///
/// ```rust
/// use ircmock::prelude::*;
///
/// # futures::executor::block_on(async {
/// let harness = Harness::new();
/// let joined = harness.let_nick_join_channel("irc.example", "carol", "#general");
///
/// // What the service would do:
/// let client = harness.create_client("irc.example", "carol", ClientOptions::default());
/// client.connect(None);
/// client.join("#general", None);
///
/// assert_eq!(joined.await, client);
/// # });
/// ```
pub fn let_nick_join_channel(
    harness: &Harness,
    address: &str,
    nickname: &str,
    channel: &str,
) -> impl Future<Output = MockClient> + Send + 'static {
    let connected = let_nick_connect(harness, address, nickname);
    let channel = channel.to_owned();
    async move {
        let client = connected.await;
        client.trigger_join_for(&channel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::poll_once;
    use crate::mock::{ClientOptions, IrcClient, Operation};
    use crate::rendezvous::{callback, SlotState};
    use std::pin::pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_join_waits_for_each_step() {
        let harness = Harness::new();
        let mut joined = pin!(let_nick_join_channel(&harness, "host1", "carol", "#general"));
        assert!(poll_once(joined.as_mut()).is_pending());

        let client = harness.create_client("host1", "carol", ClientOptions::default());
        assert!(poll_once(joined.as_mut()).is_pending());

        client.connect(None);
        assert!(poll_once(joined.as_mut()).is_pending());

        let joined_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&joined_flag);
        client.join("#general", callback(move |()| flag.store(true, Ordering::SeqCst)));

        assert!(joined_flag.load(Ordering::SeqCst));
        assert_eq!(poll_once(joined.as_mut()), std::task::Poll::Ready(client));
    }

    #[test]
    fn test_service_first_interleaving() {
        let harness = Harness::new();
        let client = harness.create_client("host1", "carol", ClientOptions::default());
        client.connect(None);
        client.join("#general", None);

        let joined = let_nick_join_channel(&harness, "host1", "carol", "#general");
        assert_eq!(futures::executor::block_on(joined), client);
        assert_eq!(client.slot_state(Operation::Connect, ""), SlotState::Empty);
        assert_eq!(client.slot_state(Operation::Join, "#general"), SlotState::Empty);
    }

    #[test]
    fn test_connect_called_first_join_triggered_first() {
        let harness = Harness::new();
        let client = harness.create_client("host1", "carol", ClientOptions::default());
        client.connect(None);

        let mut joined = pin!(let_nick_join_channel(&harness, "host1", "carol", "#general"));
        assert!(poll_once(joined.as_mut()).is_pending());
        assert_eq!(client.slot_state(Operation::Connect, ""), SlotState::Empty);
        assert_eq!(client.slot_state(Operation::Join, "#general"), SlotState::WaitingForCall);

        client.join("#general", None);
        assert_eq!(poll_once(joined.as_mut()), std::task::Poll::Ready(client.clone()));
        assert_eq!(client.slot_state(Operation::Join, "#general"), SlotState::Empty);
    }

    #[test]
    fn test_connect_triggered_first_join_called_first() {
        let harness = Harness::new();
        let mut joined = pin!(let_nick_join_channel(&harness, "host1", "carol", "#general"));
        assert!(poll_once(joined.as_mut()).is_pending());

        let client = harness.create_client("host1", "carol", ClientOptions::default());
        client.join("#general", None);
        assert!(poll_once(joined.as_mut()).is_pending());
        assert_eq!(client.slot_state(Operation::Connect, ""), SlotState::WaitingForCall);
        assert_eq!(client.slot_state(Operation::Join, "#general"), SlotState::WaitingForTrigger(1));

        client.connect(None);
        assert_eq!(poll_once(joined.as_mut()), std::task::Poll::Ready(client.clone()));
        assert_eq!(client.slot_state(Operation::Join, "#general"), SlotState::Empty);
    }

    #[test]
    fn test_other_channel_does_not_complete() {
        let harness = Harness::new();
        let mut joined = pin!(let_nick_join_channel(&harness, "host1", "carol", "#general"));

        let client = harness.create_client("host1", "carol", ClientOptions::default());
        client.connect(None);
        client.join("#random", None);

        assert!(poll_once(joined.as_mut()).is_pending());
    }

    #[tokio::test]
    async fn test_connect_helper_spawned() {
        let harness = Harness::new();
        let handle = tokio::spawn(harness.let_nick_connect("host1", "dave"));

        let client = harness.create_client("host1", "dave", ClientOptions::default());
        client.connect(None);

        assert_eq!(handle.await.unwrap(), client);
    }
}
