//! Integration tests for the `#[ircmock::test]` macro.

#![cfg(feature = "macros")]

use ircmock::prelude::*;

/// Basic test without harness injection.
#[ircmock::test]
async fn test_basic_async() {
    let harness = Harness::new();
    assert!(harness.registry().is_empty());
}

/// Test with Harness injection.
#[ircmock::test]
async fn test_with_harness(harness: Harness) {
    assert!(harness.config().history);

    let client = harness.create_client("irc.example", "bot", ClientOptions::default());
    assert_eq!(harness.find_client("irc.example", "bot"), Some(client));
}

/// Each test gets its own harness, so this identity is never pre-registered.
#[ircmock::test]
async fn test_fresh_harness_per_test(harness: Harness) {
    assert!(harness.find_client("irc.example", "bot").is_none());
    harness.create_client("irc.example", "bot", ClientOptions::default());
}

/// Test with history disabled.
#[ircmock::test(history = false)]
async fn test_without_history(harness: Harness) {
    let client = harness.create_client("irc.example", "bot", ClientOptions::default());
    let mut sub = harness.bus().subscribe();

    client.say("#a", "hi");

    assert!(harness.bus().history().is_empty());
    assert_eq!(sub.recv().await.unwrap().args(), vec!["#a", "hi"]);
}

/// Test with tracing installed.
#[ircmock::test(trace = true)]
async fn test_traced(harness: Harness) {
    let client = harness.create_client("irc.example", "bot", ClientOptions::default());
    client.connect(None);
    let connected = client.trigger_connect().await;
    assert_eq!(connected, client);
}

/// Test with multi_thread flavor.
#[ircmock::test(flavor = "multi_thread")]
async fn test_multi_thread(harness: Harness) {
    let joined = tokio::spawn(harness.let_nick_join_channel("irc.example", "carol", "#general"));

    let service = harness.clone();
    tokio::spawn(async move {
        let client = service.create_client("irc.example", "carol", ClientOptions::default());
        client.connect(callback(move |()| {}));
        client.join("#general", None);
    })
    .await
    .unwrap();

    let client = joined.await.unwrap();
    assert_eq!(client.nickname(), "carol");
}
