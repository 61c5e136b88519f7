//! Chat fan-out between connected players.

mod common;

use common::{test_server, two_room_world, TestClient};

#[tokio::test]
async fn say_reaches_every_session_once() {
    let (_dir, server) = test_server(two_room_world());

    let mut alice = TestClient::connect(&server);
    alice.create("alice", "Alice", "RoomAIntro").await;
    let mut bob = TestClient::connect(&server);
    bob.create("bob", "Bob", "RoomAIntro").await;
    let mut carol = TestClient::connect(&server);
    carol.create("carol", "Carol", "RoomAIntro").await;

    alice.send("say hello").await;
    alice.send("say done").await;

    for client in [&mut alice, &mut bob, &mut carol] {
        let first = client.expect("Alice: hello\n\r").await;
        assert!(!first.contains("Alice: done"));
        let between = client.expect("Alice: done\n\r").await;
        assert!(!between.contains("hello"), "exactly one copy, got {between:?}");
    }

    let stats = server.hub().snapshot().await.unwrap();
    assert_eq!(stats.registered, 3);
    assert_eq!(stats.published_total, 2);
    assert_eq!(stats.delivered_total, 6);
}

#[tokio::test]
async fn leaving_is_announced_to_the_others() {
    let (_dir, server) = test_server(two_room_world());

    let mut alice = TestClient::connect(&server);
    alice.create("alice", "Alice", "RoomAIntro").await;
    let mut bob = TestClient::connect(&server);
    bob.create("bob", "Bob", "RoomAIntro").await;

    alice.send("quit").await;
    let farewell = alice.read_to_close().await;
    assert!(farewell.ends_with("Good bye Alice\n\r"));
    assert!(!farewell.contains("left the chat room"));
    alice.finish().await.unwrap();

    bob.expect("User alice left the chat room.\n\r").await;
    assert_eq!(server.hub().snapshot().await.unwrap().registered, 1);
}

#[tokio::test]
async fn empty_say_is_not_broadcast() {
    let (_dir, server) = test_server(two_room_world());
    let mut alice = TestClient::connect(&server);
    alice.create("alice", "Alice", "RoomAIntro").await;

    alice.send("say").await;
    alice.send("say   ").await;
    alice.send("look").await;
    alice.expect("You are at RoomA\n\r").await;
    assert_eq!(server.hub().snapshot().await.unwrap().published_total, 0);
}
