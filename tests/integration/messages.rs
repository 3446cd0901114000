use crate::common::{create_channel, send_message, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn test_send_and_get_messages() {
    let client = test_client();
    let channel_id = create_channel(&client, "msg-test");

    let msg = send_message(&client, &channel_id, "nanook", "Hello world!");
    assert_eq!(msg["sender_name"], "nanook");
    assert_eq!(msg["content"], "Hello world!");
    assert_eq!(msg["channel_id"], channel_id);

    let res = client
        .get(format!("/api/channels/{channel_id}/messages"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let msgs: Vec<serde_json::Value> = res.into_json().unwrap();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0]["content"], "Hello world!");
}

#[test]
fn test_send_message_nonexistent_channel() {
    let client = test_client();
    let res = client
        .post("/api/channels/fake-channel/messages")
        .header(ContentType::JSON)
        .body(r#"{"sender_name": "nanook", "content": "Hello!"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_messages_limit() {
    let client = test_client();
    let channel_id = create_channel(&client, "limit-test");
    for i in 0..5 {
        send_message(&client, &channel_id, "bot", &format!("msg {i}"));
    }

    let res = client
        .get(format!("/api/channels/{channel_id}/messages?limit=2"))
        .dispatch();
    let msgs: Vec<serde_json::Value> = res.into_json().unwrap();
    assert_eq!(msgs.len(), 2);
}

#[test]
fn test_messages_returned_in_chronological_order() {
    let client = test_client();
    let channel_id = create_channel(&client, "order-test");
    for i in 1..=5 {
        send_message(&client, &channel_id, "bot", &format!("Message {i}"));
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    let res = client
        .get(format!("/api/channels/{channel_id}/messages"))
        .dispatch();
    let msgs: Vec<serde_json::Value> = res.into_json().unwrap();
    assert_eq!(msgs.len(), 5);
    for (i, msg) in msgs.iter().enumerate() {
        assert_eq!(msg["content"], format!("Message {}", i + 1));
    }
}

#[test]
fn test_edit_message() {
    let client = test_client();
    let channel_id = create_channel(&client, "edit-test");
    let msg = send_message(&client, &channel_id, "TestBot", "Original content");
    let msg_id = msg["id"].as_str().unwrap();
    assert!(msg.get("edited_at").is_none() || msg["edited_at"].is_null());

    let res = client
        .put(format!("/api/channels/{channel_id}/messages/{msg_id}"))
        .header(ContentType::JSON)
        .body(r#"{"sender_name":"TestBot","content":"Edited content"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let edited: serde_json::Value = res.into_json().unwrap();
    assert_eq!(edited["content"], "Edited content");
    assert!(edited["edited_at"].is_string());
}

#[test]
fn test_edit_message_wrong_sender() {
    let client = test_client();
    let channel_id = create_channel(&client, "edit-wrong-sender");
    let msg = send_message(&client, &channel_id, "BotA", "Hello");
    let msg_id = msg["id"].as_str().unwrap();

    let res = client
        .put(format!("/api/channels/{channel_id}/messages/{msg_id}"))
        .header(ContentType::JSON)
        .body(r#"{"sender_name":"BotB","content":"Hijacked!"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Forbidden);
}

#[test]
fn test_edit_message_not_found() {
    let client = test_client();
    let channel_id = create_channel(&client, "edit-not-found");
    let res = client
        .put(format!("/api/channels/{channel_id}/messages/nonexistent"))
        .header(ContentType::JSON)
        .body(r#"{"sender_name":"Bot","content":"Edit ghost"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_delete_message_by_sender() {
    let client = test_client();
    let channel_id = create_channel(&client, "delete-test");
    let msg = send_message(&client, &channel_id, "Bot", "Delete me");
    let msg_id = msg["id"].as_str().unwrap();

    let res = client
        .delete(format!("/api/channels/{channel_id}/messages/{msg_id}?sender_name=Bot"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["deleted"], true);

    let res = client
        .get(format!("/api/channels/{channel_id}/messages"))
        .dispatch();
    let msgs: Vec<serde_json::Value> = res.into_json().unwrap();
    assert!(msgs.iter().all(|m| m["id"] != msg_id));
}

#[test]
fn test_delete_message_wrong_sender() {
    let client = test_client();
    let channel_id = create_channel(&client, "delete-wrong-sender");
    let msg = send_message(&client, &channel_id, "BotA", "My message");
    let msg_id = msg["id"].as_str().unwrap();

    let res = client
        .delete(format!("/api/channels/{channel_id}/messages/{msg_id}?sender_name=BotB"))
        .dispatch();
    assert_eq!(res.status(), Status::Forbidden);
}

#[test]
fn test_reply_to_sets_parent_id() {
    let client = test_client();
    let channel_id = create_channel(&client, "reply-test");
    let parent = send_message(&client, &channel_id, "a", "Original");
    let parent_id = parent["id"].as_str().unwrap();

    let res = client
        .post(format!("/api/channels/{channel_id}/messages"))
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"sender_name": "b", "content": "a reply", "reply_to": "{parent_id}"}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Created);
    let reply: serde_json::Value = res.into_json().unwrap();
    assert_eq!(reply["parent_id"], parent_id);
}
