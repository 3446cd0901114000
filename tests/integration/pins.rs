use crate::common::{create_channel, send_message, test_client};
use rocket::http::Status;

#[test]
fn test_pin_message() {
    let client = test_client();
    let channel_id = create_channel(&client, "pin-test");
    let msg = send_message(&client, &channel_id, "alice", "Important announcement!");
    let msg_id = msg["id"].as_str().unwrap();

    let res = client
        .put(format!(
            "/api/channels/{channel_id}/messages/{msg_id}/pin?pinned=true&pinned_by=admin"
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["id"], msg_id);
    assert_eq!(body["is_pinned"], true);
    assert!(body["pinned_at"].as_str().is_some());
    assert_eq!(body["pinned_by"], "admin");
}

#[test]
fn test_pin_message_not_found() {
    let client = test_client();
    let channel_id = create_channel(&client, "pin-404-test");
    let res = client
        .put(format!(
            "/api/channels/{channel_id}/messages/nonexistent-id/pin?pinned=true"
        ))
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_unpin_message() {
    let client = test_client();
    let channel_id = create_channel(&client, "unpin-test");
    let msg = send_message(&client, &channel_id, "alice", "Pinned then unpinned");
    let msg_id = msg["id"].as_str().unwrap();

    client
        .put(format!(
            "/api/channels/{channel_id}/messages/{msg_id}/pin?pinned=true&pinned_by=admin"
        ))
        .dispatch();

    let res = client
        .put(format!(
            "/api/channels/{channel_id}/messages/{msg_id}/pin?pinned=false"
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["is_pinned"], false);
    assert!(body.get("pinned_at").is_none() || body["pinned_at"].is_null());
}

#[test]
fn test_list_pins() {
    let client = test_client();
    let channel_id = create_channel(&client, "list-pins-test");
    let msg1 = send_message(&client, &channel_id, "alice", "First pinned");
    let msg1_id = msg1["id"].as_str().unwrap().to_string();
    send_message(&client, &channel_id, "bob", "Not pinned");
    let msg3 = send_message(&client, &channel_id, "alice", "Second pinned");
    let msg3_id = msg3["id"].as_str().unwrap().to_string();

    client
        .put(format!(
            "/api/channels/{channel_id}/messages/{msg1_id}/pin?pinned=true"
        ))
        .dispatch();
    client
        .put(format!(
            "/api/channels/{channel_id}/messages/{msg3_id}/pin?pinned=true"
        ))
        .dispatch();

    let res = client
        .get(format!("/api/channels/{channel_id}/pins"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let pins: Vec<serde_json::Value> = res.into_json().unwrap();
    assert_eq!(pins.len(), 2);
}

#[test]
fn test_list_pins_empty() {
    let client = test_client();
    let channel_id = create_channel(&client, "list-pins-empty-test");
    send_message(&client, &channel_id, "alice", "No pins here");

    let res = client
        .get(format!("/api/channels/{channel_id}/pins"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let pins: Vec<serde_json::Value> = res.into_json().unwrap();
    assert_eq!(pins.len(), 0);
}

#[test]
fn test_pin_then_unpin_clears_fields() {
    let client = test_client();
    let channel_id = create_channel(&client, "pin-unpin-clear-test");
    let msg = send_message(&client, &channel_id, "alice", "Pin and unpin me");
    let msg_id = msg["id"].as_str().unwrap();

    client
        .put(format!(
            "/api/channels/{channel_id}/messages/{msg_id}/pin?pinned=true"
        ))
        .dispatch();
    client
        .put(format!(
            "/api/channels/{channel_id}/messages/{msg_id}/pin?pinned=false"
        ))
        .dispatch();

    let res = client
        .get(format!("/api/channels/{channel_id}/messages"))
        .dispatch();
    let messages: Vec<serde_json::Value> = res.into_json().unwrap();
    let msg = messages.iter().find(|m| m["id"] == msg_id).unwrap();
    assert!(msg.get("pinned_at").is_none() || msg["pinned_at"].is_null());
    assert!(msg.get("pinned_by").is_none() || msg["pinned_by"].is_null());
}
