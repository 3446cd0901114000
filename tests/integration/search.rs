use crate::common::{create_channel, send_message, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn test_search_word_matching() {
    let client = test_client();
    let channel_id = create_channel(&client, "fts-word-match");

    send_message(&client, &channel_id, "Nanook", "The frobulation process completed successfully");
    send_message(&client, &channel_id, "Forge", "Starting frobulation on all servers now");
    send_message(&client, &channel_id, "Drift", "The weather is nice today");

    let res = client.get("/api/search?q=frobulation").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 2);

    let res = client.get("/api/search?q=weather").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);
}

#[test]
fn test_search_requires_query() {
    let client = test_client();
    let res = client.get("/api/search?q=").dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_search_edited_message_reindexes() {
    let client = test_client();
    let channel_id = create_channel(&client, "fts-edit");

    let msg = send_message(&client, &channel_id, "Nanook", "original content here");
    let msg_id = msg["id"].as_str().unwrap();

    let res = client.get("/api/search?q=original").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);

    client
        .put(format!("/api/channels/{channel_id}/messages/{msg_id}"))
        .header(ContentType::JSON)
        .body(r#"{"sender_name": "Nanook", "content": "updated content instead"}"#)
        .dispatch();

    let res = client.get("/api/search?q=original").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 0);

    let res = client.get("/api/search?q=updated").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);
}

#[test]
fn test_search_deleted_message_is_removed() {
    let client = test_client();
    let channel_id = create_channel(&client, "fts-delete");

    let msg = send_message(&client, &channel_id, "Nanook", "ephemeral message to delete");
    let msg_id = msg["id"].as_str().unwrap();

    let res = client.get("/api/search?q=ephemeral").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);

    client
        .delete(format!(
            "/api/channels/{channel_id}/messages/{msg_id}?sender_name=Nanook"
        ))
        .dispatch();

    let res = client.get("/api/search?q=ephemeral").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 0);
}

#[test]
fn test_search_scoped_to_channel() {
    let client = test_client();
    let channel_a = create_channel(&client, "fts-channel-a");
    let channel_b = create_channel(&client, "fts-channel-b");

    send_message(&client, &channel_a, "Nanook", "unique-term-alpha shared");
    send_message(&client, &channel_b, "Forge", "unique-term-alpha shared");

    let encoded_channel = urlencoding::encode("#fts-channel-a");
    let res = client
        .get(format!("/api/search?q=unique-term-alpha&channel={encoded_channel}"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"].as_u64().unwrap(), 1);
}
