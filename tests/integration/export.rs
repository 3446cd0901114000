use crate::common::{create_channel, send_message, test_client};
use rocket::http::Status;

#[test]
fn test_export_json_default() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-json");

    send_message(&client, &channel_id, "alice", "Hello world");
    send_message(&client, &channel_id, "bob", "Hi alice!");

    let res = client
        .get(format!("/api/channels/{channel_id}/export"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["channel_name"], "#export-json");
    assert_eq!(body["channel_id"], channel_id);
    assert_eq!(body["message_count"], 2);
    assert!(body["exported_at"].is_string());

    let msgs = body["messages"].as_array().unwrap();
    assert_eq!(msgs[0]["sender_name"], "alice");
    assert_eq!(msgs[1]["sender_name"], "bob");
    let seq0 = msgs[0]["seq"].as_i64().unwrap();
    let seq1 = msgs[1]["seq"].as_i64().unwrap();
    assert!(seq1 > seq0);
}

#[test]
fn test_export_markdown() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-md");

    send_message(&client, &channel_id, "alice", "Hello from alice");
    send_message(&client, &channel_id, "bob", "Reply from bob");

    let res = client
        .get(format!("/api/channels/{channel_id}/export?format=markdown"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let content_type = res.content_type().unwrap();
    assert_eq!(content_type.top().as_str(), "text");
    assert_eq!(content_type.sub().as_str(), "markdown");

    let body = res.into_string().unwrap();
    assert!(body.contains("# ##export-md"));
    assert!(body.contains("alice"));
    assert!(body.contains("Hello from alice"));
    assert!(body.contains("(agent)"));
}

#[test]
fn test_export_csv() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-csv");

    send_message(&client, &channel_id, "alice", "message one");
    send_message(&client, &channel_id, "bob", "message two");

    let res = client
        .get(format!("/api/channels/{channel_id}/export?format=csv"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let content_type = res.content_type().unwrap();
    assert!(content_type.to_string().starts_with("text/csv"));

    let body = res.into_string().unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(
        lines[0],
        "seq,sender,sender_type,content,created_at,edited_at,parent_id,is_pinned"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("alice"));
    assert!(lines[1].contains("message one"));
}

#[test]
fn test_export_sender_filter() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-filter-sender");

    send_message(&client, &channel_id, "alice", "msg 1");
    send_message(&client, &channel_id, "bob", "msg 2");
    send_message(&client, &channel_id, "alice", "msg 3");

    let res = client
        .get(format!("/api/channels/{channel_id}/export?sender=alice"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["message_count"], 2);
    let msgs = body["messages"].as_array().unwrap();
    assert!(msgs.iter().all(|m| m["sender_name"] == "alice"));
}

#[test]
fn test_export_limit_clamped() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-limit-clamp");
    send_message(&client, &channel_id, "alice", "msg");

    let res = client
        .get(format!("/api/channels/{channel_id}/export?limit=99999"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["message_count"], 1);
}

#[test]
fn test_export_nonexistent_channel() {
    let client = test_client();
    let res = client
        .get("/api/channels/nonexistent-channel-id/export")
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_export_invalid_format() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-bad-format");

    let res = client
        .get(format!("/api/channels/{channel_id}/export?format=xml"))
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_export_empty_channel() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-empty");

    let res = client
        .get(format!("/api/channels/{channel_id}/export"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["message_count"], 0);
}

#[test]
fn test_export_csv_escapes_commas_and_quotes() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-csv-escape");

    let res = client
        .post(format!("/api/channels/{channel_id}/messages"))
        .header(rocket::http::ContentType::JSON)
        .body(r#"{"sender_name": "alice", "content": "hello, world, \"quoted\""}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Created);

    let res = client
        .get(format!("/api/channels/{channel_id}/export?format=csv"))
        .dispatch();
    let body = res.into_string().unwrap();
    assert!(body.contains("\"hello, world,"));
}

#[test]
fn test_export_content_disposition_headers() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-headers");
    send_message(&client, &channel_id, "alice", "msg");

    let res = client
        .get(format!("/api/channels/{channel_id}/export?format=json"))
        .dispatch();
    let cd = res.headers().get_one("Content-Disposition").unwrap();
    assert!(cd.contains("chat-export.json"));

    let res = client
        .get(format!("/api/channels/{channel_id}/export?format=markdown"))
        .dispatch();
    let cd = res.headers().get_one("Content-Disposition").unwrap();
    assert!(cd.contains("chat-export.md"));

    let res = client
        .get(format!("/api/channels/{channel_id}/export?format=csv"))
        .dispatch();
    let cd = res.headers().get_one("Content-Disposition").unwrap();
    assert!(cd.contains("chat-export.csv"));
}

#[test]
fn test_export_with_replies() {
    let client = test_client();
    let channel_id = create_channel(&client, "export-replies");

    let parent = send_message(&client, &channel_id, "alice", "parent");
    let parent_id = parent["id"].as_str().unwrap();

    client
        .post(format!("/api/channels/{channel_id}/messages"))
        .header(rocket::http::ContentType::JSON)
        .body(format!(
            r#"{{"sender_name": "bob", "content": "reply", "reply_to": "{parent_id}"}}"#
        ))
        .dispatch();

    let res = client
        .get(format!("/api/channels/{channel_id}/export"))
        .dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let msgs = body["messages"].as_array().unwrap();

    assert!(msgs[0].get("parent_id").is_none() || msgs[0]["parent_id"].is_null());
    assert_eq!(msgs[1]["parent_id"], parent_id);
}
