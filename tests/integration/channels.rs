use crate::common::{create_channel, register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn test_create_channel_prefixes_hash() {
    let client = test_client();
    let res = client
        .post("/api/channels")
        .header(ContentType::JSON)
        .body(r#"{"name": "roadmap", "created_by": "nanook"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["name"], "#roadmap");
}

#[test]
fn test_create_channel_duplicate_name_rejected() {
    let client = test_client();
    create_channel(&client, "dup-channel");

    let res = client
        .post("/api/channels")
        .header(ContentType::JSON)
        .body(r#"{"name": "dup-channel", "created_by": "nanook"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_list_channels_includes_seeded_general() {
    let client = test_client();
    let res = client.get("/api/channels").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let channels: Vec<serde_json::Value> = res.into_json().unwrap();
    assert!(channels.iter().any(|c| c["name"] == "#general"));
}

#[test]
fn test_join_channel() {
    let client = test_client();
    register_agent(&client, "nanook");
    let channel_id = create_channel(&client, "join-test");

    let res = client
        .post(format!("/api/channels/{channel_id}/join"))
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nanook"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "joined");

    let res = client
        .post(format!("/api/channels/{channel_id}/join"))
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nanook"}"#)
        .dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "already_member");
}

#[test]
fn test_join_channel_unknown_agent_not_found() {
    let client = test_client();
    let channel_id = create_channel(&client, "join-unknown");

    let res = client
        .post(format!("/api/channels/{channel_id}/join"))
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nobody"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_set_channel_topic() {
    let client = test_client();
    let channel_id = create_channel(&client, "topic-test");

    let res = client
        .put(format!("/api/channels/{channel_id}/topic"))
        .header(ContentType::JSON)
        .body(r#"{"topic": "ship the thing"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/channels").dispatch();
    let channels: Vec<serde_json::Value> = res.into_json().unwrap();
    let topic_channel = channels.iter().find(|c| c["id"] == channel_id).unwrap();
    assert_eq!(topic_channel["topic"], "ship the thing");
}

#[test]
fn test_set_channel_topic_too_long_rejected() {
    let client = test_client();
    let channel_id = create_channel(&client, "topic-too-long");
    let long_topic = "x".repeat(501);

    let res = client
        .put(format!("/api/channels/{channel_id}/topic"))
        .header(ContentType::JSON)
        .body(serde_json::json!({"topic": long_topic}).to_string())
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_register_agent_joins_general_and_project_channel() {
    let client = test_client();
    register_agent(&client, "nanook");

    let res = client.get("/api/channels").dispatch();
    let channels: Vec<serde_json::Value> = res.into_json().unwrap();
    assert!(channels.len() >= 2);
    assert!(channels.iter().any(|c| c["name"] == "#general"));
    assert!(channels
        .iter()
        .any(|c| c["channel_type"] == "project"));
}
