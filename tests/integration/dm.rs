use crate::common::{register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn test_create_dm_provisions_channel() {
    let client = test_client();
    register_agent(&client, "plucky-sparrow");

    let res = client
        .post("/api/dm")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "plucky-sparrow", "created_by": "alice"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["name"], "#dm-plucky-sparrow");
    assert_eq!(body["channel_type"], "dm");
}

#[test]
fn test_create_dm_is_idempotent() {
    let client = test_client();
    register_agent(&client, "nanook");

    let res = client
        .post("/api/dm")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nanook", "created_by": "alice"}"#)
        .dispatch();
    let first: serde_json::Value = res.into_json().unwrap();

    let res = client
        .post("/api/dm")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nanook", "created_by": "alice"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let second: serde_json::Value = res.into_json().unwrap();
    assert_eq!(first["id"], second["id"]);
}

#[test]
fn test_create_dm_unknown_agent_not_found() {
    let client = test_client();
    let res = client
        .post("/api/dm")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nobody", "created_by": "alice"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_dm_message_flows_through_normal_send() {
    let client = test_client();
    register_agent(&client, "nanook");

    let res = client
        .post("/api/dm")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nanook", "created_by": "alice"}"#)
        .dispatch();
    let channel: serde_json::Value = res.into_json().unwrap();
    let channel_id = channel["id"].as_str().unwrap();

    let res = client
        .post(format!("/api/channels/{channel_id}/messages"))
        .header(ContentType::JSON)
        .body(r#"{"sender_name": "alice", "content": "hey there"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Created);
}
