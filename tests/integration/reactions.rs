use crate::common::{create_channel, send_message, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn test_add_reaction() {
    let client = test_client();
    let channel_id = create_channel(&client, "react-room-1");
    let msg = send_message(&client, &channel_id, "Nanook", "React to this!");
    let msg_id = msg["id"].as_str().unwrap();

    let res = client
        .post(format!("/api/channels/{channel_id}/messages/{msg_id}/react"))
        .header(ContentType::JSON)
        .body(r#"{"user_name": "Forge", "emoji": "👍"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let reaction: serde_json::Value = res.into_json().unwrap();
    assert_eq!(reaction["user_name"], "Forge");
    assert_eq!(reaction["emoji"], "👍");
    assert_eq!(reaction["message_id"], msg_id);
    assert_eq!(reaction["action"], "added");
}

#[test]
fn test_reaction_toggle_removes_on_repeat() {
    let client = test_client();
    let channel_id = create_channel(&client, "react-room-3");
    let msg = send_message(&client, &channel_id, "Nanook", "Toggle test");
    let msg_id = msg["id"].as_str().unwrap();

    let res = client
        .post(format!("/api/channels/{channel_id}/messages/{msg_id}/react"))
        .header(ContentType::JSON)
        .body(r#"{"user_name": "Forge", "emoji": "🎉"}"#)
        .dispatch();
    let r1: serde_json::Value = res.into_json().unwrap();
    assert_eq!(r1["action"], "added");

    let res = client
        .post(format!("/api/channels/{channel_id}/messages/{msg_id}/react"))
        .header(ContentType::JSON)
        .body(r#"{"user_name": "Forge", "emoji": "🎉"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let r2: serde_json::Value = res.into_json().unwrap();
    assert_eq!(r2["action"], "removed");
}

#[test]
fn test_reaction_nonexistent_message() {
    let client = test_client();
    let channel_id = create_channel(&client, "react-room-5");

    let res = client
        .post(format!("/api/channels/{channel_id}/messages/fake-id/react"))
        .header(ContentType::JSON)
        .body(r#"{"user_name": "Forge", "emoji": "👍"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}
