use crate::common::test_client;
use rocket::http::{ContentType, Status};

fn create_feature(client: &rocket::local::blocking::Client, title: &str) -> serde_json::Value {
    let res = client
        .post("/api/features")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"title": "{title}", "description": "do the thing", "created_by": "nanook"}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    res.into_json().unwrap()
}

#[test]
fn test_create_and_list_feature() {
    let client = test_client();
    create_feature(&client, "dark mode");

    let res = client.get("/api/features").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let features: Vec<serde_json::Value> = res.into_json().unwrap();
    assert!(features.iter().any(|f| f["title"] == "dark mode"));
    assert_eq!(features[0]["status"], "open");
    assert_eq!(features[0]["votes"], 0);
}

#[test]
fn test_vote_feature_up_and_down() {
    let client = test_client();
    let feature = create_feature(&client, "export to pdf");
    let feature_id = feature["id"].as_str().unwrap();

    let res = client
        .post(format!("/api/features/{feature_id}/vote"))
        .header(ContentType::JSON)
        .body(r#"{"user_name": "alice", "vote": 1}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client
        .post(format!("/api/features/{feature_id}/vote"))
        .header(ContentType::JSON)
        .body(r#"{"user_name": "bob", "vote": 1}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/features").dispatch();
    let features: Vec<serde_json::Value> = res.into_json().unwrap();
    let found = features.iter().find(|f| f["id"] == feature_id).unwrap();
    assert_eq!(found["votes"], 2);
}

#[test]
fn test_vote_feature_invalid_value_rejected() {
    let client = test_client();
    let feature = create_feature(&client, "bad vote");
    let feature_id = feature["id"].as_str().unwrap();

    let res = client
        .post(format!("/api/features/{feature_id}/vote"))
        .header(ContentType::JSON)
        .body(r#"{"user_name": "alice", "vote": 5}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_update_feature_status() {
    let client = test_client();
    let feature = create_feature(&client, "api v2");
    let feature_id = feature["id"].as_str().unwrap();

    let res = client
        .put(format!("/api/features/{feature_id}/status"))
        .header(ContentType::JSON)
        .body(r#"{"status": "planned", "reason": "next quarter"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/features").dispatch();
    let features: Vec<serde_json::Value> = res.into_json().unwrap();
    let found = features.iter().find(|f| f["id"] == feature_id).unwrap();
    assert_eq!(found["status"], "planned");
    assert_eq!(found["status_reason"], "next quarter");
}

#[test]
fn test_update_feature_status_unknown_rejected() {
    let client = test_client();
    let feature = create_feature(&client, "bad status");
    let feature_id = feature["id"].as_str().unwrap();

    let res = client
        .put(format!("/api/features/{feature_id}/status"))
        .header(ContentType::JSON)
        .body(r#"{"status": "nonexistent"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_delete_feature() {
    let client = test_client();
    let feature = create_feature(&client, "delete me");
    let feature_id = feature["id"].as_str().unwrap();

    let res = client
        .delete(format!("/api/features/{feature_id}"))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/features").dispatch();
    let features: Vec<serde_json::Value> = res.into_json().unwrap();
    assert!(!features.iter().any(|f| f["id"] == feature_id));
}
