use crate::common::{create_channel, register_agent, test_client};
use rocket::http::Status;

#[test]
fn test_health() {
    let client = test_client();
    let res = client.get("/api/health").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "agent-hub");
    // seeded default channel counts even with nothing created yet
    assert!(body["channels"].as_i64().unwrap() >= 1);
}

#[test]
fn test_health_reflects_registered_agents_and_channels() {
    let client = test_client();
    register_agent(&client, "nanook");
    create_channel(&client, "project-x");

    let res = client.get("/api/health").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["agents"].as_i64().unwrap() >= 1);
    assert!(body["channels"].as_i64().unwrap() >= 2);
}

#[test]
fn test_health_includes_version() {
    let client = test_client();
    let res = client.get("/api/health").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["version"].is_string());
    assert!(!body["version"].as_str().unwrap().is_empty());
}

#[test]
fn test_not_found_catcher() {
    let client = test_client();
    let res = client.get("/nonexistent-path").dispatch();
    assert_eq!(res.status(), Status::NotFound);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["error"].as_str().is_some());
}
