use crate::common::{register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn test_register_new_agent() {
    let client = test_client();
    let body = register_agent(&client, "nanook");
    assert_eq!(body["agent_name"], "nanook");
    assert_eq!(body["reconnected"], false);
    assert!(body["master_prompt"].as_str().unwrap().len() > 0);
    assert!(body["project_channel"].as_str().is_some());
}

#[test]
fn test_register_reconnects_existing_agent() {
    let client = test_client();
    register_agent(&client, "forge");
    let second = register_agent(&client, "forge");
    assert_eq!(second["agent_name"], "forge");
    assert_eq!(second["reconnected"], true);
}

#[test]
fn test_agent_list_includes_registered_agent() {
    let client = test_client();
    register_agent(&client, "drift");

    let res = client.get("/api/agents").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let agents: Vec<serde_json::Value> = res.into_json().unwrap();
    assert!(agents.iter().any(|a| a["agent_name"] == "drift"));
}

#[test]
fn test_heartbeat_unknown_agent_not_found() {
    let client = test_client();
    let res = client
        .post("/api/agents/heartbeat")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "ghost-agent"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_heartbeat_known_agent_ok() {
    let client = test_client();
    register_agent(&client, "nanook");

    let res = client
        .post("/api/agents/heartbeat")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nanook"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
}

#[test]
fn test_disconnect_marks_agent_offline() {
    let client = test_client();
    register_agent(&client, "nanook");

    let res = client
        .post("/api/agents/disconnect")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "nanook"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/agents").dispatch();
    let agents: Vec<serde_json::Value> = res.into_json().unwrap();
    let nanook = agents.iter().find(|a| a["agent_name"] == "nanook").unwrap();
    assert_eq!(nanook["status"], "offline");
}

#[test]
fn test_disconnect_unknown_agent_not_found() {
    let client = test_client();
    let res = client
        .post("/api/agents/disconnect")
        .header(ContentType::JSON)
        .body(r#"{"agent_name": "ghost-agent"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn test_update_agent_profile() {
    let client = test_client();
    register_agent(&client, "nanook");

    let res = client
        .put("/api/agents/nanook/profile")
        .header(ContentType::JSON)
        .body(r#"{"description": "handles deploys", "personality": "terse", "current_task": "shipping", "gender": "they"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["description"], "handles deploys");
    assert_eq!(body["personality"], "terse");
    assert_eq!(body["current_task"], "shipping");
}
