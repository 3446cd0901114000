use agent_hub::config::AppConfig;
use agent_hub::state::AppState;
use rocket::local::blocking::Client;

/// Wrapper around Client that auto-deletes the temp DB on drop.
/// Prevents /tmp/agent_hub_test_*.db file accumulation.
/// Uses Option<Client> so we can drop the SQLite connection before deleting the file.
pub struct TestClient {
    client: Option<Client>,
    db_path: String,
}

impl Drop for TestClient {
    fn drop(&mut self) {
        drop(self.client.take());
        let _ = std::fs::remove_file(&self.db_path);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_path));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_path));
    }
}

impl std::ops::Deref for TestClient {
    type Target = Client;
    fn deref(&self) -> &Client {
        self.client.as_ref().unwrap()
    }
}

fn temp_db_path() -> String {
    format!(
        "/tmp/agent_hub_test_{}.db",
        uuid::Uuid::new_v4().to_string().split('-').next().unwrap()
    )
}

/// Build a TestClient against a fresh temp DB. Requests through
/// `rocket::local::blocking::Client` dispatch without a real socket, so they
/// hit `AuthContext`'s loopback fallback and resolve as admin on the default
/// workspace — matching a trusted local install, the common case this
/// server is built for.
pub fn test_client() -> TestClient {
    let db_path = temp_db_path();
    let config = AppConfig {
        database_path: db_path.clone(),
        ..AppConfig::from_env()
    };
    let state = AppState::new(config).expect("valid app state");
    let rocket = agent_hub::rocket_with_state(state);
    let client = Client::tracked(rocket).expect("valid rocket instance");
    TestClient { client: Some(client), db_path }
}

/// Register an agent via the REST surface and return its agent_name.
pub fn register_agent(client: &Client, agent_name: &str) -> serde_json::Value {
    use rocket::http::{ContentType, Status};
    let res = client
        .post("/api/agents/register")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"session_id": "sess-{agent_name}", "project_path": "/tmp/proj-{agent_name}", "agent_name": "{agent_name}"}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    res.into_json().unwrap()
}

/// Create a channel and return its id.
pub fn create_channel(client: &Client, name: &str) -> String {
    use rocket::http::{ContentType, Status};
    let res = client
        .post("/api/channels")
        .header(ContentType::JSON)
        .body(format!(r#"{{"name": "{name}", "created_by": "tester"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    body["id"].as_str().unwrap().to_string()
}

/// Send a message and return the response body.
pub fn send_message(
    client: &Client,
    channel_id: &str,
    sender_name: &str,
    content: &str,
) -> serde_json::Value {
    use rocket::http::ContentType;
    let res = client
        .post(format!("/api/channels/{channel_id}/messages"))
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"sender_name": "{sender_name}", "content": "{content}"}}"#
        ))
        .dispatch();
    res.into_json().unwrap()
}
