pub mod agents;
pub mod channel_manager;
pub mod config;
pub mod error;
pub mod events;
pub mod invoker;
pub mod mcp;
pub mod message_router;
pub mod models;
pub mod providers;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod store;

use config::AppConfig;
use rocket_cors::CorsOptions;
use state::AppState;

pub fn rocket() -> rocket::Rocket<rocket::Build> {
    let config = AppConfig::from_env();
    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let state = AppState::new(config).expect("failed to build application state");
    state.registry.spawn_ghost_sweep();
    rocket_with_state(state)
}

/// Mounts the REST/WS surface onto an already-constructed [`AppState`] —
/// callers that also run the MCP server (spec §4.8) share one `AppState`
/// across both so the agent registry, event bus, and store stay a single
/// source of truth instead of diverging per listener.
pub fn rocket_with_state(state: AppState) -> rocket::Rocket<rocket::Build> {
    let cors = CorsOptions::default()
        .to_cors()
        .expect("failed to create CORS");

    // Mirrors the teacher's bump: base64 file/profile payloads need headroom
    // beyond Rocket's default 1MB JSON body limit.
    let figment = rocket::Config::figment().merge(("limits.json", 10 * 1024 * 1024));

    rocket::custom(figment)
        .manage(state)
        .attach(cors)
        .register(
            "/",
            rocket::catchers![routes::too_many_requests, routes::not_found],
        )
        .mount(
            "/",
            rocket::routes![
                routes::health,
                routes::register_agent,
                routes::disconnect_agent,
                routes::heartbeat_agent,
                routes::update_agent_profile,
                routes::agent_list,
                routes::list_channels,
                routes::create_channel,
                routes::join_channel,
                routes::set_channel_topic,
                routes::create_dm,
                routes::send_message,
                routes::get_messages,
                routes::edit_message,
                routes::delete_message,
                routes::react_message,
                routes::set_pin,
                routes::list_pins,
                routes::search_messages,
                routes::list_features,
                routes::create_feature,
                routes::vote_feature,
                routes::update_feature_status,
                routes::delete_feature,
                routes::export_channel,
                routes::ws_hub,
            ],
        )
}
