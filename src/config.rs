use std::env;

/// Process-wide configuration, resolved once at startup from the environment.
/// Rocket's own `ROCKET_ADDRESS`/`ROCKET_PORT` figment vars still control the
/// actual bind address; the fields here cover everything Rocket doesn't know
/// about (advertise host for agents behind NAT, network mode, chain depth).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub advertise_host: String,
    pub network_mode: NetworkMode,
    pub prompts_dir: String,
    pub max_chain_depth: u8,
    pub ghost_sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    Loopback,
    Lan,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "data/agent_hub.db".to_string());

        let advertise_host =
            env::var("ADVERTISE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let network_mode = match env::var("NETWORK_MODE").as_deref() {
            Ok("lan") => NetworkMode::Lan,
            _ => NetworkMode::Loopback,
        };

        let prompts_dir = env::var("PROMPTS_DIR").unwrap_or_else(|_| "prompts".to_string());

        let max_chain_depth = env::var("MAX_CHAIN_DEPTH")
            .ok()
            .and_then(|v| v.parse::<u8>().ok())
            .unwrap_or(crate::invoker::MAX_CHAIN_DEPTH);

        let ghost_sweep_interval_secs = env::var("GHOST_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Self {
            database_path,
            advertise_host,
            network_mode,
            prompts_dir,
            max_chain_depth,
            ghost_sweep_interval_secs,
        }
    }
}
