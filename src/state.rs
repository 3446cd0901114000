//! Process-wide singletons bundled for route/tool handlers (spec §5:
//! "Global mutable state... initialize at process start; tear down on
//! shutdown").

use crate::agents::AgentRegistry;
use crate::channel_manager::ChannelManager;
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::events::EventBus;
use crate::invoker::Invoker;
use crate::message_router::MessageRouter;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub events: EventBus,
    pub registry: Arc<AgentRegistry>,
    pub channels: Arc<ChannelManager>,
    pub router: Arc<MessageRouter>,
    pub invoker: Arc<Invoker>,
    pub config: Arc<AppConfig>,
    pub rate_limiter: Arc<RateLimiter>,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let config = Arc::new(config);
        let store = Arc::new(Store::new(&config.database_path));
        let events = EventBus::new();
        let channels = Arc::new(ChannelManager::new(store.clone(), events.clone()));
        let invoker = Arc::new(Invoker::new(store.clone(), events.clone(), config.clone()));
        let router = Arc::new(MessageRouter::new(store.clone(), events.clone(), invoker.clone()));
        let registry = Arc::new(AgentRegistry::new(
            store.clone(),
            events.clone(),
            channels.clone(),
            config.clone(),
        ));
        let rate_limiter = Arc::new(RateLimiter::new());
        let rate_limit_config = Arc::new(RateLimitConfig::from_env());

        Ok(Self {
            store,
            events,
            registry,
            channels,
            router,
            invoker,
            config,
            rate_limiter,
            rate_limit_config,
        })
    }
}
