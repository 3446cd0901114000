use crate::models::{AgentStatus, AgentType};
use crate::providers;
use crate::store::Store;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// `agentName → isGhost`, rebuilt-and-replaced atomically each sweep so
/// readers always see a complete snapshot (spec §5).
#[derive(Clone, Default)]
pub struct GhostCache {
    inner: Arc<RwLock<HashMap<String, bool>>>,
}

impl GhostCache {
    pub fn is_ghost(&self, agent_name: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(agent_name)
            .copied()
            .unwrap_or(false)
    }

    fn replace(&self, snapshot: HashMap<String, bool>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }
}

/// Background sweep loop, grounded on the teacher's
/// `retention::spawn_retention_task` shape: an initial settle delay, then a
/// forever loop on a fixed interval.
pub fn spawn_ghost_sweep(store: Arc<Store>, cache: GhostCache, interval_secs: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        loop {
            sweep_once(&store, &cache).await;
            tokio::time::sleep(Duration::from_secs(interval_secs)).await;
        }
    });
}

async fn sweep_once(store: &Arc<Store>, cache: &GhostCache) {
    let agents = match store.list_agents(crate::store::DEFAULT_WORKSPACE_ID) {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!("ghost sweep: failed to list agents: {e}");
            return;
        }
    };

    let mut snapshot = HashMap::with_capacity(agents.len());
    for agent in agents {
        if agent.agent_type == AgentType::System {
            snapshot.insert(agent.agent_name.clone(), false);
            continue;
        }
        if agent.status != AgentStatus::Online {
            snapshot.insert(agent.agent_name.clone(), true);
            continue;
        }

        let adapter = providers::adapter_for(agent.agent_type);
        let session_alive = adapter.is_session_alive(&agent).await;

        // No register path populates `agent_sessions.pid` yet (none of the
        // providers here run a long-lived locally-tracked process), so the
        // absence of a recorded pid is not itself evidence of death — only
        // an explicitly dead recorded pid counts against liveness.
        let pid_alive = match store.active_session(&agent.user_id) {
            Ok(Some(session)) => session.pid.map(pid_is_alive).unwrap_or(true),
            _ => true,
        };

        let is_ghost = !session_alive || !pid_alive;
        snapshot.insert(agent.agent_name, is_ghost);
    }

    cache.replace(snapshot);
}

#[cfg(unix)]
fn pid_is_alive(pid: i64) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Best-effort: on non-POSIX hosts liveness falls back to the provider
/// session check alone (spec §9 open question).
#[cfg(not(unix))]
fn pid_is_alive(_pid: i64) -> bool {
    true
}
