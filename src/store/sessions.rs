use super::{new_id, now, Store};
use crate::error::{AppError, AppResult};
use crate::models::AgentSession;
use rusqlite::{params, OptionalExtension, Row};

fn row_to_session(row: &Row) -> rusqlite::Result<AgentSession> {
    Ok(AgentSession {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        pid: row.get(2)?,
        tty: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        started_at: row.get(5)?,
        ended_at: row.get(6)?,
        last_heartbeat: row.get(7)?,
    })
}

const SELECT_SESSION: &str =
    "SELECT id, agent_id, pid, tty, is_active, started_at, ended_at, last_heartbeat FROM agent_sessions";

impl Store {
    /// Start a new session for an agent. §3: "one or zero active sessions per
    /// agent at a time" — any previously active session is ended first.
    pub fn start_session(
        &self,
        agent_id: &str,
        pid: Option<i64>,
        tty: Option<&str>,
    ) -> AppResult<AgentSession> {
        let conn = self.conn();
        let ts = now();
        conn.execute(
            "UPDATE agent_sessions SET is_active = 0, ended_at = ?1 WHERE agent_id = ?2 AND is_active = 1",
            params![&ts, agent_id],
        )?;
        let id = new_id();
        conn.execute(
            "INSERT INTO agent_sessions (id, agent_id, pid, tty, is_active, started_at, last_heartbeat) \
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
            params![&id, agent_id, pid, tty, &ts],
        )?;
        Ok(AgentSession {
            id,
            agent_id: agent_id.to_string(),
            pid,
            tty: tty.map(String::from),
            is_active: true,
            started_at: ts.clone(),
            ended_at: None,
            last_heartbeat: ts,
        })
    }

    pub fn end_active_sessions(&self, agent_id: &str) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE agent_sessions SET is_active = 0, ended_at = ?1 WHERE agent_id = ?2 AND is_active = 1",
            params![now(), agent_id],
        )?;
        Ok(())
    }

    pub fn active_session(&self, agent_id: &str) -> AppResult<Option<AgentSession>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_SESSION} WHERE agent_id = ?1 AND is_active = 1"),
            params![agent_id],
            row_to_session,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn heartbeat(&self, agent_id: &str) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE agent_sessions SET last_heartbeat = ?1 WHERE agent_id = ?2 AND is_active = 1",
            params![now(), agent_id],
        )?;
        Ok(())
    }

    pub fn all_active_sessions(&self) -> AppResult<Vec<AgentSession>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{SELECT_SESSION} WHERE is_active = 1"))?;
        let rows = stmt
            .query_map([], row_to_session)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}
