mod agents;
mod channels;
mod features;
mod messages;
mod read_receipts;
mod reactions;
mod sessions;
mod users;
mod workspaces;

use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Single-writer embedded store (spec §4.1). Reads and writes both go
/// through the same `Mutex<Connection>` — rusqlite connections aren't
/// `Sync`, and the teacher's own `Db` makes the identical trade-off, relying
/// on SQLite's WAL mode to keep readers from blocking each other at the file
/// level while Rust's mutex serializes access from this process.
pub struct Store {
    conn: Mutex<Connection>,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Store {
    pub fn new(path: &str) -> Self {
        let conn = Connection::open(path).expect("failed to open database");
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA synchronous=NORMAL;",
        )
        .expect("failed to set pragmas");
        let store = Store {
            conn: Mutex::new(conn),
        };
        store.migrate();
        store
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) {
        let conn = self.conn();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workspaces (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL,
                display_name TEXT,
                about TEXT,
                agent_instructions TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);

            CREATE TABLE IF NOT EXISTS agents (
                user_id TEXT PRIMARY KEY REFERENCES users(id),
                agent_name TEXT NOT NULL UNIQUE,
                agent_type TEXT NOT NULL,
                project_path TEXT NOT NULL DEFAULT '',
                project_name TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'offline',
                description TEXT,
                personality TEXT,
                current_task TEXT,
                gender TEXT,
                server_url TEXT,
                provider_session_id TEXT,
                workspace_id TEXT NOT NULL REFERENCES workspaces(id)
            );
            CREATE INDEX IF NOT EXISTS idx_agents_name ON agents(agent_name);
            CREATE INDEX IF NOT EXISTS idx_agents_project_name ON agents(project_name);

            CREATE TABLE IF NOT EXISTS agent_sessions (
                id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL REFERENCES agents(user_id),
                pid INTEGER,
                tty TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                last_heartbeat TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_agent ON agent_sessions(agent_id);

            CREATE TABLE IF NOT EXISTS channels (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                channel_type TEXT NOT NULL,
                topic TEXT,
                project_path TEXT,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                is_archived INTEGER NOT NULL DEFAULT 0,
                archived_at TEXT,
                workspace_id TEXT NOT NULL REFERENCES workspaces(id),
                UNIQUE(workspace_id, name)
            );
            CREATE INDEX IF NOT EXISTS idx_channels_name ON channels(name);

            CREATE TABLE IF NOT EXISTS channel_members (
                channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id),
                joined_at TEXT NOT NULL,
                PRIMARY KEY (channel_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
                sender_id TEXT NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                mentions TEXT NOT NULL DEFAULT '[]',
                parent_id TEXT REFERENCES messages(id),
                is_pinned INTEGER NOT NULL DEFAULT 0,
                pinned_at TEXT,
                pinned_by TEXT,
                edited_at TEXT,
                created_at TEXT NOT NULL,
                seq INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_channel_created ON messages(channel_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id);
            CREATE INDEX IF NOT EXISTS idx_messages_channel_seq ON messages(channel_id, seq);

            CREATE VIRTUAL TABLE IF NOT EXISTS messages_fts USING fts5(
                message_id UNINDEXED,
                content,
                tokenize='porter unicode61'
            );

            CREATE TABLE IF NOT EXISTS message_reactions (
                message_id TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id),
                emoji TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (message_id, user_id, emoji)
            );
            CREATE INDEX IF NOT EXISTS idx_reactions_message ON message_reactions(message_id);

            CREATE TABLE IF NOT EXISTS read_receipts (
                user_id TEXT NOT NULL,
                channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
                last_read_at TEXT NOT NULL,
                PRIMARY KEY (user_id, channel_id)
            );

            CREATE TABLE IF NOT EXISTS feature_requests (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                status_reason TEXT,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS feature_votes (
                feature_id TEXT NOT NULL REFERENCES feature_requests(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                vote INTEGER NOT NULL,
                PRIMARY KEY (feature_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS workspace_members (
                workspace_id TEXT NOT NULL REFERENCES workspaces(id),
                user_id TEXT NOT NULL REFERENCES users(id),
                role TEXT NOT NULL DEFAULT 'member',
                PRIMARY KEY (workspace_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS workspace_api_keys (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL REFERENCES workspaces(id),
                token_hash TEXT NOT NULL,
                token_prefix TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                revoked_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_api_keys_hash ON workspace_api_keys(token_hash);

            CREATE TABLE IF NOT EXISTS workspace_invites (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL REFERENCES workspaces(id),
                token TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'member',
                max_uses INTEGER,
                use_count INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT,
                revoked_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_invites_token ON workspace_invites(token);
            ",
        )
        .expect("failed to run migrations");

        self.seed(&conn);
    }

    /// Seed the default workspace, `#general`, and the `system` mascot agent
    /// (spec §3, §4.3: `agentType=system` is reserved for seed agents).
    fn seed(&self, conn: &Connection) {
        let workspace_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM workspaces", [], |r| r.get(0))
            .unwrap_or(0);
        if workspace_count == 0 {
            let ts = now();
            conn.execute(
                "INSERT INTO workspaces (id, name, created_at) VALUES (?1, 'default', ?2)",
                rusqlite::params![crate::store::DEFAULT_WORKSPACE_ID, &ts],
            )
            .ok();
        }

        let system_user_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE name = 'mission-control'",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);
        if system_user_count == 0 {
            let ts = now();
            let user_id = new_id();
            conn.execute(
                "INSERT INTO users (id, name, type, display_name, created_at) VALUES (?1, 'mission-control', 'agent', 'Mission Control', ?2)",
                rusqlite::params![&user_id, &ts],
            )
            .ok();
            conn.execute(
                "INSERT INTO agents (user_id, agent_name, agent_type, project_path, project_name, status, workspace_id)
                 VALUES (?1, 'mission-control', 'system', '', '', 'online', ?2)",
                rusqlite::params![&user_id, crate::store::DEFAULT_WORKSPACE_ID],
            )
            .ok();
        }

        let general_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM channels WHERE name = '#general' AND workspace_id = ?1",
                rusqlite::params![crate::store::DEFAULT_WORKSPACE_ID],
                |r| r.get(0),
            )
            .unwrap_or(0);
        if general_count == 0 {
            let ts = now();
            conn.execute(
                "INSERT INTO channels (id, name, channel_type, created_by, created_at, is_archived, workspace_id)
                 VALUES (?1, '#general', 'general', 'system', ?2, 0, ?3)",
                rusqlite::params![new_id(), &ts, crate::store::DEFAULT_WORKSPACE_ID],
            )
            .ok();
        }
    }
}

/// The single workspace seeded at startup. Multi-workspace rows (created via
/// the workspace REST surface) coexist, but the default single-workspace
/// deployment (spec §4.9) always has this one available.
pub const DEFAULT_WORKSPACE_ID: &str = "00000000-0000-0000-0000-000000000001";

/// SHA-256 of an API key token, hex-encoded. Only the hash is ever stored;
/// `Authorization: Bearer <token>` is hashed the same way before lookup.
pub fn hash_api_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn rebuild_fts_index(conn: &Connection) {
    conn.execute("DELETE FROM messages_fts", []).ok();
    conn.execute_batch(
        "INSERT INTO messages_fts (message_id, content) SELECT id, content FROM messages;",
    )
    .ok();
}

pub fn upsert_fts(conn: &Connection, message_id: &str) {
    conn.execute("DELETE FROM messages_fts WHERE message_id = ?1", [message_id])
        .ok();
    conn.execute(
        "INSERT INTO messages_fts (message_id, content) SELECT id, content FROM messages WHERE id = ?1",
        [message_id],
    )
    .ok();
}

pub fn delete_fts(conn: &Connection, message_id: &str) {
    conn.execute("DELETE FROM messages_fts WHERE message_id = ?1", [message_id])
        .ok();
}
