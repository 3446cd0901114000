use super::{new_id, now, Store};
use crate::error::{AppError, AppResult};
use crate::models::{FeatureRequest, FeatureStatus};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_feature(row: &Row) -> rusqlite::Result<FeatureRequest> {
    let status: String = row.get(3)?;
    Ok(FeatureRequest {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: FeatureStatus::parse(&status).unwrap_or(FeatureStatus::Open),
        status_reason: row.get(4)?,
        created_by: row.get(5)?,
        created_at: row.get(6)?,
        votes: row.get(7)?,
    })
}

const SELECT_FEATURE: &str = "SELECT f.id, f.title, f.description, f.status, f.status_reason, \
     f.created_by, f.created_at, COALESCE(SUM(v.vote), 0) AS votes \
     FROM feature_requests f LEFT JOIN feature_votes v ON v.feature_id = f.id \
     GROUP BY f.id";

impl Store {
    pub fn create_feature_request(
        &self,
        title: &str,
        description: &str,
        created_by: &str,
    ) -> AppResult<FeatureRequest> {
        let conn = self.conn();
        let id = new_id();
        let ts = now();
        conn.execute(
            "INSERT INTO feature_requests (id, title, description, status, created_by, created_at) \
             VALUES (?1, ?2, ?3, 'open', ?4, ?5)",
            params![&id, title, description, created_by, &ts],
        )?;
        Ok(FeatureRequest {
            id,
            title: title.to_string(),
            description: description.to_string(),
            status: FeatureStatus::Open,
            status_reason: None,
            created_by: created_by.to_string(),
            created_at: ts,
            votes: 0,
        })
    }

    pub fn find_feature(&self, id: &str) -> AppResult<Option<FeatureRequest>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_FEATURE} HAVING f.id = ?1"),
            params![id],
            row_to_feature,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn list_features(&self) -> AppResult<Vec<FeatureRequest>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("{SELECT_FEATURE} ORDER BY votes DESC, f.created_at"))?;
        let rows = stmt
            .query_map([], row_to_feature)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Last-write-wins: a user's second vote on the same request replaces
    /// their first rather than accumulating.
    pub fn vote_feature(&self, feature_id: &str, user_id: &str, vote: i64) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO feature_votes (feature_id, user_id, vote) VALUES (?1, ?2, ?3) \
             ON CONFLICT(feature_id, user_id) DO UPDATE SET vote = excluded.vote",
            params![feature_id, user_id, vote],
        )?;
        Ok(())
    }

    pub fn set_feature_status(
        &self,
        id: &str,
        status: FeatureStatus,
        status_reason: Option<&str>,
    ) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE feature_requests SET status = ?1, status_reason = ?2 WHERE id = ?3",
            params![status.as_str(), status_reason, id],
        )?;
        Ok(())
    }

    pub fn delete_feature(&self, id: &str) -> AppResult<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM feature_requests WHERE id = ?1", params![id])?;
        Ok(())
    }
}
