use crate::error::AppError;
use crate::models::{Message, UserType};
use crate::state::AppState;
use rocket::http::{ContentType, Header};
use rocket::response::Responder;
use rocket::{get, FromForm, Request, Response, State};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(Debug, Deserialize, FromForm)]
pub struct ExportQuery {
    /// json (default), markdown, or csv
    pub format: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub sender: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct JsonExportResponse {
    pub channel_id: String,
    pub channel_name: String,
    pub exported_at: String,
    pub message_count: usize,
    pub messages: Vec<Message>,
}

pub enum ExportResponse {
    Json(String),
    Markdown(String),
    Csv(String),
}

impl<'r> Responder<'r, 'static> for ExportResponse {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        let (content_type, filename, body) = match self {
            ExportResponse::Json(body) => (ContentType::JSON, "chat-export.json", body),
            ExportResponse::Markdown(body) => {
                (ContentType::new("text", "markdown"), "chat-export.md", body)
            }
            ExportResponse::Csv(body) => (ContentType::CSV, "chat-export.csv", body),
        };
        Response::build()
            .header(content_type)
            .header(Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{filename}\""),
            ))
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

#[get("/api/channels/<channel_id>/export?<params..>")]
pub fn export_channel(
    state: &State<AppState>,
    channel_id: &str,
    params: ExportQuery,
) -> Result<ExportResponse, AppError> {
    let channel = state
        .store
        .find_channel_by_id(channel_id)?
        .ok_or_else(|| AppError::NotFound("channel not found".to_string()))?;

    let format = params.format.as_deref().unwrap_or("json");
    if !["json", "markdown", "csv"].contains(&format) {
        return Err(AppError::Validation(
            "format must be json, markdown, or csv".to_string(),
        ));
    }

    let limit = params.limit.map(|l| l.clamp(1, 10_000)).unwrap_or(10_000);
    let mut messages = state.store.export_messages(
        channel_id,
        params.after.as_deref(),
        params.before.as_deref(),
        params.sender.as_deref(),
        limit,
    )?;
    messages.sort_by_key(|m| m.seq);

    let exported_at = chrono::Utc::now().to_rfc3339();

    match format {
        "markdown" => Ok(ExportResponse::Markdown(render_markdown(
            &channel.name,
            channel_id,
            &exported_at,
            &messages,
        ))),
        "csv" => Ok(ExportResponse::Csv(render_csv(&messages))),
        _ => {
            let response = JsonExportResponse {
                channel_id: channel_id.to_string(),
                channel_name: channel.name,
                exported_at,
                message_count: messages.len(),
                messages,
            };
            Ok(ExportResponse::Json(
                serde_json::to_string_pretty(&response).unwrap_or_default(),
            ))
        }
    }
}

fn render_markdown(
    channel_name: &str,
    channel_id: &str,
    exported_at: &str,
    messages: &[Message],
) -> String {
    let mut md = String::new();
    md.push_str(&format!("# #{channel_name}\n\n"));
    md.push_str(&format!(
        "> Exported {count} messages on {exported_at}\n",
        count = messages.len()
    ));
    md.push_str(&format!("> Channel ID: `{channel_id}`\n\n---\n\n"));

    let mut current_date = String::new();
    for msg in messages {
        let date = msg.created_at.get(..10).unwrap_or(&msg.created_at);
        if date != current_date {
            if !current_date.is_empty() {
                md.push('\n');
            }
            md.push_str(&format!("## {date}\n\n"));
            current_date = date.to_string();
        }
        let time = msg.created_at.get(11..19).unwrap_or(&msg.created_at);
        let badge = match msg.sender_type {
            UserType::Agent => " (agent)",
            UserType::Human => " (human)",
        };
        let pin_marker = if msg.is_pinned { " [pinned]" } else { "" };
        let edit_marker = if msg.edited_at.is_some() { " *(edited)*" } else { "" };
        let reply_prefix = if let Some(ref parent) = msg.parent_id {
            format!("replying to {parent}\n> ")
        } else {
            String::new()
        };
        md.push_str(&format!(
            "**[{time}] {sender}{badge}**{pin_marker}{edit_marker}\n{reply_prefix}{content}\n\n",
            sender = msg.sender_name,
            content = msg.content,
        ));
    }
    md
}

fn render_csv(messages: &[Message]) -> String {
    let mut csv = String::new();
    csv.push_str("seq,sender,sender_type,content,created_at,edited_at,parent_id,is_pinned\n");
    for msg in messages {
        csv.push_str(&format!(
            "{seq},{sender},{sender_type},{content},{created_at},{edited_at},{parent_id},{is_pinned}\n",
            seq = msg.seq,
            sender = csv_escape(&msg.sender_name),
            sender_type = if matches!(msg.sender_type, UserType::Agent) { "agent" } else { "human" },
            content = csv_escape(&msg.content),
            created_at = csv_escape(&msg.created_at),
            edited_at = csv_escape(msg.edited_at.as_deref().unwrap_or("")),
            parent_id = csv_escape(msg.parent_id.as_deref().unwrap_or("")),
            is_pinned = msg.is_pinned,
        ));
    }
    csv
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
