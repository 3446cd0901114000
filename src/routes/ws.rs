//! Single realtime endpoint (spec §4.9: `GET /ws`). Clients subscribe to a
//! set of channel ids and receive the `{type, data}` event envelopes
//! `HubEvent::to_json()` produces; non-channel-scoped events (agent status,
//! channel creation, feature updates) are pushed to every connected client.
//! No grounding example in the retrieval pack uses `rocket_ws` server-side;
//! this follows the crate's documented `WebSocket::channel` pattern.

use crate::state::AppState;
use futures::{SinkExt, StreamExt};
use rocket::{get, State};
use std::collections::HashSet;
use tokio::sync::broadcast::error::RecvError;

#[derive(serde::Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientAction {
    Subscribe {
        #[serde(default)]
        channel_ids: Vec<String>,
    },
    Unsubscribe {
        #[serde(default)]
        channel_ids: Vec<String>,
    },
    Ping,
}

#[get("/ws")]
pub fn ws_hub(ws: rocket_ws::WebSocket, state: &State<AppState>) -> rocket_ws::Channel<'static> {
    let mut events = state.events.sender.subscribe();

    ws.channel(move |mut stream| {
        Box::pin(async move {
            let mut subscribed: HashSet<String> = HashSet::new();

            loop {
                tokio::select! {
                    incoming = stream.next() => {
                        let Some(message) = incoming else { break };
                        let message = message?;
                        match message {
                            rocket_ws::Message::Text(text) => {
                                match serde_json::from_str::<ClientAction>(&text) {
                                    Ok(ClientAction::Subscribe { channel_ids }) => {
                                        subscribed.extend(channel_ids);
                                    }
                                    Ok(ClientAction::Unsubscribe { channel_ids }) => {
                                        for id in &channel_ids {
                                            subscribed.remove(id);
                                        }
                                    }
                                    Ok(ClientAction::Ping) => {
                                        let pong = serde_json::json!({"type": "pong", "data": {}});
                                        stream.send(rocket_ws::Message::Text(pong.to_string())).await?;
                                    }
                                    Err(e) => {
                                        let err = serde_json::json!({
                                            "type": "error",
                                            "data": {"message": e.to_string()}
                                        });
                                        stream.send(rocket_ws::Message::Text(err.to_string())).await?;
                                    }
                                }
                            }
                            rocket_ws::Message::Close(_) => break,
                            _ => {}
                        }
                    }
                    event = events.recv() => {
                        let event = match event {
                            Ok(event) => event,
                            Err(RecvError::Lagged(_)) => continue,
                            Err(RecvError::Closed) => break,
                        };
                        let scoped = match event.channel_id() {
                            Some(id) => subscribed.contains(id),
                            None => true,
                        };
                        if scoped {
                            let payload = event.to_json().to_string();
                            stream.send(rocket_ws::Message::Text(payload)).await?;
                        }
                    }
                }
            }

            Ok(())
        })
    })
}
