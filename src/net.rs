use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use crate::error::NetError;
use crate::input::{Edge, KeyEvent, Modifiers};
use crate::state::SharedGameState;

// ---------------------------------------------
// CLIENT → SERVER
// ---------------------------------------------
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Key {
        key: String,
        edge: Edge,
        #[serde(default)]
        shift: bool, // brake modifier
        #[serde(default)]
        camera: bool, // camera-switch modifier
    },
    CameraToggle,
    Ping,
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> Option<Self> {
        serde_json::from_str(txt).ok()
    }
}

/// Only text frames carry client messages; binary, ping and close frames are
/// skipped even when their payload happens to be valid UTF-8.
fn text_frame(msg: &Message) -> Option<&str> {
    if !msg.is_text() {
        return None;
    }
    msg.to_text().ok()
}

fn welcome(player_id: &str) -> String {
    serde_json::json!({ "type": "welcome", "player_id": player_id }).to_string()
}

const PONG: &str = r#"{"type":"pong"}"#;

// ---------------------------------------------
// SERVER
// ---------------------------------------------
// Connection tasks only ever lock the game state. Physics belongs to the
// simulation loop, which builds the vehicle for a new player on its next
// tick and removes it one tick after the player leaves.

pub async fn start_websocket_server(
    addr: String,
    state: Arc<Mutex<SharedGameState>>,
) -> Result<(), NetError> {
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| NetError::Bind { addr: addr.clone(), source })?;

    tracing::info!(%addr, "websocket listening");

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(%err, "accept failed");
                continue;
            }
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(raw, state).await {
                tracing::warn!(%peer, %err, "connection closed with error");
            }
        });
    }
}

async fn handle_connection(raw: TcpStream, state: Arc<Mutex<SharedGameState>>) -> Result<(), NetError> {
    let ws = accept_async(raw).await?;
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing channel + send loop
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 2) Register player (vehicle comes later)
    // -------------------------------
    let player_id = {
        let mut game = state.lock().await;
        game.register_client(tx.clone());
        game.add_player()
    };
    let _ = tx.send(welcome(&player_id));

    // -------------------------------
    // 3) Receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(err) => {
                tracing::debug!(player = %player_id, %err, "read failed");
                break;
            }
        };

        let Some(text) = text_frame(&msg) else {
            continue;
        };

        let Some(parsed) = ClientMessage::from_json(text) else {
            tracing::trace!(player = %player_id, text, "ignored malformed frame");
            continue;
        };

        match parsed {
            ClientMessage::Ping => {
                let _ = tx.send(PONG.to_string());
            }
            ClientMessage::CameraToggle => {
                state.lock().await.toggle_camera(&player_id);
            }
            ClientMessage::Key { key, edge, shift, camera } => {
                let event = KeyEvent {
                    key,
                    edge,
                    modifiers: Modifiers { brake: shift, camera_switch: camera },
                };
                state.lock().await.apply_key(&player_id, &event);
            }
        }
    }

    state.lock().await.remove_player(&player_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_text_frames_are_read() {
        let ping = r#"{"type":"ping"}"#;

        let text = Message::Text(ping.to_string());
        assert_eq!(text_frame(&text), Some(ping));

        let binary = Message::Binary(ping.as_bytes().to_vec());
        assert_eq!(text_frame(&binary), None);
        assert_eq!(text_frame(&Message::Ping(Vec::new())), None);
    }

    #[test]
    fn parses_key_frames_with_default_modifiers() {
        let msg = ClientMessage::from_json(r#"{"type":"key","key":"ArrowUp","edge":"down"}"#);
        assert_eq!(
            msg,
            Some(ClientMessage::Key {
                key: "ArrowUp".into(),
                edge: Edge::Down,
                shift: false,
                camera: false,
            })
        );
    }

    #[test]
    fn parses_control_frames() {
        assert_eq!(ClientMessage::from_json(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"camera_toggle"}"#),
            Some(ClientMessage::CameraToggle)
        );
        assert_eq!(ClientMessage::from_json(r#"{"type":"input","throttle":1}"#), None);
    }

    #[test]
    fn welcome_carries_player_id() {
        let v: serde_json::Value = serde_json::from_str(&welcome("abc")).unwrap();
        assert_eq!(v["type"], "welcome");
        assert_eq!(v["player_id"], "abc");
    }
}
