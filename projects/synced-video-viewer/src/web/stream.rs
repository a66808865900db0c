//! Frame streaming over WebSocket.
//!
//! The page sends control messages (`seek`, `play`, `pause`); the server
//! answers every displayed frame with a JSON `frame` message followed by the
//! JPEG bytes as a binary message. Only the latest requested key is served:
//! seeks that arrive while a frame is being decoded replace each other.

use crate::video::synced::SyncedFrameSource;
use crate::web::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Seek { key: i64 },
    Play,
    Pause,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Frame { key: i64, frame_index: usize },
    Skipped { key: i64, reason: String },
    Stopped,
}

/// Latest control state requested by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Control {
    requested: Option<i64>,
    /// Bumped on every seek so that repeating a key still refreshes the frame.
    seek_generation: u64,
    playing: bool,
    /// Bumped on every play or pause. Playback that stops at the last key
    /// only resumes on a new play request.
    play_generation: u64,
}

impl Control {
    fn apply(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::Seek { key } => {
                self.requested = Some(key);
                self.seek_generation += 1;
            }
            ClientMessage::Play => {
                self.playing = true;
                self.play_generation += 1;
            }
            ClientMessage::Pause => {
                self.playing = false;
                self.play_generation += 1;
            }
        }
    }
}

/// Steps through the sync keys in ascending order.
#[derive(Debug)]
struct Playback {
    keys: Vec<i64>,
    cursor: Option<usize>,
}

impl Playback {
    fn new(keys: Vec<i64>) -> Self {
        Self { keys, cursor: None }
    }

    /// Place the cursor on `key`, or on the closest key below it.
    fn seek(&mut self, key: i64) {
        self.cursor = match self.keys.binary_search(&key) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        };
    }

    fn advance(&mut self) -> Option<i64> {
        let next = self.cursor.map_or(0, |i| i + 1);
        let key = *self.keys.get(next)?;
        self.cursor = Some(next);
        Some(key)
    }

    fn is_finished(&self) -> bool {
        self.cursor.map_or(self.keys.is_empty(), |i| i + 1 >= self.keys.len())
    }

    fn rewind(&mut self) {
        self.cursor = None;
    }
}

/// WebSocket upgrade handler for GET /stream
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let source = match state.open_source() {
        Ok(source) => source,
        Err(e) => {
            warn!("Stream: failed to open video source: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    info!("Stream: client connected");

    let (control_tx, control_rx) = watch::channel(Control::default());

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => control_tx.send_modify(|c| c.apply(message)),
                    Err(e) => debug!("Stream: ignoring malformed message {:?}: {}", text, e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    let mut send_task = tokio::spawn(serve_frames(
        sender,
        control_rx,
        source,
        state.frame_delay,
    ));

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!("Stream: client disconnected");
}

async fn serve_frames<S>(
    mut sender: S,
    mut control_rx: watch::Receiver<Control>,
    mut source: SyncedFrameSource<i64>,
    frame_delay: Option<Duration>,
) where
    S: Sink<Message> + Unpin,
{
    let mut playback = Playback::new(source.sync_map().sorted_keys());
    let mut seen = Control::default();
    let mut playing = false;
    let mut pending: Option<i64> = None;

    'session: loop {
        if let Some(key) = pending.take() {
            let (returned, result) = match tokio::task::spawn_blocking(move || {
                let result = source.fetch(&key);
                (source, result)
            })
            .await
            {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Stream: frame task failed: {}", e);
                    return;
                }
            };
            source = returned;

            let outgoing = match result {
                Ok(jpeg) => {
                    let frame_index = source.position().map_or(0, |p| p - 1);
                    vec![
                        json_message(&ServerMessage::Frame { key, frame_index }),
                        Message::Binary(jpeg),
                    ]
                }
                Err(e) if e.is_recoverable() => {
                    // Keep the previous image on the page.
                    debug!("Stream: skipping key {}: {}", key, e);
                    vec![json_message(&ServerMessage::Skipped {
                        key,
                        reason: e.to_string(),
                    })]
                }
                Err(e) => {
                    warn!("Stream: stopping: {}", e);
                    break 'session;
                }
            };
            for message in outgoing {
                if sender.send(message).await.is_err() {
                    break 'session;
                }
            }
        }

        let tick = frame_delay.unwrap_or(Duration::ZERO);
        tokio::select! {
            changed = control_rx.changed() => {
                if changed.is_err() {
                    break 'session;
                }
                let control = *control_rx.borrow_and_update();
                if control.seek_generation != seen.seek_generation {
                    if let Some(key) = control.requested {
                        playback.seek(key);
                        pending = Some(key);
                    }
                }
                if control.play_generation != seen.play_generation {
                    playing = control.playing;
                    if playing && playback.is_finished() {
                        playback.rewind();
                    }
                }
                seen = control;
            }
            _ = tokio::time::sleep(tick), if playing => {
                match playback.advance() {
                    Some(key) => pending = Some(key),
                    None => {
                        playing = false;
                        if sender.send(json_message(&ServerMessage::Stopped)).await.is_err() {
                            break 'session;
                        }
                    }
                }
            }
        }
    }

    let stats = source.stats();
    debug!(
        "Stream: session served {} decodes with {} seeks",
        stats.decodes, stats.seeks
    );
}

fn json_message(message: &ServerMessage) -> Message {
    // ServerMessage only holds plain fields, serialization cannot fail.
    Message::Text(serde_json::to_string(message).unwrap_or_default())
}
