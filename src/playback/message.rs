//! Wire messages for the shared-playback socket.
//!
//! Every frame is `{ "id": <origin>, "type": <kind>, "data": <payload> }`.
//! Inbound frames are decoded once, at the socket boundary, into [`Message`];
//! everything past that point works with typed payloads only.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{malformed, AppErr, AppResult};

/// Origin stamped on frames the server generates itself.
pub const SERVER_ORIGIN: &str = "god";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRuler {
    #[serde(rename = "newRulerID")]
    pub new_ruler_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seek {
    pub media_timestamp: i64,
}

/// What a client reports about itself. Only `name` is acted on; the rest is
/// relayed so peers can show it. Absent fields stay absent on the relay.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playing: Option<bool>,
    #[serde(rename = "currentMediaURL", default, skip_serializing_if = "Option::is_none")]
    pub current_media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_media_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_ping: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_playback_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub playing: bool,
    pub current_media_timestamp: i64,
    #[serde(default)]
    pub current_ping: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pong {
    /// Server wall clock at receipt, in milliseconds.
    pub received_at: i64,
    /// Echo of [`Ping::timestamp`].
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub name: Option<String>,
}

/// Everything a newly connected client needs to catch up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInfo {
    pub id: String,
    #[serde(rename = "currentRulerID")]
    pub current_ruler_id: Option<String>,
    #[serde(rename = "currentMediaURL")]
    pub current_media_url: String,
    pub current_media_timestamp: i64,
    pub current_media_paused: bool,
    pub current_sessions: Vec<SessionInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Message {
    SetRuler(SetRuler),
    SetMedia(SetMedia),
    Status(Status),
    PlaybackStatus(PlaybackStatus),
    Ping(Ping),
    Pong(Pong),
    Play,
    Pause,
    Seek(Seek),
    Connect(ConnectInfo),
    Disconnect(Departure),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl Message {
    /// Decode a client frame. Server-only kinds (`connect`, `disconnect`,
    /// `pong`) are unknown when they arrive from a client.
    pub fn decode(raw: &str) -> AppResult<Self> {
        let Envelope { kind, data } = serde_json::from_str(raw).map_err(malformed)?;

        let msg = match kind.as_str() {
            "setLeader" | "setRuler" => Message::SetRuler(payload(&kind, data)?),
            "setMedia" => Message::SetMedia(payload(&kind, data)?),
            "status" => Message::Status(payload(&kind, data)?),
            "playbackStatus" => Message::PlaybackStatus(payload(&kind, data)?),
            "ping" => Message::Ping(payload(&kind, data)?),
            "play" => Message::Play,
            "pause" => Message::Pause,
            "seek" => Message::Seek(payload(&kind, data)?),
            _ => return Err(AppErr::UnknownKind(kind)),
        };
        Ok(msg)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::SetRuler(_) => "setRuler",
            Message::SetMedia(_) => "setMedia",
            Message::Status(_) => "status",
            Message::PlaybackStatus(_) => "playbackStatus",
            Message::Ping(_) => "ping",
            Message::Pong(_) => "pong",
            Message::Play => "play",
            Message::Pause => "pause",
            Message::Seek(_) => "seek",
            Message::Connect(_) => "connect",
            Message::Disconnect(_) => "disconnect",
        }
    }
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> AppResult<T> {
    // A missing `data` is an empty payload; required fields still fail below.
    let data = if data.is_null() { Value::Object(Default::default()) } else { data };
    serde_json::from_value(data).map_err(|e| malformed(format!("{kind}: {e}")))
}

/// An outbound frame: a message plus who it came from.
#[derive(Serialize)]
pub struct Frame<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub message: &'a Message,
}

impl Frame<'_> {
    pub fn encode(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
