//! JSON frame types for the browser-facing WebSocket protocol.
//!
//! Every frame is a JSON object with a `"type"` discriminant and a
//! `"payload"`:
//!
//! ```json
//! {"type":"offer","payload":{"type":"offer","sdp":"v=0\r\n..."}}
//! {"type":"ice-candidate","payload":{"candidate":"candidate:1 1 udp ...","sdpMid":"0"}}
//! {"type":"log","payload":"boot ok\r\n"}
//! ```
//!
//! # Opaque payloads
//!
//! The relay never interprets signaling payloads.  They are captured as
//! [`RawValue`] so the exact bytes a browser sent are the bytes other browsers
//! receive: no key reordering, no number reformatting, no validation.
//!
//! Because `RawValue` cannot be buffered through serde's internally tagged
//! enums, the envelope is a plain struct with a separate [`EventKind`] field
//! rather than a `#[serde(tag = "type")]` enum.
//!
//! A signaling frame without a `payload` key is still relayed; recipients see
//! `"payload":null`.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

/// The four event types on the wire.
///
/// `offer`, `answer` and `ice-candidate` flow browser → relay → other
/// browsers.  `log` flows relay → browsers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Offer,
    Answer,
    IceCandidate,
    Log,
}

impl EventKind {
    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Offer => "offer",
            EventKind::Answer => "answer",
            EventKind::IceCandidate => "ice-candidate",
            EventKind::Log => "log",
        }
    }

    /// `true` for the kinds a browser is allowed to send.
    pub fn is_signaling(self) -> bool {
        !matches!(self, EventKind::Log)
    }
}

/// Errors raised while decoding or encoding a frame.
///
/// None of these close the session; the offending frame is dropped.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The text was not a JSON envelope with a known `type`.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// A browser sent a kind that only the relay may emit.
    #[error("clients may not send `{}` frames", .0.as_str())]
    UnexpectedKind(EventKind),
}

/// A frame received from a browser.
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// `None` when the key is absent or the value is `null`.
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
}

impl InboundFrame {
    /// Parses a WebSocket text frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if the text is not an object with a known
    /// `type` field.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A frame the relay sends to browsers.
#[derive(Serialize)]
struct OutboundFrame<'a, P: ?Sized> {
    #[serde(rename = "type")]
    kind: EventKind,
    payload: &'a P,
}

/// Encodes a relayed signaling frame, copying `payload` byte for byte.
/// A missing payload is written as `null`.
pub fn encode_signal(kind: EventKind, payload: Option<&RawValue>) -> Result<String, FrameError> {
    Ok(serde_json::to_string(&OutboundFrame {
        kind,
        payload: &payload,
    })?)
}

/// Encodes a `log` frame carrying serial device text.
pub fn encode_log(text: &str) -> Result<String, FrameError> {
    Ok(serde_json::to_string(&OutboundFrame {
        kind: EventKind::Log,
        payload: text,
    })?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
