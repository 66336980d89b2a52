//! Framesync Wire Protocol
//!
//! Shared message types for communication between the `framesync` shell and
//! the host compositor that owns the real windows.
//!
//! Both directions are JSON arrays of objects tagged on `t`. The shell sends
//! exactly one request batch per tick and receives one reply batch back.

pub mod kind;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

pub use kind::WindowKind;

/// Largest frame accepted on the socket transport
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Socket path of the host bridge
pub fn socket_path() -> std::path::PathBuf {
    let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    runtime_dir.join("framesync-host.sock")
}

// ============================================================================
// Shell → Host Requests
// ============================================================================

/// Requests queued by the shell and flushed to the host once per tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Request {
    /// Heartbeat sent once in the very first batch
    BrowserStart,

    /// Per-tick render handshake, answered by `render_reply`
    RenderRequest,

    /// Ask the host to place a window (content-area coordinates)
    WindowMap {
        window: String,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    /// Ask the host to focus a window
    WindowFocus { window: String },

    /// Ask the host to close a window
    WindowClose { window: String },

    /// Complete stacking order, bottom to top
    WindowReorder { windows: Vec<String> },

    /// One-time hit-test margin around the content area
    WindowRegisterBorder {
        window: String,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    /// Launch a program on the host
    RunProgram { command: ProgramCommand },
}

impl Request {
    /// Window this request targets, if any
    pub fn window(&self) -> Option<&str> {
        match self {
            Request::WindowMap { window, .. }
            | Request::WindowFocus { window }
            | Request::WindowClose { window }
            | Request::WindowRegisterBorder { window, .. } => Some(window),
            _ => None,
        }
    }
}

/// Command line for `run_program`
///
/// Older hosts take a single shell string, newer ones an argv array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgramCommand {
    Line(String),
    Argv(Vec<String>),
}

// ============================================================================
// Host → Shell Replies
// ============================================================================

/// Replies delivered in the inbound batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Reply {
    /// Authoritative window state
    WindowMap(WindowMapReply),

    /// Host-driven raise (e.g. alt-tab)
    WindowFocus { window: String },

    /// Host confirms a window is gone
    WindowClose { window: String },

    /// Icon for a window, delivered independently of geometry
    WindowIcon { window: String, image: String },

    /// Remote pointer motion
    MouseMove { x: i32, y: i32 },

    /// Remote button state change (`state == true` means pressed)
    MousePress { state: bool, x: i32, y: i32 },

    /// Force a full UI reload
    Reload,

    /// Tick acknowledgement
    RenderReply,

    /// Anything this shell does not understand
    #[serde(other)]
    Unknown,
}

/// Payload of an inbound `window_map`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMapReply {
    pub window: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub visible: bool,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_border: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_t: Option<WindowKind>,
}

impl WindowMapReply {
    /// Window kind, treating an absent `win_t` as a normal window
    pub fn kind(&self) -> WindowKind {
        self.win_t.unwrap_or_default()
    }
}

// ============================================================================
// Batches
// ============================================================================

/// Serialize an ordered request batch
pub fn encode_batch(requests: &[Request]) -> anyhow::Result<String> {
    Ok(serde_json::to_string(requests)?)
}

/// A decoded reply batch
#[derive(Debug, Default)]
pub struct DecodedBatch {
    /// Replies in arrival order
    pub replies: Vec<Reply>,
    /// Decode errors for elements that were dropped
    pub skipped: Vec<String>,
}

/// Decode a reply batch
///
/// The payload must be a JSON array. Elements that fail to decode are
/// dropped individually and reported in [`DecodedBatch::skipped`].
pub fn decode_batch(payload: &str) -> anyhow::Result<DecodedBatch> {
    let elements: Vec<serde_json::Value> =
        serde_json::from_str(payload).context("Reply batch is not a JSON array")?;

    let mut batch = DecodedBatch::default();
    for element in elements {
        match serde_json::from_value::<Reply>(element) {
            Ok(reply) => batch.replies.push(reply),
            Err(e) => batch.skipped.push(e.to_string()),
        }
    }
    Ok(batch)
}

// ============================================================================
// Message Framing
// ============================================================================

/// A framed message with length prefix for reliable socket reads
#[derive(Debug)]
pub struct FramedMessage {
    pub data: Vec<u8>,
}

impl FramedMessage {
    /// Create a framed message from an already encoded payload
    pub fn from_payload(payload: String) -> Self {
        Self {
            data: payload.into_bytes(),
        }
    }

    /// Encode message with length prefix (4 bytes, big-endian)
    pub fn encode(&self) -> Vec<u8> {
        let len = self.data.len() as u32;
        let mut buf = Vec::with_capacity(4 + self.data.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Decode a length prefix, rejecting oversized frames
    pub fn frame_len(prefix: [u8; 4]) -> anyhow::Result<usize> {
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_FRAME_LEN {
            bail!("Message too large: {} bytes", len);
        }
        Ok(len)
    }

    /// Payload as UTF-8 text
    pub fn into_text(self) -> anyhow::Result<String> {
        String::from_utf8(self.data).context("Frame payload is not UTF-8")
    }
}
