//! State transitions recorded by the window manager.
//!
//! Each transition is serialised into the trace buffer so a post-mortem dump
//! shows what the manager did, not just which events it saw.

use serde::{Deserialize, Serialize};

use crate::types::{Position, Size};

/// State transition events that can be traced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum StateTransition {
    /// Client was wrapped in a new frame
    WindowFramed {
        client: u32,
        frame: u32,
        adopted: bool,
    },
    /// Client was released from its frame
    WindowUnframed {
        client: u32,
        frame: u32,
    },
    /// Input focus moved to a client
    FocusChanged {
        from: Option<u32>,
        to: u32,
    },
    /// A move or resize drag began
    DragStarted {
        client: u32,
        button: u8,
        frame_position: Position,
        frame_size: Size,
    },
    /// The drag button was released
    DragFinished {
        client: u32,
    },
    /// A close command was handled
    CloseRequested {
        client: u32,
        method: CloseMethod,
    },
}

/// How a client was asked to go away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseMethod {
    /// WM_DELETE_WINDOW client message
    DeleteWindow,
    /// KillClient request
    Kill,
}
