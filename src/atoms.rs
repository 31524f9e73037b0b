//! ICCCM atoms used for the graceful-close handshake.

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, ConnectionExt};

/// Atoms interned once per session
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new(conn: &impl Connection) -> Result<Self> {
        // Send both requests before waiting on either reply
        let protocols = conn.intern_atom(false, b"WM_PROTOCOLS")?;
        let delete = conn.intern_atom(false, b"WM_DELETE_WINDOW")?;
        Ok(Self {
            wm_protocols: protocols.reply().context("Failed to intern WM_PROTOCOLS")?.atom,
            wm_delete_window: delete.reply().context("Failed to intern WM_DELETE_WINDOW")?.atom,
        })
    }
}
