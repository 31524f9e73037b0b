//! The display session: connection, root window, atoms and error handling.

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::x11_utils::X11Error;

use crate::atoms::Atoms;
use crate::xerror::{self, ErrorHandler};

/// Everything tied to one display connection
pub struct Session {
    pub conn: RustConnection,
    pub screen_num: usize,
    pub root: Window,
    pub atoms: Atoms,
    /// Display name used in diagnostics
    pub display_name: String,
    /// Set by the detection handler. Only meaningful inside `become_wm`.
    wm_detected: bool,
    error_handler: ErrorHandler,
}

impl Session {
    /// Connect to `display` (or `$DISPLAY`) and intern atoms
    pub fn open(display: Option<&str>) -> Result<Self> {
        let display_name = display
            .map(str::to_string)
            .or_else(|| std::env::var("DISPLAY").ok())
            .unwrap_or_default();

        let (conn, screen_num) = RustConnection::connect(display)
            .with_context(|| format!("Failed to open X display '{}'", display_name))?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;

        log::info!(
            "Connected to X11 display '{}', screen {}, root window 0x{:x}, {}x{}",
            display_name,
            screen_num,
            root,
            screen.width_in_pixels,
            screen.height_in_pixels
        );

        let atoms = Atoms::new(&conn)?;

        Ok(Self {
            conn,
            screen_num,
            root,
            atoms,
            display_name,
            wm_detected: false,
            error_handler: xerror::on_x_error,
        })
    }

    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = handler;
    }

    /// Route a protocol error to the registered handler
    pub fn handle_error(&mut self, error: &X11Error) {
        let handler = self.error_handler;
        handler(self, error);
    }

    pub(crate) fn mark_wm_detected(&mut self) {
        self.wm_detected = true;
    }

    /// Become the window manager by selecting SubstructureRedirect on root.
    ///
    /// Returns `false` if another window manager already owns the redirect.
    /// The detection handler is installed for the duration of the round trip;
    /// the caller installs the general handler afterwards.
    pub fn become_wm(&mut self) -> Result<bool> {
        self.wm_detected = false;
        self.set_error_handler(xerror::on_wm_detected);

        let event_mask = EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY;
        let cookie = self.conn.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new().event_mask(event_mask),
        )?;

        // check() forces the round trip that surfaces BadAccess
        match cookie.check() {
            Ok(()) => {}
            Err(ReplyError::X11Error(error)) => self.handle_error(&error),
            Err(e) => return Err(e).context("Failed to select substructure events on root"),
        }

        if self.wm_detected {
            log::error!(
                "There is already a window manager for display '{}'",
                self.display_name
            );
            return Ok(false);
        }

        log::info!("Successfully became the window manager");
        Ok(true)
    }

    /// Leave the display in a clean state before the connection is dropped
    pub fn shutdown(&self) -> Result<()> {
        log::info!("Shutting down session on '{}'", self.display_name);
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, self.root, x11rb::CURRENT_TIME)?;
        self.conn.clear_area(false, self.root, 0, 0, 0, 0)?;
        self.conn.flush()?;
        Ok(())
    }
}
