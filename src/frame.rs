//! Framing: wrapping client windows in decorated parents and releasing them.

use anyhow::{bail, Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT};

use crate::keys::lock_variants;
use crate::state::StateTransition;
use crate::Wm;

/// Events a frame selects so client requests and notifications reach us
fn frame_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY
}

/// Events delivered while a drag button grab is active
fn drag_event_mask() -> EventMask {
    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION
}

impl Wm {
    /// Frame every top-level window that existed before we started.
    ///
    /// The server is grabbed for the duration so the tree cannot change
    /// underneath the scan.
    pub fn adopt_existing_windows(&mut self) -> Result<()> {
        self.conn().grab_server()?;
        let result = self.adopt_children();

        // Release the server on every path
        let ungrab = self
            .conn()
            .ungrab_server()
            .map_err(anyhow::Error::from)
            .and_then(|_| self.conn().flush().map_err(anyhow::Error::from));

        result?;
        ungrab?;
        if self.registry.is_empty() {
            log::info!("No existing windows to adopt");
        } else {
            log::info!("Adopted {} existing windows", self.registry.len());
        }
        Ok(())
    }

    fn adopt_children(&mut self) -> Result<()> {
        let root = self.root();
        let tree = self
            .conn()
            .query_tree(root)?
            .reply()
            .context("Failed to query the window tree")?;

        if tree.root != root {
            bail!(
                "Window tree reports root 0x{:x}, expected 0x{:x}",
                tree.root,
                root
            );
        }

        // Batch the attribute requests, then read the replies
        let mut cookies = Vec::with_capacity(tree.children.len());
        for &window in &tree.children {
            cookies.push((window, self.conn().get_window_attributes(window)?));
        }

        // Collect every reply before framing; the cookies borrow the connection
        let replies: Vec<_> = cookies
            .into_iter()
            .map(|(window, cookie)| (window, cookie.reply()))
            .collect();

        for (window, reply) in replies {
            let attrs = match reply {
                Ok(attrs) => attrs,
                Err(e) => {
                    log::warn!("Skipping window 0x{:x}: {}", window, e);
                    continue;
                }
            };

            // Popups and menus manage themselves
            if attrs.override_redirect {
                log::debug!("Skipping override-redirect window 0x{:x}", window);
                continue;
            }

            log::info!("Found existing window 0x{:x}", window);
            self.frame(window, true)?;
        }

        Ok(())
    }

    /// Wrap `window` in a new frame at the window's current geometry.
    ///
    /// The frame replaces the window as a child of root; the window sits at
    /// (0, 0) inside it. Framing an already framed window is an error.
    pub fn frame(&mut self, window: Window, adopted: bool) -> Result<()> {
        if self.registry.contains(window) {
            bail!("Window 0x{:x} is already framed", window);
        }

        let geometry = self
            .conn()
            .get_geometry(window)?
            .reply()
            .with_context(|| format!("Failed to get geometry of window 0x{:x}", window))?;

        let root = self.root();
        let frame = self.conn().generate_id()?;
        let aux = CreateWindowAux::new()
            .border_pixel(self.config.border_color)
            .background_pixel(self.config.frame_background)
            .event_mask(frame_event_mask());

        self.conn().create_window(
            COPY_DEPTH_FROM_PARENT,
            frame,
            root,
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height,
            self.config.border_width,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &aux,
        )?;

        // Keep the client alive and visible if we die
        self.conn().change_save_set(SetMode::INSERT, window)?;
        self.conn().reparent_window(window, frame, 0, 0)?;
        self.conn().map_window(frame)?;

        self.registry.insert(window, frame)?;
        self.grab_interactions(window)?;

        log::info!(
            "Framed window 0x{:x} [0x{:x}] at ({}, {}) {}x{}",
            window,
            frame,
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height
        );
        self.trace(StateTransition::WindowFramed {
            client: window,
            frame,
            adopted,
        });
        self.log_registry_violations();
        Ok(())
    }

    /// Release `window` from its frame and destroy the frame.
    ///
    /// The window is reparented to root at (0, 0). Unknown windows are
    /// logged and ignored.
    pub fn unframe(&mut self, window: Window) -> Result<()> {
        let Some(frame) = self.registry.frame_of(window) else {
            log::warn!("Cannot unframe window 0x{:x}: not framed", window);
            return Ok(());
        };

        let root = self.root();
        self.conn().unmap_window(frame)?;
        self.conn().reparent_window(window, root, 0, 0)?;
        self.conn().change_save_set(SetMode::DELETE, window)?;
        self.conn().destroy_window(frame)?;

        self.registry.remove(window);
        if self.drag.is_some_and(|d| d.client == window) {
            self.drag = None;
        }
        if self.focused == Some(window) {
            self.focused = None;
        }

        log::info!("Unframed window 0x{:x} [0x{:x}]", window, frame);
        self.trace(StateTransition::WindowUnframed {
            client: window,
            frame,
        });
        self.log_registry_violations();
        Ok(())
    }

    fn log_registry_violations(&self) {
        for violation in self.registry.validate() {
            log::debug!("Registry invariant violated: {}", violation);
        }
    }

    /// Install the drag button grabs and key grabs on a framed client
    fn grab_interactions(&self, window: Window) -> Result<()> {
        let modifiers = ModMask::from(self.config.drag_modifier);

        for button in [self.config.move_button, self.config.resize_button] {
            for extra_mods in lock_variants() {
                self.conn().grab_button(
                    false, // owner_events
                    window,
                    drag_event_mask(),
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                    x11rb::NONE,
                    x11rb::NONE,
                    ButtonIndex::from(button),
                    modifiers | extra_mods,
                )?;
            }
        }

        self.keys.grab(self.conn(), window)
    }
}
