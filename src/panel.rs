//! The command panel: a strip of labelled panes along the top of the screen.
//!
//! Pressing a pane highlights it and grabs the pointer; releasing over a pane
//! runs that pane's command. Raise and Lower then ask for a target window with
//! a crosshair pointer.

use std::collections::HashMap;

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT};

use crate::Wm;

const PANE_WIDTH: u16 = 80;
const PANE_HEIGHT: u16 = 20;
const PANE_BORDER: u16 = 1;
const LABEL_X: i16 = 6;
const LABEL_Y: i16 = 14;

/// Commands offered by the panel, in pane order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Raise,
    Lower,
    CirculateUp,
    CirculateDown,
    Terminal,
    Exit,
}

impl PanelCommand {
    pub const ALL: [PanelCommand; 6] = [
        PanelCommand::Raise,
        PanelCommand::Lower,
        PanelCommand::CirculateUp,
        PanelCommand::CirculateDown,
        PanelCommand::Terminal,
        PanelCommand::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PanelCommand::Raise => "Raise",
            PanelCommand::Lower => "Lower",
            PanelCommand::CirculateUp => "Circ Up",
            PanelCommand::CirculateDown => "Circ Down",
            PanelCommand::Terminal => "Terminal",
            PanelCommand::Exit => "Exit",
        }
    }
}

/// Which pane runs which command, and which pane is highlighted
#[derive(Debug, Default)]
pub struct MenuState {
    panes: HashMap<Window, PanelCommand>,
    highlighted: Option<Window>,
}

impl MenuState {
    pub fn add_pane(&mut self, pane: Window, command: PanelCommand) {
        self.panes.insert(pane, command);
    }

    pub fn command_for(&self, pane: Window) -> Option<PanelCommand> {
        self.panes.get(&pane).copied()
    }

    pub fn is_pane(&self, window: Window) -> bool {
        self.panes.contains_key(&window)
    }

    pub fn highlighted(&self) -> Option<Window> {
        self.highlighted
    }

    /// Highlight `pane` (or nothing). Returns the panes whose look changed.
    pub fn set_highlight(&mut self, pane: Option<Window>) -> Vec<Window> {
        let pane = pane.filter(|p| self.is_pane(*p));
        if pane == self.highlighted {
            return Vec::new();
        }
        let changed = self.highlighted.into_iter().chain(pane).collect();
        self.highlighted = pane;
        changed
    }
}

pub struct Panel {
    strip: Window,
    gc: Gcontext,
    crosshair: Cursor,
    black: u32,
    white: u32,
    menu: MenuState,
}

impl Panel {
    /// Create and map the strip and its panes
    pub fn create(conn: &impl Connection, screen_num: usize) -> Result<Self> {
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let black = screen.black_pixel;
        let white = screen.white_pixel;

        let pane_count = PanelCommand::ALL.len() as u16;
        let strip = conn.generate_id()?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            strip,
            root,
            0,
            0,
            pane_count * (PANE_WIDTH + 2 * PANE_BORDER),
            PANE_HEIGHT + 2 * PANE_BORDER,
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(black)
                .override_redirect(1),
        )?;

        let mut menu = MenuState::default();
        for (i, command) in PanelCommand::ALL.into_iter().enumerate() {
            let pane = conn.generate_id()?;
            conn.create_window(
                COPY_DEPTH_FROM_PARENT,
                pane,
                strip,
                (i as u16 * (PANE_WIDTH + 2 * PANE_BORDER)) as i16,
                0,
                PANE_WIDTH,
                PANE_HEIGHT,
                PANE_BORDER,
                WindowClass::INPUT_OUTPUT,
                COPY_FROM_PARENT,
                &CreateWindowAux::new()
                    .background_pixel(white)
                    .border_pixel(black)
                    .event_mask(EventMask::EXPOSURE | EventMask::BUTTON_PRESS),
            )?;
            menu.add_pane(pane, command);
        }

        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            root,
            &CreateGCAux::new().foreground(black).background(white),
        )?;

        let resources = x11rb::resource_manager::new_from_default(conn)
            .context("Failed to read X resources")?;
        let crosshair = x11rb::cursor::Handle::new(conn, screen_num, &resources)?
            .reply()
            .context("Failed to load cursor theme")?
            .load_cursor(conn, "crosshair")?;

        conn.map_subwindows(strip)?;
        conn.map_window(strip)?;
        conn.flush()?;

        log::info!("Command panel created [0x{:x}]", strip);
        Ok(Self {
            strip,
            gc,
            crosshair,
            black,
            white,
            menu,
        })
    }

    pub fn is_pane(&self, window: Window) -> bool {
        self.menu.is_pane(window)
    }

    pub fn is_strip(&self, window: Window) -> bool {
        window == self.strip
    }

    /// Keep the strip above newly mapped frames
    pub fn raise(&self, conn: &impl Connection) -> Result<()> {
        conn.configure_window(
            self.strip,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    /// Draw a pane's label, inverted when it is highlighted
    pub fn paint(&self, conn: &impl Connection, pane: Window) -> Result<()> {
        let Some(command) = self.menu.command_for(pane) else {
            return Ok(());
        };

        let (fg, bg) = if self.menu.highlighted() == Some(pane) {
            (self.white, self.black)
        } else {
            (self.black, self.white)
        };

        conn.change_gc(self.gc, &ChangeGCAux::new().foreground(bg))?;
        conn.poly_fill_rectangle(
            pane,
            self.gc,
            &[Rectangle {
                x: 0,
                y: 0,
                width: PANE_WIDTH,
                height: PANE_HEIGHT,
            }],
        )?;
        conn.change_gc(self.gc, &ChangeGCAux::new().foreground(fg).background(bg))?;
        conn.image_text8(pane, self.gc, LABEL_X, LABEL_Y, command.label().as_bytes())?;
        Ok(())
    }

    /// Move the highlight and repaint whatever changed
    pub fn highlight(&mut self, conn: &impl Connection, pane: Option<Window>) -> Result<()> {
        for changed in self.menu.set_highlight(pane) {
            self.paint(conn, changed)?;
        }
        Ok(())
    }

    /// The pane under the pointer, if any
    fn pane_under_pointer(&self, conn: &impl Connection) -> Result<Option<Window>> {
        let pointer = conn.query_pointer(self.strip)?.reply()?;
        Ok(Some(pointer.child).filter(|w| self.is_pane(*w)))
    }
}

impl Wm {
    pub(crate) fn create_panel(&mut self) -> Result<()> {
        let panel = Panel::create(self.conn(), self.session.screen_num)?;
        self.panel = Some(panel);
        Ok(())
    }

    pub(crate) fn is_panel_pane(&self, window: Window) -> bool {
        self.panel.as_ref().is_some_and(|p| p.is_pane(window))
    }

    pub(crate) fn on_expose(&mut self, e: ExposeEvent) -> Result<()> {
        // Only repaint once per burst
        if e.count != 0 {
            return Ok(());
        }
        if let Some(panel) = &self.panel {
            panel.paint(self.conn(), e.window)?;
        }
        Ok(())
    }

    /// Track a press on a pane until its button is released, then run the
    /// command of the pane the pointer ended up over.
    pub(crate) fn on_panel_press(&mut self, e: ButtonPressEvent) -> Result<()> {
        if let Some(panel) = self.panel.as_mut() {
            panel.highlight(&self.session.conn, Some(e.event))?;
        }

        let grab = self
            .conn()
            .grab_pointer(
                false,
                e.event,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                x11rb::CURRENT_TIME,
            )?
            .reply();

        let result = if pointer_grabbed(grab, "the panel") {
            self.run_panel_selection(e.detail)
        } else {
            Ok(())
        };

        // Always drop the highlight and the grab, whatever the command did
        let cleanup = self.finish_panel_selection();
        result.and(cleanup)
    }

    fn finish_panel_selection(&mut self) -> Result<()> {
        if let Some(panel) = self.panel.as_mut() {
            panel.highlight(&self.session.conn, None)?;
        }
        self.conn().ungrab_pointer(x11rb::CURRENT_TIME)?;
        self.conn().flush()?;
        Ok(())
    }

    fn run_panel_selection(&mut self, button: Button) -> Result<()> {
        self.wait_for_release(button)?;

        let pane = match &self.panel {
            Some(panel) => panel.pane_under_pointer(self.conn())?,
            None => None,
        };
        let command = pane.and_then(|p| self.panel.as_ref()?.menu.command_for(p));

        match command {
            Some(command) => {
                log::info!("Panel command: {}", command.label());
                self.run_panel_command(command)
            }
            None => {
                log::debug!("Panel released outside any pane");
                Ok(())
            }
        }
    }

    /// Read events until `button` is released. Anything unrelated is queued
    /// for the main loop.
    fn wait_for_release(&mut self, button: Button) -> Result<()> {
        loop {
            match self.wait_for_server_event()? {
                Event::ButtonRelease(e) if e.detail == button => return Ok(()),
                Event::ButtonPress(_) | Event::ButtonRelease(_) => {}
                Event::MotionNotify(_) => {}
                other => self.pending.push_back(other),
            }
        }
    }

    fn run_panel_command(&mut self, command: PanelCommand) -> Result<()> {
        let root = self.root();
        match command {
            PanelCommand::Raise | PanelCommand::Lower => {
                let Some(target) = self.select_window()? else {
                    log::debug!("No window selected");
                    return Ok(());
                };
                let stack_mode = if command == PanelCommand::Raise {
                    StackMode::ABOVE
                } else {
                    StackMode::BELOW
                };
                match self.registry.client_of_frame(target) {
                    Some(client) => log::info!(
                        "{} frame 0x{:x} (client 0x{:x})",
                        command.label(),
                        target,
                        client
                    ),
                    None => log::info!("{} unmanaged window 0x{:x}", command.label(), target),
                }
                self.conn()
                    .configure_window(target, &ConfigureWindowAux::new().stack_mode(stack_mode))?;
            }
            PanelCommand::CirculateUp => {
                self.conn().circulate_window(Circulate::RAISE_LOWEST, root)?;
            }
            PanelCommand::CirculateDown => {
                self.conn().circulate_window(Circulate::LOWER_HIGHEST, root)?;
            }
            PanelCommand::Terminal => self.launch_terminal(),
            PanelCommand::Exit => {
                self.session.shutdown()?;
                self.running = false;
            }
        }
        Ok(())
    }

    /// Let the user click a top-level window with a crosshair pointer
    fn select_window(&mut self) -> Result<Option<Window>> {
        let Some(cursor) = self.panel.as_ref().map(|p| p.crosshair) else {
            return Ok(None);
        };
        let root = self.root();

        let grab = self
            .conn()
            .grab_pointer(
                false,
                root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                cursor,
                x11rb::CURRENT_TIME,
            )?
            .reply();
        if !pointer_grabbed(grab, "window selection") {
            return Ok(None);
        }

        let press = loop {
            match self.wait_for_server_event()? {
                Event::ButtonPress(e) => break e,
                Event::ButtonRelease(_) | Event::MotionNotify(_) => {}
                other => self.pending.push_back(other),
            }
        };
        self.wait_for_release(press.detail)?;

        let target = press.child;
        let is_panel = self.panel.as_ref().is_some_and(|p| p.is_strip(target));
        if target == x11rb::NONE || is_panel {
            return Ok(None);
        }
        Ok(Some(target))
    }
}

/// Whether a pointer grab went through. A refused or failed grab is
/// logged and the interaction is dropped; the manager keeps running.
fn pointer_grabbed(grab: Result<GrabPointerReply, ReplyError>, purpose: &str) -> bool {
    match grab {
        Ok(reply) if reply.status == GrabStatus::SUCCESS => true,
        Ok(reply) => {
            log::warn!("Pointer grab for {} refused: {:?}", purpose, reply.status);
            false
        }
        Err(err) => {
            log::warn!("Pointer grab for {} failed: {}", purpose, err);
            false
        }
    }
}
