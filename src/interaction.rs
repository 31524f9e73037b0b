//! User-driven window operations: configure passthrough, drag move/resize,
//! and the keyboard commands.

use anyhow::Result;
use x11rb::protocol::xproto::*;

use crate::config::KeyCommand;
use crate::drag::{button_held, DragKind, DragState};
use crate::launcher;
use crate::state::{CloseMethod, StateTransition};
use crate::types::{Position, Size};
use crate::window_query;
use crate::Wm;

impl Wm {
    /// Honor a client's configure request verbatim, on the frame as well
    /// when there is one.
    pub(crate) fn on_configure_request(&mut self, e: ConfigureRequestEvent) -> Result<()> {
        let aux = ConfigureWindowAux::from_configure_request(&e);

        if let Some(frame) = self.registry.frame_of(e.window) {
            self.conn().configure_window(frame, &aux)?;
            log::debug!(
                "Configured frame 0x{:x} for 0x{:x}: {}x{}",
                frame,
                e.window,
                e.width,
                e.height
            );
        }
        self.conn().configure_window(e.window, &aux)?;
        Ok(())
    }

    /// Start a drag on a framed client and raise its frame
    pub(crate) fn on_button_press(&mut self, e: ButtonPressEvent) -> Result<()> {
        let Some(frame) = self.registry.frame_of(e.event) else {
            log::warn!("Ignoring ButtonPress on unmanaged window 0x{:x}", e.event);
            return Ok(());
        };

        let geometry = match self.conn().get_geometry(frame)?.reply() {
            Ok(geometry) => geometry,
            Err(err) => {
                log::warn!("Cannot start drag on frame 0x{:x}: {}", frame, err);
                return Ok(());
            }
        };

        let drag = DragState {
            client: e.event,
            frame,
            button: e.detail,
            start_pointer: Position::new(e.root_x.into(), e.root_y.into()),
            start_frame_pos: Position::new(geometry.x.into(), geometry.y.into()),
            start_frame_size: Size::new(geometry.width.into(), geometry.height.into()),
        };
        self.drag = Some(drag);

        self.conn().configure_window(
            frame,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;

        log::debug!(
            "Drag started on 0x{:x} with button {} at {}",
            e.event,
            e.detail,
            drag.start_pointer
        );
        self.trace(StateTransition::DragStarted {
            client: e.event,
            button: e.detail,
            frame_position: drag.start_frame_pos,
            frame_size: drag.start_frame_size,
        });
        Ok(())
    }

    pub(crate) fn on_button_release(&mut self, e: ButtonReleaseEvent) -> Result<()> {
        if let Some(drag) = self.drag {
            if drag.button == e.detail {
                self.finish_drag(drag);
            }
        }
        Ok(())
    }

    /// Move or resize the dragged frame to follow the pointer
    pub(crate) fn on_motion_notify(&mut self, e: MotionNotifyEvent) -> Result<()> {
        let Some(drag) = self.drag else {
            log::debug!("Ignoring motion on 0x{:x} outside a drag", e.event);
            return Ok(());
        };

        // The release can be lost if the grab was broken
        if !button_held(e.state, drag.button) {
            self.finish_drag(drag);
            return Ok(());
        }

        let pointer = Position::new(e.root_x.into(), e.root_y.into());
        let kind = DragKind::from_state(e.state, self.config.move_button, self.config.resize_button);

        match kind {
            Some(DragKind::Move) => {
                let position = drag.moved_position(pointer);
                self.conn().configure_window(
                    drag.frame,
                    &ConfigureWindowAux::new().x(position.x).y(position.y),
                )?;
            }
            Some(DragKind::Resize) => {
                let size = drag.resized_size(pointer).to_u32();
                let aux = ConfigureWindowAux::new().width(size.0).height(size.1);
                self.conn().configure_window(drag.frame, &aux)?;
                self.conn().configure_window(drag.client, &aux)?;
            }
            None => {}
        }
        Ok(())
    }

    fn finish_drag(&mut self, drag: DragState) {
        self.drag = None;
        log::debug!("Drag finished on 0x{:x}", drag.client);
        self.trace(StateTransition::DragFinished {
            client: drag.client,
        });
    }

    pub(crate) fn on_key_press(&mut self, e: KeyPressEvent) -> Result<()> {
        let Some(command) = self.keys.lookup(e.detail, e.state) else {
            return Ok(());
        };

        if command != KeyCommand::Launch && !self.registry.contains(e.event) {
            log::warn!("Ignoring {:?} for unmanaged window 0x{:x}", command, e.event);
            return Ok(());
        }

        match command {
            KeyCommand::Close => self.close_client(e.event),
            KeyCommand::CycleFocus => self.cycle_focus(e.event),
            KeyCommand::Launch => {
                self.launch_terminal();
                Ok(())
            }
        }
    }

    /// Ask `window` to close, or kill its connection if it cannot be asked
    pub(crate) fn close_client(&mut self, window: Window) -> Result<()> {
        let atoms = self.session.atoms;
        let protocols = window_query::get_wm_protocols(self.conn(), &atoms, window);
        let method = window_query::close_method(&protocols, &atoms);

        match method {
            CloseMethod::DeleteWindow => {
                log::info!("Sending WM_DELETE_WINDOW to 0x{:x}", window);
                window_query::send_delete_window(self.conn(), &atoms, window)?;
            }
            CloseMethod::Kill => {
                log::info!("Killing client 0x{:x}", window);
                self.conn().kill_client(window)?;
            }
        }

        self.trace(StateTransition::CloseRequested {
            client: window,
            method,
        });
        Ok(())
    }

    /// Raise and focus the client registered after `current`
    pub(crate) fn cycle_focus(&mut self, current: Window) -> Result<()> {
        let Some(next) = self.registry.next_after(current) else {
            log::warn!("Cannot cycle focus from unmanaged window 0x{:x}", current);
            return Ok(());
        };

        self.conn().configure_window(
            next.frame,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        self.conn()
            .set_input_focus(InputFocus::POINTER_ROOT, next.client, x11rb::CURRENT_TIME)?;

        log::debug!("Focus 0x{:x} -> 0x{:x}", current, next.client);
        self.trace(StateTransition::FocusChanged {
            from: self.focused.or(Some(current)),
            to: next.client,
        });
        self.focused = Some(next.client);
        Ok(())
    }

    /// Run the terminal command and report how it ended
    pub(crate) fn launch_terminal(&self) {
        let command = self.config.terminal_command();
        match launcher::execute(&command) {
            Ok(status) if status.success() => log::debug!("'{}' finished", command),
            Ok(status) => log::warn!("'{}' exited with {}", command, status),
            Err(e) => log::warn!("Failed to launch '{}': {:#}", command, e),
        }
    }
}
