//! Drag state for interactive move and resize.
//!
//! A `DragState` is recorded on a qualifying ButtonPress and dropped on the
//! matching ButtonRelease. All geometry is computed from the values captured at
//! press time, so coalesced motion events never accumulate rounding or skew.

use x11rb::protocol::xproto::{KeyButMask, Window};

use crate::types::{Position, Size, Vector};

/// What a drag does to the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize,
}

impl DragKind {
    /// Decide the drag kind from the button state of a motion event.
    ///
    /// The move button wins if both buttons are held.
    pub fn from_state(state: KeyButMask, move_button: u8, resize_button: u8) -> Option<Self> {
        if button_held(state, move_button) {
            Some(DragKind::Move)
        } else if button_held(state, resize_button) {
            Some(DragKind::Resize)
        } else {
            None
        }
    }
}

/// Whether `button` (1-5) is down in a key/button state mask
pub fn button_held(state: KeyButMask, button: u8) -> bool {
    let mask = match button {
        1 => KeyButMask::BUTTON1,
        2 => KeyButMask::BUTTON2,
        3 => KeyButMask::BUTTON3,
        4 => KeyButMask::BUTTON4,
        5 => KeyButMask::BUTTON5,
        _ => return false,
    };
    u16::from(state) & u16::from(mask) != 0
}

/// Geometry captured when a drag starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    /// Client window the grab fired on
    pub client: Window,
    /// Frame being moved or resized
    pub frame: Window,
    /// Button that started the drag
    pub button: u8,
    /// Pointer position at press time (root coordinates)
    pub start_pointer: Position,
    /// Frame position at press time
    pub start_frame_pos: Position,
    /// Frame size at press time
    pub start_frame_size: Size,
}

impl DragState {
    fn delta(&self, pointer: Position) -> Vector {
        pointer - self.start_pointer
    }

    /// New frame position for a move drag
    pub fn moved_position(&self, pointer: Position) -> Position {
        self.start_frame_pos + self.delta(pointer)
    }

    /// New frame size for a resize drag, never negative in either dimension
    pub fn resized_size(&self, pointer: Position) -> Size {
        let delta = self.delta(pointer);
        let clamped = Vector::new(
            delta.x.max(-self.start_frame_size.width),
            delta.y.max(-self.start_frame_size.height),
        );
        self.start_frame_size + clamped
    }
}
