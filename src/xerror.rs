//! Protocol error handlers.
//!
//! x11rb reports errors either from `check()`/`reply()` or, for requests whose
//! cookie was dropped, as `Event::Error` in the event stream. Both paths end up
//! in whichever handler is registered on the `Session`. Two handlers exist:
//! one used only while probing for another window manager, and the general
//! one used for the rest of the process lifetime. Neither ever closes the
//! connection.

use x11rb::protocol::ErrorKind;
use x11rb::x11_utils::X11Error;

use crate::request_names::{error_text, request_name};
use crate::session::Session;

/// Signature of a registered error handler
pub type ErrorHandler = fn(&mut Session, &X11Error);

/// Handler active while selecting SubstructureRedirect on the root window.
///
/// Any error here means the selection was refused, which only happens when
/// another client already holds the redirect.
pub fn on_wm_detected(session: &mut Session, error: &X11Error) {
    if error.error_kind != ErrorKind::Access {
        log::warn!(
            "Unexpected error while checking for another window manager: {}",
            error_text(error.error_code)
        );
    }
    session.mark_wm_detected();
}

/// Handler for the rest of the session: log and carry on
pub fn on_x_error(_session: &mut Session, error: &X11Error) {
    log::error!(
        "Received X error: request code {} ({}), {}, resource 0x{:x}",
        error.major_opcode,
        request_name(error.major_opcode),
        error_text(error.error_code),
        error.bad_value
    );
}
