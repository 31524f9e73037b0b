//! Window property queries and client messages.
//!
//! Stateless helpers around WM_PROTOCOLS used by the close command.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::atoms::Atoms;
use crate::state::CloseMethod;

/// Read the WM_PROTOCOLS atoms a window declares.
///
/// A missing property or a failed request yields an empty list.
pub fn get_wm_protocols(conn: &impl Connection, atoms: &Atoms, window: Window) -> Vec<Atom> {
    if let Ok(cookie) = conn.get_property(false, window, atoms.wm_protocols, AtomEnum::ATOM, 0, 32)
    {
        if let Ok(reply) = cookie.reply() {
            if let Some(protocol_atoms) = reply.value32() {
                return protocol_atoms.collect();
            }
        }
    }
    Vec::new()
}

/// Pick the close method for a window given its declared protocols
pub fn close_method(protocols: &[Atom], atoms: &Atoms) -> CloseMethod {
    if protocols.contains(&atoms.wm_delete_window) {
        CloseMethod::DeleteWindow
    } else {
        CloseMethod::Kill
    }
}

/// The WM_DELETE_WINDOW client message for `window`
pub fn delete_window_message(atoms: &Atoms, window: Window) -> ClientMessageEvent {
    let data = ClientMessageData::from([atoms.wm_delete_window, 0u32, 0u32, 0u32, 0u32]);
    ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_: atoms.wm_protocols,
        data,
    }
}

/// Send WM_DELETE_WINDOW client message to request graceful close.
pub fn send_delete_window(conn: &impl Connection, atoms: &Atoms, window: Window) -> Result<()> {
    let event = delete_window_message(atoms, window);
    conn.send_event(false, window, EventMask::NO_EVENT, event)?;
    conn.flush()?;
    Ok(())
}
