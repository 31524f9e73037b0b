//! Human-readable one-line descriptions of X11 events for debug logging.
//!
//! Output looks like `MapRequest ## window: 0x200001, parent: 0x1e5 ##`.
//! Nothing in the window manager branches on these strings.

use x11rb::protocol::xproto::ConfigWindow;
use x11rb::protocol::Event;

use crate::request_names;
use crate::types::{Position, Size};

/// Protocol name of an event type
pub fn event_name(event: &Event) -> &'static str {
    match event {
        Event::KeyPress(_) => "KeyPress",
        Event::KeyRelease(_) => "KeyRelease",
        Event::ButtonPress(_) => "ButtonPress",
        Event::ButtonRelease(_) => "ButtonRelease",
        Event::MotionNotify(_) => "MotionNotify",
        Event::EnterNotify(_) => "EnterNotify",
        Event::LeaveNotify(_) => "LeaveNotify",
        Event::FocusIn(_) => "FocusIn",
        Event::FocusOut(_) => "FocusOut",
        Event::KeymapNotify(_) => "KeymapNotify",
        Event::Expose(_) => "Expose",
        Event::GraphicsExposure(_) => "GraphicsExpose",
        Event::NoExposure(_) => "NoExpose",
        Event::VisibilityNotify(_) => "VisibilityNotify",
        Event::CreateNotify(_) => "CreateNotify",
        Event::DestroyNotify(_) => "DestroyNotify",
        Event::UnmapNotify(_) => "UnmapNotify",
        Event::MapNotify(_) => "MapNotify",
        Event::MapRequest(_) => "MapRequest",
        Event::ReparentNotify(_) => "ReparentNotify",
        Event::ConfigureNotify(_) => "ConfigureNotify",
        Event::ConfigureRequest(_) => "ConfigureRequest",
        Event::GravityNotify(_) => "GravityNotify",
        Event::ResizeRequest(_) => "ResizeRequest",
        Event::CirculateNotify(_) => "CirculateNotify",
        Event::CirculateRequest(_) => "CirculateRequest",
        Event::PropertyNotify(_) => "PropertyNotify",
        Event::SelectionClear(_) => "SelectionClear",
        Event::SelectionRequest(_) => "SelectionRequest",
        Event::SelectionNotify(_) => "SelectionNotify",
        Event::ColormapNotify(_) => "ColormapNotify",
        Event::ClientMessage(_) => "ClientMessage",
        Event::MappingNotify(_) => "MappingNotify",
        Event::Error(_) => "Error",
        _ => "Unknown",
    }
}

/// Describe an event with its most relevant fields
pub fn describe_event(event: &Event) -> String {
    let mut props: Vec<(&str, String)> = Vec::new();

    match event {
        Event::CreateNotify(e) => {
            props.push(("window", hex(e.window)));
            props.push(("parent", hex(e.parent)));
            props.push(("size", Size::new(e.width.into(), e.height.into()).to_string()));
            props.push(("position", Position::new(e.x.into(), e.y.into()).to_string()));
            props.push(("border_width", e.border_width.to_string()));
            props.push(("override_redirect", e.override_redirect.to_string()));
        }
        Event::DestroyNotify(e) => {
            props.push(("window", hex(e.window)));
        }
        Event::MotionNotify(e) => {
            props.push(("window", hex(e.event)));
            props.push(("position_root", Position::new(e.root_x.into(), e.root_y.into()).to_string()));
            props.push(("state", u16::from(e.state).to_string()));
            props.push(("time", e.time.to_string()));
        }
        Event::MapNotify(e) => {
            props.push(("window", hex(e.window)));
            props.push(("event", hex(e.event)));
            props.push(("override_redirect", e.override_redirect.to_string()));
        }
        Event::UnmapNotify(e) => {
            props.push(("window", hex(e.window)));
            props.push(("event", hex(e.event)));
            props.push(("from_configure", e.from_configure.to_string()));
        }
        Event::ConfigureNotify(e) => {
            props.push(("window", hex(e.window)));
            props.push(("size", Size::new(e.width.into(), e.height.into()).to_string()));
            props.push(("position", Position::new(e.x.into(), e.y.into()).to_string()));
            props.push(("border_width", e.border_width.to_string()));
            props.push(("override_redirect", e.override_redirect.to_string()));
        }
        Event::ReparentNotify(e) => {
            props.push(("window", hex(e.window)));
            props.push(("parent", hex(e.parent)));
            props.push(("position", Position::new(e.x.into(), e.y.into()).to_string()));
            props.push(("override_redirect", e.override_redirect.to_string()));
        }
        Event::MapRequest(e) => {
            props.push(("window", hex(e.window)));
        }
        Event::ConfigureRequest(e) => {
            props.push(("window", hex(e.window)));
            props.push(("parent", hex(e.parent)));
            props.push(("value_mask", configure_mask_names(e.value_mask)));
            props.push(("position", Position::new(e.x.into(), e.y.into()).to_string()));
            props.push(("size", Size::new(e.width.into(), e.height.into()).to_string()));
            props.push(("border_width", e.border_width.to_string()));
        }
        Event::ButtonPress(e) | Event::ButtonRelease(e) => {
            props.push(("window", hex(e.event)));
            props.push(("button", e.detail.to_string()));
            props.push(("position_root", Position::new(e.root_x.into(), e.root_y.into()).to_string()));
        }
        Event::KeyPress(e) | Event::KeyRelease(e) => {
            props.push(("window", hex(e.event)));
            props.push(("state", u16::from(e.state).to_string()));
            props.push(("keycode", e.detail.to_string()));
        }
        Event::Expose(e) => {
            props.push(("window", hex(e.window)));
            props.push(("position", Position::new(e.x.into(), e.y.into()).to_string()));
            props.push(("size", Size::new(e.width.into(), e.height.into()).to_string()));
            props.push(("count", e.count.to_string()));
        }
        Event::Error(e) => {
            props.push(("request", request_names::request_name(e.major_opcode).to_string()));
            props.push(("error_code", e.error_code.to_string()));
            props.push(("resource", hex(e.bad_value)));
        }
        _ => {}
    }

    let body = props
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} ## {} ##", event_name(event), body)
}

/// Names of the fields set in a ConfigureWindow value mask, joined with `|`
pub fn configure_mask_names(mask: ConfigWindow) -> String {
    const NAMES: [(ConfigWindow, &str); 7] = [
        (ConfigWindow::X, "X"),
        (ConfigWindow::Y, "Y"),
        (ConfigWindow::WIDTH, "Width"),
        (ConfigWindow::HEIGHT, "Height"),
        (ConfigWindow::BORDER_WIDTH, "BorderWidth"),
        (ConfigWindow::SIBLING, "Sibling"),
        (ConfigWindow::STACK_MODE, "StackMode"),
    ];
    let bits = u16::from(mask);
    NAMES
        .iter()
        .filter(|(flag, _)| bits & u16::from(*flag) != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join("|")
}

fn hex(id: u32) -> String {
    format!("0x{:x}", id)
}
