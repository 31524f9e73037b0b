//! Integration tests for framewm using Xvfb.
//!
//! These tests require:
//! - Xvfb (headless X server)
//! - The framewm binary built by cargo
//!
//! Run with: RUST_LOG=info cargo test --test integration
//!
//! If Xvfb is not available, tests will be skipped.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::xtest::ConnectionExt as _;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

/// Each test gets its own display so they can run in parallel
static NEXT_DISPLAY: AtomicU32 = AtomicU32::new(141);

const TIMEOUT: Duration = Duration::from_secs(5);

const XK_TAB: u32 = 0xff09;
const XK_ALT_L: u32 = 0xffe9;
const XK_Q: u32 = 0x0071;

/// Check if Xvfb is available
fn xvfb_available() -> bool {
    Command::new("which")
        .arg("Xvfb")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Poll `f` until it returns `Some` or the timeout expires
fn wait_for<T>(mut f: impl FnMut() -> Option<T>) -> Option<T> {
    let start = Instant::now();
    while start.elapsed() < TIMEOUT {
        if let Some(value) = f() {
            return Some(value);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    None
}

/// Test fixture that manages Xvfb, framewm and a client connection
struct TestHarness {
    xvfb: Child,
    wm: Child,
    display: String,
    conn: RustConnection,
    root: Window,
    /// Mapped before the manager started
    sentinel: Window,
}

impl TestHarness {
    fn new() -> Option<Self> {
        if !xvfb_available() {
            eprintln!("Xvfb not available, skipping integration tests");
            return None;
        }

        let display = format!(":{}", NEXT_DISPLAY.fetch_add(1, Ordering::SeqCst));

        let mut xvfb = match Command::new("Xvfb")
            .args([display.as_str(), "-screen", "0", "1280x800x24", "-nolisten", "tcp"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                eprintln!("Failed to start Xvfb: {}", e);
                return None;
            }
        };

        let Some((conn, screen_num)) =
            wait_for(|| RustConnection::connect(Some(display.as_str())).ok())
        else {
            eprintln!("Xvfb never accepted connections on {}", display);
            let _ = xvfb.kill();
            let _ = xvfb.wait();
            return None;
        };
        let root = conn.setup().roots[screen_num].root;

        let sentinel = create_window(&conn, root, 40, 50, 200, 100);
        conn.map_window(sentinel).ok()?;
        conn.flush().ok()?;

        let wm = match spawn_wm(&display) {
            Ok(child) => child,
            Err(e) => {
                eprintln!("Failed to start framewm: {}", e);
                let _ = xvfb.kill();
                let _ = xvfb.wait();
                return None;
            }
        };

        let harness = Self {
            xvfb,
            wm,
            display,
            conn,
            root,
            sentinel,
        };

        // Adoption of the sentinel tells us the manager is up
        if harness.wait_framed(sentinel).is_none() {
            eprintln!("framewm never adopted the existing window");
            return None;
        }
        Some(harness)
    }

    fn parent_of(&self, window: Window) -> Option<Window> {
        Some(self.conn.query_tree(window).ok()?.reply().ok()?.parent)
    }

    /// Wait until `window` has been reparented into a frame
    fn wait_framed(&self, window: Window) -> Option<Window> {
        wait_for(|| self.parent_of(window).filter(|&p| p != self.root))
    }

    /// Wait until `window` is a direct child of root again
    fn wait_unframed(&self, window: Window) -> bool {
        wait_for(|| self.parent_of(window).filter(|&p| p == self.root)).is_some()
    }

    /// Create and map a new top-level window
    fn spawn_window(&self, x: i16, y: i16, width: u16, height: u16) -> Window {
        let window = create_window(&self.conn, self.root, x, y, width, height);
        self.conn.map_window(window).unwrap();
        self.conn.flush().unwrap();
        window
    }

    /// Open another client connection to the test display
    fn connect_client(&self) -> RustConnection {
        RustConnection::connect(Some(self.display.as_str())).unwrap().0
    }

    /// Give `window` the keyboard focus once it is viewable
    fn focus(&self, window: Window) {
        let viewable = wait_for(|| {
            let attrs = self.conn.get_window_attributes(window).ok()?.reply().ok()?;
            (attrs.map_state == MapState::VIEWABLE).then_some(())
        });
        assert!(viewable.is_some(), "window 0x{:x} never became viewable", window);

        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)
            .unwrap();
        assert_eq!(self.focused_window(), window);
    }

    fn focused_window(&self) -> Window {
        self.conn.get_input_focus().unwrap().reply().unwrap().focus
    }

    /// Press the keys in order, then release them in reverse
    fn press_chord(&self, keysyms: &[u32]) {
        let keycodes: Vec<Keycode> = keysyms
            .iter()
            .map(|&keysym| {
                keycode_for(&self.conn, keysym)
                    .unwrap_or_else(|| panic!("no keycode for keysym 0x{:x}", keysym))
            })
            .collect();

        for &keycode in &keycodes {
            self.conn
                .xtest_fake_input(KEY_PRESS_EVENT, keycode, x11rb::CURRENT_TIME, self.root, 0, 0, 0)
                .unwrap();
        }
        for &keycode in keycodes.iter().rev() {
            self.conn
                .xtest_fake_input(KEY_RELEASE_EVENT, keycode, x11rb::CURRENT_TIME, self.root, 0, 0, 0)
                .unwrap();
        }
        self.conn.flush().unwrap();
    }

    fn wm_exited(&mut self) -> bool {
        matches!(self.wm.try_wait(), Ok(Some(_)))
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        let _ = self.wm.kill();
        let _ = self.wm.wait();
        let _ = self.xvfb.kill();
        let _ = self.xvfb.wait();
    }
}

fn spawn_wm(display: &str) -> std::io::Result<Child> {
    Command::new(env!("CARGO_BIN_EXE_framewm"))
        .args(["--display", display])
        .env("RUST_LOG", "info")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}

fn create_window(conn: &RustConnection, root: Window, x: i16, y: i16, width: u16, height: u16) -> Window {
    let window = conn.generate_id().unwrap();
    conn.create_window(
        x11rb::COPY_DEPTH_FROM_PARENT,
        window,
        root,
        x,
        y,
        width,
        height,
        0,
        WindowClass::INPUT_OUTPUT,
        x11rb::COPY_FROM_PARENT,
        &CreateWindowAux::new(),
    )
    .unwrap();
    window
}

fn intern(conn: &RustConnection, name: &str) -> Atom {
    conn.intern_atom(false, name.as_bytes())
        .unwrap()
        .reply()
        .unwrap()
        .atom
}

/// First keycode whose mapping produces `keysym`
fn keycode_for(conn: &RustConnection, keysym: u32) -> Option<Keycode> {
    let setup = conn.setup();
    let (min, max) = (setup.min_keycode, setup.max_keycode);
    let mapping = conn
        .get_keyboard_mapping(min, max - min + 1)
        .ok()?
        .reply()
        .ok()?;
    let per_keycode = usize::from(mapping.keysyms_per_keycode).max(1);
    mapping
        .keysyms
        .chunks(per_keycode)
        .position(|syms| syms.contains(&keysym))
        .map(|index| min + index as u8)
}

/// Whether the server has closed `conn`
fn connection_closed(conn: &RustConnection) -> bool {
    match conn.get_input_focus() {
        Ok(cookie) => cookie.reply().is_err(),
        Err(_) => true,
    }
}

/// Wait for a process to exit on its own
fn wait_exit(child: &mut Child) -> Option<ExitStatus> {
    wait_for(|| child.try_wait().ok().flatten())
}

#[test]
fn test_existing_windows_are_adopted() {
    let Some(harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    let frame = harness.parent_of(harness.sentinel).unwrap();
    assert_ne!(frame, harness.root);
    assert_eq!(harness.parent_of(frame), Some(harness.root));

    // The frame takes over the window's geometry; the window sits at its origin
    let frame_geometry = harness.conn.get_geometry(frame).unwrap().reply().unwrap();
    assert_eq!((frame_geometry.x, frame_geometry.y), (40, 50));
    assert_eq!((frame_geometry.width, frame_geometry.height), (200, 100));
    assert_eq!(frame_geometry.border_width, 1);

    let client_geometry = harness
        .conn
        .get_geometry(harness.sentinel)
        .unwrap()
        .reply()
        .unwrap();
    assert_eq!((client_geometry.x, client_geometry.y), (0, 0));
}

#[test]
fn test_map_request_frames_and_maps_window() {
    let Some(harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    let window = harness.spawn_window(300, 200, 320, 240);
    let frame = harness.wait_framed(window).expect("window was never framed");

    let attrs = harness
        .conn
        .get_window_attributes(window)
        .unwrap()
        .reply()
        .unwrap();
    assert_eq!(attrs.map_state, MapState::VIEWABLE);

    let frame_geometry = harness.conn.get_geometry(frame).unwrap().reply().unwrap();
    assert_eq!((frame_geometry.x, frame_geometry.y), (300, 200));
    assert_eq!((frame_geometry.width, frame_geometry.height), (320, 240));
}

#[test]
fn test_unmap_releases_window_and_destroys_frame() {
    let Some(harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    let window = harness.spawn_window(10, 10, 100, 80);
    let frame = harness.wait_framed(window).expect("window was never framed");

    harness.conn.unmap_window(window).unwrap();
    harness.conn.flush().unwrap();
    assert!(harness.wait_unframed(window), "window was never unframed");

    let geometry = harness.conn.get_geometry(window).unwrap().reply().unwrap();
    assert_eq!((geometry.x, geometry.y), (0, 0));

    // The frame is gone
    let destroyed = wait_for(|| {
        harness
            .conn
            .get_geometry(frame)
            .ok()
            .and_then(|c| c.reply().err())
    });
    assert!(destroyed.is_some(), "frame 0x{:x} still exists", frame);

    // Mapping it again gives it a fresh frame
    harness.conn.map_window(window).unwrap();
    harness.conn.flush().unwrap();
    let new_frame = harness.wait_framed(window).expect("window was not reframed");
    assert_ne!(new_frame, frame);
}

#[test]
fn test_second_instance_exits_without_touching_windows() {
    let Some(harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    let frame_before = harness.parent_of(harness.sentinel);

    let mut second = spawn_wm(&harness.display).unwrap();
    let status = match wait_exit(&mut second) {
        Some(status) => status,
        None => {
            let _ = second.kill();
            let _ = second.wait();
            panic!("second instance did not exit");
        }
    };
    assert!(!status.success());

    assert_eq!(harness.parent_of(harness.sentinel), frame_before);
}

#[test]
fn test_protocol_errors_are_not_fatal() {
    let Some(mut harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    let first = harness.spawn_window(0, 0, 100, 100);
    let second = harness.spawn_window(200, 0, 100, 100);
    harness.wait_framed(first).expect("first window was never framed");
    harness.wait_framed(second).expect("second window was never framed");

    // The windows live in different frames, so the sibling hint is invalid
    // for both the frame and the client and the server answers with BadMatch.
    harness
        .conn
        .configure_window(
            first,
            &ConfigureWindowAux::new()
                .sibling(second)
                .stack_mode(StackMode::ABOVE),
        )
        .unwrap();
    harness.conn.flush().unwrap();

    // Still managing windows afterwards
    let third = harness.spawn_window(400, 0, 100, 100);
    assert!(harness.wait_framed(third).is_some());
    assert!(!harness.wm_exited());
}

#[test]
fn test_configure_request_resizes_frame() {
    let Some(harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    let window = harness.spawn_window(0, 0, 100, 100);
    let frame = harness.wait_framed(window).expect("window was never framed");

    harness
        .conn
        .configure_window(window, &ConfigureWindowAux::new().width(250).height(150))
        .unwrap();
    harness.conn.flush().unwrap();

    let resized = wait_for(|| {
        let geometry = harness.conn.get_geometry(frame).ok()?.reply().ok()?;
        (geometry.width == 250 && geometry.height == 150).then_some(())
    });
    assert!(resized.is_some(), "frame never followed the configure request");

    let client = harness.conn.get_geometry(window).unwrap().reply().unwrap();
    assert_eq!((client.width, client.height), (250, 150));
}

#[test]
fn test_close_key_sends_delete_window_once() {
    let Some(mut harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    let client = harness.connect_client();
    let wm_protocols = intern(&client, "WM_PROTOCOLS");
    let wm_delete_window = intern(&client, "WM_DELETE_WINDOW");

    let window = create_window(&client, harness.root, 100, 100, 200, 150);
    client
        .change_property32(
            PropMode::REPLACE,
            window,
            wm_protocols,
            AtomEnum::ATOM,
            &[wm_delete_window],
        )
        .unwrap();
    client.map_window(window).unwrap();
    client.flush().unwrap();
    harness.wait_framed(window).expect("window was never framed");

    harness.focus(window);
    harness.press_chord(&[XK_ALT_L, XK_Q]);

    let message = wait_for(|| match client.poll_for_event() {
        Ok(Some(Event::ClientMessage(message))) => Some(message),
        _ => None,
    })
    .expect("no WM_DELETE_WINDOW message arrived");
    assert_eq!(message.window, window);
    assert_eq!(message.format, 32);
    assert_eq!(message.type_, wm_protocols);
    assert_eq!(message.data.as_data32()[0], wm_delete_window);

    // Only one message, and the client is left to close itself
    std::thread::sleep(Duration::from_millis(300));
    let extra = std::iter::from_fn(|| client.poll_for_event().ok().flatten())
        .filter(|event| matches!(event, Event::ClientMessage(_)))
        .count();
    assert_eq!(extra, 0);
    assert!(!connection_closed(&client));
    assert!(!harness.wm_exited());
}

#[test]
fn test_close_key_kills_client_without_delete_protocol() {
    let Some(harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    let client = harness.connect_client();
    let window = create_window(&client, harness.root, 100, 100, 200, 150);
    client.map_window(window).unwrap();
    client.flush().unwrap();
    harness.wait_framed(window).expect("window was never framed");

    harness.focus(window);
    harness.press_chord(&[XK_ALT_L, XK_Q]);

    let killed = wait_for(|| connection_closed(&client).then_some(()));
    assert!(killed.is_some(), "client connection survived the close key");

    // The manager keeps working after the client goes away
    let next = harness.spawn_window(400, 0, 100, 100);
    assert!(harness.wait_framed(next).is_some());
}

#[test]
fn test_cycle_key_focuses_next_client_and_wraps() {
    let Some(harness) = TestHarness::new() else {
        eprintln!("Skipping test: could not create test harness");
        return;
    };

    // Registration order: sentinel, a, b, c
    let a = harness.spawn_window(0, 200, 100, 100);
    harness.wait_framed(a).expect("a was never framed");
    let b = harness.spawn_window(150, 200, 100, 100);
    harness.wait_framed(b).expect("b was never framed");
    let c = harness.spawn_window(300, 200, 100, 100);
    let c_frame = harness.wait_framed(c).expect("c was never framed");

    harness.focus(b);
    harness.press_chord(&[XK_ALT_L, XK_TAB]);
    let moved = wait_for(|| (harness.focused_window() == c).then_some(()));
    assert!(moved.is_some(), "focus did not move from b to c");

    // The newly focused frame is raised to the top
    let tree = harness.conn.query_tree(harness.root).unwrap().reply().unwrap();
    assert_eq!(tree.children.last(), Some(&c_frame));

    // From the last client the cycle wraps to the first one registered
    harness.press_chord(&[XK_ALT_L, XK_TAB]);
    let wrapped = wait_for(|| (harness.focused_window() == harness.sentinel).then_some(()));
    assert!(wrapped.is_some(), "focus did not wrap from c to the first client");
}
