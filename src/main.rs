//! framewm - a small reparenting window manager for X11.
//!
//! Every top-level window gets a bordered frame. Windows are moved and
//! resized by dragging with a modifier held, closed and cycled from the
//! keyboard, and an optional command panel offers a few root-level actions.

mod atoms;
mod config;
mod describe;
mod drag;
mod event;
mod frame;
mod interaction;
mod keys;
mod launcher;
mod panel;
mod registry;
mod request_names;
mod session;
mod state;
mod tracing;
mod types;
mod window_query;
mod xerror;

use std::collections::VecDeque;

use anyhow::{bail, Result};
use clap::Parser;
use x11rb::protocol::xproto::Window;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use config::Config;
use drag::DragState;
use keys::KeyBindings;
use panel::Panel;
use registry::ClientRegistry;
use session::Session;
use state::StateTransition;
use tracing::EventTracer;

/// Number of trace entries written to the log when the event loop fails
const TRACE_DUMP_ENTRIES: usize = 50;

/// The main window manager state
pub struct Wm {
    session: Session,
    config: Config,
    /// Managed clients and their frames
    registry: ClientRegistry,
    /// Resolved key bindings, grabbed on every framed client
    keys: KeyBindings,
    /// Drag in progress, if any
    drag: Option<DragState>,
    /// Command panel, when enabled
    panel: Option<Panel>,
    /// Events read ahead of the main loop (coalescing, panel grabs)
    pending: VecDeque<Event>,
    /// Client most recently given focus by the cycle command
    focused: Option<Window>,
    /// Event tracer for debugging
    tracer: EventTracer,
    /// Whether we should keep running
    running: bool,
}

impl Wm {
    /// Set up manager state on a session that already owns the redirect
    fn new(session: Session, config: Config) -> Result<Self> {
        let keys = KeyBindings::resolve(&session.conn, &config.key_bindings())?;
        if keys.is_empty() {
            log::warn!("None of the key bindings could be resolved");
        } else {
            log::info!("Resolved {} key bindings", keys.len());
        }
        let tracer = EventTracer::with_capacity(config.trace_capacity);

        Ok(Self {
            session,
            config,
            registry: ClientRegistry::new(),
            keys,
            drag: None,
            panel: None,
            pending: VecDeque::new(),
            focused: None,
            tracer,
            running: true,
        })
    }

    pub(crate) fn conn(&self) -> &RustConnection {
        &self.session.conn
    }

    pub(crate) fn root(&self) -> Window {
        self.session.root
    }

    pub(crate) fn trace(&mut self, transition: StateTransition) {
        self.tracer.trace_transition(&transition);
    }

    fn run(&mut self) -> Result<()> {
        log::info!("Entering event loop");

        while self.running {
            let event = self.next_event()?;
            if let Err(e) = self.handle_event(event) {
                log::error!("Fatal error handling event: {:#}", e);
                self.tracer.dump(TRACE_DUMP_ENTRIES);
                return Err(e);
            }
        }

        log::info!("Exiting window manager");
        Ok(())
    }
}

fn main() -> Result<()> {
    let config = Config::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting framewm");

    let mut session = Session::open(config.display.as_deref())?;

    // Become the window manager
    if !session.become_wm()? {
        bail!(
            "Another window manager is already running on display '{}'",
            session.display_name
        );
    }
    session.set_error_handler(xerror::on_x_error);

    let show_panel = config.panel;
    let mut wm = Wm::new(session, config)?;

    // Frame the windows that were already there
    wm.adopt_existing_windows()?;

    // Created after adoption so the panel never gets a frame
    if show_panel {
        wm.create_panel()?;
    }

    wm.run()
}
