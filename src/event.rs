//! Event dispatch.
//!
//! Events are read one at a time, with bursts of pointer motion for the same
//! window collapsed into the most recent one. Anything read ahead of the main
//! loop sits in `Wm::pending` and is delivered before the connection is asked
//! again.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;

use crate::describe::{describe_event, event_name};
use crate::state::StateTransition;
use crate::Wm;

/// Collapse a run of MotionNotify events for the same window.
///
/// `next` yields the events that follow `first`, or `None` when nothing else
/// is queued. Returns the newest motion event of the run together with the
/// first event that ended it, which the caller must deliver next.
pub fn coalesce_motion<F>(
    first: MotionNotifyEvent,
    mut next: F,
) -> Result<(MotionNotifyEvent, Option<Event>)>
where
    F: FnMut() -> Result<Option<Event>>,
{
    let mut latest = first;
    while let Some(event) = next()? {
        match event {
            Event::MotionNotify(motion) if motion.event == latest.event => latest = motion,
            other => return Ok((latest, Some(other))),
        }
    }
    Ok((latest, None))
}

impl Wm {
    /// Next event to handle, blocking until one is available
    pub(crate) fn next_event(&mut self) -> Result<Event> {
        let event = match self.pending.pop_front() {
            Some(event) => event,
            None => {
                self.conn().flush()?;
                self.conn().wait_for_event()?
            }
        };

        let Event::MotionNotify(first) = event else {
            return Ok(event);
        };

        let (latest, leftover) = coalesce_motion(first, || self.poll_next())?;
        if let Some(event) = leftover {
            self.pending.push_front(event);
        }
        Ok(Event::MotionNotify(latest))
    }

    /// Wait for the next event from the server, skipping the pending queue
    pub(crate) fn wait_for_server_event(&mut self) -> Result<Event> {
        self.conn().flush()?;
        Ok(self.conn().wait_for_event()?)
    }

    /// Next already-queued event without blocking
    fn poll_next(&mut self) -> Result<Option<Event>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        Ok(self.conn().poll_for_event()?)
    }

    /// Route one event to its handler
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        let description = describe_event(&event);
        log::debug!("Received event: {}", description);
        self.tracer.trace_event(description);

        match event {
            Event::CreateNotify(_) => {}
            Event::ReparentNotify(_) => {}
            Event::ConfigureNotify(_) => {}
            Event::MapNotify(_) => {}
            Event::KeyRelease(_) => {}
            Event::DestroyNotify(e) => self.on_destroy_notify(e)?,
            Event::UnmapNotify(e) => self.on_unmap_notify(e)?,
            Event::MapRequest(e) => self.on_map_request(e)?,
            Event::ConfigureRequest(e) => self.on_configure_request(e)?,
            Event::ButtonPress(e) => {
                if self.is_panel_pane(e.event) {
                    self.on_panel_press(e)?;
                } else {
                    self.on_button_press(e)?;
                }
            }
            Event::ButtonRelease(e) => self.on_button_release(e)?,
            Event::MotionNotify(e) => self.on_motion_notify(e)?,
            Event::KeyPress(e) => self.on_key_press(e)?,
            Event::Expose(e) => self.on_expose(e)?,
            Event::Error(e) => self.session.handle_error(&e),
            other => {
                log::warn!("Ignoring event: {}", event_name(&other));
            }
        }

        Ok(())
    }

    /// A client that was framed but never mapped leaves its frame behind
    /// when it is destroyed; everything else is handled through UnmapNotify.
    fn on_destroy_notify(&mut self, e: DestroyNotifyEvent) -> Result<()> {
        let Some(frame) = self.registry.frame_of(e.window) else {
            return Ok(());
        };

        log::info!("Framed window 0x{:x} destroyed while unmapped", e.window);
        self.conn().destroy_window(frame)?;
        self.registry.remove(e.window);
        if self.focused == Some(e.window) {
            self.focused = None;
        }
        self.trace(StateTransition::WindowUnframed {
            client: e.window,
            frame,
        });
        Ok(())
    }

    fn on_unmap_notify(&mut self, e: UnmapNotifyEvent) -> Result<()> {
        if !self.registry.contains(e.window) {
            log::warn!("Ignoring UnmapNotify for unmanaged window 0x{:x}", e.window);
            return Ok(());
        }

        // Adopting an already-mapped window produces an UnmapNotify on root
        // when it is reparented; that one must not release the frame.
        if e.event == self.root() {
            log::debug!("Ignoring UnmapNotify for 0x{:x} reported on root", e.window);
            return Ok(());
        }

        self.unframe(e.window)
    }

    fn on_map_request(&mut self, e: MapRequestEvent) -> Result<()> {
        if self.registry.contains(e.window) {
            log::debug!("Window 0x{:x} is already framed", e.window);
        } else {
            self.frame(e.window, false)?;
        }
        self.conn().map_window(e.window)?;

        if let Some(panel) = &self.panel {
            panel.raise(self.conn())?;
        }
        Ok(())
    }
}
