//! Key bindings resolved against the server's keyboard mapping.

use std::collections::HashMap;

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::config::{KeyCommand, ParsedBinding};

/// Lock modifiers that must not affect whether a binding matches
const IGNORED_MODIFIERS: u16 = (1 << 1) | (1 << 4); // Lock, Mod2 (NumLock)

/// Shift..Mod5; button bits in an event state are not modifiers
const MODIFIER_BITS: u16 = 0x00ff;

/// Every combination of the ignored lock modifiers
pub fn lock_variants() -> [ModMask; 4] {
    [
        ModMask::from(0u16),
        ModMask::LOCK,
        ModMask::M2,
        ModMask::LOCK | ModMask::M2,
    ]
}

/// A binding with its keysym resolved to a keycode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub command: KeyCommand,
    pub keycode: Keycode,
    pub modifiers: u16,
}

#[derive(Debug, Default)]
pub struct KeyBindings {
    bindings: Vec<KeyBinding>,
}

impl KeyBindings {
    /// Fetch the keyboard mapping and resolve `wanted` against it
    pub fn resolve(conn: &impl Connection, wanted: &[(KeyCommand, ParsedBinding)]) -> Result<Self> {
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()
            .context("Failed to read the keyboard mapping")?;

        Ok(Self::from_mapping(
            min_keycode,
            mapping.keysyms_per_keycode,
            &mapping.keysyms,
            wanted,
        ))
    }

    /// Resolve bindings from a raw keysym table.
    ///
    /// Bindings whose keysym is not on the keyboard are dropped with a warning.
    pub fn from_mapping(
        min_keycode: Keycode,
        keysyms_per_keycode: u8,
        keysyms: &[Keysym],
        wanted: &[(KeyCommand, ParsedBinding)],
    ) -> Self {
        let mut keysym_to_keycode: HashMap<Keysym, Keycode> = HashMap::new();
        if keysyms_per_keycode > 0 {
            for (i, chunk) in keysyms.chunks(keysyms_per_keycode as usize).enumerate() {
                for keysym in chunk {
                    if *keysym != 0 {
                        keysym_to_keycode
                            .entry(*keysym)
                            .or_insert(min_keycode.wrapping_add(i as u8));
                    }
                }
            }
        }

        let mut bindings = Vec::new();
        for (command, binding) in wanted {
            match keysym_to_keycode.get(&binding.keysym) {
                Some(&keycode) => {
                    log::info!(
                        "Bound {:?} to keycode {}, mods 0x{:x}",
                        command,
                        keycode,
                        binding.modifiers
                    );
                    bindings.push(KeyBinding {
                        command: *command,
                        keycode,
                        modifiers: binding.modifiers,
                    });
                }
                None => log::warn!(
                    "Could not find keycode for {:?} (keysym 0x{:x})",
                    command,
                    binding.keysym
                ),
            }
        }

        Self { bindings }
    }

    /// The command bound to a key event, ignoring lock modifiers
    pub fn lookup(&self, keycode: Keycode, state: KeyButMask) -> Option<KeyCommand> {
        let clean = u16::from(state) & MODIFIER_BITS & !IGNORED_MODIFIERS;
        self.bindings
            .iter()
            .find(|b| b.keycode == keycode && b.modifiers == clean)
            .map(|b| b.command)
    }

    /// Grab every binding on `window`, once per lock-modifier combination
    pub fn grab(&self, conn: &impl Connection, window: Window) -> Result<()> {
        for binding in &self.bindings {
            for extra_mods in lock_variants() {
                conn.grab_key(
                    false, // owner_events
                    window,
                    ModMask::from(binding.modifiers) | extra_mods,
                    binding.keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
