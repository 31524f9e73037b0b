//! Command-line configuration for framewm.
//!
//! There is no configuration file: every tunable is a flag with a default
//! that reproduces the classic bindings (Alt+drag to move/resize, Alt+q to
//! close, Alt+Tab to cycle, Alt+Return for a terminal).

use clap::Parser;

use crate::tracing::DEFAULT_MAX_ENTRIES;

/// framewm - a small reparenting window manager for X11
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// X display to manage (default: $DISPLAY)
    #[arg(long)]
    pub display: Option<String>,

    /// Shell command run for the terminal binding and panel action
    #[arg(long, default_value = "xterm &")]
    pub terminal: String,

    /// Show the command panel
    #[arg(long)]
    pub panel: bool,

    /// Binding that closes the window under the keyboard focus
    #[arg(long, default_value = "Mod1+q", value_parser = parse_binding_arg)]
    pub close_key: ParsedBinding,

    /// Binding that cycles focus to the next window
    #[arg(long, default_value = "Mod1+Tab", value_parser = parse_binding_arg)]
    pub cycle_key: ParsedBinding,

    /// Binding that launches the terminal command
    #[arg(long, default_value = "Mod1+Return", value_parser = parse_binding_arg)]
    pub launch_key: ParsedBinding,

    /// Pointer button that moves a window while the drag modifier is held
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub move_button: u8,

    /// Pointer button that resizes a window while the drag modifier is held
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub resize_button: u8,

    /// Modifier held for move/resize drags
    #[arg(long, default_value = "Mod1", value_parser = parse_modifier_arg)]
    pub drag_modifier: u16,

    /// Frame border width in pixels
    #[arg(long, default_value_t = 1)]
    pub border_width: u16,

    /// Frame border color
    #[arg(long, default_value = "#ffffaa", value_parser = parse_color_arg)]
    pub border_color: u32,

    /// Frame background color
    #[arg(long, default_value = "#ffffff", value_parser = parse_color_arg)]
    pub frame_background: u32,

    /// Number of events kept for the post-mortem trace
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    pub trace_capacity: usize,
}

/// Parsed keybinding (ready for X11 grab)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedBinding {
    pub keysym: u32,
    pub modifiers: u16,
}

/// Commands reachable from a key binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    Close,
    CycleFocus,
    Launch,
}

impl Config {
    /// All key bindings with the command each one triggers
    pub fn key_bindings(&self) -> Vec<(KeyCommand, ParsedBinding)> {
        vec![
            (KeyCommand::Close, self.close_key),
            (KeyCommand::CycleFocus, self.cycle_key),
            (KeyCommand::Launch, self.launch_key),
        ]
    }

    /// Terminal command with a leading `~` expanded
    pub fn terminal_command(&self) -> String {
        shellexpand::tilde(&self.terminal).into_owned()
    }
}

// X11 modifier masks
const SHIFT_MASK: u16 = 1;
const CONTROL_MASK: u16 = 4;
const MOD1_MASK: u16 = 8; // Alt
const MOD4_MASK: u16 = 64; // Super/Win

/// Parse a modifier name into its X11 mask
pub fn parse_modifier(s: &str) -> Option<u16> {
    match s.to_lowercase().as_str() {
        "mod4" | "super" | "win" => Some(MOD4_MASK),
        "shift" => Some(SHIFT_MASK),
        "control" | "ctrl" => Some(CONTROL_MASK),
        "mod1" | "alt" => Some(MOD1_MASK),
        _ => None,
    }
}

/// Parse a key binding string like "Mod1+Shift+h" into keysym and modifiers
pub fn parse_key_binding(s: &str) -> Option<ParsedBinding> {
    let parts: Vec<&str> = s.split('+').collect();
    let (key_part, mods) = parts.split_last()?;

    let mut modifiers: u16 = 0;
    for part in mods {
        match parse_modifier(part) {
            Some(mask) => modifiers |= mask,
            None => {
                log::warn!("Unknown modifier: {}", part);
                return None;
            }
        }
    }

    let keysym = key_to_keysym(key_part)?;
    Some(ParsedBinding { keysym, modifiers })
}

/// Convert key name to X11 keysym
fn key_to_keysym(key: &str) -> Option<u32> {
    let lower = key.to_lowercase();
    match lower.as_str() {
        "return" | "enter" => Some(0xff0d),
        "tab" => Some(0xff09),
        "escape" | "esc" => Some(0xff1b),
        "space" => Some(0x20),
        "backspace" => Some(0xff08),
        "delete" => Some(0xffff),
        "left" => Some(0xff51),
        "up" => Some(0xff52),
        "right" => Some(0xff53),
        "down" => Some(0xff54),
        "home" => Some(0xff50),
        "end" => Some(0xff57),
        "f1" => Some(0xffbe),
        "f2" => Some(0xffbf),
        "f3" => Some(0xffc0),
        "f4" => Some(0xffc1),
        "f5" => Some(0xffc2),
        "f6" => Some(0xffc3),
        "f7" => Some(0xffc4),
        "f8" => Some(0xffc5),
        "f9" => Some(0xffc6),
        "f10" => Some(0xffc7),
        "f11" => Some(0xffc8),
        "f12" => Some(0xffc9),
        // Latin-1 letters and digits have keysym == ASCII code
        s if s.len() == 1 && s.as_bytes()[0].is_ascii_alphanumeric() => {
            Some(s.as_bytes()[0] as u32)
        }
        _ => {
            log::warn!("Unknown key: {}", key);
            None
        }
    }
}

/// Parse hex color string (e.g., "#ffffaa" or "ffffaa") to u32
pub fn parse_color(s: &str) -> Option<u32> {
    let s = s.trim_start_matches('#');
    if s.len() != 6 {
        return None;
    }
    u32::from_str_radix(s, 16).ok()
}

fn parse_binding_arg(s: &str) -> Result<ParsedBinding, String> {
    parse_key_binding(s).ok_or_else(|| format!("invalid key binding '{}'", s))
}

fn parse_modifier_arg(s: &str) -> Result<u16, String> {
    parse_modifier(s).ok_or_else(|| format!("unknown modifier '{}'", s))
}

fn parse_color_arg(s: &str) -> Result<u32, String> {
    parse_color(s).ok_or_else(|| format!("invalid color '{}'", s))
}
