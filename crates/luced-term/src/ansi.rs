// SPDX-License-Identifier: MIT
//
// Escape sequences luced writes to the terminal.
//
// Two kinds: one-off commands (move the cursor, clear, set attributes) and
// the terminal modes the editor switches on for a session and off again.
// Modes are a `Mode` value with an on and an off sequence, so entering and
// restoring the terminal walk the same list in opposite directions.
//
// Positions are 0-indexed here and 1-indexed on the wire.

use std::io::{self, Write};

use crate::cell::Attr;

// ─── Commands ───────────────────────────────────────────────────────────────

/// Move the cursor to column `x`, row `y` (CUP).
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Erase the whole screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Back to default rendition (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(SGR_RESET)
}

const SGR_RESET: &[u8] = b"\x1b[0m";

/// One SGR sequence for `attr`, e.g. `\x1b[1;7m`. Writes nothing for no
/// attributes.
pub fn attrs(w: &mut impl Write, attr: Attr) -> io::Result<()> {
    let codes: Vec<&str> = [(Attr::BOLD, "1"), (Attr::INVERSE, "7")]
        .into_iter()
        .filter_map(|(flag, code)| attr.contains(flag).then_some(code))
        .collect();
    if codes.is_empty() {
        return Ok(());
    }
    write!(w, "\x1b[{}m", codes.join(";"))
}

// ─── Modes ──────────────────────────────────────────────────────────────────

/// A terminal mode with a sequence to turn it on and one to turn it off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Alternate screen (DEC 1049). Leaving it brings the shell back.
    AltScreen,
    /// Cursor hidden (DECTCEM reset). Off shows the cursor.
    HiddenCursor,
    /// Kitty keyboard protocol, disambiguate flag only. Ctrl+Shift+C and
    /// Ctrl+Shift+V then arrive as their own key events; other terminals
    /// ignore it.
    KittyKeys,
    /// Bracketed paste (DEC 2004): pasted text comes wrapped in markers.
    BracketedPaste,
    /// Synchronized output (DEC 2026): the terminal holds a frame until it
    /// is complete.
    SyncOutput,
}

impl Mode {
    /// Modes held for the whole session, in the order they are entered.
    pub const SESSION: [Self; 4] = [
        Self::AltScreen,
        Self::HiddenCursor,
        Self::KittyKeys,
        Self::BracketedPaste,
    ];

    #[must_use]
    pub const fn on(self) -> &'static [u8] {
        match self {
            Self::AltScreen => b"\x1b[?1049h",
            Self::HiddenCursor => b"\x1b[?25l",
            Self::KittyKeys => b"\x1b[>1u",
            Self::BracketedPaste => b"\x1b[?2004h",
            Self::SyncOutput => b"\x1b[?2026h",
        }
    }

    #[must_use]
    pub const fn off(self) -> &'static [u8] {
        match self {
            Self::AltScreen => b"\x1b[?1049l",
            Self::HiddenCursor => b"\x1b[?25h",
            Self::KittyKeys => b"\x1b[<u",
            Self::BracketedPaste => b"\x1b[?2004l",
            Self::SyncOutput => b"\x1b[?2026l",
        }
    }
}

#[inline]
pub fn set(w: &mut impl Write, mode: Mode) -> io::Result<()> {
    w.write_all(mode.on())
}

#[inline]
pub fn unset(w: &mut impl Write, mode: Mode) -> io::Result<()> {
    w.write_all(mode.off())
}

/// Everything needed to hand the terminal back: close any half-written
/// frame, reset attributes, then turn the session modes off in reverse.
#[must_use]
pub fn restore_sequence() -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(Mode::SyncOutput.off());
    out.extend_from_slice(SGR_RESET);
    for mode in Mode::SESSION.iter().rev() {
        out.extend_from_slice(mode.off());
    }
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
