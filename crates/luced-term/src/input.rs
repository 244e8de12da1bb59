// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw stdin bytes into key and paste events. Understands what the
// terminal sends once `terminal.rs` has set it up:
//
// - Control bytes (Ctrl+letter, Enter, Tab, Backspace)
// - Legacy CSI sequences (arrows, Home/End, Delete, PageUp/PageDown)
// - SS3 sequences (arrows and Home/End from application-mode terminals)
// - Kitty keyboard protocol (`CSI codepoint ; modifiers u`), which is how
//   Ctrl+Shift+C and Ctrl+Shift+V become distinguishable from Ctrl+C/V
// - Bracketed paste (text between `CSI 200~` and `CSI 201~`)
// - Alt+key (ESC followed by a printable byte)
// - UTF-8 multi-byte characters
//
// Escape sequences can span several `read()` calls, so the parser keeps a
// small byte buffer. A lone ESC stays pending until the caller decides no
// more bytes are coming and calls [`Parser::flush`].

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A parsed terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press.
    Key(KeyEvent),
    /// Bracketed paste content, delivered as one event.
    Paste(String),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Whether Ctrl is held (with or without Shift).
    #[inline]
    #[must_use]
    pub const fn is_ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Whether the key carries no modifier other than Shift.
    #[inline]
    #[must_use]
    pub fn is_plain(&self) -> bool {
        (self.modifiers - Modifiers::SHIFT).is_empty()
    }
}

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// A Unicode character.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// F1 through F12.
    F(u8),
}

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// Matches the Kitty keyboard protocol bitmask, which is also the xterm
    /// CSI modifier encoding minus one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
        const SUPER = 0b0000_1000;
    }
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Bracketed paste opening delimiter: `ESC [ 200 ~`
const PASTE_START: &[u8] = b"\x1b[200~";
/// Bracketed paste closing delimiter: `ESC [ 201 ~`
const PASTE_END: &[u8] = b"\x1b[201~";

/// Incremental input parser.
///
/// Feed raw bytes via [`advance`](Parser::advance); incomplete sequences
/// are kept and completed by later calls.
pub struct Parser {
    buf: Vec<u8>,
    in_paste: bool,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
            in_paste: false,
        }
    }

    /// Feed raw bytes and return every event they complete.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            let remaining = &self.buf[pos..];

            if self.in_paste {
                let Some(end) = find_subsequence(remaining, PASTE_END) else {
                    break;
                };
                let text = String::from_utf8_lossy(&remaining[..end]).into_owned();
                events.push(Event::Paste(text));
                pos += end + PASTE_END.len();
                self.in_paste = false;
                continue;
            }

            if remaining.starts_with(PASTE_START) {
                self.in_paste = true;
                pos += PASTE_START.len();
                continue;
            }
            // A prefix of the paste opener: wait rather than misparse it as
            // some other CSI sequence.
            if remaining.len() < PASTE_START.len()
                && remaining.len() > 2
                && PASTE_START.starts_with(remaining)
            {
                break;
            }

            match try_parse(remaining) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }
        events
    }

    /// Whether bytes are waiting for the rest of a sequence.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Resolve whatever is pending after the input went quiet.
    ///
    /// A lone ESC becomes an Escape key; other leftover bytes become the
    /// keys they would be on their own. An unterminated paste is delivered
    /// as-is.
    pub fn flush(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.in_paste {
            self.in_paste = false;
            let text = String::from_utf8_lossy(&self.buf).into_owned();
            self.buf.clear();
            if !text.is_empty() {
                events.push(Event::Paste(text));
            }
            return events;
        }

        for &byte in &self.buf {
            let event = match byte {
                0x1B => press(KeyCode::Escape),
                b @ 0x20..=0x7E => press(KeyCode::Char(b as char)),
                b => match control_byte(b) {
                    Some(event) => event,
                    None => continue,
                },
            };
            events.push(event);
        }
        self.buf.clear();
        events
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing ──────────────────────────────────────────────────────

enum Parsed {
    /// An event and the number of bytes it used.
    Event(Event, usize),
    /// Need more bytes.
    Incomplete,
    /// Unrecognized input, drop this many bytes.
    Skip(usize),
}

fn try_parse(buf: &[u8]) -> Parsed {
    let Some(&first) = buf.first() else {
        return Parsed::Skip(0);
    };

    match first {
        0x1B => parse_escape(buf),
        b @ 0x20..=0x7E => Parsed::Event(press(KeyCode::Char(b as char)), 1),
        0xC0..=0xFF => parse_utf8(buf),
        b => control_byte(b).map_or(Parsed::Skip(1), |event| Parsed::Event(event, 1)),
    }
}

/// The key a single C0 control byte (or DEL) stands for.
///
/// Raw mode turns off signal generation and flow control, so Ctrl+C, Ctrl+Q
/// and Ctrl+S arrive here as plain bytes.
fn control_byte(byte: u8) -> Option<Event> {
    let event = match byte {
        0x08 | 0x7F => press(KeyCode::Backspace),
        0x09 => press(KeyCode::Tab),
        0x0A | 0x0D => press(KeyCode::Enter),
        0x00 => ctrl(KeyCode::Char('@')),
        b @ 0x01..=0x1A => ctrl(KeyCode::Char((b + b'a' - 1) as char)),
        _ => return None,
    };
    Some(event)
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8]) -> Parsed {
    let Some(&second) = buf.get(1) else {
        return Parsed::Incomplete;
    };

    match second {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        b @ 0x20..=0x7E => Parsed::Event(
            Event::Key(KeyEvent::new(KeyCode::Char(b as char), Modifiers::ALT)),
            2,
        ),
        // Unknown byte after ESC: the ESC stands alone.
        _ => Parsed::Event(press(KeyCode::Escape), 1),
    }
}

fn parse_csi(buf: &[u8]) -> Parsed {
    // Final byte is in 0x40..=0x7E; parameters and intermediates below it.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }
    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let final_byte = buf[end];
    let params = parse_csi_params(&buf[2..end]);
    let consumed = end + 1;

    if final_byte == b'u' {
        return parse_kitty_key(&params, consumed);
    }

    let modifiers = params
        .get(1)
        .map_or(Modifiers::empty(), |p| decode_modifiers(p.0));

    let code = if final_byte == b'~' {
        match params.first().map_or(0, |p| p.0) {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            15 => KeyCode::F(5),
            17 => KeyCode::F(6),
            18 => KeyCode::F(7),
            19 => KeyCode::F(8),
            20 => KeyCode::F(9),
            21 => KeyCode::F(10),
            23 => KeyCode::F(11),
            24 => KeyCode::F(12),
            _ => return Parsed::Skip(consumed),
        }
    } else {
        match final_byte {
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'Z' => {
                return Parsed::Event(
                    Event::Key(KeyEvent::new(KeyCode::Tab, Modifiers::SHIFT)),
                    consumed,
                );
            }
            _ => return Parsed::Skip(consumed),
        }
    };

    Parsed::Event(Event::Key(KeyEvent::new(code, modifiers)), consumed)
}

fn parse_ss3(buf: &[u8]) -> Parsed {
    let Some(&third) = buf.get(2) else {
        return Parsed::Incomplete;
    };

    let code = match third {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => return Parsed::Skip(3),
    };
    Parsed::Event(press(code), 3)
}

/// `CSI codepoint [; modifiers[:event_type]] u`
///
/// Release events (event type 3) are dropped; the editor acts on presses
/// and repeats only.
fn parse_kitty_key(params: &[CsiParam], consumed: usize) -> Parsed {
    let codepoint = params.first().map_or(0, |p| p.0);
    let (modifier_val, event_type) = params.get(1).map_or((0, 0), |p| (p.0, p.1));

    if event_type == 3 {
        return Parsed::Skip(consumed);
    }

    kitty_codepoint_to_keycode(codepoint).map_or(Parsed::Skip(consumed), |code| {
        Parsed::Event(
            Event::Key(KeyEvent::new(code, decode_modifiers(modifier_val))),
            consumed,
        )
    })
}

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = utf8_char_len(buf[0]);
    if expected == 0 {
        return Parsed::Skip(1);
    }
    if buf.len() < expected {
        return Parsed::Incomplete;
    }

    std::str::from_utf8(&buf[..expected])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or(Parsed::Skip(1), |ch| {
            Parsed::Event(press(KeyCode::Char(ch)), expected)
        })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

const fn press(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, Modifiers::empty()))
}

const fn ctrl(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, Modifiers::CTRL))
}

/// CSI parameter: `(main_value, colon_sub_parameter)`.
struct CsiParam(u32, u32);

/// Parse `1;2` or `99;6:1` style parameter lists.
fn parse_csi_params(raw: &[u8]) -> Vec<CsiParam> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut params = Vec::with_capacity(4);
    let mut pos = 0;
    loop {
        let (main, next) = parse_number_at(raw, pos);
        pos = next;

        let sub = if raw.get(pos) == Some(&b':') {
            let (v, n) = parse_number_at(raw, pos + 1);
            pos = n;
            v
        } else {
            0
        };
        params.push(CsiParam(main, sub));

        if raw.get(pos) == Some(&b';') {
            pos += 1;
        } else {
            break;
        }
    }
    params
}

/// Parse decimal digits from `start`. Returns `(value, next_position)`.
fn parse_number_at(buf: &[u8], start: usize) -> (u32, usize) {
    let mut val: u32 = 0;
    let mut pos = start;
    while let Some(d) = buf.get(pos).filter(|b| b.is_ascii_digit()) {
        val = val.saturating_mul(10).saturating_add(u32::from(d - b'0'));
        pos += 1;
    }
    (val, pos)
}

/// Decode a CSI modifier parameter (`1 + bitmask`). 0 and 1 mean none.
#[allow(clippy::cast_possible_truncation)]
const fn decode_modifiers(param: u32) -> Modifiers {
    let val = param.saturating_sub(1);
    Modifiers::from_bits_truncate(val as u8)
}

/// Kitty codepoints: plain Unicode, or functional keys in the private use
/// area starting at 57344.
fn kitty_codepoint_to_keycode(cp: u32) -> Option<KeyCode> {
    let code = match cp {
        27 | 57344 => KeyCode::Escape,
        13 | 57345 => KeyCode::Enter,
        9 | 57346 => KeyCode::Tab,
        127 | 57347 => KeyCode::Backspace,
        57348 => KeyCode::Insert,
        57349 => KeyCode::Delete,
        57350 => KeyCode::Left,
        57351 => KeyCode::Right,
        57352 => KeyCode::Up,
        57353 => KeyCode::Down,
        57354 => KeyCode::PageUp,
        57355 => KeyCode::PageDown,
        57356 => KeyCode::Home,
        57357 => KeyCode::End,
        #[allow(clippy::cast_possible_truncation)]
        cp @ 57364..=57375 => KeyCode::F((cp - 57364 + 1) as u8),
        // Lock keys, modifiers and the rest of the private use area.
        57358..=63743 => return None,
        cp => KeyCode::Char(char::from_u32(cp)?),
    };
    Some(code)
}

/// Byte length of a UTF-8 sequence from its lead byte, 0 if invalid.
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
