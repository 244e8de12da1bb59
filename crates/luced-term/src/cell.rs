// SPDX-License-Identifier: MIT
//
// Cell: the atomic unit of terminal rendering.
//
// Every character position on screen is a Cell: a Unicode codepoint plus the
// text attributes it is drawn with. The editor only ever needs the terminal's
// default colors and a handful of SGR attributes (bold and inverse for the
// chrome bars), so a cell carries no color of its own.
//
// Wide characters (CJK, some emoji) occupy two columns. The first cell
// holds the codepoint; the second is a continuation cell (ch = 0). The
// output stage skips continuation cells when emitting characters.

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes stored as a compact bitfield.
    ///
    /// These map directly to SGR (Select Graphic Rendition) parameters
    /// in the ANSI escape sequence standard. Combine with bitwise OR:
    ///
    /// ```
    /// use luced_term::cell::Attr;
    ///
    /// let chrome = Attr::BOLD | Attr::INVERSE;
    /// assert!(chrome.contains(Attr::BOLD));
    /// assert!(chrome.contains(Attr::INVERSE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1: increased intensity.
        const BOLD    = 1 << 0;
        /// SGR 7: swap foreground and background (reverse video).
        const INVERSE = 1 << 1;
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell.
///
/// `Copy`, 8 bytes. A frame is a flat grid of these; the renderer writes
/// every one of them on each pass.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Unicode codepoint to display.
    ///
    /// - `0` = continuation cell (second column of a wide character)
    /// - `b' '` (32) = empty / space (the default)
    /// - Any other value = the character to render
    pub ch: u32,

    /// Text attributes (bold, inverse, ...).
    pub attrs: Attr,
}

/// Continuation marker: a cell whose `ch` is 0 belongs to the preceding
/// wide character and should not produce character output.
const CONTINUATION: u32 = 0;

/// Default character for empty cells.
const SPACE: u32 = b' ' as u32;

impl Cell {
    /// An empty cell: space character, no attributes.
    pub const EMPTY: Self = Self {
        ch: SPACE,
        attrs: Attr::empty(),
    };

    /// Create a cell with a character and no attributes.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch: ch as u32,
            attrs: Attr::empty(),
        }
    }

    /// Create a cell with a character and attributes.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, attrs: Attr) -> Self {
        Self {
            ch: ch as u32,
            attrs,
        }
    }

    /// Create a continuation cell for wide characters.
    ///
    /// Continuation cells inherit the attributes of the preceding wide
    /// character so reverse-video runs stay unbroken.
    #[inline]
    #[must_use]
    pub const fn continuation(attrs: Attr) -> Self {
        Self {
            ch: CONTINUATION,
            attrs,
        }
    }

    // ─── Queries ──────────────────────────────────────────────────────────

    /// Whether this is a continuation cell (second column of a wide char).
    #[inline]
    #[must_use]
    pub const fn is_continuation(self) -> bool {
        self.ch == CONTINUATION
    }

    /// Whether this cell is visually empty (space, no styling).
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.ch == SPACE && self.attrs.is_empty()
    }

    /// The Unicode codepoint as a `char`, if valid.
    ///
    /// Returns `None` for continuation cells (`ch = 0`) and any
    /// invalid Unicode scalar values.
    #[inline]
    #[must_use]
    pub const fn character(self) -> Option<char> {
        if self.ch == CONTINUATION {
            return None;
        }
        char::from_u32(self.ch)
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_continuation() {
            write!(f, "Cell(continuation)")
        } else {
            let ch = char::from_u32(self.ch).unwrap_or('?');
            write!(f, "Cell({ch:?}")?;
            if !self.attrs.is_empty() {
                write!(f, ", {:?}", self.attrs)?;
            }
            write!(f, ")")
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
