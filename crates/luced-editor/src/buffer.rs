// SPDX-License-Identifier: MIT
//! Line buffer: the document as an ordered sequence of lines.
//!
//! A `Buffer` wraps a [`ropey::Rope`]. The rope is built without ropey's
//! `unicode_lines` and `cr_lines` features, so `\n` is the only line break it
//! knows about. A lone `\r` is ordinary line content.
//!
//! # Invariants
//!
//! - There is always at least one line. An empty rope is one empty line.
//! - No line contains a `\n`. The file's final terminator is not kept in the
//!   rope; [`save`](Buffer::save) writes one after every line instead, so
//!   `"Hi\n"` loads as `["Hi"]` and saves back as `"Hi\n"`.
//! - Saving an unmodified buffer writes back the bytes it was loaded from,
//!   plus a final terminator if the file lacked one. Files that are not valid
//!   UTF-8 are read one byte per char ([`Encoding::Bytes`]) and written back
//!   the same way.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ropey::{Rope, RopeSlice};

use crate::position::Position;

// ---------------------------------------------------------------------------
// Line ending and encoding
// ---------------------------------------------------------------------------

/// Line ending style of a file.
///
/// `CrLf` only when every terminated line of the file ends in `\r\n`;
/// anything else is `Lf` and keeps its `\r` bytes as line content. New
/// buffers use `Lf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// The style of `text`: `CrLf` if it has at least one `\n` and every
    /// `\n` follows a `\r`.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut breaks = bytes
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| (b == b'\n').then_some(i))
            .peekable();
        if breaks.peek().is_some() && breaks.all(|i| i > 0 && bytes[i - 1] == b'\r') {
            Self::CrLf
        } else {
            Self::Lf
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
        }
    }
}

/// How the file's bytes map to the buffer's chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Valid UTF-8, stored as is.
    #[default]
    Utf8,
    /// Not valid UTF-8: every byte is one char (U+0000 to U+00FF). Saving
    /// turns those chars back into single bytes.
    Bytes,
}

impl Encoding {
    /// Decode file contents.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> (Cow<'_, str>, Self) {
        match std::str::from_utf8(bytes) {
            Ok(text) => (Cow::Borrowed(text), Self::Utf8),
            Err(_) => (bytes.iter().copied().map(char::from).collect(), Self::Bytes),
        }
    }

    /// Append `text` to `out` as file bytes.
    fn encode_into(self, text: &str, out: &mut Vec<u8>) {
        match self {
            Self::Utf8 => out.extend_from_slice(text.as_bytes()),
            Self::Bytes => {
                let mut scratch = [0u8; 4];
                for ch in text.chars() {
                    // Typed chars above U+00FF have no single byte; they go
                    // out as UTF-8.
                    match u8::try_from(ch) {
                        Ok(b) => out.push(b),
                        Err(_) => out.extend_from_slice(ch.encode_utf8(&mut scratch).as_bytes()),
                    }
                }
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("utf-8"),
            Self::Bytes => f.write_str("bytes"),
        }
    }
}

// ---------------------------------------------------------------------------
// Load outcome
// ---------------------------------------------------------------------------

/// Whether [`Buffer::load`] found a file to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file was read.
    Existing,
    /// No readable file; the buffer is one empty line. Nothing is created on
    /// disk until the first save.
    New,
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// A text buffer backed by a rope and tied to one file path.
pub struct Buffer {
    rope: Rope,
    path: PathBuf,
    modified: bool,
    on_disk: bool,
    line_ending: LineEnding,
    encoding: Encoding,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// An empty, unsaved buffer for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            rope: Rope::new(),
            path: path.into(),
            modified: false,
            on_disk: false,
            line_ending: LineEnding::Lf,
            encoding: Encoding::Utf8,
        }
    }

    /// A buffer holding `text`, parsed exactly as file contents would be.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new(PathBuf::new());
        buf.line_ending = LineEnding::detect(text);
        buf.rope = Rope::from_str(&split_lines(text, buf.line_ending));
        buf
    }

    /// Read `path` into a buffer.
    ///
    /// Never fails: a missing or unreadable file gives an empty buffer and
    /// [`LoadOutcome::New`]. Read errors other than "not found" are logged.
    #[must_use]
    pub fn load(path: &Path) -> (Self, LoadOutcome) {
        match fs::read(path) {
            Ok(bytes) => {
                let (text, encoding) = Encoding::decode(&bytes);
                let mut buf = Self::from_text(&text);
                buf.path = path.to_path_buf();
                buf.on_disk = true;
                buf.encoding = encoding;
                log::info!(
                    "loaded {} ({} lines, {}, {})",
                    path.display(),
                    buf.line_count(),
                    buf.line_ending,
                    buf.encoding
                );
                (buf, LoadOutcome::Existing)
            }
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    log::info!("{} does not exist, starting a new file", path.display());
                } else {
                    log::warn!("cannot read {}: {e}; starting empty", path.display());
                }
                (Self::new(path), LoadOutcome::New)
            }
        }
    }

    // -- Text access --------------------------------------------------------

    /// Number of lines, at least 1.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// A line's content without its terminator, or `None` past the end.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<RopeSlice<'_>> {
        let len = self.line_len(line)?;
        Some(self.rope.line(line).slice(..len))
    }

    /// A line's content as text.
    #[must_use]
    pub fn line_text(&self, line: usize) -> Option<Cow<'_, str>> {
        self.line(line).map(Cow::from)
    }

    /// Char count of a line, terminator excluded. `None` past the end.
    #[must_use]
    pub fn line_len(&self, line: usize) -> Option<usize> {
        if line >= self.line_count() {
            return None;
        }
        let slice = self.rope.line(line);
        let total = slice.len_chars();
        Some(if total > 0 && slice.char(total - 1) == '\n' {
            total - 1
        } else {
            total
        })
    }

    /// Every line, owned. Meant for tests and diagnostics.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count())
            .filter_map(|i| self.line_text(i).map(Cow::into_owned))
            .collect()
    }

    /// The whole text with `\n` separators and no trailing terminator.
    #[must_use]
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    // -- Coordinate conversion ----------------------------------------------

    /// Absolute char index of `pos`.
    ///
    /// `col` may equal the line length (just past the last char, where the
    /// line's `\n` sits). Anything further, or a line past the end, is `None`.
    #[must_use]
    pub fn pos_to_char_idx(&self, pos: Position) -> Option<usize> {
        let len = self.line_len(pos.line)?;
        (pos.col <= len).then(|| self.rope.line_to_char(pos.line) + pos.col)
    }

    /// The position of an absolute char index. An index equal to the total
    /// char count is the end of the last line; anything beyond is `None`.
    #[must_use]
    pub fn char_idx_to_pos(&self, char_idx: usize) -> Option<Position> {
        if char_idx > self.rope.len_chars() {
            return None;
        }
        let line = self.rope.char_to_line(char_idx);
        Some(Position::new(line, char_idx - self.rope.line_to_char(line)))
    }

    // -- Editing ------------------------------------------------------------

    /// Insert `text` at `pos`. Returns `false` (and changes nothing) if
    /// `pos` is not a valid position.
    ///
    /// `text` must already use `\n` terminators.
    pub fn insert(&mut self, pos: Position, text: &str) -> bool {
        let Some(idx) = self.pos_to_char_idx(pos) else {
            return false;
        };
        if !text.is_empty() {
            self.rope.insert(idx, text);
            self.modified = true;
        }
        true
    }

    /// Insert one char at `pos`. Returns `false` if `pos` is invalid.
    pub fn insert_char(&mut self, pos: Position, ch: char) -> bool {
        let Some(idx) = self.pos_to_char_idx(pos) else {
            return false;
        };
        self.rope.insert_char(idx, ch);
        self.modified = true;
        true
    }

    /// Append a new last line holding `text`.
    pub fn push_line(&mut self, text: &str) {
        let end = self.rope.len_chars();
        self.rope.insert_char(end, '\n');
        self.rope.insert(end + 1, text);
        self.modified = true;
    }

    /// Remove the char at `pos` and return it.
    ///
    /// At the end of a line that char is the line break, so the next line is
    /// joined on. Returns `None` at the end of the buffer or for an invalid
    /// position.
    pub fn remove_char(&mut self, pos: Position) -> Option<char> {
        let idx = self.pos_to_char_idx(pos)?;
        if idx >= self.rope.len_chars() {
            return None;
        }
        let ch = self.rope.char(idx);
        self.rope.remove(idx..=idx);
        self.modified = true;
        Some(ch)
    }

    // -- Metadata -----------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file name for display, falling back to the full path.
    #[must_use]
    pub fn display_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map_or_else(|| self.path.to_string_lossy(), |n| n.to_string_lossy())
    }

    /// Unsaved changes exist.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// The buffer was read from, or has been written to, its file.
    #[inline]
    #[must_use]
    pub const fn is_on_disk(&self) -> bool {
        self.on_disk
    }

    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    #[inline]
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    // -- File I/O -----------------------------------------------------------

    /// Write every line followed by the buffer's line ending, replacing the
    /// file. Clears the modified flag on success.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; the buffer is left untouched.
    pub fn save(&mut self) -> io::Result<()> {
        let path = self.path.clone();
        self.save_as(&path)
    }

    /// Like [`save`](Self::save) but to `path`, which becomes the buffer's
    /// path on success.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn save_as(&mut self, path: &Path) -> io::Result<()> {
        fs::write(path, self.bytes_for_disk())?;
        self.path = path.to_path_buf();
        self.modified = false;
        self.on_disk = true;
        log::info!("saved {} ({} lines)", path.display(), self.line_count());
        Ok(())
    }

    fn bytes_for_disk(&self) -> Vec<u8> {
        let ending = self.line_ending.as_str();
        let mut out = Vec::with_capacity(self.rope.len_bytes() + self.line_count() * ending.len());
        for line in 0..self.line_count() {
            if let Some(slice) = self.line(line) {
                for chunk in slice.chunks() {
                    self.encoding.encode_into(chunk, &mut out);
                }
            }
            out.extend_from_slice(ending.as_bytes());
        }
        out
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("lines", &self.line_count())
            .field("modified", &self.modified)
            .field("on_disk", &self.on_disk)
            .field("line_ending", &self.line_ending)
            .field("encoding", &self.encoding)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// File text as rope text: `\n` separators, no final terminator. With
/// `CrLf` the `\r` before each `\n` is dropped; any other `\r` stays.
fn split_lines(text: &str, ending: LineEnding) -> String {
    let body = text.strip_suffix('\n').unwrap_or(text);
    match ending {
        LineEnding::Lf => body.to_owned(),
        LineEnding::CrLf => {
            let body = if text.ends_with('\n') {
                body.strip_suffix('\r').unwrap_or(body)
            } else {
                body
            };
            body.replace("\r\n", "\n")
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
