// SPDX-License-Identifier: MIT
//
// Output buffering and full-frame rendering.
//
// Three pieces work together:
//
//   OutputBuffer: accumulates all ANSI bytes in memory so the entire frame
//   can be written in a single write() syscall.
//
//   CellWriter: tracks the attributes and cursor position the terminal is
//   currently in and skips redundant escape sequences while walking a row.
//
//   write_frame: emits every cell of a FrameBuffer, top-left to
//   bottom-right, wrapped in synchronized output. Each call starts from a
//   fresh CellWriter and an SGR reset, so the same frame always produces
//   the same bytes. There is no diffing against the previous frame: every
//   pass is a full-screen redraw.

use std::io::{self, Write};

use crate::ansi::{self, Mode};
use crate::buffer::FrameBuffer;
use crate::cell::{Attr, Cell};

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates ANSI output for a single `write()` syscall.
///
/// Default capacity: 16 KB: enough for an 80×24 frame with styling many
/// times over.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Write a Unicode codepoint as UTF-8.
    ///
    /// Invalid codepoints (including 0, the continuation marker) produce `?`.
    pub fn write_codepoint(&mut self, cp: u32) {
        if cp == 0 {
            self.buf.push(b'?');
            return;
        }
        match char::from_u32(cp) {
            Some(ch) => {
                let mut enc = [0u8; 4];
                let s = ch.encode_utf8(&mut enc);
                self.buf.extend_from_slice(s.as_bytes());
            }
            None => self.buf.push(b'?'),
        }
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to stdout and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        self.flush_to(&mut stdout)
    }

    /// Write accumulated output to an arbitrary writer and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through flush_stdout() / flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Stateful cell renderer that tracks terminal state to skip redundant escapes.
///
/// - **Cursor**: skipped when the next cell is at `(last_x + 1, last_y)`,
///   since the terminal auto-advances after character output.
/// - **Attributes**: on change, reset (SGR 0) and re-emit. Going from no
///   attributes to some skips the reset.
/// - **Wide chars**: continuation cells produce no output when preceded by
///   their wide char start.
#[allow(clippy::struct_field_names)] // The `last_` prefix IS the semantic grouping.
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_attrs: Attr,
}

impl CellWriter {
    /// Create a writer with no tracked state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_attrs: Attr::empty(),
        }
    }

    /// Render a single cell, emitting only the escape sequences needed.
    pub fn render_cell(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell) {
        let xi = i32::from(x);
        let yi = i32::from(y);

        if yi != self.last_y || xi != self.last_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }

        if cell.is_continuation() {
            if xi > 0 && self.last_x == xi - 1 && self.last_y == yi {
                self.last_x = xi;
                return;
            }
            self.apply_attrs(out, cell.attrs);
            out.buf.push(b' ');
            self.last_x = xi;
            self.last_y = yi;
            return;
        }

        self.apply_attrs(out, cell.attrs);
        out.write_codepoint(cell.ch);

        self.last_x = xi;
        self.last_y = yi;
    }

    fn apply_attrs(&mut self, out: &mut OutputBuffer, attrs: Attr) {
        if attrs == self.last_attrs {
            return;
        }
        if !self.last_attrs.is_empty() {
            ansi::reset(out).ok();
        }
        self.last_attrs = attrs;
        ansi::attrs(out, attrs).ok();
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Full Frame ──────────────────────────────────────────────────────────────

/// Emit the complete frame into `out`.
///
/// Hides the cursor for the duration of the redraw; the caller positions
/// and shows it afterwards. The terminal is left with attributes reset.
pub fn write_frame(out: &mut OutputBuffer, frame: &FrameBuffer) {
    ansi::set(out, Mode::SyncOutput).ok();
    ansi::set(out, Mode::HiddenCursor).ok();
    ansi::reset(out).ok();

    let mut writer = CellWriter::new();
    for y in 0..frame.height() {
        let Some(row) = frame.row(y) else { break };
        for (x, cell) in (0..frame.width()).zip(row) {
            writer.render_cell(out, x, y, cell);
        }
    }

    ansi::reset(out).ok();
    ansi::unset(out, Mode::SyncOutput).ok();
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(out: &OutputBuffer) -> String {
        String::from_utf8_lossy(out.as_bytes()).into_owned()
    }

    // ── OutputBuffer ────────────────────────────────────────────────

    #[test]
    fn output_buffer_starts_empty() {
        let out = OutputBuffer::new();
        assert!(out.is_empty());
        assert_eq!(out.len(), 0);
    }

    #[test]
    fn write_trait_appends() {
        let mut out = OutputBuffer::new();
        out.write_all(b"abc").unwrap();
        out.write_all(b"def").unwrap();
        assert_eq!(out.as_bytes(), b"abcdef");
    }

    #[test]
    fn write_codepoint_utf8() {
        let mut out = OutputBuffer::new();
        out.write_codepoint('é' as u32);
        out.write_codepoint('中' as u32);
        assert_eq!(text(&out), "é中");
    }

    #[test]
    fn write_codepoint_invalid_is_question_mark() {
        let mut out = OutputBuffer::new();
        out.write_codepoint(0);
        out.write_codepoint(0xD800);
        assert_eq!(text(&out), "??");
    }

    #[test]
    fn flush_to_writes_and_clears() {
        let mut out = OutputBuffer::new();
        out.write_all(b"frame").unwrap();
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"frame");
        assert!(out.is_empty());
    }

    #[test]
    fn flush_to_empty_writes_nothing() {
        let mut out = OutputBuffer::new();
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert!(sink.is_empty());
    }

    // ── CellWriter ──────────────────────────────────────────────────

    #[test]
    fn sequential_cells_skip_cursor_moves() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('a'));
        w.render_cell(&mut out, 1, 0, &Cell::new('b'));
        assert_eq!(text(&out), "\x1b[1;1Hab");
    }

    #[test]
    fn jump_emits_cursor_move() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('a'));
        w.render_cell(&mut out, 0, 1, &Cell::new('b'));
        assert_eq!(text(&out), "\x1b[1;1Ha\x1b[2;1Hb");
    }

    #[test]
    fn attrs_emitted_once_per_run() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::styled('a', Attr::INVERSE));
        w.render_cell(&mut out, 1, 0, &Cell::styled('b', Attr::INVERSE));
        w.render_cell(&mut out, 2, 0, &Cell::new('c'));
        assert_eq!(text(&out), "\x1b[1;1H\x1b[7mab\x1b[0mc");
    }

    #[test]
    fn continuation_after_wide_char_is_silent() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('中'));
        w.render_cell(&mut out, 1, 0, &Cell::continuation(Attr::empty()));
        w.render_cell(&mut out, 2, 0, &Cell::new('x'));
        assert_eq!(text(&out), "\x1b[1;1H中x");
    }

    #[test]
    fn orphan_continuation_becomes_space() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 3, 0, &Cell::continuation(Attr::empty()));
        assert_eq!(text(&out), "\x1b[1;4H ");
    }

    // ── write_frame ─────────────────────────────────────────────────

    #[test]
    fn write_frame_covers_every_row() {
        let mut frame = FrameBuffer::new(3, 2);
        frame.paint_text(0, 0, "ab", Attr::empty());
        frame.paint_text(0, 1, "cd", Attr::empty());
        let mut out = OutputBuffer::new();
        write_frame(&mut out, &frame);
        let s = text(&out);
        assert!(s.starts_with("\x1b[?2026h"));
        assert!(s.ends_with("\x1b[?2026l"));
        assert!(s.contains("\x1b[1;1Hab \x1b[2;1Hcd "));
    }

    #[test]
    fn write_frame_is_idempotent() {
        let mut frame = FrameBuffer::new(10, 3);
        frame.fill_row(0, Attr::BOLD | Attr::INVERSE);
        frame.paint_text(2, 0, "title", Attr::BOLD | Attr::INVERSE);
        frame.paint_text(0, 1, "body 中", Attr::empty());

        let mut first = OutputBuffer::new();
        write_frame(&mut first, &frame);
        let mut second = OutputBuffer::new();
        write_frame(&mut second, &frame);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn write_frame_hides_cursor_while_drawing() {
        let frame = FrameBuffer::new(1, 1);
        let mut out = OutputBuffer::new();
        write_frame(&mut out, &frame);
        assert!(text(&out).contains("\x1b[?25l"));
    }

    #[test]
    fn write_frame_empty_frame() {
        let frame = FrameBuffer::new(0, 0);
        let mut out = OutputBuffer::new();
        write_frame(&mut out, &frame);
        assert_eq!(text(&out), "\x1b[?2026h\x1b[?25l\x1b[0m\x1b[0m\x1b[?2026l");
    }
}
