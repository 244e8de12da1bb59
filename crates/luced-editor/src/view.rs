// SPDX-License-Identifier: MIT
//! View: paints the whole screen from the buffer, cursor and message.
//!
//! Screen layout:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │   Luced v0.1.0 - ... | notes.txt [+] │  ← title bar (BOLD | INVERSE)
//! ├──────────────────────────────────────┤
//! │ text rows                            │  ← rows - 2, cursor-centered
//! │            File saved successfully.  │  ← message overlay, mid-screen
//! │              New File                │  ← until the file exists
//! ├──────────────────────────────────────┤
//! │   Ctrl + Shift + V: Paste ...        │  ← help bar (BOLD | INVERSE)
//! └──────────────────────────────────────┘
//! ```
//!
//! Nothing is kept between frames. The visible window is worked out from the
//! cursor on every call, and every cell of the frame is written, so the same
//! state always paints the same frame.
//!
//! Control characters in the text (a tab loaded from disk, say) are shown as
//! one blank column so the cursor column still matches what is on screen.

use unicode_width::UnicodeWidthChar;

use luced_term::buffer::{FrameBuffer, string_width};
use luced_term::cell::Attr;

use crate::buffer::Buffer;
use crate::cursor::Cursor;

/// Title bar text.
pub const TITLE: &str = concat!("Luced v", env!("CARGO_PKG_VERSION"), " - Terminal Text Editor");

/// Help bar text.
pub const HELP: &str = "Ctrl + Shift + V: Paste Clipboard Content  Ctrl + S: Save File  \
                        Ctrl + Q: Exit  Ctrl + Shift + C: Copy to Clipboard";

/// Tag shown while the buffer's file does not exist yet.
pub const NEW_FILE_TAG: &str = "New File";

const CHROME: Attr = Attr::BOLD.union(Attr::INVERSE);

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The slice of buffer lines on screen for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible buffer line.
    pub top: usize,
    /// Number of text rows.
    pub height: usize,
}

impl Viewport {
    /// The window for a terminal `rows` tall with the cursor on
    /// `cursor_line`. The cursor line sits in the middle once there is
    /// enough text above it.
    #[must_use]
    pub const fn centered(cursor_line: usize, rows: u16) -> Self {
        let height = text_height(rows);
        Self {
            top: cursor_line.saturating_sub(height / 2),
            height,
        }
    }

    /// Whether `line` falls inside the window.
    #[inline]
    #[must_use]
    pub const fn contains(&self, line: usize) -> bool {
        line >= self.top && line < self.top + self.height
    }
}

/// Text rows between the two bars, at least 1.
#[must_use]
pub const fn text_height(rows: u16) -> usize {
    let h = rows.saturating_sub(2) as usize;
    if h == 0 { 1 } else { h }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Paint one full frame and return the terminal cell the cursor belongs in.
///
/// `message` is drawn centered over the text when present; each `\n` starts
/// a new centered line.
pub fn render(frame: &mut FrameBuffer, buf: &Buffer, cursor: &Cursor, message: Option<&str>) -> (u16, u16) {
    frame.clear();
    let cols = frame.width();
    let rows = frame.height();
    if cols == 0 || rows == 0 {
        return (0, 0);
    }

    let view = Viewport::centered(cursor.line(), rows);
    let last_text_row = rows.saturating_sub(2).max(1);

    render_title(frame, buf);

    for row in 0..view.height {
        let Ok(y) = u16::try_from(row + 1) else { break };
        if let Some(text) = buf.line_text(view.top + row) {
            frame.paint_text(0, y, &displayable(&text), Attr::empty());
        }
    }

    if !buf.is_on_disk() {
        paint_centered(frame, last_text_row, &format!(" {NEW_FILE_TAG} "), CHROME);
    }

    if rows >= 2 {
        let help_y = rows - 1;
        frame.fill_row(help_y, CHROME);
        paint_centered(frame, help_y, HELP, CHROME);
    }

    if let Some(message) = message {
        render_message(frame, message);
    }

    cursor_cell(buf, cursor, view, cols, rows)
}

fn render_title(frame: &mut FrameBuffer, buf: &Buffer) {
    let dirty = if buf.is_modified() { " [+]" } else { "" };
    let title = format!("{TITLE} | {}{dirty}", buf.display_name());
    frame.fill_row(0, CHROME);
    paint_centered(frame, 0, &title, CHROME);
}

fn render_message(frame: &mut FrameBuffer, message: &str) {
    let lines: Vec<&str> = message.lines().collect();
    let count = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let first = (frame.height() / 2).saturating_sub(count / 2);
    for (y, line) in (first..frame.height()).zip(lines) {
        paint_centered(frame, y, &format!(" {line} "), CHROME);
    }
}

/// Paint `text` horizontally centered on row `y`. Text wider than the row
/// starts at column 0 and is cut at the edge.
fn paint_centered(frame: &mut FrameBuffer, y: u16, text: &str, attrs: Attr) {
    let width = string_width(text);
    let x = usize::from(frame.width()).saturating_sub(width) / 2;
    // x <= frame width, which is a u16.
    #[allow(clippy::cast_possible_truncation)]
    let x = x as u16;
    frame.paint_text(x, y, text, attrs);
}

/// Screen cell for the cursor. Columns past the right edge are pinned to
/// the last column.
fn cursor_cell(buf: &Buffer, cursor: &Cursor, view: Viewport, cols: u16, rows: u16) -> (u16, u16) {
    let x = buf.line(cursor.line()).map_or(0, |line| {
        line.chars().take(cursor.col()).map(display_width).sum::<usize>()
    });
    let x = u16::try_from(x).unwrap_or(u16::MAX).min(cols - 1);
    let row = cursor.line().saturating_sub(view.top) + 1;
    let y = u16::try_from(row).unwrap_or(u16::MAX).min(rows - 1);
    (x, y)
}

/// Columns `ch` takes on screen, with control characters shown as a blank.
fn display_width(ch: char) -> usize {
    if ch.is_control() { 1 } else { ch.width().unwrap_or(0) }
}

fn displayable(text: &str) -> String {
    text.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use luced_term::output::{OutputBuffer, write_frame};
    use pretty_assertions::assert_eq;

    fn saved(text: &str) -> Buffer {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, text).unwrap();
        Buffer::load(&path).0
    }

    fn is_chrome(frame: &FrameBuffer, x: u16, y: u16) -> bool {
        frame.get(x, y).is_some_and(|c| c.attrs.contains(CHROME))
    }

    // ── Viewport ──────────────────────────────────────────────────────

    #[test]
    fn viewport_starts_at_top_near_beginning() {
        assert_eq!(Viewport::centered(3, 24), Viewport { top: 0, height: 22 });
    }

    #[test]
    fn viewport_centers_cursor_line() {
        let view = Viewport::centered(100, 24);
        assert_eq!(view.top, 89);
        assert!(view.contains(100));
        assert!(!view.contains(111));
    }

    #[test]
    fn text_height_has_floor_of_one() {
        assert_eq!(text_height(24), 22);
        assert_eq!(text_height(2), 1);
        assert_eq!(text_height(0), 1);
    }

    // ── Layout ────────────────────────────────────────────────────────

    #[test]
    fn title_and_help_bars() {
        let buf = saved("hello\n");
        let mut frame = FrameBuffer::new(120, 10);
        render(&mut frame, &buf, &Cursor::new(), None);

        let title = frame.row_text(0);
        assert!(title.contains(TITLE));
        assert!(title.contains("notes.txt"));
        assert!(!title.contains("[+]"));
        assert!(is_chrome(&frame, 0, 0));
        assert!(is_chrome(&frame, 119, 0));

        assert!(frame.row_text(9).contains("Ctrl + S: Save File"));
        assert!(is_chrome(&frame, 0, 9));
    }

    #[test]
    fn title_marks_unsaved_changes() {
        let mut buf = saved("hello\n");
        buf.insert_char(Position::ZERO, 'x');
        let mut frame = FrameBuffer::new(120, 10);
        render(&mut frame, &buf, &Cursor::new(), None);
        assert!(frame.row_text(0).contains("notes.txt [+]"));
    }

    #[test]
    fn text_rows_follow_title() {
        let buf = saved("first\nsecond\n");
        let mut frame = FrameBuffer::new(40, 10);
        render(&mut frame, &buf, &Cursor::new(), None);
        assert_eq!(frame.row_text(1).trim_end(), "first");
        assert_eq!(frame.row_text(2).trim_end(), "second");
        assert_eq!(frame.row_text(3).trim_end(), "");
    }

    #[test]
    fn long_lines_are_cut_at_the_edge() {
        let buf = saved("abcdefghijkl\n");
        let mut frame = FrameBuffer::new(8, 6);
        render(&mut frame, &buf, &Cursor::new(), None);
        assert_eq!(frame.row_text(1), "abcdefgh");
    }

    #[test]
    fn new_file_tag_until_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");
        let (mut buf, _) = Buffer::load(&path);
        let mut frame = FrameBuffer::new(40, 8);

        render(&mut frame, &buf, &Cursor::new(), None);
        assert!(frame.row_text(6).contains(NEW_FILE_TAG));

        buf.save().unwrap();
        render(&mut frame, &buf, &Cursor::new(), None);
        assert!(!frame.row_text(6).contains(NEW_FILE_TAG));
    }

    #[test]
    fn message_overlay_is_centered() {
        let buf = saved("text\n");
        let mut frame = FrameBuffer::new(40, 11);
        render(&mut frame, &buf, &Cursor::new(), Some("one\nlonger line"));

        let first = frame.row_text(4);
        let second = frame.row_text(5);
        assert_eq!(first.trim(), "one");
        assert_eq!(second.trim(), "longer line");
        let x = u16::try_from(first.find("one").unwrap()).unwrap();
        assert!(is_chrome(&frame, x, 4));
    }

    // ── Cursor ────────────────────────────────────────────────────────

    #[test]
    fn cursor_cell_offsets_by_title_row() {
        let buf = saved("hello\nworld\n");
        let mut frame = FrameBuffer::new(40, 10);
        let cell = render(&mut frame, &buf, &Cursor::at(Position::new(1, 3)), None);
        assert_eq!(cell, (3, 2));
    }

    #[test]
    fn cursor_cell_when_scrolled() {
        let text: String = (0..100).map(|i| format!("line {i}\n")).collect();
        let buf = saved(&text);
        let mut frame = FrameBuffer::new(40, 12);
        let cell = render(&mut frame, &buf, &Cursor::at(Position::new(50, 2)), None);
        // 10 text rows: top = 45, so line 50 is text row 5, screen row 6.
        assert_eq!(cell, (2, 6));
        assert_eq!(frame.row_text(6).trim_end(), "line 50");
    }

    #[test]
    fn cursor_on_past_end_row() {
        let buf = saved("a\nb\n");
        let mut frame = FrameBuffer::new(40, 10);
        let cell = render(&mut frame, &buf, &Cursor::at(Position::new(2, 0)), None);
        assert_eq!(cell, (0, 3));
    }

    #[test]
    fn cursor_past_right_edge_is_pinned() {
        let buf = saved("abcdefgh\n");
        let mut frame = FrameBuffer::new(8, 6);
        let cell = render(&mut frame, &buf, &Cursor::at(Position::new(0, 8)), None);
        assert_eq!(cell, (7, 1));
    }

    #[test]
    fn cursor_counts_wide_and_control_chars() {
        let buf = saved("中\tx\n");
        let mut frame = FrameBuffer::new(40, 6);
        let cell = render(&mut frame, &buf, &Cursor::at(Position::new(0, 3)), None);
        assert_eq!(cell, (4, 1));
        assert_eq!(frame.row_text(1).trim_end(), "中 x");
    }

    // ── Idempotence ───────────────────────────────────────────────────

    #[test]
    fn same_state_paints_same_bytes() {
        let buf = saved("alpha\nbeta\ngamma\n");
        let cursor = Cursor::at(Position::new(1, 2));
        let mut frame = FrameBuffer::new(30, 8);

        let first_cell = render(&mut frame, &buf, &cursor, Some("File saved successfully."));
        let mut first = OutputBuffer::new();
        write_frame(&mut first, &frame);

        let second_cell = render(&mut frame, &buf, &cursor, Some("File saved successfully."));
        let mut second = OutputBuffer::new();
        write_frame(&mut second, &frame);

        assert_eq!(first_cell, second_cell);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let buf = saved("hello\n");
        for (w, h) in [(1, 1), (1, 2), (3, 1), (0, 0)] {
            let mut frame = FrameBuffer::new(w, h);
            let (x, y) = render(&mut frame, &buf, &Cursor::at(Position::new(0, 5)), Some("hi"));
            assert!(w == 0 || x < w);
            assert!(h == 0 || y < h);
        }
    }
}
