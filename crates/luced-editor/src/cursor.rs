// SPDX-License-Identifier: MIT
//! Cursor: the edit position and how it moves.
//!
//! The `Cursor` tracks a position in a buffer and a sticky column for
//! vertical movement. It does not own or reference the buffer; the buffer is
//! passed to every method that needs it.
//!
//! # Bounds
//!
//! Every position a cursor takes goes through [`clamp`], the one place the
//! bounds rules live:
//!
//! - `line` is at most `line_count()`. That last value is the row just past
//!   the end of the buffer, where typing starts a new line.
//! - `col` is at most the line's length (0 on the past-the-end row), and at
//!   most the wrap width.
//!
//! # Sticky column
//!
//! Moving up or down remembers the column the cursor came from, so passing
//! through a short line and back onto a long one returns to that column.
//! Horizontal movement resets it.

use crate::buffer::Buffer;
use crate::position::Position;

/// Arrow-key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// A cursor in a text buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor {
    pos: Position,
    sticky_col: usize,
}

impl Cursor {
    /// A cursor at the origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pos: Position::ZERO,
            sticky_col: 0,
        }
    }

    /// A cursor at `pos`, taken as-is.
    #[must_use]
    pub const fn at(pos: Position) -> Self {
        Self {
            pos,
            sticky_col: pos.col,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    #[must_use]
    pub const fn line(&self) -> usize {
        self.pos.line
    }

    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.pos.col
    }

    #[inline]
    #[must_use]
    pub const fn sticky_col(&self) -> usize {
        self.sticky_col
    }

    /// Whether the cursor is on the row just past the last line.
    #[inline]
    #[must_use]
    pub fn is_past_end(&self, buf: &Buffer) -> bool {
        self.pos.line >= buf.line_count()
    }

    // -- Placement ----------------------------------------------------------

    /// Jump to `pos` (clamped). Resets the sticky column.
    pub fn set_position(&mut self, pos: Position, buf: &Buffer, width: usize) {
        self.pos = clamp(pos, buf, width);
        self.sticky_col = self.pos.col;
    }

    /// Re-clamp after the buffer changed underneath the cursor.
    pub fn clamp(&mut self, buf: &Buffer, width: usize) {
        self.pos = clamp(self.pos, buf, width);
    }

    // -- Movement -----------------------------------------------------------

    /// Move one step. Returns `false` when already at that boundary.
    pub fn step(&mut self, dir: Direction, buf: &Buffer, width: usize) -> bool {
        let before = self.pos;
        match dir {
            Direction::Left => self.move_left(buf, width),
            Direction::Right => self.move_right(buf, width),
            Direction::Up => self.move_up(buf, width),
            Direction::Down => self.move_down(buf, width),
        }
        self.pos != before
    }

    /// One char left, or to the end of the previous line from column 0.
    pub fn move_left(&mut self, buf: &Buffer, width: usize) {
        let here = clamp(self.pos, buf, width);
        let target = if here.col > 0 {
            here.with_col(here.col - 1)
        } else if here.line > 0 {
            let prev = here.line - 1;
            Position::new(prev, buf.line_len(prev).unwrap_or(0))
        } else {
            here
        };
        self.set_position(target, buf, width);
    }

    /// One char right, or to the start of the next line from the end of a
    /// line. The past-the-end row is never entered this way.
    pub fn move_right(&mut self, buf: &Buffer, width: usize) {
        let here = clamp(self.pos, buf, width);
        let target = if here.col < max_col(buf, here.line, width) {
            here.with_col(here.col + 1)
        } else if here.line + 1 < buf.line_count() {
            here.next_line_start()
        } else {
            here
        };
        self.set_position(target, buf, width);
    }

    /// One line up, keeping the sticky column where the line allows.
    pub fn move_up(&mut self, buf: &Buffer, width: usize) {
        let line = self.pos.line.min(buf.line_count());
        if line == 0 {
            return;
        }
        self.vertical_to(line - 1, buf, width);
    }

    /// One line down, keeping the sticky column where the line allows.
    pub fn move_down(&mut self, buf: &Buffer, width: usize) {
        if self.pos.line + 1 >= buf.line_count() {
            return;
        }
        self.vertical_to(self.pos.line + 1, buf, width);
    }

    fn vertical_to(&mut self, line: usize, buf: &Buffer, width: usize) {
        self.pos = clamp(Position::new(line, self.sticky_col), buf, width);
    }
}

// ---------------------------------------------------------------------------
// Clamping
// ---------------------------------------------------------------------------

/// Largest column on `line`: its length, capped at the wrap width.
/// The past-the-end row only has column 0.
fn max_col(buf: &Buffer, line: usize, width: usize) -> usize {
    buf.line_len(line).unwrap_or(0).min(width.max(1))
}

/// The nearest valid position to `pos`.
#[must_use]
pub fn clamp(pos: Position, buf: &Buffer, width: usize) -> Position {
    let line = pos.line.min(buf.line_count());
    Position::new(line, pos.col.min(max_col(buf, line, width)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 80;

    // "hello" (5), "world" (5), "hi" (2), "" (0), "goodbye" (7)
    fn sample_buffer() -> Buffer {
        Buffer::from_text("hello\nworld\nhi\n\ngoodbye")
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_at_origin() {
        let c = Cursor::new();
        assert_eq!(c.position(), Position::ZERO);
        assert_eq!(c.sticky_col(), 0);
        assert_eq!(Cursor::default(), c);
    }

    #[test]
    fn at_sets_sticky() {
        let c = Cursor::at(Position::new(3, 7));
        assert_eq!(c.position(), Position::new(3, 7));
        assert_eq!(c.sticky_col(), 7);
    }

    // -- clamp --------------------------------------------------------------

    #[test]
    fn clamp_keeps_valid_positions() {
        let buf = sample_buffer();
        assert_eq!(clamp(Position::new(1, 3), &buf, W), Position::new(1, 3));
        assert_eq!(clamp(Position::new(0, 5), &buf, W), Position::new(0, 5));
    }

    #[test]
    fn clamp_col_to_line_length() {
        let buf = sample_buffer();
        assert_eq!(clamp(Position::new(2, 9), &buf, W), Position::new(2, 2));
        assert_eq!(clamp(Position::new(3, 4), &buf, W), Position::new(3, 0));
    }

    #[test]
    fn clamp_allows_past_end_row_at_col_zero() {
        let buf = sample_buffer();
        assert_eq!(clamp(Position::new(5, 3), &buf, W), Position::new(5, 0));
        assert_eq!(clamp(Position::new(50, 3), &buf, W), Position::new(5, 0));
    }

    #[test]
    fn clamp_col_to_width() {
        let buf = sample_buffer();
        assert_eq!(clamp(Position::new(4, 7), &buf, 4), Position::new(4, 4));
    }

    #[test]
    fn clamp_zero_width_acts_as_one() {
        let buf = sample_buffer();
        assert_eq!(clamp(Position::new(0, 3), &buf, 0), Position::new(0, 1));
    }

    // -- Horizontal ---------------------------------------------------------

    #[test]
    fn left_within_line() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(0, 3));
        assert!(c.step(Direction::Left, &buf, W));
        assert_eq!(c.position(), Position::new(0, 2));
    }

    #[test]
    fn left_from_line_start_wraps_to_previous_end() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(2, 0));
        c.move_left(&buf, W);
        assert_eq!(c.position(), Position::new(1, 5));
    }

    #[test]
    fn left_at_origin_is_noop() {
        let buf = sample_buffer();
        let mut c = Cursor::new();
        assert!(!c.step(Direction::Left, &buf, W));
        assert_eq!(c.position(), Position::ZERO);
    }

    #[test]
    fn left_from_past_end_row() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(5, 0));
        c.move_left(&buf, W);
        assert_eq!(c.position(), Position::new(4, 7));
    }

    #[test]
    fn right_within_line() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(0, 4));
        c.move_right(&buf, W);
        assert_eq!(c.position(), Position::new(0, 5));
    }

    #[test]
    fn right_from_line_end_wraps_to_next_start() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(0, 5));
        c.move_right(&buf, W);
        assert_eq!(c.position(), Position::new(1, 0));
    }

    #[test]
    fn right_at_buffer_end_is_noop() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(4, 7));
        assert!(!c.step(Direction::Right, &buf, W));
        assert_eq!(c.position(), Position::new(4, 7));
    }

    #[test]
    fn horizontal_resets_sticky() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(0, 4));
        c.move_left(&buf, W);
        assert_eq!(c.sticky_col(), 3);
    }

    // -- Vertical -----------------------------------------------------------

    #[test]
    fn down_keeps_column() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(0, 3));
        c.move_down(&buf, W);
        assert_eq!(c.position(), Position::new(1, 3));
    }

    #[test]
    fn down_through_short_lines_remembers_column() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(1, 4));
        c.move_down(&buf, W);
        assert_eq!(c.position(), Position::new(2, 2));
        c.move_down(&buf, W);
        assert_eq!(c.position(), Position::new(3, 0));
        c.move_down(&buf, W);
        assert_eq!(c.position(), Position::new(4, 4));
    }

    #[test]
    fn up_at_first_line_is_noop() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(0, 2));
        assert!(!c.step(Direction::Up, &buf, W));
    }

    #[test]
    fn down_at_last_line_is_noop() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(4, 2));
        assert!(!c.step(Direction::Down, &buf, W));
        assert_eq!(c.position(), Position::new(4, 2));
    }

    #[test]
    fn up_from_past_end_row_reaches_last_line() {
        let buf = sample_buffer();
        let mut c = Cursor::at(Position::new(5, 0));
        assert!(c.is_past_end(&buf));
        c.move_up(&buf, W);
        assert_eq!(c.position(), Position::new(4, 0));
    }

    // -- Invariant ----------------------------------------------------------

    #[test]
    fn any_move_sequence_stays_in_bounds() {
        let buf = sample_buffer();
        let dirs = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];
        let mut c = Cursor::new();
        // Deterministic pseudo-random walk.
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..2_000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let dir = dirs[(seed % 4) as usize];
            c.step(dir, &buf, 6);

            let pos = c.position();
            assert!(pos.line <= buf.line_count());
            let max = buf.line_len(pos.line).unwrap_or(0).min(6);
            assert!(pos.col <= max, "{pos:?} out of bounds after {dir:?}");
        }
    }
}
