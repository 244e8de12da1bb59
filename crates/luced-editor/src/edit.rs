// SPDX-License-Identifier: MIT
//! Edit engine: one function per thing a key can do to the text.
//!
//! Every operation takes the buffer, the cursor and the wrap width, changes
//! them in place and reports what happened as an [`EditOutcome`]. Nothing
//! here keeps state between calls.
//!
//! # Hard wrap
//!
//! Insertion is the only place lines are wrapped. When an insert leaves a
//! line longer than the width, the line is split at the width and the
//! overflow becomes the following line. The split is permanent, and a typed
//! char that causes it moves the cursor onto the overflow line. Lines that
//! are already too long (loaded from disk, or after a resize) are left alone
//! until something is typed into them.
//!
//! # The past-the-end row
//!
//! The cursor may sit one row below the last line. Typing there appends a
//! line, Enter appends an empty line and moves below it, Backspace steps back
//! to the end of the last line and Delete does nothing.

use crate::buffer::Buffer;
use crate::cursor::{Cursor, Direction, clamp};
use crate::position::Position;

/// Spaces a pasted tab expands to.
pub const TAB_WIDTH: usize = 4;

/// What an edit operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The buffer changed (the cursor probably moved too).
    Changed,
    /// Only the cursor moved.
    Moved,
    /// Nothing happened: the operation hit a boundary.
    NoOp,
}

/// Whether `ch` may be typed into the buffer.
#[inline]
#[must_use]
pub fn is_insertable(ch: char) -> bool {
    !ch.is_control()
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

/// Type `ch` at the cursor.
pub fn insert_char(buf: &mut Buffer, cursor: &mut Cursor, ch: char, width: usize) -> EditOutcome {
    if !is_insertable(ch) {
        return EditOutcome::NoOp;
    }
    let width = width.max(1);

    if cursor.is_past_end(buf) {
        let line = buf.line_count();
        let mut text = [0u8; 4];
        buf.push_line(ch.encode_utf8(&mut text));
        cursor.set_position(Position::new(line, 1), buf, width);
        return EditOutcome::Changed;
    }

    let pos = clamp(cursor.position(), buf, width);
    let Some(start) = buf.pos_to_char_idx(pos) else {
        return EditOutcome::NoOp;
    };
    buf.insert_char(pos, ch);

    let mut idx = start + 1;
    if hard_wrap(buf, pos.line, pos.line, width, &mut idx) == 0 {
        place_at_char(cursor, buf, idx, width);
    } else {
        // The cursor follows the overflow: to the matching column if the
        // typed char went there, else to the start of the new line.
        let landed = buf.char_idx_to_pos(idx).filter(|p| p.line > pos.line);
        let target = landed.unwrap_or_else(|| Position::new(pos.line + 1, 0));
        cursor.set_position(target, buf, width);
    }
    EditOutcome::Changed
}

/// Split the line at the cursor. The cursor lands at the start of the new
/// line.
pub fn insert_newline(buf: &mut Buffer, cursor: &mut Cursor, width: usize) -> EditOutcome {
    if cursor.is_past_end(buf) {
        // Materialize the virtual row, then sit below it again.
        buf.push_line("");
        let below = buf.line_count();
        cursor.set_position(Position::new(below, 0), buf, width);
        return EditOutcome::Changed;
    }

    let pos = clamp(cursor.position(), buf, width);
    if !buf.insert_char(pos, '\n') {
        return EditOutcome::NoOp;
    }
    cursor.set_position(pos.next_line_start(), buf, width);
    EditOutcome::Changed
}

/// Insert a block of text, such as a paste, at the cursor.
///
/// Text without a line break goes in at the cursor. Text with breaks is
/// inserted as whole lines: the first pasted line continues the text before
/// the cursor, and the rest of the cursor's line moves onto its own line
/// after the last pasted one. One trailing break only ends the last line.
/// `\r\n` and `\r` count as one break, tabs become [`TAB_WIDTH`] spaces and
/// other control characters are dropped. Every pasted line is hard-wrapped,
/// and the cursor ends up at the end of the last pasted line.
pub fn insert_text(buf: &mut Buffer, cursor: &mut Cursor, text: &str, width: usize) -> EditOutcome {
    let clean = sanitize(text);
    if clean.is_empty() {
        return EditOutcome::NoOp;
    }
    let width = width.max(1);
    let body = clean.strip_suffix('\n').unwrap_or(&clean);

    // Below the last line there is no rest-of-line to move down.
    let past_end = cursor.is_past_end(buf);
    if past_end {
        buf.push_line("");
    }

    let pos = clamp(cursor.position(), buf, width);
    let Some(start) = buf.pos_to_char_idx(pos) else {
        return EditOutcome::NoOp;
    };
    if clean.contains('\n') && !past_end {
        buf.insert(pos, &format!("{body}\n"));
    } else {
        buf.insert(pos, body);
    }

    let breaks = body.matches('\n').count();
    let mut idx = start + body.chars().count();
    hard_wrap(buf, pos.line, pos.line + breaks, width, &mut idx);
    place_at_char(cursor, buf, idx, width);
    EditOutcome::Changed
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Delete the char left of the cursor, or join the line onto the previous
/// one from column 0.
pub fn backspace(buf: &mut Buffer, cursor: &mut Cursor, width: usize) -> EditOutcome {
    if cursor.is_past_end(buf) {
        // Nothing to delete on the virtual row; step back onto the text.
        let last = buf.line_count() - 1;
        let end = buf.line_len(last).unwrap_or(0);
        cursor.set_position(Position::new(last, end), buf, width);
        return EditOutcome::Moved;
    }

    let pos = clamp(cursor.position(), buf, width);
    if pos.col > 0 {
        let from = pos.with_col(pos.col - 1);
        if buf.remove_char(from).is_none() {
            return EditOutcome::NoOp;
        }
        cursor.set_position(from, buf, width);
        return EditOutcome::Changed;
    }
    if pos.line == 0 {
        return EditOutcome::NoOp;
    }

    let prev = pos.line - 1;
    let prev_len = buf.line_len(prev).unwrap_or(0);
    let join = Position::new(prev, prev_len);
    if buf.remove_char(join).is_none() {
        return EditOutcome::NoOp;
    }
    cursor.set_position(join, buf, width);
    EditOutcome::Changed
}

/// Delete the char under the cursor, or join the next line on at the end of
/// a line.
pub fn delete_forward(buf: &mut Buffer, cursor: &mut Cursor, width: usize) -> EditOutcome {
    if cursor.is_past_end(buf) {
        return EditOutcome::NoOp;
    }
    let pos = clamp(cursor.position(), buf, width);
    let len = buf.line_len(pos.line).unwrap_or(0);
    let has_next = pos.line + 1 < buf.line_count();
    if pos.col >= len && !has_next {
        return EditOutcome::NoOp;
    }
    if buf.remove_char(pos).is_none() {
        return EditOutcome::NoOp;
    }
    cursor.set_position(pos, buf, width);
    EditOutcome::Changed
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Arrow-key movement.
pub fn move_cursor(buf: &Buffer, cursor: &mut Cursor, dir: Direction, width: usize) -> EditOutcome {
    if cursor.step(dir, buf, width) {
        EditOutcome::Moved
    } else {
        EditOutcome::NoOp
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split every line in `first..=last` that is longer than `width`.
///
/// `cursor_idx` is an absolute char index; it is shifted past each line
/// break inserted before it so it keeps pointing at the same char. Returns
/// the number of splits.
fn hard_wrap(buf: &mut Buffer, first: usize, last: usize, width: usize, cursor_idx: &mut usize) -> usize {
    let mut splits = 0;
    let mut line = first;
    let mut last = last;
    while line <= last {
        if buf.line_len(line).unwrap_or(0) > width {
            let at = Position::new(line, width);
            if let Some(split) = buf.pos_to_char_idx(at) {
                buf.insert_char(at, '\n');
                if *cursor_idx > split {
                    *cursor_idx += 1;
                }
                // The overflow is now the next line and may need splitting too.
                last += 1;
                splits += 1;
                log::debug!("hard wrap at {at:?}");
            }
        }
        line += 1;
    }
    splits
}

fn place_at_char(cursor: &mut Cursor, buf: &Buffer, idx: usize, width: usize) {
    let pos = buf.char_idx_to_pos(idx).unwrap_or_else(|| {
        let last = buf.line_count() - 1;
        Position::new(last, buf.line_len(last).unwrap_or(0))
    });
    cursor.set_position(pos, buf, width);
}

/// Pasted text as the buffer stores it: `\n` breaks, tabs expanded, other
/// control characters removed.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\n' => out.push('\n'),
            '\t' => out.extend(std::iter::repeat_n(' ', TAB_WIDTH)),
            c if is_insertable(c) => out.push(c),
            _ => {}
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
