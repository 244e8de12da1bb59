// SPDX-License-Identifier: MIT
//
// luced-term: terminal layer for the luced editor.
//
// Raw termios and hand-written ANSI sequences rather than a TUI framework.
// The editor paints a grid of cells; this crate owns everything between
// that grid and the tty: raw mode, the alternate screen, key parsing, and
// writing the whole frame out on every pass.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod terminal;
