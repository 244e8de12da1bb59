// SPDX-License-Identifier: MIT
//! # luced-editor: editor core for luced
//!
//! - **[`position`]**: `Position` (line, col), 0-indexed
//! - **[`buffer`]**: `Buffer`, the lines of the file on a rope, with load and save
//! - **[`cursor`]**: `Cursor` movement and the one bounds check, [`cursor::clamp`]
//! - **[`edit`]**: insert, delete, split, join and hard wrap
//! - **[`view`]**: paints a frame: title, text, help bar, messages
//! - **[`clipboard`]**: system clipboard tools behind an access policy
//! - **[`config`]**: the per-session facts decided at startup

pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod cursor;
pub mod edit;
pub mod position;
pub mod view;
