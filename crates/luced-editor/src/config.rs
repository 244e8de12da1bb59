// SPDX-License-Identifier: MIT
//! Session configuration: the facts fixed at startup.
//!
//! Built once from the command line and the process identity, then only
//! read. Nothing else in the editor looks at the environment.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::clipboard::{ClipboardAccess, SystemClipboard};

/// File opened when no name is given.
pub const DEFAULT_FILE: &str = "untitled.txt";

/// Banner for a session running with elevated privileges.
pub const ROOT_WARNING: &str = "You are root! Proceed with caution!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// The file being edited.
    pub path: PathBuf,
    /// Effective user is root.
    pub elevated: bool,
    /// The invoking user's display session appears to have been passed
    /// through (`sudo -E`).
    pub forwarded_session: bool,
    pub clipboard_access: ClipboardAccess,
    pub clipboard_tool: Option<SystemClipboard>,
}

impl SessionConfig {
    /// A configuration for `path`; clipboard access follows from the two
    /// identity flags.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        elevated: bool,
        forwarded_session: bool,
        clipboard_tool: Option<SystemClipboard>,
    ) -> Self {
        Self {
            path: path.into(),
            elevated,
            forwarded_session,
            clipboard_access: ClipboardAccess::for_identity(elevated, forwarded_session),
            clipboard_tool,
        }
    }

    /// The file argument from a command line (program name already
    /// skipped). Later arguments are ignored.
    #[must_use]
    pub fn path_from_args(mut args: impl Iterator<Item = OsString>) -> PathBuf {
        args.next().map_or_else(|| PathBuf::from(DEFAULT_FILE), PathBuf::from)
    }

    /// What to show before editing starts, if anything.
    #[must_use]
    pub fn startup_banner(&self) -> Option<String> {
        if !self.elevated {
            return None;
        }
        let mut banner = String::from(ROOT_WARNING);
        if !self.clipboard_access.is_allowed() {
            banner.push('\n');
            banner.push_str(&crate::clipboard::ClipboardError::AccessDenied.to_string());
        }
        Some(banner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> impl Iterator<Item = OsString> {
        list.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn path_defaults_to_untitled() {
        assert_eq!(SessionConfig::path_from_args(args(&[])), PathBuf::from("untitled.txt"));
    }

    #[test]
    fn path_takes_first_argument() {
        assert_eq!(
            SessionConfig::path_from_args(args(&["notes.txt", "extra"])),
            PathBuf::from("notes.txt")
        );
    }

    #[test]
    fn access_is_derived() {
        let cfg = SessionConfig::new("a.txt", true, false, None);
        assert_eq!(cfg.clipboard_access, ClipboardAccess::Denied);
        let cfg = SessionConfig::new("a.txt", true, true, None);
        assert_eq!(cfg.clipboard_access, ClipboardAccess::Allowed);
    }

    #[test]
    fn banner_only_when_elevated() {
        assert_eq!(SessionConfig::new("a", false, false, None).startup_banner(), None);
        assert_eq!(
            SessionConfig::new("a", true, true, None).startup_banner().as_deref(),
            Some(ROOT_WARNING)
        );
        assert_eq!(
            SessionConfig::new("a", true, false, None).startup_banner().as_deref(),
            Some("You are root! Proceed with caution!\nClipboard access denied. Relaunch with sudo -E.")
        );
    }
}
