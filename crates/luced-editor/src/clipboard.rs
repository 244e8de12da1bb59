// SPDX-License-Identifier: MIT
//! Clipboard: copy and paste through the system clipboard tools.
//!
//! The system clipboard is reached by running one of the usual command-line
//! tools (`wl-copy`/`wl-paste`, `xclip`, `xsel`, `pbcopy`/`pbpaste`). Text
//! goes to the tool's stdin and comes back from its stdout. No shell is
//! involved, so clipboard content never ends up on a command line.
//!
//! [`Clipboard`] adds the access policy on top. A process running as root
//! usually cannot reach the invoking user's display session, so unless there
//! is evidence the session was forwarded (`sudo -E`), access is refused
//! before any command is started.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a clipboard operation did not happen.
///
/// The messages are shown to the user as-is.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard access denied. Relaunch with sudo -E.")]
    AccessDenied,
    #[error("No clipboard tool found (install wl-clipboard, xclip or xsel).")]
    Unavailable,
    #[error("Could not start the clipboard tool: {0}")]
    Spawn(#[from] io::Error),
    #[error("The clipboard tool failed ({0}).")]
    CommandFailed(ExitStatus),
    #[error("Could not send text to the clipboard tool.")]
    StdinWrite,
}

pub type Result<T> = std::result::Result<T, ClipboardError>;

// ---------------------------------------------------------------------------
// Provider seam
// ---------------------------------------------------------------------------

/// Something that can hold clipboard text.
pub trait ClipboardProvider {
    /// Human-readable name, for logs.
    fn name(&self) -> Cow<'_, str>;

    /// Replace the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Any failure to hand the text over.
    fn copy(&mut self, text: &str) -> Result<()>;

    /// Current clipboard contents. An empty clipboard is `Ok("")`.
    ///
    /// # Errors
    ///
    /// Any failure to read the clipboard.
    fn paste(&mut self) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Command-line tools
// ---------------------------------------------------------------------------

/// A program and its fixed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

const WL_COPY: Command = Command { program: "wl-copy", args: &["--type", "text/plain"] };
const WL_PASTE: Command = Command { program: "wl-paste", args: &["--no-newline"] };
const XCLIP_COPY: Command = Command { program: "xclip", args: &["-i", "-selection", "clipboard"] };
const XCLIP_PASTE: Command = Command { program: "xclip", args: &["-o", "-selection", "clipboard"] };
const XSEL_COPY: Command = Command { program: "xsel", args: &["-i", "-b"] };
const XSEL_PASTE: Command = Command { program: "xsel", args: &["-o", "-b"] };
const PBCOPY: Command = Command { program: "pbcopy", args: &[] };
const PBPASTE: Command = Command { program: "pbpaste", args: &[] };

/// The clipboard tool families luced knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemClipboard {
    Wayland,
    XClip,
    XSel,
    Pasteboard,
}

impl SystemClipboard {
    /// Pick a tool from the environment and what is installed on `PATH`.
    #[must_use]
    pub fn detect() -> Option<Self> {
        Self::detect_with(
            |var| std::env::var_os(var).is_some_and(|v| !v.is_empty()),
            |bin| which::which(bin).is_ok(),
        )
    }

    /// [`detect`](Self::detect) with the environment and `PATH` lookups
    /// supplied by the caller.
    pub fn detect_with(env_set: impl Fn(&str) -> bool, installed: impl Fn(&str) -> bool) -> Option<Self> {
        let found = if env_set("WAYLAND_DISPLAY") && installed("wl-copy") && installed("wl-paste") {
            Some(Self::Wayland)
        } else if env_set("DISPLAY") && installed("xclip") {
            Some(Self::XClip)
        } else if env_set("DISPLAY") && installed("xsel") {
            Some(Self::XSel)
        } else if installed("pbcopy") && installed("pbpaste") {
            Some(Self::Pasteboard)
        } else {
            None
        };
        match found {
            Some(tool) => log::info!("clipboard tool: {tool}"),
            None => log::info!("no clipboard tool found"),
        }
        found
    }

    /// The commands behind this tool family.
    #[must_use]
    pub const fn commands(self) -> CommandClipboard {
        let (copy, paste) = match self {
            Self::Wayland => (WL_COPY, WL_PASTE),
            Self::XClip => (XCLIP_COPY, XCLIP_PASTE),
            Self::XSel => (XSEL_COPY, XSEL_PASTE),
            Self::Pasteboard => (PBCOPY, PBPASTE),
        };
        CommandClipboard { copy, paste }
    }
}

impl fmt::Display for SystemClipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wayland => f.write_str("wayland (wl-copy+wl-paste)"),
            Self::XClip => f.write_str("x11 (xclip)"),
            Self::XSel => f.write_str("x11 (xsel)"),
            Self::Pasteboard => f.write_str("macos (pbcopy+pbpaste)"),
        }
    }
}

/// A provider that runs one command to copy and another to paste.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandClipboard {
    pub copy: Command,
    pub paste: Command,
}

impl ClipboardProvider for CommandClipboard {
    fn name(&self) -> Cow<'_, str> {
        if self.copy.program == self.paste.program {
            Cow::Borrowed(self.copy.program)
        } else {
            Cow::Owned(format!("{}+{}", self.copy.program, self.paste.program))
        }
    }

    fn copy(&mut self, text: &str) -> Result<()> {
        run(self.copy, Some(text)).map(|_| ())
    }

    fn paste(&mut self) -> Result<String> {
        let bytes = run(self.paste, None)?;
        Ok(normalize_newlines(&String::from_utf8_lossy(&bytes)))
    }
}

/// Run `cmd`, feeding it `input` when copying and collecting stdout when
/// not.
fn run(cmd: Command, input: Option<&str>) -> Result<Vec<u8>> {
    let reading = input.is_none();
    let mut child = std::process::Command::new(cmd.program)
        .args(cmd.args)
        .stdin(if reading { Stdio::null() } else { Stdio::piped() })
        // Copy tools may fork to keep serving the selection; a piped stdout
        // would then never reach EOF.
        .stdout(if reading { Stdio::piped() } else { Stdio::null() })
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(text) = input {
        let mut stdin = child.stdin.take().ok_or(ClipboardError::StdinWrite)?;
        stdin.write_all(text.as_bytes()).map_err(|_| ClipboardError::StdinWrite)?;
        // Dropping stdin closes the pipe so the tool sees end of input.
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        // wl-paste and xclip exit non-zero on an empty clipboard.
        if reading && output.stdout.is_empty() {
            log::debug!("{} exited {} with no output; clipboard is empty", cmd.program, output.status);
            return Ok(Vec::new());
        }
        return Err(ClipboardError::CommandFailed(output.status));
    }
    Ok(output.stdout)
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

// ---------------------------------------------------------------------------
// Access policy
// ---------------------------------------------------------------------------

/// Whether the clipboard may be used at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardAccess {
    #[default]
    Allowed,
    /// Running elevated with no sign of the user's session.
    Denied,
}

impl ClipboardAccess {
    /// Access for a process with the given identity facts.
    #[must_use]
    pub const fn for_identity(elevated: bool, forwarded_session: bool) -> Self {
        if elevated && !forwarded_session {
            Self::Denied
        } else {
            Self::Allowed
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// The clipboard as the editor sees it: a provider behind the access
/// policy.
pub struct Clipboard {
    access: ClipboardAccess,
    provider: Option<Box<dyn ClipboardProvider>>,
}

impl Clipboard {
    #[must_use]
    pub fn new(access: ClipboardAccess, provider: Option<Box<dyn ClipboardProvider>>) -> Self {
        Self { access, provider }
    }

    /// The detected system tool, if any.
    #[must_use]
    pub fn system(access: ClipboardAccess, tool: Option<SystemClipboard>) -> Self {
        let provider = tool.map(|t| Box::new(t.commands()) as Box<dyn ClipboardProvider>);
        Self::new(access, provider)
    }

    #[inline]
    #[must_use]
    pub const fn access(&self) -> ClipboardAccess {
        self.access
    }

    /// Put `text` on the clipboard.
    ///
    /// # Errors
    ///
    /// [`ClipboardError::AccessDenied`] without running anything when the
    /// policy refuses; otherwise whatever the provider reports.
    pub fn copy(&mut self, text: &str) -> Result<()> {
        let provider = self.provider()?;
        let result = provider.copy(text);
        if let Err(e) = &result {
            log::warn!("clipboard copy via {} failed: {e}", provider.name());
        }
        result
    }

    /// Read the clipboard.
    ///
    /// # Errors
    ///
    /// As for [`copy`](Self::copy).
    pub fn paste(&mut self) -> Result<String> {
        let provider = self.provider()?;
        let result = provider.paste();
        if let Err(e) = &result {
            log::warn!("clipboard paste via {} failed: {e}", provider.name());
        }
        result
    }

    fn provider(&mut self) -> Result<&mut (dyn ClipboardProvider + 'static)> {
        if !self.access.is_allowed() {
            log::warn!("clipboard access refused: elevated without a forwarded session");
            return Err(ClipboardError::AccessDenied);
        }
        self.provider.as_deref_mut().ok_or(ClipboardError::Unavailable)
    }
}

impl fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clipboard")
            .field("access", &self.access)
            .field("provider", &self.provider.as_ref().map(|p| p.name().into_owned()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
