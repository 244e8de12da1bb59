// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop: paint, wait for a key, dispatch, repeat.
//
// One thread, no timers. Each pass:
//
//   1. Refresh the terminal size and resize the frame if it changed.
//   2. Clear the frame, let the app paint it, emit every cell.
//   3. Block on stdin until at least one complete event is available.
//   4. Hand each event to the app; stop on `Action::Quit`.
//
// The only timeout is for the lone-ESC ambiguity: when the parser holds a
// partial escape sequence, the next read is bounded by `LoopConfig::
// escape_timeout`. If nothing arrives, the pending bytes are flushed as
// literal keys.
//
// Resizes are not signalled; the size is re-queried before every frame, so
// the next key press after a resize redraws at the new dimensions.

use std::io::{self, Write};
use std::time::Duration;

use crate::ansi;
use crate::buffer::FrameBuffer;
use crate::input::{Event, Parser};
use crate::output::{write_frame, OutputBuffer};
use crate::terminal::{Size, Terminal};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Application interface for the event loop.
pub trait App {
    /// Handle one parsed input event.
    fn on_event(&mut self, event: &Event) -> Action;

    /// Paint the whole screen. The buffer is cleared and sized to the
    /// terminal before each call.
    fn paint(&mut self, buf: &mut FrameBuffer);

    /// Where the hardware cursor goes after the frame, or `None` to keep
    /// it hidden.
    fn cursor(&self) -> Option<(u16, u16)> {
        None
    }
}

// ─── Byte Source ─────────────────────────────────────────────────────────────

/// Result of one read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were written into the buffer.
    Data(usize),
    /// The timeout elapsed with nothing to read.
    TimedOut,
    /// End of input.
    Closed,
}

/// Where input bytes come from. Stdin in production, a script in tests.
pub trait ByteSource {
    /// Read into `buf`, blocking indefinitely when `timeout` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> io::Result<ReadOutcome>;
}

/// Blocking reads from fd 0, with `poll(2)` for the escape timeout.
pub struct StdinSource;

#[cfg(unix)]
impl ByteSource for StdinSource {
    fn read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> io::Result<ReadOutcome> {
        if let Some(timeout) = timeout {
            let mut fds = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };
            let ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
            loop {
                let ready = unsafe { libc::poll(&raw mut fds, 1, ms) };
                if ready == 0 {
                    return Ok(ReadOutcome::TimedOut);
                }
                if ready > 0 {
                    break;
                }
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::Interrupted {
                    return Err(err);
                }
            }
        }

        loop {
            let n = unsafe {
                libc::read(
                    libc::STDIN_FILENO,
                    buf.as_mut_ptr().cast::<libc::c_void>(),
                    buf.len(),
                )
            };
            match n {
                0 => return Ok(ReadOutcome::Closed),
                #[allow(clippy::cast_sign_loss)]
                n if n > 0 => return Ok(ReadOutcome::Data(n as usize)),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() != io::ErrorKind::Interrupted {
                        return Err(err);
                    }
                }
            }
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for StdinSource {
    fn read(&mut self, buf: &mut [u8], _timeout: Option<Duration>) -> io::Result<ReadOutcome> {
        use std::io::Read;
        match io::stdin().read(buf)? {
            0 => Ok(ReadOutcome::Closed),
            n => Ok(ReadOutcome::Data(n)),
        }
    }
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// How long a partial escape sequence may wait for its next byte
    /// before it is taken literally (a lone ESC becomes the Escape key).
    pub escape_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            escape_timeout: Duration::from_millis(25),
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// Owns the terminal for the duration of [`run`](Self::run).
///
/// ```no_run
/// use luced_term::buffer::FrameBuffer;
/// use luced_term::cell::Attr;
/// use luced_term::event_loop::{Action, App, EventLoop};
/// use luced_term::input::{Event, KeyCode, KeyEvent};
///
/// struct Hello;
///
/// impl App for Hello {
///     fn on_event(&mut self, event: &Event) -> Action {
///         match event {
///             Event::Key(KeyEvent { code: KeyCode::Char('q'), .. }) => Action::Quit,
///             _ => Action::Continue,
///         }
///     }
///
///     fn paint(&mut self, buf: &mut FrameBuffer) {
///         buf.paint_text(0, 0, "press q", Attr::empty());
///     }
/// }
///
/// EventLoop::new()?.run(&mut Hello)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EventLoop {
    terminal: Terminal,
    config: LoopConfig,
}

impl EventLoop {
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn new() -> io::Result<Self> {
        Self::with_config(LoopConfig::default())
    }

    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn with_config(config: LoopConfig) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::open()?,
            config,
        })
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    /// Enter the terminal, run until the app quits or stdin closes, and
    /// restore the terminal (also when the loop fails).
    ///
    /// # Errors
    ///
    /// Returns an error if terminal setup, input, or output fails.
    pub fn run(&mut self, app: &mut impl App) -> io::Result<()> {
        self.terminal.enter()?;

        let terminal = &mut self.terminal;
        let result = drive(
            app,
            &mut StdinSource,
            &mut io::stdout(),
            || terminal.refresh_size(),
            self.config,
        );

        if let Err(e) = &result {
            log::error!("event loop failed: {e}");
        }
        self.terminal.leave()?;
        result
    }
}

/// The loop itself, independent of the real terminal.
///
/// # Errors
///
/// Returns an error if reading from `source` or writing to `out` fails.
pub fn drive(
    app: &mut impl App,
    source: &mut impl ByteSource,
    out: &mut impl Write,
    mut size: impl FnMut() -> Size,
    config: LoopConfig,
) -> io::Result<()> {
    let mut parser = Parser::new();
    let mut frame = FrameBuffer::new(0, 0);
    let mut output = OutputBuffer::new();
    let mut bytes = [0u8; 4096];

    loop {
        let Size { cols, rows } = size();
        if frame.width() != cols || frame.height() != rows {
            frame.resize(cols, rows);
        }
        frame.clear();
        app.paint(&mut frame);

        write_frame(&mut output, &frame);
        if let Some((x, y)) = app.cursor() {
            ansi::cursor_to(&mut output, x, y)?;
            ansi::unset(&mut output, ansi::Mode::HiddenCursor)?;
        }
        output.flush_to(out)?;

        let events = loop {
            let timeout = parser.has_pending().then_some(config.escape_timeout);
            let events = match source.read(&mut bytes, timeout)? {
                ReadOutcome::Data(n) => parser.advance(&bytes[..n]),
                ReadOutcome::TimedOut => parser.flush(),
                ReadOutcome::Closed => {
                    log::info!("input closed");
                    return Ok(());
                }
            };
            if !events.is_empty() {
                break events;
            }
        };

        for event in &events {
            if app.on_event(event) == Action::Quit {
                return Ok(());
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
