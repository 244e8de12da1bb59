// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// The terminal for the length of a session.
//
// `Terminal::open` checks that stdin is a terminal and reads its size.
// `enter` puts the tty into raw mode and switches on `ansi::Mode::SESSION`;
// `leave` (or drop) undoes both. Raw mode clears IXON along with ICANON,
// ECHO and ISIG: with flow control on, the tty driver eats Ctrl+S and
// Ctrl+Q before the editor sees them.
//
// The termios to restore lives in a static so a panic hook can reach it.
// The hook writes the restore sequence straight to fd 1, since the panic
// may have happened while a frame flush held the stdout lock.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once, PoisonError};

use crate::ansi::{self, Mode};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Used when the OS can't tell us.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };

    /// Size of the terminal on stdout (`TIOCGWINSZ`).
    #[cfg(unix)]
    #[must_use]
    pub fn query() -> Option<Self> {
        // SAFETY: winsize is plain C data; the ioctl only writes into it.
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };
        (rc == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some(Self {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn query() -> Option<Self> {
        None
    }
}

// ─── Raw mode ───────────────────────────────────────────────────────────────

/// `t` with line editing, echo, signal keys, CR translation and XON/XOFF
/// turned off. Reads return as soon as one byte is there.
#[cfg(unix)]
#[must_use]
pub fn raw_termios(mut t: libc::termios) -> libc::termios {
    t.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
    t.c_oflag &= !libc::OPOST;
    t.c_cflag |= libc::CS8;
    t.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
    t.c_cc[libc::VMIN] = 1;
    t.c_cc[libc::VTIME] = 0;
    t
}

#[cfg(unix)]
static SAVED_TERMIOS: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(unix)]
fn enable_raw_mode() -> io::Result<()> {
    let fd = libc::STDIN_FILENO;
    // SAFETY: termios is plain C data; tcgetattr fills it in.
    let mut original: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &raw mut original) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let termios = raw_termios(original);
    // SAFETY: `termios` is the current settings with flags cleared.
    if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    *SAVED_TERMIOS.lock().unwrap_or_else(PoisonError::into_inner) = Some(original);
    Ok(())
}

#[cfg(unix)]
fn restore_termios() -> io::Result<()> {
    let saved = SAVED_TERMIOS.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(original) = saved {
        // SAFETY: `original` came from tcgetattr on the same fd.
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) } != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn enable_raw_mode() -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn restore_termios() -> io::Result<()> {
    Ok(())
}

// ─── Panic hook ─────────────────────────────────────────────────────────────

/// The session modes are on.
static ENTERED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if ENTERED.swap(false, Ordering::SeqCst) {
                write_unlocked(&ansi::restore_sequence());
                let _ = restore_termios();
            }
            previous(info);
        }));
    });
}

/// Write to fd 1 without taking the stdout lock.
fn write_unlocked(bytes: &[u8]) {
    #[cfg(unix)]
    // SAFETY: reads `bytes.len()` bytes from a live slice.
    unsafe {
        let _ = libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast::<libc::c_void>(), bytes.len());
    }

    #[cfg(not(unix))]
    {
        let mut out = io::stdout();
        let _ = out.write_all(bytes);
        let _ = out.flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// The controlling terminal. Restored on drop if still entered.
#[derive(Debug)]
pub struct Terminal {
    size: Size,
    entered: bool,
}

impl Terminal {
    /// # Errors
    ///
    /// Stdin is not a terminal.
    pub fn open() -> io::Result<Self> {
        if !io::stdin().is_terminal() {
            return Err(io::Error::other("stdin is not a terminal"));
        }
        Ok(Self {
            size: Size::query().unwrap_or(Size::FALLBACK),
            entered: false,
        })
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Ask the OS again; keeps the old size if it can't say.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(size) = Size::query() {
            if size != self.size {
                log::debug!("terminal resized to {}x{}", size.cols, size.rows);
            }
            self.size = size;
        }
        self.size
    }

    /// Raw mode plus the session modes. Does nothing if already entered.
    ///
    /// # Errors
    ///
    /// The termios calls or the write to stdout failed.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        install_panic_hook();
        enable_raw_mode()?;
        // From here on, leave() has something to undo.
        self.entered = true;
        ENTERED.store(true, Ordering::SeqCst);

        let mut out = io::stdout().lock();
        for mode in Mode::SESSION {
            ansi::set(&mut out, mode)?;
        }
        ansi::clear_screen(&mut out)?;
        out.flush()?;
        log::debug!("terminal entered ({}x{})", self.size.cols, self.size.rows);
        Ok(())
    }

    /// Undo [`enter`](Self::enter). Does nothing if not entered.
    ///
    /// # Errors
    ///
    /// The write to stdout or the termios restore failed. Both are
    /// attempted either way.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        self.entered = false;
        ENTERED.store(false, Ordering::SeqCst);

        let written = {
            let mut out = io::stdout().lock();
            out.write_all(&ansi::restore_sequence()).and_then(|()| out.flush())
        };
        let restored = restore_termios();
        log::debug!("terminal restored");
        written.and(restored)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            log::warn!("failed to restore terminal: {e}");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
