// SPDX-License-Identifier: MIT
//
// Startup: everything decided once before the terminal is taken over:
// the log file, who the process is running as, and the session config.
//
// The terminal is in raw mode for the whole session, so logs go to a file:
//
//   LUCED_LOG        log file path (default: <temp dir>/luced.log)
//   LUCED_LOG_LEVEL  error | warn | info | debug | trace (default: info)

use std::env;
use std::ffi::{CStr, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::LevelFilter;

use luced_editor::clipboard::SystemClipboard;
use luced_editor::config::SessionConfig;

// ─── Logging ────────────────────────────────────────────────────────────────

/// Where logs go when `LUCED_LOG` is not set.
fn default_log_path() -> PathBuf {
    env::temp_dir().join("luced.log")
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Route the `log` macros to the log file. Returns the file path.
///
/// # Errors
///
/// The file cannot be opened or a logger is already installed. The caller
/// carries on without logging.
pub fn init_logging() -> Result<PathBuf, fern::InitError> {
    let path = env::var_os("LUCED_LOG").map_or_else(default_log_path, PathBuf::from);
    let level = parse_level(env::var("LUCED_LOG_LEVEL").ok().as_deref());
    init_logging_to(path, level)
}

fn init_logging_to(path: PathBuf, level: LevelFilter) -> Result<PathBuf, fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .level(level)
        .chain(fern::log_file(&path)?)
        .apply()?;

    Ok(path)
}

// ─── Identity ───────────────────────────────────────────────────────────────

/// The effective user is root.
#[allow(unsafe_code)]
fn is_elevated() -> bool {
    // SAFETY: geteuid cannot fail and touches no memory we own.
    unsafe { libc::geteuid() == 0 }
}

/// Home directory of the effective user according to the password
/// database, not `$HOME`.
#[allow(unsafe_code)]
fn effective_home() -> Option<PathBuf> {
    // SAFETY: passwd is plain C data; all-zero is a valid value.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let mut scratch = vec![0 as libc::c_char; 4096];

    // SAFETY: every pointer refers to a live local, and `scratch.len()` is
    // the real size of the scratch buffer.
    let rc = unsafe {
        libc::getpwuid_r(
            libc::geteuid(),
            &raw mut pwd,
            scratch.as_mut_ptr(),
            scratch.len(),
            &raw mut result,
        )
    };
    if rc != 0 || result.is_null() || pwd.pw_dir.is_null() {
        return None;
    }

    // SAFETY: on success pw_dir points to a NUL-terminated string inside
    // `scratch`, which is still alive.
    let dir = unsafe { CStr::from_ptr(pwd.pw_dir) };
    Some(PathBuf::from(OsStr::from_bytes(dir.to_bytes())))
}

/// Whether the invoking user's graphical session looks reachable from an
/// elevated process: a display is advertised and `HOME` was kept from the
/// user rather than reset to the elevated identity's home (`sudo -E`).
fn has_forwarded_session(display_set: bool, home: Option<&OsStr>, effective_home: Option<&Path>) -> bool {
    if !display_set {
        return false;
    }
    match (home, effective_home) {
        (Some(home), Some(own)) => Path::new(home) != own,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn display_set() -> bool {
    ["WAYLAND_DISPLAY", "DISPLAY"]
        .iter()
        .any(|var| env::var_os(var).is_some_and(|v| !v.is_empty()))
}

// ─── Session config ─────────────────────────────────────────────────────────

/// Build the session config from the command line (program name skipped)
/// and the process identity.
pub fn session_config(args: impl Iterator<Item = OsString>) -> SessionConfig {
    let path = SessionConfig::path_from_args(args);
    let elevated = is_elevated();
    let forwarded = elevated
        && has_forwarded_session(display_set(), env::var_os("HOME").as_deref(), effective_home().as_deref());
    let tool = SystemClipboard::detect();

    let config = SessionConfig::new(path, elevated, forwarded, tool);
    log::info!(
        "session: file={} elevated={} forwarded={} clipboard={:?}",
        config.path.display(),
        config.elevated,
        config.forwarded_session,
        config.clipboard_access
    );
    config
}

// ─── Tests ──────────────────────────────────────────────────────────────────
