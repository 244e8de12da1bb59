// SPDX-License-Identifier: MIT
//
// luced: a small single-file terminal text editor.
//
// This is the main binary that wires the two crates together:
//
//   luced-term   → raw terminal, key parsing, full-frame output, event loop
//   luced-editor → line buffer, cursor, edit engine, view, clipboard
//
// The Session struct implements luced-term's App trait. Each keypress flows
// through:
//
//   stdin → parser → on_event → state machine → edit engine / clipboard / save
//   paint → view::render → framebuffer → terminal
//
// Session states:
//
//   Running ──key──▶ edit ──▶ Running
//      │                 └──▶ message ──▶ AwaitingAcknowledgement
//      │                                     └──any key──▶ Running
//      └──Ctrl+Q / Ctrl+X──▶ Terminated

mod startup;

use std::env;
use std::process;

use luced_editor::buffer::Buffer;
use luced_editor::clipboard::Clipboard;
use luced_editor::config::SessionConfig;
use luced_editor::cursor::{Cursor, Direction};
use luced_editor::edit::{self, EditOutcome};
use luced_editor::view;

use luced_term::buffer::FrameBuffer;
use luced_term::event_loop::{Action, App, EventLoop};
use luced_term::input::{Event, KeyCode, KeyEvent};

const MSG_SAVED: &str = "File saved successfully.";
const MSG_SAVE_FAILED: &str = "Error saving file.";
const MSG_COPIED: &str = "Line copied to clipboard.";
const MSG_PASTED: &str = "Pasted clipboard content.";

// ─── Session state ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Keys edit the buffer.
    Running,
    /// A message is on screen; the next key only dismisses it.
    AwaitingAcknowledgement,
    /// Quit was requested.
    Terminated,
}

// ─── Session ────────────────────────────────────────────────────────────────

struct Session {
    buffer: Buffer,
    cursor: Cursor,
    clipboard: Clipboard,
    state: SessionState,
    message: Option<String>,

    /// Wrap width: the terminal width seen at the last paint.
    width: usize,

    /// Where the last paint put the cursor on screen.
    screen_cursor: (u16, u16),
}

impl Session {
    fn new(config: &SessionConfig, clipboard: Clipboard, cols: u16) -> Self {
        let (buffer, _) = Buffer::load(&config.path);
        let mut session = Self {
            buffer,
            cursor: Cursor::new(),
            clipboard,
            state: SessionState::Running,
            message: None,
            width: usize::from(cols.max(1)),
            screen_cursor: (0, 0),
        };
        if let Some(banner) = config.startup_banner() {
            session.show(banner);
        }
        session
    }

    /// Put `message` on screen until the next key.
    fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.state = SessionState::AwaitingAcknowledgement;
    }

    fn dismiss(&mut self) {
        self.message = None;
        self.state = SessionState::Running;
    }

    fn has_unsaved_changes(&self) -> bool {
        self.buffer.is_modified()
    }

    // ── Key dispatch ────────────────────────────────────────────────────

    fn handle_key(&mut self, key: &KeyEvent) {
        if key.is_ctrl() {
            if let KeyCode::Char(ch) = key.code {
                self.handle_ctrl(ch.to_ascii_lowercase());
            }
            return;
        }

        let width = self.width;
        let (buf, cur) = (&mut self.buffer, &mut self.cursor);
        let outcome = match key.code {
            KeyCode::Char(ch) if key.is_plain() => edit::insert_char(buf, cur, ch, width),
            KeyCode::Enter => edit::insert_newline(buf, cur, width),
            KeyCode::Backspace => edit::backspace(buf, cur, width),
            KeyCode::Delete => edit::delete_forward(buf, cur, width),
            KeyCode::Left => edit::move_cursor(buf, cur, Direction::Left, width),
            KeyCode::Right => edit::move_cursor(buf, cur, Direction::Right, width),
            KeyCode::Up => edit::move_cursor(buf, cur, Direction::Up, width),
            KeyCode::Down => edit::move_cursor(buf, cur, Direction::Down, width),
            _ => EditOutcome::NoOp,
        };
        if outcome == EditOutcome::NoOp {
            log::trace!("no-op key {key:?} at {:?}", self.cursor.position());
        }
    }

    /// Ctrl+key, Shift or not: Ctrl+Shift+C and Ctrl+C both copy.
    fn handle_ctrl(&mut self, ch: char) {
        match ch {
            's' => self.save(),
            'c' => self.copy_line(),
            'v' => self.paste(),
            'q' | 'x' => self.quit(),
            _ => {}
        }
    }

    // ── Commands ────────────────────────────────────────────────────────

    fn save(&mut self) {
        match self.buffer.save() {
            Ok(()) => self.show(MSG_SAVED),
            Err(e) => {
                log::error!("save {} failed: {e}", self.buffer.path().display());
                self.show(MSG_SAVE_FAILED);
            }
        }
    }

    fn copy_line(&mut self) {
        // The row past the end copies as an empty line.
        let line = self
            .buffer
            .line_text(self.cursor.line())
            .map(|l| l.into_owned())
            .unwrap_or_default();
        match self.clipboard.copy(&line) {
            Ok(()) => self.show(MSG_COPIED),
            Err(e) => self.show(e.to_string()),
        }
    }

    fn paste(&mut self) {
        match self.clipboard.paste() {
            Ok(text) => {
                if self.insert_text(&text) == EditOutcome::Changed {
                    self.show(MSG_PASTED);
                }
            }
            Err(e) => self.show(e.to_string()),
        }
    }

    fn insert_text(&mut self, text: &str) -> EditOutcome {
        edit::insert_text(&mut self.buffer, &mut self.cursor, text, self.width)
    }

    fn quit(&mut self) {
        log::info!("quit (unsaved changes: {})", self.has_unsaved_changes());
        self.state = SessionState::Terminated;
    }
}

// ─── App ────────────────────────────────────────────────────────────────────

impl App for Session {
    fn on_event(&mut self, event: &Event) -> Action {
        match (self.state, event) {
            (SessionState::Terminated, _) => {}
            (SessionState::AwaitingAcknowledgement, _) => self.dismiss(),
            (SessionState::Running, Event::Key(key)) => self.handle_key(key),
            (SessionState::Running, Event::Paste(text)) => {
                self.insert_text(text);
            }
        }

        if self.state == SessionState::Terminated {
            Action::Quit
        } else {
            Action::Continue
        }
    }

    fn paint(&mut self, frame: &mut FrameBuffer) {
        self.width = usize::from(frame.width().max(1));
        self.cursor.clamp(&self.buffer, self.width);
        self.screen_cursor = view::render(frame, &self.buffer, &self.cursor, self.message.as_deref());
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        (self.state == SessionState::Running).then_some(self.screen_cursor)
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    // The terminal is still in cooked mode, so stderr is visible.
    if let Err(e) = startup::init_logging() {
        eprintln!("luced: logging disabled: {e}");
    }

    let config = startup::session_config(env::args_os().skip(1));

    let mut event_loop = EventLoop::new().unwrap_or_else(|e| {
        log::error!("terminal init failed: {e}");
        eprintln!("luced: failed to initialize terminal: {e}");
        process::exit(1);
    });

    let clipboard = Clipboard::system(config.clipboard_access, config.clipboard_tool);
    let mut session = Session::new(&config, clipboard, event_loop.size().cols);

    if let Err(e) = event_loop.run(&mut session) {
        eprintln!("luced: {e}");
        process::exit(1);
    }

    if session.has_unsaved_changes() {
        eprintln!(
            "luced: unsaved changes to {} were discarded",
            config.path.display()
        );
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use luced_editor::clipboard::{ClipboardAccess, ClipboardProvider, Result as ClipResult};
    use luced_editor::position::Position;
    use luced_term::input::Modifiers;
    use pretty_assertions::assert_eq;
    use std::borrow::Cow;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    // ── Helpers ───────────────────────────────────────────────────────

    /// Shared in-memory clipboard. `runs` counts provider calls.
    #[derive(Clone, Default)]
    struct Memory {
        text: Rc<RefCell<String>>,
        runs: Rc<RefCell<usize>>,
    }

    impl ClipboardProvider for Memory {
        fn name(&self) -> Cow<'_, str> {
            "memory".into()
        }

        fn copy(&mut self, text: &str) -> ClipResult<()> {
            *self.runs.borrow_mut() += 1;
            text.clone_into(&mut self.text.borrow_mut());
            Ok(())
        }

        fn paste(&mut self) -> ClipResult<String> {
            *self.runs.borrow_mut() += 1;
            Ok(self.text.borrow().clone())
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, Modifiers::empty()))
    }

    fn press(ch: char) -> Event {
        key(KeyCode::Char(ch))
    }

    fn ctrl(ch: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(ch), Modifiers::CTRL))
    }

    fn ctrl_shift(ch: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(ch), Modifiers::CTRL | Modifiers::SHIFT))
    }

    fn feed(session: &mut Session, events: &[Event]) -> Action {
        let mut last = Action::Continue;
        for event in events {
            last = session.on_event(event);
        }
        last
    }

    fn type_text(session: &mut Session, text: &str) {
        for ch in text.chars() {
            session.on_event(&press(ch));
        }
    }

    fn session_for(path: &Path, elevated: bool, forwarded: bool, memory: &Memory) -> Session {
        let config = SessionConfig::new(path, elevated, forwarded, None);
        let clipboard = Clipboard::new(config.clipboard_access, Some(Box::new(memory.clone())));
        Session::new(&config, clipboard, 80)
    }

    fn with_text(text: &str) -> (tempfile::TempDir, Session, Memory) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, text).unwrap();
        let memory = Memory::default();
        let session = session_for(&path, false, false, &memory);
        (dir, session, memory)
    }

    // ── Startup ───────────────────────────────────────────────────────

    #[test]
    fn starts_running_for_normal_user() {
        let (_dir, session, _) = with_text("hello\n");
        assert_eq!(session.state, SessionState::Running);
        assert_eq!(session.message, None);
        assert_eq!(session.buffer.lines(), vec!["hello"]);
    }

    #[test]
    fn root_banner_waits_for_acknowledgement() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Memory::default();
        let mut session = session_for(&dir.path().join("x.txt"), true, false, &memory);

        assert_eq!(session.state, SessionState::AwaitingAcknowledgement);
        let message = session.message.clone().unwrap();
        assert!(message.starts_with("You are root! Proceed with caution!"));
        assert!(message.contains("Clipboard access denied"));

        // The dismissing key is not typed.
        session.on_event(&press('a'));
        assert_eq!(session.state, SessionState::Running);
        assert_eq!(session.buffer.lines(), vec![""]);
    }

    #[test]
    fn root_with_forwarded_session_has_no_clipboard_warning() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Memory::default();
        let session = session_for(&dir.path().join("x.txt"), true, true, &memory);
        assert_eq!(session.message.as_deref(), Some("You are root! Proceed with caution!"));
    }

    // ── Editing ───────────────────────────────────────────────────────

    #[test]
    fn type_into_new_file_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foo.txt");
        let memory = Memory::default();
        let mut session = session_for(&path, false, false, &memory);

        type_text(&mut session, "Hi");
        assert_eq!(session.buffer.lines(), vec!["Hi"]);
        assert_eq!(session.cursor.position(), Position::new(0, 2));
        assert!(session.has_unsaved_changes());

        session.on_event(&ctrl('s'));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Hi\n");
        assert_eq!(session.message.as_deref(), Some(MSG_SAVED));
        assert_eq!(session.state, SessionState::AwaitingAcknowledgement);
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn enter_backspace_delete_and_arrows() {
        let (_dir, mut session, _) = with_text("abc\ndef\n");
        feed(&mut session, &[key(KeyCode::Down), key(KeyCode::Backspace)]);
        assert_eq!(session.buffer.lines(), vec!["abcdef"]);
        assert_eq!(session.cursor.position(), Position::new(0, 3));

        feed(&mut session, &[key(KeyCode::Enter)]);
        assert_eq!(session.buffer.lines(), vec!["abc", "def"]);

        feed(&mut session, &[key(KeyCode::Left), key(KeyCode::Delete)]);
        assert_eq!(session.buffer.lines(), vec!["abcdef"]);
    }

    #[test]
    fn tab_and_alt_keys_are_ignored() {
        let (_dir, mut session, _) = with_text("x\n");
        feed(
            &mut session,
            &[key(KeyCode::Tab), Event::Key(KeyEvent::new(KeyCode::Char('a'), Modifiers::ALT))],
        );
        assert_eq!(session.buffer.lines(), vec!["x"]);
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn wraps_at_painted_width() {
        let (_dir, mut session, _) = with_text("");
        let mut frame = FrameBuffer::new(4, 6);
        session.paint(&mut frame);
        type_text(&mut session, "abcde");
        assert_eq!(session.buffer.lines(), vec!["abcd", "e"]);
        assert_eq!(session.cursor.position(), Position::new(1, 1));
    }

    #[test]
    fn bracketed_paste_inserts_lines() {
        let (_dir, mut session, _) = with_text("end\n");
        session.on_event(&Event::Paste("one\ntwo".into()));
        assert_eq!(session.buffer.lines(), vec!["one", "two", "end"]);
        assert_eq!(session.cursor.position(), Position::new(1, 3));
        assert_eq!(session.state, SessionState::Running);
    }

    // ── Save failure ──────────────────────────────────────────────────

    #[test]
    fn failed_save_keeps_changes_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("f.txt");
        let memory = Memory::default();
        let mut session = session_for(&path, false, false, &memory);

        type_text(&mut session, "x");
        session.on_event(&ctrl('s'));
        assert_eq!(session.message.as_deref(), Some(MSG_SAVE_FAILED));
        assert!(session.has_unsaved_changes());
        assert_eq!(session.buffer.lines(), vec!["x"]);
    }

    // ── Clipboard ─────────────────────────────────────────────────────

    #[test]
    fn copy_current_line() {
        let (_dir, mut session, memory) = with_text("first\nsecond\n");
        feed(&mut session, &[key(KeyCode::Down), ctrl_shift('c')]);
        assert_eq!(*memory.text.borrow(), "second");
        assert_eq!(session.message.as_deref(), Some(MSG_COPIED));
    }

    #[test]
    fn plain_ctrl_c_also_copies() {
        let (_dir, mut session, memory) = with_text("only\n");
        session.on_event(&ctrl('c'));
        assert_eq!(*memory.text.borrow(), "only");
    }

    #[test]
    fn paste_three_lines_at_start_of_line() {
        let (_dir, mut session, memory) = with_text("top\nbottom\n");
        *memory.text.borrow_mut() = "a\nbb\nccc".to_owned();
        feed(&mut session, &[key(KeyCode::Down), ctrl_shift('v')]);
        assert_eq!(session.buffer.lines(), vec!["top", "a", "bb", "ccc", "bottom"]);
        assert_eq!(session.cursor.position(), Position::new(3, 3));
        assert_eq!(session.message.as_deref(), Some(MSG_PASTED));
        assert_eq!(session.state, SessionState::AwaitingAcknowledgement);
    }

    #[test]
    fn empty_clipboard_pastes_nothing() {
        let (_dir, mut session, _) = with_text("x\n");
        session.on_event(&ctrl('v'));
        assert_eq!(session.buffer.lines(), vec!["x"]);
        assert!(!session.has_unsaved_changes());
        assert_eq!(session.state, SessionState::Running);
    }

    #[test]
    fn denied_clipboard_never_runs_provider() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Memory::default();
        let mut session = session_for(&dir.path().join("x.txt"), true, false, &memory);
        assert_eq!(session.clipboard.access(), ClipboardAccess::Denied);

        session.on_event(&press(' ')); // dismiss the banner
        session.on_event(&ctrl('c'));
        assert_eq!(
            session.message.as_deref(),
            Some("Clipboard access denied. Relaunch with sudo -E.")
        );
        session.on_event(&press(' '));
        session.on_event(&ctrl('v'));
        assert_eq!(session.state, SessionState::AwaitingAcknowledgement);
        assert_eq!(*memory.runs.borrow(), 0);
    }

    // ── Quit ──────────────────────────────────────────────────────────

    #[test]
    fn ctrl_q_and_ctrl_x_quit() {
        let (_dir, mut session, _) = with_text("");
        assert_eq!(session.on_event(&ctrl('q')), Action::Quit);
        assert_eq!(session.state, SessionState::Terminated);

        let (_dir, mut session, _) = with_text("");
        assert_eq!(session.on_event(&ctrl('x')), Action::Quit);
    }

    #[test]
    fn quit_does_not_save() {
        let (dir, mut session, _) = with_text("keep\n");
        type_text(&mut session, "zz");
        assert_eq!(session.on_event(&ctrl('q')), Action::Quit);
        assert!(session.has_unsaved_changes());
        let on_disk = std::fs::read_to_string(dir.path().join("doc.txt")).unwrap();
        assert_eq!(on_disk, "keep\n");
    }

    #[test]
    fn message_key_does_not_quit() {
        let (_dir, mut session, _) = with_text("");
        session.on_event(&ctrl('s'));
        assert_eq!(session.on_event(&ctrl('q')), Action::Continue);
        assert_eq!(session.state, SessionState::Running);
    }

    // ── Paint ─────────────────────────────────────────────────────────

    #[test]
    fn paint_places_cursor_and_hides_it_under_messages() {
        let (_dir, mut session, _) = with_text("hello\n");
        session.on_event(&key(KeyCode::Right));
        let mut frame = FrameBuffer::new(40, 10);
        session.paint(&mut frame);
        assert_eq!(session.cursor(), Some((1, 1)));
        assert!(frame.row_text(0).contains("doc.txt"));

        session.on_event(&ctrl('s'));
        session.paint(&mut frame);
        assert_eq!(session.cursor(), None);
        assert!((0..10).any(|y| frame.row_text(y).contains(MSG_SAVED)));
    }
}
