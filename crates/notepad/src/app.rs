use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::autosave::AutosaveTimer;
use crate::config::Settings;
use crate::dialog::Dialogs;
use crate::document::{self, DocumentError};
use crate::keymap::{self, Command};
use crate::menu::MenuBar;
use crate::session::{Decision, EditorSession, OpenOutcome, SaveOutcome, APP_TITLE};
use crate::status_manager::StatusManager;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct App {
    pub session: EditorSession,
    pub menu: MenuBar,
    pub status: StatusManager,
    pub autosave_timer: AutosaveTimer,
    should_quit: bool,
}

impl App {
    pub async fn new() -> Self {
        Self::with_session(EditorSession::load(Settings::config_path()).await)
    }

    pub fn with_session(session: EditorSession) -> Self {
        Self {
            session,
            menu: MenuBar::notepad(),
            status: StatusManager::new(),
            autosave_timer: AutosaveTimer::default(),
            should_quit: false,
        }
    }

    /// Called once the window is up.
    pub fn start(&mut self, now: Instant) {
        self.autosave_timer.start(now);
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.autosave_timer.stop();
        self.should_quit = true;
    }

    pub fn update_status(&mut self) {
        self.status.update();
    }

    /// How long the event loop may block before the next autosave tick.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.autosave_timer
            .time_until_due(now)
            .map_or(EVENT_POLL_INTERVAL, |due| due.min(EVENT_POLL_INTERVAL))
    }

    /// Load a file named on the command line. Failures only reach the
    /// status line; the editor starts blank.
    pub async fn open_initial_file(&mut self, path: &Path) {
        match self.session.load_file(path).await {
            Ok(()) => self
                .status
                .set_info(format!("Opened {}", document::display_name(Some(path)))),
            Err(e) => self.status.set_error(format!("Couldn't read the file: {}", e)),
        }
    }

    pub async fn execute(&mut self, command: Command, dialogs: &mut dyn Dialogs) -> Result<()> {
        log::debug!("Executing {:?}", command);
        match command {
            Command::New => match self.session.new_document(dialogs).await {
                Ok(Decision::Proceed) => self.status.set_info("New document"),
                Ok(Decision::Abort) => {}
                Err(e) => self.report_save_error(e, dialogs),
            },
            Command::Save | Command::SaveAs => {
                let result = if command == Command::SaveAs {
                    self.session.save_as(dialogs).await
                } else {
                    self.session.save(dialogs).await
                };
                match result {
                    Ok(SaveOutcome::Saved(path)) => self
                        .status
                        .set_success(format!("Saved {}", document::display_name(Some(&path)))),
                    Ok(SaveOutcome::Cancelled) => self.status.set_info("Save cancelled"),
                    Err(e) => self.report_save_error(e, dialogs),
                }
            }
            Command::Open => {
                let result = self.session.open(dialogs).await;
                self.report_open(result, dialogs);
            }
            Command::ToggleAutosave => {
                let enabled = self.session.toggle_autosave();
                log::info!("Autosave turned {}", if enabled { "on" } else { "off" });
                if enabled && self.session.path().is_none() {
                    self.status
                        .set_warning("Auto Save on, starting once the file has been saved");
                } else {
                    self.status
                        .set_info(format!("Auto Save {}", if enabled { "on" } else { "off" }));
                }
            }
            Command::Close => match self.session.close(dialogs).await {
                Ok(Decision::Proceed) => {
                    log::info!("Close confirmed");
                    self.quit();
                }
                Ok(Decision::Abort) => self.status.set_info("Close cancelled"),
                Err(e) => self.report_save_error(e, dialogs),
            },
            Command::OpenMenu(index) => self.menu.open(index),
        }
        Ok(())
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent, dialogs: &mut dyn Dialogs) -> Result<()> {
        if self.menu.is_open() {
            if let Some(command) = self.menu.handle_key(key) {
                self.execute(command, dialogs).await?;
            }
            return Ok(());
        }

        if let Some(command) = keymap::command_for_key(&key) {
            return self.execute(command, dialogs).await;
        }

        self.handle_editor_key(key);
        Ok(())
    }

    /// Bracketed paste. Terminals deliver dropped files this way. A paste
    /// wrapped in braces by the drop source is always a drop. A bare path to
    /// an existing file may just be text, so it is only opened once unsaved
    /// work has been dealt with; declining keeps it as pasted text.
    pub async fn handle_paste(&mut self, text: String, dialogs: &mut dyn Dialogs) -> Result<()> {
        if document::is_braced_payload(&text) {
            let result = self.session.drop_open(&text, dialogs).await;
            self.report_open(result, dialogs);
            return Ok(());
        }

        let Some(path) = self.pasted_file_path(&text).await else {
            self.insert_pasted_text(&text);
            return Ok(());
        };
        match self.session.unsaved_check(dialogs).await {
            Ok(Decision::Proceed) => {
                let result = self.session.open_path(path, dialogs).await;
                self.report_open(result, dialogs);
            }
            Ok(Decision::Abort) => {
                log::debug!("Keeping pasted path as text: {}", path.display());
                self.insert_pasted_text(&text);
            }
            Err(e) => self.report_save_error(e, dialogs),
        }
        Ok(())
    }

    /// Run the autosave tick when the timer says it is due.
    pub async fn on_tick(&mut self, now: Instant) -> Result<()> {
        if !self.autosave_timer.poll(now) {
            return Ok(());
        }
        match self.session.autosave_tick().await {
            Ok(Some(path)) => self
                .status
                .set_success(format!("Auto-saved {}", document::display_name(Some(&path)))),
            Ok(None) => {}
            Err(e) => self.status.set_error(format!("Auto Save failed: {}", e)),
        }
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.session.editor.is_modified()
    }

    async fn pasted_file_path(&self, text: &str) -> Option<PathBuf> {
        let path = document::parse_drop_payload(text)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    fn insert_pasted_text(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        self.session.editor.insert_str(&normalized);
    }

    fn report_open(&mut self, result: Result<OpenOutcome, DocumentError>, dialogs: &mut dyn Dialogs) {
        match result {
            Ok(OpenOutcome::Opened(path)) => self
                .status
                .set_info(format!("Opened {}", document::display_name(Some(&path)))),
            Ok(OpenOutcome::Failed(e)) => self.status.set_error(format!("Couldn't read the file: {}", e)),
            Ok(OpenOutcome::Cancelled) => {}
            Err(e) => self.report_save_error(e, dialogs),
        }
    }

    fn report_save_error(&mut self, error: DocumentError, dialogs: &mut dyn Dialogs) {
        dialogs.show_error(APP_TITLE, &format!("Couldn't save the file!\n{}", error));
        self.status.set_error(format!("Save failed: {}", error));
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let editor = &mut self.session.editor;

        match key.code {
            KeyCode::Char(c) if !ctrl && !alt => editor.insert_char(c),
            KeyCode::Enter => editor.insert_newline(),
            KeyCode::Tab => editor.insert_tab(),
            KeyCode::Backspace => editor.delete_char_backward(),
            KeyCode::Delete => editor.delete_char_forward(),
            KeyCode::Left => editor.move_cursor_left(),
            KeyCode::Right => editor.move_cursor_right(),
            KeyCode::Up => editor.move_cursor_up(),
            KeyCode::Down => editor.move_cursor_down(),
            KeyCode::Home if ctrl => editor.move_to_document_start(),
            KeyCode::End if ctrl => editor.move_to_document_end(),
            KeyCode::Home => editor.move_to_line_start(),
            KeyCode::End => editor.move_to_line_end(),
            KeyCode::PageUp => editor.page_up(),
            KeyCode::PageDown => editor.page_down(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::testing::ScriptedDialogs;
    use crate::dialog::Answer;
    use crate::keymap::SETTINGS_MENU;
    use crate::status_manager::MessageType;
    use tempfile::TempDir;

    fn test_app() -> App {
        App::with_session(EditorSession::new(Settings::default(), None))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    async fn type_text(app: &mut App, text: &str, dialogs: &mut ScriptedDialogs) {
        for c in text.chars() {
            let code = if c == '\n' { KeyCode::Enter } else { KeyCode::Char(c) };
            app.handle_key_event(key(code), dialogs).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_typing_edits_buffer() {
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new();
        type_text(&mut app, "ab\ncd", &mut dialogs).await;
        app.handle_key_event(key(KeyCode::Backspace), &mut dialogs).await.unwrap();

        assert_eq!(app.session.editor.get_content(), "ab\nc");
        assert!(app.is_modified());
    }

    #[tokio::test]
    async fn test_ctrl_s_saves_through_picker() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new().save_to(Some(dir.path().join("letter")));
        type_text(&mut app, "Dear", &mut dialogs).await;

        app.handle_key_event(ctrl('s'), &mut dialogs).await.unwrap();

        let saved = dir.path().join("letter.txt");
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "Dear");
        assert!(!app.is_modified());
        assert_eq!(
            app.status.current_message().unwrap().content,
            "Saved letter.txt"
        );
    }

    #[tokio::test]
    async fn test_ctrl_n_after_edits_prompts_once() {
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new().answer(Answer::No);
        type_text(&mut app, "scratch", &mut dialogs).await;

        app.handle_key_event(ctrl('n'), &mut dialogs).await.unwrap();
        assert_eq!(dialogs.questions.len(), 1);
        assert_eq!(app.session.editor.get_content(), "");
    }

    #[tokio::test]
    async fn test_menu_toggles_autosave() {
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new();

        app.handle_key_event(
            KeyEvent::new(KeyCode::Char('s'), KeyModifiers::ALT),
            &mut dialogs,
        )
        .await
        .unwrap();
        assert_eq!(app.menu.open_index(), Some(SETTINGS_MENU));

        app.handle_key_event(key(KeyCode::Enter), &mut dialogs).await.unwrap();
        assert!(app.session.autosave_enabled());
        assert!(!app.menu.is_open());
    }

    #[tokio::test]
    async fn test_autosave_without_path_warns() {
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new();

        app.execute(Command::ToggleAutosave, &mut dialogs).await.unwrap();
        let message = app.status.current_message().unwrap();
        assert_eq!(message.message_type, MessageType::Warning);

        app.execute(Command::ToggleAutosave, &mut dialogs).await.unwrap();
        assert!(!app.session.autosave_enabled());
        assert_eq!(app.status.current_message().unwrap().content, "Auto Save off");
    }

    #[tokio::test]
    async fn test_menu_swallows_text_keys() {
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new();
        app.handle_key_event(key(KeyCode::F(10)), &mut dialogs).await.unwrap();
        app.handle_key_event(key(KeyCode::Char('x')), &mut dialogs).await.unwrap();
        assert_eq!(app.session.editor.get_content(), "");
        assert!(app.menu.is_open());
    }

    #[tokio::test]
    async fn test_close_on_clean_document_quits() {
        let mut app = test_app();
        app.start(Instant::now());
        let mut dialogs = ScriptedDialogs::new();

        app.handle_key_event(ctrl('q'), &mut dialogs).await.unwrap();
        assert!(app.should_quit());
        assert!(!app.autosave_timer.is_running());
        assert!(dialogs.questions.is_empty());
    }

    #[tokio::test]
    async fn test_close_cancel_keeps_running() {
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new().answer(Answer::Cancel);
        type_text(&mut app, "unsaved", &mut dialogs).await;

        app.execute(Command::Close, &mut dialogs).await.unwrap();
        assert!(!app.should_quit());
    }

    #[tokio::test]
    async fn test_paste_inserts_text() {
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new();
        app.handle_paste("one\r\ntwo\rthree".to_string(), &mut dialogs)
            .await
            .unwrap();
        assert_eq!(app.session.editor.get_content(), "one\ntwo\nthree");
    }

    #[tokio::test]
    async fn test_paste_of_file_path_opens_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dropped.txt");
        std::fs::write(&path, "from disk").unwrap();

        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new();
        app.handle_paste(format!("'{}'", path.display()), &mut dialogs)
            .await
            .unwrap();
        assert_eq!(app.session.editor.get_content(), "from disk");
        assert_eq!(app.session.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_pasted_path_keeps_unsaved_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.txt");
        std::fs::write(&path, "unrelated").unwrap();

        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new().answer(Answer::Cancel);
        type_text(&mut app, "my notes, see ", &mut dialogs).await;
        app.handle_paste(path.display().to_string(), &mut dialogs)
            .await
            .unwrap();

        assert_eq!(dialogs.questions.len(), 1);
        assert_eq!(
            app.session.editor.get_content(),
            format!("my notes, see {}", path.display())
        );
        assert_eq!(app.session.path(), None);
    }

    #[tokio::test]
    async fn test_braced_drop_opens_without_prompt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dropped.txt");
        std::fs::write(&path, "from disk").unwrap();

        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new();
        type_text(&mut app, "scratch", &mut dialogs).await;
        app.handle_paste(format!("{{{}}}", path.display()), &mut dialogs)
            .await
            .unwrap();

        assert!(dialogs.questions.is_empty());
        assert_eq!(app.session.editor.get_content(), "from disk");
        assert_eq!(app.session.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_braced_drop_of_missing_file_reports_error() {
        let mut app = test_app();
        let mut dialogs = ScriptedDialogs::new();
        app.handle_paste("{/no/such/file.txt}".to_string(), &mut dialogs)
            .await
            .unwrap();
        assert_eq!(dialogs.errors.len(), 1);
        assert_eq!(app.session.editor.get_content(), "");
        assert_eq!(app.session.path(), None);
    }

    #[tokio::test]
    async fn test_save_failure_shows_error() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app();
        let blocked = dir.path().join("blocked.txt");
        std::fs::create_dir(&blocked).unwrap();
        let mut dialogs = ScriptedDialogs::new().save_to(Some(blocked));
        type_text(&mut app, "x", &mut dialogs).await;

        app.execute(Command::SaveAs, &mut dialogs).await.unwrap();

        assert_eq!(dialogs.errors.len(), 1);
        assert!(dialogs.errors[0].starts_with("Couldn't save the file!"));
        assert_eq!(app.session.path(), None);
        assert_eq!(app.session.editor.get_content(), "x");
    }

    #[tokio::test]
    async fn test_autosave_runs_when_timer_fires() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auto.txt");
        std::fs::write(&path, "start").unwrap();

        let mut app = App::with_session(EditorSession::new(Settings { autosave: true }, None));
        app.open_initial_file(&path).await;
        app.session.editor.move_to_document_end();
        app.session.editor.insert_str(" end");

        let t0 = Instant::now();
        app.start(t0);
        app.on_tick(t0 + Duration::from_secs(1)).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "start");

        app.on_tick(t0 + app.autosave_timer.interval()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "start end");
    }

    #[tokio::test]
    async fn test_open_initial_file_failure_goes_to_status() {
        let mut app = test_app();
        app.open_initial_file(Path::new("/no/such/notes.txt")).await;
        assert!(app
            .status
            .current_message()
            .unwrap()
            .content
            .starts_with("Couldn't read the file"));
        assert_eq!(app.session.path(), None);
    }

    #[test]
    fn test_poll_timeout_respects_timer() {
        let mut app = test_app();
        let now = Instant::now();
        assert_eq!(app.poll_timeout(now), Duration::from_millis(100));

        app.autosave_timer = AutosaveTimer::new(Duration::from_millis(30));
        app.start(now);
        assert_eq!(app.poll_timeout(now), Duration::from_millis(30));
    }
}
