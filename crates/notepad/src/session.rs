//! The editor session: buffer, current path and settings, plus the file
//! operations bound to the File menu.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::dialog::{Answer, Dialogs};
use crate::document::{self, DocumentError};
use crate::editor::Editor;

pub const APP_TITLE: &str = "Notepad";
pub const UNSAVED_CHANGES_PROMPT: &str = "Do you want to save changes before closing?";
pub const LOAD_ERROR_MESSAGE: &str = "Couldn't read the file!";
pub const DEFAULT_EXTENSION: &str = ".txt";

/// Whether a pending New/Close may go ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Cancelled,
}

#[derive(Debug)]
pub enum OpenOutcome {
    Opened(PathBuf),
    Cancelled,
    Failed(DocumentError),
}

pub struct EditorSession {
    pub editor: Editor,
    path: Option<PathBuf>,
    settings: Settings,
    config_path: Option<PathBuf>,
}

impl EditorSession {
    pub fn new(settings: Settings, config_path: Option<PathBuf>) -> Self {
        Self {
            editor: Editor::new(),
            path: None,
            settings,
            config_path,
        }
    }

    /// Start a session with settings read from `config_path`.
    pub async fn load(config_path: Option<PathBuf>) -> Self {
        let settings = match &config_path {
            Some(path) => Settings::load_or_default(path).await,
            None => {
                log::warn!("No config location available, using default settings");
                Settings::default()
            }
        };
        log::info!("Autosave is {}", if settings.autosave { "on" } else { "off" });
        Self::new(settings, config_path)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn autosave_enabled(&self) -> bool {
        self.settings.autosave
    }

    pub fn set_autosave(&mut self, enabled: bool) {
        self.settings.autosave = enabled;
    }

    pub fn toggle_autosave(&mut self) -> bool {
        self.set_autosave(!self.autosave_enabled());
        self.autosave_enabled()
    }

    pub async fn new_document(&mut self, dialogs: &mut dyn Dialogs) -> Result<Decision, DocumentError> {
        let decision = self.unsaved_check(dialogs).await?;
        if decision == Decision::Proceed {
            self.editor.clear();
            self.path = None;
            log::info!("Started a new document");
        }
        Ok(decision)
    }

    /// Write the buffer to the current path, asking for one if unset.
    pub async fn save(&mut self, dialogs: &mut dyn Dialogs) -> Result<SaveOutcome, DocumentError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => match dialogs.pick_save_path(DEFAULT_EXTENSION) {
                Some(chosen) if !chosen.as_os_str().is_empty() => {
                    document::with_default_extension(chosen, DEFAULT_EXTENSION)
                }
                _ => {
                    log::info!("Save cancelled, no destination chosen");
                    return Ok(SaveOutcome::Cancelled);
                }
            },
        };

        self.write_to(&path).await?;
        self.path = Some(path.clone());
        Ok(SaveOutcome::Saved(path))
    }

    /// Forget the current path so [`save`](Self::save) always asks.
    pub async fn save_as(&mut self, dialogs: &mut dyn Dialogs) -> Result<SaveOutcome, DocumentError> {
        self.path = None;
        self.save(dialogs).await
    }

    pub async fn open(&mut self, dialogs: &mut dyn Dialogs) -> Result<OpenOutcome, DocumentError> {
        match dialogs.pick_open_path() {
            Some(path) if !path.as_os_str().is_empty() => self.open_path(path, dialogs).await,
            _ => {
                log::info!("Open cancelled");
                Ok(OpenOutcome::Cancelled)
            }
        }
    }

    /// Load `path` into the buffer. On failure the user is told and the
    /// session falls back to a blank document.
    ///
    /// The outer error only reports a failed save made while resetting.
    pub async fn open_path(
        &mut self,
        path: PathBuf,
        dialogs: &mut dyn Dialogs,
    ) -> Result<OpenOutcome, DocumentError> {
        match self.load_file(&path).await {
            Ok(()) => Ok(OpenOutcome::Opened(path)),
            Err(err) => {
                log::error!("Failed to open {}: {}", path.display(), err);
                dialogs.show_error(APP_TITLE, &format!("{}\n{}", LOAD_ERROR_MESSAGE, err));
                self.new_document(dialogs).await?;
                Ok(OpenOutcome::Failed(err))
            }
        }
    }

    /// Replace the buffer with the contents of `path` and bind it. Leaves
    /// the session untouched on error.
    pub async fn load_file(&mut self, path: &Path) -> Result<(), DocumentError> {
        let content = document::read_text(path).await?;
        self.editor.set_content(content);
        self.path = Some(path.to_path_buf());
        log::info!("Opened {}", path.display());
        Ok(())
    }

    pub async fn drop_open(
        &mut self,
        payload: &str,
        dialogs: &mut dyn Dialogs,
    ) -> Result<OpenOutcome, DocumentError> {
        match document::parse_drop_payload(payload) {
            Some(path) => {
                log::debug!("Dropped file: {}", path.display());
                self.open_path(path, dialogs).await
            }
            None => {
                log::warn!("Ignoring drop without a usable path: {:?}", payload);
                Ok(OpenOutcome::Cancelled)
            }
        }
    }

    /// Periodic save. Returns the path written, if any.
    pub async fn autosave_tick(&mut self) -> Result<Option<PathBuf>, DocumentError> {
        if !self.settings.autosave {
            return Ok(None);
        }
        let Some(path) = self.path.clone() else {
            return Ok(None);
        };
        self.write_to(&path).await?;
        log::info!("Autosaved {}", path.display());
        Ok(Some(path))
    }

    /// Handle a close request. On `Proceed` the settings have been persisted
    /// and the caller should terminate.
    pub async fn close(&mut self, dialogs: &mut dyn Dialogs) -> Result<Decision, DocumentError> {
        let decision = self.unsaved_check(dialogs).await?;
        if decision == Decision::Proceed {
            self.persist_settings().await;
        }
        Ok(decision)
    }

    pub async fn persist_settings(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.settings.save_to(path).await {
            log::warn!("Failed to save settings: {}", e);
        }
    }

    /// Compare the trimmed buffer to the trimmed file on disk (or to the
    /// empty string when there is no file yet).
    pub async fn has_unsaved_changes(&self) -> bool {
        let saved = match &self.path {
            None => String::new(),
            Some(path) => match document::read_text(path).await {
                Ok(content) => content,
                Err(e) if e.is_not_found() => String::new(),
                Err(e) => {
                    log::warn!("Cannot compare with {}: {}", path.display(), e);
                    return true;
                }
            },
        };
        self.editor.get_content().trim() != saved.trim()
    }

    /// Shared guard for New and Close.
    pub async fn unsaved_check(&mut self, dialogs: &mut dyn Dialogs) -> Result<Decision, DocumentError> {
        if self.settings.autosave {
            if let Some(path) = self.path.clone() {
                self.write_to(&path).await?;
                return Ok(Decision::Proceed);
            }
        }

        if !self.has_unsaved_changes().await {
            return Ok(Decision::Proceed);
        }

        match dialogs.ask_yes_no_cancel(APP_TITLE, UNSAVED_CHANGES_PROMPT) {
            Answer::Yes => match self.save(dialogs).await? {
                SaveOutcome::Saved(_) => Ok(Decision::Proceed),
                SaveOutcome::Cancelled => Ok(Decision::Abort),
            },
            Answer::No => Ok(Decision::Proceed),
            Answer::Cancel => Ok(Decision::Abort),
        }
    }

    async fn write_to(&mut self, path: &Path) -> Result<(), DocumentError> {
        document::write_text(path, &self.editor.get_content()).await?;
        self.editor.mark_saved();
        Ok(())
    }
}
