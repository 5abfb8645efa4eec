//! Modal dialogs.
//!
//! [`Dialogs`] is everything the editor session asks of the user. The
//! terminal implementation runs a nested event loop on top of a snapshot of
//! the last drawn frame until the prompt is answered.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, buffer::Buffer, Frame, Terminal};
use std::path::PathBuf;

use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Cancel,
}

impl Answer {
    pub const ALL: [Answer; 3] = [Answer::Yes, Answer::No, Answer::Cancel];

    pub fn label(self) -> &'static str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
            Answer::Cancel => "Cancel",
        }
    }

    fn index(self) -> usize {
        match self {
            Answer::Yes => 0,
            Answer::No => 1,
            Answer::Cancel => 2,
        }
    }
}

pub trait Dialogs {
    /// Blocking yes/no/cancel question.
    fn ask_yes_no_cancel(&mut self, title: &str, message: &str) -> Answer;

    fn show_error(&mut self, title: &str, message: &str);

    /// Destination for a save. `None` means the user cancelled.
    fn pick_save_path(&mut self, default_extension: &str) -> Option<PathBuf>;

    /// Source for an open. `None` means the user cancelled.
    fn pick_open_path(&mut self) -> Option<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult<T> {
    Pending,
    Submitted(T),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub selected: Answer,
}

impl ConfirmPrompt {
    pub fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            selected: Answer::Yes,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Answer> {
        match key.code {
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'y' => Some(Answer::Yes),
                'n' => Some(Answer::No),
                'c' => Some(Answer::Cancel),
                _ => None,
            },
            KeyCode::Esc => Some(Answer::Cancel),
            KeyCode::Enter => Some(self.selected),
            KeyCode::Left | KeyCode::BackTab => {
                let i = (self.selected.index() + Answer::ALL.len() - 1) % Answer::ALL.len();
                self.selected = Answer::ALL[i];
                None
            }
            KeyCode::Right | KeyCode::Tab => {
                self.selected = Answer::ALL[(self.selected.index() + 1) % Answer::ALL.len()];
                None
            }
            _ => None,
        }
    }
}

/// Single-line path entry, the terminal stand-in for a file picker.
#[derive(Debug, Clone)]
pub struct PathPrompt {
    pub title: String,
    input: Vec<char>,
    cursor: usize,
}

impl PathPrompt {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            input: Vec::new(),
            cursor: 0,
        }
    }

    pub fn input(&self) -> String {
        self.input.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptResult<PathBuf> {
        match key.code {
            KeyCode::Esc => return PromptResult::Cancelled,
            KeyCode::Enter => {
                let value = self.input();
                let value = value.trim();
                if !value.is_empty() {
                    return PromptResult::Submitted(PathBuf::from(value));
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.cursor = 0;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert(self.cursor, c);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.input.remove(self.cursor);
            }
            KeyCode::Delete if self.cursor < self.input.len() => {
                self.input.remove(self.cursor);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.input.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.len(),
            _ => {}
        }
        PromptResult::Pending
    }

    /// Pasted (or dropped) text is inserted without line breaks.
    pub fn handle_paste(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.input.insert(self.cursor, c);
            self.cursor += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorPrompt {
    pub title: String,
    pub message: String,
}

impl ErrorPrompt {
    pub fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
        }
    }

    /// Returns `true` once the dialog is dismissed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' '))
    }
}

#[derive(Debug, Clone)]
pub enum Prompt {
    Confirm(ConfirmPrompt),
    Path(PathPrompt),
    Error(ErrorPrompt),
}

/// [`Dialogs`] backed by the terminal.
pub struct TerminalDialogs<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    backdrop: Buffer,
}

impl<'a, B: Backend> TerminalDialogs<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, backdrop: Buffer) -> Self {
        Self { terminal, backdrop }
    }

    /// Redraw `prompt` and feed it terminal events until `step` yields.
    /// Terminal failures end the dialog with `None`.
    fn run_modal<T>(
        &mut self,
        mut prompt: Prompt,
        mut step: impl FnMut(&mut Prompt, &Event) -> Option<T>,
    ) -> Option<T> {
        loop {
            let backdrop = &self.backdrop;
            if let Err(e) = self.terminal.draw(|f| {
                restore_backdrop(f, backdrop);
                ui::draw_prompt(f, &prompt);
            }) {
                log::error!("Dialog draw error: {}", e);
                return None;
            }

            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    log::error!("Dialog input error: {}", e);
                    return None;
                }
            };
            if let Event::Key(key) = &event {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
            }
            if let Some(result) = step(&mut prompt, &event) {
                return Some(result);
            }
        }
    }

    fn pick_path(&mut self, title: &str) -> Option<PathBuf> {
        let prompt = Prompt::Path(PathPrompt::new(title));
        self.run_modal(prompt, |prompt, event| {
            let Prompt::Path(path_prompt) = prompt else {
                return Some(None);
            };
            match event {
                Event::Key(key) => match path_prompt.handle_key(*key) {
                    PromptResult::Pending => None,
                    PromptResult::Submitted(path) => Some(Some(path)),
                    PromptResult::Cancelled => Some(None),
                },
                Event::Paste(text) => {
                    path_prompt.handle_paste(text);
                    None
                }
                _ => None,
            }
        })
        .flatten()
    }
}

impl<'a, B: Backend> Dialogs for TerminalDialogs<'a, B> {
    fn ask_yes_no_cancel(&mut self, title: &str, message: &str) -> Answer {
        let prompt = Prompt::Confirm(ConfirmPrompt::new(title, message));
        self.run_modal(prompt, |prompt, event| match (prompt, event) {
            (Prompt::Confirm(confirm), Event::Key(key)) => confirm.handle_key(*key),
            _ => None,
        })
        .unwrap_or(Answer::Cancel)
    }

    fn show_error(&mut self, title: &str, message: &str) {
        let prompt = Prompt::Error(ErrorPrompt::new(title, message));
        let _ = self.run_modal(prompt, |prompt, event| match (prompt, event) {
            (Prompt::Error(error), Event::Key(key)) => error.handle_key(*key).then_some(()),
            _ => None,
        });
    }

    fn pick_save_path(&mut self, default_extension: &str) -> Option<PathBuf> {
        self.pick_path(&format!("Save As ({})", default_extension))
    }

    fn pick_open_path(&mut self) -> Option<PathBuf> {
        self.pick_path("Open")
    }
}

/// Copy the previous frame into `f` so the prompt appears over the editor.
fn restore_backdrop(f: &mut Frame, backdrop: &Buffer) {
    let area = f.size().intersection(backdrop.area);
    let buffer = f.buffer_mut();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            *buffer.get_mut(x, y) = backdrop.get(x, y).clone();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_confirm_shortcuts() {
        let mut prompt = ConfirmPrompt::new("Notepad", "Save?");
        assert_eq!(prompt.handle_key(key(KeyCode::Char('y'))), Some(Answer::Yes));
        assert_eq!(prompt.handle_key(key(KeyCode::Char('N'))), Some(Answer::No));
        assert_eq!(prompt.handle_key(key(KeyCode::Char('c'))), Some(Answer::Cancel));
        assert_eq!(prompt.handle_key(key(KeyCode::Esc)), Some(Answer::Cancel));
        assert_eq!(prompt.handle_key(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_confirm_selection_cycles() {
        let mut prompt = ConfirmPrompt::new("Notepad", "Save?");
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), Some(Answer::Yes));

        assert_eq!(prompt.handle_key(key(KeyCode::Right)), None);
        assert_eq!(prompt.selected, Answer::No);
        prompt.handle_key(key(KeyCode::Tab));
        prompt.handle_key(key(KeyCode::Tab));
        assert_eq!(prompt.selected, Answer::Yes);
        prompt.handle_key(key(KeyCode::Left));
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), Some(Answer::Cancel));
    }

    #[test]
    fn test_path_prompt_editing() {
        let mut prompt = PathPrompt::new("Open");
        for c in "notes.md".chars() {
            assert_eq!(prompt.handle_key(key(KeyCode::Char(c))), PromptResult::Pending);
        }
        prompt.handle_key(key(KeyCode::Backspace));
        prompt.handle_key(key(KeyCode::Backspace));
        prompt.handle_key(key(KeyCode::Char('t')));
        prompt.handle_key(key(KeyCode::Char('x')));
        prompt.handle_key(key(KeyCode::Char('t')));
        prompt.handle_key(key(KeyCode::Home));
        prompt.handle_key(key(KeyCode::Delete));
        prompt.handle_key(key(KeyCode::Char('N')));
        assert_eq!(prompt.input(), "Notes.txt");
        assert_eq!(prompt.cursor(), 1);

        assert_eq!(
            prompt.handle_key(key(KeyCode::Enter)),
            PromptResult::Submitted(PathBuf::from("Notes.txt"))
        );
    }

    #[test]
    fn test_path_prompt_empty_submit_and_cancel() {
        let mut prompt = PathPrompt::new("Save As (.txt)");
        prompt.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PromptResult::Pending);
        assert_eq!(prompt.handle_key(key(KeyCode::Esc)), PromptResult::Cancelled);
    }

    #[test]
    fn test_path_prompt_paste_and_clear() {
        let mut prompt = PathPrompt::new("Open");
        prompt.handle_paste("/tmp/a b.txt\n");
        assert_eq!(prompt.input(), "/tmp/a b.txt");
        prompt.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(prompt.input(), "");
        assert_eq!(prompt.cursor(), 0);
    }

    #[test]
    fn test_error_prompt_dismissal() {
        let mut prompt = ErrorPrompt::new("Notepad", "Couldn't read the file!");
        assert!(!prompt.handle_key(key(KeyCode::Char('q'))));
        assert!(prompt.handle_key(key(KeyCode::Enter)));
        assert!(prompt.handle_key(key(KeyCode::Esc)));
    }
}
