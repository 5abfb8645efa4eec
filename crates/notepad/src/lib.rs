// Notepad library exports

pub mod app;
pub mod autosave;
pub mod config;
pub mod dialog;
pub mod document;
pub mod editor;
pub mod keymap;
pub mod menu;
pub mod session;
pub mod status_manager;
pub mod ui;

pub use app::App;
pub use config::Settings;
pub use editor::Editor;
pub use session::EditorSession;
