use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Actions reachable from menus and accelerators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    New,
    Save,
    SaveAs,
    Open,
    ToggleAutosave,
    Close,
    /// Open the menu at this index in the menu bar.
    OpenMenu(usize),
}

pub const FILE_MENU: usize = 0;
pub const SETTINGS_MENU: usize = 1;

/// Map a key press to a command. Plain text keys return `None` and are left
/// to the editor.
///
/// Letters match in either case, since caps lock turns `Ctrl+s` into
/// `Ctrl+S`. Save As needs the shift modifier to be reported, which only
/// happens with keyboard enhancement enabled, so `F12` is offered too.
pub fn command_for_key(key: &KeyEvent) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::F(10) => Some(Command::OpenMenu(FILE_MENU)),
        KeyCode::F(12) => Some(Command::SaveAs),
        KeyCode::Char(c) if ctrl && !alt => match c.to_ascii_lowercase() {
            'n' => Some(Command::New),
            's' if shift => Some(Command::SaveAs),
            's' => Some(Command::Save),
            'o' => Some(Command::Open),
            'q' | 'c' => Some(Command::Close),
            _ => None,
        },
        KeyCode::Char(c) if alt && !ctrl => match c.to_ascii_lowercase() {
            'f' => Some(Command::OpenMenu(FILE_MENU)),
            's' => Some(Command::OpenMenu(SETTINGS_MENU)),
            _ => None,
        },
        _ => None,
    }
}
