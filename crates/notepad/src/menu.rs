use crossterm::event::{KeyCode, KeyEvent};

use crate::keymap::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItemKind {
    Action,
    Checkbox,
    Separator,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: &'static str,
    pub accelerator: Option<&'static str>,
    pub command: Option<Command>,
    pub kind: MenuItemKind,
}

impl MenuItem {
    fn action(label: &'static str, accelerator: &'static str, command: Command) -> Self {
        Self {
            label,
            accelerator: Some(accelerator),
            command: Some(command),
            kind: MenuItemKind::Action,
        }
    }

    fn checkbox(label: &'static str, command: Command) -> Self {
        Self {
            label,
            accelerator: None,
            command: Some(command),
            kind: MenuItemKind::Checkbox,
        }
    }

    fn separator() -> Self {
        Self {
            label: "",
            accelerator: None,
            command: None,
            kind: MenuItemKind::Separator,
        }
    }

    pub fn is_separator(&self) -> bool {
        self.kind == MenuItemKind::Separator
    }
}

#[derive(Debug, Clone)]
pub struct Menu {
    pub title: &'static str,
    pub items: Vec<MenuItem>,
}

/// Menu bar with at most one open drop-down.
#[derive(Debug, Clone)]
pub struct MenuBar {
    pub menus: Vec<Menu>,
    open: Option<usize>,
    selected: usize,
}

impl MenuBar {
    pub fn notepad() -> Self {
        let file = Menu {
            title: "File",
            items: vec![
                MenuItem::action("New", "Ctrl+N", Command::New),
                MenuItem::separator(),
                MenuItem::action("Save", "Ctrl+S", Command::Save),
                MenuItem::action("Save As", "Ctrl+Shift+S", Command::SaveAs),
                MenuItem::action("Open", "Ctrl+O", Command::Open),
                MenuItem::separator(),
                MenuItem::action("Exit", "Ctrl+Q", Command::Close),
            ],
        };
        let settings = Menu {
            title: "Settings",
            items: vec![MenuItem::checkbox("Auto Save", Command::ToggleAutosave)],
        };
        Self {
            menus: vec![file, settings],
            open: None,
            selected: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn open(&mut self, index: usize) {
        if index < self.menus.len() {
            self.open = Some(index);
            self.selected = self.first_selectable(index);
        }
    }

    pub fn close(&mut self) {
        self.open = None;
        self.selected = 0;
    }

    /// Navigate the open menu. Returns the command chosen, if any; the
    /// menu closes when a command is chosen or on Esc.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        let index = self.open?;
        match key.code {
            KeyCode::Esc | KeyCode::F(10) => self.close(),
            KeyCode::Left => {
                self.open((index + self.menus.len() - 1) % self.menus.len());
            }
            KeyCode::Right => self.open((index + 1) % self.menus.len()),
            KeyCode::Up => self.step(index, false),
            KeyCode::Down => self.step(index, true),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let command = self.menus[index]
                    .items
                    .get(self.selected)
                    .and_then(|item| item.command);
                self.close();
                return command;
            }
            _ => {}
        }
        None
    }

    fn first_selectable(&self, menu: usize) -> usize {
        self.menus[menu]
            .items
            .iter()
            .position(|item| !item.is_separator())
            .unwrap_or(0)
    }

    fn step(&mut self, menu: usize, forward: bool) {
        let items = &self.menus[menu].items;
        let len = items.len();
        if len == 0 {
            return;
        }
        let mut next = self.selected;
        for _ in 0..len {
            next = if forward { (next + 1) % len } else { (next + len - 1) % len };
            if !items[next].is_separator() {
                self.selected = next;
                return;
            }
        }
    }
}

impl Default for MenuBar {
    fn default() -> Self {
        Self::notepad()
    }
}
