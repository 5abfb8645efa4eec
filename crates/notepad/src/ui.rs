use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;
use crate::dialog::{Answer, ConfirmPrompt, ErrorPrompt, PathPrompt, Prompt};
use crate::document;
use crate::menu::{MenuBar, MenuItemKind};
use crate::session::APP_TITLE;
use crate::status_manager::MessageType;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Length(1), // Menu bar
            Constraint::Min(0),    // Editor area
            Constraint::Length(1), // Status line
        ])
        .split(f.size());

    draw_title_bar(f, app, chunks[0]);
    draw_menu_bar(f, &app.menu, chunks[1]);
    draw_editor(f, app, chunks[2]);
    draw_status_line(f, app, chunks[3]);

    if app.menu.is_open() {
        draw_menu_dropdown(f, &app.menu, app.session.autosave_enabled(), chunks[1]);
    }
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let modified = if app.is_modified() { " [Modified]" } else { "" };
    let title = format!(
        "  {} -- {}{}",
        APP_TITLE,
        document::display_name(app.session.path()),
        modified
    );

    let title_bar = Paragraph::new(title)
        .style(Style::default().bg(Color::Blue).fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(title_bar, area);
}

fn menu_title_x(menu: &MenuBar, index: usize) -> u16 {
    menu.menus[..index]
        .iter()
        .map(|m| m.title.width() as u16 + 2)
        .sum::<u16>()
}

fn draw_menu_bar(f: &mut Frame, menu: &MenuBar, area: Rect) {
    let mut spans = Vec::new();
    for (i, m) in menu.menus.iter().enumerate() {
        let style = if menu.open_index() == Some(i) {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {} ", m.title), style));
    }
    spans.push(Span::styled(
        "   F10 menu",
        Style::default().fg(Color::Gray),
    ));

    let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_menu_dropdown(f: &mut Frame, menu: &MenuBar, autosave: bool, bar: Rect) {
    let Some(index) = menu.open_index() else {
        return;
    };
    let items = &menu.menus[index].items;

    let label_width = items
        .iter()
        .map(|item| {
            let check = if item.kind == MenuItemKind::Checkbox { 4 } else { 0 };
            let accel = item.accelerator.map_or(0, |a| a.width() + 3);
            check + item.label.width() + accel
        })
        .max()
        .unwrap_or(0);
    let inner_width = label_width + 2;

    let screen = f.size();
    let x = bar.x + menu_title_x(menu, index);
    let area = Rect::new(
        x,
        bar.y + 1,
        (inner_width as u16 + 2).min(screen.width.saturating_sub(x)),
        (items.len() as u16 + 2).min(screen.height.saturating_sub(bar.y + 1)),
    );

    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if item.is_separator() {
                return Line::from("─".repeat(inner_width));
            }
            let mut label = String::from(" ");
            if item.kind == MenuItemKind::Checkbox {
                label.push_str(if autosave { "[x] " } else { "[ ] " });
            }
            label.push_str(item.label);
            if let Some(accel) = item.accelerator {
                let pad = inner_width.saturating_sub(label.width() + accel.width() + 1);
                label.push_str(&" ".repeat(pad));
                label.push_str(accel);
            }
            label.push(' ');

            let style = if i == menu.selected() {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(Span::styled(label, style))
        })
        .collect();

    f.render_widget(Clear, area);
    let dropdown = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(dropdown, area);
}

fn draw_editor(f: &mut Frame, app: &mut App, area: Rect) {
    let editor = &mut app.session.editor;
    editor.set_viewport_size(area.width as usize, area.height as usize);

    let lines: Vec<Line> = editor.viewport_lines().into_iter().map(Line::from).collect();
    let col_offset = editor.col_offset();
    let content = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .scroll((0, col_offset.min(u16::MAX as usize) as u16));
    f.render_widget(content, area);

    if app.menu.is_open() {
        return;
    }
    let (line, _) = editor.cursor_position();
    let screen_line = line.saturating_sub(editor.viewport_offset());
    let screen_col = editor.cursor_display_col().saturating_sub(col_offset);
    if screen_line < area.height as usize && screen_col < area.width as usize {
        f.set_cursor(area.x + screen_col as u16, area.y + screen_line as u16);
    }
}

fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    let (line, col) = app.session.editor.cursor_position();
    let autosave = if app.session.autosave_enabled() { "on" } else { "off" };
    let position = format!("Ln {}, Col {}  Auto Save: {} ", line + 1, col + 1, autosave);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(position.width() as u16),
        ])
        .split(area);

    if let Some(message) = app.status.current_message() {
        let color = match message.message_type {
            MessageType::Info => Color::Yellow,
            MessageType::Success => Color::Green,
            MessageType::Warning => Color::LightRed,
            MessageType::Error => Color::Red,
        };
        let status = Paragraph::new(message.display_text()).style(Style::default().fg(color));
        f.render_widget(status, chunks[0]);
    }

    let position = Paragraph::new(position)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Right);
    f.render_widget(position, chunks[1]);
}

/// Draw a modal prompt centered over whatever is already in the frame.
pub fn draw_prompt(f: &mut Frame, prompt: &Prompt) {
    match prompt {
        Prompt::Confirm(confirm) => draw_confirm(f, confirm),
        Prompt::Path(path) => draw_path_prompt(f, path),
        Prompt::Error(error) => draw_error(f, error),
    }
}

fn prompt_block(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(color))
}

fn draw_confirm(f: &mut Frame, prompt: &ConfirmPrompt) {
    let area = centered_rect(f.size(), 56, 7);
    let buttons: Vec<Span> = Answer::ALL
        .iter()
        .flat_map(|answer| {
            let style = if *answer == prompt.selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            [
                Span::styled(format!("[ {} ]", answer.label()), style),
                Span::raw("  "),
            ]
        })
        .collect();

    let text = vec![
        Line::from(prompt.message.clone()),
        Line::from(""),
        Line::from(buttons),
        Line::from(Span::styled(
            "y/n/c  \u{2190}\u{2192} select  Enter confirm",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    f.render_widget(Clear, area);
    let dialog = Paragraph::new(text)
        .block(prompt_block(&prompt.title, Color::Blue))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(dialog, area);
}

fn draw_path_prompt(f: &mut Frame, prompt: &PathPrompt) {
    let area = centered_rect(f.size(), 64, 6);
    let cwd = std::env::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_default();

    let input: Vec<char> = prompt.input().chars().collect();
    let field_width = area.width.saturating_sub(4) as usize;
    let (start, cursor_col) = scroll_input(&input, prompt.cursor(), field_width);
    let visible: String = input[start..].iter().collect();

    let text = vec![
        Line::from(format!("> {}", visible)),
        Line::from(""),
        Line::from(Span::styled(
            format!("in {}   Enter confirm  Esc cancel", cwd),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    f.render_widget(Clear, area);
    let dialog = Paragraph::new(text).block(prompt_block(&prompt.title, Color::Blue));
    f.render_widget(dialog, area);

    let x = area.x + 1 + 2 + cursor_col as u16;
    if x < area.right().saturating_sub(1) {
        f.set_cursor(x, area.y + 1);
    }
}

/// First visible char of a single-line input and the cursor's column
/// relative to it, scrolling by display width so the cursor stays inside
/// `width` columns.
fn scroll_input(input: &[char], cursor: usize, width: usize) -> (usize, usize) {
    let cursor = cursor.min(input.len());
    let mut cursor_col: usize = input[..cursor].iter().map(|c| c.width().unwrap_or(0)).sum();
    let mut start = 0;
    while start < cursor && cursor_col >= width {
        cursor_col -= input[start].width().unwrap_or(0);
        start += 1;
    }
    (start, cursor_col)
}

fn draw_error(f: &mut Frame, prompt: &ErrorPrompt) {
    let screen = f.size();
    let longest = prompt.message.lines().map(|l| l.width()).max().unwrap_or(0);
    let width = (longest as u16).saturating_add(4).clamp(40, screen.width.max(40));
    let inner = width.min(screen.width).saturating_sub(2).max(1) as usize;
    // Word wrapping can leave a short tail ahead of a long word, so allow one
    // spare row per wrapped line.
    let rows: usize = prompt
        .message
        .lines()
        .map(|l| match l.width() {
            w if w <= inner => 1,
            w => w / inner + 2,
        })
        .sum();
    let area = centered_rect(screen, width, (rows as u16).saturating_add(4));

    let mut text: Vec<Line> = prompt
        .message
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "[ OK ]",
        Style::default().add_modifier(Modifier::REVERSED),
    )));

    f.render_widget(Clear, area);
    let dialog = Paragraph::new(text)
        .block(prompt_block(&prompt.title, Color::Red))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(dialog, area);
}

fn centered_rect(screen: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(screen.width);
    let height = height.min(screen.height);
    Rect::new(
        screen.x + (screen.width - width) / 2,
        screen.y + (screen.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::keymap::SETTINGS_MENU;
    use crate::session::{EditorSession, UNSAVED_CHANGES_PROMPT};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn test_app() -> App {
        App::with_session(EditorSession::new(Settings::default(), None))
    }

    fn screen_text(buffer: &Buffer) -> String {
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_draw_basic() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = test_app();
        app.session.editor.insert_str("hello world");

        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("Notepad -- Untitled [Modified]"));
        assert!(text.contains(" File  Settings "));
        assert!(text.contains("hello world"));
        assert!(text.contains("Ln 1, Col 12"));
    }

    #[test]
    fn test_draw_open_settings_menu() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = test_app();
        app.session.set_autosave(true);
        app.menu.open(SETTINGS_MENU);

        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("[x] Auto Save"));
    }

    #[test]
    fn test_draw_small_terminal() {
        let mut terminal = Terminal::new(TestBackend::new(5, 2)).unwrap();
        let mut app = test_app();
        app.menu.open(0);

        terminal.draw(|f| draw(f, &mut app)).unwrap();
        terminal
            .draw(|f| {
                draw_prompt(
                    f,
                    &Prompt::Confirm(ConfirmPrompt::new(APP_TITLE, UNSAVED_CHANGES_PROMPT)),
                )
            })
            .unwrap();
    }

    #[test]
    fn test_draw_prompts() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal
            .draw(|f| {
                draw_prompt(
                    f,
                    &Prompt::Confirm(ConfirmPrompt::new(APP_TITLE, UNSAVED_CHANGES_PROMPT)),
                )
            })
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("[ Yes ]"));
        assert!(text.contains("[ Cancel ]"));

        terminal
            .draw(|f| {
                draw_prompt(
                    f,
                    &Prompt::Error(ErrorPrompt::new(APP_TITLE, "Couldn't read the file!")),
                )
            })
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("Couldn't read the file!"));
        assert!(text.contains("[ OK ]"));

        let mut path = PathPrompt::new("Open");
        path.handle_paste("notes.txt");
        terminal
            .draw(|f| draw_prompt(f, &Prompt::Path(path.clone())))
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("> notes.txt"));
    }

    #[test]
    fn test_scroll_input_counts_display_width() {
        let ascii: Vec<char> = "notes.txt".chars().collect();
        assert_eq!(scroll_input(&ascii, 9, 20), (0, 9));

        // 40 double-width chars with the cursor at the end of a 60 column field.
        let wide: Vec<char> = "日".repeat(40).chars().collect();
        let (start, col) = scroll_input(&wide, 40, 60);
        assert_eq!(start, 11);
        assert_eq!(col, 58);

        let (start, col) = scroll_input(&wide, 5, 60);
        assert_eq!((start, col), (0, 10));
    }

    #[test]
    fn test_error_prompt_fits_long_message() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let message = format!("Couldn't read the file!\n{}", "x".repeat(150));

        terminal
            .draw(|f| draw_prompt(f, &Prompt::Error(ErrorPrompt::new(APP_TITLE, &message))))
            .unwrap();

        let text = screen_text(terminal.backend().buffer());
        assert_eq!(text.matches('x').count(), 150);
        assert!(text.contains("[ OK ]"));
    }

    #[test]
    fn test_centered_rect_clamps() {
        let screen = Rect::new(0, 0, 20, 5);
        assert_eq!(centered_rect(screen, 10, 3), Rect::new(5, 1, 10, 3));
        assert_eq!(centered_rect(screen, 50, 50), screen);
    }
}
