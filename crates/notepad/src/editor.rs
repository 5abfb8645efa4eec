use ropey::{Rope, RopeSlice};
use std::cmp;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub const TAB_WIDTH: usize = 4;

/// The editable text area: a rope plus cursor and viewport.
///
/// The cursor column is a char offset within the current line, never past
/// the line break. Display columns are derived on demand.
#[derive(Clone)]
pub struct Editor {
    rope: Rope,
    cursor_line: usize,
    cursor_col: usize,
    viewport_offset: usize,
    viewport_height: usize,
    col_offset: usize,
    viewport_width: usize,
    // Display-only marker; unsaved-change decisions diff against disk.
    modified: bool,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            cursor_line: 0,
            cursor_col: 0,
            viewport_offset: 0,
            viewport_height: 24, // Default, will be updated
            col_offset: 0,
            viewport_width: 80,
            modified: false,
        }
    }

    pub fn set_content(&mut self, content: String) {
        self.rope = Rope::from_str(&content);
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.viewport_offset = 0;
        self.col_offset = 0;
        self.modified = false;
    }

    pub fn clear(&mut self) {
        self.set_content(String::new());
    }

    pub fn get_content(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        (self.cursor_line, self.cursor_col)
    }

    pub fn set_cursor_position(&mut self, line: usize, col: usize) {
        self.cursor_line = line.min(self.line_count().saturating_sub(1));
        self.cursor_col = col.min(self.line_len(self.cursor_line));
        self.adjust_viewport();
    }

    pub fn set_viewport_size(&mut self, width: usize, height: usize) {
        self.viewport_width = width.max(1);
        self.viewport_height = height.max(1);
        self.adjust_viewport();
    }

    pub fn viewport_offset(&self) -> usize {
        self.viewport_offset
    }

    pub fn col_offset(&self) -> usize {
        self.col_offset
    }

    /// Visible lines with tabs expanded and line breaks removed.
    pub fn viewport_lines(&self) -> Vec<String> {
        let end_line = cmp::min(
            self.viewport_offset + self.viewport_height,
            self.rope.len_lines(),
        );
        (self.viewport_offset..end_line)
            .map(|i| expand_tabs(&self.line_text(i)))
            .collect()
    }

    /// Display column of the cursor, before horizontal scrolling.
    pub fn cursor_display_col(&self) -> usize {
        let line = self.line_text(self.cursor_line);
        let prefix: String = line.chars().take(self.cursor_col).collect();
        UnicodeWidthStr::width(expand_tabs(&prefix).as_str())
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, c);
        if c == '\n' {
            self.cursor_line += 1;
            self.cursor_col = 0;
        } else {
            self.cursor_col += 1;
        }
        self.modified = true;
        self.adjust_viewport();
    }

    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, text);
        let end = idx + text.chars().count();
        self.move_to_char_idx(end);
        self.modified = true;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn insert_tab(&mut self) {
        self.insert_char('\t');
    }

    pub fn delete_char_backward(&mut self) {
        if self.cursor_col > 0 {
            let line = self.line_text(self.cursor_line);
            let start_col = prev_grapheme_col(&line, self.cursor_col);
            let line_start = self.rope.line_to_char(self.cursor_line);
            self.rope
                .remove(line_start + start_col..line_start + self.cursor_col);
            self.cursor_col = start_col;
            self.modified = true;
            self.adjust_viewport();
        } else if self.cursor_line > 0 {
            // Join with the previous line, removing its whole line break.
            let prev = self.cursor_line - 1;
            let prev_len = self.line_len(prev);
            let break_start = self.rope.line_to_char(prev) + prev_len;
            let break_end = self.rope.line_to_char(self.cursor_line);
            self.rope.remove(break_start..break_end);
            self.cursor_line = prev;
            self.cursor_col = prev_len;
            self.modified = true;
            self.adjust_viewport();
        }
    }

    pub fn delete_char_forward(&mut self) {
        let line_len = self.line_len(self.cursor_line);
        let line_start = self.rope.line_to_char(self.cursor_line);
        if self.cursor_col < line_len {
            let line = self.line_text(self.cursor_line);
            let end_col = next_grapheme_col(&line, self.cursor_col);
            self.rope
                .remove(line_start + self.cursor_col..line_start + end_col);
            self.modified = true;
        } else if self.cursor_line + 1 < self.rope.len_lines() {
            let break_end = self.rope.line_to_char(self.cursor_line + 1);
            self.rope.remove(line_start + line_len..break_end);
            self.modified = true;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.clamp_cursor_col();
            self.adjust_viewport();
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line + 1 < self.rope.len_lines() {
            self.cursor_line += 1;
            self.clamp_cursor_col();
            self.adjust_viewport();
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            let line = self.line_text(self.cursor_line);
            self.cursor_col = prev_grapheme_col(&line, self.cursor_col);
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
        }
        self.adjust_viewport();
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.line_len(self.cursor_line) {
            let line = self.line_text(self.cursor_line);
            self.cursor_col = next_grapheme_col(&line, self.cursor_col);
        } else if self.cursor_line + 1 < self.rope.len_lines() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
        self.adjust_viewport();
    }

    pub fn move_to_line_start(&mut self) {
        self.cursor_col = 0;
        self.adjust_viewport();
    }

    pub fn move_to_line_end(&mut self) {
        self.cursor_col = self.line_len(self.cursor_line);
        self.adjust_viewport();
    }

    pub fn move_to_document_start(&mut self) {
        self.set_cursor_position(0, 0);
    }

    pub fn move_to_document_end(&mut self) {
        self.set_cursor_position(usize::MAX, usize::MAX);
    }

    pub fn page_up(&mut self) {
        self.cursor_line = self.cursor_line.saturating_sub(self.viewport_height);
        self.viewport_offset = self.viewport_offset.saturating_sub(self.viewport_height);
        self.clamp_cursor_col();
        self.adjust_viewport();
    }

    pub fn page_down(&mut self) {
        let max_line = self.line_count().saturating_sub(1);
        self.cursor_line = cmp::min(self.cursor_line + self.viewport_height, max_line);
        self.viewport_offset = cmp::min(
            self.viewport_offset + self.viewport_height,
            max_line.saturating_sub(self.viewport_height.saturating_sub(1)),
        );
        self.clamp_cursor_col();
        self.adjust_viewport();
    }

    fn line_slice(&self, line: usize) -> Option<RopeSlice<'_>> {
        self.rope.get_line(line)
    }

    /// Line contents without the trailing line break.
    fn line_text(&self, line: usize) -> String {
        match self.line_slice(line) {
            Some(slice) => slice.chars().take(self.line_len(line)).collect(),
            None => String::new(),
        }
    }

    /// Number of chars in `line`, excluding its line break.
    fn line_len(&self, line: usize) -> usize {
        let Some(slice) = self.line_slice(line) else {
            return 0;
        };
        let mut len = slice.len_chars();
        while len > 0 && is_line_break(slice.char(len - 1)) {
            len -= 1;
        }
        len
    }

    fn cursor_char_idx(&self) -> usize {
        self.rope.line_to_char(self.cursor_line) + self.cursor_col
    }

    fn move_to_char_idx(&mut self, idx: usize) {
        let idx = idx.min(self.rope.len_chars());
        self.cursor_line = self.rope.char_to_line(idx);
        self.cursor_col = idx - self.rope.line_to_char(self.cursor_line);
        self.clamp_cursor_col();
        self.adjust_viewport();
    }

    fn clamp_cursor_col(&mut self) {
        self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
    }

    fn adjust_viewport(&mut self) {
        if self.cursor_line < self.viewport_offset {
            self.viewport_offset = self.cursor_line;
        } else if self.cursor_line >= self.viewport_offset + self.viewport_height {
            self.viewport_offset = self.cursor_line + 1 - self.viewport_height;
        }

        let display_col = self.cursor_display_col();
        if display_col < self.col_offset {
            self.col_offset = display_col;
        } else if display_col >= self.col_offset + self.viewport_width {
            self.col_offset = display_col + 1 - self.viewport_width;
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// Expand tabs to the next multiple of `TAB_WIDTH`.
pub fn expand_tabs(text: &str) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut width = 0;
    for g in text.graphemes(true) {
        if g == "\t" {
            let pad = TAB_WIDTH - (width % TAB_WIDTH);
            out.extend(std::iter::repeat(' ').take(pad));
            width += pad;
        } else {
            out.push_str(g);
            width += UnicodeWidthStr::width(g);
        }
    }
    out
}

/// Char offsets at which grapheme clusters of `line` start, plus the end.
fn grapheme_boundaries(line: &str) -> Vec<usize> {
    let mut boundaries = vec![0];
    let mut offset = 0;
    for g in line.graphemes(true) {
        offset += g.chars().count();
        boundaries.push(offset);
    }
    boundaries
}

fn prev_grapheme_col(line: &str, col: usize) -> usize {
    grapheme_boundaries(line)
        .into_iter()
        .rev()
        .find(|b| *b < col)
        .unwrap_or(0)
}

fn next_grapheme_col(line: &str, col: usize) -> usize {
    let boundaries = grapheme_boundaries(line);
    let last = boundaries.last().copied().unwrap_or(0);
    boundaries.into_iter().find(|b| *b > col).unwrap_or(last)
}
