use std::cmp;

/// Text buffer behind one form field. Positions are in chars, not bytes.
#[derive(Debug, Clone)]
pub struct Editor {
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
        }
    }

    /// Load content with the cursor placed at the very end
    pub fn from_string(content: String) -> Self {
        let lines: Vec<String> = if content.is_empty() {
            vec![String::new()]
        } else {
            content.split('\n').map(|s| s.to_string()).collect()
        };
        let cursor_line = lines.len().saturating_sub(1);
        let cursor_col = lines.last().map(|l| l.chars().count()).unwrap_or(0);
        Self {
            lines,
            cursor_line,
            cursor_col,
        }
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines.get(line).map(|l| l.chars().count()).unwrap_or(0)
    }

    /// Ensure the cursor points inside the buffer
    fn clamp_cursor(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.cursor_line = cmp::min(self.cursor_line, self.lines.len() - 1);
        self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.insert_newline();
            return;
        }
        self.clamp_cursor();
        let line = &mut self.lines[self.cursor_line];
        let mut chars: Vec<char> = line.chars().collect();
        chars.insert(self.cursor_col, ch);
        *line = chars.into_iter().collect();
        self.cursor_col += 1;
    }

    pub fn insert_newline(&mut self) {
        self.clamp_cursor();
        let line = &mut self.lines[self.cursor_line];
        let mut chars: Vec<char> = line.chars().collect();
        let remainder: String = chars.split_off(self.cursor_col).into_iter().collect();
        *line = chars.into_iter().collect();
        self.lines.insert(self.cursor_line + 1, remainder);
        self.cursor_line += 1;
        self.cursor_col = 0;
    }

    /// Backspace: delete the char before the cursor, joining lines at column 0
    pub fn delete_char(&mut self) {
        self.clamp_cursor();
        if self.cursor_col > 0 {
            let line = &mut self.lines[self.cursor_line];
            let mut chars: Vec<char> = line.chars().collect();
            chars.remove(self.cursor_col - 1);
            *line = chars.into_iter().collect();
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
            self.lines[self.cursor_line].push_str(&current);
        }
    }

    /// Delete key: remove the char under the cursor, joining the next line at line end
    pub fn delete_forward(&mut self) {
        self.clamp_cursor();
        if self.cursor_col < self.line_len(self.cursor_line) {
            let line = &mut self.lines[self.cursor_line];
            let mut chars: Vec<char> = line.chars().collect();
            chars.remove(self.cursor_col);
            *line = chars.into_iter().collect();
        } else if self.cursor_line + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&next);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.clamp_cursor();
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
        }
    }

    pub fn move_cursor_right(&mut self) {
        self.clamp_cursor();
        if self.cursor_col < self.line_len(self.cursor_line) {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    /// Returns false when already on the first line
    pub fn move_cursor_up(&mut self) -> bool {
        if self.cursor_line == 0 {
            return false;
        }
        self.cursor_line -= 1;
        self.clamp_cursor();
        true
    }

    /// Returns false when already on the last line
    pub fn move_cursor_down(&mut self) -> bool {
        if self.cursor_line + 1 >= self.lines.len() {
            return false;
        }
        self.cursor_line += 1;
        self.clamp_cursor();
        true
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.clamp_cursor();
        self.cursor_col = self.line_len(self.cursor_line);
    }

    pub fn to_string(&self) -> String {
        self.lines.join("\n")
    }

    /// First line to show so the cursor stays inside a viewport of `height` lines
    pub fn scroll_offset(&self, height: usize) -> usize {
        if height == 0 || self.cursor_line < height {
            0
        } else {
            self.cursor_line + 1 - height
        }
    }

    /// First column to show so the cursor stays inside a viewport of `width` columns
    pub fn horizontal_offset(&self, width: usize) -> usize {
        if width == 0 || self.cursor_col < width {
            0
        } else {
            self.cursor_col + 1 - width
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_and_backspace_handle_multibyte_chars() {
        let mut editor = Editor::new();
        for ch in "Café 🎉".chars() {
            editor.insert_char(ch);
        }
        assert_eq!(editor.to_string(), "Café 🎉");
        editor.delete_char();
        editor.delete_char();
        assert_eq!(editor.to_string(), "Café");
        assert_eq!(editor.cursor_col, 4);
    }

    #[test]
    fn newline_splits_and_backspace_joins() {
        let mut editor = Editor::from_string("hello world".into());
        for _ in 0..6 {
            editor.move_cursor_left();
        }
        editor.insert_newline();
        assert_eq!(editor.lines, vec!["hello", " world"]);
        editor.delete_char();
        assert_eq!(editor.to_string(), "hello world");
        assert_eq!(editor.cursor_col, 5);
    }

    #[test]
    fn multi_line_content_round_trips() {
        let editor = Editor::from_string("line one\n\nline three".into());
        assert_eq!(editor.lines.len(), 3);
        assert_eq!(editor.to_string(), "line one\n\nline three");
        assert_eq!(editor.cursor_line, 2);
    }

    #[test]
    fn vertical_moves_report_edges() {
        let mut editor = Editor::from_string("a\nlonger line".into());
        assert!(!editor.move_cursor_down());
        assert!(editor.move_cursor_up());
        assert_eq!(editor.cursor_col, 1);
        assert!(!editor.move_cursor_up());
    }

    #[test]
    fn delete_forward_joins_lines() {
        let mut editor = Editor::from_string("ab\ncd".into());
        editor.cursor_line = 0;
        editor.cursor_col = 2;
        editor.delete_forward();
        assert_eq!(editor.to_string(), "abcd");
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut editor = Editor::from_string("1\n2\n3\n4\n5".into());
        assert_eq!(editor.scroll_offset(3), 2);
        editor.cursor_line = 0;
        assert_eq!(editor.scroll_offset(3), 0);
    }
}
