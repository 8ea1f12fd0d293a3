//! Workbench TUI application state.

use crate::workspace::{DatasetEntry, WorkspaceSnapshot};

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Expression input line
    Input,
    /// Dataset panel
    Datasets,
}

/// Application state for the workbench TUI.
#[derive(Debug)]
pub struct App {
    /// History session id
    pub session_id: String,
    /// Latest workspace read model
    pub snapshot: WorkspaceSnapshot,
    /// Selected row in the dataset panel
    pub selected: usize,
    /// Expression input buffer
    pub input: String,
    /// Cursor position in input (byte index)
    pub input_cursor: usize,
    /// Executed expressions (newest last)
    pub input_history: Vec<String>,
    /// Current history index when navigating (None = new line)
    pub history_index: Option<usize>,
    /// Pane with keyboard focus
    pub focus: Focus,
    /// Whether a session operation is in flight
    pub is_busy: bool,
    /// Status message to display
    pub status_message: String,
    /// Whether to show help
    pub show_help: bool,
    /// Rows shown when previewing data in the detail pane
    pub display_limit: usize,
}

impl App {
    pub fn new(session_id: String, input_history: Vec<String>, display_limit: usize) -> Self {
        Self {
            session_id,
            snapshot: WorkspaceSnapshot::default(),
            selected: 0,
            input: String::new(),
            input_cursor: 0,
            input_history,
            history_index: None,
            focus: Focus::Input,
            is_busy: false,
            status_message: "Enter a VTL expression | tab: datasets | ctrl+h: help".to_string(),
            show_help: false,
            display_limit,
        }
    }

    /// Install a fresh workspace read model, keeping the selection in range.
    pub fn apply_snapshot(&mut self, snapshot: WorkspaceSnapshot, status: String) {
        self.snapshot = snapshot;
        self.status_message = status;
        self.is_busy = false;
        if self.selected >= self.snapshot.datasets.len() {
            self.selected = self.snapshot.datasets.len().saturating_sub(1);
        }
    }

    /// Name and entry of the dataset under the cursor.
    pub fn selected_dataset(&self) -> Option<(&str, &DatasetEntry)> {
        self.snapshot
            .datasets
            .get(self.selected)
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.snapshot.datasets.len() {
            self.selected += 1;
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Datasets,
            Focus::Datasets => Focus::Input,
        };
    }

    // ----- Input editing helpers -----

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.input_cursor = 0;
        self.history_index = None;
    }

    pub fn move_cursor_left(&mut self) {
        if self.input_cursor > 0 {
            // Step back over one char, not one byte
            let mut idx = self.input_cursor - 1;
            while idx > 0 && !self.input.is_char_boundary(idx) {
                idx -= 1;
            }
            self.input_cursor = idx;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.input_cursor < self.input.len() {
            let mut idx = self.input_cursor + 1;
            while idx < self.input.len() && !self.input.is_char_boundary(idx) {
                idx += 1;
            }
            self.input_cursor = idx;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.input_cursor = self.input.len();
    }

    pub fn insert_char(&mut self, c: char) {
        if self.input_cursor >= self.input.len() {
            self.input.push(c);
            self.input_cursor = self.input.len();
        } else {
            self.input.insert(self.input_cursor, c);
            self.input_cursor += c.len_utf8();
        }
    }

    pub fn backspace(&mut self) {
        if self.input_cursor > 0 && self.input_cursor <= self.input.len() {
            self.move_cursor_left();
            self.input.remove(self.input_cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.input_cursor < self.input.len() {
            self.input.remove(self.input_cursor);
        }
    }

    pub fn push_history(&mut self, line: String) {
        if !line.trim().is_empty()
            && self.input_history.last().map(|s| s.as_str()) != Some(line.as_str())
        {
            self.input_history.push(line);
        }
        self.history_index = None;
    }

    pub fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        let next_index = match self.history_index {
            None => Some(self.input_history.len().saturating_sub(1)),
            Some(0) => Some(0),
            Some(i) => Some(i.saturating_sub(1)),
        };
        if let Some(i) = next_index {
            self.history_index = Some(i);
            self.input = self.input_history[i].clone();
            self.move_cursor_end();
        }
    }

    pub fn history_next(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        match self.history_index {
            None => {}
            Some(i) if i + 1 < self.input_history.len() => {
                let ni = i + 1;
                self.history_index = Some(ni);
                self.input = self.input_history[ni].clone();
                self.move_cursor_end();
            }
            Some(_) => {
                self.history_index = None;
                self.input.clear();
                self.input_cursor = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new("default".into(), Vec::new(), 5)
    }

    #[test]
    fn cursor_moves_over_multibyte_chars() {
        let mut a = app();
        for c in "på".chars() {
            a.insert_char(c);
        }
        assert_eq!(a.input_cursor, a.input.len());
        a.move_cursor_left();
        a.move_cursor_left();
        assert_eq!(a.input_cursor, 0);
        a.move_cursor_right();
        assert_eq!(a.input_cursor, 1);
    }

    #[test]
    fn backspace_removes_previous_char() {
        let mut a = app();
        for c in "abc".chars() {
            a.insert_char(c);
        }
        a.backspace();
        assert_eq!(a.input, "ab");
        assert_eq!(a.input_cursor, 2);
    }

    #[test]
    fn history_navigation_round_trips() {
        let mut a = app();
        a.push_history("first".into());
        a.push_history("second".into());
        a.history_prev();
        assert_eq!(a.input, "second");
        a.history_prev();
        assert_eq!(a.input, "first");
        a.history_next();
        assert_eq!(a.input, "second");
        a.history_next();
        assert_eq!(a.input, "");
    }

    #[test]
    fn push_history_skips_immediate_repeats() {
        let mut a = app();
        a.push_history("x := 1".into());
        a.push_history("x := 1".into());
        assert_eq!(a.input_history.len(), 1);
    }

    #[test]
    fn snapshot_clamps_selection() {
        let mut a = app();
        a.selected = 5;
        a.apply_snapshot(WorkspaceSnapshot::default(), "done".into());
        assert_eq!(a.selected, 0);
    }
}
