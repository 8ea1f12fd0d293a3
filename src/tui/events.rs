//! Event and command types for the workbench TUI.

use crossterm::event::KeyEvent;

use crate::workspace::WorkspaceSnapshot;

/// Events consumed by the draw loop.
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input
    Key(KeyEvent),
    /// The session worker finished an operation; carries the fresh read
    /// model and a status line
    Workspace { snapshot: WorkspaceSnapshot, status: String },
}

/// Operations forwarded to the session worker task, which owns the session
/// and processes them one at a time.
#[derive(Debug)]
pub enum SessionCommand {
    Execute(String),
    FetchData(String),
    Remove(String),
}
