//! REPL handler: interactive workbench with a TUI interface.

use anyhow::Result;
use std::io;

use crate::tui::run_workbench;

/// Run the interactive workbench for one history session.
pub async fn run(session_id: &str) -> Result<()> {
    // Check if TUI mode is available
    if !io::IsTerminal::is_terminal(&io::stdout()) {
        eprintln!("Warning: TUI mode not available in this environment. The workbench requires a proper terminal.");
        eprintln!("Try running in a terminal instead of an IDE or redirected output.");
        return Err(anyhow::anyhow!("TUI mode requires a proper terminal environment"));
    }

    run_workbench(session_id).await
}
