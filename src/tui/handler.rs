//! Async event loop for the workbench TUI.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tokio::sync::mpsc;

use crate::{
    config::Config,
    gateway::EvaluationGateway,
    history::ExpressionHistory,
    orchestrator::{ExecuteOutcome, Session},
    workspace::DatasetEntry,
};

use super::{
    app::{App, Focus},
    events::{SessionCommand, TuiEvent},
    ui::render_ui,
};

/// Run the workbench TUI for one history session.
pub async fn run_workbench(session_id: &str) -> Result<()> {
    if !io::IsTerminal::is_terminal(&io::stdout()) {
        return Err(anyhow::anyhow!("TUI mode requires a proper terminal environment"));
    }

    // Wire the service side before touching the terminal so config errors
    // print normally.
    let cfg = Config::load();
    let gateway = EvaluationGateway::from_config(&cfg)?;
    let history = ExpressionHistory::from_config(&cfg);
    let display_limit = cfg.get_usize("DISPLAY_LIMIT").unwrap_or(5);

    // temp session shouldn't persist
    if session_id == "temp" {
        history.invalidate(session_id);
    }

    let mut app = App::new(
        session_id.to_string(),
        history.read(session_id)?,
        display_limit,
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<SessionCommand>();

    // The worker owns the session and processes commands one at a time; the
    // draw loop only ever sees snapshots.
    tokio::spawn(session_worker(Session::new(gateway), cmd_rx, event_tx.clone()));

    let result = run_app(&mut terminal, &mut app, &history, cmd_tx, event_tx, event_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn session_worker(
    session: Session<EvaluationGateway>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<TuiEvent>,
) {
    while let Some(command) = commands.recv().await {
        let status = match command {
            SessionCommand::Execute(expression) => match session.execute(&expression).await {
                ExecuteOutcome::Published { datasets } => {
                    format!("evaluation produced {} dataset(s)", datasets.len())
                }
                ExecuteOutcome::Rejected { error } => {
                    format!("evaluation failed: {}", error.summary())
                }
                ExecuteOutcome::Superseded => "evaluation superseded".to_string(),
            },
            SessionCommand::FetchData(name) => match session.fetch_data(&name).await {
                DatasetEntry::Loaded { .. } => format!("loaded data for {}", name),
                DatasetEntry::Failed { error } => {
                    format!("fetching data for {} failed: {}", name, error.summary())
                }
                _ => format!("no data for {}", name),
            },
            SessionCommand::Remove(name) => match session.remove(&name).await {
                Ok(()) => format!("deleted {}", name),
                Err(error) => {
                    format!("deleting {} failed: {} (dataset kept)", name, error.summary())
                }
            },
        };

        let snapshot = session.snapshot().await;
        if events.send(TuiEvent::Workspace { snapshot, status }).is_err() {
            break;
        }
    }
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    history: &ExpressionHistory,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    // Spawn input handler
    let input_tx = event_tx.clone();
    tokio::task::spawn_blocking(move || {
        loop {
            // Poll for keyboard events
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if input_tx.send(TuiEvent::Key(key)).is_err() {
                        break; // Channel closed
                    }
                }
            }
        }
    });

    loop {
        terminal.draw(|frame| render_ui(frame, app))?;

        if let Ok(tui_event) = event_rx.try_recv() {
            match tui_event {
                TuiEvent::Key(key) => {
                    if handle_key_event(app, key, &cmd_tx, history)? {
                        break; // Quit requested
                    }
                }
                TuiEvent::Workspace { snapshot, status } => {
                    app.apply_snapshot(snapshot, status);
                }
            }
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    Ok(())
}

/// Handle keyboard events; returns true when the app should quit.
fn handle_key_event(
    app: &mut App,
    key: crossterm::event::KeyEvent,
    cmd_tx: &mpsc::UnboundedSender<SessionCommand>,
    history: &ExpressionHistory,
) -> Result<bool> {
    // Any key closes the help overlay
    if app.show_help {
        app.show_help = false;
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Ok(true); // Quit
        }
        KeyCode::Char('h') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Tab => {
            app.toggle_focus();
        }
        _ => match app.focus {
            Focus::Input => return handle_input_key(app, key, cmd_tx, history),
            Focus::Datasets => handle_dataset_key(app, key, cmd_tx),
        },
    }

    Ok(false)
}

/// Handle keys while the expression input has focus; returns true on quit.
fn handle_input_key(
    app: &mut App,
    key: crossterm::event::KeyEvent,
    cmd_tx: &mpsc::UnboundedSender<SessionCommand>,
    history: &ExpressionHistory,
) -> Result<bool> {
    match key.code {
        KeyCode::Enter => {
            let expression = app.input.trim().to_string();
            if expression == "exit()" {
                return Ok(true);
            }
            if !expression.is_empty() {
                app.push_history(expression.clone());
                let _ = history.append(&app.session_id, &expression);
                app.status_message = "evaluating...".to_string();
                app.is_busy = true;
                let _ = cmd_tx.send(SessionCommand::Execute(expression));
                app.clear_input();
            }
        }
        KeyCode::Up => app.history_prev(),
        KeyCode::Down => app.history_next(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Home => app.move_cursor_home(),
        KeyCode::End => app.move_cursor_end(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_dataset_key(
    app: &mut App,
    key: crossterm::event::KeyEvent,
    cmd_tx: &mpsc::UnboundedSender<SessionCommand>,
) {
    match key.code {
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),
        KeyCode::Char('d') | KeyCode::Enter => {
            if let Some((name, _)) = app.selected_dataset() {
                let name = name.to_string();
                app.status_message = format!("fetching data for {}...", name);
                app.is_busy = true;
                let _ = cmd_tx.send(SessionCommand::FetchData(name));
            }
        }
        KeyCode::Char('x') => {
            if let Some((name, _)) = app.selected_dataset() {
                let name = name.to_string();
                app.status_message = format!("deleting {}...", name);
                app.is_busy = true;
                let _ = cmd_tx.send(SessionCommand::Remove(name));
            }
        }
        _ => {}
    }
}
