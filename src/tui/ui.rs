//! UI layout and rendering for the workbench TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::model::sort_by_role;
use crate::printer::data_preview;
use crate::workspace::DatasetEntry;

use super::app::{App, Focus};

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Dataset panel
            Constraint::Length(3), // Input area
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let panel_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(main_layout[0]);

    render_dataset_list(frame, app, panel_layout[0]);
    render_detail(frame, app, panel_layout[1]);
    render_input_area(frame, app, main_layout[1]);
    render_status_bar(frame, app, main_layout[2]);

    if app.show_help {
        render_help_overlay(frame);
    }
}

fn entry_style(entry: &DatasetEntry) -> Style {
    match entry {
        DatasetEntry::Unloaded => Style::default().fg(Color::DarkGray),
        DatasetEntry::Loaded { .. } => Style::default().fg(Color::Green),
        DatasetEntry::StructureLoaded { .. } => Style::default().fg(Color::Cyan),
        DatasetEntry::Failed { .. } => Style::default().fg(Color::Red),
    }
}

/// Render the dataset panel: one row per dataset, colored by state.
fn render_dataset_list(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    if let Some(error) = &app.snapshot.execution_error {
        lines.push(Line::from(Span::styled(
            format!("evaluation failed: {}", error.summary()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
    }

    if app.snapshot.datasets.is_empty() {
        lines.push(Line::from(Span::styled(
            "no datasets",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for (i, (name, entry)) in app.snapshot.datasets.iter().enumerate() {
        let mut style = entry_style(entry);
        let marker = if i == app.selected && app.focus == Focus::Datasets {
            style = style.add_modifier(Modifier::REVERSED);
            "> "
        } else if i == app.selected {
            "> "
        } else {
            "  "
        };
        lines.push(Line::from(Span::styled(
            format!("{}{} [{}]", marker, name, entry.state_label()),
            style,
        )));
    }

    let title = if app.focus == Focus::Datasets {
        "Datasets (d: data, x: delete)"
    } else {
        "Datasets"
    };
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

/// Render the detail pane for the selected dataset.
fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let (title, lines) = match app.selected_dataset() {
        Some((name, DatasetEntry::StructureLoaded { variables })) => {
            let mut ordered = variables.clone();
            sort_by_role(&mut ordered);
            let mut lines = vec![Line::from(Span::styled(
                format!("{:<24} {:<12} {}", "variable", "type", "role"),
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            for v in &ordered {
                lines.push(Line::from(format!(
                    "{:<24} {:<12} {}",
                    v.name,
                    v.r#type.as_deref().unwrap_or("-"),
                    v.role.as_str()
                )));
            }
            (format!("{} - structure", name), lines)
        }
        Some((name, DatasetEntry::Loaded { data })) => {
            let preview = data_preview(data, app.display_limit);
            let lines = preview.lines().map(|l| Line::from(l.to_string())).collect();
            (format!("{} - data", name), lines)
        }
        Some((name, DatasetEntry::Failed { error })) => (
            format!("{} - error", name),
            vec![Line::from(Span::styled(
                error.summary(),
                Style::default().fg(Color::Red),
            ))],
        ),
        Some((name, DatasetEntry::Unloaded)) => (
            name.to_string(),
            vec![Line::from(Span::styled(
                "nothing fetched yet (d: fetch data)",
                Style::default().fg(Color::DarkGray),
            ))],
        ),
        None => ("Detail".to_string(), Vec::new()),
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Render the expression input line, with the terminal cursor placed at the
/// editing position when the input has focus.
fn render_input_area(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.input.is_empty() && app.input_history.is_empty() {
        "Expression (e.g. a := get(\"1104\"))"
    } else {
        "Expression"
    };

    let input_paragraph = Paragraph::new(app.input.clone())
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(input_paragraph, area);

    if app.focus == Focus::Input && !app.show_help {
        let cursor_x = app.input[..app.input_cursor].width() as u16;
        frame.set_cursor_position(Position::new(area.x + 1 + cursor_x, area.y + 1));
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_text = if app.is_busy {
        format!("{} | working...", app.status_message)
    } else {
        app.status_message.clone()
    };

    let status_paragraph =
        Paragraph::new(status_text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_paragraph, area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = frame.area();
    let popup_area = centered_rect(70, 60, area);

    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("Workbench Help"),
        Line::from(""),
        Line::from("Input:"),
        Line::from("  Enter      - Evaluate expression"),
        Line::from("  Up/Down    - Expression history"),
        Line::from("  exit()     - Quit"),
        Line::from(""),
        Line::from("Datasets (after Tab):"),
        Line::from("  Up/Down    - Select dataset"),
        Line::from("  d          - Fetch row data"),
        Line::from("  x          - Delete dataset"),
        Line::from(""),
        Line::from("Global:"),
        Line::from("  Tab        - Switch pane"),
        Line::from("  Ctrl+H     - Toggle this help"),
        Line::from("  Ctrl+C     - Quit"),
    ];

    let help_paragraph = Paragraph::new(Text::from(help_lines))
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: false });
    frame.render_widget(help_paragraph, popup_area);
}

/// Centered rect helper for overlays.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
