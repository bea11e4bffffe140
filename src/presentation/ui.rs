use crate::application::{App, AppMode, FormField, View};
use crate::domain::{ArchiveAction, ArchiveRequest, PageCursor};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs},
    Frame,
};

/// Renders the whole interface for the current application state.
///
/// Draws the view tabs, the active view, the status bar and, depending on
/// the mode, the reject or help popup on top.
pub fn render_ui<G>(f: &mut Frame, app: &App<G>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    match app.view {
        View::Queue => render_queue(f, app, chunks[1]),
        View::Completed => render_completed(f, app, chunks[1]),
        View::NewRequest => render_new_request(f, app, chunks[1]),
    }
    render_status_bar(f, app, chunks[2]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::RejectReason => render_reject_popup(f, app),
        _ => {}
    }
}

fn render_header<G>(f: &mut Frame, app: &App<G>, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .map(|view| Line::from(format!("{} {}", view.index() + 1, view.title())))
        .collect();

    let mut loading = Vec::new();
    if app.workflow.is_pending_loading() {
        loading.push("queue");
    }
    if app.workflow.is_completed_loading() {
        loading.push("completed");
    }
    if app.submission.is_today_loading() {
        loading.push("today");
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(30)])
        .split(area);

    let tabs = Tabs::new(titles)
        .select(app.view.index())
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().bg(Color::LightBlue).fg(Color::Black));
    f.render_widget(tabs, chunks[0]);

    if !loading.is_empty() {
        let indicator = Paragraph::new(format!("Loading {}...", loading.join(", ")))
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(indicator, chunks[1]);
    }
}

fn action_style(action: ArchiveAction) -> Style {
    match action {
        ArchiveAction::Approved => Style::default().fg(Color::Green),
        ArchiveAction::Rejected => Style::default().fg(Color::Red),
        ArchiveAction::Pending => Style::default().fg(Color::Yellow),
    }
}

fn page_label(cursor: PageCursor) -> String {
    format!(
        "page {}/{} | {} items",
        cursor.page,
        cursor.total_pages.max(1),
        cursor.total_items
    )
}

fn request_row<'a>(request: &'a ArchiveRequest, marker: &'a str, selected: bool) -> Row<'a> {
    let row_style = if selected {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else {
        Style::default()
    };
    Row::new(vec![
        Cell::from(marker),
        Cell::from(request.plate_number.as_str()),
        Cell::from(request.action_taken.label()).style(action_style(request.action_taken)),
        Cell::from(request.action_type.label()),
        Cell::from(request.reject_reason().unwrap_or(request.note.as_str())),
    ])
    .style(row_style)
}

fn request_table<'a>(rows: Vec<Row<'a>>, title: String) -> Table<'a> {
    let header = Row::new(vec!["", "Plate", "Status", "Type", "Note / reason"])
        .style(Style::default().fg(Color::Yellow));
    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .column_spacing(1)
}

fn render_queue<G>(f: &mut Frame, app: &App<G>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let next = app.workflow.next_available_pending_id();
    let rows = app
        .workflow
        .displayed()
        .iter()
        .enumerate()
        .map(|(index, request)| {
            let marker = if app.workflow.is_in_progress(&request.id) {
                ">>"
            } else if Some(request.id.as_str()) == next {
                "*"
            } else {
                ""
            };
            request_row(request, marker, index == app.queue_selected)
        })
        .collect();

    let title = if app.workflow.is_searching() {
        format!(
            "Search '{}' ({})",
            app.workflow.search_text(),
            page_label(app.workflow.pending_cursor())
        )
    } else {
        format!("Pending queue ({})", page_label(app.workflow.pending_cursor()))
    };
    f.render_widget(request_table(rows, title), chunks[0]);

    let work_rows: Vec<Row> = app
        .workflow
        .in_progress_requests()
        .into_iter()
        .map(|request| Row::new(vec![Cell::from(request.plate_number.as_str())]))
        .collect();
    let work_list = Table::new(work_rows, [Constraint::Min(10)]).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("In progress ({})", app.workflow.in_progress_ids().len())),
    );
    f.render_widget(work_list, chunks[1]);
}

fn render_completed<G>(f: &mut Frame, app: &App<G>, area: Rect) {
    let rows = app
        .workflow
        .completed()
        .iter()
        .enumerate()
        .map(|(index, request)| request_row(request, "", index == app.completed_selected))
        .collect();
    let title = format!(
        "Completed: {} approved, {} rejected ({})",
        app.workflow.approved().len(),
        app.workflow.rejected().len(),
        page_label(app.workflow.completed_cursor())
    );
    f.render_widget(request_table(rows, title), area);
}

fn render_new_request<G>(f: &mut Frame, app: &App<G>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    let editing = matches!(app.mode, AppMode::EditForm);
    let field_style = |field: FormField| {
        if editing && app.form_field == field {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };
    let form = vec![
        Line::styled(format!("Plate number: {}", app.submission.plate_input), field_style(FormField::Plate)),
        Line::styled(format!("Note:         {}", app.submission.note_input), field_style(FormField::Note)),
        Line::styled(
            format!("Type:         < {} >", app.submission.archive_type.label()),
            field_style(FormField::Type),
        ),
    ];
    let title = if app.submission.is_submitting() { "New request (sending...)" } else { "New request" };
    f.render_widget(
        Paragraph::new(form).block(Block::default().borders(Borders::ALL).title(title)),
        chunks[0],
    );

    let summary = app.submission.summary();
    let title = match app.submission.today_error() {
        Some(error) => format!("Today: {}", error),
        None => format!(
            "Today: {} total | {} pending | {} approved | {} rejected",
            summary.total, summary.pending, summary.approved, summary.rejected
        ),
    };
    let rows = app
        .submission
        .today()
        .iter()
        .map(|request| request_row(request, "", false))
        .collect();
    f.render_widget(request_table(rows, title), chunks[1]);
}

fn render_status_bar<G>(f: &mut Frame, app: &App<G>, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                match app.view {
                    View::Queue => "Enter: claim | u: release | a: approve | r: reject | /: search | [ ]: page | F5: refresh | ?: help | q: quit".to_string(),
                    View::Completed => "p: return to pending | Ctrl+E: export CSV | y: copy plate | [ ]: page | ?: help | q: quit".to_string(),
                    View::NewRequest => "Enter/i: edit form | Tab: switch view | ?: help | q: quit".to_string(),
                }
            }
        }
        AppMode::Search => format!("Search: {} (Enter to apply, Esc to clear)", app.search_input),
        AppMode::RejectReason => app
            .status_message
            .clone()
            .unwrap_or_else(|| "Enter a reject reason (Enter to confirm, Esc to cancel)".to_string()),
        AppMode::EditForm => app
            .status_message
            .clone()
            .unwrap_or_else(|| "Tab: next field | Space/←→: change type | Enter: send | Esc: done".to_string()),
        AppMode::ExportCsv => format!("Export CSV as: {} (Enter to export, Esc to cancel)", app.filename_input),
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Search => Style::default().fg(Color::Green),
            AppMode::RejectReason => Style::default().fg(Color::Red),
            AppMode::EditForm => Style::default().fg(Color::Green),
            AppMode::ExportCsv => Style::default().fg(Color::Magenta),
            AppMode::Help => Style::default().fg(Color::Cyan),
        });
    f.render_widget(input, area);
}

/// A `height`-row rectangle `width_percent` wide, centered in `area`.
fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(width_percent.min(100)) / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height: height.min(area.height),
    }
}

fn render_reject_popup<G>(f: &mut Frame, app: &App<G>) {
    let popup_area = centered(f.area(), 60, 3);
    f.render_widget(Clear, popup_area);

    let plate = app
        .rejecting_id
        .as_deref()
        .and_then(|id| app.workflow.displayed().iter().find(|request| request.id == id))
        .map(|request| request.plate_number.as_str())
        .unwrap_or("");
    let popup = Paragraph::new(app.reject_input.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Reject {}: reason", plate))
                .style(Style::default().fg(Color::Red)),
        )
        .style(Style::default().fg(Color::White));
    f.render_widget(popup, popup_area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!("Help (Line {}/{})", start_line + 1, help_lines.len()))
            .style(Style::default().fg(Color::Cyan)))
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"PLATE ARCHIVE REQUESTS

=== VIEWS ===
1 / Tab         Queue: pending requests (or search results)
2               Completed: approved and rejected requests
3               New request form and today's summary
Shift+Tab       Previous view

=== QUEUE ===
↑↓ or j/k       Move selection
Enter or c      Claim the selected request
                Requests are claimed strictly in order: only the
                first unclaimed pending request (marked *) can be taken
u               Release a claimed request back to the queue
a               Approve a claimed request
r               Reject a claimed request (a reason is required)
/               Search by plate number; the list updates as you type
Esc (search)    Clear the search and show the pending queue again
[ and ]         Previous / next page

=== COMPLETED ===
p               Return the selected request to pending
y               Copy the selected plate number
Ctrl+E          Export the completed page to CSV
[ and ]         Previous / next page

=== NEW REQUEST ===
Enter or i      Start editing the form
Tab             Next field (the plate is normalized when you leave it)
Space / ←→      Change the request type
Enter           Send the request
Esc             Stop editing

=== GENERAL ===
F5              Reload every list
F1 or ?         Show this help
q               Quit

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered(area, 60, 3), Rect::new(20, 18, 60, 3));
    }

    #[test]
    fn test_centered_on_very_wide_terminal() {
        let area = Rect::new(0, 0, 2000, 10);
        let popup = centered(area, 60, 20);
        assert_eq!(popup.width, 1200);
        assert_eq!(popup.x, 400);
        assert_eq!(popup.height, 10);
        assert_eq!(popup.y, 0);
    }
}
