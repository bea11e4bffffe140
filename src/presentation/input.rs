use std::time::Instant;

use crate::application::{App, AppMode, ArchiveGateway, FormField, View};
use crate::infrastructure::{clipboard, CsvExporter};
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Search => Self::handle_search_mode(app, key),
            AppMode::RejectReason => Self::handle_reject_mode(app, key),
            AppMode::EditForm => Self::handle_form_mode(app, key),
            AppMode::ExportCsv => Self::handle_export_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
        }
    }

    fn handle_normal_mode<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('e') = key {
                app.view = View::Completed;
                app.start_csv_export();
            }
            return;
        }

        app.status_message = None;

        match key {
            KeyCode::Tab => app.view = app.view.next(),
            KeyCode::BackTab => app.view = app.view.previous(),
            KeyCode::Char('1') => app.view = View::Queue,
            KeyCode::Char('2') => app.view = View::Completed,
            KeyCode::Char('3') => app.view = View::NewRequest,
            KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
            KeyCode::Char('[') | KeyCode::Left => app.previous_page(),
            KeyCode::Char(']') | KeyCode::Right => app.next_page(),
            KeyCode::F(5) => app.refresh(),
            KeyCode::F(1) | KeyCode::Char('?') => app.show_help(),
            KeyCode::Char('/') => app.start_search(),
            KeyCode::Char('y') => {
                if let Some(plate) = app.selected_request().map(|request| request.plate_number.clone()) {
                    let result = clipboard::copy_text(&plate);
                    app.set_copy_result(&plate, result);
                }
            }
            _ => match app.view {
                View::Queue => Self::handle_queue_key(app, key),
                View::Completed => Self::handle_completed_key(app, key),
                View::NewRequest => Self::handle_new_request_key(app, key),
            },
        }
    }

    fn handle_queue_key<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Char('c') => app.claim_selected(),
            KeyCode::Char('u') => app.release_selected(),
            KeyCode::Char('a') => app.approve_selected(),
            KeyCode::Char('r') => app.start_reject(),
            _ => {}
        }
    }

    fn handle_completed_key<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode) {
        if let KeyCode::Char('p') = key {
            app.rollback_selected();
        }
    }

    fn handle_new_request_key<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode) {
        if let KeyCode::Enter | KeyCode::Char('i') = key {
            app.start_form_editing();
        }
    }

    /// Applies a line-editing key to `buffer`. Returns true if the buffer
    /// content changed.
    fn edit_buffer(buffer: &mut String, cursor: &mut usize, key: KeyCode) -> bool {
        match key {
            KeyCode::Backspace => {
                if *cursor > 0 {
                    let previous = buffer[..*cursor].chars().next_back().map_or(0, char::len_utf8);
                    *cursor -= previous;
                    buffer.remove(*cursor);
                    return true;
                }
            }
            KeyCode::Delete => {
                if *cursor < buffer.len() {
                    buffer.remove(*cursor);
                    return true;
                }
            }
            KeyCode::Left => {
                if let Some(ch) = buffer[..*cursor].chars().next_back() {
                    *cursor -= ch.len_utf8();
                }
            }
            KeyCode::Right => {
                if let Some(ch) = buffer[*cursor..].chars().next() {
                    *cursor += ch.len_utf8();
                }
            }
            KeyCode::Home => {
                *cursor = 0;
            }
            KeyCode::End => {
                *cursor = buffer.len();
            }
            KeyCode::Char(c) => {
                buffer.insert(*cursor, c);
                *cursor += c.len_utf8();
                return true;
            }
            _ => {}
        }
        false
    }

    fn handle_search_mode<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode) {
        match key {
            KeyCode::Enter => app.finish_search(Instant::now()),
            KeyCode::Esc => app.cancel_search(Instant::now()),
            _ => {
                if Self::edit_buffer(&mut app.search_input, &mut app.cursor_position, key) {
                    app.search_edited(Instant::now());
                }
            }
        }
    }

    fn handle_reject_mode<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode) {
        match key {
            KeyCode::Enter => app.confirm_reject(),
            KeyCode::Esc => app.cancel_reject(),
            _ => {
                Self::edit_buffer(&mut app.reject_input, &mut app.cursor_position, key);
            }
        }
    }

    fn handle_form_mode<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode) {
        match key {
            KeyCode::Enter => app.submit_request(),
            KeyCode::Esc => app.cancel_form_editing(),
            KeyCode::Tab => app.next_form_field(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if app.form_field == FormField::Type => {
                app.toggle_archive_type();
            }
            _ => {
                let mut cursor = app.cursor_position;
                if let Some(buffer) = app.form_input_mut() {
                    Self::edit_buffer(buffer, &mut cursor, key);
                }
                app.cursor_position = cursor;
            }
        }
    }

    fn handle_export_mode<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                let filename = app.get_export_filename();
                let result = CsvExporter::export_requests(app.workflow.completed(), &filename)
                    .map_err(|e| e.to_string());
                app.set_export_result(&filename, result);
            }
            KeyCode::Esc => app.cancel_filename_input(),
            _ => {
                Self::edit_buffer(&mut app.filename_input, &mut app.cursor_position, key);
            }
        }
    }

    fn handle_help_mode<G: ArchiveGateway>(app: &mut App<G>, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if app.help_scroll > 0 {
                    app.help_scroll -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{page, request, FakeGateway};
    use crate::application::WorkflowSettings;
    use crate::domain::{ArchiveAction, ArchiveType};

    fn app() -> App<FakeGateway> {
        let gateway = FakeGateway::with_listing(page(vec![
            request("1", ArchiveAction::Pending),
            request("2", ArchiveAction::Pending),
        ]));
        let mut app = App::new(gateway, WorkflowSettings::default());
        app.bootstrap();
        app
    }

    fn press(app: &mut App<FakeGateway>, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    fn type_text(app: &mut App<FakeGateway>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_view_switching_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, View::Completed);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.view, View::NewRequest);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.view, View::Completed);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.view, View::Queue);
    }

    #[test]
    fn test_claim_and_approve_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert!(app.workflow.is_in_progress("1"));

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.gateway.action_count(), 1);
        assert!(!app.workflow.is_in_progress("1"));
    }

    #[test]
    fn test_reject_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.mode, AppMode::RejectReason);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::RejectReason);

        type_text(&mut app, "no file");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        let action = app.gateway.action_calls.borrow()[0].clone();
        assert_eq!(action.reject_reason(), Some("no file"));
    }

    #[test]
    fn test_reject_escape_cancels() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('r'));
        type_text(&mut app, "abc");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.reject_input.is_empty());
        assert!(app.workflow.is_in_progress("1"));
    }

    #[test]
    fn test_search_enter_applies_immediately() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode, AppMode::Search);

        type_text(&mut app, "ab1");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.search_input, "ab");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.workflow.search_text(), "ab");
        let query = app.gateway.list_calls.borrow().last().cloned().unwrap();
        assert_eq!(query.search_text.as_deref(), Some("ab"));
        assert_eq!(query.page_number, Some(1));
    }

    #[test]
    fn test_form_editing_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::EditForm);

        type_text(&mut app, "xy 7");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "rear cam");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.submission.archive_type, ArchiveType::Other);

        press(&mut app, KeyCode::Enter);
        let sent = app.gateway.create_calls.borrow()[0].clone();
        assert_eq!(sent.plate_number, "XY 7");
        assert_eq!(sent.note, "rear cam");
        assert_eq!(sent.action, ArchiveType::Other);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_export_key_opens_dialog() {
        let mut app = app();
        InputHandler::handle_key_event(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(app.mode, AppMode::ExportCsv);
        assert_eq!(app.view, View::Completed);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.filename_input, "completed-requests.csvx");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.filename_input.is_empty());
    }

    #[test]
    fn test_edit_buffer_handles_multibyte_input() {
        let mut buffer = String::new();
        let mut cursor = 0;
        for c in "أب1".chars() {
            InputHandler::edit_buffer(&mut buffer, &mut cursor, KeyCode::Char(c));
        }
        assert_eq!(cursor, buffer.len());

        InputHandler::edit_buffer(&mut buffer, &mut cursor, KeyCode::Left);
        InputHandler::edit_buffer(&mut buffer, &mut cursor, KeyCode::Backspace);
        assert_eq!(buffer, "أ1");
        InputHandler::edit_buffer(&mut buffer, &mut cursor, KeyCode::Home);
        InputHandler::edit_buffer(&mut buffer, &mut cursor, KeyCode::Delete);
        assert_eq!(buffer, "1");
    }

    #[test]
    fn test_help_mode_navigation() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.help_scroll, 5);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.help_scroll, 4);
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.mode, AppMode::Normal);
    }
}
