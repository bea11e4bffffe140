//! Application state for the terminal client.
//!
//! [`App`] composes the request workflow, the submission form and the search
//! debouncer with the view, mode and selection state the UI renders from.
//! Every operation reports its outcome through `status_message`.

use std::time::{Duration, Instant};

use super::debounce::{SearchDebouncer, DEFAULT_QUIET_WINDOW};
use super::gateway::ArchiveGateway;
use super::submission::{SubmissionFlow, DEFAULT_TODAY_PAGE_SIZE};
use super::workflow::{ActionReceipt, RequestWorkflowState};
use crate::domain::{
    ActionError, ArchiveRequest, FetchError, Page, SubmissionError, ValidationError,
};

/// Default page size for the pending and completed lists.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filename offered when exporting the completed list.
pub const DEFAULT_EXPORT_FILENAME: &str = "completed-requests.csv";

/// Top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Pending queue (or search results) with claims
    Queue,
    /// Approved and rejected requests
    Completed,
    /// New request form with today's summary
    NewRequest,
}

impl View {
    pub const ALL: [View; 3] = [View::Queue, View::Completed, View::NewRequest];

    pub fn title(self) -> &'static str {
        match self {
            View::Queue => "Queue",
            View::Completed => "Completed",
            View::NewRequest => "New request",
        }
    }

    pub fn index(self) -> usize {
        match self {
            View::Queue => 0,
            View::Completed => 1,
            View::NewRequest => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Determines how key input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Navigation and single-key commands
    Normal,
    /// Typing a search query
    Search,
    /// Typing a reject reason for `rejecting_id`
    RejectReason,
    /// Editing the new request form
    EditForm,
    /// CSV export dialog is open
    ExportCsv,
    /// Help screen is displayed
    Help,
}

/// Focused field of the new request form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Plate,
    Note,
    Type,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Plate => FormField::Note,
            FormField::Note => FormField::Type,
            FormField::Type => FormField::Plate,
        }
    }
}

/// Tunables for the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub page_size: u32,
    pub today_page_size: u32,
    pub search_debounce: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            today_page_size: DEFAULT_TODAY_PAGE_SIZE,
            search_debounce: DEFAULT_QUIET_WINDOW,
        }
    }
}

/// Main application state.
///
/// # Examples
///
/// ```
/// use plate_archive::application::{App, AppMode, View, WorkflowSettings};
/// # use plate_archive::application::ArchiveGateway;
/// # use plate_archive::domain::*;
/// # struct Offline;
/// # impl ArchiveGateway for Offline {
/// #     fn create_request(&self, _: &CreateArchiveRequest) -> GatewayResult<ActionOutcome> {
/// #         Err(GatewayError::Network("offline".into()))
/// #     }
/// #     fn list_requests(&self, _: &ListQuery) -> GatewayResult<PaginatedResponse<ArchiveRequest>> {
/// #         Err(GatewayError::Network("offline".into()))
/// #     }
/// #     fn submit_action(&self, _: &ActionRequest) -> GatewayResult<ActionOutcome> {
/// #         Err(GatewayError::Network("offline".into()))
/// #     }
/// # }
///
/// let app = App::new(Offline, WorkflowSettings::default());
/// assert_eq!(app.view, View::Queue);
/// assert_eq!(app.mode, AppMode::Normal);
/// ```
#[derive(Debug)]
pub struct App<G> {
    /// Backend the workflow talks to
    pub gateway: G,
    pub workflow: RequestWorkflowState,
    pub submission: SubmissionFlow,
    pub debouncer: SearchDebouncer,
    pub view: View,
    pub mode: AppMode,
    /// Selected row in the queue list
    pub queue_selected: usize,
    /// Selected row in the completed list
    pub completed_selected: usize,
    /// Search query input buffer
    pub search_input: String,
    /// Reject reason input buffer
    pub reject_input: String,
    /// Request being rejected while in reject-reason mode
    pub rejecting_id: Option<String>,
    pub form_field: FormField,
    /// Input buffer for filename entry
    pub filename_input: String,
    /// Cursor position within the active input buffer
    pub cursor_position: usize,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    page_size: u32,
}

impl<G: ArchiveGateway> App<G> {
    /// Creates the application state. Nothing is loaded until [`bootstrap`](Self::bootstrap).
    pub fn new(gateway: G, settings: WorkflowSettings) -> Self {
        Self {
            gateway,
            workflow: RequestWorkflowState::new(settings.page_size),
            submission: SubmissionFlow::new(settings.today_page_size),
            debouncer: SearchDebouncer::new(settings.search_debounce),
            view: View::Queue,
            mode: AppMode::Normal,
            queue_selected: 0,
            completed_selected: 0,
            search_input: String::new(),
            reject_input: String::new(),
            rejecting_id: None,
            form_field: FormField::Plate,
            filename_input: String::new(),
            cursor_position: 0,
            help_scroll: 0,
            status_message: None,
            page_size: settings.page_size,
        }
    }

    /// Performs the initial loads of all three lists.
    pub fn bootstrap(&mut self) {
        let pending = self
            .workflow
            .load_pending(&self.gateway, None, 1, self.page_size);
        self.report_fetch(pending);
        let completed = self.workflow.load_completed(&self.gateway, 1, self.page_size);
        self.report_fetch(completed);
        if let Err(err) = self.submission.load_today(&self.gateway) {
            self.report_fetch_error(&err);
        }
        self.clamp_selection();
    }

    // ===== Status reporting =====

    fn report_fetch(&mut self, result: Result<Page<ArchiveRequest>, FetchError>) {
        if let Err(err) = result {
            self.report_fetch_error(&err);
        }
    }

    fn report_fetch_error(&mut self, err: &FetchError) {
        if *err != FetchError::Superseded {
            self.status_message = Some(err.to_string());
        }
    }

    fn report_action(&mut self, done: &str, result: Result<ActionReceipt, ActionError>) {
        match result {
            Ok(receipt) => {
                self.status_message = Some(match receipt.refresh_error() {
                    Some(err) => format!("{} ({})", done, err),
                    None => done.to_string(),
                });
            }
            Err(err) => {
                self.status_message = Some(err.to_string());
            }
        }
        self.clamp_selection();
    }

    // ===== Search =====

    /// Switches to search mode, starting from the applied search text.
    pub fn start_search(&mut self) {
        self.view = View::Queue;
        self.mode = AppMode::Search;
        self.search_input = self.workflow.search_text().to_string();
        self.cursor_position = self.search_input.len();
        self.status_message = None;
    }

    /// Feeds the current search input to the debouncer.
    pub fn search_edited(&mut self, now: Instant) {
        self.debouncer.push(self.search_input.clone(), now);
    }

    /// Runs a debounced search if one has become due.
    pub fn tick(&mut self, now: Instant) {
        if let Some(text) = self.debouncer.poll(now) {
            self.run_search(&text);
        }
    }

    /// How long the event loop may wait before the next [`tick`](Self::tick).
    pub fn poll_timeout(&self, now: Instant, max: Duration) -> Duration {
        match self.debouncer.deadline() {
            Some(deadline) => deadline.saturating_duration_since(now).min(max),
            None => max,
        }
    }

    /// Applies the search input immediately and leaves search mode.
    pub fn finish_search(&mut self, now: Instant) {
        self.search_edited(now);
        if let Some(text) = self.debouncer.flush() {
            self.run_search(&text);
        }
        self.mode = AppMode::Normal;
        self.cursor_position = 0;
    }

    /// Clears the search and restores the default pending list.
    pub fn cancel_search(&mut self, now: Instant) {
        self.search_input.clear();
        self.finish_search(now);
    }

    fn run_search(&mut self, text: &str) {
        let result = self
            .workflow
            .load_pending(&self.gateway, Some(text), 1, self.page_size);
        self.queue_selected = 0;
        match result {
            Ok(page) if !text.is_empty() => {
                self.status_message = Some(format!(
                    "{} result{} for '{}'",
                    page.total_items,
                    if page.total_items == 1 { "" } else { "s" },
                    text
                ));
            }
            Ok(_) => self.status_message = None,
            Err(FetchError::Superseded) => {}
            Err(err) => {
                // The failed text was never applied; let the same text run again.
                self.debouncer.reset_last_emitted(self.workflow.search_text());
                self.report_fetch_error(&err);
            }
        }
    }

    // ===== Selection =====

    pub fn selected_queue_request(&self) -> Option<&ArchiveRequest> {
        self.workflow.displayed().get(self.queue_selected)
    }

    pub fn selected_completed_request(&self) -> Option<&ArchiveRequest> {
        self.workflow.completed().get(self.completed_selected)
    }

    /// The request under the cursor in the current view.
    pub fn selected_request(&self) -> Option<&ArchiveRequest> {
        match self.view {
            View::Queue => self.selected_queue_request(),
            View::Completed => self.selected_completed_request(),
            View::NewRequest => None,
        }
    }

    /// Moves the cursor of the current view by `delta` rows, clamped to the list.
    pub fn move_selection(&mut self, delta: isize) {
        let (selected, len) = match self.view {
            View::Queue => (&mut self.queue_selected, self.workflow.displayed().len()),
            View::Completed => (&mut self.completed_selected, self.workflow.completed().len()),
            View::NewRequest => return,
        };
        if len == 0 {
            *selected = 0;
            return;
        }
        *selected = selected.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_selection(&mut self) {
        let queue_len = self.workflow.displayed().len();
        self.queue_selected = self.queue_selected.min(queue_len.saturating_sub(1));
        let completed_len = self.workflow.completed().len();
        self.completed_selected = self.completed_selected.min(completed_len.saturating_sub(1));
    }

    fn selected_queue_id(&self) -> Option<(String, String)> {
        self.selected_queue_request()
            .map(|request| (request.id.clone(), request.plate_number.clone()))
    }

    // ===== Claims and actions =====

    /// Claims the selected queue request.
    ///
    /// Only the next available pending request can be claimed; otherwise the
    /// status line names the request that is next.
    pub fn claim_selected(&mut self) {
        let Some((id, plate)) = self.selected_queue_id() else {
            return;
        };
        if self.workflow.claim(&id) {
            self.status_message = Some(format!("Working on {}", plate));
            return;
        }
        self.status_message = Some(match self.workflow.next_available_pending_id() {
            Some(next) => {
                let next_plate = self
                    .workflow
                    .displayed()
                    .iter()
                    .find(|request| request.id == next)
                    .map(|request| request.plate_number.as_str())
                    .unwrap_or(next);
                format!("Requests are handled in order; next is {}", next_plate)
            }
            None => "No pending request is available".to_string(),
        });
    }

    pub fn release_selected(&mut self) {
        if let Some((id, plate)) = self.selected_queue_id() {
            if self.workflow.is_in_progress(&id) {
                self.workflow.release(&id);
                self.status_message = Some(format!("Released {}", plate));
            }
        }
    }

    /// Selected queue request if it is claimed, otherwise reports why not.
    fn claimed_selection(&mut self, verb: &str) -> Option<(String, String)> {
        let (id, plate) = self.selected_queue_id()?;
        if !self.workflow.is_in_progress(&id) {
            self.status_message = Some(format!("Claim {} before {} it", plate, verb));
            return None;
        }
        Some((id, plate))
    }

    /// Approves the selected queue request, which must be claimed.
    pub fn approve_selected(&mut self) {
        let Some((id, plate)) = self.claimed_selection("approving") else {
            return;
        };
        let result = self.workflow.approve(&self.gateway, &id);
        self.report_action(&format!("Approved {}", plate), result);
    }

    /// Opens the reject reason dialog for the selected claimed request.
    pub fn start_reject(&mut self) {
        let Some((id, _)) = self.claimed_selection("rejecting") else {
            return;
        };
        self.rejecting_id = Some(id);
        self.reject_input.clear();
        self.cursor_position = 0;
        self.mode = AppMode::RejectReason;
        self.status_message = None;
    }

    /// Sends the rejection. A missing reason keeps the dialog open.
    pub fn confirm_reject(&mut self) {
        let Some(id) = self.rejecting_id.clone() else {
            self.cancel_reject();
            return;
        };
        let result = self.workflow.reject(&self.gateway, &id, &self.reject_input);
        if let Err(ActionError::Validation(err)) = result {
            self.status_message = Some(err.to_string());
            return;
        }
        self.cancel_reject();
        self.report_action("Request rejected", result);
    }

    pub fn cancel_reject(&mut self) {
        self.rejecting_id = None;
        self.reject_input.clear();
        self.cursor_position = 0;
        self.mode = AppMode::Normal;
    }

    /// Returns the selected completed request to pending.
    pub fn rollback_selected(&mut self) {
        let Some(request) = self.selected_completed_request() else {
            return;
        };
        let (id, plate) = (request.id.clone(), request.plate_number.clone());
        let result = self.workflow.rollback_to_pending(&self.gateway, &id);
        self.report_action(&format!("Returned {} to pending", plate), result);
    }

    // ===== Paging =====

    /// Loads the next page of the current view's list.
    pub fn next_page(&mut self) {
        match self.view {
            View::Queue => self.go_to_pending_page(self.workflow.pending_cursor().page + 1),
            View::Completed => self.go_to_completed_page(self.workflow.completed_cursor().page + 1),
            View::NewRequest => {}
        }
    }

    pub fn previous_page(&mut self) {
        match self.view {
            View::Queue => {
                let page = self.workflow.pending_cursor().page.saturating_sub(1);
                self.go_to_pending_page(page);
            }
            View::Completed => {
                let page = self.workflow.completed_cursor().page.saturating_sub(1);
                self.go_to_completed_page(page);
            }
            View::NewRequest => {}
        }
    }

    /// Loads `page` of the pending list; out-of-range pages are ignored.
    pub fn go_to_pending_page(&mut self, page: u32) {
        let cursor = self.workflow.pending_cursor();
        if !cursor.contains(page) {
            return;
        }
        let search_text = self.workflow.search_text().to_string();
        let result =
            self.workflow
                .load_pending(&self.gateway, Some(&search_text), page, cursor.page_size);
        self.queue_selected = 0;
        self.report_fetch(result);
    }

    pub fn go_to_completed_page(&mut self, page: u32) {
        let cursor = self.workflow.completed_cursor();
        if !cursor.contains(page) {
            return;
        }
        let result = self
            .workflow
            .load_completed(&self.gateway, page, cursor.page_size);
        self.completed_selected = 0;
        self.report_fetch(result);
    }

    /// Reloads every list at its current position.
    pub fn refresh(&mut self) {
        self.status_message = None;
        let pending = self.workflow.refresh_pending(&self.gateway);
        self.report_fetch(pending);
        let completed = self.workflow.refresh_completed(&self.gateway);
        self.report_fetch(completed);
        if let Err(err) = self.submission.load_today(&self.gateway) {
            self.report_fetch_error(&err);
        }
        self.clamp_selection();
    }

    // ===== New request form =====

    pub fn start_form_editing(&mut self) {
        self.view = View::NewRequest;
        self.mode = AppMode::EditForm;
        self.form_field = FormField::Plate;
        self.cursor_position = self.submission.plate_input.len();
        self.status_message = None;
    }

    /// Moves focus to the next form field, formatting the plate when leaving it.
    pub fn next_form_field(&mut self) {
        if self.form_field == FormField::Plate {
            self.submission.format_plate_input();
        }
        self.form_field = self.form_field.next();
        self.cursor_position = self.form_input().map(|input| input.len()).unwrap_or(0);
    }

    /// Text buffer of the focused form field, if it is a text field.
    pub fn form_input(&self) -> Option<&String> {
        match self.form_field {
            FormField::Plate => Some(&self.submission.plate_input),
            FormField::Note => Some(&self.submission.note_input),
            FormField::Type => None,
        }
    }

    pub fn form_input_mut(&mut self) -> Option<&mut String> {
        match self.form_field {
            FormField::Plate => Some(&mut self.submission.plate_input),
            FormField::Note => Some(&mut self.submission.note_input),
            FormField::Type => None,
        }
    }

    pub fn toggle_archive_type(&mut self) {
        self.submission.archive_type = self.submission.archive_type.toggled();
    }

    /// Submits the new request form and reports the outcome in the status line.
    pub fn submit_request(&mut self) {
        match self.submission.submit(&self.gateway) {
            Ok(()) => {
                self.form_field = FormField::Plate;
                self.cursor_position = 0;
                self.status_message = Some(match self.submission.today_error() {
                    Some(err) => format!("Request sent ({})", err),
                    None => "Request sent".to_string(),
                });
            }
            Err(SubmissionError::Validation(ValidationError::EmptyPlateNumber)) => {
                self.form_field = FormField::Plate;
                self.cursor_position = self.submission.plate_input.len();
                self.status_message = Some(ValidationError::EmptyPlateNumber.to_string());
            }
            Err(err) => {
                self.status_message = Some(err.to_string());
            }
        }
    }

    pub fn cancel_form_editing(&mut self) {
        self.mode = AppMode::Normal;
        self.cursor_position = 0;
    }

    // ===== Export and clipboard =====

    pub fn start_csv_export(&mut self) {
        self.mode = AppMode::ExportCsv;
        self.filename_input = DEFAULT_EXPORT_FILENAME.to_string();
        self.cursor_position = self.filename_input.len();
        self.status_message = None;
    }

    /// Filename for the CSV export, falling back to the default when empty.
    pub fn get_export_filename(&self) -> String {
        if self.filename_input.is_empty() {
            DEFAULT_EXPORT_FILENAME.to_string()
        } else {
            self.filename_input.clone()
        }
    }

    /// Processes the result of a CSV export (rows written, or an error).
    pub fn set_export_result(&mut self, filename: &str, result: Result<usize, String>) {
        self.status_message = Some(match result {
            Ok(rows) => format!("Exported {} request{} to {}", rows, if rows == 1 { "" } else { "s" }, filename),
            Err(error) => format!("Export failed: {}", error),
        });
        self.cancel_filename_input();
    }

    pub fn cancel_filename_input(&mut self) {
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Processes the result of copying `plate` to the clipboard.
    pub fn set_copy_result(&mut self, plate: &str, result: Result<(), String>) {
        self.status_message = Some(match result {
            Ok(()) => format!("Copied {}", plate),
            Err(error) => format!("Copy failed: {}", error),
        });
    }

    pub fn show_help(&mut self) {
        self.mode = AppMode::Help;
        self.help_scroll = 0;
    }
}
