//! New-request submission and the "today" summary shown beside the form.

use super::gateway::ArchiveGateway;
use crate::domain::{
    ArchiveAction, ArchiveRequest, ArchiveType, CreateArchiveRequest, FetchError, ListQuery,
    PlateFormatter, SubmissionError, ValidationError,
};

/// Page size used for the "today" list when none is configured.
pub const DEFAULT_TODAY_PAGE_SIZE: u32 = 100;

/// Counts over the loaded "today" list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodaySummary {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// State of the new request form and the "today" list beside it.
///
/// # Examples
///
/// ```
/// use plate_archive::application::SubmissionFlow;
///
/// let mut flow = SubmissionFlow::default();
/// flow.plate_input = " ab-12 ".to_string();
/// flow.format_plate_input();
/// assert_eq!(flow.plate_input, "AB 12");
/// ```
#[derive(Debug)]
pub struct SubmissionFlow {
    pub plate_input: String,
    pub note_input: String,
    pub archive_type: ArchiveType,
    today: Vec<ArchiveRequest>,
    today_page_size: u32,
    today_loading: bool,
    today_error: Option<String>,
    submitting: bool,
}

impl SubmissionFlow {
    /// Creates an empty form; the "today" list loads `today_page_size` requests.
    pub fn new(today_page_size: u32) -> Self {
        Self {
            plate_input: String::new(),
            note_input: String::new(),
            archive_type: ArchiveType::default(),
            today: Vec::new(),
            today_page_size,
            today_loading: false,
            today_error: None,
            submitting: false,
        }
    }

    /// Normalizes the plate field in place.
    pub fn format_plate_input(&mut self) {
        self.plate_input = PlateFormatter::format(&self.plate_input);
    }

    /// Sends the form as a new archive request.
    ///
    /// On success the plate and note fields are cleared and the "today" list
    /// reloaded. On failure the fields are left for correction.
    pub fn submit(&mut self, gateway: &impl ArchiveGateway) -> Result<(), SubmissionError> {
        let plate_number = PlateFormatter::format(&self.plate_input);
        if plate_number.is_empty() {
            return Err(ValidationError::EmptyPlateNumber.into());
        }

        let request = CreateArchiveRequest {
            plate_number,
            action: self.archive_type,
            note: self.note_input.trim().to_string(),
        };

        self.submitting = true;
        let outcome = gateway.create_request(&request);
        self.submitting = false;

        let outcome = outcome.inspect_err(|err| {
            tracing::warn!(plate = %request.plate_number, error = %err, "Create request failed");
        })?;
        if !outcome.succeeded() {
            tracing::warn!(plate = %request.plate_number, "Create request not accepted");
            return Err(SubmissionError::Unsuccessful);
        }

        tracing::info!(plate = %request.plate_number, kind = ?request.action, "Archive request created");
        self.plate_input.clear();
        self.note_input.clear();

        // A failed reload is reported through `today_error`.
        let _ = self.load_today(gateway);
        Ok(())
    }

    /// Loads the "today" list.
    ///
    /// A response without data clears the list; a transport failure keeps
    /// whatever was loaded before.
    pub fn load_today(&mut self, gateway: &impl ArchiveGateway) -> Result<(), FetchError> {
        self.today_loading = true;
        self.today_error = None;

        let query = ListQuery {
            page_size: Some(self.today_page_size),
            ..ListQuery::default()
        };
        let response = gateway.list_requests(&query);
        self.today_loading = false;

        let result = match response {
            Ok(response) => match response.into_page() {
                Some(page) => {
                    self.today = page.items;
                    Ok(())
                }
                None => {
                    self.today.clear();
                    Err(FetchError::MissingData)
                }
            },
            Err(err) => Err(FetchError::Gateway(err)),
        };

        if let Err(ref err) = result {
            tracing::warn!(error = %err, "Loading today's requests failed");
            self.today_error = Some(err.to_string());
        }
        result
    }

    /// Counts the loaded "today" list by status.
    pub fn summary(&self) -> TodaySummary {
        let count = |action: ArchiveAction| {
            self.today
                .iter()
                .filter(|request| request.action_taken == action)
                .count()
        };
        TodaySummary {
            total: self.today.len(),
            pending: count(ArchiveAction::Pending),
            approved: count(ArchiveAction::Approved),
            rejected: count(ArchiveAction::Rejected),
        }
    }

    /// The loaded "today" list.
    pub fn today(&self) -> &[ArchiveRequest] {
        &self.today
    }

    /// Message of the last failed "today" load, cleared by the next attempt.
    pub fn today_error(&self) -> Option<&str> {
        self.today_error.as_deref()
    }

    pub fn is_today_loading(&self) -> bool {
        self.today_loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }
}

impl Default for SubmissionFlow {
    fn default() -> Self {
        Self::new(DEFAULT_TODAY_PAGE_SIZE)
    }
}
