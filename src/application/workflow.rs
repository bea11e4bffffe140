//! Request workflow state: the pending queue, the completed list and the
//! operator's claims on pending requests.
//!
//! Both lists come from the same unfiltered listing endpoint and are filtered
//! client-side. Each list has its own loading flag and sequence token, so a
//! response only ever writes its own slice of state and a stale response is
//! discarded instead of overwriting newer data.

use std::collections::HashSet;

use super::gateway::ArchiveGateway;
use crate::domain::{
    ActionError, ActionOutcome, ActionRequest, ArchiveAction, ArchiveRequest, FetchError,
    GatewayResult, ListQuery, Page, PageCursor, PaginatedResponse,
};

/// An issued listing request awaiting its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    sequence: u64,
    query: ListQuery,
}

impl LoadTicket {
    /// Position of this load among loads of the same list.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }
}

/// Result of the list refreshes that follow a successful action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReceipt {
    pub pending_refresh: Result<(), FetchError>,
    pub completed_refresh: Result<(), FetchError>,
}

impl ActionReceipt {
    /// First refresh failure, if any.
    pub fn refresh_error(&self) -> Option<&FetchError> {
        self.pending_refresh
            .as_ref()
            .err()
            .or(self.completed_refresh.as_ref().err())
    }
}

/// Client-side state of the archive request queue.
///
/// Holds the pending listing (default or searched), the completed listing,
/// the claimed requests and the loading state of each list. Loads and
/// actions go through an [`ArchiveGateway`] passed per call.
///
/// # Examples
///
/// ```
/// use plate_archive::application::RequestWorkflowState;
///
/// let state = RequestWorkflowState::new(10);
/// assert!(state.pending().is_empty());
/// assert_eq!(state.next_available_pending_id(), None);
/// assert!(!state.is_searching());
/// ```
#[derive(Debug)]
pub struct RequestWorkflowState {
    /// Raw page of the default (unsearched) listing
    requests: Vec<ArchiveRequest>,
    /// Raw page of the applied search
    search_results: Vec<ArchiveRequest>,
    /// Approved and rejected requests of the completed page
    completed: Vec<ArchiveRequest>,
    /// Claimed request IDs in claim order
    in_progress: Vec<String>,
    /// IDs with an action submission outstanding
    in_flight: HashSet<String>,
    search_text: String,
    pending_cursor: PageCursor,
    completed_cursor: PageCursor,
    pending_loading: bool,
    completed_loading: bool,
    pending_sequence: u64,
    completed_sequence: u64,
}

impl RequestWorkflowState {
    /// Creates an empty state whose cursors start at page 1 with `page_size`.
    pub fn new(page_size: u32) -> Self {
        Self {
            requests: Vec::new(),
            search_results: Vec::new(),
            completed: Vec::new(),
            in_progress: Vec::new(),
            in_flight: HashSet::new(),
            search_text: String::new(),
            pending_cursor: PageCursor::new(page_size),
            completed_cursor: PageCursor::new(page_size),
            pending_loading: false,
            completed_loading: false,
            pending_sequence: 0,
            completed_sequence: 0,
        }
    }

    // ===== Loading =====

    /// Issues a pending-list load. The returned ticket must be handed back to
    /// [`finish_pending_load`](Self::finish_pending_load) with the response.
    pub fn begin_pending_load(
        &mut self,
        search_text: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> LoadTicket {
        self.pending_sequence += 1;
        self.pending_loading = true;
        let ticket = LoadTicket {
            sequence: self.pending_sequence,
            query: ListQuery::page(page, page_size).with_search(search_text),
        };
        tracing::debug!(sequence = ticket.sequence, query = ?ticket.query, "Loading pending requests");
        ticket
    }

    /// Applies a pending-list response.
    ///
    /// Only the most recently issued ticket is applied. On any error the
    /// lists, cursor and claims are left as they were.
    pub fn finish_pending_load(
        &mut self,
        ticket: LoadTicket,
        response: GatewayResult<PaginatedResponse<ArchiveRequest>>,
    ) -> Result<Page<ArchiveRequest>, FetchError> {
        if ticket.sequence != self.pending_sequence {
            tracing::warn!(
                sequence = ticket.sequence,
                latest = self.pending_sequence,
                "Discarding stale pending response"
            );
            return Err(FetchError::Superseded);
        }
        self.pending_loading = false;

        let page = Self::accept(response)?;
        let cursor = Self::cursor_for(&ticket.query, &page);

        match ticket.query.search_text {
            Some(text) => {
                self.search_results = page.items.clone();
                self.search_text = text;
            }
            None => {
                self.requests = page.items.clone();
                self.search_results.clear();
                self.search_text.clear();
            }
        }

        self.pending_cursor = cursor;
        self.prune_in_progress();

        tracing::debug!(
            items = page.items.len(),
            total_items = page.total_items,
            searching = self.is_searching(),
            "Applied pending requests"
        );
        Ok(page)
    }

    /// Loads a page of the pending queue, or of search results when
    /// `search_text` is non-empty.
    pub fn load_pending(
        &mut self,
        gateway: &impl ArchiveGateway,
        search_text: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Page<ArchiveRequest>, FetchError> {
        let ticket = self.begin_pending_load(search_text, page, page_size);
        let response = gateway.list_requests(ticket.query());
        self.finish_pending_load(ticket, response)
    }

    /// Reloads the pending list at its current search and page.
    pub fn refresh_pending(
        &mut self,
        gateway: &impl ArchiveGateway,
    ) -> Result<Page<ArchiveRequest>, FetchError> {
        let search_text = self.search_text.clone();
        let cursor = self.pending_cursor;
        self.load_pending(gateway, Some(&search_text), cursor.page, cursor.page_size)
    }

    /// Issues a completed-list load and marks that list as loading.
    ///
    /// Any ticket issued earlier for the completed list becomes stale.
    pub fn begin_completed_load(&mut self, page: u32, page_size: u32) -> LoadTicket {
        self.completed_sequence += 1;
        self.completed_loading = true;
        let ticket = LoadTicket {
            sequence: self.completed_sequence,
            query: ListQuery::page(page, page_size),
        };
        tracing::debug!(sequence = ticket.sequence, query = ?ticket.query, "Loading completed requests");
        ticket
    }

    /// Applies a completed-list response, keeping only approved and rejected
    /// requests. Totals stay those of the unfiltered backend page.
    pub fn finish_completed_load(
        &mut self,
        ticket: LoadTicket,
        response: GatewayResult<PaginatedResponse<ArchiveRequest>>,
    ) -> Result<Page<ArchiveRequest>, FetchError> {
        if ticket.sequence != self.completed_sequence {
            tracing::warn!(
                sequence = ticket.sequence,
                latest = self.completed_sequence,
                "Discarding stale completed response"
            );
            return Err(FetchError::Superseded);
        }
        self.completed_loading = false;

        let mut page = Self::accept(response)?;
        page.items.retain(|request| request.action_taken.is_completed());

        self.completed = page.items.clone();
        self.completed_cursor = Self::cursor_for(&ticket.query, &page);

        tracing::debug!(
            items = page.items.len(),
            total_items = page.total_items,
            "Applied completed requests"
        );
        Ok(page)
    }

    /// Loads `page` of the completed list and applies it.
    ///
    /// # Arguments
    ///
    /// * `gateway` - Backend to list requests from
    /// * `page` - One-based page number
    /// * `page_size` - Requests per page, before client-side filtering
    pub fn load_completed(
        &mut self,
        gateway: &impl ArchiveGateway,
        page: u32,
        page_size: u32,
    ) -> Result<Page<ArchiveRequest>, FetchError> {
        let ticket = self.begin_completed_load(page, page_size);
        let response = gateway.list_requests(ticket.query());
        self.finish_completed_load(ticket, response)
    }

    /// Reloads the completed list at its current page.
    pub fn refresh_completed(
        &mut self,
        gateway: &impl ArchiveGateway,
    ) -> Result<Page<ArchiveRequest>, FetchError> {
        let cursor = self.completed_cursor;
        self.load_completed(gateway, cursor.page, cursor.page_size)
    }

    fn accept(
        response: GatewayResult<PaginatedResponse<ArchiveRequest>>,
    ) -> Result<Page<ArchiveRequest>, FetchError> {
        let response = response.inspect_err(|err| {
            tracing::warn!(error = %err, "Listing requests failed");
        })?;
        response.into_page().ok_or_else(|| {
            tracing::warn!("Listing response carried no data");
            FetchError::MissingData
        })
    }

    fn cursor_for(query: &ListQuery, page: &Page<ArchiveRequest>) -> PageCursor {
        PageCursor {
            page: query.page_number.unwrap_or(1),
            page_size: query.page_size.unwrap_or(page.page_size),
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }

    fn prune_in_progress(&mut self) {
        let pending_ids: HashSet<String> = self
            .displayed()
            .iter()
            .filter(|request| request.is_pending())
            .map(|request| request.id.clone())
            .collect();
        self.in_progress.retain(|id| pending_ids.contains(id));
    }

    // ===== Claims =====

    /// Claims `id` for work. Only the next available pending request can be
    /// claimed; anything else is a no-op returning `false`.
    pub fn claim(&mut self, id: &str) -> bool {
        if self.next_available_pending_id() != Some(id) {
            return false;
        }
        self.in_progress.push(id.to_string());
        true
    }

    /// Drops the claim on `id`, if any.
    pub fn release(&mut self, id: &str) {
        self.in_progress.retain(|claimed| claimed != id);
    }

    // ===== Actions =====

    /// Marks `action`'s request as having a submission outstanding.
    pub fn begin_action(&mut self, action: &ActionRequest) -> Result<(), ActionError> {
        if !self.in_flight.insert(action.id().to_string()) {
            tracing::warn!(id = action.id(), "Rejecting concurrent action");
            return Err(ActionError::InProgress(action.id().to_string()));
        }
        Ok(())
    }

    /// Applies the backend's answer to a submission started with
    /// [`begin_action`](Self::begin_action). On success the request is
    /// released; on failure its claim is kept for a retry.
    pub fn finish_action(
        &mut self,
        action: &ActionRequest,
        outcome: GatewayResult<ActionOutcome>,
    ) -> Result<(), ActionError> {
        self.in_flight.remove(action.id());

        let outcome = outcome.inspect_err(|err| {
            tracing::warn!(id = action.id(), error = %err, "Action submission failed");
        })?;
        if !outcome.succeeded() {
            tracing::warn!(id = action.id(), action = ?action.action_taken(), "Action not accepted");
            return Err(ActionError::Unsuccessful);
        }

        tracing::info!(id = action.id(), action = ?action.action_taken(), "Action applied");
        self.release(action.id());
        Ok(())
    }

    fn submit(
        &mut self,
        gateway: &impl ArchiveGateway,
        action: ActionRequest,
    ) -> Result<ActionReceipt, ActionError> {
        self.begin_action(&action)?;
        let outcome = gateway.submit_action(&action);
        self.finish_action(&action, outcome)?;

        Ok(ActionReceipt {
            pending_refresh: self.refresh_pending(gateway).map(|_| ()),
            completed_refresh: self.refresh_completed(gateway).map(|_| ()),
        })
    }

    /// Approves `id` and refreshes both lists on success.
    ///
    /// The claim is released once the backend accepts the action. On failure
    /// it is kept so the action can be retried.
    pub fn approve(
        &mut self,
        gateway: &impl ArchiveGateway,
        id: &str,
    ) -> Result<ActionReceipt, ActionError> {
        self.submit(gateway, ActionRequest::approve(id))
    }

    /// Rejects `id`; an empty or blank reason fails before anything is sent.
    pub fn reject(
        &mut self,
        gateway: &impl ArchiveGateway,
        id: &str,
        reason: &str,
    ) -> Result<ActionReceipt, ActionError> {
        let action = ActionRequest::reject(id, reason)?;
        self.submit(gateway, action)
    }

    /// Returns a completed request to the pending queue.
    pub fn rollback_to_pending(
        &mut self,
        gateway: &impl ArchiveGateway,
        id: &str,
    ) -> Result<ActionReceipt, ActionError> {
        self.submit(gateway, ActionRequest::rollback(id))
    }

    // ===== Derived views =====

    /// Whether a non-empty search is applied.
    pub fn is_searching(&self) -> bool {
        !self.search_text.is_empty()
    }

    /// The list currently shown: search results while searching, otherwise
    /// the default listing.
    pub fn displayed(&self) -> &[ArchiveRequest] {
        if self.is_searching() {
            &self.search_results
        } else {
            &self.requests
        }
    }

    /// Pending requests of the displayed list, in listing order.
    pub fn pending(&self) -> Vec<&ArchiveRequest> {
        self.displayed()
            .iter()
            .filter(|request| request.is_pending())
            .collect()
    }

    /// Approved and rejected requests of the loaded completed page.
    pub fn completed(&self) -> &[ArchiveRequest] {
        &self.completed
    }

    pub fn approved(&self) -> Vec<&ArchiveRequest> {
        self.with_action(ArchiveAction::Approved)
    }

    pub fn rejected(&self) -> Vec<&ArchiveRequest> {
        self.with_action(ArchiveAction::Rejected)
    }

    fn with_action(&self, action: ArchiveAction) -> Vec<&ArchiveRequest> {
        self.completed
            .iter()
            .filter(|request| request.action_taken == action)
            .collect()
    }

    /// First pending request, in list order, that is not claimed.
    pub fn next_available_pending_id(&self) -> Option<&str> {
        self.displayed()
            .iter()
            .filter(|request| request.is_pending())
            .map(|request| request.id.as_str())
            .find(|id| !self.is_in_progress(id))
    }

    /// Whether `id` is currently claimed.
    pub fn is_in_progress(&self, id: &str) -> bool {
        self.in_progress.iter().any(|claimed| claimed == id)
    }

    /// Claimed request IDs in claim order.
    pub fn in_progress_ids(&self) -> &[String] {
        &self.in_progress
    }

    /// Claimed requests in claim order.
    pub fn in_progress_requests(&self) -> Vec<&ArchiveRequest> {
        self.in_progress
            .iter()
            .filter_map(|id| self.displayed().iter().find(|request| &request.id == id))
            .collect()
    }

    /// Whether an action for `id` is awaiting the backend.
    pub fn is_action_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    /// The last successfully applied search text, `""` when none.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn pending_cursor(&self) -> PageCursor {
        self.pending_cursor
    }

    pub fn completed_cursor(&self) -> PageCursor {
        self.completed_cursor
    }

    pub fn is_pending_loading(&self) -> bool {
        self.pending_loading
    }

    pub fn is_completed_loading(&self) -> bool {
        self.completed_loading
    }
}
