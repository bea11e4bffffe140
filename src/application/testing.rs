//! Scripted gateway for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::gateway::ArchiveGateway;
use crate::domain::{
    ActionOutcome, ActionRequest, ArchiveAction, ArchiveRequest, ArchiveType,
    CreateArchiveRequest, GatewayResult, ListQuery, PaginatedResponse,
};

/// Replays queued responses and records every call.
///
/// When a queue is empty, listings fall back to the sticky listing (or an
/// empty page) and mutations succeed.
#[derive(Default)]
pub struct FakeGateway {
    listings: RefCell<VecDeque<GatewayResult<PaginatedResponse<ArchiveRequest>>>>,
    sticky_listing: RefCell<Option<PaginatedResponse<ArchiveRequest>>>,
    outcomes: RefCell<VecDeque<GatewayResult<ActionOutcome>>>,
    pub list_calls: RefCell<Vec<ListQuery>>,
    pub action_calls: RefCell<Vec<ActionRequest>>,
    pub create_calls: RefCell<Vec<CreateArchiveRequest>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(listing: PaginatedResponse<ArchiveRequest>) -> Self {
        let gateway = Self::default();
        gateway.set_listing(listing);
        gateway
    }

    pub fn set_listing(&self, listing: PaginatedResponse<ArchiveRequest>) {
        *self.sticky_listing.borrow_mut() = Some(listing);
    }

    pub fn push_listing(&self, listing: GatewayResult<PaginatedResponse<ArchiveRequest>>) {
        self.listings.borrow_mut().push_back(listing);
    }

    pub fn push_outcome(&self, outcome: GatewayResult<ActionOutcome>) {
        self.outcomes.borrow_mut().push_back(outcome);
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.borrow().len()
    }

    pub fn action_count(&self) -> usize {
        self.action_calls.borrow().len()
    }
}

impl ArchiveGateway for FakeGateway {
    fn create_request(&self, request: &CreateArchiveRequest) -> GatewayResult<ActionOutcome> {
        self.create_calls.borrow_mut().push(request.clone());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(ActionOutcome::success()))
    }

    fn list_requests(&self, query: &ListQuery) -> GatewayResult<PaginatedResponse<ArchiveRequest>> {
        self.list_calls.borrow_mut().push(query.clone());
        if let Some(listing) = self.listings.borrow_mut().pop_front() {
            return listing;
        }
        Ok(self
            .sticky_listing
            .borrow()
            .clone()
            .unwrap_or_else(|| page(Vec::new())))
    }

    fn submit_action(&self, action: &ActionRequest) -> GatewayResult<ActionOutcome> {
        self.action_calls.borrow_mut().push(action.clone());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(ActionOutcome::success()))
    }
}

pub fn request(id: &str, action: ArchiveAction) -> ArchiveRequest {
    ArchiveRequest {
        id: id.to_string(),
        plate_number: format!("PLATE {}", id),
        action_taken: action,
        action_type: ArchiveType::SendFile,
        note: String::new(),
        reject_reason: (action == ArchiveAction::Rejected).then(|| "unreadable".to_string()),
    }
}

/// A single-page response holding `items`.
pub fn page(items: Vec<ArchiveRequest>) -> PaginatedResponse<ArchiveRequest> {
    let total = items.len() as u64;
    PaginatedResponse {
        current_page: 1,
        page_size: 10,
        total_pages: if total == 0 { 0 } else { 1 },
        total_items: total,
        data: Some(items),
        has_previous_page: false,
        has_next_page: false,
    }
}

pub fn paged(
    items: Vec<ArchiveRequest>,
    current_page: u32,
    total_pages: u32,
    total_items: u64,
) -> PaginatedResponse<ArchiveRequest> {
    PaginatedResponse {
        current_page,
        page_size: 10,
        total_pages,
        total_items,
        data: Some(items),
        has_previous_page: current_page > 1,
        has_next_page: current_page < total_pages,
    }
}
