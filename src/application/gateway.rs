use crate::domain::{
    ActionOutcome, ActionRequest, ArchiveRequest, CreateArchiveRequest, GatewayResult, ListQuery,
    PaginatedResponse,
};

/// Backend operations the workflow depends on.
///
/// Listing has no status filter; pending/completed views filter client-side.
pub trait ArchiveGateway {
    fn create_request(&self, request: &CreateArchiveRequest) -> GatewayResult<ActionOutcome>;

    fn list_requests(&self, query: &ListQuery) -> GatewayResult<PaginatedResponse<ArchiveRequest>>;

    fn submit_action(&self, action: &ActionRequest) -> GatewayResult<ActionOutcome>;
}
