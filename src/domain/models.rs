use serde::{Deserialize, Deserializer, Serialize};

use super::errors::ValidationError;

/// Lifecycle status of an archive request.
///
/// Serialized as the backend's integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ArchiveAction {
    Pending = 0,
    Rejected = 1,
    Approved = 2,
}

impl ArchiveAction {
    pub fn label(self) -> &'static str {
        match self {
            ArchiveAction::Pending => "Pending",
            ArchiveAction::Rejected => "Rejected",
            ArchiveAction::Approved => "Approved",
        }
    }

    /// Approved and rejected requests are both considered completed.
    pub fn is_completed(self) -> bool {
        matches!(self, ArchiveAction::Approved | ArchiveAction::Rejected)
    }
}

impl From<ArchiveAction> for u8 {
    fn from(action: ArchiveAction) -> Self {
        action as u8
    }
}

impl TryFrom<u8> for ArchiveAction {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ArchiveAction::Pending),
            1 => Ok(ArchiveAction::Rejected),
            2 => Ok(ArchiveAction::Approved),
            other => Err(format!("unknown archive action code {}", other)),
        }
    }
}

/// Category of work requested for a plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ArchiveType {
    #[default]
    SendFile = 1,
    Other = 2,
}

impl ArchiveType {
    pub fn label(self) -> &'static str {
        match self {
            ArchiveType::SendFile => "Send file",
            ArchiveType::Other => "Other",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ArchiveType::SendFile => ArchiveType::Other,
            ArchiveType::Other => ArchiveType::SendFile,
        }
    }
}

impl From<ArchiveType> for u8 {
    fn from(kind: ArchiveType) -> Self {
        kind as u8
    }
}

impl TryFrom<u8> for ArchiveType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ArchiveType::SendFile),
            2 => Ok(ArchiveType::Other),
            other => Err(format!("unknown archive type code {}", other)),
        }
    }
}

/// A request as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub id: String,
    pub plate_number: String,
    pub action_taken: ArchiveAction,
    pub action_type: ArchiveType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
    #[serde(default)]
    pub reject_reason: Option<String>,
}

impl ArchiveRequest {
    pub fn is_pending(&self) -> bool {
        self.action_taken == ArchiveAction::Pending
    }

    /// The reject reason, only meaningful for rejected requests.
    pub fn reject_reason(&self) -> Option<&str> {
        if self.action_taken != ArchiveAction::Rejected {
            return None;
        }
        self.reject_reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Paginated listing exactly as the backend returns it.
///
/// `data` may be absent on a malformed or failed response, which callers
/// treat as a fetch failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_items: u64,
    pub data: Option<Vec<T>>,
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub has_next_page: bool,
}

impl<T> PaginatedResponse<T> {
    /// Converts into a [`Page`], or `None` when the response carried no data.
    pub fn into_page(self) -> Option<Page<T>> {
        let items = self.data?;
        Some(Page {
            current_page: self.current_page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items,
        })
    }
}

/// A listing page that is known to carry data.
///
/// Totals are the backend's unfiltered totals for the page's query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items: Vec<T>,
}

/// Position within a paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            total_items: 0,
            total_pages: 0,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether `page` is a valid target for navigation.
    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }
}

/// Query parameters for the listing endpoint. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search_text: Option<String>,
    pub order_sort: Option<i32>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListQuery {
    pub fn page(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: Some(page_number),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Sets the search text; blank text leaves the query unfiltered.
    pub fn with_search(mut self, search_text: Option<&str>) -> Self {
        self.search_text = search_text
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        self
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref text) = self.search_text {
            params.push(("searchText", text.clone()));
        }
        if let Some(order) = self.order_sort {
            params.push(("orderSort", order.to_string()));
        }
        if let Some(page) = self.page_number {
            params.push(("pageNumber", page.to_string()));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        params
    }
}

/// Body of a create-request call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArchiveRequest {
    pub plate_number: String,
    pub action: ArchiveType,
    pub note: String,
}

/// Body of an action submission.
///
/// Built only through the constructors so that a reject reason is present
/// exactly when the action is a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    id: String,
    action_taken: ArchiveAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    reject_reason: Option<String>,
}

impl ActionRequest {
    pub fn approve(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action_taken: ArchiveAction::Approved,
            reject_reason: None,
        }
    }

    pub fn rollback(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action_taken: ArchiveAction::Pending,
            reject_reason: None,
        }
    }

    /// Builds a rejection; the reason is trimmed and must not be empty.
    pub fn reject(id: impl Into<String>, reason: &str) -> Result<Self, ValidationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::EmptyRejectReason);
        }
        Ok(Self {
            id: id.into(),
            action_taken: ArchiveAction::Rejected,
            reject_reason: Some(reason.to_string()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn action_taken(&self) -> ArchiveAction {
        self.action_taken
    }

    pub fn reject_reason(&self) -> Option<&str> {
        self.reject_reason.as_deref()
    }
}

/// `{ isSuccess }` acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    #[serde(default)]
    pub is_success: Option<bool>,
}

impl ActionOutcome {
    pub fn success() -> Self {
        Self { is_success: Some(true) }
    }

    pub fn failure() -> Self {
        Self { is_success: Some(false) }
    }

    /// Only an explicit `false` counts as failure.
    pub fn succeeded(&self) -> bool {
        self.is_success != Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_archive_request_from_backend_json() {
        let json = r#"{
            "id": "7f1c",
            "plateNumber": "ABC 123",
            "actionTaken": 1,
            "actionType": 2,
            "note": null,
            "rejectReason": "blurred image"
        }"#;

        let request: ArchiveRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.id, "7f1c");
        assert_eq!(request.action_taken, ArchiveAction::Rejected);
        assert_eq!(request.action_type, ArchiveType::Other);
        assert_eq!(request.note, "");
        assert_eq!(request.reject_reason(), Some("blurred image"));
    }

    #[test]
    fn test_unknown_action_code_is_rejected() {
        let json = r#"{"id":"1","plateNumber":"A","actionTaken":9,"actionType":1,"note":""}"#;
        assert!(serde_json::from_str::<ArchiveRequest>(json).is_err());
    }

    #[test]
    fn test_reject_reason_hidden_unless_rejected() {
        let request = ArchiveRequest {
            id: "1".to_string(),
            plate_number: "A 1".to_string(),
            action_taken: ArchiveAction::Approved,
            action_type: ArchiveType::SendFile,
            note: String::new(),
            reject_reason: Some("stale".to_string()),
        };
        assert_eq!(request.reject_reason(), None);
    }

    #[test]
    fn test_paginated_response_without_data() {
        let json = r#"{"currentPage":1,"pageSize":10,"totalPages":0,"totalItems":0}"#;
        let response: PaginatedResponse<ArchiveRequest> = serde_json::from_str(json).unwrap();
        assert!(response.into_page().is_none());

        let json = r#"{"currentPage":1,"pageSize":10,"totalPages":0,"totalItems":0,"data":null}"#;
        let response: PaginatedResponse<ArchiveRequest> = serde_json::from_str(json).unwrap();
        assert_eq!(response.data, None);
    }

    #[test]
    fn test_list_query_params_skip_unset_fields() {
        let query = ListQuery::page(2, 10).with_search(Some("ABC"));
        assert_eq!(
            query.to_params(),
            vec![
                ("searchText", "ABC".to_string()),
                ("pageNumber", "2".to_string()),
                ("pageSize", "10".to_string()),
            ]
        );

        let query = ListQuery::page(1, 10).with_search(Some(""));
        assert_eq!(query.search_text, None);

        let query = ListQuery {
            page_size: Some(100),
            ..ListQuery::default()
        };
        assert_eq!(query.to_params(), vec![("pageSize", "100".to_string())]);
    }

    #[test]
    fn test_action_request_serialization() {
        let approve = serde_json::to_value(ActionRequest::approve("42")).unwrap();
        assert_eq!(approve, serde_json::json!({"id": "42", "actionTaken": 2}));

        let reject = serde_json::to_value(ActionRequest::reject("42", "  no file  ").unwrap()).unwrap();
        assert_eq!(
            reject,
            serde_json::json!({"id": "42", "actionTaken": 1, "rejectReason": "no file"})
        );
    }

    #[test]
    fn test_reject_requires_reason() {
        assert_eq!(
            ActionRequest::reject("1", "   "),
            Err(ValidationError::EmptyRejectReason)
        );
    }

    #[test]
    fn test_create_request_serialization() {
        let body = CreateArchiveRequest {
            plate_number: "ABC 123".to_string(),
            action: ArchiveType::SendFile,
            note: "urgent".to_string(),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({"plateNumber": "ABC 123", "action": 1, "note": "urgent"})
        );
    }

    #[test]
    fn test_action_outcome_success_semantics() {
        let missing: ActionOutcome = serde_json::from_str("{}").unwrap();
        assert!(missing.succeeded());
        let failed: ActionOutcome = serde_json::from_str(r#"{"isSuccess":false}"#).unwrap();
        assert!(!failed.succeeded());
    }

    #[test]
    fn test_page_cursor_navigation() {
        let mut cursor = PageCursor::new(10);
        assert!(!cursor.has_previous());
        assert!(!cursor.has_next());
        assert!(!cursor.contains(1));

        cursor.total_pages = 3;
        cursor.page = 2;
        assert!(cursor.has_previous());
        assert!(cursor.has_next());
        assert!(cursor.contains(3));
        assert!(!cursor.contains(0));
        assert!(!cursor.contains(4));
    }
}
