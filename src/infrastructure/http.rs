use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::application::ArchiveGateway;
use crate::domain::{
    ActionOutcome, ActionRequest, ArchiveRequest, CreateArchiveRequest, GatewayError,
    GatewayResult, ListQuery, PaginatedResponse,
};

/// [`ArchiveGateway`] over the backend's `ArchiveRequests` REST resource.
pub struct HttpArchiveGateway {
    client: Client,
    base_url: String,
}

impl HttpArchiveGateway {
    /// Creates a gateway rooted at `api_url` (e.g. `https://host/api`).
    pub fn new(api_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: Self::resource_url(api_url),
        })
    }

    fn resource_url(api_url: &str) -> String {
        format!("{}/ArchiveRequests", api_url.trim_end_matches('/'))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn read_json<T: DeserializeOwned>(resp: Response) -> GatewayResult<T> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json()?)
    }
}

impl ArchiveGateway for HttpArchiveGateway {
    fn create_request(&self, request: &CreateArchiveRequest) -> GatewayResult<ActionOutcome> {
        tracing::debug!(plate = %request.plate_number, "POST {}", self.base_url);
        let resp = self.client.post(&self.base_url).json(request).send()?;
        Self::read_json(resp)
    }

    fn list_requests(&self, query: &ListQuery) -> GatewayResult<PaginatedResponse<ArchiveRequest>> {
        tracing::debug!(?query, "GET {}", self.base_url);
        let resp = self
            .client
            .get(&self.base_url)
            .query(&query.to_params())
            .send()?;
        Self::read_json(resp)
    }

    fn submit_action(&self, action: &ActionRequest) -> GatewayResult<ActionOutcome> {
        let url = format!("{}/ActionTaken", self.base_url);
        tracing::debug!(id = action.id(), action = ?action.action_taken(), "POST {}", url);
        let resp = self.client.post(&url).json(action).send()?;
        Self::read_json(resp)
    }
}
