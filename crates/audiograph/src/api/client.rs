//! Client for the paginated collection API.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{FetchedPage, PageEnvelope};
use crate::http::{HttpRequest, HttpTransport};

/// Default API host.
pub const DEFAULT_HOST: &str = "https://api.soundcloud.com";

/// User-Agent sent with every request.
const USER_AGENT: &str = "audiograph";

/// Timeout applied to the built-in reqwest transport.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the collection endpoints.
///
/// Holds the transport, the API host, and an optional `client_id`
/// credential appended to built URLs. Cheap to clone; clones share the
/// transport.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    client_id: Option<String>,
}

impl ApiClient {
    /// Create a client with the built-in reqwest transport.
    #[cfg(feature = "reqwest")]
    pub fn new(host: &str, client_id: Option<&str>) -> Result<Self, ApiError> {
        let transport = crate::http::reqwest_transport::ReqwestTransport::with_timeout(
            REQUEST_TIMEOUT,
        )?;
        Ok(Self::with_transport(host, client_id, Arc::new(transport)))
    }

    /// Create a client over an injected transport.
    pub fn with_transport(
        host: &str,
        client_id: Option<&str>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
            client_id: client_id.map(ToString::to_string),
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the URL for one page of a collection.
    ///
    /// An explicit continuation `next_href` is used verbatim; otherwise
    /// the URL is assembled from the host, the user segment (`me` when
    /// no user is given), and the endpoint template. The configured
    /// `client_id` is appended when the URL does not already carry one.
    #[must_use]
    pub fn page_url(&self, user: Option<&str>, next_href: Option<&str>, template: &str) -> String {
        let mut url = match next_href {
            Some(href) => href.to_string(),
            None => match user {
                Some(user) => format!("{}/users/{}/{}", self.host, user, template),
                None => format!("{}/me/{}", self.host, template),
            },
        };

        if let Some(client_id) = &self.client_id
            && !url.contains("client_id=")
        {
            let sep = if url.contains('?') { '&' } else { '?' };
            url.push(sep);
            url.push_str("client_id=");
            url.push_str(client_id);
        }

        url
    }

    /// Fetch and decode one page of a collection endpoint.
    ///
    /// Performs exactly one round trip; retry policy, if any, lives in
    /// the transport.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        user: Option<&str>,
        next_href: Option<&str>,
        template: &str,
    ) -> Result<FetchedPage<T>, ApiError> {
        let url = self.page_url(user, next_href, template);
        tracing::debug!(url = %url, "fetching collection page");

        let request = HttpRequest {
            url,
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
        };

        let response = self.transport.send(request).await?;

        if !(200..300).contains(&response.status) {
            let message = String::from_utf8_lossy(&response.body).to_string();
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        let envelope: PageEnvelope<T> = serde_json::from_slice(&response.body)?;
        Ok(envelope.into())
    }
}
