//! Thin client for the peer daemon's HTTP endpoints.

use mountfs_core::PeerEndpoint;
use url::Url;

use crate::error::Error;
use crate::executor::HttpExecutor;
use crate::types::{HttpRequest, HttpResponse};

/// Issues GET requests against one peer daemon.
///
/// Any status at or above 300 is an error; the body of such a response is
/// never interpreted.
#[derive(Debug, Clone)]
pub struct PeerClient<E> {
    executor: E,
    base: Url,
}

impl<E: HttpExecutor> PeerClient<E> {
    pub fn new(executor: E, peer: &PeerEndpoint) -> Result<Self, Error> {
        let base = Url::parse(&peer.base_url())?;
        Ok(Self { executor, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// GET `endpoint` with the given query parameters.
    pub fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<HttpResponse, Error> {
        let url = self.base.join(endpoint)?;
        let mut request = HttpRequest::get(url.as_str());
        for (name, value) in query {
            request = request.with_query(*name, value);
        }

        tracing::debug!(url = %url, query = ?request.query, "querying peer daemon");
        let response = self
            .executor
            .execute(&request)
            .map_err(|message| Error::Request {
                url: url.to_string(),
                message,
            })?;

        if response.is_failure() {
            return Err(Error::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}
