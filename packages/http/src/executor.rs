//! HTTP execution abstraction for testing.
//!
//! Remote sources talk to the peer daemon through [`HttpExecutor`] so unit
//! tests can substitute canned responses for a network.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
pub trait HttpExecutor: Send + Sync {
    /// Execute a request and return the response, whatever its status.
    ///
    /// Returns `Err` with a message if no response was received.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// Production HTTP executor using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Create an executor. `None` waits for the daemon indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string())?;

        Ok(Self { client })
    }

    /// Create without a request timeout.
    pub fn without_timeout() -> Result<Self, String> {
        Self::new(None)
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let method: http::Method = request.method.into();

        let mut req_builder = self.client.request(method, &request.url);
        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        let response = req_builder.send().map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();
        let body = response.text().map_err(|e| e.to_string())?;

        Ok(HttpResponse {
            status,
            status_text,
            body,
        })
    }
}
