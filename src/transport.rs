//! HTTP plumbing for the Salt API.
//!
//! [`HttpTransport`] owns a `reqwest` client whose trust root is exactly the
//! CA bundle supplied at construction; the system trust store is disabled.
//! It builds fully-formed requests (URL, query, headers, JSON body) and
//! performs single sends with a translog record per round trip.

use crate::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Certificate, Method};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Dial timeout; request duration is bounded by caller cancellation.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for `address` trusting only `ca_cert_data`.
    ///
    /// Fails with [`Error::EmptyCaCertificate`] when no CA bytes are given:
    /// the client refuses to fall back to the system trust store.
    pub fn new(address: &str, ca_cert_data: &[u8]) -> Result<Self> {
        Url::parse(address).map_err(|e| Error::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        if ca_cert_data.is_empty() {
            return Err(Error::EmptyCaCertificate);
        }
        let certs = Certificate::from_pem_bundle(ca_cert_data).map_err(|e| {
            TransportError::Other(format!("cannot load CA certificate: {e}"))
        })?;

        let mut builder = reqwest::Client::builder()
            .tls_built_in_root_certs(false)
            .connect_timeout(CONNECT_TIMEOUT);
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: address.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request for the Salt API.
    ///
    /// Every request carries the fixed `timeout=1` query parameter (a
    /// backend short-poll hint) and JSON `Accept`/`Content-Type` headers.
    /// The `X-Auth-Token` header is attached only when `token` is given.
    pub(crate) fn build_request(
        &self,
        verb: &Method,
        endpoint: &str,
        payload: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Request> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut builder = self
            .client
            .request(verb.clone(), &url)
            .query(&[("timeout", "1")])
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if let Some(payload) = payload {
            let body = serde_json::to_vec(payload).map_err(|e| Error::RequestConstruction {
                verb: verb.to_string(),
                detail: format!("cannot serialize body: {e}"),
            })?;
            builder = builder.body(body);
        }
        if let Some(token) = token {
            builder = builder.header("X-Auth-Token", token);
        }

        builder.build().map_err(|e| Error::RequestConstruction {
            verb: verb.to_string(),
            detail: e.to_string(),
        })
    }

    /// Perform a single send. Transport failures are never retried here.
    pub(crate) async fn send(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, TransportError> {
        let verb = request.method().clone();
        let url = request.url().clone();

        let start = Instant::now();
        let result = self.client.execute(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => debug!(
                %verb,
                %url,
                status = response.status().as_u16(),
                duration_ms,
                "Salt API request"
            ),
            Err(error) => debug!(%verb, %url, duration_ms, %error, "Salt API request failed"),
        }

        result.map_err(TransportError::Http)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport error: {0}")]
    Other(String),
}
