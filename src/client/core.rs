use crate::auth::{Credential, CredentialKind, Token};
use crate::response::decode_api_response;
use crate::transport::HttpTransport;
use crate::utils::json_path::get_path;
use crate::{Error, Result};
use arc_swap::ArcSwapOption;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Default address of the Salt API server.
pub const DEFAULT_MASTER_ADDRESS: &str = "https://salt-master:4507";

/// Address of the Salt API server from `METALK8S_SALT_MASTER_ADDRESS`.
///
/// Address resolution is the caller's responsibility; this helper covers the
/// common deployment where the address is injected through the environment.
pub fn master_address_from_env() -> Option<String> {
    std::env::var("METALK8S_SALT_MASTER_ADDRESS")
        .ok()
        .filter(|address| !address.is_empty())
}

/// A Salt API client.
///
/// Constructed once per logical session and shared by concurrent callers:
/// the only mutable state is the authentication token, held in an
/// [`ArcSwapOption`] so a refresh publishes the new token atomically and
/// readers never observe a torn value. Concurrent refreshers may redundantly
/// re-authenticate; the last stored token wins.
///
/// Every operation performs at most one network round trip (two on the
/// 401-retry path). Dropping a returned future aborts the in-flight request.
#[derive(Debug)]
pub struct SaltClient {
    address: String,
    transport: HttpTransport,
    creds: Credential,
    token: ArcSwapOption<Token>,
}

impl SaltClient {
    /// Create a new Salt API client.
    ///
    /// Uses `address_override` when non-empty, [`DEFAULT_MASTER_ADDRESS`]
    /// otherwise. Fails with [`Error::EmptyCaCertificate`] when
    /// `ca_cert_data` is empty: the supplied CA bundle becomes the only
    /// trust root, never the system store.
    pub fn new(
        creds: Credential,
        ca_cert_data: &[u8],
        address_override: Option<&str>,
    ) -> Result<Self> {
        let address = match address_override {
            Some(address) if !address.is_empty() => address.to_string(),
            _ => DEFAULT_MASTER_ADDRESS.to_string(),
        };
        let transport = HttpTransport::new(&address, ca_cert_data)?;

        Ok(Self {
            address,
            transport,
            creds,
            token: ArcSwapOption::from(None),
        })
    }

    /// Address of the Salt API server this client talks to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send an authenticated request to the Salt API.
    ///
    /// Automatically handles:
    /// - missing token (authenticate),
    /// - token expiration (re-authenticate),
    /// - token invalidation (re-authenticate and retry, exactly once).
    ///
    /// Any status other than a first 401, including a second 401, is handed
    /// to response decoding as-is. Transport failures are never retried.
    pub(crate) async fn authenticated_request(
        &self,
        verb: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<Value> {
        // Authenticate if we don't have a valid token.
        if self
            .token
            .load()
            .as_ref()
            .map_or(true, |token| token.is_expired())
        {
            self.authenticate().await?;
        }

        let response = self.do_request(&verb, endpoint, payload, true).await?;

        // Maybe the token got invalidated by a restart of the Salt API
        // server. => Re-authenticate and retry.
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            info!("valid token rejected: trying to re-authenticate");

            // Terminate this request before starting another.
            drop(response);

            self.token.store(None);
            self.authenticate().await?;
            self.do_request(&verb, endpoint, payload, true).await?
        } else {
            response
        };

        decode_api_response(response).await
    }

    /// Authenticate against the Salt API server.
    ///
    /// On success the stored token is replaced wholesale; a subsequent read
    /// from any task observes this token or a strictly newer one.
    async fn authenticate(&self) -> Result<()> {
        let mut payload = json!({
            "eauth": "kubernetes_rbac",
            "username": self.creds.username(),
        });
        let secret_field = match self.creds.kind() {
            CredentialKind::BearerToken => "token",
            CredentialKind::Basic => "password",
        };
        payload[secret_field] = Value::String(self.creds.secret().to_string());

        info!(
            username = self.creds.username(),
            kind = self.creds.kind().as_str(),
            "authenticating against the Salt API"
        );

        let result = async {
            let response = self
                .do_request(&Method::POST, "/login", Some(&payload), false)
                .await?;
            decode_api_response(response).await
        }
        .await
        .map_err(|e| self.auth_failed(e))?;

        let token = get_path(&result, "return[0].token")
            .and_then(Value::as_str)
            .ok_or_else(|| self.auth_failed(Error::shape("return[0].token")))?;
        let expire = get_path(&result, "return[0].expire")
            .and_then(Value::as_f64)
            .ok_or_else(|| self.auth_failed(Error::shape("return[0].expire")))?;

        self.token
            .store(Some(Arc::new(Token::from_epoch(token.to_string(), expire))));
        Ok(())
    }

    fn auth_failed(&self, source: Error) -> Error {
        Error::AuthenticationFailed {
            username: self.creds.username().to_string(),
            kind: self.creds.kind().as_str(),
            source: Box::new(source),
        }
    }

    /// Perform one request/response exchange, attaching the current token
    /// when `is_auth` is set.
    async fn do_request(
        &self,
        verb: &Method,
        endpoint: &str,
        payload: Option<&Value>,
        is_auth: bool,
    ) -> Result<reqwest::Response> {
        let token = if is_auth { self.token.load_full() } else { None };
        let request = self.transport.build_request(
            verb,
            endpoint,
            payload,
            token.as_deref().map(Token::value),
        )?;

        self.transport
            .send(request)
            .await
            .map_err(|e| Error::from(e).with_operation(format!("{verb} failed on Salt API")))
    }
}
