//! # salt-api-client
//!
//! Async client for the Salt REST API, built for operators that drive
//! privileged Salt states on cluster nodes: target a minion, invoke a named
//! function with keyword arguments, and track the execution either
//! synchronously or as an asynchronously-polled job.
//!
//! The client owns the full session lifecycle against a single Salt API
//! endpoint:
//!
//! - token-based authentication with lazy re-authentication on expiry,
//! - authenticated dispatch that retries exactly once when a locally-valid
//!   token is rejected by the server (e.g. after a Salt API restart),
//! - asynchronous job submission and caller-driven polling,
//! - extraction of a human-readable root cause out of nested state results.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use salt_api_client::{Credential, SaltClient};
//!
//! #[tokio::main]
//! async fn main() -> salt_api_client::Result<()> {
//!     let creds = Credential::new("storage-operator", "service-account-token", "bearer")?;
//!     let ca_pem = std::fs::read("/etc/metalk8s/pki/salt-api-ca.pem").expect("CA bundle");
//!     let client = SaltClient::new(creds, &ca_pem, None)?;
//!
//!     let jid = client.prepare_volume("node-1", "my-volume", "metalk8s-2.11").await?;
//!     // Poll until the job leaves the StillRunning state...
//!     let status = client.poll_job(&jid, "node-1").await?;
//!     println!("{status:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client construction, authentication and domain operations |
//! | [`auth`] | Credentials and authentication tokens |
//! | [`transport`] | HTTP plumbing over a restricted trust root |
//! | [`response`] | Raw response decoding and classification |
//! | [`error`] | Unified error taxonomy |
//!
//! The client never installs a `tracing` subscriber; it only emits events.
//! Cancellation is drop-based: dropping a returned future aborts the
//! in-flight request. Callers wanting a deadline wrap calls in
//! `tokio::time::timeout`.

pub mod auth;
pub mod client;
pub mod response;
pub mod transport;
pub(crate) mod utils;

// Re-export main types for convenience
pub use auth::{Credential, CredentialKind, Token};
pub use client::{master_address_from_env, JobStatus, SaltClient, DEFAULT_MASTER_ADDRESS};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::Error;
