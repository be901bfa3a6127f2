use crate::transport::TransportError;
use thiserror::Error;

/// Unified error type for the Salt API client.
///
/// Low-level transport and decode failures are wrapped with operation
/// context (target node, volume name, saltenv, job id) as they cross each
/// layer; see [`Error::with_operation`]. The only condition the client
/// recovers from locally is a 401 on a locally-valid token, which triggers
/// a single re-authentication and retry.
#[derive(Debug, Error)]
pub enum Error {
    /// The credential kind string is not one of the supported schemes.
    #[error("invalid credential kind {kind:?} (expected \"basic\" or \"bearer\")")]
    InvalidCredentialKind { kind: String },

    /// The client refuses to operate without an explicit trust root.
    #[error("empty CA certificate")]
    EmptyCaCertificate,

    /// The resolved Salt API address is not a valid URL.
    #[error("invalid Salt API address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// An outbound request could not be constructed.
    #[error("cannot create {verb} request for Salt API: {detail}")]
    RequestConstruction { verb: String, detail: String },

    /// Network-level failure (connection, TLS, timeout). Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The Salt API answered with a non-200 status.
    ///
    /// The body is kept as raw text: the Salt API may return HTML error
    /// pages even when asked for JSON.
    #[error("Salt API failed with code {status}{}", fmt_body(.body))]
    HttpStatus { status: u16, body: String },

    /// A 200 response whose body is not a JSON object.
    #[error("cannot decode Salt API response: {source}")]
    ResponseDecode {
        #[source]
        source: serde_json::Error,
    },

    /// A well-formed JSON response missing an expected field or carrying an
    /// unexpected type at the given path.
    #[error("unexpected Salt API response shape at {path}")]
    UnexpectedResponseShape { path: String },

    /// Authentication against `/login` failed.
    #[error("Salt API authentication failed (username={username}, type={kind}): {source}")]
    AuthenticationFailed {
        username: String,
        kind: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// The job id is unknown to the Salt API (e.g. the server restarted).
    #[error("cannot get status for job {job_id}: {reason}")]
    JobNotFound { job_id: String, reason: String },

    /// The job was refused because another state execution was already in
    /// progress on the target. A scheduling conflict, not a state failure.
    #[error("Salt job {job_id} failed to run: concurrent state execution in progress")]
    ConcurrentExecution { job_id: String },

    /// An asynchronous job ran and failed; `reason` is the extracted root
    /// cause of the state failure.
    #[error("{reason}")]
    AsyncJobFailed { reason: String },

    /// A lower-level error annotated with operation context.
    #[error("{context}: {source}")]
    Operation {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

// Body suffix for HttpStatus: omitted entirely when the body was empty or
// unreadable.
fn fmt_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

impl Error {
    /// Classified shape error for a miss at `path` in a decoded response.
    pub(crate) fn shape(path: impl Into<String>) -> Self {
        Error::UnexpectedResponseShape { path: path.into() }
    }

    /// Wrap this error with operation context as it crosses a layer.
    pub(crate) fn with_operation(self, context: impl Into<String>) -> Self {
        Error::Operation {
            context: context.into(),
            source: Box::new(self),
        }
    }
}
