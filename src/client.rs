//! Salt API client: construction, authentication and domain operations.
//!
//! The public surface is [`SaltClient`] plus the [`JobStatus`] polling
//! outcome. Implementation details are split into submodules under
//! `src/client/`.

pub mod core;
pub mod jobs;
pub mod volumes;

pub use self::core::{master_address_from_env, SaltClient, DEFAULT_MASTER_ADDRESS};
pub use jobs::JobStatus;
