//! Infrastructure layer for the bounty board client
//!
//! Contains:
//! - Error taxonomy shared by every flow
//! - Collaborator traits (wallet signer, content store, preferences)
//! - Retry with backoff for transient storage failures

mod error;
pub mod retry;
mod traits;

pub use error::*;
pub use retry::{Retry, RetryConfig, RetryResult};
pub use traits::*;
