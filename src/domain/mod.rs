//! Domain models for the bounty board client
//!
//! Bounty drafts, proof submissions and the transaction lifecycle stages
//! shared by both write flows.

mod bounty;
mod lifecycle;
mod proof;
mod types;

pub use bounty::*;
pub use lifecycle::*;
pub use proof::*;
pub use types::*;
