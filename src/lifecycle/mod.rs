//! Transaction lifecycle: the stage machine and error classification
//! shared by every on-chain write.

mod classify;
mod controller;

pub use classify::*;
pub use controller::{TransactionLifecycleController, DEFAULT_CONFIRMATION_DELAY};
