//! End-to-end flows: validate, prepare, then drive the on-chain write

mod create_bounty;
mod submit_proof;

pub use create_bounty::{CreateBountyFlow, CREATE_BOUNTY_FALLBACK};
pub use submit_proof::{SubmitProofFlow, SubmittedProof, SUBMIT_PROOF_FALLBACK};

use async_trait::async_trait;

use crate::domain::TransactionReceipt;
use crate::infra::Result;

/// Work done once a flow's transaction is confirmed
#[async_trait]
pub trait PostSuccessAction: Send + Sync {
    async fn on_success(&self, receipt: &TransactionReceipt) -> Result<()>;
}
