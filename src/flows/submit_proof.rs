use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, warn, Instrument};

use super::PostSuccessAction;
use crate::chain::BountyBoardContract;
use crate::config::LifecycleConfig;
use crate::domain::{ContentId, ProofSubmission, TransactionReceipt};
use crate::infra::{BountyError, Result, WalletSigner};
use crate::lifecycle::{
    ClassifiedError, ErrorClassifier, TransactionLifecycleController, MSG_INSUFFICIENT_FUNDS_PROOF,
};
use crate::packaging::ProofPackager;
use crate::telemetry::spans;

/// Message shown when a failure carries no text of its own
pub const SUBMIT_PROOF_FALLBACK: &str = "Failed to submit proof. Please try again.";

/// A proof recorded on-chain
#[derive(Debug, Clone)]
pub struct SubmittedProof {
    /// Identifier passed to `submitProof`
    pub cid: ContentId,
    pub receipt: TransactionReceipt,
}

/// Packages proof artifacts and records the metadata identifier on-chain
pub struct SubmitProofFlow {
    controller: Arc<TransactionLifecycleController>,
    contract: BountyBoardContract,
    packager: ProofPackager,
    success_delay: Duration,
    on_success: Option<Arc<dyn PostSuccessAction>>,
}

impl SubmitProofFlow {
    pub fn new(
        controller: Arc<TransactionLifecycleController>,
        contract: BountyBoardContract,
        packager: ProofPackager,
    ) -> Self {
        Self {
            controller,
            contract,
            packager,
            success_delay: LifecycleConfig::default().success_delay,
            on_success: None,
        }
    }

    /// Flow with its own controller and the wallet classification table
    pub fn with_config(
        contract: BountyBoardContract,
        packager: ProofPackager,
        config: &LifecycleConfig,
    ) -> Self {
        let classifier =
            ErrorClassifier::wallet_defaults(SUBMIT_PROOF_FALLBACK, MSG_INSUFFICIENT_FUNDS_PROOF);
        let controller = TransactionLifecycleController::from_config(config, classifier);
        Self::new(Arc::new(controller), contract, packager).with_success_delay(config.success_delay)
    }

    pub fn with_success_delay(mut self, delay: Duration) -> Self {
        self.success_delay = delay;
        self
    }

    /// Action run `success_delay` after confirmation
    pub fn with_post_success(mut self, action: Arc<dyn PostSuccessAction>) -> Self {
        self.on_success = Some(action);
        self
    }

    pub fn controller(&self) -> &Arc<TransactionLifecycleController> {
        &self.controller
    }

    /// Package `submission` and submit its identifier.
    ///
    /// Wallet and artifact checks run before anything is uploaded. Packaging
    /// runs inside the `submitted` stage; if it fails nothing is sent
    /// on-chain.
    pub async fn submit(
        &self,
        submission: &ProofSubmission,
        signer: Option<&dyn WalletSigner>,
    ) -> Result<SubmittedProof> {
        let Some(wallet) = signer else {
            return Err(ClassifiedError::not_connected().into());
        };
        submission.validate()?;

        let span = info_span!(
            spans::SUBMIT_PROOF,
            bounty_id = %submission.bounty_id,
            files = submission.files.len(),
            links = submission.links.len()
        );
        let classifier = self.controller.classifier();
        let mut packaged = None;

        let receipt = self
            .controller
            .run_prepared(signer, async {
                let submitter = wallet
                    .address()
                    .await
                    .map_err(|e| classifier.classify(&e))?;
                let cid = self.packager.package(submission, submitter).await?;
                let call = self.contract.submit_proof(submission.bounty_id, &cid);
                packaged = Some(cid);
                Ok::<_, BountyError>(call)
            })
            .instrument(span)
            .await?;

        let cid = packaged.ok_or_else(|| {
            BountyError::Internal("confirmed without a packaged identifier".to_string())
        })?;
        info!(bounty_id = %submission.bounty_id, %cid, tx_hash = %receipt.tx_hash, "Proof submitted");

        tokio::time::sleep(self.success_delay).await;
        if let Some(action) = &self.on_success {
            // Already on-chain; a failed follow-up does not undo that
            if let Err(e) = action.on_success(&receipt).await {
                warn!(tx_hash = %receipt.tx_hash, "Post-success action failed: {}", e);
            }
        }

        Ok(SubmittedProof { cid, receipt })
    }
}
