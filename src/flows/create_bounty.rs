use std::sync::Arc;

use chrono::{Local, TimeZone};
use tracing::{info, info_span, Instrument};

use crate::chain::BountyBoardContract;
use crate::config::LifecycleConfig;
use crate::domain::{BountyDraft, TransactionReceipt};
use crate::infra::{Result, WalletSigner};
use crate::lifecycle::{
    ClassifiedError, ErrorClassifier, TransactionLifecycleController, MSG_INSUFFICIENT_FUNDS,
};
use crate::telemetry::spans;

/// Message shown when a failure carries no text of its own
pub const CREATE_BOUNTY_FALLBACK: &str = "Failed to create bounty. Please try again.";

/// Creates a bounty, escrowing the reward as the transaction value
pub struct CreateBountyFlow {
    controller: Arc<TransactionLifecycleController>,
    contract: BountyBoardContract,
}

impl CreateBountyFlow {
    pub fn new(controller: Arc<TransactionLifecycleController>, contract: BountyBoardContract) -> Self {
        Self {
            controller,
            contract,
        }
    }

    /// Flow with its own controller and the wallet classification table
    pub fn with_config(contract: BountyBoardContract, config: &LifecycleConfig) -> Self {
        let classifier =
            ErrorClassifier::wallet_defaults(CREATE_BOUNTY_FALLBACK, MSG_INSUFFICIENT_FUNDS);
        let controller = TransactionLifecycleController::from_config(config, classifier);
        Self::new(Arc::new(controller), contract)
    }

    pub fn controller(&self) -> &Arc<TransactionLifecycleController> {
        &self.controller
    }

    /// Validate `draft` against the local time zone and submit it
    pub async fn submit(
        &self,
        draft: &BountyDraft,
        signer: Option<&dyn WalletSigner>,
    ) -> Result<TransactionReceipt> {
        self.submit_in(draft, signer, &Local).await
    }

    /// Validate `draft` with its deadline read in `tz` and submit it.
    ///
    /// The wallet check comes first, then validation; neither reaches the
    /// controller when it fails.
    pub async fn submit_in<Tz: TimeZone>(
        &self,
        draft: &BountyDraft,
        signer: Option<&dyn WalletSigner>,
        tz: &Tz,
    ) -> Result<TransactionReceipt> {
        if signer.is_none() {
            return Err(ClassifiedError::not_connected().into());
        }
        let bounty = draft.validate_in(tz)?;

        let span = info_span!(
            spans::CREATE_BOUNTY,
            title = %bounty.title,
            reward_wei = %bounty.reward_wei,
            deadline = bounty.deadline
        );
        let receipt = self
            .controller
            .run(signer, || self.contract.create_bounty(&bounty))
            .instrument(span)
            .await?;

        info!(tx_hash = %receipt.tx_hash, "Bounty created");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::createBountyCall;
    use crate::domain::{Address, TransactionStage, TxHash, U256};
    use crate::infra::{BountyError, MockPendingTransaction, MockWalletSigner, ValidationError};
    use crate::lifecycle::ErrorKind;
    use alloy::sol_types::SolCall;
    use chrono::{NaiveDate, Utc};
    use std::sync::Mutex;

    fn flow() -> CreateBountyFlow {
        CreateBountyFlow::with_config(
            BountyBoardContract::new(Address::repeat_byte(0xcc)),
            &LifecycleConfig::immediate(),
        )
    }

    fn draft() -> BountyDraft {
        BountyDraft::new("Fix bug", "Crash on start", "Open a PR", "0.5")
            .with_deadline(NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(), "23:59")
    }

    #[tokio::test]
    async fn test_encodes_reward_and_deadline() {
        let sent = Arc::new(Mutex::new(None));
        let captured = sent.clone();

        let mut pending = MockPendingTransaction::new();
        pending.expect_tx_hash().return_const(TxHash::ZERO);
        pending.expect_wait().return_once(|| {
            Ok(TransactionReceipt {
                tx_hash: TxHash::ZERO,
                block_number: Some(1),
                success: true,
            })
        });
        let mut signer = MockWalletSigner::new();
        signer.expect_address().returning(|| Ok(Address::ZERO));
        signer.expect_transaction_count().returning(|_| Ok(0));
        signer.expect_send_transaction().return_once(move |tx| {
            *captured.lock().unwrap() = Some(tx);
            Ok(Box::new(pending))
        });

        let flow = flow();
        flow.submit_in(&draft(), Some(&signer), &Utc).await.unwrap();

        let tx = sent.lock().unwrap().take().unwrap();
        let half_ether = U256::from(500_000_000_000_000_000u64);
        assert_eq!(tx.to, Address::repeat_byte(0xcc));
        assert_eq!(tx.value, half_ether);

        let decoded = createBountyCall::abi_decode(&tx.data, true).unwrap();
        assert_eq!(decoded.title, "Fix bug");
        assert_eq!(decoded.reward, half_ether);
        assert_eq!(decoded.deadline, U256::from(1_894_751_940u64));
        assert_eq!(
            flow.controller().state().await.stage,
            TransactionStage::Confirmed
        );
    }

    #[tokio::test]
    async fn test_not_connected_checked_before_validation() {
        let err = flow()
            .submit(&BountyDraft::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_signer() {
        let mut signer = MockWalletSigner::new();
        signer.expect_address().never();
        signer.expect_send_transaction().never();

        let flow = flow();
        let mut rx = flow.controller().subscribe();
        let bad = BountyDraft {
            reward: "abc".to_string(),
            ..draft()
        };

        let err = flow.submit(&bad, Some(&signer)).await.unwrap_err();

        assert!(matches!(
            err,
            BountyError::Validation(ValidationError::InvalidReward(_))
        ));
        assert!(rx.try_recv().is_err());
    }
}
