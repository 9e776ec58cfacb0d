//! Transaction lifecycle controller
//!
//! Drives one on-chain write through `submitted -> pending -> confirmed`,
//! or into `error` with a classified message. At most one run is active per
//! controller; a concurrent call is rejected with `AlreadyInProgress`.
//! Nothing is retried: a failed attempt is terminal and a new `run` starts
//! over from `submitted`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classify::{ClassifiedError, ErrorClassifier, ErrorKind, MSG_REVERTED};
use crate::config::LifecycleConfig;
use crate::domain::{
    LifecycleState, OutgoingTransaction, PreparedCall, StageEvent, TransactionReceipt,
    TransactionStage, TxHash,
};
use crate::infra::{BountyError, Result, WalletSigner};
use crate::metrics::{metric_names, MetricsRegistry};

/// How long `confirmed` is held before `run` returns
pub const DEFAULT_CONFIRMATION_DELAY: Duration = Duration::from_millis(1500);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Releases the single-flight flag when dropped
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Lifecycle controller for on-chain writes
pub struct TransactionLifecycleController {
    classifier: ErrorClassifier,
    confirmation_delay: Duration,
    state: RwLock<LifecycleState>,
    in_flight: AtomicBool,
    events: broadcast::Sender<StageEvent>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl TransactionLifecycleController {
    pub fn new(classifier: ErrorClassifier) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            classifier,
            confirmation_delay: DEFAULT_CONFIRMATION_DELAY,
            state: RwLock::new(LifecycleState::submitted()),
            in_flight: AtomicBool::new(false),
            events,
            metrics: None,
        }
    }

    pub fn from_config(config: &LifecycleConfig, classifier: ErrorClassifier) -> Self {
        Self::new(classifier).with_confirmation_delay(config.confirmation_delay)
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Stream of stage changes, starting from the next transition
    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.events.subscribe()
    }

    /// Current lifecycle snapshot
    pub async fn state(&self) -> LifecycleState {
        self.state.read().await.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Run one on-chain write.
    ///
    /// Fails with `NotConnected` before any stage is entered when `signer`
    /// is `None`, and with `AlreadyInProgress` while another run is active.
    /// On success the `confirmed` stage is held for the confirmation delay
    /// before returning.
    pub async fn run<F>(
        &self,
        signer: Option<&dyn WalletSigner>,
        build_call: F,
    ) -> std::result::Result<TransactionReceipt, ClassifiedError>
    where
        F: FnOnce() -> PreparedCall + Send,
    {
        self.run_prepared(signer, async move { Ok::<_, BountyError>(build_call()) })
            .await
            .map_err(|err| match err {
                BountyError::Transaction(e) => e,
                other => ClassifiedError::new(other.kind(), other.user_message()),
            })
    }

    /// Run one on-chain write whose call needs async preparation.
    ///
    /// `prepare` runs inside the `submitted` stage and under the
    /// single-flight guard. Its error is returned unchanged and recorded
    /// as the `error` stage.
    pub async fn run_prepared<Fut>(
        &self,
        signer: Option<&dyn WalletSigner>,
        prepare: Fut,
    ) -> Result<TransactionReceipt>
    where
        Fut: Future<Output = Result<PreparedCall>> + Send,
    {
        let Some(signer) = signer else {
            warn!("Transaction requested without a connected wallet");
            return Err(ClassifiedError::not_connected().into());
        };

        let _guard = match self.try_begin() {
            Ok(guard) => guard,
            Err(err) => {
                self.count(metric_names::TX_REJECTED_BUSY).await;
                return Err(err.into());
            }
        };

        let attempt_id = Uuid::new_v4();
        self.reset(attempt_id).await;
        self.count(metric_names::TX_ATTEMPTS).await;

        let outcome = match prepare.await {
            Ok(call) => self
                .drive(attempt_id, signer, call)
                .await
                .map_err(BountyError::from),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(receipt) => {
                self.count(metric_names::TX_CONFIRMED).await;
                Ok(receipt)
            }
            Err(err) => {
                let classified = match &err {
                    BountyError::Transaction(e) => e.clone(),
                    other => ClassifiedError::new(other.kind(), other.user_message()),
                };
                warn!(
                    %attempt_id,
                    kind = %classified.kind,
                    cause = classified.cause.as_deref().unwrap_or(""),
                    "Transaction failed: {}",
                    classified.message
                );
                self.fail(attempt_id, &classified).await;
                self.count(metric_names::TX_FAILED).await;
                self.count(&metric_names::tx_failed_kind(classified.kind.as_str()))
                    .await;
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        attempt_id: Uuid,
        signer: &dyn WalletSigner,
        call: PreparedCall,
    ) -> std::result::Result<TransactionReceipt, ClassifiedError> {
        let from = signer
            .address()
            .await
            .map_err(|e| self.classifier.classify(&e))?;
        let nonce = signer
            .transaction_count(from)
            .await
            .map_err(|e| self.classifier.classify(&e))?;

        let tx = OutgoingTransaction::from_call(call, from, nonce);
        debug!(
            %attempt_id,
            from = %tx.from,
            to = %tx.to,
            value = %tx.value,
            nonce,
            "Sending transaction to wallet"
        );

        let pending = signer
            .send_transaction(tx)
            .await
            .map_err(|e| self.classifier.classify(&e))?;
        let tx_hash = pending.tx_hash();
        info!(%attempt_id, %tx_hash, "Transaction sent");

        self.transition(attempt_id, TransactionStage::Pending, Some(tx_hash), None)
            .await?;

        let broadcast_at = Instant::now();
        let receipt = pending
            .wait()
            .await
            .map_err(|e| self.classifier.classify(&e))?;

        if !receipt.success {
            return Err(ClassifiedError::new(ErrorKind::Network, MSG_REVERTED)
                .with_cause(format!("transaction {tx_hash} reverted")));
        }

        if let Some(metrics) = &self.metrics {
            metrics
                .observe_histogram(
                    metric_names::TX_CONFIRMATION_LATENCY,
                    broadcast_at.elapsed().as_secs_f64(),
                )
                .await;
        }

        self.transition(attempt_id, TransactionStage::Confirmed, Some(tx_hash), None)
            .await?;
        info!(
            %attempt_id,
            %tx_hash,
            block = receipt.block_number.unwrap_or(0),
            "Transaction confirmed"
        );

        tokio::time::sleep(self.confirmation_delay).await;
        Ok(receipt)
    }

    fn try_begin(&self) -> std::result::Result<InFlightGuard<'_>, ClassifiedError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightGuard {
                flag: &self.in_flight,
            })
            .map_err(|_| ClassifiedError::already_in_progress())
    }

    /// Start a fresh attempt at `submitted`, dropping anything left over
    async fn reset(&self, attempt_id: Uuid) {
        *self.state.write().await = LifecycleState::submitted();
        self.emit(attempt_id, TransactionStage::Submitted, None, None);
    }

    async fn transition(
        &self,
        attempt_id: Uuid,
        next: TransactionStage,
        tx_hash: Option<TxHash>,
        message: Option<String>,
    ) -> std::result::Result<(), ClassifiedError> {
        {
            let mut state = self.state.write().await;
            if !state.stage.can_transition_to(next) {
                return Err(ClassifiedError::new(
                    ErrorKind::Unknown,
                    format!("invalid stage transition: {} -> {}", state.stage, next),
                ));
            }
            state.stage = next;
            if tx_hash.is_some() {
                state.tx_hash = tx_hash;
            }
            state.error = message.clone();
        }

        self.emit(attempt_id, next, tx_hash, message);
        Ok(())
    }

    async fn fail(&self, attempt_id: Uuid, err: &ClassifiedError) {
        let tx_hash = self.state.read().await.tx_hash;
        if let Err(e) = self
            .transition(
                attempt_id,
                TransactionStage::Error,
                tx_hash,
                Some(err.message.clone()),
            )
            .await
        {
            warn!(%attempt_id, "Could not record failure: {}", e.message);
        }
    }

    fn emit(
        &self,
        attempt_id: Uuid,
        stage: TransactionStage,
        tx_hash: Option<TxHash>,
        message: Option<String>,
    ) {
        debug!(%attempt_id, %stage, "Lifecycle stage");
        // No subscribers is fine
        let _ = self.events.send(StageEvent {
            attempt_id,
            stage,
            tx_hash,
            message,
            at: Utc::now(),
        });
    }

    async fn count(&self, name: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_counter(name).await;
        }
    }
}

impl Default for TransactionLifecycleController {
    fn default() -> Self {
        Self::new(ErrorClassifier::default())
    }
}
