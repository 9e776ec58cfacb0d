//! Common fakes and fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use bounty_board::domain::{Address, OutgoingTransaction, StoredFile, TxHash};
use bounty_board::{
    AttachedFile, ContentStore, PendingTransaction, ProviderError, StorageError,
    TransactionReceipt, WalletSigner,
};

/// Account the fake signer signs for
pub fn test_account() -> Address {
    Address::repeat_byte(0xa1)
}

/// Deployed bounty board address used by the flows
pub fn test_contract() -> Address {
    Address::repeat_byte(0xb0)
}

/// What the fake signer does with the next transaction
#[derive(Debug, Clone)]
pub enum Outcome {
    Confirm,
    Revert,
    RejectSend(ProviderError),
    FailWait(ProviderError),
}

/// Wallet signer that records what it is asked to send
pub struct FakeSigner {
    address: Address,
    nonce: AtomicU64,
    outcome: Mutex<Outcome>,
    gate: Option<Arc<Notify>>,
    sent: Mutex<Vec<OutgoingTransaction>>,
}

impl FakeSigner {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            address: test_account(),
            nonce: AtomicU64::new(0),
            outcome: Mutex::new(outcome),
            gate: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn confirming() -> Self {
        Self::new(Outcome::Confirm)
    }

    pub fn rejecting() -> Self {
        Self::new(Outcome::RejectSend(ProviderError::with_code(
            4001,
            "MetaMask Tx Signature: User denied transaction signature.",
        )))
    }

    /// Hold every confirmation until `gate` is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn sent(&self) -> Vec<OutgoingTransaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSigner for FakeSigner {
    async fn address(&self) -> Result<Address, ProviderError> {
        Ok(self.address)
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64, ProviderError> {
        Ok(self.nonce.load(Ordering::SeqCst))
    }

    async fn send_transaction(
        &self,
        tx: OutgoingTransaction,
    ) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        let outcome = self.outcome.lock().unwrap().clone();
        if let Outcome::RejectSend(err) = outcome {
            return Err(err);
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(tx);
        Ok(Box::new(FakePending {
            hash: TxHash::repeat_byte(0x40 + nonce as u8),
            outcome,
            gate: self.gate.clone(),
        }))
    }
}

struct FakePending {
    hash: TxHash,
    outcome: Outcome,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl PendingTransaction for FakePending {
    fn tx_hash(&self) -> TxHash {
        self.hash
    }

    async fn wait(&self) -> Result<TransactionReceipt, ProviderError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.outcome {
            Outcome::FailWait(err) => Err(err.clone()),
            outcome => Ok(TransactionReceipt {
                tx_hash: self.hash,
                block_number: Some(100),
                success: !matches!(outcome, Outcome::Revert),
            }),
        }
    }
}

/// Content store that records uploads and can fail a named file
#[derive(Default)]
pub struct FakeContentStore {
    fail_file: Option<String>,
    files: Mutex<Vec<String>>,
    documents: Mutex<Vec<(String, serde_json::Value)>>,
}

impl FakeContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the upload of the file called `name`
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_file: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn uploaded_files(&self) -> Vec<String> {
        self.files.lock().unwrap().clone()
    }

    pub fn documents(&self) -> Vec<(String, serde_json::Value)> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentStore for FakeContentStore {
    async fn upload_file(&self, file: &AttachedFile) -> Result<StoredFile, StorageError> {
        if self.fail_file.as_deref() == Some(file.name.as_str()) {
            return Err(StorageError::Status {
                status: 500,
                body: "pinning failed".to_string(),
            });
        }
        self.files.lock().unwrap().push(file.name.clone());
        let cid = format!("QmFile{}", file.name.replace('.', ""));
        Ok(StoredFile {
            url: format!("https://gateway.test/ipfs/{cid}"),
            cid,
        })
    }

    async fn upload_json(
        &self,
        name: &str,
        document: &serde_json::Value,
    ) -> Result<String, StorageError> {
        let mut documents = self.documents.lock().unwrap();
        documents.push((name.to_string(), document.clone()));
        Ok(format!("ipfs://QmMetadata{}", documents.len()))
    }
}

/// Wait until `check` holds, yielding to other tasks in between
pub async fn until(check: impl Fn() -> bool) {
    while !check() {
        tokio::task::yield_now().await;
    }
}
