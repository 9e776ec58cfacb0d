//! Collaborator traits for the bounty board client
//!
//! The core depends only on these narrow capabilities; the wallet, the
//! chain and the storage service stay opaque behind them.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{
    Address, AttachedFile, OutgoingTransaction, StoredFile, TransactionReceipt, TxHash,
};

use super::{ProviderError, StorageError};

/// Signer handle bound to one account.
///
/// Approves and broadcasts transactions on behalf of that account.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Address of the bound account
    async fn address(&self) -> Result<Address, ProviderError>;

    /// Next nonce for `address`
    async fn transaction_count(&self, address: Address) -> Result<u64, ProviderError>;

    /// Ask the wallet to approve and broadcast `tx`
    ///
    /// Returns once the transaction has been broadcast, not mined.
    async fn send_transaction(
        &self,
        tx: OutgoingTransaction,
    ) -> Result<Box<dyn PendingTransaction>, ProviderError>;
}

/// A broadcast transaction awaiting inclusion
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PendingTransaction: Send + Sync {
    fn tx_hash(&self) -> TxHash;

    /// Wait until the network returns a receipt.
    ///
    /// There is no timeout.
    async fn wait(&self) -> Result<TransactionReceipt, ProviderError>;
}

/// Content-addressed storage (a pinning service in production)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store one binary artifact
    async fn upload_file(&self, file: &AttachedFile) -> Result<StoredFile, StorageError>;

    /// Store a JSON document, returning its identifier or an `ipfs://` URI
    async fn upload_json(
        &self,
        name: &str,
        document: &serde_json::Value,
    ) -> Result<String, StorageError>;
}

/// Persisted key-value preferences
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> super::Result<()>;

    async fn get(&self, key: &str) -> super::Result<Option<String>>;
}
