//! Wallet signer backed by an alloy HTTP provider and a local private key

use std::sync::Arc;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::{Client, Http};
use alloy::transports::TransportError;
use async_trait::async_trait;
use tracing::debug;

use crate::config::{validate_rpc_url, ChainConfig};
use crate::domain::{Address, OutgoingTransaction, TransactionReceipt, TxHash};
use crate::infra::{BountyError, PendingTransaction, ProviderError, Result, WalletSigner};

/// Convert a transport failure, keeping the JSON-RPC error code when present
pub fn provider_error(err: TransportError) -> ProviderError {
    match err.as_error_resp() {
        Some(payload) => ProviderError::with_code(payload.code, payload.message.to_string()),
        None => ProviderError::new(err.to_string()),
    }
}

/// Connect a signer for `config`
pub fn connect(config: &ChainConfig) -> Result<Arc<dyn WalletSigner>> {
    let signer: PrivateKeySigner = config
        .private_key
        .parse()
        .map_err(|e| BountyError::Configuration(format!("invalid private key: {e}")))?;
    let address = signer.address();

    let url = validate_rpc_url(&config.rpc_url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BountyError::Configuration(format!(
            "wallet signer needs an http(s) RPC URL, got '{}'",
            url.scheme()
        )));
    }

    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);

    Ok(Arc::new(AlloyWalletSigner::new(
        provider,
        address,
        config.chain_id,
    )))
}

/// [`WalletSigner`] over any alloy provider that can sign for `address`
pub struct AlloyWalletSigner<P> {
    provider: Arc<P>,
    address: Address,
    chain_id: u64,
}

impl<P> AlloyWalletSigner<P>
where
    P: Provider<Http<Client>> + 'static,
{
    pub fn new(provider: P, address: Address, chain_id: u64) -> Self {
        Self {
            provider: Arc::new(provider),
            address,
            chain_id,
        }
    }
}

#[async_trait]
impl<P> WalletSigner for AlloyWalletSigner<P>
where
    P: Provider<Http<Client>> + Send + Sync + 'static,
{
    async fn address(&self) -> std::result::Result<Address, ProviderError> {
        Ok(self.address)
    }

    async fn transaction_count(
        &self,
        address: Address,
    ) -> std::result::Result<u64, ProviderError> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(provider_error)
    }

    async fn send_transaction(
        &self,
        tx: OutgoingTransaction,
    ) -> std::result::Result<Box<dyn PendingTransaction>, ProviderError> {
        let request = TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_input(tx.data)
            .with_value(tx.value)
            .with_nonce(tx.nonce)
            .with_chain_id(self.chain_id);

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(provider_error)?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "Transaction broadcast");

        Ok(Box::new(AlloyPendingTransaction {
            provider: self.provider.clone(),
            tx_hash,
        }))
    }
}

struct AlloyPendingTransaction<P> {
    provider: Arc<P>,
    tx_hash: TxHash,
}

#[async_trait]
impl<P> PendingTransaction for AlloyPendingTransaction<P>
where
    P: Provider<Http<Client>> + Send + Sync + 'static,
{
    fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    async fn wait(&self) -> std::result::Result<TransactionReceipt, ProviderError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root(), self.tx_hash)
            .get_receipt()
            .await
            .map_err(|e| ProviderError::new(e.to_string()))?;

        Ok(TransactionReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
        })
    }
}
