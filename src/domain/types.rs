//! Core type definitions for the bounty board client

use serde::{Deserialize, Serialize};
use std::fmt;

pub use alloy::primitives::{Address, Bytes, TxHash, U256};

/// URI scheme marker some storage backends prepend to identifiers
pub const IPFS_SCHEME: &str = "ipfs://";

/// On-chain bounty identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BountyId(pub u64);

impl BountyId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BountyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BountyId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Bare content identifier, never carrying a URI scheme.
///
/// This is the form stored on-chain; the scheme is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Normalize an identifier or URI returned by storage.
    ///
    /// Strips an `ipfs://` prefix and surrounding slashes/whitespace.
    /// Returns `None` when nothing is left.
    pub fn from_storage_reference(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix(IPFS_SCHEME).unwrap_or(trimmed);
        let bare = bare.trim_matches('/');
        if bare.is_empty() {
            None
        } else {
            Some(Self(bare.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully encoded contract call, ready to be turned into a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    /// Contract address
    pub to: Address,
    /// ABI-encoded call data
    pub data: Bytes,
    /// Native value attached to the call (wei)
    pub value: U256,
}

/// Transaction handed to the signer for approval and broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingTransaction {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub nonce: u64,
}

impl OutgoingTransaction {
    pub fn from_call(call: PreparedCall, from: Address, nonce: u64) -> Self {
        Self {
            from,
            to: call.to,
            data: call.data,
            value: call.value,
            nonce,
        }
    }
}

/// Confirmation record for a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Execution status; `false` means the transaction reverted
    pub success: bool,
}
