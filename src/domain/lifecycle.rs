//! Transaction lifecycle stages
//!
//! Stages progress linearly: `submitted -> pending -> confirmed`, with
//! `error` reachable from any non-terminal stage. There are no backward
//! edges; a new attempt starts over from `submitted` through a reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::TxHash;

/// One phase of an on-chain write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStage {
    /// Call built and handed to the signer
    Submitted,
    /// Broadcast; waiting for the network
    Pending,
    /// Receipt received
    Confirmed,
    /// Failed; terminal for the attempt
    Error,
}

impl TransactionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStage::Submitted => "submitted",
            TransactionStage::Pending => "pending",
            TransactionStage::Confirmed => "confirmed",
            TransactionStage::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStage::Confirmed | TransactionStage::Error)
    }

    /// Whether `self -> next` is an edge of the lifecycle
    pub fn can_transition_to(&self, next: TransactionStage) -> bool {
        matches!(
            (self, next),
            (TransactionStage::Submitted, TransactionStage::Pending)
                | (TransactionStage::Pending, TransactionStage::Confirmed)
                | (TransactionStage::Submitted, TransactionStage::Error)
                | (TransactionStage::Pending, TransactionStage::Error)
        )
    }
}

impl fmt::Display for TransactionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the lifecycle for one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleState {
    pub stage: TransactionStage,
    /// Set once the signer has broadcast the transaction
    pub tx_hash: Option<TxHash>,
    /// User-facing message, only present in `error`
    pub error: Option<String>,
}

impl LifecycleState {
    pub fn submitted() -> Self {
        Self {
            stage: TransactionStage::Submitted,
            tx_hash: None,
            error: None,
        }
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::submitted()
    }
}

/// Notification broadcast on every stage change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEvent {
    /// Identifies the `run` invocation the event belongs to
    pub attempt_id: Uuid,
    pub stage: TransactionStage,
    pub tx_hash: Option<TxHash>,
    pub message: Option<String>,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_edges_only() {
        use TransactionStage::*;

        assert!(Submitted.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Submitted.can_transition_to(Error));
        assert!(Pending.can_transition_to(Error));

        assert!(!Submitted.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(Submitted));
        assert!(!Confirmed.can_transition_to(Error));
        assert!(!Error.can_transition_to(Submitted));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_stages() {
        assert!(TransactionStage::Confirmed.is_terminal());
        assert!(TransactionStage::Error.is_terminal());
        assert!(!TransactionStage::Pending.is_terminal());
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionStage::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
