//! Bounty Board Client Library
//!
//! Creates bounties and submits proofs of completion against an on-chain
//! bounty board. Proof artifacts go to content-addressed storage first and
//! only the metadata identifier is recorded on-chain.
//!
//! ## Modules
//!
//! - [`domain`] - Drafts, proof submissions, identifiers and lifecycle stages
//! - [`lifecycle`] - Transaction lifecycle controller and error classification
//! - [`packaging`] - Proof packaging pipeline
//! - [`flows`] - Create-bounty and submit-proof flows
//! - [`chain`] - Contract call encoding and the alloy wallet signer
//! - [`storage`] - Pinata and in-memory content stores
//! - [`preferences`] - Persisted user preferences
//! - [`infra`] - Errors, collaborator traits and retry
//! - [`config`] - Environment configuration
//! - [`metrics`] - In-process counters and histograms
//! - [`telemetry`] - Logging setup

pub mod chain;
pub mod config;
pub mod domain;
pub mod flows;
pub mod infra;
pub mod lifecycle;
pub mod metrics;
pub mod packaging;
pub mod preferences;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use domain::{
    AttachedFile, BountyDraft, BountyId, ContentId, LifecycleState, PreparedCall, ProofMetadata,
    ProofSubmission, StageEvent, TransactionReceipt, TransactionStage, ValidatedBounty,
};

pub use infra::{
    BountyError, ContentStore, PackagingError, PendingTransaction, PreferenceStore, ProviderError,
    Result, StorageError, ValidationError, WalletSigner,
};

pub use lifecycle::{ClassifiedError, ErrorClassifier, ErrorKind, TransactionLifecycleController};
