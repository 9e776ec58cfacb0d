//! On-chain access: contract call encoding and the alloy-backed signer

mod contract;
mod wallet;

pub use contract::{createBountyCall, submitProofCall, BountyBoardContract, ICommunityBountyBoard};
pub use wallet::{connect, provider_error, AlloyWalletSigner};
