//! Bounty board contract bindings
//!
//! Encodes `createBounty` and `submitProof` calls. Encoding is pure; nothing
//! here talks to the network.

use alloy::sol;
use alloy::sol_types::SolCall;

use crate::domain::{Address, BountyId, ContentId, PreparedCall, ValidatedBounty, U256};

sol! {
    interface ICommunityBountyBoard {
        function createBounty(
            string title,
            string description,
            string requirements,
            uint256 reward,
            uint256 deadline
        ) external payable;

        function submitProof(uint256 bountyId, string proofCid) external;
    }
}

pub use ICommunityBountyBoard::{createBountyCall, submitProofCall};

/// Call encoder for one deployed bounty board
#[derive(Debug, Clone, Copy)]
pub struct BountyBoardContract {
    address: Address,
}

impl BountyBoardContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `createBounty`, paying the reward as the transaction value
    pub fn create_bounty(&self, bounty: &ValidatedBounty) -> PreparedCall {
        let call = createBountyCall {
            title: bounty.title.clone(),
            description: bounty.description.clone(),
            requirements: bounty.requirements.clone(),
            reward: bounty.reward_wei,
            deadline: U256::from(bounty.deadline),
        };

        PreparedCall {
            to: self.address,
            data: call.abi_encode().into(),
            value: bounty.reward_wei,
        }
    }

    /// `submitProof` referencing the bare metadata identifier
    pub fn submit_proof(&self, bounty_id: BountyId, proof: &ContentId) -> PreparedCall {
        let call = submitProofCall {
            bountyId: U256::from(bounty_id.as_u64()),
            proofCid: proof.as_str().to_string(),
        };

        PreparedCall {
            to: self.address,
            data: call.abi_encode().into(),
            value: U256::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounty() -> ValidatedBounty {
        ValidatedBounty {
            title: "Fix bug".to_string(),
            description: "Crash on start".to_string(),
            requirements: "Send a PR".to_string(),
            reward_wei: U256::from(500_000_000_000_000_000u64),
            deadline: 1_894_751_940,
        }
    }

    #[test]
    fn test_create_bounty_encoding() {
        let contract = BountyBoardContract::new(Address::repeat_byte(0x42));
        let call = contract.create_bounty(&bounty());

        assert_eq!(call.to, Address::repeat_byte(0x42));
        assert_eq!(call.value, U256::from(500_000_000_000_000_000u64));
        assert_eq!(&call.data[..4], createBountyCall::SELECTOR.as_slice());

        let decoded = createBountyCall::abi_decode(&call.data, true).unwrap();
        assert_eq!(decoded.title, "Fix bug");
        assert_eq!(decoded.requirements, "Send a PR");
        assert_eq!(decoded.reward, call.value);
        assert_eq!(decoded.deadline, U256::from(1_894_751_940u64));
    }

    #[test]
    fn test_submit_proof_encoding() {
        let contract = BountyBoardContract::new(Address::repeat_byte(0x42));
        let cid = ContentId::from_storage_reference("ipfs://QmMeta").unwrap();
        let call = contract.submit_proof(BountyId(12), &cid);

        assert_eq!(call.value, U256::ZERO);
        let decoded = submitProofCall::abi_decode(&call.data, true).unwrap();
        assert_eq!(decoded.bountyId, U256::from(12u64));
        assert_eq!(decoded.proofCid, "QmMeta");
    }
}
