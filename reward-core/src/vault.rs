//! In-memory model of the on-chain vault's claim check.
//!
//! The deployed contract is the authority; this mirrors its rules so the
//! signer can be tested against the exact verification it must satisfy.

use std::collections::HashSet;

use crate::address::Address;
use crate::attestation::{recover_signer_canonical, AttestationPayload, Signature};
use crate::error::VaultError;
use crate::nonce::Nonce;

#[derive(Debug, Clone)]
pub struct RewardVault {
    address: Address,
    chain_id: u64,
    oracle: Address,
    balance: u128,
    used_nonces: HashSet<Nonce>,
}

impl RewardVault {
    pub fn new(address: Address, chain_id: u64, oracle: Address, balance: u128) -> Self {
        Self {
            address,
            chain_id,
            oracle,
            balance,
            used_nonces: HashSet::new(),
        }
    }

    pub fn balance(&self) -> u128 {
        self.balance
    }

    pub fn is_nonce_used(&self, nonce: &Nonce) -> bool {
        self.used_nonces.contains(nonce)
    }

    /// Pays `reward_amount` to `sender` when the attestation recovers to the
    /// oracle (with `v` in {27, 28} and low `s`), the nonce is fresh and the
    /// balance covers it. Any failure leaves
    /// the vault untouched.
    pub fn claim_reward(
        &mut self,
        sender: Address,
        quest_id: &str,
        reward_amount: u128,
        nonce: Nonce,
        signature: &Signature,
    ) -> Result<u128, VaultError> {
        let payload = AttestationPayload {
            vault: self.address,
            chain_id: self.chain_id,
            user: sender,
            quest_id: quest_id.to_string(),
            reward_amount,
            nonce,
        };
        let signer = recover_signer_canonical(payload.signing_digest(), signature)
            .map_err(|_| VaultError::InvalidSigner)?;
        if signer != self.oracle {
            return Err(VaultError::InvalidSigner);
        }
        if self.used_nonces.contains(&nonce) {
            return Err(VaultError::NonceAlreadyUsed);
        }
        if reward_amount > self.balance {
            return Err(VaultError::InsufficientBalance {
                requested: reward_amount,
                available: self.balance,
            });
        }

        self.used_nonces.insert(nonce);
        self.balance -= reward_amount;
        Ok(reward_amount)
    }
}
