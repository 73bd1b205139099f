use chrono::{DateTime, Utc};
use reward_core::{
    AttestationPayload, ClaimRequest, CompletionSession, CooldownActive, Nonce, Signature,
};

use crate::{AppState, IssueOutcome};

/// What the client submits to the vault's claim entrypoint.
#[derive(Debug, Clone)]
pub(crate) struct IssuedReward {
    pub(crate) signature: Signature,
    pub(crate) reward_amount_wei: u128,
    pub(crate) nonce: Nonce,
    pub(crate) quest_id: String,
}

#[derive(Debug)]
pub(crate) enum ClaimError {
    Cooldown(CooldownActive),
    Internal(String),
}

/// Checks the cooldown, draws a nonce, signs the attestation and records the
/// session. The session row is written only after a signature exists; any
/// failure before that leaves the ledger untouched.
///
/// Blocking: call from the blocking pool.
pub(crate) fn issue_reward(
    state: &AppState,
    request: ClaimRequest,
    now: DateTime<Utc>,
) -> Result<IssuedReward, ClaimError> {
    let outcome = state
        .sessions
        .issue_once(&request.wallet, &request.quest_id, now, || {
            let reward_amount_wei = state.catalog.reward_for(&request.quest_id);
            let nonce = Nonce::generate().map_err(|err| err.to_string())?;

            let payload = AttestationPayload {
                vault: state.vault.address,
                chain_id: state.vault.chain_id,
                user: request.wallet,
                quest_id: request.quest_id.clone(),
                reward_amount: reward_amount_wei,
                nonce,
            };
            let signature = state.signer.sign(&payload);

            let session = CompletionSession::completed(
                request.wallet,
                request.quest_id.as_str(),
                request.duration_seconds,
                request.move_count,
                reward_amount_wei,
                now,
            );

            Ok((
                IssuedReward {
                    signature,
                    reward_amount_wei,
                    nonce,
                    quest_id: request.quest_id.clone(),
                },
                session,
            ))
        })
        .map_err(ClaimError::Internal)?;

    match outcome {
        IssueOutcome::Issued(issued) => Ok(issued),
        IssueOutcome::Cooldown(active) => Err(ClaimError::Cooldown(active)),
    }
}
