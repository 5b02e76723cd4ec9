use anchor_lang::prelude::*;

use crate::errors::VaultError;

// EXTERNAL state, belonging to the pooled-staking ledger program.
// The vault deserializes it read-only; fund movements happen through token
// accounts (stake out to the ledger's deposit account, realized unstakes and
// rewards back through the vault's payout accounts). The ledger's own
// `process_pending_actions` crank is caller-external and never invoked here.

/// The ledger's view of the vault's staking position.
#[derive(Clone, Debug, AnchorSerialize, AnchorDeserialize, PartialEq)]
pub struct PooledStakingState {
    pub discriminator: [u8; 8],

    /// Staker identity the ledger tracks (the vault's custody authority)
    pub staker: Pubkey,

    /// Mandatory delay between requesting and realizing an unstake
    pub unstake_lock_seconds: i64,

    /// Max amount the staker could withdraw right now
    pub max_withdrawable: u64,

    /// Reward currently recognized for the staker, not yet delivered
    pub reward_available: u64,

    /// Head of the pending unstake-request list
    pub queue_head: u64,

    /// Id of the most recent unstake request
    pub last_unstake_request_id: u64,

    /// Pending unstake requests, indexed by id. Entry 0 is the null
    /// sentinel; `unstake_at == 0` marks a processed slot.
    pub requests: Vec<UnstakeRequestRef>,
}

/// One entry of the ledger's pending-request list.
#[derive(Clone, Debug, AnchorSerialize, AnchorDeserialize, PartialEq)]
pub struct UnstakeRequestRef {
    pub next: u64,
    pub unstake_at: i64,
}

impl PooledStakingState {
    /// Resolve an opaque hint into the first unprocessed entry of the
    /// pending-request list, walking `next` pointers from the hint. The
    /// resolved cursor bounds the ledger's own iteration cost when it
    /// processes pending actions.
    pub fn resolve_unstake_hint(&self, hint: u64, now: i64) -> Result<u64> {
        require!(hint <= self.last_unstake_request_id, VaultError::InvalidHint);

        let mut cursor = hint;
        // the list is finite; a cursor escaping it means a stale hint
        for _ in 0..=self.requests.len() {
            if cursor == 0 {
                return Ok(0);
            }
            let entry = self
                .requests
                .get(cursor as usize)
                .ok_or(error!(VaultError::InvalidHint))?;
            if entry.unstake_at > now {
                return Ok(cursor);
            }
            cursor = entry.next;
        }
        Err(error!(VaultError::InvalidHint))
    }
}

/// Deserialize the ledger state from an externally-owned account.
pub fn deserialize(account: &AccountInfo) -> Result<PooledStakingState> {
    let mut data_slice: &[u8] = &account.data.borrow();
    PooledStakingState::deserialize(&mut data_slice)
        .map_err(|_| error!(VaultError::ExternalStateInvalid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(requests: Vec<UnstakeRequestRef>) -> PooledStakingState {
        PooledStakingState {
            discriminator: [0; 8],
            staker: Pubkey::default(),
            unstake_lock_seconds: 100,
            max_withdrawable: 0,
            reward_available: 0,
            queue_head: 1,
            last_unstake_request_id: requests.len().saturating_sub(1) as u64,
            requests,
        }
    }

    fn entry(next: u64, unstake_at: i64) -> UnstakeRequestRef {
        UnstakeRequestRef { next, unstake_at }
    }

    #[test]
    fn hint_walks_to_first_unprocessed_entry() {
        // ids 1..=3: 1 and 2 already matured, 3 still locked
        let ledger = ledger(vec![entry(0, 0), entry(2, 10), entry(3, 20), entry(0, 500)]);
        assert_eq!(ledger.resolve_unstake_hint(1, 100).unwrap(), 3);
        assert_eq!(ledger.resolve_unstake_hint(3, 100).unwrap(), 3);
    }

    #[test]
    fn exhausted_list_resolves_to_null() {
        let ledger = ledger(vec![entry(0, 0), entry(2, 10), entry(0, 20)]);
        assert_eq!(ledger.resolve_unstake_hint(1, 100).unwrap(), 0);
    }

    #[test]
    fn hint_beyond_last_request_is_rejected() {
        let ledger = ledger(vec![entry(0, 0), entry(0, 10)]);
        assert!(ledger.resolve_unstake_hint(9, 100).is_err());
    }
}
