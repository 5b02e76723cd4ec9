use anchor_lang::prelude::*;

use crate::errors::VaultError;

// EXTERNAL state, belonging to the claims registry program.

/// Lifecycle of an external claim as the registry reports it.
#[derive(Clone, Copy, Debug, AnchorSerialize, AnchorDeserialize, PartialEq, Eq)]
pub enum ClaimStatus {
    Pending,
    Denied,
    Payable,
    Paid,
}

/// One claim record, deserialized read-only from the claims registry.
#[derive(Clone, Debug, AnchorSerialize, AnchorDeserialize, PartialEq)]
pub struct ClaimRecord {
    pub discriminator: [u8; 8],
    pub claim_id: u64,
    pub status: ClaimStatus,
    pub date: i64,
}

impl ClaimRecord {
    pub fn is_payable(&self) -> bool {
        self.status == ClaimStatus::Payable
    }

    /// Whether the claim date falls inside the recency window ending at
    /// `now`.
    pub fn is_recent(&self, now: i64, window: i64) -> bool {
        now.saturating_sub(self.date) <= window
    }
}

/// Deserialize a claim record from an externally-owned account.
pub fn deserialize(account: &AccountInfo) -> Result<ClaimRecord> {
    let mut data_slice: &[u8] = &account.data.borrow();
    ClaimRecord::deserialize(&mut data_slice).map_err(|_| error!(VaultError::ExternalStateInvalid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payable_and_recent_qualify() {
        let record = ClaimRecord {
            discriminator: [0; 8],
            claim_id: 1,
            status: ClaimStatus::Payable,
            date: 900,
        };
        assert!(record.is_payable());
        assert!(record.is_recent(1_000, 200));
        assert!(!record.is_recent(2_000, 200));
    }

    #[test]
    fn non_payable_statuses_do_not_qualify() {
        for status in [ClaimStatus::Pending, ClaimStatus::Denied, ClaimStatus::Paid] {
            let record = ClaimRecord {
                discriminator: [0; 8],
                claim_id: 1,
                status,
                date: 0,
            };
            assert!(!record.is_payable());
        }
    }
}
