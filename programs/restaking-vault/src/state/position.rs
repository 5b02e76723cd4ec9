use anchor_lang::prelude::*;

use crate::errors::VaultError;

/// Per-depositor share position.
///
/// Shares live in program state rather than an SPL mint so that every share
/// movement (deposit, withdraw, transfer, escrow) can adjust the referrer's
/// ledger stake inside the same instruction.
#[account]
#[derive(InitSpace)]
pub struct DepositorPosition {
    /// Vault this position belongs to
    pub vault: Pubkey,

    /// Position owner
    pub owner: Pubkey,

    /// Referrer named at first deposit; fixed for the life of the position.
    /// `Pubkey::default()` means no referrer.
    pub referrer: Pubkey,

    /// Active share balance
    pub shares: u64,

    /// Shares escrowed for a delayed withdrawal
    pub pending_shares: u64,

    /// When the current withdrawal request was made
    pub request_timestamp: i64,

    pub bump: u8,
}

impl DepositorPosition {
    pub fn credit_shares(&mut self, amount: u64) -> Result<()> {
        self.shares = self
            .shares
            .checked_add(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        Ok(())
    }

    pub fn debit_shares(&mut self, amount: u64) -> Result<()> {
        self.shares = self
            .shares
            .checked_sub(amount)
            .ok_or(error!(VaultError::InsufficientShares))?;
        Ok(())
    }

    /// Escrow shares for the delayed withdrawal path. The escrow cannot
    /// exceed the recorded balance at request time.
    pub fn escrow_shares(&mut self, amount: u64, now: i64) -> Result<()> {
        self.debit_shares(amount)?;
        self.pending_shares = self
            .pending_shares
            .checked_add(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        self.request_timestamp = now;
        Ok(())
    }

    /// Release the escrow once matured. Returns the escrowed share count.
    pub fn take_matured_escrow(&mut self, now: i64, delay: i64) -> Result<u64> {
        require!(self.pending_shares > 0, VaultError::NothingPending);
        let ready_at = self
            .request_timestamp
            .checked_add(delay)
            .ok_or(error!(VaultError::MathOverflow))?;
        require!(now >= ready_at, VaultError::WithdrawalNotReady);
        let shares = self.pending_shares;
        self.pending_shares = 0;
        self.request_timestamp = 0;
        Ok(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(shares: u64) -> DepositorPosition {
        DepositorPosition {
            vault: Pubkey::default(),
            owner: Pubkey::default(),
            referrer: Pubkey::default(),
            shares,
            pending_shares: 0,
            request_timestamp: 0,
            bump: 0,
        }
    }

    #[test]
    fn escrow_cannot_exceed_balance() {
        let mut pos = position(100);
        assert!(pos.escrow_shares(101, 0).is_err());
        pos.escrow_shares(100, 50).unwrap();
        assert_eq!(pos.shares, 0);
        assert_eq!(pos.pending_shares, 100);
        assert_eq!(pos.request_timestamp, 50);
    }

    #[test]
    fn escrow_matures_after_delay() {
        let mut pos = position(100);
        pos.escrow_shares(60, 1_000).unwrap();
        // too early
        assert!(pos.take_matured_escrow(1_500, 600).is_err());
        let shares = pos.take_matured_escrow(1_600, 600).unwrap();
        assert_eq!(shares, 60);
        // second fulfillment has nothing pending
        assert!(pos.take_matured_escrow(2_000, 600).is_err());
    }
}
