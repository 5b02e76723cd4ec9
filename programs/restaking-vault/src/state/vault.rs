use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;
use crate::state::stream::RewardStream;

/// Global vault state: share accounting, staking mirrors, timers.
///
/// Security considerations:
/// - Authority and operator stored in state, never taken from args
/// - All balances tracked with checked math, widened to u128
/// - Bumps stored for efficient PDA signing
#[account]
#[derive(InitSpace)]
pub struct VaultState {
    /// Owner role: registry changes, config changes, remediation calls
    pub authority: Pubkey,

    /// Operator role: allowed to run the periodic restake
    pub operator: Pubkey,

    /// Mint of the wrapped deposit token
    pub asset_mint: Pubkey,

    /// Mint of the raw governance token, accepted 1:1 as the wrapped asset
    pub raw_mint: Pubkey,

    /// External pooled-staking ledger program
    pub staking_ledger: Pubkey,

    /// External claims registry program
    pub claims_program: Pubkey,

    /// Total shares issued across all depositor positions
    pub total_shares: u64,

    /// Deposit-token balance held in custody (idle, not staked)
    pub idle_balance: u64,

    /// Amount currently out on stake at the external ledger, mirrored here.
    /// Includes amounts pending unstake until they are realized.
    pub total_staked: u64,

    /// Portion of `total_staked` with an open unstake request
    pub total_pending_unstake: u64,

    /// Buffer held back from staking to serve withdrawals
    pub reserve_amount: u64,

    /// Fee retained by the vault on withdrawal payouts, in basis points
    pub withdraw_fee_bps: u16,

    /// Share of each newly pulled reward forwarded to the referral ledger
    pub referral_cut_bps: u16,

    /// Seconds a withdrawal request must age before fulfillment
    pub withdraw_delay: i64,

    /// Length of a claim-triggered pause window
    pub pause_duration: i64,

    /// How recent a claim date must be to qualify for pausing
    pub claim_recency_window: i64,

    /// Immediate withdrawals revert while `now < paused_until`
    pub paused_until: i64,

    /// Minimum seconds between operator restakes
    pub min_restake_interval: i64,

    /// Last time a restake pass ran (operator or owner)
    pub last_restake_time: i64,

    /// Linear release state for the last pulled reward
    pub reward_stream: RewardStream,

    pub bump: u8,
    pub authority_bump: u8,
    pub payout_bump: u8,

    pub _reserved: [u8; 64],
}

impl VaultState {
    /// Total value the vault considers itself to hold: idle custody plus the
    /// staked mirror, minus the unreleased portion of the reward stream.
    ///
    /// Funds returning from the ledger move from `total_staked` to
    /// `idle_balance` in the same instruction, so no call boundary can
    /// observe them counted twice.
    pub fn aum(&self, now: i64) -> Result<u64> {
        let gross = self
            .idle_balance
            .checked_add(self.total_staked)
            .ok_or(error!(VaultError::MathOverflow))?;
        gross
            .checked_sub(self.reward_stream.unreleased(now)?)
            .ok_or(error!(VaultError::MathOverflow))
    }

    /// Released portion of the last pulled reward at `now`.
    pub fn current_reward(&self, now: i64) -> Result<u64> {
        self.reward_stream.released(now)
    }

    /// Shares to mint for a deposit of `assets`.
    ///
    /// First deposit mints 1:1; afterwards
    /// `shares = assets * total_shares / aum`, u128 intermediates.
    pub fn calculate_shares(&self, assets: u64, now: i64) -> Result<u64> {
        let aum = self.aum(now)?;
        if self.total_shares == 0 || aum == 0 {
            return Ok(assets);
        }

        let shares = (assets as u128)
            .checked_mul(self.total_shares as u128)
            .ok_or(error!(VaultError::MathOverflow))?
            .checked_div(aum as u128)
            .ok_or(error!(VaultError::DivisionByZero))?;

        u64::try_from(shares).map_err(|_| error!(VaultError::MathOverflow))
    }

    /// Asset value of `shares`: `shares * aum / total_shares`.
    pub fn calculate_assets(&self, shares: u64, now: i64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(0);
        }

        let assets = (shares as u128)
            .checked_mul(self.aum(now)? as u128)
            .ok_or(error!(VaultError::MathOverflow))?
            .checked_div(self.total_shares as u128)
            .ok_or(error!(VaultError::DivisionByZero))?;

        u64::try_from(assets).map_err(|_| error!(VaultError::MathOverflow))
    }

    /// Fee retained by the vault on a payout of `amount`.
    pub fn withdrawal_fee(&self, amount: u64) -> Result<u64> {
        let fee = (amount as u128)
            .checked_mul(self.withdraw_fee_bps as u128)
            .ok_or(error!(VaultError::MathOverflow))?
            / BASIS_POINTS as u128;
        u64::try_from(fee).map_err(|_| error!(VaultError::MathOverflow))
    }

    /// Whether an active pause window blocks immediate withdrawals.
    pub fn is_paused(&self, now: i64) -> bool {
        now < self.paused_until
    }

    /// Arm a new pause window. Re-arming while a window is active is
    /// rejected so repeated calls cannot extend the pause indefinitely.
    pub fn arm_pause(&mut self, now: i64) -> Result<i64> {
        require!(!self.is_paused(now), VaultError::AlreadyPaused);
        self.paused_until = now
            .checked_add(self.pause_duration)
            .ok_or(error!(VaultError::MathOverflow))?;
        Ok(self.paused_until)
    }

    /// Idle balance available for staking after holding back the reserve.
    /// Shortfalls stake zero rather than underflowing.
    pub fn free_stake_balance(&self) -> u64 {
        self.idle_balance.saturating_sub(self.reserve_amount)
    }

    pub fn credit_idle(&mut self, amount: u64) -> Result<()> {
        self.idle_balance = self
            .idle_balance
            .checked_add(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        Ok(())
    }

    pub fn debit_idle(&mut self, amount: u64) -> Result<()> {
        self.idle_balance = self
            .idle_balance
            .checked_sub(amount)
            .ok_or(error!(VaultError::InsufficientLiquidity))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_vault(idle: u64, staked: u64, total_shares: u64) -> VaultState {
        VaultState {
            authority: Pubkey::default(),
            operator: Pubkey::default(),
            asset_mint: Pubkey::default(),
            raw_mint: Pubkey::default(),
            staking_ledger: Pubkey::default(),
            claims_program: Pubkey::default(),
            total_shares,
            idle_balance: idle,
            total_staked: staked,
            total_pending_unstake: 0,
            reserve_amount: 0,
            withdraw_fee_bps: 0,
            referral_cut_bps: DEFAULT_REFERRAL_CUT_BPS,
            withdraw_delay: 0,
            pause_duration: 600,
            claim_recency_window: 0,
            paused_until: 0,
            min_restake_interval: 0,
            last_restake_time: 0,
            reward_stream: RewardStream::default(),
            bump: 0,
            authority_bump: 0,
            payout_bump: 0,
            _reserved: [0; 64],
        }
    }

    #[test]
    fn first_deposit_mints_one_to_one() {
        let vault = mock_vault(0, 0, 0);
        assert_eq!(vault.calculate_shares(1000, 0).unwrap(), 1000);
    }

    #[test]
    fn deposit_with_profit_mints_proportionally() {
        // 2000 AUM backing 1000 shares
        let vault = mock_vault(500, 1500, 1000);
        assert_eq!(vault.calculate_shares(500, 0).unwrap(), 250);
        assert_eq!(vault.calculate_assets(500, 0).unwrap(), 1000);
    }

    #[test]
    fn aum_counts_idle_and_staked_once() {
        let vault = mock_vault(300, 700, 1000);
        assert_eq!(vault.aum(0).unwrap(), 1000);
    }

    #[test]
    fn aum_excludes_unreleased_stream() {
        let mut vault = mock_vault(1000, 1000, 1000);
        vault.reward_stream = RewardStream {
            last_reward_amount: 900,
            last_reward_timestamp: 0,
            stream_duration: 900,
        };
        // stream just started: the whole lump is excluded
        assert_eq!(vault.aum(0).unwrap(), 1100);
        // a third of the way: 300 released
        assert_eq!(vault.aum(300).unwrap(), 1400);
        // fully released
        assert_eq!(vault.aum(900).unwrap(), 2000);
    }

    #[test]
    fn withdrawal_fee_in_basis_points() {
        let mut vault = mock_vault(0, 0, 0);
        vault.withdraw_fee_bps = 250;
        assert_eq!(vault.withdrawal_fee(10_000).unwrap(), 250);
        assert_eq!(vault.withdrawal_fee(0).unwrap(), 0);
    }

    #[test]
    fn pause_window_arms_once() {
        let mut vault = mock_vault(0, 0, 0);
        assert_eq!(vault.arm_pause(100).unwrap(), 700);
        assert!(vault.is_paused(699));
        // re-arming while active is rejected
        assert!(vault.arm_pause(500).is_err());
        // expires implicitly, then re-arms
        assert!(!vault.is_paused(700));
        assert_eq!(vault.arm_pause(700).unwrap(), 1300);
    }

    #[test]
    fn free_stake_balance_saturates_at_reserve() {
        let mut vault = mock_vault(100, 0, 0);
        vault.reserve_amount = 250;
        assert_eq!(vault.free_stake_balance(), 0);
        vault.idle_balance = 1000;
        assert_eq!(vault.free_stake_balance(), 750);
    }
}
