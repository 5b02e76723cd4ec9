use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;

/// Payout mode of the referral ledger, fixed at initialization.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardAsset {
    /// Rewards paid in a designated SPL token
    Token,
    /// Rewards paid in native lamports held by the ledger PDA
    Native,
}

/// Stake-weighted reward-accrual ledger keyed by referrer.
///
/// Standard reward-per-token-stored design: the global accumulator advances
/// lazily on every touch, each account settles against it before its stake
/// changes. `reward_per_token_stored` is monotonic non-decreasing.
///
/// Within this program the vault is the stake controller: deposit, withdraw
/// and share-transfer handlers adjust referral stake in the same instruction
/// as the share movement they mirror.
#[account]
#[derive(InitSpace)]
pub struct ReferralLedger {
    /// Vault acting as stake controller
    pub vault: Pubkey,

    /// Reward mint when `reward_asset` is `Token`; default pubkey otherwise
    pub reward_mint: Pubkey,

    /// Payout mode, permanent after initialization
    pub reward_asset: RewardAsset,

    /// Sum of all referrer stakes
    pub total_staked: u64,

    /// Reward released per second, scaled by `REWARD_PRECISION`
    pub reward_rate: u128,

    /// Length of a distribution period in seconds
    pub reward_duration: i64,

    /// When the current distribution period ends
    pub period_finish: i64,

    /// Last time the global accumulator advanced
    pub last_update_time: i64,

    /// Global accumulator, scaled by `REWARD_PRECISION`
    pub reward_per_token_stored: u128,

    pub bump: u8,
}

/// Per-referrer accrual account, created lazily on first referred deposit.
#[account]
#[derive(InitSpace)]
pub struct ReferralAccount {
    pub ledger: Pubkey,
    pub referrer: Pubkey,

    /// Combined active share balance of depositors naming this referrer
    pub staked: u64,

    /// Accumulator value this account last settled against
    pub reward_per_token_paid: u128,

    /// Settled, unclaimed reward
    pub accrued_reward: u64,

    pub bump: u8,
}

impl ReferralLedger {
    fn last_time_reward_applicable(&self, now: i64) -> i64 {
        now.min(self.period_finish)
    }

    /// Current value of the global accumulator at `now`.
    pub fn reward_per_token(&self, now: i64) -> Result<u128> {
        if self.total_staked == 0 {
            return Ok(self.reward_per_token_stored);
        }
        let elapsed = self
            .last_time_reward_applicable(now)
            .saturating_sub(self.last_update_time)
            .max(0) as u128;
        let accrued = elapsed
            .checked_mul(self.reward_rate)
            .ok_or(error!(VaultError::MathOverflow))?
            .checked_div(self.total_staked as u128)
            .ok_or(error!(VaultError::DivisionByZero))?;
        self.reward_per_token_stored
            .checked_add(accrued)
            .ok_or(error!(VaultError::MathOverflow))
    }

    /// Reward earned by `account` at `now`, settled plus unsettled.
    pub fn earned(&self, account: &ReferralAccount, now: i64) -> Result<u64> {
        let rpt = self.reward_per_token(now)?;
        let delta = rpt
            .checked_sub(account.reward_per_token_paid)
            .ok_or(error!(VaultError::MathOverflow))?;
        let unsettled = (account.staked as u128)
            .checked_mul(delta)
            .ok_or(error!(VaultError::MathOverflow))?
            / REWARD_PRECISION;
        let unsettled = u64::try_from(unsettled).map_err(|_| error!(VaultError::MathOverflow))?;
        account
            .accrued_reward
            .checked_add(unsettled)
            .ok_or(error!(VaultError::MathOverflow))
    }

    /// Advance the global accumulator to `now`.
    pub fn settle_global(&mut self, now: i64) -> Result<()> {
        self.reward_per_token_stored = self.reward_per_token(now)?;
        self.last_update_time = self.last_time_reward_applicable(now);
        Ok(())
    }

    /// Advance the accumulator and settle `account` against it. Always runs
    /// before the account's stake changes.
    pub fn settle(&mut self, account: &mut ReferralAccount, now: i64) -> Result<()> {
        self.settle_global(now)?;
        account.accrued_reward = self.earned(account, now)?;
        account.reward_per_token_paid = self.reward_per_token_stored;
        Ok(())
    }

    /// Credit referred stake to `account`.
    pub fn stake(&mut self, account: &mut ReferralAccount, amount: u64, now: i64) -> Result<()> {
        self.settle(account, now)?;
        account.staked = account
            .staked
            .checked_add(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        self.total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        Ok(())
    }

    /// Remove referred stake from `account`.
    pub fn withdraw(&mut self, account: &mut ReferralAccount, amount: u64, now: i64) -> Result<()> {
        self.settle(account, now)?;
        account.staked = account
            .staked
            .checked_sub(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        self.total_staked = self
            .total_staked
            .checked_sub(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        Ok(())
    }

    /// Fold `amount` into the reward rate over a fresh period. Undistributed
    /// reward from an unfinished period carries into the new rate; calls in
    /// the same timestamp aggregate without loss.
    pub fn notify_reward_amount(&mut self, amount: u64, now: i64) -> Result<()> {
        self.settle_global(now)?;

        let scaled = (amount as u128)
            .checked_mul(REWARD_PRECISION)
            .ok_or(error!(VaultError::MathOverflow))?;
        self.reward_rate = if now >= self.period_finish {
            scaled / self.reward_duration as u128
        } else {
            let remaining = (self.period_finish - now) as u128;
            let leftover = remaining
                .checked_mul(self.reward_rate)
                .ok_or(error!(VaultError::MathOverflow))?;
            scaled
                .checked_add(leftover)
                .ok_or(error!(VaultError::MathOverflow))?
                / self.reward_duration as u128
        };
        self.last_update_time = now;
        self.period_finish = now
            .checked_add(self.reward_duration)
            .ok_or(error!(VaultError::MathOverflow))?;
        Ok(())
    }

    /// Settle and take the full accrued reward for payout. Zero is a no-op,
    /// not an error.
    pub fn take_reward(&mut self, account: &mut ReferralAccount, now: i64) -> Result<u64> {
        self.settle(account, now)?;
        let amount = account.accrued_reward;
        account.accrued_reward = 0;
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(duration: i64) -> ReferralLedger {
        ReferralLedger {
            vault: Pubkey::default(),
            reward_mint: Pubkey::default(),
            reward_asset: RewardAsset::Token,
            total_staked: 0,
            reward_rate: 0,
            reward_duration: duration,
            period_finish: 0,
            last_update_time: 0,
            reward_per_token_stored: 0,
            bump: 0,
        }
    }

    fn account() -> ReferralAccount {
        ReferralAccount {
            ledger: Pubkey::default(),
            referrer: Pubkey::new_unique(),
            staked: 0,
            reward_per_token_paid: 0,
            accrued_reward: 0,
            bump: 0,
        }
    }

    #[test]
    fn full_period_distributes_full_amount() {
        let mut ledger = ledger(1_000);
        let mut acct = account();
        ledger.stake(&mut acct, 1_000, 0).unwrap();
        ledger.notify_reward_amount(25, 0).unwrap();
        assert_eq!(ledger.earned(&acct, 1_000).unwrap(), 25);
        assert_eq!(ledger.take_reward(&mut acct, 1_000).unwrap(), 25);
        // second take pays nothing
        assert_eq!(ledger.take_reward(&mut acct, 1_500).unwrap(), 0);
    }

    #[test]
    fn mid_period_notify_folds_leftover() {
        let mut ledger = ledger(1_000);
        let mut acct = account();
        ledger.stake(&mut acct, 500, 0).unwrap();
        ledger.notify_reward_amount(100, 0).unwrap();
        // halfway: 50 distributed, 50 leftover folds with the new 100
        ledger.notify_reward_amount(100, 500).unwrap();
        assert_eq!(ledger.earned(&acct, 1_500).unwrap(), 200);
    }

    #[test]
    fn same_timestamp_notifies_aggregate() {
        let mut ledger = ledger(1_000);
        let mut acct = account();
        ledger.stake(&mut acct, 1_000, 0).unwrap();
        ledger.notify_reward_amount(40, 0).unwrap();
        ledger.notify_reward_amount(60, 0).unwrap();
        assert_eq!(ledger.earned(&acct, 1_000).unwrap(), 100);
    }

    #[test]
    fn earned_is_stake_weighted() {
        let mut ledger = ledger(1_000);
        let mut a = account();
        let mut b = account();
        ledger.stake(&mut a, 300, 0).unwrap();
        ledger.stake(&mut b, 100, 0).unwrap();
        ledger.notify_reward_amount(400, 0).unwrap();
        assert_eq!(ledger.earned(&a, 1_000).unwrap(), 300);
        assert_eq!(ledger.earned(&b, 1_000).unwrap(), 100);
    }

    #[test]
    fn withdraw_stops_future_accrual() {
        let mut ledger = ledger(1_000);
        let mut acct = account();
        ledger.stake(&mut acct, 1_000, 0).unwrap();
        ledger.notify_reward_amount(100, 0).unwrap();
        // half the period passes, then the stake leaves
        ledger.withdraw(&mut acct, 1_000, 500).unwrap();
        assert_eq!(acct.accrued_reward, 50);
        assert_eq!(ledger.earned(&acct, 1_000).unwrap(), 50);
    }

    #[test]
    fn reward_per_token_is_monotonic() {
        let mut ledger = ledger(1_000);
        let mut acct = account();
        ledger.stake(&mut acct, 7, 0).unwrap();
        ledger.notify_reward_amount(1_000, 0).unwrap();
        let mut last = 0u128;
        for t in (0..2_000).step_by(97) {
            let rpt = ledger.reward_per_token(t).unwrap();
            assert!(rpt >= last);
            last = rpt;
        }
    }
}
