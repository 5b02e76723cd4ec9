// Restaking Vault - pooled restaking over an external staking ledger
// Architecture: rotation engine + share-accounting vault + reward streamer
// feeding a stake-weighted referral ledger

use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod state;

use instructions::*;
use state::{ProtocolConfig, RewardAsset};

declare_id!("6zZPAy5c5USYaDp6ZhpR1jVTvvQsrcvQNeB5qdY2w7E3");

#[program]
pub mod restaking_vault {
    use super::*;

    /// Initialize a new restaking vault for a wrapped deposit token
    ///
    /// Security considerations:
    /// - Authority is signer and stored in state
    /// - All custody and payout accounts are PDAs created here
    pub fn initialize(
        ctx: Context<Initialize>,
        operator: Pubkey,
        staking_ledger: Pubkey,
        claims_program: Pubkey,
        params: VaultParams,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, operator, staking_ledger, claims_program, params)
    }

    /// Initialize the referral ledger; the payout mode is permanent
    pub fn initialize_referral(
        ctx: Context<InitializeReferral>,
        reward_asset: RewardAsset,
        reward_duration: i64,
    ) -> Result<()> {
        instructions::referral::initialize_referral(ctx, reward_asset, reward_duration)
    }

    /// Deposit the wrapped token (or the raw token 1:1) for vault shares
    ///
    /// Security considerations:
    /// - Share math is checked and computed against AUM before the deposit
    /// - The referrer's ledger stake moves in the same instruction
    pub fn deposit(
        ctx: Context<Deposit>,
        amount: u64,
        referrer: Pubkey,
        use_raw_token: bool,
    ) -> Result<()> {
        instructions::deposit::handler(ctx, amount, referrer, use_raw_token)
    }

    /// Immediate withdrawal at the current share price minus the fee.
    /// Blocked while a claim pause window is active.
    pub fn withdraw(ctx: Context<Withdraw>, shares: u64) -> Result<()> {
        instructions::withdraw::handler(ctx, shares)
    }

    /// Escrow shares for the delayed withdrawal path
    pub fn request_withdrawal(ctx: Context<RequestWithdrawal>, shares: u64) -> Result<()> {
        instructions::request_withdrawal::handler(ctx, shares)
    }

    /// Fulfill a matured withdrawal request
    pub fn withdraw_requested(ctx: Context<WithdrawRequested>) -> Result<()> {
        instructions::withdraw_requested::handler(ctx)
    }

    /// Move shares between positions, mirroring both referrers' stakes
    pub fn transfer_shares(ctx: Context<TransferShares>, amount: u64) -> Result<()> {
        instructions::transfer_shares::handler(ctx, amount)
    }

    /// Arm a withdrawal pause window from a payable, recent external claim
    pub fn pause_withdrawals(ctx: Context<PauseWithdrawals>, claim_id: u64) -> Result<()> {
        instructions::pause_withdrawals::handler(ctx, claim_id)
    }

    /// One rotation pass over the next bucket of protocols
    ///
    /// Security considerations:
    /// - Operator-only, rate-limited by the restake interval
    /// - Work per call bounded by bucket_size
    pub fn restake(ctx: Context<Restake>, hint: u64) -> Result<()> {
        instructions::restake::handler(ctx, hint, false)
    }

    /// Authority variant of restake that skips the interval check,
    /// used for remediation
    pub fn owner_restake(ctx: Context<Restake>, hint: u64) -> Result<()> {
        instructions::restake::handler(ctx, hint, true)
    }

    /// Authority-only direct stake bypassing the rotation
    pub fn stake_manual(ctx: Context<StakeManual>, protocol: Pubkey, amount: u64) -> Result<()> {
        instructions::stake_manual::handler(ctx, protocol, amount)
    }

    /// Replace the protocol set, reconciling removed entries' stake
    pub fn change_protocols(
        ctx: Context<ChangeProtocols>,
        new_list: Vec<ProtocolConfig>,
        removed: Vec<Pubkey>,
        hint: u64,
    ) -> Result<()> {
        instructions::change_protocols::handler(ctx, new_list, removed, hint)
    }

    /// Authority-only rotation cursor override
    pub fn change_checkpoint_and_start(
        ctx: Context<ChangeRotationConfig>,
        checkpoint: u32,
        start: u32,
    ) -> Result<()> {
        instructions::change_config::change_checkpoint_and_start(ctx, checkpoint, start)
    }

    /// Change how many protocols each restake pass covers
    pub fn change_bucket_size(ctx: Context<ChangeRotationConfig>, bucket_size: u32) -> Result<()> {
        instructions::change_config::change_bucket_size(ctx, bucket_size)
    }

    /// Change the withdrawal fee, capped at MAX_WITHDRAW_FEE_BPS
    pub fn change_withdraw_fee(ctx: Context<ChangeVaultConfig>, fee_bps: u16) -> Result<()> {
        instructions::change_config::change_withdraw_fee(ctx, fee_bps)
    }

    /// Change the liquidity buffer held back from staking
    pub fn change_reserve_amount(ctx: Context<ChangeVaultConfig>, amount: u64) -> Result<()> {
        instructions::change_config::change_reserve_amount(ctx, amount)
    }

    /// Sweep delivered reward, split the referral cut, fold the stream
    pub fn pull_reward(ctx: Context<PullReward>) -> Result<()> {
        instructions::pull_reward::handler(ctx)
    }

    /// Pay out a referrer's accrued reward; zero accrual is a no-op
    pub fn referral_get_reward(ctx: Context<ReferralGetReward>) -> Result<()> {
        instructions::referral::referral_get_reward(ctx)
    }
}
