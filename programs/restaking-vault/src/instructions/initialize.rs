use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, errors::*, events::*, state::*};

/// Vault configuration supplied at initialization. Every policy constant of
/// the rotation, streaming and withdrawal machinery is configuration, not a
/// hardcoded percentage.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct VaultParams {
    pub withdraw_fee_bps: u16,
    pub referral_cut_bps: u16,
    pub withdraw_delay: i64,
    pub pause_duration: i64,
    pub claim_recency_window: i64,
    pub stream_duration: i64,
    pub min_restake_interval: i64,
    pub bucket_size: u32,
    pub reserve_amount: u64,
}

/// Initialize a new restaking vault for a wrapped deposit token
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Vault authority (owner role)
    /// Security: Must be signer, stored in state
    #[account(mut)]
    pub authority: Signer<'info>,

    /// Vault state PDA
    #[account(
        init,
        payer = authority,
        space = 8 + VaultState::INIT_SPACE,
        seeds = [VAULT_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Protocol registry PDA, empty until the first change_protocols
    #[account(
        init,
        payer = authority,
        space = 8 + ProtocolRegistry::INIT_SPACE,
        seeds = [REGISTRY_SEED, vault_state.key().as_ref()],
        bump
    )]
    pub protocol_registry: Account<'info, ProtocolRegistry>,

    /// Wrapped deposit token mint
    pub asset_mint: Account<'info, Mint>,

    /// Raw governance token mint, accepted 1:1 as the wrapped asset
    pub raw_mint: Account<'info, Mint>,

    /// Custody authority PDA for the vault's token accounts
    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Payout authority PDA: the external ledger delivers realized unstakes
    /// and rewards into token accounts owned by this PDA
    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [PAYOUT_AUTHORITY_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub payout_authority: UncheckedAccount<'info>,

    /// Custody for the wrapped asset
    #[account(
        init,
        payer = authority,
        associated_token::mint = asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_asset_account: Account<'info, TokenAccount>,

    /// Custody for raw-token deposits
    #[account(
        init,
        payer = authority,
        associated_token::mint = raw_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_raw_account: Account<'info, TokenAccount>,

    /// Delivery account for realized unstakes
    #[account(
        init,
        payer = authority,
        associated_token::mint = asset_mint,
        associated_token::authority = payout_authority,
    )]
    pub unstake_payout_account: Account<'info, TokenAccount>,

    /// Delivery account for claimed rewards. A plain token-account PDA so it
    /// stays distinct from the unstake delivery ATA of the same mint.
    #[account(
        init,
        payer = authority,
        seeds = [REWARD_PAYOUT_SEED, asset_mint.key().as_ref()],
        bump,
        token::mint = asset_mint,
        token::authority = payout_authority,
    )]
    pub reward_payout_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<Initialize>,
    operator: Pubkey,
    staking_ledger: Pubkey,
    claims_program: Pubkey,
    params: VaultParams,
) -> Result<()> {
    // CHECKS: policy bounds
    require!(
        params.withdraw_fee_bps <= MAX_WITHDRAW_FEE_BPS,
        VaultError::FeeTooHigh
    );
    require!(
        (params.referral_cut_bps as u64) <= BASIS_POINTS,
        VaultError::FeeTooHigh
    );
    require!(params.bucket_size > 0, VaultError::InvalidBucketSize);
    require!(params.stream_duration > 0, VaultError::ZeroAmount);

    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.authority = ctx.accounts.authority.key();
    vault_state.operator = operator;
    vault_state.asset_mint = ctx.accounts.asset_mint.key();
    vault_state.raw_mint = ctx.accounts.raw_mint.key();
    vault_state.staking_ledger = staking_ledger;
    vault_state.claims_program = claims_program;
    vault_state.total_shares = 0;
    vault_state.idle_balance = 0;
    vault_state.total_staked = 0;
    vault_state.total_pending_unstake = 0;
    vault_state.reserve_amount = params.reserve_amount;
    vault_state.withdraw_fee_bps = params.withdraw_fee_bps;
    vault_state.referral_cut_bps = params.referral_cut_bps;
    vault_state.withdraw_delay = params.withdraw_delay;
    vault_state.pause_duration = params.pause_duration;
    vault_state.claim_recency_window = params.claim_recency_window;
    vault_state.paused_until = 0;
    vault_state.min_restake_interval = params.min_restake_interval;
    vault_state.last_restake_time = 0;
    vault_state.reward_stream = RewardStream {
        last_reward_amount: 0,
        last_reward_timestamp: 0,
        stream_duration: params.stream_duration,
    };
    vault_state.bump = ctx.bumps.vault_state;
    vault_state.authority_bump = ctx.bumps.vault_authority;
    vault_state.payout_bump = ctx.bumps.payout_authority;
    vault_state._reserved = [0; 64];

    let registry = &mut ctx.accounts.protocol_registry;
    registry.vault = vault_state.key();
    registry.protocols = Vec::new();
    registry.retiring = Vec::new();
    registry.checkpoint = 0;
    registry.start = 0;
    registry.bucket_size = params.bucket_size;
    registry.bump = ctx.bumps.protocol_registry;

    emit!(VaultInitialized {
        vault: vault_state.key(),
        authority: vault_state.authority,
        operator,
        asset_mint: vault_state.asset_mint,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
