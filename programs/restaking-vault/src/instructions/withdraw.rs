use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, state::*};

/// Immediate withdrawal: burn shares, pay out at the current share price
/// minus the withdrawal fee. Blocked while a claim pause window is active.
#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    #[account(
        mut,
        seeds = [POSITION_SEED, vault_state.key().as_ref(), depositor.key().as_ref()],
        bump = position.bump,
        constraint = position.owner == depositor.key() @ VaultError::InvalidOwner,
    )]
    pub position: Account<'info, DepositorPosition>,

    #[account(
        mut,
        seeds = [REFERRAL_LEDGER_SEED, vault_state.key().as_ref()],
        bump = referral_ledger.bump,
    )]
    pub referral_ledger: Account<'info, ReferralLedger>,

    /// Accrual account of the position's fixed referrer
    #[account(
        mut,
        seeds = [
            REFERRAL_ACCOUNT_SEED,
            referral_ledger.key().as_ref(),
            position.referrer.as_ref(),
        ],
        bump,
    )]
    pub referral_account: Account<'info, ReferralAccount>,

    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Vault custody for the wrapped asset (payout source)
    #[account(
        mut,
        constraint = vault_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_asset_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_asset_account: Account<'info, TokenAccount>,

    /// Depositor's wrapped-asset token account (payout destination)
    #[account(
        mut,
        constraint = destination_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = destination_account.owner == depositor.key() @ VaultError::InvalidOwner,
    )]
    pub destination_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<Withdraw>, shares: u64) -> Result<()> {
    require!(shares > 0, VaultError::ZeroAmount);

    let now = Clock::get()?.unix_timestamp;
    let vault_state = &mut ctx.accounts.vault_state;
    require!(!vault_state.is_paused(now), VaultError::WithdrawalsPaused);

    // EFFECTS: burn at the current share price, fee stays in custody
    let payout = vault_state.calculate_assets(shares, now)?;
    let fee = vault_state.withdrawal_fee(payout)?;
    let net_payout = payout
        .checked_sub(fee)
        .ok_or(VaultError::MathOverflow)?;

    let position = &mut ctx.accounts.position;
    position.debit_shares(shares)?;
    vault_state.total_shares = vault_state
        .total_shares
        .checked_sub(shares)
        .ok_or(VaultError::MathOverflow)?;
    vault_state.debit_idle(net_payout)?;

    if position.referrer != Pubkey::default() {
        ctx.accounts
            .referral_ledger
            .withdraw(&mut ctx.accounts.referral_account, shares, now)?;
    }

    // INTERACTIONS
    let asset_mint_key = vault_state.asset_mint;
    let authority_seeds: &[&[u8]] = &[
        VAULT_AUTHORITY_SEED,
        asset_mint_key.as_ref(),
        &[vault_state.authority_bump],
    ];
    let signer_seeds = &[&authority_seeds[..]];

    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.vault_asset_account.to_account_info(),
            to: ctx.accounts.destination_account.to_account_info(),
            authority: ctx.accounts.vault_authority.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, net_payout)?;

    emit!(Withdrawn {
        vault: vault_state.key(),
        depositor: ctx.accounts.depositor.key(),
        shares_burned: shares,
        payout: net_payout,
        fee,
        total_shares: vault_state.total_shares,
        timestamp: now,
    });

    Ok(())
}
