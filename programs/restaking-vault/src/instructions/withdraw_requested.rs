use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, state::*};

/// Fulfill a matured withdrawal request: burn the escrowed shares at the
/// current share price and pay out minus the fee.
#[derive(Accounts)]
pub struct WithdrawRequested<'info> {
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

    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = vault_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_asset_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_asset_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = destination_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = destination_account.owner == depositor.key() @ VaultError::InvalidOwner,
    )]
    pub destination_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<WithdrawRequested>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_state = &mut ctx.accounts.vault_state;
    let position = &mut ctx.accounts.position;

    let shares = position.take_matured_escrow(now, vault_state.withdraw_delay)?;

    let payout = vault_state.calculate_assets(shares, now)?;
    let fee = vault_state.withdrawal_fee(payout)?;
    let net_payout = payout
        .checked_sub(fee)
        .ok_or(VaultError::MathOverflow)?;

    vault_state.total_shares = vault_state
        .total_shares
        .checked_sub(shares)
        .ok_or(VaultError::MathOverflow)?;
    vault_state.debit_idle(net_payout)?;

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

    emit!(WithdrawalFulfilled {
        vault: vault_state.key(),
        depositor: ctx.accounts.depositor.key(),
        shares_burned: shares,
        payout: net_payout,
        fee,
        timestamp: now,
    });

    Ok(())
}
