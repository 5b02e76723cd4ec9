use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Escrow shares for a delayed withdrawal. No AUM effect until the request
/// is fulfilled; the referrer's ledger stake drops now because the shares
/// leave the active balance.
#[derive(Accounts)]
pub struct RequestWithdrawal<'info> {
    pub depositor: Signer<'info>,

    #[account(
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
}

pub fn handler(ctx: Context<RequestWithdrawal>, shares: u64) -> Result<()> {
    require!(shares > 0, VaultError::ZeroAmount);

    let now = Clock::get()?.unix_timestamp;
    let position = &mut ctx.accounts.position;
    position.escrow_shares(shares, now)?;

    if position.referrer != Pubkey::default() {
        ctx.accounts
            .referral_ledger
            .withdraw(&mut ctx.accounts.referral_account, shares, now)?;
    }

    let claimable_at = now
        .checked_add(ctx.accounts.vault_state.withdraw_delay)
        .ok_or(VaultError::MathOverflow)?;

    emit!(WithdrawalRequested {
        vault: ctx.accounts.vault_state.key(),
        depositor: ctx.accounts.depositor.key(),
        shares,
        claimable_at,
        timestamp: now,
    });

    Ok(())
}
