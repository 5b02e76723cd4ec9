use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Move shares between positions. The referral ledger follows in the same
/// instruction: the sender's referrer loses the shares, the recipient's
/// referrer gains them. Referrers stay fixed per holder.
#[derive(Accounts)]
pub struct TransferShares<'info> {
    #[account(mut)]
    pub sender: Signer<'info>,

    /// Recipient wallet
    /// CHECK: only used as the position owner key
    pub recipient: UncheckedAccount<'info>,

    #[account(
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    #[account(
        mut,
        seeds = [POSITION_SEED, vault_state.key().as_ref(), sender.key().as_ref()],
        bump = sender_position.bump,
        constraint = sender_position.owner == sender.key() @ VaultError::InvalidOwner,
    )]
    pub sender_position: Account<'info, DepositorPosition>,

    /// Recipient position, created on first receipt (with no referrer)
    #[account(
        init_if_needed,
        payer = sender,
        space = 8 + DepositorPosition::INIT_SPACE,
        seeds = [POSITION_SEED, vault_state.key().as_ref(), recipient.key().as_ref()],
        bump,
    )]
    pub recipient_position: Account<'info, DepositorPosition>,

    #[account(
        mut,
        seeds = [REFERRAL_LEDGER_SEED, vault_state.key().as_ref()],
        bump = referral_ledger.bump,
    )]
    pub referral_ledger: Account<'info, ReferralLedger>,

    /// Accrual account of the sender's referrer; required when the sender
    /// has one
    #[account(mut)]
    pub sender_referral_account: Option<Account<'info, ReferralAccount>>,

    /// Accrual account of the recipient's referrer; required when the
    /// recipient has one
    #[account(mut)]
    pub recipient_referral_account: Option<Account<'info, ReferralAccount>>,

    pub system_program: Program<'info, System>,
}

fn expect_referral_account<'a, 'info>(
    account: &'a mut Option<Account<'info, ReferralAccount>>,
    ledger: &Pubkey,
    referrer: &Pubkey,
) -> Result<&'a mut Account<'info, ReferralAccount>> {
    let account = account
        .as_mut()
        .ok_or(error!(VaultError::InvalidReferralAccount))?;
    require!(
        account.ledger == *ledger && account.referrer == *referrer,
        VaultError::InvalidReferralAccount
    );
    Ok(account)
}

pub fn handler(ctx: Context<TransferShares>, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::ZeroAmount);
    require_keys_neq!(
        ctx.accounts.sender.key(),
        ctx.accounts.recipient.key(),
        VaultError::InvalidOwner
    );

    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault_state.key();

    let sender_position = &mut ctx.accounts.sender_position;
    let recipient_position = &mut ctx.accounts.recipient_position;
    if recipient_position.owner == Pubkey::default() {
        recipient_position.vault = vault_key;
        recipient_position.owner = ctx.accounts.recipient.key();
        recipient_position.referrer = Pubkey::default();
        recipient_position.bump = ctx.bumps.recipient_position;
    }

    sender_position.debit_shares(amount)?;
    recipient_position.credit_shares(amount)?;

    // mirror the move in the referral ledger; equal referrers cancel out
    let ledger_key = ctx.accounts.referral_ledger.key();
    let sender_ref = sender_position.referrer;
    let recipient_ref = recipient_position.referrer;
    if sender_ref != recipient_ref {
        if sender_ref != Pubkey::default() {
            let account = expect_referral_account(
                &mut ctx.accounts.sender_referral_account,
                &ledger_key,
                &sender_ref,
            )?;
            ctx.accounts.referral_ledger.withdraw(account, amount, now)?;
        }
        if recipient_ref != Pubkey::default() {
            let account = expect_referral_account(
                &mut ctx.accounts.recipient_referral_account,
                &ledger_key,
                &recipient_ref,
            )?;
            ctx.accounts.referral_ledger.stake(account, amount, now)?;
        }
    }

    emit!(SharesTransferred {
        vault: vault_key,
        from: ctx.accounts.sender.key(),
        to: ctx.accounts.recipient.key(),
        shares: amount,
        timestamp: now,
    });

    Ok(())
}
