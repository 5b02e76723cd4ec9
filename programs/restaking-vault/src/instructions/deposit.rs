use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, state::*};

/// Deposit the wrapped token (or the raw governance token, counted 1:1)
/// and receive vault shares.
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Depositor must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Vault, registry and position PDAs seed-validated
/// ✅ 6. MATH SAFETY: Checked share calculation against AUM
/// ✅ 8. BUSINESS LOGIC: Referral stake credited in the same instruction as
///        the share mint it mirrors
#[derive(Accounts)]
#[instruction(amount: u64, referrer: Pubkey)]
pub struct Deposit<'info> {
    /// User depositing assets
    #[account(mut)]
    pub depositor: Signer<'info>,

    /// Vault state PDA
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Depositor's share position, created on first deposit
    #[account(
        init_if_needed,
        payer = depositor,
        space = 8 + DepositorPosition::INIT_SPACE,
        seeds = [POSITION_SEED, vault_state.key().as_ref(), depositor.key().as_ref()],
        bump,
    )]
    pub position: Account<'info, DepositorPosition>,

    /// Referral ledger fed by this vault
    #[account(
        mut,
        seeds = [REFERRAL_LEDGER_SEED, vault_state.key().as_ref()],
        bump = referral_ledger.bump,
    )]
    pub referral_ledger: Account<'info, ReferralLedger>,

    /// Accrual account of the position's referrer, created lazily on the
    /// first referred deposit
    #[account(
        init_if_needed,
        payer = depositor,
        space = 8 + ReferralAccount::INIT_SPACE,
        seeds = [
            REFERRAL_ACCOUNT_SEED,
            referral_ledger.key().as_ref(),
            referrer.as_ref(),
        ],
        bump,
    )]
    pub referral_account: Account<'info, ReferralAccount>,

    /// Source token account: wrapped or raw mint depending on the flag
    /// Security: mint checked in the handler, owner checked here
    #[account(
        mut,
        constraint = source_account.owner == depositor.key() @ VaultError::InvalidOwner,
    )]
    pub source_account: Account<'info, TokenAccount>,

    /// Matching vault custody account
    /// Security: mint checked in the handler against the chosen deposit leg
    #[account(mut)]
    pub vault_custody_account: Account<'info, TokenAccount>,

    /// Custody authority PDA
    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<Deposit>,
    amount: u64,
    referrer: Pubkey,
    use_raw_token: bool,
) -> Result<()> {
    // CHECKS
    require!(amount > 0, VaultError::ZeroAmount);

    let vault_state = &mut ctx.accounts.vault_state;
    let deposit_mint = if use_raw_token {
        vault_state.raw_mint
    } else {
        vault_state.asset_mint
    };
    require!(
        ctx.accounts.source_account.mint == deposit_mint,
        VaultError::InvalidMint
    );
    require!(
        ctx.accounts.vault_custody_account.mint == deposit_mint,
        VaultError::InvalidMint
    );
    require!(
        ctx.accounts.vault_custody_account.owner == ctx.accounts.vault_authority.key(),
        VaultError::InvalidOwner
    );

    let now = Clock::get()?.unix_timestamp;
    let position = &mut ctx.accounts.position;

    // bind the position on first use; the referrer is fixed from then on
    if position.owner == Pubkey::default() {
        position.vault = vault_state.key();
        position.owner = ctx.accounts.depositor.key();
        position.referrer = referrer;
        position.bump = ctx.bumps.position;
    }
    require!(
        position.referrer == referrer,
        VaultError::InvalidReferralAccount
    );

    // EFFECTS: share math against AUM before the deposit lands
    let shares_to_mint = vault_state.calculate_shares(amount, now)?;
    vault_state.credit_idle(amount)?;
    vault_state.total_shares = vault_state
        .total_shares
        .checked_add(shares_to_mint)
        .ok_or(VaultError::MathOverflow)?;
    position.credit_shares(shares_to_mint)?;

    // mirror the minted shares in the referrer's ledger stake
    if position.referrer != Pubkey::default() {
        let ledger = &mut ctx.accounts.referral_ledger;
        let referral_account = &mut ctx.accounts.referral_account;
        if referral_account.referrer == Pubkey::default() {
            referral_account.ledger = ledger.key();
            referral_account.referrer = position.referrer;
            referral_account.bump = ctx.bumps.referral_account;
        }
        ledger.stake(referral_account, shares_to_mint, now)?;
    }

    // INTERACTIONS: pull the deposit into custody
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.source_account.to_account_info(),
            to: ctx.accounts.vault_custody_account.to_account_info(),
            authority: ctx.accounts.depositor.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    emit!(Deposited {
        vault: vault_state.key(),
        depositor: ctx.accounts.depositor.key(),
        referrer: position.referrer,
        asset_amount: amount,
        shares_minted: shares_to_mint,
        raw_token: use_raw_token,
        total_shares: vault_state.total_shares,
        timestamp: now,
    });

    Ok(())
}
