use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, state::*};

/// Authority-only direct stake onto one protocol, bypassing the rotation.
/// Remediation/rebalancing tool; the reserve buffer still applies.
#[derive(Accounts)]
pub struct StakeManual<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        has_one = authority @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED, vault_state.key().as_ref()],
        bump = protocol_registry.bump,
    )]
    pub protocol_registry: Account<'info, ProtocolRegistry>,

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

    /// The external ledger's deposit account
    #[account(
        mut,
        constraint = ledger_deposit_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub ledger_deposit_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<StakeManual>, protocol: Pubkey, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::ZeroAmount);

    let now = Clock::get()?.unix_timestamp;
    let vault_state = &mut ctx.accounts.vault_state;
    let registry = &mut ctx.accounts.protocol_registry;

    let idx = registry
        .find(&protocol)
        .ok_or(error!(VaultError::ProtocolNotFound))?;
    require!(
        amount <= vault_state.free_stake_balance(),
        VaultError::InsufficientLiquidity
    );

    vault_state.debit_idle(amount)?;
    vault_state.total_staked = vault_state
        .total_staked
        .checked_add(amount)
        .ok_or(VaultError::MathOverflow)?;
    registry.protocols[idx].staked = registry.protocols[idx]
        .staked
        .checked_add(amount)
        .ok_or(VaultError::MathOverflow)?;

    let asset_mint_key = vault_state.asset_mint;
    let authority_seeds: &[&[u8]] = &[
        VAULT_AUTHORITY_SEED,
        asset_mint_key.as_ref(),
        &[vault_state.authority_bump],
    ];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.vault_asset_account.to_account_info(),
                to: ctx.accounts.ledger_deposit_account.to_account_info(),
                authority: ctx.accounts.vault_authority.to_account_info(),
            },
            &[&authority_seeds[..]],
        ),
        amount,
    )?;

    emit!(StakeInstructed {
        vault: vault_state.key(),
        protocol,
        amount,
        timestamp: now,
    });

    Ok(())
}
