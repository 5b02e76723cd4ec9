use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::state::external::pooled_staking;
use crate::{constants::*, errors::*, events::*, state::*};

/// One rotation pass: realize matured unstakes, issue new unstake requests
/// for the current bucket, stake the free balance across it, advance the
/// cursor. Work per call is bounded by `bucket_size` no matter how large
/// the registry grows.
#[derive(Accounts)]
pub struct Restake<'info> {
    /// Operator for `restake`, authority for `owner_restake`
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
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

    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [PAYOUT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.payout_bump,
    )]
    pub payout_authority: UncheckedAccount<'info>,

    /// Vault custody for the wrapped asset
    #[account(
        mut,
        constraint = vault_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_asset_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_asset_account: Account<'info, TokenAccount>,

    /// The external ledger's deposit account; stake flows into it
    #[account(
        mut,
        constraint = ledger_deposit_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub ledger_deposit_account: Account<'info, TokenAccount>,

    /// Delivery account for realized unstakes, swept every pass
    #[account(
        mut,
        constraint = unstake_payout_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = unstake_payout_account.owner == payout_authority.key() @ VaultError::InvalidOwner,
    )]
    pub unstake_payout_account: Account<'info, TokenAccount>,

    /// The ledger's staking state for the vault's position
    /// CHECK: externally-owned account, manually deserialized
    #[account(owner = vault_state.staking_ledger @ VaultError::ExternalStateInvalid)]
    pub ledger_state: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<Restake>, hint: u64, owner_call: bool) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_state = &mut ctx.accounts.vault_state;

    // role + interval gates; the owner variant skips the interval for
    // remediation runs
    if owner_call {
        require_keys_eq!(
            ctx.accounts.caller.key(),
            vault_state.authority,
            VaultError::Unauthorized
        );
    } else {
        require_keys_eq!(
            ctx.accounts.caller.key(),
            vault_state.operator,
            VaultError::Unauthorized
        );
        let earliest = vault_state
            .last_restake_time
            .checked_add(vault_state.min_restake_interval)
            .ok_or(VaultError::MathOverflow)?;
        require!(now >= earliest, VaultError::RestakeTooEarly);
    }

    let ledger = pooled_staking::deserialize(&ctx.accounts.ledger_state)?;
    let resolved_hint = ledger.resolve_unstake_hint(hint, now)?;

    let registry = &mut ctx.accounts.protocol_registry;
    let (indices, rotation_completed) = registry.advance_bucket();

    if indices.is_empty() {
        // empty registry: a no-op that still updates timing
        vault_state.last_restake_time = now;
        emit!(Restaked {
            vault: vault_state.key(),
            start: registry.start,
            checkpoint: registry.checkpoint,
            bucket_size: registry.bucket_size,
            staked_total: 0,
            unstake_requested_total: 0,
            realized_total: 0,
            rotation_completed: false,
            timestamp: now,
        });
        return Ok(());
    }

    // 1. realize matured unstakes for the bucket and the retiring list
    let realized = registry.realize_matured(&indices, now)?;
    if realized > 0 {
        vault_state.total_staked = vault_state
            .total_staked
            .checked_sub(realized)
            .ok_or(VaultError::MathOverflow)?;
        vault_state.total_pending_unstake = vault_state
            .total_pending_unstake
            .checked_sub(realized)
            .ok_or(VaultError::MathOverflow)?;
        vault_state.credit_idle(realized)?;
    }

    // sweep whatever the ledger has delivered so far
    let delivered = ctx.accounts.unstake_payout_account.amount;
    if delivered > 0 {
        let asset_mint_key = vault_state.asset_mint;
        let payout_seeds: &[&[u8]] = &[
            PAYOUT_AUTHORITY_SEED,
            asset_mint_key.as_ref(),
            &[vault_state.payout_bump],
        ];
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.unstake_payout_account.to_account_info(),
                    to: ctx.accounts.vault_asset_account.to_account_info(),
                    authority: ctx.accounts.payout_authority.to_account_info(),
                },
                &[&payout_seeds[..]],
            ),
            delivered,
        )?;
    }

    // 2. issue new unstake requests across the bucket
    let unstake_plans = registry.plan_unstakes(&indices, now, ledger.unstake_lock_seconds)?;
    let mut unstake_requested_total: u64 = 0;
    for plan in &unstake_plans {
        vault_state.total_pending_unstake = vault_state
            .total_pending_unstake
            .checked_add(plan.amount)
            .ok_or(VaultError::MathOverflow)?;
        unstake_requested_total = unstake_requested_total
            .checked_add(plan.amount)
            .ok_or(VaultError::MathOverflow)?;
        emit!(UnstakeInstructed {
            vault: vault_state.key(),
            protocol: plan.protocol,
            amount: plan.amount,
            unstake_at: plan.unstake_at,
            hint: resolved_hint,
            timestamp: now,
        });
    }

    // 3. stake the free balance across the same bucket, weight-proportional
    let free = vault_state.free_stake_balance();
    let (stake_plans, staked_total) = registry.plan_stakes(&indices, free)?;
    if staked_total > 0 {
        vault_state.debit_idle(staked_total)?;
        vault_state.total_staked = vault_state
            .total_staked
            .checked_add(staked_total)
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
            staked_total,
        )?;

        for plan in &stake_plans {
            emit!(StakeInstructed {
                vault: vault_state.key(),
                protocol: plan.protocol,
                amount: plan.amount,
                timestamp: now,
            });
        }
    }

    vault_state.last_restake_time = now;

    emit!(Restaked {
        vault: vault_state.key(),
        start: registry.start,
        checkpoint: registry.checkpoint,
        bucket_size: registry.bucket_size,
        staked_total,
        unstake_requested_total,
        realized_total: realized,
        rotation_completed,
        timestamp: now,
    });

    Ok(())
}
