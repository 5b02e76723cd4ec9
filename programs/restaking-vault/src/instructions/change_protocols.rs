use anchor_lang::prelude::*;

use crate::state::external::pooled_staking;
use crate::{constants::*, errors::*, events::*, state::*};

/// Replace the protocol set. Removed protocols get a full unstake request
/// and park in the retiring list until the rotation realizes their stake;
/// nothing is ever dropped with live exposure.
#[derive(Accounts)]
pub struct ChangeProtocols<'info> {
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

    /// The ledger's staking state, read for the lock window and the hint
    /// CHECK: externally-owned account, manually deserialized
    #[account(owner = vault_state.staking_ledger @ VaultError::ExternalStateInvalid)]
    pub ledger_state: UncheckedAccount<'info>,
}

pub fn handler(
    ctx: Context<ChangeProtocols>,
    new_list: Vec<ProtocolConfig>,
    removed: Vec<Pubkey>,
    hint: u64,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_state = &mut ctx.accounts.vault_state;
    let registry = &mut ctx.accounts.protocol_registry;

    let ledger = pooled_staking::deserialize(&ctx.accounts.ledger_state)?;
    let resolved_hint = ledger.resolve_unstake_hint(hint, now)?;

    let removed_count = removed.len() as u32;
    let plans =
        registry.apply_protocol_changes(new_list, removed, now, ledger.unstake_lock_seconds)?;

    for plan in &plans {
        vault_state.total_pending_unstake = vault_state
            .total_pending_unstake
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

    emit!(ProtocolsChanged {
        vault: vault_state.key(),
        active_count: registry.protocols.len() as u32,
        removed_count,
        timestamp: now,
    });

    Ok(())
}
