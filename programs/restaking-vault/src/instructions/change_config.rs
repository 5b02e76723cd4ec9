use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, state::*};

/// Authority-only configuration changes on the vault state.
#[derive(Accounts)]
pub struct ChangeVaultConfig<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        has_one = authority @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,
}

pub fn change_withdraw_fee(ctx: Context<ChangeVaultConfig>, fee_bps: u16) -> Result<()> {
    require!(fee_bps <= MAX_WITHDRAW_FEE_BPS, VaultError::FeeTooHigh);
    ctx.accounts.vault_state.withdraw_fee_bps = fee_bps;
    Ok(())
}

pub fn change_reserve_amount(ctx: Context<ChangeVaultConfig>, amount: u64) -> Result<()> {
    ctx.accounts.vault_state.reserve_amount = amount;
    Ok(())
}

/// Authority-only rotation cursor changes on the registry.
#[derive(Accounts)]
pub struct ChangeRotationConfig<'info> {
    pub authority: Signer<'info>,

    #[account(
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
}

pub fn change_checkpoint_and_start(
    ctx: Context<ChangeRotationConfig>,
    checkpoint: u32,
    start: u32,
) -> Result<()> {
    let registry = &mut ctx.accounts.protocol_registry;
    let len = registry.protocols.len() as u32;
    if len == 0 {
        require!(checkpoint == 0 && start == 0, VaultError::InvalidPointer);
    } else {
        require!(checkpoint < len && start < len, VaultError::InvalidPointer);
    }
    registry.checkpoint = checkpoint;
    registry.start = start;
    Ok(())
}

pub fn change_bucket_size(ctx: Context<ChangeRotationConfig>, bucket_size: u32) -> Result<()> {
    require!(bucket_size > 0, VaultError::InvalidBucketSize);
    ctx.accounts.protocol_registry.bucket_size = bucket_size;
    Ok(())
}
