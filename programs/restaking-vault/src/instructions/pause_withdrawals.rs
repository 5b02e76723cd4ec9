use anchor_lang::prelude::*;

use crate::state::external::claims;
use crate::{constants::*, errors::*, events::*, state::*};

/// Arm a withdrawal pause window from a qualifying external claim.
/// Permissionless: any party may surface a payable claim; the recency
/// window and the one-active-window rule bound the damage of spam calls.
#[derive(Accounts)]
pub struct PauseWithdrawals<'info> {
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Claim record owned by the external claims registry
    /// CHECK: externally-owned account, manually deserialized
    #[account(owner = vault_state.claims_program @ VaultError::ExternalStateInvalid)]
    pub claim_record: UncheckedAccount<'info>,
}

pub fn handler(ctx: Context<PauseWithdrawals>, claim_id: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_state = &mut ctx.accounts.vault_state;

    let record = claims::deserialize(&ctx.accounts.claim_record)?;
    require!(record.claim_id == claim_id, VaultError::ClaimMismatch);
    require!(record.is_payable(), VaultError::ClaimNotPayable);
    require!(
        record.is_recent(now, vault_state.claim_recency_window),
        VaultError::ClaimTooOld
    );

    let paused_until = vault_state.arm_pause(now)?;

    emit!(WithdrawalsPausedUntil {
        vault: vault_state.key(),
        claim_id,
        paused_until,
        timestamp: now,
    });

    Ok(())
}
