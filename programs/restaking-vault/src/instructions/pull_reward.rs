use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, state::*};

/// Sweep reward delivered by the external ledger, split the referral cut,
/// and fold the remainder into the linear release stream.
///
/// Permissionless: anyone may crank it; the linear release makes the timing
/// of the call economically uninteresting.
#[derive(Accounts)]
pub struct PullReward<'info> {
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [PAYOUT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.payout_bump,
    )]
    pub payout_authority: UncheckedAccount<'info>,

    /// Delivery account for claimed rewards, swept in full
    #[account(
        mut,
        seeds = [REWARD_PAYOUT_SEED, vault_state.asset_mint.as_ref()],
        bump,
    )]
    pub reward_payout_account: Account<'info, TokenAccount>,

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
        seeds = [REFERRAL_LEDGER_SEED, vault_state.key().as_ref()],
        bump = referral_ledger.bump,
    )]
    pub referral_ledger: Account<'info, ReferralLedger>,

    /// Referral ledger reward custody; required whenever a referral cut is
    /// taken
    #[account(mut)]
    pub ledger_reward_account: Option<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<PullReward>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_state = &mut ctx.accounts.vault_state;

    let claimed = ctx.accounts.reward_payout_account.amount;
    if claimed == 0 {
        // nothing claimed: refresh the marker only when no stream is live
        if !vault_state.reward_stream.is_active(now) {
            vault_state.reward_stream.mark(now);
        }
        emit!(RewardPulled {
            vault: vault_state.key(),
            claimed: 0,
            referral_cut: 0,
            stream_amount: vault_state.reward_stream.last_reward_amount,
            timestamp: now,
        });
        return Ok(());
    }

    // sweep the delivery account into custody
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
                from: ctx.accounts.reward_payout_account.to_account_info(),
                to: ctx.accounts.vault_asset_account.to_account_info(),
                authority: ctx.accounts.payout_authority.to_account_info(),
            },
            &[&payout_seeds[..]],
        ),
        claimed,
    )?;

    // referral cut comes off the newly claimed amount only
    let referral_cut = (claimed as u128)
        .checked_mul(vault_state.referral_cut_bps as u128)
        .ok_or(VaultError::MathOverflow)?
        / BASIS_POINTS as u128;
    let referral_cut = u64::try_from(referral_cut).map_err(|_| error!(VaultError::MathOverflow))?;
    let net_reward = claimed
        .checked_sub(referral_cut)
        .ok_or(VaultError::MathOverflow)?;

    vault_state.credit_idle(net_reward)?;
    vault_state.reward_stream.fold(net_reward, now)?;

    if referral_cut > 0 {
        let ledger = &mut ctx.accounts.referral_ledger;
        require!(
            ledger.reward_asset == RewardAsset::Token
                && ledger.reward_mint == vault_state.asset_mint,
            VaultError::InvalidRewardAsset
        );
        let ledger_reward_account = ctx
            .accounts
            .ledger_reward_account
            .as_ref()
            .ok_or(error!(VaultError::InvalidRewardAsset))?;
        require!(
            ledger_reward_account.mint == ledger.reward_mint
                && ledger_reward_account.owner == ledger.key(),
            VaultError::InvalidRewardAsset
        );

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
                    to: ledger_reward_account.to_account_info(),
                    authority: ctx.accounts.vault_authority.to_account_info(),
                },
                &[&authority_seeds[..]],
            ),
            referral_cut,
        )?;

        ledger.notify_reward_amount(referral_cut, now)?;
        emit!(ReferralRewardNotified {
            ledger: ledger.key(),
            amount: referral_cut,
            period_finish: ledger.period_finish,
            timestamp: now,
        });
    }

    emit!(RewardPulled {
        vault: vault_state.key(),
        claimed,
        referral_cut,
        stream_amount: vault_state.reward_stream.last_reward_amount,
        timestamp: now,
    });

    Ok(())
}
