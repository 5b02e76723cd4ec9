use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, state::*};

/// Initialize the referral ledger for a vault. The payout mode (designated
/// reward token vs. native lamports) is fixed here permanently; `init`
/// makes a second initialization fail.
#[derive(Accounts)]
pub struct InitializeReferral<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        has_one = authority @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,

    #[account(
        init,
        payer = authority,
        space = 8 + ReferralLedger::INIT_SPACE,
        seeds = [REFERRAL_LEDGER_SEED, vault_state.key().as_ref()],
        bump,
    )]
    pub referral_ledger: Account<'info, ReferralLedger>,

    /// Reward mint; recorded but unused when the mode is `Native`
    pub reward_mint: Account<'info, Mint>,

    /// Reward custody owned by the ledger PDA itself
    #[account(
        init,
        payer = authority,
        seeds = [b"referral_reward", referral_ledger.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = referral_ledger,
    )]
    pub ledger_reward_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn initialize_referral(
    ctx: Context<InitializeReferral>,
    reward_asset: RewardAsset,
    reward_duration: i64,
) -> Result<()> {
    require!(reward_duration > 0, VaultError::ZeroAmount);

    let ledger = &mut ctx.accounts.referral_ledger;
    ledger.vault = ctx.accounts.vault_state.key();
    ledger.reward_mint = match reward_asset {
        RewardAsset::Token => ctx.accounts.reward_mint.key(),
        RewardAsset::Native => Pubkey::default(),
    };
    ledger.reward_asset = reward_asset;
    ledger.total_staked = 0;
    ledger.reward_rate = 0;
    ledger.reward_duration = reward_duration;
    ledger.period_finish = 0;
    ledger.last_update_time = 0;
    ledger.reward_per_token_stored = 0;
    ledger.bump = ctx.bumps.referral_ledger;

    Ok(())
}

/// Pay out a referrer's accrued reward. Zero accrual is a no-op, not a
/// failure; anyone may crank the payout for a referrer.
#[derive(Accounts)]
pub struct ReferralGetReward<'info> {
    pub caller: Signer<'info>,

    /// Referrer being paid
    /// CHECK: lamport destination in native mode, identity otherwise
    #[account(mut)]
    pub referrer: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [REFERRAL_LEDGER_SEED, referral_ledger.vault.as_ref()],
        bump = referral_ledger.bump,
    )]
    pub referral_ledger: Account<'info, ReferralLedger>,

    #[account(
        mut,
        seeds = [
            REFERRAL_ACCOUNT_SEED,
            referral_ledger.key().as_ref(),
            referrer.key().as_ref(),
        ],
        bump = referral_account.bump,
    )]
    pub referral_account: Account<'info, ReferralAccount>,

    /// Reward custody; required in token mode
    #[account(mut)]
    pub ledger_reward_account: Option<Account<'info, TokenAccount>>,

    /// Referrer's reward token account; required in token mode
    #[account(mut)]
    pub referrer_token_account: Option<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn referral_get_reward(ctx: Context<ReferralGetReward>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let ledger = &mut ctx.accounts.referral_ledger;
    let account = &mut ctx.accounts.referral_account;

    let amount = ledger.take_reward(account, now)?;
    if amount == 0 {
        return Ok(());
    }

    match ledger.reward_asset {
        RewardAsset::Token => {
            let source = ctx
                .accounts
                .ledger_reward_account
                .as_ref()
                .ok_or(error!(VaultError::InvalidRewardAsset))?;
            let destination = ctx
                .accounts
                .referrer_token_account
                .as_ref()
                .ok_or(error!(VaultError::InvalidRewardAsset))?;
            require!(
                source.mint == ledger.reward_mint && source.owner == ledger.key(),
                VaultError::InvalidRewardAsset
            );
            require!(
                destination.mint == ledger.reward_mint
                    && destination.owner == ctx.accounts.referrer.key(),
                VaultError::InvalidOwner
            );

            let vault_key = ledger.vault;
            let ledger_seeds: &[&[u8]] = &[
                REFERRAL_LEDGER_SEED,
                vault_key.as_ref(),
                &[ledger.bump],
            ];
            token::transfer(
                CpiContext::new_with_signer(
                    ctx.accounts.token_program.to_account_info(),
                    Transfer {
                        from: source.to_account_info(),
                        to: destination.to_account_info(),
                        authority: ledger.to_account_info(),
                    },
                    &[&ledger_seeds[..]],
                ),
                amount,
            )?;
        }
        RewardAsset::Native => {
            // program-owned PDA: move lamports directly
            let ledger_info = ledger.to_account_info();
            let referrer_info = ctx.accounts.referrer.to_account_info();
            **ledger_info.try_borrow_mut_lamports()? = ledger_info
                .lamports()
                .checked_sub(amount)
                .ok_or(VaultError::InsufficientLiquidity)?;
            **referrer_info.try_borrow_mut_lamports()? = referrer_info
                .lamports()
                .checked_add(amount)
                .ok_or(VaultError::MathOverflow)?;
        }
    }

    emit!(ReferralRewardPaid {
        ledger: ledger.key(),
        referrer: ctx.accounts.referrer.key(),
        amount,
        timestamp: now,
    });

    Ok(())
}
