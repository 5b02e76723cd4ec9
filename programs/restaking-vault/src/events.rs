use anchor_lang::prelude::*;

/// Event emitted when a new vault is initialized
#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub operator: Pubkey,
    pub asset_mint: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when assets are deposited and shares minted
#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub referrer: Pubkey,
    pub asset_amount: u64,
    pub shares_minted: u64,
    pub raw_token: bool,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted on an immediate withdrawal
#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub shares_burned: u64,
    pub payout: u64,
    pub fee: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when shares are escrowed for a delayed withdrawal
#[event]
pub struct WithdrawalRequested {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub shares: u64,
    pub claimable_at: i64,
    pub timestamp: i64,
}

/// Event emitted when a matured withdrawal request is fulfilled
#[event]
pub struct WithdrawalFulfilled {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub shares_burned: u64,
    pub payout: u64,
    pub fee: u64,
    pub timestamp: i64,
}

/// Event emitted when shares move between positions
#[event]
pub struct SharesTransferred {
    pub vault: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub shares: u64,
    pub timestamp: i64,
}

/// Event emitted when a qualifying claim pauses withdrawals
#[event]
pub struct WithdrawalsPausedUntil {
    pub vault: Pubkey,
    pub claim_id: u64,
    pub paused_until: i64,
    pub timestamp: i64,
}

/// Stake instruction issued to the external staking ledger
#[event]
pub struct StakeInstructed {
    pub vault: Pubkey,
    pub protocol: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Unstake request issued to the external staking ledger
#[event]
pub struct UnstakeInstructed {
    pub vault: Pubkey,
    pub protocol: Pubkey,
    pub amount: u64,
    pub unstake_at: i64,
    pub hint: u64,
    pub timestamp: i64,
}

/// Event emitted after each restake pass
#[event]
pub struct Restaked {
    pub vault: Pubkey,
    pub start: u32,
    pub checkpoint: u32,
    pub bucket_size: u32,
    pub staked_total: u64,
    pub unstake_requested_total: u64,
    pub realized_total: u64,
    pub rotation_completed: bool,
    pub timestamp: i64,
}

/// Event emitted when the protocol set changes
#[event]
pub struct ProtocolsChanged {
    pub vault: Pubkey,
    pub active_count: u32,
    pub removed_count: u32,
    pub timestamp: i64,
}

/// Event emitted when a reward is pulled and a new stream starts
#[event]
pub struct RewardPulled {
    pub vault: Pubkey,
    pub claimed: u64,
    pub referral_cut: u64,
    pub stream_amount: u64,
    pub timestamp: i64,
}

/// Event emitted when reward is folded into the referral ledger rate
#[event]
pub struct ReferralRewardNotified {
    pub ledger: Pubkey,
    pub amount: u64,
    pub period_finish: i64,
    pub timestamp: i64,
}

/// Event emitted when a referrer collects accrued reward
#[event]
pub struct ReferralRewardPaid {
    pub ledger: Pubkey,
    pub referrer: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}
