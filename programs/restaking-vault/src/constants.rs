// Constants for the Restaking Vault program

/// Seed for vault state PDA
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed for vault token-custody authority PDA
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Seed for protocol registry PDA
pub const REGISTRY_SEED: &[u8] = b"protocol_registry";

/// Seed for per-depositor position PDA
pub const POSITION_SEED: &[u8] = b"position";

/// Seed for the referral ledger PDA
pub const REFERRAL_LEDGER_SEED: &[u8] = b"referral_ledger";

/// Seed for per-referrer referral account PDA
pub const REFERRAL_ACCOUNT_SEED: &[u8] = b"referral_account";

/// Seed for the payout authority PDA. The external staking ledger delivers
/// realized unstakes and claimed rewards into token accounts owned by this
/// authority so the vault can sweep them with its own signature.
pub const PAYOUT_AUTHORITY_SEED: &[u8] = b"payout_authority";

/// Seed for the reward delivery token-account PDA
pub const REWARD_PAYOUT_SEED: &[u8] = b"reward_payout";

/// Basis-point denominator
pub const BASIS_POINTS: u64 = 10_000;

/// Default per-protocol unstake percentage per rotation pass (10%)
pub const DEFAULT_UNSTAKE_PERCENT_BPS: u16 = 1_000;

/// Default referral cut taken from each newly pulled reward (2.5%)
pub const DEFAULT_REFERRAL_CUT_BPS: u16 = 250;

/// Upper bound on the configurable withdrawal fee (20%)
pub const MAX_WITHDRAW_FEE_BPS: u16 = 2_000;

/// Registry capacity. Bounded by account space; rotation work per call is
/// O(bucket_size) regardless of how full the registry is.
pub const MAX_PROTOCOLS: usize = 50;

/// Capacity of the retiring list (removed protocols waiting for their
/// stake to unwind)
pub const MAX_RETIRING: usize = 8;

/// Fixed-point scale for referral reward-rate math
pub const REWARD_PRECISION: u128 = 1_000_000_000_000;
