use anchor_lang::prelude::*;

/// Custom error codes for the Restaking Vault program
///
/// Three families: precondition failures (bad caller or input, no state
/// change), timing failures (retry after the window clears), and
/// consistency failures (state disagrees with the request).
#[error_code]
pub enum VaultError {
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Cannot divide by zero - vault has no shares")]
    DivisionByZero,

    #[msg("Unauthorized - caller does not hold the required role")]
    Unauthorized,

    #[msg("Insufficient share balance")]
    InsufficientShares,

    #[msg("Insufficient idle liquidity to pay out withdrawal")]
    InsufficientLiquidity,

    #[msg("Invalid token mint - does not match vault configuration")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    #[msg("Restake interval has not elapsed yet")]
    RestakeTooEarly,

    #[msg("Withdrawals are paused by an active claim window")]
    WithdrawalsPaused,

    #[msg("Withdrawal request has not matured yet")]
    WithdrawalNotReady,

    #[msg("No pending withdrawal request for this position")]
    NothingPending,

    #[msg("A pause window is already active")]
    AlreadyPaused,

    #[msg("Claim status does not denote a payable claim")]
    ClaimNotPayable,

    #[msg("Claim date is outside the recency window")]
    ClaimTooOld,

    #[msg("Claim record does not match the requested claim id")]
    ClaimMismatch,

    #[msg("Protocol already exists in registry")]
    ProtocolAlreadyExists,

    #[msg("Protocol not found in registry")]
    ProtocolNotFound,

    #[msg("Protocol registry is full - maximum protocols reached")]
    RegistryFull,

    #[msg("Retiring list is full - wait for pending removals to unwind")]
    RetiringListFull,

    #[msg("Bucket size must be greater than zero")]
    InvalidBucketSize,

    #[msg("Rotation pointer out of registry bounds")]
    InvalidPointer,

    #[msg("Withdrawal fee exceeds the allowed maximum")]
    FeeTooHigh,

    #[msg("Unstake hint does not resolve inside the ledger request list")]
    InvalidHint,

    #[msg("Referral account does not match the position's referrer")]
    InvalidReferralAccount,

    #[msg("Referral ledger reward mode does not accept this asset")]
    InvalidRewardAsset,

    #[msg("Failed to deserialize external collaborator state")]
    ExternalStateInvalid,
}
