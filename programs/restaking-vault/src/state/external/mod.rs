pub mod claims;
pub mod pooled_staking;
