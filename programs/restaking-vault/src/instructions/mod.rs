pub mod change_config;
pub mod change_protocols;
pub mod deposit;
pub mod initialize;
pub mod pause_withdrawals;
pub mod pull_reward;
pub mod referral;
pub mod request_withdrawal;
pub mod restake;
pub mod stake_manual;
pub mod transfer_shares;
pub mod withdraw;
pub mod withdraw_requested;

pub use change_config::*;
pub use change_protocols::*;
pub use deposit::*;
pub use initialize::*;
pub use pause_withdrawals::*;
pub use pull_reward::*;
pub use referral::*;
pub use request_withdrawal::*;
pub use restake::*;
pub use stake_manual::*;
pub use transfer_shares::*;
pub use withdraw::*;
pub use withdraw_requested::*;
