use anchor_lang::prelude::*;

use crate::errors::VaultError;

/// Linear release of a lump reward over a fixed window.
///
/// Embedded in `VaultState` to smooth the share price: only the released
/// portion of the last pulled reward counts toward AUM, so a lump claim
/// never steps the price in a single slot.
///
/// Invariant: `released(t)` is monotonic non-decreasing until
/// `stream_duration` elapses, then constant until the next fold.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardStream {
    /// Amount being released by the current stream
    pub last_reward_amount: u64,

    /// When the current stream started
    pub last_reward_timestamp: i64,

    /// Release window length in seconds
    pub stream_duration: i64,
}

impl RewardStream {
    /// Portion of `last_reward_amount` released at `now`.
    pub fn released(&self, now: i64) -> Result<u64> {
        if self.last_reward_amount == 0 || self.stream_duration == 0 {
            return Ok(self.last_reward_amount);
        }
        let elapsed = now
            .saturating_sub(self.last_reward_timestamp)
            .clamp(0, self.stream_duration);

        let released = (self.last_reward_amount as u128)
            .checked_mul(elapsed as u128)
            .ok_or(error!(VaultError::MathOverflow))?
            .checked_div(self.stream_duration as u128)
            .ok_or(error!(VaultError::DivisionByZero))?;

        u64::try_from(released).map_err(|_| error!(VaultError::MathOverflow))
    }

    /// Portion of the current stream not yet released at `now`. This is the
    /// amount excluded from AUM.
    pub fn unreleased(&self, now: i64) -> Result<u64> {
        Ok(self.last_reward_amount.saturating_sub(self.released(now)?))
    }

    /// Whether any part of the current stream is still releasing.
    pub fn is_active(&self, now: i64) -> bool {
        self.last_reward_amount > 0
            && now < self.last_reward_timestamp.saturating_add(self.stream_duration)
    }

    /// Start a new stream of `new_amount` plus whatever the previous stream
    /// had not released yet. The undistributed remainder is never lost.
    pub fn fold(&mut self, new_amount: u64, now: i64) -> Result<()> {
        let carried = self.unreleased(now)?;
        self.last_reward_amount = carried
            .checked_add(new_amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        self.last_reward_timestamp = now;
        Ok(())
    }

    /// Refresh the timestamp without starting a stream. Used when a pull
    /// claims nothing and no stream is active, as an idempotent marker.
    pub fn mark(&mut self, now: i64) {
        self.last_reward_timestamp = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(amount: u64, start: i64, duration: i64) -> RewardStream {
        RewardStream {
            last_reward_amount: amount,
            last_reward_timestamp: start,
            stream_duration: duration,
        }
    }

    #[test]
    fn releases_linearly_over_duration() {
        let s = stream(900, 0, 900);
        assert_eq!(s.released(300).unwrap(), 300);
        assert_eq!(s.released(600).unwrap(), 600);
        assert_eq!(s.released(900).unwrap(), 900);
        // constant after the window ends
        assert_eq!(s.released(5_000).unwrap(), 900);
    }

    #[test]
    fn released_is_zero_before_start() {
        let s = stream(900, 100, 900);
        assert_eq!(s.released(100).unwrap(), 0);
        assert_eq!(s.released(50).unwrap(), 0);
    }

    #[test]
    fn fold_carries_unreleased_remainder() {
        let mut s = stream(900, 0, 900);
        // a third of the way through, 600 is still unreleased
        s.fold(300, 300).unwrap();
        assert_eq!(s.last_reward_amount, 900);
        assert_eq!(s.last_reward_timestamp, 300);
        assert_eq!(s.released(1_200).unwrap(), 900);
    }

    #[test]
    fn fold_after_expiry_carries_nothing() {
        let mut s = stream(900, 0, 900);
        s.fold(100, 2_000).unwrap();
        assert_eq!(s.last_reward_amount, 100);
    }

    #[test]
    fn mark_keeps_stream_inactive() {
        let mut s = stream(0, 0, 900);
        s.mark(500);
        assert!(!s.is_active(501));
        assert_eq!(s.unreleased(501).unwrap(), 0);
    }
}
