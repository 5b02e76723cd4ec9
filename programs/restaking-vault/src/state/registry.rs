use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;

/// One protocol exposure inside the external pooled-staking ledger.
///
/// `staked` / `pending_unstake` mirror the ledger's view of the vault's
/// position; they move only inside the instruction that issued the
/// corresponding stake/unstake, never lazily.
#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Debug, PartialEq)]
pub struct Protocol {
    /// Protocol identity inside the external ledger
    pub key: Pubkey,

    /// Target weight relative to the other protocols in the same bucket
    pub weight: u64,

    /// Percentage of the free stake unstaked per rotation pass
    pub unstake_percent_bps: u16,

    /// Amount currently staked on this protocol (includes pending unstake)
    pub staked: u64,

    /// Portion of `staked` with an open unstake request
    pub pending_unstake: u64,

    /// When the open unstake request matures (lock window end)
    pub pending_unstake_at: i64,
}

impl Protocol {
    pub fn new(key: Pubkey, weight: u64, unstake_percent_bps: u16) -> Self {
        Self {
            key,
            weight,
            unstake_percent_bps,
            staked: 0,
            pending_unstake: 0,
            pending_unstake_at: 0,
        }
    }

    /// Move a matured pending unstake out of the staked mirror.
    /// Returns the realized amount (zero when nothing matured).
    pub fn realize_matured(&mut self, now: i64) -> Result<u64> {
        if self.pending_unstake == 0 || now < self.pending_unstake_at {
            return Ok(0);
        }
        let amount = self.pending_unstake;
        self.staked = self
            .staked
            .checked_sub(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        self.pending_unstake = 0;
        self.pending_unstake_at = 0;
        Ok(amount)
    }

    pub fn is_unwound(&self) -> bool {
        self.staked == 0 && self.pending_unstake == 0
    }
}

/// Desired configuration for one protocol, passed to `change_protocols`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct ProtocolConfig {
    pub key: Pubkey,
    pub weight: u64,
    pub unstake_percent_bps: u16,
}

/// An unstake instruction planned for the external ledger
#[derive(Clone, Debug, PartialEq)]
pub struct UnstakePlan {
    pub protocol: Pubkey,
    pub amount: u64,
    pub unstake_at: i64,
}

/// A stake instruction planned for the external ledger
#[derive(Clone, Debug, PartialEq)]
pub struct StakePlan {
    pub protocol: Pubkey,
    pub amount: u64,
}

/// Ordered protocol registry plus the rotation cursor.
///
/// Order determines rotation traversal, not priority. Work per restake call
/// is bounded by `bucket_size` (plus the constant-capacity retiring list),
/// so the registry can grow without growing the per-call cost.
#[account]
#[derive(InitSpace)]
pub struct ProtocolRegistry {
    /// Vault this registry belongs to
    pub vault: Pubkey,

    /// Active protocols, traversed in order by the rotation
    #[max_len(MAX_PROTOCOLS)]
    pub protocols: Vec<Protocol>,

    /// Removed protocols still waiting for their stake to unwind
    #[max_len(MAX_RETIRING)]
    pub retiring: Vec<Protocol>,

    /// Index where the current rotation began (last completion point)
    pub checkpoint: u32,

    /// Index of the next protocol to process
    pub start: u32,

    /// Protocols processed per restake call
    pub bucket_size: u32,

    pub bump: u8,
}

impl ProtocolRegistry {
    pub fn find(&self, key: &Pubkey) -> Option<usize> {
        self.protocols.iter().position(|p| p.key == *key)
    }

    /// Protocols processed so far in the current rotation.
    fn rotation_processed(&self) -> u32 {
        let len = self.protocols.len() as u32;
        if len == 0 {
            return 0;
        }
        (self.start + len - self.checkpoint) % len
    }

    /// Select the indices for this restake pass and advance the cursor.
    ///
    /// The pass is clipped at the rotation boundary so every protocol is
    /// visited exactly once per rotation; when the cursor returns to
    /// `checkpoint` the rotation is complete and the checkpoint moves.
    /// Returns the selected indices and whether the rotation completed.
    pub fn advance_bucket(&mut self) -> (Vec<usize>, bool) {
        let len = self.protocols.len() as u32;
        if len == 0 || self.bucket_size == 0 {
            return (Vec::new(), false);
        }

        let processed = self.rotation_processed();
        let remaining = if processed == 0 { len } else { len - processed };
        let step = self.bucket_size.min(remaining);

        let indices = (0..step)
            .map(|i| ((self.start + i) % len) as usize)
            .collect();

        self.start = (self.start + step) % len;
        let completed = step == remaining;
        if completed {
            self.checkpoint = self.start;
        }
        (indices, completed)
    }

    /// Realize matured unstakes for the given bucket plus the retiring
    /// list, dropping retiring entries that have fully unwound.
    /// Returns the total realized amount.
    pub fn realize_matured(&mut self, indices: &[usize], now: i64) -> Result<u64> {
        let mut realized: u64 = 0;
        for &idx in indices {
            let amount = self.protocols[idx].realize_matured(now)?;
            realized = realized
                .checked_add(amount)
                .ok_or(error!(VaultError::MathOverflow))?;
        }
        for p in self.retiring.iter_mut() {
            let amount = p.realize_matured(now)?;
            realized = realized
                .checked_add(amount)
                .ok_or(error!(VaultError::MathOverflow))?;
        }
        self.retiring.retain(|p| !p.is_unwound());
        Ok(realized)
    }

    /// Issue one unstake request per bucket protocol, sized as the
    /// configured percentage of `staked - pending_unstake`. The request is
    /// folded into the protocol's pending slot with the new maturity.
    pub fn plan_unstakes(
        &mut self,
        indices: &[usize],
        now: i64,
        lock_seconds: i64,
    ) -> Result<Vec<UnstakePlan>> {
        let mut plans = Vec::with_capacity(indices.len());
        let unstake_at = now
            .checked_add(lock_seconds)
            .ok_or(error!(VaultError::MathOverflow))?;

        for &idx in indices {
            let p = &mut self.protocols[idx];
            let available = p
                .staked
                .checked_sub(p.pending_unstake)
                .ok_or(error!(VaultError::MathOverflow))?;
            let amount = (available as u128)
                .checked_mul(p.unstake_percent_bps as u128)
                .ok_or(error!(VaultError::MathOverflow))?
                / BASIS_POINTS as u128;
            let amount = u64::try_from(amount).map_err(|_| error!(VaultError::MathOverflow))?;
            if amount == 0 {
                continue;
            }
            p.pending_unstake = p
                .pending_unstake
                .checked_add(amount)
                .ok_or(error!(VaultError::MathOverflow))?;
            p.pending_unstake_at = unstake_at;
            plans.push(UnstakePlan {
                protocol: p.key,
                amount,
                unstake_at,
            });
        }
        Ok(plans)
    }

    /// Distribute `free` across the bucket proportional to target weight.
    /// Integer-division dust stays idle. Returns the plans and the total
    /// actually allocated.
    pub fn plan_stakes(&mut self, indices: &[usize], free: u64) -> Result<(Vec<StakePlan>, u64)> {
        let bucket_weight: u64 = indices
            .iter()
            .map(|&idx| self.protocols[idx].weight)
            .sum();
        if free == 0 || bucket_weight == 0 {
            return Ok((Vec::new(), 0));
        }

        let mut plans = Vec::with_capacity(indices.len());
        let mut total: u64 = 0;
        for &idx in indices {
            let p = &mut self.protocols[idx];
            let amount = (free as u128)
                .checked_mul(p.weight as u128)
                .ok_or(error!(VaultError::MathOverflow))?
                / bucket_weight as u128;
            let amount = u64::try_from(amount).map_err(|_| error!(VaultError::MathOverflow))?;
            if amount == 0 {
                continue;
            }
            p.staked = p
                .staked
                .checked_add(amount)
                .ok_or(error!(VaultError::MathOverflow))?;
            total = total
                .checked_add(amount)
                .ok_or(error!(VaultError::MathOverflow))?;
            plans.push(StakePlan {
                protocol: p.key,
                amount,
            });
        }
        Ok((plans, total))
    }

    /// Replace the protocol set. Every existing protocol must appear in the
    /// new list (mirrors carried over) or in `removed`; removed entries with
    /// live stake get a full unstake request and park in `retiring` until
    /// the rotation realizes them. Returns the unstake plans issued for the
    /// removals.
    pub fn apply_protocol_changes(
        &mut self,
        new_list: Vec<ProtocolConfig>,
        removed: Vec<Pubkey>,
        now: i64,
        lock_seconds: i64,
    ) -> Result<Vec<UnstakePlan>> {
        require!(new_list.len() <= MAX_PROTOCOLS, VaultError::RegistryFull);
        for (i, cfg) in new_list.iter().enumerate() {
            require!(
                !new_list[..i].iter().any(|c| c.key == cfg.key),
                VaultError::ProtocolAlreadyExists
            );
        }

        let unstake_at = now
            .checked_add(lock_seconds)
            .ok_or(error!(VaultError::MathOverflow))?;
        let mut plans = Vec::new();
        let old = std::mem::take(&mut self.protocols);

        for mut p in old.iter().cloned() {
            if new_list.iter().any(|c| c.key == p.key) {
                continue;
            }
            require!(removed.contains(&p.key), VaultError::ProtocolNotFound);
            if p.is_unwound() {
                continue;
            }
            // reconcile remaining stake before the entry disappears
            let additional = p
                .staked
                .checked_sub(p.pending_unstake)
                .ok_or(error!(VaultError::MathOverflow))?;
            if additional > 0 {
                plans.push(UnstakePlan {
                    protocol: p.key,
                    amount: additional,
                    unstake_at,
                });
            }
            p.pending_unstake = p.staked;
            p.pending_unstake_at = unstake_at;
            require!(
                self.retiring.len() < MAX_RETIRING,
                VaultError::RetiringListFull
            );
            self.retiring.push(p);
        }

        // the new list defines the traversal order; mirrors carry over
        self.protocols = new_list
            .into_iter()
            .map(|cfg| {
                if let Some(existing) = old.iter().find(|p| p.key == cfg.key) {
                    let mut p = existing.clone();
                    p.weight = cfg.weight;
                    p.unstake_percent_bps = cfg.unstake_percent_bps;
                    p
                } else {
                    Protocol::new(cfg.key, cfg.weight, cfg.unstake_percent_bps)
                }
            })
            .collect();

        // keep the cursor inside the new bounds
        let len = self.protocols.len() as u32;
        if len == 0 {
            self.start = 0;
            self.checkpoint = 0;
        } else {
            if self.start >= len {
                self.start = 0;
            }
            if self.checkpoint >= len {
                self.checkpoint = 0;
            }
        }
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(stakes: &[u64], bucket_size: u32) -> ProtocolRegistry {
        ProtocolRegistry {
            vault: Pubkey::default(),
            protocols: stakes
                .iter()
                .map(|&s| {
                    let mut p = Protocol::new(
                        Pubkey::new_unique(),
                        1,
                        DEFAULT_UNSTAKE_PERCENT_BPS,
                    );
                    p.staked = s;
                    p
                })
                .collect(),
            retiring: Vec::new(),
            checkpoint: 0,
            start: 0,
            bucket_size,
            bump: 0,
        }
    }

    #[test]
    fn rotation_visits_every_protocol_exactly_once() {
        let mut reg = registry(&[0; 5], 2);
        let mut visits = vec![0u32; 5];
        let mut completed = false;
        // ceil(5 / 2) = 3 calls
        for _ in 0..3 {
            let (indices, done) = reg.advance_bucket();
            for idx in indices {
                visits[idx] += 1;
            }
            completed = done;
        }
        assert!(completed);
        assert_eq!(visits, vec![1; 5]);
        assert_eq!(reg.checkpoint, reg.start);
    }

    #[test]
    fn bucket_larger_than_registry_completes_in_one_call() {
        let mut reg = registry(&[0; 3], 10);
        let (indices, done) = reg.advance_bucket();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(done);
        assert_eq!(reg.start, 0);
        assert_eq!(reg.checkpoint, 0);
    }

    #[test]
    fn empty_registry_yields_no_bucket() {
        let mut reg = registry(&[], 4);
        let (indices, done) = reg.advance_bucket();
        assert!(indices.is_empty());
        assert!(!done);
    }

    #[test]
    fn full_rotation_unstakes_configured_percentage() {
        let mut reg = registry(&[10_000, 20_000, 30_000, 40_000, 50_000], 2);
        let pre: Vec<u64> = reg.protocols.iter().map(|p| p.staked).collect();
        for _ in 0..3 {
            let (indices, _) = reg.advance_bucket();
            reg.plan_unstakes(&indices, 0, 100).unwrap();
        }
        for (p, &before) in reg.protocols.iter().zip(pre.iter()) {
            assert_eq!(p.pending_unstake, before / 10);
        }
    }

    #[test]
    fn realize_waits_for_lock_window() {
        let mut reg = registry(&[10_000], 1);
        let (indices, _) = reg.advance_bucket();
        reg.plan_unstakes(&indices, 0, 100).unwrap();
        assert_eq!(reg.realize_matured(&indices, 50).unwrap(), 0);
        assert_eq!(reg.realize_matured(&indices, 100).unwrap(), 1_000);
        assert_eq!(reg.protocols[0].staked, 9_000);
        assert_eq!(reg.protocols[0].pending_unstake, 0);
    }

    #[test]
    fn stake_distribution_follows_weights() {
        let mut reg = registry(&[0, 0], 2);
        reg.protocols[0].weight = 3;
        reg.protocols[1].weight = 1;
        let (indices, _) = reg.advance_bucket();
        let (plans, total) = reg.plan_stakes(&indices, 1_000).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].amount, 750);
        assert_eq!(plans[1].amount, 250);
        assert_eq!(total, 1_000);
        assert_eq!(reg.protocols[0].staked, 750);
    }

    #[test]
    fn removal_parks_stake_in_retiring_until_unwound() {
        let mut reg = registry(&[5_000, 7_000], 2);
        let keep = reg.protocols[0].key;
        let drop_key = reg.protocols[1].key;
        let plans = reg
            .apply_protocol_changes(
                vec![ProtocolConfig {
                    key: keep,
                    weight: 1,
                    unstake_percent_bps: DEFAULT_UNSTAKE_PERCENT_BPS,
                }],
                vec![drop_key],
                0,
                100,
            )
            .unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].amount, 7_000);
        assert_eq!(reg.protocols.len(), 1);
        assert_eq!(reg.retiring.len(), 1);

        // lock elapses, a later pass realizes and drops the entry
        let realized = reg.realize_matured(&[], 100).unwrap();
        assert_eq!(realized, 7_000);
        assert!(reg.retiring.is_empty());
    }

    #[test]
    fn removal_of_unknown_protocol_is_rejected() {
        let mut reg = registry(&[1_000], 1);
        let err = reg.apply_protocol_changes(Vec::new(), Vec::new(), 0, 100);
        assert!(err.is_err());
    }
}
