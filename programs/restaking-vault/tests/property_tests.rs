/// Property tests over the rotation cursor and share accounting
use anchor_lang::prelude::*;
use proptest::prelude::*;

use restaking_vault::constants::*;
use restaking_vault::state::*;

fn registry(len: usize, bucket_size: u32) -> ProtocolRegistry {
    ProtocolRegistry {
        vault: Pubkey::default(),
        protocols: (0..len)
            .map(|_| Protocol::new(Pubkey::new_unique(), 1, DEFAULT_UNSTAKE_PERCENT_BPS))
            .collect(),
        retiring: Vec::new(),
        checkpoint: 0,
        start: 0,
        bucket_size,
        bump: 0,
    }
}

proptest! {
    /// After ceil(len / bucket) passes every protocol is visited exactly
    /// once and the checkpoint meets the cursor.
    #[test]
    fn rotation_covers_registry_exactly_once(
        len in 1usize..=MAX_PROTOCOLS,
        bucket_size in 1u32..=64,
    ) {
        let mut reg = registry(len, bucket_size);
        let calls = (len as u32 + bucket_size - 1) / bucket_size;
        let mut visits = vec![0u32; len];
        let mut completed = false;

        for _ in 0..calls {
            let (indices, done) = reg.advance_bucket();
            prop_assert!(!indices.is_empty());
            for idx in indices {
                visits[idx] += 1;
            }
            completed = done;
        }

        prop_assert!(completed);
        prop_assert!(visits.iter().all(|&v| v == 1));
        prop_assert_eq!(reg.checkpoint, reg.start);
        prop_assert!((reg.start as usize) < len);
    }

    /// The cursor stays inside the registry across arbitrarily many passes.
    #[test]
    fn rotation_cursor_stays_in_bounds(
        len in 1usize..=MAX_PROTOCOLS,
        bucket_size in 1u32..=64,
        passes in 1usize..200,
    ) {
        let mut reg = registry(len, bucket_size);
        for _ in 0..passes {
            let (indices, _) = reg.advance_bucket();
            prop_assert!(indices.iter().all(|&i| i < len));
            prop_assert!((reg.start as usize) < len);
            prop_assert!((reg.checkpoint as usize) < len);
        }
    }

    /// Weight-proportional staking never allocates more than the free
    /// balance, and mirrors stay additive.
    #[test]
    fn stake_distribution_never_exceeds_free_balance(
        weights in proptest::collection::vec(0u64..1_000, 1..10),
        free in 0u64..1_000_000_000,
    ) {
        let mut reg = registry(weights.len(), weights.len() as u32);
        for (p, &w) in reg.protocols.iter_mut().zip(weights.iter()) {
            p.weight = w;
        }
        let (indices, _) = reg.advance_bucket();
        let (plans, total) = reg.plan_stakes(&indices, free).unwrap();

        prop_assert!(total <= free);
        let planned: u64 = plans.iter().map(|p| p.amount).sum();
        prop_assert_eq!(planned, total);
        let mirrored: u64 = reg.protocols.iter().map(|p| p.staked).sum();
        prop_assert_eq!(mirrored, total);
    }

    /// Unstake sizing stays within the configured percentage and inside the
    /// staked mirror.
    #[test]
    fn unstake_requests_respect_percentage_and_stake(
        stakes in proptest::collection::vec(0u64..1_000_000_000, 1..10),
        percent_bps in 0u16..=10_000,
    ) {
        let mut reg = registry(stakes.len(), stakes.len() as u32);
        for (p, &s) in reg.protocols.iter_mut().zip(stakes.iter()) {
            p.staked = s;
            p.unstake_percent_bps = percent_bps;
        }
        let (indices, _) = reg.advance_bucket();
        let plans = reg.plan_unstakes(&indices, 0, 100).unwrap();

        for plan in &plans {
            let idx = reg.find(&plan.protocol).unwrap();
            let p = &reg.protocols[idx];
            prop_assert!(p.pending_unstake <= p.staked);
            prop_assert_eq!(
                plan.amount,
                (stakes[idx] as u128 * percent_bps as u128 / BASIS_POINTS as u128) as u64
            );
        }
    }

    /// With no reward pulls the share price stays 1:1 through any sequence
    /// of deposits and full or partial withdrawals.
    #[test]
    fn share_price_invariant_under_deposits_and_withdrawals(
        ops in proptest::collection::vec((0u8..2, 1u64..1_000_000), 1..40),
    ) {
        let mut vault = VaultState {
            authority: Pubkey::default(),
            operator: Pubkey::default(),
            asset_mint: Pubkey::default(),
            raw_mint: Pubkey::default(),
            staking_ledger: Pubkey::default(),
            claims_program: Pubkey::default(),
            total_shares: 0,
            idle_balance: 0,
            total_staked: 0,
            total_pending_unstake: 0,
            reserve_amount: 0,
            withdraw_fee_bps: 0,
            referral_cut_bps: 0,
            withdraw_delay: 0,
            pause_duration: 0,
            claim_recency_window: 0,
            paused_until: 0,
            min_restake_interval: 0,
            last_restake_time: 0,
            reward_stream: RewardStream::default(),
            bump: 0,
            authority_bump: 0,
            payout_bump: 0,
            _reserved: [0; 64],
        };

        let mut now = 0i64;
        for (op, amount) in ops {
            now += 1;
            if op == 0 {
                let shares = vault.calculate_shares(amount, now).unwrap();
                vault.credit_idle(amount).unwrap();
                vault.total_shares += shares;
            } else if vault.total_shares > 0 {
                let shares = amount.min(vault.total_shares);
                let payout = vault.calculate_assets(shares, now).unwrap();
                vault.total_shares -= shares;
                vault.debit_idle(payout).unwrap();
            }
            prop_assert_eq!(vault.aum(now).unwrap(), vault.total_shares);
        }
    }
}
