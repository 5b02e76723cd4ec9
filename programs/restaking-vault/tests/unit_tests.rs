use anchor_lang::prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use restaking_vault::constants::*;
    use restaking_vault::state::*;

    fn mock_vault(idle: u64, staked: u64, total_shares: u64) -> VaultState {
        VaultState {
            authority: Pubkey::default(),
            operator: Pubkey::default(),
            asset_mint: Pubkey::default(),
            raw_mint: Pubkey::default(),
            staking_ledger: Pubkey::default(),
            claims_program: Pubkey::default(),
            total_shares,
            idle_balance: idle,
            total_staked: staked,
            total_pending_unstake: 0,
            reserve_amount: 0,
            withdraw_fee_bps: 0,
            referral_cut_bps: DEFAULT_REFERRAL_CUT_BPS,
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
        }
    }

    #[test]
    fn test_first_deposit_mints_one_to_one() {
        let vault = mock_vault(0, 0, 0);
        let deposit = 1000_000_000_000u64; // 1000 tokens with 9 decimals
        assert_eq!(vault.calculate_shares(deposit, 0).unwrap(), deposit);
    }

    #[test]
    fn test_deposit_after_profit_mints_proportionally() {
        // 1500 AUM backing 1000 shares after rewards streamed in
        let vault = mock_vault(500_000_000_000, 1000_000_000_000, 1000_000_000_000);
        // 100 * 1000 / 1500 = 66.666... = 66 (integer division)
        assert_eq!(
            vault.calculate_shares(100_000_000_000, 0).unwrap(),
            66_666_666_666
        );
    }

    #[test]
    fn test_share_math_handles_extreme_values() {
        let vault = mock_vault(1_000_000_000, 0, 1_000_000_000);
        assert!(vault.calculate_shares(u64::MAX, 0).is_ok());
        assert_eq!(vault.calculate_assets(0, 0).unwrap(), 0);

        // no shares outstanding: value of any share count is zero
        let empty = mock_vault(500, 0, 0);
        assert_eq!(empty.calculate_assets(100, 0).unwrap(), 0);
    }

    #[test]
    fn test_pda_derivation() {
        let program_id = restaking_vault::id();
        let asset_mint = Pubkey::new_unique();

        let (vault_state, vault_bump) =
            Pubkey::find_program_address(&[VAULT_SEED, asset_mint.as_ref()], &program_id);

        let (vault_authority, authority_bump) = Pubkey::find_program_address(
            &[VAULT_AUTHORITY_SEED, asset_mint.as_ref()],
            &program_id,
        );

        let (payout_authority, payout_bump) = Pubkey::find_program_address(
            &[PAYOUT_AUTHORITY_SEED, asset_mint.as_ref()],
            &program_id,
        );

        assert_ne!(vault_state, vault_authority);
        assert_ne!(vault_state, payout_authority);
        assert_ne!(vault_authority, payout_authority);

        assert!(vault_bump <= 255);
        assert!(authority_bump <= 255);
        assert!(payout_bump <= 255);
    }

    #[test]
    fn test_position_and_referral_pdas_scope_by_owner() {
        let program_id = restaking_vault::id();
        let asset_mint = Pubkey::new_unique();
        let (vault_state, _) =
            Pubkey::find_program_address(&[VAULT_SEED, asset_mint.as_ref()], &program_id);

        let depositor_1 = Pubkey::new_unique();
        let depositor_2 = Pubkey::new_unique();

        let (position_1, _) = Pubkey::find_program_address(
            &[POSITION_SEED, vault_state.as_ref(), depositor_1.as_ref()],
            &program_id,
        );
        let (position_2, _) = Pubkey::find_program_address(
            &[POSITION_SEED, vault_state.as_ref(), depositor_2.as_ref()],
            &program_id,
        );
        assert_ne!(position_1, position_2, "Positions should be unique per owner");

        let (ledger, _) = Pubkey::find_program_address(
            &[REFERRAL_LEDGER_SEED, vault_state.as_ref()],
            &program_id,
        );
        let (referral_1, _) = Pubkey::find_program_address(
            &[REFERRAL_ACCOUNT_SEED, ledger.as_ref(), depositor_1.as_ref()],
            &program_id,
        );
        let (referral_2, _) = Pubkey::find_program_address(
            &[REFERRAL_ACCOUNT_SEED, ledger.as_ref(), depositor_2.as_ref()],
            &program_id,
        );
        assert_ne!(referral_1, referral_2, "Referral accounts unique per referrer");
    }

    #[test]
    fn test_referral_cut_math() {
        // 2.5% of a pulled reward in basis points
        let claimed = 1_000u64;
        let cut = (claimed as u128 * DEFAULT_REFERRAL_CUT_BPS as u128) / BASIS_POINTS as u128;
        assert_eq!(cut, 25);

        // rounding truncates toward the stream, never over-pays referrers
        let claimed = 39u64;
        let cut = (claimed as u128 * DEFAULT_REFERRAL_CUT_BPS as u128) / BASIS_POINTS as u128;
        assert_eq!(cut, 0);
    }

    #[test]
    fn test_pending_unstake_stays_in_aum_until_realized() {
        let mut vault = mock_vault(0, 10_000, 10_000);
        vault.total_pending_unstake = 1_000;
        // requesting an unstake changes nothing until realization
        assert_eq!(vault.aum(0).unwrap(), 10_000);
    }
}
