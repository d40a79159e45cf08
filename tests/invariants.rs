//! Property-based invariants for the staking subsystem.
//!
//! These run randomized operation sequences and check the accounting
//! identities that every state must satisfy, regardless of ordering.

use proptest::prelude::*;

use fundswap_core::{Amount, AssetId, Principal, RewardSource, StakingPool, TokenLedger, UserId};

const DAY: u64 = 86_400;
const WAD: Amount = 1_000_000_000_000_000_000;
const USDC: AssetId = 3;
const OWNER: Principal = 1;
const POOL: Principal = 101;

const USERS: [UserId; 4] = [10, 11, 12, 13];

/// One step of a randomized staking history.
#[derive(Debug, Clone, Copy)]
enum Op {
    Stake { user_index: usize, amount: Amount },
    Withdraw { user_index: usize, amount: Amount },
    Advance { seconds: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS.len(), 1u128..=1_000u128)
            .prop_map(|(user_index, units)| Op::Stake { user_index, amount: units * WAD }),
        (0..USERS.len(), 1u128..=1_000u128)
            .prop_map(|(user_index, units)| Op::Withdraw { user_index, amount: units * WAD }),
        (1u64..=DAY).prop_map(|seconds| Op::Advance { seconds }),
    ]
}

fn fresh_pool() -> StakingPool {
    StakingPool::new(POOL, OWNER, RewardSource::Funded { reward_token: USDC })
}

proptest! {
    /// Sum of user principals equals the pool total after any sequence.
    #[test]
    fn principal_sum_equals_total_staked(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut pool = fresh_pool();
        let mut now = 0u64;
        pool.start_new_period(OWNER, 30 * DAY, 100_000_000, now).unwrap();

        for op in ops {
            match op {
                Op::Stake { user_index, amount } => {
                    pool.stake(OWNER, USERS[user_index], amount, now).unwrap();
                }
                Op::Withdraw { user_index, amount } => {
                    // over-withdrawals must fail without touching state
                    let before: Amount = USERS.iter().map(|&u| pool.balance_of(u)).sum();
                    let result = pool.withdraw(OWNER, USERS[user_index], amount, now);
                    if result.is_err() {
                        let after: Amount = USERS.iter().map(|&u| pool.balance_of(u)).sum();
                        prop_assert_eq!(before, after);
                    }
                }
                Op::Advance { seconds } => now += seconds,
            }
            let sum: Amount = USERS.iter().map(|&u| pool.balance_of(u)).sum();
            prop_assert_eq!(sum, pool.total_staked());
        }
    }

    /// The reward-per-token accumulator never decreases.
    #[test]
    fn reward_per_token_is_monotonic(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut pool = fresh_pool();
        let mut now = 0u64;
        pool.stake(OWNER, USERS[0], WAD, now).unwrap();
        pool.start_new_period(OWNER, 30 * DAY, 100_000_000, now).unwrap();

        let mut previous = pool.earned(USERS[0], now).unwrap();
        for op in ops {
            match op {
                Op::Stake { user_index, amount } => {
                    pool.stake(OWNER, USERS[user_index], amount, now).unwrap();
                }
                Op::Withdraw { user_index, amount } => {
                    let _ = pool.withdraw(OWNER, USERS[user_index], amount, now);
                }
                Op::Advance { seconds } => now += seconds,
            }
            // nothing here claims, so accrual can only grow
            let earned = pool.earned(USERS[0], now).unwrap();
            prop_assert!(earned >= previous);
            previous = earned;
        }
    }

    /// Claiming twice at the same instant pays once, then zero.
    #[test]
    fn double_claim_is_idempotent(
        stake_units in 1u128..=1_000u128,
        elapsed in 1u64..=30 * DAY,
    ) {
        let mut ledger = TokenLedger::new();
        ledger.register_asset(USDC, 6, Some(OWNER)).unwrap();
        ledger.mint(OWNER, USDC, POOL, 1_000_000_000).unwrap();

        let mut pool = fresh_pool();
        pool.stake(OWNER, USERS[0], stake_units * WAD, 0).unwrap();
        pool.start_new_period(OWNER, 30 * DAY, 100_000_000, 0).unwrap();

        let earned = pool.earned(USERS[0], elapsed).unwrap();
        let first = pool.collect_reward(OWNER, &mut ledger, USERS[0], elapsed).unwrap();
        let second = pool.collect_reward(OWNER, &mut ledger, USERS[0], elapsed).unwrap();

        prop_assert_eq!(first.amount, earned);
        prop_assert_eq!(second.amount, 0);
        prop_assert_eq!(ledger.balance_of(USDC, USERS[0]), earned);
    }
}
