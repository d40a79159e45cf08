//! FundSwap Core - demo binary.
//!
//! Drives a small end-to-end scenario through the engine: lock tokens for a
//! weighted deposit, run a rewards period, then trade through the order
//! book with a routed fill.

use fundswap_core::exchange::DEFAULT_FEE_BPS;
use fundswap_core::types::units::from_base_units;
use fundswap_core::{
    ExchangeConfig, FillKind, FillRequest, LockPeriod, LockableAsset, OrderBook, RewardSource,
    StakingPool, TokenLedger, TradeRequest, WeightedLocker,
};

const MET: u64 = 1;
const WMATIC: u64 = 2;
const USDC: u64 = 3;

const OWNER: u64 = 1;
const ALICE: u64 = 10;
const BOB: u64 = 11;
const LOCKER: u64 = 100;
const POOL: u64 = 101;
const BOOK: u64 = 200;

const WAD: u128 = 1_000_000_000_000_000_000;
const DAY: u64 = 86_400;

fn main() -> fundswap_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut ledger = TokenLedger::new();
    ledger.register_asset(MET, 18, Some(OWNER))?;
    ledger.register_asset(WMATIC, 18, Some(OWNER))?;
    ledger.register_asset(USDC, 6, Some(OWNER))?;
    ledger.mint(OWNER, MET, ALICE, 1_000 * WAD)?;
    ledger.mint(OWNER, WMATIC, BOB, 1_000 * WAD)?;
    ledger.mint(OWNER, USDC, POOL, 100_000_000)?; // 100 USDC reward escrow

    // --- staking: 90-day weighted lock plus a one-day rewards period ---
    let mut locker = WeightedLocker::new(LOCKER, OWNER);
    locker.add_lockable_asset(
        OWNER,
        LockableAsset {
            token: MET,
            is_entitled_to_vote: true,
            is_lp_token: false,
            dividend_token_from_pair: None,
            lock_periods: vec![
                LockPeriod { duration_seconds: 0, reward_modifier_bps: 10_000 },
                LockPeriod { duration_seconds: 90 * DAY, reward_modifier_bps: 10_200 },
            ],
            deposits_enabled: true,
        },
    )?;
    let mut pool = StakingPool::new(POOL, OWNER, RewardSource::Funded { reward_token: USDC });
    pool.grant_role(OWNER, fundswap_core::Role::Operator, LOCKER)?;
    locker.add_staking_pool(OWNER, pool)?;

    let receipt = locker.stake(ALICE, &mut ledger, 0, 1, 100 * WAD, 0)?;
    println!(
        "locked {} MET -> {} weighted, unlocks at {}",
        from_base_units(receipt.principal_amount, 18),
        from_base_units(receipt.weighted_amount, 18),
        receipt.unlock_timestamp,
    );

    if let Some(pool) = locker.staking_pool_mut(0) {
        pool.start_new_period(OWNER, DAY, 100_000_000, 0)?;
    }
    let claim = locker.collect_rewards(ALICE, &mut ledger, 0, DAY)?;
    println!("rewards after one day: {} USDC", from_base_units(claim.amount, 6));

    // --- exchange: rest two orders, route, batch fill ---
    let mut book = OrderBook::new(
        BOOK,
        OWNER,
        ExchangeConfig { domain_id: 31_337, default_fee_bps: DEFAULT_FEE_BPS },
    )?;
    for token in [MET, WMATIC, USDC] {
        book.add_token_to_whitelist(OWNER, token)?;
    }

    book.create_public_order(ALICE, &mut ledger, MET, WAD, WMATIC, 4 * WAD, 0)?;
    book.create_public_order(ALICE, &mut ledger, MET, WAD, WMATIC, 2 * WAD, 0)?;

    let route = fundswap_core::create_trade_route(
        &TradeRequest::ExactInput {
            source_token: WMATIC,
            destination_token: MET,
            source_amount: 6 * WAD,
        },
        &book.get_orders_for_pair(MET, WMATIC),
    )?;
    println!("route over resting orders: {:?}", route);

    let requests: Vec<FillRequest> = route
        .iter()
        .filter_map(|&order_id| {
            book.order(order_id).map(|order| FillRequest {
                order_id,
                kind: FillKind::ExactInput,
                amount: order.amount_wanted,
            })
        })
        .collect();
    let fills = book.batch_fill_public_orders(BOB, &mut ledger, &requests, DAY)?;
    for fill in &fills {
        println!(
            "filled order {:?}: paid {} WMATIC, received {} MET (fee {})",
            fill.order_id,
            from_base_units(fill.amount_paid, 18),
            from_base_units(fill.amount_received, 18),
            from_base_units(fill.fee, 18),
        );
    }

    println!(
        "accrued MET fees: {}",
        from_base_units(book.collected_fees(MET), 18),
    );
    Ok(())
}
