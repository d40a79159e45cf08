//! Benchmarks for order settlement and reward accounting.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench -- batch_fill
//! ```
//!
//! Results are saved to `target/criterion/` with HTML reports.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fundswap_core::exchange::DEFAULT_FEE_BPS;
use fundswap_core::{
    Amount, AssetId, ExchangeConfig, FillKind, FillRequest, OrderBook, Principal, RewardSource,
    StakingPool, TokenLedger, UserId,
};

const WAD: Amount = 1_000_000_000_000_000_000;
const MET: AssetId = 1;
const WMATIC: AssetId = 2;
const USDC: AssetId = 3;

const OWNER: Principal = 1;
const BOOK: Principal = 200;
const POOL: Principal = 101;
const MAKER: UserId = 10;
const TAKER: UserId = 11;

// ============================================================================
// HELPER FUNCTIONS - Deterministic state generation
// ============================================================================

/// Book pre-populated with `count` resting MET/WMATIC orders at seeded
/// pseudo-random prices. Same seed = same book.
fn populated_book(count: usize, seed: u64) -> (OrderBook, TokenLedger) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut ledger = TokenLedger::new();
    ledger.register_asset(MET, 18, Some(OWNER)).unwrap();
    ledger.register_asset(WMATIC, 18, Some(OWNER)).unwrap();
    ledger
        .mint(OWNER, MET, MAKER, (count as Amount + 1) * 10 * WAD)
        .unwrap();
    ledger
        .mint(OWNER, WMATIC, TAKER, (count as Amount + 1) * 100 * WAD)
        .unwrap();

    let mut book = OrderBook::new(
        BOOK,
        OWNER,
        ExchangeConfig { domain_id: 31_337, default_fee_bps: DEFAULT_FEE_BPS },
    )
    .unwrap();
    book.add_token_to_whitelist(OWNER, MET).unwrap();
    book.add_token_to_whitelist(OWNER, WMATIC).unwrap();

    for _ in 0..count {
        let offered: Amount = rng.gen_range(1..=10) * WAD;
        let wanted: Amount = rng.gen_range(1..=8) * offered / 2;
        book.create_public_order(MAKER, &mut ledger, MET, offered, WMATIC, wanted, 0)
            .unwrap();
    }
    (book, ledger)
}

// ============================================================================
// BENCHMARKS
// ============================================================================

/// Partial exact-input fills against a deep book
fn bench_batch_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_fill");
    group.throughput(Throughput::Elements(64));

    group.bench_function("64_partial_fills", |b| {
        b.iter_batched(
            || {
                let (book, ledger) = populated_book(1_000, 42);
                let requests: Vec<FillRequest> = book
                    .get_orders_for_pair(MET, WMATIC)
                    .iter()
                    .take(64)
                    .map(|order| FillRequest {
                        order_id: order.order_id,
                        kind: FillKind::ExactInput,
                        amount: order.amount_wanted / 2,
                    })
                    .collect();
                (book, ledger, requests)
            },
            |(mut book, mut ledger, requests)| {
                let receipts = book
                    .batch_fill_public_orders(TAKER, &mut ledger, &requests, 100)
                    .unwrap();
                black_box(receipts)
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

/// Route construction over a large candidate set
fn bench_routing(c: &mut Criterion) {
    let (book, _ledger) = populated_book(10_000, 7);
    let candidates = book.get_orders_for_pair(MET, WMATIC);

    c.bench_function("route_10k_candidates", |b| {
        b.iter(|| {
            let route = fundswap_core::create_trade_route(
                &fundswap_core::TradeRequest::ExactInput {
                    source_token: WMATIC,
                    destination_token: MET,
                    source_amount: black_box(500 * WAD),
                },
                &candidates,
            )
            .unwrap();
            black_box(route)
        });
    });
}

/// Checkpointed stake/withdraw churn on one pool
fn bench_staking_churn(c: &mut Criterion) {
    c.bench_function("stake_withdraw_1k_users", |b| {
        b.iter_batched(
            || {
                let mut pool =
                    StakingPool::new(POOL, OWNER, RewardSource::Funded { reward_token: USDC });
                pool.start_new_period(OWNER, 86_400, 100_000_000, 0).unwrap();
                pool
            },
            |mut pool| {
                for user in 0..1_000u64 {
                    pool.stake(OWNER, 1_000 + user, WAD, user).unwrap();
                }
                for user in 0..1_000u64 {
                    pool.withdraw(OWNER, 1_000 + user, WAD, 100_000 + user).unwrap();
                }
                black_box(pool.total_staked())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_batch_fill, bench_routing, bench_staking_churn);
criterion_main!(benches);
