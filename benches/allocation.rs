//! Benchmarks for the order allocator.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark
//! cargo bench -- buy_allocation
//! ```
//!
//! Results are saved to `target/criterion/` with HTML reports.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::time::Duration;

use order_allocator::engine::{allocate_buy, allocate_sell, WorkingBuyOrder, WorkingSellOrder};
use order_allocator::{AllocationConfig, ExchangeId, InMemoryExchangeStore, OrderAllocator, Side, StandingOrder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

// ============================================================================
// HELPER FUNCTIONS - Deterministic snapshot generation
// ============================================================================

const EXCHANGES: usize = 16;

/// Asks at increasing prices, spread round-robin over the exchanges
fn populate_asks(count: usize, exchange_crypto: Decimal) -> Vec<WorkingBuyOrder> {
    let ids: Vec<ExchangeId> = (0..EXCHANGES).map(|_| ExchangeId::new()).collect();
    let base = Decimal::from(50_000);

    (0..count)
        .map(|i| {
            let price = base + Decimal::from(i as u64);
            let order = StandingOrder::limit(Side::Sell, Decimal::new(5, 1), price);
            WorkingBuyOrder::new(order, ids[i % EXCHANGES], format!("Exchange{}", i % EXCHANGES), exchange_crypto)
        })
        .collect()
}

/// Bids at decreasing prices with random amounts
fn populate_bids(count: usize, seed: u64) -> Vec<WorkingSellOrder> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let ids: Vec<ExchangeId> = (0..EXCHANGES).map(|_| ExchangeId::new()).collect();
    let base = Decimal::from(50_000);

    (0..count)
        .map(|i| {
            let price = base - Decimal::from(i as u64 % 40_000);
            let amount = Decimal::new(rng.gen_range(1i64..=1_000), 3);
            let order = StandingOrder::limit(Side::Buy, amount, price);
            let ex = rng.gen_range(0..EXCHANGES);
            WorkingSellOrder::new(order, ids[ex], format!("Exchange{ex}"), Decimal::from(1_000_000))
        })
        .collect()
}

// ============================================================================
// BENCHMARK: Buy allocation over growing books
// ============================================================================

fn bench_buy_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("buy_allocation");
    group.measurement_time(Duration::from_secs(5));
    let config = AllocationConfig::default();

    for size in [100usize, 1_000, 10_000] {
        let asks = populate_asks(size, Decimal::from(1_000_000));
        // Sweep half the book
        let target = Decimal::new(5, 1) * Decimal::from(size as u64 / 2);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("sweep_half", size), &asks, |b, asks| {
            b.iter(|| black_box(allocate_buy(black_box(target), asks, &config)))
        });
    }

    // Exchanges run dry early, most of the book is skipped
    let asks = populate_asks(10_000, Decimal::from(2));
    group.bench_function("liquidity_bound_10k", |b| {
        b.iter(|| black_box(allocate_buy(Decimal::from(1_000), &asks, &config)))
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Sell allocation
// ============================================================================

fn bench_sell_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("sell_allocation");
    group.measurement_time(Duration::from_secs(5));
    let config = AllocationConfig::default();

    for size in [100usize, 1_000, 10_000] {
        let bids = populate_bids(size, 42);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("funds_bound", size), &bids, |b, bids| {
            b.iter(|| black_box(allocate_sell(Decimal::from(100), bids, &config)))
        });
    }

    group.finish();
}

// ============================================================================
// BENCHMARK: Full service round trip
// ============================================================================

fn bench_service_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("service");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime");

    group.bench_function("buy_against_1k_store", |b| {
        b.iter_batched(
            || {
                let store = InMemoryExchangeStore::with_capacity(1_000);
                let exchange = store.add_exchange("Exchange0", Decimal::from(1_000), Decimal::ZERO);
                for i in 0..1_000u64 {
                    let order = StandingOrder::limit(Side::Sell, Decimal::ONE, Decimal::from(50_000 + i));
                    store.post_order(exchange, order).expect("post order");
                }
                OrderAllocator::new(store, AllocationConfig::default())
            },
            |allocator| black_box(runtime.block_on(allocator.buy(Decimal::from(10)))),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_buy_allocation,
    bench_sell_allocation,
    bench_service_round_trip
);
criterion_main!(benches);
