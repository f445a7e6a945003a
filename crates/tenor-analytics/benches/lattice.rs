//! Benchmarks for the lattice engines and batch pricing.
//!
//! Run with: cargo bench -p tenor-analytics --features parallel

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tenor_analytics::prelude::*;
use tenor_bonds::prelude::*;
use tenor_core::prelude::*;
use tenor_curves::ZeroCurve;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn settle() -> Date {
    Date::from_ymd(2025, 6, 16).unwrap()
}

fn create_test_curve() -> Arc<ZeroCurve> {
    let points = [(0.25, 0.030), (1.0, 0.035), (2.0, 0.038), (5.0, 0.045), (10.0, 0.050), (30.0, 0.055)];
    Arc::new(ZeroCurve::from_times(settle(), &points).unwrap())
}

fn create_callable(years: i32) -> Bond {
    let maturity = Date::from_ymd(2025 + years, 6, 15).unwrap();
    let first_call = Date::from_ymd(2027, 6, 15).unwrap();
    let terms = BondTerms::fixed(
        Date::from_ymd(2025, 6, 15).unwrap(),
        maturity,
        0.055,
        Frequency::SemiAnnual,
        DayCountConvention::Thirty360US,
    )
    .with_call(CallPeriod::new(first_call, maturity, 100.0, OptionStyle::Bermudan));
    Bond::new(terms).unwrap()
}

fn create_convertible(years: i32) -> Bond {
    let issue = Date::from_ymd(2025, 6, 15).unwrap();
    let maturity = Date::from_ymd(2025 + years, 6, 15).unwrap();
    let terms = BondTerms::fixed(issue, maturity, 0.02, Frequency::SemiAnnual, DayCountConvention::Thirty360US)
        .with_conversion(ConversionTerms::new(20.0, issue, maturity, 1000.0))
        .with_call(
            CallPeriod::new(Date::from_ymd(2028, 6, 15).unwrap(), maturity, 100.0, OptionStyle::American)
                .with_trigger(CallTrigger::SoftCall { parity_ratio: 1.3 }),
        );
    Bond::new(terms).unwrap()
}

fn create_context(parallel: bool) -> PricingContext {
    let mut config = PricingConfig::default();
    config.parallel = if parallel {
        ParallelSettings { enabled: true, threshold: 64 }
    } else {
        ParallelSettings::sequential()
    };
    PricingContext::new(settle(), create_test_curve())
        .with_volatility(VolatilityParams::new(0.01, 0.05))
        .with_stock(StockParams::new(45.0, 0.3).with_correlation(-0.1))
        .with_config(config)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_callable_lattice(c: &mut Criterion) {
    let ctx = create_context(false);
    let mut group = c.benchmark_group("callable_lattice");
    group.sample_size(20);

    for years in [5, 10, 30] {
        let bond = create_callable(years);
        group.bench_with_input(BenchmarkId::new("build_and_price", years), &bond, |b, bond| {
            b.iter(|| CallableLattice::new(black_box(bond), &ctx).unwrap().dirty_price_with_oas(0.0))
        });
    }
    group.finish();
}

fn bench_convertible_lattice(c: &mut Criterion) {
    let mut group = c.benchmark_group("convertible_lattice");
    group.sample_size(10);

    for parallel in [false, true] {
        let ctx = create_context(parallel);
        let bond = create_convertible(5);
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_with_input(BenchmarkId::new("dirty_price", label), &bond, |b, bond| {
            b.iter(|| ConvertibleLattice::new(black_box(bond), &ctx).unwrap().dirty_price())
        });
    }
    group.finish();
}

fn bench_batch_pricing(c: &mut Criterion) {
    let ctx = create_context(true);
    let mut group = c.benchmark_group("batch_pricing");
    group.sample_size(10);

    for size in [8, 32] {
        let requests: Vec<PricingRequest> = (0..size)
            .map(|i| PricingRequest::new(create_callable(5 + i % 10), ctx.clone()))
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &requests, |b, requests| {
            b.iter(|| price_batch(black_box(requests), &ctx.config.parallel))
        });
    }
    group.finish();
}

// =============================================================================
// CRITERION GROUPS
// =============================================================================

criterion_group!(lattices, bench_callable_lattice, bench_convertible_lattice);
criterion_group!(batch, bench_batch_pricing);

criterion_main!(lattices, batch);
