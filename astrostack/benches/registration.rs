//! Benchmarks for detection, registration and integration.

use criterion::{Criterion, criterion_group, criterion_main};

fn benchmarks(c: &mut Criterion) {
    astrostack::bench::benchmarks(c);
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
