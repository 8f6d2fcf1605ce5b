use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_single_term", |b| {
        b.iter(|| lateness::parse(black_box("10 mins late")))
    });

    c.bench_function("parse_compound", |b| {
        b.iter(|| lateness::parse(black_box("1 year 2 weeks 3 days 4 hours 5 mins 6 secs late")))
    });

    c.bench_function("parse_reject_unknown_unit", |b| {
        b.iter(|| lateness::parse(black_box("3 fortnights late")))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
