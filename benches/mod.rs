use criterion::{criterion_group, criterion_main};

mod console;

criterion_group!(
    benches,
    console::dispatch::bench_split,
    console::dispatch::bench_dispatch,
    console::dispatch::bench_history_push
);
criterion_main!(benches);
