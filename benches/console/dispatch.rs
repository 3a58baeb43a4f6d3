use criterion::{BatchSize, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serial_console::args::ArgBuffer;
use serial_console::commands;
use serial_console::config::{MAX_ARGS, MAX_LINE_LENGTH};
use serial_console::dispatch::{Context, Dispatcher};
use serial_console::history::History;
use serial_console::registry::{Command, Registry};
use std::fmt;

const WORDS: &[&str] = &["wifi", "-s", "\"my network\"", "scan", "-o", "out.txt", "42", "--", "led", "on"];

struct Sink;

impl fmt::Write for Sink {
    fn write_str(&mut self, _s: &str) -> fmt::Result {
        Ok(())
    }
}

fn noop(ctx: &mut Context<'_>) -> i32 {
    while ctx.next_opt().is_some() {}
    0
}

/// Lines of 1 to `MAX_ARGS` random words, all starting with a registered name.
fn lines(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..count)
        .map(|_| {
            let mut line = String::from(["echo", "noop", "help", "missing"][rng.gen_range(0..4)]);
            for _ in 0..rng.gen_range(0..MAX_ARGS) {
                let word = WORDS[rng.gen_range(0..WORDS.len())];
                if line.len() + word.len() + 1 > MAX_LINE_LENGTH {
                    break;
                }
                line.push(' ');
                line.push_str(word);
            }
            line
        })
        .collect()
}

pub fn bench_split(c: &mut Criterion) {
    let lines = lines(256);
    let bytes: usize = lines.iter().map(String::len).sum();

    let mut group = c.benchmark_group("split");
    group.throughput(Throughput::Bytes(bytes as u64));
    group.bench_function("random_lines", |b| {
        b.iter(|| {
            for line in &lines {
                let _ = std::hint::black_box(ArgBuffer::split(line, MAX_ARGS));
            }
        })
    });
    group.finish();
}

pub fn bench_dispatch(c: &mut Criterion) {
    let mut registry = Registry::new();
    commands::register(&mut registry).unwrap();
    registry.register(Command::new("noop", "Scan options and return", noop)).unwrap();
    let dispatcher = Dispatcher::new(&registry, MAX_ARGS, MAX_LINE_LENGTH);
    let lines = lines(256);

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("random_lines", |b| {
        b.iter(|| {
            for line in &lines {
                std::hint::black_box(dispatcher.dispatch(line, &mut Sink, None));
            }
        })
    });
    group.finish();
}

pub fn bench_history_push(c: &mut Criterion) {
    let lines = lines(1024);

    c.bench_function("history_push_with_eviction", |b| {
        b.iter_batched(
            || History::with_max_len(32),
            |mut history| {
                for line in &lines {
                    history.push(line);
                }
                history
            },
            BatchSize::SmallInput,
        )
    });
}
