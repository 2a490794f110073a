use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use palisade::{ConcurrentCell, SerializedCell};
use std::sync::Mutex;
use std::thread;

const OPS: usize = 10_000;
const THREADS: usize = 4;

fn bench_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended_mutate");
    group.throughput(Throughput::Elements(OPS as u64));

    group.bench_function("plain_variable", |b| {
        b.iter(|| {
            let mut n = 0u64;
            for _ in 0..OPS {
                n = black_box(n + 1);
            }
            n
        })
    });

    group.bench_function("std_mutex", |b| {
        b.iter(|| {
            let n = Mutex::new(0u64);
            for _ in 0..OPS {
                *n.lock().unwrap() += 1;
            }
            n.into_inner().unwrap()
        })
    });

    group.bench_function("concurrent_cell", |b| {
        b.iter(|| {
            let n = ConcurrentCell::new(0u64);
            for _ in 0..OPS {
                n.mutate(|v| *v += 1);
            }
            n.into_inner()
        })
    });

    group.bench_function("serialized_cell", |b| {
        b.iter(|| {
            let n = SerializedCell::new(0u64);
            for _ in 0..OPS {
                n.mutate(|v| *v += 1);
            }
            n.into_inner()
        })
    });

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_mutate");
    group.throughput(Throughput::Elements((OPS * THREADS) as u64));

    group.bench_function("std_mutex", |b| {
        b.iter(|| {
            let n = Mutex::new(0u64);
            let n = &n;
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(move || {
                        for _ in 0..OPS {
                            *n.lock().unwrap() += 1;
                        }
                    });
                }
            });
        })
    });

    group.bench_function("concurrent_cell", |b| {
        b.iter(|| {
            let n = ConcurrentCell::new(0u64);
            let n = &n;
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(move || {
                        for _ in 0..OPS {
                            n.mutate(|v| *v += 1);
                        }
                    });
                }
            });
        })
    });

    group.bench_function("serialized_cell", |b| {
        b.iter(|| {
            let n = SerializedCell::new(0u64);
            let n = &n;
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(move || {
                        for _ in 0..OPS {
                            n.mutate(|v| *v += 1);
                        }
                    });
                }
            });
        })
    });

    group.finish();
}

criterion_group!(benches, bench_uncontended, bench_contended);
criterion_main!(benches);
