use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use faa_mpmc::Queue as FaaQueue;
use flume::unbounded as flume_unbounded;

const MESSAGES: usize = 200_000;
const BUFFER_SIZE: usize = 1024;

/// (producers, consumers)
const SHAPES: [(usize, usize); 4] = [(1, 1), (4, 1), (1, 4), (4, 4)];

fn spin_dequeue(q: &FaaQueue<usize>) -> usize {
    loop {
        if let Some(v) = q.dequeue() {
            return v;
        }
        std::hint::spin_loop();
    }
}

fn run_faa(producers: usize, consumers: usize) {
    let queue = Arc::new(FaaQueue::new(BUFFER_SIZE).unwrap());
    let per_producer = MESSAGES / producers;
    let per_consumer = MESSAGES / consumers;
    let mut handles = vec![];

    for p in 0..producers {
        let q = queue.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                q.enqueue(black_box(p * per_producer + i));
            }
        }));
    }
    for _ in 0..consumers {
        let q = queue.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..per_consumer {
                black_box(spin_dequeue(&q));
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
}

fn run_crossbeam(producers: usize, consumers: usize) {
    let (tx, rx) = unbounded::<usize>();
    let per_producer = MESSAGES / producers;
    let per_consumer = MESSAGES / consumers;
    let mut handles = vec![];

    for p in 0..producers {
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                tx.send(black_box(p * per_producer + i)).unwrap();
            }
        }));
    }
    drop(tx);
    for _ in 0..consumers {
        let rx = rx.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..per_consumer {
                black_box(rx.recv().unwrap());
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
}

fn run_flume(producers: usize, consumers: usize) {
    let (tx, rx) = flume_unbounded::<usize>();
    let per_producer = MESSAGES / producers;
    let per_consumer = MESSAGES / consumers;
    let mut handles = vec![];

    for p in 0..producers {
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                tx.send(black_box(p * per_producer + i)).unwrap();
            }
        }));
    }
    drop(tx);
    for _ in 0..consumers {
        let rx = rx.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..per_consumer {
                black_box(rx.recv().unwrap());
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
}

fn bench_shapes(c: &mut Criterion) {
    for (producers, consumers) in SHAPES {
        let mut group = c.benchmark_group(format!("{producers}p_{consumers}c"));
        group.throughput(Throughput::Elements(MESSAGES as u64));
        group.sample_size(20);

        group.bench_function("faa_mpmc", |b| b.iter(|| run_faa(producers, consumers)));
        group.bench_function("crossbeam_channel", |b| {
            b.iter(|| run_crossbeam(producers, consumers))
        });
        group.bench_function("flume", |b| b.iter(|| run_flume(producers, consumers)));

        group.finish();
    }
}

/// Single-threaded cost across segment sizes; small segments link often.
fn bench_buffer_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_buffer_size");
    group.throughput(Throughput::Elements(MESSAGES as u64));

    for size in [2usize, 32, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = FaaQueue::new(size).unwrap();
                for i in 0..MESSAGES {
                    q.enqueue(black_box(i));
                }
                while let Some(v) = q.dequeue() {
                    black_box(v);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_shapes, bench_buffer_sizes);
criterion_main!(benches);
