use faa_mpmc::Queue;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const MESSAGES: usize = 1_000_000;
const BUFFER_SIZE: usize = 1024;

fn main() {
    println!("FAA MPMC Performance Test");
    println!("=========================\n");

    for (producers, consumers) in [(1, 1), (4, 1), (1, 4), (4, 4)] {
        println!(
            "{} Producer(s), {} Consumer(s) ({} messages):",
            producers, consumers, MESSAGES
        );
        let start = Instant::now();
        run(producers, consumers);
        let elapsed = start.elapsed();
        let throughput = MESSAGES as f64 / elapsed.as_secs_f64();
        println!("  Time: {:?}", elapsed);
        println!("  Throughput: {:.2} msgs/sec", throughput);
        println!("  Latency: {:.0} ns/op\n", elapsed.as_nanos() as f64 / MESSAGES as f64);
    }
}

fn run(producers: usize, consumers: usize) {
    let per_producer = MESSAGES / producers;
    let per_consumer = MESSAGES / consumers;

    let queue = Arc::new(Queue::new(BUFFER_SIZE).unwrap());
    let mut handles = vec![];

    for p in 0..producers {
        let q = queue.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                q.enqueue(p * per_producer + i);
            }
        }));
    }

    for _ in 0..consumers {
        let q = queue.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..per_consumer {
                while q.dequeue().is_none() {
                    std::hint::spin_loop();
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
}
