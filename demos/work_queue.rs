use faa_mpmc::Queue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Work Queue Example\n");

    const NUM_WORKERS: usize = 4;
    const NUM_JOBS: usize = 20;

    let jobs = Arc::new(Queue::new(8).expect("valid buffer size"));
    let results = Arc::new(Queue::new(8).expect("valid buffer size"));
    let all_enqueued = Arc::new(AtomicBool::new(false));

    let jobs_tx = jobs.clone();
    let done = all_enqueued.clone();
    let producer = thread::spawn(move || {
        for i in 0..NUM_JOBS {
            let job = format!("Job-{:02}", i);
            println!("📝 Enqueued: {}", job);
            jobs_tx.enqueue(job);
            thread::sleep(Duration::from_millis(50));
        }
        done.store(true, Ordering::Release);
        println!("✅ All jobs enqueued!");
    });

    let mut workers = vec![];
    for worker_id in 0..NUM_WORKERS {
        let jobs_rx = jobs.clone();
        let results_tx = results.clone();
        let done = all_enqueued.clone();

        workers.push(thread::spawn(move || {
            let mut processed = 0;
            loop {
                match jobs_rx.dequeue() {
                    Some(job) => {
                        println!("🔨 Worker {} processing: {}", worker_id, job);

                        thread::sleep(Duration::from_millis(200));

                        results_tx.enqueue(format!("{} -> completed by worker {}", job, worker_id));
                        processed += 1;
                    }
                    None if done.load(Ordering::Acquire) => break,
                    None => thread::sleep(Duration::from_millis(10)),
                }
            }
            println!("Worker {} finished ({} jobs)", worker_id, processed);
        }));
    }

    let results_rx = results.clone();
    let collector = thread::spawn(move || {
        let mut collected = 0;
        while collected < NUM_JOBS {
            match results_rx.dequeue() {
                Some(result) => {
                    println!("✨ Result: {}", result);
                    collected += 1;
                }
                None => std::hint::spin_loop(),
            }
        }
        println!("✅ All results collected!");
    });

    producer.join().unwrap();
    for worker in workers {
        worker.join().unwrap();
    }
    collector.join().unwrap();

    println!("\n🎉 Work queue example completed!");
}
