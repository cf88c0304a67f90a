//! Simple usage example

use faa_mpmc::Queue;
use std::sync::Arc;
use std::thread;

fn main() {
    println!("FAA MPMC - Simple Example\n");

    // Segments of 4 slots, so ten messages span three segments
    let queue = Arc::new(Queue::new(4).expect("valid buffer size"));

    let producer_queue = queue.clone();
    let consumer_queue = queue.clone();

    let producer = thread::spawn(move || {
        for i in 0..10 {
            let message = format!("Message {}", i);
            println!("Sending: {}", message);

            // Never full: a new segment is linked when the current one runs out
            producer_queue.enqueue(message);

            thread::sleep(std::time::Duration::from_millis(100));
        }
        println!("Producer finished!");
    });

    let consumer = thread::spawn(move || {
        for _ in 0..10 {
            loop {
                match consumer_queue.dequeue() {
                    Some(message) => {
                        println!("Received: {}", message);
                        break;
                    }
                    // Queue is empty, spin and retry
                    None => std::hint::spin_loop(),
                }
            }
        }
        println!("Consumer finished!");
    });

    producer.join().unwrap();
    consumer.join().unwrap();

    println!("\nExample completed successfully!");
}
