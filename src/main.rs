use clap::Parser;
use rand::Rng;
use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    thread,
    time::Duration,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use locked_fifo::{ConcurrentQueue, FifoQueue, Handle};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BenchConfig::parse();
    info!(
        producers = config.producer_threads,
        consumers = config.consumer_threads,
        unique = config.unique,
        key_space = config.key_space,
        "starting benchmark"
    );

    let queue = FifoQueue::with_capacity(config.capacity);
    if config.unique {
        benchmark_producer_consumer(&queue, || queue.register_unique(), &config);
    } else {
        benchmark_producer_consumer(&queue, || queue.register(), &config);
    }
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct BenchConfig {
    /// number of elements to add to the queue before starting the main
    /// threaded test.
    #[arg(long)]
    prefill: usize,
    /// number of threads pushing elements onto the queue.
    #[arg(long)]
    producer_threads: usize,
    /// number of threads popping elements off the queue.
    #[arg(long)]
    consumer_threads: usize,
    /// duration in seconds to run the test
    #[arg(long)]
    duration: usize,
    /// initial capacity hint, zero or negative means none.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    capacity: isize,
    /// producers skip values that are already queued.
    #[arg(long)]
    unique: bool,
    /// pushed values are drawn uniformly from 0..key_space.
    #[arg(long, default_value_t = 1 << 20, value_parser = clap::value_parser!(u64).range(1..))]
    key_space: u64,
    /// pin every worker thread to its own core.
    #[arg(long)]
    pin_cores: bool,
}

fn benchmark_producer_consumer<F, H>(queue: &FifoQueue<u64>, register: F, config: &BenchConfig)
where
    F: Fn() -> H + Sync,
    H: Handle<u64>,
{
    let mut handle = register();
    for i in 0..config.prefill as u64 {
        handle.enqueue(i % config.key_space);
    }
    drop(handle);

    let mut cores = if config.pin_cores {
        core_affinity::get_core_ids().unwrap_or_else(|| {
            warn!("could not list cores, running unpinned");
            Vec::new()
        })
    } else {
        Vec::new()
    }
    .into_iter()
    .cycle();

    let done: AtomicBool = AtomicBool::new(false);
    let enqueues = AtomicUsize::new(0);
    let dequeues = AtomicUsize::new(0);
    let empty_dequeues = AtomicUsize::new(0);

    thread::scope(|s| {
        let register = &register;
        let (done, enqueues, dequeues, empty_dequeues) =
            (&done, &enqueues, &dequeues, &empty_dequeues);

        for id in 0..config.producer_threads {
            let core = cores.next();
            s.spawn(move || {
                if let Some(core) = core {
                    core_affinity::set_for_current(core);
                }
                let mut rng = rand::thread_rng();
                let mut local_enqueues = 0;
                let mut handle = register();
                while !done.load(Ordering::Relaxed) {
                    handle.enqueue(rng.gen_range(0..config.key_space));
                    local_enqueues += 1;
                }
                debug!(producer = id, enqueues = local_enqueues, "producer finished");
                enqueues.fetch_add(local_enqueues, Ordering::Relaxed);
            });
        }
        for id in 0..config.consumer_threads {
            let core = cores.next();
            s.spawn(move || {
                if let Some(core) = core {
                    core_affinity::set_for_current(core);
                }
                let mut local_dequeues = 0;
                let mut local_empty = 0;
                let mut handle = register();
                while !done.load(Ordering::Relaxed) {
                    match handle.dequeue() {
                        Some(_) => local_dequeues += 1,
                        None => local_empty += 1,
                    }
                }
                debug!(
                    consumer = id,
                    dequeues = local_dequeues,
                    empty = local_empty,
                    "consumer finished"
                );
                dequeues.fetch_add(local_dequeues, Ordering::Relaxed);
                empty_dequeues.fetch_add(local_empty, Ordering::Relaxed);
            });
        }

        std::thread::sleep(Duration::from_secs(config.duration as u64));
        done.store(true, Ordering::Relaxed);
    });

    let enqueues = enqueues.into_inner();
    let dequeues = dequeues.into_inner();
    println!(
        "throughput: {}",
        (enqueues + dequeues) as f64 / config.duration.max(1) as f64
    );
    println!("number of enqueues: {}", enqueues);
    println!("number of dequeues: {}", dequeues);
    println!("number of empty dequeues: {}", empty_dequeues.into_inner());
    println!("total inserted: {}", queue.total_inserted());
    println!("remaining: {}", queue.len());
}
