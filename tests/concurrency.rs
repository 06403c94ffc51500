use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

use locked_fifo::{ConcurrentQueue, FifoQueue, Handle};

const THREADS: usize = 8;
const PER_THREAD: usize = 5_000;

#[test]
fn concurrent_pushes_are_all_drained() {
    let queue = FifoQueue::new();

    thread::scope(|s| {
        for t in 0..THREADS {
            let queue = &queue;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    queue.push(t * PER_THREAD + i);
                }
            });
        }
    });

    assert_eq!(queue.len(), THREADS * PER_THREAD);
    assert_eq!(queue.total_inserted(), THREADS * PER_THREAD);

    let mut seen = HashSet::new();
    let mut last_per_thread = vec![None; THREADS];
    while let Ok(value) = queue.pop() {
        assert!(seen.insert(value), "{value} drained twice");
        // each producer's own values keep their relative order
        let t = value / PER_THREAD;
        if let Some(last) = last_per_thread[t] {
            assert!(value > last);
        }
        last_per_thread[t] = Some(value);
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
    assert!(queue.is_empty());
    assert_eq!(queue.total_inserted(), THREADS * PER_THREAD);
}

#[test]
fn racing_unique_pushes_never_duplicate() {
    const KEYS: usize = 200;
    let queue = Arc::new(FifoQueue::new());
    let barrier = Arc::new(Barrier::new(THREADS));
    let accepted = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            let accepted = Arc::clone(&accepted);
            thread::spawn(move || {
                barrier.wait();
                for key in 0..KEYS {
                    if queue.push_unique(key) {
                        accepted.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(accepted.load(Ordering::Relaxed), KEYS);
    assert_eq!(queue.len(), KEYS);
    assert_eq!(queue.total_inserted(), KEYS);
    let distinct: HashSet<_> = queue.snapshot().into_iter().collect();
    assert_eq!(distinct.len(), KEYS);
}

#[test]
fn racing_unique_batches_never_duplicate() {
    let queue = FifoQueue::new();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for t in 0..THREADS {
            let (queue, barrier) = (&queue, &barrier);
            s.spawn(move || {
                barrier.wait();
                // overlapping windows of keys
                queue.push_many((t * 10)..(t * 10 + 50), true);
            });
        }
    });

    let contents = queue.snapshot();
    let distinct: HashSet<_> = contents.iter().copied().collect();
    assert_eq!(distinct.len(), contents.len());
    assert_eq!(distinct, (0..(THREADS - 1) * 10 + 50).collect());
}

#[test]
fn batches_are_not_interleaved() {
    const BATCH: usize = 100;
    let queue = FifoQueue::new();

    thread::scope(|s| {
        for t in 0..THREADS {
            let queue = &queue;
            s.spawn(move || {
                for _ in 0..20 {
                    queue.push_many(std::iter::repeat(t).take(BATCH), false);
                }
            });
        }
    });

    let contents = queue.into_vec();
    assert_eq!(contents.len(), THREADS * 20 * BATCH);
    for chunk in contents.chunks(BATCH) {
        assert!(chunk.iter().all(|&t| t == chunk[0]));
    }
}

#[test]
fn producers_and_consumers_conserve_elements() {
    let queue = FifoQueue::new();
    let producers_done = AtomicBool::new(false);
    let consumed = AtomicUsize::new(0);

    thread::scope(|s| {
        let consumers: Vec<_> = (0..THREADS / 2)
            .map(|_| {
                let (queue, producers_done, consumed) = (&queue, &producers_done, &consumed);
                s.spawn(move || {
                    let mut handle = queue.register();
                    let mut local = Vec::new();
                    loop {
                        match handle.dequeue() {
                            Some(value) => local.push(value),
                            None if producers_done.load(Ordering::Acquire) => break,
                            None => thread::yield_now(),
                        }
                    }
                    consumed.fetch_add(local.len(), Ordering::Relaxed);
                    local
                })
            })
            .collect();

        let producers: Vec<_> = (0..THREADS / 2)
            .map(|t| {
                let queue = &queue;
                s.spawn(move || {
                    let mut handle = queue.register();
                    for i in 0..PER_THREAD {
                        handle.enqueue(t * PER_THREAD + i);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        producers_done.store(true, Ordering::Release);

        let mut seen = HashSet::new();
        for consumer in consumers {
            for value in consumer.join().unwrap() {
                assert!(seen.insert(value));
            }
        }
        while let Ok(value) = queue.pop() {
            assert!(seen.insert(value));
        }
        assert_eq!(seen.len(), THREADS / 2 * PER_THREAD);
    });

    assert_eq!(queue.total_inserted(), THREADS / 2 * PER_THREAD);
    assert!(queue.is_empty());
    assert!(consumed.load(Ordering::Relaxed) <= THREADS / 2 * PER_THREAD);
}
