//! Cross-thread scenarios: parallel mixed workloads, cross-thread frees,
//! and the producer/consumer ownership transfer.

use rand::Rng;
use rsmempool::{concurrent_alloc, concurrent_free};
use std::collections::HashSet;
use std::sync::mpsc;
use std::thread;

#[test]
fn random_sizes_across_threads() {
    // 4 threads x 25k random-size allocations, all live at once: no
    // address is ever handed to two threads. The main thread frees
    // everything, which also exercises cross-thread ownership transfer.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let mut rng = rand::thread_rng();
                let mut live = Vec::with_capacity(25_000);
                for _ in 0..25_000 {
                    let size = rng.gen_range(8..=256);
                    let ptr = concurrent_alloc(size);
                    assert!(!ptr.is_null());
                    unsafe { ptr.write_bytes(0xAB, size) };
                    live.push((ptr as usize, size));
                }
                live
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    let distinct: HashSet<usize> = all.iter().map(|&(addr, _)| addr).collect();
    assert_eq!(distinct.len(), all.len(), "an address was handed out twice");

    for (addr, size) in all {
        unsafe { concurrent_free(addr as *mut u8, size) };
    }
}

#[test]
fn producer_consumer_frees() {
    // One thread allocates, the other frees what arrives over a bounded
    // channel; the channel's happens-before carries block ownership.
    const COUNT: usize = 20_000;
    let (tx, rx) = mpsc::sync_channel::<usize>(64);

    let producer = thread::spawn(move || {
        for i in 0..COUNT {
            let ptr = concurrent_alloc(16);
            assert!(!ptr.is_null());
            unsafe { ptr.cast::<u64>().write(i as u64) };
            tx.send(ptr as usize).unwrap();
        }
    });

    let consumer = thread::spawn(move || {
        let mut received = 0u64;
        for addr in rx {
            let ptr = addr as *mut u8;
            assert_eq!(unsafe { ptr.cast::<u64>().read() }, received);
            unsafe { concurrent_free(ptr, 16) };
            received += 1;
        }
        received
    });

    producer.join().unwrap();
    assert_eq!(consumer.join().unwrap(), COUNT as u64);
}

#[test]
fn mixed_size_churn_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let mut live: Vec<(usize, usize)> = Vec::new();
                for i in 0..2_000 {
                    let size = match i % 5 {
                        0 => 8,
                        1 => 64,
                        2 => 512,
                        3 => 4096,
                        _ => 16 * 1024,
                    };
                    let ptr = concurrent_alloc(size);
                    assert!(!ptr.is_null());
                    live.push((ptr as usize, size));
                    if live.len() > 50 {
                        for (addr, size) in live.drain(..25) {
                            unsafe { concurrent_free(addr as *mut u8, size) };
                        }
                    }
                }
                for (addr, size) in live {
                    unsafe { concurrent_free(addr as *mut u8, size) };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn thread_exit_returns_residuals() {
    // A thread leaves blocks in its local cache and exits; the flush on
    // exit must make them reachable again instead of stranding them.
    // Size 600 sits in a class no other test in this binary touches, so
    // the central list for it is ours alone.
    let worker = thread::spawn(|| {
        let ptr = concurrent_alloc(600);
        assert!(!ptr.is_null());
        unsafe { concurrent_free(ptr, 600) };
        ptr as usize
    });
    let freed = worker.join().unwrap();

    // The flushed block sits at the head of the central list for its
    // class; a fresh thread's first batch starts with it.
    let taker = thread::spawn(move || {
        let ptr = concurrent_alloc(600);
        assert!(!ptr.is_null());
        let got = ptr as usize;
        unsafe { concurrent_free(ptr, 600) };
        got
    });
    assert_eq!(taker.join().unwrap(), freed);
}
