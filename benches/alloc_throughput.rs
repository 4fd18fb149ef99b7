use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;

const OPS: u64 = 100_000;

/// rsmempool alloc/free pair throughput.
fn pool_alloc_free(size: usize) {
    for _ in 0..OPS {
        let ptr = rsmempool::concurrent_alloc(size);
        black_box(ptr);
        unsafe { rsmempool::concurrent_free(ptr, size) };
    }
}

/// System allocator baseline.
fn system_alloc_free(size: usize) {
    let layout = Layout::from_size_align(size, 8).unwrap();
    for _ in 0..OPS {
        unsafe {
            let ptr = System.alloc(layout);
            black_box(ptr);
            System.dealloc(ptr, layout);
        }
    }
}

fn bench_alloc_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc_throughput");

    for size in [16usize, 64, 256, 1024, 4096] {
        group.throughput(Throughput::Elements(OPS));

        group.bench_with_input(BenchmarkId::new("rsmempool", size), &size, |b, &size| {
            b.iter(|| pool_alloc_free(size))
        });

        group.bench_with_input(BenchmarkId::new("system", size), &size, |b, &size| {
            b.iter(|| system_alloc_free(size))
        });
    }

    group.finish();
}

fn bench_multithreaded(c: &mut Criterion) {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25_000;

    let mut group = c.benchmark_group("multithreaded");
    group.sample_size(10);
    group.throughput(Throughput::Elements((THREADS * PER_THREAD) as u64));

    group.bench_function("rsmempool_4x25k", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    std::thread::spawn(|| {
                        let mut ptrs = Vec::with_capacity(PER_THREAD);
                        for i in 0..PER_THREAD {
                            let size = 8 + (i * 37) % 249;
                            ptrs.push((rsmempool::concurrent_alloc(size), size));
                        }
                        for (ptr, size) in ptrs {
                            unsafe { rsmempool::concurrent_free(ptr, size) };
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });

    group.bench_function("system_4x25k", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    std::thread::spawn(|| {
                        let mut ptrs = Vec::with_capacity(PER_THREAD);
                        for i in 0..PER_THREAD {
                            let size = 8 + (i * 37) % 249;
                            let layout = Layout::from_size_align(size, 8).unwrap();
                            ptrs.push((unsafe { System.alloc(layout) }, layout));
                        }
                        for (ptr, layout) in ptrs {
                            unsafe { System.dealloc(ptr, layout) };
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_alloc_throughput, bench_multithreaded);
criterion_main!(benches);
