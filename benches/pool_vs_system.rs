use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rpool::Pool;

const ALLOCATION_COUNT: usize = 100_000;
const SMALL_ALLOC_SIZE: usize = 128;
const LARGE_ALLOC_SIZE: usize = 8192;
// Small enough that the threshold (capacity minus header) stays below
// LARGE_ALLOC_SIZE, so every other request goes through the large tracker.
const MIXED_POOL_CAPACITY: usize = 8 * 1024;

fn mixed_size(i: usize) -> usize {
  if i % 2 == 0 { SMALL_ALLOC_SIZE } else { LARGE_ALLOC_SIZE }
}

fn system_malloc(c: &mut Criterion) {
  c.bench_function("malloc/free mixed", |b| {
    b.iter_batched(
      || Vec::with_capacity(ALLOCATION_COUNT),
      |mut allocs: Vec<*mut libc::c_void>| {
        for i in 0..ALLOCATION_COUNT {
          allocs.push(unsafe { libc::malloc(mixed_size(i)) });
        }
        for ptr in allocs {
          unsafe { libc::free(black_box(ptr)) };
        }
      },
      BatchSize::LargeInput,
    )
  });
}

fn pool_alloc_destroy(c: &mut Criterion) {
  c.bench_function("pool alloc/destroy mixed", |b| {
    b.iter_batched(
      || Vec::with_capacity(ALLOCATION_COUNT),
      |mut allocs| {
        let mut pool = Pool::create(MIXED_POOL_CAPACITY).unwrap();
        assert!(pool.threshold() < LARGE_ALLOC_SIZE);
        for i in 0..ALLOCATION_COUNT {
          allocs.push(pool.alloc(mixed_size(i)));
        }
        black_box(&allocs);
        pool.destroy();
      },
      BatchSize::LargeInput,
    )
  });
}

fn pool_reset_reuse(c: &mut Criterion) {
  let mut pool = Pool::create(16 * 1024).unwrap();

  c.bench_function("pool small allocs with reset", |b| {
    b.iter(|| {
      for _ in 0..1024 {
        black_box(pool.alloc(SMALL_ALLOC_SIZE));
      }
      pool.reset();
    })
  });
}

criterion_group!(benches, system_malloc, pool_alloc_destroy, pool_reset_reuse);
criterion_main!(benches);
