use std::ptr::NonNull;

use rpool::{Pool, PoolStats};

/// Prints where an allocation landed and whether the pool tracks it as large.
fn print_alloc(
  label: &str,
  size: usize,
  ptr: NonNull<u8>,
  threshold: usize,
) {
  println!(
    "[{}] Allocated {} bytes, address = {:?}, {}",
    label,
    size,
    ptr,
    if size > threshold { "large (system allocator)" } else { "small (bump region)" },
  );
}

fn print_stats(
  label: &str,
  stats: PoolStats,
) {
  println!(
    "[{}] blocks = {}, current = {}, used = {}/{} bytes, large = {}/{} slots, cleanups = {}",
    label,
    stats.blocks,
    stats.current,
    stats.used,
    stats.reserved,
    stats.large_live,
    stats.large_slots,
    stats.cleanups,
  );
}

fn main() -> rpool::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).init();

  // A deliberately small head block so the chain has to grow.
  let mut pool = Pool::create(1024)?;
  let threshold = pool.threshold();
  println!("Pool created, threshold = {} bytes", threshold);
  print_stats("start", pool.stats());

  // --------------------------------------------------------------------
  // 1) A u64 from the head block.
  // --------------------------------------------------------------------
  let first = pool.try_alloc(size_of::<u64>())?;
  print_alloc("1", size_of::<u64>(), first, threshold);

  let first_ptr = first.as_ptr() as *mut u64;
  unsafe {
    first_ptr.write(0x1122334455667788);
    println!("[1] Value written = 0x{:X}", first_ptr.read());
  }

  // --------------------------------------------------------------------
  // 2) Odd sizes still come back word aligned.
  // --------------------------------------------------------------------
  let odd = pool.try_alloc(13)?;
  print_alloc("2", 13, odd, threshold);
  println!(
    "[2] Address = {:#X}, addr % word = {}",
    odd.as_ptr() as usize,
    odd.as_ptr() as usize % size_of::<usize>()
  );

  // --------------------------------------------------------------------
  // 3) Two 500 byte requests overflow the 1 KiB head block.
  // --------------------------------------------------------------------
  let a = pool.try_alloc(500)?;
  let b = pool.try_alloc(500)?;
  print_alloc("3a", 500, a, threshold);
  print_alloc("3b", 500, b, threshold);
  print_stats("3", pool.stats());

  // --------------------------------------------------------------------
  // 4) A large allocation, released early and its slot reused.
  // --------------------------------------------------------------------
  let big = pool.try_alloc(64 * 1024)?;
  print_alloc("4", 64 * 1024, big, threshold);
  println!("[4] dealloc -> {}", pool.dealloc(big));
  println!("[4] dealloc again -> {}", pool.dealloc(big));

  let bigger = pool.try_alloc(128 * 1024)?;
  print_alloc("4", 128 * 1024, bigger, threshold);
  print_stats("4", pool.stats());

  // --------------------------------------------------------------------
  // 5) Cleanups run newest first when the pool goes away.
  // --------------------------------------------------------------------
  for name in ["log file", "socket", "cache"] {
    if let Some(cleanup) = pool.add_cleanup(0) {
      cleanup.set_handler(move |_| println!("[5] closing {}", name));
    }
  }

  // --------------------------------------------------------------------
  // 6) Reset: same first address, blocks kept.
  // --------------------------------------------------------------------
  pool.reset();
  let again = pool.try_alloc(size_of::<u64>())?;
  println!("[6] after reset, first address reused? {}", again == first);
  print_stats("6", pool.stats());

  pool.destroy();
  println!("\n[7] Pool destroyed.");

  Ok(())
}
