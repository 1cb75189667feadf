use std::ptr::NonNull;

use tracing::{debug, trace, warn};

use crate::{
  block::{Block, BlockKind, POOL_HEADER_SIZE},
  bump::BlockChain,
  cleanup::{CLEANUP_RECORD_SIZE, Cleanup, CleanupList},
  config::PoolConfig,
  error::{PoolError, Result},
  large::{LARGE_RECORD_SIZE, LargeList},
  system::{DefaultAllocator, SystemAllocator},
};

/// Snapshot of a pool's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
  /// Blocks in the chain, head included.
  pub blocks: usize,
  /// Index of the block small-allocation scans start from.
  pub current: usize,
  /// Largest request served from the bump region.
  pub threshold: usize,
  /// Bytes obtained for blocks.
  pub reserved: usize,
  /// Bytes below the block cursors, headers included.
  pub used: usize,
  /// Bytes left above the block cursors.
  pub available: usize,
  /// Large allocations currently held.
  pub large_live: usize,
  /// Large-list records, free or not.
  pub large_slots: usize,
  /// Registered cleanups.
  pub cleanups: usize,
}

/// An arena of blocks, large allocations and cleanups released together.
///
/// Not thread-safe; a pool belongs to a single owner.
pub struct Pool<S: SystemAllocator = DefaultAllocator> {
  system: S,
  config: PoolConfig,
  threshold: usize,
  chain: BlockChain,
  large: LargeList,
  cleanups: CleanupList,
  destroyed: bool,
}

impl Pool {
  /// Creates a pool whose head block spans `capacity` bytes.
  pub fn create(capacity: usize) -> Result<Self> {
    Self::with_config(PoolConfig::default().with_capacity(capacity))
  }

  pub fn with_config(config: PoolConfig) -> Result<Self> {
    Self::with_allocator(config, DefaultAllocator::default())
  }
}

impl<S: SystemAllocator> Pool<S> {
  pub fn with_allocator(
    config: PoolConfig,
    system: S,
  ) -> Result<Self> {
    config.validate()?;

    if config.capacity < POOL_HEADER_SIZE {
      warn!(capacity = config.capacity, "pool capacity below header size");
      return Err(PoolError::CapacityTooSmall {
        capacity: config.capacity,
        header: POOL_HEADER_SIZE,
      });
    }

    let Some(head) = Block::allocate(&system, config.capacity, config.block_alignment, BlockKind::Head) else {
      warn!(capacity = config.capacity, "system allocator refused the head block");
      return Err(PoolError::AllocationFailure { size: config.capacity });
    };

    let threshold = config.threshold(POOL_HEADER_SIZE);

    debug!(capacity = config.capacity, threshold, "pool created");

    Ok(Self {
      chain: BlockChain::new(head, config.block_alignment, config.skip_after_failures),
      large: LargeList::new(),
      cleanups: CleanupList::new(),
      threshold,
      config,
      system,
      destroyed: false,
    })
  }

  /// Returns at least `size` word-aligned bytes, or `None` when the system
  /// allocator fails or the pool has been destroyed.
  pub fn alloc(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    if self.destroyed {
      debug!(size, "alloc on destroyed pool");
      return None;
    }

    if size <= self.threshold {
      self.chain.bump(&self.system, size)
    } else {
      self.alloc_large(size)
    }
  }

  /// Like [`Pool::alloc`], reporting why nothing was returned.
  pub fn try_alloc(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    if self.destroyed {
      return Err(PoolError::Destroyed);
    }
    self.alloc(size).ok_or(PoolError::AllocationFailure { size })
  }

  fn alloc_large(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let Some(payload) = self.system.alloc(size) else {
      warn!(size, "system allocator refused a large allocation");
      return None;
    };

    if self.large.reuse_slot(payload, size, self.config.large_probe_limit) {
      trace!(size, "large allocation reused a free slot");
      return Some(payload);
    }

    if self.chain.bump(&self.system, LARGE_RECORD_SIZE).is_none() {
      // SAFETY: the payload was just obtained from this allocator and never
      // handed out.
      unsafe { self.system.free(payload, size) };
      return None;
    }

    self.large.push_front(payload, size);
    trace!(size, slots = self.large.slots(), "large allocation tracked");

    Some(payload)
  }

  /// Frees `ptr` if it is a large allocation this pool still holds. Returns
  /// whether anything was released; bump allocations are left alone.
  pub fn dealloc(
    &mut self,
    ptr: NonNull<u8>,
  ) -> bool {
    if self.destroyed {
      return false;
    }

    let released = self.large.release(&self.system, ptr);
    if !released {
      trace!(?ptr, "dealloc of untracked pointer ignored");
    }
    released
  }

  /// Registers a cleanup, reserving `data_size` bytes for its data when
  /// nonzero. Set the handler on the returned record.
  pub fn add_cleanup(
    &mut self,
    data_size: usize,
  ) -> Option<&mut Cleanup> {
    if self.destroyed {
      return None;
    }

    self.chain.bump(&self.system, CLEANUP_RECORD_SIZE)?;

    let buffer = if data_size > 0 {
      Some(self.alloc(data_size)?)
    } else {
      None
    };

    Some(self.cleanups.push_front(Cleanup::new(buffer)))
  }

  /// Frees every large allocation and rewinds every block. Blocks and
  /// cleanups are kept.
  ///
  /// A cleanup whose data lived inside a large allocation now refers to freed
  /// memory.
  pub fn reset(&mut self) {
    if self.destroyed {
      return;
    }

    let freed = self.large.release_all(&self.system);
    self.chain.rewind();

    debug!(
      blocks = self.chain.blocks().len(),
      large_freed = freed,
      cleanups = self.cleanups.len(),
      "pool reset"
    );
  }

  /// Runs cleanups newest first, frees large allocations, then frees every
  /// block. Later calls do nothing.
  pub fn destroy(&mut self) {
    if self.destroyed {
      return;
    }
    self.destroyed = true;

    // Memory goes back to the system even if a handler unwinds.
    let teardown = Teardown {
      system: &self.system,
      chain: &mut self.chain,
      large: &mut self.large,
    };

    let ran = self.cleanups.run_all();
    debug!(cleanups = ran, "cleanups ran");

    drop(teardown);
  }

  /// Whether `ptr` points into one of this pool's blocks or at a large
  /// allocation it still holds.
  pub fn owns(
    &self,
    ptr: NonNull<u8>,
  ) -> bool {
    self.chain.find(ptr.as_ptr()).is_some() || self.large.contains(ptr)
  }

  pub fn is_destroyed(&self) -> bool {
    self.destroyed
  }

  pub fn threshold(&self) -> usize {
    self.threshold
  }

  pub fn config(&self) -> &PoolConfig {
    &self.config
  }

  pub fn system(&self) -> &S {
    &self.system
  }

  pub fn stats(&self) -> PoolStats {
    let blocks = self.chain.blocks();

    PoolStats {
      blocks: blocks.len(),
      current: self.chain.current(),
      threshold: self.threshold,
      reserved: blocks.iter().map(Block::span).sum(),
      used: blocks.iter().map(Block::used).sum(),
      available: blocks.iter().map(Block::remaining).sum(),
      large_live: self.large.live(),
      large_slots: self.large.slots(),
      cleanups: self.cleanups.len(),
    }
  }
}

/// Frees large payloads, then every block, when dropped.
struct Teardown<'a, S: SystemAllocator> {
  system: &'a S,
  chain: &'a mut BlockChain,
  large: &'a mut LargeList,
}

impl<S: SystemAllocator> Drop for Teardown<'_, S> {
  fn drop(&mut self) {
    let freed = self.large.release_all(self.system);
    let blocks = self.chain.blocks().len();

    // SAFETY: every block came from `system`, and a destroyed pool hands out
    // no more pointers.
    unsafe { self.chain.release(self.system) };

    debug!(large_freed = freed, blocks, "pool destroyed");
  }
}

impl<S: SystemAllocator> Drop for Pool<S> {
  fn drop(&mut self) {
    self.destroy();
  }
}
