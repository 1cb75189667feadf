//! Pool configuration.
//!
//! Every knob has the historical default, so `PoolConfig::default()` behaves
//! like the classic nginx-style pool: 16 KiB blocks aligned to 16 bytes, a
//! 4 KiB page floor for the small/large threshold, and both reuse heuristics
//! set to 4.

use serde::{Deserialize, Serialize};

use crate::{
  align::WORD,
  error::{PoolError, Result},
};

/// Default capacity of the head block.
pub const DEFAULT_POOL_SIZE: usize = 16 * 1024;

/// Page size used for the threshold floor.
pub const PAGE_SIZE: usize = 4 * 1024;

/// Alignment of every block handed out by the system allocator.
pub const POOL_ALIGNMENT: usize = 16;

/// Failures a block may accumulate before scans start past it.
pub const SKIP_AFTER_FAILURES: usize = 4;

/// Large-list records probed for a free slot before a new record is added.
pub const LARGE_PROBE_LIMIT: usize = 4;

/// Knobs fixed for the lifetime of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
  /// Total size of the head block, header included.
  pub capacity: usize,
  /// Requests up to `page_size - 1` bytes always stay in the bump region.
  pub page_size: usize,
  /// Alignment requested for each block.
  pub block_alignment: usize,
  pub skip_after_failures: usize,
  pub large_probe_limit: usize,
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_POOL_SIZE,
      page_size: PAGE_SIZE,
      block_alignment: POOL_ALIGNMENT,
      skip_after_failures: SKIP_AFTER_FAILURES,
      large_probe_limit: LARGE_PROBE_LIMIT,
    }
  }
}

impl PoolConfig {
  pub fn with_capacity(
    mut self,
    capacity: usize,
  ) -> Self {
    self.capacity = capacity;
    self
  }

  pub fn with_page_size(
    mut self,
    page_size: usize,
  ) -> Self {
    self.page_size = page_size;
    self
  }

  pub fn with_block_alignment(
    mut self,
    alignment: usize,
  ) -> Self {
    self.block_alignment = alignment;
    self
  }

  pub fn with_skip_after_failures(
    mut self,
    failures: usize,
  ) -> Self {
    self.skip_after_failures = failures;
    self
  }

  pub fn with_large_probe_limit(
    mut self,
    limit: usize,
  ) -> Self {
    self.large_probe_limit = limit;
    self
  }

  /// Checks the knobs the allocator relies on.
  pub fn validate(&self) -> Result<()> {
    if !self.block_alignment.is_power_of_two() {
      return Err(PoolError::InvalidConfig("block_alignment must be a power of two"));
    }
    if self.block_alignment < WORD {
      return Err(PoolError::InvalidConfig("block_alignment must be at least one word"));
    }
    if self.page_size == 0 {
      return Err(PoolError::InvalidConfig("page_size must be nonzero"));
    }
    Ok(())
  }

  /// Small/large threshold for a head block of `capacity` bytes.
  ///
  /// The page floor applies even when the head block is smaller than a page.
  pub(crate) fn threshold(
    &self,
    header: usize,
  ) -> usize {
    (self.capacity - header).max(self.page_size - 1)
  }
}
