use std::{mem, ptr::NonNull};

use crate::{align, system::SystemAllocator};

/// Bytes reserved at the front of every overflow block: cursor, end, next
/// link and failure counter.
pub const BLOCK_HEADER_SIZE: usize = 4 * mem::size_of::<usize>();

/// Bytes reserved at the front of the head block: the block header plus the
/// pool-wide fields (threshold, current hint, large head, cleanup head).
pub const POOL_HEADER_SIZE: usize = BLOCK_HEADER_SIZE + 4 * mem::size_of::<usize>();

/// Position of a block in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
  /// The first block, carrying the pool header.
  Head,
  /// Any block added when the chain grows.
  Overflow,
}

impl BlockKind {
  pub const fn header_size(self) -> usize {
    match self {
      BlockKind::Head => POOL_HEADER_SIZE,
      BlockKind::Overflow => BLOCK_HEADER_SIZE,
    }
  }
}

/// One aligned region obtained from the system allocator.
///
/// The cursor (`last`) is kept as an offset from `start` and never passes
/// `span`. A block does not free itself; the chain owning it calls
/// [`Block::release`] with the allocator that produced it.
#[derive(Debug)]
pub struct Block {
  start: NonNull<u8>,
  span: usize,
  last: usize,
  failed: usize,
  kind: BlockKind,
}

impl Block {
  pub fn allocate<S: SystemAllocator>(
    system: &S,
    span: usize,
    alignment: usize,
    kind: BlockKind,
  ) -> Option<Self> {
    debug_assert!(span >= kind.header_size());

    let start = system.alloc_aligned(span, alignment)?;

    Some(Self {
      start,
      span,
      last: kind.header_size(),
      failed: 0,
      kind,
    })
  }

  /// Carves `size` word-aligned bytes from the cursor, or returns `None`
  /// when the block has no room left.
  pub fn try_bump(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let base = self.start.as_ptr() as usize;
    let offset = align!(base + self.last) - base;

    if offset > self.span || self.span - offset < size {
      return None;
    }

    self.last = offset + size;

    // SAFETY: offset <= span, so the pointer stays inside this block.
    Some(unsafe { self.start.add(offset) })
  }

  /// Moves the cursor back to just past the header and forgets failures.
  pub fn rewind(&mut self) {
    self.last = self.kind.header_size();
    self.failed = 0;
  }

  /// Returns the failure count before incrementing it.
  pub fn record_failure(&mut self) -> usize {
    let failed = self.failed;
    self.failed += 1;
    failed
  }

  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    let base = self.start.as_ptr() as usize;
    let addr = ptr as usize;
    addr >= base && addr < base + self.span
  }

  #[cfg(test)]
  pub fn start(&self) -> NonNull<u8> {
    self.start
  }

  /// Address one past the last usable byte.
  pub fn end(&self) -> usize {
    self.start.as_ptr() as usize + self.span
  }

  pub fn span(&self) -> usize {
    self.span
  }

  pub fn used(&self) -> usize {
    self.last
  }

  pub fn remaining(&self) -> usize {
    self.span - self.last
  }

  #[cfg(test)]
  pub fn failed(&self) -> usize {
    self.failed
  }

  pub fn kind(&self) -> BlockKind {
    self.kind
  }

  /// Hands the region back to `system`.
  ///
  /// # Safety
  ///
  /// `system` and `alignment` must be the ones passed to
  /// [`Block::allocate`], and no pointer carved from this block may be used
  /// afterwards.
  pub unsafe fn release<S: SystemAllocator>(
    self,
    system: &S,
    alignment: usize,
  ) {
    unsafe { system.free_aligned(self.start, self.span, alignment) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{align::WORD, system::StdAlloc};

  #[test]
  fn test_header_sizes() {
    assert_eq!(BLOCK_HEADER_SIZE, 4 * WORD);
    assert_eq!(POOL_HEADER_SIZE, 8 * WORD);
    assert_eq!(BlockKind::Head.header_size(), POOL_HEADER_SIZE);
    assert_eq!(BlockKind::Overflow.header_size(), BLOCK_HEADER_SIZE);
  }

  #[test]
  fn test_bump_until_full() {
    let mut block = Block::allocate(&StdAlloc, 256, 16, BlockKind::Overflow).unwrap();
    let base = block.start().as_ptr() as usize;

    let first = block.try_bump(3).unwrap();
    assert_eq!(first.as_ptr() as usize, base + BLOCK_HEADER_SIZE);

    let second = block.try_bump(8).unwrap();
    assert_eq!(second.as_ptr() as usize, base + BLOCK_HEADER_SIZE + WORD);
    assert_eq!(second.as_ptr() as usize % WORD, 0);

    let rest = block.remaining();
    assert!(block.try_bump(rest + 1).is_none());
    assert!(block.try_bump(rest).is_some());
    assert_eq!(block.remaining(), 0);
    assert!(block.try_bump(1).is_none());
    assert!(block.used() <= block.span());

    unsafe { block.release(&StdAlloc, 16) };
  }

  #[test]
  fn test_rewind() {
    let mut block = Block::allocate(&StdAlloc, 512, 16, BlockKind::Head).unwrap();
    let first = block.try_bump(40).unwrap();
    block.try_bump(100).unwrap();
    assert_eq!(block.record_failure(), 0);
    assert_eq!(block.record_failure(), 1);

    block.rewind();
    assert_eq!(block.used(), POOL_HEADER_SIZE);
    assert_eq!(block.failed(), 0);
    assert_eq!(block.try_bump(40), Some(first));
    assert!(block.contains(first.as_ptr()));
    assert!(!block.contains(block.end() as *const u8));

    unsafe { block.release(&StdAlloc, 16) };
  }
}
