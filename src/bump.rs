use std::ptr::NonNull;

use tracing::{debug, warn};

use crate::{
  block::{BLOCK_HEADER_SIZE, Block, BlockKind},
  system::SystemAllocator,
};

/// The small-allocation path: a chain of blocks with a bump cursor each.
///
/// Blocks are addressed by index; index 0 is always the head block. Scans
/// start at `current`, which only moves forward between resets.
#[derive(Debug)]
pub struct BlockChain {
  blocks: Vec<Block>,
  current: usize,
  /// Span of the head block, reused for every overflow block.
  span: usize,
  alignment: usize,
  skip_after_failures: usize,
}

impl BlockChain {
  pub fn new(
    head: Block,
    alignment: usize,
    skip_after_failures: usize,
  ) -> Self {
    debug_assert_eq!(head.kind(), BlockKind::Head);

    Self {
      span: head.span(),
      blocks: vec![head],
      current: 0,
      alignment,
      skip_after_failures,
    }
  }

  /// Bump-allocates `size` bytes, growing the chain when no block from
  /// `current` onward has room.
  pub fn bump<S: SystemAllocator>(
    &mut self,
    system: &S,
    size: usize,
  ) -> Option<NonNull<u8>> {
    for block in self.blocks.iter_mut().skip(self.current) {
      if let Some(ptr) = block.try_bump(size) {
        return Some(ptr);
      }
    }

    self.grow(system, size)
  }

  fn grow<S: SystemAllocator>(
    &mut self,
    system: &S,
    size: usize,
  ) -> Option<NonNull<u8>> {
    // The page floor on the threshold lets a small request outgrow a block
    // of the head's span.
    let span = self.span.max(BLOCK_HEADER_SIZE.checked_add(size)?);

    let Some(mut block) = Block::allocate(system, span, self.alignment, BlockKind::Overflow) else {
      warn!(span, "system allocator refused a new block");
      return None;
    };

    let Some(ptr) = block.try_bump(size) else {
      unsafe { block.release(system, self.alignment) };
      return None;
    };

    // Every block from `current` up to, but not including, the old tail is
    // charged a failure. One that had already failed too often hands
    // `current` to its successor.
    let mut current = self.current;
    for index in self.current..self.blocks.len().saturating_sub(1) {
      if self.blocks[index].record_failure() > self.skip_after_failures {
        current = index + 1;
      }
    }

    self.blocks.push(block);
    self.current = current;

    debug!(
      blocks = self.blocks.len(),
      span,
      current = self.current,
      "block chain grew"
    );

    Some(ptr)
  }

  /// Rewinds every cursor and points `current` back at the head.
  pub fn rewind(&mut self) {
    for block in &mut self.blocks {
      block.rewind();
    }
    self.current = 0;
  }

  /// Frees every block, head included.
  ///
  /// # Safety
  ///
  /// `system` must be the allocator the blocks came from, and no pointer
  /// carved from the chain may be used afterwards.
  pub unsafe fn release<S: SystemAllocator>(
    &mut self,
    system: &S,
  ) {
    for block in self.blocks.drain(..) {
      unsafe { block.release(system, self.alignment) };
    }
    self.current = 0;
  }

  pub fn blocks(&self) -> &[Block] {
    &self.blocks
  }

  pub fn current(&self) -> usize {
    self.current
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  /// Block holding `ptr`, if any.
  pub fn find(
    &self,
    ptr: *const u8,
  ) -> Option<&Block> {
    self.blocks.iter().find(|block| block.contains(ptr))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{align, block::POOL_HEADER_SIZE, system::StdAlloc};

  fn chain(span: usize) -> BlockChain {
    let head = Block::allocate(&StdAlloc, span, 16, BlockKind::Head).unwrap();
    BlockChain::new(head, 16, 4)
  }

  #[test]
  fn test_bump_from_head() {
    let mut chain = chain(1024);
    let base = chain.blocks()[0].start().as_ptr() as usize;

    let first = chain.bump(&StdAlloc, 10).unwrap();
    assert_eq!(first.as_ptr() as usize, base + POOL_HEADER_SIZE);

    let second = chain.bump(&StdAlloc, 10).unwrap();
    assert_eq!(second.as_ptr() as usize, base + align!(POOL_HEADER_SIZE + 10));
    assert_eq!(chain.blocks().len(), 1);

    unsafe { chain.release(&StdAlloc) };
  }

  #[test]
  fn test_grow_keeps_head_span() {
    let mut chain = chain(1024);

    chain.bump(&StdAlloc, 500).unwrap();
    let second = chain.bump(&StdAlloc, 500).unwrap();
    let third = chain.bump(&StdAlloc, 500).unwrap();

    assert_eq!(chain.blocks().len(), 3);
    for block in chain.blocks() {
      assert_eq!(block.span(), 1024);
    }

    let owner = chain.find(second.as_ptr()).unwrap();
    assert_eq!(owner.kind(), BlockKind::Overflow);
    assert_eq!(
      second.as_ptr() as usize,
      owner.start().as_ptr() as usize + BLOCK_HEADER_SIZE
    );
    assert!(chain.find(third.as_ptr()).is_some());

    unsafe { chain.release(&StdAlloc) };
  }

  #[test]
  fn test_grow_oversized_request() {
    let mut chain = chain(256);

    let ptr = chain.bump(&StdAlloc, 2000).unwrap();
    let block = chain.find(ptr.as_ptr()).unwrap();

    assert_eq!(block.span(), BLOCK_HEADER_SIZE + 2000);
    assert!(ptr.as_ptr() as usize + 2000 <= block.end());

    unsafe { chain.release(&StdAlloc) };
  }

  #[test]
  fn test_current_skips_exhausted_blocks() {
    let mut chain = chain(256);
    let room = 256 - POOL_HEADER_SIZE;

    // Each request is too big for any existing block, so every call grows
    // the chain. The tail in place before a growth is never charged.
    chain.bump(&StdAlloc, room + 1).unwrap();
    assert_eq!(chain.blocks()[0].failed(), 0);

    for _ in 1..6 {
      chain.bump(&StdAlloc, room + 1).unwrap();
      assert_eq!(chain.current(), 0);
    }
    assert_eq!(chain.blocks()[0].failed(), 5);
    assert_eq!(chain.blocks()[1].failed(), 4);
    assert_eq!(chain.blocks()[5].failed(), 0);

    // Seventh growth: the head had already failed five times.
    chain.bump(&StdAlloc, room + 1).unwrap();
    assert_eq!(chain.current(), 1);
    assert_eq!(chain.blocks()[0].failed(), 6);
    assert_eq!(chain.blocks().len(), 8);

    chain.rewind();
    assert_eq!(chain.current(), 0);
    assert!(chain.blocks().iter().all(|block| block.failed() == 0));

    unsafe { chain.release(&StdAlloc) };
    assert!(chain.is_empty());
  }
}
