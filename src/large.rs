//! Tracker for allocations too big for the bump region.
//!
//! Records form a list whose head is the most recently added record. A record
//! whose payload has been released stays in the list as a reusable slot.

use std::{mem, ptr::NonNull};

use crate::system::SystemAllocator;

/// Bump-region bytes charged for each new record: a payload pointer and a
/// next link.
pub const LARGE_RECORD_SIZE: usize = 2 * mem::size_of::<usize>();

#[derive(Debug, Clone, Copy)]
struct LargeRecord {
  payload: Option<NonNull<u8>>,
  size: usize,
}

#[derive(Debug, Default)]
pub struct LargeList {
  /// Stored tail first, so the list head is the last element.
  records: Vec<LargeRecord>,
}

impl LargeList {
  pub fn new() -> Self {
    Self::default()
  }

  /// Stores `payload` in one of the first `probe_limit` records if any of
  /// them is free. Returns `false` when the caller must add a new record.
  pub fn reuse_slot(
    &mut self,
    payload: NonNull<u8>,
    size: usize,
    probe_limit: usize,
  ) -> bool {
    let free = self
      .records
      .iter_mut()
      .rev()
      .take(probe_limit)
      .find(|record| record.payload.is_none());

    match free {
      Some(record) => {
        record.payload = Some(payload);
        record.size = size;
        true
      }
      None => false,
    }
  }

  /// Inserts a new record at the head of the list.
  pub fn push_front(
    &mut self,
    payload: NonNull<u8>,
    size: usize,
  ) {
    self.records.push(LargeRecord {
      payload: Some(payload),
      size,
    });
  }

  /// Frees the payload equal to `ptr`, leaving its record free for reuse.
  /// Returns `false` when no record holds `ptr`.
  pub fn release<S: SystemAllocator>(
    &mut self,
    system: &S,
    ptr: NonNull<u8>,
  ) -> bool {
    let found = self
      .records
      .iter_mut()
      .rev()
      .find(|record| record.payload == Some(ptr));

    match found {
      Some(record) => {
        // SAFETY: the payload came from `system.alloc(record.size)` and is
        // only freed here or in `release_all`, both of which clear it.
        unsafe { system.free(ptr, record.size) };
        record.payload = None;
        true
      }
      None => false,
    }
  }

  /// Frees every live payload and drops all records. Returns how many
  /// payloads were freed.
  pub fn release_all<S: SystemAllocator>(
    &mut self,
    system: &S,
  ) -> usize {
    let mut freed = 0;

    for record in self.records.drain(..).rev() {
      if let Some(payload) = record.payload {
        unsafe { system.free(payload, record.size) };
        freed += 1;
      }
    }

    freed
  }

  /// Records currently holding a payload.
  pub fn live(&self) -> usize {
    self.records.iter().filter(|record| record.payload.is_some()).count()
  }

  /// All records, free or not.
  pub fn slots(&self) -> usize {
    self.records.len()
  }

  pub fn contains(
    &self,
    ptr: NonNull<u8>,
  ) -> bool {
    self.records.iter().any(|record| record.payload == Some(ptr))
  }
}
