//! The boundary between the pool and whatever hands out raw memory.

use std::{alloc::Layout, ptr::NonNull};

/// Source of the memory a pool manages.
///
/// # Safety
///
/// Implementors must return pointers to fresh, exclusively owned regions of at
/// least the requested size. `alloc_aligned` must honour `align`; `alloc` must
/// return memory aligned to at least one machine word.
pub unsafe trait SystemAllocator {
  /// Allocates `size` bytes aligned to `align` (a power of two).
  fn alloc_aligned(
    &self,
    size: usize,
    align: usize,
  ) -> Option<NonNull<u8>>;

  /// Releases a region obtained from `alloc_aligned`.
  ///
  /// # Safety
  ///
  /// `ptr`, `size` and `align` must match a previous `alloc_aligned` call, and
  /// the region must not be used afterwards.
  unsafe fn free_aligned(
    &self,
    ptr: NonNull<u8>,
    size: usize,
    align: usize,
  );

  /// Allocates `size` bytes with word alignment.
  fn alloc(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>>;

  /// Releases a region obtained from `alloc`.
  ///
  /// # Safety
  ///
  /// `ptr` and `size` must match a previous `alloc` call.
  unsafe fn free(
    &self,
    ptr: NonNull<u8>,
    size: usize,
  );
}

/// The C allocator: `posix_memalign` for blocks, `malloc` for large payloads.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Malloc;

#[cfg(unix)]
unsafe impl SystemAllocator for Malloc {
  fn alloc_aligned(
    &self,
    size: usize,
    align: usize,
  ) -> Option<NonNull<u8>> {
    let mut ptr: *mut libc::c_void = std::ptr::null_mut();

    if unsafe { libc::posix_memalign(&mut ptr, align, size) } != 0 {
      return None;
    }

    NonNull::new(ptr as *mut u8)
  }

  unsafe fn free_aligned(
    &self,
    ptr: NonNull<u8>,
    _size: usize,
    _align: usize,
  ) {
    unsafe { libc::free(ptr.as_ptr() as *mut libc::c_void) }
  }

  fn alloc(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    NonNull::new(unsafe { libc::malloc(size) } as *mut u8)
  }

  unsafe fn free(
    &self,
    ptr: NonNull<u8>,
    _size: usize,
  ) {
    unsafe { libc::free(ptr.as_ptr() as *mut libc::c_void) }
  }
}

/// Rust's global allocator, addressed through [`Layout`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdAlloc;

unsafe impl SystemAllocator for StdAlloc {
  fn alloc_aligned(
    &self,
    size: usize,
    align: usize,
  ) -> Option<NonNull<u8>> {
    let layout = Layout::from_size_align(size, align).ok()?;
    if layout.size() == 0 {
      return None;
    }

    NonNull::new(unsafe { std::alloc::alloc(layout) })
  }

  unsafe fn free_aligned(
    &self,
    ptr: NonNull<u8>,
    size: usize,
    align: usize,
  ) {
    unsafe {
      std::alloc::dealloc(
        ptr.as_ptr(),
        Layout::from_size_align_unchecked(size, align),
      )
    }
  }

  fn alloc(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    self.alloc_aligned(size, core::mem::size_of::<usize>())
  }

  unsafe fn free(
    &self,
    ptr: NonNull<u8>,
    size: usize,
  ) {
    unsafe { self.free_aligned(ptr, size, core::mem::size_of::<usize>()) }
  }
}

/// The allocator a [`Pool`](crate::Pool) uses unless told otherwise.
#[cfg(unix)]
pub type DefaultAllocator = Malloc;

/// The allocator a [`Pool`](crate::Pool) uses unless told otherwise.
#[cfg(not(unix))]
pub type DefaultAllocator = StdAlloc;
