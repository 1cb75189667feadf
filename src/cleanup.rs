//! Callbacks that run when the pool is destroyed.

use std::{fmt, mem, ptr::NonNull};

/// Bump-region bytes charged for each record: handler, data and next link.
pub const CLEANUP_RECORD_SIZE: usize = 3 * mem::size_of::<usize>();

/// Callback invoked with the record's data pointer.
pub type CleanupHandler = Box<dyn FnOnce(*mut u8)>;

/// A registered cleanup.
///
/// The pool never owns what `data` points at; the handler decides what to do
/// with it.
pub struct Cleanup {
  handler: Option<CleanupHandler>,
  data: *mut u8,
  buffer: Option<NonNull<u8>>,
}

impl Cleanup {
  pub(crate) fn new(buffer: Option<NonNull<u8>>) -> Self {
    Self {
      handler: None,
      data: buffer.map_or(std::ptr::null_mut(), NonNull::as_ptr),
      buffer,
    }
  }

  pub fn set_handler<F>(
    &mut self,
    handler: F,
  ) -> &mut Self
  where
    F: FnOnce(*mut u8) + 'static,
  {
    self.handler = Some(Box::new(handler));
    self
  }

  pub fn set_data(
    &mut self,
    data: *mut u8,
  ) -> &mut Self {
    self.data = data;
    self
  }

  pub fn data(&self) -> *mut u8 {
    self.data
  }

  /// Pool-owned buffer reserved by `add_cleanup`, if a size was requested.
  pub fn buffer(&self) -> Option<NonNull<u8>> {
    self.buffer
  }

  pub fn has_handler(&self) -> bool {
    self.handler.is_some()
  }

  fn run(self) -> bool {
    match self.handler {
      Some(handler) => {
        handler(self.data);
        true
      }
      None => false,
    }
  }
}

impl fmt::Debug for Cleanup {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Cleanup")
      .field("handler", &self.handler.is_some())
      .field("data", &self.data)
      .field("buffer", &self.buffer)
      .finish()
  }
}

/// LIFO registry of cleanups.
#[derive(Debug, Default)]
pub struct CleanupList {
  /// Registration order; the list head is the last element.
  records: Vec<Cleanup>,
}

impl CleanupList {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push_front(
    &mut self,
    cleanup: Cleanup,
  ) -> &mut Cleanup {
    self.records.push(cleanup);
    let head = self.records.len() - 1;
    &mut self.records[head]
  }

  /// Runs every handler from the head down and empties the list. Returns how
  /// many handlers ran.
  pub fn run_all(&mut self) -> usize {
    let mut ran = 0;

    while let Some(cleanup) = self.records.pop() {
      if cleanup.run() {
        ran += 1;
      }
    }

    ran
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[test]
  fn test_runs_in_reverse_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut list = CleanupList::new();

    for id in 0..3 {
      let order = Rc::clone(&order);
      list
        .push_front(Cleanup::new(None))
        .set_handler(move |_| order.borrow_mut().push(id));
    }
    list.push_front(Cleanup::new(None));

    assert_eq!(list.run_all(), 3);
    assert_eq!(*order.borrow(), vec![2, 1, 0]);
    assert!(list.is_empty());
  }

  #[test]
  fn test_handler_receives_data() {
    let mut value = 0u32;
    let mut list = CleanupList::new();

    list
      .push_front(Cleanup::new(None))
      .set_data(&mut value as *mut u32 as *mut u8)
      .set_handler(|data| unsafe { *(data as *mut u32) = 7 });

    list.run_all();
    assert_eq!(value, 7);
  }

  #[test]
  fn test_data_starts_at_buffer() {
    let mut byte = 0u8;
    let buffer = NonNull::from(&mut byte);

    let cleanup = Cleanup::new(Some(buffer));
    assert_eq!(cleanup.data(), buffer.as_ptr());
    assert!(!cleanup.has_handler());

    assert!(Cleanup::new(None).data().is_null());
  }
}
