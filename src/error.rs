//! Error types for pool creation and fallible allocation.

use thiserror::Error;

/// Failures a pool can report to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
  /// The requested capacity cannot even hold the pool header.
  #[error("capacity {capacity} is smaller than the pool header ({header} bytes)")]
  CapacityTooSmall { capacity: usize, header: usize },

  /// The system allocator returned nothing.
  #[error("system allocator could not supply {size} bytes")]
  AllocationFailure { size: usize },

  /// A configuration knob is out of range.
  #[error("invalid pool configuration: {0}")]
  InvalidConfig(&'static str),

  /// The pool has already been destroyed.
  #[error("pool has been destroyed")]
  Destroyed,
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages() {
    let err = PoolError::CapacityTooSmall { capacity: 8, header: 64 };
    assert_eq!(err.to_string(), "capacity 8 is smaller than the pool header (64 bytes)");

    let err = PoolError::AllocationFailure { size: 4096 };
    assert_eq!(err.to_string(), "system allocator could not supply 4096 bytes");
  }
}
