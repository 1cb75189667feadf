//! # rpool - An Arena-Style Memory Pool
//!
//! This crate provides a **memory pool**: callers take many short-lived
//! allocations from it and release them all at once, instead of freeing each
//! one. Small requests are served by bumping a cursor through a chain of
//! blocks; requests above a threshold go straight to the system allocator and
//! are tracked individually. Cleanup callbacks can be attached so external
//! resources die with the pool.
//!
//! ## Overview
//!
//! ```text
//!   Pool Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │  Block chain (bump region)                                           │
//!   │                                                                      │
//!   │   ┌────────┬────┬────┬──────────┐   ┌──────┬────┬────┬────────────┐  │
//!   │   │ Pool   │ A1 │ A2 │  free    │──▶│Block │ A3 │ A4 │   free     │  │
//!   │   │ header │    │    │          │   │header│    │    │            │  │
//!   │   └────────┴────┴────┴──────────┘   └──────┴────┴────┴────────────┘  │
//!   │     head block     ▲                  overflow block ▲               │
//!   │                    └── cursor                        └── cursor      │
//!   │                                                                      │
//!   │  Large list:    [ptr] ─▶ [null] ─▶ [ptr]      (system allocations)   │
//!   │  Cleanup list:  [h3]  ─▶ [h2]   ─▶ [h1]       (run at destroy)       │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rpool
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── block      - One aligned region with a bump cursor
//!   ├── bump       - Block chain and growth policy
//!   ├── large      - Large-allocation tracker
//!   ├── cleanup    - Destroy-time callbacks
//!   ├── pool       - Pool lifecycle (create/alloc/dealloc/reset/destroy)
//!   ├── system     - SystemAllocator seam (libc malloc, std alloc)
//!   ├── config     - PoolConfig
//!   └── error      - PoolError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rpool::Pool;
//!
//! let mut pool = Pool::create(4096).unwrap();
//!
//! // Small: carved from the block chain.
//! let small = pool.alloc(64).unwrap();
//! unsafe { small.as_ptr().write_bytes(0, 64) };
//!
//! // Large: straight from the system allocator, releasable on its own.
//! let large = pool.alloc(64 * 1024).unwrap();
//! assert!(pool.dealloc(large));
//!
//! // Everything else goes at once.
//! pool.destroy();
//! ```
//!
//! ## How It Works
//!
//! A request of at most [`Pool::threshold`] bytes is a small allocation.
//! The threshold is fixed at creation as
//! `max(capacity - header, page_size - 1)`:
//!
//! ```text
//!   alloc(size)
//!       │
//!       ├── size <= threshold ──▶ scan blocks from `current`
//!       │                            │
//!       │                            ├── fits ──▶ bump cursor, return
//!       │                            └── none ──▶ new block, same span
//!       │                                         as the head block
//!       │
//!       └── size >  threshold ──▶ system alloc + large-list record
//! ```
//!
//! Each time the chain grows, every scanned block is charged a failure. A
//! block that has failed more than
//! [`skip_after_failures`](PoolConfig::skip_after_failures) times is skipped
//! by later scans, so old exhausted blocks stop costing anything.
//!
//! ## Lifecycle
//!
//! - [`Pool::reset`] frees large allocations and rewinds every cursor. Blocks
//!   and cleanups stay.
//! - [`Pool::destroy`] runs cleanups newest first, frees large allocations,
//!   then frees the blocks. It is idempotent and also runs on drop.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **No per-allocation free**: Only large allocations can be released early
//! - **No resizing**: Allocations never grow or shrink
//!
//! ## Safety
//!
//! The pool hands out raw pointers. Dereferencing them is the caller's
//! responsibility and is only valid until the next `reset` or `destroy`.

pub mod align;
mod block;
mod bump;
mod cleanup;
pub mod config;
mod error;
mod large;
mod pool;
pub mod system;

pub use block::{BLOCK_HEADER_SIZE, POOL_HEADER_SIZE};
pub use cleanup::{Cleanup, CleanupHandler};
pub use config::PoolConfig;
pub use error::{PoolError, Result};
pub use pool::{Pool, PoolStats};
pub use system::{DefaultAllocator, StdAlloc, SystemAllocator};

#[cfg(unix)]
pub use system::Malloc;
