//! # `block_deque` - Block-Based Double-Ended Queue
//!
//! A double-ended queue that stores its elements in fixed-size blocks
//! reached through a small indirection table. Pushing at either end never
//! moves existing elements; growing the container only reallocates the
//! table of block pointers.
//!
//! ## Layout
//!
//! ```text
//!   indirection table      blocks (BLOCK slots each)
//!   +-----+
//!   |  0  | ---> [ . . . . ]
//!   |  1  | ---> [ . . a b ]   <- first_block, first_elem = 2
//!   |  2  | ---> [ c d e f ]
//!   |  3  | ---> [ g . . . ]   <- end of the live window
//!   |  4  | ---> [ . . . . ]
//!   +-----+
//! ```
//!
//! When an end runs out of room the table grows to three times its size
//! and the existing blocks move to the middle third, so there are free
//! blocks on both sides afterwards.
//!
//! ## Core Abstractions
//!
//! 1. **[`BlockDeque<T, BLOCK>`](BlockDeque)**:
//!    - `push_back`/`push_front`/`pop_back`/`pop_front` in amortized O(1)
//!    - indexed access in O(1), checked ([`BlockDeque::at`]) or panicking (`[]`)
//!    - `insert`/`erase` at any index, moving the shorter side
//!
//! 2. **[`Cursor`] / [`CursorMut`]**:
//!    - a `(block, elem)` position with random-access arithmetic
//!    - positions compare by their distance, not by the slot they name
//!
//! 3. **Errors** ([`error`]):
//!    - [`OutOfRange`] for checked access
//!    - [`TryReserveError`] for the fallible `try_*` operations
//!
//! ## Feature Flags
//!
//! - `tracing`: emits `trace!` events on table growth and rollback.
//! - `proptest`: implements `proptest::arbitrary::Arbitrary` for `BlockDeque`.
//! - `alloc-mimalloc`, `alloc-snmalloc`, `alloc-jemalloc`: pick the global
//!   allocator used by the benchmark suite.
//!
//! ## Example
//!
//! ```rust
//! use block_deque::BlockDeque;
//!
//! let mut deque: BlockDeque<u32, 4> = BlockDeque::new();
//! for i in 0..6 {
//!     deque.push_back(i);
//! }
//! deque.push_front(100);
//!
//! let cursor = deque.begin() + 3;
//! assert_eq!(cursor.get(), Some(&2));
//! assert_eq!(deque[3], 2);
//! assert!(deque.at(7).is_err());
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod collections;
pub mod error;

pub use collections::{BlockDeque, Cursor, CursorMut, IntoIter, Iter, IterMut, DEFAULT_BLOCK_SIZE};
pub use error::{OutOfRange, TryReserveError};

// Compile-time assertions for memory layout
const _: () = {
    use core::mem;

    // Indirection array (3 words) plus first_block, first_elem and len.
    assert!(mem::size_of::<BlockDeque<u8>>() == mem::size_of::<usize>() * 6);
    assert!(mem::size_of::<BlockDeque<String, 64>>() == mem::size_of::<BlockDeque<u8, 2>>());

    // Cursors are a table pointer, a position and the live window.
    assert!(mem::size_of::<Cursor<'static, u64, DEFAULT_BLOCK_SIZE>>() == mem::size_of::<usize>() * 5);
    assert!(mem::size_of::<Option<Cursor<'static, u64, DEFAULT_BLOCK_SIZE>>>() == mem::size_of::<Cursor<'static, u64, DEFAULT_BLOCK_SIZE>>());
};
