//! Collections provided by the crate.
//!
//! - `block_deque`: the block-based deque, its cursors and iterators

pub mod block_deque;

pub use block_deque::{
    Access, BlockCursor, BlockDeque, Cursor, CursorMut, IntoIter, Iter, IterMut, ReadOnly,
    ReadWrite, DEFAULT_BLOCK_SIZE,
};
