//! `BlockDeque` - a double-ended queue over a table of fixed-size blocks.
//!
//! ## Performance Characteristics
//!
//! ### Time Complexity
//! - **Push/Pop at either end**: O(1) amortized; growth triples the block table
//! - **Indexed access**: O(1) - one division into `(block, elem)`
//! - **Insert/Erase in the middle**: O(min(i, n - i)) element moves
//! - **Iteration**: O(1) per element, cursor stepping within a block
//!
//! ### Memory Layout
//! - **Blocks**: `BLOCK` slots each, independently allocated, never moved
//! - **Indirection array**: one pointer per block; only this is reallocated
//! - **Centered growth**: old blocks land in the middle third of the new
//!   table, leaving free blocks on both sides
//! - **Reuse**: the table only grows when the window touches one of its
//!   ends; a deque that becomes empty moves its window back to the middle,
//!   so a queue that drains fully does not keep growing. A queue that never
//!   empties still drifts toward one end and grows
//!
//! ### Exception Safety
//! - Construction, cloning, `push_back` and `push_front` are all-or-nothing:
//!   if a clone, `Default::default` or a value closure panics, or an
//!   allocation fails, everything done by the call is undone.
//! - `insert` and `erase` only move values bitwise and cannot fail halfway.
//!
//! ## Usage
//!
//! ```rust
//! use block_deque::BlockDeque;
//!
//! let mut deque: BlockDeque<i32> = BlockDeque::new();
//! deque.push_back(1);
//! deque.push_back(2);
//! deque.push_front(0);
//! assert_eq!(deque.iter().copied().collect::<Vec<_>>(), [0, 1, 2]);
//!
//! let at = (deque.begin() + 1).index().unwrap();
//! deque.insert(at, 9);
//! assert_eq!(deque.erase(0), Some(0));
//! assert_eq!(deque, BlockDeque::from_iter([9, 1, 2]));
//! ```

mod cursor;
mod iter;
mod table;

#[cfg(feature = "proptest")]
mod arbitrary;

#[cfg(test)]
mod tests;

use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Index, IndexMut};

use crate::error::{OutOfRange, TryReserveError};

pub use cursor::{Access, BlockCursor, Cursor, CursorMut, ReadOnly, ReadWrite};
pub use iter::{IntoIter, Iter, IterMut};

use table::{BlockTable, GrowthGuard};

/// Default number of element slots per block.
pub const DEFAULT_BLOCK_SIZE: usize = 32;

/// A double-ended queue backed by fixed-capacity blocks of `BLOCK` slots.
///
/// Elements never move between blocks when the deque grows: only the
/// indirection array is reallocated. Moving through the container is
/// done with [`Cursor`]s (random-access positions) or the usual iterators.
pub struct BlockDeque<T, const BLOCK: usize = DEFAULT_BLOCK_SIZE> {
    table: BlockTable<T, BLOCK>,
}

// SAFETY: the deque owns its elements; the raw block pointers are never
// shared outside of borrows of the deque itself.
unsafe impl<T: Send, const BLOCK: usize> Send for BlockDeque<T, BLOCK> {}
unsafe impl<T: Sync, const BLOCK: usize> Sync for BlockDeque<T, BLOCK> {}

impl<T, const BLOCK: usize> BlockDeque<T, BLOCK> {
    /// Number of element slots per block.
    pub const BLOCK_SIZE: usize = BLOCK;

    /// Creates an empty deque. Does not allocate.
    pub const fn new() -> Self {
        Self {
            table: BlockTable::new(),
        }
    }

    /// Creates a deque of `len` elements, the `i`-th being `f(i)`.
    ///
    /// # Panics
    /// Panics if the allocation fails, or if `f` panics; in the latter case
    /// every element produced so far is dropped and all storage freed.
    pub fn from_fn<F>(len: usize, f: F) -> Self
    where
        F: FnMut(usize) -> T,
    {
        Self::try_from_fn(len, f).unwrap_or_else(|err| err.raise())
    }

    /// Fallible [`from_fn`](Self::from_fn).
    ///
    /// # Errors
    /// Returns [`TryReserveError`] if the blocks cannot be allocated.
    pub fn try_from_fn<F>(len: usize, mut f: F) -> Result<Self, TryReserveError>
    where
        F: FnMut(usize) -> T,
    {
        let mut deque = Self::new();
        drop(deque.table.reserve(len.div_ceil(BLOCK))?);
        deque.table.reset_window(0, 0);
        for index in 0..len {
            // If `f` panics, dropping `deque` destroys exactly the
            // elements written so far.
            let value = f(index);
            // SAFETY: the table has room for `len` slots from offset 0.
            unsafe { deque.table.write(index, value) };
            deque.table.extend_back();
        }
        Ok(deque)
    }

    /// Returns the number of elements.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if there are no elements.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Returns the number of allocated blocks.
    #[inline]
    pub fn capacity_blocks(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the total slot count across allocated blocks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity() * BLOCK
    }

    /// Ensures the block table holds at least `blocks` blocks.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn reserve_blocks(&mut self, blocks: usize) {
        if let Err(err) = self.try_reserve_blocks(blocks) {
            err.raise();
        }
    }

    /// Fallible [`reserve_blocks`](Self::reserve_blocks). Elements keep their
    /// order and values; cursors must be re-derived afterwards.
    ///
    /// # Errors
    /// Returns [`TryReserveError`] and leaves the deque untouched if the
    /// table cannot grow.
    pub fn try_reserve_blocks(&mut self, blocks: usize) -> Result<(), TryReserveError> {
        self.table.reserve(blocks).map(drop)
    }

    /// Returns a reference to the element at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        // SAFETY: bounds checked.
        (index < self.len()).then(|| unsafe { self.table.get_unchecked(index) })
    }

    /// Returns a mutable reference to the element at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len() {
            // SAFETY: bounds checked.
            Some(unsafe { self.table.get_unchecked_mut(index) })
        } else {
            None
        }
    }

    /// Returns a reference to the element at `index` without bounds checks.
    ///
    /// # Safety
    /// Caller must ensure `index < self.len()`.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        self.table.get_unchecked(index)
    }

    /// Returns a mutable reference to the element at `index` without bounds
    /// checks.
    ///
    /// # Safety
    /// Caller must ensure `index < self.len()`.
    #[inline(always)]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        self.table.get_unchecked_mut(index)
    }

    /// Checked access.
    ///
    /// # Errors
    /// Returns [`OutOfRange`] if `index >= self.len()`.
    pub fn at(&self, index: usize) -> Result<&T, OutOfRange> {
        let len = self.len();
        self.get(index).ok_or(OutOfRange { index, len })
    }

    /// Checked mutable access.
    ///
    /// # Errors
    /// Returns [`OutOfRange`] if `index >= self.len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, OutOfRange> {
        let len = self.len();
        self.get_mut(index).ok_or(OutOfRange { index, len })
    }

    /// Returns the first element.
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the first element mutably.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Returns the last element.
    pub fn back(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    /// Returns the last element mutably.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.len().checked_sub(1).and_then(move |last| self.get_mut(last))
    }

    /// Appends `value` at the back.
    ///
    /// # Panics
    /// Panics if the block table has to grow and the allocation fails.
    pub fn push_back(&mut self, value: T) {
        if let Err(err) = self.try_push_back(value) {
            err.raise();
        }
    }

    /// Fallible [`push_back`](Self::push_back).
    ///
    /// # Errors
    /// Returns [`TryReserveError`] and leaves the deque untouched if the
    /// block table cannot grow. The value is dropped in that case.
    pub fn try_push_back(&mut self, value: T) -> Result<(), TryReserveError> {
        self.try_push_back_with(|| value)
    }

    /// Appends the value produced by `f`, which runs once a slot is
    /// available.
    ///
    /// If `f` panics, any growth of the block table done by this call is
    /// rolled back before the panic continues.
    ///
    /// # Panics
    /// Panics if the allocation fails, or if `f` panics.
    pub fn push_back_with<F>(&mut self, f: F)
    where
        F: FnOnce() -> T,
    {
        if let Err(err) = self.try_push_back_with(f) {
            err.raise();
        }
    }

    /// Fallible [`push_back_with`](Self::push_back_with).
    ///
    /// # Errors
    /// Returns [`TryReserveError`] without calling `f` if the block table
    /// cannot grow.
    pub fn try_push_back_with<F>(&mut self, f: F) -> Result<(), TryReserveError>
    where
        F: FnOnce() -> T,
    {
        let retired = if self.table.is_full() {
            self.table.grow_back()?
        } else {
            None
        };
        let mut growth = GrowthGuard::new(&mut self.table, retired);
        let value = f();
        let table = growth.commit();
        let end = table.end();
        // SAFETY: the table is not full, so `end` is a vacant slot.
        unsafe { table.write(end, value) };
        table.extend_back();
        Ok(())
    }

    /// Prepends `value` at the front.
    ///
    /// # Panics
    /// Panics if the block table has to grow and the allocation fails.
    pub fn push_front(&mut self, value: T) {
        if let Err(err) = self.try_push_front(value) {
            err.raise();
        }
    }

    /// Fallible [`push_front`](Self::push_front).
    ///
    /// # Errors
    /// Returns [`TryReserveError`] and leaves the deque untouched if the
    /// block table cannot grow. The value is dropped in that case.
    pub fn try_push_front(&mut self, value: T) -> Result<(), TryReserveError> {
        self.try_push_front_with(|| value)
    }

    /// Prepends the value produced by `f`, which runs once a slot is
    /// available.
    ///
    /// If `f` panics, any growth of the block table done by this call is
    /// rolled back before the panic continues.
    ///
    /// # Panics
    /// Panics if the allocation fails, or if `f` panics.
    pub fn push_front_with<F>(&mut self, f: F)
    where
        F: FnOnce() -> T,
    {
        if let Err(err) = self.try_push_front_with(f) {
            err.raise();
        }
    }

    /// Fallible [`push_front_with`](Self::push_front_with).
    ///
    /// # Errors
    /// Returns [`TryReserveError`] without calling `f` if the block table
    /// cannot grow.
    pub fn try_push_front_with<F>(&mut self, f: F) -> Result<(), TryReserveError>
    where
        F: FnOnce() -> T,
    {
        let retired = if self.table.front_exhausted() {
            self.table.grow_front()?
        } else {
            None
        };
        let mut growth = GrowthGuard::new(&mut self.table, retired);
        let value = f();
        let table = growth.commit();
        let before = table.start() - 1;
        // SAFETY: the window does not start at offset 0, so the slot right
        // before it is inside the table and vacant.
        unsafe { table.write(before, value) };
        table.extend_front();
        Ok(())
    }

    /// Removes the last element and returns it, or `None` if empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.table.shrink_back();
        let end = self.table.end();
        // SAFETY: `end` was the last live slot before shrinking.
        let value = unsafe { self.table.read(end) };
        self.recenter_if_empty();
        Some(value)
    }

    /// Removes the first element and returns it, or `None` if empty.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let start = self.table.start();
        // SAFETY: `start` is live while the deque is non-empty.
        let value = unsafe { self.table.read(start) };
        self.table.shrink_front();
        self.recenter_if_empty();
        Some(value)
    }

    /// An emptied deque restarts from the middle of its table, so a queue
    /// that drains fully keeps reusing the same blocks.
    fn recenter_if_empty(&mut self) {
        if self.is_empty() {
            self.table.recenter();
        }
    }

    /// Inserts `value` so that it ends up at `index`, shifting the shorter
    /// side of the deque by one slot.
    ///
    /// # Panics
    /// Panics if `index > self.len()`, or if the allocation fails.
    pub fn insert(&mut self, index: usize, value: T) {
        if let Err(err) = self.try_insert(index, value) {
            err.raise();
        }
    }

    /// Fallible [`insert`](Self::insert).
    ///
    /// # Errors
    /// Returns [`TryReserveError`] and leaves the deque untouched if the
    /// block table cannot grow.
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<(), TryReserveError> {
        let len = self.len();
        assert!(index <= len, "insertion index (is {index}) should be <= len (is {len})");

        let toward_front = index < len - index;
        let mut slot = self.table.slot_of(index);
        let retired = if toward_front && self.table.front_exhausted() {
            self.table.grow_front()?
        } else if !toward_front && self.table.is_full() {
            self.table.grow_back()?
        } else {
            None
        };
        if let Some(retired) = retired {
            self.table.rebase(&mut slot, &retired);
        }

        let at = slot.offset::<BLOCK>();
        // SAFETY: every moved slot lies in the live window or in the free
        // slot right next to the end being extended, which exists after the
        // growth check above.
        unsafe {
            if toward_front {
                for offset in self.table.start()..at {
                    self.table.move_slot(offset, offset - 1);
                }
                self.table.write(at - 1, value);
                self.table.extend_front();
            } else {
                for offset in (at..self.table.end()).rev() {
                    self.table.move_slot(offset, offset + 1);
                }
                self.table.write(at, value);
                self.table.extend_back();
            }
        }
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting the shorter side
    /// of the deque by one slot. Returns `None` if `index >= self.len()`.
    pub fn erase(&mut self, index: usize) -> Option<T> {
        let len = self.len();
        if index >= len {
            return None;
        }
        let at = self.table.slot_of(index).offset::<BLOCK>();
        // SAFETY: `at` is live; the loops only move live slots into the
        // hole left behind, and the window then shrinks on that side.
        unsafe {
            let value = self.table.read(at);
            if index < len - 1 - index {
                for offset in (self.table.start()..at).rev() {
                    self.table.move_slot(offset, offset + 1);
                }
                self.table.shrink_front();
            } else {
                for offset in at + 1..self.table.end() {
                    self.table.move_slot(offset, offset - 1);
                }
                self.table.shrink_back();
            }
            self.recenter_if_empty();
            Some(value)
        }
    }

    /// Drops every element. Allocated blocks are kept.
    pub fn clear(&mut self) {
        self.table.drop_live();
        self.table.recenter();
    }

    /// Cursor at the first element.
    #[allow(clippy::cast_possible_wrap)]
    pub fn begin(&self) -> Cursor<'_, T, BLOCK> {
        BlockCursor::new(
            self.table.blocks_ptr(),
            self.table.window(),
            self.table.first_block() as isize,
            self.table.first_elem(),
        )
    }

    /// Cursor one past the last element.
    #[allow(clippy::cast_possible_wrap)]
    pub fn end(&self) -> Cursor<'_, T, BLOCK> {
        BlockCursor::from_offset(
            self.table.blocks_ptr(),
            self.table.window(),
            self.table.end() as isize,
        )
    }

    /// Cursor at logical `index`.
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn cursor(&self, index: usize) -> Cursor<'_, T, BLOCK> {
        assert!(index <= self.len(), "cursor index (is {index}) should be <= len (is {})", self.len());
        self.begin() + index as isize
    }

    /// Mutable cursor at the first element.
    #[allow(clippy::cast_possible_wrap)]
    pub fn begin_mut(&mut self) -> CursorMut<'_, T, BLOCK> {
        BlockCursor::new(
            self.table.blocks_ptr(),
            self.table.window(),
            self.table.first_block() as isize,
            self.table.first_elem(),
        )
    }

    /// Mutable cursor one past the last element.
    #[allow(clippy::cast_possible_wrap)]
    pub fn end_mut(&mut self) -> CursorMut<'_, T, BLOCK> {
        BlockCursor::from_offset(
            self.table.blocks_ptr(),
            self.table.window(),
            self.table.end() as isize,
        )
    }

    /// Mutable cursor at logical `index`.
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn cursor_mut(&mut self, index: usize) -> CursorMut<'_, T, BLOCK> {
        assert!(index <= self.len(), "cursor index (is {index}) should be <= len (is {})", self.len());
        self.begin_mut() + index as isize
    }

    /// Returns an iterator over `&T`, front to back.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, BLOCK> {
        Iter::new(self.begin(), self.end())
    }

    /// Returns an iterator over `&mut T`, front to back.
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub fn iter_mut(&mut self) -> IterMut<'_, T, BLOCK> {
        let blocks = self.table.blocks_ptr();
        let window = self.table.window();
        let front = BlockCursor::from_offset(blocks, window.clone(), window.start as isize);
        let back = BlockCursor::from_offset(blocks, window.clone(), window.end as isize);
        IterMut::new(front, back)
    }
}

impl<T: Default, const BLOCK: usize> BlockDeque<T, BLOCK> {
    /// Creates a deque of `len` default values.
    ///
    /// # Panics
    /// Panics if the allocation fails or `T::default` panics; see
    /// [`from_fn`](Self::from_fn).
    pub fn with_len(len: usize) -> Self {
        Self::from_fn(len, |_| T::default())
    }
}

impl<T: Clone, const BLOCK: usize> BlockDeque<T, BLOCK> {
    /// Creates a deque of `len` clones of `value`.
    ///
    /// # Panics
    /// Panics if the allocation fails or a clone panics; see
    /// [`from_fn`](Self::from_fn).
    pub fn from_elem(len: usize, value: &T) -> Self {
        Self::from_fn(len, |_| value.clone())
    }
}

impl<T, const BLOCK: usize> Drop for BlockDeque<T, BLOCK> {
    fn drop(&mut self) {
        // Keeps draining if an element's destructor panics.
        struct Dropper<'a, T, const BLOCK: usize>(&'a mut BlockTable<T, BLOCK>);

        impl<T, const BLOCK: usize> Drop for Dropper<'_, T, BLOCK> {
            fn drop(&mut self) {
                self.0.drop_live();
            }
        }

        let dropper = Dropper(&mut self.table);
        dropper.0.drop_live();
    }
}

impl<T, const BLOCK: usize> Default for BlockDeque<T, BLOCK> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const BLOCK: usize> Clone for BlockDeque<T, BLOCK> {
    /// Deep copy with the same block layout as `self`.
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        if let Err(err) = copy.table.reserve(self.table.capacity()).map(drop) {
            err.raise();
        }
        copy.table
            .reset_window(self.table.first_block(), self.table.first_elem());
        for value in self {
            // A panicking clone drops `copy` with the elements written so far.
            let value = value.clone();
            let end = copy.table.end();
            // SAFETY: same capacity and window as `self`, so `end` is vacant.
            unsafe { copy.table.write(end, value) };
            copy.table.extend_back();
        }
        copy
    }

    /// Copy-and-swap: `self` is only touched once the copy is complete.
    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.clone();
        mem::swap(self, &mut copy);
    }
}

impl<T, const BLOCK: usize> Index<usize> for BlockDeque<T, BLOCK> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("index {index} out of bounds for deque of length {}", self.len()),
        }
    }
}

impl<T, const BLOCK: usize> IndexMut<usize> for BlockDeque<T, BLOCK> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index {index} out of bounds for deque of length {len}"),
        }
    }
}

impl<T: fmt::Debug, const BLOCK: usize> fmt::Debug for BlockDeque<T, BLOCK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, const BLOCK: usize> PartialEq for BlockDeque<T, BLOCK> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, const BLOCK: usize> Eq for BlockDeque<T, BLOCK> {}

impl<T: Hash, const BLOCK: usize> Hash for BlockDeque<T, BLOCK> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        self.iter().for_each(|value| value.hash(state));
    }
}

impl<T, const BLOCK: usize> Extend<T> for BlockDeque<T, BLOCK> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| self.push_back(value));
    }
}

impl<'a, T: Copy + 'a, const BLOCK: usize> Extend<&'a T> for BlockDeque<T, BLOCK> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, const BLOCK: usize> FromIterator<T> for BlockDeque<T, BLOCK> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T, const BLOCK: usize> From<Vec<T>> for BlockDeque<T, BLOCK> {
    fn from(vec: Vec<T>) -> Self {
        vec.into_iter().collect()
    }
}

impl<T, const BLOCK: usize> From<BlockDeque<T, BLOCK>> for Vec<T> {
    fn from(deque: BlockDeque<T, BLOCK>) -> Self {
        deque.into_iter().collect()
    }
}

impl<T, const BLOCK: usize> IntoIterator for BlockDeque<T, BLOCK> {
    type Item = T;
    type IntoIter = IntoIter<T, BLOCK>;

    fn into_iter(self) -> IntoIter<T, BLOCK> {
        IntoIter::new(self)
    }
}

impl<'a, T, const BLOCK: usize> IntoIterator for &'a BlockDeque<T, BLOCK> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, BLOCK>;

    fn into_iter(self) -> Iter<'a, T, BLOCK> {
        self.iter()
    }
}

impl<'a, T, const BLOCK: usize> IntoIterator for &'a mut BlockDeque<T, BLOCK> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, BLOCK>;

    fn into_iter(self) -> IterMut<'a, T, BLOCK> {
        self.iter_mut()
    }
}
