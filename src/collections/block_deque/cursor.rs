//! Random-access cursors over a [`BlockDeque`](super::BlockDeque).
//!
//! A cursor is a `(block, elem)` position plus a pointer to the deque's
//! indirection array. All arithmetic goes through the absolute offset
//! `block * BLOCK + elem`, so stepping across block boundaries carries into
//! (or borrows from) the block index. A cursor may sit anywhere, including
//! before `begin` or past `end`; only positions inside the live window can
//! be dereferenced.
//!
//! One generic type serves both access levels, selected by a marker:
//! [`Cursor`] reads, [`CursorMut`] also writes. A `CursorMut` converts into
//! a `Cursor`, never the other way round. Cursors borrow the deque, so any
//! operation that could move or reallocate elements ends their lifetime.

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Range, Sub, SubAssign};
use core::ptr::NonNull;

mod sealed {
    pub trait Sealed {}
}

/// Access level of a [`BlockCursor`].
pub trait Access: sealed::Sealed {}

/// Marker for read-only cursors.
#[derive(Debug)]
pub enum ReadOnly {}

/// Marker for cursors that may also write through.
#[derive(Debug)]
pub enum ReadWrite {}

impl sealed::Sealed for ReadOnly {}
impl sealed::Sealed for ReadWrite {}
impl Access for ReadOnly {}
impl Access for ReadWrite {}

/// Read-only cursor.
pub type Cursor<'a, T, const BLOCK: usize> = BlockCursor<'a, T, ReadOnly, BLOCK>;

/// Mutable cursor.
pub type CursorMut<'a, T, const BLOCK: usize> = BlockCursor<'a, T, ReadWrite, BLOCK>;

/// A random-access position inside a [`BlockDeque`](super::BlockDeque).
pub struct BlockCursor<'a, T, A: Access, const BLOCK: usize> {
    blocks: NonNull<NonNull<T>>,
    block: isize,
    elem: usize,
    // Live window as absolute offsets `live_start..live_end`.
    live_start: usize,
    live_end: usize,
    // Invariant in `T`: a `CursorMut` writes through it.
    _marker: PhantomData<(&'a T, A, fn(T) -> T)>,
}

// SAFETY: a read-only cursor behaves like `&T`, a mutable one like `&mut T`.
unsafe impl<T: Sync, const BLOCK: usize> Send for Cursor<'_, T, BLOCK> {}
unsafe impl<T: Sync, const BLOCK: usize> Sync for Cursor<'_, T, BLOCK> {}
unsafe impl<T: Send, const BLOCK: usize> Send for CursorMut<'_, T, BLOCK> {}
unsafe impl<T: Sync, const BLOCK: usize> Sync for CursorMut<'_, T, BLOCK> {}

impl<'a, T, A: Access, const BLOCK: usize> BlockCursor<'a, T, A, BLOCK> {
    #[allow(clippy::cast_possible_wrap)]
    const BLOCK_ISIZE: isize = BLOCK as isize;

    /// `window` is the live range of absolute offsets.
    pub(crate) fn new(
        blocks: NonNull<NonNull<T>>,
        window: Range<usize>,
        block: isize,
        elem: usize,
    ) -> Self {
        debug_assert!(elem < BLOCK);
        Self {
            blocks,
            block,
            elem,
            live_start: window.start,
            live_end: window.end,
            _marker: PhantomData,
        }
    }

    pub(crate) fn from_offset(blocks: NonNull<NonNull<T>>, window: Range<usize>, offset: isize) -> Self {
        let (block, elem) = Self::split(offset);
        Self::new(blocks, window, block, elem)
    }

    #[inline(always)]
    #[allow(clippy::cast_sign_loss)]
    fn split(offset: isize) -> (isize, usize) {
        (
            offset.div_euclid(Self::BLOCK_ISIZE),
            offset.rem_euclid(Self::BLOCK_ISIZE) as usize,
        )
    }

    /// The `(block, elem)` pair this cursor points at.
    #[inline]
    pub fn position(&self) -> (isize, usize) {
        (self.block, self.elem)
    }

    /// Absolute element offset from the start of the indirection array.
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub fn offset(&self) -> isize {
        self.block * Self::BLOCK_ISIZE + self.elem as isize
    }

    /// Logical index relative to the deque's first element, if the cursor
    /// lies in `begin..=end`.
    #[allow(clippy::cast_sign_loss)]
    pub fn index(&self) -> Option<usize> {
        let offset = self.offset();
        if offset < 0 {
            return None;
        }
        let offset = offset as usize;
        (self.live_start..=self.live_end)
            .contains(&offset)
            .then(|| offset - self.live_start)
    }

    /// Whether the cursor points at a live element.
    #[allow(clippy::cast_sign_loss)]
    pub fn is_dereferenceable(&self) -> bool {
        let offset = self.offset();
        offset >= 0 && (self.live_start..self.live_end).contains(&(offset as usize))
    }

    /// Steps one element forward (`++`).
    #[inline]
    pub fn move_next(&mut self) {
        self.elem = (self.elem + 1) % BLOCK;
        if self.elem == 0 {
            self.block += 1;
        }
    }

    /// Steps one element back (`--`). At offset 0 of a block this lands on
    /// the last slot of the previous block.
    #[inline]
    pub fn move_prev(&mut self) {
        if self.elem == 0 {
            self.block -= 1;
            self.elem = BLOCK;
        }
        self.elem -= 1;
    }

    /// Signed element distance `self - other`.
    #[inline]
    pub fn offset_from(&self, other: &Self) -> isize {
        self.offset() - other.offset()
    }

    fn advance(&mut self, delta: isize) {
        let (block, elem) = Self::split(self.offset() + delta);
        self.block = block;
        self.elem = elem;
    }

    /// Pointer to the slot, if it holds a live element.
    pub(crate) fn slot_ptr(&self) -> Option<NonNull<T>> {
        if !self.is_dereferenceable() {
            return None;
        }
        // SAFETY: the slot lies inside the live window, hence inside the
        // table, so `block` is a valid non-negative index.
        Some(unsafe { self.slot_ptr_unchecked() })
    }

    #[allow(clippy::cast_sign_loss)]
    unsafe fn slot_ptr_unchecked(&self) -> NonNull<T> {
        let block = *self.blocks.as_ptr().add(self.block as usize);
        NonNull::new_unchecked(block.as_ptr().add(self.elem))
    }

    /// Reads the element without checking that the cursor is
    /// dereferenceable.
    ///
    /// # Safety
    /// [`is_dereferenceable`](Self::is_dereferenceable) must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self) -> &T {
        self.slot_ptr_unchecked().as_ref()
    }
}

impl<'a, T, const BLOCK: usize> Cursor<'a, T, BLOCK> {
    /// The element under the cursor.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        // SAFETY: a live slot; the deque is shared-borrowed for `'a`.
        self.slot_ptr().map(|ptr| unsafe { ptr.as_ref() })
    }

    /// A copy of this cursor one element further.
    #[must_use]
    pub fn next_position(&self) -> Self {
        let mut next = *self;
        next.move_next();
        next
    }

    /// A copy of this cursor one element back.
    #[must_use]
    pub fn prev_position(&self) -> Self {
        let mut prev = *self;
        prev.move_prev();
        prev
    }
}

impl<'a, T, const BLOCK: usize> CursorMut<'a, T, BLOCK> {
    /// The element under the cursor.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: a live slot; `&self` keeps writers out.
        self.slot_ptr().map(|ptr| unsafe { ptr.as_ref() })
    }

    /// The element under the cursor, mutably.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        // SAFETY: a live slot; the deque is exclusively borrowed for `'a`
        // and `&mut self` keeps this the only path to it.
        self.slot_ptr().map(|mut ptr| unsafe { ptr.as_mut() })
    }

    /// Consumes the cursor, returning the element for the rest of `'a`.
    pub fn into_mut(self) -> Option<&'a mut T> {
        // SAFETY: as for `get_mut`; the cursor is gone afterwards.
        self.slot_ptr().map(|mut ptr| unsafe { ptr.as_mut() })
    }

    /// # Safety
    /// [`is_dereferenceable`](Self::is_dereferenceable) must hold.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self) -> &mut T {
        self.slot_ptr_unchecked().as_mut()
    }

    /// A read-only view of the same position.
    pub fn as_cursor(&self) -> Cursor<'_, T, BLOCK> {
        BlockCursor::new(self.blocks, self.live_start..self.live_end, self.block, self.elem)
    }
}

impl<'a, T, const BLOCK: usize> From<CursorMut<'a, T, BLOCK>> for Cursor<'a, T, BLOCK> {
    fn from(cursor: CursorMut<'a, T, BLOCK>) -> Self {
        BlockCursor::new(
            cursor.blocks,
            cursor.live_start..cursor.live_end,
            cursor.block,
            cursor.elem,
        )
    }
}

impl<T, const BLOCK: usize> Clone for Cursor<'_, T, BLOCK> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const BLOCK: usize> Copy for Cursor<'_, T, BLOCK> {}

impl<T, A: Access, const BLOCK: usize> AddAssign<isize> for BlockCursor<'_, T, A, BLOCK> {
    fn add_assign(&mut self, delta: isize) {
        self.advance(delta);
    }
}

impl<T, A: Access, const BLOCK: usize> SubAssign<isize> for BlockCursor<'_, T, A, BLOCK> {
    fn sub_assign(&mut self, delta: isize) {
        self.advance(-delta);
    }
}

impl<T, A: Access, const BLOCK: usize> Add<isize> for BlockCursor<'_, T, A, BLOCK> {
    type Output = Self;

    fn add(mut self, delta: isize) -> Self {
        self += delta;
        self
    }
}

impl<T, A: Access, const BLOCK: usize> Sub<isize> for BlockCursor<'_, T, A, BLOCK> {
    type Output = Self;

    fn sub(mut self, delta: isize) -> Self {
        self -= delta;
        self
    }
}

impl<'a, T, const BLOCK: usize> Sub for Cursor<'a, T, BLOCK> {
    type Output = isize;

    fn sub(self, other: Self) -> isize {
        self.offset_from(&other)
    }
}

impl<T, A: Access, const BLOCK: usize> PartialEq for BlockCursor<'_, T, A, BLOCK> {
    fn eq(&self, other: &Self) -> bool {
        self.offset_from(other) == 0
    }
}

impl<T, A: Access, const BLOCK: usize> Eq for BlockCursor<'_, T, A, BLOCK> {}

impl<T, A: Access, const BLOCK: usize> PartialOrd for BlockCursor<'_, T, A, BLOCK> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, A: Access, const BLOCK: usize> Ord for BlockCursor<'_, T, A, BLOCK> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset_from(other).cmp(&0)
    }
}

impl<T, A: Access, const BLOCK: usize> fmt::Debug for BlockCursor<'_, T, A, BLOCK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockCursor")
            .field("block", &self.block)
            .field("elem", &self.elem)
            .finish()
    }
}
