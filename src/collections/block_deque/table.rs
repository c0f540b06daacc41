//! The block table behind [`BlockDeque`](super::BlockDeque).
//!
//! An indirection array of fixed-capacity blocks plus the live window
//! (`first_block`, `first_elem`, `len`) inside it. The table owns every
//! block it references; it never constructs or drops elements except in
//! [`BlockTable::drop_live`], which the façade calls on teardown.
//!
//! ## Growth policy
//!
//! `reserve(n)` triples the table (or jumps straight to `n` if that is
//! larger). The existing `C` blocks are relocated, unchanged, into the
//! middle third `[C, 2C)` and fresh blocks fill both outer thirds, so both
//! ends get slack. The live window therefore moves by exactly `C` blocks.
//! Growing an empty table counts as a bootstrap to one block followed by a
//! regular step.

use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem;
use core::ops::Range;
use core::ptr::{self, NonNull};
use std::alloc;

use crate::error::TryReserveError;

/// A `(block, elem)` pair naming one slot of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) block: usize,
    pub(crate) elem: usize,
}

impl Slot {
    #[inline(always)]
    pub(crate) const fn from_offset<const BLOCK: usize>(offset: usize) -> Self {
        Self {
            block: offset / BLOCK,
            elem: offset % BLOCK,
        }
    }

    #[inline(always)]
    pub(crate) const fn offset<const BLOCK: usize>(self) -> usize {
        self.block * BLOCK + self.elem
    }
}

/// The indirection array replaced by a growth step.
///
/// Holding on to it lets the caller put the table back exactly as it was if
/// the rest of its operation fails; dropping it commits the growth.
#[must_use = "dropping a `Retired` commits the growth"]
pub(crate) struct Retired<T> {
    blocks: Vec<NonNull<T>>,
    first_block: usize,
    /// Index of the old block 0 inside the new array.
    shift: usize,
}

pub(crate) struct BlockTable<T, const BLOCK: usize> {
    blocks: Vec<NonNull<T>>,
    first_block: usize,
    first_elem: usize,
    len: usize,
    _owns: PhantomData<T>,
}

impl<T, const BLOCK: usize> BlockTable<T, BLOCK> {
    const NONZERO_BLOCK: () = assert!(BLOCK != 0, "BlockDeque BLOCK must be > 0");

    pub(crate) const fn new() -> Self {
        let () = Self::NONZERO_BLOCK;
        Self {
            blocks: Vec::new(),
            first_block: 0,
            first_elem: 0,
            len: 0,
            _owns: PhantomData,
        }
    }

    /// Number of blocks, not elements.
    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.blocks.len()
    }

    #[inline(always)]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub(crate) const fn first_block(&self) -> usize {
        self.first_block
    }

    #[inline(always)]
    pub(crate) const fn first_elem(&self) -> usize {
        self.first_elem
    }

    /// Absolute offset of the first live slot.
    #[inline(always)]
    pub(crate) const fn start(&self) -> usize {
        self.first_block * BLOCK + self.first_elem
    }

    /// Absolute offset one past the last live slot.
    #[inline(always)]
    pub(crate) const fn end(&self) -> usize {
        self.start() + self.len
    }

    #[inline(always)]
    pub(crate) const fn window(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// The live window's end touches the end of the table.
    #[inline(always)]
    pub(crate) fn is_full(&self) -> bool {
        self.capacity() * BLOCK == self.end()
    }

    /// The live window starts at block 0, offset 0.
    #[inline(always)]
    pub(crate) const fn front_exhausted(&self) -> bool {
        self.first_block == 0 && self.first_elem == 0
    }

    #[inline]
    pub(crate) const fn slot_of(&self, index: usize) -> Slot {
        Slot::from_offset::<BLOCK>(self.start() + index)
    }

    /// Pointer to the first entry of the indirection array, for cursors.
    #[inline]
    pub(crate) fn blocks_ptr(&self) -> NonNull<NonNull<T>> {
        NonNull::from(self.blocks.as_slice()).cast()
    }

    /// Pointer to slot `offset`.
    ///
    /// # Safety
    /// `offset < self.capacity() * BLOCK`.
    #[inline(always)]
    pub(crate) unsafe fn slot_ptr(&self, offset: usize) -> *mut T {
        self.blocks
            .get_unchecked(offset / BLOCK)
            .as_ptr()
            .add(offset % BLOCK)
    }

    /// # Safety
    /// Slot `offset` is inside the table and currently vacant.
    #[inline]
    pub(crate) unsafe fn write(&mut self, offset: usize, value: T) {
        self.slot_ptr(offset).write(value);
    }

    /// Moves the value out of slot `offset`, leaving it vacant.
    ///
    /// # Safety
    /// Slot `offset` is inside the table and live.
    #[inline]
    pub(crate) unsafe fn read(&mut self, offset: usize) -> T {
        self.slot_ptr(offset).read()
    }

    /// Moves one value from slot `src` into slot `dst`.
    ///
    /// # Safety
    /// Both slots are inside the table, `src` is live and `dst` is vacant
    /// (or about to be treated as such).
    #[inline]
    pub(crate) unsafe fn move_slot(&mut self, src: usize, dst: usize) {
        ptr::copy_nonoverlapping(self.slot_ptr(src), self.slot_ptr(dst), 1);
    }

    /// # Safety
    /// `index < self.len()`.
    #[inline]
    pub(crate) unsafe fn get_unchecked(&self, index: usize) -> &T {
        &*self.slot_ptr(self.start() + index)
    }

    /// # Safety
    /// `index < self.len()`.
    #[inline]
    pub(crate) unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        &mut *self.slot_ptr(self.start() + index)
    }

    /// Places an empty window at `(first_block, first_elem)`.
    pub(crate) fn reset_window(&mut self, first_block: usize, first_elem: usize) {
        debug_assert_eq!(self.len, 0, "reset_window on a live window");
        debug_assert!(first_elem < BLOCK);
        debug_assert!(first_block * BLOCK + first_elem <= self.capacity() * BLOCK);
        self.first_block = first_block;
        self.first_elem = first_elem;
    }

    /// Moves an empty window to the middle slot of the table, giving both
    /// ends room again.
    pub(crate) fn recenter(&mut self) {
        let middle = self.capacity() * BLOCK / 2;
        self.reset_window(middle / BLOCK, middle % BLOCK);
    }

    /// Accounts for a value just written at `end()`.
    #[inline]
    pub(crate) fn extend_back(&mut self) {
        self.len += 1;
        self.debug_assert_invariants();
    }

    /// Accounts for a value just written at `start() - 1`.
    #[inline]
    pub(crate) fn extend_front(&mut self) {
        if self.first_elem == 0 {
            self.first_block -= 1;
            self.first_elem = BLOCK;
        }
        self.first_elem -= 1;
        self.len += 1;
        self.debug_assert_invariants();
    }

    /// Forgets the last live slot; its value must already have been moved out.
    #[inline]
    pub(crate) fn shrink_back(&mut self) {
        self.len -= 1;
    }

    /// Forgets the first live slot; its value must already have been moved out.
    #[inline]
    pub(crate) fn shrink_front(&mut self) {
        self.first_elem += 1;
        if self.first_elem == BLOCK {
            self.first_elem = 0;
            self.first_block += 1;
        }
        self.len -= 1;
    }

    /// Drops every live element, front to back. Blocks stay allocated.
    pub(crate) fn drop_live(&mut self) {
        if !mem::needs_drop::<T>() {
            self.len = 0;
            return;
        }
        while self.len > 0 {
            let start = self.start();
            // SAFETY: `start` is live while `len > 0`. The window shrinks
            // before the value drops, so a panicking destructor leaves the
            // table consistent.
            let value = unsafe { self.read(start) };
            self.shrink_front();
            drop(value);
        }
    }

    /// Ensures the table holds at least `n` blocks.
    ///
    /// Returns the previous indirection array when a reallocation happened.
    /// On error nothing changed: every block allocated by this call has been
    /// freed again.
    pub(crate) fn reserve(&mut self, n: usize) -> Result<Option<Retired<T>>, TryReserveError> {
        let capacity = self.capacity();
        if capacity >= n {
            return Ok(None);
        }

        // An empty table bootstraps to one block first; that block then
        // takes the middle slot of the tripled table.
        let base = if capacity == 0 { usize::from(n > 1) } else { capacity };
        let new_capacity = base
            .checked_mul(3)
            .ok_or(TryReserveError::CapacityOverflow)?
            .max(n);
        let span = new_capacity
            .checked_mul(BLOCK)
            .ok_or(TryReserveError::CapacityOverflow)?;
        if span > isize::MAX as usize {
            return Err(TryReserveError::CapacityOverflow);
        }

        let mut blocks: Vec<NonNull<T>> = Vec::new();
        if blocks.try_reserve_exact(new_capacity).is_err() {
            return Err(match Layout::array::<NonNull<T>>(new_capacity) {
                Ok(layout) => TryReserveError::AllocError { layout },
                Err(_) => TryReserveError::CapacityOverflow,
            });
        }

        let relocated = base..base + capacity;
        for i in 0..new_capacity {
            if relocated.contains(&i) {
                blocks.push(self.blocks[i - base]);
                continue;
            }
            match Self::allocate_block() {
                Ok(block) => blocks.push(block),
                Err(err) => {
                    Self::release_fresh(blocks, relocated.clone());
                    return Err(err);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            old_capacity = capacity,
            new_capacity,
            shift = base,
            "block table grown"
        );

        let retired = Retired {
            blocks: mem::replace(&mut self.blocks, blocks),
            first_block: self.first_block,
            shift: base,
        };
        self.first_block += base;
        self.debug_assert_invariants();
        Ok(Some(retired))
    }

    /// Grows so that a slot is free after the window. Only call when full.
    pub(crate) fn grow_back(&mut self) -> Result<Option<Retired<T>>, TryReserveError> {
        let target = match self.capacity() {
            0 => 1,
            capacity => capacity
                .checked_mul(3)
                .ok_or(TryReserveError::CapacityOverflow)?,
        };
        self.reserve(target)
    }

    /// Grows so that a slot is free before the window. Only call when the
    /// window starts at block 0, offset 0.
    pub(crate) fn grow_front(&mut self) -> Result<Option<Retired<T>>, TryReserveError> {
        match self.capacity() {
            0 => {
                let retired = self.reserve(2)?;
                self.first_block += 1;
                Ok(retired)
            }
            capacity => self.reserve(
                capacity
                    .checked_mul(3)
                    .ok_or(TryReserveError::CapacityOverflow)?,
            ),
        }
    }

    /// Undoes the growth step that produced `retired`.
    ///
    /// The live window must hold the same slots it held right after that
    /// step: nothing may have been written into the fresh blocks.
    pub(crate) fn restore(&mut self, retired: Retired<T>) {
        let relocated = retired.shift..retired.shift + retired.blocks.len();
        let grown = mem::replace(&mut self.blocks, retired.blocks);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            grown_capacity = grown.len(),
            restored_capacity = self.blocks.len(),
            "block table growth rolled back"
        );

        Self::release_fresh(grown, relocated);
        self.first_block = retired.first_block;
        self.debug_assert_invariants();
    }

    /// Re-bases a slot computed before the growth step that produced
    /// `retired`, so that it names the same logical element afterwards.
    ///
    /// This is a private contract with `BlockDeque::try_insert`, which takes
    /// its target position before it knows whether it has to grow.
    #[inline]
    pub(crate) fn rebase(&self, slot: &mut Slot, retired: &Retired<T>) {
        slot.block += self.first_block - retired.first_block;
    }

    #[inline(always)]
    fn block_layout() -> Layout {
        Layout::new::<[T; BLOCK]>()
    }

    fn allocate_block() -> Result<NonNull<T>, TryReserveError> {
        let layout = Self::block_layout();
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        // SAFETY: `layout` has non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        NonNull::new(raw.cast::<T>()).ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(size = layout.size(), "block allocation failed");
            TryReserveError::AllocError { layout }
        })
    }

    /// # Safety
    /// `block` came from `allocate_block` and is not referenced elsewhere.
    unsafe fn deallocate_block(block: NonNull<T>) {
        let layout = Self::block_layout();
        if layout.size() != 0 {
            alloc::dealloc(block.as_ptr().cast(), layout);
        }
    }

    /// Frees the blocks of `blocks` outside `relocated`; those inside still
    /// belong to the other indirection array.
    fn release_fresh(blocks: Vec<NonNull<T>>, relocated: Range<usize>) {
        for (i, block) in blocks.into_iter().enumerate() {
            if !relocated.contains(&i) {
                // SAFETY: blocks outside the relocated range were allocated
                // by the growth step that built this array and nothing else
                // points at them.
                unsafe { Self::deallocate_block(block) };
            }
        }
    }

    #[inline(always)]
    fn debug_assert_invariants(&self) {
        debug_assert!(self.first_elem < BLOCK, "first_elem escaped its block");
        debug_assert!(
            self.end() <= self.capacity() * BLOCK,
            "live window runs past the table"
        );
    }
}

impl<T, const BLOCK: usize> Drop for BlockTable<T, BLOCK> {
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            // SAFETY: the table owns every block it references.
            unsafe { Self::deallocate_block(block) };
        }
    }
}

/// Undoes a growth step unless committed.
///
/// Used around the user code that produces a value for a slot which the
/// growth made available: if that code panics the table is put back.
pub(crate) struct GrowthGuard<'a, T, const BLOCK: usize> {
    table: &'a mut BlockTable<T, BLOCK>,
    retired: Option<Retired<T>>,
}

impl<'a, T, const BLOCK: usize> GrowthGuard<'a, T, BLOCK> {
    pub(crate) fn new(table: &'a mut BlockTable<T, BLOCK>, retired: Option<Retired<T>>) -> Self {
        Self { table, retired }
    }

    /// Keeps the growth and hands the table back.
    pub(crate) fn commit(&mut self) -> &mut BlockTable<T, BLOCK> {
        self.retired = None;
        self.table
    }
}

impl<T, const BLOCK: usize> Drop for GrowthGuard<'_, T, BLOCK> {
    fn drop(&mut self) {
        if let Some(retired) = self.retired.take() {
            self.table.restore(retired);
        }
    }
}
