//! Iterators over a [`BlockDeque`](super::BlockDeque).
//!
//! `Iter` and `IterMut` walk a pair of cursors towards each other, so they
//! are double-ended and exact-size; reverse iteration is `.rev()`.

use core::fmt;
use core::iter::FusedIterator;

use super::cursor::{Cursor, CursorMut};
use super::BlockDeque;

/// Shared iterator over a [`BlockDeque`].
pub struct Iter<'a, T, const BLOCK: usize> {
    front: Cursor<'a, T, BLOCK>,
    back: Cursor<'a, T, BLOCK>,
}

impl<'a, T, const BLOCK: usize> Iter<'a, T, BLOCK> {
    pub(crate) fn new(front: Cursor<'a, T, BLOCK>, back: Cursor<'a, T, BLOCK>) -> Self {
        debug_assert!(front <= back);
        Self { front, back }
    }

    /// Returns how many items remain.
    #[allow(clippy::cast_sign_loss)]
    pub fn remaining(&self) -> usize {
        (self.back - self.front) as usize
    }
}

impl<T, const BLOCK: usize> Clone for Iter<'_, T, BLOCK> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T, const BLOCK: usize> Iterator for Iter<'a, T, BLOCK> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let item = self.front.get();
        self.front.move_next();
        item
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.remaining();
        (rem, Some(rem))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn nth(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.remaining() {
            self.front = self.back;
            return None;
        }
        self.front += n as isize;
        self.next()
    }

    fn count(self) -> usize {
        self.remaining()
    }

    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }
}

impl<'a, T, const BLOCK: usize> DoubleEndedIterator for Iter<'a, T, BLOCK> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back.move_prev();
        self.back.get()
    }
}

impl<T, const BLOCK: usize> ExactSizeIterator for Iter<'_, T, BLOCK> {}
impl<T, const BLOCK: usize> FusedIterator for Iter<'_, T, BLOCK> {}

impl<T: fmt::Debug, const BLOCK: usize> fmt::Debug for Iter<'_, T, BLOCK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.clone().collect::<Vec<_>>()).finish()
    }
}

/// Mutable iterator over a [`BlockDeque`].
pub struct IterMut<'a, T, const BLOCK: usize> {
    front: CursorMut<'a, T, BLOCK>,
    back: CursorMut<'a, T, BLOCK>,
}

impl<'a, T, const BLOCK: usize> IterMut<'a, T, BLOCK> {
    pub(crate) fn new(front: CursorMut<'a, T, BLOCK>, back: CursorMut<'a, T, BLOCK>) -> Self {
        debug_assert!(front <= back);
        Self { front, back }
    }

    /// Returns how many items remain.
    #[allow(clippy::cast_sign_loss)]
    pub fn remaining(&self) -> usize {
        self.back.offset_from(&self.front) as usize
    }
}

impl<'a, T, const BLOCK: usize> Iterator for IterMut<'a, T, BLOCK> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        let slot = self.front.slot_ptr();
        self.front.move_next();
        // SAFETY: each live slot is yielded at most once, and the deque is
        // exclusively borrowed for `'a`.
        slot.map(|mut ptr| unsafe { ptr.as_mut() })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.remaining();
        (rem, Some(rem))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn nth(&mut self, n: usize) -> Option<&'a mut T> {
        let rem = self.remaining();
        if n >= rem {
            self.front += rem as isize;
            return None;
        }
        self.front += n as isize;
        self.next()
    }
}

impl<'a, T, const BLOCK: usize> DoubleEndedIterator for IterMut<'a, T, BLOCK> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        self.back.move_prev();
        // SAFETY: as for `next`.
        self.back.slot_ptr().map(|mut ptr| unsafe { ptr.as_mut() })
    }
}

impl<T, const BLOCK: usize> ExactSizeIterator for IterMut<'_, T, BLOCK> {}
impl<T, const BLOCK: usize> FusedIterator for IterMut<'_, T, BLOCK> {}

impl<T: fmt::Debug, const BLOCK: usize> fmt::Debug for IterMut<'_, T, BLOCK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Owning iterator over a [`BlockDeque`].
pub struct IntoIter<T, const BLOCK: usize> {
    inner: BlockDeque<T, BLOCK>,
}

impl<T, const BLOCK: usize> IntoIter<T, BLOCK> {
    pub(crate) fn new(inner: BlockDeque<T, BLOCK>) -> Self {
        Self { inner }
    }
}

impl<T, const BLOCK: usize> Iterator for IntoIter<T, BLOCK> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inner.len();
        (len, Some(len))
    }
}

impl<T, const BLOCK: usize> DoubleEndedIterator for IntoIter<T, BLOCK> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.inner.pop_back()
    }
}

impl<T, const BLOCK: usize> ExactSizeIterator for IntoIter<T, BLOCK> {}
impl<T, const BLOCK: usize> FusedIterator for IntoIter<T, BLOCK> {}

impl<T: fmt::Debug, const BLOCK: usize> fmt::Debug for IntoIter<T, BLOCK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.inner).finish()
    }
}
