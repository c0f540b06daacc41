//! Error types for fallible deque operations.
//!
//! Element-construction failures are not represented here: a panicking
//! `Clone`, `Default` or user closure unwinds through the container, which
//! rolls back its partial work before the panic continues.

use core::alloc::Layout;
use core::fmt;

/// Returned by [`BlockDeque::at`](crate::BlockDeque::at) when the index is
/// not below the current length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    /// The requested logical index.
    pub index: usize,
    /// The length of the deque at the time of the call.
    pub len: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index {} out of range for deque of length {}", self.index, self.len)
    }
}

impl std::error::Error for OutOfRange {}

/// The error type for operations that may need to grow the block table.
///
/// When one of these is returned the deque is exactly as it was before the
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryReserveError {
    /// The requested block count, or the element offsets it implies, does
    /// not fit in `isize`.
    CapacityOverflow,
    /// The allocator refused a block or indirection-array request.
    AllocError {
        /// Layout of the failed request.
        layout: Layout,
    },
}

impl TryReserveError {
    /// Diverges the way std collections do on allocation failure.
    #[cold]
    pub(crate) fn raise(self) -> ! {
        match self {
            Self::CapacityOverflow => panic!("capacity overflow"),
            Self::AllocError { layout } => std::alloc::handle_alloc_error(layout),
        }
    }
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow => f.write_str("memory allocation failed because the computed capacity exceeded the collection's maximum"),
            Self::AllocError { layout } => write!(
                f,
                "memory allocation of {} bytes (align {}) failed",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl std::error::Error for TryReserveError {}
