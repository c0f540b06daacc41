//! `proptest` support: generates deques built from a random mix of front
//! and back pushes, so the live window starts at arbitrary block offsets.

use core::fmt;

use proptest::collection::{vec, SizeRange};
use proptest::prelude::*;

use super::BlockDeque;

impl<T, const BLOCK: usize> Arbitrary for BlockDeque<T, BLOCK>
where
    T: Arbitrary + fmt::Debug + 'static,
{
    type Parameters = (SizeRange, T::Parameters);
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with((size, params): Self::Parameters) -> Self::Strategy {
        vec((any_with::<T>(params), any::<bool>()), size)
            .prop_map(|pushes| {
                let mut deque = Self::new();
                for (value, at_front) in pushes {
                    if at_front {
                        deque.push_front(value);
                    } else {
                        deque.push_back(value);
                    }
                }
                deque
            })
            .boxed()
    }
}
