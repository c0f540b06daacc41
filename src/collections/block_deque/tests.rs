use super::*;
use crate::error::{OutOfRange, TryReserveError};
use std::cell::Cell;
use std::hash::{Hash, Hasher};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Counts live instances through a shared counter.
#[derive(Debug)]
struct Tracked {
    value: u32,
    live: Rc<Cell<usize>>,
}

impl Tracked {
    fn new(value: u32, live: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Self {
            value,
            live: Rc::clone(live),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

fn contents<T: Copy, const BLOCK: usize>(deque: &BlockDeque<T, BLOCK>) -> Vec<T> {
    deque.iter().copied().collect()
}

#[test]
fn block_deque_push_pop_insert_erase_scenario() {
    let mut deque: BlockDeque<i32> = BlockDeque::new();
    deque.push_back(1);
    deque.push_back(2);
    deque.push_front(0);
    assert_eq!(contents(&deque), [0, 1, 2]);

    assert_eq!(deque.pop_front(), Some(0));
    assert_eq!(contents(&deque), [1, 2]);

    let at = (deque.begin() + 1).index().unwrap();
    deque.insert(at, 9);
    assert_eq!(contents(&deque), [1, 9, 2]);

    assert_eq!(deque.erase(0), Some(1));
    assert_eq!(contents(&deque), [9, 2]);
}

#[test]
fn block_deque_from_elem_and_checked_access() {
    let deque: BlockDeque<i32> = BlockDeque::from_elem(5, &7);
    assert_eq!(contents(&deque), [7; 5]);
    assert_eq!(deque.at(5), Err(OutOfRange { index: 5, len: 5 }));
    assert_eq!(deque.at(4), Ok(&7));
}

#[test]
fn default_construction_does_not_allocate() {
    let deque: BlockDeque<String> = BlockDeque::default();
    assert!(deque.is_empty());
    assert_eq!(deque.capacity_blocks(), 0);

    let empty: BlockDeque<u8> = BlockDeque::with_len(0);
    assert_eq!(empty.capacity_blocks(), 0);
}

#[test]
fn with_len_fills_from_block_zero() {
    let deque: BlockDeque<u64, 4> = BlockDeque::with_len(10);
    assert_eq!(deque.len(), 10);
    assert!(deque.iter().all(|&v| v == 0));
    assert_eq!(deque.begin().position(), (0, 0));
    assert_eq!(deque.end().position(), (2, 2));
}

#[test]
fn growth_shifts_window_by_old_capacity() {
    let mut deque: BlockDeque<u32, 4> = BlockDeque::new();
    for i in 0..4 {
        deque.push_back(i);
    }
    assert_eq!(deque.capacity_blocks(), 1);
    let (block, elem) = deque.begin().position();

    deque.push_back(4);
    assert_eq!(deque.capacity_blocks(), 3);
    assert_eq!(deque.begin().position(), (block + 1, elem));
    assert_eq!(contents(&deque), [0, 1, 2, 3, 4]);

    for i in 5..8 {
        deque.push_back(i);
    }
    let (block, elem) = deque.begin().position();
    deque.push_back(8);
    assert_eq!(deque.capacity_blocks(), 9);
    assert_eq!(deque.begin().position(), (block + 3, elem));
    assert_eq!(contents(&deque), (0..9).collect::<Vec<_>>());
}

#[test]
fn push_front_on_empty_deque_bootstraps_with_left_slack() {
    let mut deque: BlockDeque<u32, 4> = BlockDeque::new();
    deque.push_front(1);
    assert_eq!(deque.capacity_blocks(), 3);
    assert_eq!(deque.begin().position(), (1, 3));

    // The whole of block 0 and the rest of block 1 are free on the left.
    for i in 2..=8 {
        deque.push_front(i);
    }
    assert_eq!(deque.capacity_blocks(), 3);
    assert_eq!(deque.begin().position(), (0, 0));

    deque.push_front(9);
    assert_eq!(deque.capacity_blocks(), 9);
    assert_eq!(contents(&deque), [9, 8, 7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn push_back_with_panic_rolls_back_growth() {
    let mut deque: BlockDeque<u32, 4> = (0..4).collect();
    assert_eq!(deque.capacity_blocks(), 1);
    let before = deque.begin().position();

    let result = catch_unwind(AssertUnwindSafe(|| {
        deque.push_back_with(|| panic!("construction failed"));
    }));
    assert!(result.is_err());
    assert_eq!(deque.capacity_blocks(), 1);
    assert_eq!(deque.begin().position(), before);
    assert_eq!(contents(&deque), [0, 1, 2, 3]);

    deque.push_back_with(|| 4);
    assert_eq!(contents(&deque), [0, 1, 2, 3, 4]);
}

#[test]
fn push_front_with_panic_rolls_back_growth() {
    let mut deque: BlockDeque<u32, 4> = BlockDeque::new();
    let result = catch_unwind(AssertUnwindSafe(|| {
        deque.push_front_with(|| panic!("construction failed"));
    }));
    assert!(result.is_err());
    assert_eq!(deque.capacity_blocks(), 0);
    assert!(deque.is_empty());

    deque.push_front(1);
    while deque.begin().position() != (0, 0) {
        let next = *deque.front().unwrap() + 1;
        deque.push_front(next);
    }
    let snapshot = contents(&deque);
    let result = catch_unwind(AssertUnwindSafe(|| {
        deque.push_front_with(|| panic!("construction failed"));
    }));
    assert!(result.is_err());
    assert_eq!(deque.capacity_blocks(), 3);
    assert_eq!(deque.begin().position(), (0, 0));
    assert_eq!(contents(&deque), snapshot);
}

#[test]
fn push_with_panic_without_growth_keeps_state() {
    let mut deque: BlockDeque<u32, 4> = BlockDeque::new();
    deque.push_back(1);
    let result = catch_unwind(AssertUnwindSafe(|| {
        deque.push_back_with(|| panic!("construction failed"));
    }));
    assert!(result.is_err());
    assert_eq!(contents(&deque), [1]);
}

#[test]
fn insert_into_full_table_rebases_target_slot() {
    let mut deque: BlockDeque<u32, 4> = BlockDeque::from_fn(12, |i| i as u32);
    assert_eq!(deque.capacity_blocks(), 3);
    assert_eq!(deque.end().position(), (3, 0));

    // Back half, table full: grows, then shifts the tail right.
    deque.insert(9, 100);
    assert_eq!(deque.capacity_blocks(), 9);
    assert_eq!(contents(&deque), [0, 1, 2, 3, 4, 5, 6, 7, 8, 100, 9, 10, 11]);
}

#[test]
fn insert_near_front_grows_toward_front_when_exhausted() {
    let mut deque: BlockDeque<u32, 4> = BlockDeque::with_len(8);
    for (i, value) in deque.iter_mut().enumerate() {
        *value = i as u32;
    }
    assert_eq!(deque.begin().position(), (0, 0));

    assert_eq!(deque.capacity_blocks(), 3);
    deque.insert(1, 100);
    assert_eq!(deque.capacity_blocks(), 9);
    assert_eq!(contents(&deque), [0, 100, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(deque[1], 100);
}

#[test]
fn insert_at_both_ends_and_middle() {
    let mut deque: BlockDeque<u32, 3> = BlockDeque::new();
    deque.insert(0, 5);
    deque.insert(1, 7);
    deque.insert(0, 1);
    deque.insert(2, 6);
    deque.insert(1, 3);
    assert_eq!(contents(&deque), [1, 3, 5, 6, 7]);
}

#[test]
#[should_panic(expected = "insertion index")]
fn insert_past_end_panics() {
    let mut deque: BlockDeque<u32, 4> = (0..3).collect();
    deque.insert(4, 0);
}

#[test]
fn erase_shifts_the_shorter_side() {
    let mut deque: BlockDeque<u32, 4> = (0..10).collect();
    let start = deque.begin().offset();
    let end = deque.end().offset();

    assert_eq!(deque.erase(2), Some(2));
    assert_eq!(deque.begin().offset(), start + 1);
    assert_eq!(deque.end().offset(), end);

    assert_eq!(deque.erase(6), Some(7));
    assert_eq!(deque.end().offset(), end - 1);

    assert_eq!(contents(&deque), [0, 1, 3, 4, 5, 6, 8, 9]);
    assert_eq!(deque.erase(8), None);
}

#[test]
fn pop_on_empty_returns_none() {
    let mut deque: BlockDeque<u32> = BlockDeque::new();
    assert_eq!(deque.pop_back(), None);
    assert_eq!(deque.pop_front(), None);
    deque.push_back(3);
    assert_eq!(deque.pop_back(), Some(3));
    assert_eq!(deque.pop_front(), None);
}

#[test]
fn pop_front_walks_across_block_boundaries() {
    let mut deque: BlockDeque<u32, 2> = (0..5).collect();
    let mut expected = 0;
    while let Some(value) = deque.pop_front() {
        assert_eq!(value, expected);
        expected += 1;
        if let Some(&front) = deque.front() {
            assert_eq!(deque.begin().get(), Some(&front));
        }
    }
    assert_eq!(expected, 5);
}

#[test]
fn indexed_and_cursor_access_agree() {
    let mut deque: BlockDeque<u32, 4> = BlockDeque::new();
    for i in 0..7 {
        deque.push_back(i);
        deque.push_front(100 + i);
    }
    let begin = deque.begin();
    for i in 0..deque.len() {
        assert_eq!(Some(&deque[i]), (begin + i as isize).get());
        assert_eq!(deque.get(i), deque.cursor(i).get());
    }
}

#[test]
fn cursor_mut_writes_through() {
    let mut deque: BlockDeque<u32, 4> = (0..6).collect();
    let mut cursor = deque.cursor_mut(4);
    *cursor.get_mut().unwrap() = 40;
    cursor.move_prev();
    *cursor.get_mut().unwrap() = 30;
    let mut end = deque.end_mut();
    assert_eq!(end.get_mut(), None);
    assert_eq!(contents(&deque), [0, 1, 2, 30, 40, 5]);

    let mut begin = deque.begin_mut();
    *begin.get_mut().unwrap() = 9;
    assert_eq!(deque.front(), Some(&9));
}

#[test]
fn front_back_accessors() {
    let mut deque: BlockDeque<u32, 4> = BlockDeque::new();
    assert_eq!(deque.front(), None);
    assert_eq!(deque.back_mut(), None);
    deque.extend([1, 2, 3]);
    *deque.front_mut().unwrap() = 10;
    *deque.back_mut().unwrap() = 30;
    assert_eq!((deque.front(), deque.back()), (Some(&10), Some(&30)));
    *deque.at_mut(1).unwrap() = 20;
    assert_eq!(deque.at_mut(3).err(), Some(OutOfRange { index: 3, len: 3 }));
    assert_eq!(contents(&deque), [10, 20, 30]);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn index_out_of_bounds_panics() {
    let deque: BlockDeque<u32, 4> = (0..3).collect();
    let _ = deque[3];
}

#[test]
fn clone_keeps_block_layout_and_is_independent() {
    let mut original: BlockDeque<String, 4> = BlockDeque::new();
    for i in 0..6 {
        original.push_front(i.to_string());
    }
    let mut copy = original.clone();
    assert_eq!(copy, original);
    assert_eq!(copy.capacity_blocks(), original.capacity_blocks());
    assert_eq!(copy.begin().position(), original.begin().position());

    copy[0].push('!');
    assert_eq!(original[0], "5");
    assert_eq!(copy[0], "5!");
}

#[test]
fn clone_from_replaces_contents() {
    let source: BlockDeque<String, 4> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let mut target: BlockDeque<String, 4> = (0..20).map(|i| i.to_string()).collect();
    target.clone_from(&source);
    assert_eq!(target, source);
}

#[test]
fn drop_releases_every_live_element() {
    let live = Rc::new(Cell::new(0));
    {
        let mut deque: BlockDeque<Tracked, 4> = BlockDeque::new();
        for i in 0..9 {
            deque.push_back(Tracked::new(i, &live));
            deque.push_front(Tracked::new(i, &live));
        }
        assert_eq!(live.get(), 18);
        drop(deque.pop_back());
        drop(deque.erase(5));
        assert_eq!(live.get(), 16);
    }
    assert_eq!(live.get(), 0);
}

#[test]
fn clear_drops_elements_and_keeps_blocks() {
    let live = Rc::new(Cell::new(0));
    let mut deque: BlockDeque<Tracked, 4> = BlockDeque::from_fn(9, |i| Tracked::new(i as u32, &live));
    let blocks = deque.capacity_blocks();
    deque.clear();
    assert_eq!(live.get(), 0);
    assert!(deque.is_empty());
    assert_eq!(deque.capacity_blocks(), blocks);
    deque.push_back(Tracked::new(1, &live));
    assert_eq!(deque.front().map(|t| t.value), Some(1));
}

#[test]
fn from_fn_panic_drops_partial_contents() {
    let live = Rc::new(Cell::new(0));
    let result = catch_unwind(AssertUnwindSafe(|| {
        BlockDeque::<Tracked, 4>::from_fn(10, |i| {
            if i == 6 {
                panic!("construction failed");
            }
            Tracked::new(i as u32, &live)
        })
    }));
    assert!(result.is_err());
    assert_eq!(live.get(), 0);
}

#[test]
fn reserve_blocks_keeps_contents() {
    let mut deque: BlockDeque<u32, 4> = (0..5).collect();
    deque.reserve_blocks(20);
    assert_eq!(deque.capacity_blocks(), 20);
    assert_eq!(deque.capacity(), 80);
    assert_eq!(contents(&deque), [0, 1, 2, 3, 4]);
    assert_eq!(
        deque.try_reserve_blocks(usize::MAX),
        Err(TryReserveError::CapacityOverflow)
    );
    assert_eq!(contents(&deque), [0, 1, 2, 3, 4]);
}

#[test]
fn zero_sized_elements() {
    let mut deque: BlockDeque<(), 8> = BlockDeque::new();
    for _ in 0..100 {
        deque.push_back(());
        deque.push_front(());
    }
    deque.insert(50, ());
    assert_eq!(deque.len(), 201);
    assert_eq!(deque.erase(10), Some(()));
    assert_eq!(deque.iter().count(), 200);
}

#[test]
fn debug_and_hash_follow_contents() {
    use std::collections::hash_map::DefaultHasher;

    let a: BlockDeque<u32, 4> = (0..3).collect();
    let mut b: BlockDeque<u32, 4> = BlockDeque::new();
    b.push_front(2);
    b.push_front(1);
    b.push_front(0);
    assert_eq!(format!("{a:?}"), "[0, 1, 2]");

    let hash = |deque: &BlockDeque<u32, 4>| {
        let mut hasher = DefaultHasher::new();
        deque.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&a), hash(&b));
}

#[test]
fn vec_conversions() {
    let deque: BlockDeque<u32, 4> = BlockDeque::from(vec![1, 2, 3]);
    let back: Vec<u32> = deque.into();
    assert_eq!(back, [1, 2, 3]);
}

#[test]
fn draining_queue_reuses_its_blocks() {
    let mut deque: BlockDeque<u64, 4> = BlockDeque::new();
    for round in 0..10_000 {
        deque.push_back(round);
        assert_eq!(deque.pop_front(), Some(round));
    }
    assert!(deque.is_empty());
    assert_eq!(deque.capacity_blocks(), 1);

    for round in 0..1_000 {
        deque.push_front(round);
        deque.push_front(round + 1);
        assert_eq!(deque.pop_back(), Some(round));
        assert_eq!(deque.pop_back(), Some(round + 1));
    }
    assert!(deque.capacity_blocks() <= 3);
}

#[test]
fn emptied_deque_restarts_in_the_middle() {
    let mut deque: BlockDeque<u32, 4> = (0..12).collect();
    assert_eq!(deque.capacity_blocks(), 9);
    while deque.pop_back().is_some() {}
    assert_eq!(deque.begin().position(), (4, 2));

    deque.push_back(7);
    assert_eq!(deque.erase(0), Some(7));
    assert_eq!(deque.begin().position(), (4, 2));

    deque.extend([1, 2, 3]);
    deque.clear();
    assert_eq!(deque.begin().position(), (4, 2));
    assert_eq!(deque.end().position(), (4, 2));

    deque.push_front(1);
    deque.push_back(2);
    assert_eq!(contents(&deque), [1, 2]);
    assert_eq!(deque.capacity_blocks(), 9);
}

#[test]
fn at_reports_index_and_length() {
    let mut deque: BlockDeque<u32, 3> = (0..7).collect();
    assert_eq!(deque.at(6), Ok(&6));
    assert_eq!(deque.at(7), Err(OutOfRange { index: 7, len: 7 }));
    assert_eq!(deque.at_mut(9), Err(OutOfRange { index: 9, len: 7 }));
    *deque.at_mut(0).unwrap() = 10;
    assert_eq!(deque.at(0), Ok(&10));
}
