//! Grow/shrink policy for the bucket table.
//!
//! Loads are compared in permille with integer arithmetic. The gap between
//! the two thresholds is wide enough that a growth step never lands below the
//! shrink threshold and a shrink step never lands above the grow threshold.

/// Capacity used by constructors that do not take one.
pub const DEFAULT_CAPACITY: usize = 8;

/// The table never shrinks below this many buckets.
pub const SHRINK_FLOOR: usize = 8;

/// The table grows once `len / capacity` exceeds this many permille.
pub const GROW_ABOVE_PERMILLE: usize = 660;

/// The table shrinks once `len / capacity` falls below this many permille.
pub const SHRINK_BELOW_PERMILLE: usize = 166;

#[inline(always)]
fn above_grow_threshold(len: usize, capacity: usize) -> bool {
    len as u128 * 1000 > capacity as u128 * GROW_ABOVE_PERMILLE as u128
}

#[inline(always)]
fn below_shrink_threshold(len: usize, capacity: usize) -> bool {
    (len as u128 * 1000) < capacity as u128 * SHRINK_BELOW_PERMILLE as u128
}

/// Returns the capacity to grow to after an insertion, if any.
///
/// Each step adds half the current capacity (rounded up, at least one bucket)
/// and steps repeat until the load is back under the grow threshold.
pub(crate) fn grow_target(len: usize, capacity: usize) -> Option<usize> {
    if !above_grow_threshold(len, capacity) {
        return None;
    }

    let mut target = capacity;
    while above_grow_threshold(len, target) {
        let next = target.saturating_add(target.div_ceil(2).max(1));
        if next == target {
            break;
        }
        target = next;
    }

    Some(target)
}

/// Returns the capacity to shrink to after a deletion, if any.
pub(crate) fn shrink_target(len: usize, capacity: usize) -> Option<usize> {
    if capacity > SHRINK_FLOOR && below_shrink_threshold(len, capacity) {
        Some((capacity / 2).max(SHRINK_FLOOR))
    } else {
        None
    }
}

/// Smallest capacity that holds `len` pairs without crossing the grow
/// threshold. Never zero.
pub(crate) fn capacity_for(len: usize) -> usize {
    let needed = (len as u128 * 1000).div_ceil(GROW_ABOVE_PERMILLE as u128);
    usize::try_from(needed).unwrap_or(usize::MAX).max(1)
}
