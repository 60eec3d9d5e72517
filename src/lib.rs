#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod bucket;
mod error;
mod hash_table;
mod ledger;
mod resize;
#[cfg(feature = "serde")]
mod serde;

/// A separately chained, insertion-ordered hash map.
///
/// This module provides the `HashMap` facade over the bucket table together
/// with its borrowing and owning iterators.
pub mod hash_map;

pub use error::Error;
pub use error::Result;
pub use hash_map::HashMap;
#[cfg(feature = "stats")]
pub use hash_table::DebugStats;
pub use resize::DEFAULT_CAPACITY;
pub use resize::GROW_ABOVE_PERMILLE;
pub use resize::SHRINK_BELOW_PERMILLE;
pub use resize::SHRINK_FLOOR;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder used when none is given: `foldhash` with a fixed
        /// seed, so bucket placement is reproducible across runs.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder used when none is given: the standard library's
        /// randomly seeded SipHash.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder when neither `foldhash` nor `std` is enabled. A map
        /// must then be built with an explicit hasher builder.
        pub enum DefaultHashBuilder {}
    }
}
