use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::borrow::Borrow;

use crate::bucket::Bucket;
use crate::bucket::Pair;

#[inline(always)]
fn index_for(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

/// Bucket table statistics.
///
/// Returned by [`HashMap::debug_stats`](crate::HashMap::debug_stats).
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq)]
pub struct DebugStats {
    /// Number of live pairs.
    pub populated: usize,
    /// Number of buckets.
    pub capacity: usize,
    /// Buckets holding no pairs.
    pub empty_buckets: usize,
    /// Length of the longest chain.
    pub longest_chain: usize,
    /// `populated / capacity`.
    pub load_factor: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Prints the statistics to stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Bucket Table Statistics ===");
        println!("Populated:      {}", self.populated);
        println!("Capacity:       {}", self.capacity);
        println!("Load factor:    {:.2}%", self.load_factor * 100.0);
        println!(
            "Empty buckets:  {} ({:.2}%)",
            self.empty_buckets,
            if self.capacity == 0 {
                0.0
            } else {
                self.empty_buckets as f64 / self.capacity as f64 * 100.0
            }
        );
        println!("Longest chain:  {}", self.longest_chain);
    }
}

/// A fixed-length array of buckets.
///
/// A pair with hash `h` always lives in bucket `h % capacity`. The capacity
/// only changes through [`HashTable::try_rehash`].
pub(crate) struct HashTable<K, V> {
    buckets: Vec<Bucket<K, V>>,
    populated: usize,
}

impl<K, V> HashTable<K, V> {
    /// Creates a table of `capacity` empty buckets. `capacity` must be
    /// positive.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, Bucket::default);
        Self {
            buckets,
            populated: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.populated
    }

    pub(crate) fn locate(&self, hash: u64) -> usize {
        index_for(hash, self.buckets.len())
    }

    pub(crate) fn bucket_at(&self, index: usize) -> &Bucket<K, V> {
        &self.buckets[index]
    }

    pub(crate) fn bucket_at_mut(&mut self, index: usize) -> &mut Bucket<K, V> {
        &mut self.buckets[index]
    }

    pub(crate) fn find<Q>(&self, hash: u64, key: &Q) -> Option<&Pair<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.bucket_at(self.locate(hash)).find(hash, key)
    }

    pub(crate) fn find_mut<Q>(&mut self, hash: u64, key: &Q) -> Option<&mut Pair<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let index = self.locate(hash);
        self.bucket_at_mut(index).find_mut(hash, key)
    }

    /// Inserts or replaces. Returns the replaced value, `None` for a new pair.
    pub(crate) fn upsert(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        seq: impl FnOnce() -> u64,
    ) -> Option<V>
    where
        K: Eq,
    {
        let index = self.locate(hash);
        let replaced = self.bucket_at_mut(index).upsert(hash, key, value, seq);
        if replaced.is_none() {
            self.populated += 1;
        }
        replaced
    }

    /// Appends a pair whose key is known to be absent. Returns the bucket
    /// index and the position within that bucket.
    pub(crate) fn push_new(&mut self, hash: u64, seq: u64, key: K, value: V) -> (usize, usize) {
        let index = self.locate(hash);
        let position = self.bucket_at_mut(index).push(Pair {
            hash,
            seq,
            key,
            value,
        });
        self.populated += 1;
        (index, position)
    }

    pub(crate) fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<Pair<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let index = self.locate(hash);
        let removed = self.bucket_at_mut(index).remove(hash, key);
        if removed.is_some() {
            self.populated -= 1;
        }
        removed
    }

    pub(crate) fn find_seq(&self, hash: u64, seq: u64) -> Option<&Pair<K, V>> {
        self.bucket_at(self.locate(hash)).find_seq(seq)
    }

    pub(crate) fn find_seq_mut(&mut self, hash: u64, seq: u64) -> Option<&mut Pair<K, V>> {
        let index = self.locate(hash);
        self.bucket_at_mut(index).find_seq_mut(seq)
    }

    pub(crate) fn take_seq(&mut self, hash: u64, seq: u64) -> Option<Pair<K, V>> {
        let index = self.locate(hash);
        let taken = self.bucket_at_mut(index).take_seq(seq);
        if taken.is_some() {
            self.populated -= 1;
        }
        taken
    }

    /// Moves every pair into a new table of `capacity` buckets.
    ///
    /// `order` yields `(seq, hash)` for every live pair; pairs are re-inserted
    /// in that order. All memory for the new table is reserved before the
    /// first pair moves, so on error the table is left exactly as it was.
    pub(crate) fn try_rehash<I>(&mut self, capacity: usize, order: I) -> Result<(), TryReserveError>
    where
        I: Iterator<Item = (u64, u64)> + Clone,
    {
        debug_assert!(capacity > 0);

        let mut counts: Vec<usize> = Vec::new();
        counts.try_reserve_exact(capacity)?;
        counts.resize(capacity, 0);
        for (_, hash) in order.clone() {
            counts[index_for(hash, capacity)] += 1;
        }

        let mut buckets: Vec<Bucket<K, V>> = Vec::new();
        buckets.try_reserve_exact(capacity)?;
        for count in counts {
            let mut bucket = Bucket::default();
            bucket.try_reserve_exact(count)?;
            buckets.push(bucket);
        }

        let mut old = core::mem::replace(&mut self.buckets, buckets);
        let old_capacity = old.len();
        for (seq, hash) in order {
            let pair = old[index_for(hash, old_capacity)].take_seq(seq);
            debug_assert!(pair.is_some(), "sequence {seq} missing from its bucket");
            if let Some(pair) = pair {
                self.buckets[index_for(hash, capacity)].push(pair);
            }
        }
        debug_assert!(old.iter().all(Bucket::is_empty));

        Ok(())
    }

    /// Empties every bucket. The capacity is unchanged.
    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.populated = 0;
    }

    /// Counts buckets by chain length: entry `i` is the number of buckets
    /// holding exactly `i` pairs.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn chain_histogram(&self) -> Vec<usize> {
        let longest = self.buckets.iter().map(Bucket::len).max().unwrap_or(0);
        let mut hist = alloc::vec![0usize; longest + 1];
        for bucket in &self.buckets {
            hist[bucket.len()] += 1;
        }
        hist
    }

    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn debug_stats(&self) -> DebugStats {
        DebugStats {
            populated: self.populated,
            capacity: self.capacity(),
            empty_buckets: self.buckets.iter().filter(|b| b.is_empty()).count(),
            longest_chain: self.buckets.iter().map(Bucket::len).max().unwrap_or(0),
            load_factor: self.populated as f64 / self.capacity() as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::ledger::Ledger;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    fn hash_key(state: &HashState, key: u64) -> u64 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish()
    }

    fn insert(table: &mut HashTable<u64, i32>, ledger: &mut Ledger, hash: u64, key: u64) {
        table.upsert(hash, key, key as i32, || ledger.record(hash));
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut ledger = Ledger::default();
        let mut table = HashTable::with_capacity(16);

        for key in 0..10 {
            insert(&mut table, &mut ledger, hash_key(&state, key), key);
        }

        assert_eq!(table.len(), 10);
        for key in 0..10 {
            let hash = hash_key(&state, key);
            assert_eq!(table.find(hash, &key).map(|p| p.value), Some(key as i32));
        }
        assert!(table.find(hash_key(&state, 99), &99).is_none());
    }

    #[test]
    fn locate_is_hash_mod_capacity() {
        let table: HashTable<u64, ()> = HashTable::with_capacity(8);
        assert_eq!(table.locate(1), 1);
        assert_eq!(table.locate(9), 1);
        assert_eq!(table.locate(17), 1);
        assert_eq!(table.locate(8), 0);
    }

    #[test]
    fn explicit_collision() {
        let mut ledger = Ledger::default();
        let mut table = HashTable::with_capacity(8);
        for key in [1u64, 9, 17] {
            insert(&mut table, &mut ledger, key, key);
        }

        assert_eq!(table.bucket_at(1).len(), 3);
        for key in [1u64, 9, 17] {
            assert_eq!(table.find(key, &key).map(|p| p.value), Some(key as i32));
        }

        assert_eq!(table.remove(9, &9).map(|p| p.value), Some(9));
        assert_eq!(table.len(), 2);
        assert!(table.find(9, &9).is_none());
        assert!(table.find(17, &17).is_some());
    }

    #[test]
    fn upsert_replaces_without_counting() {
        let mut ledger = Ledger::default();
        let mut table: HashTable<String, i32> = HashTable::with_capacity(4);

        assert_eq!(table.upsert(5, "k".to_string(), 1, || ledger.record(5)), None);
        assert_eq!(table.upsert(5, "k".to_string(), 2, || ledger.record(5)), Some(1));
        assert_eq!(table.len(), 1);
        assert_eq!(ledger.len(), 1);
        assert_eq!(table.find(5, "k").map(|p| p.value), Some(2));
    }

    #[test]
    fn rehash_preserves_pairs_and_order() {
        let state = HashState::default();
        let mut ledger = Ledger::default();
        let mut table = HashTable::with_capacity(3);

        for key in 0..50 {
            insert(&mut table, &mut ledger, hash_key(&state, key), key);
        }

        table.try_rehash(71, ledger.iter()).unwrap();
        assert_eq!(table.capacity(), 71);
        assert_eq!(table.len(), 50);

        for (seq, hash) in ledger.iter() {
            let pair = table.find_seq(hash, seq).unwrap();
            assert_eq!(pair.seq, seq);
            assert_eq!(table.locate(pair.hash), table.locate(hash));
        }

        let keys: Vec<u64> = ledger
            .iter()
            .map(|(seq, hash)| table.find_seq(hash, seq).unwrap().key)
            .collect();
        assert_eq!(keys, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn rehash_keeps_chain_order_by_ledger() {
        let mut ledger = Ledger::default();
        let mut table = HashTable::with_capacity(4);
        // 12, 4 and 0 share bucket 0 under both capacities.
        for key in [12u64, 4, 0] {
            insert(&mut table, &mut ledger, key, key);
        }
        table.try_rehash(2, ledger.iter()).unwrap();

        let chain: Vec<u64> = table.bucket_at(0).iter().map(|p| p.key).collect();
        assert_eq!(chain, [12, 4, 0]);
    }

    #[test]
    fn failed_rehash_leaves_table_untouched() {
        let mut ledger = Ledger::default();
        let mut table = HashTable::with_capacity(8);
        for key in 0..5u64 {
            insert(&mut table, &mut ledger, key, key);
        }

        assert!(table.try_rehash(usize::MAX, ledger.iter()).is_err());
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.len(), 5);
        for key in 0..5u64 {
            assert_eq!(table.find(key, &key).map(|p| p.value), Some(key as i32));
        }
    }

    #[test]
    fn push_new_appends_to_chain() {
        let mut ledger = Ledger::default();
        let mut table = HashTable::with_capacity(8);
        insert(&mut table, &mut ledger, 1, 1);

        let seq = ledger.record(9);
        assert_eq!(table.push_new(9, seq, 9, 90), (1, 1));
        assert_eq!(table.len(), 2);
        assert_eq!(table.find(9, &9).map(|p| p.value), Some(90));
    }

    #[test]
    fn take_seq_and_clear() {
        let mut ledger = Ledger::default();
        let mut table = HashTable::with_capacity(8);
        for key in 0..4u64 {
            insert(&mut table, &mut ledger, key, key);
        }

        let pair = table.take_seq(2, 2).unwrap();
        assert_eq!(pair.key, 2);
        assert_eq!(table.len(), 3);

        if let Some(pair) = table.find_seq_mut(3, 3) {
            pair.value = 30;
        }
        assert_eq!(table.find(3, &3).map(|p| p.value), Some(30));

        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.capacity(), 8);
        assert!(table.find(0, &0).is_none());
    }

    #[test]
    fn stats() {
        let mut ledger = Ledger::default();
        let mut table = HashTable::with_capacity(4);
        for key in [0u64, 4, 8, 1] {
            insert(&mut table, &mut ledger, key, key);
        }

        assert_eq!(table.chain_histogram(), [2, 1, 0, 1]);
        let stats = table.debug_stats();
        assert_eq!(stats.populated, 4);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.empty_buckets, 2);
        assert_eq!(stats.longest_chain, 3);
        assert!((stats.load_factor - 1.0).abs() < f64::EPSILON);
    }
}
