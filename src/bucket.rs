use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::borrow::Borrow;

/// A stored key-value pair.
///
/// `hash` caches the key's hash so the pair can be re-placed during a rehash
/// without touching the hasher, and `seq` is the ledger position assigned at
/// first insertion.
#[derive(Debug, Clone)]
pub(crate) struct Pair<K, V> {
    pub(crate) hash: u64,
    pub(crate) seq: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

/// A chain of pairs whose hashes map to the same slot.
///
/// Holds at most one pair per distinct key. Order is the order in which pairs
/// arrived in this chain; replacing a value keeps its position.
#[derive(Debug, Clone)]
pub(crate) struct Bucket<K, V> {
    pairs: Vec<Pair<K, V>>,
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self { pairs: Vec::new() }
    }
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn len(&self) -> usize {
        self.pairs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub(crate) fn iter(&self) -> core::slice::Iter<'_, Pair<K, V>> {
        self.pairs.iter()
    }

    pub(crate) fn position<Q>(&self, hash: u64, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        // The cached hash only short-circuits; a match always requires key
        // equality.
        self.pairs
            .iter()
            .position(|pair| pair.hash == hash && pair.key.borrow() == key)
    }

    pub(crate) fn find<Q>(&self, hash: u64, key: &Q) -> Option<&Pair<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.position(hash, key).map(|index| &self.pairs[index])
    }

    pub(crate) fn find_mut<Q>(&mut self, hash: u64, key: &Q) -> Option<&mut Pair<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.position(hash, key).map(|index| &mut self.pairs[index])
    }

    /// Replaces the value stored under `key` in place, or appends a new pair.
    ///
    /// `seq` is only called when a new pair is appended. Returns the replaced
    /// value, or `None` if the pair is new.
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
        match self.position(hash, &key) {
            Some(index) => Some(core::mem::replace(&mut self.pairs[index].value, value)),
            None => {
                self.pairs.push(Pair {
                    hash,
                    seq: seq(),
                    key,
                    value,
                });
                None
            }
        }
    }

    pub(crate) fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<Pair<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let index = self.position(hash, key)?;
        Some(self.pairs.remove(index))
    }

    pub(crate) fn pair_at_mut(&mut self, index: usize) -> &mut Pair<K, V> {
        &mut self.pairs[index]
    }

    pub(crate) fn find_seq(&self, seq: u64) -> Option<&Pair<K, V>> {
        self.pairs.iter().find(|pair| pair.seq == seq)
    }

    pub(crate) fn find_seq_mut(&mut self, seq: u64) -> Option<&mut Pair<K, V>> {
        self.pairs.iter_mut().find(|pair| pair.seq == seq)
    }

    pub(crate) fn take_seq(&mut self, seq: u64) -> Option<Pair<K, V>> {
        let index = self.pairs.iter().position(|pair| pair.seq == seq)?;
        Some(self.pairs.remove(index))
    }

    /// Appends a pair known not to be present and returns its position.
    /// Never reallocates if enough space was reserved beforehand.
    pub(crate) fn push(&mut self, pair: Pair<K, V>) -> usize {
        self.pairs.push(pair);
        self.pairs.len() - 1
    }

    pub(crate) fn try_reserve_exact(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.pairs.try_reserve_exact(additional)
    }

    pub(crate) fn clear(&mut self) {
        self.pairs.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;

    use super::*;

    fn counter() -> impl FnMut() -> u64 {
        let mut next = 0;
        move || {
            next += 1;
            next - 1
        }
    }

    #[test]
    fn upsert_appends_then_replaces_in_place() {
        let mut seq = counter();
        let mut bucket: Bucket<String, i32> = Bucket::default();

        assert_eq!(bucket.upsert(7, "a".to_string(), 1, &mut seq), None);
        assert_eq!(bucket.upsert(7, "b".to_string(), 2, &mut seq), None);
        assert_eq!(bucket.upsert(7, "a".to_string(), 10, &mut seq), Some(1));

        let keys: alloc::vec::Vec<_> = bucket.iter().map(|p| (p.key.as_str(), p.value)).collect();
        assert_eq!(keys, [("a", 10), ("b", 2)]);
        assert_eq!(bucket.find(7, "a").map(|p| p.seq), Some(0));
    }

    #[test]
    fn equal_hashes_are_not_equal_keys() {
        let mut seq = counter();
        let mut bucket: Bucket<u32, &str> = Bucket::default();
        bucket.upsert(1, 10, "ten", &mut seq);
        bucket.upsert(1, 20, "twenty", &mut seq);

        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket.find(1, &10).map(|p| p.value), Some("ten"));
        assert_eq!(bucket.find(1, &20).map(|p| p.value), Some("twenty"));
        assert!(bucket.find(1, &30).is_none());
        // Same key under a different cached hash never matches.
        assert!(bucket.find(2, &10).is_none());
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut seq = counter();
        let mut bucket: Bucket<u32, u32> = Bucket::default();
        for k in 0..4 {
            bucket.upsert(0, k, k * 10, &mut seq);
        }

        let removed = bucket.remove(0, &1).map(|p| p.value);
        assert_eq!(removed, Some(10));
        assert!(bucket.remove(0, &1).is_none());

        let keys: alloc::vec::Vec<_> = bucket.iter().map(|p| p.key).collect();
        assert_eq!(keys, [0, 2, 3]);
    }

    #[test]
    fn seq_lookup() {
        let mut seq = counter();
        let mut bucket: Bucket<u32, u32> = Bucket::default();
        bucket.upsert(3, 5, 50, &mut seq);
        bucket.upsert(3, 6, 60, &mut seq);

        assert_eq!(bucket.find_seq(1).map(|p| p.key), Some(6));
        if let Some(pair) = bucket.find_seq_mut(0) {
            pair.value += 1;
        }
        assert_eq!(bucket.take_seq(0).map(|p| p.value), Some(51));
        assert!(bucket.find_seq(0).is_none());
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn push_and_clear() {
        let mut seq = counter();
        let mut bucket: Bucket<u32, u32> = Bucket::default();
        for k in 0..3 {
            bucket.upsert(0, k, k, &mut seq);
        }
        let index = bucket.push(Pair {
            hash: 0,
            seq: 3,
            key: 3,
            value: 3,
        });
        assert_eq!(index, 3);
        bucket.pair_at_mut(index).value = 30;
        assert_eq!(bucket.position(0, &3), Some(3));
        assert_eq!(bucket.find_seq(3).map(|p| p.value), Some(30));

        bucket.clear();
        assert!(bucket.is_empty());
    }
}
