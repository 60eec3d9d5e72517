use alloc::collections::BTreeMap;

/// Insertion-order record of the live keys.
///
/// Each key gets a sequence number the first time it is inserted; the ledger
/// maps that number to the key's hash, which is enough to find the pair again
/// in the bucket table. Replacing a value does not touch the ledger, so a key
/// keeps its original position until it is deleted.
#[derive(Debug, Clone, Default)]
pub(crate) struct Ledger {
    order: BTreeMap<u64, u64>,
    next_seq: u64,
}

impl Ledger {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Appends a new key with the given hash and returns its sequence number.
    pub(crate) fn record(&mut self, hash: u64) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, hash);
        seq
    }

    pub(crate) fn forget(&mut self, seq: u64) {
        let removed = self.order.remove(&seq);
        debug_assert!(removed.is_some(), "ledger is missing sequence {seq}");
    }

    /// Iterates `(seq, hash)` in insertion order.
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.order.iter(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.next_seq = 0;
    }
}

#[derive(Clone)]
pub(crate) struct Iter<'a> {
    inner: alloc::collections::btree_map::Iter<'a, u64, u64>,
}

impl Iterator for Iter<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(&seq, &hash)| (seq, hash))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl IntoIterator for Ledger {
    type Item = (u64, u64);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.order.into_iter(),
        }
    }
}

pub(crate) struct IntoIter {
    inner: alloc::collections::btree_map::IntoIter<u64, u64>,
}

impl Iterator for IntoIter {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
