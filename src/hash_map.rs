use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::error::Result;
use crate::hash_table::HashTable;
use crate::ledger;
use crate::ledger::Ledger;
use crate::resize;

/// A separately chained hash map that iterates in insertion order.
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S`. Pairs live in a table of
/// buckets indexed by `hash % capacity`; colliding keys share a bucket and
/// are told apart by key equality.
///
/// Iteration, [`Debug`] output and the [`keys`](Self::keys) /
/// [`values`](Self::values) / [`pairs`](Self::pairs) snapshots all follow the
/// order in which keys were first inserted. Replacing a value keeps the key's
/// position; deleting and re-inserting moves it to the end.
///
/// The table grows after an insertion pushes the load above 66% and shrinks
/// after a deletion drops it below 16.6% (never below 8 buckets). Equality
/// compares the set of pairs only; capacity and insertion order are ignored.
///
/// # Concurrency
///
/// The map has no internal synchronization. Mutating it while one of its
/// iterators is alive is rejected at compile time. To share it across
/// threads, put the whole map behind a single lock.
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<K, V>,
    ledger: Ledger,
    declared_capacity: usize,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> HashMap<K, V, S> {
    fn with_valid_capacity(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            ledger: Ledger::default(),
            declared_capacity: capacity,
            hash_builder,
        }
    }

    /// Returns the number of pairs in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.set(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.table.len(), self.ledger.len());
        self.table.len()
    }

    /// Returns `true` if the map contains no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current number of buckets.
    ///
    /// This changes as the map grows and shrinks. See
    /// [`declared_capacity`](Self::declared_capacity) for the capacity the map
    /// was constructed with.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let map: HashMap<i32, i32> = HashMap::with_capacity(100)?;
    /// assert_eq!(map.capacity(), 100);
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the capacity the map was constructed with.
    pub fn declared_capacity(&self) -> usize {
        self.declared_capacity
    }

    /// Returns `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns an iterator over the pairs in insertion order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("b", 2);
    /// map.set("a", 1);
    /// map.set("b", 20);
    ///
    /// let pairs: Vec<_> = map.iter().collect();
    /// assert_eq!(pairs, [(&"b", &20), (&"a", &1)]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            table: &self.table,
            order: self.ledger.iter(),
        }
    }

    /// Returns an iterator over the keys in insertion order.
    ///
    /// Unlike [`keys`](Self::keys) this borrows the map and allocates nothing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("one", 1);
    /// map.set("two", 2);
    ///
    /// let keys: Vec<&&str> = map.iter_keys().collect();
    /// assert_eq!(keys, [&"one", &"two"]);
    /// ```
    pub fn iter_keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in insertion order.
    ///
    /// Unlike [`values`](Self::values) this borrows the map and needs no
    /// `V: Clone`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("one", 1);
    /// map.set("two", 2);
    ///
    /// let total: i32 = map.iter_values().sum();
    /// assert_eq!(total, 3);
    /// ```
    pub fn iter_values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Removes all pairs.
    ///
    /// The current capacity is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// for i in 0..20 {
    ///     map.set(i, i);
    /// }
    /// let capacity = map.capacity();
    ///
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), capacity);
    /// ```
    pub fn clear(&mut self) {
        log::debug!(
            "clearing {} pairs, keeping {} buckets",
            self.len(),
            self.capacity()
        );
        self.table.clear();
        self.ledger.clear();
    }

    /// Returns a snapshot of the keys in insertion order.
    ///
    /// Each call allocates a new `Vec`; later changes to the map do not
    /// affect it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("x", 1);
    /// map.set("y", 2);
    ///
    /// let keys = map.keys();
    /// map.set("z", 3);
    /// assert_eq!(keys, ["x", "y"]);
    /// ```
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Returns a snapshot of the values in insertion order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Returns a snapshot of the pairs in insertion order.
    pub fn pairs(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Returns how many buckets hold each chain length: entry `i` counts the
    /// buckets with exactly `i` pairs.
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> Vec<usize> {
        self.table.chain_histogram()
    }

    /// Returns statistics about the underlying bucket table.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::DebugStats {
        self.table.debug_stats()
    }

    fn rehash(&mut self, capacity: usize) {
        let from = self.table.capacity();
        match self.table.try_rehash(capacity, self.ledger.iter()) {
            Ok(()) => log::trace!(
                "rehashed {} pairs from {from} to {capacity} buckets",
                self.table.len()
            ),
            Err(err) => {
                log::warn!("keeping {from} buckets, could not allocate {capacity}: {err}");
            }
        }
    }

    fn after_insert(&mut self) {
        if let Some(capacity) = resize::grow_target(self.len(), self.capacity()) {
            self.rehash(capacity);
        }
    }

    fn after_delete(&mut self) {
        if let Some(capacity) = resize::shrink_target(self.len(), self.capacity()) {
            self.rehash(capacity);
        }
    }

    /// Grows ahead of appending one new pair. The resulting layout matches
    /// appending first and growing after.
    fn before_append(&mut self) {
        if let Some(capacity) = resize::grow_target(self.len() + 1, self.capacity()) {
            self.rehash(capacity);
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty map with the default capacity and the given hasher
    /// builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::hash::RandomState;
    ///
    /// use chain_map::DEFAULT_CAPACITY;
    /// use chain_map::HashMap;
    ///
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(RandomState::new());
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), DEFAULT_CAPACITY);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_valid_capacity(resize::DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates an empty map with `capacity` buckets and the given hasher
    /// builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::hash::RandomState;
    ///
    /// use chain_map::Error;
    /// use chain_map::HashMap;
    ///
    /// let map: HashMap<i32, i32, _> = HashMap::with_capacity_and_hasher(16, RandomState::new())?;
    /// assert_eq!(map.capacity(), 16);
    ///
    /// let err = HashMap::<i32, i32, _>::with_capacity_and_hasher(0, RandomState::new());
    /// assert_eq!(err.unwrap_err(), Error::InvalidCapacity { requested: 0 });
    /// # Ok::<(), Error>(())
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity {
                requested: capacity,
            });
        }
        Ok(Self::with_valid_capacity(capacity, hash_builder))
    }

    /// Builds a map from `source`, applying every pair with
    /// [`set`](Self::set) in the source's order.
    ///
    /// With `capacity` of `None`, the map starts with enough buckets to hold
    /// every source pair without growing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is `Some(0)`.
    pub fn from_mapping_with_hasher<I>(
        source: I,
        capacity: Option<usize>,
        hash_builder: S,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<(K, V)> = source.into_iter().collect();
        let capacity = capacity.unwrap_or_else(|| resize::capacity_for(pairs.len()));
        let mut map = Self::with_capacity_and_hasher(capacity, hash_builder)?;
        map.extend(pairs);
        Ok(map)
    }

    fn make_hash<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.hash_builder.hash_one(key)
    }

    /// Inserts a pair, or replaces the value of an existing key.
    ///
    /// Returns the replaced value. A replaced key keeps its position in
    /// iteration order; a new key goes last and may trigger growth.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.set(37, "a"), None);
    /// assert_eq!(map.set(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Ok(&"b"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let ledger = &mut self.ledger;
        let replaced = self.table.upsert(hash, key, value, || ledger.record(hash));
        if replaced.is_none() {
            self.after_insert();
        }
        replaced
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::Error;
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("hola".to_string(), "hello");
    /// assert_eq!(map.get("hola"), Ok(&"hello"));
    /// assert_eq!(map.get("missing"), Err(Error::KeyNotFound));
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.make_hash(key);
        self.table
            .find(hash, key)
            .map(|pair| &pair.value)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.make_hash(key);
        self.table
            .find_mut(hash, key)
            .map(|pair| &mut pair.value)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns the value stored under `key`, or `default` if it is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("hola", "hello");
    /// assert_eq!(map.get_or("hola", &"default"), &"hello");
    /// assert_eq!(map.get_or("missing", &"default"), &"default");
    /// ```
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns `true` if the map holds a value for `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_ok()
    }

    /// Removes `key`, returning the stored key and value if it was present.
    ///
    /// A removal that drops the load below the shrink threshold halves the
    /// capacity.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.make_hash(key);
        let pair = self.table.remove(hash, key)?;
        self.ledger.forget(pair.seq);
        self.after_delete();
        Some((pair.key, pair.value))
    }

    /// Removes `key` from the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent; the map is left
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::Error;
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set(1, "a");
    /// assert_eq!(map.delete(&1), Ok(()));
    /// assert!(!map.contains(&1));
    /// assert_eq!(map.delete(&1), Err(Error::KeyNotFound));
    /// ```
    pub fn delete<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key)
            .map(|_| ())
            .ok_or(Error::KeyNotFound)
    }

    /// Removes `key` and returns its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("hola", "hello");
    /// assert_eq!(map.pop("hola"), Ok("hello"));
    /// assert!(map.pop("hola").is_err());
    /// ```
    pub fn pop<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key)
            .map(|(_, v)| v)
            .ok_or(Error::KeyNotFound)
    }

    /// Removes `key` and returns its value, or returns `default` if the key
    /// is absent.
    pub fn pop_or<Q>(&mut self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.pop(key).unwrap_or(default)
    }

    /// Returns the value stored under `key`, inserting `default` first if the
    /// key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("hola", 1);
    ///
    /// assert_eq!(*map.set_default("hola", 5), 1);
    /// assert_eq!(*map.set_default("year", 2022), 2022);
    ///
    /// *map.set_default("year", 0) += 1;
    /// assert_eq!(map.get("year"), Ok(&2023));
    /// ```
    pub fn set_default(&mut self, key: K, default: V) -> &mut V {
        let hash = self.make_hash(&key);
        let index = self.table.locate(hash);
        let (index, position) = match self.table.bucket_at(index).position(hash, &key) {
            Some(position) => (index, position),
            None => {
                self.before_append();
                let seq = self.ledger.record(hash);
                self.table.push_new(hash, seq, key, default)
            }
        };
        &mut self.table.bucket_at_mut(index).pair_at_mut(position).value
    }

    /// Applies pairs from either `source` or `overrides` with
    /// [`set`](Self::set), in their iteration order.
    ///
    /// The two inputs are mutually exclusive: `overrides` must be empty when
    /// `source` is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMerge`] if `source` is `Some` and `overrides`
    /// yields at least one pair. Nothing is applied in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::Error;
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::from([("a", 1), ("b", 2), ("c", 3)]);
    ///
    /// map.update(Some([("b", 20)]), [])?;
    /// assert_eq!(map.get("b"), Ok(&20));
    /// assert_eq!(map.len(), 3);
    ///
    /// map.update(None::<[(&str, i32); 0]>, [("year", 2022)])?;
    /// assert_eq!(map.get("year"), Ok(&2022));
    ///
    /// let err = map.update(Some([("x", 0)]), [("y", 0)]);
    /// assert_eq!(err, Err(Error::InvalidMerge));
    /// assert!(!map.contains("x"));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn update<I, O>(&mut self, source: Option<I>, overrides: O) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        O: IntoIterator<Item = (K, V)>,
    {
        let mut overrides = overrides.into_iter().peekable();
        match source {
            Some(_) if overrides.peek().is_some() => Err(Error::InvalidMerge),
            Some(source) => {
                self.extend(source);
                Ok(())
            }
            None => {
                self.extend(overrides);
                Ok(())
            }
        }
    }

    /// Keeps only the pairs for which `f` returns `true`.
    ///
    /// Pairs are visited in insertion order. The capacity is shrunk once at
    /// the end if the load fell below the shrink threshold.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map: HashMap<i32, i32> = (0..10).map(|i| (i, i * 10)).collect();
    /// map.retain(|k, _| k % 2 == 0);
    /// assert_eq!(map.keys(), [0, 2, 4, 6, 8]);
    /// ```
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut doomed = Vec::new();
        for (seq, hash) in self.ledger.iter() {
            if let Some(pair) = self.table.find_seq_mut(hash, seq) {
                if !f(&pair.key, &mut pair.value) {
                    doomed.push((seq, hash));
                }
            }
        }
        if doomed.is_empty() {
            return;
        }

        for (seq, hash) in doomed {
            self.table.take_seq(hash, seq);
            self.ledger.forget(seq);
        }

        let mut target = self.capacity();
        while let Some(capacity) = resize::shrink_target(self.len(), target) {
            target = capacity;
        }
        if target != self.capacity() {
            self.rehash(target);
        }
    }

    /// Grows the table so that `additional` more pairs fit without crossing
    /// the grow threshold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the larger table cannot be
    /// allocated. The map is unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map: HashMap<u64, u64> = HashMap::new();
    /// map.try_reserve(1000)?;
    /// let capacity = map.capacity();
    /// for i in 0..1000 {
    ///     map.set(i, i);
    /// }
    /// assert_eq!(map.capacity(), capacity);
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let required = self.len().saturating_add(additional);
        if let Some(capacity) = resize::grow_target(required, self.capacity()) {
            self.table.try_rehash(capacity, self.ledger.iter())?;
            log::trace!("reserved {capacity} buckets for {required} pairs");
        }
        Ok(())
    }

    /// Like [`try_reserve`](Self::try_reserve), but an allocation failure is
    /// only logged and the map keeps its current capacity.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.len().saturating_add(additional);
        if let Some(capacity) = resize::grow_target(required, self.capacity()) {
            self.rehash(capacity);
        }
    }

    /// Shrinks the table to the smallest capacity that holds the current
    /// pairs without crossing the grow threshold.
    ///
    /// Unlike automatic shrinking, this may go below the shrink floor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::with_capacity(1000)?;
    /// map.set(1, "one");
    /// map.set(2, "two");
    ///
    /// map.shrink_to_fit();
    /// assert!(map.capacity() < 1000);
    /// assert_eq!(map.get(&2), Ok(&"two"));
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn shrink_to_fit(&mut self) {
        let capacity = resize::capacity_for(self.len());
        if capacity < self.capacity() {
            self.rehash(capacity);
        }
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K, V> HashMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    /// Creates an empty map with the default capacity and hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map with `capacity` buckets and the default hasher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Builds a map from `source` with the default hasher.
    ///
    /// See [`from_mapping_with_hasher`](Self::from_mapping_with_hasher).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let source = [("hola", "hello"), ("adios", "bye")];
    ///
    /// let sized: HashMap<_, _> = HashMap::from_mapping(source, None)?;
    /// let roomy: HashMap<_, _> = HashMap::from_mapping(source, Some(1000))?;
    ///
    /// assert_eq!(roomy.capacity(), 1000);
    /// assert_eq!(sized, roomy);
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn from_mapping<I>(source: I, capacity: Option<usize>) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_mapping_with_hasher(source, capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

/// Copies the map.
///
/// The copy starts from the original's declared capacity and receives the
/// pairs in insertion order, so it has the same pairs, order and declared
/// capacity but shares no storage.
impl<K, V, S> Clone for HashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        let mut copy = Self::with_valid_capacity(self.declared_capacity, self.hash_builder.clone());
        for (seq, hash) in self.ledger.iter() {
            if let Some(pair) = self.table.find_seq(hash, seq) {
                copy.before_append();
                let seq = copy.ledger.record(hash);
                copy.table
                    .push_new(hash, seq, pair.key.clone(), pair.value.clone());
            }
        }
        copy
    }
}

impl<K, V, S1, S2> PartialEq<HashMap<K, V, S2>> for HashMap<K, V, S1>
where
    K: Hash + Eq,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S2>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_ok_and(|theirs| v == theirs))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> PartialEq<BTreeMap<K, V>> for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &BTreeMap<K, V>) -> bool {
        self.len() == other.len()
            && other
                .iter()
                .all(|(k, v)| self.get(k).is_ok_and(|mine| mine == v))
    }
}

#[cfg(feature = "std")]
impl<K, V, S, S2> PartialEq<std::collections::HashMap<K, V, S2>> for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &std::collections::HashMap<K, V, S2>) -> bool {
        self.len() == other.len()
            && other
                .iter()
                .all(|(k, v)| self.get(k).is_ok_and(|mine| mine == v))
    }
}

impl<K, V, S> PartialEq<HashMap<K, V, S>> for BTreeMap<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        other == self
    }
}

#[cfg(feature = "std")]
impl<K, V, S, S2> PartialEq<HashMap<K, V, S>> for std::collections::HashMap<K, V, S2>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        other == self
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for HashMap<K, V, S>
where
    K: Hash + Eq + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let pairs: Vec<(K, V)> = iter.into_iter().collect();
        let mut map = Self::with_valid_capacity(resize::capacity_for(pairs.len()), S::default());
        map.extend(pairs);
        map
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K, V, const N: usize> From<[(K, V); N]> for HashMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            table: self.table,
            order: self.ledger.into_iter(),
        }
    }
}

/// An iterator over the pairs of a `HashMap` in insertion order.
pub struct Iter<'a, K, V> {
    table: &'a HashTable<K, V>,
    order: ledger::Iter<'a>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            order: self.order.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (seq, hash) = self.order.next()?;
        let pair = self.table.find_seq(hash, seq);
        debug_assert!(pair.is_some(), "ledger sequence {seq} has no pair");
        pair.map(|pair| (&pair.key, &pair.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `HashMap` in insertion order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap` in insertion order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

/// An owning iterator over the pairs of a `HashMap` in insertion order.
pub struct IntoIter<K, V> {
    table: HashTable<K, V>,
    order: ledger::IntoIter,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (seq, hash) = self.order.next()?;
        let pair = self.table.take_seq(hash, seq);
        debug_assert!(pair.is_some(), "ledger sequence {seq} has no pair");
        pair.map(|pair| (pair.key, pair.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}
