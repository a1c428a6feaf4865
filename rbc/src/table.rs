//! Open-addressing hash table with linear probing.
//!
//! Both the topic table and the per-topic document accumulators are built on
//! [`ProbeTable`]. Iteration walks the slot array, so entries come out in
//! probe-table order: neither insertion order nor any value order. Callers
//! that need a ranking must sort or heap the entries themselves.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::mem;

use ahash::RandomState;

use crate::error::Result;

/// aHash with fixed seeds, so probe order is reproducible between runs.
pub type FixedState = RandomState;

pub fn fixed_state() -> FixedState {
    RandomState::with_seeds(0x243f_6a88_85a3_08d3, 0x1319_8a2e_0370_7344, 0xa409_3822_299f_31d0, 0x082e_fa98_ec4e_6c89)
}

const MIN_CAPACITY: usize = 8;
// max load factor 0.7, kept as a ratio to stay in integer arithmetic
const LOAD_NUM: usize = 7;
const LOAD_DEN: usize = 10;

pub struct ProbeTable<K, V, S = FixedState> {
    slots: Vec<Option<(K, V)>>,
    len: usize,
    hasher: S,
}

impl<K, V> ProbeTable<K, V> {
    pub fn new() -> Self { Self::with_capacity(0) }

    /// Table sized for `expected` entries at low load.
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_and_hasher(expected, fixed_state())
    }
}

impl<K, V> Default for ProbeTable<K, V> {
    fn default() -> Self { Self::new() }
}

impl<K, V, S> ProbeTable<K, V, S> {
    pub fn with_capacity_and_hasher(expected: usize, hasher: S) -> Self {
        let cap = expected.saturating_mul(2).next_power_of_two().max(MIN_CAPACITY);
        let mut slots = Vec::with_capacity(cap);
        slots.resize_with(cap, || None);
        Self { slots, len: 0, hasher }
    }

    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn capacity(&self) -> usize { self.slots.len() }

    /// Occupied entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.slots.iter().filter_map(|s| s.as_ref().map(|(k, v)| (k, v)))
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ProbeTable<K, V, S> {
    /// `Ok(slot)` holding `key`, or `Err(slot)` of the first empty slot on its probe path.
    fn probe<Q>(&self, key: &Q) -> std::result::Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let cap = self.slots.len();
        let mut i = (self.hasher.hash_one(key) as usize) % cap;
        // load factor stays below 1, so an empty slot always ends the walk
        loop {
            match &self.slots[i] {
                Some((k, _)) if k.borrow() == key => return Ok(i),
                Some(_) => i = (i + 1) % cap,
                None => return Err(i),
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = self.probe(key).ok()?;
        self.slots[i].as_ref().map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = self.probe(key).ok()?;
        self.slots[i].as_mut().map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.probe(key).is_ok()
    }

    /// Insert or replace. Returns the previous value for `key`, if any.
    ///
    /// A new key first doubles the table when it would push the load past 0.7.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        if let Ok(i) = self.probe(&key) {
            if let Some((_, v)) = self.slots[i].as_mut() {
                return Ok(Some(mem::replace(v, value)));
            }
        }
        if (self.len + 1) * LOAD_DEN > self.slots.len() * LOAD_NUM {
            self.rehash(self.slots.len() * 2)?;
        }
        let i = match self.probe(&key) {
            Ok(i) | Err(i) => i,
        };
        self.slots[i] = Some((key, value));
        self.len += 1;
        Ok(None)
    }

    fn rehash(&mut self, new_cap: usize) -> Result<()> {
        let mut fresh: Vec<Option<(K, V)>> = Vec::new();
        fresh.try_reserve_exact(new_cap)?;
        fresh.resize_with(new_cap, || None);
        let old = mem::replace(&mut self.slots, fresh);
        for (k, v) in old.into_iter().flatten() {
            let i = match self.probe(&k) {
                Ok(i) | Err(i) => i,
            };
            self.slots[i] = Some((k, v));
        }
        tracing::trace!(capacity = new_cap, len = self.len, "rehashed probe table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{BuildHasherDefault, Hasher};

    /// Sends every key to slot 0 so each insert walks the full collision chain.
    #[derive(Default)]
    struct ZeroHasher;

    impl Hasher for ZeroHasher {
        fn finish(&self) -> u64 { 0 }
        fn write(&mut self, _bytes: &[u8]) {}
    }

    type Colliding<K, V> = ProbeTable<K, V, BuildHasherDefault<ZeroHasher>>;

    #[test]
    fn insert_get_replace() {
        let mut t: ProbeTable<String, u32> = ProbeTable::new();
        assert_eq!(t.insert("a".into(), 1).unwrap(), None);
        assert_eq!(t.insert("b".into(), 2).unwrap(), None);
        assert_eq!(t.insert("a".into(), 3).unwrap(), Some(1));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("a"), Some(&3));
        assert_eq!(t.get("c"), None);
        *t.get_mut("b").unwrap() += 10;
        assert_eq!(t.get("b"), Some(&12));
    }

    #[test]
    fn grows_before_load_exceeds_threshold() {
        let mut t: ProbeTable<u32, u32> = ProbeTable::new();
        assert_eq!(t.capacity(), MIN_CAPACITY);
        for i in 0..1000 {
            t.insert(i, i * 2).unwrap();
            assert!(t.len() * LOAD_DEN <= t.capacity() * LOAD_NUM);
        }
        assert_eq!(t.len(), 1000);
        for i in 0..1000 {
            assert_eq!(t.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn linear_probing_under_full_collision() {
        let mut t: Colliding<u32, &str> = ProbeTable::with_capacity_and_hasher(0, Default::default());
        for (i, name) in ["x", "y", "z", "w", "v", "u", "t"].iter().enumerate() {
            t.insert(i as u32, *name).unwrap();
        }
        assert_eq!(t.get(&3), Some(&"w"));
        assert_eq!(t.get(&6), Some(&"t"));
        assert!(!t.contains_key(&99));
        // all keys share a home slot, so slot order is insertion order here
        let keys: Vec<u32> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn initial_capacity_is_a_multiple_of_expected() {
        let t: ProbeTable<u32, ()> = ProbeTable::with_capacity(100);
        assert!(t.capacity() >= 200);
        assert!(t.is_empty());
        let small: ProbeTable<u32, ()> = ProbeTable::with_capacity(1);
        assert_eq!(small.capacity(), MIN_CAPACITY);
    }

    #[test]
    fn slot_order_is_reproducible_across_tables() {
        let build = || {
            let mut t: ProbeTable<String, usize> = ProbeTable::new();
            for i in 0..50 {
                t.insert(format!("doc-{i}"), i).unwrap();
            }
            t.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }
}
