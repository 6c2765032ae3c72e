use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Bounded map of rendered content.
///
/// Eviction is by insertion order: once the cap is reached the oldest entry
/// goes, however recently it was read. Re-inserting a key replaces the value
/// but keeps its original position.
#[derive(Debug, Clone)]
pub struct RenderCache<K, V>
where
    K: Eq + Hash + Clone,
{
    capacity: usize,
    map: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> RenderCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), map: HashMap::new(), order: VecDeque::new() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Returns the number of entries evicted to make room.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        if self.map.insert(key.clone(), value).is_some() {
            return 0;
        }
        self.order.push_back(key);
        self.trim_to(self.capacity)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.map.remove(key)?;
        if let Some(index) = self.order.iter().position(|existing| existing == key) {
            let _ = self.order.remove(index);
        }
        Some(value)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    /// Evict oldest entries until at most `len` remain.
    pub fn trim_to(&mut self, len: usize) -> usize {
        let mut evicted = 0;
        while self.map.len() > len {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.map.remove(&oldest).is_some() {
                evicted += 1;
            }
        }
        evicted
    }

    /// Keys from oldest to newest
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }
}
