//! LRU (Least Recently Used) cache core
//!
//! Nodes live in a slot arena and link to each other by slot index, so the
//! recency list needs no raw pointers. The key index maps each key to its
//! slot. Not thread-safe on its own; see [`crate::LruStore`].

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

use ahash::RandomState;

use crate::error::{Error, Result};

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// LRU cache with fixed capacity
///
/// `head` is the most recently used node, `tail` the next eviction candidate.
pub struct LruCache<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();

        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of entries held at once
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Check membership without touching recency
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Get a value and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Get a value without changing its recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Insert or update a key-value pair
    ///
    /// An existing key is updated in place and promoted. A new key on a full
    /// cache first evicts the tail; the evicted pair is returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = &mut self.nodes[idx] {
                node.value = value;
            }
            self.move_to_front(idx);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: self.head,
        });
        self.link_front(idx);
        self.map.insert(key, idx);

        evicted
    }

    /// Remove a key from the cache
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        self.free_node(idx);
        self.nodes[idx].take().map(|node| node.value)
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let tail_idx = self.tail?;
        self.unlink(tail_idx);
        self.free_node(tail_idx);
        let node = self.nodes[tail_idx].take()?;
        self.map.remove(&node.key);
        Some((node.key, node.value))
    }

    /// Clear the cache, keeping its capacity
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match &self.nodes[idx] {
                Some(node) => {
                    keys.push(node.key.clone());
                    cursor = node.next;
                }
                None => break,
            }
            if keys.len() > self.map.len() {
                break;
            }
        }
        keys
    }

    /// Verify that the key index and the recency list agree
    pub fn check_invariants(&self) -> Result<()> {
        if self.map.len() > self.capacity {
            return Err(Error::Invariant(format!(
                "{} entries exceed capacity {}",
                self.map.len(),
                self.capacity
            )));
        }

        let mut count = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self.nodes[idx]
                .as_ref()
                .ok_or_else(|| Error::Invariant(format!("list links freed slot {}", idx)))?;
            if node.prev != prev {
                return Err(Error::Invariant(format!(
                    "slot {} has prev {:?}, expected {:?}",
                    idx, node.prev, prev
                )));
            }
            if self.map.get(&node.key) != Some(&idx) {
                return Err(Error::Invariant(format!(
                    "slot {} is not indexed under its key",
                    idx
                )));
            }
            count += 1;
            if count > self.map.len() {
                return Err(Error::Invariant(format!(
                    "list is longer than index ({} keys)",
                    self.map.len()
                )));
            }
            prev = Some(idx);
            cursor = node.next;
        }

        if self.tail != prev {
            return Err(Error::Invariant(format!(
                "tail is {:?}, last node is {:?}",
                self.tail, prev
            )));
        }
        if count != self.map.len() {
            return Err(Error::Invariant(format!(
                "index has {} keys, list has {} nodes",
                self.map.len(),
                count
            )));
        }
        Ok(())
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return; // Already at front
        }

        self.unlink(idx);

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }
        self.link_front(idx);
    }

    /// Make `idx` the head; its own `prev`/`next` must already be set
    fn link_front(&mut self, idx: usize) {
        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    fn free_node(&mut self, idx: usize) {
        self.free_list.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache<V>(capacity: usize) -> LruCache<&'static str, V> {
        LruCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = cache(2);

        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.len(), 2);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = cache(2);

        cache.put("a", 1);
        cache.put("b", 2);
        let evicted = cache.put("c", 3);

        assert_eq!(evicted, Some(("a", 1)));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_get_promotes() {
        let mut cache = cache(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get(&"a");
        cache.put("d", 4); // b is now the tail

        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"c"), Some(&3));
        assert_eq!(cache.get(&"d"), Some(&4));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_repeated_put_order() {
        let mut cache = cache(2);

        cache.put("foo1", "bar1");
        cache.put("foo2", "bar2");
        cache.put("foo2", "bar2");
        cache.put("foo2", "bar2");
        assert_eq!(cache.put("foo3", "bar3"), Some(("foo1", "bar1")));
        assert_eq!(cache.put("foo1", "bar1"), Some(("foo2", "bar2")));

        assert_eq!(cache.get(&"foo2"), None);
        assert_eq!(cache.keys(), vec!["foo1", "foo3"]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_overwrite() {
        let mut cache = cache(2);

        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.put("a", 10), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["a", "b"]);
        assert_eq!(cache.peek(&"a"), Some(&10));
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = cache(1);

        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.len(), 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_peek_keeps_order() {
        let mut cache = cache(2);

        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.peek(&"a"), Some(&1));
        assert!(cache.contains(&"a"));
        cache.put("c", 3);

        assert!(!cache.contains(&"a"));
        assert_eq!(cache.keys(), vec!["c", "b"]);
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = cache(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.remove(&"b"), Some(2));
        assert_eq!(cache.remove(&"b"), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["c", "a"]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_remove_head_and_tail() {
        let mut cache = cache(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        cache.remove(&"c");
        cache.check_invariants().unwrap();
        cache.remove(&"a");
        cache.check_invariants().unwrap();
        assert_eq!(cache.keys(), vec!["b"]);

        cache.remove(&"b");
        assert!(cache.is_empty());
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_pop_order() {
        let mut cache = cache(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get(&"a");

        assert_eq!(cache.pop_lru(), Some(("b", 2)));
        assert_eq!(cache.pop_lru(), Some(("c", 3)));
        assert_eq!(cache.pop_lru(), Some(("a", 1)));
        assert_eq!(cache.pop_lru(), None);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_reuses_slots() {
        let mut cache = cache(2);

        for i in 0..100 {
            let key: &'static str = Box::leak(format!("k{}", i).into_boxed_str());
            cache.put(key, i);
            cache.check_invariants().unwrap();
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.nodes.len() <= 2);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = cache(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.capacity(), 3);

        cache.put("x", 1);
        cache.put("y", 2);
        cache.put("z", 3);
        assert_eq!(cache.len(), 3);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_check_invariants_detects_stale_index() {
        let mut cache = cache(2);

        cache.put("a", 1);
        cache.map.insert("ghost", 7);

        assert!(matches!(
            cache.check_invariants(),
            Err(Error::Invariant(_))
        ));
    }
}
