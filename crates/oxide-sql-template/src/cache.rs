//! Parsed template cache.
//!
//! An LRU cache of parsed template trees keyed by template text, so a
//! template used on every request is lexed and parsed only once.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::sql::Node;

/// Default number of parsed templates to cache.
pub const DEFAULT_CACHE_SIZE: usize = 100;

struct Entries {
    /// Parsed trees keyed by template text.
    nodes: HashMap<String, Arc<Node>>,
    /// Access order, most recently used at the back.
    lru: VecDeque<String>,
}

/// LRU cache for parsed templates.
///
/// The cache is internally locked and can be shared between threads behind
/// an `Arc`.
pub struct NodeCache {
    entries: Mutex<Entries>,
    /// Maximum number of cached templates.
    max_size: usize,
}

impl NodeCache {
    /// Creates a cache with [`DEFAULT_CACHE_SIZE`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_SIZE)
    }

    /// Creates a cache holding at most `max_size` templates.
    ///
    /// A capacity of zero caches nothing.
    #[must_use]
    pub fn with_capacity(max_size: usize) -> Self {
        let initial = max_size.min(DEFAULT_CACHE_SIZE);
        Self {
            entries: Mutex::new(Entries {
                nodes: HashMap::with_capacity(initial),
                lru: VecDeque::with_capacity(initial),
            }),
            max_size,
        }
    }

    /// Returns the cached tree for `template` and marks it as recently used.
    pub fn get(&self, template: &str) -> Option<Arc<Node>> {
        let mut entries = self.lock();
        let node = entries.nodes.get(template).cloned()?;
        // Move to the back of the queue.
        if let Some(pos) = entries.lru.iter().position(|t| t == template) {
            entries.lru.remove(pos);
        }
        entries.lru.push_back(template.to_string());
        Some(node)
    }

    /// Caches a parsed tree and returns the shared handle.
    ///
    /// The least recently used entry is evicted once the cache is full.
    pub fn insert(&self, template: &str, node: Node) -> Arc<Node> {
        let node = Arc::new(node);
        if self.max_size == 0 {
            return node;
        }
        let mut entries = self.lock();
        if entries.nodes.contains_key(template) {
            if let Some(pos) = entries.lru.iter().position(|t| t == template) {
                entries.lru.remove(pos);
            }
        } else if entries.nodes.len() >= self.max_size {
            // Evict the least recently used entry.
            if let Some(evicted) = entries.lru.pop_front() {
                trace!(template = %evicted, "Evicting cached template");
                entries.nodes.remove(&evicted);
            }
        }
        entries.nodes.insert(template.to_string(), Arc::clone(&node));
        entries.lru.push_back(template.to_string());
        node
    }

    /// Returns the number of cached templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Returns true if nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_size
    }

    /// Removes every cached template.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.nodes.clear();
        entries.lru.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // The entries stay consistent even if a holder panicked.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCache")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Node {
        Node::Statement(vec![Node::Word(text.to_string())])
    }

    #[test]
    fn test_cache_basic() {
        let cache = NodeCache::new();
        assert!(cache.is_empty());

        cache.insert("select 1", word("1"));
        assert_eq!(cache.len(), 1);

        let node = cache.get("select 1");
        assert_eq!(node.as_deref(), Some(&word("1")));
        assert!(cache.get("select 2").is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = NodeCache::with_capacity(2);
        cache.insert("a", word("a"));
        cache.insert("b", word("b"));

        // Touch "a" so "b" becomes least recently used.
        assert!(cache.get("a").is_some());
        cache.insert("c", word("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_reinsert_does_not_evict() {
        let cache = NodeCache::with_capacity(2);
        cache.insert("a", word("a"));
        cache.insert("b", word("b"));
        cache.insert("a", word("a2"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").as_deref(), Some(&word("a2")));
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_zero_capacity_caches_nothing() {
        let cache = NodeCache::with_capacity(0);
        let node = cache.insert("a", word("a"));
        assert_eq!(*node, word("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = NodeCache::new();
        cache.insert("a", word("a"));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }
}
