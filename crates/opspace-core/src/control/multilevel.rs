//! Keyed container grouped by priority level
//!
//! Entries are unique by key and live at exactly one level. Iteration
//! visits levels in ascending order and entries within a level in insertion
//! order.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct MultiLevelMap<K, V> {
    levels: Vec<Vec<(K, V)>>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for MultiLevelMap<K, V> {
    fn default() -> Self {
        Self {
            levels: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> MultiLevelMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at `level`, creating empty levels below it as needed
    ///
    /// Hands the value back when the key is already present.
    pub fn create(&mut self, key: K, value: V, level: usize) -> Result<&mut V, V> {
        if self.index.contains_key(&key) {
            return Err(value);
        }
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.index.insert(key.clone(), level);
        let entries = &mut self.levels[level];
        entries.push((key, value));
        let last = entries.len() - 1;
        Ok(&mut entries[last].1)
    }

    pub fn at<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let level = *self.index.get(key)?;
        self.levels[level]
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }

    pub fn at_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let level = *self.index.get(key)?;
        self.levels[level]
            .iter_mut()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }

    /// Remove an entry; trailing empty levels are dropped
    pub fn erase<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let level = self.index.remove(key)?;
        let entries = &mut self.levels[level];
        let pos = entries.iter().position(|(k, _)| k.borrow() == key)?;
        let (_, value) = entries.remove(pos);
        while self.levels.last().is_some_and(Vec::is_empty) {
            self.levels.pop();
        }
        Some(value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.contains_key(key)
    }

    pub fn level_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.get(key).copied()
    }

    /// Number of levels, including empty ones below the highest occupied
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Values at one level in insertion order
    pub fn level(&self, level: usize) -> impl Iterator<Item = &V> {
        self.levels
            .get(level)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(_, v)| v))
    }

    pub fn level_mut(&mut self, level: usize) -> impl Iterator<Item = &mut V> {
        self.levels
            .get_mut(level)
            .into_iter()
            .flat_map(|entries| entries.iter_mut().map(|(_, v)| v))
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.levels.iter().flat_map(|entries| entries.iter().map(|(_, v)| v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.levels
            .iter_mut()
            .flat_map(|entries| entries.iter_mut().map(|(_, v)| v))
    }

    /// Keys with their levels, in iteration order
    pub fn keys(&self) -> impl Iterator<Item = (&K, usize)> {
        self.levels
            .iter()
            .enumerate()
            .flat_map(|(level, entries)| entries.iter().map(move |(k, _)| (k, level)))
    }

    /// First entry in iteration order
    pub fn first(&self) -> Option<(&K, &V)> {
        self.levels
            .iter()
            .flat_map(|entries| entries.iter())
            .map(|(k, v)| (k, v))
            .next()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
        self.index.clear();
    }
}
