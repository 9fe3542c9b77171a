// src/pool.rs - canonical registry of observed raw name strings

use std::collections::HashMap;

use crate::models::core::StringId;

/// Deduplicated registry of every raw string observed in a run.
///
/// Each unique value is stored once, with the number of source rows that
/// contributed it. Ids are assigned in first-seen order, so they are
/// deterministic for a given input sequence. The pool is purely additive;
/// nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    texts: Vec<String>,
    counts: Vec<u64>,
    index: HashMap<String, StringId>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert each observed string, incrementing its occurrence count.
    pub fn add<I, S>(&mut self, strings: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for s in strings {
            let id = self.intern(s.as_ref());
            self.counts[id] += 1;
        }
    }

    /// Insert a string if absent, without counting an occurrence. Used for
    /// strings that arrive via constraints rather than source rows; their
    /// count stays 0 until a source row contributes them.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = self.texts.len();
        self.texts.push(s.to_string());
        self.counts.push(0);
        self.index.insert(s.to_string(), id);
        id
    }

    pub fn id_of(&self, s: &str) -> Option<StringId> {
        self.index.get(s).copied()
    }

    pub fn text_of(&self, id: StringId) -> &str {
        &self.texts[id]
    }

    pub fn count_of(&self, id: StringId) -> u64 {
        self.counts[id]
    }

    pub fn count_of_str(&self, s: &str) -> u64 {
        self.id_of(s).map(|id| self.counts[id]).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn ids(&self) -> std::ops::Range<StringId> {
        0..self.texts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StringId, &str)> {
        self.texts.iter().enumerate().map(|(id, t)| (id, t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_deduplicates_and_counts() {
        let mut pool = StringPool::new();
        pool.add(["Acme Inc", "Acme Inc", "Acme Corp"]);
        pool.add(["Acme Inc"]);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.count_of_str("Acme Inc"), 3);
        assert_eq!(pool.count_of_str("Acme Corp"), 1);
    }

    #[test]
    fn test_ids_assigned_in_first_seen_order() {
        let mut pool = StringPool::new();
        pool.add(["b", "a", "c", "a"]);

        assert_eq!(pool.id_of("b"), Some(0));
        assert_eq!(pool.id_of("a"), Some(1));
        assert_eq!(pool.id_of("c"), Some(2));
        assert_eq!(pool.text_of(1), "a");
    }

    #[test]
    fn test_intern_does_not_count_an_occurrence() {
        let mut pool = StringPool::new();
        let id = pool.intern("Seed Org");
        assert_eq!(pool.count_of(id), 0);

        pool.add(["Seed Org"]);
        assert_eq!(pool.count_of(id), 1);

        // Interning an existing string neither duplicates nor counts.
        assert_eq!(pool.intern("Seed Org"), id);
        assert_eq!(pool.count_of(id), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_duplicates_are_byte_identical_only() {
        let mut pool = StringPool::new();
        pool.add(["Acme Inc", "acme inc", "Acme Inc "]);
        assert_eq!(pool.len(), 3);
    }
}
