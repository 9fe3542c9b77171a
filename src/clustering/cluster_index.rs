// src/clustering/cluster_index.rs - union-find partition of the string pool

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use petgraph::unionfind::UnionFind;

use crate::models::core::{ClusterId, StringId};
use crate::pool::StringPool;

/// Partition of the string pool into entity clusters.
///
/// Backed by petgraph's union-find. The arena is sized to the pool; when a
/// union brings in a string the pool has not seen, the arena is regrown by
/// replaying the union log, so the partition is always exactly the one the
/// recorded unions induce. Unions only merge clusters, never split them,
/// and the resulting partition does not depend on the order they are
/// applied in.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    pool: StringPool,
    arena: UnionFind<StringId>,
    capacity: usize,
    union_log: Vec<(StringId, StringId)>,
    pinned: HashSet<StringId>,
}

impl ClusterIndex {
    pub fn new(pool: StringPool) -> Self {
        let capacity = pool.len();
        ClusterIndex {
            pool,
            arena: UnionFind::new(capacity),
            capacity,
            union_log: Vec::new(),
            pinned: HashSet::new(),
        }
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    /// Add a string to the pool as a singleton cluster if it is not
    /// already present. Does not count an occurrence.
    pub fn intern(&mut self, s: &str) -> StringId {
        let id = self.pool.intern(s);
        self.ensure_capacity();
        id
    }

    fn ensure_capacity(&mut self) {
        if self.pool.len() <= self.capacity {
            return;
        }
        self.capacity = self.pool.len();
        let mut arena = UnionFind::new(self.capacity);
        for &(a, b) in &self.union_log {
            arena.union(a, b);
        }
        self.arena = arena;
    }

    /// Merge the clusters containing `a` and `b`. Unseen strings are added
    /// as singletons first. Returns false if the pair was already in the
    /// same cluster (uniting is idempotent).
    pub fn unite(&mut self, a: &str, b: &str) -> bool {
        let ia = self.intern(a);
        let ib = self.intern(b);
        self.unite_ids(ia, ib)
    }

    pub fn unite_ids(&mut self, a: StringId, b: StringId) -> bool {
        if self.arena.union(a, b) {
            self.union_log.push((a, b));
            true
        } else {
            false
        }
    }

    /// Unite an explicit list of pairs, returning the pairs that actually
    /// merged two clusters.
    pub fn unite_pairs<I, S>(&mut self, pairs: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut merged = Vec::new();
        for (a, b) in pairs {
            if self.unite(a.as_ref(), b.as_ref()) {
                merged.push((a.as_ref().to_string(), b.as_ref().to_string()));
            }
        }
        merged
    }

    /// Unite every string in a group with the group's first member.
    pub fn unite_group<I, S>(&mut self, group: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged = Vec::new();
        let mut first: Option<String> = None;
        for s in group {
            match &first {
                None => first = Some(s.as_ref().to_string()),
                Some(anchor) => {
                    if self.unite(anchor.as_str(), s.as_ref()) {
                        merged.push((anchor.clone(), s.as_ref().to_string()));
                    }
                }
            }
        }
        merged
    }

    /// Apply a key function across the whole pool and unite all strings
    /// that share a key. Strings whose key comes back empty are left
    /// alone; an empty key means the function erased the whole name and
    /// says nothing about identity.
    pub fn unite_by_key<F>(&mut self, key: F) -> Vec<(String, String)>
    where
        F: Fn(&str) -> String,
    {
        let mut groups: BTreeMap<String, Vec<StringId>> = BTreeMap::new();
        for id in self.pool.ids() {
            let k = key(self.pool.text_of(id));
            if k.is_empty() {
                continue;
            }
            groups.entry(k).or_default().push(id);
        }

        let mut merged = Vec::new();
        for ids in groups.values() {
            let anchor = ids[0];
            for &id in &ids[1..] {
                if self.unite_ids(anchor, id) {
                    merged.push((
                        self.pool.text_of(anchor).to_string(),
                        self.pool.text_of(id).to_string(),
                    ));
                }
            }
        }
        merged
    }

    pub fn find(&self, s: &str) -> Option<ClusterId> {
        self.pool.id_of(s).map(|id| self.arena.find(id))
    }

    pub fn find_id(&self, id: StringId) -> ClusterId {
        self.arena.find(id)
    }

    /// Whether two strings are currently in the same cluster. Strings the
    /// pool has never seen are in no cluster at all.
    pub fn equiv(&self, a: &str, b: &str) -> bool {
        match (self.pool.id_of(a), self.pool.id_of(b)) {
            (Some(ia), Some(ib)) => self.arena.equiv(ia, ib),
            _ => false,
        }
    }

    /// Mark a string as the preferred representative for its cluster.
    pub fn pin_label(&mut self, s: &str) {
        let id = self.intern(s);
        self.pinned.insert(id);
    }

    /// Current clusters, keyed by root id, members in id order.
    pub fn clusters(&self) -> BTreeMap<ClusterId, Vec<StringId>> {
        let mut clusters: BTreeMap<ClusterId, Vec<StringId>> = BTreeMap::new();
        for id in self.pool.ids() {
            clusters.entry(self.arena.find(id)).or_default().push(id);
        }
        clusters
    }

    pub fn cluster_count(&self) -> usize {
        let mut roots = HashSet::new();
        for id in self.pool.ids() {
            roots.insert(self.arena.find(id));
        }
        roots.len()
    }

    /// The canonical label for a cluster: a pinned member if any,
    /// otherwise the most frequent raw string, ties broken
    /// lexicographically.
    pub fn representative_label(&self, cluster: ClusterId) -> Option<&str> {
        let members: Vec<StringId> = self
            .pool
            .ids()
            .filter(|&id| self.arena.find(id) == cluster)
            .collect();
        self.label_of_members(&members)
    }

    fn label_of_members(&self, members: &[StringId]) -> Option<&str> {
        let pinned: Vec<StringId> = members
            .iter()
            .copied()
            .filter(|id| self.pinned.contains(id))
            .collect();
        let pick = |ids: &[StringId]| {
            ids.iter()
                .map(|&id| (Reverse(self.pool.count_of(id)), self.pool.text_of(id)))
                .min()
                .map(|(_, t)| t)
        };
        if pinned.is_empty() {
            pick(members)
        } else {
            pick(&pinned)
        }
    }

    /// Raw string -> canonical label for every pooled string.
    pub fn to_mapping(&self) -> BTreeMap<String, String> {
        let mut mapping = BTreeMap::new();
        for members in self.clusters().values() {
            let label = match self.label_of_members(members) {
                Some(label) => label.to_string(),
                None => continue,
            };
            for &id in members {
                mapping.insert(self.pool.text_of(id).to_string(), label.clone());
            }
        }
        mapping
    }
}
