//! One bounded level of the plan cache

use crate::compiler::PlanHandle;
use ahash::RandomState;
use lru::LruCache;
use query_core::{TypeSignature, Value};
use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Key of the parameterized level: canonical text plus slot types.
pub type ParamKey = (String, TypeSignature);

/// Entry stored in either level
#[derive(Debug, Clone)]
pub struct CachedPlan {
    /// The compiled plan
    pub plan: PlanHandle,
    /// Constants to bind when the entry is reused; empty in the parameterized level
    pub constants: Vec<Value>,
    /// Sequence number of the last resolution that hit or inserted this entry
    pub last_used: u64,
    /// Sequence number at insertion
    pub inserted: u64,
}

impl CachedPlan {
    pub fn new(plan: PlanHandle, constants: Vec<Value>, sequence: u64) -> Self {
        Self {
            plan,
            constants,
            last_used: sequence,
            inserted: sequence,
        }
    }

    pub fn signature(&self) -> &TypeSignature {
        self.plan.signature()
    }
}

/// What happened to an insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission<K> {
    Inserted,
    /// The key was already present and its entry was replaced
    Replaced,
    /// Inserted after evicting the least recently used key
    Evicted(K),
    /// The level has zero capacity
    Rejected,
}

/// Bounded least-recently-used map from a key to a cached plan.
///
/// Eviction order is owned entirely by this type; swapping the policy means
/// replacing this module only.
pub struct PlanLevel<K: Hash + Eq> {
    entries: Option<LruCache<K, CachedPlan, RandomState>>,
    capacity: usize,
}

impl<K: Hash + Eq> PlanLevel<K> {
    pub fn new(capacity: usize) -> Self {
        let entries =
            NonZeroUsize::new(capacity).map(|cap| LruCache::with_hasher(cap, RandomState::new()));
        Self { entries, capacity }
    }

    /// Look up `key`, marking it most recently used.
    pub fn get<Q>(&mut self, key: &Q, sequence: u64) -> Option<&CachedPlan>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entries.as_mut()?.get_mut(key)?;
        entry.last_used = sequence;
        Some(&*entry)
    }

    /// Look up `key` without touching recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&CachedPlan>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.as_ref()?.peek(key)
    }

    pub fn insert(&mut self, key: K, plan: CachedPlan) -> Admission<K> {
        let Some(entries) = self.entries.as_mut() else {
            return Admission::Rejected;
        };

        match entries.push(key, plan) {
            None => Admission::Inserted,
            // `push` hands back the old entry on replacement, so the key is still live.
            Some((old_key, _)) if entries.contains(&old_key) => Admission::Replaced,
            Some((evicted, _)) => Admission::Evicted(evicted),
        }
    }

    /// Remove every entry, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        match self.entries.as_mut() {
            Some(entries) => {
                let count = entries.len();
                entries.clear();
                count
            }
            None => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&K> {
        self.entries
            .as_ref()
            .map(|e| e.iter().map(|(k, _)| k).collect())
            .unwrap_or_default()
    }
}

impl<K: Hash + Eq> std::fmt::Debug for PlanLevel<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanLevel")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompiledPlan;
    use std::sync::Arc;

    fn plan(sql: &str) -> CachedPlan {
        let compiled = CompiledPlan::new(sql, TypeSignature::empty(), "");
        CachedPlan::new(Arc::new(compiled), Vec::new(), 0)
    }

    #[test]
    fn test_insert_and_get() {
        let mut level: PlanLevel<String> = PlanLevel::new(4);
        assert_eq!(level.insert("a".into(), plan("a")), Admission::Inserted);

        let entry = level.get("a", 7).unwrap();
        assert_eq!(entry.plan.canonical(), "a");
        assert_eq!(entry.last_used, 7);
        assert_eq!(entry.inserted, 0);
        assert_eq!(level.len(), 1);
    }

    #[test]
    fn test_lru_eviction_respects_recency() {
        let mut level: PlanLevel<String> = PlanLevel::new(2);
        level.insert("a".into(), plan("a"));
        level.insert("b".into(), plan("b"));

        // Touch "a" so "b" becomes the victim.
        assert!(level.get("a", 1).is_some());
        assert_eq!(
            level.insert("c".into(), plan("c")),
            Admission::Evicted("b".to_string())
        );
        assert!(level.peek("b").is_none());
        assert_eq!(level.len(), 2);
        assert_eq!(level.keys(), vec!["c", "a"]);
    }

    #[test]
    fn test_replace_is_not_eviction() {
        let mut level: PlanLevel<String> = PlanLevel::new(2);
        level.insert("a".into(), plan("a"));
        assert_eq!(level.insert("a".into(), plan("a2")), Admission::Replaced);
        assert_eq!(level.len(), 1);
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let mut level: PlanLevel<String> = PlanLevel::new(0);
        assert_eq!(level.insert("a".into(), plan("a")), Admission::Rejected);
        assert!(level.get("a", 1).is_none());
        assert!(level.is_empty());
        assert_eq!(level.clear(), 0);
    }

    #[test]
    fn test_parameterized_key_distinguishes_signature() {
        use query_core::ParamType;

        let mut level: PlanLevel<ParamKey> = PlanLevel::new(4);
        let int_key = ("Q ?".to_string(), TypeSignature::new(vec![ParamType::Integer]));
        let dec_key = ("Q ?".to_string(), TypeSignature::new(vec![ParamType::Decimal]));

        level.insert(int_key.clone(), plan("Q ?"));
        assert!(level.peek(&int_key).is_some());
        assert!(level.peek(&dec_key).is_none());
    }

    #[test]
    fn test_clear() {
        let mut level: PlanLevel<String> = PlanLevel::new(4);
        level.insert("a".into(), plan("a"));
        level.insert("b".into(), plan("b"));
        assert_eq!(level.clear(), 2);
        assert!(level.is_empty());
    }
}
