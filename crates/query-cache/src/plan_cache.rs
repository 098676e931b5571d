//! Two-level ad-hoc plan cache
//!
//! The literal level maps exact statement text to a plan and is only used
//! for statements without user `?` markers. The parameterized level maps
//! `(canonical text, type signature)` to a plan and serves both statements
//! whose constants were lifted out and statements with user markers.
//!
//! A `PlanCache` is owned by exactly one worker and is never shared, so
//! resolution takes `&mut self` and needs no locking.

use crate::compiler::{PlanCompiler, PlanHandle};
use crate::config::CacheConfig;
use crate::level::{Admission, CachedPlan, ParamKey, PlanLevel};
use crate::stats::CacheStatistics;
use query_core::{CompileError, ParamArityError, ResolveError, Result, TypeSignature, Value};
use query_parser::{bind, parameterize, split, terminated_before, BoundArgs, Statement};
use std::sync::Arc;
use std::time::Instant;

/// How a statement was served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Exact text found in the literal level
    Hit1,
    /// Parameterized hit; the exact text was added to the literal level
    Hit2AddL1,
    /// Compiled and added to both levels
    Miss2AddL1,
    /// Parameterized hit for a statement with user markers
    Hit2,
    /// Compiled and added to the parameterized level only
    Miss2,
    /// Part of a multi-statement batch: compiled without touching the cache
    Skipped,
}

impl Classification {
    pub fn is_hit(&self) -> bool {
        matches!(
            self,
            Classification::Hit1 | Classification::Hit2AddL1 | Classification::Hit2
        )
    }
}

/// A statement resolved to a plan
#[derive(Debug, Clone)]
pub struct ResolvedStatement {
    pub plan: PlanHandle,
    /// Values for the plan's parameter slots: user arguments or lifted constants
    pub args: BoundArgs,
    pub classification: Classification,
}

pub struct PlanCache {
    literal: PlanLevel<String>,
    parameterized: PlanLevel<ParamKey>,
    stats: CacheStatistics,
    /// Bumped on every hit or insert; recorded on entries as their recency
    sequence: u64,
    config: CacheConfig,
}

impl PlanCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            literal: PlanLevel::new(config.literal_capacity),
            parameterized: PlanLevel::new(config.parameterized_capacity),
            stats: CacheStatistics::new(),
            sequence: 0,
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Resolve a raw batch to one plan per statement.
    ///
    /// A single statement goes through [`PlanCache::resolve`]. A batch of two
    /// or more statements is never looked up or inserted and leaves every
    /// counter untouched; each piece is compiled directly and binds its own
    /// share of `args` in order. A piece whose share does not fit its
    /// markers fails to compile; it is never an arity error.
    pub fn resolve_batch(
        &mut self,
        batch: &str,
        args: &[Value],
        compiler: &dyn PlanCompiler,
    ) -> Result<Vec<ResolvedStatement>> {
        let batch_text = batch;
        let batch = match split(batch_text) {
            Ok(batch) => batch,
            Err(e) => {
                // Only a batch that can still be a single statement is counted.
                if terminated_before(batch_text, e.offset()) == 0 {
                    self.stats.record_failure();
                }
                return Err(e.into());
            }
        };

        if !batch.multi_statement {
            return match batch.statements.first() {
                Some(stmt) => Ok(vec![self.resolve(stmt, args, compiler)?]),
                None => Ok(Vec::new()),
            };
        }

        tracing::debug!(
            "Skipping plan cache for {}-statement batch",
            batch.statements.len()
        );

        let mut remaining = args;
        let mut resolved = Vec::with_capacity(batch.statements.len());
        for stmt in &batch.statements {
            let take = stmt.param_count().min(remaining.len());
            let (own, rest) = remaining.split_at(take);
            remaining = rest;
            resolved.push(compile_uncached(stmt, own, compiler)?);
        }

        if !remaining.is_empty() {
            return Err(CompileError::new(format!(
                "{} arguments left over after binding every statement of the batch",
                remaining.len()
            ))
            .into());
        }
        Ok(resolved)
    }

    /// Resolve one statement through the cache, updating statistics.
    pub fn resolve(
        &mut self,
        stmt: &Statement,
        args: &[Value],
        compiler: &dyn PlanCompiler,
    ) -> Result<ResolvedStatement> {
        if stmt.has_user_params() {
            self.resolve_user_params(stmt, args, compiler)
        } else {
            self.resolve_literal(stmt, args, compiler)
        }
    }

    fn resolve_literal(
        &mut self,
        stmt: &Statement,
        args: &[Value],
        compiler: &dyn PlanCompiler,
    ) -> Result<ResolvedStatement> {
        if !args.is_empty() {
            self.stats.record_failure();
            return Err(ParamArityError {
                expected: 0,
                actual: args.len(),
            }
            .into());
        }

        let seq = self.next_sequence();
        if let Some(entry) = self.literal.get(stmt.text(), seq) {
            let resolved = ResolvedStatement {
                plan: Arc::clone(&entry.plan),
                args: BoundArgs::from(entry.constants.clone()),
                classification: Classification::Hit1,
            };
            self.stats.record_hit1();
            tracing::debug!("Plan cache HIT1: {}", stmt.text());
            return Ok(resolved);
        }

        let parameterized = parameterize(stmt);
        let key = (parameterized.canonical, parameterized.signature);

        if let Some(entry) = self.parameterized.get(&key, seq) {
            let plan = Arc::clone(&entry.plan);
            self.stats.record_hit2();
            self.admit_literal(stmt, &plan, &parameterized.constants, seq);
            tracing::debug!("Plan cache HIT2, added to L1: {}", stmt.text());
            return Ok(ResolvedStatement {
                plan,
                args: BoundArgs::from(parameterized.constants),
                classification: Classification::Hit2AddL1,
            });
        }

        let plan = self.compile(&key.0, &key.1, compiler)?;
        self.admit_parameterized(key, &plan, seq);
        self.admit_literal(stmt, &plan, &parameterized.constants, seq);
        tracing::debug!("Plan cache MISS, added to L1 and L2: {}", stmt.text());

        Ok(ResolvedStatement {
            plan,
            args: BoundArgs::from(parameterized.constants),
            classification: Classification::Miss2AddL1,
        })
    }

    fn resolve_user_params(
        &mut self,
        stmt: &Statement,
        args: &[Value],
        compiler: &dyn PlanCompiler,
    ) -> Result<ResolvedStatement> {
        let bound = match bind(stmt, args) {
            Ok(bound) => bound,
            Err(e) => {
                self.stats.record_failure();
                tracing::debug!("Plan cache arity failure: {} ({})", stmt.text(), e);
                return Err(e.into());
            }
        };

        let seq = self.next_sequence();
        let key = (stmt.text().to_string(), bound.signature());

        if let Some(entry) = self.parameterized.get(&key, seq) {
            let plan = Arc::clone(&entry.plan);
            self.stats.record_hit2();
            tracing::debug!("Plan cache HIT2: {} {}", key.0, key.1);
            return Ok(ResolvedStatement {
                plan,
                args: bound,
                classification: Classification::Hit2,
            });
        }

        let plan = self.compile(&key.0, &key.1, compiler)?;
        tracing::debug!("Plan cache MISS, added to L2: {} {}", key.0, key.1);
        self.admit_parameterized(key, &plan, seq);

        Ok(ResolvedStatement {
            plan,
            args: bound,
            classification: Classification::Miss2,
        })
    }

    /// Compile on a miss. Success and failure both count as one miss.
    fn compile(
        &mut self,
        canonical: &str,
        signature: &TypeSignature,
        compiler: &dyn PlanCompiler,
    ) -> Result<PlanHandle> {
        let start = Instant::now();
        match compiler.compile(canonical, signature) {
            Ok(plan) => {
                self.stats.record_miss();
                self.stats.record_plan_time(start.elapsed());
                Ok(Arc::new(plan))
            }
            Err(e) => {
                self.stats.record_failure();
                tracing::warn!("Failed to plan '{}': {}", canonical, e);
                Err(ResolveError::Compile(e))
            }
        }
    }

    fn admit_literal(&mut self, stmt: &Statement, plan: &PlanHandle, constants: &[Value], seq: u64) {
        let entry = CachedPlan::new(Arc::clone(plan), constants.to_vec(), seq);
        if let Admission::Evicted(victim) = self.literal.insert(stmt.text().to_string(), entry) {
            self.stats.record_eviction1();
            tracing::debug!("Evicted from L1: {}", victim);
        }
        self.sync_levels();
    }

    fn admit_parameterized(&mut self, key: ParamKey, plan: &PlanHandle, seq: u64) {
        let entry = CachedPlan::new(Arc::clone(plan), Vec::new(), seq);
        if let Admission::Evicted((text, sig)) = self.parameterized.insert(key, entry) {
            self.stats.record_eviction2();
            tracing::debug!("Evicted from L2: {} {}", text, sig);
        }
        self.sync_levels();
    }

    fn sync_levels(&mut self) {
        self.stats
            .set_levels(self.literal.len(), self.parameterized.len());
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Drop every entry of both levels. Cumulative counters are kept.
    pub fn invalidate_all(&mut self) {
        let dropped1 = self.literal.clear();
        let dropped2 = self.parameterized.clear();
        self.sync_levels();
        tracing::info!(
            "Invalidated plan cache: {} literal and {} parameterized entries dropped",
            dropped1,
            dropped2
        );
    }

    /// Copy of the current counters
    pub fn statistics(&self) -> CacheStatistics {
        self.stats.clone()
    }

    /// Whether `text` is cached in the literal level. Does not touch recency.
    pub fn is_cached_literal(&self, text: &str) -> bool {
        self.literal.peek(text).is_some()
    }

    /// Whether the parameterized level holds `(canonical, signature)`. Does not touch recency.
    pub fn contains_parameterized(&self, canonical: &str, signature: &TypeSignature) -> bool {
        self.parameterized
            .peek(&(canonical.to_string(), signature.clone()))
            .is_some()
    }

    pub fn literal_len(&self) -> usize {
        self.literal.len()
    }

    pub fn parameterized_len(&self) -> usize {
        self.parameterized.len()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCache")
            .field("literal", &self.literal)
            .field("parameterized", &self.parameterized)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Compile one statement of a multi-statement batch, bypassing the cache.
fn compile_uncached(
    stmt: &Statement,
    args: &[Value],
    compiler: &dyn PlanCompiler,
) -> Result<ResolvedStatement> {
    let (canonical, signature, args) = if stmt.has_user_params() {
        let bound = bind(stmt, args).map_err(|e| CompileError::new(e.to_string()))?;
        (stmt.text().to_string(), bound.signature(), bound)
    } else {
        let p = parameterize(stmt);
        (p.canonical, p.signature, BoundArgs::from(p.constants))
    };

    let plan = compiler.compile(&canonical, &signature)?;
    Ok(ResolvedStatement {
        plan: Arc::new(plan),
        args,
        classification: Classification::Skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompiledPlan;
    use query_core::{CompileError, ParamType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Compiler that counts calls and rejects statements mentioning `MISSING`.
    #[derive(Default)]
    struct CountingCompiler {
        calls: AtomicUsize,
    }

    impl CountingCompiler {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PlanCompiler for CountingCompiler {
        fn compile(
            &self,
            canonical: &str,
            signature: &TypeSignature,
        ) -> std::result::Result<CompiledPlan, CompileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if canonical.contains("MISSING") {
                return Err(CompileError::new("object not found: MISSING"));
            }
            Ok(CompiledPlan::new(canonical, signature.clone(), "SCAN"))
        }
    }

    fn counters(cache: &PlanCache) -> (u64, u64, u64, u64, u64) {
        let s = cache.statistics();
        (s.level1(), s.level2(), s.hits1(), s.hits2(), s.misses())
    }

    fn resolve_one(
        cache: &mut PlanCache,
        sql: &str,
        args: &[Value],
        compiler: &CountingCompiler,
    ) -> Result<ResolvedStatement> {
        let mut resolved = cache.resolve_batch(sql, args, compiler)?;
        assert_eq!(resolved.len(), 1);
        Ok(resolved.remove(0))
    }

    #[test]
    fn test_literal_statement_repeat_hits_l1() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();
        let sql = "SELECT ID FROM R1 WHERE ID > 1;";

        let first = resolve_one(&mut cache, sql, &[], &compiler).unwrap();
        assert_eq!(first.classification, Classification::Miss2AddL1);
        assert_eq!(counters(&cache), (1, 1, 0, 0, 1));

        let second = resolve_one(&mut cache, sql, &[], &compiler).unwrap();
        assert_eq!(second.classification, Classification::Hit1);
        assert_eq!(counters(&cache), (1, 1, 1, 0, 1));
        assert_eq!(second.args.get(0), Some(&Value::Integer(1)));
        assert_eq!(compiler.calls(), 1);
    }

    #[test]
    fn test_new_constant_hits_l2_and_adds_l1() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        resolve_one(&mut cache, "SELECT ID FROM R1 WHERE ID > 1", &[], &compiler).unwrap();
        let r = resolve_one(&mut cache, "SELECT ID FROM R1 WHERE ID > 2", &[], &compiler).unwrap();

        assert_eq!(r.classification, Classification::Hit2AddL1);
        assert_eq!(r.args.get(0), Some(&Value::Integer(2)));
        assert_eq!(counters(&cache), (2, 1, 0, 1, 1));
        assert_eq!(compiler.calls(), 1);
    }

    #[test]
    fn test_user_params_use_l2_only() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();
        let sql = "SELECT ID FROM R1 WHERE ID > ?;";

        let first = resolve_one(&mut cache, sql, &[Value::Integer(1)], &compiler).unwrap();
        assert_eq!(first.classification, Classification::Miss2);
        assert_eq!(counters(&cache), (0, 1, 0, 0, 1));

        let second = resolve_one(&mut cache, sql, &[Value::Integer(2)], &compiler).unwrap();
        assert_eq!(second.classification, Classification::Hit2);
        assert_eq!(counters(&cache), (0, 1, 0, 1, 1));
        assert!(!cache.is_cached_literal("SELECT ID FROM R1 WHERE ID > ?"));
    }

    #[test]
    fn test_argument_type_sensitivity() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();
        let sql = "SELECT ID FROM R1 WHERE ID > ?";

        resolve_one(&mut cache, sql, &[Value::Integer(1)], &compiler).unwrap();
        resolve_one(&mut cache, sql, &[Value::decimal("1")], &compiler).unwrap();

        assert_eq!(counters(&cache), (0, 2, 0, 0, 2));
        assert!(cache.contains_parameterized(sql, &TypeSignature::new(vec![ParamType::Decimal])));
    }

    #[test]
    fn test_lexical_sensitivity() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        resolve_one(&mut cache, "SELECT ID FROM R1 WHERE ID > 1", &[], &compiler).unwrap();
        resolve_one(&mut cache, "SELECT ID FROM R1 WHERE ID > 1.0", &[], &compiler).unwrap();

        assert_eq!(counters(&cache), (2, 2, 0, 0, 2));
    }

    #[test]
    fn test_alias_is_a_new_pattern() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        resolve_one(&mut cache, "SELECT ID FROM R1 WHERE ID > 1;", &[], &compiler).unwrap();
        resolve_one(&mut cache, "SELECT ID FROM R1 WHERE ID > 1;", &[], &compiler).unwrap();
        resolve_one(&mut cache, "SELECT A.ID FROM R1 A WHERE A.ID > 1;", &[], &compiler).unwrap();

        let s = cache.statistics();
        assert_eq!((s.level1(), s.level2()), (2, 2));
    }

    #[test]
    fn test_arity_mismatch_short_circuits() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        resolve_one(&mut cache, "SELECT * FROM T WHERE A = 1", &[], &compiler).unwrap();
        let before = counters(&cache);

        let err = resolve_one(
            &mut cache,
            "SELECT * FROM T WHERE A = ? AND B = ?",
            &[Value::Integer(1)],
            &compiler,
        )
        .unwrap_err();

        assert!(err.is_arity());
        let after = counters(&cache);
        assert_eq!(after.4, before.4 + 1);
        assert_eq!((after.0, after.1, after.2, after.3), (before.0, before.1, before.2, before.3));
        assert_eq!(cache.statistics().failures(), 1);
        assert_eq!(compiler.calls(), 1);
    }

    #[test]
    fn test_args_on_statement_without_markers() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        let err = resolve_one(&mut cache, "SELECT * FROM T", &[Value::Integer(1)], &compiler)
            .unwrap_err();
        assert!(err.is_arity());
        assert_eq!(counters(&cache), (0, 0, 0, 0, 1));
    }

    #[test]
    fn test_multi_statement_batch_is_skipped() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        resolve_one(&mut cache, "SELECT ID FROM R1 WHERE ID > 1", &[], &compiler).unwrap();
        let before = cache.statistics();

        let resolved = cache
            .resolve_batch(
                "SELECT ID FROM R1 WHERE ID > 1;SELECT ID FROM R1 WHERE ID > 1;",
                &[],
                &compiler,
            )
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert!(resolved
            .iter()
            .all(|r| r.classification == Classification::Skipped));
        assert_eq!(cache.statistics(), before);
        assert_eq!(compiler.calls(), 3);
    }

    #[test]
    fn test_multi_statement_batch_splits_args() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        let resolved = cache
            .resolve_batch(
                "SELECT * FROM T WHERE A = ?; SELECT * FROM U WHERE B = ? AND C = ?",
                &[Value::Integer(1), Value::String("x".into()), Value::Integer(3)],
                &compiler,
            )
            .unwrap();

        assert_eq!(resolved[0].args.len(), 1);
        assert_eq!(resolved[1].args.get(0), Some(&Value::String("x".into())));
        assert_eq!(counters(&cache), (0, 0, 0, 0, 0));
    }

    #[test]
    fn test_multi_statement_wrong_arity_is_a_piece_compile_failure() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        let err = cache
            .resolve_batch("SELECT * FROM T WHERE A = ?; SELECT 1 FROM T", &[], &compiler)
            .unwrap_err();
        assert!(!err.is_arity());
        assert!(matches!(err, ResolveError::Compile(_)));
        assert_eq!(cache.statistics(), CacheStatistics::default());

        // Too many arguments: every piece binds, the leftover fails the batch.
        let err = cache
            .resolve_batch(
                "SELECT * FROM T WHERE A = ?; SELECT 1 FROM T",
                &[Value::Integer(1), Value::Integer(2)],
                &compiler,
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::Compile(_)));
        assert_eq!(cache.statistics(), CacheStatistics::default());
        assert_eq!(cache.literal_len() + cache.parameterized_len(), 0);
    }

    #[test]
    fn test_multi_statement_short_args_do_not_panic() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        let err = cache
            .resolve_batch(
                "SELECT * FROM T WHERE A = ? AND B = ?; SELECT * FROM U WHERE C = ?",
                &[Value::Integer(1)],
                &compiler,
            )
            .unwrap_err();
        assert!(err.to_string().contains("expected 2, passed 1"));
        assert_eq!(cache.statistics(), CacheStatistics::default());
    }

    #[test]
    fn test_compile_failure_counts_miss_without_insert() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        let err = resolve_one(&mut cache, "SELECT * FROM MISSING WHERE A = 1", &[], &compiler)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Compile(_)));
        assert_eq!(counters(&cache), (0, 0, 0, 0, 1));

        let err = resolve_one(
            &mut cache,
            "SELECT * FROM MISSING WHERE A = ?",
            &[Value::Integer(1)],
            &compiler,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::Compile(_)));
        assert_eq!(counters(&cache), (0, 0, 0, 0, 2));
        assert_eq!(cache.statistics().failures(), 2);
    }

    #[test]
    fn test_lru_eviction_in_parameterized_level() {
        let config = CacheConfig::default().with_parameterized_capacity(2);
        let mut cache = PlanCache::new(config);
        let compiler = CountingCompiler::default();
        let args = [Value::Integer(1)];

        for sql in [
            "SELECT * FROM P1 WHERE A = ?",
            "SELECT * FROM P2 WHERE A = ?",
            "SELECT * FROM P3 WHERE A = ?",
        ] {
            resolve_one(&mut cache, sql, &args, &compiler).unwrap();
        }

        let again = resolve_one(&mut cache, "SELECT * FROM P1 WHERE A = ?", &args, &compiler)
            .unwrap();
        assert_eq!(again.classification, Classification::Miss2);

        let s = cache.statistics();
        assert_eq!(s.level2(), 2);
        assert_eq!(s.misses(), 4);
        assert_eq!(s.hits2(), 0);
        assert_eq!(s.evictions2(), 2);
    }

    #[test]
    fn test_recently_hit_entry_survives_eviction() {
        let config = CacheConfig::default().with_parameterized_capacity(2);
        let mut cache = PlanCache::new(config);
        let compiler = CountingCompiler::default();
        let args = [Value::Integer(1)];

        resolve_one(&mut cache, "SELECT * FROM P1 WHERE A = ?", &args, &compiler).unwrap();
        resolve_one(&mut cache, "SELECT * FROM P2 WHERE A = ?", &args, &compiler).unwrap();
        resolve_one(&mut cache, "SELECT * FROM P1 WHERE A = ?", &args, &compiler).unwrap();
        resolve_one(&mut cache, "SELECT * FROM P3 WHERE A = ?", &args, &compiler).unwrap();

        let p1 = resolve_one(&mut cache, "SELECT * FROM P1 WHERE A = ?", &args, &compiler).unwrap();
        assert_eq!(p1.classification, Classification::Hit2);
    }

    #[test]
    fn test_zero_capacity_never_caches() {
        let mut cache = PlanCache::new(CacheConfig::disabled());
        let compiler = CountingCompiler::default();

        for _ in 0..3 {
            let r = resolve_one(&mut cache, "SELECT * FROM T WHERE A = 1", &[], &compiler).unwrap();
            assert_eq!(r.classification, Classification::Miss2AddL1);
        }

        assert_eq!(counters(&cache), (0, 0, 0, 0, 3));
        assert_eq!(compiler.calls(), 3);
    }

    #[test]
    fn test_literal_level_disabled_still_uses_l2() {
        let mut cache = PlanCache::new(CacheConfig::default().with_literal_capacity(0));
        let compiler = CountingCompiler::default();

        resolve_one(&mut cache, "SELECT * FROM T WHERE A = 1", &[], &compiler).unwrap();
        let r = resolve_one(&mut cache, "SELECT * FROM T WHERE A = 1", &[], &compiler).unwrap();

        assert_eq!(r.classification, Classification::Hit2AddL1);
        assert_eq!(counters(&cache), (0, 1, 0, 1, 1));
    }

    #[test]
    fn test_invalidate_all_keeps_cumulative_counters() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();
        let sql = "SELECT ID FROM R1 WHERE ID > 1";

        resolve_one(&mut cache, sql, &[], &compiler).unwrap();
        resolve_one(&mut cache, sql, &[], &compiler).unwrap();
        cache.invalidate_all();

        assert_eq!(counters(&cache), (0, 0, 1, 0, 1));

        let r = resolve_one(&mut cache, sql, &[], &compiler).unwrap();
        assert_eq!(r.classification, Classification::Miss2AddL1);
        assert_eq!(counters(&cache), (1, 1, 1, 0, 2));
    }

    #[test]
    fn test_scan_error_counts_as_failed_miss() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        let err = cache
            .resolve_batch("SELECT * FROM T WHERE A = 'open", &[], &compiler)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Scan(_)));
        assert_eq!(counters(&cache), (0, 0, 0, 0, 1));
        assert_eq!(compiler.calls(), 0);
    }

    #[test]
    fn test_scan_error_in_later_statement_leaves_counters() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        let err = cache
            .resolve_batch("SELECT 1 FROM T; SELECT 'oops FROM T", &[], &compiler)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Scan(_)));
        assert_eq!(cache.statistics(), CacheStatistics::default());

        // Empty pieces ahead of the failure still leave a single statement.
        cache
            .resolve_batch(" ; SELECT 'oops FROM T", &[], &compiler)
            .unwrap_err();
        assert_eq!(counters(&cache), (0, 0, 0, 0, 1));
    }

    #[test]
    fn test_empty_batch_resolves_nothing() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        assert!(cache.resolve_batch("  ;  ", &[], &compiler).unwrap().is_empty());
        assert_eq!(cache.statistics(), CacheStatistics::default());
    }

    #[test]
    fn test_quoted_marker_is_literal_path() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        resolve_one(&mut cache, "SELECT * FROM T WHERE A = '?'", &[], &compiler).unwrap();
        assert_eq!(counters(&cache), (1, 1, 0, 0, 1));
    }

    #[test]
    fn test_plan_time_recorded_on_success_only() {
        let mut cache = PlanCache::with_defaults();
        let compiler = CountingCompiler::default();

        resolve_one(&mut cache, "SELECT * FROM T WHERE A = 1", &[], &compiler).unwrap();
        let _ = resolve_one(&mut cache, "SELECT * FROM MISSING", &[], &compiler);

        assert_eq!(cache.statistics().plan_time().count(), 1);
    }
}
