//! Mock store implementations for testing failure paths.
//!
//! [`FailingStore`] delegates to an in-memory store and fails chosen
//! operations on demand, so tests can check that ephemeral keys are torn
//! down when a store call fails midway through a query.

use async_trait::async_trait;
use leaders_domain::SortOrder;
use leaders_infrastructure::{
    Error, InMemoryOrderedSetStore, OrderedSetStore, Result, ScoredMember, StoreHealthStatus,
};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    AddOrUpdateScore,
    IncrementScore,
    RangeByRank,
    Rank,
    Cardinality,
    IntersectInto,
    Expire,
    Delete,
    AddMembers,
    HealthCheck,
}

/// In-memory store with per-operation fault injection and a call log.
pub struct FailingStore {
    inner: Arc<InMemoryOrderedSetStore>,
    failing: RwLock<HashSet<StoreOp>>,
    calls: RwLock<Vec<StoreOp>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::wrapping(Arc::new(InMemoryOrderedSetStore::new()))
    }

    pub fn wrapping(inner: Arc<InMemoryOrderedSetStore>) -> Self {
        Self {
            inner,
            failing: RwLock::new(HashSet::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Make every subsequent call of `op` fail.
    pub fn fail_on(&self, op: StoreOp) {
        self.failing.write().insert(op);
    }

    /// Stop failing `op`.
    pub fn recover(&self, op: StoreOp) {
        self.failing.write().remove(&op);
    }

    /// The wrapped store, for inspecting keys and TTLs.
    pub fn inner(&self) -> &InMemoryOrderedSetStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<StoreOp> {
        self.calls.read().clone()
    }

    pub fn call_count(&self, op: StoreOp) -> usize {
        self.calls.read().iter().filter(|call| **call == op).count()
    }

    fn enter(&self, op: StoreOp) -> Result<()> {
        self.calls.write().push(op);
        if self.failing.read().contains(&op) {
            return Err(Error::Connection(format!("injected failure on {:?}", op)));
        }
        Ok(())
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderedSetStore for FailingStore {
    async fn add_or_update_score(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.enter(StoreOp::AddOrUpdateScore)?;
        self.inner.add_or_update_score(key, member, score).await
    }

    async fn increment_score(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        self.enter(StoreOp::IncrementScore)?;
        self.inner.increment_score(key, member, delta).await
    }

    async fn range_by_rank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        order: SortOrder,
    ) -> Result<Vec<ScoredMember>> {
        self.enter(StoreOp::RangeByRank)?;
        self.inner.range_by_rank(key, start, stop, order).await
    }

    async fn rank(&self, key: &str, member: &str, order: SortOrder) -> Result<Option<u64>> {
        self.enter(StoreOp::Rank)?;
        self.inner.rank(key, member, order).await
    }

    async fn cardinality(&self, key: &str) -> Result<u64> {
        self.enter(StoreOp::Cardinality)?;
        self.inner.cardinality(key).await
    }

    async fn intersect_into(&self, dest: &str, keys: &[&str]) -> Result<u64> {
        self.enter(StoreOp::IntersectInto)?;
        self.inner.intersect_into(dest, keys).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.enter(StoreOp::Expire)?;
        self.inner.expire(key, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.enter(StoreOp::Delete)?;
        self.inner.delete(key).await
    }

    async fn add_members(&self, key: &str, members: &[String], score: f64) -> Result<()> {
        self.enter(StoreOp::AddMembers)?;
        self.inner.add_members(key, members, score).await
    }

    async fn health_check(&self) -> Result<StoreHealthStatus> {
        self.enter(StoreOp::HealthCheck)?;
        self.inner.health_check().await
    }
}
