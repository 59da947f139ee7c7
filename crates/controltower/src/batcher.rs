//! Concurrency batcher - chains operations so at most `limit` run at once
//!
//! Control Tower accepts a limited number of concurrent control operations per
//! account. The orchestrator runs independent resources in parallel, so the
//! operations are cut into contiguous chunks and each chunk is linked into a
//! `DependsOn` chain. Chunks run in parallel; members of a chunk run one after
//! another. With `k = ceil(n / limit)` and chunks of at most `k` items there
//! are at most `limit` chunks, so at most `limit` calls are in flight.

use crate::enabler::EnableOperation;
use crate::error::{Error, Result};
use crate::plan::{DeploymentPlan, PlannedControl};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Concurrent control operations Control Tower allows per account.
pub const CONTROL_TOWER_CONCURRENCY_LIMIT: usize = 10;

/// How operations are cut into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Consecutive runs of `k` items; the last chunk takes the remainder
    #[default]
    Stride,
    /// Same chunk count as `Stride`, sizes differ by at most one
    Balanced,
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stride => write!(f, "stride"),
            Self::Balanced => write!(f, "balanced"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyBatcher {
    limit: usize,
    strategy: ChunkStrategy,
}

impl ConcurrencyBatcher {
    pub fn new(limit: usize, strategy: ChunkStrategy) -> Result<Self> {
        if limit == 0 {
            return Err(Error::ZeroConcurrency);
        }
        Ok(Self { limit, strategy })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn strategy(&self) -> ChunkStrategy {
        self.strategy
    }

    /// Maximum chunk length `k = ceil(n / limit)`; zero for an empty list
    pub fn chunk_len(&self, n: usize) -> usize {
        n.div_ceil(self.limit)
    }

    /// Contiguous index ranges covering `0..n` in order
    pub fn ranges(&self, n: usize) -> Vec<Range<usize>> {
        let k = self.chunk_len(n);
        if k == 0 {
            return Vec::new();
        }

        match self.strategy {
            ChunkStrategy::Stride => (0..n)
                .step_by(k)
                .map(|start| start..(start + k).min(n))
                .collect(),
            ChunkStrategy::Balanced => {
                let count = n.div_ceil(k);
                let base = n / count;
                let extra = n % count;
                let mut start = 0;
                (0..count)
                    .map(|i| {
                        let len = base + usize::from(i < extra);
                        let range = start..start + len;
                        start += len;
                        range
                    })
                    .collect()
            }
        }
    }

    /// Split items into chunks, preserving order
    pub fn chunks<T>(&self, items: Vec<T>) -> Vec<Vec<T>> {
        let ranges = self.ranges(items.len());
        let mut items = items.into_iter();
        ranges
            .iter()
            .map(|range| items.by_ref().take(range.len()).collect())
            .collect()
    }

    /// Chain operations into a deployment plan.
    ///
    /// Each operation depends on its predecessor within the same chunk; the
    /// first operation of a chunk has no dependency.
    pub fn plan(&self, operations: Vec<EnableOperation>) -> DeploymentPlan {
        let total = operations.len();
        let chunks = self.chunks(operations);
        log::debug!(
            "Chaining {total} operations into {} chains of at most {} ({})",
            chunks.len(),
            self.chunk_len(total),
            self.strategy
        );

        let mut resources = Vec::with_capacity(total);
        for (chain, chunk) in chunks.into_iter().enumerate() {
            let mut previous = None;
            for operation in chunk {
                let name = operation.resource_name();
                resources.push(PlannedControl {
                    name: name.clone(),
                    chain,
                    depends_on: previous.replace(name),
                    operation,
                });
            }
        }

        DeploymentPlan::new(resources, self.ranges(total))
    }
}

impl Default for ConcurrencyBatcher {
    fn default() -> Self {
        Self {
            limit: CONTROL_TOWER_CONCURRENCY_LIMIT,
            strategy: ChunkStrategy::Stride,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sizes(batcher: &ConcurrencyBatcher, n: usize) -> Vec<usize> {
        batcher.ranges(n).iter().map(ExactSizeIterator::len).collect()
    }

    fn operations(n: usize) -> Vec<EnableOperation> {
        (0..n)
            .map(|i| EnableOperation {
                control_id: format!("control{i}"),
                ou_id: "ou-1111-11111111".to_string(),
                target_arn: "arn:aws:organizations::111111111111:ou/o-x/ou-1111-11111111"
                    .to_string(),
                parameters: BTreeMap::new(),
                tags: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(
            ConcurrencyBatcher::new(0, ChunkStrategy::Stride),
            Err(Error::ZeroConcurrency)
        ));
    }

    #[test]
    fn test_chunk_len() {
        let batcher = ConcurrencyBatcher::default();
        assert_eq!(batcher.chunk_len(0), 0);
        assert_eq!(batcher.chunk_len(1), 1);
        assert_eq!(batcher.chunk_len(10), 1);
        assert_eq!(batcher.chunk_len(11), 2);
        assert_eq!(batcher.chunk_len(100), 10);
        assert_eq!(batcher.chunk_len(101), 11);
    }

    #[test]
    fn test_eleven_operations_stride() {
        let batcher = ConcurrencyBatcher::default();
        assert_eq!(sizes(&batcher, 11), vec![2, 2, 2, 2, 2, 1]);
    }

    #[test]
    fn test_empty_is_noop() {
        let batcher = ConcurrencyBatcher::default();
        assert!(batcher.ranges(0).is_empty());
        assert!(batcher.chunks(Vec::<u8>::new()).is_empty());
        let plan = batcher.plan(Vec::new());
        assert!(plan.is_empty());
        assert_eq!(plan.chain_count(), 0);
    }

    #[test]
    fn test_stride_invariants_for_all_sizes() {
        for limit in [1, 3, 10] {
            let batcher = ConcurrencyBatcher::new(limit, ChunkStrategy::Stride).unwrap();
            for n in 0..=250 {
                let k = batcher.chunk_len(n);
                let items: Vec<usize> = (0..n).collect();
                let chunks = batcher.chunks(items.clone());

                assert_eq!(chunks.is_empty(), n == 0, "n={n}");
                assert!(chunks.len() <= limit, "n={n} limit={limit}");
                assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= k), "n={n}");
                assert_eq!(chunks.concat(), items, "n={n}");
            }
        }
    }

    #[test]
    fn test_stride_only_last_chunk_short() {
        let batcher = ConcurrencyBatcher::default();
        for n in 1..=200 {
            let s = sizes(&batcher, n);
            let k = batcher.chunk_len(n);
            assert!(s[..s.len() - 1].iter().all(|&len| len == k), "n={n}");
        }
    }

    #[test]
    fn test_balanced_invariants_for_all_sizes() {
        let stride = ConcurrencyBatcher::default();
        let balanced = ConcurrencyBatcher::new(10, ChunkStrategy::Balanced).unwrap();
        for n in 0..=250 {
            let s = sizes(&balanced, n);
            let k = balanced.chunk_len(n);
            assert_eq!(s.len(), stride.ranges(n).len(), "n={n}");
            assert_eq!(s.iter().sum::<usize>(), n);
            if let (Some(max), Some(min)) = (s.iter().max(), s.iter().min()) {
                assert!(max - min <= 1, "n={n} sizes={s:?}");
                assert!(*max <= k);
                assert!(*min > 0);
            }

            let items: Vec<usize> = (0..n).collect();
            assert_eq!(balanced.chunks(items.clone()).concat(), items);
        }
    }

    #[test]
    fn test_balanced_evens_out_remainder() {
        let balanced = ConcurrencyBatcher::new(10, ChunkStrategy::Balanced).unwrap();
        // stride would give nine chunks of 10 and one of 1
        assert_eq!(sizes(&balanced, 91), vec![10, 9, 9, 9, 9, 9, 9, 9, 9, 9]);
    }

    #[test]
    fn test_plan_links_chains() {
        let batcher = ConcurrencyBatcher::default();
        let plan = batcher.plan(operations(11));

        assert_eq!(plan.len(), 11);
        assert_eq!(plan.chain_count(), 6);
        for range in plan.chains() {
            let chain = &plan.resources()[range.clone()];
            assert!(chain[0].depends_on.is_none());
            for pair in chain.windows(2) {
                assert_eq!(pair[1].depends_on.as_ref(), Some(&pair[0].name));
                assert_eq!(pair[0].chain, pair[1].chain);
            }
        }
    }

    #[test]
    fn test_plan_preserves_order() {
        let ops = operations(23);
        let expected: Vec<_> = ops.iter().map(|o| o.control_id.clone()).collect();
        let plan = ConcurrencyBatcher::default().plan(ops);
        let actual: Vec<_> = plan
            .resources()
            .iter()
            .map(|r| r.operation.control_id.clone())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_plan_roots_bound_concurrency() {
        let plan = ConcurrencyBatcher::default().plan(operations(137));
        let roots = plan
            .resources()
            .iter()
            .filter(|r| r.depends_on.is_none())
            .count();
        assert_eq!(roots, plan.chain_count());
        assert!(roots <= CONTROL_TOWER_CONCURRENCY_LIMIT);
    }
}
