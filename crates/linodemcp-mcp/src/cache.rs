//! Reference-data cache.
//!
//! Regions, instance types and kernels change rarely but are needed by many
//! tools (listing them, and validating instance creation). [`ReferenceCache`]
//! keeps the last fetched copy of each catalog for a fixed TTL.
//!
//! Each category lives in its own [`Slot`] behind its own `RwLock`, so the
//! three catalogs never block one another. Within a slot:
//!
//! 1. Fresh hits take the read lock only, so concurrent readers never serialize.
//! 2. A miss takes the write lock and re-checks freshness before fetching.
//!    Readers that queued behind the fetch find the new entry on the re-check,
//!    which coalesces a burst of misses into one upstream call.
//! 3. Upstream failures and cancellation leave the slot exactly as it was.
//!
//! Every read returns an owned copy of the stored sequence.

use linodemcp_client::{InstanceType, Kernel, ReferenceApi, Region, UpstreamError};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// TTL used when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// The cached catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheCategory {
    Regions,
    Types,
    Kernels,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 3] = [
        CacheCategory::Regions,
        CacheCategory::Types,
        CacheCategory::Kernels,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheCategory::Regions => "regions",
            CacheCategory::Types => "types",
            CacheCategory::Kernels => "kernels",
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regions" => Ok(CacheCategory::Regions),
            "types" => Ok(CacheCategory::Types),
            "kernels" => Ok(CacheCategory::Kernels),
            other => Err(format!(
                "unknown cache category '{other}' (expected regions, types or kernels)"
            )),
        }
    }
}

/// Errors surfaced by cache reads.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache TTL must be positive")]
    InvalidTtl,

    #[error("reference data fetch cancelled")]
    Cancelled,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Observability snapshot of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotStats {
    pub present: bool,
    pub count: usize,
    pub expired: bool,
}

/// Observability snapshot of the whole cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    #[serde(rename = "ttl_secs", serialize_with = "serialize_secs")]
    pub ttl: Duration,
    pub regions: SlotStats,
    pub types: SlotStats,
    pub kernels: SlotStats,
}

impl CacheStats {
    pub fn slot(&self, category: CacheCategory) -> SlotStats {
        match category {
            CacheCategory::Regions => self.regions,
            CacheCategory::Types => self.types,
            CacheCategory::Kernels => self.kernels,
        }
    }
}

fn serialize_secs<S: serde::Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(ttl.as_secs_f64())
}

struct Entry<T> {
    items: Vec<T>,
    fetched_at: Instant,
}

impl<T> Entry<T> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// One independently locked catalog.
struct Slot<T> {
    category: CacheCategory,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone + Send + Sync> Slot<T> {
    fn new(category: CacheCategory) -> Self {
        Self {
            category,
            entry: RwLock::new(None),
        }
    }

    async fn get_or_fetch<F, Fut>(
        &self,
        ttl: Duration,
        cancel: &CancellationToken,
        fetch: F,
    ) -> Result<Vec<T>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, UpstreamError>>,
    {
        {
            let entry = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CacheError::Cancelled),
                guard = self.entry.read() => guard,
            };
            if let Some(fresh) = entry.as_ref().filter(|e| e.is_fresh(ttl)) {
                return Ok(fresh.items.clone());
            }
        }

        let mut entry = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CacheError::Cancelled),
            guard = self.entry.write() => guard,
        };

        // Another task may have refreshed the slot while we waited.
        if let Some(fresh) = entry.as_ref().filter(|e| e.is_fresh(ttl)) {
            tracing::trace!(category = %self.category, "reference fetch coalesced");
            return Ok(fresh.items.clone());
        }

        let items = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CacheError::Cancelled),
            result = fetch() => result?,
        };

        tracing::debug!(
            category = %self.category,
            count = items.len(),
            "reference data refreshed"
        );
        *entry = Some(Entry {
            items: items.clone(),
            fetched_at: Instant::now(),
        });
        Ok(items)
    }

    async fn invalidate(&self) {
        *self.entry.write().await = None;
    }

    async fn stats(&self, ttl: Duration) -> SlotStats {
        let entry = self.entry.read().await;
        match entry.as_ref() {
            Some(entry) => SlotStats {
                present: true,
                count: entry.items.len(),
                expired: !entry.is_fresh(ttl),
            },
            None => SlotStats {
                present: false,
                count: 0,
                expired: false,
            },
        }
    }
}

/// TTL-bounded memoization of the reference catalogs of one account.
pub struct ReferenceCache {
    ttl: Duration,
    regions: Slot<Region>,
    types: Slot<InstanceType>,
    kernels: Slot<Kernel>,
}

impl Default for ReferenceCache {
    fn default() -> Self {
        Self::build(DEFAULT_TTL)
    }
}

impl ReferenceCache {
    /// Create a cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Result<Self, CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        Ok(Self::build(ttl))
    }

    pub(crate) fn build(ttl: Duration) -> Self {
        Self {
            ttl,
            regions: Slot::new(CacheCategory::Regions),
            types: Slot::new(CacheCategory::Types),
            kernels: Slot::new(CacheCategory::Kernels),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Regions, in the order the upstream returned them.
    pub async fn regions<A>(
        &self,
        api: &A,
        cancel: &CancellationToken,
    ) -> Result<Vec<Region>, CacheError>
    where
        A: ReferenceApi + ?Sized,
    {
        self.regions
            .get_or_fetch(self.ttl, cancel, || api.list_regions())
            .await
    }

    /// Instance types, in the order the upstream returned them.
    pub async fn types<A>(
        &self,
        api: &A,
        cancel: &CancellationToken,
    ) -> Result<Vec<InstanceType>, CacheError>
    where
        A: ReferenceApi + ?Sized,
    {
        self.types
            .get_or_fetch(self.ttl, cancel, || api.list_types())
            .await
    }

    /// Kernels, in the order the upstream returned them.
    pub async fn kernels<A>(
        &self,
        api: &A,
        cancel: &CancellationToken,
    ) -> Result<Vec<Kernel>, CacheError>
    where
        A: ReferenceApi + ?Sized,
    {
        self.kernels
            .get_or_fetch(self.ttl, cancel, || api.list_kernels())
            .await
    }

    /// Clear one slot.
    pub async fn invalidate(&self, category: CacheCategory) {
        match category {
            CacheCategory::Regions => self.regions.invalidate().await,
            CacheCategory::Types => self.types.invalidate().await,
            CacheCategory::Kernels => self.kernels.invalidate().await,
        }
        tracing::debug!(%category, "reference cache slot invalidated");
    }

    /// Clear every slot.
    pub async fn invalidate_all(&self) {
        for category in CacheCategory::ALL {
            self.invalidate(category).await;
        }
    }

    /// Snapshot of every slot. May lag concurrent writers.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            ttl: self.ttl,
            regions: self.regions.stats(self.ttl).await,
            types: self.types.stats(self.ttl).await,
            kernels: self.kernels.stats(self.ttl).await,
        }
    }
}
