// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Construction-time sizing for the signal dispatcher.
use thiserror::Error;

/// Sizing and limits applied when a [`SignalDispatcher`](crate::SignalDispatcher)
/// is built. Reserves are preallocation hints only; queues and arrays still
/// grow on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatcherConfig {
    /// Initial capacity of each pending broadcast array.
    pub queue_reserve: usize,
    /// Initial capacity of the dense receiver array.
    pub registry_reserve: usize,
    /// Initial slot count of every hash table.
    pub table_reserve: usize,
    /// Initial capacity of the per-dispatch working arrays.
    pub output_reserve: usize,
    /// Handles per spatial bucket.
    pub bucket_capacity: usize,
    /// Upper bound on hash table slots; `None` grows without bound.
    pub table_limit: Option<usize>,
    /// Most cells one spatial broadcast may visit. Larger spheres are dropped
    /// at dispatch.
    pub max_broadcast_cells: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_reserve: 512,
            registry_reserve: 1024,
            table_reserve: 1031,
            output_reserve: 2048,
            bucket_capacity: 16,
            table_limit: None,
            max_broadcast_cells: 32_768,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Buckets must hold at least one handle.
    #[error("bucket capacity must be non-zero")]
    ZeroBucketCapacity,
    /// Spatial broadcasts must be allowed at least one cell.
    #[error("max broadcast cells must be non-zero")]
    ZeroBroadcastCells,
    /// The growth limit is smaller than the initial table size.
    #[error("table limit {limit} is below the table reserve {reserve}")]
    LimitBelowReserve {
        /// Configured limit.
        limit: usize,
        /// Configured reserve.
        reserve: usize,
    },
}

impl DispatcherConfig {
    /// Sets [`Self::queue_reserve`].
    pub fn with_queue_reserve(mut self, n: usize) -> Self {
        self.queue_reserve = n;
        self
    }

    /// Sets [`Self::registry_reserve`].
    pub fn with_registry_reserve(mut self, n: usize) -> Self {
        self.registry_reserve = n;
        self
    }

    /// Sets [`Self::table_reserve`].
    pub fn with_table_reserve(mut self, n: usize) -> Self {
        self.table_reserve = n;
        self
    }

    /// Sets [`Self::output_reserve`].
    pub fn with_output_reserve(mut self, n: usize) -> Self {
        self.output_reserve = n;
        self
    }

    /// Sets [`Self::bucket_capacity`].
    pub fn with_bucket_capacity(mut self, n: usize) -> Self {
        self.bucket_capacity = n;
        self
    }

    /// Sets [`Self::table_limit`].
    pub fn with_table_limit(mut self, limit: Option<usize>) -> Self {
        self.table_limit = limit;
        self
    }

    /// Sets [`Self::max_broadcast_cells`].
    pub fn with_max_broadcast_cells(mut self, n: usize) -> Self {
        self.max_broadcast_cells = n;
        self
    }

    /// Checks the invariants the dispatcher relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_capacity == 0 {
            return Err(ConfigError::ZeroBucketCapacity);
        }
        if self.max_broadcast_cells == 0 {
            return Err(ConfigError::ZeroBroadcastCells);
        }
        if let Some(limit) = self.table_limit {
            if limit < self.table_reserve {
                return Err(ConfigError::LimitBelowReserve {
                    limit,
                    reserve: self.table_reserve,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(DispatcherConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_bucket_capacity_is_rejected() {
        let cfg = DispatcherConfig::default().with_bucket_capacity(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBucketCapacity));
    }

    #[test]
    fn zero_broadcast_cells_is_rejected() {
        let cfg = DispatcherConfig::default().with_max_broadcast_cells(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBroadcastCells));
    }

    #[test]
    fn limit_must_cover_reserve() {
        let cfg = DispatcherConfig::default()
            .with_table_reserve(64)
            .with_table_limit(Some(32));
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::LimitBelowReserve {
                limit: 32,
                reserve: 64
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let cfg: DispatcherConfig = serde_json::from_str(r#"{"bucket_capacity": 4}"#).unwrap();
        assert_eq!(cfg.bucket_capacity, 4);
        assert_eq!(cfg.queue_reserve, 512);
        assert_eq!(cfg.table_limit, None);
    }
}
