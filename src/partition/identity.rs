//! Composite identities for partitions and regional endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A server-side partition within a logical container.
///
/// Stable across regional failover. A split or merge produces new
/// identities; the old ones are evicted by the metadata cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionIdentity {
    /// Resource id of the owning collection.
    pub collection_rid: String,
    /// Partition key range id within the collection.
    pub partition_range_id: String,
}

impl PartitionIdentity {
    /// Create a partition identity from its collection and range ids.
    pub fn new(collection_rid: impl Into<String>, partition_range_id: impl Into<String>) -> Self {
        Self {
            collection_rid: collection_rid.into(),
            partition_range_id: partition_range_id.into(),
        }
    }
}

impl fmt::Display for PartitionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection_rid, self.partition_range_id)
    }
}

/// A region's logical name plus its routing target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionEndpoint {
    /// Logical region name (e.g. "West US 2").
    pub name: String,
    /// Regional account endpoint.
    pub endpoint: Url,
}

impl RegionEndpoint {
    /// Create a region endpoint.
    pub fn new(name: impl Into<String>, endpoint: Url) -> Self {
        Self {
            name: name.into(),
            endpoint,
        }
    }
}

impl fmt::Display for RegionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Flat key for per-location health records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey {
    pub partition: PartitionIdentity,
    pub region: RegionEndpoint,
}

impl LocationKey {
    /// Key for a (partition, region) pair.
    pub fn new(partition: &PartitionIdentity, region: &RegionEndpoint) -> Self {
        Self {
            partition: partition.clone(),
            region: region.clone(),
        }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.partition, self.region)
    }
}
