//! Fixed pool of riders the generator attaches orders to.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{BackendError, DispatchBackend};

/// Opaque rider identifier assigned by the dispatch backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiderId(pub String);

impl fmt::Display for RiderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for RiderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rider {
    pub id: RiderId,
    pub display_name: String,
    pub contact: String,
}

/// Contact address of the `index`-th synthetic rider.
pub fn synthetic_email(index: usize) -> String {
    format!("testUser_{index}@test.com")
}

/// Display name of the `index`-th synthetic rider.
pub fn synthetic_name(index: usize) -> String {
    format!("Test{index}")
}

/// Riders known to the backend. Built once before the simulation starts.
#[derive(Debug, Clone, Default)]
pub struct RiderPool {
    riders: Vec<Rider>,
    ids: Vec<RiderId>,
}

impl RiderPool {
    pub fn new(riders: Vec<Rider>) -> Self {
        let ids = riders.iter().map(|r| r.id.clone()).collect();
        Self { riders, ids }
    }

    /// Register (or look up) `count` synthetic riders on the backend.
    ///
    /// Any backend failure aborts the sync.
    pub fn sync<B: DispatchBackend + ?Sized>(
        backend: &mut B,
        count: usize,
    ) -> Result<Self, BackendError> {
        let riders = (0..count)
            .map(|i| backend.register_or_use_rider(&synthetic_email(i), &synthetic_name(i)))
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = riders.len(), "riders synced");
        Ok(Self::new(riders))
    }

    pub fn riders(&self) -> &[Rider] {
        &self.riders
    }

    pub fn ids(&self) -> &[RiderId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.riders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    #[test]
    fn sync_registers_synthetic_riders_once() {
        let mut backend = InMemoryBackend::new();
        let first = RiderPool::sync(&mut backend, 3).expect("sync");
        assert_eq!(first.len(), 3);
        assert_eq!(first.riders()[0].contact, "testUser_0@test.com");
        assert_eq!(first.riders()[2].display_name, "Test2");

        let second = RiderPool::sync(&mut backend, 3).expect("resync");
        assert_eq!(first.ids(), second.ids(), "existing riders are reused");
    }
}
