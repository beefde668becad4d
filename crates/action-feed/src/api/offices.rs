use std::collections::HashMap;
use std::sync::RwLock;

use serde::Deserialize;

/// Synchronous office-name lookup used while normalizing loan events.
pub trait OfficeDirectory: Send + Sync {
    fn office_name(&self, office_id: u32) -> Option<String>;
}

/// Row returned by `GET /offices`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfficeRecord {
    pub id: u32,
    pub name: String,
}

/// Locally cached office list, refreshed from the backend at startup.
#[derive(Debug, Default)]
pub struct OfficeCache {
    names: RwLock<HashMap<u32, String>>,
}

impl OfficeCache {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = OfficeRecord>,
    {
        let cache = Self::default();
        cache.replace(records);
        cache
    }

    /// Swap the cached list for a freshly fetched one.
    pub fn replace<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = OfficeRecord>,
    {
        let names: HashMap<u32, String> = records
            .into_iter()
            .filter(|record| !record.name.trim().is_empty())
            .map(|record| (record.id, record.name.trim().to_string()))
            .collect();
        let count = names.len();
        *self.names.write().expect("office cache lock poisoned") = names;
        count
    }

    pub fn len(&self) -> usize {
        self.names.read().expect("office cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OfficeDirectory for OfficeCache {
    fn office_name(&self, office_id: u32) -> Option<String> {
        self.names
            .read()
            .expect("office cache lock poisoned")
            .get(&office_id)
            .cloned()
    }
}
