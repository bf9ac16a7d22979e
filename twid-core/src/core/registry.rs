use std::collections::HashSet;

use crate::models::media::{DiscoveredMedia, MediaKind, MediaRecord, RegistryKey};

/// Deduplicating accumulator for one discovery session. Insertion order is
/// kept so the finalized lists follow the order assets were observed in.
#[derive(Debug, Default)]
pub struct MediaRegistry {
    seen: HashSet<RegistryKey>,
    order: Vec<RegistryKey>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the record was not known yet.
    pub fn insert(&mut self, record: MediaRecord) -> bool {
        let key = record.key();
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key.clone());
        self.order.push(key);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn count(&self, kind: MediaKind) -> usize {
        self.order.iter().filter(|k| k.kind == kind).count()
    }

    pub fn finalize(self) -> DiscoveredMedia {
        let (images, videos): (Vec<_>, Vec<_>) = self
            .order
            .into_iter()
            .map(MediaRecord::from)
            .partition(|r| r.kind == MediaKind::Image);
        DiscoveredMedia { images, videos }
    }
}
