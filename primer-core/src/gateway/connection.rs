//! Registry of connected scroll spy readers.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// One connected reader.
#[derive(Debug, Clone)]
pub struct Reader {
    pub connected_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub messages: u64,
    /// Section the reader's spy last reported as active.
    pub section: Option<String>,
}

/// Open scroll spy sockets, bounded by `capacity`.
#[derive(Debug, Default)]
pub struct ReaderRegistry {
    readers: HashMap<Uuid, Reader>,
    capacity: usize,
}

impl ReaderRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            readers: HashMap::new(),
            capacity,
        }
    }

    /// Admit a reader, or `None` when every slot is taken.
    pub fn admit(&mut self) -> Option<Uuid> {
        if self.is_full() {
            return None;
        }
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.readers.insert(
            id,
            Reader {
                connected_at: now,
                last_seen: now,
                messages: 0,
                section: None,
            },
        );
        Some(id)
    }

    pub fn release(&mut self, id: &Uuid) -> bool {
        self.readers.remove(id).is_some()
    }

    /// Count one inbound message.
    pub fn record_message(&mut self, id: &Uuid) {
        if let Some(reader) = self.readers.get_mut(id) {
            reader.last_seen = Utc::now();
            reader.messages += 1;
        }
    }

    pub fn set_section(&mut self, id: &Uuid, section: Option<&str>) {
        if let Some(reader) = self.readers.get_mut(id) {
            reader.section = section.map(String::from);
        }
    }

    pub fn reader(&self, id: &Uuid) -> Option<&Reader> {
        self.readers.get(id)
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.readers.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many readers are on each section, ordered by section id.
    /// Readers with nothing in view are left out.
    pub fn readers_by_section(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for section in self.readers.values().filter_map(|r| r.section.as_ref()) {
            *counts.entry(section.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_admit_until_full() {
        let mut registry = ReaderRegistry::with_capacity(2);
        let a = registry.admit().unwrap();
        registry.admit().unwrap();
        assert!(registry.is_full());
        assert!(registry.admit().is_none());

        assert!(registry.release(&a));
        assert!(!registry.release(&a));
        assert_eq!(registry.len(), 1);
        assert!(registry.admit().is_some());
    }

    #[test]
    fn test_zero_capacity_admits_nobody() {
        let mut registry = ReaderRegistry::with_capacity(0);
        assert!(registry.admit().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_record_message() {
        let mut registry = ReaderRegistry::with_capacity(1);
        let id = registry.admit().unwrap();
        let connected = registry.reader(&id).unwrap().connected_at;
        registry.record_message(&id);
        registry.record_message(&id);
        registry.record_message(&Uuid::new_v4());

        let reader = registry.reader(&id).unwrap();
        assert_eq!(reader.messages, 2);
        assert!(reader.last_seen >= connected);
    }

    #[test]
    fn test_readers_by_section() {
        let mut registry = ReaderRegistry::with_capacity(4);
        let a = registry.admit().unwrap();
        let b = registry.admit().unwrap();
        let c = registry.admit().unwrap();
        registry.admit().unwrap();

        registry.set_section(&a, Some("attention"));
        registry.set_section(&b, Some("attention"));
        registry.set_section(&c, Some("embeddings"));
        assert_eq!(
            registry.readers_by_section(),
            BTreeMap::from([("attention".to_string(), 2), ("embeddings".to_string(), 1)])
        );

        registry.set_section(&b, None);
        registry.release(&c);
        assert_eq!(
            registry.readers_by_section(),
            BTreeMap::from([("attention".to_string(), 1)])
        );
    }
}
