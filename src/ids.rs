// src/ids.rs
//! Card identifier sources.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub trait IdSource: Send + Sync {
    /// Must return a value never handed out before by this source.
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `<prefix>-1`, `<prefix>-2`, ... Useful for reproducible fixtures.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_never_repeat() {
        let ids = SequentialIds::new("card");
        assert_eq!(ids.next_id(), "card-1");
        assert_eq!(ids.next_id(), "card-2");
    }

    #[test]
    fn uuids_are_distinct() {
        let src = UuidSource;
        assert_ne!(src.next_id(), src.next_id());
    }
}
