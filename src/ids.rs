use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the opaque unique part of every stored id.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;

    /// `<prefix>-<unique>`, the shape every table uses for its primary key.
    fn prefixed(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.generate())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic ids ("1", "2", ...). Handy for tests and seed data.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        (self.next.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}
