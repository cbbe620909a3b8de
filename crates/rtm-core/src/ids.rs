//! Row identifier allocation.
//!
//! Every persisted row gets a prefixed identifier such as `req-3f9c…`. The
//! allocator is a dependency of the service rather than a global, so tests can
//! swap in [`SequentialIds`] and get stable, predictable identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_COMPONENT: &str = "cmp";
pub const PREFIX_REQUIREMENT: &str = "req";
pub const PREFIX_IMPLEMENTATION: &str = "imp";
pub const PREFIX_TEST_FILE: &str = "tfl";
pub const PREFIX_TEST_CASE: &str = "tcs";
pub const PREFIX_AUDIT: &str = "aud";
pub const PREFIX_API_ENDPOINT: &str = "api";

pub const ALL_PREFIXES: [&str; 8] = [
    PREFIX_PROJECT,
    PREFIX_COMPONENT,
    PREFIX_REQUIREMENT,
    PREFIX_IMPLEMENTATION,
    PREFIX_TEST_FILE,
    PREFIX_TEST_CASE,
    PREFIX_AUDIT,
    PREFIX_API_ENDPOINT,
];

/// Source of fresh row identifiers.
pub trait IdAllocator: Send + Sync {
    /// Return an identifier that has never been returned before, formatted as
    /// `{prefix}-{unique}`.
    fn allocate(&self, prefix: &str) -> String;
}

/// Random v4 UUIDs in simple (hyphen-free) form. The production allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdAllocator for RandomIds {
    fn allocate(&self, prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
    }
}

/// Monotonic counter shared across all prefixes: `req-00000001`, `aud-00000002`, …
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Start counting after `value` (the first identifier uses `value + 1`).
    #[must_use]
    pub const fn starting_after(value: u64) -> Self {
        Self {
            next: AtomicU64::new(value),
        }
    }
}

impl IdAllocator for SequentialIds {
    fn allocate(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n:08}")
    }
}
