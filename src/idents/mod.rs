//! Display-identifier allocation seam
//!
//! Identifier formats are owned by the surrounding system. The engine only
//! needs the next identifier for a category and suffix, and for a new set,
//! two identifiers sharing one base.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::gauge::GaugeSuffix;

/// Allocates display identifiers. Opaque, synchronous.
pub trait IdentifierAllocator: Send + Sync {
    /// Next identifier for a single gauge.
    fn next_identifier(&self, category: &str, suffix: Option<GaugeSuffix>) -> String;

    /// GO and NOGO identifiers for a new set, sharing one base.
    fn next_set_identifiers(&self, category: &str) -> (String, String) {
        (
            self.next_identifier(category, Some(GaugeSuffix::Go)),
            self.next_identifier(category, Some(GaugeSuffix::NoGo)),
        )
    }
}

/// Sequential in-process allocator: `<category>-<n>[-<suffix>]`.
#[derive(Debug, Default)]
pub struct SequentialAllocator {
    counters: Mutex<HashMap<String, u64>>,
}

impl SequentialAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_number(&self, category: &str) -> u64 {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let counter = counters.entry(category.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }
}

impl IdentifierAllocator for SequentialAllocator {
    fn next_identifier(&self, category: &str, suffix: Option<GaugeSuffix>) -> String {
        let number = self.next_number(category);
        match suffix {
            Some(suffix) => format!("{}-{:04}-{}", category, number, suffix.as_str()),
            None => format!("{}-{:04}", category, number),
        }
    }

    fn next_set_identifiers(&self, category: &str) -> (String, String) {
        // one base number shared by both members
        let number = self.next_number(category);
        (
            format!("{}-{:04}-{}", category, number, GaugeSuffix::Go.as_str()),
            format!("{}-{:04}-{}", category, number, GaugeSuffix::NoGo.as_str()),
        )
    }
}
