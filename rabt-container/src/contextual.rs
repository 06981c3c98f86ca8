//! Contextual bindings: per-consumer overrides.
//!
//! `when("ReportService").needs("Logger").give("FileLogger")` makes the
//! autowiring engine build `FileLogger` for the `Logger` parameter of
//! `ReportService` only. Matching is by exact consumer name.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::container::Container;

/// Consumer type → (dependency type → replacement type).
#[derive(Debug, Default)]
pub(crate) struct ContextualStore {
    table: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl ContextualStore {
    pub fn add(&self, consumer: &str, dependency: &str, implementation: &str) {
        debug!(consumer, dependency, implementation, "Registered contextual binding");
        self.table
            .write()
            .entry(consumer.to_string())
            .or_default()
            .insert(dependency.to_string(), implementation.to_string());
    }

    pub fn lookup(&self, consumer: &str, dependency: &str) -> Option<String> {
        self.table
            .read()
            .get(consumer)
            .and_then(|overrides| overrides.get(dependency))
            .cloned()
    }

    pub fn clear(&self) {
        self.table.write().clear();
    }
}

/// First step of `when(..).needs(..).give(..)`.
#[derive(Debug)]
#[must_use = "call .needs(..).give(..) to register the binding"]
pub struct ContextualBindingBuilder<'a> {
    container: &'a Container,
    consumer: String,
}

impl<'a> ContextualBindingBuilder<'a> {
    pub(crate) fn new(container: &'a Container, consumer: impl Into<String>) -> Self {
        Self {
            container,
            consumer: consumer.into(),
        }
    }

    /// Names the dependency to override for this consumer.
    pub fn needs(self, dependency: impl Into<String>) -> NeedsBindingBuilder<'a> {
        NeedsBindingBuilder {
            container: self.container,
            consumer: self.consumer,
            dependency: dependency.into(),
        }
    }
}

/// Second step of `when(..).needs(..).give(..)`.
#[derive(Debug)]
#[must_use = "call .give(..) to register the binding"]
pub struct NeedsBindingBuilder<'a> {
    container: &'a Container,
    consumer: String,
    dependency: String,
}

impl NeedsBindingBuilder<'_> {
    /// Registers the replacement.
    pub fn give(self, implementation: impl AsRef<str>) {
        self.container.add_contextual_binding(
            &self.consumer,
            &self.dependency,
            implementation.as_ref(),
        );
    }
}
