//! Circular dependency handling.
//!
//! While an abstract is being resolved it sits in the container's
//! [`ResolvingSet`]. A nested request for the same abstract does not recurse;
//! it gets a [`DeferredProxy`] wrapped in an [`Instance`] instead. The proxy
//! resolves its target through the ambient [`Container::global`] on first
//! access and keeps the result.

use std::fmt;

use indexmap::IndexSet;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rabt_support::rendering::render_chain;
use tracing::{debug, warn};

use crate::container::Container;
use crate::error::{RabtError, Result};
use crate::value::{Instance, Parameters, Value};

/// Lazily resolved stand-in for an abstract that was mid-resolution.
///
/// Every circular request gets its own proxy; proxies never share identity.
pub struct DeferredProxy {
    target: String,
    parameters: Parameters,
    real: OnceCell<Instance>,
}

impl DeferredProxy {
    pub(crate) fn new(target: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            target: target.into(),
            parameters,
            real: OnceCell::new(),
        }
    }

    /// The abstract this proxy stands in for.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Parameters captured from the circular request.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn is_resolved(&self) -> bool {
        self.real.get().is_some()
    }

    /// Resolves the real instance exactly once.
    ///
    /// A failed attempt is not memoized; the next access tries again.
    pub fn resolve(&self) -> Result<&Instance> {
        self.real.get_or_try_init(|| {
            debug!(target = %self.target, "Resolving deferred instance");
            match Container::global().make_with(&self.target, &self.parameters)? {
                Value::Instance(instance) if instance.is_deferred() => {
                    Err(RabtError::container(format!(
                        "[{}] is still being resolved; its deferred instance cannot be used yet.",
                        self.target
                    )))
                }
                Value::Instance(instance) => Ok(instance),
                _ => Err(RabtError::container(format!(
                    "Resolved dependency for [{}] is not an object.",
                    self.target
                ))),
            }
        })
    }
}

impl fmt::Debug for DeferredProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredProxy")
            .field("target", &self.target)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Builds the deferred value returned for a re-entrant request.
pub(crate) fn defer(abstract_id: &str, parameters: &Parameters) -> Value {
    Value::Instance(Instance::deferred(DeferredProxy::new(
        abstract_id,
        parameters.clone(),
    )))
}

/// Abstracts currently being resolved on this container, in entry order.
#[derive(Debug, Default)]
pub(crate) struct ResolvingSet {
    entries: Mutex<IndexSet<String>>,
}

impl ResolvingSet {
    pub fn contains(&self, abstract_id: &str) -> bool {
        self.entries.lock().contains(abstract_id)
    }

    /// Marks `abstract_id` as resolving until the guard is dropped.
    pub fn enter(&self, abstract_id: &str) -> ResolvingGuard<'_> {
        self.entries.lock().insert(abstract_id.to_string());
        ResolvingGuard {
            set: self,
            abstract_id: abstract_id.to_string(),
        }
    }

    pub fn chain(&self) -> Vec<String> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Logs the re-entry and returns the deferred stand-in.
    pub fn defer(&self, abstract_id: &str, parameters: &Parameters) -> Value {
        let mut chain = self.chain();
        chain.push(abstract_id.to_string());
        warn!(
            abstract_id,
            chain = %render_chain(&chain),
            "Circular dependency, returning deferred instance"
        );
        defer(abstract_id, parameters)
    }
}

/// Removes its abstract from the [`ResolvingSet`] on every exit path.
pub(crate) struct ResolvingGuard<'a> {
    set: &'a ResolvingSet,
    abstract_id: String,
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.set.entries.lock().shift_remove(&self.abstract_id);
    }
}
