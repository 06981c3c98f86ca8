//! Binding registry: producers, shared instances and aliases.
//!
//! Maps abstract identifiers to the producers that know how to create
//! them. The registry only stores; resolution lives in the container.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::container::Container;
use crate::error::{AlreadyRegisteredError, RabtError, Result};
use crate::lifetime::Lifetime;
use crate::value::{Parameters, Value};

/// Produces the value for a binding.
///
/// Receives the container (to resolve sub-dependencies) and the explicit
/// parameters of the `make` call. Must be safe to call repeatedly for
/// transient bindings.
pub type Producer = Arc<dyn Fn(&Container, &Parameters) -> Result<Value> + Send + Sync>;

/// A single binding.
#[derive(Clone)]
pub(crate) struct Binding {
    pub producer: Producer,
    pub lifetime: Lifetime,
    /// Type name when bound to a type rather than a closure.
    pub concrete: Option<String>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("lifetime", &self.lifetime)
            .field("concrete", &self.concrete)
            .finish()
    }
}

/// Stores bindings, shared instances and aliases for one container.
#[derive(Debug, Default)]
pub(crate) struct BindingRegistry {
    bindings: IndexMap<String, Binding>,
    instances: IndexMap<String, Value>,
    aliases: IndexMap<String, String>,
}

impl BindingRegistry {
    /// Stores a binding for `abstract_id`.
    ///
    /// # Errors
    /// [`RabtError::AlreadyRegistered`] when a binding exists and
    /// `allow_override` is false.
    pub fn register(
        &mut self,
        abstract_id: &str,
        binding: Binding,
        allow_override: bool,
    ) -> Result<()> {
        if !allow_override && self.bindings.contains_key(abstract_id) {
            return Err(RabtError::AlreadyRegistered(AlreadyRegisteredError {
                abstract_id: abstract_id.to_string(),
            }));
        }

        debug!(
            abstract_id,
            lifetime = %binding.lifetime,
            concrete = binding.concrete.as_deref().unwrap_or("<closure>"),
            "Registered binding"
        );
        self.bindings.insert(abstract_id.to_string(), binding);
        Ok(())
    }

    pub fn set_instance(&mut self, abstract_id: &str, value: Value) {
        self.instances.insert(abstract_id.to_string(), value);
    }

    /// Registers `alias` as another name for `abstract_id`.
    pub fn alias(&mut self, abstract_id: &str, alias: &str) {
        debug!(alias, target = abstract_id, "Registered alias");
        self.aliases
            .insert(alias.to_string(), abstract_id.to_string());
    }

    /// Follows at most one alias indirection.
    pub fn canonical(&self, id: &str) -> String {
        match self.aliases.get(id) {
            Some(target) => {
                trace!(from = id, to = %target, "Following alias");
                target.clone()
            }
            None => id.to_string(),
        }
    }

    pub fn binding(&self, abstract_id: &str) -> Option<Binding> {
        self.bindings.get(abstract_id).cloned()
    }

    pub fn instance(&self, abstract_id: &str) -> Option<Value> {
        self.instances.get(abstract_id).cloned()
    }

    pub fn is_bound(&self, abstract_id: &str) -> bool {
        self.bindings.contains_key(abstract_id)
    }

    pub fn has_instance(&self, abstract_id: &str) -> bool {
        self.instances.contains_key(abstract_id)
    }

    /// Drops the binding and instance slot for `abstract_id`.
    pub fn remove(&mut self, abstract_id: &str) {
        self.bindings.shift_remove(abstract_id);
        self.instances.shift_remove(abstract_id);
    }

    /// All bindings in registration order.
    pub fn bindings(&self) -> Vec<(String, Binding)> {
        self.bindings
            .iter()
            .map(|(id, binding)| (id.clone(), binding.clone()))
            .collect()
    }

    /// Every identifier the registry answers for.
    pub fn known_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.bindings.keys().cloned().collect();
        ids.extend(self.instances.keys().cloned());
        ids.extend(self.aliases.keys().cloned());
        ids
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn instances_len(&self) -> usize {
        self.instances.len()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.instances.clear();
        self.aliases.clear();
    }
}
