//! Where the container looks up [`TypeDescriptor`]s.
//!
//! Two sources, checked in order:
//! 1. types registered on the container itself
//!    ([`Container::register_type`](crate::container::Container::register_type));
//! 2. the process-wide catalog collected at link time from
//!    `inventory::submit!` blocks.
//!
//! ```rust
//! use rabt_container::catalog::TypeRegistration;
//! use rabt_container::descriptor::TypeDescriptor;
//!
//! struct Clock;
//!
//! fn describe_clock() -> TypeDescriptor {
//!     TypeDescriptor::concrete("Clock").instantiate(|_| Ok(Clock))
//! }
//!
//! inventory::submit! { TypeRegistration::new(describe_clock) }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::descriptor::{MethodDescriptor, TypeDescriptor};

/// A link-time type registration.
pub struct TypeRegistration {
    describe: fn() -> TypeDescriptor,
}

impl TypeRegistration {
    pub const fn new(describe: fn() -> TypeDescriptor) -> Self {
        Self { describe }
    }
}

inventory::collect!(TypeRegistration);

static LINKED_TYPES: Lazy<HashMap<String, Arc<TypeDescriptor>>> = Lazy::new(|| {
    inventory::iter::<TypeRegistration>
        .into_iter()
        .map(|registration| {
            let descriptor = (registration.describe)();
            (descriptor.name().to_string(), Arc::new(descriptor))
        })
        .collect()
});

/// Per-container view over known types, with a lookup cache.
#[derive(Debug, Default)]
pub(crate) struct TypeCatalog {
    registered: RwLock<HashMap<String, Arc<TypeDescriptor>>>,
    cache: DashMap<String, Arc<TypeDescriptor>>,
}

impl TypeCatalog {
    pub fn register(&self, descriptor: TypeDescriptor) {
        let name = descriptor.name().to_string();
        debug!(type_name = %name, kind = ?descriptor.kind(), "Registered type");
        self.cache.remove(&name);
        self.registered.write().insert(name, Arc::new(descriptor));
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        if let Some(hit) = self.cache.get(name) {
            return Some(hit.clone());
        }

        let found = self
            .registered
            .read()
            .get(name)
            .cloned()
            .or_else(|| LINKED_TYPES.get(name).cloned())?;

        trace!(type_name = name, "Caching type descriptor");
        self.cache.insert(name.to_string(), found.clone());
        Some(found)
    }

    pub fn is_instantiable(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|d| d.is_instantiable())
    }

    /// Structural is-a test over declared supertypes (transitive).
    pub fn is_a(&self, class: &str, target: &str) -> bool {
        if class == target {
            return true;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([class.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(descriptor) = self.lookup(&current) else {
                continue;
            };
            for parent in descriptor.supertypes() {
                if parent == target {
                    return true;
                }
                queue.push_back(parent.clone());
            }
        }
        false
    }

    /// Finds `method` on `class` or the nearest supertype declaring it.
    ///
    /// Returns the declaring type's name along with the method.
    pub fn find_method(&self, class: &str, method: &str) -> Option<(String, MethodDescriptor)> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([class.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(descriptor) = self.lookup(&current) else {
                continue;
            };
            if let Some(found) = descriptor.method(method) {
                return Some((current, found.clone()));
            }
            queue.extend(descriptor.supertypes().iter().cloned());
        }
        None
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Every known type name.
    pub fn known_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registered.read().keys().cloned().collect();
        names.extend(LINKED_TYPES.keys().cloned());
        names.sort();
        names.dedup();
        names
    }
}
