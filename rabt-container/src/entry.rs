//! Map-style access to the container.
//!
//! ```
//! use rabt_container::prelude::*;
//!
//! let c = Container::new();
//! c.set("name", Entry::Value("rabt".into())).unwrap();
//! assert!(c.contains("name"));
//! assert_eq!(c.try_get("name"), Some(Value::from("rabt")));
//!
//! c.unset("name");
//! assert_eq!(c.try_get("name"), None);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::error::Result;
use crate::lifetime::Lifetime;
use crate::registry::Producer;
use crate::value::Value;

/// What to store under a key with [`Container::set`].
#[derive(Clone)]
pub enum Entry {
    /// A constant, re-bound as a transient producer returning it.
    Value(Value),
    /// A constant behind a shared binding.
    Shared(Value),
    /// A producer, bound transient.
    Factory(Producer),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Entry::Shared(v) => f.debug_tuple("Shared").field(v).finish(),
            Entry::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl Container {
    /// Binds `key` according to `entry`.
    pub fn set(&self, key: &str, entry: Entry) -> Result<()> {
        let (producer, shared): (Producer, bool) = match entry {
            Entry::Value(value) => (Arc::new(move |_, _| Ok(value.clone())), false),
            Entry::Shared(value) => (Arc::new(move |_, _| Ok(value.clone())), true),
            Entry::Factory(producer) => (producer, false),
        };
        self.register_producer(key, producer, Lifetime::from_shared(shared), None)
    }

    /// Like [`get`](Container::get), but failures become `None`.
    pub fn try_get(&self, key: &str) -> Option<Value> {
        self.get(key).ok()
    }

    /// Removes the binding and instance slot for `key`.
    pub fn unset(&self, key: &str) {
        self.registry_mut().remove(key);
    }

    /// Same as [`has`](Container::has).
    pub fn contains(&self, key: &str) -> bool {
        self.has(key)
    }
}
