//! Named child containers.
//!
//! A scope owns its own bindings and instances and falls back to its
//! parent for everything else:
//! - `has`: own bindings or instances, then the parent's `has`;
//! - `get`: own instance, own binding, then the parent's `get`;
//! - `make`: same precedence, using the parent's `make`.
//!
//! Scopes are created once per name and live until the parent is reset.

use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use crate::container::Container;
use crate::error::{RabtError, Result};
use crate::value::{Parameters, Value};

impl Container {
    /// Runs `callback` with the scope called `name`, creating it on first use.
    ///
    /// ```
    /// use rabt_container::prelude::*;
    ///
    /// let app = Container::new();
    /// app.instance("config", Value::from("global")).unwrap();
    ///
    /// let value = app.scope("request", |scope| {
    ///     scope.instance("user", Value::from("ada")).unwrap();
    ///     (scope.make("user").unwrap(), scope.make("config").unwrap())
    /// });
    /// assert_eq!(value, (Value::from("ada"), Value::from("global")));
    /// assert!(!app.has("user"));
    /// ```
    pub fn scope<R>(&self, name: &str, callback: impl FnOnce(&Container) -> R) -> R {
        let scope = {
            let mut scopes = self.inner.scopes.lock();
            scopes
                .entry(name.to_string())
                .or_insert_with(|| {
                    debug!(scope = name, "Creating scope");
                    Container::from_parts(
                        self.inner.settings.clone(),
                        self.inner.catalog.clone(),
                        Some(Arc::downgrade(&self.inner)),
                    )
                })
                .clone()
        };
        callback(&scope)
    }

    /// `true` for containers created by [`scope`](Container::scope).
    pub fn is_scope(&self) -> bool {
        self.inner.parent.is_some()
    }

    /// The parent of a scope, while it is alive.
    pub fn parent(&self) -> Option<Container> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
    }

    fn owns(&self, abstract_id: &str) -> (bool, bool) {
        let registry = self.registry();
        (registry.has_instance(abstract_id), registry.is_bound(abstract_id))
    }

    pub(crate) fn has_scoped(&self, id: &str) -> bool {
        let (instance, bound) = self.owns(id);
        instance || bound || self.parent().is_some_and(|parent| parent.has(id))
    }

    pub(crate) fn get_scoped(&self, id: &str) -> Result<Value> {
        let (instance, bound) = self.owns(id);
        if instance {
            if let Some(value) = self.registry().instance(id) {
                return Ok(value);
            }
        }
        if bound {
            return self.get_unscoped(id);
        }
        match self.parent() {
            Some(parent) if parent.has(id) => {
                trace!(id, "Delegating get to parent");
                parent.get(id)
            }
            _ => Err(RabtError::not_found(format!(
                "No entry found for [{id}] in scope or parent."
            ))),
        }
    }

    pub(crate) fn make_scoped(&self, id: &str, parameters: &Parameters) -> Result<Value> {
        let abstract_id = self.registry().canonical(id);
        let (instance, bound) = self.owns(&abstract_id);
        if instance {
            if let Some(value) = self.registry().instance(&abstract_id) {
                return Ok(value);
            }
        }
        if bound {
            return self.resolve(&abstract_id, parameters);
        }
        match self.parent() {
            Some(parent) if parent.has(&abstract_id) => {
                trace!(abstract_id = %abstract_id, "Delegating make to parent");
                parent.make_with(&abstract_id, parameters)
            }
            _ => Err(RabtError::not_found(format!(
                "Cannot find abstract [{abstract_id}] in scope or parent."
            ))),
        }
    }
}
