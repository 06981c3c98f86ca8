//! Core container implementation for rabt.
//!
//! Types are described at runtime with [`TypeDescriptor`]s; the container
//! autowires constructors from those descriptions, honouring bindings,
//! contextual overrides, union priorities, and scopes.

pub mod autowire;
pub mod cache;
pub mod callable;
pub mod catalog;
pub mod circular;
pub mod container;
pub mod contextual;
pub mod descriptor;
pub mod entry;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod lifetime;
pub mod registry;
pub mod scope;
pub mod settings;
pub mod tags;
pub mod value;

#[cfg(test)]
mod testing;

pub use catalog::TypeRegistration;
pub use container::{Concrete, Container, ContainerBuilder, derive_cache_key, prelude};
pub use descriptor::TypeDescriptor;
pub use error::{RabtError, Result};
pub use graph::DependencyGraph;
pub use lifetime::Lifetime;
pub use value::{Instance, Parameters, Value};

#[doc(hidden)]
pub use inventory;
