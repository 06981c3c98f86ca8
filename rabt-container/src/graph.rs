//! Dependency graph of the container's bindings (debug aid).
//!
//! [`Container::generate_dependency_graph`] calls every binding's producer
//! once with empty parameters and records the declared constructor
//! parameter types of what it got back. Nothing here is used during normal
//! resolution.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use rabt_support::rendering::{render_chain, render_dependency_line};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::container::Container;
use crate::error::{RabtError, Result};
use crate::value::{Parameters, Value};

/// Binding id → declared constructor parameter types (`"untyped"` when
/// a parameter has no type).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn insert(&mut self, node: impl Into<String>, dependencies: Vec<String>) {
        self.nodes.insert(node.into(), dependencies);
    }

    pub fn dependencies_of(&self, node: &str) -> Option<&[String]> {
        self.nodes.get(node).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.nodes
            .iter()
            .map(|(node, deps)| (node.as_str(), deps.as_slice()))
    }

    /// First cycle among the graph's own nodes, as a closed chain.
    ///
    /// Such cycles resolve through deferred instances at runtime; this makes
    /// them visible up front.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut walk = CycleWalk {
            graph: self,
            visiting: HashSet::new(),
            done: HashSet::new(),
            path: Vec::new(),
        };

        for node in self.nodes.keys() {
            if let Some(cycle) = walk.visit(node) {
                warn!(cycle = %render_chain(&cycle), "Dependency cycle in bindings");
                return Some(cycle);
            }
        }
        None
    }
}

impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node, deps) in self.iter() {
            writeln!(f, "{}", render_dependency_line(node, deps))?;
        }
        Ok(())
    }
}

/// Depth-first search keeping the current path for cycle reporting.
struct CycleWalk<'a> {
    graph: &'a DependencyGraph,
    visiting: HashSet<&'a str>,
    done: HashSet<&'a str>,
    path: Vec<&'a str>,
}

impl<'a> CycleWalk<'a> {
    fn visit(&mut self, node: &'a str) -> Option<Vec<String>> {
        if self.done.contains(node) {
            return None;
        }

        if self.visiting.contains(node) {
            let start = self.path.iter().position(|n| *n == node).unwrap_or(0);
            let mut chain: Vec<String> = self.path[start..].iter().map(|n| n.to_string()).collect();
            chain.push(node.to_string());
            return Some(chain);
        }

        let deps = self.graph.nodes.get(node)?;

        self.visiting.insert(node);
        self.path.push(node);

        for dep in deps {
            if let Some(cycle) = self.visit(dep) {
                return Some(cycle);
            }
        }

        self.path.pop();
        self.visiting.remove(node);
        self.done.insert(node);
        None
    }
}

impl Container {
    /// Builds a [`DependencyGraph`] of every binding.
    ///
    /// # Errors
    /// A producer that fails, returns a string naming an unknown type, or
    /// returns anything else that is not an object.
    #[instrument(skip(self), name = "dependency_graph")]
    pub fn generate_dependency_graph(&self) -> Result<DependencyGraph> {
        let bindings = self.registry().bindings();
        debug!(bindings = bindings.len(), "Generating dependency graph");

        let mut graph = DependencyGraph::default();
        for (abstract_id, binding) in bindings {
            let produced = (binding.producer)(self, &Parameters::new())?;
            let class = match &produced {
                Value::Instance(instance) => instance.class_name().to_string(),
                Value::Str(name) if self.catalog().lookup(name).is_some() => name.clone(),
                Value::Str(name) => {
                    return Err(RabtError::container(format!("Class {name} does not exist.")));
                }
                other => {
                    return Err(RabtError::container(format!(
                        "Expected a valid class name or object for [{abstract_id}], got {}.",
                        other.type_name()
                    )));
                }
            };

            let dependencies = self
                .catalog()
                .lookup(&class)
                .and_then(|descriptor| {
                    descriptor.constructor().map(|constructor| {
                        constructor
                            .params
                            .iter()
                            .map(|param| match &param.ty {
                                Some(ty) => ty.to_string(),
                                None => "untyped".to_string(),
                            })
                            .collect()
                    })
                })
                .unwrap_or_default();

            graph.insert(abstract_id, dependencies);
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Param, TypeDescriptor};
    use crate::testing::fixtures;

    #[test]
    fn graph_lists_constructor_parameter_types() {
        let c = fixtures();
        c.register_type(
            TypeDescriptor::concrete("Mixed")
                .constructor([
                    Param::new("a", "Plain|Holder"),
                    Param::untyped("b"),
                    Param::new("c", "int").with_default(1),
                ])
                .instantiate(|_| Ok(())),
        )
        .unwrap();
        c.bind_self("Holder").unwrap();
        c.singleton_self("Plain").unwrap();
        c.bind_factory("mixed", |_, _| Ok(Value::from("Mixed"))).unwrap();

        let graph = c.generate_dependency_graph().unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.dependencies_of("Holder").unwrap(), ["Plain".to_string()]);
        assert!(graph.dependencies_of("Plain").unwrap().is_empty());
        assert_eq!(
            graph.dependencies_of("mixed").unwrap(),
            ["Plain|Holder".to_string(), "untyped".to_string(), "int".to_string()]
        );
    }

    #[test]
    fn graph_rejects_non_objects() {
        let c = Container::new();
        c.bind_factory("n", |_, _| Ok(Value::Int(1))).unwrap();
        let err = c.generate_dependency_graph().unwrap_err();
        assert!(err.is_container_error());

        let c = Container::new();
        c.bind_factory("s", |_, _| Ok(Value::from("Nope"))).unwrap();
        let err = c.generate_dependency_graph().unwrap_err();
        assert_eq!(err.to_string(), "Class Nope does not exist.");
    }

    #[test]
    fn display_and_serialize() {
        let mut graph = DependencyGraph::default();
        graph.insert("A", vec!["B".into(), "C".into()]);
        graph.insert("C", vec![]);

        assert_eq!(graph.to_string(), "A → B, C\nC (no dependencies)\n");
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["A"][1], "C");
    }

    #[test]
    fn finds_cycles() {
        let mut graph = DependencyGraph::default();
        graph.insert("A", vec!["B".into()]);
        graph.insert("B", vec!["C".into(), "A".into()]);
        graph.insert("C", vec!["int".into()]);
        assert_eq!(
            graph.find_cycle(),
            Some(vec!["A".to_string(), "B".to_string(), "A".to_string()])
        );

        let mut acyclic = DependencyGraph::default();
        acyclic.insert("A", vec!["B".into()]);
        acyclic.insert("B", vec![]);
        assert_eq!(acyclic.find_cycle(), None);
    }
}
