//! The autowiring engine.
//!
//! [`Container::build_with`] instantiates a type from its descriptor,
//! resolving each constructor parameter in declaration order:
//!
//! 1. variadic: the explicit parameter of that name (wrapped into a list if
//!    scalar) or an empty list, spliced flat into the arguments;
//! 2. explicit parameter of that name, verbatim;
//! 3. otherwise by declared type: untyped, named, union or intersection.
//!
//! Then injectable fields are filled and after-hooks run. Before-hooks run
//! only for types with a constructor; together with the hooks of `make`
//! this means a single `make` can fire each hook twice.

use rabt_support::rendering::render_list;
use tracing::{instrument, trace, warn};

use crate::container::Container;
use crate::descriptor::{Arguments, Param, TypeExpr, TypeRef};
use crate::error::{RabtError, Result};
use crate::value::{Parameters, Value};

impl Container {
    /// Autowires `class` without explicit parameters.
    pub fn build(&self, class: &str) -> Result<Value> {
        self.build_with(class, &Parameters::new())
    }

    /// Autowires `class`; entries in `parameters` win over autowiring.
    ///
    /// # Errors
    /// Metadata and argument anomalies come back as a
    /// [`RabtError::Container`] naming the type and its constructor.
    #[instrument(level = "debug", skip(self, parameters), fields(explicit = parameters.len()))]
    pub fn build_with(&self, class: &str, parameters: &Parameters) -> Result<Value> {
        let mut constructor = None;
        self.build_inner(class, parameters, &mut constructor)
            .map_err(|err| match err {
                RabtError::Introspection(message) => RabtError::container_caused_by(
                    format!(
                        "Failed to build [{class}] (constructor: {}): {message}",
                        constructor.as_deref().unwrap_or("none")
                    ),
                    RabtError::Introspection(message),
                ),
                other => other,
            })
    }

    fn build_inner(
        &self,
        class: &str,
        parameters: &Parameters,
        constructor_label: &mut Option<String>,
    ) -> Result<Value> {
        let descriptor = self
            .catalog()
            .lookup(class)
            .ok_or_else(|| RabtError::Introspection(format!("Class \"{class}\" does not exist")))?;
        descriptor.validate()?;

        if !descriptor.is_instantiable() {
            return Err(RabtError::container(format!("Cannot instantiate [{class}].")));
        }

        let Some(constructor) = descriptor.constructor() else {
            let value = descriptor.instantiate(Arguments::new(class, Vec::new()))?;
            self.inject_properties(&value)?;
            return Ok(self.run_after_hooks(value, class, parameters));
        };
        *constructor_label = Some(constructor.label());

        self.run_before_hooks(class, parameters);

        let arguments = self.resolve_arguments(&constructor.params, parameters, class)?;
        let value = descriptor.instantiate(Arguments::new(class, arguments))?;
        self.inject_properties(&value)?;
        Ok(self.run_after_hooks(value, class, parameters))
    }

    /// Resolves a parameter list, splicing variadic values flat.
    pub(crate) fn resolve_arguments(
        &self,
        params: &[Param],
        parameters: &Parameters,
        consumer: &str,
    ) -> Result<Vec<Value>> {
        let mut arguments = Vec::with_capacity(params.len());
        for param in params {
            match self.resolve_parameter(param, parameters, consumer)? {
                Value::List(items) if param.variadic => arguments.extend(items),
                other => arguments.push(other),
            }
        }
        Ok(arguments)
    }

    /// Resolves one parameter for `consumer`.
    ///
    /// `consumer` is the type contextual bindings and union priorities are
    /// looked up under.
    pub(crate) fn resolve_parameter(
        &self,
        param: &Param,
        parameters: &Parameters,
        consumer: &str,
    ) -> Result<Value> {
        if param.variadic {
            return Ok(match parameters.get(&param.name) {
                Some(Value::List(items)) => Value::List(items.clone()),
                Some(single) => Value::List(vec![single.clone()]),
                None => Value::List(Vec::new()),
            });
        }

        if let Some(explicit) = parameters.get(&param.name) {
            return Ok(explicit.clone());
        }

        let Some(ty) = &param.ty else {
            return param.default.clone().ok_or_else(|| {
                RabtError::container(format!(
                    "Cannot resolve untyped parameter [${}] in [{consumer}].",
                    param.name
                ))
            });
        };

        match ty {
            TypeExpr::Named(named) => self.resolve_named(named, param, consumer),
            TypeExpr::Union(types) => self.resolve_union(types, param, consumer),
            TypeExpr::Intersection(types) => self.resolve_intersection(types, param, consumer),
        }
    }

    fn resolve_named(&self, ty: &TypeRef, param: &Param, consumer: &str) -> Result<Value> {
        if ty.builtin {
            return param.default.clone().ok_or_else(|| {
                RabtError::container(format!(
                    "Cannot resolve built-in parameter [${}] in [{consumer}].",
                    param.name
                ))
            });
        }

        if let Some(replacement) = self.contextual_for(consumer, &ty.name) {
            trace!(consumer, dependency = %ty.name, replacement = %replacement, "Using contextual binding");
            return self.make(&replacement);
        }

        if self.has(&ty.name) {
            return self.make(&ty.name);
        }

        if let Some(default) = &param.default {
            return Ok(default.clone());
        }

        Err(self.not_found(
            format!(
                "No entry or class found for parameter [${}] in [{consumer}] (type: {}).",
                param.name, ty.name
            ),
            &ty.name,
        ))
    }

    fn resolve_union(&self, types: &[TypeRef], param: &Param, consumer: &str) -> Result<Value> {
        if let Some(default) = &param.default {
            return Ok(default.clone());
        }

        let mut candidates: Vec<&TypeRef> = types.iter().filter(|ty| !ty.builtin).collect();
        let mut tried: Vec<&str> = Vec::with_capacity(candidates.len());

        if let Some(priority) = self.union_priority(consumer, &param.name) {
            candidates.sort_by_key(|ty| {
                priority
                    .iter()
                    .position(|preferred| *preferred == ty.name)
                    .unwrap_or(usize::MAX)
            });

            for ty in candidates {
                tried.push(&ty.name);
                if let Some(replacement) = self.contextual_for(consumer, &ty.name) {
                    return self.make(&replacement);
                }
                if self.has(&ty.name) {
                    return self.make(&ty.name);
                }
            }
            return Err(unresolvable_union(param, consumer, &tried));
        }

        let mut resolvable: Vec<&str> = Vec::new();
        for ty in candidates {
            tried.push(&ty.name);
            if let Some(replacement) = self.contextual_for(consumer, &ty.name) {
                return self.make(&replacement);
            }
            if self.has(&ty.name) {
                resolvable.push(&ty.name);
            }
        }

        match resolvable.as_slice() {
            [only] => self.make(only),
            [] => Err(unresolvable_union(param, consumer, &tried)),
            many => {
                warn!(consumer, parameter = %param.name, candidates = %render_list(many, ", "), "Ambiguous union-typed parameter");
                Err(RabtError::container(format!(
                    "Ambiguous union-typed parameter [${}] in [{consumer}]. Candidates: {}.",
                    param.name,
                    render_list(many, ", ")
                )))
            }
        }
    }

    /// Makes the last instantiable member and checks the value against
    /// every other member.
    fn resolve_intersection(
        &self,
        types: &[TypeRef],
        param: &Param,
        consumer: &str,
    ) -> Result<Value> {
        let concrete = types
            .iter()
            .filter(|ty| !ty.builtin && self.is_instantiable(&ty.name))
            .last();

        if let Some(concrete) = concrete {
            let value = self.make(&concrete.name)?;
            if value.as_instance().is_none() {
                return Err(RabtError::container(format!(
                    "Resolved dependency for [{}] is not an object.",
                    concrete.name
                )));
            }

            let missing: Vec<&str> = types
                .iter()
                .filter(|ty| !ty.builtin && ty.name != concrete.name)
                .filter(|ty| !self.is_a(&value, &ty.name))
                .map(|ty| ty.name.as_str())
                .collect();
            if !missing.is_empty() {
                return Err(RabtError::container(format!(
                    "Instance of class [{}] does not satisfy intersection type. Missing: {}.",
                    concrete.name,
                    render_list(&missing, ", ")
                )));
            }
            return Ok(value);
        }

        if let Some(default) = &param.default {
            return Ok(default.clone());
        }

        let required: Vec<&str> = types.iter().map(|ty| ty.name.as_str()).collect();
        Err(RabtError::container(format!(
            "Unable to handle intersection-typed parameter [${}] in [{consumer}]. Required types: {}.",
            param.name,
            render_list(&required, " & ")
        )))
    }

    /// Fills every injectable field of `value` whose type is a single class.
    ///
    /// Deferred instances and values without a known descriptor are left
    /// alone. A field that was already filled keeps its value.
    pub fn inject_properties(&self, value: &Value) -> Result<()> {
        let Some(instance) = value.as_instance() else {
            return Ok(());
        };
        let Some(object) = instance.ready_object() else {
            return Ok(());
        };
        let Some(descriptor) = self.catalog().lookup(instance.class_name()) else {
            return Ok(());
        };

        for field in descriptor.fields() {
            let Some(dependency_type) = field.ty.as_class() else {
                continue;
            };
            let Some(slot) = (field.slot)(&**object) else {
                continue;
            };

            if slot.is_filled() {
                trace!(field = %field.name, "Injectable field already filled");
                continue;
            }
            slot.fill(self.make(dependency_type)?);
        }
        Ok(())
    }
}

fn unresolvable_union(param: &Param, consumer: &str, tried: &[&str]) -> RabtError {
    RabtError::container(format!(
        "Unable to resolve union-typed parameter [${}] in [{consumer}]. Tried types: {}.",
        param.name,
        render_list(tried, ", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Injected, TypeDescriptor};
    use crate::testing::{Holder, Plain, fixtures};
    use crate::value::{Instance, params};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Logger {
        name: &'static str,
    }

    struct Report {
        logger: Instance,
    }

    struct Collector {
        label: String,
        items: Vec<Value>,
    }

    struct Needy {
        value: Value,
    }

    struct Page {
        plain: Injected,
        note: Injected,
    }

    /// Logger capability, two implementations and consumers of every shape.
    fn wired() -> Container {
        let c = fixtures();
        let types = [
            TypeDescriptor::capability("LoggerInterface").finish(),
            TypeDescriptor::capability("Flushable").finish(),
            TypeDescriptor::concrete("FileLogger")
                .implements("LoggerInterface")
                .implements("Flushable")
                .instantiate(|_| Ok(Logger { name: "file" })),
            TypeDescriptor::concrete("NullLogger")
                .implements("LoggerInterface")
                .instantiate(|_| Ok(Logger { name: "null" })),
            TypeDescriptor::concrete("Report")
                .constructor([Param::new("logger", "LoggerInterface")])
                .instantiate(|args| Ok(Report { logger: args.instance(0)? })),
            TypeDescriptor::concrete("Invoice")
                .constructor([Param::new("logger", "LoggerInterface")])
                .instantiate(|args| Ok(Report { logger: args.instance(0)? })),
            TypeDescriptor::concrete("UnionReport")
                .constructor([Param::new("logger", "FileLogger|NullLogger")])
                .instantiate(|args| Ok(Report { logger: args.instance(0)? })),
            TypeDescriptor::concrete("IntersectionReport")
                .constructor([Param::new("logger", "FileLogger&Flushable")])
                .instantiate(|args| Ok(Report { logger: args.instance(0)? })),
            TypeDescriptor::concrete("StrictReport")
                .constructor([Param::new("logger", "NullLogger&Flushable")])
                .instantiate(|args| Ok(Report { logger: args.instance(0)? })),
            TypeDescriptor::concrete("Collector")
                .constructor([Param::new("label", "string"), Param::variadic("items")])
                .instantiate(|args| {
                    Ok(Collector {
                        label: args.string(0)?,
                        items: args.rest(1),
                    })
                }),
        ];
        for descriptor in types {
            c.register_type(descriptor).unwrap();
        }
        c
    }

    fn needy(c: &Container, name: &str, param: Param) {
        c.register_type(
            TypeDescriptor::concrete(name)
                .constructor([param])
                .instantiate(|args| Ok(Needy { value: args.value(0)? })),
        )
        .unwrap();
    }

    fn logger_name(report: &Report) -> &'static str {
        report.logger.get::<Logger>().unwrap().name
    }

    #[test]
    fn autowires_constructor_dependencies() {
        let c = fixtures();
        let holder = c.make_as::<Holder>("Holder").unwrap();
        assert_eq!(holder.plain.class_name(), "Plain");
        assert!(holder.plain.get::<Plain>().is_ok());
    }

    #[test]
    fn interface_binding_drives_autowiring() {
        let c = wired();
        c.bind("LoggerInterface", "FileLogger").unwrap();
        c.bind_self("Report").unwrap();

        let report = c.make_as::<Report>("Report").unwrap();
        assert_eq!(report.logger.class_name(), "FileLogger");
        assert_eq!(logger_name(&report), "file");
    }

    #[test]
    fn contextual_binding_applies_to_its_consumer_only() {
        let c = wired();
        c.bind("LoggerInterface", "FileLogger").unwrap();
        c.when("Report").needs("LoggerInterface").give("NullLogger");

        let report = c.make_as::<Report>("Report").unwrap();
        let invoice = c.make_as::<Report>("Invoice").unwrap();
        assert_eq!(logger_name(&report), "null");
        assert_eq!(logger_name(&invoice), "file");
    }

    #[test]
    fn missing_dependency_names_parameter_owner_and_type() {
        let c = wired();
        let err = c.make("Report").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains(
            "No entry or class found for parameter [$logger] in [Report] (type: LoggerInterface)."
        ));
    }

    #[test]
    fn explicit_parameters_win() {
        let c = wired();
        let logger = Instance::new("NullLogger", Logger { name: "explicit" });
        let value = c
            .make_with("Report", &params([("logger", logger.clone())]))
            .unwrap();
        let report = value.downcast::<Report>().unwrap();
        assert!(Instance::ptr_eq(&report.logger, &logger));
    }

    #[test]
    fn variadics_are_flattened() {
        let c = wired();
        let explicit = params([
            ("label", Value::from("batch")),
            ("items", Value::from(vec![1, 2, 3])),
        ]);
        let collector = c.make_with("Collector", &explicit).unwrap();
        let collector = collector.downcast::<Collector>().unwrap();
        assert_eq!(collector.label, "batch");
        assert_eq!(collector.items, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);

        let scalar = params([("label", Value::from("one")), ("items", Value::Int(9))]);
        let collector = c.make_with("Collector", &scalar).unwrap();
        assert_eq!(collector.downcast::<Collector>().unwrap().items, vec![Value::Int(9)]);

        let empty = params([("label", "none")]);
        let collector = c.make_with("Collector", &empty).unwrap();
        assert!(collector.downcast::<Collector>().unwrap().items.is_empty());
    }

    #[test]
    fn untyped_parameters_need_a_default() {
        let c = Container::new();
        needy(&c, "Untyped", Param::untyped("anything"));
        needy(&c, "UntypedOptional", Param::untyped("anything").with_default(5));

        let err = c.make("Untyped").unwrap_err();
        assert!(err.is_container_error());
        assert!(err.to_string().contains("Cannot resolve untyped parameter [$anything] in [Untyped]."));

        let value = c.make("UntypedOptional").unwrap();
        assert_eq!(value.downcast::<Needy>().unwrap().value, Value::Int(5));
    }

    #[test]
    fn builtin_parameters_need_a_default() {
        let c = Container::new();
        needy(&c, "Port", Param::new("port", "int"));
        needy(&c, "PortOptional", Param::new("port", "int").with_default(8080));

        let err = c.make("Port").unwrap_err();
        assert!(err.to_string().contains("Cannot resolve built-in parameter [$port] in [Port]."));
        let value = c.make("PortOptional").unwrap();
        assert_eq!(value.downcast::<Needy>().unwrap().value, Value::Int(8080));
    }

    #[test]
    fn optional_named_dependency_falls_back_to_default() {
        let c = Container::new();
        needy(&c, "Optional", Param::new("cache", "Cache").with_default(Value::Null));
        let value = c.make("Optional").unwrap();
        assert!(value.downcast::<Needy>().unwrap().value.is_null());
    }

    #[test]
    fn union_with_two_resolvable_candidates_is_ambiguous() {
        let c = wired();
        let err = c.make("UnionReport").unwrap_err();
        assert!(matches!(err, RabtError::Container(_)));
        assert!(err.to_string().contains(
            "Ambiguous union-typed parameter [$logger] in [UnionReport]. Candidates: FileLogger, NullLogger."
        ));
    }

    #[test]
    fn union_priority_picks_deterministically() {
        let c = wired();
        c.set_union_type_priority("UnionReport", "logger", &["NullLogger"]);
        let report = c.make_as::<Report>("UnionReport").unwrap();
        assert_eq!(logger_name(&report), "null");
    }

    #[test]
    fn union_contextual_override_wins() {
        let c = wired();
        c.when("UnionReport").needs("NullLogger").give("FileLogger");
        let report = c.make_as::<Report>("UnionReport").unwrap();
        assert_eq!(logger_name(&report), "file");
    }

    fn register_echo_logger(c: &Container) {
        c.register_type(
            TypeDescriptor::concrete("EchoLogger")
                .implements("LoggerInterface")
                .instantiate(|_| Ok(Logger { name: "echo" })),
        )
        .unwrap();
    }

    #[test]
    fn union_priority_scan_takes_contextual_override_when_reached() {
        let c = wired();
        register_echo_logger(&c);
        c.register_type(
            TypeDescriptor::concrete("GappedReport")
                .constructor([Param::new("logger", "MissingLogger|NullLogger")])
                .instantiate(|args| Ok(Report { logger: args.instance(0)? })),
        )
        .unwrap();
        c.set_union_type_priority("GappedReport", "logger", &["MissingLogger", "NullLogger"]);
        c.when("GappedReport").needs("NullLogger").give("EchoLogger");

        let report = c.make_as::<Report>("GappedReport").unwrap();
        assert_eq!(logger_name(&report), "echo");
    }

    #[test]
    fn union_priority_scan_stops_at_first_resolvable() {
        let c = wired();
        register_echo_logger(&c);
        c.set_union_type_priority("UnionReport", "logger", &["FileLogger", "NullLogger"]);
        c.when("UnionReport").needs("NullLogger").give("EchoLogger");

        let report = c.make_as::<Report>("UnionReport").unwrap();
        assert_eq!(logger_name(&report), "file");
    }

    #[test]
    fn union_without_candidates_lists_tried_types() {
        let c = Container::new();
        needy(&c, "Lonely", Param::new("dep", "Foo|Bar|int"));
        let err = c.make("Lonely").unwrap_err();
        assert!(err.to_string().contains(
            "Unable to resolve union-typed parameter [$dep] in [Lonely]. Tried types: Foo, Bar."
        ));

        c.set_union_type_priority("Lonely", "dep", &["Bar"]);
        let err = c.make("Lonely").unwrap_err();
        assert!(err.to_string().contains("Tried types: Bar, Foo."));
    }

    #[test]
    fn optional_union_short_circuits() {
        let c = wired();
        needy(&c, "Lenient", Param::new("logger", "FileLogger|NullLogger").with_default("none"));
        let value = c.make("Lenient").unwrap();
        assert_eq!(value.downcast::<Needy>().unwrap().value, Value::from("none"));
    }

    #[test]
    fn intersection_resolves_concrete_and_checks_capabilities() {
        let c = wired();
        let report = c.make_as::<Report>("IntersectionReport").unwrap();
        assert_eq!(logger_name(&report), "file");
    }

    #[test]
    fn intersection_reports_missing_capabilities() {
        let c = wired();
        let err = c.make("StrictReport").unwrap_err();
        assert!(err.to_string().contains(
            "Instance of class [NullLogger] does not satisfy intersection type. Missing: Flushable."
        ));
    }

    #[test]
    fn intersection_makes_the_last_instantiable_member() {
        let c = wired();
        needy(&c, "Picky", Param::new("logger", "NullLogger&FileLogger"));
        let err = c.make("Picky").unwrap_err();
        assert!(err.to_string().contains(
            "Instance of class [FileLogger] does not satisfy intersection type. Missing: NullLogger."
        ));
    }

    #[test]
    fn intersection_without_concrete_type() {
        let c = wired();
        needy(&c, "Abstracted", Param::new("logger", "LoggerInterface&Flushable"));
        needy(
            &c,
            "AbstractedOptional",
            Param::new("logger", "LoggerInterface&Flushable").with_default(Value::Null),
        );

        let err = c.make("Abstracted").unwrap_err();
        assert!(err.to_string().contains(
            "Unable to handle intersection-typed parameter [$logger] in [Abstracted]. Required types: LoggerInterface & Flushable."
        ));
        assert!(c.make("AbstractedOptional").is_ok());
    }

    #[test]
    fn intersection_rejects_non_objects() {
        let c = wired();
        c.bind_factory("FileLogger", |_, _| Ok(Value::Int(1))).unwrap();
        let err = c.make("IntersectionReport").unwrap_err();
        assert!(err.to_string().contains("Resolved dependency for [FileLogger] is not an object."));
    }

    #[test]
    fn introspection_failures_name_type_and_constructor() {
        let c = wired();
        let err = c
            .make_with("Collector", &params([("label", Value::Int(3))]))
            .unwrap_err();

        assert!(matches!(err, RabtError::Container(_)));
        let message = err.to_string();
        assert!(message.starts_with("Failed to build [Collector] (constructor: Collector::new): "));
        assert!(message.contains("must be string"));
    }

    #[test]
    fn building_unknown_or_abstract_types() {
        let c = wired();
        let err = c.build("Ghost").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to build [Ghost] (constructor: none): Class \"Ghost\" does not exist"
        );

        let err = c.build("LoggerInterface").unwrap_err();
        assert_eq!(err.to_string(), "Cannot instantiate [LoggerInterface].");
        let err = c.make("LoggerInterface").unwrap_err();
        assert!(err.is_container_error());
    }

    #[test]
    fn inherited_constructor_label() {
        let c = Container::new();
        c.register_type(
            TypeDescriptor::concrete("Child")
                .extends("Base")
                .constructor_declared_by("Base", [Param::new("n", "int")])
                .instantiate(|args| Ok(args.int(0)?)),
        )
        .unwrap();

        let err = c.make_with("Child", &params([("n", "x")])).unwrap_err();
        assert!(err.to_string().contains("(constructor: Base::new)"));
    }

    #[test]
    fn injects_marked_fields() {
        let c = fixtures();
        c.register_type(
            TypeDescriptor::concrete("Page")
                .inject("plain", "Plain", |o| o.downcast_ref::<Page>().map(|p| &p.plain))
                .inject("note", "string", |o| o.downcast_ref::<Page>().map(|p| &p.note))
                .instantiate(|_| {
                    Ok(Page {
                        plain: Injected::new(),
                        note: Injected::new(),
                    })
                }),
        )
        .unwrap();
        c.singleton_self("Plain").unwrap();

        let page = c.make_as::<Page>("Page").unwrap();
        let plain = page.plain.instance().unwrap();
        assert!(Instance::ptr_eq(plain, c.make("Plain").unwrap().as_instance().unwrap()));
        assert!(!page.note.is_filled());
        assert!(page.plain.object::<Plain>().is_ok());
    }

    #[test]
    fn inject_properties_keeps_filled_slots() {
        let c = fixtures();
        c.register_type(
            TypeDescriptor::concrete("Page")
                .inject("plain", "Plain", |o| o.downcast_ref::<Page>().map(|p| &p.plain))
                .instantiate(|_| {
                    Ok(Page {
                        plain: Injected::new(),
                        note: Injected::new(),
                    })
                }),
        )
        .unwrap();

        let plain_resolutions = Arc::new(Mutex::new(0usize));
        {
            let plain_resolutions = plain_resolutions.clone();
            c.add_before_resolve(move |id, _| {
                if id == "Plain" {
                    *plain_resolutions.lock() += 1;
                }
            });
        }

        let page = c.make("Page").unwrap();
        let first = page.downcast::<Page>().unwrap().plain.instance().cloned().unwrap();
        let resolved_once = *plain_resolutions.lock();
        c.inject_properties(&page).unwrap();
        assert_eq!(*plain_resolutions.lock(), resolved_once);
        let again = page.downcast::<Page>().unwrap().plain.instance().cloned().unwrap();
        assert!(Instance::ptr_eq(&first, &again));

        assert!(c.inject_properties(&Value::Int(1)).is_ok());
    }

    #[test]
    fn hooks_fire_twice_for_autowired_builds() {
        let c = fixtures();
        let before = Arc::new(Mutex::new(Vec::new()));
        let after = Arc::new(Mutex::new(Vec::new()));
        {
            let before = before.clone();
            c.add_before_resolve(move |id, _| before.lock().push(id.to_string()));
            let after = after.clone();
            c.add_after_resolve(move |_, id, _| {
                after.lock().push(id.to_string());
                None
            });
        }

        // Holder has a constructor: make + build both fire before-hooks.
        c.make("Holder").unwrap();
        assert_eq!(*before.lock(), vec!["Holder", "Holder", "Plain"]);
        assert_eq!(*after.lock(), vec!["Plain", "Plain", "Holder", "Holder"]);

        before.lock().clear();
        after.lock().clear();

        // Plain has none: before-hooks once, after-hooks twice.
        c.make("Plain").unwrap();
        assert_eq!(*before.lock(), vec!["Plain"]);
        assert_eq!(*after.lock(), vec!["Plain", "Plain"]);

        before.lock().clear();
        after.lock().clear();

        // Instance slots never reach the engine.
        c.instance("cfg", Value::Int(1)).unwrap();
        c.make("cfg").unwrap();
        assert_eq!(*before.lock(), vec!["cfg"]);
        assert_eq!(*after.lock(), vec!["cfg"]);
    }
}
