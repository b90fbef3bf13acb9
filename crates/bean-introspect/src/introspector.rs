//! Accessor-convention introspection
//!
//! Properties come from `getX`/`isX` readers and `setX` writers; event sets
//! from `addXListener`/`removeXListener` pairs with an optional
//! `getXListeners`. Results are cached per introspector.

use crate::descriptor::{BeanDescriptor, BeanInfo, EventSetDescriptor, PropertyDescriptor};
use crate::error::{IntrospectionError, IntrospectionResult};
use bean_model::{builtins, Method, PrimitiveKind, TypeRef, TypeRegistry};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::rc::Rc;

/// Caching introspection service
///
/// One introspector serves one encoding session. Enumeration detection for
/// declared property types consults the optional [`TypeRegistry`].
#[derive(Debug, Default)]
pub struct Introspector {
    cache: HashMap<String, Rc<BeanInfo>>,
    registry: Option<TypeRegistry>,
}

#[derive(Default)]
struct Accessors {
    read: Option<(String, String)>,
    writes: Vec<(String, String)>,
}

impl Introspector {
    /// Introspector without a registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve declared property types through `registry`
    #[must_use]
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Describe `ty`, computing it on first request
    ///
    /// # Errors
    /// Unknown default property or event names and accessor type conflicts
    pub fn bean_info(&mut self, ty: &TypeRef) -> IntrospectionResult<Rc<BeanInfo>> {
        if let Some(info) = self.cache.get(ty.name()) {
            return Ok(info.clone());
        }
        let info = Rc::new(self.describe(ty)?);
        tracing::debug!(
            bean_type = ty.name(),
            properties = info.properties.len(),
            event_sets = info.event_sets.len(),
            "introspected"
        );
        self.cache.insert(ty.name().to_string(), info.clone());
        Ok(info)
    }

    /// Forget every cached result
    pub fn flush(&mut self) {
        self.cache.clear();
    }

    /// Forget the cached result for one type
    pub fn flush_type(&mut self, ty: &TypeRef) {
        self.cache.remove(ty.name());
    }

    /// Number of cached descriptions
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn describe(&self, ty: &TypeRef) -> IntrospectionResult<BeanInfo> {
        let methods = ty.all_methods();
        let (transient, constants) = inherited_hints(ty);
        let properties = self.properties(ty, &methods, &transient, &constants)?;
        let event_sets = event_sets(&methods, &transient);

        let hints = ty.hints();
        let default_property = match &hints.default_property {
            Some(name) => Some(properties.iter().position(|p| &p.name == name).ok_or_else(
                || IntrospectionError::UnknownDefaultProperty {
                    type_name: ty.name().to_string(),
                    name: name.clone(),
                },
            )?),
            None => None,
        };
        let default_event = match &hints.default_event {
            Some(name) => Some(event_sets.iter().position(|e| &e.name == name).ok_or_else(
                || IntrospectionError::UnknownDefaultEvent {
                    type_name: ty.name().to_string(),
                    name: name.clone(),
                },
            )?),
            None => None,
        };

        Ok(BeanInfo {
            bean: BeanDescriptor {
                bean_type: ty.clone(),
                display_name: hints
                    .display_name
                    .clone()
                    .unwrap_or_else(|| ty.simple_name().to_string()),
                customizer: hints.customizer.clone(),
                attributes: hints.attributes.clone(),
            },
            properties,
            event_sets,
            default_property,
            default_event,
        })
    }

    fn properties(
        &self,
        ty: &TypeRef,
        methods: &[Method],
        transient: &[String],
        constants: &IndexMap<String, Vec<String>>,
    ) -> IntrospectionResult<Vec<PropertyDescriptor>> {
        let mut accessors: IndexMap<String, Accessors> = IndexMap::new();
        for method in methods {
            let name = method.name();
            let params = method.params();
            if let (Some(rest), [], Some(returns)) = (name.strip_prefix("get"), params, method.returns()) {
                if !rest.is_empty() {
                    accessors.entry(decapitalize(rest)).or_default().read =
                        Some((name.to_string(), returns.to_string()));
                }
            } else if let (Some(rest), [], Some("boolean")) =
                (name.strip_prefix("is"), params, method.returns())
            {
                if !rest.is_empty() {
                    let entry = accessors.entry(decapitalize(rest)).or_default();
                    if entry.read.is_none() {
                        entry.read = Some((name.to_string(), "boolean".to_string()));
                    }
                }
            } else if let (Some(rest), [param], None) =
                (name.strip_prefix("set"), params, method.returns())
            {
                if !rest.is_empty() {
                    accessors
                        .entry(decapitalize(rest))
                        .or_default()
                        .writes
                        .push((name.to_string(), param.clone()));
                }
            }
        }

        accessors
            .into_iter()
            .map(|(name, accessors)| {
                let (read_method, write_method, property_type) = match accessors.read {
                    Some((getter, read_type)) => {
                        let setter = match accessors.writes.as_slice() {
                            [] => None,
                            writes => Some(
                                writes
                                    .iter()
                                    .find(|(_, t)| *t == read_type)
                                    .map(|(setter, _)| setter.clone())
                                    .ok_or_else(|| IntrospectionError::ConflictingAccessors {
                                        type_name: ty.name().to_string(),
                                        property: name.clone(),
                                        getter: read_type.clone(),
                                        setter: writes[0].1.clone(),
                                    })?,
                            ),
                        };
                        (Some(getter), setter, read_type)
                    }
                    None => {
                        let (setter, write_type) = accessors.writes[0].clone();
                        (None, Some(setter), write_type)
                    }
                };
                Ok(PropertyDescriptor {
                    transient: transient.contains(&name),
                    constants: constants.get(&name).cloned().unwrap_or_default(),
                    immutable_value: self.is_immutable_type(&property_type),
                    name,
                    property_type,
                    read_method,
                    write_method,
                })
            })
            .collect()
    }

    fn is_immutable_type(&self, type_name: &str) -> bool {
        if PrimitiveKind::from_type_name(type_name).is_some()
            || PrimitiveKind::from_wrapper_name(type_name).is_some()
            || matches!(type_name, "String" | "Class")
        {
            return true;
        }
        let resolved = match &self.registry {
            Some(registry) => registry.resolve(type_name),
            None => builtins::lookup(type_name),
        };
        resolved.is_some_and(|t| t.is_enum())
    }
}

fn inherited_hints(ty: &TypeRef) -> (Vec<String>, IndexMap<String, Vec<String>>) {
    let mut chain = vec![ty.clone()];
    while let Some(parent) = chain.last().and_then(|t| t.supertype().cloned()) {
        chain.push(parent);
    }
    let mut transient = Vec::new();
    let mut constants = IndexMap::new();
    for t in chain.iter().rev() {
        transient.extend(t.hints().transient.iter().cloned());
        for (property, names) in &t.hints().property_constants {
            constants.insert(property.clone(), names.clone());
        }
    }
    (transient, constants)
}

/// Event sets named in `transient` are kept but marked, the same way
/// transient properties are
fn event_sets(methods: &[Method], transient: &[String]) -> Vec<EventSetDescriptor> {
    methods
        .iter()
        .filter_map(|add| {
            let listener = add.name().strip_prefix("add")?;
            let [param] = add.params() else {
                return None;
            };
            let simple = param.rsplit('.').next().unwrap_or(param);
            if !listener.ends_with("Listener") || simple != listener {
                return None;
            }
            let remove_name = format!("remove{listener}");
            methods
                .iter()
                .find(|m| m.name() == remove_name && m.params() == add.params())?;
            let get_name = format!("get{listener}s");
            let get_method = methods
                .iter()
                .find(|m| m.name() == get_name && m.params().is_empty())
                .map(|m| m.name().to_string());
            let name = decapitalize(listener.strip_suffix("Listener").unwrap_or(listener));
            Some(EventSetDescriptor {
                transient: transient.contains(&name),
                name,
                listener_type: param.clone(),
                add_method: add.name().to_string(),
                remove_method: remove_name,
                get_method,
            })
        })
        .collect()
}

/// Lower-case the first character unless the first two are both upper case
#[must_use]
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_uppercase() && b.is_uppercase() => name.to_string(),
        (Some(first), _) => first.to_lowercase().chain(name.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bean_model::{TypeBuilder, Value};
    use pretty_assertions::assert_eq;
    use std::rc::Rc as StdRc;

    fn names(info: &BeanInfo) -> Vec<&str> {
        info.properties().iter().map(PropertyDescriptor::name).collect()
    }

    #[test]
    fn decapitalize_follows_convention() {
        assert_eq!(decapitalize("Name"), "name");
        assert_eq!(decapitalize("URL"), "URL");
        assert_eq!(decapitalize("X"), "x");
        assert_eq!(decapitalize(""), "");
    }

    #[test]
    fn properties_in_declaration_order_supertype_first() {
        let base = TypeBuilder::class("demo.Base").property("alpha", "int").build();
        let derived = TypeBuilder::class("demo.Derived")
            .extends(&base)
            .property("beta", "String")
            .read_only_property("gamma", "boolean")
            .build();

        let info = Introspector::new().bean_info(&derived).unwrap();
        assert_eq!(names(&info), vec!["class", "alpha", "beta", "gamma"]);

        let gamma = info.property("gamma").unwrap();
        assert_eq!(gamma.read_method(), Some("isGamma"));
        assert_eq!(gamma.write_method(), None);
        assert!(info.property("beta").unwrap().is_read_write());
        assert!(info.property("beta").unwrap().is_immutable_value());
    }

    #[test]
    fn transient_and_constant_hints() {
        let label = TypeBuilder::class("demo.Label")
            .property("alignment", "int")
            .property("cache", "Object")
            .constant("LEFT", Value::Int(0))
            .property_constants("alignment", &["LEFT"])
            .transient("cache")
            .build();
        let info = Introspector::new().bean_info(&label).unwrap();
        assert!(info.property("cache").unwrap().is_transient());
        assert_eq!(info.property("alignment").unwrap().constants(), ["LEFT".to_string()]);
    }

    #[test]
    fn event_sets_pair_add_and_remove() {
        let listener = TypeBuilder::interface("ui.ActionListener").build();
        let button = TypeBuilder::class("ui.Button")
            .listener_set(&listener)
            .default_event("action")
            .build();
        let info = Introspector::new().bean_info(&button).unwrap();
        let set = &info.event_sets()[0];
        assert_eq!(set.name(), "action");
        assert_eq!(set.listener_type(), "ui.ActionListener");
        assert_eq!(set.get_method(), Some("getActionListeners"));
        assert_eq!(info.default_event().unwrap().add_method(), "addActionListener");
        assert!(!set.is_transient());
    }

    #[test]
    fn transient_hint_marks_event_sets() {
        let action = TypeBuilder::interface("ui.ActionListener").build();
        let focus = TypeBuilder::interface("ui.FocusListener").build();
        let base = TypeBuilder::class("ui.Base").transient("focus").build();
        let field = TypeBuilder::class("ui.Field")
            .extends(&base)
            .listener_set(&action)
            .listener_set(&focus)
            .build();
        let info = Introspector::new().bean_info(&field).unwrap();
        let flags: Vec<_> = info
            .event_sets()
            .iter()
            .map(|e| (e.name(), e.is_transient()))
            .collect();
        assert_eq!(flags, vec![("action", false), ("focus", true)]);
    }

    #[test]
    fn unknown_default_property_is_an_error() {
        let ty = TypeBuilder::class("demo.Odd").default_property("nothing").build();
        let err = Introspector::new().bean_info(&ty).unwrap_err();
        assert!(matches!(err, IntrospectionError::UnknownDefaultProperty { .. }));
    }

    #[test]
    fn mismatched_setter_is_a_conflict() {
        let ty = TypeBuilder::class("demo.Odd")
            .method("getSize", &[], Some("int"), |_, _| Ok(Value::Int(0)))
            .method("setSize", &["String"], None, |_, _| Ok(Value::Null))
            .build();
        let err = Introspector::new().bean_info(&ty).unwrap_err();
        assert!(matches!(err, IntrospectionError::ConflictingAccessors { .. }));
    }

    #[test]
    fn results_are_cached() {
        let ty = TypeBuilder::class("demo.Cached").property("x", "int").build();
        let mut introspector = Introspector::new();
        let a = introspector.bean_info(&ty).unwrap();
        let b = introspector.bean_info(&ty).unwrap();
        assert!(StdRc::ptr_eq(&a, &b));
        assert_eq!(introspector.cached(), 1);
        introspector.flush();
        assert_eq!(introspector.cached(), 0);
    }

    #[test]
    fn enum_typed_properties_are_immutable_with_registry() {
        let color = TypeBuilder::enumeration("demo.Color", &["RED"]).build();
        let shape = TypeBuilder::class("demo.Shape").property("color", "demo.Color").build();
        let registry = TypeRegistry::new().with(color);
        let info = Introspector::new()
            .with_registry(registry)
            .bean_info(&shape)
            .unwrap();
        assert!(info.property("color").unwrap().is_immutable_value());
    }
}
