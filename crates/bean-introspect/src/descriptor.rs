//! Bean descriptors
//!
//! Read-only results of introspection: what a type exposes as properties,
//! event sets and bean-level metadata.

use bean_model::TypeRef;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Property derived from accessor conventions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub(crate) name: String,
    pub(crate) property_type: String,
    pub(crate) read_method: Option<String>,
    pub(crate) write_method: Option<String>,
    pub(crate) transient: bool,
    pub(crate) constants: Vec<String>,
    pub(crate) immutable_value: bool,
}

impl PropertyDescriptor {
    /// Property name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type name
    #[inline]
    #[must_use]
    pub fn property_type(&self) -> &str {
        &self.property_type
    }

    /// Getter name
    #[inline]
    #[must_use]
    pub fn read_method(&self) -> Option<&str> {
        self.read_method.as_deref()
    }

    /// Setter name
    #[inline]
    #[must_use]
    pub fn write_method(&self) -> Option<&str> {
        self.write_method.as_deref()
    }

    /// Whether the property is excluded from persistence
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Names of static constants of the declaring type usable as values
    #[inline]
    #[must_use]
    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    /// Whether values of the declared type are immutable or singletons
    /// (primitives, wrappers, strings, enumerations)
    #[inline]
    #[must_use]
    pub fn is_immutable_value(&self) -> bool {
        self.immutable_value
    }

    /// Whether both accessors exist
    #[inline]
    #[must_use]
    pub fn is_read_write(&self) -> bool {
        self.read_method.is_some() && self.write_method.is_some()
    }
}

/// Listener registration pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSetDescriptor {
    pub(crate) name: String,
    pub(crate) listener_type: String,
    pub(crate) add_method: String,
    pub(crate) remove_method: String,
    pub(crate) get_method: Option<String>,
    pub(crate) transient: bool,
}

impl EventSetDescriptor {
    /// Event set name (`action` for `ActionListener`)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Listener type name
    #[inline]
    #[must_use]
    pub fn listener_type(&self) -> &str {
        &self.listener_type
    }

    /// Registration method
    #[inline]
    #[must_use]
    pub fn add_method(&self) -> &str {
        &self.add_method
    }

    /// Deregistration method
    #[inline]
    #[must_use]
    pub fn remove_method(&self) -> &str {
        &self.remove_method
    }

    /// Listener array accessor
    #[inline]
    #[must_use]
    pub fn get_method(&self) -> Option<&str> {
        self.get_method.as_deref()
    }

    /// Whether registered listeners are excluded from persistence
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

/// Bean-level metadata
#[derive(Clone)]
pub struct BeanDescriptor {
    pub(crate) bean_type: TypeRef,
    pub(crate) display_name: String,
    pub(crate) customizer: Option<String>,
    pub(crate) attributes: IndexMap<String, Rc<dyn Any>>,
}

impl BeanDescriptor {
    /// Described type
    #[inline]
    #[must_use]
    pub fn bean_type(&self) -> &TypeRef {
        &self.bean_type
    }

    /// Unqualified type name
    #[must_use]
    pub fn name(&self) -> &str {
        self.bean_type.simple_name()
    }

    /// Human readable name, defaulting to the unqualified type name
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Customizer type name
    #[inline]
    #[must_use]
    pub fn customizer(&self) -> Option<&str> {
        self.customizer.as_deref()
    }

    /// Attribute by key
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Rc<dyn Any>> {
        self.attributes.get(key)
    }

    /// Attribute keys in declaration order
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

impl fmt::Debug for BeanDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescriptor")
            .field("bean_type", &self.bean_type)
            .field("display_name", &self.display_name)
            .field("customizer", &self.customizer)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Everything introspection knows about a type
#[derive(Debug, Clone)]
pub struct BeanInfo {
    pub(crate) bean: BeanDescriptor,
    pub(crate) properties: Vec<PropertyDescriptor>,
    pub(crate) event_sets: Vec<EventSetDescriptor>,
    pub(crate) default_property: Option<usize>,
    pub(crate) default_event: Option<usize>,
}

impl BeanInfo {
    /// Bean-level metadata
    #[inline]
    #[must_use]
    pub fn bean_descriptor(&self) -> &BeanDescriptor {
        &self.bean
    }

    /// Properties in declaration order, supertype first
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Property by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Event sets in declaration order
    #[inline]
    #[must_use]
    pub fn event_sets(&self) -> &[EventSetDescriptor] {
        &self.event_sets
    }

    /// Default property
    #[must_use]
    pub fn default_property(&self) -> Option<&PropertyDescriptor> {
        self.default_property.and_then(|i| self.properties.get(i))
    }

    /// Default event set
    #[must_use]
    pub fn default_event(&self) -> Option<&EventSetDescriptor> {
        self.default_event.and_then(|i| self.event_sets.get(i))
    }
}
