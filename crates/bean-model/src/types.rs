//! Type descriptors
//!
//! A [`TypeDescriptor`] answers every question the encoder would otherwise put
//! to a reflective runtime: supertype chain, constructors, methods, fields,
//! declared equality and bean hints. Descriptors are immutable once built and
//! shared as [`TypeRef`].

use crate::error::{InvokeError, InvokeResult};
use crate::object::ObjectRef;
use crate::value::{EnumConstant, Value};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

/// Body of an instance method: receives the target and the arguments
pub type MethodBody = Rc<dyn Fn(&Value, &[Value]) -> InvokeResult<Value>>;

/// Body of a constructor or static method: receives the owning type
pub type StaticBody = Rc<dyn Fn(&TypeRef, &[Value]) -> InvokeResult<Value>>;

/// Declared equality between two instances of a type
pub type EqualityFn = Rc<dyn Fn(&ObjectRef, &ObjectRef) -> bool>;

/// The eight primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `boolean` / `Boolean`
    Boolean,
    /// `char` / `Character`
    Char,
    /// `byte` / `Byte`
    Byte,
    /// `short` / `Short`
    Short,
    /// `int` / `Integer`
    Int,
    /// `long` / `Long`
    Long,
    /// `float` / `Float`
    Float,
    /// `double` / `Double`
    Double,
}

impl PrimitiveKind {
    /// All primitive kinds
    pub const ALL: [Self; 8] = [
        Self::Boolean,
        Self::Char,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
    ];

    /// Primitive type name (`int`)
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Wrapper type name (`Integer`)
    #[must_use]
    pub fn wrapper_name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Char => "Character",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
        }
    }

    /// Kind for a primitive type name
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }

    /// Kind for a wrapper type name
    #[must_use]
    pub fn from_wrapper_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wrapper_name() == name)
    }

    /// Kind of a primitive value
    #[must_use]
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::Boolean),
            Value::Char(_) => Some(Self::Char),
            Value::Byte(_) => Some(Self::Byte),
            Value::Short(_) => Some(Self::Short),
            Value::Int(_) => Some(Self::Int),
            Value::Long(_) => Some(Self::Long),
            Value::Float(_) => Some(Self::Float),
            Value::Double(_) => Some(Self::Double),
            _ => None,
        }
    }

    /// Zero value of this kind
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Char => Value::Char('\0'),
            Self::Byte => Value::Byte(0),
            Self::Short => Value::Short(0),
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
        }
    }

    /// Parse the textual form produced by [`Value`]'s `Display`
    ///
    /// # Errors
    /// Returns [`InvokeError::Raised`] when the text is not a valid literal
    pub fn parse(self, text: &str) -> InvokeResult<Value> {
        Ok(match self {
            Self::Boolean => Value::Bool(text.eq_ignore_ascii_case("true")),
            Self::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => return Err(self.parse_failure(text, "expected a single character")),
                }
            }
            Self::Byte => Value::Byte(self.parse_number(text)?),
            Self::Short => Value::Short(self.parse_number(text)?),
            Self::Int => Value::Int(self.parse_number(text)?),
            Self::Long => Value::Long(self.parse_number(text)?),
            Self::Float => Value::Float(self.parse_number(text)?),
            Self::Double => Value::Double(self.parse_number(text)?),
        })
    }

    fn parse_number<T>(self, text: &str) -> InvokeResult<T>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        text.trim()
            .parse()
            .map_err(|e: T::Err| self.parse_failure(text, &e.to_string()))
    }

    fn parse_failure(self, text: &str, reason: &str) -> InvokeError {
        InvokeError::raised(
            format!("{}.new", self.wrapper_name()),
            format!("cannot parse '{text}': {reason}"),
        )
    }
}

/// What sort of type a descriptor describes
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Instantiable or abstract class
    Class,
    /// Interface: no instances of its own, implemented by classes and proxies
    Interface,
    /// Primitive type such as `int`
    Primitive(PrimitiveKind),
    /// Array type with its component type
    Array(TypeRef),
    /// Enumeration with a fixed set of constants
    Enumeration,
}

/// Shape of the state carried by instances of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Named slots only
    #[default]
    Plain,
    /// Fixed-length element storage
    Array,
    /// Growable ordered list
    List,
    /// Insertion-ordered set
    Set,
    /// Insertion-ordered map
    Map,
    /// Instant in time
    Date,
    /// Forwarding wrapper around an interface set and a handler
    Proxy,
    /// Handler that forwards calls to an action on a target
    EventHandler,
}

/// Declared instance slot
#[derive(Debug, Clone)]
pub struct SlotSpec {
    /// Slot name
    pub name: String,
    /// Declared type name, used to pick the default value
    pub type_name: String,
}

#[derive(Clone)]
enum Invocable {
    Instance(MethodBody),
    Static(StaticBody),
}

/// Named operation with a parameter signature
#[derive(Clone)]
pub struct Method {
    name: String,
    params: Vec<String>,
    returns: Option<String>,
    body: Invocable,
}

impl Method {
    /// Instance method
    #[must_use]
    pub fn instance(
        name: impl Into<String>,
        params: Vec<String>,
        returns: Option<String>,
        body: MethodBody,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            body: Invocable::Instance(body),
        }
    }

    /// Static method
    #[must_use]
    pub fn associated(
        name: impl Into<String>,
        params: Vec<String>,
        returns: Option<String>,
        body: StaticBody,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            body: Invocable::Static(body),
        }
    }

    /// Method name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter type names
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Declared return type name (`None` for void)
    #[inline]
    #[must_use]
    pub fn returns(&self) -> Option<&str> {
        self.returns.as_deref()
    }

    /// Whether this is a static method
    #[inline]
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self.body, Invocable::Static(_))
    }

    /// Whether the arguments fit this method's signature
    #[must_use]
    pub fn accepts(&self, args: &[Value]) -> bool {
        signature_accepts(&self.params, args)
    }

    /// Invoke as an instance method on `target`
    ///
    /// # Errors
    /// Propagates the body's failure; static methods are rejected
    pub fn call(&self, target: &Value, args: &[Value]) -> InvokeResult<Value> {
        match &self.body {
            Invocable::Instance(body) => body(target, args),
            Invocable::Static(_) => Err(InvokeError::Unsupported(format!(
                "static method {} invoked on an instance",
                self.name
            ))),
        }
    }

    /// Invoke as a static method of `owner`
    ///
    /// # Errors
    /// Propagates the body's failure; instance methods are rejected
    pub fn call_static(&self, owner: &TypeRef, args: &[Value]) -> InvokeResult<Value> {
        match &self.body {
            Invocable::Static(body) => body(owner, args),
            Invocable::Instance(_) => Err(InvokeError::Unsupported(format!(
                "instance method {} invoked without a target",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

/// Constructor with a parameter signature
#[derive(Clone)]
pub struct Constructor {
    params: Vec<String>,
    body: StaticBody,
}

impl Constructor {
    /// Create a constructor
    #[must_use]
    pub fn new(params: Vec<String>, body: StaticBody) -> Self {
        Self { params, body }
    }

    /// Declared parameter type names
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Whether the arguments fit this constructor's signature
    #[must_use]
    pub fn accepts(&self, args: &[Value]) -> bool {
        signature_accepts(&self.params, args)
    }

    /// Run the constructor for `owner`
    ///
    /// # Errors
    /// Propagates the body's failure
    pub fn call(&self, owner: &TypeRef, args: &[Value]) -> InvokeResult<Value> {
        (self.body)(owner, args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "new({})", self.params.join(", "))
    }
}

fn signature_accepts(params: &[String], args: &[Value]) -> bool {
    params.len() == args.len() && params.iter().zip(args).all(|(p, a)| a.is_assignable_to(p))
}

/// Declared field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Declared type name
    pub type_name: String,
    /// Accessible from outside the type
    pub is_public: bool,
    /// Belongs to the type rather than to instances
    pub is_static: bool,
    /// Cannot be assigned
    pub is_final: bool,
    /// Excluded from persistence
    pub is_transient: bool,
    /// Value of a static field
    pub value: Option<Value>,
}

/// Hints consumed by the introspection service
#[derive(Clone, Default)]
pub struct BeanHints {
    /// Human readable name
    pub display_name: Option<String>,
    /// Name of the customizer type
    pub customizer: Option<String>,
    /// Name of the default property
    pub default_property: Option<String>,
    /// Name of the default event set
    pub default_event: Option<String>,
    /// Properties excluded from persistence
    pub transient: Vec<String>,
    /// Per-property names of static constants usable as values
    pub property_constants: IndexMap<String, Vec<String>>,
    /// Arbitrary attributes, keyed by name
    pub attributes: IndexMap<String, Rc<dyn Any>>,
}

impl fmt::Debug for BeanHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanHints")
            .field("display_name", &self.display_name)
            .field("customizer", &self.customizer)
            .field("default_property", &self.default_property)
            .field("default_event", &self.default_event)
            .field("transient", &self.transient)
            .field("property_constants", &self.property_constants)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Immutable description of a type
pub struct TypeDescriptor {
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) supertype: Option<TypeRef>,
    pub(crate) interfaces: Vec<TypeRef>,
    pub(crate) layout: Layout,
    pub(crate) slots: Vec<SlotSpec>,
    pub(crate) constructors: Vec<Constructor>,
    pub(crate) methods: Vec<Method>,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) equality: Option<EqualityFn>,
    pub(crate) constructor_properties: Option<Vec<String>>,
    pub(crate) enum_constants: Vec<String>,
    pub(crate) hints: BeanHints,
}

impl TypeDescriptor {
    /// Qualified name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name after the last `.`
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Kind of type
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Direct supertype
    #[inline]
    #[must_use]
    pub fn supertype(&self) -> Option<&TypeRef> {
        self.supertype.as_ref()
    }

    /// Directly implemented interfaces
    #[inline]
    #[must_use]
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// Instance layout
    #[inline]
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Constructors declared by this type
    #[inline]
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Methods declared by this type
    #[inline]
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Fields declared by this type
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Constructor-property names declared by this type
    #[inline]
    #[must_use]
    pub fn constructor_properties(&self) -> Option<&[String]> {
        self.constructor_properties.as_deref()
    }

    /// Enumeration constant names in ordinal order
    #[inline]
    #[must_use]
    pub fn enum_constant_names(&self) -> &[String] {
        &self.enum_constants
    }

    /// Bean hints
    #[inline]
    #[must_use]
    pub fn hints(&self) -> &BeanHints {
        &self.hints
    }

    /// Whether this is an interface
    #[inline]
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface)
    }

    /// Whether this is an enumeration
    #[inline]
    #[must_use]
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enumeration)
    }

    /// Primitive kind of a primitive type
    #[must_use]
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Component type of an array type
    #[must_use]
    pub fn component_type(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Whether this type is, extends or implements `name`
    #[must_use]
    pub fn is_subtype_of(&self, name: &str) -> bool {
        self.name == name
            || self.supertype.as_ref().is_some_and(|s| s.is_subtype_of(name))
            || self.interfaces.iter().any(|i| i.is_subtype_of(name))
    }

    /// Equality declared by this type itself
    #[inline]
    #[must_use]
    pub fn declared_equality(&self) -> Option<&EqualityFn> {
        self.equality.as_ref()
    }

    /// Equality declared by this type or inherited from a supertype
    #[must_use]
    pub fn equality(&self) -> Option<EqualityFn> {
        self.equality
            .clone()
            .or_else(|| self.supertype.as_ref().and_then(|s| s.equality()))
    }

    /// Whether a constructor without parameters exists
    #[must_use]
    pub fn has_nullary_constructor(&self) -> bool {
        self.constructors.iter().any(|c| c.params.is_empty())
    }

    /// Instance method compatible with `args`, searched along the supertype chain
    #[must_use]
    pub fn find_method(&self, name: &str, args: &[Value]) -> Option<Method> {
        self.methods
            .iter()
            .find(|m| !m.is_static() && m.name == name && m.accepts(args))
            .cloned()
            .or_else(|| self.supertype.as_ref().and_then(|s| s.find_method(name, args)))
    }

    /// Static method compatible with `args`, searched along the supertype chain
    #[must_use]
    pub fn find_static(&self, name: &str, args: &[Value]) -> Option<Method> {
        self.methods
            .iter()
            .find(|m| m.is_static() && m.name == name && m.accepts(args))
            .cloned()
            .or_else(|| self.supertype.as_ref().and_then(|s| s.find_static(name, args)))
    }

    /// Instance methods of this type and its supertypes, supertype first
    ///
    /// A method redeclared by a subtype keeps its supertype position.
    #[must_use]
    pub fn all_methods(&self) -> Vec<Method> {
        let mut methods = self
            .supertype
            .as_ref()
            .map(|s| s.all_methods())
            .unwrap_or_default();
        for method in self.methods.iter().filter(|m| !m.is_static()) {
            match methods
                .iter_mut()
                .find(|m| m.name == method.name && m.params == method.params)
            {
                Some(existing) => *existing = method.clone(),
                None => methods.push(method.clone()),
            }
        }
        methods
    }

    /// Field by name, searched along the supertype chain
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .cloned()
            .or_else(|| self.supertype.as_ref().and_then(|s| s.find_field(name)))
    }

    /// Fields of this type and its supertypes, supertype first
    #[must_use]
    pub fn all_fields(&self) -> Vec<FieldDescriptor> {
        let mut fields = self
            .supertype
            .as_ref()
            .map(|s| s.all_fields())
            .unwrap_or_default();
        fields.extend(self.fields.iter().cloned());
        fields
    }

    /// Slots of this type and its supertypes, supertype first
    #[must_use]
    pub fn all_slots(&self) -> Vec<SlotSpec> {
        let mut slots = self
            .supertype
            .as_ref()
            .map(|s| s.all_slots())
            .unwrap_or_default();
        slots.extend(self.slots.iter().cloned());
        slots
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("supertype", &self.supertype)
            .field("layout", &self.layout)
            .field("constructors", &self.constructors)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// Shared handle to a [`TypeDescriptor`]
///
/// Two handles are equal when they name the same type.
#[derive(Clone)]
pub struct TypeRef(Rc<TypeDescriptor>);

impl TypeRef {
    /// Wrap a descriptor
    #[must_use]
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self(Rc::new(descriptor))
    }

    /// Run a compatible constructor
    ///
    /// # Errors
    /// [`InvokeError::NoSuchConstructor`] when no constructor fits, otherwise
    /// the constructor's own failure
    pub fn construct(&self, args: &[Value]) -> InvokeResult<Value> {
        let constructor = self
            .constructors
            .iter()
            .find(|c| c.accepts(args))
            .ok_or_else(|| InvokeError::NoSuchConstructor {
                type_name: self.name.clone(),
                arity: args.len(),
            })?;
        constructor.call(self, args)
    }

    /// Invoke a static method
    ///
    /// # Errors
    /// [`InvokeError::NoSuchMethod`] when no static method fits
    pub fn invoke_static(&self, name: &str, args: &[Value]) -> InvokeResult<Value> {
        let method = self
            .find_static(name, args)
            .ok_or_else(|| InvokeError::NoSuchMethod {
                type_name: self.name.clone(),
                method: name.to_string(),
                arity: args.len(),
            })?;
        method.call_static(self, args)
    }

    /// Enumeration constant by name
    #[must_use]
    pub fn enum_constant(&self, name: &str) -> Option<Value> {
        self.enum_constants
            .iter()
            .position(|c| c == name)
            .map(|ordinal| Value::Enum(EnumConstant::new(self.clone(), name, ordinal)))
    }

    /// All enumeration constants in ordinal order
    #[must_use]
    pub fn enum_constants(&self) -> Vec<Value> {
        self.enum_constants
            .iter()
            .enumerate()
            .map(|(ordinal, name)| Value::Enum(EnumConstant::new(self.clone(), name, ordinal)))
            .collect()
    }

    /// Whether both handles share the same allocation
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for TypeRef {
    type Target = TypeDescriptor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;

    #[test]
    fn primitive_names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_type_name(kind.type_name()), Some(kind));
            assert_eq!(PrimitiveKind::from_wrapper_name(kind.wrapper_name()), Some(kind));
            assert_eq!(PrimitiveKind::of(&kind.default_value()), Some(kind));
        }
    }

    #[test]
    fn parse_literals() {
        assert!(PrimitiveKind::Int.parse("42").unwrap().equals(&Value::Int(42)));
        assert!(PrimitiveKind::Char.parse("x").unwrap().equals(&Value::Char('x')));
        assert!(PrimitiveKind::Double.parse("1.5").unwrap().equals(&Value::Double(1.5)));
        assert!(PrimitiveKind::Int.parse("forty").is_err());
        assert!(PrimitiveKind::Char.parse("xy").is_err());
    }

    #[test]
    fn subtype_walks_supertypes_and_interfaces() {
        let listener = TypeBuilder::interface("ui.Listener").build();
        let base = TypeBuilder::class("demo.Base").implements(&listener).build();
        let derived = TypeBuilder::class("demo.Derived").extends(&base).build();

        assert!(derived.is_subtype_of("demo.Derived"));
        assert!(derived.is_subtype_of("demo.Base"));
        assert!(derived.is_subtype_of("ui.Listener"));
        assert!(derived.is_subtype_of("Object"));
        assert!(!base.is_subtype_of("demo.Derived"));
    }

    #[test]
    fn overridden_methods_keep_supertype_position() {
        let base = TypeBuilder::class("demo.Base")
            .property("alpha", "int")
            .property("beta", "int")
            .build();
        let derived = TypeBuilder::class("demo.Derived")
            .extends(&base)
            .method("getAlpha", &[], Some("int"), |_, _| Ok(Value::Int(7)))
            .build();

        let names: Vec<_> = derived
            .all_methods()
            .into_iter()
            .map(|m| m.name().to_string())
            .filter(|n| n.starts_with("get") && n != "getClass")
            .collect();
        assert_eq!(names, vec!["getAlpha", "getBeta"]);
    }

    #[test]
    fn type_ref_equality_is_by_name() {
        let a = TypeBuilder::class("demo.Same").build();
        let b = TypeBuilder::class("demo.Same").build();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }
}
