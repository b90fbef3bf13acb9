//! Dynamic values
//!
//! [`Value`] is the unit of data flowing through statements: primitives,
//! strings, meta-references to types and fields, enumeration constants and
//! object references with identity.

use crate::builtins;
use crate::error::{InvokeError, InvokeResult};
use crate::object::ObjectRef;
use crate::types::{PrimitiveKind, TypeRef};
use std::fmt;
use std::rc::Rc;

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// `boolean`
    Bool(bool),
    /// `char`
    Char(char),
    /// `byte`
    Byte(i8),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Immutable string, compared by content
    Str(Rc<str>),
    /// Meta-reference to a type
    Type(TypeRef),
    /// Meta-reference to a field
    Field(FieldRef),
    /// Enumeration constant
    Enum(EnumConstant),
    /// Reference to an object with identity
    Object(ObjectRef),
}

/// Identity key of a value
///
/// Objects are keyed by allocation, everything else by content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// `boolean`
    Bool(bool),
    /// `char`
    Char(char),
    /// `byte`
    Byte(i8),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`, by bit pattern
    Float(u32),
    /// `double`, by bit pattern
    Double(u64),
    /// String content
    Str(Rc<str>),
    /// Type name
    Type(String),
    /// Owner type name and field name
    Field(String, String),
    /// Enumeration type name and constant name
    Enum(String, String),
    /// Object allocation address
    Object(usize),
}

impl Value {
    /// String value
    #[must_use]
    pub fn str(text: impl AsRef<str>) -> Self {
        Self::Str(Rc::from(text.as_ref()))
    }

    /// Zero value for a declared type name: primitives get their zero, everything else null
    #[must_use]
    pub fn default_for(type_name: &str) -> Self {
        PrimitiveKind::from_type_name(type_name).map_or(Self::Null, PrimitiveKind::default_value)
    }

    /// Whether this is `Null`
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this is a primitive
    #[inline]
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        PrimitiveKind::of(self).is_some()
    }

    /// Values that are their own replay counterpart and are never tracked
    #[inline]
    #[must_use]
    pub fn is_self_evident(&self) -> bool {
        matches!(self, Self::Null | Self::Str(_) | Self::Type(_) | Self::Field(_))
    }

    /// Object reference, if any
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// String content, if any
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Type meta-reference, if any
    #[inline]
    #[must_use]
    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            Self::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// Integral value widened to `i64`
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(i64::from(v)),
            Self::Short(v) => Some(i64::from(v)),
            Self::Int(v) => Some(i64::from(v)),
            Self::Long(v) => Some(v),
            Self::Char(c) => Some(i64::from(u32::from(c))),
            _ => None,
        }
    }

    /// Boolean value, if any
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Runtime type (`None` only for `Null`)
    #[must_use]
    pub fn runtime_type(&self) -> Option<TypeRef> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => builtins::wrapper(PrimitiveKind::Boolean),
            Self::Char(_) => builtins::wrapper(PrimitiveKind::Char),
            Self::Byte(_) => builtins::wrapper(PrimitiveKind::Byte),
            Self::Short(_) => builtins::wrapper(PrimitiveKind::Short),
            Self::Int(_) => builtins::wrapper(PrimitiveKind::Int),
            Self::Long(_) => builtins::wrapper(PrimitiveKind::Long),
            Self::Float(_) => builtins::wrapper(PrimitiveKind::Float),
            Self::Double(_) => builtins::wrapper(PrimitiveKind::Double),
            Self::Str(_) => builtins::string(),
            Self::Type(_) => builtins::class(),
            Self::Field(_) => builtins::field(),
            Self::Enum(constant) => constant.class().clone(),
            Self::Object(obj) => obj.class(),
        })
    }

    /// Identity key (`None` only for `Null`)
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(v) => Identity::Bool(*v),
            Self::Char(v) => Identity::Char(*v),
            Self::Byte(v) => Identity::Byte(*v),
            Self::Short(v) => Identity::Short(*v),
            Self::Int(v) => Identity::Int(*v),
            Self::Long(v) => Identity::Long(*v),
            Self::Float(v) => Identity::Float(v.to_bits()),
            Self::Double(v) => Identity::Double(v.to_bits()),
            Self::Str(s) => Identity::Str(s.clone()),
            Self::Type(ty) => Identity::Type(ty.name().to_string()),
            Self::Field(f) => Identity::Field(f.owner().name().to_string(), f.name().to_string()),
            Self::Enum(c) => Identity::Enum(c.class().name().to_string(), c.name().to_string()),
            Self::Object(obj) => Identity::Object(obj.address()),
        })
    }

    /// Whether both values have the same identity
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    /// Value equality
    ///
    /// Objects compare by identity unless their type declares an equality;
    /// built-in collections and dates compare by content.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Type(a), Self::Type(b)) => a == b,
            (Self::Field(a), Self::Field(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.equals(b),
            _ => false,
        }
    }

    /// Whether this value may be passed where `type_name` is declared
    #[must_use]
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        if type_name == "Object" {
            return true;
        }
        if let Some(kind) = PrimitiveKind::from_type_name(type_name) {
            return PrimitiveKind::of(self) == Some(kind);
        }
        match self {
            Self::Null => true,
            Self::Type(_) => type_name == "Class",
            Self::Field(_) => type_name == "Field",
            _ => self
                .runtime_type()
                .is_some_and(|ty| ty.is_subtype_of(type_name)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Double(v) => write!(f, "{v:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Type(ty) => f.write_str(ty.name()),
            Self::Field(field) => write!(f, "{}.{}", field.owner().simple_name(), field.name()),
            Self::Enum(c) => write!(f, "{}.{}", c.class().simple_name(), c.name()),
            Self::Object(obj) => write!(f, "{}@{:x}", obj.class().simple_name(), obj.address()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Type(ty) => write!(f, "Type({})", ty.name()),
            Self::Object(_) => write!(f, "Object({self})"),
            other => write!(f, "{other}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::str(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl From<TypeRef> for Value {
    fn from(v: TypeRef) -> Self {
        Self::Type(v)
    }
}

/// Enumeration constant: a singleton identified by type and name
#[derive(Clone)]
pub struct EnumConstant {
    class: TypeRef,
    name: Rc<str>,
    ordinal: usize,
}

impl EnumConstant {
    pub(crate) fn new(class: TypeRef, name: &str, ordinal: usize) -> Self {
        Self {
            class,
            name: Rc::from(name),
            ordinal,
        }
    }

    /// Enumeration type
    #[inline]
    #[must_use]
    pub fn class(&self) -> &TypeRef {
        &self.class
    }

    /// Constant name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in declaration order
    #[inline]
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl PartialEq for EnumConstant {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.name == other.name
    }
}

impl Eq for EnumConstant {}

/// Meta-reference to a field of a type
#[derive(Clone)]
pub struct FieldRef {
    owner: TypeRef,
    name: Rc<str>,
}

impl FieldRef {
    /// Reference `owner.name`
    #[must_use]
    pub fn new(owner: TypeRef, name: &str) -> Self {
        Self {
            owner,
            name: Rc::from(name),
        }
    }

    /// Declaring type
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &TypeRef {
        &self.owner
    }

    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> InvokeResult<crate::types::FieldDescriptor> {
        self.owner
            .find_field(&self.name)
            .ok_or_else(|| InvokeError::NoSuchField {
                type_name: self.owner.name().to_string(),
                field: self.name.to_string(),
            })
    }

    /// Read the field from `target` (ignored for static fields)
    ///
    /// # Errors
    /// Unknown field, or a non-object target for an instance field
    pub fn get(&self, target: &Value) -> InvokeResult<Value> {
        let field = self.descriptor()?;
        if field.is_static {
            return Ok(field.value.unwrap_or_default());
        }
        let obj = target
            .as_object()
            .ok_or_else(|| InvokeError::mismatch(self.owner.name(), target.to_string()))?;
        obj.slot(&self.name).ok_or_else(|| InvokeError::NoSuchField {
            type_name: obj.class().name().to_string(),
            field: self.name.to_string(),
        })
    }

    /// Assign the field on `target`
    ///
    /// # Errors
    /// Static or final fields, type mismatches and non-object targets
    pub fn set(&self, target: &Value, value: Value) -> InvokeResult<()> {
        let field = self.descriptor()?;
        if field.is_static || field.is_final {
            return Err(InvokeError::Unsupported(format!(
                "field {}.{} is not assignable",
                self.owner.name(),
                self.name
            )));
        }
        if !value.is_assignable_to(&field.type_name) {
            return Err(InvokeError::mismatch(field.type_name, value.to_string()));
        }
        let obj = target
            .as_object()
            .ok_or_else(|| InvokeError::mismatch(self.owner.name(), target.to_string()))?;
        obj.set_slot(&self.name, value)
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

impl Eq for FieldRef {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;

    #[test]
    fn primitives_compare_by_value_and_variant() {
        assert!(Value::Int(3).equals(&Value::Int(3)));
        assert!(!Value::Int(3).equals(&Value::Long(3)));
        assert!(Value::Double(f64::NAN).equals(&Value::Double(f64::NAN)));
        assert!(Value::str("a").equals(&Value::str("a")));
        assert!(Value::Null.equals(&Value::Null));
        assert!(!Value::Null.equals(&Value::Int(0)));
    }

    #[test]
    fn objects_compare_by_identity_by_default() {
        let point = TypeBuilder::class("demo.P").property("x", "int").build();
        let a = point.construct(&[]).unwrap();
        let b = point.construct(&[]).unwrap();
        assert!(a.equals(&a.clone()));
        assert!(!a.equals(&b));
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn self_evident_values() {
        let ty = TypeBuilder::class("demo.S").build();
        assert!(Value::Null.is_self_evident());
        assert!(Value::str("x").is_self_evident());
        assert!(Value::Type(ty.clone()).is_self_evident());
        assert!(Value::Field(FieldRef::new(ty, "f")).is_self_evident());
        assert!(!Value::Int(1).is_self_evident());
    }

    #[test]
    fn assignability() {
        assert!(Value::Int(1).is_assignable_to("int"));
        assert!(Value::Int(1).is_assignable_to("Integer"));
        assert!(Value::Int(1).is_assignable_to("Number"));
        assert!(Value::Int(1).is_assignable_to("Object"));
        assert!(!Value::Int(1).is_assignable_to("long"));
        assert!(!Value::Null.is_assignable_to("int"));
        assert!(Value::Null.is_assignable_to("String"));
        assert!(Value::str("s").is_assignable_to("String"));
        assert!(!Value::str("s").is_assignable_to("Integer"));
    }

    #[test]
    fn runtime_types_of_primitives() {
        assert_eq!(Value::Int(1).runtime_type().unwrap().name(), "Integer");
        assert_eq!(Value::Bool(true).runtime_type().unwrap().name(), "Boolean");
        assert_eq!(Value::str("s").runtime_type().unwrap().name(), "String");
        assert!(Value::Null.runtime_type().is_none());
    }

    #[test]
    fn field_access() {
        let record = TypeBuilder::class("demo.R")
            .field("note", "String")
            .constant("LIMIT", Value::Int(9))
            .build();
        let obj = record.construct(&[]).unwrap();
        let note = FieldRef::new(record.clone(), "note");
        note.set(&obj, Value::str("hi")).unwrap();
        assert!(note.get(&obj).unwrap().equals(&Value::str("hi")));

        let limit = FieldRef::new(record, "LIMIT");
        assert!(limit.get(&Value::Null).unwrap().equals(&Value::Int(9)));
        assert!(limit.set(&Value::Null, Value::Int(1)).is_err());
    }
}
