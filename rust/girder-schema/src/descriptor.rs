//! The closed type algebra every downstream component dispatches over.
//!
//! A [`TypeDescriptor`] is a tagged union describing the shape of a parameter,
//! result, or struct field. Named types are *references*: a
//! [`TypeDescriptor::Named`] carries a qualified name that resolves through a
//! [`TypeIndex`]. That indirection is what makes self-referential records
//! (trees, linked lists) representable at all, and it is why every recursive
//! walk over descriptors carries a visited set keyed by qualified name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Qualified name of a declared type, e.g. `Good` or `order.Good`.
pub type QualifiedName = String;

/// Primitive kinds eligible to appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    String,
}

impl PrimitiveKind {
    /// Integral kinds, i.e. everything except bool, floats and string.
    pub fn is_integral(self) -> bool {
        !matches!(
            self,
            PrimitiveKind::Bool | PrimitiveKind::F32 | PrimitiveKind::F64 | PrimitiveKind::String
        )
    }
}

/// A single field of a struct, request record, or response record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeDescriptor,

    /// Unexported fields are skipped by the validator and every emitter.
    #[serde(default = "default_true")]
    pub exported: bool,

    /// Serialization name override. Falls back to the declared name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_name: Option<String>,
}

fn default_true() -> bool {
    true
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            exported: true,
            wire_name: None,
        }
    }

    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    /// Name this field serializes under.
    pub fn wire(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }
}

/// An anonymous struct shape: an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    /// Fields visible to serialization, in declaration order.
    pub fn exported_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.exported)
    }
}

/// Closed tagged union over every type shape the pipeline understands.
///
/// Adding a variant is a compile-time-checked change: the validator and every
/// backend generator match exhaustively on this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),

    /// Reference to a declared type, resolved through the [`TypeIndex`].
    Named(QualifiedName),

    Pointer(Box<TypeDescriptor>),

    Array {
        len: usize,
        elem: Box<TypeDescriptor>,
    },

    Slice(Box<TypeDescriptor>),

    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },

    Struct(StructDef),

    /// Function values: never serializable.
    Function,

    /// Channel values: never serializable.
    Channel,

    /// A bare capability set (open interface): never serializable.
    Interface,

    /// The context-capability marker. Must be the first parameter of every
    /// method and never appears in generated records.
    Context,

    /// The error-capability marker. Must be the last result of every method
    /// and never appears in generated records.
    ErrorMarker,
}

impl TypeDescriptor {
    pub fn string() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::String)
    }

    pub fn bool() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Bool)
    }

    pub fn i64() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::I64)
    }

    pub fn f64() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::F64)
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeDescriptor::Named(name.into())
    }

    pub fn pointer(elem: TypeDescriptor) -> Self {
        TypeDescriptor::Pointer(Box::new(elem))
    }

    pub fn slice(elem: TypeDescriptor) -> Self {
        TypeDescriptor::Slice(Box::new(elem))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }
}

/// Declared types by qualified name.
///
/// The index is built once from the introspection input and read-only
/// thereafter. `Named` descriptors resolve here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeIndex {
    types: BTreeMap<QualifiedName, TypeDescriptor>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: TypeDescriptor) {
        self.types.insert(name.into(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Resolve a descriptor through any chain of `Named` references.
    ///
    /// Returns `None` for an unknown name or a reference cycle that never
    /// reaches a concrete shape (e.g. `type A = B; type B = A`).
    pub fn resolve<'a>(&'a self, ty: &'a TypeDescriptor) -> Option<&'a TypeDescriptor> {
        let mut seen: Vec<&str> = Vec::new();
        let mut cur = ty;
        while let TypeDescriptor::Named(name) = cur {
            if seen.iter().any(|s| s == name) {
                return None;
            }
            seen.push(name);
            cur = self.get(name)?;
        }
        Some(cur)
    }
}
