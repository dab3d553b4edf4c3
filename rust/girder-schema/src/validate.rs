//! The serializability predicate: which type shapes may appear in a
//! wire-facing request or response.
//!
//! Pure, total, and cycle-safe. Callers decide what a `false` means — the
//! default model builder drops the offending method with a warning, the
//! strict variant aborts the run.

use std::collections::HashSet;

use crate::descriptor::{PrimitiveKind, TypeDescriptor, TypeIndex};

/// Whether a primitive kind may be used as a map key: integral or string,
/// never bool or floating point.
pub fn is_key_eligible(kind: PrimitiveKind) -> bool {
    kind.is_integral() || kind == PrimitiveKind::String
}

/// Whether `ty` is legal in a request/response position.
///
/// Rules:
/// - primitives are serializable;
/// - structs are serializable iff every exported field is;
/// - pointers are serializable iff the element is not itself a pointer and is
///   serializable;
/// - slices and arrays defer to their element;
/// - maps need a key-eligible key and a serializable value;
/// - named types defer to their index entry; an unknown name is not
///   serializable;
/// - functions, channels, bare interfaces, and the context/error markers are
///   never serializable.
///
/// Recursion through named types is guarded by a visited set, so a
/// self-referential struct (a tree node holding `[]Node`) terminates and is
/// accepted on the assumption that the cycle itself is well-formed.
pub fn is_serializable(ty: &TypeDescriptor, index: &TypeIndex) -> bool {
    let mut visited = HashSet::new();
    serializable(ty, index, &mut visited)
}

fn serializable(ty: &TypeDescriptor, index: &TypeIndex, visited: &mut HashSet<String>) -> bool {
    match ty {
        TypeDescriptor::Primitive(_) => true,
        TypeDescriptor::Named(name) => {
            if !visited.insert(name.clone()) {
                return true;
            }
            match index.get(name) {
                Some(underlying) => serializable(underlying, index, visited),
                None => false,
            }
        }
        TypeDescriptor::Pointer(elem) => match elem.as_ref() {
            TypeDescriptor::Pointer(_) => false,
            other => serializable(other, index, visited),
        },
        TypeDescriptor::Array { elem, .. } | TypeDescriptor::Slice(elem) => {
            serializable(elem, index, visited)
        }
        TypeDescriptor::Map { key, value } => {
            let key_ok = match key.as_ref() {
                TypeDescriptor::Primitive(kind) => is_key_eligible(*kind),
                _ => false,
            };
            key_ok && serializable(value, index, visited)
        }
        TypeDescriptor::Struct(def) => def
            .exported_fields()
            .all(|f| serializable(&f.ty, index, visited)),
        TypeDescriptor::Function
        | TypeDescriptor::Channel
        | TypeDescriptor::Interface
        | TypeDescriptor::Context
        | TypeDescriptor::ErrorMarker => false,
    }
}

/// Stricter shape check applied by the schema-emitting backends (proto,
/// OpenAPI): everything [`is_serializable`] requires, plus no slice of maps
/// and no map whose value is itself a map or a slice. Those shapes have no
/// representation in the target schema languages, so the backends fail loudly
/// instead of silently skipping them.
pub fn fits_wire_schema(ty: &TypeDescriptor, index: &TypeIndex) -> bool {
    if !is_serializable(ty, index) {
        return false;
    }
    let mut visited = HashSet::new();
    schema_shaped(ty, index, &mut visited)
}

fn schema_shaped(ty: &TypeDescriptor, index: &TypeIndex, visited: &mut HashSet<String>) -> bool {
    match ty {
        TypeDescriptor::Primitive(_) => true,
        TypeDescriptor::Named(name) => {
            if !visited.insert(name.clone()) {
                return true;
            }
            match index.get(name) {
                Some(underlying) => schema_shaped(underlying, index, visited),
                None => false,
            }
        }
        TypeDescriptor::Pointer(elem) => schema_shaped(elem, index, visited),
        TypeDescriptor::Array { elem, .. } | TypeDescriptor::Slice(elem) => {
            !is_map_shaped(elem, index) && schema_shaped(elem, index, visited)
        }
        TypeDescriptor::Map { value, .. } => {
            !is_map_shaped(value, index)
                && !is_slice_shaped(value, index)
                && schema_shaped(value, index, visited)
        }
        TypeDescriptor::Struct(def) => def
            .exported_fields()
            .all(|f| schema_shaped(&f.ty, index, visited)),
        TypeDescriptor::Function
        | TypeDescriptor::Channel
        | TypeDescriptor::Interface
        | TypeDescriptor::Context
        | TypeDescriptor::ErrorMarker => false,
    }
}

fn is_map_shaped(ty: &TypeDescriptor, index: &TypeIndex) -> bool {
    matches!(index.resolve(ty), Some(TypeDescriptor::Map { .. }))
}

fn is_slice_shaped(ty: &TypeDescriptor, index: &TypeIndex) -> bool {
    matches!(
        index.resolve(ty),
        Some(TypeDescriptor::Slice(_) | TypeDescriptor::Array { .. })
    )
}
