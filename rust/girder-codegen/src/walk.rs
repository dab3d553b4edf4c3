//! Named-type collection shared by the emitting backends.
//!
//! Several targets (rust, typescript, proto, openapi) must emit one
//! declaration per unique named struct reachable from any request/response
//! field. The walk is depth-first with dependencies emitted before their
//! dependents, memoized by qualified name so a shared or self-referential
//! type is visited exactly once.

use std::collections::HashSet;

use girder_schema::{ServiceDef, StructDef, TypeDescriptor, TypeIndex};

/// Every named struct reachable from the service's method signatures, in
/// first-reference order with dependencies first. Aliases to non-struct
/// shapes are skipped — the type renderers inline those.
pub fn collect_named_structs(service: &ServiceDef, index: &TypeIndex) -> Vec<(String, StructDef)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for method in &service.methods {
        for field in method.params.iter().chain(method.results.iter()) {
            visit(&field.ty, index, &mut seen, &mut out);
        }
    }

    out
}

fn visit(
    ty: &TypeDescriptor,
    index: &TypeIndex,
    seen: &mut HashSet<String>,
    out: &mut Vec<(String, StructDef)>,
) {
    match ty {
        TypeDescriptor::Named(name) => {
            if !seen.insert(name.clone()) {
                return;
            }
            match index.get(name) {
                Some(TypeDescriptor::Struct(def)) => {
                    for field in def.exported_fields() {
                        visit(&field.ty, index, seen, out);
                    }
                    out.push((name.clone(), def.clone()));
                }
                Some(underlying) => visit(underlying, index, seen, out),
                None => {}
            }
        }
        TypeDescriptor::Pointer(elem)
        | TypeDescriptor::Slice(elem)
        | TypeDescriptor::Array { elem, .. } => visit(elem, index, seen, out),
        TypeDescriptor::Map { key, value } => {
            visit(key, index, seen, out);
            visit(value, index, seen, out);
        }
        TypeDescriptor::Struct(def) => {
            for field in def.exported_fields() {
                visit(&field.ty, index, seen, out);
            }
        }
        TypeDescriptor::Primitive(_)
        | TypeDescriptor::Function
        | TypeDescriptor::Channel
        | TypeDescriptor::Interface
        | TypeDescriptor::Context
        | TypeDescriptor::ErrorMarker => {}
    }
}
