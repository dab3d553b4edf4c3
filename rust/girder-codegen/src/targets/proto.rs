//! The `proto` backend.
//!
//! Emits `rpc.proto`: a proto3 file with one message per reachable named
//! struct, the request/response messages, and a `service` block declaring
//! every method. Proto is stricter than JSON about nesting, so shapes the
//! format cannot express (repeated maps, nested repeats, non-scalar map
//! keys) abort the backend with [`CodegenError::UnsupportedShape`] instead
//! of emitting an invalid file.

use heck::ToSnakeCase;

use girder_schema::{is_key_eligible, FieldDef, PrimitiveKind, TypeDescriptor, TypeIndex};

use crate::code_writer::CodeWriter;
use crate::error::CodegenError;
use crate::output::OutputSet;
use crate::registry::Backend;
use crate::walk::collect_named_structs;
use crate::{cw_writeln, GenContext};

const BACKEND: &str = "proto";

pub struct ProtoBackend;

impl Backend for ProtoBackend {
    fn name(&self) -> &'static str {
        "proto"
    }

    fn generate(&self, cx: &GenContext<'_>, out: &mut OutputSet) -> Result<(), CodegenError> {
        let code = proto_module(cx)?;
        out.get_or_create("rpc.proto").push_str(&code);
        Ok(())
    }
}

pub fn proto_module(cx: &GenContext<'_>) -> Result<String, CodegenError> {
    let mut buf = String::new();
    let mut w = CodeWriter::with_indent_spaces(&mut buf, 4);

    cw_writeln!(w, "// Code generated by girder; do not edit.")?;
    w.blank_line()?;
    w.writeln("syntax = \"proto3\";")?;
    w.blank_line()?;
    cw_writeln!(w, "package {};", cx.service.name.to_snake_case())?;

    for (name, def) in collect_named_structs(cx.service, cx.types) {
        w.blank_line()?;
        write_message(&mut w, &name, &def.fields, cx.types)?;
    }

    for adapter in cx.adapters {
        w.blank_line()?;
        write_message(&mut w, &adapter.request.name, &adapter.request.fields, cx.types)?;
        w.blank_line()?;
        write_message(&mut w, &adapter.response.name, &adapter.response.fields, cx.types)?;
    }

    w.blank_line()?;
    w.block(&format!("service {}", cx.service.name), |w| {
        for adapter in cx.adapters {
            cw_writeln!(
                w,
                "rpc {} ({}) returns ({});",
                adapter.method_name,
                adapter.request.name,
                adapter.response.name
            )?;
        }
        Ok(())
    })?;

    Ok(buf)
}

/// Fields are numbered from 1 in declaration order, unexported fields
/// skipped without consuming a number.
fn write_message<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    name: &str,
    fields: &[FieldDef],
    index: &TypeIndex,
) -> Result<(), CodegenError> {
    let mut lines = Vec::new();
    for (field, number) in fields.iter().filter(|f| f.exported).zip(1u32..) {
        let ty = proto_field_type(&field.ty, index)?;
        lines.push(format!("{ty} {} = {number};", field.wire().to_snake_case()));
    }

    w.block(&format!("message {name}"), |w| {
        for line in &lines {
            w.writeln(line)?;
        }
        Ok(())
    })?;
    Ok(())
}

/// The full field type, including a `repeated` or `map<...>` wrapper.
fn proto_field_type(ty: &TypeDescriptor, index: &TypeIndex) -> Result<String, CodegenError> {
    match ty {
        TypeDescriptor::Pointer(elem) => proto_field_type(elem, index),
        TypeDescriptor::Slice(elem) | TypeDescriptor::Array { elem, .. } => {
            if is_byte(elem, index) {
                return Ok("bytes".to_string());
            }
            Ok(format!("repeated {}", element_type(elem, index)?))
        }
        TypeDescriptor::Map { key, value } => {
            let key_kind = match index.resolve(key) {
                Some(TypeDescriptor::Primitive(kind)) if is_key_eligible(*kind) => *kind,
                _ => {
                    return Err(CodegenError::UnsupportedShape {
                        backend: BACKEND,
                        detail: "map keys must be integral or string".to_string(),
                    })
                }
            };
            Ok(format!(
                "map<{}, {}>",
                proto_scalar(key_kind),
                element_type(value, index)?
            ))
        }
        TypeDescriptor::Named(name) => match index.get(name) {
            Some(TypeDescriptor::Struct(_)) => Ok(name.clone()),
            Some(_) => {
                let resolved = index.resolve(ty).ok_or_else(|| CodegenError::UnknownType {
                    backend: BACKEND,
                    name: name.clone(),
                })?;
                proto_field_type(resolved, index)
            }
            None => Err(CodegenError::UnknownType {
                backend: BACKEND,
                name: name.clone(),
            }),
        },
        _ => element_type(ty, index),
    }
}

/// A type usable inside `repeated` or as a map value: a scalar or a message
/// name, never another container.
fn element_type(ty: &TypeDescriptor, index: &TypeIndex) -> Result<String, CodegenError> {
    match ty {
        TypeDescriptor::Primitive(kind) => Ok(proto_scalar(*kind).to_string()),
        TypeDescriptor::Named(name) => match index.get(name) {
            Some(TypeDescriptor::Struct(_)) => Ok(name.clone()),
            Some(_) => {
                let resolved = index.resolve(ty).ok_or_else(|| CodegenError::UnknownType {
                    backend: BACKEND,
                    name: name.clone(),
                })?;
                element_type(resolved, index)
            }
            None => Err(CodegenError::UnknownType {
                backend: BACKEND,
                name: name.clone(),
            }),
        },
        TypeDescriptor::Pointer(elem) => element_type(elem, index),
        TypeDescriptor::Slice(_) | TypeDescriptor::Array { .. } | TypeDescriptor::Map { .. } => {
            Err(CodegenError::UnsupportedShape {
                backend: BACKEND,
                detail: "nested containers cannot be expressed in proto3".to_string(),
            })
        }
        TypeDescriptor::Struct(_) => Err(CodegenError::UnsupportedShape {
            backend: BACKEND,
            detail: "anonymous struct in field position; declare a named type".to_string(),
        }),
        TypeDescriptor::Function
        | TypeDescriptor::Channel
        | TypeDescriptor::Interface
        | TypeDescriptor::Context
        | TypeDescriptor::ErrorMarker => Err(CodegenError::UnsupportedShape {
            backend: BACKEND,
            detail: format!("{ty:?} has no serialized form"),
        }),
    }
}

fn is_byte(ty: &TypeDescriptor, index: &TypeIndex) -> bool {
    matches!(
        index.resolve(ty),
        Some(TypeDescriptor::Primitive(PrimitiveKind::U8))
    )
}

fn proto_scalar(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 => "int32",
        PrimitiveKind::I64 | PrimitiveKind::Isize => "int64",
        PrimitiveKind::U8 | PrimitiveKind::U16 | PrimitiveKind::U32 => "uint32",
        PrimitiveKind::U64 | PrimitiveKind::Usize => "uint64",
        PrimitiveKind::F32 => "float",
        PrimitiveKind::F64 => "double",
        PrimitiveKind::String => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::derive_adapters;
    use girder_schema::{
        build_service, InterfaceDecl, Introspection, InvalidMethodPolicy, MethodDecl, StructDef,
    };

    fn render(types: TypeIndex, methods: Vec<MethodDecl>) -> Result<String, CodegenError> {
        let intro = Introspection {
            types,
            interfaces: vec![InterfaceDecl {
                name: "OrderService".to_string(),
                doc: String::new(),
                methods,
            }],
        };
        let service = build_service(&intro, "OrderService", InvalidMethodPolicy::Drop).unwrap();
        let adapters = derive_adapters(&service);
        let cx = GenContext::new(&service, &intro.types, &adapters);
        proto_module(&cx)
    }

    fn buy_method() -> MethodDecl {
        MethodDecl {
            name: "Buy".to_string(),
            doc: String::new(),
            exported: true,
            params: vec![
                FieldDef::new("ctx", TypeDescriptor::Context),
                FieldDef::new("Good", TypeDescriptor::named("Good")),
            ],
            results: vec![
                FieldDef::new("OrderID", TypeDescriptor::string()),
                FieldDef::new("err", TypeDescriptor::ErrorMarker),
            ],
        }
    }

    fn good_types() -> TypeIndex {
        let mut types = TypeIndex::new();
        types.insert(
            "Good",
            TypeDescriptor::Struct(StructDef::new(vec![
                FieldDef::new("Name", TypeDescriptor::string()),
                FieldDef::new("Price", TypeDescriptor::f64()),
                FieldDef::new("Tags", TypeDescriptor::slice(TypeDescriptor::string())),
            ])),
        );
        types
    }

    #[test]
    fn messages_and_service_block() {
        let code = render(good_types(), vec![buy_method()]).unwrap();
        assert!(code.contains("syntax = \"proto3\";"));
        assert!(code.contains("package order_service;"));
        assert!(code.contains("message Good {"));
        assert!(code.contains("string name = 1;"));
        assert!(code.contains("double price = 2;"));
        assert!(code.contains("repeated string tags = 3;"));
        assert!(code.contains("message BuyRequest {"));
        assert!(code.contains("Good good = 1;"));
        assert!(code.contains("string order_id = 1;"));
        assert!(code.contains("service OrderService {"));
        assert!(code.contains("rpc Buy (BuyRequest) returns (BuyResponse);"));
    }

    #[test]
    fn byte_slices_become_bytes() {
        let mut types = good_types();
        types.insert(
            "Blob",
            TypeDescriptor::Struct(StructDef::new(vec![FieldDef::new(
                "Data",
                TypeDescriptor::slice(TypeDescriptor::Primitive(PrimitiveKind::U8)),
            )])),
        );
        let mut method = buy_method();
        method.params[1] = FieldDef::new("Blob", TypeDescriptor::named("Blob"));
        let code = render(types, vec![method]).unwrap();
        assert!(code.contains("bytes data = 1;"));
    }

    #[test]
    fn nested_containers_are_rejected() {
        let mut types = TypeIndex::new();
        types.insert(
            "Grid",
            TypeDescriptor::Struct(StructDef::new(vec![FieldDef::new(
                "Rows",
                TypeDescriptor::slice(TypeDescriptor::slice(TypeDescriptor::i64())),
            )])),
        );
        let mut method = buy_method();
        method.params[1] = FieldDef::new("Grid", TypeDescriptor::named("Grid"));
        let err = render(types, vec![method]).unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedShape { .. }));
    }
}
