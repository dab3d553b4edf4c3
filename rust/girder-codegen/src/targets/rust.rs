//! The `endpoint` backend: the Rust endpoint layer.
//!
//! Emits `endpoint_gen.rs` containing the context and error types, one
//! struct per reachable named type, the service trait, the per-method
//! request/response records, and the adapter functions every transport
//! routes through. The other Rust-emitting backends (`http-server`,
//! `http-client`, `local`) generate code that imports this module.

use heck::ToSnakeCase;

use girder_schema::{PrimitiveKind, TypeDescriptor, TypeIndex};

use crate::code_writer::CodeWriter;
use crate::endpoint::RecordDef;
use crate::error::CodegenError;
use crate::output::OutputSet;
use crate::registry::Backend;
use crate::walk::collect_named_structs;
use crate::{cw_writeln, GenContext};

pub struct EndpointBackend;

impl Backend for EndpointBackend {
    fn name(&self) -> &'static str {
        "endpoint"
    }

    fn generate(&self, cx: &GenContext<'_>, out: &mut OutputSet) -> Result<(), CodegenError> {
        let code = endpoint_module(cx)?;
        out.get_or_create("endpoint_gen.rs").push_str(&code);
        Ok(())
    }
}

/// Render the whole endpoint module as a string.
pub fn endpoint_module(cx: &GenContext<'_>) -> Result<String, CodegenError> {
    let mut buf = String::new();
    let mut w = CodeWriter::with_indent_spaces(&mut buf, 4);

    cw_writeln!(w, "// Code generated by girder; do not edit.")?;
    cw_writeln!(w, "// Endpoint layer for the {} service.", cx.service.name)?;
    w.blank_line()?;
    w.writeln("#![allow(dead_code, unused_imports)]")?;
    w.blank_line()?;
    w.writeln("use std::collections::BTreeMap;")?;
    w.blank_line()?;
    w.writeln("use serde::{Deserialize, Serialize};")?;
    w.blank_line()?;

    write_ctx(&mut w)?;
    w.blank_line()?;
    write_service_error(&mut w)?;
    w.blank_line()?;

    for (name, def) in collect_named_structs(cx.service, cx.types) {
        let record = RecordDef {
            name,
            fields: def.fields,
        };
        write_record(&mut w, &record, cx.types)?;
        w.blank_line()?;
    }

    write_service_trait(&mut w, cx)?;

    for adapter in cx.adapters {
        w.blank_line()?;
        write_record(&mut w, &adapter.request, cx.types)?;
        w.blank_line()?;
        write_record(&mut w, &adapter.response, cx.types)?;
        w.blank_line()?;
        write_adapter_fn(&mut w, cx, adapter)?;
    }

    Ok(buf)
}

fn write_ctx<W: std::fmt::Write>(w: &mut CodeWriter<W>) -> Result<(), CodegenError> {
    w.doc_comment("///", "Request-scoped call metadata handed to every method.")?;
    w.writeln("#[derive(Debug, Clone, Default)]")?;
    w.block("pub struct Ctx", |w| {
        w.writeln("pub values: BTreeMap<String, String>,")
    })?;
    w.blank_line()?;
    w.block("impl Ctx", |w| {
        w.doc_comment("///", "An empty context, for callers with nothing to attach.")?;
        w.block("pub fn background() -> Self", |w| w.writeln("Self::default()"))
    })?;
    Ok(())
}

fn write_service_error<W: std::fmt::Write>(w: &mut CodeWriter<W>) -> Result<(), CodegenError> {
    w.doc_comment(
        "///",
        "Uniform service failure carried through every transport.",
    )?;
    w.writeln("#[derive(Debug, Clone, PartialEq)]")?;
    w.block("pub struct ServiceError", |w| {
        w.writeln("pub code: i64,")?;
        w.writeln("pub message: String,")
    })?;
    w.blank_line()?;
    w.block("impl ServiceError", |w| {
        w.block("pub fn new(code: i64, message: impl Into<String>) -> Self", |w| {
            w.block("Self", |w| {
                w.writeln("code,")?;
                w.writeln("message: message.into(),")
            })
        })
    })?;
    w.blank_line()?;
    w.block("impl std::fmt::Display for ServiceError", |w| {
        w.block(
            "fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result",
            |w| w.writeln("write!(f, \"[{}] {}\", self.code, self.message)"),
        )
    })?;
    w.blank_line()?;
    w.writeln("impl std::error::Error for ServiceError {}")?;
    Ok(())
}

/// Write one serde-ready record struct. Field names go to snake_case with a
/// `#[serde(rename)]` back to the wire name whenever the two differ.
pub(crate) fn write_record<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    record: &RecordDef,
    index: &TypeIndex,
) -> Result<(), CodegenError> {
    let mut lines = Vec::new();
    for field in record.fields.iter().filter(|f| f.exported) {
        let rust_name = field.name.to_snake_case();
        let ty = rust_type(&field.ty, index)?;
        if field.wire() != rust_name {
            lines.push(format!("#[serde(rename = \"{}\")]", field.wire()));
        }
        lines.push(format!("pub {rust_name}: {ty},"));
    }

    w.writeln("#[derive(Debug, Clone, Default, Serialize, Deserialize)]")?;
    w.block(&format!("pub struct {}", record.name), |w| {
        for line in &lines {
            w.writeln(line)?;
        }
        Ok(())
    })?;
    Ok(())
}

fn write_service_trait<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    cx: &GenContext<'_>,
) -> Result<(), CodegenError> {
    let mut methods = Vec::new();
    for method in &cx.service.methods {
        let mut params = String::new();
        for field in &method.params {
            params.push_str(", ");
            params.push_str(&field.name.to_snake_case());
            params.push_str(": ");
            params.push_str(&rust_type(&field.ty, cx.types)?);
        }
        let result = results_type(method, cx.types)?;
        methods.push((
            doc_text(&method.doc),
            format!(
                "fn {}(&self, ctx: &Ctx{params}) -> Result<{result}, ServiceError>;",
                method.name.to_snake_case()
            ),
        ));
    }

    let doc = doc_text(&cx.service.doc);
    if doc.is_empty() {
        w.doc_comment("///", "The service behavior the generated transports expose.")?;
    } else {
        w.doc_comment("///", &doc)?;
    }
    w.block(&format!("pub trait {}", cx.service.name), |w| {
        let mut first = true;
        for (doc, signature) in &methods {
            if !first {
                w.blank_line()?;
            }
            if !doc.is_empty() {
                w.doc_comment("///", doc)?;
            }
            w.writeln(signature)?;
            first = false;
        }
        Ok(())
    })?;
    Ok(())
}

fn write_adapter_fn<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    cx: &GenContext<'_>,
    adapter: &crate::endpoint::EndpointAdapter,
) -> Result<(), CodegenError> {
    let service = &cx.service.name;
    let method = adapter.method_name.to_snake_case();

    let args: Vec<String> = adapter
        .request
        .fields
        .iter()
        .map(|f| format!("req.{}", f.name.to_snake_case()))
        .collect();
    let call = if args.is_empty() {
        format!("svc.{method}(ctx)?")
    } else {
        format!("svc.{method}(ctx, {})?", args.join(", "))
    };

    let results: Vec<String> = adapter
        .response
        .fields
        .iter()
        .map(|f| f.name.to_snake_case())
        .collect();
    let body: Vec<String> = match results.as_slice() {
        [] => vec![format!("{call};"), format!("Ok({}::default())", adapter.response.name)],
        [single] => vec![
            format!("let {single} = {call};"),
            format!("Ok({} {{ {single} }})", adapter.response.name),
        ],
        many => vec![
            format!("let ({}) = {call};", many.join(", ")),
            format!("Ok({} {{ {} }})", adapter.response.name, many.join(", ")),
        ],
    };

    w.doc_comment(
        "///",
        &format!(
            "Adapter for `{service}::{method}`: the uniform `(context, request) -> (response, error)` calling convention every transport targets."
        ),
    )?;
    w.block(
        &format!(
            "pub fn {method}_adapter<S: {service}>(ctx: &Ctx, svc: &S, req: {}) -> Result<{}, ServiceError>",
            adapter.request.name, adapter.response.name
        ),
        |w| {
            for line in &body {
                w.writeln(line)?;
            }
            Ok(())
        },
    )?;
    Ok(())
}

fn results_type(
    method: &girder_schema::MethodDef,
    index: &TypeIndex,
) -> Result<String, CodegenError> {
    match method.results.as_slice() {
        [] => Ok("()".to_string()),
        [single] => rust_type(&single.ty, index),
        many => {
            let parts = many
                .iter()
                .map(|f| rust_type(&f.ty, index))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(", ")))
        }
    }
}

/// Render a type reference as Rust source. Named structs stay by name;
/// aliases are resolved through the index and inlined.
pub(crate) fn rust_type(ty: &TypeDescriptor, index: &TypeIndex) -> Result<String, CodegenError> {
    const BACKEND: &str = "endpoint";
    match ty {
        TypeDescriptor::Primitive(kind) => Ok(rust_primitive(*kind).to_string()),
        TypeDescriptor::Named(name) => match index.get(name) {
            Some(TypeDescriptor::Struct(_)) => Ok(name.clone()),
            Some(_) => {
                let resolved = index.resolve(ty).ok_or_else(|| CodegenError::UnknownType {
                    backend: BACKEND,
                    name: name.clone(),
                })?;
                rust_type(resolved, index)
            }
            None => Err(CodegenError::UnknownType {
                backend: BACKEND,
                name: name.clone(),
            }),
        },
        TypeDescriptor::Pointer(elem) => Ok(format!("Option<{}>", rust_type(elem, index)?)),
        TypeDescriptor::Array { len, elem } => {
            Ok(format!("[{}; {len}]", rust_type(elem, index)?))
        }
        TypeDescriptor::Slice(elem) => Ok(format!("Vec<{}>", rust_type(elem, index)?)),
        TypeDescriptor::Map { key, value } => Ok(format!(
            "BTreeMap<{}, {}>",
            rust_type(key, index)?,
            rust_type(value, index)?
        )),
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

fn rust_primitive(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::I8 => "i8",
        PrimitiveKind::I16 => "i16",
        PrimitiveKind::I32 => "i32",
        PrimitiveKind::I64 => "i64",
        PrimitiveKind::Isize => "isize",
        PrimitiveKind::U8 => "u8",
        PrimitiveKind::U16 => "u16",
        PrimitiveKind::U32 => "u32",
        PrimitiveKind::U64 => "u64",
        PrimitiveKind::Usize => "usize",
        PrimitiveKind::F32 => "f32",
        PrimitiveKind::F64 => "f64",
        PrimitiveKind::String => "String",
    }
}

/// Documentation text with the annotation lines removed.
pub(crate) fn doc_text(doc: &str) -> String {
    doc.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('@'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::derive_adapters;
    use girder_schema::{
        build_service, FieldDef, InterfaceDecl, Introspection, InvalidMethodPolicy, MethodDecl,
        StructDef,
    };

    fn order_intro() -> Introspection {
        let mut types = TypeIndex::new();
        types.insert(
            "Good",
            TypeDescriptor::Struct(StructDef::new(vec![
                FieldDef::new("Name", TypeDescriptor::string()),
                FieldDef::new("Price", TypeDescriptor::f64()),
            ])),
        );
        Introspection {
            types,
            interfaces: vec![InterfaceDecl {
                name: "OrderService".to_string(),
                doc: "Orders and purchases.".to_string(),
                methods: vec![MethodDecl {
                    name: "Buy".to_string(),
                    doc: "Buy purchases a good.".to_string(),
                    exported: true,
                    params: vec![
                        FieldDef::new("ctx", TypeDescriptor::Context),
                        FieldDef::new("Good", TypeDescriptor::named("Good")),
                    ],
                    results: vec![
                        FieldDef::new("OrderID", TypeDescriptor::string()),
                        FieldDef::new("err", TypeDescriptor::ErrorMarker),
                    ],
                }],
            }],
        }
    }

    fn render(intro: &Introspection) -> String {
        let service = build_service(intro, "OrderService", InvalidMethodPolicy::Drop).unwrap();
        let adapters = derive_adapters(&service);
        let cx = GenContext::new(&service, &intro.types, &adapters);
        endpoint_module(&cx).unwrap()
    }

    #[test]
    fn emits_trait_records_and_adapter() {
        let intro = order_intro();
        let code = render(&intro);

        assert!(code.contains("pub trait OrderService {"));
        assert!(code.contains("fn buy(&self, ctx: &Ctx, good: Good) -> Result<String, ServiceError>;"));
        assert!(code.contains("pub struct Good {"));
        assert!(code.contains("pub struct BuyRequest {"));
        assert!(code.contains("pub struct BuyResponse {"));
        assert!(code.contains(
            "pub fn buy_adapter<S: OrderService>(ctx: &Ctx, svc: &S, req: BuyRequest) -> Result<BuyResponse, ServiceError>"
        ));
        assert!(code.contains("let order_id = svc.buy(ctx, req.good)?;"));
        assert!(code.contains("Ok(BuyResponse { order_id })"));
    }

    #[test]
    fn field_renames_preserve_wire_names() {
        let intro = order_intro();
        let code = render(&intro);
        assert!(code.contains("#[serde(rename = \"Name\")]"));
        assert!(code.contains("pub name: String,"));
        assert!(code.contains("#[serde(rename = \"OrderID\")]"));
        assert!(code.contains("pub order_id: String,"));
    }

    #[test]
    fn rust_type_renders_compound_shapes() {
        let index = TypeIndex::new();
        let ty = TypeDescriptor::map(
            TypeDescriptor::string(),
            TypeDescriptor::slice(TypeDescriptor::pointer(TypeDescriptor::i64())),
        );
        assert_eq!(
            rust_type(&ty, &index).unwrap(),
            "BTreeMap<String, Vec<Option<i64>>>"
        );
    }

    #[test]
    fn unknown_named_type_is_an_error() {
        let index = TypeIndex::new();
        let err = rust_type(&TypeDescriptor::named("Ghost"), &index).unwrap_err();
        assert!(matches!(err, CodegenError::UnknownType { .. }));
    }
}
