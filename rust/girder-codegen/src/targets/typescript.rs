//! The `typescript` backend.
//!
//! Emits `client.ts`: one interface per reachable named type plus the
//! request/response records, and one async fetch-based function per method.
//! Interfaces carry wire names directly, so the JSON needs no mapping layer.
//! The envelope is checked in the function and a non-zero `code` becomes a
//! thrown `Error`; the envelope being a structural superset of the response
//! interface, the body is returned as-is on success.

use heck::ToLowerCamelCase;

use girder_schema::{PrimitiveKind, TypeDescriptor, TypeIndex};

use crate::code_writer::CodeWriter;
use crate::endpoint::{EndpointAdapter, RecordDef};
use crate::error::CodegenError;
use crate::output::OutputSet;
use crate::registry::Backend;
use crate::targets::rest::{http_response_name, verb_uses_query};
use crate::walk::collect_named_structs;
use crate::{cw_writeln, GenContext};

pub struct TypescriptBackend;

impl Backend for TypescriptBackend {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn generate(&self, cx: &GenContext<'_>, out: &mut OutputSet) -> Result<(), CodegenError> {
        let code = typescript_module(cx)?;
        out.get_or_create("client.ts").push_str(&code);
        Ok(())
    }
}

pub fn typescript_module(cx: &GenContext<'_>) -> Result<String, CodegenError> {
    let mut buf = String::new();
    let mut w = CodeWriter::with_indent_spaces(&mut buf, 4);
    let service = &cx.service.name;

    cw_writeln!(w, "// Code generated by girder; do not edit.")?;
    cw_writeln!(w, "// TypeScript client for the {service} service.")?;

    for (name, def) in collect_named_structs(cx.service, cx.types) {
        let record = RecordDef {
            name,
            fields: def.fields,
        };
        w.blank_line()?;
        write_interface(&mut w, &record, cx.types)?;
    }

    for adapter in cx.adapters {
        let mut envelope = adapter.response.with_envelope();
        envelope.name = http_response_name(&adapter.method_name);
        w.blank_line()?;
        write_interface(&mut w, &adapter.request, cx.types)?;
        w.blank_line()?;
        write_interface(&mut w, &adapter.response, cx.types)?;
        w.blank_line()?;
        write_interface(&mut w, &envelope, cx.types)?;
    }

    for (adapter, method) in cx.adapters.iter().zip(&cx.service.methods) {
        w.blank_line()?;
        write_call(
            &mut w,
            adapter,
            &method.annotations.http_method,
            &method.annotations.http_path,
        )?;
    }

    Ok(buf)
}

fn write_interface<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    record: &RecordDef,
    index: &TypeIndex,
) -> Result<(), CodegenError> {
    w.block(&format!("export interface {}", record.name), |w| {
        for field in record.fields.iter().filter(|f| f.exported) {
            cw_writeln!(w, "{}: {};", field.wire(), ts_type(&field.ty, index))?;
        }
        Ok(())
    })?;
    Ok(())
}

fn write_call<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    adapter: &EndpointAdapter,
    verb: &str,
    path: &str,
) -> Result<(), CodegenError> {
    let name = adapter.method_name.to_lower_camel_case();
    let envelope = http_response_name(&adapter.method_name);

    w.block(
        &format!(
            "export async function {name}(baseUrl: string, req: {}): Promise<{}>",
            adapter.request.name, adapter.response.name
        ),
        |w| {
            if verb_uses_query(verb) {
                w.writeln("const params = new URLSearchParams();")?;
                w.block(
                    "for (const [key, value] of Object.entries(req))",
                    |w| w.writeln("params.set(key, String(value));"),
                )?;
                cw_writeln!(
                    w,
                    "const resp = await fetch(`${{baseUrl}}{path}?${{params}}`, {{"
                )?;
                {
                    let _indent = w.indent();
                    cw_writeln!(w, "method: \"{verb}\",")?;
                }
                w.writeln("});")?;
            } else {
                cw_writeln!(w, "const resp = await fetch(`${{baseUrl}}{path}`, {{")?;
                {
                    let _indent = w.indent();
                    cw_writeln!(w, "method: \"{verb}\",")?;
                    w.writeln("headers: { \"Content-Type\": \"application/json\" },")?;
                    w.writeln("body: JSON.stringify(req),")?;
                }
                w.writeln("});")?;
            }
            cw_writeln!(w, "const body = (await resp.json()) as {envelope};")?;
            w.block("if (body.code !== 0)", |w| {
                w.writeln("throw new Error(`[${body.code}] ${body.message}`);")
            })?;
            w.writeln("return body;")
        },
    )?;
    Ok(())
}

/// Render a type reference as TypeScript. Infallible: named structs stay by
/// name, aliases inline, and anything without a JSON form maps to `never`
/// (the validator keeps those out of real models).
fn ts_type(ty: &TypeDescriptor, index: &TypeIndex) -> String {
    match ty {
        TypeDescriptor::Primitive(kind) => ts_primitive(*kind).to_string(),
        TypeDescriptor::Named(name) => match index.get(name) {
            Some(TypeDescriptor::Struct(_)) => name.clone(),
            Some(_) => match index.resolve(ty) {
                Some(resolved) => ts_type(resolved, index),
                None => "never".to_string(),
            },
            None => "never".to_string(),
        },
        TypeDescriptor::Pointer(elem) => format!("{} | null", ts_type(elem, index)),
        TypeDescriptor::Slice(elem) | TypeDescriptor::Array { elem, .. } => {
            let inner = ts_type(elem, index);
            if inner.contains(' ') {
                format!("({inner})[]")
            } else {
                format!("{inner}[]")
            }
        }
        TypeDescriptor::Map { key, value } => format!(
            "Record<{}, {}>",
            ts_type(key, index),
            ts_type(value, index)
        ),
        TypeDescriptor::Struct(def) => {
            let fields: Vec<String> = def
                .exported_fields()
                .map(|f| format!("{}: {}", f.wire(), ts_type(&f.ty, index)))
                .collect();
            format!("{{ {} }}", fields.join("; "))
        }
        TypeDescriptor::Function
        | TypeDescriptor::Channel
        | TypeDescriptor::Interface
        | TypeDescriptor::Context
        | TypeDescriptor::ErrorMarker => "never".to_string(),
    }
}

fn ts_primitive(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "boolean",
        PrimitiveKind::String => "string",
        _ => "number",
    }
}
