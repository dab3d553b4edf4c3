//! The `http-server` backend.
//!
//! Emits `http_server_gen.rs`: an axum router wiring every method to its
//! annotated verb and path. GET and DELETE decode the request record from
//! the query string, the body verbs from JSON. Every handler replies with
//! the per-method envelope struct; a failed call yields code -1 and the
//! error message, never a transport-level error status.

use heck::ToSnakeCase;

use crate::code_writer::CodeWriter;
use crate::endpoint::EndpointAdapter;
use crate::error::CodegenError;
use crate::output::OutputSet;
use crate::registry::Backend;
use crate::targets::rest::{http_response_name, verb_uses_query, ERROR_CODE};
use crate::targets::rust::write_record;
use crate::{cw_writeln, GenContext};

pub struct HttpServerBackend;

impl Backend for HttpServerBackend {
    fn name(&self) -> &'static str {
        "http-server"
    }

    fn generate(&self, cx: &GenContext<'_>, out: &mut OutputSet) -> Result<(), CodegenError> {
        let code = server_module(cx)?;
        out.get_or_create("http_server_gen.rs").push_str(&code);
        Ok(())
    }
}

pub fn server_module(cx: &GenContext<'_>) -> Result<String, CodegenError> {
    let mut buf = String::new();
    let mut w = CodeWriter::with_indent_spaces(&mut buf, 4);
    let service = &cx.service.name;

    cw_writeln!(w, "// Code generated by girder; do not edit.")?;
    cw_writeln!(w, "// HTTP transport (server side) for the {service} service.")?;
    w.blank_line()?;
    w.writeln("#![allow(dead_code, unused_imports)]")?;
    w.blank_line()?;
    w.writeln("use std::sync::Arc;")?;
    w.blank_line()?;
    w.writeln("use axum::extract::{Json, Query, State};")?;
    w.writeln("use axum::routing::{delete, get, patch, post, put};")?;
    w.writeln("use axum::Router;")?;
    w.writeln("use serde::{Deserialize, Serialize};")?;
    w.blank_line()?;
    w.writeln("use super::endpoint_gen::*;")?;

    for (adapter, method) in cx.adapters.iter().zip(&cx.service.methods) {
        let mut envelope = adapter.response.with_envelope();
        envelope.name = http_response_name(&adapter.method_name);
        w.blank_line()?;
        write_record(&mut w, &envelope, cx.types)?;
        w.blank_line()?;
        write_handler(&mut w, cx, adapter, &method.annotations.http_method)?;
    }

    w.blank_line()?;
    write_router(&mut w, cx)?;

    Ok(buf)
}

fn write_handler<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    cx: &GenContext<'_>,
    adapter: &EndpointAdapter,
    verb: &str,
) -> Result<(), CodegenError> {
    let service = &cx.service.name;
    let method = adapter.method_name.to_snake_case();
    let envelope = http_response_name(&adapter.method_name);
    let extractor = if verb_uses_query(verb) { "Query" } else { "Json" };

    let ok_arm = {
        let fields: Vec<String> = adapter
            .response
            .fields
            .iter()
            .map(|f| {
                let name = f.name.to_snake_case();
                format!("{name}: body.{name},")
            })
            .collect();
        if fields.is_empty() {
            (format!("Ok(_) => {envelope}::default(),"), Vec::new())
        } else {
            (format!("Ok(body) => {envelope} {{"), fields)
        }
    };

    w.block(
        &format!(
            "async fn {method}_handler<S: {service} + Send + Sync + 'static>(\n    State(svc): State<Arc<S>>,\n    {extractor}(req): {extractor}<{}>,\n) -> Json<{envelope}>",
            adapter.request.name
        ),
        |w| {
            w.writeln("let ctx = Ctx::background();")?;
            cw_writeln!(w, "let resp = match {method}_adapter(&ctx, svc.as_ref(), req) {{")?;
            {
                let _indent = w.indent();
                let (ok_head, ok_fields) = &ok_arm;
                w.writeln(ok_head)?;
                if !ok_fields.is_empty() {
                    {
                        let _inner = w.indent();
                        for field in ok_fields {
                            w.writeln(field)?;
                        }
                        w.writeln("..Default::default()")?;
                    }
                    w.writeln("},")?;
                }
                cw_writeln!(w, "Err(err) => {envelope} {{")?;
                {
                    let _inner = w.indent();
                    cw_writeln!(w, "code: {ERROR_CODE},")?;
                    w.writeln("message: format!(\"error occurred: {err}\"),")?;
                    w.writeln("..Default::default()")?;
                }
                w.writeln("},")?;
            }
            w.writeln("};")?;
            w.writeln("Json(resp)")
        },
    )?;
    Ok(())
}

fn write_router<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    cx: &GenContext<'_>,
) -> Result<(), CodegenError> {
    let service = &cx.service.name;
    w.doc_comment(
        "///",
        &format!("Router serving every {service} method under its annotated path."),
    )?;
    w.block(
        &format!("pub fn router<S: {service} + Send + Sync + 'static>(svc: Arc<S>) -> Router"),
        |w| {
            w.writeln("Router::new()")?;
            let _indent = w.indent();
            for method in &cx.service.methods {
                cw_writeln!(
                    w,
                    ".route(\"{}\", {}({}_handler::<S>))",
                    method.annotations.http_path,
                    method.annotations.http_method.to_lowercase(),
                    method.name.to_snake_case()
                )?;
            }
            w.writeln(".with_state(svc)")
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::derive_adapters;
    use girder_schema::{
        build_service, FieldDef, InterfaceDecl, Introspection, InvalidMethodPolicy, MethodDecl,
        StructDef, TypeDescriptor, TypeIndex,
    };

    fn intro() -> Introspection {
        let mut types = TypeIndex::new();
        types.insert(
            "Good",
            TypeDescriptor::Struct(StructDef::new(vec![FieldDef::new(
                "Name",
                TypeDescriptor::string(),
            )])),
        );
        Introspection {
            types,
            interfaces: vec![InterfaceDecl {
                name: "OrderService".to_string(),
                doc: String::new(),
                methods: vec![
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
                    },
                    MethodDecl {
                        name: "List".to_string(),
                        doc: "@http-method get\n@http-path /listing".to_string(),
                        exported: true,
                        params: vec![FieldDef::new("ctx", TypeDescriptor::Context)],
                        results: vec![
                            FieldDef::new(
                                "Goods",
                                TypeDescriptor::slice(TypeDescriptor::named("Good")),
                            ),
                            FieldDef::new("err", TypeDescriptor::ErrorMarker),
                        ],
                    },
                ],
            }],
        }
    }

    fn render() -> String {
        let intro = intro();
        let service = build_service(&intro, "OrderService", InvalidMethodPolicy::Drop).unwrap();
        let adapters = derive_adapters(&service);
        let cx = GenContext::new(&service, &intro.types, &adapters);
        server_module(&cx).unwrap()
    }

    #[test]
    fn body_verbs_decode_json_and_query_verbs_decode_query() {
        let code = render();
        assert!(code.contains("Json(req): Json<BuyRequest>"));
        assert!(code.contains("Query(req): Query<ListRequest>"));
    }

    #[test]
    fn routes_use_annotated_and_defaulted_paths() {
        let code = render();
        assert!(code.contains(".route(\"/api/v1/order-service/buy\", post(buy_handler::<S>))"));
        assert!(code.contains(".route(\"/listing\", get(list_handler::<S>))"));
    }

    #[test]
    fn error_arm_fills_the_envelope() {
        let code = render();
        assert!(code.contains("code: -1,"));
        assert!(code.contains("message: format!(\"error occurred: {err}\"),"));
        assert!(code.contains("pub struct BuyHttpResponse {"));
    }
}
