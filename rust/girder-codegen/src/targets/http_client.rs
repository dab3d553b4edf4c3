//! The `http-client` backend.
//!
//! Emits `http_client_gen.rs`: a reqwest client with one async method per
//! service method. The verb and codec mirror the server side exactly, and
//! the response envelope is unwrapped back into the plain response record,
//! turning a non-zero `code` into a `ServiceError`.

use heck::ToSnakeCase;

use crate::code_writer::CodeWriter;
use crate::endpoint::EndpointAdapter;
use crate::error::CodegenError;
use crate::output::OutputSet;
use crate::registry::Backend;
use crate::targets::rest::{http_response_name, verb_uses_query};
use crate::targets::rust::write_record;
use crate::{cw_writeln, GenContext};

pub struct HttpClientBackend;

impl Backend for HttpClientBackend {
    fn name(&self) -> &'static str {
        "http-client"
    }

    fn generate(&self, cx: &GenContext<'_>, out: &mut OutputSet) -> Result<(), CodegenError> {
        let code = client_module(cx)?;
        out.get_or_create("http_client_gen.rs").push_str(&code);
        Ok(())
    }
}

pub fn client_module(cx: &GenContext<'_>) -> Result<String, CodegenError> {
    let mut buf = String::new();
    let mut w = CodeWriter::with_indent_spaces(&mut buf, 4);
    let service = &cx.service.name;

    cw_writeln!(w, "// Code generated by girder; do not edit.")?;
    cw_writeln!(w, "// HTTP transport (client side) for the {service} service.")?;
    w.blank_line()?;
    w.writeln("#![allow(dead_code, unused_imports)]")?;
    w.blank_line()?;
    w.writeln("use serde::{Deserialize, Serialize};")?;
    w.blank_line()?;
    w.writeln("use super::endpoint_gen::*;")?;

    // The client deserializes the same envelope the server serializes, but
    // from its own module so the two generated files stay independent.
    for adapter in cx.adapters {
        let mut envelope = adapter.response.with_envelope();
        envelope.name = http_response_name(&adapter.method_name);
        w.blank_line()?;
        write_record(&mut w, &envelope, cx.types)?;
    }

    w.blank_line()?;
    w.doc_comment("///", &format!("HTTP client for the {service} service."))?;
    w.writeln("#[derive(Debug, Clone)]")?;
    w.block(&format!("pub struct {service}Client"), |w| {
        w.writeln("base_url: String,")?;
        w.writeln("http: reqwest::Client,")
    })?;
    w.blank_line()?;
    w.block(&format!("impl {service}Client"), |w| {
        w.doc_comment(
            "///",
            "`base_url` is scheme and authority only; the annotated method\npaths are joined onto it.",
        )?;
        w.block("pub fn new(base_url: impl Into<String>) -> Self", |w| {
            w.block("Self", |w| {
                w.writeln("base_url: base_url.into().trim_end_matches('/').to_string(),")?;
                w.writeln("http: reqwest::Client::new(),")
            })
        })
    })?;

    for (adapter, method) in cx.adapters.iter().zip(&cx.service.methods) {
        w.blank_line()?;
        write_call(&mut w, cx, adapter, &method.annotations.http_method, &method.annotations.http_path)?;
    }

    Ok(buf)
}

fn write_call<W: std::fmt::Write>(
    w: &mut CodeWriter<W>,
    cx: &GenContext<'_>,
    adapter: &EndpointAdapter,
    verb: &str,
    path: &str,
) -> Result<(), CodegenError> {
    let service = &cx.service.name;
    let method = adapter.method_name.to_snake_case();
    let envelope = http_response_name(&adapter.method_name);
    let builder = verb.to_lowercase();
    let codec = if verb_uses_query(verb) { "query" } else { "json" };

    let unwrap = {
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
            (format!("Ok({}::default())", adapter.response.name), Vec::new())
        } else {
            (format!("Ok({} {{", adapter.response.name), fields)
        }
    };

    w.block(&format!("impl {service}Client"), |w| {
        w.block(
            &format!(
                "pub async fn {method}(&self, req: &{}) -> Result<{}, ServiceError>",
                adapter.request.name, adapter.response.name
            ),
            |w| {
                cw_writeln!(w, "let url = format!(\"{{}}{path}\", self.base_url);")?;
                w.writeln("let resp = self")?;
                {
                    let _indent = w.indent();
                    w.writeln(".http")?;
                    cw_writeln!(w, ".{builder}(&url)")?;
                    cw_writeln!(w, ".{codec}(req)")?;
                    w.writeln(".send()")?;
                    w.writeln(".await")?;
                    w.writeln(".map_err(|err| ServiceError::new(-1, err.to_string()))?;")?;
                }
                cw_writeln!(w, "let body: {envelope} = resp")?;
                {
                    let _indent = w.indent();
                    w.writeln(".json()")?;
                    w.writeln(".await")?;
                    w.writeln(".map_err(|err| ServiceError::new(-1, err.to_string()))?;")?;
                }
                w.block("if body.code != 0", |w| {
                    w.writeln("return Err(ServiceError::new(body.code, body.message));")
                })?;
                let (head, fields) = &unwrap;
                if fields.is_empty() {
                    w.writeln(head)
                } else {
                    w.writeln(head)?;
                    {
                        let _indent = w.indent();
                        for field in fields {
                            w.writeln(field)?;
                        }
                    }
                    w.writeln("})")
                }
            },
        )
    })?;
    Ok(())
}
