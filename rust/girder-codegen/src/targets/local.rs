//! The `local` backend.
//!
//! Emits `local_gen.rs`: an in-process binding that calls the service
//! through the same adapters the transports use, with a background context.
//! Useful for tests and for callers living in the same process as the
//! implementation.

use heck::ToSnakeCase;

use crate::code_writer::CodeWriter;
use crate::error::CodegenError;
use crate::output::OutputSet;
use crate::registry::Backend;
use crate::{cw_writeln, GenContext};

pub struct LocalBackend;

impl Backend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn generate(&self, cx: &GenContext<'_>, out: &mut OutputSet) -> Result<(), CodegenError> {
        let code = local_module(cx)?;
        out.get_or_create("local_gen.rs").push_str(&code);
        Ok(())
    }
}

pub fn local_module(cx: &GenContext<'_>) -> Result<String, CodegenError> {
    let mut buf = String::new();
    let mut w = CodeWriter::with_indent_spaces(&mut buf, 4);
    let service = &cx.service.name;

    cw_writeln!(w, "// Code generated by girder; do not edit.")?;
    cw_writeln!(w, "// In-process binding for the {service} service.")?;
    w.blank_line()?;
    w.writeln("#![allow(dead_code, unused_imports)]")?;
    w.blank_line()?;
    w.writeln("use super::endpoint_gen::*;")?;
    w.blank_line()?;

    w.doc_comment(
        "///",
        "Calls the service directly through the adapters, no transport\ninvolved.",
    )?;
    w.writeln("#[derive(Debug, Clone)]")?;
    w.block(&format!("pub struct {service}Local<S>"), |w| {
        w.writeln("svc: S,")
    })?;
    w.blank_line()?;
    w.block(&format!("impl<S: {service}> {service}Local<S>"), |w| {
        w.block("pub fn new(svc: S) -> Self", |w| w.writeln("Self { svc }"))?;
        for adapter in cx.adapters {
            let method = adapter.method_name.to_snake_case();
            w.blank_line()?;
            w.block(
                &format!(
                    "pub fn {method}(&self, req: {}) -> Result<{}, ServiceError>",
                    adapter.request.name, adapter.response.name
                ),
                |w| {
                    w.writeln("let ctx = Ctx::background();")?;
                    cw_writeln!(w, "{method}_adapter(&ctx, &self.svc, req)")
                },
            )?;
        }
        Ok(())
    })?;

    Ok(buf)
}
