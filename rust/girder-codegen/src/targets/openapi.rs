//! The `openapi` backend.
//!
//! Emits `openapi.json`: a Swagger 2.0 document describing the REST surface
//! the HTTP transports serve. Info comes from the service annotations, one
//! path item per method under its verb (relative to `basePath` when every
//! method path lives under the base, full paths with no `basePath`
//! otherwise), and `definitions` holds every reachable named struct plus
//! the request records and response envelopes.
//! `serde_json::Map` keeps keys sorted, so the document is byte-stable
//! across runs.

use serde_json::{json, Map, Value};

use girder_schema::{
    fits_wire_schema, is_key_eligible, FieldDef, PrimitiveKind, TypeDescriptor, TypeIndex,
};

use crate::error::CodegenError;
use crate::output::OutputSet;
use crate::registry::Backend;
use crate::targets::rest::{http_response_name, verb_uses_query};
use crate::targets::rust::doc_text;
use crate::walk::collect_named_structs;
use crate::GenContext;

const BACKEND: &str = "openapi";

pub struct OpenApiBackend;

impl Backend for OpenApiBackend {
    fn name(&self) -> &'static str {
        "openapi"
    }

    fn generate(&self, cx: &GenContext<'_>, out: &mut OutputSet) -> Result<(), CodegenError> {
        let doc = openapi_document(cx)?;
        let mut text = serde_json::to_string_pretty(&doc)?;
        text.push('\n');
        out.get_or_create("openapi.json").push_str(&text);
        Ok(())
    }
}

pub fn openapi_document(cx: &GenContext<'_>) -> Result<Value, CodegenError> {
    let base = cx.service.annotations.http_base_path.as_str();

    // `basePath` prefixes every operation path at resolution time, so it can
    // only be emitted when every method path actually lives under it. One
    // annotated path outside the base (say `@http-path /healthz`) drops the
    // base and keys every operation by its full path instead.
    fn strip_under_base<'a>(full: &'a str, base: &str) -> Option<&'a str> {
        full.strip_prefix(base)
            .filter(|rest| rest.starts_with('/'))
    }
    let use_base = !base.is_empty()
        && base != "/"
        && cx
            .service
            .methods
            .iter()
            .all(|m| strip_under_base(&m.annotations.http_path, base).is_some());

    let mut paths = Map::new();
    for (adapter, method) in cx.adapters.iter().zip(&cx.service.methods) {
        let verb = method.annotations.http_method.as_str();
        let full = method.annotations.http_path.as_str();
        let relative = if use_base {
            strip_under_base(full, base).unwrap_or(full)
        } else {
            full
        };

        let operation = operation_object(cx, adapter, method)?;
        let item = paths
            .entry(relative.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(item) = item {
            item.insert(verb.to_lowercase(), operation);
        }
    }

    let mut definitions = Map::new();
    for (name, def) in collect_named_structs(cx.service, cx.types) {
        definitions.insert(name.clone(), object_schema(&def.fields, cx.types)?);
    }
    for adapter in cx.adapters {
        definitions.insert(
            adapter.request.name.clone(),
            object_schema(&adapter.request.fields, cx.types)?,
        );
        let envelope = adapter.response.with_envelope();
        definitions.insert(
            http_response_name(&adapter.method_name),
            object_schema(&envelope.fields, cx.types)?,
        );
    }

    let mut doc = Map::new();
    doc.insert("swagger".to_string(), json!("2.0"));
    doc.insert(
        "info".to_string(),
        json!({
            "title": cx.service.annotations.api_title,
            "version": cx.service.annotations.api_version,
        }),
    );
    if use_base {
        doc.insert("basePath".to_string(), json!(base));
    }
    doc.insert("consumes".to_string(), json!(["application/json"]));
    doc.insert("produces".to_string(), json!(["application/json"]));
    doc.insert("paths".to_string(), Value::Object(paths));
    doc.insert("definitions".to_string(), Value::Object(definitions));
    Ok(Value::Object(doc))
}

fn operation_object(
    cx: &GenContext<'_>,
    adapter: &crate::endpoint::EndpointAdapter,
    method: &girder_schema::MethodDef,
) -> Result<Value, CodegenError> {
    let mut operation = Map::new();
    operation.insert("operationId".to_string(), json!(adapter.method_name));

    let summary = doc_text(&method.doc);
    if !summary.is_empty() {
        operation.insert("summary".to_string(), json!(summary));
    }
    if method.annotations.deprecated {
        operation.insert("deprecated".to_string(), json!(true));
    }

    let parameters = if verb_uses_query(&method.annotations.http_method) {
        adapter
            .request
            .fields
            .iter()
            .filter(|f| f.exported)
            .map(|f| query_parameter(f, cx.types))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        vec![json!({
            "name": "body",
            "in": "body",
            "required": true,
            "schema": { "$ref": format!("#/definitions/{}", adapter.request.name) },
        })]
    };
    if !parameters.is_empty() {
        operation.insert("parameters".to_string(), json!(parameters));
    }

    operation.insert(
        "responses".to_string(),
        json!({
            "200": {
                "description": "",
                "schema": {
                    "$ref": format!("#/definitions/{}", http_response_name(&adapter.method_name)),
                },
            },
        }),
    );

    Ok(Value::Object(operation))
}

/// Query parameters are flat: only primitives (and arrays of primitives)
/// survive URL encoding.
fn query_parameter(field: &FieldDef, index: &TypeIndex) -> Result<Value, CodegenError> {
    let schema = schema_of(&field.ty, index)?;
    let flat = match schema.get("type").and_then(Value::as_str) {
        Some("boolean" | "integer" | "number" | "string") => true,
        Some("array") => matches!(
            schema
                .get("items")
                .and_then(|items| items.get("type"))
                .and_then(Value::as_str),
            Some("boolean" | "integer" | "number" | "string")
        ),
        _ => false,
    };
    if !flat {
        return Err(CodegenError::UnsupportedShape {
            backend: BACKEND,
            detail: format!(
                "field `{}` cannot be a query parameter; use a body verb",
                field.name
            ),
        });
    }

    let mut parameter = Map::new();
    parameter.insert("name".to_string(), json!(field.wire()));
    parameter.insert("in".to_string(), json!("query"));
    if let Value::Object(schema) = schema {
        parameter.extend(schema);
    }
    Ok(Value::Object(parameter))
}

fn object_schema(fields: &[FieldDef], index: &TypeIndex) -> Result<Value, CodegenError> {
    let mut properties = Map::new();
    for field in fields.iter().filter(|f| f.exported) {
        if !fits_wire_schema(&field.ty, index) {
            return Err(CodegenError::UnsupportedShape {
                backend: BACKEND,
                detail: format!("field `{}` does not fit a JSON schema", field.name),
            });
        }
        properties.insert(field.wire().to_string(), schema_of(&field.ty, index)?);
    }
    Ok(json!({ "type": "object", "properties": properties }))
}

fn schema_of(ty: &TypeDescriptor, index: &TypeIndex) -> Result<Value, CodegenError> {
    match ty {
        TypeDescriptor::Primitive(kind) => Ok(primitive_schema(*kind)),
        TypeDescriptor::Named(name) => match index.get(name) {
            Some(TypeDescriptor::Struct(_)) => {
                Ok(json!({ "$ref": format!("#/definitions/{name}") }))
            }
            Some(_) => {
                let resolved = index.resolve(ty).ok_or_else(|| CodegenError::UnknownType {
                    backend: BACKEND,
                    name: name.clone(),
                })?;
                schema_of(resolved, index)
            }
            None => Err(CodegenError::UnknownType {
                backend: BACKEND,
                name: name.clone(),
            }),
        },
        TypeDescriptor::Pointer(elem) => schema_of(elem, index),
        TypeDescriptor::Slice(elem) | TypeDescriptor::Array { elem, .. } => Ok(json!({
            "type": "array",
            "items": schema_of(elem, index)?,
        })),
        TypeDescriptor::Map { key, value } => {
            match index.resolve(key) {
                Some(TypeDescriptor::Primitive(kind)) if is_key_eligible(*kind) => {}
                _ => {
                    return Err(CodegenError::UnsupportedShape {
                        backend: BACKEND,
                        detail: "map keys must be integral or string".to_string(),
                    })
                }
            }
            Ok(json!({
                "type": "object",
                "additionalProperties": schema_of(value, index)?,
            }))
        }
        TypeDescriptor::Struct(def) => object_schema(&def.fields, index),
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

fn primitive_schema(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Bool => json!({ "type": "boolean" }),
        PrimitiveKind::I8
        | PrimitiveKind::I16
        | PrimitiveKind::I32
        | PrimitiveKind::U8
        | PrimitiveKind::U16
        | PrimitiveKind::U32 => json!({ "type": "integer", "format": "int32" }),
        PrimitiveKind::I64 | PrimitiveKind::Isize | PrimitiveKind::U64 | PrimitiveKind::Usize => {
            json!({ "type": "integer", "format": "int64" })
        }
        PrimitiveKind::F32 => json!({ "type": "number", "format": "float" }),
        PrimitiveKind::F64 => json!({ "type": "number", "format": "double" }),
        PrimitiveKind::String => json!({ "type": "string" }),
    }
}
