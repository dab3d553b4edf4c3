//! Service model builder: introspection input → validated [`ServiceDef`].
//!
//! The builder locates the named interface declaration, checks every exported
//! method's signature against the calling convention (context marker first,
//! error marker last) and the serializability predicate, resolves
//! annotations, and runs the default-filling pass. The resulting
//! `ServiceDef` is immutable for the rest of the run.

use heck::ToKebabCase;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::annotations::{
    MethodAnnotations, ServiceAnnotations, DEFAULT_API_VERSION, KNOWN_HTTP_METHODS,
};
use crate::descriptor::{FieldDef, TypeDescriptor, TypeIndex};
use crate::error::ModelError;
use crate::validate::is_serializable;

/// A method as declared, before validation. Parameter and result lists still
/// include the context/error markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,

    #[serde(default)]
    pub doc: String,

    #[serde(default = "default_true")]
    pub exported: bool,

    pub params: Vec<FieldDef>,

    pub results: Vec<FieldDef>,
}

fn default_true() -> bool {
    true
}

/// An interface-shaped declaration handed to the builder by the
/// introspection facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,

    #[serde(default)]
    pub doc: String,

    pub methods: Vec<MethodDecl>,
}

/// The complete introspection input: declared types plus interface
/// declarations. Source discovery and parsing happen upstream; this is the
/// ready-made description the pipeline starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Introspection {
    #[serde(default)]
    pub types: TypeIndex,

    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
}

/// A validated method. `params` and `results` hold only the wire-facing
/// fields; the context and error markers are already stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub doc: String,
    pub params: Vec<FieldDef>,
    pub results: Vec<FieldDef>,
    pub annotations: MethodAnnotations,
}

/// The validated, normalized model every backend generator reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDef {
    pub name: String,
    pub doc: String,
    pub methods: Vec<MethodDef>,
    pub annotations: ServiceAnnotations,
}

/// What to do when a method fails signature or serializability validation.
///
/// `Drop` (the default) logs a warning and skips the method, keeping the run
/// alive — the scaffolding behavior. `Abort` escalates the first invalid
/// method into a fatal [`ModelError::InvalidMethod`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidMethodPolicy {
    #[default]
    Drop,
    Abort,
}

/// Build the service model for the named declaration.
pub fn build_service(
    intro: &Introspection,
    name: &str,
    policy: InvalidMethodPolicy,
) -> Result<ServiceDef, ModelError> {
    let Some(decl) = intro.interfaces.iter().find(|i| i.name == name) else {
        if intro.types.contains(name) {
            return Err(ModelError::NotAnInterface(name.to_string()));
        }
        return Err(ModelError::DeclarationNotFound(name.to_string()));
    };

    let (annotations, errors) = ServiceAnnotations::resolve(&decl.doc);
    if !errors.is_empty() {
        return Err(ModelError::annotations(name, errors));
    }

    let mut methods = Vec::new();
    for method in &decl.methods {
        if !method.exported {
            continue;
        }

        let (params, results) = match check_signature(method, &intro.types) {
            Ok(stripped) => stripped,
            Err(reason) => match policy {
                InvalidMethodPolicy::Drop => {
                    warn!(service = name, method = %method.name, %reason, "dropping method");
                    continue;
                }
                InvalidMethodPolicy::Abort => {
                    return Err(ModelError::InvalidMethod {
                        method: format!("{name}.{}", method.name),
                        reason,
                    });
                }
            },
        };

        let (annotations, errors) = MethodAnnotations::resolve(&method.doc);
        if !errors.is_empty() {
            return Err(ModelError::annotations(
                format!("{name}.{}", method.name),
                errors,
            ));
        }

        methods.push(MethodDef {
            name: method.name.clone(),
            doc: method.doc.clone(),
            params,
            results,
            annotations,
        });
    }

    let mut service = ServiceDef {
        name: decl.name.clone(),
        doc: decl.doc.clone(),
        methods,
        annotations,
    };
    apply_defaults(&mut service);
    Ok(service)
}

/// Check the calling convention and serializability of one method, returning
/// the parameter/result lists with the markers stripped.
fn check_signature(
    method: &MethodDecl,
    index: &TypeIndex,
) -> Result<(Vec<FieldDef>, Vec<FieldDef>), String> {
    match method.params.first() {
        Some(first) if first.ty == TypeDescriptor::Context => {}
        _ => return Err("first parameter must be the context marker".to_string()),
    }
    match method.results.last() {
        Some(last) if last.ty == TypeDescriptor::ErrorMarker => {}
        _ => return Err("last result must be the error marker".to_string()),
    }

    let params = &method.params[1..];
    let results = &method.results[..method.results.len() - 1];

    for field in params {
        if !is_serializable(&field.ty, index) {
            return Err(format!("parameter `{}` is not serializable", field.name));
        }
    }
    for field in results {
        if !is_serializable(&field.ty, index) {
            return Err(format!("result `{}` is not serializable", field.name));
        }
    }

    Ok((params.to_vec(), results.to_vec()))
}

/// Fill unset annotations with their documented defaults. Idempotent; runs
/// exactly once per build, after which the model is frozen.
fn apply_defaults(service: &mut ServiceDef) {
    let a = &mut service.annotations;
    if a.api_version.is_empty() {
        a.api_version = DEFAULT_API_VERSION.to_string();
    }
    if a.api_title.is_empty() {
        a.api_title = service.name.clone();
    }
    if a.http_base_path.is_empty() {
        a.http_base_path = format!("/api/v1/{}", service.name.to_kebab_case());
    }
    let base = a.http_base_path.trim_end_matches('/').to_string();
    a.http_base_path = if base.is_empty() { "/".to_string() } else { base };

    for method in &mut service.methods {
        let m = &mut method.annotations;
        m.http_method = m.http_method.to_ascii_uppercase();
        if !KNOWN_HTTP_METHODS.contains(&m.http_method.as_str()) {
            if !m.http_method.is_empty() {
                warn!(
                    method = %method.name,
                    verb = %m.http_method,
                    "unexpected http-method annotation, falling back to POST"
                );
            }
            m.http_method = "POST".to_string();
        }
        if m.http_path.is_empty() {
            m.http_path = format!(
                "{}/{}",
                service.annotations.http_base_path.trim_end_matches('/'),
                method.name.to_kebab_case()
            );
        }
    }
}
