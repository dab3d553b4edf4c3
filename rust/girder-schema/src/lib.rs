#![deny(unsafe_code)]

//! Schema types for girder service code generation.
//!
//! This crate owns the front half of the pipeline: the closed
//! [`TypeDescriptor`] union every component dispatches over, the
//! serializability predicate that decides which shapes are legal on the wire,
//! the annotation resolver, and the service model builder that turns a
//! ready-made introspection document into a validated [`ServiceDef`].
//!
//! Backends never inspect source code or do their own validation; they read
//! the `ServiceDef` (and the [`TypeIndex`] for named-type resolution) and
//! nothing else.

pub mod annotations;
pub mod descriptor;
mod error;
pub mod service;
pub mod validate;

pub use annotations::{
    AnnotationError, MethodAnnotations, ServiceAnnotations, DEFAULT_API_VERSION,
};
pub use descriptor::{FieldDef, PrimitiveKind, QualifiedName, StructDef, TypeDescriptor, TypeIndex};
pub use error::ModelError;
pub use service::{
    build_service, InterfaceDecl, Introspection, InvalidMethodPolicy, MethodDecl, MethodDef,
    ServiceDef,
};
pub use validate::{fits_wire_schema, is_key_eligible, is_serializable};
