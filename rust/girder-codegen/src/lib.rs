#![deny(unsafe_code)]

//! Backend code generation for girder service definitions.
//!
//! The front half of the pipeline (girder-schema) produces a validated
//! [`ServiceDef`]; this crate turns it into artifacts. The flow is:
//!
//! ```text
//! ServiceDef ──derive_adapters──▶ EndpointAdapters
//!      │                              │
//!      └────────── GenContext ◀───────┘
//!                      │
//!        every registered Backend reads the same context
//!                      │
//!                  OutputSet ──flush──▶ files on disk
//! ```
//!
//! Backends are independent and stateless; the [`OutputSet`] buffer map is
//! the only thing they share. Adding a backend means implementing
//! [`Backend`] and registering it in [`builtin_registry`].
//!
//! [`ServiceDef`]: girder_schema::ServiceDef

pub mod code_writer;
pub mod endpoint;
mod error;
pub mod output;
pub mod registry;
pub mod targets;
pub mod walk;

use girder_schema::{ServiceDef, TypeIndex};

pub use code_writer::CodeWriter;
pub use endpoint::{derive_adapters, EndpointAdapter, RecordDef};
pub use error::CodegenError;
pub use output::{OutputFile, OutputSet};
pub use registry::{builtin_registry, Backend, Registry};

/// Everything a backend may read: the immutable service model, the type
/// index for named-type resolution, and the derived endpoint adapters.
pub struct GenContext<'a> {
    pub service: &'a ServiceDef,
    pub types: &'a TypeIndex,
    pub adapters: &'a [EndpointAdapter],
}

impl<'a> GenContext<'a> {
    pub fn new(
        service: &'a ServiceDef,
        types: &'a TypeIndex,
        adapters: &'a [EndpointAdapter],
    ) -> Self {
        Self {
            service,
            types,
            adapters,
        }
    }
}
