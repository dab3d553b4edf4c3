//! The backend-generator protocol and the plugin registry.
//!
//! The registry is an explicit value built by the entry point through
//! [`builtin_registry`] — no import-time side effects, no process-global
//! mutable state. Registering two backends under one name is a programmer
//! error and panics immediately.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CodegenError;
use crate::output::OutputSet;
use crate::GenContext;

/// One pluggable backend generator. Backends are stateless across
/// invocations: everything they read comes from the [`GenContext`], and
/// everything they produce goes through the [`OutputSet`].
pub trait Backend {
    fn name(&self) -> &'static str;

    fn generate(&self, cx: &GenContext<'_>, out: &mut OutputSet) -> Result<(), CodegenError>;
}

/// Name → backend map.
#[derive(Default)]
pub struct Registry {
    backends: BTreeMap<&'static str, Box<dyn Backend>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own name.
    ///
    /// # Panics
    ///
    /// Panics if the name is already taken. Duplicate registration is a
    /// programmer error in the bootstrap code, not a user input problem.
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        let name = backend.name();
        if self.backends.insert(name, backend).is_some() {
            panic!("`{name}` already registered as a backend generator");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Backend> {
        self.backends.get(name).map(Box::as_ref)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.keys().copied().collect()
    }

    /// Run the named backends in the given order against one context.
    /// An unknown or repeated name is fatal before any backend runs: a
    /// backend run twice would append its whole output into the same
    /// buffer.
    pub fn run(
        &self,
        names: &[String],
        cx: &GenContext<'_>,
        out: &mut OutputSet,
    ) -> Result<(), CodegenError> {
        let mut selected = Vec::with_capacity(names.len());
        let mut requested = BTreeSet::new();
        for name in names {
            if !requested.insert(name.as_str()) {
                return Err(CodegenError::DuplicateBackend(name.clone()));
            }
            match self.get(name) {
                Some(backend) => selected.push(backend),
                None => return Err(CodegenError::UnknownBackend(name.clone())),
            }
        }
        for backend in selected {
            backend.generate(cx, out)?;
        }
        Ok(())
    }
}

/// The registry with every built-in backend installed.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(Box::new(crate::targets::rust::EndpointBackend));
    registry.register(Box::new(crate::targets::http_server::HttpServerBackend));
    registry.register(Box::new(crate::targets::http_client::HttpClientBackend));
    registry.register(Box::new(crate::targets::typescript::TypescriptBackend));
    registry.register(Box::new(crate::targets::proto::ProtoBackend));
    registry.register(Box::new(crate::targets::openapi::OpenApiBackend));
    registry.register(Box::new(crate::targets::local::LocalBackend));
    registry
}
