//! Backend generator targets.
//!
//! Each submodule is one independent backend reading the shared
//! [`GenContext`](crate::GenContext). `rest` is not a backend itself: it
//! holds the REST conventions (verb → codec selection, response envelope)
//! the HTTP server/client and document targets agree on.

pub mod http_client;
pub mod http_server;
pub mod local;
pub mod openapi;
pub mod proto;
pub mod rest;
pub mod rust;
pub mod typescript;
