/// Failures raised by backend generators and the output aggregator.
///
/// `UnsupportedShape` is the backend-local case: the model passed validation
/// but the target format cannot represent a shape (a slice of maps in proto,
/// say). That aborts the backend loudly rather than silently skipping the
/// schema.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("no backend registered under `{0}`")]
    UnknownBackend(String),

    #[error("backend `{0}` requested more than once")]
    DuplicateBackend(String),

    #[error("backend `{backend}`: unsupported type shape: {detail}")]
    UnsupportedShape {
        backend: &'static str,
        detail: String,
    },

    #[error("backend `{backend}`: unknown type `{name}` reached emission")]
    UnknownType {
        backend: &'static str,
        name: String,
    },

    #[error("formatting generated code failed: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("serializing the API document failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write generated files: {details}")]
    Flush { details: String },
}
