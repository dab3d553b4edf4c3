use crate::annotations::AnnotationError;

/// Fatal model-level failures. Anything here aborts the run; recoverable
/// per-method problems are handled by the builder's invalid-method policy
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("declaration `{0}` not found")]
    DeclarationNotFound(String),

    #[error("`{0}` is not an interface declaration")]
    NotAnInterface(String),

    /// Only produced under [`InvalidMethodPolicy::Abort`].
    ///
    /// [`InvalidMethodPolicy::Abort`]: crate::service::InvalidMethodPolicy
    #[error("method `{method}`: {reason}")]
    InvalidMethod { method: String, reason: String },

    #[error("invalid annotations on `{target}`: {details}")]
    Annotations { target: String, details: String },
}

impl ModelError {
    pub fn annotations(target: impl Into<String>, errors: Vec<AnnotationError>) -> Self {
        let details = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ModelError::Annotations {
            target: target.into(),
            details,
        }
    }
}
