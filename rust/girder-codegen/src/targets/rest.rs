//! REST conventions shared by the HTTP transports and the document backends.
//!
//! Every REST-facing target agrees on two things: which verbs carry their
//! request in the query string, and the response envelope (`code` 0 on
//! success, [`ERROR_CODE`] plus a message on failure).

/// Envelope `code` for a failed call. Success is always 0.
pub const ERROR_CODE: i64 = -1;

/// Verbs whose request payload travels in the query string. Everything else
/// (POST, PUT, PATCH) carries a JSON body.
pub fn verb_uses_query(verb: &str) -> bool {
    matches!(verb, "GET" | "DELETE")
}

/// Name of the generated per-method envelope struct.
pub fn http_response_name(method_name: &str) -> String {
    format!("{method_name}HttpResponse")
}
