//! Annotation extraction and typed population.
//!
//! Annotations are `@key value` (or bare `@key`) lines in the documentation
//! text attached to a service declaration or method. Extraction yields a
//! string map; population assigns typed record fields through an explicit
//! declarative table of key → slot bindings, accumulating conversion errors
//! instead of stopping at the first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Baseline API version used when the service declares none.
pub const DEFAULT_API_VERSION: &str = "v0.1.0";

/// HTTP verbs the transport backends understand. Anything else resolves to
/// POST during default-filling.
pub const KNOWN_HTTP_METHODS: [&str; 5] = ["GET", "PUT", "PATCH", "DELETE", "POST"];

/// Extract `@key value` pairs from documentation text.
///
/// Keys are `[A-Za-z0-9_-]+`. A bare `@key` maps to the empty string, which a
/// boolean slot later reads as `true`. Lines that are not annotations are
/// ignored; a `//` or `///` comment prefix is tolerated so callers may pass
/// raw comment blocks.
pub fn parse_annotations(doc: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    for line in doc.lines() {
        let line = line
            .trim_start()
            .trim_start_matches('/')
            .trim();
        let Some(rest) = line.strip_prefix('@') else {
            continue;
        };

        let key_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        if key_len == 0 {
            continue;
        }

        let (key, tail) = rest.split_at(key_len);
        if tail.is_empty() {
            out.insert(key.to_string(), String::new());
        } else if tail.starts_with(char::is_whitespace) {
            out.insert(key.to_string(), tail.trim().to_string());
        }
        // `@key=...` and other malformed tails are not annotations.
    }

    out
}

/// A failed string → typed-field conversion. Population reports every
/// failure, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("annotation `@{key}`: expected {expected} value, got `{value}`")]
pub struct AnnotationError {
    pub key: String,
    pub expected: &'static str,
    pub value: String,
}

/// A typed destination for one annotation key.
pub enum Slot<'a> {
    Str(&'a mut String),
    Int(&'a mut i64),
    Float(&'a mut f64),
    /// A bare `@key` sets the flag; an explicit `true`/`false` is also
    /// accepted.
    Flag(&'a mut bool),
}

/// Declarative key → slot table. Replaces the reflection-driven struct-tag
/// population of ancestry: the set of recognized keys is spelled out where
/// the record is defined, and population is plain code.
#[derive(Default)]
pub struct AnnotationTable<'a> {
    entries: Vec<(&'static str, Slot<'a>)>,
}

impl<'a> AnnotationTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, key: &'static str, slot: Slot<'a>) -> Self {
        self.entries.push((key, slot));
        self
    }

    /// Assign every bound key present in `values`, converting to the slot's
    /// kind. Unbound keys in `values` are ignored. Returns all conversion
    /// failures; slots whose conversion failed keep their prior value.
    pub fn populate(self, values: &BTreeMap<String, String>) -> Vec<AnnotationError> {
        let mut errors = Vec::new();

        for (key, slot) in self.entries {
            let Some(raw) = values.get(key) else {
                continue;
            };
            match slot {
                Slot::Str(dest) => *dest = raw.clone(),
                Slot::Int(dest) => match raw.parse::<i64>() {
                    Ok(v) => *dest = v,
                    Err(_) => errors.push(AnnotationError {
                        key: key.to_string(),
                        expected: "integer",
                        value: raw.clone(),
                    }),
                },
                Slot::Float(dest) => match raw.parse::<f64>() {
                    Ok(v) => *dest = v,
                    Err(_) => errors.push(AnnotationError {
                        key: key.to_string(),
                        expected: "float",
                        value: raw.clone(),
                    }),
                },
                Slot::Flag(dest) => {
                    if raw.is_empty() {
                        *dest = true;
                    } else {
                        match raw.parse::<bool>() {
                            Ok(v) => *dest = v,
                            Err(_) => errors.push(AnnotationError {
                                key: key.to_string(),
                                expected: "boolean",
                                value: raw.clone(),
                            }),
                        }
                    }
                }
            }
        }

        errors
    }
}

/// Service-level transport metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAnnotations {
    /// `@api-title` — defaults to the service name.
    #[serde(default)]
    pub api_title: String,

    /// `@api-version` — defaults to [`DEFAULT_API_VERSION`].
    #[serde(default)]
    pub api_version: String,

    /// `@http-base-path` — defaults to `/api/v1/{kebab-case service name}`.
    #[serde(default)]
    pub http_base_path: String,
}

impl ServiceAnnotations {
    pub fn resolve(doc: &str) -> (Self, Vec<AnnotationError>) {
        let values = parse_annotations(doc);
        let mut out = Self::default();
        let errors = AnnotationTable::new()
            .bind("api-title", Slot::Str(&mut out.api_title))
            .bind("api-version", Slot::Str(&mut out.api_version))
            .bind("http-base-path", Slot::Str(&mut out.http_base_path))
            .populate(&values);
        (out, errors)
    }
}

/// Per-method transport metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodAnnotations {
    /// `@http-method` — upper-cased during default-filling; anything outside
    /// [`KNOWN_HTTP_METHODS`] resolves to POST.
    #[serde(default)]
    pub http_method: String,

    /// `@http-path` — defaults to `{base-path}/{kebab-case method name}`.
    #[serde(default)]
    pub http_path: String,

    /// `@deprecated` — surfaced by the API-document backend.
    #[serde(default)]
    pub deprecated: bool,
}

impl MethodAnnotations {
    pub fn resolve(doc: &str) -> (Self, Vec<AnnotationError>) {
        let values = parse_annotations(doc);
        let mut out = Self::default();
        let errors = AnnotationTable::new()
            .bind("http-method", Slot::Str(&mut out.http_method))
            .bind("http-path", Slot::Str(&mut out.http_path))
            .bind("deprecated", Slot::Flag(&mut out.deprecated))
            .populate(&values);
        (out, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_and_bare_annotations() {
        let doc = "Buy a good.\n\n@http-method get\n@http-path /x\n@deprecated\nnot @an annotation mid-line";
        let values = parse_annotations(doc);
        assert_eq!(values.get("http-method").map(String::as_str), Some("get"));
        assert_eq!(values.get("http-path").map(String::as_str), Some("/x"));
        assert_eq!(values.get("deprecated").map(String::as_str), Some(""));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn tolerates_comment_prefixes() {
        let values = parse_annotations("// @http-method post\n/// @api-title Orders");
        assert_eq!(values.get("http-method").map(String::as_str), Some("post"));
        assert_eq!(values.get("api-title").map(String::as_str), Some("Orders"));
    }

    #[test]
    fn populate_accumulates_all_conversion_errors() {
        let mut values = BTreeMap::new();
        values.insert("retries".to_string(), "lots".to_string());
        values.insert("timeout".to_string(), "soon".to_string());
        values.insert("label".to_string(), "ok".to_string());

        let mut retries = 0i64;
        let mut timeout = 0.0f64;
        let mut label = String::new();
        let errors = AnnotationTable::new()
            .bind("retries", Slot::Int(&mut retries))
            .bind("timeout", Slot::Float(&mut timeout))
            .bind("label", Slot::Str(&mut label))
            .populate(&values);

        assert_eq!(errors.len(), 2);
        assert_eq!(label, "ok");
        assert_eq!(retries, 0);
    }

    #[test]
    fn bare_flag_sets_true() {
        let (annotations, errors) = MethodAnnotations::resolve("@deprecated");
        assert!(errors.is_empty());
        assert!(annotations.deprecated);
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let (annotations, errors) = MethodAnnotations::resolve("@no-such-key whatever");
        assert!(errors.is_empty());
        assert_eq!(annotations, MethodAnnotations::default());
    }
}
