//! End-to-end pipeline tests: JSON introspection input through the builder,
//! adapter derivation, and every built-in backend.

use pretty_assertions::assert_eq;

use girder_codegen::{builtin_registry, derive_adapters, GenContext, OutputSet};
use girder_schema::{build_service, Introspection, InvalidMethodPolicy, ModelError};

const ORDER_INTROSPECTION: &str = r#"{
    "types": {
        "Good": {
            "struct": {
                "fields": [
                    { "name": "Name", "type": { "primitive": "string" } },
                    { "name": "Price", "type": { "primitive": "f64" } },
                    { "name": "Vendor", "type": { "named": "Vendor" } }
                ]
            }
        },
        "Vendor": {
            "struct": {
                "fields": [
                    { "name": "ID", "type": { "primitive": "i64" } }
                ]
            }
        }
    },
    "interfaces": [
        {
            "name": "OrderService",
            "doc": "Orders and purchases.",
            "methods": [
                {
                    "name": "Buy",
                    "doc": "Buy purchases a good.",
                    "params": [
                        { "name": "ctx", "type": "context" },
                        { "name": "Good", "type": { "named": "Good" } }
                    ],
                    "results": [
                        { "name": "OrderID", "type": { "primitive": "string" } },
                        { "name": "err", "type": "error-marker" }
                    ]
                },
                {
                    "name": "Find",
                    "doc": "@http-method get\n@http-path /find-good",
                    "params": [
                        { "name": "ctx", "type": "context" },
                        { "name": "Name", "type": { "primitive": "string" } }
                    ],
                    "results": [
                        { "name": "Good", "type": { "named": "Good" } },
                        { "name": "err", "type": "error-marker" }
                    ]
                },
                {
                    "name": "Watch",
                    "doc": "Watch streams price changes.",
                    "params": [
                        { "name": "ctx", "type": "context" },
                        { "name": "Prices", "type": { "map": { "key": { "primitive": "string" }, "value": "channel" } } }
                    ],
                    "results": [
                        { "name": "err", "type": "error-marker" }
                    ]
                },
                {
                    "name": "internalAudit",
                    "exported": false,
                    "params": [ { "name": "ctx", "type": "context" } ],
                    "results": [ { "name": "err", "type": "error-marker" } ]
                }
            ]
        }
    ]
}"#;

fn parse() -> Introspection {
    serde_json::from_str(ORDER_INTROSPECTION).expect("introspection parses")
}

fn generate_all(intro: &Introspection) -> OutputSet {
    let service = build_service(intro, "OrderService", InvalidMethodPolicy::Drop).expect("build");
    let adapters = derive_adapters(&service);
    let cx = GenContext::new(&service, &intro.types, &adapters);

    let registry = builtin_registry();
    let names: Vec<String> = registry.names().iter().map(|s| s.to_string()).collect();
    let mut out = OutputSet::new();
    registry.run(&names, &cx, &mut out).expect("generate");
    out
}

fn file(out: &OutputSet, path: &str) -> String {
    out.get(path)
        .unwrap_or_else(|| panic!("missing output file {path}"))
        .as_str()
        .to_string()
}

#[test]
fn every_backend_produces_its_file() {
    let out = generate_all(&parse());
    let paths: Vec<String> = out
        .files()
        .map(|(p, _)| p.display().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "client.ts",
            "endpoint_gen.rs",
            "http_client_gen.rs",
            "http_server_gen.rs",
            "local_gen.rs",
            "openapi.json",
            "rpc.proto",
        ]
    );
}

#[test]
fn buy_method_flows_into_records_trait_and_adapter() {
    let out = generate_all(&parse());
    let endpoint = file(&out, "endpoint_gen.rs");

    assert!(endpoint.contains("pub trait OrderService {"));
    assert!(endpoint
        .contains("fn buy(&self, ctx: &Ctx, good: Good) -> Result<String, ServiceError>;"));
    assert!(endpoint.contains("pub struct BuyRequest {"));
    assert!(endpoint.contains("pub struct BuyResponse {"));
    assert!(endpoint.contains("pub fn buy_adapter<S: OrderService>"));
}

#[test]
fn unannotated_methods_default_to_post_under_the_base_path() {
    let out = generate_all(&parse());
    let server = file(&out, "http_server_gen.rs");
    assert!(server.contains(".route(\"/api/v1/order-service/buy\", post(buy_handler::<S>))"));
    assert!(server.contains("Json(req): Json<BuyRequest>"));
}

#[test]
fn annotated_get_method_decodes_from_the_query_string() {
    let out = generate_all(&parse());
    let server = file(&out, "http_server_gen.rs");
    assert!(server.contains(".route(\"/find-good\", get(find_handler::<S>))"));
    assert!(server.contains("Query(req): Query<FindRequest>"));

    let client = file(&out, "http_client_gen.rs");
    assert!(client.contains(".get(&url)"));
    assert!(client.contains(".query(req)"));
}

#[test]
fn unserializable_method_is_dropped_everywhere() {
    let out = generate_all(&parse());
    for path in ["endpoint_gen.rs", "http_server_gen.rs", "client.ts", "rpc.proto"] {
        let content = file(&out, path);
        assert!(!content.contains("Watch"), "{path} mentions the dropped method");
        assert!(!content.contains("watch"), "{path} mentions the dropped method");
    }
}

#[test]
fn unexported_method_is_skipped() {
    let out = generate_all(&parse());
    assert!(!file(&out, "endpoint_gen.rs").contains("internal_audit"));
}

#[test]
fn strict_policy_aborts_on_the_invalid_method() {
    let intro = parse();
    let err = build_service(&intro, "OrderService", InvalidMethodPolicy::Abort).unwrap_err();
    match err {
        ModelError::InvalidMethod { method, .. } => assert_eq!(method, "OrderService.Watch"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn shared_named_type_is_emitted_once_per_target() {
    let out = generate_all(&parse());

    let endpoint = file(&out, "endpoint_gen.rs");
    assert_eq!(endpoint.matches("pub struct Good {").count(), 1);
    assert_eq!(endpoint.matches("pub struct Vendor {").count(), 1);
    // Dependencies come before dependents.
    let vendor = endpoint.find("pub struct Vendor {").expect("vendor");
    let good = endpoint.find("pub struct Good {").expect("good");
    assert!(vendor < good);

    let ts = file(&out, "client.ts");
    assert_eq!(ts.matches("export interface Good {").count(), 1);

    let proto = file(&out, "rpc.proto");
    assert_eq!(proto.matches("message Good {").count(), 1);
}

#[test]
fn openapi_document_reflects_defaults_and_paths() {
    let out = generate_all(&parse());
    let doc: serde_json::Value = serde_json::from_str(&file(&out, "openapi.json")).expect("json");

    assert_eq!(doc["info"]["title"], "OrderService");
    assert_eq!(doc["info"]["version"], "v0.1.0");
    // `/find-good` lives outside the default base path, so the document
    // keys every operation by its full path and carries no basePath.
    assert!(doc.get("basePath").is_none());
    assert!(doc["paths"]["/api/v1/order-service/buy"]["post"].is_object());
    assert!(doc["paths"]["/find-good"]["get"].is_object());
    assert!(doc["definitions"]["Good"].is_object());
    assert!(doc["definitions"]["BuyHttpResponse"].is_object());
}

#[test]
fn generation_is_deterministic() {
    let intro = parse();
    let first = generate_all(&intro);
    let second = generate_all(&intro);

    let render = |out: &OutputSet| {
        out.files()
            .map(|(p, f)| format!("=== {} ===\n{}", p.display(), f.as_str()))
            .collect::<String>()
    };
    assert_eq!(render(&first), render(&second));
}

#[test]
fn flush_then_regenerate_is_idempotent_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let intro = parse();

    generate_all(&intro).flush(dir.path()).expect("first flush");
    let before = std::fs::read_to_string(dir.path().join("endpoint_gen.rs")).expect("read");

    generate_all(&intro).flush(dir.path()).expect("second flush");
    let after = std::fs::read_to_string(dir.path().join("endpoint_gen.rs")).expect("read");

    assert_eq!(before, after);
}
