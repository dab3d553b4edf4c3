//! Endpoint adapter derivation.
//!
//! Every backend targets the same calling convention: per method a Request
//! record (the non-context parameters), a Response record (the non-error
//! results), and an adapter of shape `(context, Request) -> (Response,
//! error)`. Backends never call the underlying method directly — the rust
//! target emits the adapter, the transports and bindings route through it.

use girder_schema::{FieldDef, MethodDef, PrimitiveKind, ServiceDef, TypeDescriptor};

/// A generated record: a name plus ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl RecordDef {
    /// REST response envelope: the same record with `Code:int64` (wire name
    /// `code`) and `Message:string` (wire name `message`) prepended. The
    /// wire names are fixed; the fields are never omitted or stringified.
    pub fn with_envelope(&self) -> RecordDef {
        let mut fields = Vec::with_capacity(self.fields.len() + 2);
        fields.push(
            FieldDef::new("Code", TypeDescriptor::Primitive(PrimitiveKind::I64))
                .with_wire_name("code"),
        );
        fields.push(FieldDef::new("Message", TypeDescriptor::string()).with_wire_name("message"));
        fields.extend(self.fields.iter().cloned());
        RecordDef {
            name: self.name.clone(),
            fields,
        }
    }
}

/// The uniform per-method calling convention.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointAdapter {
    pub method_name: String,
    pub request: RecordDef,
    pub response: RecordDef,
}

/// Derive one adapter per retained method, in declaration order.
///
/// Field order and types are preserved exactly: the Request record is the
/// method's non-context parameters, the Response record its non-error
/// results.
pub fn derive_adapters(service: &ServiceDef) -> Vec<EndpointAdapter> {
    service.methods.iter().map(derive_adapter).collect()
}

fn derive_adapter(method: &MethodDef) -> EndpointAdapter {
    EndpointAdapter {
        method_name: method.name.clone(),
        request: RecordDef {
            name: format!("{}Request", method.name),
            fields: method.params.clone(),
        },
        response: RecordDef {
            name: format!("{}Response", method.name),
            fields: method.results.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use girder_schema::{
        build_service, FieldDef, InterfaceDecl, Introspection, InvalidMethodPolicy, MethodDecl,
        StructDef, TypeIndex,
    };

    fn buy_service() -> ServiceDef {
        let mut types = TypeIndex::new();
        types.insert(
            "Good",
            TypeDescriptor::Struct(StructDef::new(vec![
                FieldDef::new("Name", TypeDescriptor::string()),
                FieldDef::new("Price", TypeDescriptor::f64()),
            ])),
        );
        let intro = Introspection {
            types,
            interfaces: vec![InterfaceDecl {
                name: "OrderService".to_string(),
                doc: String::new(),
                methods: vec![MethodDecl {
                    name: "Buy".to_string(),
                    doc: String::new(),
                    exported: true,
                    params: vec![
                        FieldDef::new("ctx", TypeDescriptor::Context),
                        FieldDef::new("Good", TypeDescriptor::named("Good")),
                    ],
                    results: vec![
                        FieldDef::new("OrderID", TypeDescriptor::string()),
                        FieldDef::new("err", TypeDescriptor::ErrorMarker),
                    ],
                }],
            }],
        };
        build_service(&intro, "OrderService", InvalidMethodPolicy::Drop).expect("build")
    }

    #[test]
    fn adapter_records_mirror_the_method() {
        let service = buy_service();
        let adapters = derive_adapters(&service);
        assert_eq!(adapters.len(), 1);

        let buy = &adapters[0];
        assert_eq!(buy.request.name, "BuyRequest");
        assert_eq!(buy.request.fields.len(), 1);
        assert_eq!(buy.request.fields[0].name, "Good");
        assert_eq!(buy.response.name, "BuyResponse");
        assert_eq!(buy.response.fields.len(), 1);
        assert_eq!(buy.response.fields[0].name, "OrderID");
        assert_eq!(buy.response.fields[0].ty, TypeDescriptor::string());
    }

    #[test]
    fn envelope_prepends_code_and_message() {
        let service = buy_service();
        let adapters = derive_adapters(&service);
        let envelope = adapters[0].response.with_envelope();

        assert_eq!(envelope.fields[0].name, "Code");
        assert_eq!(envelope.fields[0].wire(), "code");
        assert_eq!(envelope.fields[1].name, "Message");
        assert_eq!(envelope.fields[1].wire(), "message");
        assert_eq!(envelope.fields[2].name, "OrderID");
    }
}
