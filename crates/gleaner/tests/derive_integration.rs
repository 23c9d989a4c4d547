//! Integration tests for `#[derive(Record)]` output.

use gleaner::{
    AfterBind, BindErrorKind, BindRequest, Binder, BoxError, Memo, Record, Slot, SlotKind, Value,
};

fn header_source(req: &BindRequest, name: &str, _memo: &mut Memo) -> Option<Value> {
    req.header(name).map(Value::from)
}

fn json_decoder(_req: &BindRequest, body: &[u8]) -> Result<Value, BoxError> {
    let doc: serde_json::Value = serde_json::from_slice(body)?;
    Ok(Value::from(doc))
}

fn binder() -> Binder {
    Binder::builder()
        .source("header", header_source)
        .decoder("application/json", json_decoder)
        .build()
        .unwrap()
}

fn json_post(body: &str) -> BindRequest {
    BindRequest::builder()
        .method(http::Method::POST)
        .header("content-type", "application/json")
        .body(body.to_string())
        .build()
}

#[derive(Debug, Default, PartialEq, Record)]
struct Address {
    city: String,
    zip: u32,
}

#[derive(Debug, Default, Record)]
struct Order {
    #[bind(header = "x-order-id")]
    id: u64,
    items: Vec<String>,
    shipping: Option<Address>,
    #[bind(body = "type")]
    r#type: String,
    #[bind(skip)]
    attempts: u32,
}

#[test]
fn test_schema() {
    let schema = Order::describe();

    assert_eq!(schema.type_name, "Order");
    let names: Vec<_> = schema.fields.iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["id", "items", "shipping", "type"]);
    assert_eq!(schema.fields[0].annotation("header"), Some("x-order-id"));
    assert_eq!(schema.fields[3].body_key, "type");
}

#[test]
fn test_nested_body_merge() {
    let req = json_post(r#"{"items":["a","b"],"shipping":{"city":"Oslo","zip":150},"type":"express"}"#);

    let mut order = Order::default();
    binder().bind(&req, &mut order).unwrap();

    assert_eq!(order.items, vec!["a", "b"]);
    assert_eq!(
        order.shipping,
        Some(Address {
            city: "Oslo".to_string(),
            zip: 150
        })
    );
    assert_eq!(order.r#type, "express");
}

#[test]
fn test_nested_error_path() {
    let req = json_post(r#"{"shipping":{"zip":-3}}"#);

    let err = binder().bind(&req, &mut Order::default()).unwrap_err();

    assert_eq!(err.kind(), BindErrorKind::Decode);
    let source = std::error::Error::source(&err).unwrap().to_string();
    assert_eq!(
        source,
        "field `shipping`: field `zip`: negative value -3 cannot be stored in unsigned u32"
    );
}

#[test]
fn test_slot_behaviour() {
    let mut order = Order {
        id: 9,
        attempts: 3,
        ..Order::default()
    };

    assert_eq!(order.kind(), SlotKind::Record);
    assert!(!order.is_zero());
    assert_eq!(order.to_value().get("id"), Some(&Value::Uint(9)));
    assert_eq!(order.to_value().get("attempts"), None);

    order.reset();
    assert!(order.is_zero());
    assert_eq!(order.attempts, 0);
}

#[test]
fn test_field_access_by_index() {
    let mut order = Order::default();

    order.field_mut(0).unwrap().assign(Value::from("12")).unwrap();

    assert_eq!(order.id, 12);
    assert_eq!(order.field(0).map(Slot::to_value), Some(Value::Uint(12)));
    assert!(order.field(10).is_none());
}

#[derive(Debug, Default, Record)]
#[bind(after_bind)]
struct Range {
    #[bind(header = "x-from")]
    from: u32,
    #[bind(header = "x-to")]
    to: u32,
}

impl AfterBind for Range {
    fn after_bind(&mut self, _request: &BindRequest) -> Result<(), BoxError> {
        if self.from > self.to {
            return Err(format!("from {} is after to {}", self.from, self.to).into());
        }
        Ok(())
    }
}

#[test]
fn test_after_bind_accepts() {
    let req = BindRequest::builder()
        .header("x-from", "1")
        .header("x-to", "5")
        .build();

    let mut range = Range::default();
    binder().bind(&req, &mut range).unwrap();

    assert_eq!((range.from, range.to), (1, 5));
}

#[test]
fn test_after_bind_rejects() {
    let req = BindRequest::builder()
        .header("x-from", "9")
        .header("x-to", "5")
        .build();

    let err = binder().bind(&req, &mut Range::default()).unwrap_err();

    assert_eq!(err.kind(), BindErrorKind::Hook);
    assert_eq!(
        std::error::Error::source(&err).unwrap().to_string(),
        "from 9 is after to 5"
    );
}
