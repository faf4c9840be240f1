use super::*;
use serde_json::json;

#[test]
fn query_frame_serializes_to_rpc_shape() {
    let frame = RequestFrame::query(7, "select * from person");
    let text = encode_request(&frame).expect("encode");
    let value: Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value, json!({"id": 7, "method": "query", "params": ["select * from person"]}));
}

#[test]
fn handshake_frame_uses_reserved_id() {
    let frame = RequestFrame::handshake("test", "test");
    assert_eq!(frame.id, HANDSHAKE_ID);
    let value: Value = serde_json::from_str(&encode_request(&frame).expect("encode")).expect("json");
    assert_eq!(value, json!({"id": 0, "method": "use", "params": ["test", "test"]}));
}

#[test]
fn query_text_with_quotes_is_escaped() {
    let frame = RequestFrame::query(1, r#"select * from person where name = "a""#);
    let text = encode_request(&frame).expect("encode");
    let back: RequestFrame = serde_json::from_str(&text).expect("decode");
    assert_eq!(back, frame);
}

#[test]
fn peek_id_reads_top_level_id_only() {
    let raw = r#"{"id":3,"result":[{"result":[{"id":"person:1"}]}]}"#;
    assert_eq!(peek_id(raw).expect("id"), 3);
}

#[test]
fn peek_id_rejects_missing_id() {
    let err = peek_id(r#"{"result":[]}"#).expect_err("missing id");
    assert!(matches!(err, FrameError::Json(_)));
}

#[test]
fn peek_id_rejects_non_integer_id() {
    assert!(peek_id(r#"{"id":"abc"}"#).is_err());
    assert!(peek_id(r#"{"id":-1}"#).is_err());
    assert!(peek_id("not json").is_err());
}

#[test]
fn envelope_yields_first_statement_items() {
    let raw = r#"{"id":1,"result":[{"result":[{"a":1},{"a":2}]},{"result":[{"a":3}]}]}"#;
    let items = Envelope::parse(raw).expect("envelope").into_items();
    assert_eq!(items, vec![json!({"a": 1}), json!({"a": 2})]);
}

#[test]
fn envelope_with_empty_outer_list_has_no_items() {
    let items = Envelope::parse(r#"{"id":1,"result":[]}"#).expect("envelope").into_items();
    assert!(items.is_empty());
}

#[test]
fn envelope_with_wrong_shape_has_no_items() {
    for raw in [
        r#"{"id":1,"result":"nope"}"#,
        r#"{"id":1,"result":[{"result":{"a":1}}]}"#,
        r#"{"id":1,"result":["not a statement"]}"#,
    ] {
        let envelope = Envelope::parse(raw).expect("object parses");
        assert!(envelope.into_items().is_empty(), "raw: {raw}");
    }
    assert!(Envelope::parse("[1,2]").is_none());
}

#[test]
fn later_statement_shape_does_not_affect_first() {
    let raw = r#"{"id":1,"result":[{"result":[{"a":1}],"status":"OK"},{"result":"table not found","status":"ERR"}]}"#;
    let items = Envelope::parse(raw).expect("envelope").into_items();
    assert_eq!(items, vec![json!({"a": 1})]);
}

#[test]
fn envelope_carries_server_error() {
    let raw = r#"{"id":4,"error":{"code":-32000,"message":"There was a problem with the database"}}"#;
    let envelope = Envelope::parse(raw).expect("envelope");
    assert_eq!(
        envelope.rpc_error(),
        Some(RpcError { code: -32000, message: "There was a problem with the database".to_owned() })
    );
    assert!(envelope.into_items().is_empty());
}

#[test]
fn non_object_error_is_tolerated() {
    let raw = r#"{"id":4,"error":"oops","result":[{"result":[{"a":1}]}]}"#;
    let envelope = Envelope::parse(raw).expect("envelope");
    assert_eq!(envelope.rpc_error(), None);
    assert_eq!(envelope.error, Some(json!("oops")));
    assert_eq!(envelope.into_items(), vec![json!({"a": 1})]);
}
