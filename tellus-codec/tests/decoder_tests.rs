mod common;

use common::{recording_handler, registry, Point};
use pretty_assertions::assert_eq;
use serde_json::json;
use tellus_codec::{Encoder, JsonDecoder, JsonEncoder};
use tellus_model::{Container, Event, GenericRecord, Session, State, Telemetry, Transaction};
use tellus_types::{CompletionStatus, EntityId, TelemetryError, Value};

fn decode_json(value: serde_json::Value) -> (Box<dyn Telemetry>, Vec<String>) {
    let (handler, seen) = recording_handler();
    let mut decoder = JsonDecoder::with_error_handler(registry(), handler);
    let entity = decoder.decode(&serde_json::to_vec(&value).unwrap()).unwrap();
    let errors = seen.lock().unwrap().clone();
    (entity, errors)
}

// ── Built-in kinds ───────────────────────────────────────────────

#[test]
fn decodes_transaction_fields() {
    let id = EntityId::new();
    let (entity, errors) = decode_json(json!({
        "a_type": "TR",
        "a_entityid": id.to_string(),
        "a_timestamp": "1700000000000",
        "a_resourceid": "db://orders",
        "a_params": ["a", "b"],
        "a_status": "F",
        "a_execns": "2500",
    }));
    assert!(errors.is_empty());

    let tx = entity.downcast_ref::<Transaction>().unwrap();
    assert_eq!(tx.entity_id(), id);
    assert_eq!(tx.timestamp().as_millis(), 1_700_000_000_000);
    assert_eq!(tx.resource_id(), Some("db://orders"));
    assert_eq!(
        tx.parameters(),
        Some(&[Value::from("a"), Value::from("b")][..])
    );
    assert_eq!(tx.status(), Some(CompletionStatus::Failure));
    assert_eq!(tx.duration_nanos(), Some(2500));
}

#[test]
fn status_reads_first_character_only() {
    let (entity, _) = decode_json(json!({"a_type": "SE", "a_status": "PartialSuccess"}));
    let session = entity.downcast_ref::<Session>().unwrap();
    assert_eq!(session.status(), Some(CompletionStatus::PartialSuccess));
}

#[test]
fn numbers_and_booleans_are_accepted_for_text_fields() {
    let (entity, errors) = decode_json(json!({
        "a_type": "EV",
        "a_timestamp": 1234,
        "flag": true,
    }));
    assert!(errors.is_empty());
    assert_eq!(entity.timestamp().as_millis(), 1234);
    assert_eq!(entity.extension("flag"), Some(&Value::from("true")));
}

#[test]
fn null_fields_are_skipped() {
    let (entity, errors) = decode_json(json!({"a_type": "EV", "a_msg": null, "note": null}));
    assert!(errors.is_empty());
    assert_eq!(entity.message(), None);
    assert_eq!(entity.extension("note"), None);
}

#[test]
fn children_attach_in_order_and_link_to_container() {
    let (entity, errors) = decode_json(json!({
        "a_type": "SE",
        "child": [
            {"a_type": "EV", "a_subtype": "click"},
            {"a_type": "ST", "a_subtype": "cart"},
        ],
    }));
    assert!(errors.is_empty());

    let children = entity.as_container().unwrap().children();
    assert_eq!(children.len(), 2);
    assert!(children[0].is::<Event>());
    assert!(children[1].is::<State>());
    assert_eq!(children[0].parent_id(), Some(entity.entity_id()));
    assert_eq!(
        children[1].downcast_ref::<State>().unwrap().subtype(),
        Some("cart")
    );
}

#[test]
fn explicit_parent_on_child_wins() {
    let other = EntityId::new();
    let (entity, _) = decode_json(json!({
        "a_type": "SE",
        "child": [{"a_type": "EV", "a_parentid": other.to_string()}],
    }));
    let child = &entity.as_container().unwrap().children()[0];
    assert_eq!(child.parent_id(), Some(other));
}

// ── Unknown types ────────────────────────────────────────────────

#[test]
fn unknown_root_becomes_generic_record_with_one_report() {
    let id = EntityId::new();
    let (entity, errors) = decode_json(json!({
        "a_type": "XX",
        "a_entityid": id.to_string(),
        "a_msg": "hello",
        "custom": "value",
        "list": ["1", "2"],
    }));
    assert_eq!(errors, vec!["unknown type: XX".to_string()]);

    let record = entity.downcast_ref::<GenericRecord>().unwrap();
    assert_eq!(record.kind_name(), "XX");
    assert_eq!(record.entity_id(), id);
    assert_eq!(record.extension("entity_id"), Some(&Value::from(id.to_string())));
    assert_eq!(record.extension("message"), Some(&Value::from("hello")));
    assert_eq!(record.extension("custom"), Some(&Value::from("value")));
    assert_eq!(record.extension("list"), Some(&Value::from(vec!["1", "2"])));
}

#[test]
fn unknown_root_keeps_unparseable_header_fields() {
    let (entity, errors) = decode_json(json!({
        "a_type": "XX",
        "a_entityid": "legacy-id-42",
        "a_timestamp": "2024-01-01",
        "a_parentid": "not-an-id",
        "custom": "v",
    }));
    assert_eq!(errors, vec!["unknown type: XX".to_string()]);

    let record = entity.downcast_ref::<GenericRecord>().unwrap();
    assert_eq!(record.extension("entity_id"), Some(&Value::from("legacy-id-42")));
    assert_eq!(record.extension("timestamp"), Some(&Value::from("2024-01-01")));
    assert_eq!(record.extension("parent_id"), Some(&Value::from("not-an-id")));
    assert_eq!(record.extension("custom"), Some(&Value::from("v")));
    assert_eq!(record.parent_id(), None);
}

#[test]
fn unknown_child_does_not_stop_siblings() {
    let (entity, errors) = decode_json(json!({
        "a_type": "SE",
        "child": [
            {"a_type": "ZZ", "child": [{"a_type": "EV"}]},
            {"a_type": "EV"},
        ],
    }));
    assert_eq!(errors, vec!["unknown type: ZZ".to_string()]);

    let children = entity.as_container().unwrap().children();
    assert_eq!(children.len(), 2);
    assert!(children[0].is::<GenericRecord>());
    assert_eq!(children[0].as_container().unwrap().children().len(), 1);
    assert!(children[1].is::<Event>());
}

#[test]
fn every_unknown_occurrence_is_reported_even_when_cached() {
    let (_, errors) = decode_json(json!({
        "a_type": "SE",
        "child": [{"a_type": "ZZ"}, {"a_type": "ZZ"}],
    }));
    assert_eq!(errors.len(), 2);
}

#[test]
fn missing_type_tag_is_reported() {
    let (entity, errors) = decode_json(json!({"a_msg": "untyped"}));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("a_type"));
    assert!(entity.is::<GenericRecord>());
    assert_eq!(entity.extension("message"), Some(&Value::from("untyped")));
}

// ── Beans ────────────────────────────────────────────────────────

#[test]
fn registered_bean_is_rebuilt() {
    let (entity, errors) = decode_json(json!({
        "a_type": "EV",
        "location": {"a_type": "Point", "x": "3", "y": "-4"},
    }));
    assert!(errors.is_empty());

    let bean = entity.extension("location").and_then(Value::as_bean).unwrap();
    assert_eq!(bean.downcast_ref::<Point>(), Some(&Point { x: 3, y: -4 }));
}

#[test]
fn unknown_nested_object_is_skipped() {
    let (entity, errors) = decode_json(json!({
        "a_type": "EV",
        "a_subtype": "kept",
        "blob": {"a_type": "Nope", "k": "v"},
    }));
    assert_eq!(errors, vec!["unknown type: Nope".to_string()]);
    assert_eq!(entity.extension("blob"), None);
    assert_eq!(
        entity.downcast_ref::<Event>().unwrap().subtype(),
        Some("kept")
    );
}

#[test]
fn unknown_bean_property_is_reported() {
    let (entity, errors) = decode_json(json!({
        "a_type": "EV",
        "location": {"a_type": "Point", "x": "1", "z": "9"},
    }));
    assert_eq!(errors, vec!["missing property \"z\" on Point".to_string()]);
    let bean = entity.extension("location").and_then(Value::as_bean).unwrap();
    assert_eq!(bean.downcast_ref::<Point>(), Some(&Point { x: 1, y: 0 }));
}

// ── Field errors ─────────────────────────────────────────────────

#[test]
fn invalid_value_is_reported_and_decode_continues() {
    let (entity, errors) = decode_json(json!({
        "a_type": "TR",
        "a_execns": "soon",
        "a_resourceid": "queue",
    }));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("invalid value for \"duration\""));
    let tx = entity.downcast_ref::<Transaction>().unwrap();
    assert_eq!(tx.duration_nanos(), None);
    assert_eq!(tx.resource_id(), Some("queue"));
}

#[test]
fn children_on_a_leaf_are_reported() {
    let (entity, errors) = decode_json(json!({
        "a_type": "EV",
        "child": [{"a_type": "ST"}],
    }));
    assert_eq!(errors, vec!["missing property \"child\" on Event".to_string()]);
    assert!(entity.is::<Event>());
}

// ── Malformed input ──────────────────────────────────────────────

#[test]
fn malformed_json_fails_and_reports() {
    let (handler, seen) = recording_handler();
    let mut decoder = JsonDecoder::with_error_handler(registry(), handler);
    let err = decoder.decode(b"{\"a_type\": ").unwrap_err();
    assert!(matches!(err, TelemetryError::Json(_)));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn non_object_root_fails() {
    let (handler, seen) = recording_handler();
    let mut decoder = JsonDecoder::with_error_handler(registry(), handler);
    let err = decoder.decode(b"[1, 2]").unwrap_err();
    assert!(matches!(err, TelemetryError::Codec(_)));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

// ── Streams ──────────────────────────────────────────────────────

#[test]
fn decode_stream_reads_concatenated_payloads() {
    let encoder = JsonEncoder::new(registry());
    let first = Session::new();
    let second = Event::typed("beacon");

    let mut payload = encoder.encode(&first).unwrap();
    payload.push(b'\n');
    payload.extend(encoder.encode(&second).unwrap());
    payload.push(b'\n');

    let mut decoder = JsonDecoder::new(registry());
    let decoded = decoder.decode_stream(&payload);
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].as_ref().unwrap().entity_id(), first.entity_id());
    assert_eq!(decoded[1].as_ref().unwrap().entity_id(), second.entity_id());
}

#[test]
fn decode_stream_skips_non_objects_and_stops_at_syntax_errors() {
    let payload = b"{\"a_type\":\"EV\"} 42 {\"a_type\":\"ST\"} {oops {\"a_type\":\"SE\"}";
    let (handler, seen) = recording_handler();
    let mut decoder = JsonDecoder::with_error_handler(registry(), handler);
    let decoded = decoder.decode_stream(payload);

    assert_eq!(decoded.len(), 4);
    assert!(decoded[0].as_ref().unwrap().is::<Event>());
    assert!(matches!(decoded[1], Err(TelemetryError::Codec(_))));
    assert!(decoded[2].as_ref().unwrap().is::<State>());
    assert!(matches!(decoded[3], Err(TelemetryError::Json(_))));
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn empty_stream_decodes_to_nothing() {
    let mut decoder = JsonDecoder::new(registry());
    assert!(decoder.decode_stream(b"  \n").is_empty());
}

// ── Escaped extension keys ───────────────────────────────────────

#[test]
fn escaped_keys_decode_verbatim_into_extensions() {
    let (entity, errors) = decode_json(json!({
        "a_type": "EV",
        "a_subtype": "real",
        "~subtype": "shadow",
        "~child": "kept?",
        "~a_type": "custom",
        "~~raw": "r",
    }));
    assert!(errors.is_empty(), "{errors:?}");

    let event = entity.downcast_ref::<Event>().unwrap();
    assert_eq!(event.subtype(), Some("real"));
    assert_eq!(event.extension("subtype"), Some(&Value::from("shadow")));
    assert_eq!(event.extension("child"), Some(&Value::from("kept?")));
    assert_eq!(event.extension("a_type"), Some(&Value::from("custom")));
    assert_eq!(event.extension("~raw"), Some(&Value::from("r")));
}

#[test]
fn reserved_extension_keys_survive_a_round_trip() {
    let mut session = Session::new();
    session.set_extension("child", Value::from("note"));
    let mut event = Event::typed("x");
    event.set_extension("child", Value::from("kept?"));
    event.set_extension("a_type", Value::from("custom"));
    session.add_child(Box::new(event));

    let bytes = JsonEncoder::new(registry()).encode(&session).unwrap();
    let (handler, seen) = recording_handler();
    let decoded = JsonDecoder::with_error_handler(registry(), handler)
        .decode(&bytes)
        .unwrap();
    assert!(seen.lock().unwrap().is_empty());

    assert_eq!(decoded.extension("child"), Some(&Value::from("note")));
    let children = decoded.as_container().unwrap().children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].extension("child"), Some(&Value::from("kept?")));
    assert_eq!(children[0].extension("a_type"), Some(&Value::from("custom")));
}
