use chrono::{TimeZone, Utc};
use eventbook_core::{from_wire, normalize, to_wire, EventRecord, WirePayload, WireValue};

fn sample_record() -> EventRecord {
    let occurs_at = Utc
        .with_ymd_and_hms(2025, 10, 23, 10, 10, 11)
        .single()
        .expect("valid sample instant");
    EventRecord::with_id("42", "Tech Meetup", "Conference Hall", occurs_at)
}

#[test]
fn encode_decode_roundtrip_preserves_every_field() {
    let record = sample_record();

    let payload = to_wire(&record);
    let decoded = from_wire(Some(&record.id), &payload);

    assert_eq!(decoded, record);
}

#[test]
fn decode_tolerates_alias_field_names() {
    let mut payload = WirePayload::new();
    payload.insert("name".to_string(), WireValue::Text("Tech Meetup".to_string()));
    payload.insert("venue".to_string(), WireValue::Text("Hall A".to_string()));
    payload.insert(
        "dateTime".to_string(),
        WireValue::Text("2025-10-23T10:10:11Z".to_string()),
    );

    let decoded = from_wire(Some("42"), &payload);

    assert_eq!(decoded.id, "42");
    assert_eq!(decoded.title, "Tech Meetup");
    assert_eq!(decoded.location, "Hall A");
    assert_eq!(
        decoded.occurs_at,
        Utc.with_ymd_and_hms(2025, 10, 23, 10, 10, 11).unwrap()
    );
}

#[test]
fn missing_fields_decode_to_empty_text_and_current_instant() {
    let before = Utc::now();
    let decoded = from_wire(Some("7"), &WirePayload::new());
    let after = Utc::now();

    assert_eq!(decoded.id, "7");
    assert!(decoded.title.is_empty());
    assert!(decoded.location.is_empty());
    assert!(decoded.occurs_at >= before && decoded.occurs_at <= after);
}

#[test]
fn human_readable_utc_offset_timestamp_normalizes_to_utc() {
    let value = WireValue::Text("October 23, 2025 at 3:40:11 PM UTC+5:30".to_string());

    let normalized = normalize(&value);

    assert_eq!(
        normalized,
        Utc.with_ymd_and_hms(2025, 10, 23, 10, 10, 11).unwrap()
    );
}

#[test]
fn epoch_magnitude_selects_seconds_or_milliseconds() {
    let as_seconds = normalize(&WireValue::Int(999_999_999_999));
    assert_eq!(as_seconds, Utc.timestamp_opt(999_999_999_999, 0).unwrap());

    let as_millis = normalize(&WireValue::Int(1_000_000_000_000_000));
    assert_eq!(
        as_millis,
        Utc.timestamp_millis_opt(1_000_000_000_000_000).unwrap()
    );
}

#[test]
fn seconds_and_nanos_map_payload_normalizes() {
    let mut payload = WirePayload::new();
    payload.insert("_seconds".to_string(), WireValue::Int(1_700_000_000));
    payload.insert("_nanoseconds".to_string(), WireValue::Int(500_000_000));

    let normalized = normalize(&WireValue::Map(payload));

    assert_eq!(normalized.timestamp_millis(), 1_700_000_000_500);
}

#[test]
fn unrecognized_timestamp_input_falls_back_to_now() {
    let before = Utc::now();
    let normalized = normalize(&WireValue::Text("not a date".to_string()));
    let after = Utc::now();

    assert!(normalized >= before && normalized <= after);
}

#[test]
fn json_bridge_decodes_remote_document_shapes() {
    let document = serde_json::json!({
        "id": "42",
        "title": "Tech Meetup",
        "location": "Hall A",
        "occursAt": {"_seconds": 1_761_214_211, "_nanoseconds": 0}
    });

    let value = WireValue::from_json(&document);
    let map = value.as_map().expect("document should bridge to a map");
    let decoded = from_wire(None, map);

    assert_eq!(decoded.id, "42");
    assert_eq!(decoded.title, "Tech Meetup");
    assert_eq!(decoded.occurs_at.timestamp(), 1_761_214_211);
}
