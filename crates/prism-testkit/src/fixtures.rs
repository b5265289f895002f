use chrono::DateTime;
use prism_core::{Event, EventBuilder, SpecVersion, Value};

/// A 1.0 event carrying only the required attributes.
///
/// `id` is `"aaa"`, which the scenario tests rely on.
pub fn min_event() -> Event {
    min_event_with_version(SpecVersion::V10)
}

/// A minimal event of the given version.
pub fn min_event_with_version(version: SpecVersion) -> Event {
    EventBuilder::new(version)
        .id("aaa")
        .source("https://example.com/source")
        .ty("com.example.type")
        .build()
        .expect("minimal fixture event is valid")
}

/// A 1.0 event with every optional attribute, two extensions and a JSON payload.
pub fn full_event() -> Event {
    let time = DateTime::from_timestamp(1_577_836_800, 0).expect("fixture timestamp is in range");
    EventBuilder::new(SpecVersion::V10)
        .id("aaa")
        .source("https://example.com/source")
        .ty("com.example.type")
        .subject("topic")
        .time(time)
        .data_schema("https://example.com/schema.json")
        .extension("exta", "value")
        .extension("extb", 42)
        .data("application/json", br#"{"hello":"world"}"#.to_vec())
        .build()
        .expect("full fixture event is valid")
}

/// A 1.0 event whose JSON payload has unsorted keys, inner whitespace and a
/// number too large for `f64`.
pub fn raw_json_event() -> Event {
    EventBuilder::new(SpecVersion::V10)
        .id("aaa")
        .source("https://example.com/source")
        .ty("com.example.type")
        .data(
            "application/json",
            br#"{"b":1, "a":[true,null],"n":123456789012345678901234567890}"#.to_vec(),
        )
        .build()
        .expect("raw JSON fixture event is valid")
}

/// A 1.0 event with a non-UTF-8 binary payload.
pub fn binary_payload_event() -> Event {
    EventBuilder::new(SpecVersion::V10)
        .id("aaa")
        .source("https://example.com/source")
        .ty("com.example.type")
        .data("application/octet-stream", vec![0xff, 0x00, 0xfe, 0x80])
        .build()
        .expect("binary fixture event is valid")
}

/// A 1.0 event carrying one extension of every value kind.
pub fn extension_kinds_event() -> Event {
    let time =
        DateTime::from_timestamp(1_577_836_800, 123_456_789)
            .expect("fixture timestamp is in range");
    EventBuilder::new(SpecVersion::V10)
        .id("aaa")
        .source("https://example.com/source")
        .ty("com.example.type")
        .extension("flag", true)
        .extension("count", -7)
        .extension("text", "plain")
        .extension("blob", vec![1u8, 2, 3])
        .extension("home", Value::uri("https://example.com"))
        .extension("rel", Value::uri_ref("../up"))
        .extension("stamp", time)
        .build()
        .expect("extension fixture event is valid")
}

/// Every fixture event, for tests that must hold for all of them.
pub fn all_events() -> Vec<Event> {
    vec![
        min_event(),
        min_event_with_version(SpecVersion::V03),
        full_event(),
        raw_json_event(),
        binary_payload_event(),
        extension_kinds_event(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_valid() {
        assert!(min_event().validate().is_ok());
        assert!(full_event().validate().is_ok());
        assert_eq!(min_event().id(), Some("aaa"));
        assert_eq!(
            min_event_with_version(SpecVersion::V03).spec_version(),
            SpecVersion::V03
        );
        assert_eq!(full_event().extensions().count(), 2);
        assert_eq!(extension_kinds_event().extensions().count(), 7);
        assert!(all_events().iter().all(|e| e.validate().is_ok()));
    }
}
