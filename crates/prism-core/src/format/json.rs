//! The JSON structured format.
//!
//! # Payload Encoding
//!
//! | `datacontenttype`    | Payload                        | Written as             |
//! |----------------------|--------------------------------|------------------------|
//! | JSON media type      | one JSON value                 | `data` (raw JSON)      |
//! | absent               | one JSON value, not a string   | `data` (raw JSON)      |
//! | absent or non-JSON   | UTF-8 text                     | `data` (string)        |
//! | 0.3 with `datacontentencoding: base64` | any          | `data` (base64 string) |
//! | anything else        | bytes                          | `data_base64`          |
//!
//! Inlined JSON is copied byte for byte in both directions, so key order,
//! number precision and inner whitespace survive a round trip. Payloads with
//! leading or trailing whitespace are not inlined.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::value::{RawValue, to_raw_value};
use serde_json::Value as Json;

use crate::error::{BindingError, BindingResult};
use crate::event::{Context, Event, Value, ValueKind};
use crate::spec::{AttributeKind, AttributeSpec, SpecVersion};

use super::Format;

const MEDIA_TYPE: &str = "application/cloudevents+json";

/// Top-level members of a JSON event, each kept as undecoded JSON.
type Members = BTreeMap<String, Box<RawValue>>;

/// The JSON event format (`application/cloudevents+json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn media_type(&self) -> &str {
        MEDIA_TYPE
    }

    fn marshal(&self, event: &Event) -> BindingResult<Vec<u8>> {
        let mut members = Members::new();
        for (spec, value) in event.attributes() {
            members.insert(spec.name.to_string(), value_to_raw(value)?);
        }
        for (name, value) in event.extensions() {
            members.insert(name.to_string(), value_to_raw(value)?);
        }
        if let Some(data) = event.data() {
            let (key, value) = encode_data(event.context(), data)?;
            members.insert(key.to_string(), value);
        }
        serde_json::to_vec(&members).map_err(|e| BindingError::encode(MEDIA_TYPE, e))
    }

    fn unmarshal(&self, bytes: &[u8]) -> BindingResult<Event> {
        let decode_err =
            |reason: &dyn std::fmt::Display| BindingError::decode(MEDIA_TYPE, reason, bytes);

        let members: Members = serde_json::from_slice(bytes).map_err(|e| decode_err(&e))?;

        let version: SpecVersion = match members.get("specversion").map(|raw| parse(raw)) {
            Some(Ok(Json::String(v))) => v.parse().map_err(|e| decode_err(&e))?,
            Some(_) => return Err(decode_err(&"'specversion' must be a string")),
            None => return Err(decode_err(&"missing 'specversion'")),
        };
        let spec = version.spec();

        let mut context = Context::new(version);
        let mut data = None;
        let mut data_base64 = None;

        for (key, raw) in members {
            match key.as_str() {
                "specversion" => {}
                "data" => data = Some(raw).filter(|raw| raw.get() != "null"),
                "data_base64" => data_base64 = Some(raw).filter(|raw| raw.get() != "null"),
                name => {
                    let value = parse(&raw).map_err(|e| decode_err(&e))?;
                    if value.is_null() {
                        continue;
                    }
                    if let Some(attribute) = spec.attribute(name) {
                        let value =
                            json_to_attribute(attribute, value).map_err(|e| decode_err(&e))?;
                        context
                            .set(attribute.kind, value)
                            .map_err(|e| decode_err(&e))?;
                    } else {
                        let value = json_to_extension(name, value).map_err(|e| decode_err(&e))?;
                        context
                            .set_extension(name, value)
                            .map_err(|e| decode_err(&e))?;
                    }
                }
            }
        }

        let payload = match (data_base64, data) {
            (Some(_), Some(_)) => {
                return Err(decode_err(&"both 'data' and 'data_base64' are present"));
            }
            (Some(encoded), None) => {
                let encoded = json_string(&encoded)
                    .map_err(|_| decode_err(&"'data_base64' must be a string"))?;
                Some(BASE64.decode(encoded).map_err(|e| decode_err(&e))?)
            }
            (None, Some(data)) => Some(decode_data(&context, &data).map_err(|e| decode_err(&e))?),
            (None, None) => None,
        };

        Ok(Event::from_parts(context, payload))
    }
}

fn parse(raw: &RawValue) -> serde_json::Result<Json> {
    serde_json::from_str(raw.get())
}

fn json_string(raw: &RawValue) -> serde_json::Result<String> {
    serde_json::from_str(raw.get())
}

// ============================================================================
// Attribute helpers
// ============================================================================

fn value_to_raw(value: &Value) -> BindingResult<Box<RawValue>> {
    let json = match value {
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        other => Json::String(other.to_string()),
    };
    to_raw_value(&json).map_err(|e| BindingError::encode(MEDIA_TYPE, e))
}

fn json_to_attribute(spec: &AttributeSpec, value: Json) -> BindingResult<Value> {
    match (spec.value_kind, value) {
        (ValueKind::Boolean, Json::Bool(b)) => Ok(Value::Boolean(b)),
        (ValueKind::Integer, Json::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Integer)
            .ok_or_else(|| BindingError::InvalidValue {
                kind: ValueKind::Integer,
                input: n.to_string(),
                reason: "not a 32-bit integer".to_string(),
            }),
        (kind, Json::String(s)) => Value::parse(kind, &s),
        (kind, other) => Err(BindingError::InvalidValue {
            kind,
            input: other.to_string(),
            reason: format!("'{}' must be a JSON string", spec.name),
        }),
    }
}

fn json_to_extension(name: &str, value: Json) -> BindingResult<Value> {
    match value {
        Json::String(s) => Ok(Value::String(s)),
        Json::Bool(b) => Ok(Value::Boolean(b)),
        Json::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Integer)
            .ok_or_else(|| BindingError::InvalidValue {
                kind: ValueKind::Integer,
                input: n.to_string(),
                reason: format!("extension '{name}' is not a 32-bit integer"),
            }),
        other => Err(BindingError::InvalidValue {
            kind: ValueKind::String,
            input: other.to_string(),
            reason: format!("extension '{name}' must be a scalar"),
        }),
    }
}

// ============================================================================
// Payload helpers
// ============================================================================

/// Classifies a content type: `None` when absent, `Some(true)` for JSON media types.
fn json_content_type(context: &Context) -> Option<bool> {
    context.data_content_type().map(|content_type| {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        media_type == "application/json"
            || media_type == "text/json"
            || media_type.ends_with("+json")
    })
}

fn is_base64_encoded(context: &Context) -> bool {
    context.spec_version() == SpecVersion::V03
        && context
            .get(AttributeKind::DataContentEncoding)
            .and_then(Value::as_str)
            .is_some_and(|encoding| encoding.eq_ignore_ascii_case("base64"))
}

/// Returns the payload as raw JSON when it is exactly one JSON value.
fn raw_json(data: &[u8]) -> Option<Box<RawValue>> {
    let text = std::str::from_utf8(data).ok()?;
    let raw = RawValue::from_string(text.to_string()).ok()?;
    // `from_string` trims surrounding whitespace, which would change the bytes.
    (raw.get().len() == text.len()).then_some(raw)
}

fn encode_data(context: &Context, data: &[u8]) -> BindingResult<(&'static str, Box<RawValue>)> {
    let string = |text: &str| to_raw_value(text).map_err(|e| BindingError::encode(MEDIA_TYPE, e));

    if is_base64_encoded(context) {
        return Ok(("data", string(&BASE64.encode(data))?));
    }

    let content_type = json_content_type(context);
    if content_type != Some(false) {
        if let Some(raw) = raw_json(data) {
            if content_type == Some(true) || !raw.get().starts_with('"') {
                return Ok(("data", raw));
            }
        }
    }
    if content_type != Some(true) {
        if let Ok(text) = std::str::from_utf8(data) {
            return Ok(("data", string(text)?));
        }
    }
    Ok(("data_base64", string(&BASE64.encode(data))?))
}

fn decode_data(context: &Context, raw: &RawValue) -> BindingResult<Vec<u8>> {
    let invalid = |kind, reason: &dyn std::fmt::Display| BindingError::InvalidValue {
        kind,
        input: "data".to_string(),
        reason: reason.to_string(),
    };

    if raw.get().starts_with('"') {
        if is_base64_encoded(context) {
            let encoded = json_string(raw).map_err(|e| invalid(ValueKind::Binary, &e))?;
            return BASE64
                .decode(encoded)
                .map_err(|e| invalid(ValueKind::Binary, &e));
        }
        if json_content_type(context) != Some(true) {
            let text = json_string(raw).map_err(|e| invalid(ValueKind::String, &e))?;
            return Ok(text.into_bytes());
        }
    }
    Ok(raw.get().as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBuilder;
    use chrono::Utc;

    fn base() -> EventBuilder {
        EventBuilder::new(SpecVersion::V10)
            .id("aaa")
            .source("https://example.com/source")
            .ty("com.example.type")
    }

    fn round_trip(event: &Event) -> Event {
        let bytes = JsonFormat.marshal(event).unwrap();
        JsonFormat.unmarshal(&bytes).unwrap()
    }

    #[test]
    fn test_round_trip_attributes_and_extensions() {
        let event = base()
            .subject("sub")
            .time(Utc::now())
            .data_schema("https://example.com/schema")
            .extension("flag", true)
            .extension("count", 7)
            .extension("tenant", "acme")
            .extension("stamp", Utc::now())
            .extension("blob", vec![1u8, 2, 3])
            .extension("home", Value::uri("https://example.com"))
            .build()
            .unwrap();
        assert_eq!(round_trip(&event), event);
        assert_eq!(event.extension("blob"), Some(&Value::from("AQID")));
    }

    #[test]
    fn test_json_payload_is_inlined_verbatim() {
        let payload = r#"{"b":1, "a":[2,3],"n":123456789012345678901234567890}"#;
        let event = base()
            .data("application/json", payload.as_bytes().to_vec())
            .build()
            .unwrap();
        let bytes = JsonFormat.marshal(&event).unwrap();
        let json: Json = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["data"]["b"], 1);
        assert!(String::from_utf8(bytes).unwrap().contains(payload));

        let decoded = round_trip(&event);
        assert_eq!(decoded.data(), Some(payload.as_bytes()));
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_json_payload_edge_cases() {
        // A JSON string under a JSON content type stays raw JSON.
        let quoted = base()
            .data("application/json", br#""hello""#.to_vec())
            .build()
            .unwrap();
        assert_eq!(round_trip(&quoted), quoted);

        // Surrounding whitespace cannot be inlined without changing the bytes.
        let padded = base()
            .data("application/json", b" {\"a\":1}\n".to_vec())
            .build()
            .unwrap();
        let json: Json = serde_json::from_slice(&JsonFormat.marshal(&padded).unwrap()).unwrap();
        assert!(json.get("data_base64").is_some());
        assert_eq!(round_trip(&padded), padded);

        // Not JSON at all despite the content type.
        let broken = base()
            .data("application/json", b"{oops".to_vec())
            .build()
            .unwrap();
        assert_eq!(round_trip(&broken), broken);
    }

    #[test]
    fn test_text_and_binary_payloads() {
        let text = base().data("text/plain", "hello".as_bytes().to_vec()).build().unwrap();
        let json: Json = serde_json::from_slice(&JsonFormat.marshal(&text).unwrap()).unwrap();
        assert_eq!(json["data"], "hello");
        assert_eq!(round_trip(&text), text);

        let binary = base()
            .data("application/octet-stream", vec![0xff, 0x00, 0xfe])
            .build()
            .unwrap();
        let json: Json = serde_json::from_slice(&JsonFormat.marshal(&binary).unwrap()).unwrap();
        assert_eq!(json["data_base64"], "/wD+");
        assert_eq!(round_trip(&binary), binary);
    }

    #[test]
    fn test_payload_without_content_type() {
        let mut event = base().build().unwrap();
        event.set_data(None, r#""quoted""#);
        assert_eq!(round_trip(&event), event);

        event.set_data(None, "[1,2,3]");
        assert_eq!(round_trip(&event), event);

        event.set_data(None, "[1, 2, 3]");
        assert_eq!(round_trip(&event), event);
    }

    #[test]
    fn test_v03_base64_encoding() {
        let event = EventBuilder::new(SpecVersion::V03)
            .id("aaa")
            .source("/source")
            .ty("t")
            .attribute(AttributeKind::DataContentEncoding, "base64")
            .data("application/octet-stream", vec![1, 2, 3])
            .build()
            .unwrap();
        let json: Json = serde_json::from_slice(&JsonFormat.marshal(&event).unwrap()).unwrap();
        assert_eq!(json["data"], "AQID");
        assert_eq!(round_trip(&event), event);
    }

    #[test]
    fn test_malformed_input() {
        let err = JsonFormat.unmarshal(b"{not json").unwrap_err();
        assert!(matches!(
            err,
            BindingError::DecodeError { ref excerpt, .. } if excerpt == "{not json"
        ));

        let err = JsonFormat.unmarshal(br#"{"id":"aaa"}"#).unwrap_err();
        assert!(matches!(
            err,
            BindingError::DecodeError { ref reason, .. } if reason.contains("specversion")
        ));

        let err = JsonFormat
            .unmarshal(br#"{"specversion":"1.0","time":"yesterday"}"#)
            .unwrap_err();
        assert!(matches!(err, BindingError::DecodeError { .. }));
    }
}
