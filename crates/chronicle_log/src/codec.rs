//! Paired value encoder/decoder for change payloads.
//!
//! Two shapes get a typed envelope on the wire: a registered
//! property encodes as `{"jsonClass":"Property","cid":<n>}` so the
//! live object is never captured and can be re-linked at replay
//! time, and a 2D vector encodes as
//! `{"jsonClass":"Vector2","x":..,"y":..}`. Everything else crosses
//! structurally. The `jsonClass` key is reserved: structural
//! objects must not use it.

use chronicle_core::{Cid, CoreError, CoreResult, Value, Vector2};

const JSON_CLASS: &str = "jsonClass";

/// Encode a value into the nested JSON text carried by a change
/// entry.
///
/// Returns `None` when the value has no JSON representation - a
/// non-finite number, bare or inside a vector. The recorder then
/// writes a change entry with no `value` field, and replay skips it
/// with a diagnostic.
#[must_use]
pub fn encode_value(value: &Value) -> Option<String> {
    let wire = match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number)?,
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Vector2(v) => {
            if !v.x.is_finite() || !v.y.is_finite() {
                return None;
            }
            serde_json::json!({ "jsonClass": "Vector2", "x": v.x, "y": v.y })
        }
        Value::Ref(cid) => serde_json::json!({ "jsonClass": "Property", "cid": cid.as_u32() }),
        Value::Json(v) => v.clone(),
    };
    Some(serde_json::to_string(&wire).expect("json encoding failed"))
}

/// Decode the nested JSON text of a change entry back into a value.
///
/// The two `jsonClass` envelopes revive into `Ref` and `Vector2`;
/// scalars revive into their scalar variants; arrays and plain
/// objects pass through as `Json`.
///
/// # Errors
///
/// Returns `InvalidEncoding` for malformed JSON, a malformed
/// envelope, or an unknown `jsonClass`.
pub fn decode_value(text: &str) -> CoreResult<Value> {
    let wire: serde_json::Value = serde_json::from_str(text)?;
    revive(wire)
}

fn revive(wire: serde_json::Value) -> CoreResult<Value> {
    match wire {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            let n = n.as_f64().ok_or_else(|| CoreError::InvalidEncoding {
                reason: "number out of f64 range".to_string(),
            })?;
            Ok(Value::Number(n))
        }
        serde_json::Value::String(s) => Ok(Value::Text(s)),
        serde_json::Value::Object(ref obj) if obj.contains_key(JSON_CLASS) => revive_envelope(obj),
        other => Ok(Value::Json(other)),
    }
}

fn revive_envelope(obj: &serde_json::Map<String, serde_json::Value>) -> CoreResult<Value> {
    let class = obj
        .get(JSON_CLASS)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidEncoding {
            reason: "jsonClass is not a string".to_string(),
        })?;
    match class {
        "Property" => {
            let cid = obj
                .get("cid")
                .and_then(serde_json::Value::as_u64)
                .and_then(|raw| u32::try_from(raw).ok())
                .ok_or_else(|| CoreError::InvalidEncoding {
                    reason: "Property envelope has no valid cid".to_string(),
                })?;
            Ok(Value::Ref(Cid::from_raw(cid)))
        }
        "Vector2" => {
            let x = obj.get("x").and_then(serde_json::Value::as_f64);
            let y = obj.get("y").and_then(serde_json::Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Value::Vector2(Vector2::new(x, y))),
                _ => Err(CoreError::InvalidEncoding {
                    reason: "Vector2 envelope has no valid x/y".to_string(),
                }),
            }
        }
        other => Err(CoreError::InvalidEncoding {
            reason: format!("unknown jsonClass {other:?}"),
        }),
    }
}
