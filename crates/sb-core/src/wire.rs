//! Field salvage for condition and effect records that fail to decode.

use serde_json::Value;

/// The string and integer fields that could still be read from a
/// malformed record. Fields of the wrong JSON type are left out.
#[derive(Debug, Default)]
pub(crate) struct Salvaged {
    pub kind: String,
    pub target: Option<String>,
    pub value: Option<i64>,
    pub string_value: Option<String>,
}

pub(crate) fn salvage(raw: &Value) -> Salvaged {
    let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
    Salvaged {
        kind: text("type").unwrap_or_default(),
        target: text("target"),
        value: raw.get("value").and_then(Value::as_i64),
        string_value: text("stringValue"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_well_typed_fields_only() {
        let raw = serde_json::json!({ "type": "gold_gte", "target": 7, "value": "50" });
        let s = salvage(&raw);
        assert_eq!(s.kind, "gold_gte");
        assert_eq!(s.target, None);
        assert_eq!(s.value, None);
    }

    #[test]
    fn non_object_yields_nothing() {
        let s = salvage(&serde_json::json!("flag_set"));
        assert!(s.kind.is_empty());
        assert!(s.target.is_none() && s.string_value.is_none());
    }
}
