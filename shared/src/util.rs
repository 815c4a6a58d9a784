use serde::{Deserialize, Deserializer};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Accept `"12"`, `12` or `null` for an optional opaque reference.
///
/// Front-ends send menu/courier references either as numbers or strings.
pub fn de_opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Str(s)) if s.trim().is_empty() => None,
        Some(Raw::Str(s)) => Some(s),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Float(f)) => Some(f.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "de_opt_string_or_number")]
        id: Option<String>,
    }

    #[test]
    fn string_or_number() {
        let h: Holder = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(h.id.as_deref(), Some("42"));
        let h: Holder = serde_json::from_str(r#"{"id": "c-9"}"#).unwrap();
        assert_eq!(h.id.as_deref(), Some("c-9"));
        let h: Holder = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert!(h.id.is_none());
        let h: Holder = serde_json::from_str(r#"{"id": "  "}"#).unwrap();
        assert!(h.id.is_none());
        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert!(h.id.is_none());
    }
}
