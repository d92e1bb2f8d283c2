// ── Trusted command schemas ──
//
// Each command declares the exact shape its payload must have before the
// handler runs: which fields exist, their types, and for strings the
// allow-listed pattern. Schemas are static data; an invalid pattern is a
// programming error and panics at first use (startup invariant, not a
// runtime condition).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::CoreError;

/// Characters permitted in a remote object path argument: path
/// separators plus the identifier alphabet the remote service uses.
static REMOTE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.\\/-]+$").expect("remote-path pattern must compile")
});

/// Expected type of a declared payload field.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FieldKind {
    /// A string naming a remote object, matched against the path
    /// allow-list.
    RemotePath,
}

/// One declared payload field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// The declared payload shape of a command. An empty field list means
/// the command takes no payload and any supplied data is ignored.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrustedSchema {
    pub fields: &'static [Field],
}

pub(crate) const NO_DATA: TrustedSchema = TrustedSchema { fields: &[] };

/// Validate a payload against a schema.
///
/// Field presence, value type, and string pattern are all checked before
/// any handler runs; unknown fields are rejected.
pub(crate) fn validate(schema: &TrustedSchema, data: Option<&Value>) -> Result<(), CoreError> {
    if schema.fields.is_empty() {
        return Ok(());
    }

    let Some(Value::Object(map)) = data else {
        return Err(invalid("command data must be an object"));
    };

    for field in schema.fields {
        let value = map
            .get(field.name)
            .ok_or_else(|| invalid(format!("missing field \"{}\"", field.name)))?;
        match field.kind {
            FieldKind::RemotePath => {
                let s = value
                    .as_str()
                    .ok_or_else(|| invalid(format!("field \"{}\" must be a string", field.name)))?;
                if !REMOTE_PATH.is_match(s) {
                    return Err(invalid(format!(
                        "field \"{}\" contains characters outside the allowed set",
                        field.name
                    )));
                }
            }
        }
    }

    if let Some(extra) = map.keys().find(|k| {
        !schema.fields.iter().any(|f| f.name == k.as_str())
    }) {
        return Err(invalid(format!("unexpected field \"{extra}\"")));
    }

    Ok(())
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidArgument {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CONNECT: TrustedSchema = TrustedSchema {
        fields: &[Field {
            name: "service",
            kind: FieldKind::RemotePath,
        }],
    };

    #[test]
    fn empty_schema_ignores_any_data() {
        assert!(validate(&NO_DATA, None).is_ok());
        assert!(validate(&NO_DATA, Some(&json!({"whatever": 1}))).is_ok());
    }

    #[test]
    fn accepts_allow_listed_paths() {
        let data = json!({"service": "/net/connman/service/wifi_0"});
        assert!(validate(&CONNECT, Some(&data)).is_ok());
    }

    #[test]
    fn rejects_pattern_violations() {
        let data = json!({"service": "not/matching/pattern!!"});
        assert!(matches!(
            validate(&CONNECT, Some(&data)),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn rejects_missing_and_mistyped_fields() {
        assert!(validate(&CONNECT, None).is_err());
        assert!(validate(&CONNECT, Some(&json!({}))).is_err());
        assert!(validate(&CONNECT, Some(&json!({"service": 42}))).is_err());
        assert!(validate(&CONNECT, Some(&json!("bare string"))).is_err());
    }

    #[test]
    fn rejects_unexpected_fields() {
        let data = json!({"service": "/s/a", "extra": "x"});
        assert!(validate(&CONNECT, Some(&data)).is_err());
    }
}
