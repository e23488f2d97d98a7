use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Helper module to deserialize a row number that may come as string or integer.
/// AI agents sometimes send numbers as strings in JSON.
mod string_or_usize {
    use serde::{self, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrInt {
            String(String),
            Int(usize),
        }

        match StringOrInt::deserialize(deserializer)? {
            StringOrInt::String(s) => s.trim().parse::<usize>().map_err(serde::de::Error::custom),
            StringOrInt::Int(i) => Ok(i),
        }
    }
}

// ===== SET REFERENCES =====

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetReferencesRequest {
    /// Document URLs or bare document IDs, one per entry
    pub references: Vec<String>,
    /// Include deleted comments in the next Get Comments run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_deleted: Option<bool>,
    /// Workbook time zone: a name such as America/New_York, UTC, or an offset such as -04:00
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

// ===== GET COMMENTS / RESPOND =====

#[derive(Serialize, Deserialize, JsonSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Abort on the first failing document or row instead of skipping it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

// ===== SET RESPONSE =====

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetResponseRequest {
    /// 1-based data row number, as shown by show_comments
    #[serde(deserialize_with = "string_or_usize::deserialize")]
    pub row: usize,
    /// Reply text to post. Empty clears the row's response.
    pub response: String,
    /// Optional status change: Resolve or Reopen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accepts_string_or_number() {
        let from_int: SetResponseRequest =
            serde_json::from_str(r#"{"row": 3, "response": "ok"}"#).unwrap();
        let from_str: SetResponseRequest =
            serde_json::from_str(r#"{"row": " 3", "response": "ok"}"#).unwrap();

        assert_eq!(from_int.row, 3);
        assert_eq!(from_str.row, 3);
        assert!(from_int.action.is_none());
    }

    #[test]
    fn test_row_rejects_garbage() {
        let result: Result<SetResponseRequest, _> =
            serde_json::from_str(r#"{"row": "third", "response": "ok"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_references_fields_are_camel_case() {
        let request: SetReferencesRequest = serde_json::from_str(
            r#"{"references": ["a"], "includeDeleted": true, "timeZone": "+01:00"}"#,
        )
        .unwrap();

        assert_eq!(request.include_deleted, Some(true));
        assert_eq!(request.time_zone.as_deref(), Some("+01:00"));
    }
}
