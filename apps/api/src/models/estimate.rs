use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One item identified in the source document by the extraction stage.
///
/// Wire keys follow the output contract in the extraction prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    #[serde(rename = "product")]
    pub name: String,
    /// Free-text, comma-joined description.
    #[serde(rename = "features")]
    pub attributes: String,
}

/// Estimated effort. Numeric when the model follows instructions,
/// free text otherwise ("8-12", "TBD").
#[derive(Debug, Clone, PartialEq)]
pub enum Hours {
    Numeric(f64),
    Text(String),
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hours::Numeric(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                write!(f, "{}", *n as i64)
            }
            Hours::Numeric(n) => write!(f, "{n}"),
            Hours::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Hours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Hours::Numeric(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            Hours::Numeric(n) => serializer.serialize_f64(*n),
            Hours::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Hours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => match n.as_f64() {
                Some(f) => Hours::Numeric(f),
                None => Hours::Text(n.to_string()),
            },
            Value::String(s) => Hours::Text(s),
            other => Hours::Text(other.to_string()),
        })
    }
}

/// Terminal output unit of a pipeline run: one sized, estimated item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedRecord {
    #[serde(rename = "product")]
    pub item: String,
    #[serde(rename = "features")]
    pub attributes: String,
    /// Conventionally X-Small, Small, Medium, Large or X-Large; not enforced.
    pub size: String,
    #[serde(default)]
    pub hours: Option<Hours>,
}

impl EstimatedRecord {
    /// Hours as persisted by callers: the value rendered as text, empty when absent.
    #[allow(dead_code)]
    pub fn hours_text(&self) -> String {
        self.hours.as_ref().map(Hours::to_string).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_item_uses_prompt_keys() {
        let item: ExtractedItem =
            serde_json::from_str(r#"{"product":"Login","features":"OAuth login, password reset"}"#)
                .unwrap();
        assert_eq!(item.name, "Login");
        assert_eq!(item.attributes, "OAuth login, password reset");
    }

    #[test]
    fn test_extracted_item_missing_field_is_rejected() {
        let result = serde_json::from_str::<ExtractedItem>(r#"{"product":"Login"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_numeric_hours() {
        let record: EstimatedRecord = serde_json::from_str(
            r#"{"product":"Login","features":"OAuth","size":"Medium","hours":12}"#,
        )
        .unwrap();
        assert_eq!(record.hours, Some(Hours::Numeric(12.0)));
        assert_eq!(record.hours_text(), "12");
    }

    #[test]
    fn test_fractional_hours_render_as_decimal() {
        let record: EstimatedRecord = serde_json::from_str(
            r#"{"product":"A","features":"B","size":"Small","hours":6.5}"#,
        )
        .unwrap();
        assert_eq!(record.hours_text(), "6.5");
    }

    #[test]
    fn test_non_numeric_hours_are_tolerated() {
        let record: EstimatedRecord = serde_json::from_str(
            r#"{"product":"A","features":"B","size":"Large","hours":"20-30"}"#,
        )
        .unwrap();
        assert_eq!(record.hours, Some(Hours::Text("20-30".to_string())));
        assert_eq!(record.hours_text(), "20-30");
    }

    #[test]
    fn test_absent_or_null_hours_are_tolerated() {
        let absent: EstimatedRecord =
            serde_json::from_str(r#"{"product":"A","features":"B","size":"Small"}"#).unwrap();
        let null: EstimatedRecord = serde_json::from_str(
            r#"{"product":"A","features":"B","size":"Small","hours":null}"#,
        )
        .unwrap();
        assert_eq!(absent.hours, None);
        assert_eq!(null.hours, None);
        assert_eq!(absent.hours_text(), "");
    }

    #[test]
    fn test_record_missing_size_is_rejected() {
        let result =
            serde_json::from_str::<EstimatedRecord>(r#"{"product":"A","features":"B","hours":4}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_integral_hours_serialize_as_integer() {
        let record = EstimatedRecord {
            item: "Login".to_string(),
            attributes: "OAuth".to_string(),
            size: "Medium".to_string(),
            hours: Some(Hours::Numeric(12.0)),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["hours"], serde_json::json!(12));
        assert_eq!(json["product"], "Login");
    }
}
