//! Core types for the Nusach engine

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::config::LIST_SEPARATOR;

/// A value supplied by the form layer for template substitution.
///
/// Only three kinds exist: free text, checkbox state, and ordered lists of
/// text (repeating form rows such as heirs or assets). Numbers coming from
/// JSON or YAML are stored as their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text value
    String(String),
    /// Boolean value
    Bool(bool),
    /// Ordered list of text values
    List(Vec<String>),
}

impl Value {
    /// Try to get value as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get value as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get value as list reference
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Template truthiness: non-empty string, `true`, non-empty list.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Text used when the value is substituted into a template.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => items.join(LIST_SEPARATOR),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::String(String::new())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(String::from).collect())
    }
}

/// Scalar list element; numbers and booleans become their textual form.
struct ScalarText(Option<String>);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = ScalarText;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<ScalarText, E> {
                Ok(ScalarText(Some(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ScalarText, E> {
                Ok(ScalarText(Some(v.to_string())))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ScalarText, E> {
                Ok(ScalarText(Some(v.to_string())))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ScalarText, E> {
                Ok(ScalarText(Some(v.to_string())))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ScalarText, E> {
                Ok(ScalarText(Some(v.to_string())))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<ScalarText, E> {
                Ok(ScalarText(Some(v)))
            }

            fn visit_unit<E: de::Error>(self) -> Result<ScalarText, E> {
                Ok(ScalarText(None))
            }

            fn visit_none<E: de::Error>(self) -> Result<ScalarText, E> {
                Ok(ScalarText(None))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, boolean, number or list of scalars")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
                Ok(Value::String(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
                Ok(Value::String(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
                Ok(Value::String(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
                Ok(Value::String(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
                Ok(Value::String(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(ScalarText(item)) = seq.next_element()? {
                    // Empty rows in a repeating form section are dropped
                    if let Some(item) = item {
                        items.push(item);
                    }
                }
                Ok(Value::List(items))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// The grammatical gender/number a text must agree with.
///
/// Unrecognized names normalize to [`GenderProfile::Male`], the unmarked form
/// in which Hebrew legal templates are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenderProfile {
    /// Masculine singular (the unmarked template form)
    #[default]
    Male,
    /// Feminine singular
    Female,
    /// Plural
    Plural,
    /// A legal entity (company, association)
    Organization,
}

impl GenderProfile {
    /// All profiles, in form order.
    pub const ALL: [GenderProfile; 4] = [
        GenderProfile::Male,
        GenderProfile::Female,
        GenderProfile::Plural,
        GenderProfile::Organization,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderProfile::Male => "male",
            GenderProfile::Female => "female",
            GenderProfile::Plural => "plural",
            GenderProfile::Organization => "organization",
        }
    }

    /// Parse a profile name, returning `None` when it is not recognized.
    ///
    /// Accepts canonical names, short forms and the Hebrew terms used in
    /// form labels.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "male" | "m" | "masculine" | "זכר" => Some(GenderProfile::Male),
            "female" | "f" | "feminine" | "נקבה" => Some(GenderProfile::Female),
            "plural" | "p" | "רבים" => Some(GenderProfile::Plural),
            "organization" | "organisation" | "org" | "company" | "corporation" | "תאגיד"
            | "חברה" => Some(GenderProfile::Organization),
            _ => None,
        }
    }

    /// Parse a profile name, falling back to [`GenderProfile::Male`].
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!(profile = %name, "Unrecognized gender profile, using male forms");
            GenderProfile::Male
        })
    }
}

impl fmt::Display for GenderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GenderProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GenderProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(GenderProfile::from_name(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_truthiness() {
        assert!(Value::from("כן").is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::from(vec!["a"]).is_truthy());
        assert!(!Value::List(Vec::new()).is_truthy());
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(Value::from("דנה").to_text(), "דנה");
        assert_eq!(Value::Bool(true).to_text(), "true");
        assert_eq!(Value::from(vec!["א", "ב"]).to_text(), "א, ב");
    }

    #[test]
    fn test_value_from_json_scalars() {
        let v: Value = serde_json::from_str("42").unwrap();
        assert_eq!(v, Value::from("42"));

        let v: Value = serde_json::from_str("true").unwrap();
        assert_eq!(v, Value::Bool(true));

        let v: Value = serde_json::from_str(r#"["a", 2, null, false]"#).unwrap();
        assert_eq!(v, Value::from(vec!["a", "2", "false"]));
    }

    #[test]
    fn test_value_rejects_objects() {
        let result: std::result::Result<Value, _> = serde_json::from_str(r#"{"a": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(GenderProfile::parse("female"), Some(GenderProfile::Female));
        assert_eq!(GenderProfile::parse(" Plural "), Some(GenderProfile::Plural));
        assert_eq!(GenderProfile::parse("נקבה"), Some(GenderProfile::Female));
        assert_eq!(GenderProfile::parse("org"), Some(GenderProfile::Organization));
        assert_eq!(GenderProfile::parse("neutral"), None);
    }

    #[test]
    fn test_profile_unknown_falls_back_to_male() {
        assert_eq!(GenderProfile::from_name("alien"), GenderProfile::Male);
        let p: GenderProfile = serde_json::from_str(r#""unknown""#).unwrap();
        assert_eq!(p, GenderProfile::Male);
    }

    #[test]
    fn test_profile_serializes_lowercase() {
        let json = serde_json::to_string(&GenderProfile::Organization).unwrap();
        assert_eq!(json, r#""organization""#);
    }
}
