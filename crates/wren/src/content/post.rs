use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// The category a post falls under when the index doesn't say.
pub const DEFAULT_POST_TYPE: &str = "tech";

/// A single entry of the post index.
///
/// Every field is optional in the index. Missing, `null` or mistyped values
/// fall back to a default, so a malformed record still renders (as a broken
/// link, an empty title, ...) instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    #[serde(deserialize_with = "lenient_string")]
    pub slug: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    /// A `YYYY-MM-DD` date.
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_optional_string")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "readingTime", deserialize_with = "lenient_number")]
    pub reading_time: Option<Number>,
    /// The post body, relative to the posts directory.
    #[serde(deserialize_with = "lenient_string")]
    pub file: String,
    #[serde(deserialize_with = "lenient_flag")]
    pub pinned: Option<bool>,
    #[serde(rename = "type", deserialize_with = "lenient_optional_string")]
    pub kind: Option<String>,
}

/// Strings, numbers and booleans as text; anything else is absent.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// A list of tags, or a single tag given as a bare value.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => Some(values.into_iter().filter_map(scalar_text).collect()),
        value => scalar_text(value).map(|tag| vec![tag]),
    })
}

/// A number, or a string holding one.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => Some(number),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Truthiness of the value, with `null` meaning unset.
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Bool(flag) => Some(flag),
        Value::Number(number) => Some(number.as_f64().is_some_and(|number| number != 0.0)),
        Value::String(text) => Some(!text.is_empty()),
        Value::Array(_) | Value::Object(_) => Some(true),
    })
}

impl Post {
    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or_default()
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|candidate| candidate == tag)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.unwrap_or(false)
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_POST_TYPE)
    }

    /// The reading time in minutes, or `—` when unknown.
    ///
    /// A reading time of zero counts as unknown.
    pub fn reading_time_label(&self) -> String {
        match self.reading_time.as_ref().and_then(Number::as_f64) {
            Some(minutes) if minutes == 0.0 => "—".to_string(),
            Some(minutes) if minutes.fract() == 0.0 => format!("{minutes:.0}"),
            Some(minutes) => minutes.to_string(),
            None => "—".to_string(),
        }
    }
}
