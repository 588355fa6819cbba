//! Show records and the JSON shapes the knive backend speaks.

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::pipeline::ShowHint;

/// One configured show (a broadcast channel) as known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub url: String,
    /// Whether an episode is currently being recorded.
    #[serde(default)]
    pub recording: bool,
    /// Outlet kinds configured on the backend; used as a tree-building hint.
    #[serde(default)]
    pub outlets: Vec<String>,
}

impl ShowRecord {
    pub fn hint(&self) -> Option<ShowHint> {
        if self.outlets.is_empty() {
            None
        } else {
            Some(ShowHint {
                outlets: self.outlets.clone(),
            })
        }
    }
}

/// Payload for creating a show through the data proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowDraft {
    pub name: String,
    pub slug: String,
    pub url: String,
}

impl ShowDraft {
    /// Build a draft from an operator-entered name, deriving the slug.
    pub fn from_name(name: &str) -> Result<Self, BackendError> {
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(BackendError::Invalid(format!(
                "show name '{}' has no usable characters",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
            slug,
            url: String::new(),
        })
    }
}

/// Lowercase ASCII alphanumerics; every other run becomes one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if dash && !slug.is_empty() {
                slug.push('-');
            }
            dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            dash = true;
        }
    }
    slug
}

/// One recorded (or running) episode of a show.
///
/// All three keys must be present; `null` times are allowed for episodes
/// that never started or are still running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    #[serde(deserialize_with = "Option::deserialize")]
    pub starttime: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub endtime: Option<f64>,
}

impl Episode {
    pub fn start_local(&self) -> Option<chrono::DateTime<chrono::Local>> {
        self.starttime.and_then(timestamp_local)
    }

    pub fn end_local(&self) -> Option<chrono::DateTime<chrono::Local>> {
        self.endtime.and_then(timestamp_local)
    }
}

fn timestamp_local(secs: f64) -> Option<chrono::DateTime<chrono::Local>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    chrono::DateTime::from_timestamp(whole, nanos).map(|dt| dt.with_timezone(&chrono::Local))
}

/// `GET /channel` and the data-proxy reply both wrap records in `channels`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelList {
    pub channels: Vec<ShowRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeList {
    pub episodes: Vec<Episode>,
}

/// A section of the backend's global configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSection {
    pub section_name: String,
    pub settings: Vec<Setting>,
}

/// One configuration entry. The backend serves validated values typed
/// (ints, bools, lists); they are held as the text the operator edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    #[serde(deserialize_with = "setting_text")]
    pub value: String,
}

fn setting_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    render_setting(&value).map_err(serde::de::Error::custom)
}

fn render_setting(value: &serde_json::Value) -> Result<String, String> {
    use serde_json::Value;
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(items) => items
            .iter()
            .map(render_setting)
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join(", ")),
        Value::Object(_) => Err("setting value is an object".to_string()),
    }
}

/// The section index only names the keys of each section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionIndex {
    pub section_name: String,
    pub settings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Bits und so"), "bits-und-so");
        assert_eq!(slugify("  CRE: Technik!  "), "cre-technik");
        assert_eq!(slugify("Raum 42 -- Saal"), "raum-42-saal");
        assert_eq!(slugify("ÄÖÜ"), "");
    }

    #[test]
    fn test_draft_rejects_unusable_name() {
        assert!(matches!(
            ShowDraft::from_name("  !!  "),
            Err(BackendError::Invalid(_))
        ));
        let draft = ShowDraft::from_name(" Late Night ").unwrap();
        assert_eq!(draft.name, "Late Night");
        assert_eq!(draft.slug, "late-night");
    }

    #[test]
    fn test_typed_setting_values_decode_as_text() {
        let section: ConfigSection = serde_json::from_str(
            r#"{"sectionName": "logging", "settings": [
                {"key": "filesize", "value": 1024},
                {"key": "debug", "value": false},
                {"key": "ratio", "value": 0.5},
                {"key": "qualities", "value": ["low", "high"]},
                {"key": "logfile", "value": null},
                {"key": "path", "value": "/var/log/knive"}
            ]}"#,
        )
        .unwrap();
        let values: Vec<&str> = section.settings.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["1024", "false", "0.5", "low, high", "", "/var/log/knive"]
        );
    }

    #[test]
    fn test_object_setting_value_is_rejected() {
        let parsed: Result<Setting, _> =
            serde_json::from_str(r#"{"key": "nested", "value": {"a": 1}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_record_optional_fields_default() {
        let record: ShowRecord = serde_json::from_str(
            r#"{"id": 3, "name": "Bits und so", "slug": "bus", "url": "http://bitsundso.de"}"#,
        )
        .unwrap();
        assert!(!record.recording);
        assert!(record.hint().is_none());
    }

    #[test]
    fn test_episode_requires_all_keys() {
        let ok: Episode =
            serde_json::from_str(r#"{"name": "bus-300", "starttime": 1338000000.5, "endtime": null}"#)
                .unwrap();
        assert_eq!(ok.starttime, Some(1338000000.5));
        assert!(ok.end_local().is_none());
        assert!(ok.start_local().is_some());

        let missing = serde_json::from_str::<Episode>(r#"{"name": "bus-301", "starttime": 1.0}"#);
        assert!(missing.is_err());
    }
}
