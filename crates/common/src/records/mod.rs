//! Crawled records
//!
//! Flat records as produced by the staff directory crawler. Each record is a
//! mapping of named fields to optional strings or lists; the shape decides
//! the kind:
//! - `university` present: an organization branch
//! - `title` present: a publication
//! - `first_name` present: a scientist's personal data
//! - only `profile_url`: a profile link found on a listing page

mod clean;
mod fields;

pub use clean::normalize_whitespace;
pub use fields::{
    parse_count, parse_publication_date, parse_score, BibliometricsFields, PublicationFields,
    ScientistFields,
};

use crate::errors::{AppError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Personal data scraped from a scientist's profile page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScientistRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub academic_title: Option<String>,
    pub email: Option<String>,
    pub profile_url: Option<String>,
    pub position: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub h_index_wos: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub h_index_scopus: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub publication_count: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub ministerial_score: Option<String>,

    /// Affiliation type -> organization name
    #[serde(default, deserialize_with = "null_as_default")]
    pub organizations: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub research_area: Vec<String>,
}

/// A publication with the profile-URL fragments of its authors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub title: String,
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub publication_date: Option<String>,
    pub journal: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub ministerial_score: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
}

/// One institute of the university with its cathedras
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub university: String,
    pub institute: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cathedras: Vec<String>,
}

/// A profile link discovered on a people listing page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScientistLinkRecord {
    pub profile_url: String,
}

/// Any record coming out of the crawler
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Organization(OrganizationRecord),
    Scientist(ScientistRecord),
    ScientistLink(ScientistLinkRecord),
    Publication(PublicationRecord),
}

/// Record kind, ordered by ingestion dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    Organization,
    Scientist,
    ScientistLink,
    Publication,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Organization => "organization",
            RecordKind::Scientist => "scientist",
            RecordKind::ScientistLink => "scientist_link",
            RecordKind::Publication => "publication",
        }
    }
}

impl Record {
    /// Decode a record from its JSON object, dispatching on which fields are present
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| AppError::UnknownRecord {
            message: format!("expected a JSON object, got {}", json_type(&value)),
        })?;

        let record = if object.contains_key("university") {
            Record::Organization(serde_json::from_value(value)?)
        } else if object.contains_key("title") {
            Record::Publication(serde_json::from_value(value)?)
        } else if object.contains_key("first_name") {
            Record::Scientist(serde_json::from_value(value)?)
        } else if object.contains_key("profile_url") {
            Record::ScientistLink(serde_json::from_value(value)?)
        } else {
            let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
            keys.sort_unstable();
            return Err(AppError::UnknownRecord {
                message: format!("fields [{}]", keys.join(", ")),
            });
        };

        Ok(record)
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Organization(_) => RecordKind::Organization,
            Record::Scientist(_) => RecordKind::Scientist,
            Record::ScientistLink(_) => RecordKind::ScientistLink,
            Record::Publication(_) => RecordKind::Publication,
        }
    }

    /// Short human-readable identification for log lines
    pub fn label(&self) -> String {
        match self {
            Record::Organization(o) => format!("{} / {}", o.university, o.institute),
            Record::Scientist(s) => s
                .email
                .clone()
                .or_else(|| s.profile_url.clone())
                .unwrap_or_else(|| "<no email>".to_string()),
            Record::ScientistLink(l) => l.profile_url.clone(),
            Record::Publication(p) => p.title.clone(),
        }
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Scraped scalars arrive as strings, bare numbers or null; keep them as text
fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            json_type(&other)
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_dispatch_on_fields() {
        let org = Record::from_value(json!({
            "university": "Tech U", "institute": "CS Dept", "cathedras": ["AI Lab"]
        }))
        .unwrap();
        assert_eq!(org.kind(), RecordKind::Organization);

        let link = Record::from_value(json!({"profile_url": "/info/author/jdoe"})).unwrap();
        assert_eq!(link.kind(), RecordKind::ScientistLink);

        let scientist = Record::from_value(json!({
            "first_name": "Jane", "email": "jdoe@x.com", "profile_url": "/info/author/jdoe"
        }))
        .unwrap();
        assert_eq!(scientist.kind(), RecordKind::Scientist);

        let publication = Record::from_value(json!({"title": "On Graphs", "authors": null})).unwrap();
        assert_eq!(publication.kind(), RecordKind::Publication);
    }

    #[test]
    fn test_scientist_scalars_and_nulls() {
        let record = Record::from_value(json!({
            "first_name": "Jane",
            "h_index_wos": 7,
            "ministerial_score": "12,5",
            "organizations": null,
            "research_area": null
        }))
        .unwrap();

        let Record::Scientist(s) = record else {
            panic!("expected scientist");
        };
        assert_eq!(s.h_index_wos.as_deref(), Some("7"));
        assert_eq!(s.ministerial_score.as_deref(), Some("12,5"));
        assert!(s.organizations.is_empty());
        assert!(s.research_area.is_empty());
    }

    #[test]
    fn test_unknown_shape() {
        let err = Record::from_value(json!({"foo": 1})).unwrap_err();
        assert!(matches!(err, AppError::UnknownRecord { .. }));

        let err = Record::from_value(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_serialize_is_flat() {
        let record = Record::ScientistLink(ScientistLinkRecord {
            profile_url: "/info/author/jdoe".into(),
        });
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"profile_url": "/info/author/jdoe"})
        );
    }

    #[test]
    fn test_kind_order_follows_dependencies() {
        assert!(RecordKind::Organization < RecordKind::Scientist);
        assert!(RecordKind::Scientist < RecordKind::Publication);
    }
}
