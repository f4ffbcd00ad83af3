//! Typed field sets extracted from records for the store

use super::{PublicationRecord, ScientistRecord};
use crate::errors::{AppError, Result};
use chrono::NaiveDate;

/// The six core scientist columns, compared as a whole for change detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScientistFields {
    pub first_name: String,
    pub last_name: Option<String>,
    pub academic_title: String,
    pub email: String,
    pub profile_url: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BibliometricsFields {
    pub h_index_wos: Option<i32>,
    pub h_index_scopus: Option<i32>,
    pub publication_count: Option<i32>,
    pub ministerial_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublicationFields {
    pub title: String,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub journal: Option<String>,
    pub ministerial_score: Option<f64>,
}

/// Placeholders the directory renders for "no value".
///
/// They map to NULL, never to 0.
fn is_blank(value: &str) -> bool {
    matches!(value.trim(), "" | "-" | "—" | "–")
}

/// Parse an integer count such as an h-index
pub fn parse_count(field: &str, value: Option<&str>) -> Result<Option<i32>> {
    match value {
        None => Ok(None),
        Some(v) if is_blank(v) => Ok(None),
        Some(v) => v
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|e| AppError::invalid(field, format!("{:?}: {}", v, e))),
    }
}

/// Parse a score; decimal commas are accepted
pub fn parse_score(field: &str, value: Option<&str>) -> Result<Option<f64>> {
    match value {
        None => Ok(None),
        Some(v) if is_blank(v) => Ok(None),
        Some(v) => v
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map(Some)
            .map_err(|e| AppError::invalid(field, format!("{:?}: {}", v, e))),
    }
}

/// Parse a publication date given either as a bare year or an ISO date.
///
/// A bare year maps to January 1st of that year.
pub fn parse_publication_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    let v = match value {
        None => return Ok(None),
        Some(v) if is_blank(v) => return Ok(None),
        Some(v) => v.trim(),
    };

    if v.len() == 4 && v.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = v
            .parse()
            .map_err(|e| AppError::invalid("publication_date", format!("{:?}: {}", v, e)))?;
        return NaiveDate::from_ymd_opt(year, 1, 1)
            .map(Some)
            .ok_or_else(|| AppError::invalid("publication_date", format!("year {} out of range", year)));
    }

    NaiveDate::parse_from_str(v, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| AppError::invalid("publication_date", format!("{:?}: {}", v, e)))
}

fn required(field: &str, value: &Option<String>) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::MissingField {
            field: field.to_string(),
        })
}

impl ScientistRecord {
    pub fn core_fields(&self) -> Result<ScientistFields> {
        Ok(ScientistFields {
            first_name: required("first_name", &self.first_name)?,
            last_name: self.last_name.clone(),
            academic_title: required("academic_title", &self.academic_title)?,
            email: required("email", &self.email)?,
            profile_url: self.profile_url.clone(),
            position: self.position.clone(),
        })
    }

    pub fn bibliometrics(&self) -> Result<BibliometricsFields> {
        Ok(BibliometricsFields {
            h_index_wos: parse_count("h_index_wos", self.h_index_wos.as_deref())?,
            h_index_scopus: parse_count("h_index_scopus", self.h_index_scopus.as_deref())?,
            publication_count: parse_count("publication_count", self.publication_count.as_deref())?,
            ministerial_score: parse_score("ministerial_score", self.ministerial_score.as_deref())?,
        })
    }
}

impl PublicationRecord {
    pub fn fields(&self) -> Result<PublicationFields> {
        Ok(PublicationFields {
            title: self.title.clone(),
            publisher: self.publisher.clone(),
            publication_date: parse_publication_date(self.publication_date.as_deref())?,
            journal: self.journal.clone(),
            ministerial_score: parse_score("ministerial_score", self.ministerial_score.as_deref())?,
        })
    }
}
