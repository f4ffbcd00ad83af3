//! Cleaning and validation applied before records reach any sink

use super::{PublicationRecord, Record, ScientistRecord};
use crate::errors::{AppError, Result};
use once_cell::sync::Lazy;
use regex_lite::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Trim and collapse every run of whitespace into a single space
pub fn normalize_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

fn clean_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        *v = normalize_whitespace(v);
    }
}

impl ScientistRecord {
    fn clean(&mut self) {
        for field in [
            &mut self.first_name,
            &mut self.last_name,
            &mut self.academic_title,
            &mut self.email,
            &mut self.profile_url,
            &mut self.position,
            &mut self.h_index_wos,
            &mut self.h_index_scopus,
            &mut self.publication_count,
            &mut self.ministerial_score,
        ] {
            clean_opt(field);
        }
        for area in self.research_area.iter_mut() {
            *area = normalize_whitespace(area);
        }
        self.research_area.retain(|area| !area.is_empty());
    }
}

impl PublicationRecord {
    fn clean(&mut self) {
        self.title = normalize_whitespace(&self.title);
        for field in [
            &mut self.publisher,
            &mut self.publication_date,
            &mut self.journal,
            &mut self.ministerial_score,
        ] {
            clean_opt(field);
        }
        for author in self.authors.iter_mut() {
            *author = author.trim().to_string();
        }
        self.authors.retain(|author| !author.is_empty());
    }
}

fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::MissingField {
            field: field.to_string(),
        }),
    }
}

impl Record {
    /// Normalize whitespace in scientist and publication text fields.
    ///
    /// Organization names are stored as scraped.
    pub fn clean(&mut self) {
        match self {
            Record::Scientist(s) => s.clean(),
            Record::Publication(p) => p.clean(),
            Record::Organization(_) | Record::ScientistLink(_) => {}
        }
    }

    /// Check the fields without which a record cannot be stored
    pub fn validate(&self) -> Result<()> {
        match self {
            Record::Scientist(s) => {
                require("email", s.email.as_deref())?;
                require("first_name", s.first_name.as_deref())?;
                require("academic_title", s.academic_title.as_deref())?;
            }
            Record::Publication(p) => {
                require("title", Some(p.title.as_str()))?;
            }
            Record::Organization(o) => {
                require("university", Some(o.university.as_str()))?;
                require("institute", Some(o.institute.as_str()))?;
            }
            Record::ScientistLink(l) => {
                require("profile_url", Some(l.profile_url.as_str()))?;
            }
        }
        Ok(())
    }
}
