// api/requests.rs - typed request bodies and their input rules
//
// Every body is deserialized leniently (missing strings become empty) so that
// absent and blank fields report the same rule message.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::error::FieldError;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Please enter a password with 6 or more characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,

    #[validate(required(message = "Password is required"))]
    pub password: Option<String>,
}

/// Body for creating a post or a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TextRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
}

/// Sparse profile fields; only present, non-empty fields take part in an upsert.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileRequest {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,

    pub githubusername: Option<String>,

    /// Comma-delimited skill list.
    #[serde(default)]
    #[validate(length(min = 1, message = "Skills is required"))]
    pub skills: String,

    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExperienceRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,

    pub location: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "From date is required"))]
    pub from: String,

    pub to: Option<String>,

    #[serde(default)]
    pub current: bool,

    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EducationRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "School is required"))]
    pub school: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Degree is required"))]
    pub degree: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Field of study is required"))]
    pub fieldofstudy: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "From date is required"))]
    pub from: String,

    pub to: Option<String>,

    #[serde(default)]
    pub current: bool,

    pub description: Option<String>,
}

/// Strip surrounding whitespace before the length rules run.
fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Validated, parsed date range of an experience or education entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

impl ExperienceRequest {
    pub fn date_range(&self) -> Result<DateRange, Vec<FieldError>> {
        parse_range(&self.from, self.to.as_deref())
    }
}

impl EducationRequest {
    pub fn date_range(&self) -> Result<DateRange, Vec<FieldError>> {
        parse_range(&self.from, self.to.as_deref())
    }
}

fn parse_range(from: &str, to: Option<&str>) -> Result<DateRange, Vec<FieldError>> {
    let mut errors = Vec::new();

    let from = parse_date(from);
    if from.is_none() {
        errors.push(FieldError::new("from", "From date is invalid"));
    }

    let to = match to.map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                errors.push(FieldError::new("to", "To date is invalid"));
            }
            parsed
        }
    };

    match from {
        Some(from) if errors.is_empty() => Ok(DateRange { from, to }),
        _ => Err(errors),
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Flatten validator output into the `errors` list, ordered by field name.
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| {
                let msg = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                FieldError::new(field.clone(), msg)
            })
        })
        .collect();
    fields.sort_by(|a, b| a.param.cmp(&b.param));
    fields
}
