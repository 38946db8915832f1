//! Candidate-record validation for books.
//!
//! [`validate`] is the only way to obtain a [`NewBook`] from request input.
//! Fields are checked in a fixed order (title, author, publishedDate, pages,
//! genre, then undeclared keys) and the first violation is reported.

use serde_json::{Map, Value};
use thiserror::Error;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    UtcOffset,
};

use super::models::NewBook;

const MIN_TEXT_LEN: usize = 3;
const MAX_TEXT_LEN: usize = 255;
const MIN_PAGES: i64 = 1;
/// Largest integer a JSON client can represent exactly.
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;
/// Years an RFC 3339 timestamp can carry.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

const FIELDS: [&str; 5] = ["title", "author", "publishedDate", "pages", "genre"];

/// First constraint a candidate record violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("\"value\" must be of type object")]
    NotAnObject,

    #[error("\"{field}\" is required")]
    Required { field: &'static str },

    #[error("\"{field}\" must be a string")]
    NotAString { field: &'static str },

    #[error("\"{field}\" is not allowed to be empty")]
    Empty { field: &'static str },

    #[error("\"{field}\" length must be at least {min} characters long")]
    TooShort { field: &'static str, min: usize },

    #[error("\"{field}\" length must be less than or equal to {max} characters long")]
    TooLong { field: &'static str, max: usize },

    #[error("\"{field}\" must be a valid date")]
    InvalidDate { field: &'static str },

    #[error("\"{field}\" must be a number")]
    NotANumber { field: &'static str },

    #[error("\"{field}\" must be an integer")]
    NotAnInteger { field: &'static str },

    #[error("\"{field}\" must be a safe number")]
    Unsafe { field: &'static str },

    #[error("\"{field}\" must be greater than or equal to {min}")]
    BelowMinimum { field: &'static str, min: i64 },

    #[error("\"{field}\" is not allowed")]
    UnknownField { field: String },
}

/// Validate a candidate record and coerce it to typed book fields.
pub fn validate(candidate: &Value) -> Result<NewBook, ValidationError> {
    let fields = candidate.as_object().ok_or(ValidationError::NotAnObject)?;

    let title = text(fields, "title")?;
    let author = text(fields, "author")?;
    let published_date = date(fields, "publishedDate")?;
    let pages = pages(fields, "pages")?;
    let genre = text(fields, "genre")?;

    if let Some(unknown) = fields.keys().find(|key| !FIELDS.contains(&key.as_str())) {
        return Err(ValidationError::UnknownField {
            field: unknown.clone(),
        });
    }

    Ok(NewBook {
        title,
        author,
        published_date,
        pages,
        genre,
    })
}

fn required<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    fields.get(field).ok_or(ValidationError::Required { field })
}

fn text(fields: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    let value = required(fields, field)?
        .as_str()
        .ok_or(ValidationError::NotAString { field })?;

    // Lengths are counted in UTF-16 code units, as JSON clients count them.
    let len = value.encode_utf16().count();
    if len == 0 {
        Err(ValidationError::Empty { field })
    } else if len < MIN_TEXT_LEN {
        Err(ValidationError::TooShort {
            field,
            min: MIN_TEXT_LEN,
        })
    } else if len > MAX_TEXT_LEN {
        Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LEN,
        })
    } else {
        Ok(value.to_string())
    }
}

fn pages(fields: &Map<String, Value>, field: &'static str) -> Result<i64, ValidationError> {
    let number = match required(fields, field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
    .ok_or(ValidationError::NotANumber { field })?;

    if number.fract() != 0.0 {
        return Err(ValidationError::NotAnInteger { field });
    }
    if number.abs() > MAX_SAFE_INTEGER as f64 {
        return Err(ValidationError::Unsafe { field });
    }

    let pages = number as i64;
    if pages < MIN_PAGES {
        return Err(ValidationError::BelowMinimum {
            field,
            min: MIN_PAGES,
        });
    }
    Ok(pages)
}

fn date(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<OffsetDateTime, ValidationError> {
    match required(fields, field)? {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite() && f.abs() <= MAX_SAFE_INTEGER as f64)
            .and_then(|millis| from_unix_millis(millis.trunc() as i64)),
        _ => None,
    }
    .ok_or(ValidationError::InvalidDate { field })
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC).
///
/// The result is in UTC and truncated to whole milliseconds so it survives a
/// round trip through the database unchanged.
pub fn parse_date(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    let parsed = OffsetDateTime::parse(value, &Rfc3339).ok().or_else(|| {
        Date::parse(value, format_description!("[year]-[month]-[day]"))
            .ok()
            .map(|date| date.midnight().assume_utc())
    })?;

    from_unix_millis(unix_millis(parsed))
}

/// Milliseconds since the Unix epoch.
pub fn unix_millis(value: OffsetDateTime) -> i64 {
    (value.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Inverse of [`unix_millis`].
///
/// `None` unless the UTC instant falls in years 0000 through 9999, the range
/// a book's `publishedDate` is rendered in.
pub fn from_unix_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .map(|value| value.to_offset(UtcOffset::UTC))
        .filter(|value| YEARS.contains(&value.year()))
}
