use crate::errors::{DbError, DomainError, DomainResult};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Optional text with surrounding whitespace removed; blank input becomes `None`.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn opt_date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(date_to_sql)
}

pub fn opt_uuid_to_sql(id: Option<Uuid>) -> Option<String> {
    id.map(|id| id.to_string())
}

pub fn opt_decimal_to_sql(value: Option<Decimal>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn corrupt(field: &str, value: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::Database(DbError::Other(format!(
        "Invalid stored value for {}: '{}' ({})",
        field, value, err
    )))
}

pub fn parse_uuid(value: &str, field: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| corrupt(field, value, e))
}

pub fn parse_opt_uuid(value: Option<&str>, field: &str) -> DomainResult<Option<Uuid>> {
    value.map(|v| parse_uuid(v, field)).transpose()
}

pub fn parse_date(value: &str, field: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| corrupt(field, value, e))
}

pub fn parse_opt_date(value: Option<&str>, field: &str) -> DomainResult<Option<NaiveDate>> {
    value.map(|v| parse_date(v, field)).transpose()
}

pub fn parse_decimal(value: &str, field: &str) -> DomainResult<Decimal> {
    Decimal::from_str(value).map_err(|e| corrupt(field, value, e))
}

pub fn parse_opt_decimal(value: Option<&str>, field: &str) -> DomainResult<Option<Decimal>> {
    value.map(|v| parse_decimal(v, field)).transpose()
}

pub fn parse_datetime(value: &str, field: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(field, value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(None), None);
        assert_eq!(blank_to_none(Some("   ".to_string())), None);
        assert_eq!(blank_to_none(Some(" 0771234567 ".to_string())), Some("0771234567".to_string()));
    }

    #[test]
    fn test_date_storage_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(date_to_sql(date), "2024-03-05");
        assert_eq!(parse_date("2024-03-05", "date").unwrap(), date);
        assert!(parse_date("05/03/2024", "date").is_err());
    }
}
