use crate::domains::lookup::types::ChoiceCategory;
use crate::errors::{DbError, DomainError, DomainResult, ValidationError};
use crate::types::EntityKind;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use sqlx::{query_scalar, SqliteConnection};
use std::sync::OnceLock;
use uuid::Uuid;

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self
    where
        T: Default + PartialEq,
    {
        if self.value.is_none() || self.value == Some(T::default()) {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(DomainError::Validation(first)),
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    /// Like `required`, but whitespace-only input also counts as blank.
    pub fn not_blank(mut self) -> Self {
        let blank = self.value.as_deref().map_or(true, |v| v.trim().is_empty());
        if blank {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.chars().count() > max {
                self.errors.push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }

    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !pattern.is_match(value) {
                self.errors.push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }

    pub fn email(self) -> Self {
        self.matches_pattern(email_regex(), "must be a valid email address")
    }

    pub fn one_of(mut self, allowed_values: &[&str], message: Option<&str>) -> Self {
        if let Some(value) = &self.value {
            if !allowed_values.contains(&value.as_str()) {
                let reason = message.unwrap_or("must be one of the allowed values");
                self.errors.push(ValidationError::invalid_value(&self.field_name, reason));
            }
        }
        self
    }
}

/// Numeric validations
impl<T> ValidationBuilder<T>
where
    T: PartialOrd + Clone + std::fmt::Display,
{
    pub fn range(mut self, min: T, max: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min || value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    max.to_string(),
                ));
            }
        }
        self
    }
}

/// Fixed-point limits, expressed as total digits and digits after the point.
impl ValidationBuilder<Decimal> {
    pub fn digits(mut self, max_digits: u32, decimal_places: u32) -> Self {
        if let Some(value) = &self.value {
            if value.scale() > decimal_places {
                self.errors.push(ValidationError::format(
                    &self.field_name,
                    &format!("must have at most {} decimal places", decimal_places),
                ));
            } else {
                let whole_digits = max_digits - decimal_places;
                let limit = Decimal::from(10i64.pow(whole_digits));
                if value.trunc().abs() >= limit {
                    self.errors.push(ValidationError::format(
                        &self.field_name,
                        &format!("must have at most {} digits before the decimal point", whole_digits),
                    ));
                }
            }
        }
        self
    }
}

impl ValidationBuilder<NaiveDate> {
    pub fn not_before(mut self, earliest: Option<NaiveDate>, earliest_field: &str) -> Self {
        if let (Some(value), Some(earliest)) = (&self.value, earliest) {
            if *value < earliest {
                self.errors.push(ValidationError::invalid_value(
                    &self.field_name,
                    &format!("cannot be before {}", earliest_field),
                ));
            }
        }
        self
    }
}

/// Uniqueness validation helper (relies on database access)
pub async fn validate_unique(
    conn: &mut SqliteConnection,
    table: &str,
    field: &str,
    value: &str,
    exclude_id: Option<Uuid>,
    field_name: &str,
) -> DomainResult<()> {
    let count: i64 = match exclude_id {
        Some(id) => {
            let query = format!("SELECT COUNT(*) FROM {} WHERE {} = ? AND id != ?", table, field);
            query_scalar(&query)
                .bind(value)
                .bind(id.to_string())
                .fetch_one(&mut *conn)
                .await
                .map_err(DbError::from)?
        }
        None => {
            let query = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", table, field);
            query_scalar(&query)
                .bind(value)
                .fetch_one(&mut *conn)
                .await
                .map_err(DbError::from)?
        }
    };

    if count > 0 {
        return Err(DomainError::Validation(ValidationError::unique(field_name)));
    }

    Ok(())
}

/// Validation utility for checking an optional reference points at an existing row
pub async fn validate_entity_exists(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: Option<Uuid>,
    field_name: &str,
) -> DomainResult<()> {
    let Some(id) = id else {
        return Ok(());
    };

    let query = format!("SELECT COUNT(*) FROM {} WHERE id = ?", kind.table_name());
    let count: i64 = query_scalar(&query)
        .bind(id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(DbError::from)?;

    if count == 0 {
        return Err(DomainError::Validation(ValidationError::relationship(
            field_name,
            &format!("{} {} does not exist", kind.display_name(), id),
        )));
    }

    Ok(())
}

/// A Choice reference is only valid when the choice belongs to the field's category.
pub async fn validate_choice_category(
    conn: &mut SqliteConnection,
    choice_id: Option<Uuid>,
    expected: ChoiceCategory,
    field_name: &str,
) -> DomainResult<()> {
    let Some(id) = choice_id else {
        return Ok(());
    };

    let category: Option<String> = query_scalar("SELECT category FROM choices WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::from)?;

    match category {
        None => Err(DomainError::Validation(ValidationError::relationship(
            field_name,
            &format!("Choice {} does not exist", id),
        ))),
        Some(actual) if actual == expected.as_str() => Ok(()),
        Some(actual) => Err(DomainError::Validation(ValidationError::category_mismatch(
            field_name,
            expected.as_str(),
            &actual,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_email_validation() {
        assert!(email_regex().is_match("user@example.com"));
        assert!(email_regex().is_match("user.name+tag@example.co.uk"));
        assert!(!email_regex().is_match("user@"));
        assert!(!email_regex().is_match("@example.com"));
        assert!(!email_regex().is_match("user@example"));
    }

    #[test]
    fn test_not_blank() {
        assert!(ValidationBuilder::new("full_name", Some("John Silva".to_string()))
            .not_blank()
            .validate()
            .is_ok());
        assert!(ValidationBuilder::new("full_name", Some("   ".to_string()))
            .not_blank()
            .validate()
            .is_err());
        assert!(ValidationBuilder::<String>::new("full_name", None)
            .not_blank()
            .validate()
            .is_err());
    }

    #[test]
    fn test_validation_builder() {
        let result = ValidationBuilder::new("nic_number", Some("1234567890123456".to_string()))
            .max_length(15)
            .validate();
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::MaxLength { max: 15, .. }))
        ));

        let result = ValidationBuilder::new("gender", Some("X".to_string()))
            .one_of(&["M", "F"], None)
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("percentile", Some(dec!(45.5)))
            .range(dec!(0), dec!(100))
            .validate();
        assert!(result.is_ok());

        let value: Option<String> = None;
        let result = ValidationBuilder::new("name", value).required().validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_decimal_digits() {
        // Haemoglobin is stored with four digits, one after the point.
        assert!(ValidationBuilder::new("hb_level", Some(dec!(9.5))).digits(4, 1).validate().is_ok());
        assert!(ValidationBuilder::new("hb_level", Some(dec!(999.9))).digits(4, 1).validate().is_ok());
        assert!(ValidationBuilder::new("hb_level", Some(dec!(1000.0))).digits(4, 1).validate().is_err());
        assert!(ValidationBuilder::new("hb_level", Some(dec!(9.55))).digits(4, 1).validate().is_err());
    }

    #[test]
    fn test_not_before() {
        let admitted = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let early = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert!(ValidationBuilder::new("date_of_discharge", Some(admitted))
            .not_before(Some(admitted), "date_of_admission")
            .validate()
            .is_ok());
        assert!(ValidationBuilder::new("date_of_discharge", Some(early))
            .not_before(Some(admitted), "date_of_admission")
            .validate()
            .is_err());
        assert!(ValidationBuilder::new("date_of_discharge", Some(early))
            .not_before(None, "date_of_admission")
            .validate()
            .is_ok());
    }
}
