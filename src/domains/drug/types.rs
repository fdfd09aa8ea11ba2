use crate::errors::DomainResult;
use crate::utils::{blank_to_none, parse_date, parse_opt_uuid, parse_uuid};
use crate::validation::{Validate, ValidationBuilder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

pub const NAME_MAX_LENGTH: usize = 100;
pub const DOSE_MAX_LENGTH: usize = 50;
pub const REGIMEN_MAX_LENGTH: usize = 100;
pub const DURATION_MAX_LENGTH: usize = 50;
pub const INDICATION_MAX_LENGTH: usize = 200;
pub const PRESCRIBED_BY_MAX_LENGTH: usize = 100;

/// A drug on the master list, with the dose and regimen usually prescribed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugName {
    pub id: Uuid,
    pub name: String,
    pub dose: Option<String>,
    pub regimen: Option<String>,
}

impl fmt::Display for DrugName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDrugName {
    pub name: String,
    pub dose: Option<String>,
    pub regimen: Option<String>,
}

impl Validate for NewDrugName {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .not_blank()
            .max_length(NAME_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("dose", blank_to_none(self.dose.clone()))
            .max_length(DOSE_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("regimen", blank_to_none(self.regimen.clone()))
            .max_length(REGIMEN_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DrugNameRow {
    pub id: String,
    pub name: String,
    pub dose: Option<String>,
    pub regimen: Option<String>,
}

impl DrugNameRow {
    pub fn into_entity(self) -> DomainResult<DrugName> {
        Ok(DrugName {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            dose: self.dose,
            regimen: self.regimen,
        })
    }
}

/// A drug prescribed to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drug {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date_prescribed: NaiveDate,
    pub drug_name_id: Option<Uuid>,
    pub dose: String,
    pub regimen: String,
    pub duration: String,
    pub indication: Option<String>,
    pub prescribed_by: Option<String>,
}

/// Prescription input. `dose` and `regimen` may be left out when the chosen
/// drug carries defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDrug {
    pub date_prescribed: NaiveDate,
    pub drug_name_id: Option<Uuid>,
    pub dose: Option<String>,
    pub regimen: Option<String>,
    pub duration: String,
    pub indication: Option<String>,
    pub prescribed_by: Option<String>,
}

impl NewDrug {
    pub fn new(date_prescribed: NaiveDate, drug_name_id: Option<Uuid>, duration: &str) -> Self {
        Self {
            date_prescribed,
            drug_name_id,
            dose: None,
            regimen: None,
            duration: duration.to_string(),
            indication: None,
            prescribed_by: None,
        }
    }
}

impl Validate for NewDrug {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("duration", Some(self.duration.clone()))
            .not_blank()
            .max_length(DURATION_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("dose", blank_to_none(self.dose.clone()))
            .max_length(DOSE_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("regimen", blank_to_none(self.regimen.clone()))
            .max_length(REGIMEN_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("indication", blank_to_none(self.indication.clone()))
            .max_length(INDICATION_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("prescribed_by", blank_to_none(self.prescribed_by.clone()))
            .max_length(PRESCRIBED_BY_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DrugRow {
    pub id: String,
    pub client_id: String,
    pub date_prescribed: String,
    pub drug_name_id: Option<String>,
    pub dose: String,
    pub regimen: String,
    pub duration: String,
    pub indication: Option<String>,
    pub prescribed_by: Option<String>,
}

impl DrugRow {
    pub fn into_entity(self) -> DomainResult<Drug> {
        Ok(Drug {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            date_prescribed: parse_date(&self.date_prescribed, "date_prescribed")?,
            drug_name_id: parse_opt_uuid(self.drug_name_id.as_deref(), "drug_name_id")?,
            dose: self.dose,
            regimen: self.regimen,
            duration: self.duration,
            indication: self.indication,
            prescribed_by: self.prescribed_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DomainError, ValidationError};

    #[test]
    fn test_drug_name_requires_name() {
        let input = NewDrugName {
            name: " ".to_string(),
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let input = NewDrugName {
            name: "Desferrioxamine".to_string(),
            dose: Some("x".repeat(DOSE_MAX_LENGTH + 1)),
            regimen: None,
        };
        assert!(matches!(
            input.validate(),
            Err(DomainError::Validation(ValidationError::MaxLength { ref field, .. })) if field == "dose"
        ));
    }

    #[test]
    fn test_drug_requires_duration() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(NewDrug::new(date, None, "").validate().is_err());
        assert!(NewDrug::new(date, None, "3 months").validate().is_ok());
    }
}
