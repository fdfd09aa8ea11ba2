use crate::errors::DomainResult;
use crate::utils::{blank_to_none, parse_date, parse_opt_date, parse_opt_decimal, parse_opt_uuid, parse_uuid};
use crate::validation::{Validate, ValidationBuilder};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_REASON_FOR_ADMISSION: &str = "Blood Transfusion";
pub const DEFAULT_REACTION: &str = "None";
pub const OUTCOME_MAX_LENGTH: usize = 200;
pub const REACTION_MAX_LENGTH: usize = 200;
pub const CHECKED_BY_MAX_LENGTH: usize = 100;

/// Haemoglobin level a transfusion aims to hold the patient at, unless stated
pub fn default_hb_level_to_be_kept() -> Decimal {
    dec!(9.0)
}

// --- Admissions ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date_of_admission: NaiveDate,
    pub reason_for_admission: String,
    pub date_of_discharge: Option<NaiveDate>,
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdmission {
    pub date_of_admission: NaiveDate,
    /// Blank or missing means a transfusion admission
    pub reason_for_admission: Option<String>,
    pub date_of_discharge: Option<NaiveDate>,
    pub outcome: Option<String>,
}

impl NewAdmission {
    pub fn new(date_of_admission: NaiveDate) -> Self {
        Self {
            date_of_admission,
            reason_for_admission: None,
            date_of_discharge: None,
            outcome: None,
        }
    }

    pub fn reason(&self) -> String {
        blank_to_none(self.reason_for_admission.clone()).unwrap_or_else(|| DEFAULT_REASON_FOR_ADMISSION.to_string())
    }
}

impl Validate for NewAdmission {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("date_of_discharge", self.date_of_discharge)
            .not_before(Some(self.date_of_admission), "date_of_admission")
            .validate()?;
        ValidationBuilder::new("outcome", blank_to_none(self.outcome.clone()))
            .max_length(OUTCOME_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AdmissionRow {
    pub id: String,
    pub client_id: String,
    pub date_of_admission: String,
    pub reason_for_admission: String,
    pub date_of_discharge: Option<String>,
    pub outcome: Option<String>,
}

impl AdmissionRow {
    pub fn into_entity(self) -> DomainResult<Admission> {
        Ok(Admission {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            date_of_admission: parse_date(&self.date_of_admission, "date_of_admission")?,
            reason_for_admission: self.reason_for_admission,
            date_of_discharge: parse_opt_date(self.date_of_discharge.as_deref(), "date_of_discharge")?,
            outcome: self.outcome,
        })
    }
}

// --- Transfusions ---

/// A blood transfusion given during an admission. The client is the admission's client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfusion {
    pub id: Uuid,
    pub admission_id: Uuid,
    pub date_of_transfusion: NaiveDate,
    pub hb_level_to_be_kept: Option<Decimal>,
    pub hb_level: Option<Decimal>,
    pub wbc_count: Option<Decimal>,
    pub platelet_count: Option<Decimal>,
    pub amount_of_blood: Option<Decimal>,
    /// Choice in the `special_blood_type` category
    pub special_type_id: Option<Uuid>,
    pub next_date_given: Option<NaiveDate>,
    pub reaction: Option<String>,
    pub checked_by: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransfusion {
    pub date_of_transfusion: NaiveDate,
    pub hb_level_to_be_kept: Option<Decimal>,
    pub hb_level: Option<Decimal>,
    pub wbc_count: Option<Decimal>,
    pub platelet_count: Option<Decimal>,
    pub amount_of_blood: Option<Decimal>,
    pub special_type_id: Option<Uuid>,
    pub next_date_given: Option<NaiveDate>,
    pub reaction: Option<String>,
    pub checked_by: Option<String>,
    pub remarks: Option<String>,
}

impl NewTransfusion {
    /// A transfusion on `date` carrying the usual target level and no reaction
    pub fn new(date_of_transfusion: NaiveDate) -> Self {
        Self {
            date_of_transfusion,
            hb_level_to_be_kept: Some(default_hb_level_to_be_kept()),
            hb_level: None,
            wbc_count: None,
            platelet_count: None,
            amount_of_blood: None,
            special_type_id: None,
            next_date_given: None,
            reaction: Some(DEFAULT_REACTION.to_string()),
            checked_by: None,
            remarks: None,
        }
    }
}

impl Validate for NewTransfusion {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("hb_level_to_be_kept", self.hb_level_to_be_kept)
            .digits(4, 1)
            .validate()?;
        ValidationBuilder::new("hb_level", self.hb_level).digits(4, 1).validate()?;
        ValidationBuilder::new("wbc_count", self.wbc_count).digits(8, 1).validate()?;
        ValidationBuilder::new("platelet_count", self.platelet_count)
            .digits(8, 1)
            .validate()?;
        ValidationBuilder::new("amount_of_blood", self.amount_of_blood)
            .digits(6, 2)
            .validate()?;
        ValidationBuilder::new("reaction", blank_to_none(self.reaction.clone()))
            .max_length(REACTION_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("checked_by", blank_to_none(self.checked_by.clone()))
            .max_length(CHECKED_BY_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TransfusionRow {
    pub id: String,
    pub admission_id: String,
    pub date_of_transfusion: String,
    pub hb_level_to_be_kept: Option<String>,
    pub hb_level: Option<String>,
    pub wbc_count: Option<String>,
    pub platelet_count: Option<String>,
    pub amount_of_blood: Option<String>,
    pub special_type_id: Option<String>,
    pub next_date_given: Option<String>,
    pub reaction: Option<String>,
    pub checked_by: Option<String>,
    pub remarks: Option<String>,
}

impl TransfusionRow {
    pub fn into_entity(self) -> DomainResult<Transfusion> {
        Ok(Transfusion {
            id: parse_uuid(&self.id, "id")?,
            admission_id: parse_uuid(&self.admission_id, "admission_id")?,
            date_of_transfusion: parse_date(&self.date_of_transfusion, "date_of_transfusion")?,
            hb_level_to_be_kept: parse_opt_decimal(self.hb_level_to_be_kept.as_deref(), "hb_level_to_be_kept")?,
            hb_level: parse_opt_decimal(self.hb_level.as_deref(), "hb_level")?,
            wbc_count: parse_opt_decimal(self.wbc_count.as_deref(), "wbc_count")?,
            platelet_count: parse_opt_decimal(self.platelet_count.as_deref(), "platelet_count")?,
            amount_of_blood: parse_opt_decimal(self.amount_of_blood.as_deref(), "amount_of_blood")?,
            special_type_id: parse_opt_uuid(self.special_type_id.as_deref(), "special_type_id")?,
            next_date_given: parse_opt_date(self.next_date_given.as_deref(), "next_date_given")?,
            reaction: self.reaction,
            checked_by: self.checked_by,
            remarks: self.remarks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DomainError, ValidationError};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reason_defaults_to_transfusion() {
        let mut admission = NewAdmission::new(date(2024, 1, 5));
        assert_eq!(admission.reason(), "Blood Transfusion");
        admission.reason_for_admission = Some("Fever".to_string());
        assert_eq!(admission.reason(), "Fever");
    }

    #[test]
    fn test_discharge_not_before_admission() {
        let mut admission = NewAdmission::new(date(2024, 1, 5));
        admission.date_of_discharge = Some(date(2024, 1, 4));
        assert!(matches!(
            admission.validate(),
            Err(DomainError::Validation(ValidationError::InvalidValue { ref field, .. })) if field == "date_of_discharge"
        ));
        admission.date_of_discharge = Some(date(2024, 1, 5));
        assert!(admission.validate().is_ok());
    }

    #[test]
    fn test_transfusion_defaults_and_precision() {
        let mut transfusion = NewTransfusion::new(date(2024, 1, 5));
        assert_eq!(transfusion.hb_level_to_be_kept, Some(dec!(9.0)));
        assert_eq!(transfusion.reaction.as_deref(), Some("None"));
        assert!(transfusion.validate().is_ok());

        transfusion.hb_level = Some(dec!(10.25));
        assert!(transfusion.validate().is_err());

        transfusion.hb_level = Some(dec!(1000.0));
        assert!(transfusion.validate().is_err());

        transfusion.hb_level = Some(dec!(7.8));
        transfusion.amount_of_blood = Some(dec!(250.00));
        transfusion.platelet_count = Some(dec!(250000.0));
        assert!(transfusion.validate().is_ok());
    }
}
