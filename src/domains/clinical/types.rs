use crate::errors::DomainResult;
use crate::utils::{blank_to_none, parse_date, parse_decimal, parse_opt_date, parse_opt_decimal, parse_opt_uuid, parse_uuid};
use crate::validation::{Validate, ValidationBuilder};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

pub const NAME_MAX_LENGTH: usize = 100;
pub const TYPE_UNIT_MAX_LENGTH: usize = 50;
pub const INVESTIGATION_VALUE_MAX_LENGTH: usize = 100;
pub const INVESTIGATION_UNIT_MAX_LENGTH: usize = 20;
pub const LABORATORY_NAME_MAX_LENGTH: usize = 100;
pub const REFERRAL_MAX_LENGTH: usize = 200;
pub const DOCTOR_NAME_MAX_LENGTH: usize = 100;

fn validate_name(name: &str) -> DomainResult<()> {
    ValidationBuilder::new("name", Some(name.to_string()))
        .not_blank()
        .max_length(NAME_MAX_LENGTH)
        .validate()
}

fn optional_text(value: &Option<String>) -> Option<String> {
    blank_to_none(value.clone())
}

// --- Complications ---

/// A kind of complication, e.g. diabetes mellitus or hypothyroidism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplicationType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl fmt::Display for ComplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComplicationType {
    pub name: String,
    pub description: Option<String>,
}

impl Validate for NewComplicationType {
    fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ComplicationTypeRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl ComplicationTypeRow {
    pub fn into_entity(self) -> DomainResult<ComplicationType> {
        Ok(ComplicationType {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complication {
    pub id: Uuid,
    pub client_id: Uuid,
    pub complication_type_id: Option<Uuid>,
    pub detected_date: NaiveDate,
    /// Choice in the `complication_status` category
    pub status_id: Option<Uuid>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplication {
    pub complication_type_id: Option<Uuid>,
    pub detected_date: NaiveDate,
    pub status_id: Option<Uuid>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ComplicationRow {
    pub id: String,
    pub client_id: String,
    pub complication_type_id: Option<String>,
    pub detected_date: String,
    pub status_id: Option<String>,
    pub remarks: Option<String>,
}

impl ComplicationRow {
    pub fn into_entity(self) -> DomainResult<Complication> {
        Ok(Complication {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            complication_type_id: parse_opt_uuid(self.complication_type_id.as_deref(), "complication_type_id")?,
            detected_date: parse_date(&self.detected_date, "detected_date")?,
            status_id: parse_opt_uuid(self.status_id.as_deref(), "status_id")?,
            remarks: self.remarks,
        })
    }
}

// --- Vaccinations ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaccination {
    pub id: Uuid,
    pub client_id: Uuid,
    /// Choice in the `vaccine_name` category
    pub vaccine_name_id: Option<Uuid>,
    pub date_given: NaiveDate,
    pub next_dose_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVaccination {
    pub vaccine_name_id: Option<Uuid>,
    pub date_given: NaiveDate,
    pub next_dose_date: Option<NaiveDate>,
}

impl Validate for NewVaccination {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("next_dose_date", self.next_dose_date)
            .not_before(Some(self.date_given), "date_given")
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VaccinationRow {
    pub id: String,
    pub client_id: String,
    pub vaccine_name_id: Option<String>,
    pub date_given: String,
    pub next_dose_date: Option<String>,
}

impl VaccinationRow {
    pub fn into_entity(self) -> DomainResult<Vaccination> {
        Ok(Vaccination {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            vaccine_name_id: parse_opt_uuid(self.vaccine_name_id.as_deref(), "vaccine_name_id")?,
            date_given: parse_date(&self.date_given, "date_given")?,
            next_dose_date: parse_opt_date(self.next_dose_date.as_deref(), "next_dose_date")?,
        })
    }
}

// --- Investigations ---

/// A kind of lab investigation, e.g. FBC or LFT, with its usual unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
}

impl fmt::Display for InvestigationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewInvestigationType {
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
}

impl Validate for NewInvestigationType {
    fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        ValidationBuilder::new("unit", optional_text(&self.unit))
            .max_length(TYPE_UNIT_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InvestigationTypeRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
}

impl InvestigationTypeRow {
    pub fn into_entity(self) -> DomainResult<InvestigationType> {
        Ok(InvestigationType {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            description: self.description,
            unit: self.unit,
        })
    }
}

/// A lab result. Read back together with its type's name and unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investigation {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date_done: NaiveDate,
    pub investigation_type_id: Option<Uuid>,
    pub value: Option<String>,
    /// Unit recorded with this result, overriding the type's unit
    pub unit: Option<String>,
    pub laboratory_name: Option<String>,
    pub type_name: Option<String>,
    pub type_unit: Option<String>,
}

impl Investigation {
    /// The recorded unit, else the investigation type's unit
    pub fn effective_unit(&self) -> Option<&str> {
        self.unit.as_deref().or(self.type_unit.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvestigation {
    pub date_done: NaiveDate,
    pub investigation_type_id: Option<Uuid>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub laboratory_name: Option<String>,
}

impl Validate for NewInvestigation {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("value", optional_text(&self.value))
            .max_length(INVESTIGATION_VALUE_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("unit", optional_text(&self.unit))
            .max_length(INVESTIGATION_UNIT_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("laboratory_name", optional_text(&self.laboratory_name))
            .max_length(LABORATORY_NAME_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InvestigationRow {
    pub id: String,
    pub client_id: String,
    pub date_done: String,
    pub investigation_type_id: Option<String>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub laboratory_name: Option<String>,
    pub type_name: Option<String>,
    pub type_unit: Option<String>,
}

impl InvestigationRow {
    pub fn into_entity(self) -> DomainResult<Investigation> {
        Ok(Investigation {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            date_done: parse_date(&self.date_done, "date_done")?,
            investigation_type_id: parse_opt_uuid(self.investigation_type_id.as_deref(), "investigation_type_id")?,
            value: self.value,
            unit: self.unit,
            laboratory_name: self.laboratory_name,
            type_name: self.type_name,
            type_unit: self.type_unit,
        })
    }
}

// --- Growth ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date_measured: NaiveDate,
    /// Choice in the `growth` category
    pub growth_type_id: Option<Uuid>,
    pub value: Decimal,
    pub percentile: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrowthRecord {
    pub date_measured: NaiveDate,
    pub growth_type_id: Option<Uuid>,
    pub value: Decimal,
    pub percentile: Option<Decimal>,
}

impl Validate for NewGrowthRecord {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("value", Some(self.value))
            .digits(6, 2)
            .validate()?;
        ValidationBuilder::new("percentile", self.percentile)
            .digits(5, 2)
            .range(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GrowthRecordRow {
    pub id: String,
    pub client_id: String,
    pub date_measured: String,
    pub type_id: Option<String>,
    pub value: String,
    pub percentile: Option<String>,
}

impl GrowthRecordRow {
    pub fn into_entity(self) -> DomainResult<GrowthRecord> {
        Ok(GrowthRecord {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            date_measured: parse_date(&self.date_measured, "date_measured")?,
            growth_type_id: parse_opt_uuid(self.type_id.as_deref(), "type_id")?,
            value: parse_decimal(&self.value, "value")?,
            percentile: parse_opt_decimal(self.percentile.as_deref(), "percentile")?,
        })
    }
}

// --- Clinic visits ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicVisit {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date_visit: NaiveDate,
    pub problem: Option<String>,
    /// Choice in the `clinic_type` category
    pub clinic_type_id: Option<Uuid>,
    pub action: Option<String>,
    pub referral: Option<String>,
    pub next_visit_date: Option<NaiveDate>,
    pub doctor_name: Option<String>,
    pub follow_up_needed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClinicVisit {
    pub date_visit: NaiveDate,
    pub problem: Option<String>,
    pub clinic_type_id: Option<Uuid>,
    pub action: Option<String>,
    pub referral: Option<String>,
    pub next_visit_date: Option<NaiveDate>,
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub follow_up_needed: bool,
}

impl NewClinicVisit {
    pub fn new(date_visit: NaiveDate) -> Self {
        Self {
            date_visit,
            problem: None,
            clinic_type_id: None,
            action: None,
            referral: None,
            next_visit_date: None,
            doctor_name: None,
            follow_up_needed: false,
        }
    }
}

impl Validate for NewClinicVisit {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("referral", optional_text(&self.referral))
            .max_length(REFERRAL_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("doctor_name", optional_text(&self.doctor_name))
            .max_length(DOCTOR_NAME_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClinicVisitRow {
    pub id: String,
    pub client_id: String,
    pub date_visit: String,
    pub problem: Option<String>,
    pub clinic_type_id: Option<String>,
    pub action: Option<String>,
    pub referral: Option<String>,
    pub next_visit_date: Option<String>,
    pub doctor_name: Option<String>,
    pub follow_up_needed: bool,
}

impl ClinicVisitRow {
    pub fn into_entity(self) -> DomainResult<ClinicVisit> {
        Ok(ClinicVisit {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            date_visit: parse_date(&self.date_visit, "date_visit")?,
            problem: self.problem,
            clinic_type_id: parse_opt_uuid(self.clinic_type_id.as_deref(), "clinic_type_id")?,
            action: self.action,
            referral: self.referral,
            next_visit_date: parse_opt_date(self.next_visit_date.as_deref(), "next_visit_date")?,
            doctor_name: self.doctor_name,
            follow_up_needed: self.follow_up_needed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DomainError, ValidationError};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_dose_cannot_precede_date_given() {
        let mut input = NewVaccination {
            vaccine_name_id: None,
            date_given: date(2024, 5, 1),
            next_dose_date: Some(date(2024, 4, 1)),
        };
        assert!(matches!(
            input.validate(),
            Err(DomainError::Validation(ValidationError::InvalidValue { ref field, .. })) if field == "next_dose_date"
        ));

        input.next_dose_date = Some(date(2024, 5, 1));
        assert!(input.validate().is_ok());
        input.next_dose_date = None;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_growth_value_limits() {
        let mut input = NewGrowthRecord {
            date_measured: date(2024, 1, 10),
            growth_type_id: None,
            value: dec!(132.50),
            percentile: Some(dec!(45.5)),
        };
        assert!(input.validate().is_ok());

        input.value = dec!(12.345);
        assert!(input.validate().is_err());

        input.value = dec!(10000.00);
        assert!(input.validate().is_err());

        input.value = dec!(132.5);
        input.percentile = Some(dec!(100.01));
        assert!(matches!(
            input.validate(),
            Err(DomainError::Validation(ValidationError::Range { ref field, .. })) if field == "percentile"
        ));
    }

    #[test]
    fn test_effective_unit_prefers_override() {
        let mut investigation = Investigation {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            date_done: date(2024, 2, 2),
            investigation_type_id: None,
            value: Some("9.8".to_string()),
            unit: None,
            laboratory_name: None,
            type_name: Some("FBC".to_string()),
            type_unit: Some("g/dL".to_string()),
        };
        assert_eq!(investigation.effective_unit(), Some("g/dL"));

        investigation.unit = Some("mmol/L".to_string());
        assert_eq!(investigation.effective_unit(), Some("mmol/L"));
    }

    #[test]
    fn test_type_names_required() {
        assert!(NewComplicationType::default().validate().is_err());
        let input = NewInvestigationType {
            name: "Serum Ferritin".to_string(),
            description: None,
            unit: Some("ng/mL".to_string()),
        };
        assert!(input.validate().is_ok());
    }
}
