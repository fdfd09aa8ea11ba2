use crate::errors::{DomainResult, ValidationError};
use crate::utils::{parse_opt_uuid, parse_uuid};
use crate::validation::{Validate, ValidationBuilder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

pub const NAME_MAX_LENGTH: usize = 100;
pub const ICD_CODE_MAX_LENGTH: usize = 20;

/// The category a Choice belongs to. Each Choice-referencing field accepts one category only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceCategory {
    ClinicType,
    MaritalStatus,
    CurrentStatus,
    ComplicationStatus,
    VaccineName,
    SpecialBloodType,
    Growth,
}

impl ChoiceCategory {
    pub const ALL: [ChoiceCategory; 7] = [
        ChoiceCategory::ClinicType,
        ChoiceCategory::MaritalStatus,
        ChoiceCategory::CurrentStatus,
        ChoiceCategory::ComplicationStatus,
        ChoiceCategory::VaccineName,
        ChoiceCategory::SpecialBloodType,
        ChoiceCategory::Growth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChoiceCategory::ClinicType => "clinic_type",
            ChoiceCategory::MaritalStatus => "marital_status",
            ChoiceCategory::CurrentStatus => "current_status",
            ChoiceCategory::ComplicationStatus => "complication_status",
            ChoiceCategory::VaccineName => "vaccine_name",
            ChoiceCategory::SpecialBloodType => "special_blood_type",
            ChoiceCategory::Growth => "growth",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChoiceCategory::ClinicType => "Clinic Type",
            ChoiceCategory::MaritalStatus => "Marital Status",
            ChoiceCategory::CurrentStatus => "Current Status",
            ChoiceCategory::ComplicationStatus => "Complication Status",
            ChoiceCategory::VaccineName => "Vaccine Name",
            ChoiceCategory::SpecialBloodType => "Special Blood Type",
            ChoiceCategory::Growth => "Growth",
        }
    }
}

impl fmt::Display for ChoiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    ValidationBuilder::new("name", Some(name.to_string()))
        .not_blank()
        .max_length(NAME_MAX_LENGTH)
        .validate()
}

// --- Choice ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: Uuid,
    pub category: ChoiceCategory,
    pub name: String,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChoice {
    pub category: ChoiceCategory,
    pub name: String,
}

impl Validate for NewChoice {
    fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ChoiceRow {
    pub id: String,
    pub category: String,
    pub name: String,
}

impl ChoiceRow {
    pub fn into_entity(self) -> DomainResult<Choice> {
        let category = ChoiceCategory::from_str(&self.category).ok_or_else(|| {
            ValidationError::invalid_value("category", &format!("unknown choice category '{}'", self.category))
        })?;
        Ok(Choice {
            id: parse_uuid(&self.id, "id")?,
            category,
            name: self.name,
        })
    }
}

// --- Province ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProvince {
    pub name: String,
}

impl Validate for NewProvince {
    fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProvinceRow {
    pub id: String,
    pub name: String,
}

impl ProvinceRow {
    pub fn into_entity(self) -> DomainResult<Province> {
        Ok(Province {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
        })
    }
}

// --- District ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: Uuid,
    pub name: String,
    pub province_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDistrict {
    pub name: String,
    pub province_id: Uuid,
}

impl Validate for NewDistrict {
    fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DistrictRow {
    pub id: String,
    pub name: String,
    pub province_id: String,
}

impl DistrictRow {
    pub fn into_entity(self) -> DomainResult<District> {
        Ok(District {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            province_id: parse_uuid(&self.province_id, "province_id")?,
        })
    }
}

// --- DS Division ---

/// Divisional Secretariat division, the smallest administrative area recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsDivision {
    pub id: Uuid,
    pub name: String,
    pub district_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDsDivision {
    pub name: String,
    pub district_id: Uuid,
}

impl Validate for NewDsDivision {
    fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DsDivisionRow {
    pub id: String,
    pub name: String,
    pub district_id: String,
}

impl DsDivisionRow {
    pub fn into_entity(self) -> DomainResult<DsDivision> {
        Ok(DsDivision {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            district_id: parse_uuid(&self.district_id, "district_id")?,
        })
    }
}

// --- Thalassemia unit ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThalassemiaUnit {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub ds_division_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewThalassemiaUnit {
    pub name: String,
    pub description: Option<String>,
    pub ds_division_id: Option<Uuid>,
}

impl Validate for NewThalassemiaUnit {
    fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ThalassemiaUnitRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub ds_division_id: Option<String>,
}

impl ThalassemiaUnitRow {
    pub fn into_entity(self) -> DomainResult<ThalassemiaUnit> {
        Ok(ThalassemiaUnit {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            description: self.description,
            ds_division_id: parse_opt_uuid(self.ds_division_id.as_deref(), "ds_division_id")?,
        })
    }
}

// --- Diagnosis type ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icd_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDiagnosisType {
    pub name: String,
    pub description: Option<String>,
    pub icd_code: Option<String>,
}

impl Validate for NewDiagnosisType {
    fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        ValidationBuilder::new("icd_code", self.icd_code.clone())
            .max_length(ICD_CODE_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DiagnosisTypeRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icd_code: Option<String>,
}

impl DiagnosisTypeRow {
    pub fn into_entity(self) -> DomainResult<DiagnosisType> {
        Ok(DiagnosisType {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            description: self.description,
            icd_code: self.icd_code,
        })
    }
}
