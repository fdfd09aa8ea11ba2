use crate::domains::client::age::{age_on, precise_age_on, PreciseAge};
use crate::errors::{DomainResult, ValidationError};
use crate::utils::{
    blank_to_none, parse_date, parse_datetime, parse_opt_date, parse_opt_decimal, parse_opt_uuid,
    parse_uuid,
};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

pub const REGISTRATION_NUMBER_MAX_LENGTH: usize = 50;
pub const FULL_NAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 100;
pub const NIC_MAX_LENGTH: usize = 15;
pub const CONTACT_NUMBER_MAX_LENGTH: usize = 20;
pub const TRANSFUSION_REGIMEN_MAX_LENGTH: usize = 200;
pub const LINKED_REGISTRATION_MAX_LENGTH: usize = 20;

/// Gender enum, stored as a single letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodGroup {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ethnicity {
    Sinhalese,
    Tamil,
    SriLankanMoor,
    Burger,
    Other,
}

impl Ethnicity {
    pub const ALL: [Ethnicity; 5] = [
        Ethnicity::Sinhalese,
        Ethnicity::Tamil,
        Ethnicity::SriLankanMoor,
        Ethnicity::Burger,
        Ethnicity::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ethnicity::Sinhalese => "Sinhalese",
            Ethnicity::Tamil => "Tamil",
            Ethnicity::SriLankanMoor => "SriLankanMoor",
            Ethnicity::Burger => "Burger",
            Ethnicity::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Ethnicity::SriLankanMoor => "Sri Lankan Moor",
            other => other.as_str(),
        }
    }
}

/// How a family member is related to the patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Relationship {
    Father,
    Mother,
    Sibling,
    #[default]
    Other,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Father => "Father",
            Relationship::Mother => "Mother",
            Relationship::Sibling => "Sibling",
            Relationship::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Father" => Some(Relationship::Father),
            "Mother" => Some(Relationship::Mother),
            "Sibling" => Some(Relationship::Sibling),
            "Other" => Some(Relationship::Other),
            _ => None,
        }
    }
}

/// Client (patient) entity - the registry's central record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub registration_number: String,
    pub full_name: String,
    pub common_name: Option<String>,
    pub gender: Gender,
    pub ethnicity: Option<Ethnicity>,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<BloodGroup>,
    pub nic_number: Option<String>,
    pub date_of_registration: Option<NaiveDate>,
    pub unit_id: Option<Uuid>,
    pub diagnosis_id: Option<Uuid>,
    pub marital_status_id: Option<Uuid>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub ds_division_id: Option<Uuid>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub guardian_name_1: Option<String>,
    pub guardian_contact_number_1: Option<String>,
    pub guardian_name_2: Option<String>,
    pub guardian_contact_number_2: Option<String>,
    pub diagnosis_date: Option<NaiveDate>,
    pub hb_level_at_diagnosis: Option<Decimal>,
    pub date_first_transfused: Option<NaiveDate>,
    pub date_iron_chelation_started: Option<NaiveDate>,
    pub transfusion_regimen: Option<String>,
    pub allergic_history: Option<String>,
    pub special_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Whole years as of `as_of`; `None` without a date of birth
    pub fn age_on(&self, as_of: NaiveDate) -> Option<u32> {
        self.date_of_birth.and_then(|dob| age_on(dob, as_of))
    }

    pub fn precise_age_on(&self, as_of: NaiveDate) -> Option<PreciseAge> {
        self.date_of_birth.and_then(|dob| precise_age_on(dob, as_of))
    }

    /// e.g. "9 years, 1 months, and 20 days"
    pub fn age_string_on(&self, as_of: NaiveDate) -> Option<String> {
        self.precise_age_on(as_of).map(|age| age.to_string())
    }

    /// Age as of today's local date
    pub fn age(&self) -> Option<u32> {
        self.age_on(Local::now().date_naive())
    }

    pub fn precise_age(&self) -> Option<PreciseAge> {
        self.precise_age_on(Local::now().date_naive())
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.registration_number, self.full_name)
    }
}

/// Registration / edit form for a client. An update replaces every attribute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    pub registration_number: String,
    pub full_name: String,
    pub common_name: Option<String>,
    /// "M" or "F"
    pub gender: String,
    pub ethnicity: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
    pub nic_number: Option<String>,
    pub date_of_registration: Option<NaiveDate>,
    pub unit_id: Option<Uuid>,
    pub diagnosis_id: Option<Uuid>,
    pub marital_status_id: Option<Uuid>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub ds_division_id: Option<Uuid>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub guardian_name_1: Option<String>,
    pub guardian_contact_number_1: Option<String>,
    pub guardian_name_2: Option<String>,
    pub guardian_contact_number_2: Option<String>,
    pub diagnosis_date: Option<NaiveDate>,
    pub hb_level_at_diagnosis: Option<Decimal>,
    pub date_first_transfused: Option<NaiveDate>,
    pub date_iron_chelation_started: Option<NaiveDate>,
    pub transfusion_regimen: Option<String>,
    pub allergic_history: Option<String>,
    pub special_note: Option<String>,
}

impl NewClient {
    pub fn new(registration_number: &str, full_name: &str, gender: Gender) -> Self {
        Self {
            registration_number: registration_number.to_string(),
            full_name: full_name.to_string(),
            gender: gender.as_str().to_string(),
            ethnicity: Some(Ethnicity::Sinhalese.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn parsed_gender(&self) -> Option<Gender> {
        Gender::from_str(self.gender.trim())
    }

    pub fn parsed_ethnicity(&self) -> Option<Ethnicity> {
        blank_to_none(self.ethnicity.clone()).and_then(|e| Ethnicity::from_str(&e))
    }

    pub fn parsed_blood_group(&self) -> Option<BloodGroup> {
        blank_to_none(self.blood_group.clone()).and_then(|g| BloodGroup::from_str(&g))
    }
}

fn optional_text(value: &Option<String>) -> Option<String> {
    blank_to_none(value.clone())
}

impl Validate for NewClient {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("registration_number", Some(self.registration_number.clone()))
            .not_blank()
            .max_length(REGISTRATION_NUMBER_MAX_LENGTH)
            .validate()?;

        ValidationBuilder::new("full_name", Some(self.full_name.clone()))
            .not_blank()
            .max_length(FULL_NAME_MAX_LENGTH)
            .validate()?;

        ValidationBuilder::new("gender", Some(self.gender.trim().to_string()))
            .not_blank()
            .one_of(&["M", "F"], Some("must be 'M' or 'F'"))
            .validate()?;

        let ethnicities: Vec<&str> = Ethnicity::ALL.iter().map(|e| e.as_str()).collect();
        ValidationBuilder::new("ethnicity", optional_text(&self.ethnicity))
            .one_of(&ethnicities, None)
            .validate()?;

        let blood_groups: Vec<&str> = BloodGroup::ALL.iter().map(|g| g.as_str()).collect();
        ValidationBuilder::new("blood_group", optional_text(&self.blood_group))
            .one_of(&blood_groups, None)
            .validate()?;

        ValidationBuilder::new("nic_number", optional_text(&self.nic_number))
            .max_length(NIC_MAX_LENGTH)
            .validate()?;

        for (field, value) in [
            ("common_name", &self.common_name),
            ("occupation", &self.occupation),
            ("guardian_name_1", &self.guardian_name_1),
            ("guardian_name_2", &self.guardian_name_2),
        ] {
            ValidationBuilder::new(field, optional_text(value))
                .max_length(NAME_MAX_LENGTH)
                .validate()?;
        }

        for (field, value) in [
            ("contact_number", &self.contact_number),
            ("guardian_contact_number_1", &self.guardian_contact_number_1),
            ("guardian_contact_number_2", &self.guardian_contact_number_2),
        ] {
            ValidationBuilder::new(field, optional_text(value))
                .max_length(CONTACT_NUMBER_MAX_LENGTH)
                .validate()?;
        }

        ValidationBuilder::new("email", optional_text(&self.email))
            .email()
            .validate()?;

        ValidationBuilder::new("transfusion_regimen", optional_text(&self.transfusion_regimen))
            .max_length(TRANSFUSION_REGIMEN_MAX_LENGTH)
            .validate()?;

        ValidationBuilder::new("hb_level_at_diagnosis", self.hb_level_at_diagnosis)
            .digits(4, 1)
            .validate()?;

        Ok(())
    }
}

/// ClientRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: String,
    pub registration_number: String,
    pub full_name: String,
    pub common_name: Option<String>,
    pub gender: String,
    pub ethnicity: Option<String>,
    pub date_of_birth: Option<String>,
    pub blood_group: Option<String>,
    pub nic_number: Option<String>,
    pub date_of_registration: Option<String>,
    pub unit_id: Option<String>,
    pub diagnosis_id: Option<String>,
    pub marital_status_id: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub ds_division_id: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub guardian_name_1: Option<String>,
    pub guardian_contact_number_1: Option<String>,
    pub guardian_name_2: Option<String>,
    pub guardian_contact_number_2: Option<String>,
    pub diagnosis_date: Option<String>,
    pub hb_level_at_diagnosis: Option<String>,
    pub date_first_transfused: Option<String>,
    pub date_iron_chelation_started: Option<String>,
    pub transfusion_regimen: Option<String>,
    pub allergic_history: Option<String>,
    pub special_note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ClientRow {
    pub fn into_entity(self) -> DomainResult<Client> {
        let gender = Gender::from_str(&self.gender)
            .ok_or_else(|| ValidationError::invalid_value("gender", &format!("unknown gender '{}'", self.gender)))?;
        let ethnicity = match self.ethnicity.as_deref() {
            Some(value) => Some(Ethnicity::from_str(value).ok_or_else(|| {
                ValidationError::invalid_value("ethnicity", &format!("unknown ethnicity '{}'", value))
            })?),
            None => None,
        };
        let blood_group = match self.blood_group.as_deref() {
            Some(value) => Some(BloodGroup::from_str(value).ok_or_else(|| {
                ValidationError::invalid_value("blood_group", &format!("unknown blood group '{}'", value))
            })?),
            None => None,
        };

        Ok(Client {
            id: parse_uuid(&self.id, "id")?,
            registration_number: self.registration_number,
            full_name: self.full_name,
            common_name: self.common_name,
            gender,
            ethnicity,
            date_of_birth: parse_opt_date(self.date_of_birth.as_deref(), "date_of_birth")?,
            blood_group,
            nic_number: self.nic_number,
            date_of_registration: parse_opt_date(self.date_of_registration.as_deref(), "date_of_registration")?,
            unit_id: parse_opt_uuid(self.unit_id.as_deref(), "unit_id")?,
            diagnosis_id: parse_opt_uuid(self.diagnosis_id.as_deref(), "diagnosis_id")?,
            marital_status_id: parse_opt_uuid(self.marital_status_id.as_deref(), "marital_status_id")?,
            occupation: self.occupation,
            address: self.address,
            ds_division_id: parse_opt_uuid(self.ds_division_id.as_deref(), "ds_division_id")?,
            contact_number: self.contact_number,
            email: self.email,
            guardian_name_1: self.guardian_name_1,
            guardian_contact_number_1: self.guardian_contact_number_1,
            guardian_name_2: self.guardian_name_2,
            guardian_contact_number_2: self.guardian_contact_number_2,
            diagnosis_date: parse_opt_date(self.diagnosis_date.as_deref(), "diagnosis_date")?,
            hb_level_at_diagnosis: parse_opt_decimal(self.hb_level_at_diagnosis.as_deref(), "hb_level_at_diagnosis")?,
            date_first_transfused: parse_opt_date(self.date_first_transfused.as_deref(), "date_first_transfused")?,
            date_iron_chelation_started: parse_opt_date(
                self.date_iron_chelation_started.as_deref(),
                "date_iron_chelation_started",
            )?,
            transfusion_regimen: self.transfusion_regimen,
            allergic_history: self.allergic_history,
            special_note: self.special_note,
            created_at: parse_datetime(&self.created_at, "created_at")?,
            updated_at: parse_datetime(&self.updated_at, "updated_at")?,
        })
    }
}

// --- Death record ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDeath {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date_of_death: NaiveDate,
    pub cause_of_death: Option<String>,
    pub postmortem_findings: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClientDeath {
    pub date_of_death: NaiveDate,
    pub cause_of_death: Option<String>,
    pub postmortem_findings: Option<String>,
    pub notes: Option<String>,
}

impl Validate for NewClientDeath {
    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientDeathRow {
    pub id: String,
    pub client_id: String,
    pub date_of_death: String,
    pub cause_of_death: Option<String>,
    pub postmortem_findings: Option<String>,
    pub notes: Option<String>,
}

impl ClientDeathRow {
    pub fn into_entity(self) -> DomainResult<ClientDeath> {
        Ok(ClientDeath {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            date_of_death: parse_date(&self.date_of_death, "date_of_death")?,
            cause_of_death: self.cause_of_death,
            postmortem_findings: self.postmortem_findings,
            notes: self.notes,
        })
    }
}

// --- Transfer record ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTransfer {
    pub id: Uuid,
    pub client_id: Uuid,
    pub transferred_unit_id: Option<Uuid>,
    pub date_of_transfer: Option<NaiveDate>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClientTransfer {
    pub transferred_unit_id: Option<Uuid>,
    pub date_of_transfer: Option<NaiveDate>,
    pub reason: Option<String>,
}

impl Validate for NewClientTransfer {
    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientTransferRow {
    pub id: String,
    pub client_id: String,
    pub transferred_unit_id: Option<String>,
    pub date_of_transfer: Option<String>,
    pub reason: Option<String>,
}

impl ClientTransferRow {
    pub fn into_entity(self) -> DomainResult<ClientTransfer> {
        Ok(ClientTransfer {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            transferred_unit_id: parse_opt_uuid(self.transferred_unit_id.as_deref(), "transferred_unit_id")?,
            date_of_transfer: parse_opt_date(self.date_of_transfer.as_deref(), "date_of_transfer")?,
            reason: self.reason,
        })
    }
}

// --- Family members ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub client_id: Uuid,
    pub relationship: Relationship,
    pub name: String,
    pub birth_day: Option<NaiveDate>,
    pub diagnosis_id: Option<Uuid>,
    /// Registration number of the relative when they are a patient too
    pub linked_registration_number: Option<String>,
    pub is_carrier: bool,
    pub contact_number: Option<String>,
}

impl fmt::Display for FamilyMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.relationship.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFamilyMember {
    #[serde(default)]
    pub relationship: Relationship,
    pub name: String,
    pub birth_day: Option<NaiveDate>,
    pub diagnosis_id: Option<Uuid>,
    pub linked_registration_number: Option<String>,
    #[serde(default)]
    pub is_carrier: bool,
    pub contact_number: Option<String>,
}

impl Validate for NewFamilyMember {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .not_blank()
            .max_length(NAME_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("linked_registration_number", optional_text(&self.linked_registration_number))
            .max_length(LINKED_REGISTRATION_MAX_LENGTH)
            .validate()?;
        ValidationBuilder::new("contact_number", optional_text(&self.contact_number))
            .max_length(CONTACT_NUMBER_MAX_LENGTH)
            .validate()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FamilyMemberRow {
    pub id: String,
    pub client_id: String,
    pub relationship: String,
    pub name: String,
    pub birth_day: Option<String>,
    pub diagnosis_id: Option<String>,
    pub linked_registration_number: Option<String>,
    pub is_carrier: bool,
    pub contact_number: Option<String>,
}

impl FamilyMemberRow {
    pub fn into_entity(self) -> DomainResult<FamilyMember> {
        let relationship = Relationship::from_str(&self.relationship).ok_or_else(|| {
            ValidationError::invalid_value("relationship", &format!("unknown relationship '{}'", self.relationship))
        })?;
        Ok(FamilyMember {
            id: parse_uuid(&self.id, "id")?,
            client_id: parse_uuid(&self.client_id, "client_id")?,
            relationship,
            name: self.name,
            birth_day: parse_opt_date(self.birth_day.as_deref(), "birth_day")?,
            diagnosis_id: parse_opt_uuid(self.diagnosis_id.as_deref(), "diagnosis_id")?,
            linked_registration_number: self.linked_registration_number,
            is_carrier: self.is_carrier,
            contact_number: self.contact_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn john_silva() -> NewClient {
        NewClient::new("T-525", "John Silva", Gender::Male)
    }

    #[test]
    fn test_valid_client() {
        let mut client = john_silva();
        client.blood_group = Some("AB+".to_string());
        client.email = Some("john.silva@example.com".to_string());
        client.hb_level_at_diagnosis = Some(dec!(6.4));
        assert!(client.validate().is_ok());
        assert_eq!(client.parsed_ethnicity(), Some(Ethnicity::Sinhalese));
        assert_eq!(client.parsed_blood_group(), Some(BloodGroup::AbPositive));
    }

    #[test]
    fn test_blank_full_name_rejected() {
        let mut client = john_silva();
        client.full_name = "   ".to_string();
        let err = client.validate().unwrap_err();
        assert_eq!(err.validation().and_then(|v| v.field()), Some("full_name"));
    }

    #[test]
    fn test_gender_must_be_known() {
        let mut client = john_silva();
        client.gender = "X".to_string();
        let err = client.validate().unwrap_err();
        assert_eq!(err.validation().and_then(|v| v.field()), Some("gender"));

        client.gender = String::new();
        assert!(client.validate().is_err());
    }

    #[test]
    fn test_blank_optional_fields_are_ignored() {
        let mut client = john_silva();
        client.email = Some("  ".to_string());
        client.blood_group = Some(String::new());
        client.nic_number = Some(" ".to_string());
        assert!(client.validate().is_ok());

        client.email = Some("not-an-email".to_string());
        assert!(client.validate().is_err());
    }

    #[test]
    fn test_client_display() {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            registration_number: "T-525".to_string(),
            full_name: "John Silva".to_string(),
            common_name: None,
            gender: Gender::Male,
            ethnicity: Some(Ethnicity::Sinhalese),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
            blood_group: None,
            nic_number: None,
            date_of_registration: None,
            unit_id: None,
            diagnosis_id: None,
            marital_status_id: None,
            occupation: None,
            address: None,
            ds_division_id: None,
            contact_number: None,
            email: None,
            guardian_name_1: None,
            guardian_contact_number_1: None,
            guardian_name_2: None,
            guardian_contact_number_2: None,
            diagnosis_date: None,
            hb_level_at_diagnosis: None,
            date_first_transfused: None,
            date_iron_chelation_started: None,
            transfusion_regimen: None,
            allergic_history: None,
            special_note: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(client.to_string(), "T-525 : John Silva");
        assert_eq!(client.age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), Some(34));
        assert_eq!(client.age_on(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()), Some(33));
        assert_eq!(
            client.age_string_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).as_deref(),
            Some("34 years, 0 months, and 0 days")
        );
    }

    #[test]
    fn test_family_member_defaults() {
        let member = NewFamilyMember { name: "Nimal Silva".to_string(), ..Default::default() };
        assert_eq!(member.relationship, Relationship::Other);
        assert!(!member.is_carrier);
        assert!(member.validate().is_ok());

        let long_link = NewFamilyMember {
            name: "Nimal Silva".to_string(),
            linked_registration_number: Some("T-0000000000000000000001".to_string()),
            ..Default::default()
        };
        assert!(long_link.validate().is_err());
    }
}
