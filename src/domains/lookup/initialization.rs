use crate::domains::lookup::repository::LookupRepository;
use crate::domains::lookup::types::{
    ChoiceCategory, NewChoice, NewDiagnosisType, NewDistrict, NewDsDivision, NewProvince,
    NewThalassemiaUnit,
};
use crate::errors::DomainResult;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Standard choices, grouped by category
pub fn standard_choices() -> Vec<(ChoiceCategory, &'static str)> {
    use ChoiceCategory::*;
    vec![
        (ClinicType, "Endocrine Clinic"),
        (ClinicType, "STD Clinic"),
        (ClinicType, "Obstetrics Clinic"),
        (MaritalStatus, "Single"),
        (MaritalStatus, "Married"),
        (CurrentStatus, "Alive"),
        (CurrentStatus, "Transferred"),
        (CurrentStatus, "Deceased"),
        (ComplicationStatus, "Diabetes Mellitus"),
        (ComplicationStatus, "Hypothyroidism"),
        (ComplicationStatus, "CKD"),
        (VaccineName, "Hepatitis B"),
        (VaccineName, "HIB"),
        (SpecialBloodType, "Washed Blood"),
        (SpecialBloodType, "Irradiated Blood"),
        (Growth, "Normal Growth"),
        (Growth, "Poor Growth"),
    ]
}

pub const SEED_PROVINCE: &str = "North Western Province";

/// District name with its DS divisions
pub fn seed_districts() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        (
            "Kurunegala",
            vec!["Kurunegala", "Mawathagama", "Polpithigama", "Wariyapola", "Nikaweratiya"],
        ),
        (
            "Puttalam",
            vec!["Puttalam", "Chilaw", "Wennappuwa", "Mundalama", "Anamaduwa"],
        ),
    ]
}

/// (name, description, DS division name)
pub fn seed_units() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("National Thalassaemia Centre", "Kurunegala district unit", "Kurunegala"),
        ("Ragama Thalassaemia Centre", "Ragama hospital unit", "Gampaha"),
        ("Anunradhapura Treatment Unit", "Anuradhapura district unit", "Anuradhapura"),
    ]
}

pub fn standard_diagnosis_types() -> Vec<NewDiagnosisType> {
    [
        ("Beta Thalassemia Major", "Severe form of thalassaemia", "D56.1"),
        ("Beta Thalassemia Trait", "Carrier state", "D56.3"),
        ("HbE Beta Thalassemia", "Compound heterozygous condition", "D56.4"),
    ]
    .into_iter()
    .map(|(name, description, icd_code)| NewDiagnosisType {
        name: name.to_string(),
        description: Some(description.to_string()),
        icd_code: Some(icd_code.to_string()),
    })
    .collect()
}

/// What a seeding run created. Rows that already existed are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub choices_created: usize,
    pub provinces_created: usize,
    pub districts_created: usize,
    pub ds_divisions_created: usize,
    pub units_created: usize,
    pub diagnosis_types_created: usize,
    /// Units created without a DS division because the named division is not on record
    pub units_without_division: Vec<String>,
}

impl SeedReport {
    pub fn total_created(&self) -> usize {
        self.choices_created
            + self.provinces_created
            + self.districts_created
            + self.ds_divisions_created
            + self.units_created
            + self.diagnosis_types_created
    }
}

/// Load the standard lookup data. Safe to run repeatedly.
pub async fn seed_lookups(repo: &dyn LookupRepository) -> DomainResult<SeedReport> {
    let mut report = SeedReport::default();

    for (category, name) in standard_choices() {
        if repo.find_choice_by_name(category, name).await?.is_none() {
            repo.create_choice(&NewChoice { category, name: name.to_string() }).await?;
            report.choices_created += 1;
        }
    }
    info!("Choices seeded ({} new)", report.choices_created);

    let province = match repo.find_province_by_name(SEED_PROVINCE).await? {
        Some(province) => province,
        None => {
            report.provinces_created += 1;
            repo.create_province(&NewProvince { name: SEED_PROVINCE.to_string() }).await?
        }
    };

    for (district_name, divisions) in seed_districts() {
        let district = match repo.find_district_by_name(district_name).await? {
            Some(district) => district,
            None => {
                report.districts_created += 1;
                repo.create_district(&NewDistrict {
                    name: district_name.to_string(),
                    province_id: province.id,
                })
                .await?
            }
        };

        for division_name in divisions {
            if repo.find_ds_division_by_name(division_name).await?.is_none() {
                repo.create_ds_division(&NewDsDivision {
                    name: division_name.to_string(),
                    district_id: district.id,
                })
                .await?;
                report.ds_divisions_created += 1;
            }
        }
    }
    info!(
        "Geography seeded ({} districts, {} DS divisions new)",
        report.districts_created, report.ds_divisions_created
    );

    for (name, description, division_name) in seed_units() {
        if repo.find_unit_by_name(name).await?.is_some() {
            continue;
        }
        let division = repo.find_ds_division_by_name(division_name).await?;
        if division.is_none() {
            warn!(
                "DS division '{}' not found, creating unit '{}' without a division",
                division_name, name
            );
            report.units_without_division.push(name.to_string());
        }
        repo.create_unit(&NewThalassemiaUnit {
            name: name.to_string(),
            description: Some(description.to_string()),
            ds_division_id: division.map(|d| d.id),
        })
        .await?;
        report.units_created += 1;
    }

    for diagnosis_type in standard_diagnosis_types() {
        if repo.find_diagnosis_type_by_name(&diagnosis_type.name).await?.is_none() {
            repo.create_diagnosis_type(&diagnosis_type).await?;
            report.diagnosis_types_created += 1;
        }
    }

    info!("Lookup seeding finished, {} rows created", report.total_created());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::lookup::repository::SqliteLookupRepository;
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let repo = SqliteLookupRepository::new(migrated_pool().await);

        let first = seed_lookups(&repo).await.unwrap();
        assert_eq!(first.choices_created, 17);
        assert_eq!(first.provinces_created, 1);
        assert_eq!(first.districts_created, 2);
        assert_eq!(first.ds_divisions_created, 10);
        assert_eq!(first.units_created, 3);
        assert_eq!(first.diagnosis_types_created, 3);

        let second = seed_lookups(&repo).await.unwrap();
        assert_eq!(second.total_created(), 0);
        assert_eq!(repo.list_choices(None).await.unwrap().len(), 17);
    }

    #[tokio::test]
    async fn test_units_with_unknown_division_are_detached() {
        let repo = SqliteLookupRepository::new(migrated_pool().await);
        let report = seed_lookups(&repo).await.unwrap();

        assert_eq!(
            report.units_without_division,
            vec!["Ragama Thalassaemia Centre".to_string(), "Anunradhapura Treatment Unit".to_string()]
        );

        let national = repo
            .find_unit_by_name("National Thalassaemia Centre")
            .await
            .unwrap()
            .unwrap();
        let kurunegala = repo.find_ds_division_by_name("Kurunegala").await.unwrap().unwrap();
        assert_eq!(national.ds_division_id, Some(kurunegala.id));

        let ragama = repo.find_unit_by_name("Ragama Thalassaemia Centre").await.unwrap().unwrap();
        assert_eq!(ragama.ds_division_id, None);
    }
}
