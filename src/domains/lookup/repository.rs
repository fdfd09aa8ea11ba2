use crate::domains::core::dependency_checker::ReferentialGraph;
use crate::domains::core::repository::{ensure_exists, fetch_row_by_id, finish_tx};
use crate::domains::lookup::types::{
    Choice, ChoiceCategory, ChoiceRow, DiagnosisType, DiagnosisTypeRow, District, DistrictRow,
    DsDivision, DsDivisionRow, NewChoice, NewDiagnosisType, NewDistrict, NewDsDivision,
    NewProvince, NewThalassemiaUnit, Province, ProvinceRow, ThalassemiaUnit, ThalassemiaUnitRow,
};
use crate::errors::{DbError, DomainError, DomainResult, ValidationError};
use crate::types::EntityKind;
use crate::utils::{blank_to_none, opt_uuid_to_sql};
use crate::validation::{validate_entity_exists, validate_unique, Validate};
use async_trait::async_trait;
use log::{debug, info};
use sqlx::{query, query_as, query_scalar, Pool, Sqlite, Transaction};
use uuid::Uuid;

const CHOICE_COLUMNS: &str = "id, category, name";
const PROVINCE_COLUMNS: &str = "id, name";
const DISTRICT_COLUMNS: &str = "id, name, province_id";
const DS_DIVISION_COLUMNS: &str = "id, name, district_id";
const UNIT_COLUMNS: &str = "id, name, description, ds_division_id";
const DIAGNOSIS_TYPE_COLUMNS: &str = "id, name, description, icd_code";

/// Master lists shared by every patient record: scoped choices, geography,
/// treatment units and diagnosis types.
#[async_trait]
pub trait LookupRepository: Send + Sync {
    async fn create_choice(&self, new_choice: &NewChoice) -> DomainResult<Choice>;
    async fn update_choice(&self, id: Uuid, update: &NewChoice) -> DomainResult<Choice>;
    async fn find_choice(&self, id: Uuid) -> DomainResult<Choice>;
    /// Choices ordered by category then name, optionally restricted to one category
    async fn list_choices(&self, category: Option<ChoiceCategory>) -> DomainResult<Vec<Choice>>;
    async fn find_choice_by_name(&self, category: ChoiceCategory, name: &str) -> DomainResult<Option<Choice>>;

    async fn create_province(&self, new_province: &NewProvince) -> DomainResult<Province>;
    async fn update_province(&self, id: Uuid, update: &NewProvince) -> DomainResult<Province>;
    async fn find_province(&self, id: Uuid) -> DomainResult<Province>;
    async fn list_provinces(&self) -> DomainResult<Vec<Province>>;
    async fn find_province_by_name(&self, name: &str) -> DomainResult<Option<Province>>;

    async fn create_district(&self, new_district: &NewDistrict) -> DomainResult<District>;
    async fn update_district(&self, id: Uuid, update: &NewDistrict) -> DomainResult<District>;
    async fn find_district(&self, id: Uuid) -> DomainResult<District>;
    async fn list_districts(&self, province_id: Option<Uuid>) -> DomainResult<Vec<District>>;
    async fn find_district_by_name(&self, name: &str) -> DomainResult<Option<District>>;

    async fn create_ds_division(&self, new_division: &NewDsDivision) -> DomainResult<DsDivision>;
    async fn update_ds_division(&self, id: Uuid, update: &NewDsDivision) -> DomainResult<DsDivision>;
    async fn find_ds_division(&self, id: Uuid) -> DomainResult<DsDivision>;
    async fn list_ds_divisions(&self, district_id: Option<Uuid>) -> DomainResult<Vec<DsDivision>>;
    async fn find_ds_division_by_name(&self, name: &str) -> DomainResult<Option<DsDivision>>;

    async fn create_unit(&self, new_unit: &NewThalassemiaUnit) -> DomainResult<ThalassemiaUnit>;
    async fn update_unit(&self, id: Uuid, update: &NewThalassemiaUnit) -> DomainResult<ThalassemiaUnit>;
    async fn find_unit(&self, id: Uuid) -> DomainResult<ThalassemiaUnit>;
    async fn list_units(&self) -> DomainResult<Vec<ThalassemiaUnit>>;
    async fn find_unit_by_name(&self, name: &str) -> DomainResult<Option<ThalassemiaUnit>>;

    async fn create_diagnosis_type(&self, new_type: &NewDiagnosisType) -> DomainResult<DiagnosisType>;
    async fn update_diagnosis_type(&self, id: Uuid, update: &NewDiagnosisType) -> DomainResult<DiagnosisType>;
    async fn find_diagnosis_type(&self, id: Uuid) -> DomainResult<DiagnosisType>;
    async fn list_diagnosis_types(&self) -> DomainResult<Vec<DiagnosisType>>;
    async fn find_diagnosis_type_by_name(&self, name: &str) -> DomainResult<Option<DiagnosisType>>;
}

/// SQLite implementation for LookupRepository
#[derive(Debug, Clone)]
pub struct SqliteLookupRepository {
    pool: Pool<Sqlite>,
}

impl SqliteLookupRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn save_choice_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewChoice,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        input.validate()?;
        let name = input.name.trim();

        match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO choices (id, category, name) VALUES (?, ?, ?)")
                    .bind(id.to_string())
                    .bind(input.category.as_str())
                    .bind(name)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            Some(id) => {
                let current: ChoiceRow =
                    fetch_row_by_id(&mut **tx, EntityKind::Choice, CHOICE_COLUMNS, id).await?;
                if current.category != input.category.as_str() {
                    // Re-tagging a referenced choice would break the category rule of its referrers.
                    let references = ReferentialGraph::registry()
                        .count_references(&mut **tx, EntityKind::Choice, id)
                        .await?;
                    if references > 0 {
                        return Err(DomainError::Validation(ValidationError::invalid_value(
                            "category",
                            &format!("choice is referenced by {} records and cannot change category", references),
                        )));
                    }
                }
                query("UPDATE choices SET category = ?, name = ? WHERE id = ?")
                    .bind(input.category.as_str())
                    .bind(name)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
        }
    }

    async fn save_province_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewProvince,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        if let Some(id) = id {
            ensure_exists(&mut **tx, EntityKind::Province, id).await?;
        }
        input.validate()?;
        let name = input.name.trim();
        validate_unique(&mut **tx, "provinces", "name", name, id, "name").await?;

        let id = match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO provinces (id, name) VALUES (?, ?)")
                    .bind(id.to_string())
                    .bind(name)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
            Some(id) => {
                query("UPDATE provinces SET name = ? WHERE id = ?")
                    .bind(name)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
        };
        Ok(id)
    }

    async fn save_district_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewDistrict,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        if let Some(id) = id {
            ensure_exists(&mut **tx, EntityKind::District, id).await?;
        }
        input.validate()?;
        let name = input.name.trim();
        validate_unique(&mut **tx, "districts", "name", name, id, "name").await?;
        validate_entity_exists(&mut **tx, EntityKind::Province, Some(input.province_id), "province").await?;

        let id = match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO districts (id, name, province_id) VALUES (?, ?, ?)")
                    .bind(id.to_string())
                    .bind(name)
                    .bind(input.province_id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
            Some(id) => {
                query("UPDATE districts SET name = ?, province_id = ? WHERE id = ?")
                    .bind(name)
                    .bind(input.province_id.to_string())
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
        };
        Ok(id)
    }

    async fn save_ds_division_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewDsDivision,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        if let Some(id) = id {
            ensure_exists(&mut **tx, EntityKind::DsDivision, id).await?;
        }
        input.validate()?;
        let name = input.name.trim();
        validate_unique(&mut **tx, "ds_divisions", "name", name, id, "name").await?;
        validate_entity_exists(&mut **tx, EntityKind::District, Some(input.district_id), "district").await?;

        let id = match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO ds_divisions (id, name, district_id) VALUES (?, ?, ?)")
                    .bind(id.to_string())
                    .bind(name)
                    .bind(input.district_id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
            Some(id) => {
                query("UPDATE ds_divisions SET name = ?, district_id = ? WHERE id = ?")
                    .bind(name)
                    .bind(input.district_id.to_string())
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
        };
        Ok(id)
    }

    async fn save_unit_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewThalassemiaUnit,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        if let Some(id) = id {
            ensure_exists(&mut **tx, EntityKind::ThalassemiaUnit, id).await?;
        }
        input.validate()?;
        let name = input.name.trim();
        validate_unique(&mut **tx, "thalassemia_units", "name", name, id, "name").await?;
        validate_entity_exists(&mut **tx, EntityKind::DsDivision, input.ds_division_id, "ds_division").await?;

        let description = blank_to_none(input.description.clone());
        let id = match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO thalassemia_units (id, name, description, ds_division_id) VALUES (?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(name)
                    .bind(description)
                    .bind(opt_uuid_to_sql(input.ds_division_id))
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
            Some(id) => {
                query("UPDATE thalassemia_units SET name = ?, description = ?, ds_division_id = ? WHERE id = ?")
                    .bind(name)
                    .bind(description)
                    .bind(opt_uuid_to_sql(input.ds_division_id))
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
        };
        Ok(id)
    }

    async fn save_diagnosis_type_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewDiagnosisType,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        if let Some(id) = id {
            ensure_exists(&mut **tx, EntityKind::DiagnosisType, id).await?;
        }
        input.validate()?;
        let name = input.name.trim();
        validate_unique(&mut **tx, "diagnosis_types", "name", name, id, "name").await?;

        let description = blank_to_none(input.description.clone());
        let icd_code = blank_to_none(input.icd_code.clone());
        let id = match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO diagnosis_types (id, name, description, icd_code) VALUES (?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(name)
                    .bind(description)
                    .bind(icd_code)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
            Some(id) => {
                query("UPDATE diagnosis_types SET name = ?, description = ?, icd_code = ? WHERE id = ?")
                    .bind(name)
                    .bind(description)
                    .bind(icd_code)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
        };
        Ok(id)
    }
}

#[async_trait]
impl LookupRepository for SqliteLookupRepository {
    async fn create_choice(&self, new_choice: &NewChoice) -> DomainResult<Choice> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_choice_with_tx(None, new_choice, &mut tx).await;
        let id = finish_tx(tx, result, "create choice").await?;
        info!("Created {} choice '{}'", new_choice.category, new_choice.name.trim());
        self.find_choice(id).await
    }

    async fn update_choice(&self, id: Uuid, update: &NewChoice) -> DomainResult<Choice> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_choice_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update choice").await?;
        self.find_choice(id).await
    }

    async fn find_choice(&self, id: Uuid) -> DomainResult<Choice> {
        fetch_row_by_id::<ChoiceRow, _>(&self.pool, EntityKind::Choice, CHOICE_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_choices(&self, category: Option<ChoiceCategory>) -> DomainResult<Vec<Choice>> {
        let rows = match category {
            Some(category) => {
                query_as::<_, ChoiceRow>(
                    "SELECT id, category, name FROM choices WHERE category = ? ORDER BY name ASC",
                )
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, ChoiceRow>("SELECT id, category, name FROM choices ORDER BY category ASC, name ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DbError::from)?;

        rows.into_iter().map(ChoiceRow::into_entity).collect()
    }

    async fn find_choice_by_name(&self, category: ChoiceCategory, name: &str) -> DomainResult<Option<Choice>> {
        let row = query_as::<_, ChoiceRow>(
            "SELECT id, category, name FROM choices WHERE category = ? AND name = ? ORDER BY id LIMIT 1",
        )
        .bind(category.as_str())
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        row.map(ChoiceRow::into_entity).transpose()
    }

    async fn create_province(&self, new_province: &NewProvince) -> DomainResult<Province> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_province_with_tx(None, new_province, &mut tx).await;
        let id = finish_tx(tx, result, "create province").await?;
        info!("Created province '{}'", new_province.name.trim());
        self.find_province(id).await
    }

    async fn update_province(&self, id: Uuid, update: &NewProvince) -> DomainResult<Province> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_province_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update province").await?;
        self.find_province(id).await
    }

    async fn find_province(&self, id: Uuid) -> DomainResult<Province> {
        fetch_row_by_id::<ProvinceRow, _>(&self.pool, EntityKind::Province, PROVINCE_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_provinces(&self) -> DomainResult<Vec<Province>> {
        let rows = query_as::<_, ProvinceRow>("SELECT id, name FROM provinces ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(ProvinceRow::into_entity).collect()
    }

    async fn find_province_by_name(&self, name: &str) -> DomainResult<Option<Province>> {
        let row = query_as::<_, ProvinceRow>("SELECT id, name FROM provinces WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        row.map(ProvinceRow::into_entity).transpose()
    }

    async fn create_district(&self, new_district: &NewDistrict) -> DomainResult<District> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_district_with_tx(None, new_district, &mut tx).await;
        let id = finish_tx(tx, result, "create district").await?;
        info!("Created district '{}'", new_district.name.trim());
        self.find_district(id).await
    }

    async fn update_district(&self, id: Uuid, update: &NewDistrict) -> DomainResult<District> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_district_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update district").await?;
        self.find_district(id).await
    }

    async fn find_district(&self, id: Uuid) -> DomainResult<District> {
        fetch_row_by_id::<DistrictRow, _>(&self.pool, EntityKind::District, DISTRICT_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_districts(&self, province_id: Option<Uuid>) -> DomainResult<Vec<District>> {
        let rows = match province_id {
            Some(province_id) => {
                query_as::<_, DistrictRow>(
                    "SELECT id, name, province_id FROM districts WHERE province_id = ? ORDER BY name ASC",
                )
                .bind(province_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, DistrictRow>("SELECT id, name, province_id FROM districts ORDER BY name ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DbError::from)?;
        rows.into_iter().map(DistrictRow::into_entity).collect()
    }

    async fn find_district_by_name(&self, name: &str) -> DomainResult<Option<District>> {
        let row = query_as::<_, DistrictRow>("SELECT id, name, province_id FROM districts WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        row.map(DistrictRow::into_entity).transpose()
    }

    async fn create_ds_division(&self, new_division: &NewDsDivision) -> DomainResult<DsDivision> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_ds_division_with_tx(None, new_division, &mut tx).await;
        let id = finish_tx(tx, result, "create DS division").await?;
        info!("Created DS division '{}'", new_division.name.trim());
        self.find_ds_division(id).await
    }

    async fn update_ds_division(&self, id: Uuid, update: &NewDsDivision) -> DomainResult<DsDivision> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_ds_division_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update DS division").await?;
        self.find_ds_division(id).await
    }

    async fn find_ds_division(&self, id: Uuid) -> DomainResult<DsDivision> {
        fetch_row_by_id::<DsDivisionRow, _>(&self.pool, EntityKind::DsDivision, DS_DIVISION_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_ds_divisions(&self, district_id: Option<Uuid>) -> DomainResult<Vec<DsDivision>> {
        let rows = match district_id {
            Some(district_id) => {
                query_as::<_, DsDivisionRow>(
                    "SELECT id, name, district_id FROM ds_divisions WHERE district_id = ? ORDER BY name ASC",
                )
                .bind(district_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, DsDivisionRow>("SELECT id, name, district_id FROM ds_divisions ORDER BY name ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DbError::from)?;
        rows.into_iter().map(DsDivisionRow::into_entity).collect()
    }

    async fn find_ds_division_by_name(&self, name: &str) -> DomainResult<Option<DsDivision>> {
        let row = query_as::<_, DsDivisionRow>("SELECT id, name, district_id FROM ds_divisions WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        row.map(DsDivisionRow::into_entity).transpose()
    }

    async fn create_unit(&self, new_unit: &NewThalassemiaUnit) -> DomainResult<ThalassemiaUnit> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_unit_with_tx(None, new_unit, &mut tx).await;
        let id = finish_tx(tx, result, "create thalassaemia unit").await?;
        info!("Created thalassaemia unit '{}'", new_unit.name.trim());
        self.find_unit(id).await
    }

    async fn update_unit(&self, id: Uuid, update: &NewThalassemiaUnit) -> DomainResult<ThalassemiaUnit> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_unit_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update thalassaemia unit").await?;
        self.find_unit(id).await
    }

    async fn find_unit(&self, id: Uuid) -> DomainResult<ThalassemiaUnit> {
        fetch_row_by_id::<ThalassemiaUnitRow, _>(&self.pool, EntityKind::ThalassemiaUnit, UNIT_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_units(&self) -> DomainResult<Vec<ThalassemiaUnit>> {
        let rows = query_as::<_, ThalassemiaUnitRow>(
            "SELECT id, name, description, ds_division_id FROM thalassemia_units ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter().map(ThalassemiaUnitRow::into_entity).collect()
    }

    async fn find_unit_by_name(&self, name: &str) -> DomainResult<Option<ThalassemiaUnit>> {
        let row = query_as::<_, ThalassemiaUnitRow>(
            "SELECT id, name, description, ds_division_id FROM thalassemia_units WHERE name = ?",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        row.map(ThalassemiaUnitRow::into_entity).transpose()
    }

    async fn create_diagnosis_type(&self, new_type: &NewDiagnosisType) -> DomainResult<DiagnosisType> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_diagnosis_type_with_tx(None, new_type, &mut tx).await;
        let id = finish_tx(tx, result, "create diagnosis type").await?;
        info!("Created diagnosis type '{}'", new_type.name.trim());
        self.find_diagnosis_type(id).await
    }

    async fn update_diagnosis_type(&self, id: Uuid, update: &NewDiagnosisType) -> DomainResult<DiagnosisType> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_diagnosis_type_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update diagnosis type").await?;
        self.find_diagnosis_type(id).await
    }

    async fn find_diagnosis_type(&self, id: Uuid) -> DomainResult<DiagnosisType> {
        fetch_row_by_id::<DiagnosisTypeRow, _>(&self.pool, EntityKind::DiagnosisType, DIAGNOSIS_TYPE_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_diagnosis_types(&self) -> DomainResult<Vec<DiagnosisType>> {
        let rows = query_as::<_, DiagnosisTypeRow>(
            "SELECT id, name, description, icd_code FROM diagnosis_types ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter().map(DiagnosisTypeRow::into_entity).collect()
    }

    async fn find_diagnosis_type_by_name(&self, name: &str) -> DomainResult<Option<DiagnosisType>> {
        let row = query_as::<_, DiagnosisTypeRow>(
            "SELECT id, name, description, icd_code FROM diagnosis_types WHERE name = ?",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        row.map(DiagnosisTypeRow::into_entity).transpose()
    }
}

/// Number of choices per category, used by the seed report.
pub async fn count_choices_by_category(pool: &Pool<Sqlite>) -> DomainResult<Vec<(String, i64)>> {
    debug!("Counting choices by category");
    let counts = query_as::<_, (String, i64)>(
        "SELECT category, COUNT(*) FROM choices GROUP BY category ORDER BY category",
    )
    .fetch_all(pool)
    .await
    .map_err(DbError::from)?;
    Ok(counts)
}

/// Total rows in a lookup table.
pub async fn count_rows(pool: &Pool<Sqlite>, kind: EntityKind) -> DomainResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table_name());
    let count = query_scalar::<_, i64>(&sql)
        .fetch_one(pool)
        .await
        .map_err(DbError::from)?;
    Ok(count)
}
