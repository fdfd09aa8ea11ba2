use crate::domains::clinical::types::{
    ClinicVisit, ClinicVisitRow, Complication, ComplicationRow, ComplicationType, ComplicationTypeRow,
    GrowthRecord, GrowthRecordRow, Investigation, InvestigationRow, InvestigationType, InvestigationTypeRow,
    NewClinicVisit, NewComplication, NewComplicationType, NewGrowthRecord, NewInvestigation,
    NewInvestigationType, NewVaccination, Vaccination, VaccinationRow,
};
use crate::domains::core::repository::{ensure_exists, fetch_row_by_id, finish_tx, ChildWrite};
use crate::domains::lookup::types::ChoiceCategory;
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::EntityKind;
use crate::utils::{blank_to_none, date_to_sql, opt_date_to_sql, opt_decimal_to_sql, opt_uuid_to_sql};
use crate::validation::{validate_choice_category, validate_entity_exists, validate_unique, Validate};
use async_trait::async_trait;
use log::{debug, info};
use sqlx::{query, query_as, Pool, Sqlite, Transaction};
use uuid::Uuid;

const COMPLICATION_TYPE_COLUMNS: &str = "id, name, description";
const COMPLICATION_COLUMNS: &str = "id, client_id, complication_type_id, detected_date, status_id, remarks";
const VACCINATION_COLUMNS: &str = "id, client_id, vaccine_name_id, date_given, next_dose_date";
const INVESTIGATION_TYPE_COLUMNS: &str = "id, name, description, unit";
const GROWTH_COLUMNS: &str = "id, client_id, date_measured, type_id, value, percentile";
const CLINIC_VISIT_COLUMNS: &str = "id, client_id, date_visit, problem, clinic_type_id, action, referral, next_visit_date, doctor_name, follow_up_needed";

/// Investigations joined with their type, so the type name and unit come back with each result.
const INVESTIGATION_SELECT: &str = "SELECT i.id, i.client_id, i.date_done, i.investigation_type_id, i.value, i.unit, \
     i.laboratory_name, t.name AS type_name, t.unit AS type_unit \
     FROM investigations i LEFT JOIN investigation_types t ON t.id = i.investigation_type_id";

/// A client's clinical history outside admissions: complications, vaccinations,
/// investigations, growth and clinic visits, plus the master lists they use.
#[async_trait]
pub trait ClinicalRepository: Send + Sync {
    async fn create_complication_type(&self, new_type: &NewComplicationType) -> DomainResult<ComplicationType>;
    async fn update_complication_type(&self, id: Uuid, update: &NewComplicationType) -> DomainResult<ComplicationType>;
    async fn find_complication_type(&self, id: Uuid) -> DomainResult<ComplicationType>;
    async fn list_complication_types(&self) -> DomainResult<Vec<ComplicationType>>;

    async fn create_complication(&self, client_id: Uuid, input: &NewComplication) -> DomainResult<Complication>;
    async fn update_complication(&self, id: Uuid, input: &NewComplication) -> DomainResult<Complication>;
    async fn find_complication(&self, id: Uuid) -> DomainResult<Complication>;
    async fn list_complications_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Complication>>;

    async fn create_vaccination(&self, client_id: Uuid, input: &NewVaccination) -> DomainResult<Vaccination>;
    async fn update_vaccination(&self, id: Uuid, input: &NewVaccination) -> DomainResult<Vaccination>;
    async fn find_vaccination(&self, id: Uuid) -> DomainResult<Vaccination>;
    async fn list_vaccinations_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Vaccination>>;

    async fn create_investigation_type(&self, new_type: &NewInvestigationType) -> DomainResult<InvestigationType>;
    async fn update_investigation_type(&self, id: Uuid, update: &NewInvestigationType) -> DomainResult<InvestigationType>;
    async fn find_investigation_type(&self, id: Uuid) -> DomainResult<InvestigationType>;
    async fn list_investigation_types(&self) -> DomainResult<Vec<InvestigationType>>;

    async fn create_investigation(&self, client_id: Uuid, input: &NewInvestigation) -> DomainResult<Investigation>;
    async fn update_investigation(&self, id: Uuid, input: &NewInvestigation) -> DomainResult<Investigation>;
    async fn find_investigation(&self, id: Uuid) -> DomainResult<Investigation>;
    /// Ordered by investigation type name, then newest first within a type
    async fn list_investigations_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Investigation>>;

    async fn create_growth_record(&self, client_id: Uuid, input: &NewGrowthRecord) -> DomainResult<GrowthRecord>;
    async fn update_growth_record(&self, id: Uuid, input: &NewGrowthRecord) -> DomainResult<GrowthRecord>;
    async fn find_growth_record(&self, id: Uuid) -> DomainResult<GrowthRecord>;
    async fn list_growth_records_for_client(&self, client_id: Uuid) -> DomainResult<Vec<GrowthRecord>>;

    async fn create_clinic_visit(&self, client_id: Uuid, input: &NewClinicVisit) -> DomainResult<ClinicVisit>;
    async fn update_clinic_visit(&self, id: Uuid, input: &NewClinicVisit) -> DomainResult<ClinicVisit>;
    async fn find_clinic_visit(&self, id: Uuid) -> DomainResult<ClinicVisit>;
    async fn list_clinic_visits_for_client(&self, client_id: Uuid) -> DomainResult<Vec<ClinicVisit>>;
}

/// SQLite implementation for ClinicalRepository
#[derive(Debug, Clone)]
pub struct SqliteClinicalRepository {
    pool: Pool<Sqlite>,
}

impl SqliteClinicalRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn save_complication_type_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewComplicationType,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        if let Some(id) = id {
            ensure_exists(&mut **tx, EntityKind::ComplicationType, id).await?;
        }
        input.validate()?;
        let name = input.name.trim();
        validate_unique(&mut **tx, "complication_types", "name", name, id, "name").await?;
        let description = blank_to_none(input.description.clone());

        let id = match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO complication_types (id, name, description) VALUES (?, ?, ?)")
                    .bind(id.to_string())
                    .bind(name)
                    .bind(description)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
            Some(id) => {
                query("UPDATE complication_types SET name = ?, description = ? WHERE id = ?")
                    .bind(name)
                    .bind(description)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
        };
        Ok(id)
    }

    async fn save_complication_with_tx<'t>(
        &self,
        target: ChildWrite,
        input: &NewComplication,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        target
            .ensure_target(&mut **tx, EntityKind::Client, EntityKind::Complication)
            .await?;
        validate_entity_exists(
            &mut **tx,
            EntityKind::ComplicationType,
            input.complication_type_id,
            "complication_type",
        )
        .await?;
        validate_choice_category(&mut **tx, input.status_id, ChoiceCategory::ComplicationStatus, "status").await?;
        let remarks = blank_to_none(input.remarks.clone());

        match target {
            ChildWrite::Create { parent_id } => {
                let id = Uuid::new_v4();
                query("INSERT INTO complications (id, client_id, complication_type_id, detected_date, status_id, remarks) VALUES (?, ?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(parent_id.to_string())
                    .bind(opt_uuid_to_sql(input.complication_type_id))
                    .bind(date_to_sql(input.detected_date))
                    .bind(opt_uuid_to_sql(input.status_id))
                    .bind(remarks)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            ChildWrite::Update(id) => {
                query("UPDATE complications SET complication_type_id = ?, detected_date = ?, status_id = ?, remarks = ? WHERE id = ?")
                    .bind(opt_uuid_to_sql(input.complication_type_id))
                    .bind(date_to_sql(input.detected_date))
                    .bind(opt_uuid_to_sql(input.status_id))
                    .bind(remarks)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
        }
    }

    async fn save_vaccination_with_tx<'t>(
        &self,
        target: ChildWrite,
        input: &NewVaccination,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        target
            .ensure_target(&mut **tx, EntityKind::Client, EntityKind::Vaccination)
            .await?;
        input.validate()?;
        validate_choice_category(&mut **tx, input.vaccine_name_id, ChoiceCategory::VaccineName, "vaccine_name").await?;

        match target {
            ChildWrite::Create { parent_id } => {
                let id = Uuid::new_v4();
                query("INSERT INTO vaccinations (id, client_id, vaccine_name_id, date_given, next_dose_date) VALUES (?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(parent_id.to_string())
                    .bind(opt_uuid_to_sql(input.vaccine_name_id))
                    .bind(date_to_sql(input.date_given))
                    .bind(opt_date_to_sql(input.next_dose_date))
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            ChildWrite::Update(id) => {
                query("UPDATE vaccinations SET vaccine_name_id = ?, date_given = ?, next_dose_date = ? WHERE id = ?")
                    .bind(opt_uuid_to_sql(input.vaccine_name_id))
                    .bind(date_to_sql(input.date_given))
                    .bind(opt_date_to_sql(input.next_dose_date))
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
        }
    }

    async fn save_investigation_type_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewInvestigationType,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        if let Some(id) = id {
            ensure_exists(&mut **tx, EntityKind::InvestigationType, id).await?;
        }
        input.validate()?;
        let name = input.name.trim();
        validate_unique(&mut **tx, "investigation_types", "name", name, id, "name").await?;
        let description = blank_to_none(input.description.clone());
        let unit = blank_to_none(input.unit.clone());

        let id = match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO investigation_types (id, name, description, unit) VALUES (?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(name)
                    .bind(description)
                    .bind(unit)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
            Some(id) => {
                query("UPDATE investigation_types SET name = ?, description = ?, unit = ? WHERE id = ?")
                    .bind(name)
                    .bind(description)
                    .bind(unit)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
        };
        Ok(id)
    }

    async fn save_investigation_with_tx<'t>(
        &self,
        target: ChildWrite,
        input: &NewInvestigation,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        target
            .ensure_target(&mut **tx, EntityKind::Client, EntityKind::Investigation)
            .await?;
        input.validate()?;
        validate_entity_exists(
            &mut **tx,
            EntityKind::InvestigationType,
            input.investigation_type_id,
            "investigation_type",
        )
        .await?;
        let value = blank_to_none(input.value.clone());
        let unit = blank_to_none(input.unit.clone());
        let laboratory_name = blank_to_none(input.laboratory_name.clone());

        match target {
            ChildWrite::Create { parent_id } => {
                let id = Uuid::new_v4();
                query("INSERT INTO investigations (id, client_id, date_done, investigation_type_id, value, unit, laboratory_name) VALUES (?, ?, ?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(parent_id.to_string())
                    .bind(date_to_sql(input.date_done))
                    .bind(opt_uuid_to_sql(input.investigation_type_id))
                    .bind(value)
                    .bind(unit)
                    .bind(laboratory_name)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            ChildWrite::Update(id) => {
                query("UPDATE investigations SET date_done = ?, investigation_type_id = ?, value = ?, unit = ?, laboratory_name = ? WHERE id = ?")
                    .bind(date_to_sql(input.date_done))
                    .bind(opt_uuid_to_sql(input.investigation_type_id))
                    .bind(value)
                    .bind(unit)
                    .bind(laboratory_name)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
        }
    }

    async fn save_growth_record_with_tx<'t>(
        &self,
        target: ChildWrite,
        input: &NewGrowthRecord,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        target
            .ensure_target(&mut **tx, EntityKind::Client, EntityKind::GrowthRecord)
            .await?;
        input.validate()?;
        validate_choice_category(&mut **tx, input.growth_type_id, ChoiceCategory::Growth, "growth_type").await?;

        match target {
            ChildWrite::Create { parent_id } => {
                let id = Uuid::new_v4();
                query("INSERT INTO growth_records (id, client_id, date_measured, type_id, value, percentile) VALUES (?, ?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(parent_id.to_string())
                    .bind(date_to_sql(input.date_measured))
                    .bind(opt_uuid_to_sql(input.growth_type_id))
                    .bind(input.value.to_string())
                    .bind(opt_decimal_to_sql(input.percentile))
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            ChildWrite::Update(id) => {
                query("UPDATE growth_records SET date_measured = ?, type_id = ?, value = ?, percentile = ? WHERE id = ?")
                    .bind(date_to_sql(input.date_measured))
                    .bind(opt_uuid_to_sql(input.growth_type_id))
                    .bind(input.value.to_string())
                    .bind(opt_decimal_to_sql(input.percentile))
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
        }
    }

    async fn save_clinic_visit_with_tx<'t>(
        &self,
        target: ChildWrite,
        input: &NewClinicVisit,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        target
            .ensure_target(&mut **tx, EntityKind::Client, EntityKind::ClinicVisit)
            .await?;
        input.validate()?;
        validate_choice_category(&mut **tx, input.clinic_type_id, ChoiceCategory::ClinicType, "clinic_type").await?;
        let problem = blank_to_none(input.problem.clone());
        let action = blank_to_none(input.action.clone());
        let referral = blank_to_none(input.referral.clone());
        let doctor_name = blank_to_none(input.doctor_name.clone());

        match target {
            ChildWrite::Create { parent_id } => {
                let id = Uuid::new_v4();
                query("INSERT INTO clinic_visits (id, client_id, date_visit, problem, clinic_type_id, action, referral, next_visit_date, doctor_name, follow_up_needed) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(parent_id.to_string())
                    .bind(date_to_sql(input.date_visit))
                    .bind(problem)
                    .bind(opt_uuid_to_sql(input.clinic_type_id))
                    .bind(action)
                    .bind(referral)
                    .bind(opt_date_to_sql(input.next_visit_date))
                    .bind(doctor_name)
                    .bind(input.follow_up_needed)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            ChildWrite::Update(id) => {
                query("UPDATE clinic_visits SET date_visit = ?, problem = ?, clinic_type_id = ?, action = ?, referral = ?, next_visit_date = ?, doctor_name = ?, follow_up_needed = ? WHERE id = ?")
                    .bind(date_to_sql(input.date_visit))
                    .bind(problem)
                    .bind(opt_uuid_to_sql(input.clinic_type_id))
                    .bind(action)
                    .bind(referral)
                    .bind(opt_date_to_sql(input.next_visit_date))
                    .bind(doctor_name)
                    .bind(input.follow_up_needed)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
        }
    }

    /// Rows of a client-owned table, newest first by `date_column`.
    async fn list_for_client<R>(&self, table: &str, columns: &str, date_column: &str, client_id: Uuid) -> DomainResult<Vec<R>>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT {} FROM {} WHERE client_id = ? ORDER BY {} DESC, id ASC",
            columns, table, date_column
        );
        let rows = query_as::<_, R>(&sql)
            .bind(client_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(rows)
    }
}

#[async_trait]
impl ClinicalRepository for SqliteClinicalRepository {
    async fn create_complication_type(&self, new_type: &NewComplicationType) -> DomainResult<ComplicationType> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_complication_type_with_tx(None, new_type, &mut tx).await;
        let id = finish_tx(tx, result, "create complication type").await?;
        info!("Created complication type '{}'", new_type.name.trim());
        self.find_complication_type(id).await
    }

    async fn update_complication_type(&self, id: Uuid, update: &NewComplicationType) -> DomainResult<ComplicationType> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_complication_type_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update complication type").await?;
        self.find_complication_type(id).await
    }

    async fn find_complication_type(&self, id: Uuid) -> DomainResult<ComplicationType> {
        fetch_row_by_id::<ComplicationTypeRow, _>(&self.pool, EntityKind::ComplicationType, COMPLICATION_TYPE_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_complication_types(&self) -> DomainResult<Vec<ComplicationType>> {
        let rows = query_as::<_, ComplicationTypeRow>(
            "SELECT id, name, description FROM complication_types ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter().map(ComplicationTypeRow::into_entity).collect()
    }

    async fn create_complication(&self, client_id: Uuid, input: &NewComplication) -> DomainResult<Complication> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self
            .save_complication_with_tx(ChildWrite::Create { parent_id: client_id }, input, &mut tx)
            .await;
        let id = finish_tx(tx, result, "record complication").await?;
        debug!("Recorded complication {} for client {}", id, client_id);
        self.find_complication(id).await
    }

    async fn update_complication(&self, id: Uuid, input: &NewComplication) -> DomainResult<Complication> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_complication_with_tx(ChildWrite::Update(id), input, &mut tx).await;
        finish_tx(tx, result, "update complication").await?;
        self.find_complication(id).await
    }

    async fn find_complication(&self, id: Uuid) -> DomainResult<Complication> {
        fetch_row_by_id::<ComplicationRow, _>(&self.pool, EntityKind::Complication, COMPLICATION_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_complications_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Complication>> {
        self.list_for_client::<ComplicationRow>("complications", COMPLICATION_COLUMNS, "detected_date", client_id)
            .await?
            .into_iter()
            .map(ComplicationRow::into_entity)
            .collect()
    }

    async fn create_vaccination(&self, client_id: Uuid, input: &NewVaccination) -> DomainResult<Vaccination> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self
            .save_vaccination_with_tx(ChildWrite::Create { parent_id: client_id }, input, &mut tx)
            .await;
        let id = finish_tx(tx, result, "record vaccination").await?;
        debug!("Recorded vaccination {} for client {}", id, client_id);
        self.find_vaccination(id).await
    }

    async fn update_vaccination(&self, id: Uuid, input: &NewVaccination) -> DomainResult<Vaccination> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_vaccination_with_tx(ChildWrite::Update(id), input, &mut tx).await;
        finish_tx(tx, result, "update vaccination").await?;
        self.find_vaccination(id).await
    }

    async fn find_vaccination(&self, id: Uuid) -> DomainResult<Vaccination> {
        fetch_row_by_id::<VaccinationRow, _>(&self.pool, EntityKind::Vaccination, VACCINATION_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_vaccinations_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Vaccination>> {
        self.list_for_client::<VaccinationRow>("vaccinations", VACCINATION_COLUMNS, "date_given", client_id)
            .await?
            .into_iter()
            .map(VaccinationRow::into_entity)
            .collect()
    }

    async fn create_investigation_type(&self, new_type: &NewInvestigationType) -> DomainResult<InvestigationType> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_investigation_type_with_tx(None, new_type, &mut tx).await;
        let id = finish_tx(tx, result, "create investigation type").await?;
        info!("Created investigation type '{}'", new_type.name.trim());
        self.find_investigation_type(id).await
    }

    async fn update_investigation_type(&self, id: Uuid, update: &NewInvestigationType) -> DomainResult<InvestigationType> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_investigation_type_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update investigation type").await?;
        self.find_investigation_type(id).await
    }

    async fn find_investigation_type(&self, id: Uuid) -> DomainResult<InvestigationType> {
        fetch_row_by_id::<InvestigationTypeRow, _>(
            &self.pool,
            EntityKind::InvestigationType,
            INVESTIGATION_TYPE_COLUMNS,
            id,
        )
        .await?
        .into_entity()
    }

    async fn list_investigation_types(&self) -> DomainResult<Vec<InvestigationType>> {
        let rows = query_as::<_, InvestigationTypeRow>(
            "SELECT id, name, description, unit FROM investigation_types ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter().map(InvestigationTypeRow::into_entity).collect()
    }

    async fn create_investigation(&self, client_id: Uuid, input: &NewInvestigation) -> DomainResult<Investigation> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self
            .save_investigation_with_tx(ChildWrite::Create { parent_id: client_id }, input, &mut tx)
            .await;
        let id = finish_tx(tx, result, "record investigation").await?;
        debug!("Recorded investigation {} for client {}", id, client_id);
        self.find_investigation(id).await
    }

    async fn update_investigation(&self, id: Uuid, input: &NewInvestigation) -> DomainResult<Investigation> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_investigation_with_tx(ChildWrite::Update(id), input, &mut tx).await;
        finish_tx(tx, result, "update investigation").await?;
        self.find_investigation(id).await
    }

    async fn find_investigation(&self, id: Uuid) -> DomainResult<Investigation> {
        let sql = format!("{} WHERE i.id = ?", INVESTIGATION_SELECT);
        query_as::<_, InvestigationRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound(EntityKind::Investigation.display_name().to_string(), id))?
            .into_entity()
    }

    async fn list_investigations_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Investigation>> {
        let sql = format!(
            "{} WHERE i.client_id = ? ORDER BY t.name ASC, i.date_done DESC, i.id ASC",
            INVESTIGATION_SELECT
        );
        let rows = query_as::<_, InvestigationRow>(&sql)
            .bind(client_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(InvestigationRow::into_entity).collect()
    }

    async fn create_growth_record(&self, client_id: Uuid, input: &NewGrowthRecord) -> DomainResult<GrowthRecord> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self
            .save_growth_record_with_tx(ChildWrite::Create { parent_id: client_id }, input, &mut tx)
            .await;
        let id = finish_tx(tx, result, "record growth").await?;
        debug!("Recorded growth record {} for client {}", id, client_id);
        self.find_growth_record(id).await
    }

    async fn update_growth_record(&self, id: Uuid, input: &NewGrowthRecord) -> DomainResult<GrowthRecord> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_growth_record_with_tx(ChildWrite::Update(id), input, &mut tx).await;
        finish_tx(tx, result, "update growth record").await?;
        self.find_growth_record(id).await
    }

    async fn find_growth_record(&self, id: Uuid) -> DomainResult<GrowthRecord> {
        fetch_row_by_id::<GrowthRecordRow, _>(&self.pool, EntityKind::GrowthRecord, GROWTH_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_growth_records_for_client(&self, client_id: Uuid) -> DomainResult<Vec<GrowthRecord>> {
        self.list_for_client::<GrowthRecordRow>("growth_records", GROWTH_COLUMNS, "date_measured", client_id)
            .await?
            .into_iter()
            .map(GrowthRecordRow::into_entity)
            .collect()
    }

    async fn create_clinic_visit(&self, client_id: Uuid, input: &NewClinicVisit) -> DomainResult<ClinicVisit> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self
            .save_clinic_visit_with_tx(ChildWrite::Create { parent_id: client_id }, input, &mut tx)
            .await;
        let id = finish_tx(tx, result, "record clinic visit").await?;
        debug!("Recorded clinic visit {} for client {}", id, client_id);
        self.find_clinic_visit(id).await
    }

    async fn update_clinic_visit(&self, id: Uuid, input: &NewClinicVisit) -> DomainResult<ClinicVisit> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_clinic_visit_with_tx(ChildWrite::Update(id), input, &mut tx).await;
        finish_tx(tx, result, "update clinic visit").await?;
        self.find_clinic_visit(id).await
    }

    async fn find_clinic_visit(&self, id: Uuid) -> DomainResult<ClinicVisit> {
        fetch_row_by_id::<ClinicVisitRow, _>(&self.pool, EntityKind::ClinicVisit, CLINIC_VISIT_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_clinic_visits_for_client(&self, client_id: Uuid) -> DomainResult<Vec<ClinicVisit>> {
        self.list_for_client::<ClinicVisitRow>("clinic_visits", CLINIC_VISIT_COLUMNS, "date_visit", client_id)
            .await?
            .into_iter()
            .map(ClinicVisitRow::into_entity)
            .collect()
    }
}
