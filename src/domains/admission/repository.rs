use crate::domains::admission::types::{
    Admission, AdmissionRow, NewAdmission, NewTransfusion, Transfusion, TransfusionRow,
};
use crate::domains::core::repository::{fetch_row_by_id, finish_tx, ChildWrite};
use crate::domains::lookup::types::ChoiceCategory;
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::EntityKind;
use crate::utils::{blank_to_none, date_to_sql, opt_date_to_sql, opt_decimal_to_sql, opt_uuid_to_sql, parse_uuid};
use crate::validation::{validate_choice_category, Validate};
use async_trait::async_trait;
use log::debug;
use sqlx::{query, query_as, query_scalar, Pool, Sqlite, Transaction};
use uuid::Uuid;

const ADMISSION_COLUMNS: &str = "id, client_id, date_of_admission, reason_for_admission, date_of_discharge, outcome";
const TRANSFUSION_COLUMNS: &str = "id, admission_id, date_of_transfusion, hb_level_to_be_kept, hb_level, wbc_count, \
     platelet_count, amount_of_blood, special_type_id, next_date_given, reaction, checked_by, remarks";

/// Hospital admissions and the transfusions given during them
#[async_trait]
pub trait AdmissionRepository: Send + Sync {
    async fn create_admission(&self, client_id: Uuid, input: &NewAdmission) -> DomainResult<Admission>;
    async fn update_admission(&self, id: Uuid, input: &NewAdmission) -> DomainResult<Admission>;
    async fn find_admission(&self, id: Uuid) -> DomainResult<Admission>;
    /// Most recent admission first
    async fn list_admissions_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Admission>>;

    async fn create_transfusion(&self, admission_id: Uuid, input: &NewTransfusion) -> DomainResult<Transfusion>;
    async fn update_transfusion(&self, id: Uuid, input: &NewTransfusion) -> DomainResult<Transfusion>;
    async fn find_transfusion(&self, id: Uuid) -> DomainResult<Transfusion>;
    /// Most recent transfusion first
    async fn list_transfusions_for_admission(&self, admission_id: Uuid) -> DomainResult<Vec<Transfusion>>;
    /// Every transfusion across the client's admissions, most recent first
    async fn list_transfusions_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Transfusion>>;
    /// The client a transfusion belongs to, through its admission
    async fn client_of_transfusion(&self, transfusion_id: Uuid) -> DomainResult<Uuid>;
}

/// SQLite implementation for AdmissionRepository
#[derive(Debug, Clone)]
pub struct SqliteAdmissionRepository {
    pool: Pool<Sqlite>,
}

impl SqliteAdmissionRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn save_admission_with_tx<'t>(
        &self,
        target: ChildWrite,
        input: &NewAdmission,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        target
            .ensure_target(&mut **tx, EntityKind::Client, EntityKind::Admission)
            .await?;
        input.validate()?;
        let outcome = blank_to_none(input.outcome.clone());

        match target {
            ChildWrite::Create { parent_id } => {
                let id = Uuid::new_v4();
                query("INSERT INTO admissions (id, client_id, date_of_admission, reason_for_admission, date_of_discharge, outcome) VALUES (?, ?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(parent_id.to_string())
                    .bind(date_to_sql(input.date_of_admission))
                    .bind(input.reason())
                    .bind(opt_date_to_sql(input.date_of_discharge))
                    .bind(outcome)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            ChildWrite::Update(id) => {
                query("UPDATE admissions SET date_of_admission = ?, reason_for_admission = ?, date_of_discharge = ?, outcome = ? WHERE id = ?")
                    .bind(date_to_sql(input.date_of_admission))
                    .bind(input.reason())
                    .bind(opt_date_to_sql(input.date_of_discharge))
                    .bind(outcome)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
        }
    }

    async fn save_transfusion_with_tx<'t>(
        &self,
        target: ChildWrite,
        input: &NewTransfusion,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        target
            .ensure_target(&mut **tx, EntityKind::Admission, EntityKind::Transfusion)
            .await?;
        input.validate()?;
        validate_choice_category(
            &mut **tx,
            input.special_type_id,
            ChoiceCategory::SpecialBloodType,
            "special_type",
        )
        .await?;
        let reaction = blank_to_none(input.reaction.clone());
        let checked_by = blank_to_none(input.checked_by.clone());
        let remarks = blank_to_none(input.remarks.clone());

        match target {
            ChildWrite::Create { parent_id } => {
                let id = Uuid::new_v4();
                let sql = format!(
                    "INSERT INTO transfusions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    TRANSFUSION_COLUMNS
                );
                query(&sql)
                    .bind(id.to_string())
                    .bind(parent_id.to_string())
                    .bind(date_to_sql(input.date_of_transfusion))
                    .bind(opt_decimal_to_sql(input.hb_level_to_be_kept))
                    .bind(opt_decimal_to_sql(input.hb_level))
                    .bind(opt_decimal_to_sql(input.wbc_count))
                    .bind(opt_decimal_to_sql(input.platelet_count))
                    .bind(opt_decimal_to_sql(input.amount_of_blood))
                    .bind(opt_uuid_to_sql(input.special_type_id))
                    .bind(opt_date_to_sql(input.next_date_given))
                    .bind(reaction)
                    .bind(checked_by)
                    .bind(remarks)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            ChildWrite::Update(id) => {
                query("UPDATE transfusions SET date_of_transfusion = ?, hb_level_to_be_kept = ?, hb_level = ?, wbc_count = ?, platelet_count = ?, amount_of_blood = ?, special_type_id = ?, next_date_given = ?, reaction = ?, checked_by = ?, remarks = ? WHERE id = ?")
                    .bind(date_to_sql(input.date_of_transfusion))
                    .bind(opt_decimal_to_sql(input.hb_level_to_be_kept))
                    .bind(opt_decimal_to_sql(input.hb_level))
                    .bind(opt_decimal_to_sql(input.wbc_count))
                    .bind(opt_decimal_to_sql(input.platelet_count))
                    .bind(opt_decimal_to_sql(input.amount_of_blood))
                    .bind(opt_uuid_to_sql(input.special_type_id))
                    .bind(opt_date_to_sql(input.next_date_given))
                    .bind(reaction)
                    .bind(checked_by)
                    .bind(remarks)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
        }
    }
}

#[async_trait]
impl AdmissionRepository for SqliteAdmissionRepository {
    async fn create_admission(&self, client_id: Uuid, input: &NewAdmission) -> DomainResult<Admission> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self
            .save_admission_with_tx(ChildWrite::Create { parent_id: client_id }, input, &mut tx)
            .await;
        let id = finish_tx(tx, result, "record admission").await?;
        debug!("Recorded admission {} for client {}", id, client_id);
        self.find_admission(id).await
    }

    async fn update_admission(&self, id: Uuid, input: &NewAdmission) -> DomainResult<Admission> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_admission_with_tx(ChildWrite::Update(id), input, &mut tx).await;
        finish_tx(tx, result, "update admission").await?;
        self.find_admission(id).await
    }

    async fn find_admission(&self, id: Uuid) -> DomainResult<Admission> {
        fetch_row_by_id::<AdmissionRow, _>(&self.pool, EntityKind::Admission, ADMISSION_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_admissions_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Admission>> {
        let sql = format!(
            "SELECT {} FROM admissions WHERE client_id = ? ORDER BY date_of_admission DESC, id ASC",
            ADMISSION_COLUMNS
        );
        let rows = query_as::<_, AdmissionRow>(&sql)
            .bind(client_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(AdmissionRow::into_entity).collect()
    }

    async fn create_transfusion(&self, admission_id: Uuid, input: &NewTransfusion) -> DomainResult<Transfusion> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self
            .save_transfusion_with_tx(ChildWrite::Create { parent_id: admission_id }, input, &mut tx)
            .await;
        let id = finish_tx(tx, result, "record transfusion").await?;
        debug!("Recorded transfusion {} under admission {}", id, admission_id);
        self.find_transfusion(id).await
    }

    async fn update_transfusion(&self, id: Uuid, input: &NewTransfusion) -> DomainResult<Transfusion> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_transfusion_with_tx(ChildWrite::Update(id), input, &mut tx).await;
        finish_tx(tx, result, "update transfusion").await?;
        self.find_transfusion(id).await
    }

    async fn find_transfusion(&self, id: Uuid) -> DomainResult<Transfusion> {
        fetch_row_by_id::<TransfusionRow, _>(&self.pool, EntityKind::Transfusion, TRANSFUSION_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_transfusions_for_admission(&self, admission_id: Uuid) -> DomainResult<Vec<Transfusion>> {
        let sql = format!(
            "SELECT {} FROM transfusions WHERE admission_id = ? ORDER BY date_of_transfusion DESC, id ASC",
            TRANSFUSION_COLUMNS
        );
        let rows = query_as::<_, TransfusionRow>(&sql)
            .bind(admission_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(TransfusionRow::into_entity).collect()
    }

    async fn list_transfusions_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Transfusion>> {
        let columns = TRANSFUSION_COLUMNS
            .split(',')
            .map(|column| format!("t.{}", column.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM transfusions t JOIN admissions a ON a.id = t.admission_id \
             WHERE a.client_id = ? ORDER BY t.date_of_transfusion DESC, t.id ASC",
            columns
        );
        let rows = query_as::<_, TransfusionRow>(&sql)
            .bind(client_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(TransfusionRow::into_entity).collect()
    }

    async fn client_of_transfusion(&self, transfusion_id: Uuid) -> DomainResult<Uuid> {
        let client_id: Option<String> = query_scalar(
            "SELECT a.client_id FROM transfusions t JOIN admissions a ON a.id = t.admission_id WHERE t.id = ?",
        )
        .bind(transfusion_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let client_id = client_id.ok_or_else(|| {
            DomainError::EntityNotFound(EntityKind::Transfusion.display_name().to_string(), transfusion_id)
        })?;
        parse_uuid(&client_id, "client_id")
    }
}
