use crate::domains::core::repository::{ensure_exists, fetch_row_by_id, finish_tx};
use crate::domains::drug::types::{Drug, DrugName, DrugNameRow, DrugRow, NewDrug, NewDrugName};
use crate::errors::{DbError, DomainError, DomainResult, ValidationError};
use crate::types::EntityKind;
use crate::utils::{blank_to_none, date_to_sql, opt_uuid_to_sql};
use crate::validation::{validate_entity_exists, validate_unique, Validate};
use async_trait::async_trait;
use log::{debug, info};
use sqlx::{query, query_as, Pool, Sqlite, SqliteConnection, Transaction};
use uuid::Uuid;

const DRUG_NAME_COLUMNS: &str = "id, name, dose, regimen";
const DRUG_COLUMNS: &str =
    "id, client_id, date_prescribed, drug_name_id, dose, regimen, duration, indication, prescribed_by";

/// Drug master list and the prescriptions that draw on it
#[async_trait]
pub trait DrugRepository: Send + Sync {
    async fn create_drug_name(&self, new_drug_name: &NewDrugName) -> DomainResult<DrugName>;
    async fn update_drug_name(&self, id: Uuid, update: &NewDrugName) -> DomainResult<DrugName>;
    async fn find_drug_name(&self, id: Uuid) -> DomainResult<DrugName>;
    async fn list_drug_names(&self) -> DomainResult<Vec<DrugName>>;
    async fn find_drug_name_by_name(&self, name: &str) -> DomainResult<Option<DrugName>>;

    async fn create_drug(&self, client_id: Uuid, new_drug: &NewDrug) -> DomainResult<Drug>;
    async fn update_drug(&self, id: Uuid, update: &NewDrug) -> DomainResult<Drug>;
    async fn find_drug(&self, id: Uuid) -> DomainResult<Drug>;
    /// Newest prescription first
    async fn list_drugs_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Drug>>;
}

/// SQLite implementation for DrugRepository
#[derive(Debug, Clone)]
pub struct SqliteDrugRepository {
    pool: Pool<Sqlite>,
}

/// An explicit value wins; otherwise the drug's default; otherwise the field is missing.
fn resolve_with_default(explicit: &Option<String>, default: Option<String>, field: &str) -> DomainResult<String> {
    blank_to_none(explicit.clone())
        .or_else(|| blank_to_none(default))
        .ok_or_else(|| DomainError::Validation(ValidationError::required(field)))
}

async fn drug_name_defaults(
    conn: &mut SqliteConnection,
    drug_name_id: Option<Uuid>,
) -> DomainResult<(Option<String>, Option<String>)> {
    let Some(id) = drug_name_id else {
        return Ok((None, None));
    };
    let defaults = query_as::<_, (Option<String>, Option<String>)>("SELECT dose, regimen FROM drug_names WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::from)?;
    Ok(defaults.unwrap_or((None, None)))
}

impl SqliteDrugRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn save_drug_name_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewDrugName,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        if let Some(id) = id {
            ensure_exists(&mut **tx, EntityKind::DrugName, id).await?;
        }
        input.validate()?;
        let name = input.name.trim();
        validate_unique(&mut **tx, "drug_names", "name", name, id, "name").await?;

        let dose = blank_to_none(input.dose.clone());
        let regimen = blank_to_none(input.regimen.clone());
        let id = match id {
            None => {
                let id = Uuid::new_v4();
                query("INSERT INTO drug_names (id, name, dose, regimen) VALUES (?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(name)
                    .bind(dose)
                    .bind(regimen)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
            Some(id) => {
                query("UPDATE drug_names SET name = ?, dose = ?, regimen = ? WHERE id = ?")
                    .bind(name)
                    .bind(dose)
                    .bind(regimen)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                id
            }
        };
        Ok(id)
    }

    async fn save_drug_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        client_id: Option<Uuid>,
        input: &NewDrug,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        match (id, client_id) {
            (Some(id), _) => ensure_exists(&mut **tx, EntityKind::Drug, id).await?,
            (None, Some(client_id)) => ensure_exists(&mut **tx, EntityKind::Client, client_id).await?,
            (None, None) => return Err(DomainError::Internal("drug needs an id or a client".to_string())),
        }
        input.validate()?;
        validate_entity_exists(&mut **tx, EntityKind::DrugName, input.drug_name_id, "drug_name").await?;

        let (default_dose, default_regimen) = drug_name_defaults(&mut **tx, input.drug_name_id).await?;
        let dose = resolve_with_default(&input.dose, default_dose, "dose")?;
        let regimen = resolve_with_default(&input.regimen, default_regimen, "regimen")?;
        let duration = input.duration.trim().to_string();
        let indication = blank_to_none(input.indication.clone());
        let prescribed_by = blank_to_none(input.prescribed_by.clone());

        match (id, client_id) {
            (Some(id), _) => {
                query("UPDATE drugs SET date_prescribed = ?, drug_name_id = ?, dose = ?, regimen = ?, duration = ?, indication = ?, prescribed_by = ? WHERE id = ?")
                    .bind(date_to_sql(input.date_prescribed))
                    .bind(opt_uuid_to_sql(input.drug_name_id))
                    .bind(dose)
                    .bind(regimen)
                    .bind(duration)
                    .bind(indication)
                    .bind(prescribed_by)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            (None, Some(client_id)) => {
                let id = Uuid::new_v4();
                query("INSERT INTO drugs (id, client_id, date_prescribed, drug_name_id, dose, regimen, duration, indication, prescribed_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(client_id.to_string())
                    .bind(date_to_sql(input.date_prescribed))
                    .bind(opt_uuid_to_sql(input.drug_name_id))
                    .bind(dose)
                    .bind(regimen)
                    .bind(duration)
                    .bind(indication)
                    .bind(prescribed_by)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            (None, None) => Err(DomainError::Internal("drug needs an id or a client".to_string())),
        }
    }
}

#[async_trait]
impl DrugRepository for SqliteDrugRepository {
    async fn create_drug_name(&self, new_drug_name: &NewDrugName) -> DomainResult<DrugName> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_drug_name_with_tx(None, new_drug_name, &mut tx).await;
        let id = finish_tx(tx, result, "create drug name").await?;
        info!("Created drug name '{}'", new_drug_name.name.trim());
        self.find_drug_name(id).await
    }

    async fn update_drug_name(&self, id: Uuid, update: &NewDrugName) -> DomainResult<DrugName> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_drug_name_with_tx(Some(id), update, &mut tx).await;
        finish_tx(tx, result, "update drug name").await?;
        self.find_drug_name(id).await
    }

    async fn find_drug_name(&self, id: Uuid) -> DomainResult<DrugName> {
        fetch_row_by_id::<DrugNameRow, _>(&self.pool, EntityKind::DrugName, DRUG_NAME_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_drug_names(&self) -> DomainResult<Vec<DrugName>> {
        let rows = query_as::<_, DrugNameRow>("SELECT id, name, dose, regimen FROM drug_names ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(DrugNameRow::into_entity).collect()
    }

    async fn find_drug_name_by_name(&self, name: &str) -> DomainResult<Option<DrugName>> {
        let row = query_as::<_, DrugNameRow>("SELECT id, name, dose, regimen FROM drug_names WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        row.map(DrugNameRow::into_entity).transpose()
    }

    async fn create_drug(&self, client_id: Uuid, new_drug: &NewDrug) -> DomainResult<Drug> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_drug_with_tx(None, Some(client_id), new_drug, &mut tx).await;
        let id = finish_tx(tx, result, "prescribe drug").await?;
        debug!("Prescribed drug {} for client {}", id, client_id);
        self.find_drug(id).await
    }

    async fn update_drug(&self, id: Uuid, update: &NewDrug) -> DomainResult<Drug> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_drug_with_tx(Some(id), None, update, &mut tx).await;
        finish_tx(tx, result, "update drug").await?;
        self.find_drug(id).await
    }

    async fn find_drug(&self, id: Uuid) -> DomainResult<Drug> {
        fetch_row_by_id::<DrugRow, _>(&self.pool, EntityKind::Drug, DRUG_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_drugs_for_client(&self, client_id: Uuid) -> DomainResult<Vec<Drug>> {
        let sql = format!(
            "SELECT {} FROM drugs WHERE client_id = ? ORDER BY date_prescribed DESC, id ASC",
            DRUG_COLUMNS
        );
        let rows = query_as::<_, DrugRow>(&sql)
            .bind(client_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(DrugRow::into_entity).collect()
    }
}
