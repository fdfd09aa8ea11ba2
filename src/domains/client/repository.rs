use crate::domains::client::types::{
    Client, ClientDeath, ClientDeathRow, ClientRow, ClientTransfer, ClientTransferRow, FamilyMember,
    FamilyMemberRow, NewClient, NewClientDeath, NewClientTransfer, NewFamilyMember,
};
use crate::domains::core::repository::{ensure_exists, fetch_row_by_id, finish_tx, FindById};
use crate::domains::lookup::types::ChoiceCategory;
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{EntityKind, PaginatedResult, PaginationParams};
use crate::utils::{blank_to_none, date_to_sql, opt_date_to_sql, opt_decimal_to_sql, opt_uuid_to_sql};
use crate::validation::{validate_choice_category, validate_entity_exists, validate_unique, Validate};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{query, query_as, query_scalar, Pool, Sqlite, Transaction};
use uuid::Uuid;

/// Editable client columns, in bind order.
const CLIENT_FIELDS: [&str; 28] = [
    "registration_number",
    "full_name",
    "common_name",
    "gender",
    "ethnicity",
    "date_of_birth",
    "blood_group",
    "nic_number",
    "date_of_registration",
    "unit_id",
    "diagnosis_id",
    "marital_status_id",
    "occupation",
    "address",
    "ds_division_id",
    "contact_number",
    "email",
    "guardian_name_1",
    "guardian_contact_number_1",
    "guardian_name_2",
    "guardian_contact_number_2",
    "diagnosis_date",
    "hb_level_at_diagnosis",
    "date_first_transfused",
    "date_iron_chelation_started",
    "transfusion_regimen",
    "allergic_history",
    "special_note",
];

const DEATH_COLUMNS: &str = "id, client_id, date_of_death, cause_of_death, postmortem_findings, notes";
const TRANSFER_COLUMNS: &str = "id, client_id, transferred_unit_id, date_of_transfer, reason";
const FAMILY_COLUMNS: &str =
    "id, client_id, relationship, name, birth_day, diagnosis_id, linked_registration_number, is_carrier, contact_number";

fn client_columns() -> String {
    format!("id, {}, created_at, updated_at", CLIENT_FIELDS.join(", "))
}

/// Client input as stored: trimmed, blanks turned into NULL.
struct ClientValues {
    registration_number: String,
    full_name: String,
    nic_number: Option<String>,
    binds: Vec<Option<String>>,
}

impl ClientValues {
    fn from_input(input: &NewClient) -> Self {
        let text = |v: &Option<String>| blank_to_none(v.clone());
        let registration_number = input.registration_number.trim().to_string();
        let full_name = input.full_name.trim().to_string();
        let nic_number = text(&input.nic_number);

        let binds = vec![
            Some(registration_number.clone()),
            Some(full_name.clone()),
            text(&input.common_name),
            input.parsed_gender().map(|g| g.as_str().to_string()),
            input.parsed_ethnicity().map(|e| e.as_str().to_string()),
            opt_date_to_sql(input.date_of_birth),
            input.parsed_blood_group().map(|g| g.as_str().to_string()),
            nic_number.clone(),
            opt_date_to_sql(input.date_of_registration),
            opt_uuid_to_sql(input.unit_id),
            opt_uuid_to_sql(input.diagnosis_id),
            opt_uuid_to_sql(input.marital_status_id),
            text(&input.occupation),
            text(&input.address),
            opt_uuid_to_sql(input.ds_division_id),
            text(&input.contact_number),
            text(&input.email),
            text(&input.guardian_name_1),
            text(&input.guardian_contact_number_1),
            text(&input.guardian_name_2),
            text(&input.guardian_contact_number_2),
            opt_date_to_sql(input.diagnosis_date),
            opt_decimal_to_sql(input.hb_level_at_diagnosis),
            opt_date_to_sql(input.date_first_transfused),
            opt_date_to_sql(input.date_iron_chelation_started),
            text(&input.transfusion_regimen),
            text(&input.allergic_history),
            text(&input.special_note),
        ];

        Self {
            registration_number,
            full_name,
            nic_number,
            binds,
        }
    }

    fn bind_to<'q>(&self, mut query: Query<'q, Sqlite, SqliteArguments<'q>>) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        for value in &self.binds {
            query = query.bind(value.clone());
        }
        query
    }
}

/// Trait defining client repository operations
#[async_trait]
pub trait ClientRepository: FindById<Client> + Send + Sync {
    async fn create(&self, new_client: &NewClient) -> DomainResult<Client>;
    async fn create_with_tx<'t>(
        &self,
        new_client: &NewClient,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid>;

    /// Replace every editable attribute of an existing client
    async fn update(&self, id: Uuid, update: &NewClient) -> DomainResult<Client>;
    async fn update_with_tx<'t>(
        &self,
        id: Uuid,
        update: &NewClient,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()>;

    async fn find_by_registration_number(&self, registration_number: &str) -> DomainResult<Option<Client>>;

    /// Clients ordered by full name. `search` matches full name, common name,
    /// registration number or contact number.
    async fn find_all(&self, search: Option<&str>, params: PaginationParams) -> DomainResult<PaginatedResult<Client>>;

    async fn record_death(&self, client_id: Uuid, death: &NewClientDeath) -> DomainResult<ClientDeath>;
    async fn update_death(&self, id: Uuid, death: &NewClientDeath) -> DomainResult<ClientDeath>;
    async fn find_death_for_client(&self, client_id: Uuid) -> DomainResult<Option<ClientDeath>>;

    async fn record_transfer(&self, client_id: Uuid, transfer: &NewClientTransfer) -> DomainResult<ClientTransfer>;
    async fn update_transfer(&self, id: Uuid, transfer: &NewClientTransfer) -> DomainResult<ClientTransfer>;
    async fn find_transfer_for_client(&self, client_id: Uuid) -> DomainResult<Option<ClientTransfer>>;

    async fn add_family_member(&self, client_id: Uuid, member: &NewFamilyMember) -> DomainResult<FamilyMember>;
    async fn update_family_member(&self, id: Uuid, member: &NewFamilyMember) -> DomainResult<FamilyMember>;
    async fn find_family_member(&self, id: Uuid) -> DomainResult<FamilyMember>;
    /// A client's family members ordered by name
    async fn list_family_members(&self, client_id: Uuid) -> DomainResult<Vec<FamilyMember>>;
    /// The patient record of a family member, when their registration number is known
    async fn find_linked_client(&self, family_member_id: Uuid) -> DomainResult<Option<Client>>;
}

/// SQLite implementation for ClientRepository
#[derive(Debug, Clone)]
pub struct SqliteClientRepository {
    pool: Pool<Sqlite>,
}

impl SqliteClientRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn validate_client_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        input: &NewClient,
        values: &ClientValues,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()> {
        input.validate()?;

        validate_unique(
            &mut **tx,
            "clients",
            "registration_number",
            &values.registration_number,
            id,
            "registration_number",
        )
        .await?;
        if let Some(nic) = &values.nic_number {
            validate_unique(&mut **tx, "clients", "nic_number", nic, id, "nic_number").await?;
        }

        validate_entity_exists(&mut **tx, EntityKind::ThalassemiaUnit, input.unit_id, "unit").await?;
        validate_entity_exists(&mut **tx, EntityKind::DiagnosisType, input.diagnosis_id, "diagnosis").await?;
        validate_entity_exists(&mut **tx, EntityKind::DsDivision, input.ds_division_id, "ds_division").await?;
        validate_choice_category(
            &mut **tx,
            input.marital_status_id,
            ChoiceCategory::MaritalStatus,
            "marital_status",
        )
        .await?;

        Ok(())
    }

    async fn save_death_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        client_id: Option<Uuid>,
        input: &NewClientDeath,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        input.validate()?;
        let cause = blank_to_none(input.cause_of_death.clone());
        let findings = blank_to_none(input.postmortem_findings.clone());
        let notes = blank_to_none(input.notes.clone());

        match (id, client_id) {
            (Some(id), _) => {
                ensure_exists(&mut **tx, EntityKind::ClientDeath, id).await?;
                query("UPDATE client_deaths SET date_of_death = ?, cause_of_death = ?, postmortem_findings = ?, notes = ? WHERE id = ?")
                    .bind(date_to_sql(input.date_of_death))
                    .bind(cause)
                    .bind(findings)
                    .bind(notes)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            (None, Some(client_id)) => {
                ensure_exists(&mut **tx, EntityKind::Client, client_id).await?;
                validate_unique(&mut **tx, "client_deaths", "client_id", &client_id.to_string(), None, "client").await?;
                let id = Uuid::new_v4();
                query("INSERT INTO client_deaths (id, client_id, date_of_death, cause_of_death, postmortem_findings, notes) VALUES (?, ?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(client_id.to_string())
                    .bind(date_to_sql(input.date_of_death))
                    .bind(cause)
                    .bind(findings)
                    .bind(notes)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            (None, None) => Err(DomainError::Internal("death record needs an id or a client".to_string())),
        }
    }

    async fn save_transfer_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        client_id: Option<Uuid>,
        input: &NewClientTransfer,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        input.validate()?;
        validate_entity_exists(&mut **tx, EntityKind::ThalassemiaUnit, input.transferred_unit_id, "transferred_unit").await?;
        let reason = blank_to_none(input.reason.clone());

        match (id, client_id) {
            (Some(id), _) => {
                ensure_exists(&mut **tx, EntityKind::ClientTransfer, id).await?;
                query("UPDATE client_transfers SET transferred_unit_id = ?, date_of_transfer = ?, reason = ? WHERE id = ?")
                    .bind(opt_uuid_to_sql(input.transferred_unit_id))
                    .bind(opt_date_to_sql(input.date_of_transfer))
                    .bind(reason)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            (None, Some(client_id)) => {
                ensure_exists(&mut **tx, EntityKind::Client, client_id).await?;
                validate_unique(&mut **tx, "client_transfers", "client_id", &client_id.to_string(), None, "client").await?;
                let id = Uuid::new_v4();
                query("INSERT INTO client_transfers (id, client_id, transferred_unit_id, date_of_transfer, reason) VALUES (?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(client_id.to_string())
                    .bind(opt_uuid_to_sql(input.transferred_unit_id))
                    .bind(opt_date_to_sql(input.date_of_transfer))
                    .bind(reason)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            (None, None) => Err(DomainError::Internal("transfer record needs an id or a client".to_string())),
        }
    }

    async fn save_family_member_with_tx<'t>(
        &self,
        id: Option<Uuid>,
        client_id: Option<Uuid>,
        input: &NewFamilyMember,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        input.validate()?;
        validate_entity_exists(&mut **tx, EntityKind::DiagnosisType, input.diagnosis_id, "diagnosis").await?;

        let name = input.name.trim().to_string();
        let linked = blank_to_none(input.linked_registration_number.clone());
        let contact = blank_to_none(input.contact_number.clone());

        match (id, client_id) {
            (Some(id), _) => {
                ensure_exists(&mut **tx, EntityKind::FamilyMember, id).await?;
                query("UPDATE family_members SET relationship = ?, name = ?, birth_day = ?, diagnosis_id = ?, linked_registration_number = ?, is_carrier = ?, contact_number = ? WHERE id = ?")
                    .bind(input.relationship.as_str())
                    .bind(name)
                    .bind(opt_date_to_sql(input.birth_day))
                    .bind(opt_uuid_to_sql(input.diagnosis_id))
                    .bind(linked)
                    .bind(input.is_carrier)
                    .bind(contact)
                    .bind(id.to_string())
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            (None, Some(client_id)) => {
                ensure_exists(&mut **tx, EntityKind::Client, client_id).await?;
                let id = Uuid::new_v4();
                query("INSERT INTO family_members (id, client_id, relationship, name, birth_day, diagnosis_id, linked_registration_number, is_carrier, contact_number) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)")
                    .bind(id.to_string())
                    .bind(client_id.to_string())
                    .bind(input.relationship.as_str())
                    .bind(name)
                    .bind(opt_date_to_sql(input.birth_day))
                    .bind(opt_uuid_to_sql(input.diagnosis_id))
                    .bind(linked)
                    .bind(input.is_carrier)
                    .bind(contact)
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;
                Ok(id)
            }
            (None, None) => Err(DomainError::Internal("family member needs an id or a client".to_string())),
        }
    }

    async fn find_death(&self, id: Uuid) -> DomainResult<ClientDeath> {
        fetch_row_by_id::<ClientDeathRow, _>(&self.pool, EntityKind::ClientDeath, DEATH_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn find_transfer(&self, id: Uuid) -> DomainResult<ClientTransfer> {
        fetch_row_by_id::<ClientTransferRow, _>(&self.pool, EntityKind::ClientTransfer, TRANSFER_COLUMNS, id)
            .await?
            .into_entity()
    }
}

#[async_trait]
impl FindById<Client> for SqliteClientRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Client> {
        fetch_row_by_id::<ClientRow, _>(&self.pool, EntityKind::Client, &client_columns(), id)
            .await?
            .into_entity()
    }
}

#[async_trait]
impl ClientRepository for SqliteClientRepository {
    async fn create(&self, new_client: &NewClient) -> DomainResult<Client> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.create_with_tx(new_client, &mut tx).await;
        let id = finish_tx(tx, result, "create client").await?;
        self.find_by_id(id).await
    }

    async fn create_with_tx<'t>(
        &self,
        new_client: &NewClient,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Uuid> {
        let values = ClientValues::from_input(new_client);
        self.validate_client_with_tx(None, new_client, &values, tx).await?;

        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let placeholders = vec!["?"; CLIENT_FIELDS.len() + 3].join(", ");
        let sql = format!("INSERT INTO clients ({}) VALUES ({})", client_columns(), placeholders);

        let insert = query(&sql).bind(id.to_string());
        values
            .bind_to(insert)
            .bind(&now)
            .bind(&now)
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;

        info!("Registered client {} : {}", values.registration_number, values.full_name);
        Ok(id)
    }

    async fn update(&self, id: Uuid, update: &NewClient) -> DomainResult<Client> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.update_with_tx(id, update, &mut tx).await;
        finish_tx(tx, result, "update client").await?;
        self.find_by_id(id).await
    }

    async fn update_with_tx<'t>(
        &self,
        id: Uuid,
        update: &NewClient,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()> {
        ensure_exists(&mut **tx, EntityKind::Client, id).await?;
        let values = ClientValues::from_input(update);
        self.validate_client_with_tx(Some(id), update, &values, tx).await?;

        let assignments = CLIENT_FIELDS
            .iter()
            .map(|field| format!("{} = ?", field))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE clients SET {}, updated_at = ? WHERE id = ?", assignments);

        values
            .bind_to(query(&sql))
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;

        debug!("Updated client {}", id);
        Ok(())
    }

    async fn find_by_registration_number(&self, registration_number: &str) -> DomainResult<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE registration_number = ?", client_columns());
        let row = query_as::<_, ClientRow>(&sql)
            .bind(registration_number.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        row.map(ClientRow::into_entity).transpose()
    }

    async fn find_all(&self, search: Option<&str>, params: PaginationParams) -> DomainResult<PaginatedResult<Client>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));
        let filter = "full_name LIKE ? OR common_name LIKE ? OR registration_number LIKE ? OR contact_number LIKE ?";

        let (total, rows) = match &pattern {
            Some(pattern) => {
                let count_sql = format!("SELECT COUNT(*) FROM clients WHERE {}", filter);
                let total: i64 = query_scalar(&count_sql)
                    .bind(pattern)
                    .bind(pattern)
                    .bind(pattern)
                    .bind(pattern)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(DbError::from)?;

                let sql = format!(
                    "SELECT {} FROM clients WHERE {} ORDER BY full_name ASC, registration_number ASC LIMIT ? OFFSET ?",
                    client_columns(),
                    filter
                );
                let rows = query_as::<_, ClientRow>(&sql)
                    .bind(pattern)
                    .bind(pattern)
                    .bind(pattern)
                    .bind(pattern)
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(DbError::from)?;
                (total, rows)
            }
            None => {
                let total: i64 = query_scalar("SELECT COUNT(*) FROM clients")
                    .fetch_one(&self.pool)
                    .await
                    .map_err(DbError::from)?;

                let sql = format!(
                    "SELECT {} FROM clients ORDER BY full_name ASC, registration_number ASC LIMIT ? OFFSET ?",
                    client_columns()
                );
                let rows = query_as::<_, ClientRow>(&sql)
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(DbError::from)?;
                (total, rows)
            }
        };

        let clients = rows
            .into_iter()
            .map(ClientRow::into_entity)
            .collect::<DomainResult<Vec<Client>>>()?;

        Ok(PaginatedResult::new(clients, total as u64, params))
    }

    async fn record_death(&self, client_id: Uuid, death: &NewClientDeath) -> DomainResult<ClientDeath> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_death_with_tx(None, Some(client_id), death, &mut tx).await;
        let id = finish_tx(tx, result, "record death").await?;
        info!("Recorded death of client {}", client_id);
        self.find_death(id).await
    }

    async fn update_death(&self, id: Uuid, death: &NewClientDeath) -> DomainResult<ClientDeath> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_death_with_tx(Some(id), None, death, &mut tx).await;
        finish_tx(tx, result, "update death record").await?;
        self.find_death(id).await
    }

    async fn find_death_for_client(&self, client_id: Uuid) -> DomainResult<Option<ClientDeath>> {
        let sql = format!("SELECT {} FROM client_deaths WHERE client_id = ?", DEATH_COLUMNS);
        let row = query_as::<_, ClientDeathRow>(&sql)
            .bind(client_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        row.map(ClientDeathRow::into_entity).transpose()
    }

    async fn record_transfer(&self, client_id: Uuid, transfer: &NewClientTransfer) -> DomainResult<ClientTransfer> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_transfer_with_tx(None, Some(client_id), transfer, &mut tx).await;
        let id = finish_tx(tx, result, "record transfer").await?;
        info!("Recorded transfer of client {}", client_id);
        self.find_transfer(id).await
    }

    async fn update_transfer(&self, id: Uuid, transfer: &NewClientTransfer) -> DomainResult<ClientTransfer> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_transfer_with_tx(Some(id), None, transfer, &mut tx).await;
        finish_tx(tx, result, "update transfer record").await?;
        self.find_transfer(id).await
    }

    async fn find_transfer_for_client(&self, client_id: Uuid) -> DomainResult<Option<ClientTransfer>> {
        let sql = format!("SELECT {} FROM client_transfers WHERE client_id = ?", TRANSFER_COLUMNS);
        let row = query_as::<_, ClientTransferRow>(&sql)
            .bind(client_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        row.map(ClientTransferRow::into_entity).transpose()
    }

    async fn add_family_member(&self, client_id: Uuid, member: &NewFamilyMember) -> DomainResult<FamilyMember> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_family_member_with_tx(None, Some(client_id), member, &mut tx).await;
        let id = finish_tx(tx, result, "add family member").await?;
        self.find_family_member(id).await
    }

    async fn update_family_member(&self, id: Uuid, member: &NewFamilyMember) -> DomainResult<FamilyMember> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.save_family_member_with_tx(Some(id), None, member, &mut tx).await;
        finish_tx(tx, result, "update family member").await?;
        self.find_family_member(id).await
    }

    async fn find_family_member(&self, id: Uuid) -> DomainResult<FamilyMember> {
        fetch_row_by_id::<FamilyMemberRow, _>(&self.pool, EntityKind::FamilyMember, FAMILY_COLUMNS, id)
            .await?
            .into_entity()
    }

    async fn list_family_members(&self, client_id: Uuid) -> DomainResult<Vec<FamilyMember>> {
        let sql = format!("SELECT {} FROM family_members WHERE client_id = ? ORDER BY name ASC", FAMILY_COLUMNS);
        let rows = query_as::<_, FamilyMemberRow>(&sql)
            .bind(client_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(FamilyMemberRow::into_entity).collect()
    }

    async fn find_linked_client(&self, family_member_id: Uuid) -> DomainResult<Option<Client>> {
        let member = self.find_family_member(family_member_id).await?;
        match member.linked_registration_number {
            Some(registration_number) => self.find_by_registration_number(&registration_number).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::client::types::{Gender, Relationship};
    use crate::errors::ValidationError;
    use crate::domains::lookup::repository::{LookupRepository, SqliteLookupRepository};
    use crate::domains::lookup::types::NewChoice;
    use crate::test_support::migrated_pool;
    use chrono::NaiveDate;

    async fn setup() -> (Pool<Sqlite>, SqliteClientRepository) {
        let pool = migrated_pool().await;
        (pool.clone(), SqliteClientRepository::new(pool))
    }

    #[tokio::test]
    async fn test_create_and_find_client() {
        let (_, repo) = setup().await;
        let mut new_client = NewClient::new("T-525", "John Silva", Gender::Male);
        new_client.date_of_birth = NaiveDate::from_ymd_opt(1990, 1, 1);
        new_client.nic_number = Some("  ".to_string());

        let client = repo.create(&new_client).await.unwrap();
        assert_eq!(client.registration_number, "T-525");
        assert_eq!(client.nic_number, None);
        assert_eq!(client.to_string(), "T-525 : John Silva");

        let found = repo.find_by_registration_number("T-525").await.unwrap().unwrap();
        assert_eq!(found.id, client.id);
    }

    #[tokio::test]
    async fn test_duplicate_registration_number_rejected() {
        let (pool, repo) = setup().await;
        repo.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();

        let err = repo
            .create(&NewClient::new("T-525", "Jane Perera", Gender::Female))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::Unique { ref field }) if field == "registration_number"
        ));

        let count: i64 = query_scalar("SELECT COUNT(*) FROM clients").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_blank_nic_numbers_do_not_collide() {
        let (_, repo) = setup().await;
        let mut first = NewClient::new("T-1", "Amal Perera", Gender::Male);
        first.nic_number = Some(String::new());
        let mut second = NewClient::new("T-2", "Kamal Perera", Gender::Male);
        second.nic_number = None;
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();

        let mut third = NewClient::new("T-3", "Nimal Perera", Gender::Male);
        third.nic_number = Some("901234567V".to_string());
        repo.create(&third).await.unwrap();
        let mut fourth = NewClient::new("T-4", "Sunil Perera", Gender::Male);
        fourth.nic_number = Some("901234567V".to_string());
        let err = repo.create(&fourth).await.unwrap_err();
        assert_eq!(err.validation().and_then(|v| v.field()), Some("nic_number"));
    }

    #[tokio::test]
    async fn test_update_replaces_attributes() {
        let (_, repo) = setup().await;
        let mut input = NewClient::new("T-525", "John Silva", Gender::Male);
        input.contact_number = Some("0771234567".to_string());
        let client = repo.create(&input).await.unwrap();

        let mut edit = NewClient::new("T-525", "John A. Silva", Gender::Male);
        edit.address = Some("Kurunegala".to_string());
        let updated = repo.update(client.id, &edit).await.unwrap();

        assert_eq!(updated.full_name, "John A. Silva");
        assert_eq!(updated.contact_number, None);
        assert_eq!(updated.address.as_deref(), Some("Kurunegala"));
        assert_eq!(updated.created_at, client.created_at);

        let err = repo.update(Uuid::new_v4(), &edit).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_marital_status_must_be_marital_choice() {
        let (pool, repo) = setup().await;
        let lookups = SqliteLookupRepository::new(pool);
        let clinic = lookups
            .create_choice(&NewChoice { category: ChoiceCategory::ClinicType, name: "STD Clinic".to_string() })
            .await
            .unwrap();
        let married = lookups
            .create_choice(&NewChoice { category: ChoiceCategory::MaritalStatus, name: "Married".to_string() })
            .await
            .unwrap();

        let mut input = NewClient::new("T-9", "Ruwan Fernando", Gender::Male);
        input.marital_status_id = Some(clinic.id);
        let err = repo.create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::CategoryMismatch { ref expected, ref actual, .. })
                if expected == "marital_status" && actual == "clinic_type"
        ));

        input.marital_status_id = Some(married.id);
        assert!(repo.create(&input).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_unit_is_a_relationship_error() {
        let (_, repo) = setup().await;
        let mut input = NewClient::new("T-10", "Saman Kumara", Gender::Male);
        input.unit_id = Some(Uuid::new_v4());
        let err = repo.create(&input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ValidationError::Relationship { .. })));
    }

    #[tokio::test]
    async fn test_list_and_search_by_name() {
        let (_, repo) = setup().await;
        repo.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();
        repo.create(&NewClient::new("T-100", "Amara Jayasinghe", Gender::Female)).await.unwrap();
        let mut third = NewClient::new("T-200", "Kasun Bandara", Gender::Male);
        third.contact_number = Some("0719998888".to_string());
        repo.create(&third).await.unwrap();

        let all = repo.find_all(None, PaginationParams::default()).await.unwrap();
        let names: Vec<_> = all.items.iter().map(|c| c.full_name.as_str()).collect();
        assert_eq!(names, vec!["Amara Jayasinghe", "John Silva", "Kasun Bandara"]);
        assert_eq!(all.total, 3);

        let found = repo.find_all(Some("silva"), PaginationParams::default()).await.unwrap();
        assert_eq!(found.items.len(), 1);
        let by_phone = repo.find_all(Some("99988"), PaginationParams::default()).await.unwrap();
        assert_eq!(by_phone.items[0].registration_number, "T-200");

        let page = repo.find_all(None, PaginationParams::new(2, 2)).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_one_death_record_per_client() {
        let (_, repo) = setup().await;
        let client = repo.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();
        let death = NewClientDeath {
            date_of_death: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            cause_of_death: Some("Cardiac failure".to_string()),
            postmortem_findings: None,
            notes: None,
        };

        let record = repo.record_death(client.id, &death).await.unwrap();
        assert_eq!(record.client_id, client.id);
        let err = repo.record_death(client.id, &death).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ValidationError::Unique { .. })));
        assert!(repo.find_death_for_client(client.id).await.unwrap().is_some());

        let err = repo.record_death(Uuid::new_v4(), &death).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_family_member_linked_client() {
        let (_, repo) = setup().await;
        let client = repo.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();
        let sibling = repo.create(&NewClient::new("T-526", "Mary Silva", Gender::Female)).await.unwrap();

        let member = repo
            .add_family_member(
                client.id,
                &NewFamilyMember {
                    relationship: Relationship::Sibling,
                    name: "Mary Silva".to_string(),
                    linked_registration_number: Some("T-526".to_string()),
                    is_carrier: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        repo.add_family_member(
            client.id,
            &NewFamilyMember { name: "Anura Silva".to_string(), ..Default::default() },
        )
        .await
        .unwrap();

        let members = repo.list_family_members(client.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "Anura Silva");
        assert_eq!(members[0].relationship, Relationship::Other);

        let linked = repo.find_linked_client(member.id).await.unwrap().unwrap();
        assert_eq!(linked.id, sibling.id);
        assert!(repo.find_linked_client(members[0].id).await.unwrap().is_none());
    }
}
