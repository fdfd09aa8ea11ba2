use crate::domains::core::dependency_checker::{ReferentialAction, ReferentialGraph};
use crate::domains::core::repository::{ensure_exists, finish_tx};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::EntityKind;
use async_trait::async_trait;
use futures::future::BoxFuture;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_scalar, Pool, Sqlite, SqliteConnection};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Rows removed and columns cleared by one delete, per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    /// table name -> rows deleted (the root row included)
    pub deleted: BTreeMap<String, u64>,
    /// "table.column" -> rows whose reference was set to NULL
    pub nulled: BTreeMap<String, u64>,
}

impl DeleteSummary {
    fn record_deleted(&mut self, kind: EntityKind, rows: u64) {
        if rows > 0 {
            *self.deleted.entry(kind.table_name().to_string()).or_insert(0) += rows;
        }
    }

    fn record_nulled(&mut self, kind: EntityKind, column: &str, rows: u64) {
        if rows > 0 {
            *self
                .nulled
                .entry(format!("{}.{}", kind.table_name(), column))
                .or_insert(0) += rows;
        }
    }

    pub fn deleted_count(&self, kind: EntityKind) -> u64 {
        self.deleted.get(kind.table_name()).copied().unwrap_or(0)
    }

    pub fn nulled_count(&self, kind: EntityKind, column: &str) -> u64 {
        self.nulled
            .get(&format!("{}.{}", kind.table_name(), column))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_deleted(&self) -> u64 {
        self.deleted.values().sum()
    }
}

/// Deletes rows of any registry entity, applying the referential actions of its dependents.
#[async_trait]
pub trait DeleteService: Send + Sync {
    /// Delete one row and everything it owns in a single transaction.
    /// A missing id is `EntityNotFound`; any failure leaves the store untouched.
    async fn delete(&self, kind: EntityKind, id: Uuid) -> DomainResult<DeleteSummary>;

    /// Report what `delete` would remove or clear, without writing.
    async fn preview_delete(&self, kind: EntityKind, id: Uuid) -> DomainResult<DeleteSummary>;
}

pub struct CascadeDeleteService {
    pool: Pool<Sqlite>,
    graph: &'static ReferentialGraph,
}

impl CascadeDeleteService {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            graph: ReferentialGraph::registry(),
        }
    }
}

fn child_ids_sql(child: EntityKind, column: &str) -> String {
    format!("SELECT id FROM {} WHERE {} = ?", child.table_name(), column)
}

/// Children first, then nulled references, then the row itself, so every
/// statement leaves the foreign keys satisfied.
fn delete_row<'a>(
    graph: &'a ReferentialGraph,
    kind: EntityKind,
    id: String,
    conn: &'a mut SqliteConnection,
    summary: &'a mut DeleteSummary,
) -> BoxFuture<'a, DomainResult<u64>> {
    Box::pin(async move {
        for reference in graph.references_to(kind) {
            match reference.action {
                ReferentialAction::Cascade => {
                    let sql = child_ids_sql(reference.child, reference.column);
                    let child_ids: Vec<String> = query_scalar(&sql)
                        .bind(&id)
                        .fetch_all(&mut *conn)
                        .await
                        .map_err(DbError::from)?;
                    for child_id in child_ids {
                        delete_row(graph, reference.child, child_id, &mut *conn, &mut *summary).await?;
                    }
                }
                ReferentialAction::SetNull => {
                    let sql = format!(
                        "UPDATE {} SET {} = NULL WHERE {} = ?",
                        reference.child.table_name(),
                        reference.column,
                        reference.column
                    );
                    let result = query(&sql)
                        .bind(&id)
                        .execute(&mut *conn)
                        .await
                        .map_err(DbError::from)?;
                    summary.record_nulled(reference.child, reference.column, result.rows_affected());
                }
            }
        }

        let sql = format!("DELETE FROM {} WHERE id = ?", kind.table_name());
        let result = query(&sql)
            .bind(&id)
            .execute(&mut *conn)
            .await
            .map_err(DbError::from)?;
        debug!("Deleted {} {}", kind, id);
        summary.record_deleted(kind, result.rows_affected());
        Ok(result.rows_affected())
    })
}

/// Same walk as `delete_row`, counting instead of writing.
fn preview_row<'a>(
    graph: &'a ReferentialGraph,
    kind: EntityKind,
    id: String,
    conn: &'a mut SqliteConnection,
    summary: &'a mut DeleteSummary,
) -> BoxFuture<'a, DomainResult<()>> {
    Box::pin(async move {
        for reference in graph.references_to(kind) {
            match reference.action {
                ReferentialAction::Cascade => {
                    let sql = child_ids_sql(reference.child, reference.column);
                    let child_ids: Vec<String> = query_scalar(&sql)
                        .bind(&id)
                        .fetch_all(&mut *conn)
                        .await
                        .map_err(DbError::from)?;
                    for child_id in child_ids {
                        preview_row(graph, reference.child, child_id, &mut *conn, &mut *summary).await?;
                    }
                }
                ReferentialAction::SetNull => {
                    let sql = format!(
                        "SELECT COUNT(*) FROM {} WHERE {} = ?",
                        reference.child.table_name(),
                        reference.column
                    );
                    let count: i64 = query_scalar(&sql)
                        .bind(&id)
                        .fetch_one(&mut *conn)
                        .await
                        .map_err(DbError::from)?;
                    summary.record_nulled(reference.child, reference.column, count as u64);
                }
            }
        }
        summary.record_deleted(kind, 1);
        Ok(())
    })
}

#[async_trait]
impl DeleteService for CascadeDeleteService {
    async fn delete(&self, kind: EntityKind, id: Uuid) -> DomainResult<DeleteSummary> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let result = async {
            ensure_exists(&mut tx, kind, id).await?;
            let mut summary = DeleteSummary::default();
            delete_row(self.graph, kind, id.to_string(), &mut tx, &mut summary).await?;
            Ok::<_, DomainError>(summary)
        }
        .await;

        let summary = finish_tx(tx, result, "cascade delete").await?;
        info!(
            "Deleted {} {} ({} rows removed, {} references cleared)",
            kind,
            id,
            summary.total_deleted(),
            summary.nulled.values().sum::<u64>()
        );
        Ok(summary)
    }

    async fn preview_delete(&self, kind: EntityKind, id: Uuid) -> DomainResult<DeleteSummary> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        ensure_exists(&mut conn, kind, id).await?;
        let mut summary = DeleteSummary::default();
        preview_row(self.graph, kind, id.to_string(), &mut conn, &mut summary).await?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::admission::repository::{AdmissionRepository, SqliteAdmissionRepository};
    use crate::domains::admission::types::{NewAdmission, NewTransfusion};
    use crate::domains::client::repository::{ClientRepository, SqliteClientRepository};
    use crate::domains::client::types::{Gender, NewClient, NewClientDeath, NewClientTransfer, NewFamilyMember};
    use crate::domains::clinical::repository::{ClinicalRepository, SqliteClinicalRepository};
    use crate::domains::clinical::types::{
        NewClinicVisit, NewComplication, NewComplicationType, NewGrowthRecord, NewInvestigation,
        NewInvestigationType, NewVaccination,
    };
    use crate::domains::core::repository::FindById;
    use crate::domains::drug::repository::{DrugRepository, SqliteDrugRepository};
    use crate::domains::drug::types::{NewDrug, NewDrugName};
    use crate::domains::lookup::repository::{LookupRepository, SqliteLookupRepository};
    use crate::domains::lookup::types::{
        ChoiceCategory, NewChoice, NewDiagnosisType, NewDistrict, NewDsDivision, NewProvince, NewThalassemiaUnit,
    };
    use crate::test_support::migrated_pool;
    use crate::types::PaginationParams;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn count(pool: &Pool<Sqlite>, table: &str) -> i64 {
        query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_deleting_division_nulls_client_references() {
        let pool = migrated_pool().await;
        let lookups = SqliteLookupRepository::new(pool.clone());
        let clients = SqliteClientRepository::new(pool.clone());

        let province = lookups.create_province(&NewProvince { name: "North Western Province".to_string() }).await.unwrap();
        let district = lookups
            .create_district(&NewDistrict { name: "Kurunegala".to_string(), province_id: province.id })
            .await
            .unwrap();
        let division = lookups
            .create_ds_division(&NewDsDivision { name: "Mawathagama".to_string(), district_id: district.id })
            .await
            .unwrap();
        let unit = lookups
            .create_unit(&NewThalassemiaUnit {
                name: "National Thalassaemia Centre".to_string(),
                description: None,
                ds_division_id: Some(division.id),
            })
            .await
            .unwrap();

        let mut input = NewClient::new("T-525", "John Silva", Gender::Male);
        input.ds_division_id = Some(division.id);
        let client = clients.create(&input).await.unwrap();

        let service = CascadeDeleteService::new(pool.clone());
        let summary = service.delete(EntityKind::DsDivision, division.id).await.unwrap();

        assert_eq!(summary.deleted_count(EntityKind::DsDivision), 1);
        assert_eq!(summary.nulled_count(EntityKind::Client, "ds_division_id"), 1);
        assert_eq!(summary.nulled_count(EntityKind::ThalassemiaUnit, "ds_division_id"), 1);
        assert_eq!(clients.find_by_id(client.id).await.unwrap().ds_division_id, None);
        assert_eq!(lookups.find_unit(unit.id).await.unwrap().ds_division_id, None);
        assert_eq!(count(&pool, "districts").await, 1);
    }

    #[tokio::test]
    async fn test_deleting_province_cascades_through_geography() {
        let pool = migrated_pool().await;
        let lookups = SqliteLookupRepository::new(pool.clone());
        let province = lookups.create_province(&NewProvince { name: "North Western Province".to_string() }).await.unwrap();
        let district = lookups
            .create_district(&NewDistrict { name: "Puttalam".to_string(), province_id: province.id })
            .await
            .unwrap();
        for name in ["Chilaw", "Wennappuwa"] {
            lookups
                .create_ds_division(&NewDsDivision { name: name.to_string(), district_id: district.id })
                .await
                .unwrap();
        }

        let summary = CascadeDeleteService::new(pool.clone())
            .delete(EntityKind::Province, province.id)
            .await
            .unwrap();
        assert_eq!(summary.deleted_count(EntityKind::DsDivision), 2);
        assert_eq!(summary.deleted_count(EntityKind::District), 1);
        assert_eq!(summary.total_deleted(), 4);
        assert_eq!(count(&pool, "ds_divisions").await, 0);
    }

    #[tokio::test]
    async fn test_deleting_client_removes_all_dependents() {
        let pool = migrated_pool().await;
        let clients = SqliteClientRepository::new(pool.clone());
        let drugs = SqliteDrugRepository::new(pool.clone());
        let clinical = SqliteClinicalRepository::new(pool.clone());
        let admissions = SqliteAdmissionRepository::new(pool.clone());

        let client = clients.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();
        let other = clients.create(&NewClient::new("T-600", "Nimali Perera", Gender::Female)).await.unwrap();

        clients
            .record_death(
                client.id,
                &NewClientDeath {
                    date_of_death: date(2024, 4, 1),
                    cause_of_death: None,
                    postmortem_findings: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        clients
            .record_transfer(client.id, &NewClientTransfer { reason: Some("Moved".to_string()), ..Default::default() })
            .await
            .unwrap();
        clients
            .add_family_member(client.id, &NewFamilyMember { name: "Mary Silva".to_string(), ..Default::default() })
            .await
            .unwrap();

        let mut drug = NewDrug::new(date(2023, 4, 1), None, "3 months");
        drug.dose = Some("500 mg".to_string());
        drug.regimen = Some("Daily".to_string());
        drugs.create_drug(client.id, &drug).await.unwrap();
        drugs.create_drug(other.id, &drug).await.unwrap();

        clinical
            .create_complication(
                client.id,
                &NewComplication { complication_type_id: None, detected_date: date(2023, 3, 1), status_id: None, remarks: None },
            )
            .await
            .unwrap();
        clinical
            .create_vaccination(
                client.id,
                &NewVaccination { vaccine_name_id: None, date_given: date(2023, 5, 1), next_dose_date: None },
            )
            .await
            .unwrap();
        clinical
            .create_investigation(
                client.id,
                &NewInvestigation {
                    date_done: date(2023, 7, 1),
                    investigation_type_id: None,
                    value: Some("2400".to_string()),
                    unit: Some("ng/mL".to_string()),
                    laboratory_name: None,
                },
            )
            .await
            .unwrap();
        clinical
            .create_growth_record(
                client.id,
                &NewGrowthRecord { date_measured: date(2023, 8, 1), growth_type_id: None, value: dec!(132.50), percentile: None },
            )
            .await
            .unwrap();
        clinical.create_clinic_visit(client.id, &NewClinicVisit::new(date(2023, 6, 1))).await.unwrap();
        for (admitted, transfusions) in [(date(2024, 1, 5), 2), (date(2024, 2, 5), 1)] {
            let admission = admissions.create_admission(client.id, &NewAdmission::new(admitted)).await.unwrap();
            for _ in 0..transfusions {
                admissions
                    .create_transfusion(admission.id, &NewTransfusion::new(admitted))
                    .await
                    .unwrap();
            }
        }
        let kept = admissions.create_admission(other.id, &NewAdmission::new(date(2024, 3, 1))).await.unwrap();
        admissions.create_transfusion(kept.id, &NewTransfusion::new(date(2024, 3, 1))).await.unwrap();

        let service = CascadeDeleteService::new(pool.clone());
        let summary = service.delete(EntityKind::Client, client.id).await.unwrap();

        for (kind, rows) in [
            (EntityKind::Client, 1),
            (EntityKind::ClientDeath, 1),
            (EntityKind::ClientTransfer, 1),
            (EntityKind::FamilyMember, 1),
            (EntityKind::Drug, 1),
            (EntityKind::Complication, 1),
            (EntityKind::Vaccination, 1),
            (EntityKind::Investigation, 1),
            (EntityKind::GrowthRecord, 1),
            (EntityKind::ClinicVisit, 1),
            (EntityKind::Admission, 2),
            (EntityKind::Transfusion, 3),
        ] {
            assert_eq!(summary.deleted_count(kind), rows, "{}", kind.table_name());
        }
        assert_eq!(summary.total_deleted(), 15);

        for (table, remaining) in [
            ("client_deaths", 0),
            ("client_transfers", 0),
            ("family_members", 0),
            ("drugs", 1),
            ("complications", 0),
            ("vaccinations", 0),
            ("investigations", 0),
            ("growth_records", 0),
            ("clinic_visits", 0),
            ("admissions", 1),
            ("transfusions", 1),
        ] {
            assert_eq!(count(&pool, table).await, remaining, "{}", table);
        }

        let listed = clients.find_all(None, PaginationParams::default()).await.unwrap();
        let registration_numbers: Vec<_> = listed.items.iter().map(|c| c.registration_number.as_str()).collect();
        assert_eq!(registration_numbers, vec!["T-600"]);
    }

    #[tokio::test]
    async fn test_deleting_admission_removes_only_its_transfusions() {
        let pool = migrated_pool().await;
        let clients = SqliteClientRepository::new(pool.clone());
        let admissions = SqliteAdmissionRepository::new(pool.clone());
        let client = clients.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();

        let first = admissions.create_admission(client.id, &NewAdmission::new(date(2024, 1, 5))).await.unwrap();
        let second = admissions.create_admission(client.id, &NewAdmission::new(date(2024, 2, 5))).await.unwrap();
        for admission in [&first, &first, &second] {
            admissions
                .create_transfusion(admission.id, &NewTransfusion::new(admission.date_of_admission))
                .await
                .unwrap();
        }

        let summary = CascadeDeleteService::new(pool.clone())
            .delete(EntityKind::Admission, first.id)
            .await
            .unwrap();
        assert_eq!(summary.deleted_count(EntityKind::Admission), 1);
        assert_eq!(summary.deleted_count(EntityKind::Transfusion), 2);
        assert_eq!(summary.deleted_count(EntityKind::Client), 0);

        assert!(clients.find_by_id(client.id).await.is_ok());
        let remaining = admissions.list_transfusions_for_client(client.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].admission_id, second.id);
    }

    #[tokio::test]
    async fn test_failed_cascade_rolls_back_everything() {
        let pool = migrated_pool().await;
        let clients = SqliteClientRepository::new(pool.clone());
        let admissions = SqliteAdmissionRepository::new(pool.clone());
        let client = clients.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();
        clients
            .add_family_member(client.id, &NewFamilyMember { name: "Mary Silva".to_string(), ..Default::default() })
            .await
            .unwrap();
        let admission = admissions.create_admission(client.id, &NewAdmission::new(date(2024, 1, 5))).await.unwrap();
        admissions.create_transfusion(admission.id, &NewTransfusion::new(date(2024, 1, 5))).await.unwrap();

        // Family members go before admissions, so the failure lands mid-walk.
        sqlx::raw_sql(
            "CREATE TRIGGER transfusions_locked BEFORE DELETE ON transfusions
             BEGIN SELECT RAISE(ABORT, 'transfusions are locked'); END;",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = CascadeDeleteService::new(pool.clone())
            .delete(EntityKind::Client, client.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Database(DbError::Sqlx(_))));
        assert!(err.to_string().contains("transfusions are locked"));

        for table in ["clients", "family_members", "admissions", "transfusions"] {
            assert_eq!(count(&pool, table).await, 1, "{}", table);
        }
    }

    #[tokio::test]
    async fn test_deleting_unit_nulls_clients_and_transfers() {
        let pool = migrated_pool().await;
        let lookups = SqliteLookupRepository::new(pool.clone());
        let clients = SqliteClientRepository::new(pool.clone());
        let unit = lookups
            .create_unit(&NewThalassemiaUnit {
                name: "Kurunegala Teaching Hospital".to_string(),
                description: None,
                ds_division_id: None,
            })
            .await
            .unwrap();

        let mut input = NewClient::new("T-525", "John Silva", Gender::Male);
        input.unit_id = Some(unit.id);
        let client = clients.create(&input).await.unwrap();
        let moved = clients.create(&NewClient::new("T-600", "Nimali Perera", Gender::Female)).await.unwrap();
        clients
            .record_transfer(
                moved.id,
                &NewClientTransfer { transferred_unit_id: Some(unit.id), date_of_transfer: Some(date(2024, 2, 1)), reason: None },
            )
            .await
            .unwrap();

        let summary = CascadeDeleteService::new(pool.clone())
            .delete(EntityKind::ThalassemiaUnit, unit.id)
            .await
            .unwrap();

        assert_eq!(summary.deleted_count(EntityKind::ThalassemiaUnit), 1);
        assert_eq!(summary.nulled_count(EntityKind::Client, "unit_id"), 1);
        assert_eq!(summary.nulled_count(EntityKind::ClientTransfer, "transferred_unit_id"), 1);
        assert_eq!(clients.find_by_id(client.id).await.unwrap().unit_id, None);
        let transfer = clients.find_transfer_for_client(moved.id).await.unwrap().unwrap();
        assert_eq!(transfer.transferred_unit_id, None);
        assert_eq!(transfer.date_of_transfer, Some(date(2024, 2, 1)));
        assert_eq!(count(&pool, "clients").await, 2);
    }

    #[tokio::test]
    async fn test_deleting_master_types_detaches_clinical_rows() {
        let pool = migrated_pool().await;
        let clients = SqliteClientRepository::new(pool.clone());
        let drugs = SqliteDrugRepository::new(pool.clone());
        let clinical = SqliteClinicalRepository::new(pool.clone());
        let service = CascadeDeleteService::new(pool.clone());
        let client = clients.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();

        let cardiac = clinical
            .create_complication_type(&NewComplicationType { name: "Cardiac".to_string(), description: None })
            .await
            .unwrap();
        let complication = clinical
            .create_complication(
                client.id,
                &NewComplication {
                    complication_type_id: Some(cardiac.id),
                    detected_date: date(2023, 3, 1),
                    status_id: None,
                    remarks: Some("Mild".to_string()),
                },
            )
            .await
            .unwrap();
        let summary = service.delete(EntityKind::ComplicationType, cardiac.id).await.unwrap();
        assert_eq!(summary.nulled_count(EntityKind::Complication, "complication_type_id"), 1);
        let complication = clinical.find_complication(complication.id).await.unwrap();
        assert_eq!(complication.complication_type_id, None);
        assert_eq!(complication.remarks.as_deref(), Some("Mild"));

        let ferritin = clinical
            .create_investigation_type(&NewInvestigationType {
                name: "Serum Ferritin".to_string(),
                description: None,
                unit: Some("ng/mL".to_string()),
            })
            .await
            .unwrap();
        let investigation = clinical
            .create_investigation(
                client.id,
                &NewInvestigation {
                    date_done: date(2023, 7, 1),
                    investigation_type_id: Some(ferritin.id),
                    value: Some("2400".to_string()),
                    unit: None,
                    laboratory_name: None,
                },
            )
            .await
            .unwrap();
        let summary = service.delete(EntityKind::InvestigationType, ferritin.id).await.unwrap();
        assert_eq!(summary.nulled_count(EntityKind::Investigation, "investigation_type_id"), 1);
        let investigation = clinical.find_investigation(investigation.id).await.unwrap();
        assert_eq!(investigation.investigation_type_id, None);
        assert_eq!(investigation.value.as_deref(), Some("2400"));

        let deferasirox = drugs
            .create_drug_name(&NewDrugName {
                name: "Deferasirox".to_string(),
                dose: Some("500 mg".to_string()),
                regimen: Some("Daily".to_string()),
            })
            .await
            .unwrap();
        let drug = drugs
            .create_drug(client.id, &NewDrug::new(date(2023, 4, 1), Some(deferasirox.id), "3 months"))
            .await
            .unwrap();
        let summary = service.delete(EntityKind::DrugName, deferasirox.id).await.unwrap();
        assert_eq!(summary.nulled_count(EntityKind::Drug, "drug_name_id"), 1);
        let drug = drugs.find_drug(drug.id).await.unwrap();
        assert_eq!(drug.drug_name_id, None);
        assert_eq!(drug.dose, "500 mg");

        assert_eq!(count(&pool, "complications").await, 1);
        assert_eq!(count(&pool, "investigations").await, 1);
        assert_eq!(count(&pool, "drugs").await, 1);
    }

    #[tokio::test]
    async fn test_deleting_diagnosis_type_nulls_clients_and_family() {
        let pool = migrated_pool().await;
        let lookups = SqliteLookupRepository::new(pool.clone());
        let clients = SqliteClientRepository::new(pool.clone());

        let trait_type = lookups
            .create_diagnosis_type(&NewDiagnosisType { name: "Beta Thalassemia Trait".to_string(), ..Default::default() })
            .await
            .unwrap();
        let mut input = NewClient::new("T-525", "John Silva", Gender::Male);
        input.diagnosis_id = Some(trait_type.id);
        let client = clients.create(&input).await.unwrap();
        let member = clients
            .add_family_member(
                client.id,
                &NewFamilyMember {
                    name: "Mary Silva".to_string(),
                    diagnosis_id: Some(trait_type.id),
                    is_carrier: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let summary = CascadeDeleteService::new(pool)
            .delete(EntityKind::DiagnosisType, trait_type.id)
            .await
            .unwrap();

        assert_eq!(summary.nulled_count(EntityKind::Client, "diagnosis_id"), 1);
        assert_eq!(summary.nulled_count(EntityKind::FamilyMember, "diagnosis_id"), 1);
        assert_eq!(clients.find_by_id(client.id).await.unwrap().diagnosis_id, None);
        assert_eq!(clients.find_family_member(member.id).await.unwrap().diagnosis_id, None);
    }

    #[tokio::test]
    async fn test_deleting_choice_nulls_every_reference() {
        let pool = migrated_pool().await;
        let lookups = SqliteLookupRepository::new(pool.clone());
        let clinical = SqliteClinicalRepository::new(pool.clone());
        let clients = SqliteClientRepository::new(pool.clone());
        let client = clients.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();
        let hep_b = lookups
            .create_choice(&NewChoice { category: ChoiceCategory::VaccineName, name: "Hepatitis B".to_string() })
            .await
            .unwrap();
        let vaccination = clinical
            .create_vaccination(
                client.id,
                &NewVaccination { vaccine_name_id: Some(hep_b.id), date_given: date(2023, 5, 1), next_dose_date: None },
            )
            .await
            .unwrap();

        let summary = CascadeDeleteService::new(pool).delete(EntityKind::Choice, hep_b.id).await.unwrap();
        assert_eq!(summary.nulled_count(EntityKind::Vaccination, "vaccine_name_id"), 1);
        assert_eq!(clinical.find_vaccination(vaccination.id).await.unwrap().vaccine_name_id, None);
    }

    #[tokio::test]
    async fn test_missing_row_is_not_found() {
        let service = CascadeDeleteService::new(migrated_pool().await);
        let err = service.delete(EntityKind::Client, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
        let err = service.preview_delete(EntityKind::Admission, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_preview_writes_nothing() {
        let pool = migrated_pool().await;
        let clients = SqliteClientRepository::new(pool.clone());
        let admissions = SqliteAdmissionRepository::new(pool.clone());
        let client = clients.create(&NewClient::new("T-525", "John Silva", Gender::Male)).await.unwrap();
        let admission = admissions.create_admission(client.id, &NewAdmission::new(date(2024, 1, 5))).await.unwrap();
        admissions.create_transfusion(admission.id, &NewTransfusion::new(date(2024, 1, 5))).await.unwrap();

        let preview = CascadeDeleteService::new(pool.clone())
            .preview_delete(EntityKind::Client, client.id)
            .await
            .unwrap();
        assert_eq!(preview.deleted_count(EntityKind::Transfusion), 1);
        assert_eq!(preview.total_deleted(), 3);
        assert_eq!(count(&pool, "transfusions").await, 1);
        assert!(clients.find_by_id(client.id).await.is_ok());
    }
}
