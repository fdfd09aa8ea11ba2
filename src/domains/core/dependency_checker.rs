use crate::errors::{DbError, DomainResult};
use crate::types::EntityKind;
use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::{query_scalar, Pool, Sqlite, SqliteConnection};
use std::collections::HashMap;
use uuid::Uuid;

/// What happens to a referencing row when the row it points at is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// The referencing row is deleted too, recursively.
    Cascade,
    /// The referencing column is cleared and the row kept.
    SetNull,
}

/// One foreign-key edge: `child.column` points at the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub child: EntityKind,
    pub column: &'static str,
    pub action: ReferentialAction,
}

/// Dependency information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Name of the table with dependent records
    pub table_name: String,

    /// Count of dependent records
    pub count: i64,

    /// Name of the foreign key column
    pub foreign_key_column: String,

    /// What a delete of the parent does to these rows
    pub action: ReferentialAction,
}

/// The registry's ownership graph. Maps each parent to every column that references it.
#[derive(Debug)]
pub struct ReferentialGraph {
    references: HashMap<EntityKind, Vec<Reference>>,
}

lazy_static! {
    static ref REGISTRY_GRAPH: ReferentialGraph = ReferentialGraph::build();
}

impl ReferentialGraph {
    /// The graph describing the registry schema.
    pub fn registry() -> &'static ReferentialGraph {
        &REGISTRY_GRAPH
    }

    fn build() -> Self {
        use EntityKind::*;
        use ReferentialAction::*;

        let edge = |child, column, action| Reference { child, column, action };
        let mut references = HashMap::new();

        // Everything recorded against a patient goes with the patient.
        references.insert(
            Client,
            vec![
                edge(ClientDeath, "client_id", Cascade),
                edge(ClientTransfer, "client_id", Cascade),
                edge(FamilyMember, "client_id", Cascade),
                edge(Drug, "client_id", Cascade),
                edge(Complication, "client_id", Cascade),
                edge(Vaccination, "client_id", Cascade),
                edge(Investigation, "client_id", Cascade),
                edge(GrowthRecord, "client_id", Cascade),
                edge(Admission, "client_id", Cascade),
                edge(ClinicVisit, "client_id", Cascade),
            ],
        );
        references.insert(Admission, vec![edge(Transfusion, "admission_id", Cascade)]);

        // Geography
        references.insert(Province, vec![edge(District, "province_id", Cascade)]);
        references.insert(District, vec![edge(DsDivision, "district_id", Cascade)]);
        references.insert(
            DsDivision,
            vec![
                edge(ThalassemiaUnit, "ds_division_id", SetNull),
                edge(Client, "ds_division_id", SetNull),
            ],
        );

        // Master lists are detached from, never deleted with, the records using them.
        references.insert(
            DiagnosisType,
            vec![
                edge(Client, "diagnosis_id", SetNull),
                edge(FamilyMember, "diagnosis_id", SetNull),
            ],
        );
        references.insert(
            ThalassemiaUnit,
            vec![
                edge(Client, "unit_id", SetNull),
                edge(ClientTransfer, "transferred_unit_id", SetNull),
            ],
        );
        references.insert(ComplicationType, vec![edge(Complication, "complication_type_id", SetNull)]);
        references.insert(InvestigationType, vec![edge(Investigation, "investigation_type_id", SetNull)]);
        references.insert(DrugName, vec![edge(Drug, "drug_name_id", SetNull)]);
        references.insert(
            Choice,
            vec![
                edge(Client, "marital_status_id", SetNull),
                edge(Complication, "status_id", SetNull),
                edge(Vaccination, "vaccine_name_id", SetNull),
                edge(GrowthRecord, "type_id", SetNull),
                edge(Transfusion, "special_type_id", SetNull),
                edge(ClinicVisit, "clinic_type_id", SetNull),
            ],
        );

        Self { references }
    }

    /// Every column referencing `parent`. Empty for leaf entities.
    pub fn references_to(&self, parent: EntityKind) -> &[Reference] {
        self.references.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct dependents of one row with a non-zero count.
    pub async fn dependencies_of(
        &self,
        conn: &mut SqliteConnection,
        parent: EntityKind,
        id: Uuid,
    ) -> DomainResult<Vec<Dependency>> {
        let id_str = id.to_string();
        let mut dependencies = Vec::new();

        for reference in self.references_to(parent) {
            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?",
                reference.child.table_name(),
                reference.column
            );
            let count: i64 = query_scalar(&sql)
                .bind(&id_str)
                .fetch_one(&mut *conn)
                .await
                .map_err(DbError::from)?;

            if count > 0 {
                dependencies.push(Dependency {
                    table_name: reference.child.table_name().to_string(),
                    count,
                    foreign_key_column: reference.column.to_string(),
                    action: reference.action,
                });
            }
        }

        Ok(dependencies)
    }

    /// Total number of rows directly referencing one row.
    pub async fn count_references(
        &self,
        conn: &mut SqliteConnection,
        parent: EntityKind,
        id: Uuid,
    ) -> DomainResult<i64> {
        let dependencies = self.dependencies_of(conn, parent, id).await?;
        Ok(dependencies.iter().map(|dep| dep.count).sum())
    }
}

/// Trait for dependency checking
#[async_trait]
pub trait DependencyChecker: Send + Sync {
    /// Check for dependencies for an entity
    async fn check_dependencies(&self, kind: EntityKind, id: Uuid) -> DomainResult<Vec<Dependency>>;

    /// Get a simplified list of dependency tables
    async fn get_dependency_tables(&self, kind: EntityKind, id: Uuid) -> DomainResult<Vec<String>> {
        let dependencies = self.check_dependencies(kind, id).await?;
        Ok(dependencies.into_iter().map(|dep| dep.table_name).collect())
    }
}

/// SQLite implementation of the DependencyChecker
pub struct SqliteDependencyChecker {
    pool: Pool<Sqlite>,
    graph: &'static ReferentialGraph,
}

impl SqliteDependencyChecker {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            graph: ReferentialGraph::registry(),
        }
    }
}

#[async_trait]
impl DependencyChecker for SqliteDependencyChecker {
    async fn check_dependencies(&self, kind: EntityKind, id: Uuid) -> DomainResult<Vec<Dependency>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        self.graph.dependencies_of(&mut conn, kind, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::client::repository::{ClientRepository, SqliteClientRepository};
    use crate::domains::client::types::{Gender, NewClient};
    use crate::domains::lookup::repository::{LookupRepository, SqliteLookupRepository};
    use crate::domains::lookup::types::NewThalassemiaUnit;
    use crate::test_support::migrated_pool;

    #[test]
    fn test_client_owns_its_history() {
        let graph = ReferentialGraph::registry();
        let cascaded: Vec<_> = graph
            .references_to(EntityKind::Client)
            .iter()
            .filter(|r| r.action == ReferentialAction::Cascade)
            .map(|r| r.child)
            .collect();
        assert_eq!(cascaded.len(), 10);
        assert!(cascaded.contains(&EntityKind::Admission));
        assert!(cascaded.contains(&EntityKind::ClientDeath));
        assert!(!cascaded.contains(&EntityKind::Transfusion));

        let transfusions = graph.references_to(EntityKind::Admission);
        assert_eq!(transfusions[0].child, EntityKind::Transfusion);
        assert_eq!(transfusions[0].action, ReferentialAction::Cascade);
    }

    #[test]
    fn test_lookups_are_detached_not_deleted() {
        let graph = ReferentialGraph::registry();
        for parent in [
            EntityKind::DsDivision,
            EntityKind::DiagnosisType,
            EntityKind::ThalassemiaUnit,
            EntityKind::ComplicationType,
            EntityKind::InvestigationType,
            EntityKind::DrugName,
            EntityKind::Choice,
        ] {
            assert!(!graph.references_to(parent).is_empty());
            assert!(graph
                .references_to(parent)
                .iter()
                .all(|r| r.action == ReferentialAction::SetNull));
        }
        assert_eq!(graph.references_to(EntityKind::Choice).len(), 6);
        assert!(graph.references_to(EntityKind::Transfusion).is_empty());
    }

    #[test]
    fn test_every_edge_targets_a_known_table() {
        let graph = ReferentialGraph::registry();
        for parent in EntityKind::ALL {
            for reference in graph.references_to(parent) {
                assert!(EntityKind::from_table_name(reference.child.table_name()).is_some());
                assert!(reference.column.ends_with("_id"));
            }
        }
    }

    #[tokio::test]
    async fn test_checker_counts_live_references() {
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

        let checker = SqliteDependencyChecker::new(pool.clone());
        assert!(checker.check_dependencies(EntityKind::ThalassemiaUnit, unit.id).await.unwrap().is_empty());

        for (reg, name) in [("T-100", "Nimal Perera"), ("T-101", "Kamala Perera")] {
            let mut input = NewClient::new(reg, name, Gender::Female);
            input.unit_id = Some(unit.id);
            clients.create(&input).await.unwrap();
        }

        let dependencies = checker.check_dependencies(EntityKind::ThalassemiaUnit, unit.id).await.unwrap();
        assert_eq!(dependencies.len(), 1);
        assert_eq!(dependencies[0].table_name, "clients");
        assert_eq!(dependencies[0].count, 2);
        assert_eq!(dependencies[0].foreign_key_column, "unit_id");
        assert_eq!(dependencies[0].action, ReferentialAction::SetNull);
        assert_eq!(
            checker.get_dependency_tables(EntityKind::ThalassemiaUnit, unit.id).await.unwrap(),
            vec!["clients".to_string()]
        );
    }
}
