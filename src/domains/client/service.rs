use crate::auth::AuthContext;
use crate::domains::admission::repository::AdmissionRepository;
use crate::domains::admission::types::{Admission, Transfusion};
use crate::domains::client::age::PreciseAge;
use crate::domains::client::repository::ClientRepository;
use crate::domains::client::types::{
    Client, ClientDeath, ClientTransfer, FamilyMember, NewClient, NewClientDeath, NewClientTransfer,
    NewFamilyMember,
};
use crate::domains::clinical::repository::ClinicalRepository;
use crate::domains::clinical::types::{ClinicVisit, Complication, GrowthRecord, Investigation, Vaccination};
use crate::domains::core::delete_service::{DeleteService, DeleteSummary};
use crate::domains::core::repository::FindById;
use crate::domains::drug::repository::DrugRepository;
use crate::domains::drug::types::Drug;
use crate::domains::permission::Permission;
use crate::errors::ServiceResult;
use crate::types::{EntityKind, PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Related records that can be loaded alongside a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientInclude {
    Death,
    Transfer,
    FamilyMembers,
    Drugs,
    Complications,
    Vaccinations,
    Investigations,
    GrowthRecords,
    Admissions,
    Transfusions,
    ClinicVisits,
    All,
}

impl ClientInclude {
    fn is_clinical(&self) -> bool {
        !matches!(
            self,
            ClientInclude::Death | ClientInclude::Transfer | ClientInclude::FamilyMembers
        )
    }
}

/// A client with derived ages and whichever related records were asked for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientResponse {
    pub client: Client,
    pub display_name: String,
    pub age: Option<u32>,
    pub precise_age: Option<PreciseAge>,
    pub age_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death: Option<ClientDeath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<ClientTransfer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_members: Option<Vec<FamilyMember>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drugs: Option<Vec<Drug>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complications: Option<Vec<Complication>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaccinations: Option<Vec<Vaccination>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investigations: Option<Vec<Investigation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_records: Option<Vec<GrowthRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admissions: Option<Vec<Admission>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfusions: Option<Vec<Transfusion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_visits: Option<Vec<ClinicVisit>>,
}

impl ClientResponse {
    /// Response with ages computed as of `as_of` and no related records
    pub fn from_client_on(client: Client, as_of: NaiveDate) -> Self {
        Self {
            display_name: client.to_string(),
            age: client.age_on(as_of),
            precise_age: client.precise_age_on(as_of),
            age_string: client.age_string_on(as_of),
            client,
            death: None,
            transfer: None,
            family_members: None,
            drugs: None,
            complications: None,
            vaccinations: None,
            investigations: None,
            growth_records: None,
            admissions: None,
            transfusions: None,
            clinic_visits: None,
        }
    }
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self::from_client_on(client, Local::now().date_naive())
    }
}

/// Permission a caller needs to delete a row of `kind`
pub fn delete_permission_for(kind: EntityKind) -> Permission {
    match kind {
        EntityKind::Client
        | EntityKind::ClientDeath
        | EntityKind::ClientTransfer
        | EntityKind::FamilyMember => Permission::DeleteClients,
        EntityKind::Drug
        | EntityKind::Complication
        | EntityKind::Vaccination
        | EntityKind::Investigation
        | EntityKind::GrowthRecord
        | EntityKind::Admission
        | EntityKind::Transfusion
        | EntityKind::ClinicVisit => Permission::DeleteClinicalRecords,
        EntityKind::DrugName
        | EntityKind::ComplicationType
        | EntityKind::InvestigationType
        | EntityKind::Choice
        | EntityKind::Province
        | EntityKind::District
        | EntityKind::DsDivision
        | EntityKind::ThalassemiaUnit
        | EntityKind::DiagnosisType => Permission::ManageLookups,
    }
}

/// Client-facing operations, each gated on the caller's permissions
#[async_trait]
pub trait ClientService: Send + Sync {
    async fn create_client(&self, new_client: NewClient, auth: &AuthContext) -> ServiceResult<ClientResponse>;

    async fn get_client_by_id(
        &self,
        id: Uuid,
        include: Option<&[ClientInclude]>,
        auth: &AuthContext,
    ) -> ServiceResult<ClientResponse>;

    async fn get_client_by_registration_number(
        &self,
        registration_number: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Option<ClientResponse>>;

    async fn list_clients(
        &self,
        search: Option<&str>,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<ClientResponse>>;

    async fn update_client(&self, id: Uuid, update: NewClient, auth: &AuthContext) -> ServiceResult<ClientResponse>;

    async fn record_death(
        &self,
        client_id: Uuid,
        death: NewClientDeath,
        auth: &AuthContext,
    ) -> ServiceResult<ClientDeath>;

    async fn record_transfer(
        &self,
        client_id: Uuid,
        transfer: NewClientTransfer,
        auth: &AuthContext,
    ) -> ServiceResult<ClientTransfer>;

    async fn add_family_member(
        &self,
        client_id: Uuid,
        member: NewFamilyMember,
        auth: &AuthContext,
    ) -> ServiceResult<FamilyMember>;

    /// Delete a client with every record it owns
    async fn delete_client(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<DeleteSummary>;

    async fn preview_delete_client(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<DeleteSummary>;

    /// Delete any registry row, applying the referential actions of its dependents
    async fn delete_record(&self, kind: EntityKind, id: Uuid, auth: &AuthContext) -> ServiceResult<DeleteSummary>;
}

pub struct ClientServiceImpl {
    repo: Arc<dyn ClientRepository>,
    drug_repo: Arc<dyn DrugRepository>,
    clinical_repo: Arc<dyn ClinicalRepository>,
    admission_repo: Arc<dyn AdmissionRepository>,
    delete_service: Arc<dyn DeleteService>,
}

impl ClientServiceImpl {
    pub fn new(
        repo: Arc<dyn ClientRepository>,
        drug_repo: Arc<dyn DrugRepository>,
        clinical_repo: Arc<dyn ClinicalRepository>,
        admission_repo: Arc<dyn AdmissionRepository>,
        delete_service: Arc<dyn DeleteService>,
    ) -> Self {
        Self {
            repo,
            drug_repo,
            clinical_repo,
            admission_repo,
            delete_service,
        }
    }

    async fn enrich_response(
        &self,
        mut response: ClientResponse,
        include: Option<&[ClientInclude]>,
        auth: &AuthContext,
    ) -> ServiceResult<ClientResponse> {
        let Some(include) = include else {
            return Ok(response);
        };
        if include.iter().any(ClientInclude::is_clinical) {
            auth.authorize(Permission::ViewClinicalRecords)?;
        }

        let wants = |item: ClientInclude| include.contains(&item) || include.contains(&ClientInclude::All);
        let id = response.client.id;

        if wants(ClientInclude::Death) {
            response.death = self.repo.find_death_for_client(id).await?;
        }
        if wants(ClientInclude::Transfer) {
            response.transfer = self.repo.find_transfer_for_client(id).await?;
        }
        if wants(ClientInclude::FamilyMembers) {
            response.family_members = Some(self.repo.list_family_members(id).await?);
        }
        if wants(ClientInclude::Drugs) {
            response.drugs = Some(self.drug_repo.list_drugs_for_client(id).await?);
        }
        if wants(ClientInclude::Complications) {
            response.complications = Some(self.clinical_repo.list_complications_for_client(id).await?);
        }
        if wants(ClientInclude::Vaccinations) {
            response.vaccinations = Some(self.clinical_repo.list_vaccinations_for_client(id).await?);
        }
        if wants(ClientInclude::Investigations) {
            response.investigations = Some(self.clinical_repo.list_investigations_for_client(id).await?);
        }
        if wants(ClientInclude::GrowthRecords) {
            response.growth_records = Some(self.clinical_repo.list_growth_records_for_client(id).await?);
        }
        if wants(ClientInclude::Admissions) {
            response.admissions = Some(self.admission_repo.list_admissions_for_client(id).await?);
        }
        if wants(ClientInclude::Transfusions) {
            response.transfusions = Some(self.admission_repo.list_transfusions_for_client(id).await?);
        }
        if wants(ClientInclude::ClinicVisits) {
            response.clinic_visits = Some(self.clinical_repo.list_clinic_visits_for_client(id).await?);
        }

        Ok(response)
    }
}

#[async_trait]
impl ClientService for ClientServiceImpl {
    async fn create_client(&self, new_client: NewClient, auth: &AuthContext) -> ServiceResult<ClientResponse> {
        auth.authorize(Permission::CreateClients)?;
        let client = self.repo.create(&new_client).await?;
        Ok(ClientResponse::from(client))
    }

    async fn get_client_by_id(
        &self,
        id: Uuid,
        include: Option<&[ClientInclude]>,
        auth: &AuthContext,
    ) -> ServiceResult<ClientResponse> {
        auth.authorize(Permission::ViewClients)?;
        let client = self.repo.find_by_id(id).await?;
        self.enrich_response(client.into(), include, auth).await
    }

    async fn get_client_by_registration_number(
        &self,
        registration_number: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Option<ClientResponse>> {
        auth.authorize(Permission::ViewClients)?;
        let client = self.repo.find_by_registration_number(registration_number).await?;
        Ok(client.map(ClientResponse::from))
    }

    async fn list_clients(
        &self,
        search: Option<&str>,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<ClientResponse>> {
        auth.authorize(Permission::ViewClients)?;
        let page = self.repo.find_all(search, params).await?;
        Ok(PaginatedResult {
            items: page.items.into_iter().map(ClientResponse::from).collect(),
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        })
    }

    async fn update_client(&self, id: Uuid, update: NewClient, auth: &AuthContext) -> ServiceResult<ClientResponse> {
        auth.authorize(Permission::EditClients)?;
        let client = self.repo.update(id, &update).await?;
        Ok(ClientResponse::from(client))
    }

    async fn record_death(
        &self,
        client_id: Uuid,
        death: NewClientDeath,
        auth: &AuthContext,
    ) -> ServiceResult<ClientDeath> {
        auth.authorize(Permission::EditClients)?;
        Ok(self.repo.record_death(client_id, &death).await?)
    }

    async fn record_transfer(
        &self,
        client_id: Uuid,
        transfer: NewClientTransfer,
        auth: &AuthContext,
    ) -> ServiceResult<ClientTransfer> {
        auth.authorize(Permission::EditClients)?;
        Ok(self.repo.record_transfer(client_id, &transfer).await?)
    }

    async fn add_family_member(
        &self,
        client_id: Uuid,
        member: NewFamilyMember,
        auth: &AuthContext,
    ) -> ServiceResult<FamilyMember> {
        auth.authorize(Permission::EditClients)?;
        Ok(self.repo.add_family_member(client_id, &member).await?)
    }

    async fn delete_client(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<DeleteSummary> {
        self.delete_record(EntityKind::Client, id, auth).await
    }

    async fn preview_delete_client(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<DeleteSummary> {
        auth.authorize(Permission::DeleteClients)?;
        Ok(self.delete_service.preview_delete(EntityKind::Client, id).await?)
    }

    async fn delete_record(&self, kind: EntityKind, id: Uuid, auth: &AuthContext) -> ServiceResult<DeleteSummary> {
        auth.authorize(delete_permission_for(kind))?;
        let summary = self.delete_service.delete(kind, id).await?;
        info!("User {} deleted {} {}", auth.user_id, kind, id);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::admission::repository::SqliteAdmissionRepository;
    use crate::domains::admission::types::{NewAdmission, NewTransfusion};
    use crate::domains::client::repository::SqliteClientRepository;
    use crate::domains::client::types::Gender;
    use crate::domains::clinical::repository::SqliteClinicalRepository;
    use crate::domains::core::delete_service::CascadeDeleteService;
    use crate::domains::drug::repository::SqliteDrugRepository;
    use crate::domains::permission::UserRole;
    use crate::errors::ServiceError;
    use crate::test_support::migrated_pool;
    use sqlx::{Pool, Sqlite};

    fn service(pool: Pool<Sqlite>) -> ClientServiceImpl {
        ClientServiceImpl::new(
            Arc::new(SqliteClientRepository::new(pool.clone())),
            Arc::new(SqliteDrugRepository::new(pool.clone())),
            Arc::new(SqliteClinicalRepository::new(pool.clone())),
            Arc::new(SqliteAdmissionRepository::new(pool.clone())),
            Arc::new(CascadeDeleteService::new(pool)),
        )
    }

    fn as_role(role: UserRole) -> AuthContext {
        AuthContext::new(Uuid::new_v4(), role)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_response_carries_ages() {
        let client = Client {
            date_of_birth: Some(date(1990, 1, 1)),
            ..sample_client()
        };
        let response = ClientResponse::from_client_on(client, date(2024, 1, 1));
        assert_eq!(response.age, Some(34));
        assert_eq!(response.age_string.as_deref(), Some("34 years, 0 months, and 0 days"));
        assert_eq!(response.display_name, "T-525 : John Silva");

        let response = ClientResponse::from_client_on(sample_client(), date(2024, 1, 1));
        assert_eq!(response.age, None);
    }

    fn sample_client() -> Client {
        Client {
            id: Uuid::new_v4(),
            registration_number: "T-525".to_string(),
            full_name: "John Silva".to_string(),
            common_name: None,
            gender: Gender::Male,
            ethnicity: None,
            date_of_birth: None,
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
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_viewer_cannot_register_clients() {
        let service = service(migrated_pool().await);
        let err = service
            .create_client(NewClient::new("T-525", "John Silva", Gender::Male), &as_role(UserRole::Viewer))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));

        let page = service
            .list_clients(None, PaginationParams::default(), &as_role(UserRole::Viewer))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_client_listed_then_gone_after_delete() {
        let pool = migrated_pool().await;
        let service = service(pool.clone());
        let clinician = as_role(UserRole::Clinician);

        let created = service
            .create_client(NewClient::new("T-525", "John Silva", Gender::Male), &clinician)
            .await
            .unwrap();
        let admission = SqliteAdmissionRepository::new(pool.clone())
            .create_admission(created.client.id, &NewAdmission::new(date(2024, 1, 5)))
            .await
            .unwrap();
        SqliteAdmissionRepository::new(pool)
            .create_transfusion(admission.id, &NewTransfusion::new(date(2024, 1, 5)))
            .await
            .unwrap();

        let listed = service.list_clients(None, PaginationParams::default(), &clinician).await.unwrap();
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].display_name, "T-525 : John Silva");

        let preview = service.preview_delete_client(created.client.id, &clinician).await.unwrap();
        assert_eq!(preview.deleted_count(EntityKind::Transfusion), 1);

        let summary = service.delete_client(created.client.id, &clinician).await.unwrap();
        assert_eq!(summary, preview);

        let listed = service.list_clients(None, PaginationParams::default(), &clinician).await.unwrap();
        assert!(listed.items.is_empty());
        assert!(service
            .get_client_by_registration_number("T-525", &clinician)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_detail_includes_related_records() {
        let pool = migrated_pool().await;
        let service = service(pool.clone());
        let admin = as_role(UserRole::Admin);

        let created = service
            .create_client(NewClient::new("T-525", "John Silva", Gender::Male), &admin)
            .await
            .unwrap();
        let id = created.client.id;
        service
            .add_family_member(id, NewFamilyMember { name: "Mary Silva".to_string(), ..Default::default() }, &admin)
            .await
            .unwrap();
        SqliteAdmissionRepository::new(pool)
            .create_admission(id, &NewAdmission::new(date(2024, 1, 5)))
            .await
            .unwrap();

        let plain = service.get_client_by_id(id, None, &admin).await.unwrap();
        assert!(plain.family_members.is_none());

        let detail = service
            .get_client_by_id(id, Some(&[ClientInclude::All]), &admin)
            .await
            .unwrap();
        assert_eq!(detail.family_members.as_ref().map(Vec::len), Some(1));
        assert_eq!(detail.admissions.as_ref().map(Vec::len), Some(1));
        assert_eq!(detail.transfusions.as_ref().map(Vec::len), Some(0));
        assert!(detail.death.is_none());
    }

    #[tokio::test]
    async fn test_lookup_deletes_need_manage_permission() {
        let service = service(migrated_pool().await);
        let err = service
            .delete_record(EntityKind::Province, Uuid::new_v4(), &as_role(UserRole::Clinician))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));

        let err = service
            .delete_record(EntityKind::Province, Uuid::new_v4(), &as_role(UserRole::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(ref e) if e.is_not_found()));
    }
}
