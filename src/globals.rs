use crate::config::RegistryConfig;
use crate::db_migration::run_migrations;
use crate::domains::admission::repository::{AdmissionRepository, SqliteAdmissionRepository};
use crate::domains::client::repository::{ClientRepository, SqliteClientRepository};
use crate::domains::client::service::{ClientService, ClientServiceImpl};
use crate::domains::clinical::repository::{ClinicalRepository, SqliteClinicalRepository};
use crate::domains::core::delete_service::{CascadeDeleteService, DeleteService};
use crate::domains::core::dependency_checker::{DependencyChecker, SqliteDependencyChecker};
use crate::domains::drug::repository::{DrugRepository, SqliteDrugRepository};
use crate::domains::lookup::initialization::seed_lookups;
use crate::domains::lookup::repository::{LookupRepository, SqliteLookupRepository};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use lazy_static::lazy_static;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Every repository and service of an initialised registry, sharing one pool.
#[derive(Clone)]
pub struct Registry {
    pub pool: SqlitePool,
    pub lookups: Arc<dyn LookupRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub drugs: Arc<dyn DrugRepository>,
    pub clinical: Arc<dyn ClinicalRepository>,
    pub admissions: Arc<dyn AdmissionRepository>,
    pub delete_service: Arc<dyn DeleteService>,
    pub dependency_checker: Arc<dyn DependencyChecker>,
    pub client_service: Arc<dyn ClientService>,
}

impl Registry {
    pub fn new(pool: SqlitePool) -> Self {
        let lookups: Arc<dyn LookupRepository> = Arc::new(SqliteLookupRepository::new(pool.clone()));
        let clients: Arc<dyn ClientRepository> = Arc::new(SqliteClientRepository::new(pool.clone()));
        let drugs: Arc<dyn DrugRepository> = Arc::new(SqliteDrugRepository::new(pool.clone()));
        let clinical: Arc<dyn ClinicalRepository> = Arc::new(SqliteClinicalRepository::new(pool.clone()));
        let admissions: Arc<dyn AdmissionRepository> = Arc::new(SqliteAdmissionRepository::new(pool.clone()));
        let delete_service: Arc<dyn DeleteService> = Arc::new(CascadeDeleteService::new(pool.clone()));
        let dependency_checker: Arc<dyn DependencyChecker> = Arc::new(SqliteDependencyChecker::new(pool.clone()));
        let client_service: Arc<dyn ClientService> = Arc::new(ClientServiceImpl::new(
            clients.clone(),
            drugs.clone(),
            clinical.clone(),
            admissions.clone(),
            delete_service.clone(),
        ));

        Self {
            pool,
            lookups,
            clients,
            drugs,
            clinical,
            admissions,
            delete_service,
            dependency_checker,
            client_service,
        }
    }
}

// Global state definitions
lazy_static! {
    static ref INIT_MUTEX: tokio::sync::Mutex<()> = tokio::sync::Mutex::new(());
    static ref INITIALIZED: AtomicBool = AtomicBool::new(false);

    static ref DB_POOL: Mutex<Option<SqlitePool>> = Mutex::new(None);
    static ref REGISTRY: Mutex<Option<Registry>> = Mutex::new(None);
}

fn not_initialized(what: &str) -> ServiceError {
    ServiceError::Domain(DomainError::Internal(format!("{} not initialized", what)))
}

fn lock_poisoned(what: &str) -> ServiceError {
    ServiceError::Domain(DomainError::Internal(format!("{} lock poisoned", what)))
}

pub fn get_db_pool() -> ServiceResult<SqlitePool> {
    DB_POOL.lock().map_err(|_| lock_poisoned("DB_POOL"))?.clone().ok_or_else(|| not_initialized("Database pool"))
}

pub fn get_registry() -> ServiceResult<Registry> {
    REGISTRY.lock().map_err(|_| lock_poisoned("REGISTRY"))?.clone().ok_or_else(|| not_initialized("Registry"))
}

pub fn get_client_service() -> ServiceResult<Arc<dyn ClientService>> {
    Ok(get_registry()?.client_service)
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Default `RUST_LOG` by build profile and start `env_logger` once per process.
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        #[cfg(debug_assertions)]
        std::env::set_var("RUST_LOG", "debug");
        #[cfg(not(debug_assertions))]
        std::env::set_var("RUST_LOG", "info");
    }

    let _ = env_logger::try_init();
}

/// Open the store, bring the schema up to date and build the registry.
/// Later calls return immediately once one has succeeded.
pub async fn initialize(config: &RegistryConfig) -> ServiceResult<()> {
    let _guard = INIT_MUTEX.lock().await;

    if INITIALIZED.load(Ordering::Acquire) {
        return Ok(());
    }

    let result = initialize_internal(config).await;

    if result.is_ok() {
        INITIALIZED.store(true, Ordering::Release);
    }

    result
}

async fn initialize_internal(config: &RegistryConfig) -> ServiceResult<()> {
    init_logging();

    log::info!("Starting registry initialization");
    log::debug!("Database URL: {}", config.database_url);
    log::debug!("Max connections: {}", config.max_connections);

    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| ServiceError::Configuration(format!("Invalid database URL '{}': {}", config.database_url, e)))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| {
            log::error!("Database connection failed: {}", e);
            DbError::from(e)
        })?;
    log::debug!("Database connection established");

    run_migrations(&pool).await.map_err(|e| {
        log::error!("Database migration failed: {}", e);
        e
    })?;

    let registry = Registry::new(pool.clone());

    if config.seed_lookups {
        let report = seed_lookups(registry.lookups.as_ref()).await?;
        log::info!("Lookup seeding created {} rows", report.total_created());
    }

    *DB_POOL.lock().map_err(|_| lock_poisoned("DB_POOL"))? = Some(pool);
    *REGISTRY.lock().map_err(|_| lock_poisoned("REGISTRY"))? = Some(registry);

    log::info!("Registry initialization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::domains::client::types::{Gender, NewClient};
    use crate::domains::lookup::types::ChoiceCategory;

    // The only test touching process globals.
    #[tokio::test]
    async fn test_initialize_once_and_serve() {
        assert!(!is_initialized());
        assert!(get_registry().is_err());

        let config = RegistryConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            seed_lookups: true,
        };
        initialize(&config).await.unwrap();
        initialize(&config).await.unwrap();
        assert!(is_initialized());

        let registry = get_registry().unwrap();
        let married = registry
            .lookups
            .find_choice_by_name(ChoiceCategory::MaritalStatus, "Married")
            .await
            .unwrap();
        assert!(married.is_some());

        let service = get_client_service().unwrap();
        let auth = AuthContext::internal_system_context();
        let created = service
            .create_client(NewClient::new("T-700", "Sunil Fernando", Gender::Male), &auth)
            .await
            .unwrap();
        assert_eq!(created.client.registration_number, "T-700");

        let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migrations")
            .fetch_one(&get_db_pool().unwrap())
            .await
            .unwrap();
        assert_eq!(migrations, 3);
    }
}
