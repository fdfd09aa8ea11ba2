// Public modules
pub mod auth;
pub mod config;
pub mod domains;
pub mod errors;
pub mod globals;
pub mod types;
pub mod validation;

// Private modules
mod db_migration;
mod utils;

#[cfg(test)]
mod test_support;

pub use config::RegistryConfig;
pub use globals::Registry;

/// Initialize the registry: connect, migrate and, if configured, seed the lookup lists.
/// Must be called before any other function in the library.
pub async fn initialize(config: &RegistryConfig) -> errors::ServiceResult<()> {
    globals::initialize(config).await
}

/// The shared repositories and services
pub fn get_registry() -> errors::ServiceResult<Registry> {
    globals::get_registry()
}

/// Get a reference to the SQLite connection pool
/// This is primarily for internal use
pub fn get_db_pool() -> errors::ServiceResult<sqlx::SqlitePool> {
    globals::get_db_pool()
}
