use thal_registry::domains::lookup::initialization::seed_lookups;
use thal_registry::globals::init_logging;
use thal_registry::RegistryConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Seeding is done here so the report can be printed.
    let mut config = RegistryConfig::from_env()?;
    config.seed_lookups = false;
    log::info!("Seeding lookup lists into {}", config.database_url);

    thal_registry::initialize(&config).await?;
    let registry = thal_registry::get_registry()?;

    let report = seed_lookups(registry.lookups.as_ref()).await?;
    if !report.units_without_division.is_empty() {
        log::warn!(
            "{} units recorded without a DS division",
            report.units_without_division.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    log::info!("Seeding finished, {} rows created", report.total_created());

    Ok(())
}
