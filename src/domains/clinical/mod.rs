pub mod repository;
pub mod types;

pub use repository::{ClinicalRepository, SqliteClinicalRepository};
pub use types::{
    ClinicVisit, Complication, ComplicationType, GrowthRecord, Investigation, InvestigationType,
    NewClinicVisit, NewComplication, NewComplicationType, NewGrowthRecord, NewInvestigation,
    NewInvestigationType, NewVaccination, Vaccination,
};
