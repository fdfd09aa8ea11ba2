pub mod repository;
pub mod types;

pub use repository::{DrugRepository, SqliteDrugRepository};
pub use types::{Drug, DrugName, NewDrug, NewDrugName};
