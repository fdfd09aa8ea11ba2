pub mod repository;
pub mod types;

pub use repository::{AdmissionRepository, SqliteAdmissionRepository};
pub use types::{Admission, NewAdmission, NewTransfusion, Transfusion};
