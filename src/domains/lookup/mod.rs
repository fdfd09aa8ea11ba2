pub mod initialization;
pub mod repository;
pub mod types;

pub use repository::{LookupRepository, SqliteLookupRepository};
pub use types::{
    Choice, ChoiceCategory, DiagnosisType, District, DsDivision, NewChoice, NewDiagnosisType,
    NewDistrict, NewDsDivision, NewProvince, NewThalassemiaUnit, Province, ThalassemiaUnit,
};
