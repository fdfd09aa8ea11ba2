pub mod age;
pub mod repository;
pub mod service;
pub mod types;

pub use age::{age_on, precise_age_on, PreciseAge};
pub use repository::{ClientRepository, SqliteClientRepository};
pub use service::{ClientInclude, ClientResponse, ClientService, ClientServiceImpl};
pub use types::{
    BloodGroup, Client, ClientDeath, ClientTransfer, Ethnicity, FamilyMember, Gender, NewClient,
    NewClientDeath, NewClientTransfer, NewFamilyMember, Relationship,
};
