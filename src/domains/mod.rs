pub mod admission;
pub mod client;
pub mod clinical;
pub mod core;
pub mod drug;
pub mod lookup;
pub mod permission;

pub use client::{ClientService, ClientServiceImpl};
pub use lookup::LookupRepository;
