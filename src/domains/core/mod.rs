pub mod delete_service;
pub mod dependency_checker;
pub mod repository;

pub use delete_service::{CascadeDeleteService, DeleteService, DeleteSummary};
pub use dependency_checker::{Dependency, DependencyChecker, ReferentialAction, ReferentialGraph, SqliteDependencyChecker};
pub use repository::FindById;
