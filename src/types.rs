use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export UserRole and Permission from the permission module
pub use crate::domains::permission::{Permission, UserRole};

/// Every persisted entity of the registry, keyed to its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    ClientDeath,
    ClientTransfer,
    FamilyMember,
    DrugName,
    Drug,
    ComplicationType,
    Complication,
    Vaccination,
    InvestigationType,
    Investigation,
    GrowthRecord,
    Admission,
    Transfusion,
    ClinicVisit,
    Choice,
    Province,
    District,
    DsDivision,
    ThalassemiaUnit,
    DiagnosisType,
}

impl EntityKind {
    pub const ALL: [EntityKind; 21] = [
        EntityKind::Client,
        EntityKind::ClientDeath,
        EntityKind::ClientTransfer,
        EntityKind::FamilyMember,
        EntityKind::DrugName,
        EntityKind::Drug,
        EntityKind::ComplicationType,
        EntityKind::Complication,
        EntityKind::Vaccination,
        EntityKind::InvestigationType,
        EntityKind::Investigation,
        EntityKind::GrowthRecord,
        EntityKind::Admission,
        EntityKind::Transfusion,
        EntityKind::ClinicVisit,
        EntityKind::Choice,
        EntityKind::Province,
        EntityKind::District,
        EntityKind::DsDivision,
        EntityKind::ThalassemiaUnit,
        EntityKind::DiagnosisType,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Client => "clients",
            EntityKind::ClientDeath => "client_deaths",
            EntityKind::ClientTransfer => "client_transfers",
            EntityKind::FamilyMember => "family_members",
            EntityKind::DrugName => "drug_names",
            EntityKind::Drug => "drugs",
            EntityKind::ComplicationType => "complication_types",
            EntityKind::Complication => "complications",
            EntityKind::Vaccination => "vaccinations",
            EntityKind::InvestigationType => "investigation_types",
            EntityKind::Investigation => "investigations",
            EntityKind::GrowthRecord => "growth_records",
            EntityKind::Admission => "admissions",
            EntityKind::Transfusion => "transfusions",
            EntityKind::ClinicVisit => "clinic_visits",
            EntityKind::Choice => "choices",
            EntityKind::Province => "provinces",
            EntityKind::District => "districts",
            EntityKind::DsDivision => "ds_divisions",
            EntityKind::ThalassemiaUnit => "thalassemia_units",
            EntityKind::DiagnosisType => "diagnosis_types",
        }
    }

    pub fn from_table_name(table: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.table_name() == table)
    }

    /// Human readable name, used in error messages and logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Client => "Client",
            EntityKind::ClientDeath => "ClientDeath",
            EntityKind::ClientTransfer => "ClientTransfer",
            EntityKind::FamilyMember => "FamilyMember",
            EntityKind::DrugName => "DrugName",
            EntityKind::Drug => "Drug",
            EntityKind::ComplicationType => "ComplicationType",
            EntityKind::Complication => "Complication",
            EntityKind::Vaccination => "Vaccination",
            EntityKind::InvestigationType => "InvestigationType",
            EntityKind::Investigation => "Investigation",
            EntityKind::GrowthRecord => "GrowthRecord",
            EntityKind::Admission => "Admission",
            EntityKind::Transfusion => "Transfusion",
            EntityKind::ClinicVisit => "ClinicVisit",
            EntityKind::Choice => "Choice",
            EntityKind::Province => "Province",
            EntityKind::District => "District",
            EntityKind::DsDivision => "DS_Division",
            EntityKind::ThalassemiaUnit => "ThalassemiaUnit",
            EntityKind::DiagnosisType => "DiagnosisType",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts either the table name or the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_table_name(s)
            .or_else(|| Self::ALL.iter().copied().find(|kind| kind.display_name() == s))
            .ok_or_else(|| format!("Unknown entity: {}", s))
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PaginationParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page.max(1) as i64
    }
}

/// Paginated result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, params: PaginationParams) -> Self {
        let per_page = params.per_page.max(1);
        let total_pages = (total as f64 / per_page as f64).ceil() as u32;
        Self {
            items,
            total,
            page: params.page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_table_name(kind.table_name()), Some(kind));
        }
        assert_eq!("DS_Division".parse::<EntityKind>(), Ok(EntityKind::DsDivision));
        assert!("patients".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_paginated_result_pages() {
        let params = PaginationParams::new(2, 10);
        assert_eq!(params.offset(), 10);
        let result = PaginatedResult::new(vec![1, 2, 3], 23, params);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.page, 2);
    }
}
