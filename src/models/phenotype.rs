use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A phenotype published in the catalog.
///
/// Each phenotype can be tagged with one term of every ontology kind:
/// environment (`eo_term`), trait (`to_term`) and unit (`uo_term`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phenotype {
    pub id: Uuid,
    pub name: String,
    /// How the phenotype was scored.
    pub scoring: Option<String>,
    pub eo_term: Option<String>,
    pub to_term: Option<String>,
    pub uo_term: Option<String>,
    /// Number of accessions with a measured value.
    pub accession_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a phenotype.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePhenotypeInput {
    pub name: String,
    pub scoring: Option<String>,
    pub eo_term: Option<String>,
    pub to_term: Option<String>,
    pub uo_term: Option<String>,
    #[serde(default)]
    pub accession_count: u32,
}

/// Phenotypes tagged with a term or any of its descendants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermPhenotypes {
    pub term: super::OntologyTerm,
    /// Total number of matches before pagination.
    pub phenotype_count: usize,
    pub phenotypes: Vec<Phenotype>,
}
